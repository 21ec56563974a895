use crate::clients::RecordStore;
use crate::ip::AddressResolver;
use crate::reconcile::reconcile;
use crate::record::{Outcome, RecordSpec, Status};

/// Reconcile every configured record, one after another.
///
/// Returns exactly one outcome per record, in input order. A failing record
/// never stops the remaining ones.
pub fn run<'a>(
    specs: &'a [RecordSpec],
    resolver: &dyn AddressResolver,
    store: &dyn RecordStore,
) -> Vec<Outcome<'a>> {
    log::info!("Reconciling {} record(s) with {}", specs.len(), store.provider_name());

    specs
        .iter()
        .map(|spec| {
            let outcome = reconcile(spec, resolver, store);
            if let Some(value) = outcome.new_value() {
                log::debug!("{} now points at {}", spec, value);
            }
            outcome
        })
        .collect()
}

/// Per-status counts for a finished run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl Summary {
    pub fn of(outcomes: &[Outcome<'_>]) -> Self {
        outcomes.iter().fold(Summary::default(), |mut summary, outcome| {
            match outcome.status {
                Status::Created { .. } => summary.created += 1,
                Status::Updated { .. } => summary.updated += 1,
                Status::Unchanged { .. } => summary.unchanged += 1,
                Status::Failed { .. } => summary.failed += 1,
            }
            summary
        })
    }

    pub fn total(&self) -> usize {
        self.created + self.updated + self.unchanged + self.failed
    }
}
