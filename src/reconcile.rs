/// Reconciliation of a single configured record against the provider.
///
/// For one record: resolve the public address of the record's family, look up
/// the existing record by (name, zone, type), then create it, update it, or
/// leave it alone. Every error is turned into a `Failed` outcome here, so the
/// caller always gets a completed [`Outcome`].
use crate::clients::RecordStore;
use crate::error::DdnsError;
use crate::ip::AddressResolver;
use crate::record::{Outcome, ProviderRecord, RecordSpec, Status, DEFAULT_TTL};

/// Reconcile one record. Never fails; errors become [`Status::Failed`].
pub fn reconcile<'a>(
    spec: &'a RecordSpec,
    resolver: &dyn AddressResolver,
    store: &dyn RecordStore,
) -> Outcome<'a> {
    match try_reconcile(spec, resolver, store) {
        Ok(status) => Outcome::new(spec, status),
        Err(error) => {
            log::error!("Failed for {}: {}", spec, error);
            Outcome::failed(spec, error)
        }
    }
}

fn try_reconcile(
    spec: &RecordSpec,
    resolver: &dyn AddressResolver,
    store: &dyn RecordStore,
) -> Result<Status, DdnsError> {
    // Unsupported types stop here, before any network call
    let family = spec.record_type.family()?;
    let ip = resolver.resolve(family)?;
    let value = ip.to_string();
    let keyword = spec.record_type.keyword();

    let records = store.list_matching(&spec.name, &spec.zone, keyword)?;

    match find_exact(&records, spec) {
        None => {
            log::info!("Record not found, adding record: {} -> {}", spec.fqdn(), value);
            store.create(&spec.name, &spec.zone, keyword, &value, DEFAULT_TTL)?;
            Ok(Status::Created { value: ip })
        }
        Some(existing) if existing.holds(&ip) => {
            log::info!("IP not changed, no need to update {}: {}", spec.fqdn(), existing.value);
            Ok(Status::Unchanged { value: ip })
        }
        Some(existing) => {
            log::info!("IP changed, updating {}: {} -> {}", spec.fqdn(), existing.value, value);
            store.update(&spec.name, &spec.zone, keyword, &existing.id, &value, DEFAULT_TTL)?;
            Ok(Status::Updated {
                previous: existing.value.clone(),
                value: ip,
            })
        }
    }
}

/// First record in provider order that matches name, zone and type exactly
fn find_exact<'r>(records: &'r [ProviderRecord], spec: &RecordSpec) -> Option<&'r ProviderRecord> {
    let found = records.iter().find(|r| r.is_exact_match(spec));
    if let Some(record) = found {
        log::info!(
            "Record found: {} -> {} (id {}, ttl {})",
            spec.fqdn(),
            record.value,
            record.id,
            record.ttl.map_or_else(|| "unknown".to_string(), |t| t.to_string())
        );
    }
    found
}
