/// Run report and its delivery.
///
/// Outcomes are grouped by address family into a typed [`Report`]; rendering to
/// markdown happens last. At most one message is sent per run, and only when the
/// report has something in it.
use crate::error::DdnsError;
use crate::record::{Outcome, RecordType, Status};

pub mod dingtalk;

pub const REPORT_TITLE: &str = "Aliyun DDNS Update";
const DIVIDER: &str = "------------------\n";

/// Destination for the run report
pub trait MessageSink {
    /// Deliver one message. Called at most once per run.
    fn send(&self, title: &str, body: &str) -> Result<(), DdnsError>;

    /// Get the sink name for logging purposes
    fn sink_name(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Created { value: String },
    Updated { previous: String, value: String },
    Unchanged { value: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub domain: String,
    pub kind: EntryKind,
}

impl Entry {
    fn render(&self) -> String {
        match &self.kind {
            EntryKind::Created { value } => format!(
                "Update Result: Success\n  - Domain: {}\n  - New IP: {}\n",
                self.domain, value
            ),
            EntryKind::Updated { previous, value } => format!(
                "Update Result: Success\n  - Domain: {}\n  - Old IP: {}\n  - New IP: {}\n",
                self.domain, previous, value
            ),
            EntryKind::Unchanged { value } => format!(
                "Update Result: Unchanged\n  - Domain: {}\n  - IP: {}\n",
                self.domain, value
            ),
            EntryKind::Failed { error } => format!(
                "Update Result: Failed\n  - Domain: {}\n  - Error: {}\n",
                self.domain, error
            ),
        }
    }
}

/// Reportable outcomes of a run, grouped by family
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub ipv4: Vec<Entry>,
    pub ipv6: Vec<Entry>,
    /// Records with an unsupported type
    pub other: Vec<Entry>,
}

impl Report {
    /// Collect the outcomes worth reporting, keeping input order within each group.
    ///
    /// Unchanged records are only included when `include_unchanged` is set.
    pub fn build(outcomes: &[Outcome<'_>], include_unchanged: bool) -> Self {
        let mut report = Report::default();

        for outcome in outcomes {
            let kind = match &outcome.status {
                Status::Created { value } => EntryKind::Created { value: value.to_string() },
                Status::Updated { previous, value } => EntryKind::Updated {
                    previous: previous.clone(),
                    value: value.to_string(),
                },
                Status::Unchanged { value } if include_unchanged => EntryKind::Unchanged { value: value.to_string() },
                Status::Unchanged { .. } => continue,
                Status::Failed { error } => EntryKind::Failed { error: error.to_string() },
            };

            let entry = Entry {
                domain: outcome.spec.fqdn(),
                kind,
            };
            match outcome.spec.record_type {
                RecordType::A => report.ipv4.push(entry),
                RecordType::Aaaa => report.ipv6.push(entry),
                RecordType::Unsupported(_) => report.other.push(entry),
            }
        }

        report
    }

    pub fn is_empty(&self) -> bool {
        self.ipv4.is_empty() && self.ipv6.is_empty() && self.other.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ipv4.len() + self.ipv6.len() + self.other.len()
    }

    /// Markdown body of the message
    pub fn render(&self) -> String {
        let mut body = format!("#### {}\n", REPORT_TITLE);

        for (heading, entries) in [("IPv4", &self.ipv4), ("IPv6", &self.ipv6), ("Other", &self.other)] {
            if entries.is_empty() {
                continue;
            }
            let text = entries
                .iter()
                .map(Entry::render)
                .collect::<Vec<_>>()
                .join(DIVIDER);
            body.push_str(&format!("##### ====== {} ======\n{}\n", heading, text));
        }

        body.push_str("##### === AliyunDDNS ===\n");
        body
    }
}

/// Report the run through `sink`, if there is anything to report.
///
/// Delivery failures are logged and otherwise ignored. Returns whether a message
/// was delivered.
pub fn notify(outcomes: &[Outcome<'_>], sink: Option<&dyn MessageSink>, include_unchanged: bool) -> bool {
    let report = Report::build(outcomes, include_unchanged);
    if report.is_empty() {
        log::info!("No record updated, no need to send a notification");
        return false;
    }

    let Some(sink) = sink else {
        log::info!("Notifications disabled, skipping report of {} record(s)", report.len());
        return false;
    };

    match sink.send(REPORT_TITLE, &report.render()) {
        Ok(()) => {
            log::info!("Sent report of {} record(s) to {}", report.len(), sink.sink_name());
            true
        }
        Err(e) => {
            log::warn!("Failed to send report to {}: {}", sink.sink_name(), e);
            false
        }
    }
}
