/// Record data model shared by the reconciler, the provider client and the notifier.
use crate::error::DdnsError;
use serde::Deserialize;
use std::fmt;
use std::net::IpAddr;

/// TTL applied to every record this tool creates or updates
pub const DEFAULT_TTL: u32 = 600;

/// Address family resolved for a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    /// Whether `ip` belongs to this family
    pub fn matches(&self, ip: &IpAddr) -> bool {
        matches!(
            (self, ip),
            (AddressFamily::V4, IpAddr::V4(_)) | (AddressFamily::V6, IpAddr::V6(_))
        )
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::V4 => write!(f, "IPv4"),
            AddressFamily::V6 => write!(f, "IPv6"),
        }
    }
}

/// DNS record type as written in the configuration.
///
/// Anything other than `A` or `AAAA` is kept verbatim as `Unsupported` so the
/// record can be reported as failed instead of aborting the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordType {
    A,
    Aaaa,
    Unsupported(String),
}

impl RecordType {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "A" => RecordType::A,
            "AAAA" => RecordType::Aaaa,
            _ => RecordType::Unsupported(value.trim().to_string()),
        }
    }

    /// The address family this type is satisfied by
    pub fn family(&self) -> Result<AddressFamily, DdnsError> {
        match self {
            RecordType::A => Ok(AddressFamily::V4),
            RecordType::Aaaa => Ok(AddressFamily::V6),
            RecordType::Unsupported(other) => Err(DdnsError::Configuration(format!(
                "Invalid record type: {} (expected A or AAAA)",
                other
            ))),
        }
    }

    /// Keyword sent to the provider and compared against its `Type` field
    pub fn keyword(&self) -> &str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
            RecordType::Unsupported(other) => other,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// One configured record to keep in sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSpec {
    /// Subdomain label (`@` for the zone apex)
    pub name: String,
    /// Parent domain
    pub zone: String,
    pub record_type: RecordType,
}

impl RecordSpec {
    pub fn new(name: impl Into<String>, zone: impl Into<String>, record_type: RecordType) -> Self {
        Self {
            name: name.into(),
            zone: zone.into(),
            record_type,
        }
    }

    /// Fully qualified name, with `@` collapsing to the zone itself
    pub fn fqdn(&self) -> String {
        if self.name == "@" {
            self.zone.clone()
        } else {
            format!("{}.{}", self.name, self.zone)
        }
    }
}

impl fmt::Display for RecordSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}. {}]", self.fqdn(), self.record_type)
    }
}

/// A record as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderRecord {
    #[serde(rename = "RecordId")]
    pub id: String,
    #[serde(rename = "RR")]
    pub name: String,
    #[serde(rename = "DomainName")]
    pub zone: String,
    #[serde(rename = "Type")]
    pub record_type: String,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "TTL", default)]
    pub ttl: Option<u32>,
}

impl ProviderRecord {
    /// Exact (name, zone, type) match; the provider's keyword search is a superset
    pub fn is_exact_match(&self, spec: &RecordSpec) -> bool {
        self.name == spec.name
            && self.zone == spec.zone
            && self.record_type == spec.record_type.keyword()
    }

    /// Whether the stored value already points at `ip`
    pub fn holds(&self, ip: &IpAddr) -> bool {
        match self.value.trim().parse::<IpAddr>() {
            Ok(current) => current == *ip,
            Err(_) => self.value == ip.to_string(),
        }
    }
}

/// Result of reconciling one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Created { value: IpAddr },
    Updated { previous: String, value: IpAddr },
    Unchanged { value: IpAddr },
    Failed { error: DdnsError },
}

/// Outcome for one configured record, produced once per run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<'a> {
    pub spec: &'a RecordSpec,
    pub status: Status,
}

impl<'a> Outcome<'a> {
    pub fn new(spec: &'a RecordSpec, status: Status) -> Self {
        Self { spec, status }
    }

    pub fn failed(spec: &'a RecordSpec, error: DdnsError) -> Self {
        Self::new(spec, Status::Failed { error })
    }

    /// The address written to the provider, if any
    pub fn new_value(&self) -> Option<IpAddr> {
        match &self.status {
            Status::Created { value } | Status::Updated { value, .. } => Some(*value),
            Status::Unchanged { .. } | Status::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&DdnsError> {
        match &self.status {
            Status::Failed { error } => Some(error),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error().is_some()
    }
}
