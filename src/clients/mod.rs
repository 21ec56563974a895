use crate::error::DdnsError;
use crate::record::ProviderRecord;

pub mod alidns;

/// Record operations against the DNS provider.
///
/// Each call is a single provider request with no implicit retry. Failures are
/// returned as [`DdnsError::Provider`] carrying the provider's own code and message.
pub trait RecordStore {
    /// List records in `zone` matching the name and type keywords, in provider order.
    /// The provider's keyword search may return more than exact matches.
    fn list_matching(&self, name: &str, zone: &str, record_type: &str) -> Result<Vec<ProviderRecord>, DdnsError>;

    /// Create a record and return its provider-assigned identifier
    fn create(&self, name: &str, zone: &str, record_type: &str, value: &str, ttl: u32) -> Result<String, DdnsError>;

    /// Replace the value of the record identified by `record_id`
    fn update(
        &self,
        name: &str,
        zone: &str,
        record_type: &str,
        record_id: &str,
        value: &str,
        ttl: u32,
    ) -> Result<String, DdnsError>;

    /// Get the provider name for logging purposes
    fn provider_name(&self) -> &str;
}
