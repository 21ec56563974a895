/// In-memory stand-ins for the resolver, the provider and the message sink.
use crate::clients::RecordStore;
use crate::error::DdnsError;
use crate::ip::AddressResolver;
use crate::notify::MessageSink;
use crate::record::{AddressFamily, ProviderRecord};
use std::cell::{Cell, RefCell};
use std::net::IpAddr;

/// Resolver returning fixed answers per family
pub struct FixedResolver {
    pub v4: Result<IpAddr, DdnsError>,
    pub v6: Result<IpAddr, DdnsError>,
    pub calls: Cell<usize>,
}

impl FixedResolver {
    pub fn v4(ip: &str) -> Self {
        Self {
            v4: Ok(ip.parse().unwrap()),
            v6: Err(DdnsError::resolution("no IPv6 connectivity")),
            calls: Cell::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            v4: Err(DdnsError::resolution(message)),
            v6: Err(DdnsError::resolution(message)),
            calls: Cell::new(0),
        }
    }
}

impl AddressResolver for FixedResolver {
    fn resolve(&self, family: AddressFamily) -> Result<IpAddr, DdnsError> {
        self.calls.set(self.calls.get() + 1);
        match family {
            AddressFamily::V4 => self.v4.clone(),
            AddressFamily::V6 => self.v6.clone(),
        }
    }
}

/// Provider call as observed by [`MemoryStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List { name: String, zone: String, record_type: String },
    Create { name: String, zone: String, record_type: String, value: String, ttl: u32 },
    Update { record_id: String, record_type: String, value: String, ttl: u32 },
}

/// Provider operation a [`MemoryStore`] can be told to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    List,
    Create,
    Update,
}

/// Provider keeping records in memory, with keyword (substring) search like the real API
#[derive(Default)]
pub struct MemoryStore {
    pub records: RefCell<Vec<ProviderRecord>>,
    pub calls: RefCell<Vec<Call>>,
    failure: RefCell<Option<(Op, DdnsError)>>,
    next_id: Cell<u32>,
}

impl MemoryStore {
    pub fn with_records(records: Vec<ProviderRecord>) -> Self {
        Self {
            records: RefCell::new(records),
            ..Default::default()
        }
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls
            .borrow()
            .iter()
            .filter(|c| !matches!(c, Call::List { .. }))
            .cloned()
            .collect()
    }

    pub fn fail_on(&self, op: Op, error: DdnsError) {
        *self.failure.borrow_mut() = Some((op, error));
    }

    fn check_failure(&self, op: Op) -> Result<(), DdnsError> {
        match &*self.failure.borrow() {
            Some((failing, err)) if *failing == op => Err(err.clone()),
            _ => Ok(()),
        }
    }
}

pub fn record(id: &str, name: &str, zone: &str, record_type: &str, value: &str) -> ProviderRecord {
    ProviderRecord {
        id: id.to_string(),
        name: name.to_string(),
        zone: zone.to_string(),
        record_type: record_type.to_string(),
        value: value.to_string(),
        ttl: Some(600),
    }
}

impl RecordStore for MemoryStore {
    fn list_matching(&self, name: &str, zone: &str, record_type: &str) -> Result<Vec<ProviderRecord>, DdnsError> {
        self.calls.borrow_mut().push(Call::List {
            name: name.to_string(),
            zone: zone.to_string(),
            record_type: record_type.to_string(),
        });
        self.check_failure(Op::List)?;

        // Keyword search: the zone filter is loose on purpose to mimic a superset match
        Ok(self
            .records
            .borrow()
            .iter()
            .filter(|r| r.name.contains(name) && r.zone.contains(zone))
            .cloned()
            .collect())
    }

    fn create(&self, name: &str, zone: &str, record_type: &str, value: &str, ttl: u32) -> Result<String, DdnsError> {
        self.calls.borrow_mut().push(Call::Create {
            name: name.to_string(),
            zone: zone.to_string(),
            record_type: record_type.to_string(),
            value: value.to_string(),
            ttl,
        });
        self.check_failure(Op::Create)?;

        let id = format!("new-{}", self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        self.records
            .borrow_mut()
            .push(record(&id, name, zone, record_type, value));
        Ok(id)
    }

    fn update(
        &self,
        _name: &str,
        _zone: &str,
        record_type: &str,
        record_id: &str,
        value: &str,
        ttl: u32,
    ) -> Result<String, DdnsError> {
        self.calls.borrow_mut().push(Call::Update {
            record_id: record_id.to_string(),
            record_type: record_type.to_string(),
            value: value.to_string(),
            ttl,
        });
        self.check_failure(Op::Update)?;

        let mut records = self.records.borrow_mut();
        let existing = records
            .iter_mut()
            .find(|r| r.id == record_id)
            .ok_or_else(|| DdnsError::provider("DomainRecordNotBelongToUser", record_id))?;
        existing.value = value.to_string();
        Ok(record_id.to_string())
    }

    fn provider_name(&self) -> &str {
        "memory"
    }
}

/// Sink capturing every message it is asked to deliver
#[derive(Default)]
pub struct RecordingSink {
    pub sent: RefCell<Vec<(String, String)>>,
    pub fail_with: Option<DdnsError>,
}

impl MessageSink for RecordingSink {
    fn send(&self, title: &str, body: &str) -> Result<(), DdnsError> {
        self.sent.borrow_mut().push((title.to_string(), body.to_string()));
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn sink_name(&self) -> &str {
        "recording"
    }
}
