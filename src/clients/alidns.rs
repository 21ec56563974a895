use crate::clients::RecordStore;
use crate::config::Config;
use crate::error::DdnsError;
use crate::record::ProviderRecord;
use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha1::Sha1;
use std::collections::BTreeMap;
use std::error::Error;
use time::macros::format_description;
use time::OffsetDateTime;

type HmacSha1 = Hmac<Sha1>;

/// Public Alidns RPC endpoint
pub const DEFAULT_SERVER: &str = "https://alidns.aliyuncs.com";
const API_VERSION: &str = "2015-01-09";
/// Upper bound on records returned by one keyword search
const PAGE_SIZE: &str = "500";

/// Alibaba Cloud DNS client - https://help.aliyun.com/document_detail/29739.html
///
/// Talks to the RPC-style API: every call is a signed GET with the action and
/// its arguments in the query string.
pub struct AlidnsClient {
    access_key_id: String,
    access_key_secret: String,
    server: String,
    timeout: u64,
}

#[derive(Deserialize)]
struct DescribeDomainRecordsResponse {
    #[serde(rename = "DomainRecords")]
    domain_records: DomainRecords,
}

#[derive(Deserialize)]
struct DomainRecords {
    #[serde(rename = "Record", default)]
    records: Vec<ProviderRecord>,
}

#[derive(Deserialize)]
struct RecordIdResponse {
    #[serde(rename = "RecordId")]
    record_id: String,
}

#[derive(Deserialize)]
struct ApiError {
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Message", default)]
    message: String,
}

impl AlidnsClient {
    /// Creates an `AlidnsClient` from a `Config`.
    ///
    /// The AccessKey ID is read from `login` and the secret from `password`.
    /// `server` overrides the default endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if either credential is missing or empty.
    pub fn new(config: &Config) -> Result<Self, Box<dyn Error>> {
        let access_key_id = config.login.as_ref()
            .filter(|s| !s.is_empty())
            .ok_or("login (AccessKey ID) is required for Alidns")?
            .clone();
        let access_key_secret = config.password.as_ref()
            .filter(|s| !s.is_empty())
            .ok_or("password (AccessKey secret) is required for Alidns")?
            .clone();

        let server = config.server.as_deref()
            .unwrap_or(DEFAULT_SERVER)
            .trim_end_matches('/')
            .to_string();

        Ok(AlidnsClient {
            access_key_id,
            access_key_secret,
            server,
            timeout: config.timeout.unwrap_or(crate::ip::DEFAULT_TIMEOUT),
        })
    }

    fn common_params(&self, action: &str) -> Result<BTreeMap<String, String>, DdnsError> {
        let timestamp = OffsetDateTime::now_utc()
            .format(format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]Z"))
            .map_err(|e| DdnsError::provider("ClientError", format!("cannot format timestamp: {}", e)))?;
        let nonce = hex::encode(rand::thread_rng().gen::<[u8; 16]>());

        let mut params = BTreeMap::new();
        params.insert("Action".to_string(), action.to_string());
        params.insert("Format".to_string(), "JSON".to_string());
        params.insert("Version".to_string(), API_VERSION.to_string());
        params.insert("AccessKeyId".to_string(), self.access_key_id.clone());
        params.insert("SignatureMethod".to_string(), "HMAC-SHA1".to_string());
        params.insert("SignatureVersion".to_string(), "1.0".to_string());
        params.insert("SignatureNonce".to_string(), nonce);
        params.insert("Timestamp".to_string(), timestamp);
        Ok(params)
    }

    /// Issue one signed call and decode the JSON response
    fn call<T: DeserializeOwned>(&self, action: &str, args: &[(&str, &str)]) -> Result<T, DdnsError> {
        let mut params = self.common_params(action)?;
        for (key, value) in args {
            params.insert(key.to_string(), value.to_string());
        }

        let canonical = canonical_query(&params);
        let signature = sign(&self.access_key_secret, &string_to_sign("GET", &canonical))?;
        let url = format!(
            "{}/?{}&Signature={}",
            self.server,
            canonical,
            urlencoding::encode(&signature)
        );

        log::debug!("Alidns {} {:?}", action, args);

        let response = minreq::get(&url)
            .with_header("User-Agent", crate::USER_AGENT)
            .with_timeout(self.timeout)
            .send()
            .map_err(|e| DdnsError::provider("Transport", format!("{} request failed: {}", action, e)))?;

        let status_code = response.status_code;
        let body = response
            .as_str()
            .map_err(|e| DdnsError::provider("InvalidResponse", format!("{}: {}", action, e)))?;

        log::debug!("Response status: {}, body: {}", status_code, body);

        if !(200..300).contains(&status_code) {
            return Err(match serde_json::from_str::<ApiError>(body) {
                Ok(err) => DdnsError::provider(err.code, err.message),
                Err(_) => DdnsError::provider(format!("HTTP {}", status_code), body.trim()),
            });
        }

        serde_json::from_str(body)
            .map_err(|e| DdnsError::provider("InvalidResponse", format!("{}: {}", action, e)))
    }
}

impl RecordStore for AlidnsClient {
    fn list_matching(&self, name: &str, zone: &str, record_type: &str) -> Result<Vec<ProviderRecord>, DdnsError> {
        let response: DescribeDomainRecordsResponse = self.call(
            "DescribeDomainRecords",
            &[
                ("DomainName", zone),
                ("RRKeyWord", name),
                ("TypeKeyWord", record_type),
                ("PageSize", PAGE_SIZE),
            ],
        )?;

        log::info!("Get records of domain: {} ({} matching '{}')", zone, response.domain_records.records.len(), name);
        Ok(response.domain_records.records)
    }

    fn create(&self, name: &str, zone: &str, record_type: &str, value: &str, ttl: u32) -> Result<String, DdnsError> {
        let ttl = ttl.to_string();
        let response: RecordIdResponse = self.call(
            "AddDomainRecord",
            &[
                ("DomainName", zone),
                ("RR", name),
                ("Type", record_type),
                ("Value", value),
                ("TTL", ttl.as_str()),
            ],
        )?;

        log::info!("Add record: {}.{} {} -> {} (id {})", name, zone, record_type, value, response.record_id);
        Ok(response.record_id)
    }

    fn update(
        &self,
        name: &str,
        zone: &str,
        record_type: &str,
        record_id: &str,
        value: &str,
        ttl: u32,
    ) -> Result<String, DdnsError> {
        let ttl = ttl.to_string();
        let response: RecordIdResponse = self.call(
            "UpdateDomainRecord",
            &[
                ("RecordId", record_id),
                ("RR", name),
                ("Type", record_type),
                ("Value", value),
                ("TTL", ttl.as_str()),
            ],
        )?;

        log::info!("Update record: {}.{} {} -> {}", name, zone, record_type, value);
        Ok(response.record_id)
    }

    fn provider_name(&self) -> &str {
        "Alidns"
    }
}

/// Sorted `key=value` pairs, RFC 3986 encoded and joined with `&`
fn canonical_query(params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn string_to_sign(method: &str, canonical: &str) -> String {
    format!(
        "{}&{}&{}",
        method,
        urlencoding::encode("/"),
        urlencoding::encode(canonical)
    )
}

/// Base64 HMAC-SHA1 keyed with `secret&`
fn sign(secret: &str, string_to_sign: &str) -> Result<String, DdnsError> {
    let mut mac = HmacSha1::new_from_slice(format!("{}&", secret).as_bytes())
        .map_err(|e| DdnsError::provider("ClientError", format!("invalid signing key: {}", e)))?;
    mac.update(string_to_sign.as_bytes());
    Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}
