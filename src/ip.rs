use crate::config::Config;
use crate::error::DdnsError;
use crate::record::AddressFamily;
use std::net::IpAddr;

/// Default IPv4-only discovery service
pub const DEFAULT_IPV4_URL: &str = "https://api.ipify.org";
/// Default IPv6-only discovery service
pub const DEFAULT_IPV6_URL: &str = "https://api6.ipify.org";
/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT: u64 = 10;

/// Source of the host's current public address
pub trait AddressResolver {
    /// Resolve the public address for `family`. Never returns an address of the other family.
    fn resolve(&self, family: AddressFamily) -> Result<IpAddr, DdnsError>;
}

/// Resolves the public address by asking a plain-text web service, one URL per family
#[derive(Debug, Clone)]
pub struct WebResolver {
    ipv4_url: String,
    ipv6_url: String,
    timeout: u64,
}

impl WebResolver {
    pub fn new(config: &Config) -> Self {
        Self {
            ipv4_url: config.web4.clone().unwrap_or_else(|| DEFAULT_IPV4_URL.to_string()),
            ipv6_url: config.web6.clone().unwrap_or_else(|| DEFAULT_IPV6_URL.to_string()),
            timeout: config.timeout.unwrap_or(DEFAULT_TIMEOUT),
        }
    }

    fn url_for(&self, family: AddressFamily) -> &str {
        match family {
            AddressFamily::V4 => &self.ipv4_url,
            AddressFamily::V6 => &self.ipv6_url,
        }
    }

    /// Fetch the service body, trimmed
    fn try_service(&self, url: &str) -> Result<String, DdnsError> {
        let resp = minreq::get(url)
            .with_header("User-Agent", crate::USER_AGENT)
            .with_timeout(self.timeout)
            .send()
            .map_err(|e| DdnsError::resolution(format!("request to {} failed: {}", url, e)))?;

        if !(200..300).contains(&resp.status_code) {
            return Err(DdnsError::resolution(format!(
                "{} returned HTTP {}",
                url, resp.status_code
            )));
        }

        let body = resp
            .as_str()
            .map_err(|e| DdnsError::resolution(format!("unreadable response from {}: {}", url, e)))?;
        Ok(body.trim().to_string())
    }
}

impl AddressResolver for WebResolver {
    fn resolve(&self, family: AddressFamily) -> Result<IpAddr, DdnsError> {
        let url = self.url_for(family);
        log::debug!("Resolving public {} address via {}", family, url);

        let body = self.try_service(url)?;
        let ip = parse_ip(&body, family)?;

        log::info!("Public {} address: {}", family, ip);
        Ok(ip)
    }
}

/// Parse an address literal and make sure it belongs to `family`
pub fn parse_ip(ip_str: &str, family: AddressFamily) -> Result<IpAddr, DdnsError> {
    let ip: IpAddr = ip_str.parse().map_err(|e| {
        DdnsError::resolution(format!("'{}' is an invalid IP address: {}", ip_str, e))
    })?;

    if !family.matches(&ip) {
        return Err(DdnsError::resolution(format!(
            "'{}' is not a valid {} address",
            ip_str, family
        )));
    }

    Ok(ip)
}
