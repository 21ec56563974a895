use crate::config::Config;
use crate::error::DdnsError;
use crate::notify::MessageSink;
use base64::{engine::general_purpose, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;
use std::error::Error;
use time::OffsetDateTime;

type HmacSha256 = Hmac<Sha256>;

pub const DEFAULT_SERVER: &str = "https://oapi.dingtalk.com";

/// DingTalk custom robot webhook - https://open.dingtalk.com/document/robots/custom-robot-access
///
/// When a secret is configured every request carries a `timestamp` and an
/// HMAC-SHA256 `sign` query parameter.
pub struct DingTalkSink {
    access_token: String,
    secret: Option<String>,
    server: String,
    timeout: u64,
}

#[derive(Deserialize)]
struct RobotResponse {
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
}

impl DingTalkSink {
    /// Creates a `DingTalkSink` from `dingtalk-token`, `dingtalk-secret` and `dingtalk-server`.
    ///
    /// # Errors
    ///
    /// Returns an error if no access token is configured.
    pub fn new(config: &Config) -> Result<Self, Box<dyn Error>> {
        let access_token = config.dingtalk_token.as_ref()
            .filter(|s| !s.is_empty())
            .ok_or("dingtalk-token is required for DingTalk notifications")?
            .clone();
        let secret = config.dingtalk_secret.clone().filter(|s| !s.is_empty());
        let server = config.dingtalk_server.as_deref()
            .unwrap_or(DEFAULT_SERVER)
            .trim_end_matches('/')
            .to_string();

        Ok(DingTalkSink {
            access_token,
            secret,
            server,
            timeout: config.timeout.unwrap_or(crate::ip::DEFAULT_TIMEOUT),
        })
    }

    /// Webhook URL, signed with `timestamp_ms` when a secret is set
    fn webhook_url(&self, timestamp_ms: i128) -> Result<String, DdnsError> {
        let mut url = format!(
            "{}/robot/send?access_token={}",
            self.server,
            urlencoding::encode(&self.access_token)
        );

        if let Some(secret) = &self.secret {
            let sign = sign(secret, timestamp_ms)?;
            url.push_str(&format!("&timestamp={}&sign={}", timestamp_ms, urlencoding::encode(&sign)));
        }

        Ok(url)
    }
}

impl MessageSink for DingTalkSink {
    fn send(&self, title: &str, body: &str) -> Result<(), DdnsError> {
        let timestamp_ms = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let url = self.webhook_url(timestamp_ms)?;

        let payload = json!({
            "msgtype": "markdown",
            "markdown": {
                "title": title,
                "text": body,
            }
        });

        let response = minreq::post(&url)
            .with_header("User-Agent", crate::USER_AGENT)
            .with_header("Content-Type", "application/json")
            .with_timeout(self.timeout)
            .with_json(&payload)
            .map_err(|e| DdnsError::notification(format!("cannot encode message: {}", e)))?
            .send()
            .map_err(|e| DdnsError::notification(format!("request failed: {}", e)))?;

        let status_code = response.status_code;
        if !(200..300).contains(&status_code) {
            return Err(DdnsError::notification(format!("HTTP error: {}", status_code)));
        }

        let reply: RobotResponse = response
            .json()
            .map_err(|e| DdnsError::notification(format!("unexpected response: {}", e)))?;
        if reply.errcode != 0 {
            return Err(DdnsError::notification(format!(
                "DingTalk error {}: {}",
                reply.errcode, reply.errmsg
            )));
        }

        Ok(())
    }

    fn sink_name(&self) -> &str {
        "DingTalk"
    }
}

/// Base64 HMAC-SHA256 of `"{timestamp}\n{secret}"` keyed with the secret
fn sign(secret: &str, timestamp_ms: i128) -> Result<String, DdnsError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| DdnsError::notification(format!("invalid signing key: {}", e)))?;
    mac.update(format!("{}\n{}", timestamp_ms, secret).as_bytes());
    Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}
