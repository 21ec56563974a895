/// ddclient-style configuration parser
///
/// This module parses the ddclient configuration format:
/// - key=value pairs (comma-separated or on separate lines)
/// - Backslash line continuation
/// - Global defaults that apply to subsequent blocks
/// - Record blocks terminated by bare record names
///
/// Example:
/// ```text
/// login=your-access-key-id, \
/// password=your-access-key-secret
/// dingtalk-token=your-dingtalk-access-token
///
/// zone=example.com, type=A
/// home, nas
///
/// type=AAAA
/// home
/// ```
use crate::record::{RecordSpec, RecordType};
use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

/// Config file read when `--file` is not given
pub const DEFAULT_CONFIG_PATH: &str = "aliddns.conf";

/// Keys that describe the account or the notification sink rather than a record.
/// They always land in the global section, wherever they appear.
const GLOBAL_KEYS: &[&str] = &[
    "login",
    "password",
    "server",
    "web4",
    "web6",
    "timeout",
    "notify",
    "notify-unchanged",
    "dingtalk-token",
    "dingtalk-secret",
    "dingtalk-server",
];

// Main Config struct used throughout the codebase
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// AccessKey ID
    pub login: Option<String>,
    /// AccessKey secret
    pub password: Option<String>,
    /// Alidns API endpoint
    pub server: Option<String>,
    pub web4: Option<String>,
    pub web6: Option<String>,
    /// Request timeout in seconds
    pub timeout: Option<u64>,
    pub notify: bool,
    pub notify_unchanged: bool,
    pub dingtalk_token: Option<String>,
    pub dingtalk_secret: Option<String>,
    pub dingtalk_server: Option<String>,
    pub records: Vec<RecordSpec>,
}

impl Config {
    /// Load a ddclient-formatted configuration file.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the file cannot be read or a value cannot be parsed.
    pub fn from_file(path: &str) -> Result<Self, Box<dyn Error>> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path, e))?;
        Self::parse(&content)
    }

    /// Parse configuration text into a Config.
    pub fn parse(content: &str) -> Result<Self, Box<dyn Error>> {
        let parsed = DdclientConfig::parse(content);
        Self::from_parsed(parsed)
    }

    fn from_parsed(parsed: DdclientConfig) -> Result<Self, Box<dyn Error>> {
        let globals = &parsed.globals;

        let timeout = match globals.get("timeout") {
            Some(value) => Some(parse_interval(value)?),
            None => None,
        };

        let records = parsed
            .blocks
            .iter()
            .map(|block| {
                RecordSpec::new(
                    block.get("host").cloned().unwrap_or_default(),
                    block.get("zone").cloned().unwrap_or_default(),
                    RecordType::parse(block.get("type").map(String::as_str).unwrap_or("A")),
                )
            })
            .collect();

        Ok(Config {
            login: globals.get("login").cloned(),
            password: globals.get("password").cloned(),
            server: globals.get("server").cloned(),
            web4: globals.get("web4").cloned(),
            web6: globals.get("web6").cloned(),
            timeout,
            notify: parse_bool("notify", globals.get("notify"), true)?,
            notify_unchanged: parse_bool("notify-unchanged", globals.get("notify-unchanged"), false)?,
            dingtalk_token: globals.get("dingtalk-token").cloned(),
            dingtalk_secret: globals.get("dingtalk-secret").cloned(),
            dingtalk_server: globals.get("dingtalk-server").cloned(),
            records,
        })
    }

    /// Combine an optional file-derived Config with CLI arguments, using CLI values when provided.
    pub fn merge(file_config: Option<Self>, args: &crate::args::Args) -> Self {
        let base = file_config.unwrap_or_else(|| Config {
            notify: true,
            ..Default::default()
        });

        Config {
            login: args.login.clone().or(base.login),
            password: args.password.clone().or(base.password),
            server: args.server.clone().or(base.server),
            notify: base.notify && !args.no_notify,
            ..base
        }
    }

    /// Load configuration from `args.file` (or the default path) and merge it with CLI arguments.
    ///
    /// An explicitly requested file must exist; the default path is optional.
    pub fn load(args: &crate::args::Args) -> Result<Self, Box<dyn Error>> {
        let file_config = match args.file.as_deref() {
            Some(path) => Some(Self::from_file(path)?),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Some(Self::from_file(DEFAULT_CONFIG_PATH)?),
            None => None,
        };

        Ok(Self::merge(file_config, args))
    }

    /// Ensures the config has credentials and at least one well-formed record.
    ///
    /// Unsupported record types are deliberately not rejected here; they fail
    /// individually during the run.
    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.login.as_deref().unwrap_or("").is_empty() {
            return Err("AccessKey ID is required (use login= or --login)".into());
        }
        if self.password.as_deref().unwrap_or("").is_empty() {
            return Err("AccessKey secret is required (use password= or --password)".into());
        }
        if self.records.is_empty() {
            return Err("No records configured".into());
        }
        for record in &self.records {
            if record.name.is_empty() {
                return Err(format!("Record in zone '{}' has an empty name", record.zone).into());
            }
            if record.zone.is_empty() {
                return Err(format!("Record '{}' has no zone (use zone=)", record.name).into());
            }
        }
        if self.notify && self.dingtalk_token.as_deref().unwrap_or("").is_empty() {
            log::warn!("Notifications are enabled but no dingtalk-token is configured");
        }

        Ok(())
    }
}

fn parse_bool(key: &str, value: Option<&String>, default: bool) -> Result<bool, Box<dyn Error>> {
    match value.map(|s| s.to_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "yes" | "true" | "1" => Ok(true),
            "no" | "false" | "0" => Ok(false),
            _ => Err(format!("Invalid value for {}: '{}' (use yes or no)", key, v).into()),
        },
    }
}

// Internal parsing structures
#[derive(Debug, Clone, Default)]
struct DdclientConfig {
    globals: HashMap<String, String>,
    /// Record keys in effect for each record, with the record name under "host"
    blocks: Vec<HashMap<String, String>>,
}

impl DdclientConfig {
    /// Parse ddclient-formatted configuration text.
    ///
    /// Record keys (`zone`, `type`) keep their value until assigned again, so a
    /// bare name always picks up the most recent ones. Account and
    /// notification keys are always global.
    fn parse(content: &str) -> Self {
        let mut parsed = DdclientConfig::default();
        let mut current: HashMap<String, String> = HashMap::new();
        let mut pending: Vec<String> = Vec::new();

        // Join lines that end with backslash
        let normalized = Self::join_continued_lines(content);

        for line in normalized.lines() {
            let line = line.trim();

            // Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut found_names = Vec::new();

            for part in line.split(',').map(|s| s.trim()) {
                if let Some((key, value)) = part.split_once('=') {
                    let key = key.trim().to_lowercase();
                    let value = value.trim();

                    // A value followed by a space is "value name", unless the rest is a comment
                    let (value, rest) = match value.split_once(' ') {
                        Some((value, rest)) => (value.trim(), rest.trim()),
                        None => (value, ""),
                    };
                    if !rest.is_empty() && !rest.starts_with('#') {
                        found_names.push(rest);
                    }

                    if GLOBAL_KEYS.contains(&key.as_str()) {
                        parsed.globals.insert(key, value.to_string());
                    } else {
                        pending.push(key.clone());
                        current.insert(key, value.to_string());
                    }
                } else if !part.is_empty() && !part.starts_with('#') {
                    found_names.push(part);
                }
            }

            // Names close the block using the record keys in effect
            if !found_names.is_empty() {
                for name in found_names {
                    let mut block = current.clone();
                    block.insert("host".to_string(), name.to_string());
                    parsed.blocks.push(block);
                }
                pending.clear();
            }
        }

        if !pending.is_empty() {
            log::warn!("Ignoring trailing settings with no record name: {:?}", pending);
        }

        parsed
    }

    /// Collapse lines ending with a backslash into single lines joined by a space.
    fn join_continued_lines(content: &str) -> String {
        let mut result = String::new();
        let mut current_line = String::new();

        for line in content.lines() {
            let trimmed = line.trim_end();

            if let Some(stripped) = trimmed.strip_suffix('\\') {
                current_line.push_str(stripped);
                current_line.push(' ');
            } else {
                current_line.push_str(trimmed);
                result.push_str(&current_line);
                result.push('\n');
                current_line.clear();
            }
        }

        if !current_line.is_empty() {
            result.push_str(&current_line);
            result.push('\n');
        }

        result
    }
}

/// Convert a duration string with a single-unit suffix into a number of seconds.
///
/// Accepts a number followed by `s`, `m`, `h` or `d`. A bare number is taken as seconds.
pub fn parse_interval(interval: &str) -> Result<u64, Box<dyn Error>> {
    let interval = interval.trim();
    if interval.is_empty() {
        return Err("Interval cannot be empty".into());
    }

    if let Ok(secs) = interval.parse::<u64>() {
        return Ok(secs);
    }

    let (split, unit) = interval
        .char_indices()
        .last()
        .ok_or("Interval cannot be empty")?;
    let num_str = &interval[..split];
    let num: u64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number in interval: '{}'", num_str))?;

    let multiplier = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3600,
        'd' => 86400,
        _ => return Err(format!("Invalid interval unit '{}'. Use s, m, h, or d", unit).into()),
    };
    let seconds = num
        .checked_mul(multiplier)
        .ok_or_else(|| format!("Interval too large: '{}'", interval))?;

    Ok(seconds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_simple_config() {
        let config = r#"
login=key-id
password=key-secret
zone=example.com
home
"#;

        let parsed = Config::parse(config).unwrap();
        assert_eq!(parsed.login.as_deref(), Some("key-id"));
        assert_eq!(parsed.password.as_deref(), Some("key-secret"));
        assert_eq!(parsed.records, vec![RecordSpec::new("home", "example.com", RecordType::A)]);
        assert!(parsed.notify);
        assert!(!parsed.notify_unchanged);
    }

    #[test]
    fn test_parse_comma_separated() {
        let config = r#"
login=key-id, password=key-secret, zone=example.com, type=AAAA
home,nas
"#;

        let parsed = Config::parse(config).unwrap();
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0].name, "home");
        assert_eq!(parsed.records[1].name, "nas");
        assert!(parsed.records.iter().all(|r| r.record_type == RecordType::Aaaa));
    }

    #[test]
    fn test_parse_backslash_continuation() {
        let config = r#"
login=key-id, \
password=key-secret, \
zone=example.com \
home
"#;

        let parsed = Config::parse(config).unwrap();
        assert_eq!(parsed.password.as_deref(), Some("key-secret"));
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].zone, "example.com");
        assert_eq!(parsed.records[0].name, "home");
    }

    #[test]
    fn test_blocks_inherit_globals() {
        let config = r#"
login=key-id
password=key-secret
zone=example.com
type=A
home

type=AAAA
home

zone=example.org
type=A
@
"#;

        let parsed = Config::parse(config).unwrap();
        assert_eq!(
            parsed.records,
            vec![
                RecordSpec::new("home", "example.com", RecordType::A),
                RecordSpec::new("home", "example.com", RecordType::Aaaa),
                RecordSpec::new("@", "example.org", RecordType::A),
            ]
        );
    }

    #[test]
    fn test_account_keys_are_global_anywhere() {
        let config = r#"
zone=example.com
home
dingtalk-token=abc, notify=no
type=AAAA
home
"#;

        let parsed = Config::parse(config).unwrap();
        assert_eq!(parsed.dingtalk_token.as_deref(), Some("abc"));
        assert!(!parsed.notify);
        assert_eq!(parsed.records.len(), 2);
    }

    #[test]
    fn test_unknown_type_is_kept() {
        let config = r#"
zone=example.com, type=CNAME
www
"#;

        let parsed = Config::parse(config).unwrap();
        assert_eq!(parsed.records[0].record_type, RecordType::Unsupported("CNAME".to_string()));
    }

    #[test]
    fn test_ignore_comments() {
        let config = r#"
# This is a comment
zone=example.com
# Another comment
home
"#;

        let parsed = Config::parse(config).unwrap();
        assert_eq!(parsed.records.len(), 1);
    }

    #[test]
    fn test_notification_settings() {
        let config = r#"
notify=yes
notify-unchanged=true
dingtalk-token=token
dingtalk-secret=SECabc
timeout=30s
zone=example.com
home
"#;

        let parsed = Config::parse(config).unwrap();
        assert!(parsed.notify);
        assert!(parsed.notify_unchanged);
        assert_eq!(parsed.dingtalk_secret.as_deref(), Some("SECabc"));
        assert_eq!(parsed.timeout, Some(30));
    }

    #[test]
    fn test_invalid_bool() {
        let config = "notify=maybe\nzone=example.com\nhome\n";
        assert!(Config::parse(config).is_err());
    }

    #[test]
    fn test_validate() {
        let valid = Config::parse("login=id\npassword=secret\nzone=example.com\nhome\n").unwrap();
        assert!(valid.validate().is_ok());

        let no_login = Config::parse("password=secret\nzone=example.com\nhome\n").unwrap();
        assert!(no_login.validate().unwrap_err().to_string().contains("AccessKey ID"));

        let no_records = Config::parse("login=id\npassword=secret\n").unwrap();
        assert!(no_records.validate().unwrap_err().to_string().contains("No records"));

        let no_zone = Config::parse("login=id\npassword=secret\nhome\n").unwrap();
        assert!(no_zone.validate().unwrap_err().to_string().contains("no zone"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "login=id, password=secret").unwrap();
        writeln!(file, "zone=example.com, type=A").unwrap();
        writeln!(file, "home").unwrap();

        let parsed = Config::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_from_missing_file() {
        let err = Config::from_file("/nonexistent/aliddns.conf").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_parse_interval() {
        assert_eq!(parse_interval("30s").unwrap(), 30);
        assert_eq!(parse_interval("5m").unwrap(), 300);
        assert_eq!(parse_interval("2h").unwrap(), 7200);
        assert_eq!(parse_interval("1d").unwrap(), 86400);
        assert_eq!(parse_interval("15").unwrap(), 15);
        assert!(parse_interval("invalid").is_err());
        assert!(parse_interval("").is_err());
    }

    #[test]
    fn test_parse_interval_rejects_bad_suffix() {
        assert!(parse_interval("5é").is_err());
        assert!(parse_interval("é").is_err());
        assert!(parse_interval("5x").is_err());
        assert!(parse_interval(&format!("{}d", u64::MAX / 2)).is_err());
    }

    #[test]
    fn test_zone_and_type_persist_across_records() {
        let config = r#"
zone=a.com
home
zone=b.com
www
nas
type=AAAA
nas
router
"#;

        let parsed = Config::parse(config).unwrap();
        assert_eq!(
            parsed.records,
            vec![
                RecordSpec::new("home", "a.com", RecordType::A),
                RecordSpec::new("www", "b.com", RecordType::A),
                RecordSpec::new("nas", "b.com", RecordType::A),
                RecordSpec::new("nas", "b.com", RecordType::Aaaa),
                RecordSpec::new("router", "b.com", RecordType::Aaaa),
            ]
        );
    }
}
