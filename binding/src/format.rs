//! String formats that can be required of a string attribute.
//!
//! Follows the json-schema validation extension vocabulary.

use chrono::{DateTime, NaiveDate};
use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
};

/// A string format.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// RFC3339 date (`2006-01-02`).
    Date,
    /// RFC3339 date and time.
    DateTime,
    /// RFC4122 UUID, optionally braced or prefixed by `urn:uuid:`.
    Uuid,
    /// RFC5322 email address.
    Email,
    /// RFC1035 host name.
    Hostname,
    Ipv4,
    Ipv6,
    /// IPv4 or IPv6 address.
    Ip,
    /// RFC3986 absolute URI or absolute path.
    Uri,
    /// IEEE 802 MAC-48, EUI-48 or EUI-64 address.
    Mac,
    /// RFC4632/RFC4291 CIDR notation.
    Cidr,
    /// A regular expression.
    Regexp,
    /// JSON text.
    Json,
    /// RFC1123 date and time.
    Rfc1123,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Date => "date",
            Format::DateTime => "date-time",
            Format::Uuid => "uuid",
            Format::Email => "email",
            Format::Hostname => "hostname",
            Format::Ipv4 => "ipv4",
            Format::Ipv6 => "ipv6",
            Format::Ip => "ip",
            Format::Uri => "uri",
            Format::Mac => "mac",
            Format::Cidr => "cidr",
            Format::Regexp => "regexp",
            Format::Json => "json",
            Format::Rfc1123 => "rfc1123",
        }
    }

    /// Checks `value`, returning a description of the problem if it does not conform.
    pub fn validate(&self, value: &str) -> Result<(), String> {
        match self {
            Format::Date => NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .map(drop)
                .map_err(|e| e.to_string()),
            Format::DateTime => DateTime::parse_from_rfc3339(value)
                .map(drop)
                .map_err(|e| e.to_string()),
            Format::Uuid => uuid::Uuid::parse_str(value)
                .map(drop)
                .map_err(|e| e.to_string()),
            Format::Email => validate_email(value),
            Format::Hostname => validate_hostname(value),
            Format::Ipv4 => value
                .parse::<Ipv4Addr>()
                .map(drop)
                .map_err(|_| format!("{value:?} is an invalid ipv4 value")),
            Format::Ipv6 => value
                .parse::<Ipv6Addr>()
                .map(drop)
                .map_err(|_| format!("{value:?} is an invalid ipv6 value")),
            Format::Ip => value
                .parse::<IpAddr>()
                .map(drop)
                .map_err(|_| format!("{value:?} is an invalid ip value")),
            Format::Uri => validate_uri(value),
            Format::Mac => validate_mac(value),
            Format::Cidr => validate_cidr(value),
            Format::Regexp => regex::Regex::new(value)
                .map(drop)
                .map_err(|e| e.to_string()),
            Format::Json => serde_json::from_str::<serde::de::IgnoredAny>(value)
                .map(drop)
                .map_err(|e| e.to_string()),
            Format::Rfc1123 => DateTime::parse_from_rfc2822(value)
                .map(drop)
                .map_err(|e| e.to_string()),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn validate_email(value: &str) -> Result<(), String> {
    // Accept `Name <local@domain>` as well as a bare address
    let address = match (value.find('<'), value.strip_suffix('>')) {
        (Some(start), Some(rest)) => &rest[start + 1..],
        _ => value,
    };
    let (local, domain) = address
        .rsplit_once('@')
        .ok_or_else(|| "missing '@' in address".to_string())?;
    if local.is_empty() || domain.is_empty() {
        return Err("empty local part or domain".to_string());
    }
    if address.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err("address contains whitespace".to_string());
    }
    Ok(())
}

fn validate_hostname(value: &str) -> Result<(), String> {
    if value.is_empty() || value.len() > 253 {
        return Err(format!("hostname {value:?} has an invalid length"));
    }
    let valid_label = |label: &str| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    };
    if !value.trim_end_matches('.').split('.').all(valid_label) {
        return Err(format!("hostname {value:?} contains an invalid label"));
    }
    Ok(())
}

fn validate_uri(value: &str) -> Result<(), String> {
    let uri = value.parse::<http::Uri>().map_err(|e| e.to_string())?;
    if uri.scheme().is_none() && !value.starts_with('/') {
        return Err(format!("{value:?} is neither an absolute URI nor an absolute path"));
    }
    Ok(())
}

fn validate_mac(value: &str) -> Result<(), String> {
    let hex_group = |group: &str, len: usize| {
        group.len() == len && group.chars().all(|c| c.is_ascii_hexdigit())
    };
    let valid = if value.contains('.') {
        // xxxx.xxxx.xxxx
        let groups: Vec<&str> = value.split('.').collect();
        matches!(groups.len(), 3 | 4) && groups.iter().all(|g| hex_group(g, 4))
    } else {
        let separator = if value.contains('-') { '-' } else { ':' };
        let groups: Vec<&str> = value.split(separator).collect();
        matches!(groups.len(), 6 | 8) && groups.iter().all(|g| hex_group(g, 2))
    };
    if !valid {
        return Err(format!("{value:?} is an invalid MAC address"));
    }
    Ok(())
}

fn validate_cidr(value: &str) -> Result<(), String> {
    let (ip, prefix) = value
        .split_once('/')
        .ok_or_else(|| format!("{value:?} is missing a prefix length"))?;
    let ip = ip
        .parse::<IpAddr>()
        .map_err(|_| format!("{value:?} has an invalid address"))?;
    let prefix = prefix
        .parse::<u8>()
        .map_err(|_| format!("{value:?} has an invalid prefix length"))?;
    let max = if ip.is_ipv4() { 32 } else { 128 };
    if prefix > max {
        return Err(format!("{value:?} has a prefix length above {max}"));
    }
    Ok(())
}
