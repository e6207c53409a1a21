//! `format` keyword checks. Unknown formats always pass.

use std::net::{Ipv4Addr, Ipv6Addr};

use chrono::{DateTime, NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::pointer::Pointer;

static EMAIL_RE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$").ok()
});

static HOSTNAME_RE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*$").ok()
});

static COLOR_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^#(?:[0-9A-Fa-f]{3}){1,2}$").ok());

static UUID_RE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^[0-9A-Fa-f]{8}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{4}-[0-9A-Fa-f]{12}$").ok()
});

static TIME_ZONE_RE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?:[Zz]|[+-]\d{2}:\d{2})$").ok());

fn matches(re: &Lazy<Option<Regex>>, s: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(s))
}

/// True if `s` is a valid instance of `format`.
pub fn is_valid_format(format: &str, s: &str) -> bool {
    match format {
        "date" => NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok(),
        "date-time" => DateTime::parse_from_rfc3339(s).is_ok(),
        "time" => is_valid_time(s),
        "email" => matches(&EMAIL_RE, s),
        "hostname" => s.len() <= 253 && matches(&HOSTNAME_RE, s),
        "ipv4" => s.parse::<Ipv4Addr>().is_ok(),
        "ipv6" => s.parse::<Ipv6Addr>().is_ok(),
        "uri" | "url" => Url::parse(s).is_ok(),
        "uri-reference" => is_valid_uri_reference(s),
        "color" => matches(&COLOR_RE, s),
        "uuid" => matches(&UUID_RE, s),
        "json-pointer" => s.is_empty() || (s.starts_with('/') && Pointer::parse(s).is_ok()),
        "regex" => Regex::new(s).is_ok(),
        _ => true,
    }
}

fn is_valid_time(s: &str) -> bool {
    let local = match TIME_ZONE_RE.as_ref().and_then(|re| re.find(s)) {
        Some(zone) => &s[..zone.start()],
        None => s,
    };
    NaiveTime::parse_from_str(local, "%H:%M:%S%.f").is_ok()
        || NaiveTime::parse_from_str(local, "%H:%M").is_ok()
}

fn is_valid_uri_reference(s: &str) -> bool {
    if Url::parse(s).is_ok() {
        return true;
    }
    Url::parse("file:///")
        .ok()
        .is_some_and(|base| !s.contains(' ') && base.join(s).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dates_and_times() {
        assert!(is_valid_format("date", "2020-02-29"));
        assert!(!is_valid_format("date", "2021-02-29"));
        assert!(is_valid_format("date-time", "2020-01-01T00:00:00Z"));
        assert!(is_valid_format("date-time", "2020-01-01T10:20:30.5+02:00"));
        assert!(!is_valid_format("date-time", "2020-01-01"));
        assert!(is_valid_format("time", "10:20:30Z"));
        assert!(is_valid_format("time", "10:20"));
        assert!(!is_valid_format("time", "25:00"));
    }

    #[test]
    fn test_network_formats() {
        assert!(is_valid_format("email", "someone@example.com"));
        assert!(!is_valid_format("email", "someone@"));
        assert!(is_valid_format("ipv4", "192.168.0.1"));
        assert!(!is_valid_format("ipv4", "192.168.0"));
        assert!(is_valid_format("ipv6", "::1"));
        assert!(is_valid_format("uri", "https://example.com/a?b=c"));
        assert!(!is_valid_format("uri", "not a uri"));
        assert!(is_valid_format("uri-reference", "../a/b"));
        assert!(is_valid_format("hostname", "example.com"));
    }

    #[test]
    fn test_misc_formats() {
        assert!(is_valid_format("color", "#a0b"));
        assert!(is_valid_format("color", "#A0B1C2"));
        assert!(!is_valid_format("color", "red"));
        assert!(is_valid_format("json-pointer", "/a/b~1c"));
        assert!(!is_valid_format("json-pointer", "a/b"));
        assert!(is_valid_format("unknown-format", "anything"));
    }
}
