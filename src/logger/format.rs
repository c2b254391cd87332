//! Access log lines
//!
//! `combined` and `common` follow the Apache/Nginx layouts, `json` emits one
//! object per request, anything else is a pattern with `$variables`.

use chrono::{DateTime, Local};
use hyper::{Method, Uri, Version};
use std::net::SocketAddr;

const CLF_TIME: &str = "%d/%b/%Y:%H:%M:%S %z";

/// Access log layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Combined,
    Common,
    Json,
    /// Pattern with `$remote_addr`, `$time_local`, `$time_iso8601`,
    /// `$request`, `$request_method`, `$request_uri`, `$status`,
    /// `$body_bytes_sent`, `$http_referer`, `$http_user_agent` and
    /// `$request_time` (seconds, three decimals)
    Custom(String),
}

impl From<&str> for LogFormat {
    fn from(s: &str) -> Self {
        match s {
            "combined" => Self::Combined,
            "common" => Self::Common,
            "json" => Self::Json,
            pattern => Self::Custom(pattern.to_string()),
        }
    }
}

/// One served request
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    pub remote_addr: String,
    pub time: DateTime<Local>,
    pub method: String,
    pub uri: String,
    pub http_version: &'static str,
    pub status: u16,
    pub body_bytes: usize,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
    pub request_time_us: u64,
}

impl AccessLogEntry {
    /// Entry stamped with the current time; response fields start at `200`/`0`
    pub fn new(remote_addr: Option<SocketAddr>, method: &Method, uri: &Uri, version: Version) -> Self {
        Self {
            remote_addr: remote_addr.map_or_else(|| "-".to_string(), |a| a.ip().to_string()),
            time: Local::now(),
            method: method.to_string(),
            uri: uri
                .path_and_query()
                .map_or_else(|| uri.path().to_string(), ToString::to_string),
            http_version: version_str(version),
            status: 200,
            body_bytes: 0,
            referer: None,
            user_agent: None,
            request_time_us: 0,
        }
    }

    pub fn format(&self, format: &LogFormat) -> String {
        match format {
            LogFormat::Combined => format!(
                "{} \"{}\" \"{}\"",
                self.common_line(),
                self.referer.as_deref().unwrap_or("-"),
                self.user_agent.as_deref().unwrap_or("-"),
            ),
            LogFormat::Common => self.common_line(),
            LogFormat::Json => serde_json::json!({
                "remote_addr": self.remote_addr,
                "time": self.time.to_rfc3339(),
                "method": self.method,
                "uri": self.uri,
                "http_version": self.http_version,
                "status": self.status,
                "body_bytes": self.body_bytes,
                "referer": self.referer,
                "user_agent": self.user_agent,
                "request_time_us": self.request_time_us,
            })
            .to_string(),
            LogFormat::Custom(pattern) => self.format_custom(pattern),
        }
    }

    fn request_line(&self) -> String {
        format!("{} {} HTTP/{}", self.method, self.uri, self.http_version)
    }

    fn common_line(&self) -> String {
        format!(
            "{} - - [{}] \"{}\" {} {}",
            self.remote_addr,
            self.time.format(CLF_TIME),
            self.request_line(),
            self.status,
            self.body_bytes,
        )
    }

    fn format_custom(&self, pattern: &str) -> String {
        #[allow(clippy::cast_precision_loss)]
        let request_time = self.request_time_us as f64 / 1_000_000.0;

        // `$request_*` before `$request`
        [
            ("$remote_addr", self.remote_addr.clone()),
            ("$time_local", self.time.format(CLF_TIME).to_string()),
            ("$time_iso8601", self.time.to_rfc3339()),
            ("$request_time", format!("{request_time:.3}")),
            ("$request_method", self.method.clone()),
            ("$request_uri", self.uri.clone()),
            ("$request", self.request_line()),
            ("$status", self.status.to_string()),
            ("$body_bytes_sent", self.body_bytes.to_string()),
            ("$http_referer", self.referer.clone().unwrap_or_else(|| "-".into())),
            ("$http_user_agent", self.user_agent.clone().unwrap_or_else(|| "-".into())),
        ]
        .iter()
        .fold(pattern.to_string(), |acc, (var, value)| acc.replace(var, value))
    }
}

const fn version_str(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> AccessLogEntry {
        let uri: Uri = "/blog/post.html?ref=feed".parse().unwrap();
        let mut entry = AccessLogEntry::new(
            Some("192.168.1.1:51000".parse().unwrap()),
            &Method::GET,
            &uri,
            Version::HTTP_11,
        );
        entry.status = 200;
        entry.body_bytes = 1234;
        entry.referer = Some("https://example.com".to_string());
        entry.user_agent = Some("Mozilla/5.0".to_string());
        entry.request_time_us = 1_250_000;
        entry
    }

    #[test]
    fn test_format_combined() {
        let log = entry().format(&LogFormat::Combined);
        assert!(log.starts_with("192.168.1.1 - - ["));
        assert!(log.contains("\"GET /blog/post.html?ref=feed HTTP/1.1\" 200 1234"));
        assert!(log.ends_with("\"https://example.com\" \"Mozilla/5.0\""));
    }

    #[test]
    fn test_format_common_omits_agent() {
        let log = entry().format(&LogFormat::from("common"));
        assert!(log.contains("200 1234"));
        assert!(!log.contains("Mozilla"));
    }

    #[test]
    fn test_format_json() {
        let log = entry().format(&LogFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&log).unwrap();
        assert_eq!(value["status"], 200);
        assert_eq!(value["uri"], "/blog/post.html?ref=feed");
        assert_eq!(value["referer"], "https://example.com");
    }

    #[test]
    fn test_format_custom() {
        let log = entry().format(&LogFormat::from("$request_method $request_uri $status $request_time"));
        assert_eq!(log, "GET /blog/post.html?ref=feed 200 1.250");
    }

    #[test]
    fn test_missing_peer() {
        let e = AccessLogEntry::new(None, &Method::HEAD, &"/".parse().unwrap(), Version::HTTP_10);
        assert!(e.format(&LogFormat::Common).starts_with("- - - ["));
        assert!(e.format(&LogFormat::Common).contains("\"HEAD / HTTP/1.0\""));
    }
}
