use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RequestError;

pub const DEFAULT_COUNT: u32 = 2;

/// Raw invocation parameters, as supplied by a caller or a JSON parameter file.
///
/// Nothing here is trusted; [`PingParams::validate`] turns it into a
/// [`PingRequest`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PingParams {
    pub dest: Option<String>,
    pub count: Option<i64>,
    pub v4: Option<bool>,
    pub v6: Option<bool>,
    pub interface_name: Option<String>,
    pub interface_ip: Option<String>,
    pub interval: Option<f64>,
    pub packet_size: Option<i64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AddressFamily {
    #[default]
    Any,
    V4,
    V6,
}

/// Where echo requests are sent from. `ping -I` takes either form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    InterfaceName(String),
    InterfaceAddress(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PingRequest {
    pub destination: String,
    pub count: u32,
    pub family: AddressFamily,
    pub source: Option<Source>,
    pub interval: Option<f64>,
    pub packet_size: Option<u32>,
}

impl PingRequest {
    pub fn new(destination: impl Into<String>) -> Result<Self, RequestError> {
        let destination = destination.into();
        validate_destination(&destination)?;
        Ok(Self {
            destination,
            count: DEFAULT_COUNT,
            family: AddressFamily::Any,
            source: None,
            interval: None,
            packet_size: None,
        })
    }
}

/// Rejects destinations that would not survive as a single `ping` operand.
fn validate_destination(dest: &str) -> Result<(), RequestError> {
    if dest.trim().is_empty() {
        return Err(RequestError::EmptyDestination);
    }
    if dest.starts_with('-') || dest.chars().any(char::is_whitespace) {
        return Err(RequestError::InvalidDestination(dest.to_string()));
    }
    Ok(())
}

/// Treats a blank optional string the same as an absent one.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl PingParams {
    pub fn validate(self) -> Result<PingRequest, RequestError> {
        let destination = self.dest.ok_or(RequestError::MissingDestination)?;
        validate_destination(&destination)?;

        let count = match self.count {
            None => DEFAULT_COUNT,
            Some(c) => u32::try_from(c).map_err(|_| RequestError::InvalidCount(c))?,
        };

        let family = match (self.v4.unwrap_or(false), self.v6.unwrap_or(false)) {
            (true, true) => return Err(RequestError::ConflictingAddressFamily),
            (true, false) => AddressFamily::V4,
            (false, true) => AddressFamily::V6,
            (false, false) => AddressFamily::Any,
        };

        let source = match (non_blank(self.interface_name), non_blank(self.interface_ip)) {
            (Some(_), Some(_)) => return Err(RequestError::ConflictingSource),
            (Some(name), None) => Some(Source::InterfaceName(name)),
            (None, Some(ip)) => Some(Source::InterfaceAddress(ip)),
            (None, None) => None,
        };

        let interval = match self.interval {
            Some(i) if !i.is_finite() || i < 0.0 => return Err(RequestError::InvalidInterval(i)),
            other => other,
        };

        let packet_size = self
            .packet_size
            .map(|s| u32::try_from(s).map_err(|_| RequestError::InvalidPacketSize(s)))
            .transpose()?;

        Ok(PingRequest {
            destination,
            count,
            family,
            source,
            interval,
            packet_size,
        })
    }
}

/// Aggregate figures lifted from the utility's summary lines. Every field is
/// the literal text that was matched, units included where the utility
/// prints them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingStatistics {
    pub packet_tx: String,
    pub packet_rx: String,
    pub packet_loss: String,
    pub time_total: String,
    pub time_min: String,
    pub time_avg: String,
    pub time_max: String,
    pub time_mdev: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    Failed,
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingOutcome {
    pub status: Status,
    pub rc: i32,
    pub stdout: String,
    pub stderr: String,
    pub stdout_lines: Vec<String>,
    pub cmd: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed: Option<PingStatistics>,
}

impl PingOutcome {
    fn new(
        status: Status,
        cmd: String,
        rc: i32,
        stdout: String,
        stderr: String,
        started_at: DateTime<Utc>,
    ) -> Self {
        let stdout_lines = split_lines(&stdout);
        Self {
            status,
            rc,
            stdout,
            stderr,
            stdout_lines,
            cmd,
            started_at,
            elapsed_ms: 0,
            parsed: None,
        }
    }

    pub fn success(
        cmd: String,
        rc: i32,
        stdout: String,
        stderr: String,
        started_at: DateTime<Utc>,
        parsed: Option<PingStatistics>,
    ) -> Self {
        Self {
            parsed,
            ..Self::new(Status::Ok, cmd, rc, stdout, stderr, started_at)
        }
    }

    pub fn failure(
        cmd: String,
        rc: i32,
        stdout: String,
        stderr: String,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self::new(Status::Failed, cmd, rc, stdout, stderr, started_at)
    }

    pub fn timed_out(cmd: String, started_at: DateTime<Utc>) -> Self {
        Self::new(Status::TimedOut, cmd, -1, String::new(), String::new(), started_at)
    }

    pub fn with_elapsed(mut self, elapsed: std::time::Duration) -> Self {
        self.elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn is_failed(&self) -> bool {
        self.status != Status::Ok
    }
}

/// Splits on newlines the way line-oriented consumers expect: no trailing
/// empty entry for a final newline, carriage returns dropped.
fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(dest: &str) -> PingParams {
        PingParams {
            dest: Some(dest.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn defaults() {
        let req = params("127.0.0.1").validate().unwrap();
        assert_eq!(req.destination, "127.0.0.1");
        assert_eq!(req.count, 2);
        assert_eq!(req.family, AddressFamily::Any);
        assert_eq!(req.source, None);
        assert_eq!(req.interval, None);
        assert_eq!(req.packet_size, None);
        assert_eq!(PingRequest::new("127.0.0.1").unwrap(), req);
    }

    #[test]
    fn destination() {
        assert_eq!(PingParams::default().validate(), Err(RequestError::MissingDestination));
        assert_eq!(params("").validate(), Err(RequestError::EmptyDestination));
        assert_eq!(params("   ").validate(), Err(RequestError::EmptyDestination));
        assert_eq!(
            params("-f").validate(),
            Err(RequestError::InvalidDestination("-f".to_string()))
        );
        assert_eq!(
            params("host; rm").validate(),
            Err(RequestError::InvalidDestination("host; rm".to_string()))
        );
        assert!(params("::1").validate().is_ok());
        assert!(params("example.com").validate().is_ok());
    }

    #[test]
    fn numeric_ranges() {
        let mut p = params("h");
        p.count = Some(0);
        assert_eq!(p.clone().validate().unwrap().count, 0);
        p.count = Some(-1);
        assert_eq!(p.validate(), Err(RequestError::InvalidCount(-1)));

        let mut p = params("h");
        p.packet_size = Some(-8);
        assert_eq!(p.clone().validate(), Err(RequestError::InvalidPacketSize(-8)));
        p.packet_size = Some(1472);
        assert_eq!(p.validate().unwrap().packet_size, Some(1472));

        let mut p = params("h");
        p.interval = Some(-0.5);
        assert_eq!(p.clone().validate(), Err(RequestError::InvalidInterval(-0.5)));
        p.interval = Some(0.2);
        assert_eq!(p.validate().unwrap().interval, Some(0.2));
    }

    #[test]
    fn exclusive_flags() {
        let mut p = params("h");
        p.v4 = Some(true);
        p.v6 = Some(true);
        assert_eq!(p.clone().validate(), Err(RequestError::ConflictingAddressFamily));
        p.v6 = Some(false);
        assert_eq!(p.validate().unwrap().family, AddressFamily::V4);

        let mut p = params("h");
        p.interface_name = Some("eth0".to_string());
        p.interface_ip = Some("10.0.0.1".to_string());
        assert_eq!(p.clone().validate(), Err(RequestError::ConflictingSource));
        p.interface_ip = Some(String::new());
        assert_eq!(
            p.validate().unwrap().source,
            Some(Source::InterfaceName("eth0".to_string()))
        );
    }

    #[test]
    fn params_from_json() {
        let json = r#"{"dest": "127.0.0.1", "count": 4, "v6": true}"#;
        let p: PingParams = serde_json::from_str(json).unwrap();
        let req = p.validate().unwrap();
        assert_eq!(req.count, 4);
        assert_eq!(req.family, AddressFamily::V6);

        assert!(serde_json::from_str::<PingParams>(r#"{"dest": "h", "bogus": 1}"#).is_err());
    }

    #[test]
    fn outcome_shape() {
        let out = PingOutcome::failure(
            "ping -c 2 nowhere".to_string(),
            1,
            "bash: ping: command not found".to_string(),
            String::new(),
            Utc::now(),
        );
        assert!(out.is_failed());
        assert_eq!(out.stdout_lines, vec!["bash: ping: command not found"]);

        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["rc"], 1);
        assert!(json.get("parsed").is_none());
    }
}
