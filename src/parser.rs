//! Line-oriented recognizer for iputils-style `ping` output.
//!
//! The output is read as four stages that must appear in order: the `PING`
//! header, at least one echo reply, the packet summary and the round-trip
//! summary. Each stage has its own recognizer so that it can be exercised
//! on its own; [`parse`] chains them over the lines of the text.
//!
//! Captured values are kept as the literal text that was matched. Nothing is
//! converted to a number, so locale or precision quirks in the utility's
//! output come through untouched.

use log::{debug, trace};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::ping::PingStatistics;

static RE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^PING\b[^(]*\(([^)]*)\)\s([^.]*)\.?").unwrap());
static RE_REPLY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+\sbytes).*?icmp_seq=(\d+).*?ttl=(\d+).*?time=(.*?ms)").unwrap()
});
static RE_SUMMARY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(\d+)\spackets\stransmitted",
        r".*?(\d+)\sreceived",
        r".*?(\d+(?:\.\d+)?%)\spacket\sloss",
        r".*?time\s(\d+ms)",
    ))
    .unwrap()
});
static RE_RTT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"=\s([^/]*)/([^/]*)/([^/]*)/(.*?)\sms").unwrap());

/// `PING 127.0.0.1 (127.0.0.1) 56(84) bytes of data.`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header<'a> {
    pub address: &'a str,
    pub payload: &'a str,
}

/// `64 bytes from 127.0.0.1: icmp_seq=1 ttl=64 time=0.061 ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reply<'a> {
    pub size: &'a str,
    pub icmp_seq: &'a str,
    pub ttl: &'a str,
    pub time: &'a str,
}

/// `2 packets transmitted, 2 received, 0% packet loss, time 1013ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary<'a> {
    pub transmitted: &'a str,
    pub received: &'a str,
    pub loss: &'a str,
    pub total: &'a str,
}

/// `rtt min/avg/max/mdev = 0.061/0.061/0.061/0.000 ms`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rtt<'a> {
    pub min: &'a str,
    pub avg: &'a str,
    pub max: &'a str,
    pub mdev: &'a str,
}

pub fn parse_header(line: &str) -> Option<Header<'_>> {
    let caps = RE_HEADER.captures(line)?;
    Some(Header {
        address: caps.get(1)?.as_str(),
        payload: caps.get(2)?.as_str(),
    })
}

pub fn parse_reply(line: &str) -> Option<Reply<'_>> {
    let caps = RE_REPLY.captures(line)?;
    Some(Reply {
        size: caps.get(1)?.as_str(),
        icmp_seq: caps.get(2)?.as_str(),
        ttl: caps.get(3)?.as_str(),
        time: caps.get(4)?.as_str(),
    })
}

pub fn parse_summary(line: &str) -> Option<Summary<'_>> {
    let caps = RE_SUMMARY.captures(line)?;
    Some(Summary {
        transmitted: caps.get(1)?.as_str(),
        received: caps.get(2)?.as_str(),
        loss: caps.get(3)?.as_str(),
        total: caps.get(4)?.as_str(),
    })
}

pub fn parse_rtt(line: &str) -> Option<Rtt<'_>> {
    let caps = RE_RTT.captures(line)?;
    Some(Rtt {
        min: caps.get(1)?.as_str(),
        avg: caps.get(2)?.as_str(),
        max: caps.get(3)?.as_str(),
        mdev: caps.get(4)?.as_str(),
    })
}

/// Extracts the statistics record, or `None` if any stage is missing.
pub fn parse(stdout: &str) -> Option<PingStatistics> {
    let mut lines = stdout.lines();

    let Some(header) = lines.by_ref().find_map(parse_header) else {
        debug!("No PING header line in output");
        return None;
    };
    trace!("Header: {header:?}");

    let Some(reply) = lines.by_ref().find_map(parse_reply) else {
        debug!("No echo reply after header for {}", header.address);
        return None;
    };
    trace!("First reply: {reply:?}");

    let Some(summary) = lines.by_ref().find_map(parse_summary) else {
        debug!("No packet summary line for {}", header.address);
        return None;
    };

    let Some(rtt) = lines.find_map(parse_rtt) else {
        debug!("No round-trip summary line for {}", header.address);
        return None;
    };

    Some(PingStatistics {
        packet_tx: summary.transmitted.to_string(),
        packet_rx: summary.received.to_string(),
        packet_loss: summary.loss.to_string(),
        time_total: summary.total.to_string(),
        time_min: rtt.min.to_string(),
        time_avg: rtt.avg.to_string(),
        time_max: rtt.max.to_string(),
        time_mdev: rtt.mdev.to_string(),
    })
}
