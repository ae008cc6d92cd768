use std::fmt;

use crate::ping::{AddressFamily, PingRequest, Source};

pub const PING_PROGRAM: &str = "ping";

/// A fully assembled `ping` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingCommand {
    argv: Vec<String>,
}

impl PingCommand {
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }
}

/// The command line as it would be typed, arguments separated by single spaces.
impl fmt::Display for PingCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.argv.join(" "))
    }
}

/// Assembles the argument vector for a validated request.
///
/// Flags come in a fixed order (`-c`, `-4`/`-6`, `-I`, `-i`, `-s`) and the
/// destination is always the last argument. A zero count leaves `-c` off and
/// lets the utility pick its own default.
pub fn build(request: &PingRequest) -> PingCommand {
    let mut argv = vec![PING_PROGRAM.to_string()];

    if request.count != 0 {
        argv.push("-c".to_string());
        argv.push(request.count.to_string());
    }

    match request.family {
        AddressFamily::V4 => argv.push("-4".to_string()),
        AddressFamily::V6 => argv.push("-6".to_string()),
        AddressFamily::Any => {}
    }

    if let Some(source) = &request.source {
        let (Source::InterfaceName(s) | Source::InterfaceAddress(s)) = source;
        argv.push("-I".to_string());
        argv.push(s.clone());
    }

    if let Some(interval) = request.interval {
        argv.push("-i".to_string());
        // f64's Display already drops a trailing ".0"
        argv.push(interval.to_string());
    }

    if let Some(size) = request.packet_size {
        argv.push("-s".to_string());
        argv.push(size.to_string());
    }

    argv.push(request.destination.clone());

    PingCommand { argv }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(dest: &str) -> PingRequest {
        PingRequest::new(dest).unwrap()
    }

    #[test]
    fn default_shape() {
        let cmd = build(&request("127.0.0.1"));
        assert_eq!(cmd.to_string(), "ping -c 2 127.0.0.1");
        assert_eq!(cmd.program(), "ping");
        assert_eq!(cmd.args(), ["-c", "2", "127.0.0.1"]);
    }

    #[test]
    fn count_flag() {
        for n in [1u32, 2, 5, 100, u32::MAX] {
            let mut req = request("example.com");
            req.count = n;
            let cmd = build(&req);
            let argv = cmd.argv();
            assert_eq!(argv.iter().filter(|a| *a == "-c").count(), 1);
            let pos = argv.iter().position(|a| a == "-c").unwrap();
            assert_eq!(argv[pos + 1], n.to_string());
            assert_eq!(argv.last().unwrap(), "example.com");
        }

        let mut req = request("example.com");
        req.count = 0;
        assert_eq!(build(&req).to_string(), "ping example.com");
    }

    #[test]
    fn extension_flags() {
        let mut req = request("::1");
        req.family = AddressFamily::V6;
        req.source = Some(Source::InterfaceName("eth0".to_string()));
        req.interval = Some(0.2);
        req.packet_size = Some(1400);
        assert_eq!(build(&req).to_string(), "ping -c 2 -6 -I eth0 -i 0.2 -s 1400 ::1");

        let mut req = request("10.0.0.2");
        req.count = 3;
        req.family = AddressFamily::V4;
        req.source = Some(Source::InterfaceAddress("10.0.0.1".to_string()));
        req.interval = Some(1.0);
        req.packet_size = Some(0);
        assert_eq!(build(&req).to_string(), "ping -c 3 -4 -I 10.0.0.1 -i 1 -s 0 10.0.0.2");
    }
}
