use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};
use parse_ping::{AppConfig, PingError, PingExecutor, PingParams, Status};

/// Ping a host with the system utility and print the parsed result as JSON.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// The host to ping
    dest: Option<String>,

    /// Number of echo requests to send, 0 leaves the choice to the utility
    #[arg(short, long)]
    count: Option<i64>,

    /// Only use IPv4
    #[arg(short('4'), long, conflicts_with = "v6")]
    v4: bool,

    /// Only use IPv6
    #[arg(short('6'), long)]
    v6: bool,

    /// Interface to send from
    #[arg(long)]
    interface_name: Option<String>,

    /// Source address to send from
    #[arg(long)]
    interface_ip: Option<String>,

    /// Seconds between packets
    #[arg(short, long)]
    interval: Option<f64>,

    /// Number of data bytes to send
    #[arg(short('s'), long)]
    packet_size: Option<i64>,

    /// Read parameters as JSON from a file, '-' for stdin. Flags override file values
    #[arg(long)]
    params: Option<PathBuf>,

    /// Give up on the utility after this long, e.g. '10s'
    #[arg(short, long)]
    timeout: Option<humantime::Duration>,

    /// Config file to use instead of the per-user one
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective config to the per-user config file and exit
    #[arg(long)]
    save_config: bool,

    /// Pretty-print the JSON result
    #[arg(long)]
    pretty: bool,
}

impl Cli {
    fn load_params(&self) -> Result<PingParams, Box<dyn std::error::Error>> {
        let Some(path) = &self.params else {
            return Ok(PingParams::default());
        };
        let content = if path.to_str() == Some("-") {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        } else {
            std::fs::read_to_string(path)?
        };
        Ok(serde_json::from_str(&content)?)
    }

    /// Applies `--timeout` and `--pretty` on top of the loaded config.
    fn configure(&self, config: &mut AppConfig) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(timeout) = &self.timeout {
            config.set_timeout(**timeout)?;
        }
        config.pretty |= self.pretty;
        Ok(())
    }

    /// Layers command line flags over the file parameters, then config defaults.
    fn merge(self, mut params: PingParams, config: &AppConfig) -> PingParams {
        params.dest = self.dest.or(params.dest);
        params.count = self
            .count
            .or(params.count)
            .or(Some(i64::from(config.default_count)));
        // An address family flag replaces whatever the file asked for
        if self.v4 {
            params.v4 = Some(true);
            params.v6 = Some(false);
        }
        if self.v6 {
            params.v6 = Some(true);
            params.v4 = Some(false);
        }
        params.interface_name = self.interface_name.or(params.interface_name);
        params.interface_ip = self.interface_ip.or(params.interface_ip);
        params.interval = self.interval.or(params.interval);
        params.packet_size = self.packet_size.or(params.packet_size);
        params
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match AppConfig::load_from(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to read config {}: {e}", path.display());
                return ExitCode::from(2);
            }
        },
        None => AppConfig::load(),
    };
    if let Err(e) = cli.configure(&mut config) {
        error!("Invalid options: {e}");
        return ExitCode::from(2);
    }

    if cli.save_config {
        return match config.save() {
            Ok(()) => {
                info!("Saved config");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Failed to save config: {e}");
                ExitCode::from(2)
            }
        };
    }

    let params = match cli.load_params() {
        Ok(params) => params,
        Err(e) => {
            error!("Failed to read parameters: {e}");
            return ExitCode::from(2);
        }
    };

    let executor = PingExecutor::new(config.timeout());
    let outcome = match executor.execute_blocking(cli.merge(params, &config)) {
        Ok(outcome) => outcome,
        Err(PingError::Request(e)) => {
            error!("Invalid parameters: {e}");
            return ExitCode::from(2);
        }
        Err(e) => {
            error!("{e}");
            return ExitCode::from(2);
        }
    };

    let json = if config.pretty {
        serde_json::to_string_pretty(&outcome)
    } else {
        serde_json::to_string(&outcome)
    };
    match json {
        Ok(json) => println!("{json}"),
        Err(e) => {
            error!("Failed to serialize result: {e}");
            return ExitCode::from(2);
        }
    }

    match outcome.status {
        Status::Ok => ExitCode::SUCCESS,
        Status::Failed => ExitCode::from(1),
        Status::TimedOut => ExitCode::from(3),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parse_ping::AddressFamily;
    use std::time::Duration;

    #[test]
    fn flags_override_file() {
        let cli = Cli::parse_from([
            "parse-ping",
            "-c",
            "5",
            "-6",
            "--interface-name",
            "eth1",
            "10.0.0.9",
        ]);
        let file = PingParams {
            dest: Some("127.0.0.1".to_string()),
            count: Some(3),
            packet_size: Some(64),
            ..Default::default()
        };
        let params = cli.merge(file, &AppConfig::default());
        assert_eq!(params.dest.as_deref(), Some("10.0.0.9"));
        assert_eq!(params.count, Some(5));
        assert_eq!(params.v6, Some(true));
        assert_eq!(params.v4, Some(false));
        assert_eq!(params.interface_name.as_deref(), Some("eth1"));
        assert_eq!(params.packet_size, Some(64));
    }

    #[test]
    fn config_supplies_count() {
        let cli = Cli::parse_from(["parse-ping", "example.com"]);
        let config = AppConfig {
            default_count: 7,
            ..Default::default()
        };
        let request = cli.merge(PingParams::default(), &config).validate().unwrap();
        assert_eq!(request.count, 7);
    }

    #[test]
    fn v4_and_v6_conflict() {
        assert!(Cli::try_parse_from(["parse-ping", "-4", "-6", "example.com"]).is_err());
    }

    #[test]
    fn address_family_flag_replaces_file() {
        let file = PingParams {
            dest: Some("example.com".to_string()),
            v4: Some(true),
            ..Default::default()
        };
        let cli = Cli::parse_from(["parse-ping", "-6"]);
        let request = cli.merge(file.clone(), &AppConfig::default()).validate().unwrap();
        assert_eq!(request.family, AddressFamily::V6);

        let cli = Cli::parse_from(["parse-ping"]);
        let request = cli.merge(file, &AppConfig::default()).validate().unwrap();
        assert_eq!(request.family, AddressFamily::V4);
    }

    #[test]
    fn sub_second_timeout() {
        let mut config = AppConfig::default();
        let cli = Cli::parse_from(["parse-ping", "-t", "500ms", "127.0.0.1"]);
        cli.configure(&mut config).unwrap();
        assert_eq!(config.timeout(), Some(Duration::from_millis(500)));

        let cli = Cli::parse_from(["parse-ping", "--timeout", "1500ms", "127.0.0.1"]);
        cli.configure(&mut config).unwrap();
        assert_eq!(config.timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn zero_timeout_rejected() {
        let mut config = AppConfig::default();
        let cli = Cli::parse_from(["parse-ping", "-t", "0s", "127.0.0.1"]);
        assert!(cli.configure(&mut config).is_err());
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
    }
}
