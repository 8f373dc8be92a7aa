//! Command-line and environment configuration for the two binaries.

use crate::codec::DecodePolicy;
use crate::sync::SyncConfig;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Path the gateway is served under, kept from the original deployment.
pub const DEFAULT_ROUTE: &str = "/.netlify/functions/sheets";

pub const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:8888/.netlify/functions/sheets";

/// Terminal dashboard options.
#[derive(Debug, Clone, Parser)]
#[command(name = "project-dashboard")]
#[command(about = "Edit the project status report and autosave it through the gateway")]
pub struct DashboardArgs {
    /// Gateway endpoint URL
    #[arg(long, env = "DASHBOARD_GATEWAY_URL", default_value = DEFAULT_GATEWAY_URL)]
    pub gateway_url: String,

    /// Quiet period after the last edit before saving, in milliseconds
    #[arg(long, env = "DASHBOARD_QUIET_PERIOD_MS", default_value_t = 800)]
    pub quiet_period_ms: u64,

    /// Timeout for each gateway request, in seconds
    #[arg(long, env = "DASHBOARD_REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    pub request_timeout_secs: u64,

    /// Re-render numeric-looking stored values the way the first dashboard did
    #[arg(long, env = "DASHBOARD_LEGACY_DECODE")]
    pub legacy_decode: bool,
}

impl DashboardArgs {
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            quiet_period: Duration::from_millis(self.quiet_period_ms),
            decode: if self.legacy_decode {
                DecodePolicy::Legacy
            } else {
                DecodePolicy::Preserve
            },
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Gateway server options.
#[derive(Debug, Clone, Parser)]
#[command(name = "gateway")]
#[command(about = "Serve the key/value gateway over a two-column range")]
pub struct GatewayArgs {
    /// Address to listen on
    #[arg(long, env = "GATEWAY_BIND", default_value = "127.0.0.1:8888")]
    pub bind: SocketAddr,

    /// Route the gateway answers on
    #[arg(long, env = "GATEWAY_ROUTE", default_value = DEFAULT_ROUTE)]
    pub route: String,

    /// Range file (gzip); the range is kept in memory when omitted
    #[arg(long, env = "GATEWAY_STORE", value_name = "FILE")]
    pub store: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::DEFAULT_QUIET_PERIOD;

    #[test]
    fn dashboard_defaults_match_library_defaults() {
        let args = DashboardArgs::try_parse_from(["project-dashboard"]).unwrap();
        assert_eq!(args.sync_config(), SyncConfig::default());
        assert_eq!(args.sync_config().quiet_period, DEFAULT_QUIET_PERIOD);
        assert_eq!(args.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn legacy_flag_selects_legacy_decoding() {
        let args = DashboardArgs::try_parse_from([
            "project-dashboard",
            "--legacy-decode",
            "--quiet-period-ms",
            "250",
        ])
        .unwrap();
        assert_eq!(args.sync_config().decode, DecodePolicy::Legacy);
        assert_eq!(args.sync_config().quiet_period, Duration::from_millis(250));
    }

    #[test]
    fn gateway_defaults() {
        let args = GatewayArgs::try_parse_from(["gateway", "--store", "data/sheet.bin.gz"]).unwrap();
        assert_eq!(args.bind.port(), 8888);
        assert_eq!(args.route, DEFAULT_ROUTE);
        assert_eq!(args.store, Some(PathBuf::from("data/sheet.bin.gz")));
    }
}
