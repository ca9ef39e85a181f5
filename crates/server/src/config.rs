// crates/server/src/config.rs
//! Command-line / environment configuration for the server binary.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use pdf_capture_observability::LogFormat;

/// Default port for the server (same as the service this replaces).
pub const DEFAULT_PORT: u16 = 8000;

/// Serve URL-to-PDF captures with live progress streaming.
#[derive(Debug, Clone, Parser)]
#[command(name = "pdf-capture", version, about)]
pub struct Config {
    /// Address to bind.
    #[arg(long, env = "PDF_CAPTURE_HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to bind. `PORT` is honoured when `PDF_CAPTURE_PORT` is unset.
    #[arg(long, env = "PDF_CAPTURE_PORT")]
    pub port: Option<u16>,

    /// Directory where captured PDFs are written.
    #[arg(long, env = "PDF_CAPTURE_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Chrome / Chromium executable used for captures.
    #[arg(long, env = "PDF_CAPTURE_CHROME", default_value = "chromium")]
    pub chrome_bin: PathBuf,

    /// Virtual time a page gets to settle before printing, in milliseconds.
    #[arg(long, env = "PDF_CAPTURE_VIRTUAL_TIME_MS", default_value_t = 10_000)]
    pub virtual_time_budget_ms: u64,

    /// How often progress streams poll for changes, in milliseconds.
    #[arg(long, env = "PDF_CAPTURE_POLL_INTERVAL_MS", default_value_t = 500,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval_ms: u64,

    /// Seconds a finished session stays downloadable; 0 keeps sessions forever.
    #[arg(long, env = "PDF_CAPTURE_RETENTION_SECS", default_value_t = 86_400)]
    pub retention_secs: u64,

    /// Emit JSON log lines instead of the compact format.
    #[arg(long, env = "PDF_CAPTURE_LOG_JSON")]
    pub log_json: bool,
}

impl Config {
    pub fn port(&self) -> u16 {
        self.port
            .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse().ok()))
            .unwrap_or(DEFAULT_PORT)
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port())
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("pdf-capture"))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// `None` when retention is disabled.
    pub fn retention(&self) -> Option<Duration> {
        (self.retention_secs > 0).then(|| Duration::from_secs(self.retention_secs))
    }

    pub fn log_format(&self) -> LogFormat {
        if self.log_json {
            LogFormat::Json
        } else {
            LogFormat::Compact
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["pdf-capture"]).unwrap();
        assert_eq!(config.host, IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(config.chrome_bin, PathBuf::from("chromium"));
        assert_eq!(config.poll_interval(), Duration::from_millis(500));
        assert_eq!(config.retention(), Some(Duration::from_secs(86_400)));
        assert_eq!(config.log_format(), LogFormat::Compact);
    }

    #[test]
    fn test_overrides() {
        let config = Config::try_parse_from([
            "pdf-capture",
            "--host",
            "127.0.0.1",
            "--port",
            "9100",
            "--output-dir",
            "/srv/pdfs",
            "--poll-interval-ms",
            "50",
            "--retention-secs",
            "0",
            "--log-json",
        ])
        .unwrap();
        assert_eq!(config.addr(), "127.0.0.1:9100".parse().unwrap());
        assert_eq!(config.output_dir(), PathBuf::from("/srv/pdfs"));
        assert_eq!(config.poll_interval(), Duration::from_millis(50));
        assert_eq!(config.retention(), None);
        assert_eq!(config.log_format(), LogFormat::Json);
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        assert!(Config::try_parse_from(["pdf-capture", "--poll-interval-ms", "0"]).is_err());
    }
}
