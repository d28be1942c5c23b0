//! Command-line and environment configuration

use crate::http::parser::DEFAULT_MAX_HEADER_BYTES;
use crate::http::Limits;
use clap::{Parser, ValueEnum};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable multi-line output
    Pretty,
    /// One JSON object per event
    Json,
}

/// Student gradebook HTTP server
#[derive(Debug, Parser)]
#[command(name = "gradebook")]
#[command(about = "Grade calculation and record keeping over HTTP", long_about = None)]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "GRADEBOOK_BIND", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Port to listen on
    #[arg(short, long, env = "GRADEBOOK_PORT", default_value_t = crate::http::DEFAULT_HTTP_PORT)]
    pub port: u16,

    /// Directory holding grades.txt and its backup
    #[arg(long, env = "GRADEBOOK_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Page served for `/` and `/index.html`
    #[arg(long, env = "GRADEBOOK_INDEX", default_value = "index.html")]
    pub index: PathBuf,

    /// Per-operation socket timeout in seconds; 0 disables it
    #[arg(long, env = "GRADEBOOK_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Largest accepted request body
    #[arg(long, env = "GRADEBOOK_MAX_BODY_BYTES", default_value_t = 64 * 1024)]
    pub max_body_bytes: usize,

    /// Log level: trace, debug, info, warn, error
    #[arg(long, env = "GRADEBOOK_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "GRADEBOOK_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl Config {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn limits(&self) -> Limits {
        Limits {
            max_header_bytes: DEFAULT_MAX_HEADER_BYTES,
            max_body_bytes: self.max_body_bytes,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        match self.timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}
