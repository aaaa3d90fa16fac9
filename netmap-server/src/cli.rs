use clap::Parser;

use std::net::SocketAddr;
use std::path::PathBuf;

pub const ENV_BIND_ADDR: &str = "NETMAP_BIND_ADDR";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

pub const ENV_SEED_PATH: &str = "NETMAP_SEED_PATH";

/// Network-topology and routing-path simulation service
#[derive(Clone, Debug, Parser)]
#[command(version)]
pub struct Cli {
    /// Address to bind the HTTP service to
    #[arg(short, long, env = ENV_BIND_ADDR, default_value = DEFAULT_BIND_ADDR)]
    pub bind_addr: SocketAddr,

    /// JSON seed file to populate the store with on startup
    #[arg(short, long, env = ENV_SEED_PATH)]
    pub seed_path: Option<PathBuf>,
}

pub fn parse() -> Cli {
    Cli::parse()
}
