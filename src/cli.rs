//! Command-line interface.
//!
//! Every connection flag is optional: values given here override (and are
//! saved back to) `config.txt`, and a missing config file with no flags
//! falls through to the interactive bootstrap wizard.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;

/// Straylight IRC channel sentinel.
#[derive(Debug, Parser)]
#[command(name = "sentinel", version, about)]
pub struct Cli {
    /// Local address to bind before connecting.
    #[arg(short = 'b', long = "bind-ip")]
    pub bind_ip: Option<IpAddr>,

    /// IRC server address.
    #[arg(short, long)]
    pub server: Option<String>,

    /// IRC server port.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Bot nickname.
    #[arg(short, long)]
    pub nick: Option<String>,

    /// Channel to moderate (must start with '#').
    #[arg(short, long, value_parser = parse_channel)]
    pub channel: Option<String>,

    /// Owner hostmask seeded into owner.txt.
    #[arg(short, long)]
    pub owner: Option<String>,

    /// Directory holding config.txt, owner.txt and fb.txt.
    #[arg(long, default_value = ".")]
    pub data_dir: PathBuf,
}

fn parse_channel(s: &str) -> Result<String, String> {
    if s.starts_with('#') {
        Ok(s.to_owned())
    } else {
        Err(format!("channel must start with '#', got {s:?}"))
    }
}
