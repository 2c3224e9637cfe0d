//! First-run bootstrap: resolve config and stores from files, CLI flags,
//! or the interactive wizard, in that order of preference.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::cli::Cli;
use crate::config::{ConfigError, SessionConfig};
use crate::error::Result;
use crate::store::{write_atomic, ForbiddenStore, OwnerStore};

/// Canonical data file locations inside the data directory.
#[derive(Clone, Debug)]
pub struct DataFiles {
    /// `config.txt`
    pub config: PathBuf,
    /// `owner.txt`
    pub owners: PathBuf,
    /// `fb.txt`
    pub forbidden: PathBuf,
}

impl DataFiles {
    /// The standard file names under `dir`.
    pub fn in_dir(dir: &Path) -> DataFiles {
        DataFiles {
            config: dir.join("config.txt"),
            owners: dir.join("owner.txt"),
            forbidden: dir.join("fb.txt"),
        }
    }
}

/// Resolve the session config and both stores.
///
/// Order: an existing `config.txt` is loaded and CLI flags override it; a
/// missing file with a complete flag set builds the config from flags
/// alone; otherwise the wizard asks. Any change is saved back. A missing
/// `owner.txt` is seeded from `-o` or a prompt, and a missing `fb.txt` is
/// created empty.
pub fn resolve(cli: &Cli) -> Result<(SessionConfig, OwnerStore, ForbiddenStore)> {
    let files = DataFiles::in_dir(&cli.data_dir);

    let (mut config, mut dirty) = if files.config.exists() {
        (SessionConfig::load(&files.config)?, false)
    } else if let (Some(server), Some(port), Some(nick), Some(channel)) = (
        cli.server.clone(),
        cli.port,
        cli.nick.clone(),
        cli.channel.clone(),
    ) {
        (
            SessionConfig {
                server,
                port,
                nick,
                channel,
                bind_ip: cli.bind_ip,
            },
            true,
        )
    } else {
        info!("no config file, starting setup wizard");
        (wizard()?, true)
    };

    if let Some(server) = &cli.server {
        if *server != config.server {
            config.server = server.clone();
            dirty = true;
        }
    }
    if let Some(port) = cli.port {
        if port != config.port {
            config.port = port;
            dirty = true;
        }
    }
    if let Some(nick) = &cli.nick {
        if *nick != config.nick {
            config.nick = nick.clone();
            dirty = true;
        }
    }
    if let Some(channel) = &cli.channel {
        if *channel != config.channel {
            config.channel = channel.clone();
            dirty = true;
        }
    }
    if cli.bind_ip.is_some() && cli.bind_ip != config.bind_ip {
        config.bind_ip = cli.bind_ip;
        dirty = true;
    }

    if dirty {
        config.save(&files.config)?;
        info!(path = %files.config.display(), "saved config");
    }

    let owners_missing = !files.owners.exists();
    let mut owners = OwnerStore::load(files.owners.clone())?;
    if owners_missing && owners.is_empty() {
        let mask = match &cli.owner {
            Some(mask) => mask.clone(),
            None => prompt_nonempty("first owner hostmask (nick!ident@host)")
                .map_err(ConfigError::Io)?,
        };
        owners.add(&mask)?;
        info!(%mask, "seeded owner list");
    } else if let Some(mask) = &cli.owner {
        match owners.add(mask) {
            Ok(()) => info!(%mask, "added owner"),
            // Tolerate re-running with the same -o flag
            Err(crate::store::StoreError::DuplicateEntry(_)) => {
                info!(%mask, "owner already present");
            }
            Err(e) => return Err(e.into()),
        }
    }

    if !files.forbidden.exists() {
        write_atomic(&files.forbidden, "").map_err(crate::store::StoreError::Io)?;
    }
    let forbidden = ForbiddenStore::load(files.forbidden.clone())?;

    Ok((config, owners, forbidden))
}

/// Interactive first-run wizard. Prompts again until required answers are
/// non-empty and well-formed; the bind address may be left blank.
fn wizard() -> Result<SessionConfig, ConfigError> {
    let server = prompt_nonempty("server address")?;
    let port = loop {
        let raw = prompt_nonempty("server port")?;
        match raw.parse::<u16>() {
            Ok(port) => break port,
            Err(_) => println!("not a port number: {raw}"),
        }
    };
    let nick = prompt_nonempty("bot nickname")?;
    let channel = loop {
        let raw = prompt_nonempty("channel (#name)")?;
        if raw.starts_with('#') {
            break raw;
        }
        println!("channel must start with '#'");
    };
    let bind_ip = loop {
        let raw = prompt("bind address (blank for none)")?;
        if raw.is_empty() {
            break None;
        }
        match raw.parse() {
            Ok(ip) => break Some(ip),
            Err(_) => println!("not an ip address: {raw}"),
        }
    };

    Ok(SessionConfig {
        server,
        port,
        nick,
        channel,
        bind_ip,
    })
}

fn prompt(label: &str) -> std::io::Result<String> {
    print!("{label}: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_owned())
}

fn prompt_nonempty(label: &str) -> std::io::Result<String> {
    loop {
        let answer = prompt(label)?;
        if !answer.is_empty() {
            return Ok(answer);
        }
    }
}
