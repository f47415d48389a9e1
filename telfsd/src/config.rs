use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 8189;
pub const DEFAULT_READ_CAP: usize = 1024;
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const USAGE: &str = "usage: telfsd [--host <host>] [--port <port>] [--root <dir>] [--read-cap <bytes>] [--log-level <filter>]\n       defaults: localhost:8189, current directory, 1024 bytes per read, info. RUST_LOG overrides --log-level.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Initial working directory of every session.
    pub root: PathBuf,
    /// Upper bound on bytes taken from a socket per readiness event.
    pub read_cap: usize,
    pub log_level: String,
}

impl Config {
    pub fn new(root: PathBuf) -> Self {
        Config {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            root,
            read_cap: DEFAULT_READ_CAP,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }

    /// Parses command-line flags over the defaults. `Ok(None)` when help was requested.
    pub fn from_args<I: IntoIterator<Item = String>>(args: I, cwd: PathBuf) -> Result<Option<Config>> {
        let mut config = Config::new(cwd);
        let mut args = args.into_iter();
        while let Some(a) = args.next() {
            let mut value = || args.next().ok_or_else(|| anyhow!("{a} requires a value"));
            match a.as_str() {
                "--host" => config.host = value()?,
                "--port" => { let v = value()?; config.port = v.parse().map_err(|_| anyhow!("invalid port: {v}"))?; }
                "--root" => config.root = PathBuf::from(value()?),
                "--read-cap" => {
                    let v = value()?;
                    config.read_cap = v.parse().map_err(|_| anyhow!("invalid read cap: {v}"))?;
                    if config.read_cap == 0 { bail!("--read-cap must be > 0"); }
                }
                "--log-level" => config.log_level = value()?,
                "-h" | "--help" => return Ok(None),
                other => bail!("unknown arg: {other}"),
            }
        }
        Ok(Some(config))
    }
}
