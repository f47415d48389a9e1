use std::env;

use anyhow::{Context, Result};

use telfsd::config::{Config, USAGE};
use telfsd::{logging, Server};

fn main() -> Result<()> {
    let cwd = env::current_dir().context("cannot read current directory")?;
    let Some(config) = Config::from_args(env::args().skip(1), cwd)? else {
        eprintln!("{USAGE}");
        return Ok(());
    };
    logging::init(&config.log_level);
    let mut server = Server::bind(&config)?;
    server.run()?;
    Ok(())
}
