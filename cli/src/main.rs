mod config;
mod logging;
mod session;

use std::{io, path::PathBuf};

use bytedit_buffer::Buffer;
use clap::Parser;

use crate::session::Session;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// File to open
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Turn debugging information on
    #[arg(short, long)]
    debug: bool,

    /// Set configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::setup(cli.debug)?;

    let config = config::Config::new(cli.config.as_deref());
    let buf = match &cli.file {
        Some(path) => Buffer::load(path, &config.buffer)?,
        None => Buffer::new(),
    };

    log::info!(
        "Opened {:?}, {} bytes, resizable: {}",
        buf.filename(),
        buf.len(),
        buf.can_resize()
    );

    let mut session = Session::new(buf);
    let stdin = io::stdin();
    let stdout = io::stdout();
    session.run(stdin.lock(), stdout.lock())?;
    Ok(())
}
