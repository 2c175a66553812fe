use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "statict", version, about, long_about = None)]
pub(crate) struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub(crate) config: Option<PathBuf>,

    /// Turn debugging information on, overriding the configured log filter
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub(crate) debug: u8,
}
