use std::path::PathBuf;

use clap::Parser;

/// Runs a Gal program.
#[derive(Debug, Parser)]
#[command(name = "gal", version, about)]
pub struct Cli {
    /// Source file to run.
    pub file: PathBuf,

    /// Overrides the user package root (default: `$HOME/.gal/packages`).
    #[arg(long)]
    pub package_root: Option<PathBuf>,

    /// Disables the on-disk AST cache for this run.
    #[arg(long)]
    pub no_cache: bool,

    /// Logging verbosity.
    #[arg(short, long, default_value = "error")]
    pub verbosity: log::LevelFilter,

    /// Arguments forwarded to the program, after `--`.
    #[arg(last = true)]
    pub args: Vec<String>,
}

impl Cli {
    pub fn resolved_package_root(&self) -> PathBuf {
        self.package_root
            .clone()
            .or_else(|| std::env::var_os("GAL_PACKAGE_ROOT").map(PathBuf::from))
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".gal").join("packages"))
    }
}
