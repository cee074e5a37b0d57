mod cli;

use clap::Parser;
use log::error;

use gal_lang::interpreter::{self, RunConfig};
use gal_lang::value::ValueKind;

fn main() {
    let cli = cli::Cli::parse();
    simple_logger::init_with_level(cli.verbosity.to_level().unwrap_or(log::Level::Error))
        .expect("logger can only be initialized once");

    let config = RunConfig {
        entry_path: cli.file.clone(),
        args: cli.args.clone(),
        package_root: cli.resolved_package_root(),
        use_cache: !cli.no_cache,
    };

    match interpreter::run(config) {
        Ok(value) if value.kind != ValueKind::None => {
            println!("Program exited with code: {}", value.scalar);
        }
        Ok(_) => {}
        Err(e) => {
            error!("{e}");
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}
