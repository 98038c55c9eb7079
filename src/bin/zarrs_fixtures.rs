//! Write the Zarr V3 fixture battery to a directory.

use std::{path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use log::info;
use zarrs_fixtures::{
    fixtures::{catalogue, generate, select, verify},
    node::NodePath,
    storage::store::FilesystemStore,
};

/// Generate Zarr V3 test fixtures.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log at debug level, or trace level if repeated.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write the fixtures to a filesystem store.
    Generate {
        /// The output directory. Existing content is removed.
        output: PathBuf,

        /// Only write fixtures whose name contains this substring.
        #[arg(long)]
        filter: Option<String>,

        /// Read every fixture back after writing it.
        #[arg(long)]
        verify: bool,
    },
    /// Print the fixture names.
    List,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match cli.command {
        Command::List => {
            for fixture in catalogue() {
                println!("{}", fixture.name);
            }
        }
        Command::Generate {
            output,
            filter,
            verify: verify_output,
        } => {
            let fixtures = match filter {
                Some(filter) => select(catalogue(), &filter),
                None => catalogue(),
            };
            let store = Arc::new(FilesystemStore::new(&output)?);
            let root = NodePath::root();

            let reports = generate(&store, &root, &fixtures)?;
            for report in &reports {
                info!(
                    "{}: {} chunks, {} bytes",
                    report.name,
                    report.chunk_keys.len(),
                    report.bytes_stored
                );
            }
            if verify_output {
                verify(&store, &root, &fixtures)?;
                info!("verified {} fixtures", fixtures.len());
            }
            println!(
                "wrote {} fixtures to {}",
                reports.len(),
                output.display()
            );
        }
    }
    Ok(())
}
