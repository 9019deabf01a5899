//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod config;
pub mod extract;
pub mod inspect;

use std::error::Error;
use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::cli::config::{init_config, show_config, InitOutcome};
use crate::cli::extract::{extract_card, ExtractOutcome, ExtractRequest};
use crate::cli::inspect::inspect_file;
use crate::core::config::{path_display, Config};

/// Exit status when the input is not a PNG.
pub const EXIT_NOT_PNG: i32 = 1;
/// Exit status when a PNG carries no recognizable card.
pub const EXIT_NO_CARD: i32 = 2;

pub const NO_CARD_MESSAGE: &str =
    "No valid character card metadata found. Please ensure this is an original PNG file.";

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_DESCRIBE"),
    ", ",
    env!("VERGEN_GIT_SHA"),
    ")"
);

#[derive(Parser)]
#[command(name = "cardpeek")]
#[command(version, long_version = LONG_VERSION)]
#[command(about = "Extract tavern character cards from PNG images")]
#[command(
    long_about = "cardpeek reads the character card embedded in a PNG image by chat \
front-ends such as SillyTavern and prints it as Markdown or JSON.\n\n\
Cards are looked up in tEXt, zTXt and iTXt chunks named 'chara' or 'character'. \
When no such chunk holds a card, the raw bytes are scanned for card JSON \
(disable with --no-scan or 'brute_force = false' in the config file).\n\n\
Environment Variables:\n\
  CARDPEEK_LOG      Log filter, e.g. 'debug' (falls back to RUST_LOG)\n\n\
Exit Status:\n\
  0  card extracted\n\
  1  not a PNG file, or another error\n\
  2  PNG without a character card"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log detail (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Append log output to the specified file instead of stderr
    #[arg(short = 'l', long, global = true, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract the character card from a PNG
    Extract {
        /// PNG image to read
        file: PathBuf,
        /// Print JSON instead of Markdown
        #[arg(long)]
        json: bool,
        /// Save the document into the configured output directory
        #[arg(long, conflicts_with = "output")]
        save: bool,
        /// Write the document to this path
        #[arg(short = 'o', long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Only look at text chunks; skip the raw byte scan
        #[arg(long)]
        no_scan: bool,
    },
    /// List the text chunks of a PNG
    Inspect {
        /// PNG image to read
        file: PathBuf,
    },
    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write a config file with every default spelled out
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let args = Args::parse();
    crate::logging::init(args.verbose, args.log.as_deref())?;

    match args.command {
        Commands::Extract {
            file,
            json,
            save,
            output,
            no_scan,
        } => {
            let config = Config::load(args.config.as_deref())?;
            let request = ExtractRequest {
                file: &file,
                json,
                save,
                output: output.as_deref(),
                no_scan,
            };
            match extract_card(&request, &config)? {
                ExtractOutcome::Printed { document, .. } => {
                    print!("{document}");
                }
                ExtractOutcome::Saved { extraction, path } => {
                    println!(
                        "✅ Saved {} ({}) to {}",
                        extraction.metadata.name,
                        extraction.source,
                        path_display(&path)
                    );
                }
                ExtractOutcome::NotPng(message) => {
                    eprintln!("❌ {message}");
                    std::process::exit(EXIT_NOT_PNG);
                }
                ExtractOutcome::NoCard => {
                    eprintln!("❌ {NO_CARD_MESSAGE}");
                    std::process::exit(EXIT_NO_CARD);
                }
            }
            Ok(())
        }
        Commands::Inspect { file } => {
            let config = Config::load(args.config.as_deref())?;
            match inspect_file(&file, &config)? {
                Some(table) => print!("{table}"),
                None => {
                    eprintln!("❌ {}", crate::character::service::NOT_A_PNG_MESSAGE);
                    std::process::exit(EXIT_NOT_PNG);
                }
            }
            Ok(())
        }
        Commands::Config { action } => {
            let config_path = match args.config {
                Some(path) => path,
                None => Config::get_config_path()?,
            };
            match action {
                ConfigAction::Show => {
                    let config = Config::load_from_path(&config_path)?;
                    print!("{}", show_config(&config, &config_path)?);
                }
                ConfigAction::Init { force } => match init_config(&config_path, force)? {
                    InitOutcome::Written => {
                        println!("✅ Wrote default config to {}", path_display(&config_path));
                    }
                    InitOutcome::AlreadyExists => {
                        eprintln!(
                            "⚠️  Config already exists at {} (use --force to replace it)",
                            path_display(&config_path)
                        );
                    }
                },
            }
            Ok(())
        }
    }
}
