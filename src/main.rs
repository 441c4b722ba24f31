//! ProbeKit command line
//!
//! Translates between probe-sequence JSON documents and probing G-code:
//! `parse` imports G-code (from a file or stdin) and prints the
//! reconstructed sequence as JSON; `generate` does the reverse.

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use probekit::{
    generate_gcode, init_logging, parse_gcode, validate_sequence, ProbeOperation,
    ProbeSequenceSettings,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a G-code program into a probe sequence (JSON on stdout)
    Parse {
        /// G-code file to read, or "-" for stdin
        input: String,
    },
    /// Generate G-code from a probe sequence document (G-code on stdout)
    Generate {
        /// JSON sequence file with `settings` and `operations`
        input: PathBuf,
    },
}

/// On-disk sequence document, matching the designer's export format
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SequenceDocument {
    settings: ProbeSequenceSettings,
    operations: Vec<ProbeOperation>,
}

fn main() -> Result<()> {
    init_logging()?;
    let cli = Cli::parse();

    match cli.command {
        Command::Parse { input } => {
            let text = read_input(&input)?;
            let program = parse_gcode(&text);
            for error in &program.errors {
                tracing::warn!("{}", error);
            }
            println!("{}", serde_json::to_string_pretty(&program)?);
        }
        Command::Generate { input } => {
            let json = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let document: SequenceDocument = serde_json::from_str(&json)
                .with_context(|| format!("Invalid sequence document: {}", input.display()))?;
            for error in validate_sequence(&document.operations) {
                tracing::warn!("{}", error);
            }
            print!(
                "{}",
                generate_gcode(&document.operations, &document.settings)
            );
        }
    }
    Ok(())
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        Ok(text)
    } else {
        std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input))
    }
}
