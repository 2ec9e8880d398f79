//! demex CLI - structured extraction from statement token dumps

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;

use demex::{analyze_file, supported_types, DocumentResult, LineAssembler, PageContent};

#[derive(Parser)]
#[command(name = "demex")]
#[command(version)]
#[command(about = "Extract structured JSON from logistics cost statement token dumps", long_about = None)]
struct Cli {
    /// Input token dump (JSON array of pages)
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify and extract a token dump
    Analyze {
        /// Input token dump (JSON array of pages)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Pretty-print the output JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Show the document title a dump would classify under
    Title {
        /// Input token dump (JSON array of pages)
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// List the supported document types
    Types,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Analyze {
            input,
            output,
            pretty,
        }) => cmd_analyze(&input, output.as_deref(), pretty),
        Some(Commands::Title { input }) => cmd_title(&input),
        Some(Commands::Types) => {
            cmd_types();
            Ok(())
        }
        None => {
            // Default behavior: analyze if input is provided
            if let Some(input) = cli.input {
                cmd_analyze(&input, cli.output.as_deref(), cli.pretty)
            } else {
                println!("{}", "Usage: demex <FILE> [-o OUTPUT]".yellow());
                println!("       demex --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_analyze(
    input: &Path,
    output: Option<&Path>,
    pretty: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = analyze_file(input)?;

    if let DocumentResult::Failed { error, .. } = &result {
        eprintln!("{}: {}", "Warning".yellow().bold(), error);
    }

    let json = if pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_title(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read_to_string(input)?;
    let pages: Vec<PageContent> = serde_json::from_str(&data)?;
    let lines = LineAssembler::new().assemble(&pages);

    match demex::extract_document_title(&lines) {
        Some(title) => {
            let known = demex::classify(&title).is_some();
            println!("{}: {}", "Title".bold(), title);
            println!(
                "{}: {}",
                "Recognized".bold(),
                if known { "Yes".green() } else { "No".red() }
            );
        }
        None => println!("{}", "No title line found".red()),
    }

    Ok(())
}

fn cmd_types() {
    println!("{}", "Supported document types".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for id in supported_types() {
        println!("  {} {}", "•".dimmed(), id);
    }
}
