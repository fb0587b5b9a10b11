//! bunfig CLI
//!
//! Entry point for the `bunfig` command-line tool.

use bunfig::{compile_file, logging, ResolveOptions, ResolvedConfig};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser)]
#[command(name = "bunfig")]
#[command(about = "Resolve bun.json/bunfig.toml and apply compile-time defines", version)]
struct Cli {
    /// Path to config file (.json or .toml); disables bun.json/bunfig.toml discovery
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Working directory (default: current directory)
    #[arg(long, global = true)]
    cwd: Option<PathBuf>,

    /// Extra define as KEY:VALUE; overrides the config file (repeatable)
    #[arg(long, short = 'd', global = true)]
    define: Vec<String>,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Log filter, e.g. "info" or "bunfig=debug" (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the resolved config
    Resolve {
        /// Output in human-readable format instead of JSON
        #[arg(long)]
        human: bool,
    },

    /// Compile an entry file with the resolved defines
    Build {
        /// Entry file, relative to the working directory
        entry: PathBuf,

        /// Write output here instead of stdout
        #[arg(long, short = 'o')]
        outfile: Option<PathBuf>,
    },

    /// List effective defines as KEY=EXPR
    Defines,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose, cli.log_level.as_deref()) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    let cwd = match cli.cwd.clone() {
        Some(cwd) => cwd,
        None => match std::env::current_dir() {
            Ok(cwd) => cwd,
            Err(e) => {
                eprintln!("Error: cannot determine working directory: {}", e);
                process::exit(1);
            }
        },
    };

    let mut options = ResolveOptions::new(&cwd);
    options.config_path = cli.config.clone();
    options.cli_defines = cli.define.clone();

    let config = match ResolvedConfig::resolve(&options) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Resolve { human } => run_resolve(&config, human),
        Commands::Build { entry, outfile } => run_build(&config, &cwd, entry, outfile),
        Commands::Defines => run_defines(&config),
    }
}

fn run_resolve(config: &ResolvedConfig, human: bool) {
    if human {
        print!("{}", config.to_human());
    } else {
        match config.to_json() {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing output: {}", e);
                process::exit(1);
            }
        }
    }
}

fn run_build(config: &ResolvedConfig, cwd: &Path, entry: PathBuf, outfile: Option<PathBuf>) {
    let unit = match compile_file(&cwd.join(entry), config) {
        Ok(unit) => unit,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    match outfile {
        Some(outfile) => {
            let path = cwd.join(outfile);
            if let Err(e) = fs::write(&path, &unit.code) {
                eprintln!("Error writing {}: {}", path.display(), e);
                process::exit(1);
            }
            tracing::info!(path = %path.display(), replaced = unit.replaced, "wrote output");
        }
        None => print!("{}", unit.code),
    }
}

fn run_defines(config: &ResolvedConfig) {
    for (key, expr) in config.defines().iter() {
        println!("{}={}", key, expr);
    }
}
