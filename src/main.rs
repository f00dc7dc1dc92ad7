//! Playcard CLI
//!
//! Builds the media index and queries it from the command line.

use clap::{Parser, Subcommand};
use env_logger::Env;
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

use playcard_index::{LibraryConfig, LibraryError, MediaLibrary, Outcome};

const ABOUT: &str = r#"
Playcard - media index and title resolver

Examples:
  playcard -r /srv/music scan                 Build the index and print a report
  playcard -r /srv/music resolve "Song One"   Resolve a title
  playcard -r /srv/music cover "Song One"     Find the best cover image
  playcard -r /srv/music list --flat          List all tracks
  playcard -r /srv/music random               Pick a random track
  playcard --config playcard.json check A/b.mp3
"#;

/// Media index and title resolver
#[derive(Parser)]
#[command(name = "playcard")]
#[command(author, version, about = ABOUT, long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Media root, may be given several times
    #[arg(short = 'r', long = "root", global = true)]
    roots: Vec<PathBuf>,

    /// Forbidden path fragment, may be given several times
    #[arg(long = "forbid", global = true)]
    forbidden: Vec<String>,

    /// Also index the directory named by AUDIO_PATH
    #[arg(long, global = true)]
    env_root: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index and print a scan report
    Scan {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve a title to tracks
    Resolve {
        /// Title or relative path
        query: String,

        /// Maximum number of matches
        #[arg(short = 'l', long)]
        limit: Option<usize>,

        /// Print matches as JSON
        #[arg(long)]
        json: bool,
    },
    /// Find the cover image for a track base name
    Cover {
        /// Track name without extension
        track: String,
    },
    /// List all tracks
    List {
        /// One sorted list instead of folders
        #[arg(long)]
        flat: bool,

        /// Print the listing as JSON
        #[arg(long)]
        json: bool,
    },
    /// Pick a random track
    Random,
    /// Check whether a relative path may be served
    Check {
        /// Path relative to a media root
        path: String,
    },
}

fn load_config(cli: &Cli) -> Result<LibraryConfig, LibraryError> {
    let mut config = match &cli.config {
        Some(path) => LibraryConfig::from_json_file(path)?,
        None => LibraryConfig::default(),
    };
    config.roots.extend(cli.roots.iter().cloned());
    config.forbidden.extend(cli.forbidden.iter().cloned());
    if cli.env_root {
        config = config.with_env_root();
    }
    Ok(config)
}

fn run(cli: Cli) -> Result<ExitCode, LibraryError> {
    let config = load_config(&cli)?;
    info!("Roots: {:?}", config.roots);

    let library = MediaLibrary::new(config)?;
    let report = library.rebuild()?;

    match cli.command {
        Commands::Scan { json } => {
            let Some(report) = report else {
                return Ok(ExitCode::FAILURE);
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("Scan completed:");
                println!("  Files seen: {}", report.total_files);
                println!("  Directories: {}", report.total_dirs);
                println!("  Media entries: {}", report.media_entries);
                println!("  Image entries: {}", report.image_entries);
                println!("  Forbidden: {}", report.skipped_forbidden);
                println!("  Duplicates: {}", report.skipped_duplicate);
                println!("  Errors: {}", report.error_count());
                println!("  Duration: {}ms", report.duration_ms);
            }
        }
        Commands::Resolve { query, limit, json } => {
            let limit = limit.unwrap_or(library.config().default_limit);
            let resolution = library.resolve_detailed(query.trim(), limit);
            if json {
                println!("{}", serde_json::to_string_pretty(&resolution.entries)?);
            }
            match resolution.outcome() {
                Outcome::NotFound => {
                    error!("Track not found: {}", query);
                    return Ok(ExitCode::FAILURE);
                }
                Outcome::Single(entry) if !json => {
                    println!("{}", entry.relative_path);
                    if let Some(cover) = library.find_cover_near(entry) {
                        println!("  cover: {}", cover.relative_path);
                    }
                }
                Outcome::Ambiguous(entries) if !json => {
                    println!("{} matches ({:?}):", entries.len(), resolution.phase);
                    for entry in entries {
                        println!("  {}", entry.relative_path);
                    }
                }
                _ => {}
            }
        }
        Commands::Cover { track } => match library.find_cover(&track) {
            Some(cover) => println!("{}", cover.relative_path),
            None => {
                error!("No cover for {}", track);
                return Ok(ExitCode::FAILURE);
            }
        },
        Commands::List { flat, json } => {
            if flat {
                let entries = library.flat_listing();
                if json {
                    println!("{}", serde_json::to_string_pretty(&entries)?);
                } else {
                    for entry in entries {
                        println!("{}", entry.relative_path);
                    }
                }
            } else {
                let folders = library.structured_listing();
                if json {
                    println!("{}", serde_json::to_string_pretty(&folders)?);
                } else {
                    for folder in folders {
                        let title = if folder.folder.is_empty() {
                            "Root"
                        } else {
                            folder.folder.as_str()
                        };
                        println!("{}", title);
                        for entry in &folder.entries {
                            println!("  {}", entry.display_name);
                        }
                    }
                }
            }
        }
        Commands::Random => match library.random_entry() {
            Some(entry) => println!("{}", entry.relative_path),
            None => {
                error!("No tracks indexed");
                return Ok(ExitCode::FAILURE);
            }
        },
        Commands::Check { path } => match library.open_for_serving(&path) {
            Ok(file) => println!("{} ({})", file.relative_path, file.mime_type),
            Err(e) => {
                error!("{}", e);
                return Ok(ExitCode::FAILURE);
            }
        },
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
