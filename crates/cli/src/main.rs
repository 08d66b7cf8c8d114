//! mergeresolve command-line tool.
//!
//! Provides subcommands for auto-resolving the conflicts a git merge left in
//! the index, inspecting how each conflicting file is classified, taking one
//! side of a file wholesale, merging loose files, and generating / validating
//! configuration files.

mod merge_file;
mod progress;
mod resolve;
mod style;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use mergeresolve_core::config::{EngineConfig, DEFAULT_CONFIG_TOML};
use mergeresolve_core::ConflictSide;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// mergeresolve command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "mergeresolve",
    version,
    about = "Detect and automatically resolve three-way merge conflicts"
)]
struct Cli {
    /// Path to the TOML configuration file [default: <config dir>/mergeresolve/config.toml].
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve and stage every conflicting file that needs no manual decision.
    AutoResolve {
        /// Repository to work on.
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Report what would be resolved without writing anything.
        #[arg(long)]
        dry_run: bool,

        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show how each conflicting file is classified.
    Status {
        /// Repository to inspect.
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Print the classification as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Settle conflicting files by taking one side's whole version.
    Accept {
        /// Side whose version is kept.
        #[arg(long, value_enum)]
        side: SideArg,

        /// Repository to work on.
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Print the actions as JSON.
        #[arg(long)]
        json: bool,

        /// Repository-relative paths of the conflicting files.
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Three-way merge of loose files.
    MergeFile {
        /// Common ancestor.
        base: PathBuf,
        /// Our version.
        yours: PathBuf,
        /// Their version.
        theirs: PathBuf,

        /// Write the result here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print a unified diff from BASE instead of the merged text.
        #[arg(long)]
        diff: bool,
    },

    /// Generate a default configuration file.
    Init {
        /// Output path [default: the configuration path].
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a configuration file.
    Validate,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SideArg {
    Yours,
    Theirs,
}

impl From<SideArg> for ConflictSide {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::Yours => ConflictSide::Yours,
            SideArg::Theirs => ConflictSide::Theirs,
        }
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(default_config_path);
    let explicit = cli.config.is_some();
    let config = match &cli.command {
        // These two read (or write) the file themselves.
        Commands::Init { .. } | Commands::Validate => Ok(EngineConfig::default()),
        _ => load_config(config_path.as_deref(), explicit),
    };

    let level = match &config {
        Ok(config) => config.logging.level.clone(),
        Err(_) => "warn".to_string(),
    };
    init_logging(cli.verbose, &level);

    let result = match config {
        Ok(config) => run(cli, config, config_path).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", style::error(&format!("{:#}", e)));
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool, config_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { config_level })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli, config: EngineConfig, config_path: Option<PathBuf>) -> Result<ExitCode> {
    match cli.command {
        Commands::AutoResolve {
            repo,
            dry_run,
            json,
        } => resolve::run_auto_resolve(&config, &repo, dry_run, json).await,
        Commands::Status { repo, json } => resolve::run_status(&config, &repo, json),
        Commands::Accept {
            side,
            repo,
            json,
            paths,
        } => resolve::run_accept(&config, &repo, side.into(), &paths, json),
        Commands::MergeFile {
            base,
            yours,
            theirs,
            output,
            diff,
        } => merge_file::run_merge_file(&config, &base, &yours, &theirs, output.as_ref(), diff),
        Commands::Init { output } => {
            let output = output
                .or(config_path)
                .context("no output path given and no configuration directory found")?;
            cmd_init(&output)
        }
        Commands::Validate => {
            let path = config_path.context("no configuration path given")?;
            cmd_validate(&path)
        }
    }
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mergeresolve").join("config.toml"))
}

/// Load and validate the configuration. A missing file at the default
/// location means defaults; a missing file given with `--config` is an error.
fn load_config(path: Option<&Path>, explicit: bool) -> Result<EngineConfig> {
    match path {
        Some(path) if explicit || path.exists() => {
            EngineConfig::load_and_resolve(path).context("failed to load configuration file")
        }
        _ => {
            debug!("no configuration file, using defaults");
            Ok(EngineConfig::default())
        }
    }
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_init(output: &Path) -> Result<ExitCode> {
    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent).context("failed to create config directory")?;
    }

    std::fs::write(output, DEFAULT_CONFIG_TOML).context("failed to write config file")?;

    println!("{}", style::success(&format!("Default configuration written to {}", output.display())));
    println!();
    println!("Next steps:");
    println!("  1. Adjust the limits, exclude patterns and resolve options");
    println!(
        "  2. Validate with: mergeresolve validate --config {}",
        output.display()
    );
    Ok(ExitCode::SUCCESS)
}

fn cmd_validate(config_path: &Path) -> Result<ExitCode> {
    println!("Validating configuration: {}", config_path.display());
    println!();

    let config =
        EngineConfig::load_from_file(config_path).context("failed to parse configuration")?;
    println!("  [OK] TOML structure is valid");

    match config.validate() {
        Ok(()) => println!("  [OK] All fields are valid"),
        Err(e) => {
            println!("  [FAIL] Validation error: {}", e);
            anyhow::bail!("configuration validation failed");
        }
    }

    println!();
    println!("Configuration summary:");
    println!("  Auto-resolve mode : {:?}", config.auto_resolve.mode);
    println!("  Max file chars    : {}", config.auto_resolve.max_file_chars);
    println!("  Max changed lines : {}", config.auto_resolve.max_changed_lines);
    println!(
        "  Excluded paths    : {}",
        if config.auto_resolve.exclude.is_empty() {
            "none".to_string()
        } else {
            config.auto_resolve.exclude.join(", ")
        }
    );
    println!("  Diff algorithm    : {:?}", config.diff.algorithm);
    println!("  Resolve options   : {}", config.resolve_options.enabled.join(", "));
    println!("  Line ending       : {:?}", config.line_endings.fallback);
    println!();
    println!("Configuration is valid.");

    Ok(ExitCode::SUCCESS)
}
