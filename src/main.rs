use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use erd_ddl::document::{load_document, save_document};
use erd_ddl::sql::{self, BracketStyle, Dialect, GenerateOptions, generate_report};
use erd_ddl::store::EntityStore;

const DEFAULT_CONFIG: &str = "erd-ddl.toml";

/// Convert ERD schema documents to SQL DDL and back
#[derive(Parser)]
#[command(name = "erd-ddl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: erd-ddl.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate DDL from a schema document
    Export {
        /// Schema document (JSON)
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Dialect: postgresql, mysql
        #[arg(short, long)]
        dialect: Option<String>,

        /// Identifier quoting: none, doubleQuote, backtick, squareBracket
        #[arg(short, long)]
        bracket: Option<String>,
    },

    /// Build a schema document from DDL
    Import {
        /// DDL file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Dialect: auto, postgresql, mysql
        #[arg(short, long)]
        dialect: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let config = load_config(cli.config.as_deref())?;
    if let Some(options) = &config {
        tracing::debug!(dialect = options.dialect.name(), "loaded config");
    }

    match cli.command {
        Commands::Export {
            input,
            output,
            dialect,
            bracket,
        } => export_command(config.unwrap_or_default(), &input, output.as_deref(), dialect, bracket),
        Commands::Import {
            input,
            output,
            dialect,
        } => {
            let fallback = config.map_or(Dialect::Auto, |options| options.dialect);
            import_command(fallback, &input, output.as_deref(), dialect)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Option<GenerateOptions>> {
    let path = match path {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG).exists() => Path::new(DEFAULT_CONFIG),
        None => return Ok(None),
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let options = toml::from_str(&contents)
        .with_context(|| format!("Invalid config {}", path.display()))?;
    Ok(Some(options))
}

fn parse_dialect(name: &str) -> Result<Dialect> {
    Dialect::from_str(name).ok_or_else(|| anyhow!("Invalid dialect: {name}"))
}

fn write_output(path: Option<&Path>, text: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
        }
        None => {
            print!("{text}");
            Ok(())
        }
    }
}

fn export_command(
    mut options: GenerateOptions,
    input: &Path,
    output: Option<&Path>,
    dialect: Option<String>,
    bracket: Option<String>,
) -> Result<()> {
    if let Some(name) = dialect {
        options.dialect = parse_dialect(&name)?;
    }
    if let Some(name) = bracket {
        let style =
            BracketStyle::from_str(&name).ok_or_else(|| anyhow!("Invalid bracket: {name}"))?;
        options = options.with_bracket(style);
    }

    let json = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let store = load_document(&json)?;

    let report = generate_report(&store, &options);
    for skipped in &report.skipped {
        tracing::warn!(kind = ?skipped.kind, id = %skipped.id, reason = ?skipped.reason, "statement skipped");
    }
    write_output(output, &report.sql)
}

fn import_command(
    fallback: Dialect,
    input: &Path,
    output: Option<&Path>,
    dialect: Option<String>,
) -> Result<()> {
    let dialect = match dialect {
        Some(name) => parse_dialect(&name)?,
        None => fallback,
    };

    let text = fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let parsed = sql::parse(&text, dialect);
    for diagnostic in &parsed.diagnostics {
        tracing::warn!(kind = ?diagnostic.kind, "{diagnostic}");
    }

    let mut store = EntityStore::new();
    store.apply(parsed.batch);
    tracing::info!(
        tables = store.tables.len(),
        relationships = store.relationships.len(),
        indexes = store.indexes.len(),
        "imported ddl"
    );
    let mut json = save_document(&store)?;
    json.push('\n');
    write_output(output, &json)
}
