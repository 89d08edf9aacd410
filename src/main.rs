use std::fmt::Write as _;
use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use semconf::config::{CONFIG_FILE_NAME, SemconfConfig};
use semconf::symbols::SymbolExtractor;
use semconf::{ConflictRegion, DetectionRequest, SemanticConflictDetector, SymbolTable};

mod format;
mod telemetry;

use format::OutputFormat;

/// Semantic conflict detection for multi-task merges
///
/// Several tasks edit the same Python file from a common baseline. Their
/// line-level edits may merge cleanly and still break each other. semconf
/// cross-checks each task's before/after symbol tables and reports:
///
///   - calls to a function another task renamed
///   - uses of an import another task removed
///   - return types that became nullable
///
/// QUICK START:
///
///   semconf detect request.json
///   semconf detect request.json --format json --fail-on-conflict
///   semconf symbols src/app.py
///
/// Configuration is read from ./.semconf.toml when present.
#[derive(Parser)]
#[command(name = "semconf")]
#[command(version, about)]
#[command(propagate_version = true)]
#[command(after_help = "See 'semconf <command> --help' for more information on a specific command.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect semantic conflicts for one file
    ///
    /// Reads a JSON detection request with `task_changes` (task id → file
    /// analysis) and `task_file_contents` (task id → before/after text).
    Detect {
        /// Request file, or '-' for stdin
        request: PathBuf,

        /// Config file [default: ./.semconf.toml if present]
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format: text or json
        #[arg(long)]
        format: Option<OutputFormat>,

        /// Exit with status 1 if any conflict is found
        #[arg(long)]
        fail_on_conflict: bool,
    },

    /// Print the symbol table extracted from one file
    Symbols {
        /// Source file to analyse
        file: PathBuf,

        /// Config file [default: ./.semconf.toml if present]
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format: text or json
        #[arg(long)]
        format: Option<OutputFormat>,
    },
}

fn main() -> Result<ExitCode> {
    telemetry::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Detect {
            request,
            config,
            format,
            fail_on_conflict,
        } => detect(
            &request,
            config.as_deref(),
            OutputFormat::resolve(format),
            fail_on_conflict,
        ),
        Commands::Symbols {
            file,
            config,
            format,
        } => symbols(&file, config.as_deref(), OutputFormat::resolve(format)),
    }
}

fn load_config(explicit: Option<&Path>) -> Result<SemconfConfig> {
    match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("config file not found: {}", path.display());
            }
            Ok(SemconfConfig::load(path)?)
        }
        None => Ok(SemconfConfig::load(Path::new(CONFIG_FILE_NAME))?),
    }
}

fn read_request(path: &Path) -> Result<DetectionRequest> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read request from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request {}", path.display()))?
    };
    serde_json::from_str(&raw).with_context(|| format!("Invalid detection request {}", path.display()))
}

// ---------------------------------------------------------------------------
// detect
// ---------------------------------------------------------------------------

fn detect(
    request_path: &Path,
    config: Option<&Path>,
    format: OutputFormat,
    fail_on_conflict: bool,
) -> Result<ExitCode> {
    let config = load_config(config)?;
    let request = read_request(request_path)?;
    tracing::debug!(
        tasks = request.task_changes.len(),
        with_contents = request.task_file_contents.len(),
        "loaded detection request"
    );

    let detector = SemanticConflictDetector::new(&config.detect);
    let regions = detector.detect_request(&request);

    match format {
        OutputFormat::Json => println!("{}", OutputFormat::to_json(&regions)?),
        OutputFormat::Text => print!("{}", render_regions(&regions)),
    }

    if fail_on_conflict && !regions.is_empty() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn render_regions(regions: &[ConflictRegion]) -> String {
    if regions.is_empty() {
        return "No semantic conflicts.\n".to_owned();
    }
    let mut out = String::new();
    for region in regions {
        let _ = writeln!(out, "{region}");
    }
    let _ = writeln!(out, "\n{} semantic conflict(s).", regions.len());
    out
}

// ---------------------------------------------------------------------------
// symbols
// ---------------------------------------------------------------------------

fn symbols(file: &Path, config: Option<&Path>, format: OutputFormat) -> Result<ExitCode> {
    let config = load_config(config)?;
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let extractor = SymbolExtractor::new(&config.detect);
    let table = match extractor.try_extract(file, &content) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("No analysis available: {e}");
            return Ok(ExitCode::FAILURE);
        }
    };

    match format {
        OutputFormat::Json => println!("{}", OutputFormat::to_json(&table)?),
        OutputFormat::Text => print!("{}", render_symbols(&table)),
    }
    Ok(ExitCode::SUCCESS)
}

fn join_lines(lines: &[u32]) -> String {
    lines
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_symbols(table: &SymbolTable) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "definitions:");
    for (name, def) in table.definitions() {
        let _ = writeln!(out, "  {name}  {}  line {}  {}", def.kind, def.line, def.scope);
    }

    let _ = writeln!(out, "imports:");
    for (name, source) in table.imports() {
        let _ = writeln!(out, "  {name}  <- {source}");
    }

    let _ = writeln!(out, "signatures:");
    for (name, ret) in table.function_signatures() {
        match ret {
            Some(ret) => {
                let _ = writeln!(out, "  {name} -> {ret}");
            }
            None => {
                let _ = writeln!(out, "  {name}");
            }
        }
    }

    let _ = writeln!(out, "calls:");
    for (name, lines) in table.function_calls() {
        let _ = writeln!(out, "  {name}  {}", join_lines(lines));
    }

    let _ = writeln!(out, "usages:");
    for (name, lines) in table.usages() {
        let _ = writeln!(out, "  {name}  {}", join_lines(lines));
    }
    out
}
