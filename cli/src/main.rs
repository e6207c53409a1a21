use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use jsonschema_form_core::{compile, format_errors, CompileOptions, FormatOptions, MessageTable};
use serde_json::{json, Value};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(name = "jsonschema-form")]
#[command(about = "Compile a JSON Schema into a form model, and format or validate form data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Compile options file (JSON, kebab-case keys)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a schema (plus optional layout and data) into a form model
    Compile {
        /// Input JSON Schema file
        schema: PathBuf,

        /// Authored layout file
        #[arg(long)]
        layout: Option<PathBuf>,

        /// Initial data file
        #[arg(long)]
        data: Option<PathBuf>,

        /// Output file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },

    /// Clean form data against a schema
    Format {
        /// Input JSON Schema file
        schema: PathBuf,

        /// Data file to format
        data: PathBuf,

        /// Emit every declared array/object field, even when empty
        #[arg(long)]
        return_empty_fields: bool,

        /// Apply lossy coercions and complete partial date-times
        #[arg(long)]
        fix_errors: bool,

        /// Output file (defaults to stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },

    /// Validate data against a schema; exits with status 1 on errors
    Validate {
        /// Input JSON Schema file
        schema: PathBuf,

        /// Data file to validate
        data: PathBuf,

        /// Error message templates file (keyword -> text with {{placeholders}})
        #[arg(long)]
        messages: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
        format: OutputFormat,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum OutputFormat {
    Pretty,
    Compact,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for JSON
    let log_level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    let options: CompileOptions = match &cli.config {
        Some(path) => read_json(path, "config")?,
        None => CompileOptions::default(),
    };

    match cli.command {
        Commands::Compile {
            schema,
            layout,
            data,
            output,
            format,
        } => {
            let schema: Value = read_json(&schema, "schema")?;
            let layout: Option<Value> = layout.map(|p| read_json(&p, "layout")).transpose()?;
            let data: Option<Value> = data.map(|p| read_json(&p, "data")).transpose()?;

            let form = compile(&schema, layout.as_ref(), data.as_ref(), &options)
                .map_err(|e| anyhow::Error::from(e).context("Compilation failed"))?;
            for diagnostic in &form.diagnostics {
                eprintln!("Warning: {} ({})", diagnostic.message, diagnostic.pointer);
            }
            let model = form.to_json().context("Failed to serialize form model")?;
            write_json(&model, output.as_ref(), format)?;
        }
        Commands::Format {
            schema,
            data,
            return_empty_fields,
            fix_errors,
            output,
            format,
        } => {
            let schema: Value = read_json(&schema, "schema")?;
            let data: Value = read_json(&data, "data")?;
            let form = compile(&schema, None, None, &options)
                .map_err(|e| anyhow::Error::from(e).context("Compilation failed"))?;

            let format_options = FormatOptions {
                return_empty_fields: return_empty_fields || options.format.return_empty_fields,
                fix_errors: fix_errors || options.format.fix_errors,
            };
            let outcome = form.format(&data, &format_options);
            for unresolved in &outcome.unresolved {
                eprintln!("Warning: {}", unresolved.message);
            }
            write_json(&outcome.data, output.as_ref(), format)?;
        }
        Commands::Validate {
            schema,
            data,
            messages,
            format,
        } => {
            let schema: Value = read_json(&schema, "schema")?;
            let data: Value = read_json(&data, "data")?;
            let table = match messages {
                Some(path) => message_table(&read_json(&path, "messages")?),
                None => MessageTable::new(),
            };
            let form = compile(&schema, None, None, &options)
                .map_err(|e| anyhow::Error::from(e).context("Compilation failed"))?;

            let errors = form.validate(&data);
            let report: Vec<Value> = errors
                .iter()
                .map(|e| {
                    json!({
                        "dataPointer": e.data_pointer.to_string(),
                        "errors": e.errors,
                        "message": format_errors(&e.errors, &table),
                    })
                })
                .collect();
            write_json(&report, None, format)?;
            if !errors.is_empty() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Keyword → template pairs from a messages file. Non-string entries are skipped.
fn message_table(messages: &Value) -> MessageTable {
    let mut table = MessageTable::new();
    if let Some(entries) = messages.as_object() {
        for (keyword, text) in entries {
            if let Some(text) = text.as_str() {
                table = table.with_text(keyword.as_str(), text);
            }
        }
    }
    table
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", what, path.display()))?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse {} from: {}", what, path.display()))
}

fn write_json<T: serde::Serialize>(
    val: &T,
    path: Option<&PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let mut writer: Box<dyn Write> = if let Some(p) = path {
        let file = File::create(p)
            .with_context(|| format!("Failed to create output file: {}", p.display()))?;
        Box::new(BufWriter::new(file))
    } else {
        Box::new(BufWriter::new(io::stdout()))
    };

    match format {
        OutputFormat::Pretty => {
            serde_json::to_writer_pretty(&mut writer, val).context("Failed to write JSON")?;
        }
        OutputFormat::Compact => {
            serde_json::to_writer(&mut writer, val).context("Failed to write JSON")?;
        }
    }

    writeln!(writer).context("Failed to write trailing newline")?;
    writer.flush().context("Failed to flush output")?;

    Ok(())
}
