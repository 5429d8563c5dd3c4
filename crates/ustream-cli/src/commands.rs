use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use tracing::debug;
use ustream_merge::{MergeConfig, MergeSummary, MergeTransform, ValidationMode};

use crate::cli::*;
use crate::ndjson;

pub fn run_command(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Merge(args) => cmd_merge(args, &cli.format),
        Command::Check(args) => cmd_check(args, &cli.format),
    }
}

fn cmd_merge(args: MergeArgs, format: &OutputFormat) -> Result<()> {
    let config = overlay_flags(load_config(args.config.as_deref())?, &args);

    let text = fs::read_to_string(&args.changes)
        .with_context(|| format!("failed to read change file {}", args.changes.display()))?;
    let changes = ndjson::parse_changes(&text, ndjson::is_line_delimited(&args.changes))
        .with_context(|| format!("failed to parse change file {}", args.changes.display()))?;
    let transform = MergeTransform::from_json_changes(config, changes)?;
    debug!(
        changes = %args.changes.display(),
        pending = transform.pending(),
        "change file loaded"
    );

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };
    let writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let summary = merge_ndjson(transform, reader, writer)?;
    if !args.quiet {
        report(&summary, format)?;
    }
    Ok(())
}

fn cmd_check(args: CheckArgs, format: &OutputFormat) -> Result<()> {
    let config = load_config(Some(&args.config))?;
    let resolved = config.resolve()?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&resolved)?),
        OutputFormat::Text => {
            println!("{} {}", "✓".green().bold(), args.config.display());
            println!("  Key field: {}", resolved.key_field().yellow());
            println!("  Version field: {}", resolved.version_field().yellow());
            println!("  Batches: {}", resolved.batches());
        }
    }
    Ok(())
}

/// Run one merge pass from NDJSON `reader` to NDJSON `writer`.
///
/// A read or parse failure aborts the pass: units already written are
/// flushed and kept, and the residual changes are not appended.
pub(crate) fn merge_ndjson<R: BufRead, W: Write>(
    transform: MergeTransform,
    reader: R,
    mut writer: W,
) -> Result<MergeSummary> {
    let mut merged = transform.into_try_merge_iter(ndjson::read_units(reader));

    for next in merged.by_ref() {
        match next {
            Ok(unit) => ndjson::write_unit(&mut writer, &unit)?,
            Err(err) => {
                writer.flush().context("failed to flush partial output")?;
                return Err(err);
            }
        }
    }

    writer.flush().context("failed to flush output")?;
    Ok(merged.summary())
}

fn load_config(path: Option<&Path>) -> Result<MergeConfig> {
    let Some(path) = path else {
        return Ok(MergeConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
}

fn overlay_flags(mut config: MergeConfig, args: &MergeArgs) -> MergeConfig {
    if let Some(key_field) = &args.key_field {
        config.key_field = key_field.clone();
    }
    if let Some(version_field) = &args.version_field {
        config.version_field = Some(version_field.clone());
    }
    if args.batches {
        config.batches = true;
    }
    if args.strict {
        config.validation = ValidationMode::Strict;
    }
    config
}

fn report(summary: &MergeSummary, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => eprintln!("{}", serde_json::to_string_pretty(summary)?),
        OutputFormat::Text => {
            eprintln!(
                "{} Merged {} rows into {} units",
                "✓".green().bold(),
                summary.rows_in.to_string().bold(),
                summary.units_out
            );
            eprintln!("  Replaced: {}", summary.replaced.to_string().green());
            eprintln!("  Stale: {}", summary.stale_dropped.to_string().yellow());
            eprintln!("  Inserted: {}", summary.inserted.to_string().cyan());
        }
    }
    Ok(())
}
