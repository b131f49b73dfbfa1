use std::io::Read as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};

use rowmerge::config::{CONFIG_FILE, Config};
use rowmerge::group::{GroupDefinition, GroupIdOptions, generate_group_id};
use rowmerge::merge::{
    clean_merge_buckets, clean_merge_duplicates, flatten_merge_buckets,
    fold_into_column_buckets, merge_recursive_custom,
};
use rowmerge::model::{Bucket, Collection as _, Key, Row, Value, as_collection};
use rowmerge::numeric::sum;
use rowmerge::telemetry;
use rowmerge::unique::unique;

/// Conflict-preserving merges of JSON rows
///
/// Every input is a JSON file (or `-` for stdin). Arrays are read as rows
/// keyed 0..n, objects as rows keyed by member name; object member order is
/// preserved.
///
/// EXAMPLES:
///
///   # Merge three versions of a record, keeping every conflicting value
///   rowmerge buckets a.json b.json c.json --dedupe
///
///   # Tag each value with the file it came from
///   rowmerge buckets a.json b.json --label a --label b
///
///   # Stable id for a row grouped by two columns
///   rowmerge group-id row.json country city
#[derive(Parser)]
#[command(name = "rowmerge")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (defaults to ./rowmerge.toml when present)
    #[arg(long, global = true, env = "ROWMERGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge rows into per-column buckets, then clean them
    Buckets {
        /// Rows to merge, in order
        #[arg(required = true)]
        rows: Vec<PathBuf>,

        /// Label for each row's values (give one per row, or none)
        #[arg(long = "label")]
        labels: Vec<String>,

        /// Collapse columns whose values are all identical
        #[arg(long)]
        dedupe: bool,

        /// Leave this column untouched by the cleaning passes
        #[arg(long = "exclude")]
        excluded: Vec<String>,

        /// Skip the final bucket-to-row cleaning
        #[arg(long)]
        raw: bool,
    },

    /// Recursively merge two rows, accumulating leaf conflicts in lists
    Recursive {
        existing: PathBuf,
        conflict: PathBuf,

        /// Levels of nested rows to recurse into (unbounded by default)
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Spread a row of buckets (JSON arrays/objects) into one flat row
    Flatten { row: PathBuf },

    /// Print the group id of a row
    ///
    /// Definitions are column names, column indexes (integers), or
    /// `prefix=column` to prefix the part name.
    GroupId {
        row: PathBuf,

        #[arg(required = true)]
        definitions: Vec<String>,

        /// Separator between a part name and its value
        #[arg(long)]
        kv_sep: Option<String>,

        /// Separator between parts
        #[arg(long)]
        groups_sep: Option<String>,
    },

    /// Keep the first occurrence of each distinct value
    Unique { collection: PathBuf },

    /// Sum the values of a collection (nulls are skipped)
    Sum { collection: PathBuf },
}

fn main() -> Result<()> {
    telemetry::init();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Buckets {
            rows,
            labels,
            dedupe,
            excluded,
            raw,
        } => run_buckets(&config, &rows, &labels, dedupe, &excluded, raw),
        Commands::Recursive {
            existing,
            conflict,
            max_depth,
        } => {
            let existing = read_row(&existing)?;
            let conflict = read_row(&conflict)?;
            let depth = max_depth.or(config.merge.max_depth);
            print_json(&merge_recursive_custom(&existing, &conflict, None, depth))
        }
        Commands::Flatten { row } => {
            let row: Row = read_row(&row)?
                .into_iter()
                .map(|(key, value)| match value {
                    Value::Row(inner) => (key, Value::Bucket(Bucket::from(inner))),
                    other => (key, other),
                })
                .collect();
            print_json(&flatten_merge_buckets(&row)?)
        }
        Commands::GroupId {
            row,
            definitions,
            kv_sep,
            groups_sep,
        } => {
            let row = read_row(&row)?;
            let definitions = definitions
                .iter()
                .map(|d| d.parse::<GroupDefinition>())
                .collect::<Result<Vec<_>, _>>()?;
            let options = GroupIdOptions {
                key_value_separator: kv_sep.unwrap_or(config.group_id.key_value_separator),
                groups_separator: groups_sep.unwrap_or(config.group_id.groups_separator),
            };
            println!("{}", generate_group_id(&row, &definitions, &options)?);
            Ok(())
        }
        Commands::Unique { collection } => print_json(&unique(&read_row(&collection)?)),
        Commands::Sum { collection } => {
            println!("{}", sum(&read_row(&collection)?)?);
            Ok(())
        }
    }
}

fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let path = explicit.unwrap_or_else(|| Path::new(CONFIG_FILE));
    if explicit.is_some() && !path.exists() {
        bail!("config file {} does not exist", path.display());
    }
    Ok(Config::load(path)?)
}

fn run_buckets(
    config: &Config,
    paths: &[PathBuf],
    labels: &[String],
    dedupe: bool,
    excluded: &[String],
    raw: bool,
) -> Result<()> {
    if !labels.is_empty() && labels.len() != paths.len() {
        bail!(
            "got {} labels for {} rows; give one label per row or none",
            labels.len(),
            paths.len()
        );
    }
    let label = |i: usize| labels.get(i).map(|l| Key::from(l.as_str()));

    let mut rows = paths.iter().map(|p| read_row(p));
    let Some(first) = rows.next() else {
        bail!("no rows to merge");
    };
    let first_label = label(0);
    let mut merged = fold_into_column_buckets(first?, &Row::new(), first_label.as_ref(), None);
    for (i, row) in rows.enumerate() {
        merged = fold_into_column_buckets(merged, &row?, None, label(i + 1).as_ref());
    }
    tracing::info!(rows = paths.len(), columns = merged.len(), "rows merged");

    let mut options = config.clean.options();
    options
        .excluded_columns
        .extend(excluded.iter().map(|c| Key::from(c.as_str())));

    if dedupe || config.clean.dedupe {
        merged = clean_merge_duplicates(&merged, &options);
    }
    if !raw {
        merged = clean_merge_buckets(&merged, &options);
    }
    print_json(&merged)
}

fn read_value(path: &Path) -> Result<Value> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("could not read stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("could not read {}", path.display()))?
    };
    serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))
}

fn read_row(path: &Path) -> Result<Row> {
    let value = read_value(path)?;
    let row = as_collection(&value).with_context(|| format!("{} is not a row", path.display()))?;
    Ok(row.to_row())
}

fn print_json(row: &Row) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(row)?);
    Ok(())
}
