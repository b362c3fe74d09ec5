//! hmerge CLI: merge, impute, and inspect large delimited health-record tables.

use clap::{Args, Parser, Subcommand};
use hmerge_core::config::EngineConfig;
use hmerge_exec::{write_manifest, Engine};
use hmerge_impute::ColumnStrategy;
use hmerge_io::sniff::delimiter_name;
use hmerge_io::{count_rows, SourceOptions};
use hmerge_planner::dsl::yaml::parse_delimiter;
use hmerge_planner::{
    catalog, estimate_chunk_rows, load_job, plan_merge, source_size, DatasetKind, MergeJob,
    MergePlan, SourceSpec,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "hmerge")]
#[command(about = "Bounded-memory streaming merge and imputation of wide delimited tables", long_about = None)]
struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG applies when absent.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a merge job described by a YAML file
    Run {
        /// Path to the job YAML file
        #[arg(short, long)]
        job: PathBuf,

        /// Output path (overrides the job file)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Merge sources given on the command line, side by side
    Merge {
        /// Source as PATH or PATH:PREFIX (repeatable, at least one)
        #[arg(short, long = "source", required = true)]
        sources: Vec<String>,

        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,

        /// Field delimiter for every source (sniffed per file when absent)
        #[arg(short, long)]
        delimiter: Option<String>,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Stream one file through the imputation engine, keeping its columns
    Impute {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        #[arg(short, long)]
        delimiter: Option<String>,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Count data rows in a file
    Count {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        delimiter: Option<String>,

        /// Rows per read chunk (defaults to the size-based estimate)
        #[arg(long)]
        chunk_rows: Option<usize>,
    },

    /// Show the merge plan for a job without running it (EXPLAIN)
    Explain {
        /// Path to the job YAML file
        #[arg(short, long)]
        job: PathBuf,

        /// Chunk size to plan with (overrides config)
        #[arg(long)]
        chunk_rows: Option<usize>,
    },

    /// List catalog columns for a dataset kind
    Columns {
        /// NRD, NEDS, KID, or NIS
        #[arg(long)]
        dataset: String,

        /// Restrict to one file group (core, hospital, severity, ...)
        #[arg(long)]
        group: Option<String>,
    },
}

/// Run-time settings; these win over the environment and the job file.
#[derive(Args, Debug, Default)]
struct Overrides {
    /// Fixed rows per chunk
    #[arg(long)]
    chunk_rows: Option<usize>,

    /// Rows buffered before the writer flushes
    #[arg(long)]
    flush_rows: Option<usize>,

    /// Writer buffer cap in bytes
    #[arg(long)]
    memory_cap: Option<usize>,

    /// Skip the row-count pre-pass
    #[arg(long)]
    no_count: bool,

    /// Fill value for categorical columns with nothing to impute from
    #[arg(long)]
    unknown_literal: Option<String>,

    /// Write the run manifest (JSON) here
    #[arg(long)]
    manifest: Option<PathBuf>,
}

impl Overrides {
    fn apply(&self, cfg: &mut EngineConfig) {
        if let Some(v) = self.chunk_rows {
            cfg.chunk_rows = Some(v);
        }
        if let Some(v) = self.flush_rows {
            cfg.flush_rows = v;
        }
        if let Some(v) = self.memory_cap {
            cfg.mem_cap_bytes = v;
        }
        if self.no_count {
            cfg.count_rows = false;
        }
        if let Some(v) = &self.unknown_literal {
            cfg.unknown_literal = v.clone();
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            job,
            output,
            overrides,
        } => run_job(&job, output, &overrides),
        Commands::Merge {
            sources,
            output,
            delimiter,
            overrides,
        } => merge_sources(&sources, output, delimiter, &overrides),
        Commands::Impute {
            input,
            output,
            delimiter,
            overrides,
        } => impute_file(input, output, delimiter, &overrides),
        Commands::Count {
            input,
            delimiter,
            chunk_rows,
        } => count_file(&input, delimiter.as_deref(), chunk_rows),
        Commands::Explain { job, chunk_rows } => explain_job(&job, chunk_rows),
        Commands::Columns { dataset, group } => list_columns(&dataset, group.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// defaults < environment < job `config:` < command-line flags
fn resolve_config(job: &MergeJob, overrides: &Overrides) -> EngineConfig {
    let mut cfg = EngineConfig::from_env();
    job.config.apply(&mut cfg);
    overrides.apply(&mut cfg);
    cfg
}

fn run_job(path: &Path, output: Option<PathBuf>, overrides: &Overrides) -> CliResult<()> {
    let mut job = load_job(path)?;
    if let Some(out) = output {
        job.output = out;
    }
    execute(&job, overrides)
}

fn merge_sources(
    sources: &[String],
    output: PathBuf,
    delimiter: Option<String>,
    overrides: &Overrides,
) -> CliResult<()> {
    let mut specs = Vec::with_capacity(sources.len());
    for s in sources {
        let (path, prefix) = split_source_arg(s);
        specs.push(SourceSpec {
            prefix,
            delimiter: delimiter.clone(),
            ..SourceSpec::new(path)
        });
    }
    let job = adhoc_job(specs, output);
    execute(&job, overrides)
}

fn impute_file(
    input: PathBuf,
    output: PathBuf,
    delimiter: Option<String>,
    overrides: &Overrides,
) -> CliResult<()> {
    let spec = SourceSpec {
        delimiter,
        ..SourceSpec::new(input)
    };
    let job = adhoc_job(vec![spec], output);
    execute(&job, overrides)
}

fn adhoc_job(sources: Vec<SourceSpec>, output: PathBuf) -> MergeJob {
    MergeJob {
        output,
        sources,
        config: Default::default(),
        policies: Default::default(),
        builtin_policies: true,
    }
}

fn execute(job: &MergeJob, overrides: &Overrides) -> CliResult<()> {
    let cfg = resolve_config(job, overrides);
    let plan = plan_merge(job, &cfg)?;
    let engine = Engine::new(cfg);
    let manifest = engine.run(&plan)?;

    println!("✓ Wrote {}", manifest.output_path);
    println!("  Rows: {}", manifest.rows_written);
    println!("  Columns: {}", manifest.columns_written);
    println!(
        "  Size: {} bytes ({:.2} GB)",
        manifest.bytes_written,
        manifest.bytes_written as f64 / (1u64 << 30) as f64
    );
    println!("  Duration: {}ms", manifest.duration_ms());
    println!("  Plan hash: {}", manifest.plan_hash);

    if let Some(path) = &overrides.manifest {
        write_manifest(path, &manifest)?;
        println!("  Manifest: {}", path.display());
    }
    Ok(())
}

fn count_file(input: &Path, delimiter: Option<&str>, chunk_rows: Option<usize>) -> CliResult<()> {
    let cfg = EngineConfig::from_env();
    let chunk_rows = match chunk_rows.or(cfg.chunk_rows) {
        Some(n) => n,
        None => estimate_chunk_rows(source_size(input)?, &cfg.chunk_bounds),
    };
    let opts = SourceOptions {
        delimiter: delimiter.map(parse_delimiter).transpose()?,
        ..SourceOptions::default()
    };
    let rows = count_rows(input, &opts, chunk_rows)?;
    println!("{rows}");
    Ok(())
}

fn explain_job(path: &Path, chunk_rows: Option<usize>) -> CliResult<()> {
    let job = load_job(path)?;
    let overrides = Overrides {
        chunk_rows,
        ..Overrides::default()
    };
    let cfg = resolve_config(&job, &overrides);
    let plan = plan_merge(&job, &cfg)?;
    print_plan(&plan)?;
    Ok(())
}

fn print_plan(plan: &MergePlan) -> CliResult<()> {
    println!("Merge Plan");
    println!("==========");
    println!();
    println!("Output: {}", plan.output.display());
    println!("Chunk Size: {} rows", plan.chunk_rows);
    println!("Plan hash: {}", plan.plan_hash()?);
    println!();
    println!("Sources (processing order):");
    for (i, s) in plan.sources.iter().enumerate() {
        println!(
            "  {}. {}{} - {:.2} GB, {} columns, {} delimited, prefix {}",
            i + 1,
            s.path.display(),
            if s.primary { " [primary]" } else { "" },
            s.size_bytes as f64 / (1u64 << 30) as f64,
            s.schema.len(),
            delimiter_name(s.delimiter as u8),
            s.prefix.as_deref().unwrap_or("-"),
        );
    }
    println!();
    println!("Columns ({}):", plan.schema.len());
    for (field, cp) in plan.schema.fields.iter().zip(&plan.impute.columns) {
        let strategy = match cp.strategy {
            ColumnStrategy::Numeric(m) => format!("numeric/{m:?}"),
            ColumnStrategy::Categorical(m) => format!("categorical/{m:?}"),
        };
        println!("  {:<32} {:?} -> {}", field.name, field.data_type, strategy.to_lowercase());
    }
    Ok(())
}

fn list_columns(dataset: &str, group: Option<&str>) -> CliResult<()> {
    let kind: DatasetKind = dataset.parse()?;
    let Some(layout) = catalog()?.dataset(kind) else {
        return Err(format!("no column layout is bundled for {kind}").into());
    };
    for g in &layout.groups {
        if let Some(want) = group {
            if !g.name.eq_ignore_ascii_case(want) {
                continue;
            }
        }
        println!("[{}]", g.name);
        for c in &g.columns {
            println!("  {:<20} {}", c.name, c.description);
        }
    }
    Ok(())
}

/// `PATH` or `PATH:PREFIX`. A suffix that looks like part of a path is kept
/// in the path.
fn split_source_arg(arg: &str) -> (PathBuf, Option<String>) {
    match arg.rsplit_once(':') {
        Some((path, prefix))
            if !path.is_empty()
                && !prefix.is_empty()
                && !prefix.contains(['/', '\\', '.']) =>
        {
            (PathBuf::from(path), Some(prefix.to_string()))
        }
        _ => (PathBuf::from(arg), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_arg_splits_prefix() {
        assert_eq!(
            split_source_arg("data/nrd.csv:NRD"),
            (PathBuf::from("data/nrd.csv"), Some("NRD".to_string()))
        );
        assert_eq!(split_source_arg("data/nrd.csv"), (PathBuf::from("data/nrd.csv"), None));
        assert_eq!(
            split_source_arg(r"C:\data\nrd.csv"),
            (PathBuf::from(r"C:\data\nrd.csv"), None)
        );
    }

    #[test]
    fn cli_flags_win_over_job_config() {
        let job = hmerge_planner::parse_job(
            "output: o.csv\nconfig: { flush_rows: 10, chunk_rows: 5 }\nsources:\n  - { path: a.csv }\n",
        )
        .unwrap();
        let overrides = Overrides {
            chunk_rows: Some(7),
            no_count: true,
            ..Overrides::default()
        };
        let cfg = resolve_config(&job, &overrides);
        assert_eq!(cfg.chunk_rows, Some(7));
        assert_eq!(cfg.flush_rows, 10);
        assert!(!cfg.count_rows);
    }
}
