use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use contest_split::{run_file, write_outputs, ExportOptions, ScorerKind, SplitConfig};

/// Split a competition results CSV into institution and team tables
#[derive(Parser, Debug)]
#[command(name = "contest-split")]
#[command(about = "Resolve institution names and split results into relational tables")]
#[command(version)]
struct Args {
    /// Results CSV to process
    input: PathBuf,

    /// Directory for the output files
    #[arg(short, long, default_value = "results", env = "CONTEST_SPLIT_OUT")]
    out: PathBuf,

    /// JSON config file (CLI flags override its values)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Minimum similarity (0-100) to merge two institution names
    #[arg(short, long, env = "CONTEST_SPLIT_THRESHOLD")]
    threshold: Option<u8>,

    /// Keep only the N institutions with the most teams
    #[arg(long)]
    top: Option<usize>,

    /// Similarity function: token-set or token-sort
    #[arg(long)]
    scorer: Option<ScorerKind>,

    /// Id assigned to the first institution
    #[arg(long)]
    id_base: Option<u32>,

    /// Also write both base tables to this SQLite database
    #[arg(long)]
    sqlite: Option<PathBuf>,

    /// Skip trimming, state expansion and capitalization
    #[arg(long)]
    no_clean: bool,

    /// Do not write Clusters.csv
    #[arg(long)]
    no_clusters: bool,
}

impl Args {
    fn resolve_config(&self) -> Result<SplitConfig> {
        let mut config = match &self.config {
            Some(path) => SplitConfig::load_from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => SplitConfig::default(),
        };

        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(top) = self.top {
            config.top_n = Some(top);
        }
        if let Some(scorer) = self.scorer {
            config.scorer = scorer;
        }
        if let Some(id_base) = self.id_base {
            config.id_base = id_base;
        }
        if self.no_clean {
            config.clean_fields = false;
        }
        if self.no_clusters {
            config.write_clusters = false;
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "contest_split=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.resolve_config()?;

    info!(
        "Starting contest-split v{} (threshold {}, scorer {})",
        contest_split::VERSION,
        config.threshold,
        config.scorer
    );

    // 1. Load, resolve, project
    println!("📂 Loading {}...", args.input.display());
    let outcome = run_file(&args.input, &config)
        .with_context(|| format!("Failed to process {}", args.input.display()))?;
    println!(
        "✓ Resolved {} records into {} institutions",
        outcome.record_count,
        outcome.tables.institutions.len()
    );

    // 2. Write outputs
    let options = ExportOptions {
        out_dir: args.out.clone(),
        sqlite_path: args.sqlite.clone(),
        input_path: Some(args.input.clone()),
    };
    let written = write_outputs(&outcome, &config, &options)
        .with_context(|| format!("Failed to write outputs to {}", args.out.display()))?;

    // 3. Summary
    println!(
        "✓ Average teams per institution: {}",
        outcome.statistics.average_teams_per_institution
    );
    for path in &written {
        println!("  → {}", path.display());
    }

    Ok(())
}
