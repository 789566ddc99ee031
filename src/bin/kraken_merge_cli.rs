use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use kraken_merge::inputs::MergeConfig;
use kraken_merge::types::{AbundanceSource, RankSelection};
use kraken_merge::{build_merged_table, write_outputs};

fn parse_rank_selection(s: &str) -> Result<RankSelection, String> {
    s.parse()
}

#[derive(Parser)]
#[command(name = "kraken-merge")]
#[command(version)]
#[command(about = "Merge Kraken reports into a single table with an average abundance column")]
#[command(long_about = r#"
Merge Kraken reports into a single table with an additional average column.

OUTPUT FILES (inside OUTPUT):
  mkr_sort_abd.txt   Merged table sorted by average abundance, descending
  mkr_taxonomy.txt   Merged table in the order of the taxonomy reference file
  mkr_<RANK>.OTU     OTU table per rank: taxID, samples, avg, taxonomy

RANKS:
  D Domain, K Kingdom, P Phylum, C Class, O Order, F Family, G Genus,
  S Species, U Unclassified, - anything not listed
"#)]
struct Cli {
    /// Folder with at least 2 Kraken reports; only the desired files should be in it
    input: PathBuf,

    /// Output folder to create; it must not exist yet
    output: PathBuf,

    /// Report listing the complete taxonomy of the Kraken database, used to order mkr_taxonomy.txt
    file_format: PathBuf,

    /// Only use files within INPUT whose name ends with this suffix (e.g. .report)
    #[arg(short, long)]
    suffix: Option<String>,

    /// Rank to write an OTU table for [D K P C O F G S U - no]. Omit to write every rank
    #[arg(short, long, value_name = "RANK", allow_hyphen_values = true, value_parser = parse_rank_selection)]
    filter: Option<RankSelection>,

    /// Use the percentage Kraken printed (2 decimal places) instead of recomputing it from read counts
    #[arg(short = 'a', long = "avg_type")]
    avg_type: bool,

    /// Debug-level logging, progress spinners and elapsed time
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> MergeConfig {
        MergeConfig {
            input_dir: self.input,
            output_dir: self.output,
            reference: self.file_format,
            suffix: self.suffix,
            source: if self.avg_type {
                AbundanceSource::ReportedPercent
            } else {
                AbundanceSource::CladeReads
            },
            ranks: self.filter.unwrap_or_default(),
        }
    }
}

fn stage_spinner(verbose: bool, color: &str, msg: &'static str) -> Result<ProgressBar> {
    if !verbose {
        return Ok(ProgressBar::hidden());
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&[
                "⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏",
            ])
            .template(&format!("{{spinner:.{color}}} {{msg}}"))
            .context("Invalid spinner template")?,
    );
    spinner.set_message(msg);
    Ok(spinner)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let started = Instant::now();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let verbose = cli.verbose;
    let config = cli.into_config();

    // 1. Check every path before touching the output folder
    let spinner = stage_spinner(verbose, "blue", "Collecting reports...")?;
    let files = config.validate().context("Aborting")?;
    spinner.finish_with_message(format!("Found {} report(s).", files.len()));

    // 2. Read and merge everything in memory
    let spinner = stage_spinner(verbose, "green", "Merging reports...")?;
    let table = build_merged_table(&files, &config.reference, config.source)
        .context("Unable to merge reports")?;
    let (rows, columns) = table.shape();
    spinner.finish_with_message(format!("Merged {rows} taxa across {columns} samples."));

    // 3. Write tables
    let spinner = stage_spinner(verbose, "yellow", "Writing output files...")?;
    let written = write_outputs(&table, &config)
        .with_context(|| format!("Unable to write outputs to {}", config.output_dir.display()))?;
    spinner.finish_with_message(format!("Wrote {} file(s).", written.len()));

    if verbose {
        log::info!("Time Elapsed : {:.2}s", started.elapsed().as_secs_f64());
    }
    Ok(())
}
