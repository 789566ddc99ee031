// src/lib.rs
pub mod aggregate;
pub mod error;
pub mod inputs;
pub mod merge;
pub mod otu;
pub mod report;
pub mod table_writer;
pub mod types;

use std::fs;
use std::path::{Path, PathBuf};

use crate::aggregate::append_average;
use crate::error::{MergeError, MergeResult};
use crate::inputs::MergeConfig;
use crate::merge::{merge_reports, MergedTable};
use crate::otu::write_otu_tables;
use crate::report::{read_reference_keys, read_sample_report};
use crate::table_writer::write_merged_outputs;
use crate::types::AbundanceSource;

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct MergeSummary {
    pub samples: usize,
    /// Distinct merge keys, reference-only keys included.
    pub taxa: usize,
    pub written: Vec<PathBuf>,
}

/// Reads every sample report and the reference, then merges and averages them.
/// Everything stays in memory; nothing is written.
pub fn build_merged_table(
    files: &[PathBuf],
    reference: &Path,
    source: AbundanceSource,
) -> MergeResult<MergedTable> {
    log::info!("Reading in {} files and analysing...", files.len());
    let reports = files
        .iter()
        .map(|path| read_sample_report(path, source))
        .collect::<MergeResult<Vec<_>>>()?;
    let reference_keys = read_reference_keys(reference)?;
    log::debug!(
        "taxonomy reference {} lists {} taxa",
        reference.display(),
        reference_keys.len()
    );

    Ok(append_average(merge_reports(&reports, reference_keys)))
}

/// Creates the output folder and writes the merged tables plus the OTU
/// tables `config.ranks` asks for.
pub fn write_outputs(table: &MergedTable, config: &MergeConfig) -> MergeResult<Vec<PathBuf>> {
    let dir = &config.output_dir;
    if dir.exists() {
        return Err(MergeError::OutputExists(dir.clone()));
    }
    fs::create_dir_all(dir).map_err(|e| MergeError::io(dir, e))?;

    let mut written = write_merged_outputs(table, dir)?;
    let ranks = config.ranks.ranks();
    if ranks.is_empty() {
        log::info!("No filter provided, skipping OTU tables");
    } else {
        written.extend(write_otu_tables(table, &ranks, dir)?);
    }
    Ok(written)
}

/// Validates `config`, merges every report and writes all outputs.
pub fn merge_kraken_reports(config: &MergeConfig) -> MergeResult<MergeSummary> {
    let files = config.validate()?;
    let table = build_merged_table(&files, &config.reference, config.source)?;
    let written = write_outputs(&table, config)?;

    Ok(MergeSummary {
        samples: table.samples().len(),
        taxa: table.rows().len(),
        written,
    })
}
