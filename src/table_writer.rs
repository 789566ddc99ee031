//src/table_writer.rs

use std::cmp::Ordering;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{MergeError, MergeResult};
use crate::merge::{MergedRow, MergedTable};

/// Merged table sorted by average abundance.
pub const SORTED_TABLE: &str = "mkr_sort_abd.txt";
/// Merged table in taxonomy reference order.
pub const TAXONOMY_TABLE: &str = "mkr_taxonomy.txt";

/// Sorts by `avg` descending with undefined averages (and NaN) last. The
/// sort is stable, so equal averages keep their incoming order.
pub fn sort_by_avg_desc(rows: &mut [&MergedRow]) {
    fn defined(row: &MergedRow) -> Option<f64> {
        row.avg.filter(|v| !v.is_nan())
    }
    rows.sort_by(|a, b| match (defined(a), defined(b)) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

/// Rows with a defined average, highest first.
pub fn abundance_sorted(table: &MergedTable) -> Vec<&MergedRow> {
    let mut rows: Vec<&MergedRow> = table.rows().iter().filter(|r| r.avg.is_some()).collect();
    sort_by_avg_desc(&mut rows);
    rows
}

/// Rows in taxonomy reference order, skipping reference keys no sample has.
pub fn taxonomy_ordered(table: &MergedTable) -> Vec<&MergedRow> {
    let rows: Vec<&MergedRow> = table
        .reference_order()
        .iter()
        .filter_map(|key| table.get(key))
        .filter(|row| row.has_sample_data())
        .collect();

    let observed = table.rows().iter().filter(|r| r.has_sample_data()).count();
    if observed > rows.len() {
        log::warn!(
            "{} taxa found in samples are missing from the taxonomy reference and are left out of {}",
            observed - rows.len(),
            TAXONOMY_TABLE
        );
    }
    rows
}

/// Empty for a missing cell, otherwise the shortest exact decimal form.
pub fn format_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes the header and rows as tab-separated text:
///  taxID  taxName  rank  <samples...>  avg
pub fn write_merged_table<W: Write>(
    samples: &[String],
    rows: &[&MergedRow],
    writer: &mut W,
) -> io::Result<()> {
    write!(writer, "taxID\ttaxName\trank")?;
    for sample in samples {
        write!(writer, "\t{}", sample)?;
    }
    writeln!(writer, "\tavg")?;

    for row in rows {
        write!(writer, "{}\t{}\t{}", row.key.tax_id, row.key.tax_name, row.key.rank)?;
        for value in &row.values {
            write!(writer, "\t{}", format_cell(*value))?;
        }
        writeln!(writer, "\t{}", format_cell(row.avg))?;
    }
    Ok(())
}

pub(crate) fn create_output(path: &Path) -> MergeResult<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| MergeError::io(path, e))
}

fn write_one(path: PathBuf, samples: &[String], rows: &[&MergedRow]) -> MergeResult<PathBuf> {
    log::info!("Writing file {}", path.display());
    let mut out = create_output(&path)?;
    write_merged_table(samples, rows, &mut out)
        .and_then(|_| out.flush())
        .map_err(|e| MergeError::io(&path, e))?;
    Ok(path)
}

/// Writes both merged tables into `dir` and returns their paths.
pub fn write_merged_outputs(table: &MergedTable, dir: &Path) -> MergeResult<Vec<PathBuf>> {
    let sorted = write_one(dir.join(SORTED_TABLE), table.samples(), &abundance_sorted(table))?;
    let taxonomy = write_one(dir.join(TAXONOMY_TABLE), table.samples(), &taxonomy_ordered(table))?;
    Ok(vec![sorted, taxonomy])
}
