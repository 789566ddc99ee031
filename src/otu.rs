//src/otu.rs

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{MergeError, MergeResult};
use crate::merge::{MergedRow, MergedTable};
use crate::table_writer::{create_output, format_cell, sort_by_avg_desc};
use crate::types::Rank;

/// File name of the OTU table for `rank`, e.g. `mkr_S.OTU`.
pub fn otu_file_name(rank: Rank) -> String {
    format!("mkr_{}.OTU", rank.code())
}

/// Rows at `rank` that have a defined average, highest first.
pub fn select_rank(table: &MergedTable, rank: Rank) -> Vec<&MergedRow> {
    let mut rows: Vec<&MergedRow> = table
        .rows()
        .iter()
        .filter(|r| r.avg.is_some() && rank.matches(&r.key.rank))
        .collect();
    sort_by_avg_desc(&mut rows);
    rows
}

/// Writes an OTU table:
///  taxID  <samples...>  avg  taxonomy
/// The taxonomy column is the name without its depth indentation.
pub fn write_otu_table<W: Write>(
    samples: &[String],
    rows: &[&MergedRow],
    writer: &mut W,
) -> io::Result<()> {
    write!(writer, "taxID")?;
    for sample in samples {
        write!(writer, "\t{}", sample)?;
    }
    writeln!(writer, "\tavg\ttaxonomy")?;

    for row in rows {
        write!(writer, "{}", row.key.tax_id)?;
        for value in &row.values {
            write!(writer, "\t{}", format_cell(*value))?;
        }
        writeln!(
            writer,
            "\t{}\t{}",
            format_cell(row.avg),
            row.key.tax_name.trim_start()
        )?;
    }
    Ok(())
}

/// Writes one OTU table per rank into `dir`. A rank with no rows still gets
/// a header-only file.
pub fn write_otu_tables(table: &MergedTable, ranks: &[Rank], dir: &Path) -> MergeResult<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(ranks.len());

    for &rank in ranks {
        let rows = select_rank(table, rank);
        let path = dir.join(otu_file_name(rank));
        log::info!("Writing OTU table {} ({} taxa)", path.display(), rows.len());

        let mut out = create_output(&path)?;
        write_otu_table(table.samples(), &rows, &mut out)
            .and_then(|_| out.flush())
            .map_err(|e| MergeError::io(&path, e))?;
        written.push(path);
    }
    Ok(written)
}
