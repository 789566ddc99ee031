//src/report.rs

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use flate2::read::MultiGzDecoder;

use crate::error::{MergeError, MergeResult};
use crate::types::{AbundanceSource, KrakenReportRow, MergeKey, TaxonAbundance};

/// Number of tab-separated columns in a Kraken report line.
pub const REPORT_COLUMNS: usize = 6;

/// One input report reduced to normalized abundances.
#[derive(Debug, Clone)]
pub struct SampleReport {
    /// Column label in the merged table, see [`sample_label`].
    pub label: String,
    pub path: PathBuf,
    /// Records in file order.
    pub records: Vec<TaxonAbundance>,
}

/// Opens a report for line reading, decompressing it when the name ends in `.gz`.
pub fn open_report(path: &Path) -> MergeResult<Box<dyn BufRead>> {
    let f = File::open(path).map_err(|e| MergeError::io(path, e))?;

    let is_gz = path
        .extension()
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let reader: Box<dyn BufRead> = if is_gz {
        Box::new(BufReader::new(MultiGzDecoder::new(f)))
    } else {
        Box::new(BufReader::new(f))
    };
    Ok(reader)
}

fn parse_field<T: FromStr>(raw: &str, path: &Path, line: usize) -> MergeResult<T> {
    let trimmed = raw.trim();
    trimmed.parse().map_err(|_| MergeError::InvalidNumber {
        path: path.to_path_buf(),
        line,
        value: trimmed.to_string(),
    })
}

/// Like [`parse_field`], but `nan` and `inf` are rejected too.
fn parse_finite(raw: &str, path: &Path, line: usize) -> MergeResult<f64> {
    let value: f64 = parse_field(raw, path, line)?;
    if !value.is_finite() {
        return Err(MergeError::InvalidNumber {
            path: path.to_path_buf(),
            line,
            value: raw.trim().to_string(),
        });
    }
    Ok(value)
}

/// Parses one report line. `line_no` is 1-based and only used for diagnostics.
pub fn parse_row(line: &str, path: &Path, line_no: usize) -> MergeResult<KrakenReportRow> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != REPORT_COLUMNS {
        return Err(MergeError::ColumnCount {
            path: path.to_path_buf(),
            line: line_no,
            found: fields.len(),
        });
    }

    Ok(KrakenReportRow {
        pct: parse_finite(fields[0], path, line_no)?,
        clade_reads: parse_field(fields[1], path, line_no)?,
        taxon_reads: parse_field(fields[2], path, line_no)?,
        rank: fields[3].to_string(),
        tax_id: parse_field(fields[4], path, line_no)?,
        tax_name: fields[5].to_string(),
    })
}

/// Reads every data row of a report. Blank lines are skipped; anything else
/// must be a well-formed 6-column row.
pub fn parse_report_rows<R: BufRead>(reader: R, path: &Path) -> MergeResult<Vec<KrakenReportRow>> {
    let mut rows = Vec::new();

    for (idx, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(|e| MergeError::io(path, e))?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        rows.push(parse_row(line, path, idx + 1)?);
    }

    if rows.len() < 2 {
        return Err(MergeError::TooFewRows {
            path: path.to_path_buf(),
            found: rows.len(),
        });
    }
    Ok(rows)
}

/// Reads per cent of all reads, taken from the first two rows
/// (unclassified and root): `(row0 + row1) / 100`.
pub fn root_total(rows: &[KrakenReportRow], path: &Path) -> MergeResult<f64> {
    if rows.len() < 2 {
        return Err(MergeError::TooFewRows {
            path: path.to_path_buf(),
            found: rows.len(),
        });
    }
    let total = (rows[0].clade_reads + rows[1].clade_reads) as f64 / 100.0;
    if total == 0.0 {
        return Err(MergeError::ZeroTotal(path.to_path_buf()));
    }
    Ok(total)
}

/// Turns parsed rows into keyed abundances according to `source`.
pub fn extract_abundances(
    rows: &[KrakenReportRow],
    source: AbundanceSource,
    path: &Path,
) -> MergeResult<Vec<TaxonAbundance>> {
    let records = match source {
        AbundanceSource::ReportedPercent => rows
            .iter()
            .map(|row| TaxonAbundance {
                key: MergeKey::from(row),
                abundance: row.pct,
            })
            .collect(),
        AbundanceSource::CladeReads => {
            let total = root_total(rows, path)?;
            log::debug!("{}: normalizing clade reads by {}", path.display(), total);
            rows.iter()
                .map(|row| TaxonAbundance {
                    key: MergeKey::from(row),
                    abundance: row.clade_reads as f64 / total,
                })
                .collect()
        }
    };
    Ok(records)
}

/// Short sample name: the file name up to its first `.`, so
/// `runs/s1.kraken.report.gz` becomes `s1`.
pub fn sample_label(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());

    match file_name.split('.').next() {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => file_name,
    }
}

/// Reads one sample report end to end.
pub fn read_sample_report(path: &Path, source: AbundanceSource) -> MergeResult<SampleReport> {
    let rows = parse_report_rows(open_report(path)?, path)?;
    let records = extract_abundances(&rows, source, path)?;
    log::debug!("{}: {} rows", path.display(), records.len());

    Ok(SampleReport {
        label: sample_label(path),
        path: path.to_path_buf(),
        records,
    })
}

/// Reads the taxonomy reference and returns its keys in file order.
/// Only the key sequence matters, so no normalization is applied.
pub fn read_reference_keys(path: &Path) -> MergeResult<Vec<MergeKey>> {
    let rows = parse_report_rows(open_report(path)?, path)?;
    Ok(rows.iter().map(MergeKey::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    const REPORT: &str = "\
  5.00\t50\t50\tU\t0\tunclassified
 95.00\t950\t10\t-\t1\troot
 90.00\t900\t0\tD\t2\t  Bacteria

 60.00\t600\t600\tS\t562\t      Escherichia coli
";

    fn rows() -> Vec<KrakenReportRow> {
        parse_report_rows(Cursor::new(REPORT), Path::new("s1.report")).unwrap()
    }

    #[test]
    fn test_parse_rows_keeps_name_indentation() {
        let rows = rows();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[2].tax_name, "  Bacteria");
        assert_eq!(rows[2].rank, "D");
        assert_eq!(rows[3].tax_id, 562);
        assert_eq!(rows[3].clade_reads, 600);
        assert!((rows[1].pct - 95.0).abs() < 1e-12);
    }

    #[test]
    fn test_wrong_column_count_is_rejected() {
        let err = parse_report_rows(Cursor::new("1.0\t1\t1\tU\t0\n2.0\t2\t2\tR\t1\troot\n"), Path::new("bad"))
            .unwrap_err();
        assert!(matches!(err, MergeError::ColumnCount { line: 1, found: 5, .. }));
    }

    #[test]
    fn test_non_numeric_field_is_rejected() {
        let err = parse_report_rows(Cursor::new("x\t1\t1\tU\t0\tunclassified\n"), Path::new("bad"))
            .unwrap_err();
        assert!(matches!(err, MergeError::InvalidNumber { ref value, .. } if value == "x"));
    }

    #[test]
    fn test_non_finite_percent_is_rejected() {
        for bad in ["nan", "NaN", "inf", "-inf"] {
            let data = format!("{bad}\t1\t1\tU\t0\tunclassified\n1.0\t1\t1\tR\t1\troot\n");
            let err = parse_report_rows(Cursor::new(data), Path::new("bad")).unwrap_err();
            assert!(matches!(err, MergeError::InvalidNumber { line: 1, ref value, .. } if value == bad));
        }
    }

    #[test]
    fn test_rank_column_is_kept_verbatim() {
        let row = parse_row("1.0\t1\t1\t S\t9606\tHomo sapiens", Path::new("r"), 1).unwrap();
        assert_eq!(row.rank, " S");
        assert_ne!(MergeKey::from(&row), MergeKey::new(9606, "Homo sapiens", "S"));
    }

    #[test]
    fn test_single_row_report_is_rejected() {
        let err = parse_report_rows(Cursor::new("100.0\t10\t10\tU\t0\tunclassified\n"), Path::new("one"))
            .unwrap_err();
        assert!(matches!(err, MergeError::TooFewRows { found: 1, .. }));
    }

    #[test]
    fn test_clade_reads_are_normalized_by_root_total() {
        let records = extract_abundances(&rows(), AbundanceSource::CladeReads, Path::new("s1")).unwrap();
        // total = (50 + 950) / 100 = 10
        assert!((records[0].abundance - 5.0).abs() < 1e-12);
        assert!((records[3].abundance - 60.0).abs() < 1e-12);
        assert_eq!(records[3].key, MergeKey::new(562, "      Escherichia coli", "S"));
    }

    #[test]
    fn test_reported_percent_is_taken_verbatim() {
        let records = extract_abundances(&rows(), AbundanceSource::ReportedPercent, Path::new("s1")).unwrap();
        assert!((records[2].abundance - 90.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_total_is_an_error() {
        let data = "0.0\t0\t0\tU\t0\tunclassified\n0.0\t0\t0\tR\t1\troot\n";
        let rows = parse_report_rows(Cursor::new(data), Path::new("z")).unwrap();
        assert!(matches!(
            extract_abundances(&rows, AbundanceSource::CladeReads, Path::new("z")),
            Err(MergeError::ZeroTotal(_))
        ));
        assert!(extract_abundances(&rows, AbundanceSource::ReportedPercent, Path::new("z")).is_ok());
    }

    #[test]
    fn test_sample_label_strips_dirs_and_every_extension() {
        assert_eq!(sample_label(Path::new("runs/s1.kraken.report.gz")), "s1");
        assert_eq!(sample_label(Path::new("./in/sample_2.txt")), "sample_2");
        assert_eq!(sample_label(Path::new("plain")), "plain");
        assert_eq!(sample_label(Path::new(".hidden")), ".hidden");
    }

    #[test]
    fn test_gzipped_report_is_decompressed() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s9.report.gz");
        let mut enc = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        enc.write_all(REPORT.as_bytes()).unwrap();
        enc.finish().unwrap();

        let report = read_sample_report(&path, AbundanceSource::CladeReads).unwrap();
        assert_eq!(report.label, "s9");
        assert_eq!(report.records.len(), 4);
    }
}
