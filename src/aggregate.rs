//src/aggregate.rs

use crate::merge::MergedTable;

/// Mean of the present cells only, NaN counted as missing. `None` when no
/// cell is present.
pub fn mean_present(values: &[Option<f64>]) -> Option<f64> {
    let (sum, n) = values
        .iter()
        .flatten()
        .filter(|v| !v.is_nan())
        .fold((0.0f64, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        None
    } else {
        Some(sum / n as f64)
    }
}

/// Fills the `avg` column of every row.
pub fn append_average(mut table: MergedTable) -> MergedTable {
    for row in table.rows_mut() {
        row.avg = mean_present(&row.values);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::merge_reports;
    use crate::report::SampleReport;
    use crate::types::{MergeKey, TaxonAbundance};
    use std::path::PathBuf;

    #[test]
    fn test_missing_cells_leave_the_denominator() {
        assert_eq!(mean_present(&[Some(2.0), None, Some(4.0)]), Some(3.0));
        assert_eq!(mean_present(&[None, Some(7.5)]), Some(7.5));
        assert_eq!(mean_present(&[None, None]), None);
        assert_eq!(mean_present(&[]), None);
        assert_eq!(mean_present(&[Some(f64::NAN), Some(4.0)]), Some(4.0));
        assert_eq!(mean_present(&[Some(f64::NAN)]), None);
    }

    #[test]
    fn test_single_file_row_average_is_its_value() {
        let human = MergeKey::new(9606, "Homo sapiens", "S");
        let a = SampleReport {
            label: "a".into(),
            path: PathBuf::from("a.report"),
            records: vec![TaxonAbundance { key: human.clone(), abundance: 60.0 }],
        };
        let b = SampleReport {
            label: "b".into(),
            path: PathBuf::from("b.report"),
            records: vec![TaxonAbundance { key: MergeKey::new(1, "root", "-"), abundance: 40.0 }],
        };

        let table = append_average(merge_reports(&[a, b], vec![MergeKey::new(2, "Bacteria", "D")]));
        let row = table.get(&human).unwrap();
        assert_eq!(row.values.iter().flatten().count(), 1);
        assert_eq!(row.avg, Some(60.0));

        let reference_only = table.get(&MergeKey::new(2, "Bacteria", "D")).unwrap();
        assert_eq!(reference_only.avg, None);
    }
}
