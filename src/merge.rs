//src/merge.rs

use ahash::{AHashMap, AHashSet};

use crate::report::SampleReport;
use crate::types::MergeKey;

/// One taxon across all samples.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub key: MergeKey,
    /// One cell per sample column; `None` when the sample lacks this taxon.
    pub values: Vec<Option<f64>>,
    /// Filled in by [`crate::aggregate::append_average`].
    pub avg: Option<f64>,
}

impl MergedRow {
    pub fn has_sample_data(&self) -> bool {
        self.values.iter().any(Option::is_some)
    }
}

/// Outer join of every sample report on [`MergeKey`].
///
/// Rows keep first-appearance order. The taxonomy reference adds rows to
/// the key universe but never a column.
#[derive(Debug, Clone, Default)]
pub struct MergedTable {
    samples: Vec<String>,
    rows: Vec<MergedRow>,
    index: AHashMap<MergeKey, usize>,
    reference_order: Vec<MergeKey>,
}

impl MergedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample column labels, in join order.
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn rows(&self) -> &[MergedRow] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [MergedRow] {
        &mut self.rows
    }

    pub fn get(&self, key: &MergeKey) -> Option<&MergedRow> {
        self.index.get(key).map(|&i| &self.rows[i])
    }

    /// Reference keys in reference file order, duplicates removed.
    pub fn reference_order(&self) -> &[MergeKey] {
        &self.reference_order
    }

    /// (rows, sample columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.samples.len())
    }

    fn row_index(&mut self, key: &MergeKey) -> usize {
        if let Some(&i) = self.index.get(key) {
            return i;
        }
        let i = self.rows.len();
        self.rows.push(MergedRow {
            key: key.clone(),
            values: vec![None; self.samples.len()],
            avg: None,
        });
        self.index.insert(key.clone(), i);
        i
    }

    /// Adds `report` as a new sample column.
    pub fn join(mut self, report: &SampleReport) -> Self {
        let col = self.samples.len();
        if self.samples.contains(&report.label) {
            log::warn!(
                "sample label {} from {} is used by an earlier file",
                report.label,
                report.path.display()
            );
        }
        self.samples.push(report.label.clone());
        for row in self.rows.iter_mut() {
            row.values.push(None);
        }

        for record in &report.records {
            let i = self.row_index(&record.key);
            let cell = &mut self.rows[i].values[col];
            if cell.is_some() {
                log::warn!(
                    "{}: duplicate row for taxon {} ({}), keeping the later value",
                    report.path.display(),
                    record.key.tax_id,
                    record.key.tax_name.trim()
                );
            }
            *cell = Some(record.abundance);
        }

        log::debug!("(rows, columns) -> {:?} after {}", self.shape(), report.label);
        self
    }

    /// Records the reference key order and adds any key not seen in a sample.
    pub fn with_reference(mut self, keys: Vec<MergeKey>) -> Self {
        let mut seen = AHashSet::with_capacity(keys.len());
        let mut order = Vec::with_capacity(keys.len());
        for key in keys {
            if seen.insert(key.clone()) {
                self.row_index(&key);
                order.push(key);
            }
        }
        self.reference_order = order;
        self
    }
}

/// Joins `reports` in order, then folds in the reference keys.
pub fn merge_reports(reports: &[SampleReport], reference: Vec<MergeKey>) -> MergedTable {
    reports
        .iter()
        .fold(MergedTable::new(), MergedTable::join)
        .with_reference(reference)
}
