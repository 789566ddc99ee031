//src/inputs.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{MergeError, MergeResult};
use crate::types::{AbundanceSource, RankSelection};

/// Everything a run needs, as given on the command line.
#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Directory holding the per-sample reports.
    pub input_dir: PathBuf,
    /// Directory to create; must not exist yet.
    pub output_dir: PathBuf,
    /// Report whose row order is the reference taxonomy order.
    pub reference: PathBuf,
    /// Keep only input files whose name ends with this.
    pub suffix: Option<String>,
    pub source: AbundanceSource,
    pub ranks: RankSelection,
}

impl MergeConfig {
    pub fn new(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        reference: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            reference: reference.into(),
            suffix: None,
            source: AbundanceSource::default(),
            ranks: RankSelection::default(),
        }
    }

    /// Checks the paths and returns the sample reports to merge, in merge order.
    /// Nothing is created on disk.
    pub fn validate(&self) -> MergeResult<Vec<PathBuf>> {
        let files = collect_input_files(&self.input_dir, self.suffix.as_deref())?;

        if self.output_dir.exists() {
            return Err(MergeError::OutputExists(self.output_dir.clone()));
        }
        if !self.reference.is_file() {
            return Err(MergeError::MissingReference(self.reference.clone()));
        }
        Ok(files)
    }
}

/// Lists the regular files directly inside `dir`, sorted by name.
///
/// The folder must hold at least two files before the suffix filter is
/// applied; after filtering, at least one must remain.
pub fn collect_input_files(dir: &Path, suffix: Option<&str>) -> MergeResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(MergeError::NotADirectory(dir.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| MergeError::io(dir, e))?
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            if path.is_file() {
                Some(path)
            } else {
                None
            }
        })
        .collect();
    files.sort();

    if files.len() < 2 {
        return Err(MergeError::TooFewInputs {
            dir: dir.to_path_buf(),
            found: files.len(),
        });
    }
    log::info!("There were {} files found in {}", files.len(), dir.display());

    if let Some(suffix) = suffix {
        files.retain(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().ends_with(suffix))
                .unwrap_or(false)
        });
        if files.is_empty() {
            return Err(MergeError::SuffixMatchedNothing(suffix.to_string()));
        }
        log::debug!("{} files match suffix \"{}\"", files.len(), suffix);
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "").unwrap();
    }

    #[test]
    fn test_collect_sorts_and_skips_subdirectories() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.report");
        touch(dir.path(), "a.report");
        fs::create_dir(dir.path().join("nested")).unwrap();

        let files = collect_input_files(dir.path(), None).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.report", "b.report"]);
    }

    #[test]
    fn test_collect_requires_two_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.report");
        assert!(matches!(
            collect_input_files(dir.path(), None),
            Err(MergeError::TooFewInputs { found: 1, .. })
        ));
    }

    #[test]
    fn test_suffix_filter() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.report");
        touch(dir.path(), "b.report");
        touch(dir.path(), "notes.txt");

        let files = collect_input_files(dir.path(), Some(".report")).unwrap();
        assert_eq!(files.len(), 2);

        assert!(matches!(
            collect_input_files(dir.path(), Some(".kreport")),
            Err(MergeError::SuffixMatchedNothing(_))
        ));
    }

    #[test]
    fn test_input_must_be_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.report");
        assert!(matches!(
            collect_input_files(&dir.path().join("a.report"), None),
            Err(MergeError::NotADirectory(_))
        ));
    }

    #[test]
    fn test_validate_rejects_existing_output_and_missing_reference() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        fs::create_dir(&input).unwrap();
        touch(&input, "a.report");
        touch(&input, "b.report");
        touch(dir.path(), "ref.report");

        let existing = MergeConfig::new(&input, dir.path(), dir.path().join("ref.report"));
        assert!(matches!(existing.validate(), Err(MergeError::OutputExists(_))));

        let no_ref = MergeConfig::new(&input, dir.path().join("out"), dir.path().join("missing"));
        assert!(matches!(no_ref.validate(), Err(MergeError::MissingReference(_))));

        let ok = MergeConfig::new(&input, dir.path().join("out"), dir.path().join("ref.report"));
        assert_eq!(ok.validate().unwrap().len(), 2);
        assert!(!dir.path().join("out").exists());
    }
}
