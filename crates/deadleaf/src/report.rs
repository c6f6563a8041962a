use std::fmt::{self, Display};
use std::path::Path;

use path_slash::PathExt;

use crate::deadleaf::AnalysisResult;

/// Human-facing projection of an [`AnalysisResult`]. Paths are
/// project-relative with forward slashes, so reports are stable across
/// machines and checkouts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeadleafReport {
    pub scanned_count: usize,
    pub used_count: usize,
    /// Files nothing references, in enumeration order.
    pub unused_files: Vec<String>,
    /// Files static analysis flagged that bundle evidence cleared.
    pub rescued_files: Vec<String>,
    /// Total on-disk size of the unused files, when bundle correlation
    /// computed one.
    pub estimated_savings_bytes: Option<u64>,
}

impl Display for DeadleafReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file_path in self.unused_files.iter() {
            writeln!(f, "{} is completely unused", file_path)?;
        }
        for file_path in self.rescued_files.iter() {
            writeln!(f, "{} is kept by bundle evidence", file_path)?;
        }
        writeln!(
            f,
            "{} of {} scanned files are unused ({} used)",
            self.unused_files.len(),
            self.scanned_count,
            self.used_count,
        )?;
        if let Some(bytes) = self.estimated_savings_bytes {
            writeln!(f, "removing them would reclaim an estimated {} bytes", bytes)?;
        }
        Ok(())
    }
}

impl From<&AnalysisResult> for DeadleafReport {
    fn from(value: &AnalysisResult) -> Self {
        let rescued_files = match &value.bundle_correlation {
            Some(correlation) => correlation
                .rescued_files
                .iter()
                .map(|path| relative_slash(&value.root_dir, path))
                .collect(),
            None => Vec::new(),
        };
        DeadleafReport {
            scanned_count: value.all_files.len(),
            used_count: value.used_files.len(),
            unused_files: value
                .unused_files
                .iter()
                .map(|path| relative_slash(&value.root_dir, path))
                .collect(),
            rescued_files,
            estimated_savings_bytes: value
                .bundle_correlation
                .as_ref()
                .map(|correlation| correlation.estimated_savings_bytes),
        }
    }
}

fn relative_slash(root_dir: &Path, path: &Path) -> String {
    match pathdiff::diff_paths(path, root_dir) {
        Some(relative) => relative.to_slash_lossy().to_string(),
        None => path.to_slash_lossy().to_string(),
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_display_lists_unused_then_summary() {
        let report = DeadleafReport {
            scanned_count: 4,
            used_count: 2,
            unused_files: vec!["src/old.ts".to_string(), "src/gone.vue".to_string()],
            rescued_files: vec![],
            estimated_savings_bytes: None,
        };
        assert_eq!(
            format!("{}", report),
            "src/old.ts is completely unused\n\
             src/gone.vue is completely unused\n\
             2 of 4 scanned files are unused (2 used)\n"
        );
    }

    #[test]
    fn test_display_with_bundle_evidence() {
        let report = DeadleafReport {
            scanned_count: 3,
            used_count: 2,
            unused_files: vec!["src/old.ts".to_string()],
            rescued_files: vec!["src/lazy.ts".to_string()],
            estimated_savings_bytes: Some(120),
        };
        let rendered = format!("{}", report);
        assert!(rendered.contains("src/lazy.ts is kept by bundle evidence"));
        assert!(rendered.contains("reclaim an estimated 120 bytes"));
    }
}
