use std::path::{Path, PathBuf};

use dashmap::DashMap;

/// Memoized file-existence probes, shared by every resolution in one run.
///
/// Values hold the canonical path for probes that hit a regular file, or
/// `None` for probes that missed. The probe is idempotent, so concurrent
/// duplicate insertions agree with each other.
#[derive(Debug, Default)]
pub struct ExistenceCache {
    probed: DashMap<PathBuf, Option<PathBuf>>,
}

impl ExistenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the canonical form of `path` if it refers to an existing
    /// regular file.
    pub fn canonical_file(&self, path: &Path) -> Option<PathBuf> {
        if let Some(hit) = self.probed.get(path) {
            return hit.clone();
        }
        let canonical = probe(path);
        self.probed.insert(path.to_path_buf(), canonical.clone());
        canonical
    }

    #[cfg(test)]
    pub fn probe_count(&self) -> usize {
        self.probed.len()
    }
}

fn probe(path: &Path) -> Option<PathBuf> {
    let meta = std::fs::metadata(path).ok()?;
    if !meta.is_file() {
        return None;
    }
    std::fs::canonicalize(path).ok()
}
