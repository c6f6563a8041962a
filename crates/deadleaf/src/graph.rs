use std::fmt::{self, Display};
use std::path::{Path, PathBuf};

use ahashmap::AHashMap;
use path_slash::PathExt;
use serde_json::{Map, Value};

bitflags::bitflags! {
    /// Why a file counts as used. A file with no tags is an orphan.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct UsedTag: u8 {
        /// The file is a configured or defaulted entry point.
        const ENTRY = 0x01;
        /// Some analyzed file resolved an import to this file.
        const IMPORTED = 0x02;
        /// The file was recovered from bundle source maps.
        const BUNDLED = 0x04;
    }
}

impl Display for UsedTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = Vec::new();
        if self.contains(UsedTag::ENTRY) {
            names.push("entry");
        }
        if self.contains(UsedTag::IMPORTED) {
            names.push("imported");
        }
        if self.contains(UsedTag::BUNDLED) {
            names.push("bundled");
        }
        write!(f, "{}", names.join("+"))
    }
}

/// One enumerated file and its outgoing edges.
#[derive(Debug, Clone, Default)]
pub struct GraphFile {
    pub path: PathBuf,
    pub tags: UsedTag,
    /// Canonical paths this file references, sorted. Targets may sit
    /// outside the enumerated set (an ignored asset, for example).
    pub deps: Vec<PathBuf>,
}

impl GraphFile {
    pub fn is_used(&self) -> bool {
        !self.tags.is_empty()
    }
}

/// Dependency graph over the enumerated files. Ids follow enumeration
/// order, which keeps every derived listing deterministic.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub path_to_id: AHashMap<PathBuf, usize>,
    pub files: Vec<GraphFile>,
}

impl Graph {
    pub fn from_enumerated_files(all_files: &[PathBuf]) -> Self {
        let mut path_to_id: AHashMap<PathBuf, usize> =
            AHashMap::with_capacity_and_hasher(all_files.len(), Default::default());
        let files = all_files
            .iter()
            .enumerate()
            .map(|(id, path)| {
                path_to_id.insert(path.clone(), id);
                GraphFile {
                    path: path.clone(),
                    tags: UsedTag::default(),
                    deps: Vec::new(),
                }
            })
            .collect();
        Graph { path_to_id, files }
    }

    /// Records `from`'s resolved dependency list and tags every target as
    /// imported. Tag unions commute, so the outcome does not depend on
    /// the order files are folded in.
    pub fn add_file_edges(&mut self, from: &Path, deps: Vec<PathBuf>) {
        for target in &deps {
            self.tag_path(target, UsedTag::IMPORTED);
        }
        if let Some(id) = self.path_to_id.get(from) {
            self.files[*id].deps = deps;
        }
    }

    /// Tags a file when it is part of the enumerated set. Returns false
    /// for paths outside it.
    pub fn tag_path(&mut self, path: &Path, tag: UsedTag) -> bool {
        match self.path_to_id.get(path) {
            Some(id) => {
                self.files[*id].tags |= tag;
                true
            }
            None => false,
        }
    }

    pub fn file(&self, path: &Path) -> Option<&GraphFile> {
        self.path_to_id.get(path).map(|id| &self.files[*id])
    }

    /// Files with at least one tag, in enumeration order.
    pub fn used_files(&self) -> Vec<PathBuf> {
        self.files
            .iter()
            .filter(|file| file.is_used())
            .map(|file| file.path.clone())
            .collect()
    }

    /// Files with no tags, in enumeration order.
    pub fn unused_files(&self) -> Vec<PathBuf> {
        self.files
            .iter()
            .filter(|file| !file.is_used())
            .map(|file| file.path.clone())
            .collect()
    }

    /// Root-relative adjacency map, for serialization.
    pub fn to_relative_map(&self, root_dir: &Path) -> Value {
        let mut map = Map::new();
        for file in &self.files {
            let deps = file
                .deps
                .iter()
                .map(|dep| Value::String(relative_slash(root_dir, dep)))
                .collect();
            map.insert(relative_slash(root_dir, &file.path), Value::Array(deps));
        }
        Value::Object(map)
    }
}

fn relative_slash(root_dir: &Path, path: &Path) -> String {
    match pathdiff::diff_paths(path, root_dir) {
        Some(relative) => relative.to_slash_lossy().to_string(),
        None => path.to_slash_lossy().to_string(),
    }
}
