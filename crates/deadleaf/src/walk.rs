use std::path::{Path, PathBuf};

use jwalk::WalkDirGeneric;
use logger::Logger;

use crate::{cfg::DeadleafConfig, ignore, ignore::IgnoreRules};

/// Directories that are never descended into regardless of configuration.
const ALWAYS_PRUNED_DIRS: &[&str] = &["node_modules", ".git"];

/// Walks the project tree and returns the candidate source files in
/// deterministic traversal order.
pub fn walk_project_files(
    logger: impl Logger,
    root_dir: &Path,
    config: &DeadleafConfig,
    ignore_rules: &IgnoreRules,
) -> Vec<PathBuf> {
    if !root_dir.is_dir() {
        logger.warn(format!(
            "project root {} is not a directory; nothing to scan",
            root_dir.display()
        ));
        return Vec::new();
    }

    let prune_root = root_dir.to_path_buf();
    let prune_globs = config.ignore.clone();
    let walk_dir = WalkDirGeneric::<((), ())>::new(root_dir)
        .sort(true)
        .process_read_dir(move |_dir_state, children| {
            prune_children(&prune_root, &prune_globs, children);
        });

    let mut files = Vec::new();
    for entry in walk_dir {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                logger.warn(format!("error during project walk: {}", e));
                continue;
            }
        };
        if !entry.file_type.is_file() {
            continue;
        }
        let path = entry.path();
        if !config.extensions.admits(&path) {
            continue;
        }
        if ignore_rules.is_ignored(&path) {
            logger.debug(format!("ignoring {}", path.display()));
            continue;
        }
        files.push(path);
    }
    files
}

// Pruning cuts whole directories out of the walk. Only the unconditional
// names and the config globs prune; ignore-file patterns are evaluated per
// file because a later negation may re-include something beneath an
// ignored directory.
fn prune_children(
    root_dir: &Path,
    prune_globs: &[glob::Pattern],
    children: &mut Vec<Result<jwalk::DirEntry<((), ())>, jwalk::Error>>,
) {
    for child in children.iter_mut() {
        if let Ok(dir_entry) = child {
            if !dir_entry.file_type.is_dir() {
                continue;
            }
            if ALWAYS_PRUNED_DIRS
                .iter()
                .any(|skip| dir_entry.file_name == *skip)
            {
                dir_entry.read_children_path = None;
                continue;
            }
            if ignore::matches_globs(root_dir, prune_globs, &dir_entry.path()) {
                dir_entry.read_children_path = None;
            }
        }
    }
}
