use std::path::{Path, PathBuf};

use path_clean::PathClean;
use path_slash::PathBufExt;

use crate::{AliasTable, ExistenceCache, ExtensionFilter};

/// Outcome of resolving one raw import specifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedSpecifier {
    /// The specifier names a file inside the project tree.
    File(PathBuf),
    /// The specifier names a package and is never probed on disk.
    External(String),
    /// The specifier looked project-local but nothing on disk matched it.
    NotFound,
}

/// Run-scoped resolution state: the alias table, the extension policy and
/// a shared existence cache.
pub struct SpecifierResolver {
    root_dir: PathBuf,
    aliases: AliasTable,
    extensions: ExtensionFilter,
    probe_extensions: Vec<String>,
    cache: ExistenceCache,
}

impl SpecifierResolver {
    pub fn new(root_dir: PathBuf, aliases: AliasTable, extensions: ExtensionFilter) -> Self {
        let probe_extensions = extensions.probe_extensions();
        Self {
            root_dir,
            aliases,
            extensions,
            probe_extensions,
            cache: ExistenceCache::new(),
        }
    }

    /// Resolves `specifier` as written in `containing_file`.
    ///
    /// Alias prefixes substitute first and are rooted at the project root.
    /// A specifier with no leading `.` or `/` and no alias match is a
    /// package reference and never causes a filesystem probe.
    pub fn resolve(&self, containing_file: &Path, specifier: &str) -> ResolvedSpecifier {
        let candidate = match self.aliases.substitute(specifier) {
            Some(aliased) => self.root_dir.join(aliased),
            None => {
                if is_bare_package(specifier) {
                    return ResolvedSpecifier::External(specifier.to_string());
                }
                let base = containing_file.parent().unwrap_or(&self.root_dir);
                base.join(PathBuf::from_slash(specifier))
            }
        };
        self.probe_chain(candidate.clean())
    }

    /// Resolves a configured entry point. Entries may use alias form or a
    /// path relative to the project root; the package exclusion does not
    /// apply to them.
    pub fn resolve_entry(&self, entry: &str) -> Option<PathBuf> {
        let candidate = match self.aliases.substitute(entry) {
            Some(aliased) => self.root_dir.join(aliased),
            None => self.root_dir.join(PathBuf::from_slash(entry)),
        };
        match self.probe_chain(candidate.clean()) {
            ResolvedSpecifier::File(path) => Some(path),
            _ => None,
        }
    }

    // Probe order: the path as written (when its extension is admitted),
    // then each extension appended, then index files, then the path as
    // written regardless of extension.
    fn probe_chain(&self, candidate: PathBuf) -> ResolvedSpecifier {
        if self.extensions.admits(&candidate) {
            if let Some(found) = self.cache.canonical_file(&candidate) {
                return ResolvedSpecifier::File(found);
            }
        }

        for ext in &self.probe_extensions {
            let with_ext = append_extension(&candidate, ext);
            if let Some(found) = self.cache.canonical_file(&with_ext) {
                return ResolvedSpecifier::File(found);
            }
        }

        for ext in &self.probe_extensions {
            let index = candidate.join(format!("index.{}", ext));
            if let Some(found) = self.cache.canonical_file(&index) {
                return ResolvedSpecifier::File(found);
            }
        }

        if let Some(found) = self.cache.canonical_file(&candidate) {
            return ResolvedSpecifier::File(found);
        }

        ResolvedSpecifier::NotFound
    }

    #[cfg(test)]
    pub(crate) fn probe_count(&self) -> usize {
        self.cache.probe_count()
    }
}

// "lodash" and "@scope/pkg" are package references; "./x", "../x" and "/x"
// are project-local paths.
fn is_bare_package(specifier: &str) -> bool {
    !specifier.starts_with('.') && !specifier.starts_with('/')
}

// Appends rather than replaces, so "./data.config" probes as
// "data.config.ts" and not "data.ts".
fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".");
    os.push(ext);
    PathBuf::from(os)
}
