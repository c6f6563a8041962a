use std::path::PathBuf;

use path_slash::PathBufExt;

/// Ordered alias table mapping specifier prefixes to directories.
///
/// Longer prefixes win over shorter ones so "@app/icons" can shadow "@app".
/// Matches are taken at path-segment boundaries: "@app" matches "@app" and
/// "@app/button" but never "@apparel/button".
#[derive(Debug, Default, Clone)]
pub struct AliasTable {
    entries: Vec<(String, PathBuf)>,
}

impl AliasTable {
    pub fn new(entries: impl IntoIterator<Item = (String, PathBuf)>) -> Self {
        let mut entries: Vec<(String, PathBuf)> = entries
            .into_iter()
            .map(|(prefix, target)| (prefix.trim_end_matches('/').to_string(), target))
            .collect();
        entries.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        AliasTable { entries }
    }

    /// Substitutes the longest matching alias prefix, returning the target
    /// directory joined with the remainder of the specifier.
    pub fn substitute(&self, specifier: &str) -> Option<PathBuf> {
        for (prefix, target) in &self.entries {
            if let Some(rest) = strip_alias_prefix(specifier, prefix) {
                if rest.is_empty() {
                    return Some(target.clone());
                }
                return Some(target.join(PathBuf::from_slash(rest)));
            }
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn strip_alias_prefix<'a>(specifier: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = specifier.strip_prefix(prefix)?;
    if rest.is_empty() {
        return Some(rest);
    }
    rest.strip_prefix('/')
}
