use std::path::Path;

/// Extensions probed when a project does not configure its own list.
pub const DEFAULT_EXTENSIONS: &[&str] = &["js", "ts", "jsx", "tsx", "vue", "json"];

/// Which file extensions the scan considers source files, and which
/// suffixes resolution probes for extensionless specifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionFilter {
    /// Admit every file; resolution probes the default extension list.
    All,
    /// Admit only the listed extensions (stored without leading dots).
    List(Vec<String>),
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        ExtensionFilter::from_list(DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()))
    }
}

impl ExtensionFilter {
    pub fn from_list(extensions: impl IntoIterator<Item = String>) -> Self {
        ExtensionFilter::List(
            extensions
                .into_iter()
                .map(|ext| ext.trim_start_matches('.').to_string())
                .collect(),
        )
    }

    /// Whether a path's extension passes the filter.
    pub fn admits(&self, path: &Path) -> bool {
        match self {
            ExtensionFilter::All => true,
            ExtensionFilter::List(list) => match path.extension().and_then(|ext| ext.to_str()) {
                Some(ext) => list.iter().any(|allowed| allowed == ext),
                None => false,
            },
        }
    }

    /// The suffixes resolution appends when a specifier has no extension.
    pub fn probe_extensions(&self) -> Vec<String> {
        match self {
            ExtensionFilter::All => DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            ExtensionFilter::List(list) => list.clone(),
        }
    }
}
