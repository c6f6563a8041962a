use std::{collections::HashMap, path::PathBuf, sync::Arc};

use anyhow::bail;
use module_resolver::ExtensionFilter;
use serde::Deserialize;

/// A JSON-serializable proxy for the analysis configuration.
///
/// This is the shape read from the config file on disk. It is converted
/// into a [`DeadleafConfig`] before a run starts, which is where pattern
/// compilation and validation happen.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadleafJSONConfig {
    /// Root directory of the project tree to scan.
    pub root_dir: String,
    /// Map of specifier prefix to the directory it expands to, relative
    /// to `rootDir`.
    #[serde(default)]
    pub alias: HashMap<String, String>,
    /// Either a list of extensions or the string "ALL".
    #[serde(default)]
    pub extensions: ExtensionsField,
    /// Glob patterns excluded from the scan, on top of the project's
    /// .gitignore.
    #[serde(default)]
    pub ignore: Vec<String>,
    /// Entry point files, as paths relative to `rootDir` or alias forms.
    #[serde(default, alias = "entryPoints")]
    pub entry: Vec<String>,
    /// When true, correlate results against built output in `bundleDir`.
    #[serde(default)]
    pub bundle: bool,
    #[serde(default)]
    pub bundle_dir: Option<String>,
    /// Maximum number of files analyzed concurrently. Zero picks the
    /// default pool size.
    #[serde(default)]
    pub concurrency: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ExtensionsField {
    Sentinel(String),
    List(Vec<String>),
}

impl Default for ExtensionsField {
    fn default() -> Self {
        ExtensionsField::List(Vec::new())
    }
}

/// Validated runtime configuration for one analysis run.
#[derive(Debug, Clone, Default)]
pub struct DeadleafConfig {
    pub root_dir: PathBuf,
    pub alias: Vec<(String, PathBuf)>,
    pub extensions: ExtensionFilter,
    pub ignore: Arc<Vec<glob::Pattern>>,
    pub entry: Vec<String>,
    pub bundle: bool,
    pub bundle_dir: Option<PathBuf>,
    pub concurrency: usize,
}

impl TryFrom<DeadleafJSONConfig> for DeadleafConfig {
    type Error = anyhow::Error;

    fn try_from(value: DeadleafJSONConfig) -> Result<Self, Self::Error> {
        let ignore = value
            .ignore
            .iter()
            .map(|pattern| glob::Pattern::new(pattern))
            .collect::<Result<Vec<glob::Pattern>, _>>()?;

        let extensions = match value.extensions {
            ExtensionsField::Sentinel(sentinel) => {
                if sentinel == "ALL" {
                    ExtensionFilter::All
                } else {
                    bail!(
                        "extensions must be a list of extensions or the string \"ALL\", got {:?}",
                        sentinel
                    );
                }
            }
            // An absent or empty list means the default extension set.
            ExtensionsField::List(list) if list.is_empty() => ExtensionFilter::default(),
            ExtensionsField::List(list) => ExtensionFilter::from_list(list),
        };

        let alias = value
            .alias
            .into_iter()
            .map(|(prefix, target)| (prefix, PathBuf::from(target)))
            .collect();

        Ok(DeadleafConfig {
            root_dir: PathBuf::from(value.root_dir),
            alias,
            extensions,
            ignore: Arc::new(ignore),
            entry: value.entry,
            bundle: value.bundle,
            bundle_dir: value.bundle_dir.map(PathBuf::from),
            concurrency: value.concurrency,
        })
    }
}
