use std::path::{Path, PathBuf};

use ahashmap::AHashSet;
use anyhow::{bail, Context, Result};
use jwalk::WalkDirGeneric;
use logger::Logger;
use serde::Deserialize;

use crate::graph::{Graph, UsedTag};

/// Artifact extensions inventoried in the bundle directory.
const ARTIFACT_EXTENSIONS: &[&str] = &["js", "mjs", "css"];

/// URI prefixes bundlers prepend to source map entries.
const SOURCE_URI_PREFIXES: &[&str] = &["webpack:///", "webpack://", "file://"];

/// Capability for reading a source map sidecar into its source list.
///
/// Correlation degrades with a warning when no reader is available; it
/// only hard-fails when the bundle directory itself is missing.
pub trait SourceMapReader {
    fn read_sources(&self, map_path: &Path) -> Result<SourceMapSources>;
}

/// The subset of the source map format correlation needs.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMapSources {
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub source_root: Option<String>,
}

/// Reads standard JSON source maps from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonSourceMapReader;

impl SourceMapReader for JsonSourceMapReader {
    fn read_sources(&self, map_path: &Path) -> Result<SourceMapSources> {
        let file = std::fs::File::open(map_path)
            .with_context(|| format!("failed to open source map {}", map_path.display()))?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("failed to parse source map {}", map_path.display()))
    }
}

/// Inventory of the built output.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BundleAnalysis {
    /// Artifact files found in the bundle directory, in traversal order.
    pub artifacts: Vec<BundleArtifact>,
    /// Number of source maps read successfully.
    pub source_map_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleArtifact {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Outcome of refining the used set with source map evidence.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BundleCorrelation {
    /// Project files recovered from source maps, sorted.
    pub bundle_source_files: Vec<PathBuf>,
    /// Files static analysis called unused that the bundle proves used.
    pub rescued_files: Vec<PathBuf>,
    /// Total on-disk size of the files still reported unused.
    pub estimated_savings_bytes: u64,
}

/// Inventories the bundle directory and, when a reader is available,
/// merges source map evidence into the graph. Bundle evidence only ever
/// rescues files; it never flags new ones.
pub fn correlate_bundle(
    logger: impl Logger,
    root_dir: &Path,
    bundle_dir: Option<&Path>,
    reader: Option<&dyn SourceMapReader>,
    graph: &mut Graph,
) -> Result<(BundleAnalysis, Option<BundleCorrelation>)> {
    let bundle_dir = match bundle_dir {
        Some(dir) => dir,
        None => bail!("bundle correlation was requested but no bundle directory is configured"),
    };
    if !bundle_dir.is_dir() {
        bail!("bundle directory {} does not exist", bundle_dir.display());
    }

    let (artifacts, map_paths) = inventory_bundle_dir(&logger, bundle_dir);

    let reader = match reader {
        Some(reader) => reader,
        None => {
            logger.warn("no source map reader is available; skipping bundle correlation");
            return Ok((
                BundleAnalysis {
                    artifacts,
                    source_map_count: 0,
                },
                None,
            ));
        }
    };

    let mut bundle_sources: AHashSet<PathBuf> = AHashSet::default();
    let mut source_map_count = 0usize;
    for map_path in &map_paths {
        let sources = match reader.read_sources(map_path) {
            Ok(sources) => sources,
            Err(e) => {
                logger.warn(format!("skipping malformed source map: {:#}", e));
                continue;
            }
        };
        source_map_count += 1;
        for raw in &sources.sources {
            if let Some(path) =
                resolve_map_source(root_dir, map_path, sources.source_root.as_deref(), raw)
            {
                bundle_sources.insert(path);
            }
        }
    }

    let mut rescued_files = Vec::new();
    for path in &bundle_sources {
        let was_unused = graph
            .file(path)
            .map(|file| !file.is_used())
            .unwrap_or(false);
        if graph.tag_path(path, UsedTag::BUNDLED) && was_unused {
            rescued_files.push(path.clone());
        }
    }
    rescued_files.sort();

    let estimated_savings_bytes = graph
        .unused_files()
        .iter()
        .map(|path| std::fs::metadata(path).map(|meta| meta.len()).unwrap_or(0))
        .sum();

    let mut bundle_source_files: Vec<PathBuf> = bundle_sources.into_iter().collect();
    bundle_source_files.sort();

    logger.log(format!(
        "bundle correlation recovered {} source files from {} source maps ({} rescued)",
        bundle_source_files.len(),
        source_map_count,
        rescued_files.len()
    ));

    Ok((
        BundleAnalysis {
            artifacts,
            source_map_count,
        },
        Some(BundleCorrelation {
            bundle_source_files,
            rescued_files,
            estimated_savings_bytes,
        }),
    ))
}

fn inventory_bundle_dir(logger: impl Logger, bundle_dir: &Path) -> (Vec<BundleArtifact>, Vec<PathBuf>) {
    let mut artifacts = Vec::new();
    let mut map_paths = Vec::new();

    let walk_dir = WalkDirGeneric::<((), ())>::new(bundle_dir).sort(true);
    for entry in walk_dir {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                logger.warn(format!("error walking bundle directory: {}", e));
                continue;
            }
        };
        if !entry.file_type.is_file() {
            continue;
        }
        let path = entry.path();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("map") => map_paths.push(path),
            Some(ext) if ARTIFACT_EXTENSIONS.contains(&ext) => {
                let size_bytes = std::fs::metadata(&path).map(|meta| meta.len()).unwrap_or(0);
                artifacts.push(BundleArtifact { path, size_bytes });
            }
            _ => {}
        }
    }
    (artifacts, map_paths)
}

// Source map entries come in several shapes: absolute paths, paths
// relative to the map file, paths relative to the project root, and
// bundler URIs like webpack:///./src/foo.js?1a2b.
fn resolve_map_source(
    root_dir: &Path,
    map_path: &Path,
    source_root: Option<&str>,
    raw: &str,
) -> Option<PathBuf> {
    let joined = match source_root {
        Some(prefix) if !prefix.is_empty() => {
            format!("{}/{}", prefix.trim_end_matches('/'), raw)
        }
        _ => raw.to_string(),
    };

    let mut cleaned = joined.as_str();
    for prefix in SOURCE_URI_PREFIXES {
        if let Some(stripped) = cleaned.strip_prefix(prefix) {
            cleaned = stripped;
            break;
        }
    }
    let cleaned = cleaned.split('?').next().unwrap_or(cleaned);
    if cleaned.is_empty() {
        return None;
    }

    let candidate = Path::new(cleaned);
    let mut candidates: Vec<PathBuf> = Vec::new();
    if candidate.is_absolute() {
        candidates.push(candidate.to_path_buf());
    }
    if let Some(map_dir) = map_path.parent() {
        candidates.push(map_dir.join(candidate));
    }
    candidates.push(root_dir.join(candidate));

    for candidate in candidates {
        if let Ok(canonical) = std::fs::canonicalize(&candidate) {
            if canonical.is_file() {
                return Some(canonical);
            }
        }
    }
    None
}
