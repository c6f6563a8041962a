use std::path::{Path, PathBuf};

use ahashmap::AHashSet;
use anyhow::{Context, Result};
use logger::Logger;
use module_resolver::{AliasTable, ResolvedSpecifier, SpecifierResolver};
use rayon::prelude::*;
use vue_sfc::{splitter_for_project, SfcSplitter};

use crate::{
    bundle,
    bundle::{BundleAnalysis, BundleCorrelation, SourceMapReader},
    cfg::DeadleafConfig,
    graph::{Graph, UsedTag},
    ignore::IgnoreRules,
    markup::markup_credited_specifiers,
    parse::parse_module_imports,
    walk::walk_project_files,
};

/// Entry point paths probed when the config lists none.
const DEFAULT_ENTRY_CANDIDATES: &[&str] = &["src/main", "src/index", "main", "index"];

/// Files with these extensions go through the ecma parser whole.
const SCRIPT_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx", "mjs", "cjs"];

/// Component files with this extension are split into markup and script
/// regions first.
const MARKUP_EXTENSION: &str = "vue";

/// Outcome of one full analysis run.
#[derive(Debug, Default)]
pub struct AnalysisResult {
    pub root_dir: PathBuf,
    /// Every file the scan enumerated, in traversal order.
    pub all_files: Vec<PathBuf>,
    /// Enumerated files reached by an entry point, an import, or bundle
    /// evidence.
    pub used_files: Vec<PathBuf>,
    /// Enumerated files nothing references. Disjoint from `used_files`;
    /// together they partition `all_files`.
    pub unused_files: Vec<PathBuf>,
    pub graph: Graph,
    /// Inventory of the bundle directory, when correlation was requested.
    pub bundle_analysis: Option<BundleAnalysis>,
    /// Outcome of source-map correlation, when it could run.
    pub bundle_correlation: Option<BundleCorrelation>,
}

/// Runs the full analysis with the standard source-map reader.
pub fn find_unused_files(
    logger: impl Logger + Sync,
    config: &DeadleafConfig,
) -> Result<AnalysisResult> {
    find_unused_files_with_reader(logger, config, Some(&bundle::JsonSourceMapReader))
}

/// Runs the full analysis with an explicit source-map capability. Passing
/// `None` degrades bundle correlation instead of failing the run.
pub fn find_unused_files_with_reader(
    logger: impl Logger + Sync,
    config: &DeadleafConfig,
    sourcemap_reader: Option<&dyn SourceMapReader>,
) -> Result<AnalysisResult> {
    let root_dir =
        std::fs::canonicalize(&config.root_dir).unwrap_or_else(|_| config.root_dir.clone());

    let ignore_rules = IgnoreRules::load(&logger, &root_dir, config.ignore.clone());

    logger.log(format!("Scanning {}", root_dir.display()));
    let all_files = walk_project_files(&logger, &root_dir, config, &ignore_rules);
    logger.log(format!("Found {} candidate files", all_files.len()));

    let resolver = SpecifierResolver::new(
        root_dir.clone(),
        AliasTable::new(config.alias.iter().cloned()),
        config.extensions.clone(),
    );
    let splitter = splitter_for_project(&root_dir);

    let analyses = analyze_all(&logger, config, &all_files, &resolver, splitter.as_ref())?;

    let mut graph = Graph::from_enumerated_files(&all_files);
    for analysis in analyses {
        graph.add_file_edges(&analysis.path, analysis.deps);
    }

    seed_entry_points(&logger, config, &resolver, &mut graph);

    let (bundle_analysis, bundle_correlation) = if config.bundle {
        let (analysis, correlation) = bundle::correlate_bundle(
            &logger,
            &root_dir,
            config.bundle_dir.as_deref(),
            sourcemap_reader,
            &mut graph,
        )?;
        (Some(analysis), correlation)
    } else {
        (None, None)
    };

    let used_files = graph.used_files();
    let unused_files = graph.unused_files();
    logger.log(format!(
        "{} of {} files are never referenced",
        unused_files.len(),
        all_files.len()
    ));

    Ok(AnalysisResult {
        root_dir,
        all_files,
        used_files,
        unused_files,
        graph,
        bundle_analysis,
        bundle_correlation,
    })
}

struct FileAnalysis {
    path: PathBuf,
    deps: Vec<PathBuf>,
}

fn analyze_all(
    logger: impl Logger + Sync,
    config: &DeadleafConfig,
    all_files: &[PathBuf],
    resolver: &SpecifierResolver,
    splitter: &dyn SfcSplitter,
) -> Result<Vec<FileAnalysis>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.concurrency)
        .build()
        .context("failed to build the analysis thread pool")?;

    Ok(pool.install(|| {
        all_files
            .par_iter()
            .map(|path| analyze_file(&logger, path, resolver, splitter))
            .collect()
    }))
}

// Unreadable and unparseable files contribute an empty dependency list
// instead of failing the run.
fn analyze_file(
    logger: impl Logger,
    path: &Path,
    resolver: &SpecifierResolver,
    splitter: &dyn SfcSplitter,
) -> FileAnalysis {
    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            logger.warn(format!("failed to read {}: {}", path.display(), e));
            return FileAnalysis {
                path: path.to_path_buf(),
                deps: Vec::new(),
            };
        }
    };

    let specifiers = extract_specifiers(&logger, path, &source, splitter);

    let mut deps = Vec::new();
    for specifier in specifiers {
        match resolver.resolve(path, &specifier) {
            ResolvedSpecifier::File(target) => deps.push(target),
            ResolvedSpecifier::External(package) => {
                logger.debug(format!("{}: external package {}", path.display(), package));
            }
            ResolvedSpecifier::NotFound => {
                logger.debug(format!(
                    "{}: could not resolve {:?}",
                    path.display(),
                    specifier
                ));
            }
        }
    }
    deps.sort();
    deps.dedup();

    FileAnalysis {
        path: path.to_path_buf(),
        deps,
    }
}

fn extract_specifiers(
    logger: impl Logger,
    path: &Path,
    source: &str,
    splitter: &dyn SfcSplitter,
) -> AHashSet<String> {
    let file_name = path.to_string_lossy();

    if is_markup_file(path) {
        let parts = match splitter.split(source) {
            Ok(parts) => parts,
            Err(e) => {
                logger.warn(format!("failed to split component {}: {}", path.display(), e));
                return AHashSet::default();
            }
        };

        let imports = match parse_module_imports(&file_name, &parts.script) {
            Ok(imports) => imports,
            Err(e) => {
                logger.warn(format!("{}", e));
                return AHashSet::default();
            }
        };

        let mut specifiers = imports.specifiers;
        if let Some(markup) = &parts.markup {
            for credited in markup_credited_specifiers(markup, &imports.default_bindings) {
                specifiers.insert(credited);
            }
        }
        return specifiers;
    }

    if is_script_file(path) {
        return match parse_module_imports(&file_name, source) {
            Ok(imports) => imports.specifiers,
            Err(e) => {
                logger.warn(format!("{}", e));
                AHashSet::default()
            }
        };
    }

    // Data files (json, assets under an "ALL" extension filter) can be
    // imported but import nothing themselves.
    AHashSet::default()
}

fn is_markup_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some(ext) if ext == MARKUP_EXTENSION
    )
}

fn is_script_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some(ext) if SCRIPT_EXTENSIONS.contains(&ext)
    )
}

fn seed_entry_points(
    logger: impl Logger,
    config: &DeadleafConfig,
    resolver: &SpecifierResolver,
    graph: &mut Graph,
) {
    let configured = !config.entry.is_empty();
    let candidates: Vec<String> = if configured {
        config.entry.clone()
    } else {
        DEFAULT_ENTRY_CANDIDATES
            .iter()
            .map(|candidate| candidate.to_string())
            .collect()
    };

    let mut seeded = 0usize;
    for entry in &candidates {
        match resolver.resolve_entry(entry) {
            Some(path) => {
                if graph.tag_path(&path, UsedTag::ENTRY) {
                    seeded += 1;
                } else {
                    logger.warn(format!(
                        "entry point {} resolves to {}, which is outside the scanned files",
                        entry,
                        path.display()
                    ));
                }
            }
            None => {
                if configured {
                    logger.warn(format!("could not resolve entry point {:?}", entry));
                }
            }
        }
    }

    if seeded == 0 {
        logger.warn("no entry points resolved; only imported files will count as used");
    }
}
