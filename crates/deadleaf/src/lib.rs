//! Finds project files never reached from the configured entry points.
//!
//! The analysis enumerates candidate files, extracts import specifiers
//! from each one (crediting component usages that only appear in markup),
//! resolves them to concrete files, and reports the files left with no
//! references. Results can optionally be cross-checked against a built
//! bundle's source maps.

mod bundle;
mod cfg;
mod deadleaf;
mod graph;
mod ignore;
mod markup;
mod parse;
mod report;
#[cfg(test)]
mod test;
mod walk;

pub use bundle::{
    BundleAnalysis, BundleArtifact, BundleCorrelation, JsonSourceMapReader, SourceMapReader,
};
pub use cfg::{DeadleafConfig, DeadleafJSONConfig};
pub use deadleaf::{find_unused_files, find_unused_files_with_reader, AnalysisResult};
pub use graph::{Graph, GraphFile, UsedTag};
pub use parse::{parse_module_imports, ModuleImports, ParseError};
pub use report::DeadleafReport;
