use std::path::PathBuf;

use path_slash::PathExt;
use pretty_assertions::assert_eq;
use test_tmpdir::{test_tmpdir, TmpDir};

use crate::{
    cfg::DeadleafConfig,
    deadleaf::{find_unused_files, find_unused_files_with_reader, AnalysisResult},
    report::DeadleafReport,
};

fn config_for(tmpdir: &TmpDir, entry: &[&str]) -> DeadleafConfig {
    DeadleafConfig {
        root_dir: tmpdir.root().to_path_buf(),
        entry: entry.iter().map(|e| e.to_string()).collect(),
        ..Default::default()
    }
}

fn run(config: &DeadleafConfig) -> AnalysisResult {
    let logger = logger::StdioLogger::new(false);
    find_unused_files(&logger, config).unwrap()
}

fn rel(tmpdir: &TmpDir, paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|path| {
            pathdiff::diff_paths(path, tmpdir.root())
                .unwrap_or_else(|| path.clone())
                .to_slash_lossy()
                .to_string()
        })
        .collect()
}

#[test]
fn test_used_and_unused_partition_all_files() {
    let tmpdir = test_tmpdir!(
        "src/main.ts" => r#"import { helper } from "./helper";"#,
        "src/helper.ts" => "export const helper = 1;",
        "src/orphan.ts" => "export const nobody = 2;"
    );
    let result = run(&config_for(&tmpdir, &["src/main.ts"]));

    let mut partitioned = result.used_files.clone();
    partitioned.extend(result.unused_files.iter().cloned());
    partitioned.sort();
    let mut all = result.all_files.clone();
    all.sort();
    assert_eq!(partitioned, all);
    for path in &result.used_files {
        assert!(!result.unused_files.contains(path));
    }
    assert_eq!(rel(&tmpdir, &result.unused_files), vec!["src/orphan.ts"]);
}

#[test]
fn test_entry_point_is_used_without_inbound_edges() {
    let tmpdir = test_tmpdir!(
        "src/bootstrap.ts" => "export const start = () => {};"
    );
    let result = run(&config_for(&tmpdir, &["src/bootstrap.ts"]));
    assert_eq!(rel(&tmpdir, &result.used_files), vec!["src/bootstrap.ts"]);
    assert_eq!(result.unused_files, Vec::<PathBuf>::new());
}

#[test]
fn test_default_entry_candidates_are_probed() {
    let tmpdir = test_tmpdir!(
        "src/main.ts" => r#"import "./used";"#,
        "src/used.ts" => "export {};"
    );
    let result = run(&config_for(&tmpdir, &[]));
    assert!(result
        .used_files
        .contains(&tmpdir.root_join("src/main.ts")));
}

#[test]
fn test_alias_specifier_resolves_through_the_table() {
    let tmpdir = test_tmpdir!(
        "src/main.ts" => r#"
            import Foo from "@/components/Foo.vue";
            import Gone from "@/components/Gone.vue";
            export default Foo;
        "#,
        "src/components/Foo.vue" => "<template><div /></template>"
    );
    let mut config = config_for(&tmpdir, &["src/main.ts"]);
    config.alias = vec![("@".to_string(), PathBuf::from("src"))];
    let result = run(&config);

    assert!(result
        .used_files
        .contains(&tmpdir.root_join("src/components/Foo.vue")));
    let main = result.graph.file(&tmpdir.root_join("src/main.ts")).unwrap();
    // The unresolvable import drops out without an edge or an error.
    assert_eq!(
        main.deps,
        vec![tmpdir.root_join("src/components/Foo.vue")]
    );
}

#[test]
fn test_markup_only_component_usage_keeps_the_file() {
    let tmpdir = test_tmpdir!(
        "src/main.ts" => r#"import App from "./App.vue";"#,
        "src/App.vue" => r#"
<template>
  <FooBar />
</template>
<script>
import FooBar from "./foo-bar.vue";
export default {};
</script>
"#,
        "src/foo-bar.vue" => "<template><div /></template>"
    );
    let result = run(&config_for(&tmpdir, &["src/main.ts"]));

    assert!(result
        .used_files
        .contains(&tmpdir.root_join("src/foo-bar.vue")));
    let app = result.graph.file(&tmpdir.root_join("src/App.vue")).unwrap();
    assert!(app.deps.contains(&tmpdir.root_join("src/foo-bar.vue")));
}

#[test]
fn test_kebab_case_tag_matches_pascal_import() {
    let tmpdir = test_tmpdir!(
        "src/main.ts" => r#"import App from "./App.vue";"#,
        "src/App.vue" => r#"
<template>
  <foo-bar />
</template>
<script>
import FooBar from "./foo-bar.vue";
export default {};
</script>
"#,
        "src/foo-bar.vue" => "<template><div /></template>"
    );
    let result = run(&config_for(&tmpdir, &["src/main.ts"]));
    assert!(result
        .used_files
        .contains(&tmpdir.root_join("src/foo-bar.vue")));
}

#[test]
fn test_non_literal_dynamic_import_contributes_nothing() {
    let tmpdir = test_tmpdir!(
        "src/main.ts" => r#"
            const name = "x";
            const load = () => import("./lazy-" + name);
            export default load;
        "#,
        "src/lazy-x.ts" => "export {};"
    );
    let result = run(&config_for(&tmpdir, &["src/main.ts"]));

    let main = result.graph.file(&tmpdir.root_join("src/main.ts")).unwrap();
    assert_eq!(main.deps, Vec::<PathBuf>::new());
    assert_eq!(rel(&tmpdir, &result.unused_files), vec!["src/lazy-x.ts"]);
}

#[test]
fn test_literal_dynamic_import_and_require_add_edges() {
    let tmpdir = test_tmpdir!(
        "src/main.js" => r#"
            const a = require("./a");
            const lazy = () => import("./b");
            module.exports = { a, lazy };
        "#,
        "src/a.js" => "module.exports = 1;",
        "src/b.js" => "export {};"
    );
    let result = run(&config_for(&tmpdir, &["src/main.js"]));
    assert_eq!(result.unused_files, Vec::<PathBuf>::new());
    let main = result.graph.file(&tmpdir.root_join("src/main.js")).unwrap();
    assert_eq!(
        main.deps,
        vec![tmpdir.root_join("src/a.js"), tmpdir.root_join("src/b.js")]
    );
}

#[test]
fn test_bare_package_imports_are_excluded_from_the_graph() {
    let tmpdir = test_tmpdir!(
        "src/main.ts" => r#"
            import lodash from "lodash";
            import { api } from "@scope/sdk";
            import { local } from "./local";
            export default { lodash, api, local };
        "#,
        "src/local.ts" => "export const local = 1;"
    );
    let result = run(&config_for(&tmpdir, &["src/main.ts"]));
    let main = result.graph.file(&tmpdir.root_join("src/main.ts")).unwrap();
    assert_eq!(main.deps, vec![tmpdir.root_join("src/local.ts")]);
}

#[test]
fn test_unparseable_file_does_not_abort_the_run() {
    let tmpdir = test_tmpdir!(
        "src/main.ts" => r#"import { ok } from "./ok";"#,
        "src/ok.ts" => "export const ok = 1;",
        "src/broken.ts" => "import { from 'nowhere"
    );
    let result = run(&config_for(&tmpdir, &["src/main.ts"]));
    assert_eq!(rel(&tmpdir, &result.unused_files), vec!["src/broken.ts"]);
    // The broken file still gets its graph entry, with no edges.
    let broken = result
        .graph
        .file(&tmpdir.root_join("src/broken.ts"))
        .unwrap();
    assert_eq!(broken.deps, Vec::<PathBuf>::new());
}

#[test]
fn test_analysis_is_idempotent() {
    let tmpdir = test_tmpdir!(
        "src/main.ts" => r#"import "./a"; import "./b";"#,
        "src/a.ts" => r#"import "./b";"#,
        "src/b.ts" => "export {};",
        "src/orphan.ts" => "export {};"
    );
    let config = config_for(&tmpdir, &["src/main.ts"]);
    let first = run(&config);
    let second = run(&config);

    assert_eq!(first.unused_files, second.unused_files);
    assert_eq!(
        first.graph.to_relative_map(&first.root_dir),
        second.graph.to_relative_map(&second.root_dir)
    );
}

#[test]
fn test_gitignore_rules_shape_the_scan() {
    let tmpdir = test_tmpdir!(
        ".gitignore" => "legacy/*.ts\n!legacy/keep.ts\n",
        "legacy/old.ts" => "export {};",
        "legacy/keep.ts" => "export {};",
        "src/main.ts" => "export {};"
    );
    let result = run(&config_for(&tmpdir, &["src/main.ts"]));
    let mut all = rel(&tmpdir, &result.all_files);
    all.sort();
    assert_eq!(all, vec!["legacy/keep.ts", "src/main.ts"]);
}

#[test]
fn test_missing_root_dir_yields_empty_result() {
    let tmpdir = test_tmpdir!("placeholder.txt" => "");
    let config = DeadleafConfig {
        root_dir: tmpdir.root_join("no-such-project"),
        ..Default::default()
    };
    let result = run(&config);
    assert_eq!(result.all_files, Vec::<PathBuf>::new());
    assert_eq!(result.unused_files, Vec::<PathBuf>::new());
}

#[test]
fn test_bundle_evidence_rescues_statically_orphaned_files() {
    let tmpdir = test_tmpdir!(
        "src/main.ts" => "export {};",
        "src/lazy.ts" => "export {};",
        "src/dead.ts" => "export const dead = 1;",
        "dist/app.js" => "console.log(1);",
        "dist/app.js.map" => r#"{"version":3,"sources":["../src/lazy.ts"],"mappings":""}"#
    );
    let mut static_config = config_for(&tmpdir, &["src/main.ts"]);
    static_config.ignore = std::sync::Arc::new(vec![glob::Pattern::new("dist/**").unwrap()]);
    let static_result = run(&static_config);
    let mut static_unused = rel(&tmpdir, &static_result.unused_files);
    static_unused.sort();
    assert_eq!(static_unused, vec!["src/dead.ts", "src/lazy.ts"]);

    let mut bundle_config = static_config.clone();
    bundle_config.bundle = true;
    bundle_config.bundle_dir = Some(tmpdir.root_join("dist"));
    let bundle_result = run(&bundle_config);

    assert_eq!(rel(&tmpdir, &bundle_result.unused_files), vec!["src/dead.ts"]);
    // Correlation only ever rescues; everything it leaves unused was
    // already unused statically.
    for path in &bundle_result.unused_files {
        assert!(static_result.unused_files.contains(path));
    }
    let correlation = bundle_result.bundle_correlation.unwrap();
    assert_eq!(
        rel(&tmpdir, &correlation.rescued_files),
        vec!["src/lazy.ts"]
    );
    assert_eq!(
        correlation.estimated_savings_bytes,
        "export const dead = 1;".len() as u64
    );
}

#[test]
fn test_malformed_source_map_is_skipped_with_warning() {
    let tmpdir = test_tmpdir!(
        "src/main.ts" => "export {};",
        "src/lazy.ts" => "export {};",
        "dist/vendor.js" => "console.log(1);",
        "dist/vendor.js.map" => "not json at all",
        "dist/app.js" => "console.log(2);",
        "dist/app.js.map" => r#"{"version":3,"sources":["../src/lazy.ts"],"mappings":""}"#
    );
    let mut config = config_for(&tmpdir, &["src/main.ts"]);
    config.ignore = std::sync::Arc::new(vec![glob::Pattern::new("dist/**").unwrap()]);
    config.bundle = true;
    config.bundle_dir = Some(tmpdir.root_join("dist"));

    let logger = logger::MemoryLogger::new();
    let result = find_unused_files(&logger, &config).unwrap();

    assert!(logger.has_line_containing("skipping malformed source map"));
    // The bad map drops out; the good one still rescues its sources.
    let correlation = result.bundle_correlation.unwrap();
    assert_eq!(
        rel(&tmpdir, &correlation.rescued_files),
        vec!["src/lazy.ts"]
    );
    assert_eq!(result.bundle_analysis.unwrap().source_map_count, 1);
    assert_eq!(result.unused_files, Vec::<PathBuf>::new());
}

#[test]
fn test_missing_bundle_dir_fails_the_run() {
    let tmpdir = test_tmpdir!("src/main.ts" => "export {};");
    let mut config = config_for(&tmpdir, &["src/main.ts"]);
    config.bundle = true;
    config.bundle_dir = Some(tmpdir.root_join("no-such-dist"));
    let logger = logger::StdioLogger::new(false);
    let result = find_unused_files(&logger, &config);
    assert!(result.unwrap_err().to_string().contains("does not exist"));
}

#[test]
fn test_missing_sourcemap_reader_degrades_with_warning() {
    let tmpdir = test_tmpdir!(
        "src/main.ts" => "export {};",
        "src/lazy.ts" => "export {};",
        "dist/app.js" => "console.log(1);",
        "dist/app.js.map" => r#"{"version":3,"sources":["../src/lazy.ts"],"mappings":""}"#
    );
    let mut config = config_for(&tmpdir, &["src/main.ts"]);
    config.ignore = std::sync::Arc::new(vec![glob::Pattern::new("dist/**").unwrap()]);
    config.bundle = true;
    config.bundle_dir = Some(tmpdir.root_join("dist"));

    let logger = logger::MemoryLogger::new();
    let result = find_unused_files_with_reader(&logger, &config, None).unwrap();

    let analysis = result.bundle_analysis.unwrap();
    assert_eq!(analysis.artifacts.len(), 1);
    assert_eq!(result.bundle_correlation, None);
    assert_eq!(rel(&tmpdir, &result.unused_files), vec!["src/lazy.ts"]);
    assert!(logger.has_line_containing("no source map reader is available"));
}

#[test]
fn test_report_projects_relative_paths() {
    let tmpdir = test_tmpdir!(
        "src/main.ts" => "export {};",
        "src/old/widget.ts" => "export {};"
    );
    let result = run(&config_for(&tmpdir, &["src/main.ts"]));
    let report = DeadleafReport::from(&result);
    assert_eq!(report.scanned_count, 2);
    assert_eq!(report.used_count, 1);
    assert_eq!(report.unused_files, vec!["src/old/widget.ts"]);
    assert_eq!(report.estimated_savings_bytes, None);
}
