use std::{
    fs::File,
    io::{BufRead, BufReader, Read},
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use globset::Glob;
use logger::Logger;
use path_slash::PathExt;
use pathdiff::diff_paths;

/// One parsed ignore file: ordered glob patterns with negation, matched
/// against paths relative to the directory containing the file.
#[derive(Debug)]
pub struct IgnoreFile {
    pub base_dir: PathBuf,
    pub patterns: Vec<IgnorePattern>,
}

#[derive(Debug)]
pub struct IgnorePattern {
    pub negated: bool,
    pub pattern: globset::GlobMatcher,
}

impl IgnorePattern {
    fn from_line(line: &str) -> Result<Option<IgnorePattern>> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Ok(None);
        }
        let (negated, body) = match trimmed.strip_prefix('!') {
            Some(rest) => (true, rest.trim()),
            None => (false, trimmed),
        };
        // Directory patterns cover everything beneath them.
        let glob_body = if body.ends_with('/') {
            format!("{}**", body)
        } else {
            body.to_string()
        };
        let pattern = Glob::new(&glob_body)
            .with_context(|| format!("invalid ignore pattern {:?}", trimmed))?
            .compile_matcher();
        Ok(Some(IgnorePattern { negated, pattern }))
    }
}

impl IgnoreFile {
    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open ignore file {}", path.display()))?;
        let base_dir = path.parent().unwrap_or(path).to_path_buf();
        Self::from_reader(base_dir, file)
    }

    pub fn from_reader(base_dir: PathBuf, reader: impl Read) -> Result<Self> {
        let mut patterns = Vec::new();
        for line in BufReader::new(reader).lines() {
            let line = line.context("failed to read line from ignore file")?;
            if let Some(pattern) = IgnorePattern::from_line(&line)? {
                patterns.push(pattern);
            }
        }
        Ok(IgnoreFile { base_dir, patterns })
    }

    /// The last matching pattern wins, mirroring version-control behavior.
    pub fn is_ignored(&self, path: &Path) -> bool {
        let relative = match diff_paths(path, &self.base_dir) {
            Some(relative) => relative,
            None => return false,
        };
        let relative_slash = match relative.to_slash() {
            Some(slashed) => slashed,
            None => return false,
        };

        let mut ignored = false;
        for pattern in self.patterns.iter() {
            if pattern.pattern.is_match(relative_slash.as_ref()) {
                ignored = !pattern.negated;
            }
        }
        ignored
    }
}

/// Combined exclusion gate for the scan: the configured globs plus the
/// project's .gitignore when one exists.
pub struct IgnoreRules {
    root_dir: PathBuf,
    config_globs: Arc<Vec<glob::Pattern>>,
    ignore_file: Option<IgnoreFile>,
}

impl IgnoreRules {
    pub fn load(
        logger: impl Logger,
        root_dir: &Path,
        config_globs: Arc<Vec<glob::Pattern>>,
    ) -> Self {
        let gitignore_path = root_dir.join(".gitignore");
        let ignore_file = if gitignore_path.is_file() {
            match IgnoreFile::read(&gitignore_path) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    logger.warn(format!("{:#}", e));
                    None
                }
            }
        } else {
            None
        };
        IgnoreRules {
            root_dir: root_dir.to_path_buf(),
            config_globs,
            ignore_file,
        }
    }

    /// Whether a file is excluded by the configured globs or the ignore
    /// file.
    pub fn is_ignored(&self, path: &Path) -> bool {
        if matches_globs(&self.root_dir, &self.config_globs, path) {
            return true;
        }
        match &self.ignore_file {
            Some(ignore_file) => ignore_file.is_ignored(path),
            None => false,
        }
    }
}

/// Matches `path`, relativized against `root_dir`, against config globs.
pub(crate) fn matches_globs(root_dir: &Path, globs: &[glob::Pattern], path: &Path) -> bool {
    if globs.is_empty() {
        return false;
    }
    let relative = match diff_paths(path, root_dir) {
        Some(relative) => relative,
        None => return false,
    };
    match relative.to_slash() {
        Some(slashed) => globs.iter().any(|pattern| pattern.matches(slashed.as_ref())),
        None => false,
    }
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use super::*;

    fn parse(content: &str) -> IgnoreFile {
        IgnoreFile::from_reader(PathBuf::from("/repo"), Cursor::new(content.to_string())).unwrap()
    }

    #[test]
    fn test_parse_skips_comments_and_blanks() {
        let ignore_file = parse(
            r#"# build output
dist/

*.log
!important.log
"#,
        );
        let patterns: Vec<(bool, &str)> = ignore_file
            .patterns
            .iter()
            .map(|p| (p.negated, p.pattern.glob().glob()))
            .collect();
        assert_eq!(
            patterns,
            vec![
                (false, "dist/**"),
                (false, "*.log"),
                (true, "important.log"),
            ]
        );
    }

    #[test]
    fn test_last_match_wins() {
        let ignore_file = parse("generated/**\n!generated/keep.ts\n");
        assert!(ignore_file.is_ignored(Path::new("/repo/generated/skip.ts")));
        assert!(!ignore_file.is_ignored(Path::new("/repo/generated/keep.ts")));
    }

    #[test]
    fn test_directory_pattern_covers_subtree() {
        let ignore_file = parse("build/\n");
        assert!(ignore_file.is_ignored(Path::new("/repo/build/deep/out.js")));
        assert!(!ignore_file.is_ignored(Path::new("/repo/src/build.rs")));
    }

    #[test]
    fn test_match_all_pattern() {
        let ignore_file = parse("**\n");
        assert!(ignore_file.is_ignored(Path::new("/repo/anything.ts")));
    }

    #[test]
    fn test_config_globs_match_relative_to_root() {
        let globs = vec![glob::Pattern::new("**/*.stories.ts").unwrap()];
        assert!(matches_globs(
            Path::new("/repo"),
            &globs,
            Path::new("/repo/src/button.stories.ts")
        ));
        assert!(!matches_globs(
            Path::new("/repo"),
            &globs,
            Path::new("/repo/src/button.ts")
        ));
    }

    #[test]
    fn test_rules_without_gitignore() {
        let tmpdir = test_tmpdir::TmpDir::new();
        let logger = logger::MemoryLogger::new();
        let rules = IgnoreRules::load(&logger, tmpdir.root(), Arc::new(Vec::new()));
        assert!(!rules.is_ignored(&tmpdir.root_join("src/main.ts")));
    }

    #[test]
    fn test_rules_with_gitignore() {
        let tmpdir = test_tmpdir::test_tmpdir!(
            ".gitignore" => "coverage/\n",
            "coverage/lcov.info" => "",
            "src/main.ts" => ""
        );
        let logger = logger::MemoryLogger::new();
        let rules = IgnoreRules::load(&logger, tmpdir.root(), Arc::new(Vec::new()));
        assert!(rules.is_ignored(&tmpdir.root_join("coverage/lcov.info")));
        assert!(!rules.is_ignored(&tmpdir.root_join("src/main.ts")));
    }
}
