//! Splits single-file components into their markup and script regions.
//!
//! Only the block structure is parsed here. Template contents are handed
//! back verbatim for the markup analyzer, and script contents go to the
//! ecma parser untouched.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SfcError {
    #[error("component has more than one <{0}> block")]
    DuplicateBlock(&'static str),
    #[error("component has an unterminated <{0}> block")]
    UnclosedBlock(&'static str),
    #[error("<script setup> is not supported by the project's component format")]
    SetupNotSupported,
}

/// A single-file component split into its analyzable regions.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SfcParts {
    /// Markup region, when the component has a template block.
    pub markup: Option<String>,
    /// Concatenated script content, possibly empty.
    pub script: String,
}

/// Splits component source into markup and script regions.
///
/// The two implementations differ in how `<script setup>` is treated:
/// the modern component format merges it with the plain script block,
/// the legacy format rejects it.
pub trait SfcSplitter: Send + Sync {
    fn split(&self, source: &str) -> Result<SfcParts, SfcError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ModernSplitter;

impl SfcSplitter for ModernSplitter {
    fn split(&self, source: &str) -> Result<SfcParts, SfcError> {
        let blocks = scan_blocks(source)?;
        let script = match (blocks.script, blocks.script_setup) {
            (Some(script), Some(setup)) => format!("{}\n{}", script, setup),
            (Some(script), None) => script,
            (None, Some(setup)) => setup,
            (None, None) => String::new(),
        };
        Ok(SfcParts {
            markup: blocks.template,
            script,
        })
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LegacySplitter;

impl SfcSplitter for LegacySplitter {
    fn split(&self, source: &str) -> Result<SfcParts, SfcError> {
        let blocks = scan_blocks(source)?;
        if blocks.script_setup.is_some() {
            return Err(SfcError::SetupNotSupported);
        }
        Ok(SfcParts {
            markup: blocks.template,
            script: blocks.script.unwrap_or_default(),
        })
    }
}

/// Picks the splitter matching the component format the project targets,
/// read from the `vue` dependency in the project's package.json. Projects
/// without one get the modern splitter.
pub fn splitter_for_project(root_dir: &Path) -> Box<dyn SfcSplitter> {
    match project_vue_major(root_dir) {
        Some(2) => Box::new(LegacySplitter),
        _ => Box::new(ModernSplitter),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson {
    #[serde(default)]
    dependencies: HashMap<String, String>,
    #[serde(default)]
    dev_dependencies: HashMap<String, String>,
}

fn project_vue_major(root_dir: &Path) -> Option<u32> {
    let raw = std::fs::read_to_string(root_dir.join("package.json")).ok()?;
    let package: PackageJson = serde_json::from_str(&raw).ok()?;
    let requirement = package
        .dependencies
        .get("vue")
        .or_else(|| package.dev_dependencies.get("vue"))?;
    parse_major(requirement)
}

/// Extracts the major version from a semver requirement like `^3.4.21`.
fn parse_major(requirement: &str) -> Option<u32> {
    let trimmed = requirement.trim_start_matches(|c: char| !c.is_ascii_digit());
    let digits: String = trimmed
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

#[derive(Debug, Default)]
struct RawBlocks {
    template: Option<String>,
    script: Option<String>,
    script_setup: Option<String>,
}

/// One top-level block opening: `<script setup lang="ts">` gives
/// name "script", attrs `setup lang="ts"`, and the offset past the '>'.
struct BlockOpening<'a> {
    name: &'a str,
    attrs: &'a str,
    head_end: usize,
    self_closing: bool,
}

fn scan_blocks(source: &str) -> Result<RawBlocks, SfcError> {
    let mut blocks = RawBlocks::default();
    let mut cursor = 0usize;

    while cursor < source.len() {
        let open_start = match source[cursor..].find('<') {
            Some(i) => cursor + i,
            None => break,
        };

        if source[open_start..].starts_with("<!--") {
            cursor = match find_ci(source, "-->", open_start + 4) {
                Some(end) => end + 3,
                None => break,
            };
            continue;
        }

        let opening = match parse_opening(source, open_start) {
            Some(opening) => opening,
            None => {
                // stray '<' in top-level text
                cursor = open_start + 1;
                continue;
            }
        };

        let name = opening.name.to_ascii_lowercase();
        match name.as_str() {
            "template" => {
                if blocks.template.is_some() {
                    return Err(SfcError::DuplicateBlock("template"));
                }
                if opening.self_closing {
                    blocks.template = Some(String::new());
                    cursor = opening.head_end;
                    continue;
                }
                let (content, resume) = extract_template(source, opening.head_end)?;
                blocks.template = Some(content);
                cursor = resume;
            }
            "script" => {
                let setup = has_setup_attr(opening.attrs);
                let slot_name: &'static str = if setup { "script setup" } else { "script" };
                let slot = if setup {
                    &mut blocks.script_setup
                } else {
                    &mut blocks.script
                };
                if slot.is_some() {
                    return Err(SfcError::DuplicateBlock(slot_name));
                }
                if opening.self_closing {
                    *slot = Some(String::new());
                    cursor = opening.head_end;
                    continue;
                }
                let (content, resume) = extract_simple(source, "script", opening.head_end)?;
                *slot = Some(content);
                cursor = resume;
            }
            "style" => {
                if opening.self_closing {
                    cursor = opening.head_end;
                    continue;
                }
                let (_, resume) = extract_simple(source, "style", opening.head_end)?;
                cursor = resume;
            }
            _ => {
                cursor = skip_block(source, &name, opening);
            }
        }
    }

    Ok(blocks)
}

fn parse_opening(source: &str, open_start: usize) -> Option<BlockOpening<'_>> {
    let after_lt = open_start + 1;
    if after_lt >= source.len() {
        return None;
    }
    let head_close = source[after_lt..].find('>')? + after_lt;
    let head = &source[after_lt..head_close];
    let (head, self_closing) = match head.strip_suffix('/') {
        Some(trimmed) => (trimmed, true),
        None => (head, false),
    };
    let mut parts = head.splitn(2, char::is_whitespace);
    let name = parts.next().unwrap_or("");
    let attrs = parts.next().unwrap_or("").trim();
    if name.is_empty() {
        return None;
    }
    Some(BlockOpening {
        name,
        attrs,
        head_end: head_close + 1,
        self_closing,
    })
}

fn has_setup_attr(attrs: &str) -> bool {
    attrs
        .split_whitespace()
        .any(|token| token == "setup" || token.starts_with("setup="))
}

/// Template content may nest further `<template>` elements (branching,
/// named slots), so the closing tag is the one that returns to depth zero.
fn extract_template(source: &str, content_start: usize) -> Result<(String, usize), SfcError> {
    let mut depth = 1usize;
    let mut cursor = content_start;

    loop {
        let close_at = match find_tag_ci(source, "</template", cursor) {
            Some(at) => at,
            None => return Err(SfcError::UnclosedBlock("template")),
        };
        match find_tag_ci(source, "<template", cursor) {
            Some(open_at) if open_at < close_at => match parse_opening(source, open_at) {
                Some(nested) => {
                    if !nested.self_closing {
                        depth += 1;
                    }
                    cursor = nested.head_end;
                }
                None => return Err(SfcError::UnclosedBlock("template")),
            },
            _ => {
                depth -= 1;
                let end = match source[close_at..].find('>') {
                    Some(i) => close_at + i + 1,
                    None => return Err(SfcError::UnclosedBlock("template")),
                };
                if depth == 0 {
                    return Ok((source[content_start..close_at].to_string(), end));
                }
                cursor = end;
            }
        }
    }
}

/// Extracts the body of a block that cannot nest, like script or style.
fn extract_simple(
    source: &str,
    name: &'static str,
    content_start: usize,
) -> Result<(String, usize), SfcError> {
    let closing = format!("</{}", name);
    let mut search_from = content_start;
    loop {
        let close_at = match find_ci(source, &closing, search_from) {
            Some(at) => at,
            None => return Err(SfcError::UnclosedBlock(name)),
        };
        if !is_tag_boundary(source, close_at + closing.len()) {
            search_from = close_at + closing.len();
            continue;
        }
        let end = match source[close_at..].find('>') {
            Some(i) => close_at + i + 1,
            None => return Err(SfcError::UnclosedBlock(name)),
        };
        return Ok((source[content_start..close_at].to_string(), end));
    }
}

/// Custom blocks (`<docs>`, `<i18n>`) are skipped whole; stray closing
/// tags are skipped past their '>'.
fn skip_block(source: &str, name: &str, opening: BlockOpening) -> usize {
    if opening.self_closing || name.starts_with('/') {
        return opening.head_end;
    }
    let closing = format!("</{}", name);
    match find_ci(source, &closing, opening.head_end) {
        Some(close_at) => match source[close_at..].find('>') {
            Some(end) => close_at + end + 1,
            None => source.len(),
        },
        None => opening.head_end,
    }
}

// Case-insensitive search with ASCII folding only, so byte offsets stay
// valid for slicing.
fn find_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let hay = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.is_empty() || from >= hay.len() {
        return None;
    }
    hay[from..]
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
        .map(|i| i + from)
}

// find_ci, but requiring the match to end at a tag-name boundary so
// "<template-grid>" is not mistaken for a nested "<template>".
fn find_tag_ci(source: &str, tag: &str, from: usize) -> Option<usize> {
    let mut search_from = from;
    loop {
        let at = find_ci(source, tag, search_from)?;
        if is_tag_boundary(source, at + tag.len()) {
            return Some(at);
        }
        search_from = at + tag.len();
    }
}

fn is_tag_boundary(source: &str, at: usize) -> bool {
    match source.as_bytes().get(at) {
        Some(b) => b.is_ascii_whitespace() || *b == b'>' || *b == b'/',
        None => false,
    }
}
