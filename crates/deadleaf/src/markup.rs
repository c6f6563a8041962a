use ahashmap::{AHashMap, AHashSet};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Opening tags only: `<FooBar`, `<foo-bar`. Closings start with '/'
    // and are skipped by the leading letter requirement.
    static ref TAG_RE: Regex = Regex::new(r"<([A-Za-z][A-Za-z0-9-]*)").unwrap();
    // `:is="Foo"` and `v-bind:is='foo-bar'` dynamic component bindings.
    static ref IS_BINDING_RE: Regex =
        Regex::new(r#"(?:v-bind)?:is\s*=\s*(?:"([^"]+)"|'([^']+)')"#).unwrap();
}

/// Tag names and `:is` binding targets referenced in a markup region.
pub fn extract_template_tags(markup: &str) -> AHashSet<String> {
    let mut tags = AHashSet::default();
    for capture in TAG_RE.captures_iter(markup) {
        tags.insert(capture[1].to_string());
    }
    for capture in IS_BINDING_RE.captures_iter(markup) {
        if let Some(value) = capture.get(1).or_else(|| capture.get(2)) {
            let name = value.as_str().trim_matches(|c| c == '"' || c == '\'');
            if !name.is_empty() {
                tags.insert(name.to_string());
            }
        }
    }
    tags
}

/// Import specifiers credited as used because their default-import binding
/// appears as a tag or `:is` target in the markup region.
///
/// Tags match a binding either exactly or with the kebab-case form folded
/// to Pascal case, so `<nav-bar>` credits an import bound as `NavBar`.
pub fn markup_credited_specifiers(
    markup: &str,
    default_bindings: &AHashMap<String, String>,
) -> AHashSet<String> {
    let mut credited = AHashSet::default();
    if default_bindings.is_empty() {
        return credited;
    }
    for tag in extract_template_tags(markup) {
        let matched = default_bindings
            .get(&tag)
            .or_else(|| default_bindings.get(&kebab_to_pascal(&tag)));
        if let Some(specifier) = matched {
            credited.insert(specifier.clone());
        }
    }
    credited
}

/// Converts `foo-bar` to `FooBar`.
pub fn kebab_to_pascal(tag: &str) -> String {
    tag.split('-').map(capitalize).collect()
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
