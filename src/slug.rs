use std::sync::OnceLock;

use regex::Regex;

use crate::error::ToolkitError;

fn non_slug_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("hard-coded pattern compiles"))
}

/// Derives a URL-safe slug from arbitrary text.
///
/// Lowercases the input, collapses every run of characters outside ASCII
/// `a-z`/`0-9` into a single hyphen, then trims leading and trailing
/// hyphens. Non-ASCII letters and digits are separators, never preserved, so
/// text with no ASCII alphanumerics at all produces an error rather than an
/// empty slug.
pub fn slugify(input: &str) -> Result<String, ToolkitError> {
    if input.is_empty() {
        return Err(ToolkitError::EmptySlugInput);
    }

    let lowered = input.to_lowercase();
    let replaced = non_slug_chars().replace_all(&lowered, "-");
    let slug = replaced.trim_matches('-');
    if slug.is_empty() {
        return Err(ToolkitError::EmptySlugResult);
    }

    Ok(slug.to_string())
}
