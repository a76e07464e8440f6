use regex::Regex;
use std::sync::LazyLock;

pub const USER_CODE_START: &str = "// --- HUB USER CODE START ---";
pub const USER_CODE_END: &str = "// --- HUB USER CODE END ---";

/// Stands in for the user region in a freshly rendered template.
pub const PLACEHOLDER: &str = "__HUB_USER_CODE__\n";

static USER_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ms)^[ \t]*// --- HUB USER CODE START ---\n.*?^[ \t]*// --- HUB USER CODE END ---").expect("invalid regex"));

/// The user region of `source`, from the start marker line through the end marker.
#[must_use]
pub fn extract(source: &str) -> Option<&str> {
    USER_BLOCK.find(source).map(|m| m.as_str())
}

/// Wraps `body` in the region markers, indenting the markers by `indent`.
#[must_use]
pub fn default_block(body: &str, indent: &str) -> String {
    let body = body.trim_matches('\n');
    format!("{indent}{USER_CODE_START}\n{body}\n{indent}{USER_CODE_END}")
}

/// Replaces the placeholder in `template` with `preserved`, or with `fallback` when
/// nothing was preserved.
#[must_use]
pub fn inject(template: &str, preserved: Option<&str>, fallback: &str) -> String {
    let block = preserved.unwrap_or(fallback).trim_end();
    template.replacen(PLACEHOLDER, &format!("{block}\n"), 1)
}
