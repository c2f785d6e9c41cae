//! Compiled markup patterns
//!
//! Targeted pattern search over raw HTML. Nothing here builds a DOM, so
//! malformed or truncated documents simply fail to match.

use regex::Regex;
use std::sync::LazyLock;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static markup pattern must compile")
}

pub(crate) static BODY: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?is)<body[^>]*>(.*?)</body>"));

pub(crate) static NOSCRIPT: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?is)<noscript[^>]*>(.*?)</noscript>"));

pub(crate) static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?is)<script[^>]*>.*?</script>"));

pub(crate) static STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?is)<style[^>]*>.*?</style>"));

pub(crate) static TAG: LazyLock<Regex> = LazyLock::new(|| compile(r"<[^>]+>"));

pub(crate) static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| compile(r"\s+"));

pub(crate) static JSON_LD: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"(?is)<script type="application/ld\+json"[^>]*>(.*?)</script>"#));

// Title and h1 are matched in lowercase only; other tags ignore case
pub(crate) static TITLE_OPEN: LazyLock<Regex> = LazyLock::new(|| compile(r"<title[^>]*>"));

pub(crate) static TITLE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?s)<title[^>]*>(.*?)</title>"));

pub(crate) static META_DESCRIPTION: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"(?i)<meta\s+name="description""#));

pub(crate) static META_DESCRIPTION_CONTENT: LazyLock<Regex> =
    LazyLock::new(|| compile(r#"(?is)<meta\s+name="description"[^>]*?\scontent="([^"]*)""#));

pub(crate) static H1_OPEN: LazyLock<Regex> = LazyLock::new(|| compile(r"<h1[^>]*>"));

pub(crate) static H1: LazyLock<Regex> = LazyLock::new(|| compile(r"(?s)<h1[^>]*>(.*?)</h1>"));

/// Client-rendering markers, checked in order; the first hit wins
pub(crate) static LOADING_MARKERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        compile(r#"(?i)class="[^"]*loading[^"]*""#),
        compile(r#"(?i)class="[^"]*spinner[^"]*""#),
        compile(r#"(?i)aria-busy="true""#),
        compile(r"(?i)Loading\.\.\."),
    ]
});

/// Inner text of the first match of `pattern`'s first capture group
pub(crate) fn first_capture<'a>(pattern: &Regex, html: &'a str) -> Option<&'a str> {
    pattern
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Removes script/style blocks and tags, collapses whitespace, trims
pub(crate) fn visible_text(fragment: &str) -> String {
    let without_scripts = SCRIPT_BLOCK.replace_all(fragment, "");
    let without_styles = STYLE_BLOCK.replace_all(&without_scripts, "");
    let without_tags = TAG.replace_all(&without_styles, "");
    WHITESPACE
        .replace_all(&without_tags, " ")
        .trim()
        .to_string()
}

/// Removes tags and trims, keeping inner whitespace as written
pub(crate) fn strip_tags(fragment: &str) -> String {
    TAG.replace_all(fragment, "").trim().to_string()
}

/// Tag-stripped, whitespace-collapsed excerpt; `None` when empty
pub(crate) fn excerpt(fragment: &str) -> Option<String> {
    let text = WHITESPACE
        .replace_all(&strip_tags(fragment), " ")
        .trim()
        .to_string();
    (!text.is_empty()).then_some(text)
}
