//! HTML signal analyzer
//!
//! Extracts the signals AI crawlers depend on from raw markup and turns them
//! into a 0-100 score. Analysis is pure and deterministic: the same HTML and
//! identity name always produce the same [`AnalysisResult`], and malformed
//! input only ever degrades a signal to "absent".
//!
//! # Scoring
//!
//! | Signal | Penalty | Applied when |
//! |--------|---------|--------------|
//! | Content (> 200 chars of body text) | 30 | absent |
//! | `<noscript>` fallback | 10 | absent |
//! | JSON-LD structured data | 15 | absent |
//! | Title and meta description | 20 | either absent |
//! | `<h1>` heading | 10 | absent |
//! | Loading state markers | 15 | present |

mod patterns;

use crate::explain::IssueKind;
use patterns::{
    excerpt, first_capture, strip_tags, visible_text, BODY, H1, H1_OPEN, JSON_LD,
    LOADING_MARKERS, META_DESCRIPTION, META_DESCRIPTION_CONTENT, NOSCRIPT, TITLE, TITLE_OPEN,
};
use serde::Serialize;

/// Body text must be longer than this many characters
pub const CONTENT_THRESHOLD: usize = 200;

/// Noscript text shorter than this is reported as minimal
pub const NOSCRIPT_THRESHOLD: usize = 100;

/// Signals and score for one identity's view of a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Identity the HTML was fetched as
    pub crawler: String,

    pub has_content: bool,
    /// Visible body text length in characters
    pub content_length: usize,

    pub has_noscript: bool,
    pub noscript_length: usize,

    pub has_structured_data: bool,
    pub structured_data_count: usize,

    pub has_title: bool,
    pub has_description: bool,
    /// Title and description both present
    pub has_meta_tags: bool,

    pub has_h1: bool,

    pub has_loading_state: bool,

    /// Failed checks in fixed order: content, noscript, structured data,
    /// title, description, h1, loading state
    pub issues: Vec<String>,

    pub score: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub h1: Option<String>,
}

impl AnalysisResult {
    fn empty(crawler: &str) -> Self {
        Self {
            crawler: crawler.to_string(),
            has_content: false,
            content_length: 0,
            has_noscript: false,
            noscript_length: 0,
            has_structured_data: false,
            structured_data_count: 0,
            has_title: false,
            has_description: false,
            has_meta_tags: false,
            has_h1: false,
            has_loading_state: false,
            issues: Vec::new(),
            score: 0,
            title: None,
            description: None,
            h1: None,
        }
    }

    /// Checks that cost points, in scoring order
    pub fn issue_kinds(&self) -> Vec<IssueKind> {
        IssueKind::ALL
            .into_iter()
            .filter(|kind| self.fails(*kind))
            .collect()
    }

    /// Returns true if the given check cost points
    pub fn fails(&self, kind: IssueKind) -> bool {
        match kind {
            IssueKind::Content => !self.has_content,
            IssueKind::Noscript => !self.has_noscript,
            IssueKind::StructuredData => !self.has_structured_data,
            IssueKind::MetaTags => !self.has_meta_tags,
            IssueKind::H1 => !self.has_h1,
            IssueKind::LoadingState => self.has_loading_state,
        }
    }
}

/// Analyzes a page as seen by `crawler`
///
/// # Example
///
/// ```
/// use crawlerview::analyze;
///
/// let result = analyze("<html><body></body></html>", "GPTBot");
/// assert_eq!(result.score, 15);
/// assert_eq!(result.issues.len(), 6);
/// ```
pub fn analyze(html: &str, crawler: &str) -> AnalysisResult {
    let mut result = AnalysisResult::empty(crawler);

    check_content(html, &mut result);
    check_noscript(html, &mut result);
    check_structured_data(html, &mut result);
    check_meta_tags(html, &mut result);
    check_h1(html, &mut result);
    check_loading_state(html, &mut result);

    result.score = score(&result);
    result
}

/// 100 minus the weight of every failed check, floored at zero
pub fn score(result: &AnalysisResult) -> u32 {
    let penalty: u32 = result.issue_kinds().iter().map(|kind| kind.weight()).sum();
    100u32.saturating_sub(penalty)
}

fn check_content(html: &str, result: &mut AnalysisResult) {
    let Some(body) = first_capture(&BODY, html) else {
        result.issues.push("No <body> tag found".to_string());
        return;
    };

    let text = visible_text(body);
    result.content_length = text.chars().count();
    result.has_content = result.content_length > CONTENT_THRESHOLD;

    if !result.has_content {
        result.issues.push(format!(
            "Very little text content ({} chars)",
            result.content_length
        ));
    }
}

fn check_noscript(html: &str, result: &mut AnalysisResult) {
    let Some(inner) = first_capture(&NOSCRIPT, html) else {
        result.issues.push("No <noscript> fallback".to_string());
        return;
    };

    result.has_noscript = true;
    result.noscript_length = strip_tags(inner).chars().count();

    if result.noscript_length < NOSCRIPT_THRESHOLD {
        result.issues.push("Noscript content is minimal".to_string());
    }
}

fn check_structured_data(html: &str, result: &mut AnalysisResult) {
    result.structured_data_count = JSON_LD.find_iter(html).count();
    result.has_structured_data = result.structured_data_count > 0;

    if !result.has_structured_data {
        result
            .issues
            .push("No structured data (JSON-LD) found".to_string());
    }
}

fn check_meta_tags(html: &str, result: &mut AnalysisResult) {
    result.has_title = TITLE_OPEN.is_match(html);
    result.has_description = META_DESCRIPTION.is_match(html);
    result.has_meta_tags = result.has_title && result.has_description;

    result.title = first_capture(&TITLE, html).and_then(excerpt);
    result.description = first_capture(&META_DESCRIPTION_CONTENT, html)
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    if !result.has_title {
        result.issues.push("Missing <title> tag".to_string());
    }
    if !result.has_description {
        result.issues.push("Missing meta description".to_string());
    }
}

fn check_h1(html: &str, result: &mut AnalysisResult) {
    result.has_h1 = H1_OPEN.is_match(html);
    result.h1 = first_capture(&H1, html).and_then(excerpt);

    if !result.has_h1 {
        result.issues.push("No <h1> heading".to_string());
    }
}

fn check_loading_state(html: &str, result: &mut AnalysisResult) {
    if LOADING_MARKERS.iter().any(|marker| marker.is_match(html)) {
        result.has_loading_state = true;
        result
            .issues
            .push("Loading state detected in HTML".to_string());
    }
}
