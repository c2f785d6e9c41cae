//! Heuristic robots.txt directive scan
//!
//! Looks for an agent line followed, anywhere later in the file, by
//! `Disallow: /`. This is not group-aware: a `Disallow: /` belonging to a later
//! agent group, or a narrower rule such as `Disallow: /admin`, also matches.

use regex::Regex;
use std::sync::LazyLock;

static WILDCARD_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)User-agent:\s*\*.*?Disallow:\s*/").expect("static robots pattern must compile")
});

/// Issue reported when the wildcard group appears to disallow everything
pub const WILDCARD_ISSUE: &str = "All bots may be blocked (User-agent: * with Disallow)";

/// Returns one issue per matched agent, named agents first, wildcard last
pub fn scan_for_blocks(robots_txt: &str, agents: &[String]) -> Vec<String> {
    let mut issues = Vec::new();

    for agent in agents {
        if agent_blocked(robots_txt, agent) {
            issues.push(format!("{} is blocked in robots.txt", agent));
        }
    }

    if WILDCARD_BLOCK.is_match(robots_txt) {
        issues.push(WILDCARD_ISSUE.to_string());
    }

    issues
}

fn agent_blocked(robots_txt: &str, agent: &str) -> bool {
    let pattern = format!(
        r"(?is)User-agent:\s*{}.*?Disallow:\s*/",
        regex::escape(agent)
    );
    match Regex::new(&pattern) {
        Ok(re) => re.is_match(robots_txt),
        Err(e) => {
            tracing::warn!("Skipping robots check for agent {:?}: {}", agent, e);
            false
        }
    }
}
