//! Task id extraction from pull request descriptions.
//!
//! Ids are only read from the `## Tasks` section, which runs until the next
//! horizontal rule (`---`, `***` or `___`) or the end of the text. The header
//! may carry trailing text such as `## Tasks:` or `## Tasks (2)`.
//!
//! ```text
//! ## Tasks
//! - #868123456 login form
//! - #868123457 session expiry
//! ---
//! ```

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Header marking the section that lists task ids (matched case-insensitively).
pub const TASKS_HEADER: &str = "## Tasks";

static SECTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?imsR)^[ \t]*##[ \t]*tasks\b[^\r\n]*$(.*?)(?:^[ \t]*(?:-{3,}|\*{3,}|_{3,})[ \t]*$|\z)",
    )
    .expect("tasks section pattern is valid")
});

static TASK_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(\d{9,})").expect("task id pattern is valid"));

/// Returns the distinct task ids in the first tasks section, in first-seen order.
///
/// Text without the section header yields an empty list.
#[must_use]
pub fn extract_task_ids(text: &str) -> Vec<String> {
    let Some(section) = SECTION.captures(text).and_then(|c| c.get(1)) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    TASK_ID
        .captures_iter(section.as_str())
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .filter(|id| seen.insert(*id))
        .map(String::from)
        .collect()
}
