//! Structures a free-form assistant reply into (title, tips) sections.
//!
//! This is a heuristic pass over markdown-like text:
//! - decoration (`**`, `*`, `#`, backtick fences, inline code, links) is removed
//! - the text is split on numbered-list markers at line start (`1. `, `12. `)
//! - within a section the first non-empty line is the title and `-`/`•` lines
//!   are tips; every other line is ignored

use std::sync::LazyLock;

use regex::Regex;

use crate::models::Section;

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.*?)\]\(.*?\)").expect("link pattern is valid"));

static NUMBERED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*\d+\.[ \t]+").expect("marker pattern is valid"));

const TIP_GLYPHS: [char; 2] = ['-', '•'];

/// Remove markdown decoration, keeping link labels.
///
/// Idempotent: `strip_markdown(&strip_markdown(x)) == strip_markdown(x)`.
pub fn strip_markdown(text: &str) -> String {
    let mut cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, '*' | '#' | '`'))
        .collect();

    // Nested links such as `[[a](b)](c)` unwrap one level per pass.
    loop {
        let next = LINK.replace_all(&cleaned, "$1");
        if next == cleaned {
            break;
        }
        cleaned = next.into_owned();
    }

    cleaned
}

/// Parse a reply into its numbered sections.
///
/// Non-blank text before the first numbered marker becomes the first section.
/// Without any marker the whole text becomes one section with no tips.
pub fn parse(text: &str) -> Vec<Section> {
    let cleaned = strip_markdown(text);

    let markers: Vec<_> = NUMBERED_MARKER.find_iter(&cleaned).collect();
    if markers.is_empty() {
        return first_line(&cleaned)
            .map(|title| {
                vec![Section {
                    title: title.to_string(),
                    tips: Vec::new(),
                }]
            })
            .unwrap_or_default();
    }

    let preamble = parse_section(&cleaned[..markers[0].start()]);

    let numbered = markers.iter().enumerate().filter_map(|(i, marker)| {
        let end = markers
            .get(i + 1)
            .map(|next| next.start())
            .unwrap_or(cleaned.len());
        parse_section(&cleaned[marker.end()..end])
    });

    preamble.into_iter().chain(numbered).collect()
}

fn parse_section(fragment: &str) -> Option<Section> {
    let mut lines = fragment.lines().map(str::trim).filter(|l| !l.is_empty());
    let title = lines.next()?.to_string();

    let tips = lines
        .filter_map(|line| line.strip_prefix(TIP_GLYPHS))
        .map(|tip| tip.trim().to_string())
        .filter(|tip| !tip.is_empty())
        .collect();

    Some(Section { title, tips })
}

fn first_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|l| !l.is_empty())
}
