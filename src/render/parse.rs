//! Line-oriented segmentation of raw generation output.
//!
//! The document is walked once, line by line, through two states: before the
//! first verse marker every line belongs to the introduction; after a marker
//! every line belongs to the current verse body until the next marker. A
//! tolerant walk keeps the degraded shapes (empty bodies, missing labels)
//! explicit instead of burying them in one multi-pattern split.
use super::model::{ParsedDocument, VerseBlock};
use super::Labels;
use regex::Regex;
use std::sync::LazyLock;

/// Whole-line verse marker: `VERSET` plus a number and nothing else.
/// Case-sensitive on purpose; this line is the segmentation delimiter and is
/// never rewritten by label normalization.
static VERSE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^VERSET\s+(\d+)\s*$").expect("verse marker pattern"));

enum State {
    BeforeFirstVerse,
    InVerseBody,
}

pub(super) fn parse_document(labels: &Labels, text: &str) -> ParsedDocument {
    let mut introduction: Vec<&str> = Vec::new();
    let mut bodies: Vec<(u32, Vec<&str>)> = Vec::new();
    let mut state = State::BeforeFirstVerse;

    for line in text.lines() {
        if let Some(number) = marker_number(line) {
            bodies.push((number, Vec::new()));
            state = State::InVerseBody;
            continue;
        }
        match state {
            State::BeforeFirstVerse => introduction.push(line),
            State::InVerseBody => {
                if let Some((_, body)) = bodies.last_mut() {
                    body.push(line);
                }
            }
        }
    }

    let verses = bodies
        .into_iter()
        .map(|(number, body)| split_verse_body(labels, number, &body.join("\n")))
        .collect();

    ParsedDocument {
        introduction: introduction.join("\n").trim().to_string(),
        verses,
    }
}

fn marker_number(line: &str) -> Option<u32> {
    let captures = VERSE_MARKER.captures(line)?;
    captures[1].parse().ok()
}

/// Split one verse body on the two section labels.
///
/// Labels only count when they occupy a whole line; the same words embedded
/// in running text never trigger a split. A body without the biblical label
/// degrades to a single fallback block.
fn split_verse_body(labels: &Labels, number: u32, body: &str) -> VerseBlock {
    let lines: Vec<&str> = body.lines().collect();
    let Some(biblical_at) = lines.iter().position(|line| line.trim() == labels.biblical) else {
        return VerseBlock {
            number,
            biblical_text: body.trim().to_string(),
            explanation: None,
        };
    };

    let after_label = &lines[biblical_at + 1..];
    let (biblical_lines, explanation_lines) = match after_label
        .iter()
        .position(|line| line.trim() == labels.theological)
    {
        Some(theological_at) => (
            &after_label[..theological_at],
            Some(&after_label[theological_at + 1..]),
        ),
        None => (after_label, None),
    };

    let explanation = explanation_lines
        .map(|lines| lines.join("\n").trim().to_string())
        .filter(|text| !text.is_empty());

    VerseBlock {
        number,
        biblical_text: biblical_lines.join("\n").trim().to_string(),
        explanation,
    }
}
