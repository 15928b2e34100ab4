//! Raw study text to HTML.
//!
//! The formatter is a pure function over the raw text returned by the
//! generation API: normalize the two section labels, segment on verse marker
//! lines, and render deterministic markup. Malformed input never errors; it
//! degrades to a best-effort rendering because the upstream text is
//! LLM-generated and not guaranteed well-formed.
//!
//! The output is final: callers render it as-is and must re-run the formatter
//! on the retained raw text, never on the HTML.
mod html;
mod model;
mod parse;

use regex::Regex;
use std::sync::LazyLock;

/// Section titles the generator emits as plain text; wrapped in `**…**`
/// during normalization so the introduction rendering emphasizes them.
const EMPHASIZED_TITLES: &[&str] = &[
    "Introduction au Chapitre",
    "Synthèse Spirituelle",
    "Principe Herméneutique",
];

/// Section labels in their canonical whole-line form.
#[derive(Debug, Clone)]
pub struct Labels {
    pub biblical: String,
    pub theological: String,
}

impl Labels {
    /// Labels used by the verse-by-verse study template.
    pub fn study() -> Self {
        Labels {
            biblical: "TEXTE BIBLIQUE :".to_string(),
            theological: "EXPLICATION THÉOLOGIQUE :".to_string(),
        }
    }
}

/// One formatter parameterized over its section labels, replacing the
/// per-variant copies of the same pipeline.
pub struct Formatter {
    labels: Labels,
    biblical_pattern: Regex,
    theological_pattern: Regex,
}

static STUDY: LazyLock<Formatter> = LazyLock::new(Formatter::study);

impl Formatter {
    pub fn new(labels: Labels) -> Self {
        let biblical_pattern = label_pattern(&labels.biblical);
        let theological_pattern = label_pattern(&labels.theological);
        Formatter {
            labels,
            biblical_pattern,
            theological_pattern,
        }
    }

    pub fn study() -> Self {
        Self::new(Labels::study())
    }

    /// Convert raw generation output to the final HTML fragment.
    pub fn format(&self, raw: &str) -> String {
        let normalized = emphasize_titles(&self.normalize_labels(raw));
        let doc = parse::parse_document(&self.labels, &normalized);
        html::render(&self.labels, &doc)
    }

    /// Canonicalize label spelling so the section split can use exact
    /// whole-line matches. `VERSET n` lines are deliberately left untouched:
    /// they are the segmentation delimiter.
    fn normalize_labels(&self, raw: &str) -> String {
        let pass = self
            .biblical_pattern
            .replace_all(raw, self.labels.biblical.as_str());
        self.theological_pattern
            .replace_all(&pass, self.labels.theological.as_str())
            .into_owned()
    }
}

/// Format with the standard study labels.
pub fn format_study(raw: &str) -> String {
    STUDY.format(raw)
}

/// Wrap the known section titles in `**…**` so the introduction rendering
/// turns them into `<strong>`.
fn emphasize_titles(text: &str) -> String {
    let mut out = text.to_string();
    for title in EMPHASIZED_TITLES {
        out = out.replace(title, &format!("**{title}**"));
    }
    out
}

fn label_pattern(label: &str) -> Regex {
    let stem = label.trim_end_matches(':').trim_end();
    Regex::new(&format!(r"{}\s*:", regex::escape(stem))).expect("escaped label pattern")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_whitespace_variants_are_canonicalized() {
        let html = format_study("VERSET 1\nTEXTE BIBLIQUE:\ntexte\nEXPLICATION THÉOLOGIQUE   :\nexplication");
        assert!(html.contains("texte"));
        assert!(html.contains("explication-theologique"));
        assert!(html.contains("explication"));
    }

    #[test]
    fn end_to_end_sample_renders_all_three_blocks() {
        let raw = "Intro.\n\nVERSET 16\nTEXTE BIBLIQUE :\nCar Dieu a tant aimé...\nEXPLICATION THÉOLOGIQUE :\nCe verset résume...";
        let html = format_study(raw);
        assert!(html.contains("<div class=\"introduction\">"));
        assert!(html.contains("Intro."));
        assert!(html.contains("VERSET 16"));
        assert!(html.contains("Car Dieu a tant aimé..."));
        assert!(html.contains("Ce verset résume..."));
        assert_eq!(html.matches("verset-block").count(), 1);
    }

    #[test]
    fn custom_labels_drive_both_split_and_display() {
        let formatter = Formatter::new(Labels {
            biblical: "TEXTE :".to_string(),
            theological: "NOTES :".to_string(),
        });
        let html = formatter.format("VERSET 2\nTEXTE :\ncorps\nNOTES :\nremarques");
        assert!(html.contains("TEXTE :"));
        assert!(html.contains("corps"));
        assert!(html.contains("NOTES :"));
        assert!(html.contains("remarques"));
    }

    #[test]
    fn section_titles_are_emphasized_in_the_introduction() {
        let html = format_study("Introduction au Chapitre\n\nLe chapitre ouvre le livre.");
        assert!(html.contains("<strong>Introduction au Chapitre</strong>"));

        let html = format_study("Synthèse Spirituelle\nPrincipe Herméneutique");
        assert!(html.contains("<strong>Synthèse Spirituelle</strong>"));
        assert!(html.contains("<strong>Principe Herméneutique</strong>"));
    }

    #[test]
    fn empty_input_renders_an_empty_container() {
        let html = format_study("");
        assert_eq!(html, "<div class=\"etude-content\">\n</div>\n");
    }
}
