//! HTML rendering for parsed study documents.
//!
//! Every text fragment is escaped before being wrapped. The introduction gets
//! light markdown handling (bold, `#`/`##`/`###` headings); verse bodies are
//! plain narrative text and only get newline-to-`<br>` conversion.
use super::model::{ParsedDocument, VerseBlock};
use super::Labels;
use regex::Regex;
use std::sync::LazyLock;

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold pattern"));

pub(super) fn render(labels: &Labels, doc: &ParsedDocument) -> String {
    let mut out = String::from("<div class=\"etude-content\">\n");
    if !doc.introduction.is_empty() {
        out.push_str("<div class=\"introduction\">\n");
        render_introduction(&mut out, &doc.introduction);
        out.push_str("</div>\n");
    }
    for verse in &doc.verses {
        render_verse(&mut out, labels, verse);
    }
    out.push_str("</div>\n");
    out
}

fn render_verse(out: &mut String, labels: &Labels, verse: &VerseBlock) {
    out.push_str("<div class=\"verset-block\">\n");
    out.push_str(&format!(
        "<h2 class=\"verset-header\">\u{1F4D6} VERSET {}</h2>\n",
        verse.number
    ));
    if !verse.biblical_text.is_empty() {
        out.push_str(&format!(
            "<h4 class=\"texte-biblique-label\">\u{1F4DC} {}</h4>\n",
            escape(&labels.biblical)
        ));
        out.push_str(&format!(
            "<p class=\"texte-biblique\">{}</p>\n",
            breaks(&verse.biblical_text)
        ));
    }
    if let Some(explanation) = &verse.explanation {
        out.push_str(&format!(
            "<h4 class=\"explication-label\">\u{1F393} {}</h4>\n",
            escape(&labels.theological)
        ));
        out.push_str(&format!(
            "<p class=\"explication-theologique\">{}</p>\n",
            breaks(explanation)
        ));
    }
    out.push_str("</div>\n");
}

/// Render introduction text: headings and bold first, then paragraphs with
/// explicit line breaks.
fn render_introduction(out: &mut String, text: &str) {
    let mut paragraph: Vec<String> = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            flush_paragraph(out, &mut paragraph);
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("### ") {
            flush_paragraph(out, &mut paragraph);
            out.push_str(&format!("<h3>{}</h3>\n", inline(rest)));
        } else if let Some(rest) = trimmed.strip_prefix("## ") {
            flush_paragraph(out, &mut paragraph);
            out.push_str(&format!("<h2>{}</h2>\n", inline(rest)));
        } else if let Some(rest) = trimmed.strip_prefix("# ") {
            flush_paragraph(out, &mut paragraph);
            out.push_str(&format!("<h1>{}</h1>\n", inline(rest)));
        } else {
            paragraph.push(inline(trimmed));
        }
    }
    flush_paragraph(out, &mut paragraph);
}

fn flush_paragraph(out: &mut String, paragraph: &mut Vec<String>) {
    if paragraph.is_empty() {
        return;
    }
    out.push_str(&format!("<p>{}</p>\n", paragraph.join("<br>")));
    paragraph.clear();
}

/// Escape, then convert `**text**` spans to `<strong>`.
fn inline(text: &str) -> String {
    BOLD.replace_all(&escape(text), "<strong>$1</strong>")
        .into_owned()
}

/// Escape, then convert single newlines to explicit breaks.
fn breaks(text: &str) -> String {
    text.lines()
        .map(|line| escape(line.trim_end()))
        .collect::<Vec<_>>()
        .join("<br>")
}

fn escape(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}
