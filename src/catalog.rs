//! Canonical book catalog and passage references.
//!
//! One fixed table drives everything: selector options, per-book chapter
//! bounds, and the OSIS codes used for the external reading link. Keeping a
//! single source avoids the name/bound drift the per-variant copies had.
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// `(French name, chapter count, OSIS code)` for the 66 canonical books,
/// in canon order.
const BOOKS: &[(&str, u32, &str)] = &[
    ("Genèse", 50, "GEN"),
    ("Exode", 40, "EXO"),
    ("Lévitique", 27, "LEV"),
    ("Nombres", 36, "NUM"),
    ("Deutéronome", 34, "DEU"),
    ("Josué", 24, "JOS"),
    ("Juges", 21, "JDG"),
    ("Ruth", 4, "RUT"),
    ("1 Samuel", 31, "1SA"),
    ("2 Samuel", 24, "2SA"),
    ("1 Rois", 22, "1KI"),
    ("2 Rois", 25, "2KI"),
    ("1 Chroniques", 29, "1CH"),
    ("2 Chroniques", 36, "2CH"),
    ("Esdras", 10, "EZR"),
    ("Néhémie", 13, "NEH"),
    ("Esther", 10, "EST"),
    ("Job", 42, "JOB"),
    ("Psaumes", 150, "PSA"),
    ("Proverbes", 31, "PRO"),
    ("Ecclésiaste", 12, "ECC"),
    ("Cantique des cantiques", 8, "SNG"),
    ("Ésaïe", 66, "ISA"),
    ("Jérémie", 52, "JER"),
    ("Lamentations", 5, "LAM"),
    ("Ézéchiel", 48, "EZK"),
    ("Daniel", 12, "DAN"),
    ("Osée", 14, "HOS"),
    ("Joël", 3, "JOL"),
    ("Amos", 9, "AMO"),
    ("Abdias", 1, "OBA"),
    ("Jonas", 4, "JON"),
    ("Michée", 7, "MIC"),
    ("Nahum", 3, "NAM"),
    ("Habacuc", 3, "HAB"),
    ("Sophonie", 3, "ZEP"),
    ("Aggée", 2, "HAG"),
    ("Zacharie", 14, "ZEC"),
    ("Malachie", 4, "MAL"),
    ("Matthieu", 28, "MAT"),
    ("Marc", 16, "MRK"),
    ("Luc", 24, "LUK"),
    ("Jean", 21, "JHN"),
    ("Actes", 28, "ACT"),
    ("Romains", 16, "ROM"),
    ("1 Corinthiens", 16, "1CO"),
    ("2 Corinthiens", 13, "2CO"),
    ("Galates", 6, "GAL"),
    ("Éphésiens", 6, "EPH"),
    ("Philippiens", 4, "PHP"),
    ("Colossiens", 4, "COL"),
    ("1 Thessaloniciens", 5, "1TH"),
    ("2 Thessaloniciens", 3, "2TH"),
    ("1 Timothée", 6, "1TI"),
    ("2 Timothée", 4, "2TI"),
    ("Tite", 3, "TIT"),
    ("Philémon", 1, "PHM"),
    ("Hébreux", 13, "HEB"),
    ("Jacques", 5, "JAS"),
    ("1 Pierre", 5, "1PE"),
    ("2 Pierre", 3, "2PE"),
    ("1 Jean", 5, "1JN"),
    ("2 Jean", 1, "2JN"),
    ("3 Jean", 1, "3JN"),
    ("Jude", 1, "JUD"),
    ("Apocalypse", 22, "REV"),
];

/// Length tiers the UI offers, in ascending order.
pub const LENGTH_TIERS: [u32; 3] = [500, 1500, 2500];

/// External reading site used for the passage deep link.
const READING_LINK_BASE: &str = "https://www.bible.com/bible/93";

pub fn book_names() -> impl Iterator<Item = &'static str> {
    BOOKS.iter().map(|(name, _, _)| *name)
}

pub fn chapter_count(book: &str) -> Option<u32> {
    BOOKS
        .iter()
        .find(|(name, _, _)| *name == book)
        .map(|(_, chapters, _)| *chapters)
}

pub fn osis_code(book: &str) -> Option<&'static str> {
    BOOKS
        .iter()
        .find(|(name, _, _)| *name == book)
        .map(|(_, _, osis)| *osis)
}

/// Snap a raw character-count request onto the nearest tier.
pub fn snap_target_chars(raw: u32) -> u32 {
    if raw <= LENGTH_TIERS[0] {
        LENGTH_TIERS[0]
    } else if raw <= LENGTH_TIERS[1] {
        LENGTH_TIERS[1]
    } else {
        LENGTH_TIERS[2]
    }
}

/// Build the deep link to the external reading site for a chapter.
pub fn reading_link(book: &str, chapter: u32) -> Option<String> {
    let osis = osis_code(book)?;
    Some(format!("{READING_LINK_BASE}/{osis}.{chapter}.LSG"))
}

/// Bible text version offered by the generation API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
pub enum BibleVersion {
    #[serde(rename = "LSG")]
    #[value(name = "LSG")]
    Lsg,
    #[serde(rename = "Darby")]
    #[value(name = "Darby")]
    Darby,
    #[serde(rename = "NEG")]
    #[value(name = "NEG")]
    Neg,
}

impl fmt::Display for BibleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BibleVersion::Lsg => "LSG",
            BibleVersion::Darby => "Darby",
            BibleVersion::Neg => "NEG",
        };
        f.write_str(label)
    }
}

/// A validated book/chapter[:verse] reference.
///
/// The API consumes the human-readable rendering (`Jean 3` or `Jean 3:16`),
/// so `Display` is the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub book: String,
    pub chapter: u32,
    pub verse: Option<u32>,
}

impl Passage {
    pub fn new(book: &str, chapter: u32, verse: Option<u32>) -> Result<Self> {
        let max = chapter_count(book)
            .ok_or_else(|| anyhow!("unknown book {book:?} (expected a canonical French name)"))?;
        if chapter == 0 || chapter > max {
            return Err(anyhow!(
                "chapter {chapter} out of range for {book} (1..={max})"
            ));
        }
        if verse == Some(0) {
            return Err(anyhow!("verse numbers start at 1"));
        }
        Ok(Passage {
            book: book.to_string(),
            chapter,
            verse,
        })
    }
}

impl fmt::Display for Passage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.verse {
            Some(verse) => write!(f, "{} {}:{}", self.book, self.chapter, verse),
            None => write!(f, "{} {}", self.book, self.chapter),
        }
    }
}
