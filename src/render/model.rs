/// A raw generation document split into its display units.
pub struct ParsedDocument {
    /// Free text before the first verse marker, trimmed. May be empty.
    pub introduction: String,
    /// Verse blocks in document order. Never re-sorted or de-duplicated.
    pub verses: Vec<VerseBlock>,
}

pub struct VerseBlock {
    pub number: u32,
    /// Trimmed biblical text, or the whole trimmed body when the producer
    /// omitted the biblical label. Empty for an empty verse body.
    pub biblical_text: String,
    /// Trimmed theological explanation; `None` when absent or empty.
    pub explanation: Option<String>,
}
