#[cfg(test)]
mod memory;
mod poppler;

#[cfg(test)]
pub use memory::MemoryDocument;
pub use poppler::PopplerDocument;

use crate::error::AuditResult;

/// Per-page text of an opened document.
pub trait PageSource {
    fn page_count(&self) -> usize;

    /// Text of one page. Invalid UTF-8 has already been replaced, so an error
    /// here means the page itself could not be extracted.
    fn page_text(&self, index: usize) -> AuditResult<String>;
}

/// Per-page font spans, grouped the way layout extractors report them.
pub trait FontSpanSource {
    fn page_blocks(&self, index: usize) -> AuditResult<Vec<TextBlock>>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<TextLine>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLine {
    pub spans: Vec<TextSpan>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub font: String,
    pub size: f64,
    pub color: u32,
    pub text: String,
}

pub fn lowercase_page(doc: &(impl PageSource + ?Sized), index: usize) -> AuditResult<String> {
    doc.page_text(index).map(|text| text.to_lowercase())
}
