use std::cell::Cell;
use std::collections::{HashMap, HashSet};

use super::{FontSpanSource, PageSource, TextBlock, TextLine, TextSpan};
use crate::error::{AuditError, AuditResult};

#[derive(Debug, Default)]
pub struct MemoryDocument {
    pages: Vec<String>,
    blocks: HashMap<usize, Vec<TextBlock>>,
    broken_pages: HashSet<usize>,
    reads: Cell<usize>,
}

impl MemoryDocument {
    pub fn new<S: Into<String>>(pages: impl IntoIterator<Item = S>) -> Self {
        Self {
            pages: pages.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn blank(page_count: usize) -> Self {
        Self::new(vec![String::new(); page_count])
    }

    pub fn with_page(mut self, index: usize, text: impl Into<String>) -> Self {
        if index >= self.pages.len() {
            self.pages.resize(index + 1, String::new());
        }
        self.pages[index] = text.into();
        self
    }

    pub fn with_spans(mut self, index: usize, spans: Vec<(&str, f64, &str)>) -> Self {
        let lines = spans
            .into_iter()
            .map(|(font, size, text)| TextLine {
                spans: vec![TextSpan {
                    font: font.to_string(),
                    size,
                    color: 0,
                    text: text.to_string(),
                }],
            })
            .collect();
        self.blocks.insert(index, vec![TextBlock { lines }]);
        self
    }

    pub fn with_broken_page(mut self, index: usize) -> Self {
        self.broken_pages.insert(index);
        self
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }
}

impl PageSource for MemoryDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> AuditResult<String> {
        self.reads.set(self.reads.get() + 1);
        if self.broken_pages.contains(&index) {
            return Err(AuditError::PageExtraction {
                page: index,
                reason: "simulated broken page".to_string(),
            });
        }
        self.pages
            .get(index)
            .cloned()
            .ok_or_else(|| AuditError::PageExtraction {
                page: index,
                reason: format!("page out of range (document has {})", self.pages.len()),
            })
    }
}

impl FontSpanSource for MemoryDocument {
    fn page_blocks(&self, index: usize) -> AuditResult<Vec<TextBlock>> {
        Ok(self.blocks.get(&index).cloned().unwrap_or_default())
    }
}
