use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::document::{PageSource, lowercase_page};
use crate::error::AuditResult;
use crate::model::PageRange;

const MAX_REFERENCE_INDEX: u32 = 200;
const FEW_BRACKET_REFERENCES: usize = 10;
const MANY_PARENTHETICAL_REFERENCES: usize = 20;
const MANY_ET_AL_REFERENCES: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReferenceStyle {
    pub bracket_count: usize,
    pub et_al_count: usize,
    pub parenthetical_count: usize,
}

impl ReferenceStyle {
    /// Few `[n]` citations but many `(n)` ones: the author likely used
    /// parentheses for numbered references.
    pub fn suggests_parenthetical_style(&self) -> bool {
        self.bracket_count < FEW_BRACKET_REFERENCES
            && self.parenthetical_count > MANY_PARENTHETICAL_REFERENCES
    }

    pub fn uses_et_al_style(&self) -> bool {
        self.et_al_count > MANY_ET_AL_REFERENCES
    }
}

pub struct ReferenceStyleClassifier {
    parenthetical: Regex,
    et_al: Regex,
}

impl ReferenceStyleClassifier {
    pub fn new() -> Result<Self> {
        Ok(Self {
            parenthetical: Regex::new(r"\(([^)]+)")
                .context("failed to compile parenthetical regex")?,
            et_al: Regex::new(r"\bet al\b").context("failed to compile et al regex")?,
        })
    }

    pub fn classify(
        &self,
        doc: &(impl PageSource + ?Sized),
        narrative: Option<PageRange>,
    ) -> AuditResult<ReferenceStyle> {
        let mut text = String::new();
        if let Some(range) = narrative.and_then(|range| range.clamp_to(doc.page_count())) {
            for page in range.pages() {
                text.push(' ');
                text.push_str(&lowercase_page(doc, page)?);
            }
        }

        Ok(self.classify_text(&text))
    }

    pub fn classify_text(&self, text: &str) -> ReferenceStyle {
        ReferenceStyle {
            bracket_count: count_numeric_brackets(text),
            et_al_count: self.et_al.find_iter(text).count(),
            parenthetical_count: self.count_numeric_parentheticals(text),
        }
    }

    fn count_numeric_parentheticals(&self, text: &str) -> usize {
        self.parenthetical
            .captures_iter(text)
            .filter_map(|captures| captures.get(1))
            .map(|inner| inner.as_str())
            .filter(|inner| inner.chars().all(char::is_numeric))
            .filter(|inner| match inner.parse::<u32>() {
                Ok(value) => value < MAX_REFERENCE_INDEX,
                Err(error) => {
                    debug!(token = %inner, error = %error, "skipping non-integer parenthetical");
                    false
                }
            })
            .count()
    }
}

fn count_numeric_brackets(text: &str) -> usize {
    let mut previous: Option<char> = None;
    let mut count = 0;
    for character in text.chars() {
        if character == ']' && previous.is_some_and(char::is_numeric) {
            count += 1;
        }
        previous = Some(character);
    }
    count
}
