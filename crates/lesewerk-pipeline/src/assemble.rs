// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Result assembly: turns completion-ordered page results back into one
// document-ordered text.

use lesewerk_core::error::{LesewerkError, PageError, Result};
use lesewerk_core::types::PageResult;

/// Collects exactly one result per page and joins them in page order.
#[derive(Debug)]
pub struct ResultAssembler {
    slots: Vec<Option<PageResult>>,
    recorded: usize,
    separator: String,
}

impl ResultAssembler {
    pub fn new(page_count: usize, separator: impl Into<String>) -> Self {
        Self {
            slots: vec![None; page_count],
            recorded: 0,
            separator: separator.into(),
        }
    }

    /// Store a result in its page slot.
    ///
    /// A second result for the same page is a pipeline fault, not a page
    /// failure, and is rejected.
    pub fn record(&mut self, result: PageResult) -> Result<()> {
        let page_count = self.slots.len();
        let page_index = result.page_index;
        let slot = self.slots.get_mut(page_index).ok_or_else(|| {
            LesewerkError::WorkerPool(format!(
                "result for page {page_index} outside a {page_count}-page document"
            ))
        })?;
        if slot.is_some() {
            return Err(LesewerkError::DuplicateResult { page_index });
        }
        *slot = Some(result);
        self.recorded += 1;
        Ok(())
    }

    pub fn page_count(&self) -> usize {
        self.slots.len()
    }

    pub fn recorded(&self) -> usize {
        self.recorded
    }

    pub fn is_complete(&self) -> bool {
        self.recorded == self.slots.len()
    }

    /// Pages still waiting for a result, ascending.
    pub fn missing(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(index, _)| index)
            .collect()
    }

    /// Errors of failed pages, in page order.
    pub fn failures(&self) -> Vec<PageError> {
        self.slots
            .iter()
            .flatten()
            .filter_map(|result| result.error().cloned())
            .collect()
    }

    pub fn succeeded(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|result| result.succeeded())
            .count()
    }

    /// Join every page's text in page order.
    ///
    /// Failed pages contribute an empty segment so the separator count
    /// still matches the page count. Fails if any page has no result.
    pub fn finalize(&self) -> Result<String> {
        if !self.is_complete() {
            return Err(LesewerkError::IncompleteResults {
                missing: self.missing(),
                total: self.slots.len(),
            });
        }
        let segments: Vec<&str> = self
            .slots
            .iter()
            .flatten()
            .map(PageResult::text)
            .collect();
        Ok(segments.join(&self.separator))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn ok(index: usize, text: &str) -> PageResult {
        PageResult::recognized(index, text.to_string(), Duration::from_millis(5))
    }

    fn render_failure(index: usize) -> PageResult {
        PageResult::failed(
            PageError::Render {
                page_index: index,
                reason: "no raster".into(),
            },
            Duration::ZERO,
        )
    }

    #[test]
    fn restores_page_order() {
        let mut assembler = ResultAssembler::new(3, "\n\n");
        assembler.record(ok(2, "three")).unwrap();
        assembler.record(ok(0, "one")).unwrap();
        assembler.record(ok(1, "two")).unwrap();
        assert_eq!(assembler.finalize().unwrap(), "one\n\ntwo\n\nthree");
    }

    #[test]
    fn failed_pages_leave_empty_segments() {
        let mut assembler = ResultAssembler::new(4, "\n\n");
        for result in [ok(3, "d"), render_failure(2), ok(0, "a"), ok(1, "b")] {
            assembler.record(result).unwrap();
        }
        let text = assembler.finalize().unwrap();
        assert_eq!(text, "a\n\nb\n\n\n\nd");
        assert_eq!(text.split("\n\n").count(), 4);
        assert_eq!(assembler.succeeded(), 3);
        assert_eq!(assembler.failures().len(), 1);
        assert_eq!(assembler.failures()[0].page_index(), 2);
    }

    #[test]
    fn rejects_duplicates() {
        let mut assembler = ResultAssembler::new(2, "\n\n");
        assembler.record(ok(1, "x")).unwrap();
        let err = assembler.record(ok(1, "y")).unwrap_err();
        assert!(matches!(err, LesewerkError::DuplicateResult { page_index: 1 }));
        assert_eq!(assembler.recorded(), 1);
    }

    #[test]
    fn rejects_out_of_range_pages() {
        let mut assembler = ResultAssembler::new(2, "\n\n");
        assert!(matches!(
            assembler.record(ok(2, "x")),
            Err(LesewerkError::WorkerPool(_))
        ));
    }

    #[test]
    fn refuses_to_finalize_with_gaps() {
        let mut assembler = ResultAssembler::new(3, "\n\n");
        assembler.record(ok(1, "x")).unwrap();
        match assembler.finalize() {
            Err(LesewerkError::IncompleteResults { missing, total }) => {
                assert_eq!(missing, vec![0, 2]);
                assert_eq!(total, 3);
            }
            other => panic!("expected IncompleteResults, got {other:?}"),
        }
    }

    #[test]
    fn empty_document_assembles_to_empty_text() {
        let assembler = ResultAssembler::new(0, "\n\n");
        assert!(assembler.is_complete());
        assert_eq!(assembler.finalize().unwrap(), "");
    }

    #[test]
    fn custom_separator() {
        let mut assembler = ResultAssembler::new(2, "\x0c");
        assembler.record(ok(0, "a")).unwrap();
        assembler.record(ok(1, "b")).unwrap();
        assert_eq!(assembler.finalize().unwrap(), "a\x0cb");
    }
}
