//! Grouping raw positioned tokens into logical text lines.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::model::{Line, LineSet, PageContent, Token};

/// Groups a page's tokens into lines by rounded top coordinate.
///
/// The grouping quantum is deliberately small (0.1 units by default):
/// sub-pixel font metrics must not split an intended single line, but
/// distinct physical lines are never closer than that.
#[derive(Debug, Clone)]
pub struct LineAssembler {
    /// Y quantum used to bucket tokens into lines
    pub y_tolerance: f32,
}

impl Default for LineAssembler {
    fn default() -> Self {
        Self { y_tolerance: 0.1 }
    }
}

impl LineAssembler {
    /// Create an assembler with the default tolerance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an assembler with a custom Y quantum.
    pub fn with_tolerance(y_tolerance: f32) -> Self {
        Self { y_tolerance }
    }

    /// Assemble all pages, processing pages in parallel.
    ///
    /// Page order is preserved in the output; only the per-page grouping
    /// runs concurrently, since line assembly has no cross-page
    /// dependency. Everything downstream of this step is sequential.
    pub fn assemble(&self, pages: &[PageContent]) -> LineSet {
        let per_page: Vec<Vec<Line>> = pages
            .par_iter()
            .enumerate()
            .map(|(index, page)| self.assemble_page(index, page))
            .collect();
        LineSet::new(per_page.into_iter().flatten().collect())
    }

    /// Assemble all pages on the calling thread.
    pub fn assemble_sequential(&self, pages: &[PageContent]) -> LineSet {
        let lines = pages
            .iter()
            .enumerate()
            .flat_map(|(index, page)| self.assemble_page(index, page))
            .collect();
        LineSet::new(lines)
    }

    /// Group one page's tokens into top-to-bottom ordered lines.
    ///
    /// Every token lands in exactly one line: the bucket key is a pure
    /// function of the token's top coordinate.
    fn assemble_page(&self, page_index: usize, page: &PageContent) -> Vec<Line> {
        let mut buckets: BTreeMap<i64, Vec<Token>> = BTreeMap::new();
        for token in &page.tokens {
            let key = (token.top / self.y_tolerance).round() as i64;
            buckets.entry(key).or_default().push(token.clone());
        }

        buckets
            .into_iter()
            .map(|(key, mut tokens)| {
                tokens.sort_by(|a, b| a.x0.partial_cmp(&b.x0).unwrap_or(std::cmp::Ordering::Equal));
                Line {
                    page: page_index,
                    y: key as f32 * self.y_tolerance,
                    tokens,
                }
            })
            .collect()
    }
}
