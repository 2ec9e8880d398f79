//! Logical text lines assembled from positioned tokens.

use super::token::Token;

/// Horizontal gap (in page units) above which a space is inserted between
/// adjacent tokens when concatenating line text.
const SPACE_GAP: f32 = 1.0;

/// Tokens of one page sharing a Y coordinate, ordered left-to-right.
///
/// Lines are built once by the assembler and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Line {
    /// Page index this line belongs to
    pub page: usize,
    /// Representative top coordinate (rounded grouping key)
    pub y: f32,
    /// Tokens sorted by `x0`
    pub tokens: Vec<Token>,
}

impl Line {
    /// Concatenated text of the whole line.
    ///
    /// A single space is inserted wherever the horizontal gap between two
    /// tokens exceeds [`SPACE_GAP`]; character-level extractors that emit
    /// adjacent glyphs concatenate seamlessly.
    pub fn text(&self) -> String {
        join_tokens(self.tokens.iter())
    }

    /// Concatenated text of the tokens whose left edge lies in `[x0, x1]`.
    ///
    /// This is the column-strategy primitive: token membership is decided
    /// by `x0` alone, so disjoint column ranges never double-count a token.
    pub fn text_in_span(&self, x0: f32, x1: f32) -> String {
        join_tokens(self.tokens.iter().filter(|t| t.x0 >= x0 && t.x0 <= x1))
    }

    /// Whether the line has no printable text.
    pub fn is_blank(&self) -> bool {
        self.tokens.iter().all(|t| t.text.trim().is_empty())
    }
}

fn join_tokens<'a>(tokens: impl Iterator<Item = &'a Token>) -> String {
    let mut out = String::new();
    let mut prev_x1: Option<f32> = None;
    for token in tokens {
        if let Some(x1) = prev_x1 {
            let gap = token.x0 - x1;
            if gap > SPACE_GAP && !out.ends_with(' ') && !token.text.starts_with(' ') {
                out.push(' ');
            }
        }
        out.push_str(&token.text);
        prev_x1 = Some(token.x1);
    }
    out.trim().to_string()
}

/// The assembled lines of a whole document.
///
/// Exposes both a flat ordered list (for fixed-line-number lookups) and a
/// per-page view (for marker and boundary search).
#[derive(Debug, Clone, Default)]
pub struct LineSet {
    lines: Vec<Line>,
    /// `page_spans[p]` is the half-open range of `lines` on page `p`
    page_spans: Vec<(usize, usize)>,
}

impl LineSet {
    /// Build a line set from lines already sorted by `(page, y)`.
    pub fn new(lines: Vec<Line>) -> Self {
        let page_count = lines.last().map(|l| l.page + 1).unwrap_or(0);
        let mut page_spans = vec![(0, 0); page_count];
        let mut start = 0;
        for page in 0..page_count {
            let end = lines[start..]
                .iter()
                .position(|l| l.page != page)
                .map(|off| start + off)
                .unwrap_or(lines.len());
            page_spans[page] = (start, end);
            start = end;
        }
        Self { lines, page_spans }
    }

    /// All lines in document order.
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Line at a flat index, if any.
    pub fn get(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    /// The lines of one page, in top-to-bottom order.
    pub fn page_lines(&self, page: usize) -> &[Line] {
        match self.page_spans.get(page) {
            Some(&(start, end)) => &self.lines[start..end],
            None => &[],
        }
    }

    /// Flat index of the first line of a page.
    pub fn page_start(&self, page: usize) -> usize {
        self.page_spans
            .get(page)
            .map(|&(start, _)| start)
            .unwrap_or(self.lines.len())
    }

    /// Number of pages covered.
    pub fn page_count(&self) -> usize {
        self.page_spans.len()
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the set holds no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Text of every non-blank line, in order.
    ///
    /// Matches the text-dump view the line-number layouts are written
    /// against: blank lines do not consume a line number.
    pub fn texts(&self) -> Vec<String> {
        self.lines
            .iter()
            .filter(|l| !l.is_blank())
            .map(|l| l.text())
            .collect()
    }

    /// The first non-blank line of the document, if any.
    pub fn first_non_blank(&self) -> Option<&Line> {
        self.lines.iter().find(|l| !l.is_blank())
    }
}
