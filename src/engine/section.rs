//! Section marker detection from colored rules and title vocabulary.
//!
//! A line opens a section only when both conditions hold: a drawn rule or
//! rectangle of the designated color sits at the line's Y, and the line's
//! leading text matches the layout's section-title vocabulary. A colored
//! rule without a recognized title is decorative and ignored.

use std::sync::OnceLock;

use regex::Regex;

use crate::model::{Color, DrawnShape, LineSet};
use crate::normalize;

/// Y tolerance when matching a drawn rule to a text line.
pub const RULE_Y_TOLERANCE: f32 = 5.0;

/// Vertical body bounds of a page.
///
/// The first page carries a taller report header than the following
/// pages; below the footer threshold nothing belongs to any section.
#[derive(Debug, Clone, Copy)]
pub struct PageBounds {
    /// Body starts below this Y on page 0
    pub first_page_top: f32,
    /// Body starts below this Y on pages 1..
    pub later_page_top: f32,
    /// Body ends at this Y on every page
    pub footer: f32,
}

impl PageBounds {
    /// The Y above which a given page's body begins.
    pub fn body_top(&self, page: usize) -> f32 {
        if page == 0 {
            self.first_page_top
        } else {
            self.later_page_top
        }
    }

    /// Whether a Y coordinate lies inside the page's body.
    pub fn in_body(&self, page: usize, y: f32) -> bool {
        y > self.body_top(page) && y < self.footer
    }
}

/// Static description of what a section marker looks like in one layout.
#[derive(Debug, Clone, Copy)]
pub struct MarkerSpec {
    /// Color of the drawn rule flagging a marker line
    pub color: Color,
    /// Section-title vocabulary; the title text must contain one of these
    pub titles: &'static [&'static str],
    /// X window holding the title text on the marker line
    pub title_span: (f32, f32),
    /// X window holding the declared item quantity, if the layout prints one
    pub quantity_span: Option<(f32, f32)>,
    /// X window holding the declared section total, if the layout prints one
    pub total_span: Option<(f32, f32)>,
}

/// A line identified as opening a named section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionMarker {
    /// Title text taken from the marker line
    pub title: String,
    /// Flat line index into the document's [`LineSet`]
    pub line_index: usize,
    /// Page the marker appears on
    pub page: usize,
    /// Y coordinate of the marker line
    pub y: f32,
    /// Item count declared on the marker line itself
    pub declared_quantity: Option<i64>,
    /// Total declared on the marker line itself
    pub declared_total: Option<f64>,
}

/// Explicit cross-page scan state.
///
/// A table that begins on one page and continues past a page break is
/// handled by the caller re-invoking the body scan with this flag carried
/// over; the detector never signals the condition as an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionCarry {
    /// Still inside the previous page's open section
    pub in_section: bool,
}

/// Whether a drawn shape of the given color sits at this Y.
pub fn has_marked_rule(y: f32, shapes: &[DrawnShape], color: &Color) -> bool {
    shapes
        .iter()
        .any(|shape| (shape.top - y).abs() < RULE_Y_TOLERANCE && shape.has_color(color))
}

/// Scans pages for section markers under one layout's marker spec.
#[derive(Debug, Clone, Copy)]
pub struct SectionScanner<'a> {
    /// What a marker looks like
    pub spec: &'a MarkerSpec,
    /// Body bounds constraining the scan
    pub bounds: PageBounds,
}

impl<'a> SectionScanner<'a> {
    /// Create a scanner.
    pub fn new(spec: &'a MarkerSpec, bounds: PageBounds) -> Self {
        Self { spec, bounds }
    }

    /// Scan one page, producing markers in appearance order.
    pub fn scan_page(
        &self,
        lines: &LineSet,
        page: usize,
        shapes: &[DrawnShape],
    ) -> Vec<SectionMarker> {
        let mut markers = Vec::new();
        let page_start = lines.page_start(page);

        for (offset, line) in lines.page_lines(page).iter().enumerate() {
            if !self.bounds.in_body(page, line.y) {
                continue;
            }
            if !has_marked_rule(line.y, shapes, &self.spec.color) {
                continue;
            }

            let (tx0, tx1) = self.spec.title_span;
            let title = line.text_in_span(tx0, tx1);
            if title.is_empty() || !self.spec.titles.iter().any(|t| title.contains(t)) {
                log::debug!("colored rule at y={} without section title, skipping", line.y);
                continue;
            }

            let declared_quantity = self
                .spec
                .quantity_span
                .and_then(|(x0, x1)| first_integer(&line.text_in_span(x0, x1)));
            let declared_total = self
                .spec
                .total_span
                .and_then(|(x0, x1)| first_amount(&line.text_in_span(x0, x1)));

            log::debug!("section marker {:?} at page {} y={}", title, page, line.y);
            markers.push(SectionMarker {
                title,
                line_index: page_start + offset,
                page,
                y: line.y,
                declared_quantity,
                declared_total,
            });
        }
        markers
    }

    /// Closing Y boundary of a marker's scope on its page.
    ///
    /// The next marker's Y on the same page, or the footer threshold,
    /// whichever comes first; the page end is implied by the footer.
    pub fn scope_end(&self, markers: &[SectionMarker], index: usize) -> f32 {
        markers
            .get(index + 1)
            .filter(|next| next.page == markers[index].page)
            .map(|next| next.y)
            .unwrap_or(self.bounds.footer)
    }
}

fn first_integer(text: &str) -> Option<i64> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\d+").unwrap());
    re.find(text)?.as_str().parse().ok()
}

fn first_amount(text: &str) -> Option<f64> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"[\d.,]+").unwrap());
    normalize::parse_number(re.find(text)?.as_str())
}
