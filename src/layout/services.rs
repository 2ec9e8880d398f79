//! The coordinate-based "DEMONSTRATIVO DE CÁLCULO DE SERVIÇOS" layout.
//!
//! Container terminal service statements: a report header block followed
//! by navy-ruled sections (storage, handling, scanner, ...), each holding
//! a bilingual column header pair and data rows addressed by fixed X
//! windows. Rows wrap freely, so every column is continuable.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Value};

use super::{ExtractionInput, Layout, Signature};
use crate::engine::{
    extract_row, merge_continuations, ContinuationGuard, FieldRule, MarkerSpec, PageBounds,
    RowSignature, SectionCarry, SectionScanner, TableScan,
};
use crate::error::Result;
use crate::model::{Color, Line, LineSet, Record};
use crate::normalize;

/// Layout identifier and exact title signature.
pub const SERVICES_TYPE: &str = "DEMONSTRATIVO DE CÁLCULO DE SERVIÇOS";

/// Navy color of the rules flagging section marker lines.
const NAVY: Color = Color(0.098, 0.098, 0.439);

/// Body bounds: page 1 carries the tall report header, later pages only
/// a slim one; the footer starts at 515 on every page.
const BOUNDS: PageBounds = PageBounds {
    first_page_top: 159.0,
    later_page_top: 67.5,
    footer: 515.0,
};

/// Section-title vocabulary. A navy rule whose line does not lead with
/// one of these is decorative.
const SECTION_TITLES: &[&str] = &[
    "Armazenagem",
    "Cadastro",
    "Handling",
    "Presenca",
    "Repasse",
    "Scanner",
];

const MARKER: MarkerSpec = MarkerSpec {
    color: NAVY,
    titles: SECTION_TITLES,
    title_span: (7.2, 400.0),
    quantity_span: Some((540.0, 700.0)),
    total_span: Some((700.0, 820.8)),
};

/// The sixteen named data columns with their X windows.
///
/// These bounds are versioned with this layout; other layouts carry
/// their own even where field names coincide.
pub const COLUMNS: &[(&str, FieldRule)] = &[
    ("Data Inicial (Start Time)", FieldRule::Column { x0: 7.2, x1: 40.6 }),
    ("Data Final (End Time)", FieldRule::Column { x0: 47.0, x1: 78.0 }),
    ("Container (Equipment ID)", FieldRule::Column { x0: 86.1, x1: 128.8 }),
    ("Categoria (Category)", FieldRule::Column { x0: 134.9, x1: 164.9 }),
    ("Armador (Line)", FieldRule::Column { x0: 169.4, x1: 194.4 }),
    ("Manifesto Carga BL / Booking", FieldRule::Column { x0: 199.5, x1: 250.0 }),
    ("Importador/Exportador (Consignee / Shipper)", FieldRule::Column { x0: 250.8, x1: 334.0 }),
    ("CNPJ / CPF (ID)", FieldRule::Column { x0: 335.0, x1: 390.0 }),
    ("DT / DTA", FieldRule::Column { x0: 392.0, x1: 439.0 }),
    ("GMCI / GRCI", FieldRule::Column { x0: 440.2, x1: 483.9 }),
    ("Doc", FieldRule::Column { x0: 491.0, x1: 532.0 }),
    ("Referência (Reference)", FieldRule::Column { x0: 540.5, x1: 575.5 }),
    ("DIAS (Days)", FieldRule::Column { x0: 579.9, x1: 598.3 }),
    ("Observacoes (Notes)", FieldRule::Column { x0: 600.0, x1: 750.0 }),
    ("Moeda (Currency)", FieldRule::Column { x0: 751.3, x1: 781.7 }),
    ("Valor (Unit Value)", FieldRule::Column { x0: 788.0, x1: 831.0 }),
];

/// New-record signature: tax ID, dated start and equipment code present.
const ROW_SIGNATURE: RowSignature = RowSignature {
    id_field: "CNPJ / CPF (ID)",
    id_min_len: 10,
    date_field: "Data Inicial (Start Time)",
    code_field: "Container (Equipment ID)",
    code_min_len: 5,
};

/// Column-header vocabulary, Portuguese and English caption rows.
const HEADER_VOCAB: &[&str] = &[
    "Data Inicial",
    "Data Final",
    "Container",
    "Categoria",
    "Armador",
    "Manifesto",
    "Importador",
    "Exportador",
    "Observacoes",
    "Start Time",
    "End Time",
    "Equipment",
    "Category",
    "Line",
    "Manifest",
    "Consignee",
    "Shipper",
    "Notes",
    "Quantity",
    "Total",
];

const SCAN: TableScan<'static> = TableScan {
    header_vocab: HEADER_VOCAB,
    header_exempt: &["AmountTotal"],
    terminators: &[],
};

/// The layout's registry entry.
pub const LAYOUT: Layout = Layout {
    id: SERVICES_TYPE,
    signature: Signature::Exact(SERVICES_TYPE),
    columns: COLUMNS,
    extract,
};

fn extract(input: &ExtractionInput<'_>) -> Result<Record> {
    let mut body = Record::new();
    body.set("header", extract_header(input.lines).into_value());
    body.as_map_mut()
        .insert("sections".to_string(), Value::Array(extract_sections(input)));
    Ok(body)
}

/// Pull the report header (client, vessel, berth, draft, gross value)
/// from page 1 text with delimiter patterns.
fn extract_header(lines: &LineSet) -> Record {
    static CLIENTE: OnceLock<Regex> = OnceLock::new();
    static CNPJ: OnceLock<Regex> = OnceLock::new();
    static NAVIO: OnceLock<Regex> = OnceLock::new();
    static ATRACAO: OnceLock<Regex> = OnceLock::new();
    static DRAFT: OnceLock<Regex> = OnceLock::new();
    static BRUTO: OnceLock<Regex> = OnceLock::new();

    let text = lines
        .page_lines(0)
        .iter()
        .map(Line::text)
        .collect::<Vec<_>>()
        .join("\n");

    let mut header = Record::new();

    let re = CLIENTE.get_or_init(|| Regex::new(r"(?s)CLIENTE:\s*(.*?)\s*NAVIO:").unwrap());
    if let Some(cap) = re.captures(&text) {
        header.set("Cliente (Customer)", cap[1].trim());
    }

    let re = CNPJ.get_or_init(|| Regex::new(r"CNPJ:\s*([\d./-]+)").unwrap());
    if let Some(cap) = re.captures(&text) {
        header.set("CNPJ (TAX_ID)", normalize::digits_only(&cap[1]));
    }

    let re = NAVIO.get_or_init(|| Regex::new(r"(?s)NAVIO:\s*(.*?)\s*DEMONSTRATIVO:").unwrap());
    if let Some(cap) = re.captures(&text) {
        header.set("Navio (Vessel)", cap[1].trim());
    }

    let re = ATRACAO.get_or_init(|| {
        Regex::new(r"(?s)ATRAÇÃO:\s*(.*?)\s*(?:DEMONSTRATIVO:|VALOR BRUTO:|\n|$)").unwrap()
    });
    let berth = re
        .captures(&text)
        .map(|cap| cap[1].trim().to_string())
        .filter(|v| !v.is_empty());
    header.set(
        "Atração (BERTH_ATA)",
        berth.map(Value::from).unwrap_or(Value::Null),
    );

    let re = DRAFT.get_or_init(|| Regex::new(r"DEMONSTRATIVO:\s*(\d+)").unwrap());
    if let Some(cap) = re.captures(&text) {
        header.set("Demonstrativo (Draft)", &cap[1]);
    }

    let re = BRUTO.get_or_init(|| Regex::new(r"VALOR BRUTO R\$:\s*\(BRL\)\s*([\d.,]+)").unwrap());
    if let Some(cap) = re.captures(&text) {
        header.set(
            "Valor Bruto",
            normalize::parse_number(&cap[1])
                .map(Value::from)
                .unwrap_or(Value::Null),
        );
    }

    header.set("Moeda", "BRL");
    header
}

/// Scan every page for navy-ruled sections and parse their row runs.
///
/// A table that runs past a page break resumes through the explicit
/// carry-over state: rows found above a page's first marker are appended
/// to the still-open section from the previous page.
fn extract_sections(input: &ExtractionInput<'_>) -> Vec<Value> {
    let scanner = SectionScanner::new(&MARKER, BOUNDS);
    let mut sections: Vec<Value> = Vec::new();
    let mut carry = SectionCarry::default();

    for (page, content) in input.pages.iter().enumerate() {
        let markers = scanner.scan_page(input.lines, page, &content.shapes);
        let page_lines = input.lines.page_lines(page);
        let page_start = input.lines.page_start(page);

        // Continuation of a section left open by the previous page.
        if carry.in_section && !sections.is_empty() {
            let scope_end = markers.first().map(|m| m.y).unwrap_or(BOUNDS.footer);
            let scope = clip_scope(page_lines, page, 0, scope_end);
            let rows = scan_rows(scope, None);
            if !rows.is_empty() {
                if let Some(Value::Object(section)) = sections.last_mut() {
                    if let Some(Value::Array(fields)) = section.get_mut("fields") {
                        log::debug!(
                            "appending {} carried rows to open section on page {page}",
                            rows.len()
                        );
                        fields.extend(rows);
                    }
                }
            }
        }

        for (idx, marker) in markers.iter().enumerate() {
            let scope_end = scanner.scope_end(&markers, idx);
            let body_offset = marker.line_index - page_start + 1;
            let scope = clip_scope(page_lines, page, body_offset, scope_end);
            let next_marker_y = markers.get(idx + 1).map(|m| m.y);
            let rows = scan_rows(scope, next_marker_y);

            if rows.is_empty() {
                continue;
            }
            sections.push(json!({
                "Quantidade (Quantity)": marker.declared_quantity,
                "Title": marker.title,
                "Total": marker.declared_total,
                "fields": rows,
            }));
        }

        if !markers.is_empty() {
            // The page's last section always runs to the footer.
            carry.in_section = true;
        }
    }

    sections
}

/// Restrict a page's lines to a section scope: inside the body bounds
/// and above the closing Y.
///
/// Leading lines above the page's body top are skipped, not treated as
/// the scope end: later pages carry a slim report header above the body,
/// and a carried-over scope starts at the very top of the page.
fn clip_scope(page_lines: &[Line], page: usize, from: usize, scope_end: f32) -> &[Line] {
    let lines = &page_lines[from.min(page_lines.len())..];
    let body_top = BOUNDS.body_top(page);
    let start = lines
        .iter()
        .position(|l| l.y > body_top)
        .unwrap_or(lines.len());
    let lines = &lines[start..];
    let end = lines
        .iter()
        .position(|l| l.y >= scope_end.min(BOUNDS.footer))
        .unwrap_or(lines.len());
    &lines[..end]
}

/// Run the table FSM over one section scope, committing valid rows with
/// their continuations merged.
fn scan_rows(scope: &[Line], next_marker_y: Option<f32>) -> Vec<Value> {
    let guard = ContinuationGuard {
        signature: &ROW_SIGNATURE,
        is_header: &|text| SCAN.is_header_line(text),
        next_marker_y,
        footer_y: BOUNDS.footer,
    };

    let (rows, _state) = SCAN.run(scope, |lines, i| {
        let mut row = extract_row(&lines[i], COLUMNS);
        if !ROW_SIGNATURE.is_complete(&row) {
            return None;
        }
        let next = merge_continuations(&mut row, COLUMNS, lines, i + 1, &guard);
        finalize_row(&mut row);
        Some((row, next - i))
    });

    rows.into_iter().map(Record::into_value).collect()
}

/// Trim every cell; blank cells become null.
fn finalize_row(row: &mut Record) {
    for (_, value) in row.as_map_mut() {
        if let Value::String(s) = value {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                *value = Value::Null;
            } else if trimmed.len() != s.len() {
                *value = Value::String(trimmed.to_string());
            }
        }
    }
}
