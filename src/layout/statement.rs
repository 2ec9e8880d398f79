//! The line-number based "DEMONSTRATIVO DE CÁLCULO" layout.
//!
//! Warehouse cost statements with a fixed page skeleton: header,
//! beneficiary, customs-broker, client and billing blocks sit on known
//! line numbers and are addressed by delimiter rules; two dynamic tables
//! (storage periods and operations/services) follow, then a lot
//! information block located by text patterns rather than line numbers.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{json, Value};

use super::{ExtractionInput, Layout, Signature};
use crate::engine::{apply_to_text, FieldRule, TableScan};
use crate::error::Result;
use crate::model::{Record, TableResult};
use crate::normalize;

/// Layout identifier and substring title signature.
pub const STATEMENT_TYPE: &str = "DEMONSTRATIVO DE CÁLCULO";

/// Delimiter rules grouped by 1-based line number in the text dump.
///
/// Line numbers count non-blank lines only, matching the dump the rules
/// were calibrated against.
const FIELD_MAP: &[(usize, &[(&str, FieldRule)])] = &[
    (
        2,
        &[
            ("header.capa", FieldRule::Delimiter { start: "CAPA:", end: Some("DEMONSTRATIVO:") }),
            ("header.demonstrativo", FieldRule::Delimiter { start: "DEMONSTRATIVO:", end: Some("NOTA FISCAL:") }),
            ("header.nota_fiscal", FieldRule::Delimiter { start: "NOTA FISCAL:", end: None }),
        ],
    ),
    (3, &[("header.regime", FieldRule::Delimiter { start: "Regime:", end: None })]),
    (4, &[("header.tarifa 01", FieldRule::Delimiter { start: "Tarifa 01:", end: None })]),
    (5, &[("header.opcao_tarifa", FieldRule::Delimiter { start: "Opção tarifa:", end: None })]),
    (
        7,
        &[
            ("beneficiario.codigo", FieldRule::Delimiter { start: "Código:", end: Some("Nome:") }),
            ("beneficiario.nome", FieldRule::Delimiter { start: "Nome:", end: Some("CNPJ/CPF:") }),
            ("beneficiario.cnpj_cpf", FieldRule::Delimiter { start: "CNPJ/CPF:", end: None }),
        ],
    ),
    (
        9,
        &[
            ("comissaria.codigo", FieldRule::Delimiter { start: "Código:", end: Some("Nome:") }),
            ("comissaria.nome", FieldRule::Delimiter { start: "Nome:", end: Some("CNPJ/CPF:") }),
            ("comissaria.cnpj_cpf", FieldRule::Delimiter { start: "CNPJ/CPF:", end: None }),
        ],
    ),
    (
        11,
        &[
            ("cliente.codigo", FieldRule::Delimiter { start: "Código:", end: Some("Nome:") }),
            ("cliente.nome", FieldRule::Delimiter { start: "Nome:", end: None }),
        ],
    ),
    (12, &[("cliente.endereco", FieldRule::Delimiter { start: "Endereço:", end: None })]),
    (
        13,
        &[
            ("cliente.bairro", FieldRule::Delimiter { start: "Bairro:", end: Some("Cidade:") }),
            ("cliente.cidade", FieldRule::Delimiter { start: "Cidade:", end: Some("Estado:") }),
            ("cliente.estado", FieldRule::Delimiter { start: "Estado:", end: Some("CEP:") }),
            ("cliente.cep", FieldRule::Delimiter { start: "CEP:", end: None }),
        ],
    ),
    (
        14,
        &[
            ("cliente.cnpj_cpf", FieldRule::Delimiter { start: "CNPJ/CPF:", end: Some("IE:") }),
            ("cliente.ie", FieldRule::Delimiter { start: "IE:", end: None }),
        ],
    ),
    (
        16,
        &[
            ("faturar para.codigo", FieldRule::Delimiter { start: "Código:", end: Some("Nome:") }),
            ("faturar para.nome", FieldRule::Delimiter { start: "Nome:", end: None }),
        ],
    ),
    (17, &[("faturar para.endereco", FieldRule::Delimiter { start: "Endereço:", end: None })]),
    (
        18,
        &[
            ("faturar para.bairro", FieldRule::Delimiter { start: "Bairro:", end: Some("Cidade:") }),
            ("faturar para.cidade", FieldRule::Delimiter { start: "Cidade:", end: Some("Estado:") }),
            ("faturar para.estado", FieldRule::Delimiter { start: "Estado:", end: Some("CEP:") }),
            ("faturar para.cep", FieldRule::Delimiter { start: "CEP:", end: None }),
        ],
    ),
    (
        19,
        &[
            ("faturar para.cnpj_cpf", FieldRule::Delimiter { start: "CNPJ/CPF:", end: Some("IE:") }),
            ("faturar para.ie", FieldRule::Delimiter { start: "IE:", end: None }),
        ],
    ),
    (
        21,
        &[
            ("tarifas aplicadas.moeda", FieldRule::Delimiter { start: "Moeda:", end: Some("Data/Cotação:") }),
            ("tarifas aplicadas.cotacao", FieldRule::Delimiter { start: "Data/Cotação:", end: Some("Valor:") }),
            ("tarifas aplicadas.valor_cotacao", FieldRule::Delimiter { start: "Valor:", end: None }),
        ],
    ),
];

const ARMAZENAGEM_SCAN: TableScan<'static> = TableScan {
    header_vocab: &["Período"],
    header_exempt: &[],
    terminators: &["Total de Armazenagem", "O P E R A Ç Ã O"],
};

const OPERACAO_SCAN: TableScan<'static> = TableScan {
    header_vocab: &["Descrição"],
    header_exempt: &[],
    terminators: &["Total Operação", "Total Geral", "O B S E R V A Ç"],
};

/// The layout's registry entry. Delimiter-only, so no column rules to
/// validate.
pub const LAYOUT: Layout = Layout {
    id: STATEMENT_TYPE,
    signature: Signature::Contains(STATEMENT_TYPE),
    columns: &[],
    extract,
};

fn extract(input: &ExtractionInput<'_>) -> Result<Record> {
    let texts = input.lines.texts();
    let mut result = Record::new();
    init_sections(&mut result);

    for (line_num, rules) in FIELD_MAP {
        let Some(text) = texts.get(line_num - 1) else {
            continue;
        };
        for (path, rule) in *rules {
            if let Some(value) = apply_to_text(text, rule) {
                if !value.is_empty() {
                    result.set(path, value);
                }
            }
        }
    }

    let armazenagem = parse_armazenagem(&texts);
    let operacao = parse_operacao(&texts);
    let total_geral = normalize::round2(armazenagem.total + operacao.total);

    let lote = lot_information(&texts, armazenagem.row_count());

    result.set(
        "armazenagem",
        json!({
            "fields": armazenagem.fields,
            "total_armazenagem_periodos": armazenagem.total,
        }),
    );
    result.set(
        "operacao_servicos",
        json!({
            "fields": operacao.fields,
            "total_operacao_servicos": operacao.total,
            "total_geral": total_geral,
        }),
    );
    result.set("informacoes do lote", lote.into_value());
    result.set("faturar para.im", Value::Null);

    normalize::clean_record(&mut result);
    Ok(result)
}

fn init_sections(result: &mut Record) {
    for section in [
        "header",
        "beneficiario",
        "comissaria",
        "cliente",
        "faturar para",
        "tarifas aplicadas",
    ] {
        result.set(section, json!({}));
    }
    result.set("observacoes", "");
}

/// Parse the storage-periods table.
///
/// Rows carry eight whitespace-separated cells; the eighth is the period
/// total accumulated into `total_armazenagem_periodos`.
fn parse_armazenagem(texts: &[String]) -> TableResult {
    let Some(start) = texts
        .iter()
        .position(|t| t.contains("A R M A Z E N A G E M") || (t.contains("ARMAZENAGEM") && t.contains("PERÍODOS")))
    else {
        return TableResult::default();
    };

    let (rows, _state) = ARMAZENAGEM_SCAN.run_texts(&texts[start + 1..], |text| {
        let parts: Vec<&str> = text.split_whitespace().collect();
        if parts.len() < 8 {
            return None;
        }
        let mut row = Record::new();
        row.set("periodo", parts[0]);
        row.set("inicio", parts[1]);
        row.set("final", parts[2]);
        row.set("qtde_pecas", parts[3]);
        row.set("carregado", parts[4]);
        row.set("saldo", parts[5]);
        row.set("%_armaz", normalize::number_or_zero(parts[6]));
        row.set("total_armaz_rs", normalize::number_or_zero(parts[7]));
        Some(row)
    });

    TableResult::from_rows(rows, "total_armaz_rs")
}

/// Parse the operations/services table.
fn parse_operacao(texts: &[String]) -> TableResult {
    static ROW: OnceLock<Regex> = OnceLock::new();
    // Prefix match only: rows may carry trailing annotations after the
    // total column.
    let row_re = ROW.get_or_init(|| {
        Regex::new(r"^(\d+)\s*-\s*(.+?)\s+(\d+\.?\d*)\s+([\d.,]+)\s+([\d.,]+)").unwrap()
    });

    let Some(start) = texts
        .iter()
        .position(|t| t.contains("O P E R A Ç Ã O / S E R V I Ç O S") || (t.contains("OPERAÇÃO") && t.contains("SERVIÇOS")))
    else {
        return TableResult::default();
    };

    let (rows, _state) = OPERACAO_SCAN.run_texts(&texts[start + 1..], |text| {
        let cap = row_re.captures(text)?;
        let mut row = Record::new();
        row.set(
            "descricao",
            normalize::collapse_whitespace(&format!("{} - {}", &cap[1], &cap[2])),
        );
        row.set("qtd", &cap[3]);
        row.set("rs_unitario", normalize::number_or_zero(&cap[4]));
        row.set("total_oper_rs", normalize::number_or_zero(&cap[5]));
        Some(row)
    });

    TableResult::from_rows(rows, "total_oper_rs")
}

/// Line indices of the lot-information anchors. Later matches win, as
/// the anchors sit near the end of the document.
#[derive(Debug, Default)]
struct LotAnchors {
    lote: Option<usize>,
    doc_aduaneiro: Option<usize>,
    valores: Option<usize>,
    reference: Option<usize>,
}

fn find_anchors(texts: &[String]) -> LotAnchors {
    static LOTE: OnceLock<Regex> = OnceLock::new();
    static DOC: OnceLock<Regex> = OnceLock::new();
    static VALORES: OnceLock<Regex> = OnceLock::new();
    let lote_re = LOTE.get_or_init(|| Regex::new(r"^\d{12}\s+\w+").unwrap());
    let doc_re = DOC.get_or_init(|| Regex::new(r"^DI\s+-\s+\d{4}/\d+").unwrap());
    let valores_re = VALORES.get_or_init(|| Regex::new(r"^\d+\.\d+,\d+\s+\d+\.\d+,\d+").unwrap());

    let mut anchors = LotAnchors::default();
    for (i, text) in texts.iter().enumerate() {
        if lote_re.is_match(text) {
            anchors.lote = Some(i);
        } else if doc_re.is_match(text) {
            anchors.doc_aduaneiro = Some(i);
        } else if valores_re.is_match(text) {
            anchors.valores = Some(i);
        } else if text.contains("Ref.Cliente:") {
            anchors.reference = Some(i);
        }
    }
    anchors
}

/// Build the "informações do lote" block from pattern-located lines.
fn lot_information(texts: &[String], storage_periods: usize) -> Record {
    let anchors = find_anchors(texts);
    let mut lote = Record::new();

    if let Some(i) = anchors.lote {
        lot_line_fields(&texts[i], &mut lote);
    }
    if let Some(i) = anchors.doc_aduaneiro {
        customs_document_fields(&texts[i], &mut lote);
    }

    let ref_cliente = reference_value(texts, anchors.reference, &lote);
    lote.set("ref_cliente", ref_cliente);

    if let Some(i) = anchors.valores {
        values_line_fields(&texts[i], &mut lote);
        trailing_fields(texts, i, &mut lote);
    }
    document_wide_fallbacks(texts, &mut lote);
    derived_days(&mut lote);

    lote.set_default("doc_aduaneiro_ii", "");
    lote.set_default("bl_awb_ctrc", Value::Null);
    // The period count is re-derived from the parsed storage table.
    lote.set("periodos_armaz", storage_periods.to_string());

    lote
}

fn lot_line_fields(text: &str, lote: &mut Record) {
    static NUM: OnceLock<Regex> = OnceLock::new();
    static BL: OnceLock<Regex> = OnceLock::new();
    static ENTRADA: OnceLock<Regex> = OnceLock::new();
    let num_re = NUM.get_or_init(|| Regex::new(r"^(\d{12})").unwrap());
    let bl_re = BL.get_or_init(|| Regex::new(r"^[A-Z]{4,5}\d{8,10}$").unwrap());
    let entrada_re =
        ENTRADA.get_or_init(|| Regex::new(r"([A-Z]{3}\s*-\s*\d{2}/\d+)\s*-\s*([A-Z0-9]+)").unwrap());

    if let Some(cap) = num_re.captures(text) {
        lote.set("lote", &cap[1]);
    }

    let bl = text
        .split_whitespace()
        .nth(1)
        .filter(|candidate| bl_re.is_match(candidate));
    lote.set("bl_awb_ctrc", bl.map(Value::from).unwrap_or(Value::Null));

    if let Some(cap) = entrada_re.captures(text) {
        lote.set("doc_aduan_de_entrada", format!("{} - {}", &cap[1], &cap[2]));
    }
}

fn customs_document_fields(text: &str, lote: &mut Record) {
    static DI: OnceLock<Regex> = OnceLock::new();
    static ENTRY: OnceLock<Regex> = OnceLock::new();
    let di_re = DI.get_or_init(|| Regex::new(r"DI\s+-\s+(\d{4}/\d+)").unwrap());
    let entry_re = ENTRY.get_or_init(|| Regex::new(r"(\d{2}/\d{2}/\d{4})\s+(\d+)").unwrap());

    if let Some(cap) = di_re.captures(text) {
        lote.set("doc_aduaneiro_i", format!("DI - {}", &cap[1]));
    }
    if let Some(cap) = entry_re.captures(text) {
        lote.set("data_entrada", &cap[1]);
        lote.set("qtd_container", &cap[2]);
    }
}

fn values_line_fields(text: &str, lote: &mut Record) {
    static FOB: OnceLock<Regex> = OnceLock::new();
    static QTD: OnceLock<Regex> = OnceLock::new();
    let fob_re = FOB.get_or_init(|| Regex::new(r"(\d+\.\d+,\d+)\s+(\d+\.\d+,\d+)").unwrap());
    let qtd_re = QTD
        .get_or_init(|| Regex::new(r"(\d+\.\d+,\d+)\s+(\d+\.\d+,\d+)\s+(\d+\.\d{2})").unwrap());

    if let Some(cap) = fob_re.captures(text) {
        lote.set("valor_fob_cif_rs", normalize::number_or_zero(&cap[1]));
        lote.set("valor_fob_cif_us", normalize::number_or_zero(&cap[2]));
    }
    if let Some(cap) = qtd_re.captures(text) {
        lote.set("qtd_lote", &cap[3]);
    }
    period_fields(text, lote);
}

fn period_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d{2}/\d{2}/\d{4})\s+a\s+(\d{2}/\d{2}/\d{4})").unwrap())
}

fn period_fields(text: &str, lote: &mut Record) {
    if let Some(cap) = period_re().captures(text) {
        lote.set("periodos_apuracao", format!("{} a {}", &cap[1], &cap[2]));
        lote.set("fim_periodo_armaz", &cap[2]);
        lote.set("prazo_p_retirada", &cap[2]);
    }
}

/// Scan the handful of lines after the values line for period dates, day
/// and period counters.
fn trailing_fields(texts: &[String], valores: usize, lote: &mut Record) {
    for offset in 1..=5 {
        let Some(text) = texts.get(valores + offset) else {
            break;
        };
        period_fields(text, lote);
        if let Some(cap) = days_re().captures(text) {
            lote.set("dias", &cap[1]);
        }
        if let Some(cap) = periods_re().captures(text) {
            lote.set("periodos_armaz", &cap[1]);
        }
    }
}

fn days_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Dias:\s*(\d+)").unwrap())
}

fn periods_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Perío[^:]*:\s*(\d+)").unwrap())
}

/// Whole-document fallback search for the day and period counters.
fn document_wide_fallbacks(texts: &[String], lote: &mut Record) {
    if !lote.contains("dias") {
        for text in texts {
            if let Some(cap) = days_re().captures(text) {
                lote.set("dias", &cap[1]);
                break;
            }
        }
    }
    if !lote.contains("periodos_armaz") {
        for text in texts {
            if let Some(cap) = periods_re().captures(text) {
                lote.set("periodos_armaz", &cap[1]);
                break;
            }
        }
    }
}

/// Re-derive the day count from the assessment period: an inclusive span,
/// so both endpoint dates count.
fn derived_days(lote: &mut Record) {
    let Some(period) = lote.get_str("periodos_apuracao").map(str::to_string) else {
        return;
    };
    let Some(cap) = period_re().captures(&period) else {
        return;
    };
    match normalize::inclusive_days(&cap[1], &cap[2]) {
        Some(days) => lote.set("dias", days.to_string()),
        None => lote.set("dias", Value::Null),
    }
}

/// Extract the client reference, stripping the NVT prefix and
/// suppressing echoes of the customs entry document.
fn reference_value(texts: &[String], anchor: Option<usize>, lote: &Record) -> Value {
    static INLINE: OnceLock<Regex> = OnceLock::new();
    let inline_re = INLINE.get_or_init(|| Regex::new(r"Ref\.Cliente:\s*([A-Z0-9]+)").unwrap());

    let Some(i) = anchor else {
        return Value::Null;
    };
    let text = &texts[i];

    if let Some(cap) = inline_re.captures(text) {
        return validate_reference(&cap[1], lote);
    }

    // Value printed on the following line.
    if text.trim_end().ends_with("Ref.Cliente:") {
        if let Some(next) = texts.get(i + 1) {
            let candidate = next.rsplit(" - ").next().unwrap_or(next.as_str()).trim();
            if !candidate.is_empty() {
                return validate_reference(candidate, lote);
            }
        }
    }
    Value::Null
}

fn validate_reference(raw: &str, lote: &Record) -> Value {
    static SHORT: OnceLock<Regex> = OnceLock::new();
    let short_re = SHORT.get_or_init(|| Regex::new(r"^\d{1,3}$").unwrap());

    let value = raw.strip_prefix("NVT ").unwrap_or(raw);
    if let Some(entry) = lote.get_str("doc_aduan_de_entrada") {
        // A short numeric reference that merely repeats the entry
        // document's suffix carries no information.
        if short_re.is_match(value) && entry.ends_with(&format!(" - {value}")) {
            return Value::Null;
        }
        if entry.contains(value) {
            return Value::Null;
        }
    }
    Value::from(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::LineAssembler;
    use crate::model::{PageContent, Token};

    fn page_from_texts(texts: &[&str]) -> PageContent {
        PageContent::from_tokens(
            texts
                .iter()
                .enumerate()
                .map(|(i, t)| Token::new(*t, 10.0, 400.0, 20.0 + 12.0 * i as f32))
                .collect(),
        )
    }

    fn fixture_texts() -> Vec<&'static str> {
        vec![
            "DEMONSTRATIVO DE CÁLCULO",
            "CAPA: 55600 DEMONSTRATIVO: 123456 NOTA FISCAL: 789",
            "Regime: COMUM",
            "Tarifa 01: ARMAZENAGEM GERAL",
            "Opção tarifa: PADRAO",
            "BENEFICIÁRIO",
            "Código: 100 Nome: BENEF LTDA CNPJ/CPF: 11.222.333/0001-44",
            "COMISSÁRIA",
            "Código: 200 Nome: COMIS ADUANEIRA CNPJ/CPF: 55.666.777/0001-88",
            "CLIENTE",
            "Código: 300 Nome: ACME IMPORTADORA LTDA",
            "Endereço: RUA DAS FLORES, 10",
            "Bairro: CENTRO Cidade: SANTOS Estado: SP CEP: 11010-000",
            "CNPJ/CPF: 12.345.678/0001-95 IE: 633000000000",
            "FATURAR PARA",
            "Código: 300 Nome: ACME IMPORTADORA LTDA",
            "Endereço: RUA DAS FLORES, 10",
            "Bairro: CENTRO Cidade: SANTOS Estado: SP CEP: 11010-000",
            "CNPJ/CPF: 12.345.678/0001-95 IE: 633000000000",
            "TARIFAS APLICADAS",
            "Moeda: REAL Data/Cotação: 05/08/2024 Valor: 1,0000",
            "A R M A Z E N A G E M   P E R Í O D O S",
            "Período Início Final Qtde Carregado Saldo % Total",
            "001 05/08/2024 19/08/2024 10 0 10 0,58 235,40",
            "002 20/08/2024 03/09/2024 10 0 10 0,58 100,10",
            "Total de Armazenagem 335,50",
            "O P E R A Ç Ã O / S E R V I Ç O S",
            "Descrição Qtd R$ Unitário Total",
            "123 - DESOVA   DE CONTAINER 2 150,00 300,00",
            "Total Operação/Serviços 300,00",
            "559000000123 HLCU12345678 DTC - 24/123456 - 77",
            "DI - 2024/1234567 05/08/2024 1",
            "80.744,20 16.148,84 500.00 05/08/2024 a 19/08/2024",
            "Ref.Cliente: ABC123",
        ]
    }

    fn extract_fixture() -> Record {
        let pages = vec![page_from_texts(&fixture_texts())];
        let lines = LineAssembler::new().assemble(&pages);
        let input = ExtractionInput {
            pages: &pages,
            lines: &lines,
        };
        extract(&input).unwrap()
    }

    #[test]
    fn test_fixed_line_fields() {
        let body = extract_fixture();
        assert_eq!(body.get_str("header.capa"), Some("55600"));
        assert_eq!(body.get_str("header.demonstrativo"), Some("123456"));
        assert_eq!(body.get_str("header.nota_fiscal"), Some("789"));
        assert_eq!(body.get_str("header.regime"), Some("COMUM"));
        assert_eq!(body.get_str("header.tarifa 01"), Some("ARMAZENAGEM GERAL"));
        assert_eq!(body.get_str("header.opcao_tarifa"), Some("PADRAO"));

        assert_eq!(body.get_str("beneficiario.codigo"), Some("100"));
        assert_eq!(body.get_str("beneficiario.nome"), Some("BENEF LTDA"));
        assert_eq!(
            body.get_str("beneficiario.cnpj_cpf"),
            Some("11.222.333/0001-44")
        );

        assert_eq!(body.get_str("cliente.nome"), Some("ACME IMPORTADORA LTDA"));
        assert_eq!(body.get_str("cliente.endereco"), Some("RUA DAS FLORES, 10"));
        assert_eq!(body.get_str("cliente.cidade"), Some("SANTOS"));
        assert_eq!(body.get_str("cliente.cep"), Some("11010-000"));
        assert_eq!(body.get_str("cliente.ie"), Some("633000000000"));

        assert_eq!(body.get_str("tarifas aplicadas.moeda"), Some("REAL"));
        assert_eq!(body.get_str("tarifas aplicadas.cotacao"), Some("05/08/2024"));
        assert_eq!(body.get_str("tarifas aplicadas.valor_cotacao"), Some("1,0000"));

        assert_eq!(body.get("faturar para.im"), Some(&Value::Null));
        assert_eq!(body.get_str("observacoes"), Some(""));
    }

    #[test]
    fn test_storage_table_with_running_total() {
        let body = extract_fixture();
        let fields = body.get("armazenagem.fields").unwrap().as_array().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0]["periodo"], "001");
        assert_eq!(fields[0]["inicio"], "05/08/2024");
        assert_eq!(fields[0]["total_armaz_rs"], 235.40);
        assert_eq!(fields[1]["total_armaz_rs"], 100.10);
        assert_eq!(
            body.get_f64("armazenagem.total_armazenagem_periodos"),
            Some(335.50)
        );
    }

    #[test]
    fn test_operations_table_and_grand_total() {
        let body = extract_fixture();
        let fields = body
            .get("operacao_servicos.fields")
            .unwrap()
            .as_array()
            .unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0]["descricao"], "123 - DESOVA DE CONTAINER");
        assert_eq!(fields[0]["qtd"], "2");
        assert_eq!(fields[0]["rs_unitario"], 150.0);
        assert_eq!(fields[0]["total_oper_rs"], 300.0);
        assert_eq!(
            body.get_f64("operacao_servicos.total_operacao_servicos"),
            Some(300.0)
        );
        // Grand total is the cross-table sum, derived after both parses.
        assert_eq!(body.get_f64("operacao_servicos.total_geral"), Some(635.50));
    }

    #[test]
    fn test_lot_information_block() {
        let body = extract_fixture();
        assert_eq!(body.get_str("informacoes do lote.lote"), Some("559000000123"));
        assert_eq!(
            body.get_str("informacoes do lote.bl_awb_ctrc"),
            Some("HLCU12345678")
        );
        assert_eq!(
            body.get_str("informacoes do lote.doc_aduan_de_entrada"),
            Some("DTC - 24/123456 - 77")
        );
        assert_eq!(
            body.get_str("informacoes do lote.doc_aduaneiro_i"),
            Some("DI - 2024/1234567")
        );
        assert_eq!(
            body.get_str("informacoes do lote.data_entrada"),
            Some("05/08/2024")
        );
        assert_eq!(body.get_str("informacoes do lote.qtd_container"), Some("1"));
        assert_eq!(
            body.get_f64("informacoes do lote.valor_fob_cif_rs"),
            Some(80744.20)
        );
        assert_eq!(
            body.get_f64("informacoes do lote.valor_fob_cif_us"),
            Some(16148.84)
        );
        assert_eq!(body.get_str("informacoes do lote.qtd_lote"), Some("500.00"));
        assert_eq!(
            body.get_str("informacoes do lote.periodos_apuracao"),
            Some("05/08/2024 a 19/08/2024")
        );
        assert_eq!(
            body.get_str("informacoes do lote.fim_periodo_armaz"),
            Some("19/08/2024")
        );
        // Inclusive span: both endpoints count.
        assert_eq!(body.get_str("informacoes do lote.dias"), Some("15"));
        // Period count re-derived from the storage table rows.
        assert_eq!(body.get_str("informacoes do lote.periodos_armaz"), Some("2"));
        assert_eq!(
            body.get_str("informacoes do lote.ref_cliente"),
            Some("ABC123")
        );
        assert_eq!(
            body.get_str("informacoes do lote.doc_aduaneiro_ii"),
            Some("")
        );
    }

    #[test]
    fn test_missing_tables_default_to_zero_totals() {
        let texts = vec!["DEMONSTRATIVO DE CÁLCULO", "CAPA: 1 DEMONSTRATIVO: 2 NOTA FISCAL: 3"];
        let pages = vec![page_from_texts(&texts)];
        let lines = LineAssembler::new().assemble(&pages);
        let input = ExtractionInput {
            pages: &pages,
            lines: &lines,
        };
        let body = extract(&input).unwrap();

        assert_eq!(
            body.get_f64("armazenagem.total_armazenagem_periodos"),
            Some(0.0)
        );
        assert_eq!(body.get_f64("operacao_servicos.total_geral"), Some(0.0));
        assert_eq!(
            body.get("armazenagem.fields").unwrap().as_array().unwrap().len(),
            0
        );
        assert_eq!(body.get_str("informacoes do lote.periodos_armaz"), Some("0"));
        assert_eq!(
            body.get("informacoes do lote.ref_cliente"),
            Some(&Value::Null)
        );
    }

    #[test]
    fn test_operations_row_with_trailing_text() {
        let mut texts = fixture_texts();
        texts[28] = "123 - DESOVA DE CONTAINER 2 150,00 300,00 CONF";
        let pages = vec![page_from_texts(&texts)];
        let lines = LineAssembler::new().assemble(&pages);
        let input = ExtractionInput {
            pages: &pages,
            lines: &lines,
        };
        let body = extract(&input).unwrap();

        let fields = body
            .get("operacao_servicos.fields")
            .unwrap()
            .as_array()
            .unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0]["descricao"], "123 - DESOVA DE CONTAINER");
        assert_eq!(fields[0]["total_oper_rs"], 300.0);
        assert_eq!(
            body.get_f64("operacao_servicos.total_operacao_servicos"),
            Some(300.0)
        );
    }

    #[test]
    fn test_reference_suppressed_when_echoing_entry_document() {
        let mut lote = Record::new();
        lote.set("doc_aduan_de_entrada", "DTC - 24/123456 - 77");
        assert_eq!(validate_reference("77", &lote), Value::Null);
        assert_eq!(validate_reference("NVT XYZ900", &lote), Value::from("XYZ900"));
        assert_eq!(validate_reference("ABC1", &lote), Value::from("ABC1"));
    }

    #[test]
    fn test_unparseable_total_contributes_zero() {
        let mut texts = fixture_texts();
        texts[24] = "002 20/08/2024 03/09/2024 10 0 10 0,58 —";
        let pages = vec![page_from_texts(&texts)];
        let lines = LineAssembler::new().assemble(&pages);
        let input = ExtractionInput {
            pages: &pages,
            lines: &lines,
        };
        let body = extract(&input).unwrap();

        let fields = body.get("armazenagem.fields").unwrap().as_array().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[1]["total_armaz_rs"], 0.0);
        assert_eq!(
            body.get_f64("armazenagem.total_armazenagem_periodos"),
            Some(235.40)
        );
    }
}
