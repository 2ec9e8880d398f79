//! End-to-end extraction tests through the public API.

use demex::{analyze_json, analyze_pages, Color, DrawnShape, PageContent, ShapeKind, Token};
use serde_json::Value;

const NAVY: Color = Color(0.098, 0.098, 0.439);

fn navy_rule(y: f32) -> DrawnShape {
    DrawnShape {
        kind: ShapeKind::Rect,
        top: y,
        stroke: Some(NAVY),
        fill: None,
    }
}

/// One page of the container terminal services report: title, header
/// block, one navy-ruled section with a bilingual header pair and a
/// single data row.
fn services_page() -> PageContent {
    let mut tokens = vec![Token::new(
        "DEMONSTRATIVO DE CÁLCULO DE SERVIÇOS",
        10.0,
        400.0,
        20.0,
    )];
    tokens.extend(vec![
        Token::new("CLIENTE:", 10.0, 50.0, 60.0),
        Token::new("ACME COMERCIO LTDA", 55.0, 200.0, 60.0),
        Token::new("NAVIO:", 210.0, 240.0, 60.0),
        Token::new("MSC AURORA", 245.0, 320.0, 60.0),
        Token::new("DEMONSTRATIVO:", 330.0, 400.0, 60.0),
        Token::new("12345", 405.0, 430.0, 60.0),
        Token::new("CNPJ:", 10.0, 40.0, 80.0),
        Token::new("12.345.678/0001-95", 45.0, 140.0, 80.0),
        Token::new("VALOR BRUTO R$:", 10.0, 90.0, 100.0),
        Token::new("(BRL)", 95.0, 120.0, 100.0),
        Token::new("80.744,20", 125.0, 180.0, 100.0),
    ]);
    tokens.extend(vec![
        Token::new("Armazenagem Importacao FCL Cheio \"40\"", 8.0, 300.0, 200.0),
        Token::new("Quantidade: 1", 545.0, 620.0, 200.0),
        Token::new("Total: 1.500,00", 705.0, 800.0, 200.0),
    ]);
    tokens.push(Token::new(
        "Data Inicial Data Final Container",
        8.0,
        300.0,
        215.0,
    ));
    tokens.push(Token::new(
        "Start Time End Time Equipment ID",
        8.0,
        300.0,
        228.0,
    ));
    tokens.extend(vec![
        Token::new("05/08/2024", 8.0, 39.0, 240.0),
        Token::new("19/08/2024", 48.0, 77.0, 240.0),
        Token::new("TCLU1234567", 87.0, 127.0, 240.0),
        Token::new("IMP", 135.0, 160.0, 240.0),
        Token::new("12345678000195", 336.0, 388.0, 240.0),
        Token::new("ARMAZENAGEM", 601.0, 700.0, 240.0),
        Token::new("BRL", 752.0, 780.0, 240.0),
        Token::new("1.500,00", 789.0, 830.0, 240.0),
    ]);

    PageContent {
        tokens,
        shapes: vec![navy_rule(200.0)],
    }
}

/// The line-number statement as one page of stacked text lines.
fn statement_page() -> PageContent {
    let texts = [
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
        "123 - DESOVA DE CONTAINER 2 150,00 300,00",
        "Total Operação/Serviços 300,00",
        "559000000123 HLCU12345678 DTC - 24/123456 - 77",
        "DI - 2024/1234567 05/08/2024 1",
        "80.744,20 16.148,84 500.00 05/08/2024 a 19/08/2024",
        "Ref.Cliente: ABC123",
    ];
    PageContent::from_tokens(
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| Token::new(*t, 10.0, 400.0, 20.0 + 12.0 * i as f32))
            .collect(),
    )
}

#[test]
fn services_report_end_to_end() {
    let result = analyze_pages(&[services_page()]);
    assert!(!result.is_failed());
    assert_eq!(
        result.document_type(),
        Some("DEMONSTRATIVO DE CÁLCULO DE SERVIÇOS")
    );

    let value = result.to_value();
    assert_eq!(value["document_type"], "DEMONSTRATIVO DE CÁLCULO DE SERVIÇOS");
    assert_eq!(value["header"]["Cliente (Customer)"], "ACME COMERCIO LTDA");
    assert_eq!(value["header"]["CNPJ (TAX_ID)"], "12345678000195");
    assert_eq!(value["header"]["Valor Bruto"], 80744.20);
    assert_eq!(value["header"]["Moeda"], "BRL");

    let sections = value["sections"].as_array().unwrap();
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0]["Quantidade (Quantity)"], 1);
    assert_eq!(sections[0]["Total"], 1500.0);

    let row = &sections[0]["fields"][0];
    assert_eq!(row["Container (Equipment ID)"], "TCLU1234567");
    assert_eq!(row["Valor (Unit Value)"], "1.500,00");
    // Section row counts match the marker's declared quantity.
    assert_eq!(
        sections[0]["fields"].as_array().unwrap().len() as i64,
        sections[0]["Quantidade (Quantity)"].as_i64().unwrap()
    );
}

#[test]
fn statement_report_end_to_end() {
    let result = analyze_pages(&[statement_page()]);
    assert!(!result.is_failed());
    assert_eq!(result.document_type(), Some("DEMONSTRATIVO DE CÁLCULO"));

    let value = result.to_value();
    assert_eq!(value["header"]["capa"], "55600");
    assert_eq!(value["cliente"]["nome"], "ACME IMPORTADORA LTDA");

    // Table totals are re-derived from the committed rows.
    let armaz = &value["armazenagem"];
    assert_eq!(armaz["fields"].as_array().unwrap().len(), 2);
    assert_eq!(armaz["total_armazenagem_periodos"], 335.50);

    let oper = &value["operacao_servicos"];
    assert_eq!(oper["total_operacao_servicos"], 300.0);
    assert_eq!(oper["total_geral"], 635.50);

    let lote = &value["informacoes do lote"];
    assert_eq!(lote["lote"], "559000000123");
    // Inclusive day count over the assessment period.
    assert_eq!(lote["dias"], "15");
    assert_eq!(lote["periodos_armaz"], "2");
    assert_eq!(lote["ref_cliente"], "ABC123");
}

#[test]
fn unknown_document_is_a_failure_value() {
    let pages = vec![PageContent::from_tokens(vec![Token::new(
        "RELATÓRIO DE AVARIAS",
        10.0,
        200.0,
        20.0,
    )])];
    let result = analyze_pages(&pages);
    assert!(result.is_failed());

    let value = result.to_value();
    assert_eq!(value["error"], "Document type not recognized");
    assert_eq!(value["document_title"], "RELATÓRIO DE AVARIAS");
    let types = value["supported_types"].as_array().unwrap();
    assert!(types.contains(&Value::from("DEMONSTRATIVO DE CÁLCULO")));
    assert!(types.contains(&Value::from("DEMONSTRATIVO DE CÁLCULO DE SERVIÇOS")));
    // Failure values never leak partial section data.
    assert!(value.get("sections").is_none());
    assert!(value.get("header").is_none());
}

#[test]
fn json_dump_boundary_matches_in_memory_analysis() {
    let pages = vec![statement_page()];
    let dump = serde_json::to_string(&pages).unwrap();

    let from_dump = analyze_json(&dump).unwrap();
    let in_memory = analyze_pages(&pages);
    assert_eq!(from_dump.to_value(), in_memory.to_value());
}
