mod common;

use chrono::Utc;
use docfill_server::assembly::record::row;
use docfill_server::assembly::{
    AssemblyOptions, DataRecord, DocumentGenerator, GenerationRequest, Generator, OutputFormat,
};
use docfill_server::config::AppConfig;
use docfill_server::documents::persistence::INDEX_FILE;
use docfill_server::documents::DocumentRecord;
use docfill_server::storage::{LocalStorage, ObjectStorage};
use docfill_server::AppState;
use std::collections::BTreeMap;
use uuid::Uuid;

#[test]
fn bundled_invoice_fills_completely_with_cleanup() {
    let store = common::bundled_templates();
    let invoice = store.get("invoice").unwrap();

    let data = DataRecord::new()
        .with_scalar("invoice_number", "FV 3/2026")
        .with_scalar("seller_name", "Acme Ltd")
        .with_scalar("buyer_name", "Beta LLC")
        .with_list(
            "products",
            vec![
                row([("name", "Consulting"), ("quantity", "10"), ("unit", "h"), ("unitPrice", "150,00"), ("taxRatePercent", "23")]),
                row([("name", "Travel"), ("quantity", "1"), ("unit", "pcs"), ("unitPrice", "abc"), ("taxRatePercent", "23")]),
            ],
        );

    let document = DocumentGenerator::new(&invoice.doc_type, &invoice.content)
        .generate(
            GenerationRequest::new(data)
                .with_options(AssemblyOptions::new("").with_cleanup(true))
                .with_format(OutputFormat::Html),
        )
        .unwrap();

    let html = document.html;
    assert!(!html.contains("{{"));
    assert!(!html.contains("class=\"line-items\""));
    assert!(html.contains("<td>1</td><td>Consulting</td><td>10</td><td>h</td>"));
    assert!(html.contains("<td>2</td><td>Travel</td>"));
    assert!(html.contains("<td>1500.00</td><td>345.00</td><td>1845.00</td>"));
    assert!(html.contains("<td>0.00</td><td>0.00</td><td>0.00</td>"));
    assert!(html.contains(&document.generated_on));

    let totals = document.totals.unwrap();
    assert_eq!(totals.total_gross, 1845.0);
}

#[test]
fn bundled_duties_scope_without_duties_uses_empty_fragment() {
    let store = common::bundled_templates();
    let duties = store.get("duties-scope").unwrap();

    let data = DataRecord::new().with_scalar("employee_name", "Jordan Smith");
    let document = DocumentGenerator::new(&duties.doc_type, &duties.content)
        .generate(GenerationRequest::new(data))
        .unwrap();

    assert!(document.html.contains("<ol>\n    <li>-</li>\n  </ol>"));
    assert!(document.html.contains("Employee: Jordan Smith"));
    assert!(document.totals.is_none());
    assert_eq!(document.filename, "duties-scope.html");
}

#[tokio::test]
async fn state_restores_persisted_index() {
    let dir = tempfile::tempdir().unwrap();
    let storage = LocalStorage::new(dir.path()).await.unwrap();

    let now = Utc::now();
    let id = Uuid::new_v4();
    let record = DocumentRecord {
        id,
        template_id: "payment-demand".to_string(),
        title: "Reminder".to_string(),
        filename: "payment-demand-reminder.html".to_string(),
        stored_name: format!("{}.html", id),
        mime_type: "text/html".to_string(),
        size_bytes: 4,
        generated: true,
        fields: BTreeMap::from([("debtor_name".to_string(), "Beta LLC".to_string())]),
        list_field: None,
        rows: Vec::new(),
        created_at: now,
        updated_at: now,
    };
    let index = serde_json::to_vec(&vec![record.clone()]).unwrap();
    storage.upload_file(INDEX_FILE, &index).await.unwrap();

    let config = AppConfig {
        documents_dir: dir.path().to_path_buf(),
        ..AppConfig::default()
    };
    let state = AppState::new(config).await.unwrap();

    assert_eq!(state.templates.len(), 3);
    assert!(state.renderer.is_none());
    assert_eq!(state.documents.read().get(&id), Some(&record));
}

#[tokio::test]
async fn state_reports_unreadable_templates() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        templates_dir: dir.path().join("missing"),
        documents_dir: dir.path().join("documents"),
        ..AppConfig::default()
    };
    assert!(AppState::new(config).await.is_err());
}
