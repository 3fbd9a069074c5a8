use docfill_server::assembly::record::row;
use docfill_server::assembly::totals::compute_totals;
use docfill_server::assembly::{
    AssemblyOptions, DataRecord, RepeatingSection, RowRecord, RowTemplate, TemplateEngine,
};

const MARKER: &str = "<tr class=\"items\"></tr>";

fn items_section() -> RepeatingSection {
    RepeatingSection::new(
        "items",
        MARKER,
        "<tr><td>{{label}}</td></tr>",
        "<tr><td>none</td></tr>",
    )
}

fn engine() -> TemplateEngine {
    TemplateEngine::new(AssemblyOptions::default())
}

fn label_rows(labels: &[&str]) -> Vec<RowRecord> {
    labels.iter().map(|label| row([("label", *label)])).collect()
}

#[test]
fn assembling_twice_changes_nothing() {
    let template = format!("<h1>{{{{title}}}}</h1><table>{}</table><p>{{{{title}}}}</p>", MARKER);
    let data = DataRecord::new()
        .with_scalar("title", "Offer")
        .with_list("items", label_rows(&["a", "b"]));
    let section = items_section();

    let once = engine().assemble(&template, &data, Some(&section));
    let twice = engine().assemble(&once, &DataRecord::new(), Some(&section));

    assert_eq!(once, twice);
    assert_eq!(
        once,
        "<h1>Offer</h1><table><tr><td>a</td></tr><tr><td>b</td></tr></table><p>Offer</p>"
    );
}

#[test]
fn rows_render_in_input_order() {
    let rows = label_rows(&["FIRST", "SECOND", "THIRD"]);
    let renderer = RowTemplate::new("[{{label}}]", AssemblyOptions::default());

    let output =
        TemplateEngine::expand_repeating_section("<ul>@@</ul>", "@@", &rows, &renderer, "-");

    assert_eq!(output, "<ul>[FIRST][SECOND][THIRD]</ul>");
}

#[test]
fn empty_list_uses_empty_fragment() {
    let renderer = |_: &RowRecord| "row".to_string();
    let output =
        TemplateEngine::expand_repeating_section("a@@b", "@@", &[], &renderer, "<i>empty</i>");
    assert_eq!(output, "a<i>empty</i>b");

    // Absent list field behaves like an empty one
    let template = format!("<table>{}</table>", MARKER);
    let filled = engine().assemble(&template, &DataRecord::new(), Some(&items_section()));
    assert_eq!(filled, "<table><tr><td>none</td></tr></table>");
}

#[test]
fn missing_marker_is_a_no_op() {
    let rows = label_rows(&["x"]);
    let renderer = |_: &RowRecord| "row".to_string();
    let output =
        TemplateEngine::expand_repeating_section("no marker here", "@@", &rows, &renderer, "-");
    assert_eq!(output, "no marker here");
}

#[test]
fn placeholders_are_replaced_globally() {
    let data = DataRecord::new().with_scalar("x", "V");
    assert_eq!(engine().fill_scalars("{{x}} and {{x}}", &data), "V and V");
}

#[test]
fn line_item_totals_match_worked_example() {
    let rows = vec![
        row([("quantity", "2"), ("unitPrice", "100"), ("taxRatePercent", "23")]),
        row([("quantity", "1"), ("unitPrice", "50"), ("taxRatePercent", "23")]),
    ];

    let totals = compute_totals(&rows);

    assert_eq!(totals.lines[0].net_value, 200.0);
    assert_eq!(totals.lines[0].tax_value, 46.0);
    assert_eq!(totals.lines[0].gross_value, 246.0);
    assert_eq!(totals.lines[1].net_value, 50.0);
    assert_eq!(totals.lines[1].tax_value, 11.5);
    assert_eq!(totals.lines[1].gross_value, 61.5);
    assert_eq!(totals.total_net, 250.0);
    assert_eq!(totals.total_tax, 57.5);
    assert_eq!(totals.total_gross, 307.5);

    let mut record = DataRecord::new().with_list("products", rows);
    totals.apply_to(&mut record);
    assert_eq!(
        engine().fill_scalars("{{totalNet}}/{{totalTax}}/{{totalGross}}", &record),
        "250.00/57.50/307.50"
    );
}

#[test]
fn unresolved_placeholders_survive_unless_cleaned() {
    let plain = engine().assemble("Hello {{name}}", &DataRecord::new(), None);
    assert_eq!(plain, "Hello {{name}}");

    let cleaning = TemplateEngine::new(AssemblyOptions::default().with_cleanup(true));
    assert_eq!(cleaning.assemble("Hello {{name}}", &DataRecord::new(), None), "Hello ");
}

#[test]
fn malformed_quantity_counts_as_zero() {
    let rows = vec![
        row([("quantity", "abc"), ("unitPrice", "100"), ("taxRatePercent", "23")]),
        row([("quantity", "1"), ("unitPrice", "10"), ("taxRatePercent", "0")]),
    ];

    let totals = compute_totals(&rows);

    assert_eq!(totals.lines[0].net_value, 0.0);
    assert_eq!(totals.total_net, 10.0);
    assert_eq!(totals.total_gross, 10.0);
}

#[test]
fn row_values_are_not_rescanned_by_scalar_pass() {
    let template = format!("{{{{label}}}}|{}", MARKER);
    let data = DataRecord::new()
        .with_scalar("label", "TOP")
        .with_list("items", label_rows(&["{{label}}"]));

    let output = engine().assemble(&template, &data, Some(&items_section()));

    assert_eq!(output, "TOP|<tr><td>{{label}}</td></tr>");
}

#[test]
fn cleanup_leaves_no_template_syntax_even_from_values() {
    let template = format!("{{{{label}}}}|{}|{{{{missing}}}}", MARKER);
    let data = DataRecord::new()
        .with_scalar("label", "{{other}}")
        .with_list("items", label_rows(&["{{label}}", "ok"]));
    let cleaning = TemplateEngine::new(AssemblyOptions::default().with_cleanup(true));

    let output = cleaning.assemble(&template, &data, Some(&items_section()));

    assert_eq!(output, "|<tr><td></td></tr><tr><td>ok</td></tr>|");
}
