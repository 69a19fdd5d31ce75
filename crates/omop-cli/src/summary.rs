use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use omop_model::{Diagnostic, MatchConfidence, Severity};
use omop_validate::CoverageStat;

use crate::types::{CatalogResult, EtlResult, MapResult, ValidateResult};

pub fn print_map_summary(result: &MapResult) {
    println!("Mapping: {}", result.output.display());
    let mut table = Table::new();
    table.set_header(vec![header_cell("Confidence"), header_cell("Entries")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for level in MatchConfidence::all() {
        table.add_row(vec![
            confidence_cell(level),
            count_cell(result.mapping.count_with(level), confidence_color(level)),
        ]);
    }
    table.add_row(vec![
        header_cell("TOTAL"),
        Cell::new(result.mapping.len()).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
    println!(
        "Unclaimed catalog columns: {}  Unmatched target fields: {}",
        result.mapping.unclaimed_source_fields.len(),
        result.mapping.unmatched_target_fields.len()
    );
    print_diagnostics(&result.diagnostics);
}

pub fn print_coverage_summary(result: &ValidateResult) {
    let report = &result.report;
    if let Some(path) = &result.report_path {
        println!("Coverage report: {}", path.display());
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Side"),
        header_cell("Level"),
        header_cell("Mapped"),
        header_cell("Total"),
        header_cell("Coverage"),
    ]);
    apply_table_style(&mut table);
    for index in 2..5 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    for (side, level, stat) in [
        ("IHID", "tables", &report.source_tables),
        ("IHID", "fields", &report.source_fields),
        ("OMOP", "tables", &report.target_tables),
        ("OMOP", "fields", &report.target_fields),
    ] {
        table.add_row(vec![
            Cell::new(side).fg(Color::Blue).add_attribute(Attribute::Bold),
            Cell::new(level),
            Cell::new(stat.mapped),
            Cell::new(stat.total),
            ratio_cell(stat),
        ]);
    }
    println!("{table}");

    let gaps: Vec<_> = report
        .gaps
        .iter()
        .filter(|gap| gap.unmapped_count > 0)
        .take(result.top)
        .collect();
    if !gaps.is_empty() {
        let mut table = Table::new();
        table.set_header(vec![
            header_cell("Target table"),
            header_cell("Unmapped"),
            header_cell("Fields"),
        ]);
        apply_table_style(&mut table);
        align_column(&mut table, 1, CellAlignment::Right);
        for gap in gaps {
            table.add_row(vec![
                Cell::new(&gap.table).fg(Color::Blue),
                count_cell(gap.unmapped_count, Color::Yellow),
                Cell::new(gap.unmapped_fields.join(", ")),
            ]);
        }
        println!();
        println!("Largest gaps:");
        println!("{table}");
    }
    print_diagnostics(&report.diagnostics);
    if result.decision.passed {
        println!("Gate: passed");
    } else {
        eprintln!("Gate: failed");
        for failure in &result.decision.failures {
            eprintln!("- {failure}");
        }
    }
}

pub fn print_etl_summary(result: &EtlResult) {
    if result.dry_run {
        println!("Dry run: no files written");
    } else {
        println!("Output: {}", result.output_dir.display());
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Target table"), header_cell("Records")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (name, records) in &result.stats.records_by_table {
        table.add_row(vec![Cell::new(name).fg(Color::Blue), Cell::new(records)]);
    }
    table.add_row(vec![
        header_cell("TOTAL"),
        Cell::new(result.stats.records_emitted()).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");
    println!("Source rows: {}", result.stats.rows_read);
    let sources: Vec<String> = result
        .stats
        .person_id_sources
        .iter()
        .map(|(source, count)| format!("{source}={count}"))
        .collect();
    if !sources.is_empty() {
        println!("person_id sources: {}", sources.join("  "));
    }
    if !result.stats.unmapped_tables.is_empty() {
        println!(
            "Skipped unmapped tables: {}",
            result.stats.unmapped_tables.join(", ")
        );
    }
    print_diagnostics(&result.diagnostics);
}

pub fn print_catalog_summary(result: &CatalogResult) {
    println!("Catalog: {}", result.output.display());
    println!(
        "Files: {}  Tables: {}  Columns: {}",
        result.files, result.tables, result.columns
    );
    print_diagnostics(&result.diagnostics);
}

fn print_diagnostics(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    let mut ordered: Vec<&Diagnostic> = diagnostics.iter().collect();
    ordered.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.code.cmp(&b.code))
            .then_with(|| a.table.cmp(&b.table))
    });
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Severity"),
        header_cell("Code"),
        header_cell("Table"),
        header_cell("Column"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Center);
    for diagnostic in ordered {
        table.add_row(vec![
            severity_cell(diagnostic.severity),
            Cell::new(diagnostic.code),
            optional_cell(diagnostic.table.as_deref()),
            optional_cell(diagnostic.column.as_deref()),
            Cell::new(&diagnostic.message),
        ]);
    }
    println!();
    println!("Diagnostics:");
    println!("{table}");
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(160);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn ratio_cell(stat: &CoverageStat) -> Cell {
    let text = format!("{:.1}%", stat.ratio() * 100.0);
    let color = if stat.total == 0 {
        Color::DarkGrey
    } else if stat.ratio() >= 0.8 {
        Color::Green
    } else if stat.ratio() >= 0.5 {
        Color::Yellow
    } else {
        Color::Red
    };
    Cell::new(text).fg(color)
}

fn confidence_cell(level: MatchConfidence) -> Cell {
    Cell::new(level).fg(confidence_color(level))
}

fn confidence_color(level: MatchConfidence) -> Color {
    match level {
        MatchConfidence::Exact => Color::Green,
        MatchConfidence::Normalized => Color::Cyan,
        MatchConfidence::Fallback => Color::Yellow,
        MatchConfidence::Unmapped => Color::Red,
    }
}

fn severity_cell(severity: Severity) -> Cell {
    match severity {
        Severity::Warning => Cell::new("WARN").fg(Color::Yellow),
        Severity::Info => dim_cell("INFO"),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn optional_cell(value: Option<&str>) -> Cell {
    match value {
        Some(value) => Cell::new(value),
        None => dim_cell("-"),
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
