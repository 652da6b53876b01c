use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use dixon_core::{PatientState, SiteReport};
use dixon_map::ChannelCoverage;
use dixon_report::ReportOutcome;

pub fn print_site_reports(reports: &[SiteReport]) {
    if reports.is_empty() {
        println!("No site exports found.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Site"),
        header_cell("Patients"),
        header_cell("Done"),
        header_cell("Excluded"),
        header_cell("Already done"),
        header_cell("Failed"),
        header_cell("Written"),
        header_cell("Existing"),
        header_cell("Series errors"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 1..9 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    let mut totals = [0usize; 8];
    for report in reports {
        let row = [
            report.patients.len(),
            report.count(PatientState::Done),
            report.count(PatientState::SkippedExcluded),
            report.count(PatientState::SkippedExists),
            report.count(PatientState::Failed),
            report.written(),
            report.existing(),
            report.failures().count(),
        ];
        for (total, value) in totals.iter_mut().zip(row) {
            *total += value;
        }
        let mut cells = vec![
            Cell::new(report.site)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
        ];
        cells.extend(row[..4].iter().map(|value| dim_zero_cell(*value)));
        cells.push(count_cell(row[4], Color::Red));
        cells.extend(row[5..7].iter().map(|value| dim_zero_cell(*value)));
        cells.push(count_cell(row[7], Color::Red));
        table.add_row(cells);
    }
    if reports.len() > 1 {
        let mut cells = vec![
            Cell::new("TOTAL")
                .fg(Color::Cyan)
                .add_attribute(Attribute::Bold),
        ];
        cells.extend(
            totals
                .iter()
                .map(|value| Cell::new(value).add_attribute(Attribute::Bold)),
        );
        table.add_row(cells);
    }
    println!("{table}");
    print_coverage_table(reports);
    print_failure_table(reports);
}

/// Series groups that are missing channels.
fn print_coverage_table(reports: &[SiteReport]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Site"),
        header_cell("Patient"),
        header_cell("Series"),
        header_cell("Coverage"),
    ]);
    apply_table_style(&mut table);
    let mut rows = 0;
    for report in reports {
        for patient in &report.patients {
            for (group, coverage) in &patient.coverage {
                if *coverage == ChannelCoverage::Full {
                    continue;
                }
                rows += 1;
                table.add_row(vec![
                    Cell::new(report.site),
                    Cell::new(patient.label()),
                    Cell::new(group),
                    Cell::new(coverage).fg(Color::Yellow),
                ]);
            }
        }
    }
    if rows > 0 {
        println!();
        println!("Incomplete channels:");
        println!("{table}");
    }
}

fn print_failure_table(reports: &[SiteReport]) {
    if !reports.iter().any(SiteReport::has_failures) {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Site"),
        header_cell("Patient"),
        header_cell("Series"),
        header_cell("Kind"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut table);
    for report in reports {
        for (patient, failure) in report.failures() {
            table.add_row(vec![
                Cell::new(report.site),
                Cell::new(patient.label()),
                Cell::new(&failure.series),
                Cell::new(failure.kind).fg(Color::Red),
                Cell::new(&failure.message),
            ]);
        }
    }
    println!();
    println!("Failures:");
    println!("{table}");
}

pub fn print_report_outcome(report: &str, outcome: &ReportOutcome) {
    match outcome {
        ReportOutcome::Written { path, rows } => {
            println!("{report}: wrote {rows} rows to {}", path.display());
        }
        ReportOutcome::Skipped { path } => {
            println!("{report}: {} already exists, skipping", path.display());
        }
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn dim_zero_cell(count: usize) -> Cell {
    if count > 0 {
        Cell::new(count)
    } else {
        dim_cell(count)
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
