use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use precip_cli::types::{RunReport, RunStatus, ScenarioSummary};

pub fn print_summary(report: &RunReport) {
    println!("Input: {}", report.input);
    println!("Output: {}", report.output);
    if report.dry_run {
        println!("Dry run: no tables written");
    }
    if !report.scenarios.is_empty() {
        println!("{}", scenario_table(&report.scenarios));
    }
    if !report.skipped.is_empty() {
        println!();
        println!("Skipped:");
        println!("{}", skipped_table(report));
    }
    let warnings = report.miscoverage_warnings();
    if warnings > 0 {
        println!(
            "Baseline coverage warnings: {warnings} scenario(s) with regions missing from reference year {}",
            report.config.baseline.reference_year
        );
    }
    if let Some(aborted) = &report.aborted {
        match &aborted.scenario {
            Some(scenario) => eprintln!("Aborted at {scenario}: {}", aborted.reason),
            None => eprintln!("Aborted: {}", aborted.reason),
        }
    }
    match report.status() {
        RunStatus::Succeeded => println!("{} scenario(s) succeeded", report.scenarios.len()),
        RunStatus::Partial => println!(
            "{} scenario(s) succeeded, {} skipped",
            report.scenarios.len(),
            report.skipped.len()
        ),
        RunStatus::Aborted => {}
    }
}

fn scenario_table(scenarios: &[ScenarioSummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Scenario"),
        header_cell("Status"),
        header_cell("Years"),
        header_cell("Regions"),
        header_cell("Rows"),
        header_cell("Unmatched"),
        header_cell("Duplicates"),
        header_cell("Output"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 2..=6 {
        align_column(&mut table, index, CellAlignment::Right);
    }

    let mut total_rows = 0usize;
    let mut total_unmatched = 0usize;
    let mut total_duplicates = 0usize;
    for summary in scenarios {
        total_rows += summary.rows;
        total_unmatched += summary.unmatched_rows;
        total_duplicates += summary.duplicate_regions.len();
        table.add_row(vec![
            Cell::new(&summary.scenario)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            status_cell(summary.written),
            Cell::new(summary.years),
            Cell::new(summary.regions),
            Cell::new(summary.rows),
            count_cell(summary.unmatched_rows, Color::Yellow),
            count_cell(summary.duplicate_regions.len(), Color::Yellow),
            Cell::new(&summary.output),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        Cell::new(total_rows).add_attribute(Attribute::Bold),
        count_cell(total_unmatched, Color::Yellow).add_attribute(Attribute::Bold),
        count_cell(total_duplicates, Color::Yellow).add_attribute(Attribute::Bold),
        dim_cell("-"),
    ]);
    table
}

fn skipped_table(report: &RunReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Scenario"), header_cell("Reason")]);
    apply_summary_table_style(&mut table);
    for skipped in &report.skipped {
        table.add_row(vec![
            Cell::new(&skipped.scenario).fg(Color::Red),
            Cell::new(&skipped.reason),
        ]);
    }
    table
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn status_cell(written: bool) -> Cell {
    if written {
        Cell::new("✓")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold)
    } else {
        dim_cell("dry run")
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
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

#[cfg(test)]
mod tests {
    use precip_cli::types::SkippedScenario;
    use precip_model::PipelineConfig;

    use super::*;

    fn summary(name: &str, unmatched: usize) -> ScenarioSummary {
        ScenarioSummary {
            scenario: name.to_string(),
            output: format!("{name}_spFinal"),
            input_rows: 24,
            years: 2,
            regions: 2,
            rows: 4,
            unmatched_rows: unmatched,
            unmatched_regions: Vec::new(),
            duplicate_regions: Vec::new(),
            intermediates: Vec::new(),
            written: true,
        }
    }

    #[test]
    fn scenario_table_has_a_row_per_scenario_and_totals() {
        let table = scenario_table(&[summary("pr_a", 0), summary("pr_b", 2)]);
        assert_eq!(table.row_count(), 3);
        let rendered = table.to_string();
        assert!(rendered.contains("pr_a"));
        assert!(rendered.contains("pr_b_spFinal"));
        assert!(rendered.contains("TOTAL"));
    }

    #[test]
    fn skipped_table_lists_reasons() {
        let mut report = RunReport::new(
            &PipelineConfig::default(),
            "in".to_string(),
            "out".to_string(),
            false,
        );
        report.skipped.push(SkippedScenario {
            scenario: "pr_bad".to_string(),
            reason: "read failed".to_string(),
        });
        let rendered = skipped_table(&report).to_string();
        assert!(rendered.contains("pr_bad"));
        assert!(rendered.contains("read failed"));
    }
}
