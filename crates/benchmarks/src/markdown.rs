// Copyright 2025 TOPSAIL Contributors
// SPDX-License-Identifier: Apache-2.0

//! Markdown rendering of comparison reports.

use crate::compare::{CommonField, SharedInfo};
use crate::info::{EngineField, SystemField, NOT_AVAILABLE};
use crate::report::{BenchmarkComparison, ComparisonReport};
use crate::table::Table;
use std::fmt::{self, Write};

fn escape(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn is_shown(value: &str) -> bool {
    !value.is_empty() && value != NOT_AVAILABLE
}

/// Render one table.
pub fn render_table(table: &Table) -> String {
    let mut output = String::new();
    write_table(&mut output, table).expect("writing to a String");
    output
}

fn write_table(output: &mut String, table: &Table) -> fmt::Result {
    let headers: Vec<String> = table.headers.iter().map(|h| escape(h)).collect();
    writeln!(output, "| {} |", headers.join(" | "))?;
    writeln!(output, "|{}", "---|".repeat(headers.len()))?;

    for row in &table.rows {
        let mut cells = vec![escape(&row.label)];
        cells.extend(row.cells.iter().map(|c| escape(&c.display())));
        writeln!(output, "| {} |", cells.join(" | "))?;
    }

    Ok(())
}

fn write_items(output: &mut String, title: &str, items: &[(&str, String)]) -> fmt::Result {
    if items.is_empty() {
        return Ok(());
    }

    writeln!(output, "**{title}**")?;
    writeln!(output)?;
    for (name, value) in items {
        writeln!(output, "- {name}: {value}")?;
    }
    writeln!(output)
}

fn write_shared(output: &mut String, shared: &SharedInfo) -> fmt::Result {
    let common = |field: CommonField| shared.common.get(&field).filter(|v| is_shown(v));

    let mut summary = Vec::new();
    if let Some(command) = common(CommonField::Command) {
        summary.push(("Command", format!("`{command}`")));
    }
    if let Some(timestamp) = common(CommonField::Timestamp) {
        summary.push(("Timestamp", timestamp.clone()));
    }

    let host: Vec<(&str, String)> = SystemField::ALL
        .iter()
        .filter_map(|f| {
            let value = shared.system.get(f).filter(|v| is_shown(v))?;
            Some((f.display_name(), value.clone()))
        })
        .collect();

    let mut engine: Vec<(&str, String)> = EngineField::ALL
        .iter()
        .filter_map(|f| {
            let value = shared.engine.get(f).filter(|v| is_shown(v))?;
            Some((f.display_name(), value.clone()))
        })
        .collect();
    if let Some(provider) = common(CommonField::ContainerEngineProvider) {
        engine.push(("Provider", provider.clone()));
    }

    if summary.is_empty() && host.is_empty() && engine.is_empty() {
        writeln!(output, "No shared configuration information found")?;
        return writeln!(output);
    }

    write_items(output, "Benchmark Summary", &summary)?;
    write_items(output, "Host System Information", &host)?;
    write_items(output, "Container Engine Information", &engine)
}

fn write_benchmark(output: &mut String, comparison: &BenchmarkComparison) -> fmt::Result {
    writeln!(output, "## Benchmark: {}", comparison.title)?;
    writeln!(output)?;
    writeln!(output, "### Configuration Differences & Results")?;
    writeln!(output)?;

    let tables = comparison.tables();
    if tables.is_empty() {
        writeln!(output, "No differences found between configurations")?;
        writeln!(output)?;
    }
    for table in &tables {
        writeln!(output, "#### {}", table.title)?;
        writeln!(output)?;
        write_table(output, table)?;
        writeln!(output)?;
    }

    if comparison.configurations.len() > 1 {
        writeln!(output, "### Shared Configuration")?;
        writeln!(output)?;
        write_shared(output, &comparison.shared)?;
    }

    Ok(())
}

fn write_report(output: &mut String, report: &ComparisonReport) -> fmt::Result {
    writeln!(output, "# {}", report.title)?;
    writeln!(output)?;
    writeln!(output, "Generated: {}", report.generated_at.to_rfc3339())?;
    writeln!(output)?;

    if report.is_empty() {
        return writeln!(output, "No configuration data found for comparison");
    }

    for comparison in &report.benchmarks {
        write_benchmark(output, comparison)?;
    }

    writeln!(output, "---")?;
    writeln!(output, "Total benchmarks: {}", report.benchmarks.len())
}

/// Render the whole report.
pub fn generate_report(report: &ComparisonReport) -> String {
    let mut output = String::new();
    write_report(&mut output, report).expect("writing to a String");
    output
}
