use relsync_core::report::RunReport;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    // Calculate column widths
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let header_row: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_row.join("  "));

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = w)
            })
            .collect();
        println!("{}", cells.join("  ").trim_end());
    }
}

pub fn print_report(report: &RunReport, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(report);
    }

    let prefix = if report.dry_run { "[dry-run] " } else { "" };
    match (&report.version, &report.mode) {
        (Some(version), Some(mode)) => {
            println!("{prefix}{} {version} ({mode})", report.repo)
        }
        _ => println!("{prefix}{}", report.repo),
    }

    let rows: Vec<Vec<String>> = report
        .steps
        .iter()
        .map(|s| {
            vec![
                s.step.clone(),
                s.selected.len().to_string(),
                s.changed.len().to_string(),
                s.skipped.len().to_string(),
                s.failures.len().to_string(),
            ]
        })
        .collect();
    print_table(&["STEP", "SELECTED", "CHANGED", "SKIPPED", "FAILED"], rows);

    let changes: Vec<Vec<String>> = report
        .steps
        .iter()
        .flat_map(|s| {
            s.changed
                .iter()
                .map(move |c| vec![s.step.clone(), c.key.clone(), c.repos.join(", ")])
        })
        .collect();
    if !changes.is_empty() {
        println!();
        print_table(&["STEP", "TICKET", "REPOS"], changes);
    }

    let failures: Vec<Vec<String>> = report
        .steps
        .iter()
        .flat_map(|s| {
            s.failures.iter().map(move |f| {
                vec![
                    s.step.clone(),
                    f.key.clone().unwrap_or_else(|| "-".to_string()),
                    f.operation.clone(),
                    f.error.clone(),
                ]
            })
        })
        .collect();
    if !failures.is_empty() {
        println!();
        print_table(&["STEP", "TICKET", "OPERATION", "ERROR"], failures);
    }

    Ok(())
}
