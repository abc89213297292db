use std::fmt::Write;
use std::path::Path;

use anyhow::Context;

use crate::models::FilteredStat;
use crate::stats;
use crate::views::admin::AdminView;
use crate::views::performance::PerformanceView;

pub fn admin_text(view: &AdminView) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Admin Dashboard");
    let _ = writeln!(output, "Signed in as {}", view.user_name);
    let _ = writeln!(output);

    let _ = writeln!(output, "## Global Performance");
    match &view.global {
        Some(totals) => {
            let _ = writeln!(
                output,
                "Total {} | On time {} | Late {} | Pending {}",
                totals.total, totals.on_time, totals.late, totals.pending
            );
        }
        None => {
            let _ = writeln!(output, "Not available.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Employees");
    if view.employees.is_empty() {
        let _ = writeln!(output, "No employees.");
    } else {
        for employee in &view.employees {
            let _ = writeln!(
                output,
                "- {} <{}> {}",
                employee.name, employee.email, employee.department
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Tasks");
    if view.tasks.is_empty() {
        let _ = writeln!(output, "No tasks.");
    } else {
        for task in &view.tasks {
            let _ = writeln!(
                output,
                "- [{}] {}: {}",
                task.task_id, task.task_name, task.description
            );
        }
    }

    if !view.departments.is_empty() {
        let labels: Vec<&str> = view.departments.iter().map(|d| d.label.as_str()).collect();
        let _ = writeln!(output);
        let _ = writeln!(output, "Departments: {}", labels.join(", "));
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Performance by Employee");
    if !view.filter.is_empty() {
        let applied: Vec<String> = view
            .filter
            .params()
            .into_iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();
        let _ = writeln!(output, "Filter: {}", applied.join(", "));
    }
    output.push_str(&filtered_text(&view.filtered));
    output
}

pub fn filtered_text(rows: &[FilteredStat]) -> String {
    let mut output = String::new();
    if rows.is_empty() {
        let _ = writeln!(output, "No matching employees.");
        return output;
    }
    for stat in rows {
        let _ = writeln!(
            output,
            "- {} ({}, {}) total {} on time {} late {} pending {} | {}% {}",
            stat.name,
            stat.email,
            stat.department,
            stat.total,
            stat.on_time,
            stat.late,
            stat.pending,
            stat.percent,
            stat.level
        );
    }
    output
}

pub fn performance_text(view: &PerformanceView) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# My Performance");
    let _ = writeln!(output, "Signed in as {}", view.user_name);
    let _ = writeln!(output);

    if let Some(panel) = &view.performance {
        let summary = &panel.summary;
        let _ = writeln!(
            output,
            "Total {} | On time {} | Late {} | Pending {}",
            summary.total, summary.on_time, summary.late, summary.pending
        );
        let _ = writeln!(
            output,
            "Target {}% | Achieved {}% | {}",
            summary.target_percent, summary.achieved, panel.message
        );
        let _ = writeln!(output);
    }

    let _ = writeln!(output, "## Tasks");
    if view.tasks.is_empty() {
        let _ = writeln!(output, "No tasks assigned.");
    } else {
        for card in &view.tasks {
            let action = match &card.mark_done {
                Some(action) => format!(
                    " (mark-done --task-id {} --planned-date {})",
                    action.task_id,
                    stats::parse_planned_date(&action.planned_date)
                        .map(|date| date.to_string())
                        .unwrap_or_else(|| action.planned_date.clone())
                ),
                None => String::new(),
            };
            let _ = writeln!(
                output,
                "- {} | planned {} | {} | {}{}",
                card.task,
                card.planned,
                card.assigned_to,
                card.status.as_str(),
                action
            );
        }
    }
    output
}

/// Writes filtered stats rows as CSV with a header row.
pub fn write_filtered_csv(rows: &[FilteredStat], path: &Path) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
