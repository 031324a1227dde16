use std::fmt::Write as _;

use dr_core::entities::{LogEntry, PlanItem, Task};
use dr_core::enums::TaskStatus;
use dr_session::SessionSnapshot;
use serde::Serialize;

use crate::cli::OutputFormat;

/// Render a serializable response as JSON. `Text` falls back to pretty JSON
/// for values without a dedicated text view.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json | OutputFormat::Text => Ok(serde_json::to_string_pretty(value)?),
        OutputFormat::Raw => Ok(serde_json::to_string(value)?),
    }
}

/// Print a serializable response in the requested format.
pub fn output<T: Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = render(value, format)?;
    println!("{rendered}");
    Ok(())
}

/// Print a finished session: the cleaned report and a log tail in `text`
/// mode, the whole snapshot otherwise.
pub fn output_snapshot(
    snapshot: &SessionSnapshot,
    format: OutputFormat,
    log_tail: usize,
) -> anyhow::Result<()> {
    let rendered = match format {
        OutputFormat::Text => render_snapshot_text(snapshot, log_tail),
        OutputFormat::Json | OutputFormat::Raw => render(snapshot, format)?,
    };
    println!("{rendered}");
    Ok(())
}

pub fn render_snapshot_text(snapshot: &SessionSnapshot, log_tail: usize) -> String {
    let mut out = String::new();
    let report = snapshot.report.cleaned();
    if !report.trim().is_empty() {
        out.push_str(report.trim_end());
        out.push_str("\n\n");
    }

    if !snapshot.tasks.is_empty() {
        out.push_str("Tasks:\n");
        for task in &snapshot.tasks {
            let _ = writeln!(out, "  {}", format_task(task));
        }
        out.push('\n');
    }

    let skip = snapshot.log.len().saturating_sub(log_tail);
    if skip < snapshot.log.len() {
        out.push_str("Log:\n");
        for entry in &snapshot.log[skip..] {
            let _ = writeln!(out, "  {}", format_entry(entry));
        }
        out.push('\n');
    }

    let _ = write!(out, "Status: {}", snapshot.status);
    if let Some(thread_id) = &snapshot.thread_id {
        let _ = write!(out, " ({thread_id})");
    }
    out
}

pub fn render_plan_text(plan: &[PlanItem]) -> String {
    let mut out = String::from("Proposed research plan:\n");
    for item in plan {
        let _ = writeln!(out, "  {}. {}", item.id, item.title);
        if !item.intent.is_empty() {
            let _ = writeln!(out, "     intent: {}", item.intent);
        }
        if !item.query.is_empty() {
            let _ = writeln!(out, "     query:  {}", item.query);
        }
    }
    out
}

pub fn format_entry(entry: &LogEntry) -> String {
    format!(
        "[{}] {}",
        entry.timestamp.with_timezone(&chrono::Local).format("%H:%M:%S"),
        entry.message
    )
}

pub fn format_task(task: &Task) -> String {
    let status = task.status.map_or("pending", TaskStatus::as_str);
    let title = task.title.as_deref().unwrap_or("(untitled)");
    let mut line = format!("#{} [{status}] {title}", task.task_id);
    if let Some(summary) = &task.summary {
        let _ = write!(line, ": {summary}");
    }
    line
}
