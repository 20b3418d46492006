//! CLI presentation: text and json formatters per command.

use crate::browser::HistoryEntry;
use crate::cli::parse::OutputFormat;
use crate::frame::Frame;
use crate::navigation::NavigationEvent;
use crate::response::Message;
use crate::unpack::Value;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::json;
use std::collections::BTreeMap;

/// Everything a headless visit observed.
#[derive(Debug, Clone)]
pub struct VisitReport {
    pub frame: Frame,
    pub title: String,
    pub history: Vec<HistoryEntry>,
    /// Full page loads the controller handed off (reloads, foreign origins).
    pub assigned: Vec<String>,
    pub events: Vec<NavigationEvent>,
}

fn heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

pub fn format_decoded(value: &Value, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => pretty(&value.to_json()),
        OutputFormat::Text => {
            let mut out = format!("{}\n\n{}\n", heading("Decoded value"), pretty(&value.to_json()));
            let mut tags = BTreeMap::new();
            count_instances(value, &mut tags);
            if !tags.is_empty() {
                let mut table = Table::new();
                table.load_preset(UTF8_BORDERS_ONLY);
                table.set_header(vec!["Type", "Sites"]);
                for (tag, count) in &tags {
                    table.add_row(vec![tag.clone(), count.to_string()]);
                }
                out.push_str(&format!("\n{}\n\n{}\n", heading("Constructed instances"), table));
            }
            out
        }
    }
}

// Counts every site; a shared instance reached twice counts twice.
fn count_instances(value: &Value, tags: &mut BTreeMap<String, usize>) {
    match value {
        Value::List(items) => items.iter().for_each(|v| count_instances(v, tags)),
        Value::Dict(map) => map.values().for_each(|v| count_instances(v, tags)),
        Value::Object(instance) => *tags.entry(instance.tag().to_string()).or_default() += 1,
        _ => {}
    }
}

fn messages_json(messages: &[Message]) -> serde_json::Value {
    json!(messages)
}

fn event_json(event: &NavigationEvent) -> serde_json::Value {
    match event {
        NavigationEvent::Navigated {
            frame,
            new_frame,
            messages,
        } => json!({
            "event": "navigated",
            "frame_id": frame.id,
            "view": frame.view,
            "path": frame.path,
            "new_frame": new_frame,
            "messages": messages_json(messages),
        }),
        NavigationEvent::Escalated => json!({ "event": "escalated" }),
        NavigationEvent::OverlayClosed { messages } => json!({
            "event": "overlay_closed",
            "messages": messages_json(messages),
        }),
        NavigationEvent::ServerError(kind) => json!({
            "event": "server_error",
            "kind": kind.as_str(),
        }),
    }
}

fn event_line(event: &NavigationEvent) -> String {
    match event {
        NavigationEvent::Navigated {
            frame, new_frame, ..
        } => {
            let kind = if *new_frame { "new frame" } else { "props update" };
            format!("{} {} ({}, frame {})", "navigated".green(), frame.path, kind, frame.id)
        }
        NavigationEvent::Escalated => format!("{}", "escalated".yellow()),
        NavigationEvent::OverlayClosed { .. } => format!("{}", "overlay closed".yellow()),
        NavigationEvent::ServerError(kind) => format!("{} ({})", "error".red(), kind.as_str()),
    }
}

pub fn format_visit(report: &VisitReport, format: OutputFormat) -> String {
    let frame = &report.frame;
    match format {
        OutputFormat::Json => pretty(&json!({
            "frame": {
                "id": frame.id,
                "path": frame.path,
                "view": frame.view,
                "title": frame.metadata.title,
                "props": frame.props.to_json(),
                "context": frame.context.to_json(),
            },
            "document_title": report.title,
            "history": report.history.iter().map(|e| json!({
                "url": e.url,
                "state": e.state,
            })).collect::<Vec<_>>(),
            "assigned": report.assigned,
            "events": report.events.iter().map(event_json).collect::<Vec<_>>(),
        })),
        OutputFormat::Text => {
            let mut out = String::new();

            let mut table = Table::new();
            table.load_preset(UTF8_BORDERS_ONLY);
            table.set_header(vec!["Frame", ""]);
            table.add_row(vec!["Id".to_string(), frame.id.to_string()]);
            table.add_row(vec!["Path".to_string(), frame.path.clone()]);
            table.add_row(vec!["View".to_string(), frame.view.clone()]);
            table.add_row(vec!["Title".to_string(), frame.metadata.title.clone()]);
            out.push_str(&format!("{}\n\n{}\n", heading("Current frame"), table));

            out.push_str(&format!(
                "\n{}\n\n{}\n",
                heading("Props"),
                pretty(&frame.props.to_json())
            ));

            let messages: Vec<&Message> = report
                .events
                .iter()
                .filter_map(|e| match e {
                    NavigationEvent::Navigated { messages, .. }
                    | NavigationEvent::OverlayClosed { messages } => Some(messages),
                    _ => None,
                })
                .flatten()
                .collect();
            if !messages.is_empty() {
                let mut table = Table::new();
                table.load_preset(UTF8_BORDERS_ONLY);
                table.set_header(vec!["Level", "Message"]);
                for message in messages {
                    table.add_row(vec![message.level.clone(), message.text.clone()]);
                }
                out.push_str(&format!("\n{}\n\n{}\n", heading("Messages"), table));
            }

            if !report.events.is_empty() {
                out.push_str(&format!("\n{}\n\n", heading("Events")));
                for event in &report.events {
                    out.push_str(&format!("  {}\n", event_line(event)));
                }
            }

            out.push_str(&format!("\n{}\n\n", heading("History")));
            for entry in &report.history {
                out.push_str(&format!("  {}\n", entry.url));
            }
            for url in &report.assigned {
                out.push_str(&format!("  {} {}\n", "page load".dimmed(), url));
            }
            out
        }
    }
}
