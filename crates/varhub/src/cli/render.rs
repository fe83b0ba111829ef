//! Turns row view models into terminal text or JSON.
//!
//! Rows are printed exactly in the order the adapters derived them; nothing here
//! sorts, filters or decides statuses.

use anyhow::Result;
use chrono::{DateTime, Utc};
use console::Style;
use serde_json::{json, Value};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};
use varhubapp::adapters::tree::{NodeKind, TreeIcon};
use varhubapp::session::LoadState;
use varhubapp::status::{Status, StatusBadge};
use varhubapp::store::ChangeSummary;
use varhubapp::{ViewKind, ViewSession};

use super::styles;

const MAX_CELL_WIDTH: usize = 40;
const GAP: &str = "  ";

#[derive(Debug, Clone, Default)]
struct Cell {
    text: String,
    style: Option<&'static Style>,
}

impl Cell {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: None,
        }
    }

    fn styled(text: impl Into<String>, style: &'static Style) -> Self {
        Self {
            text: text.into(),
            style: Some(style),
        }
    }

    fn with_style(self, style: Option<&'static Style>) -> Self {
        Self {
            style: style.or(self.style),
            ..self
        }
    }

    fn paint(&self, text: &str) -> String {
        match self.style {
            Some(style) if !text.is_empty() => style.apply_to(text).to_string(),
            _ => text.to_string(),
        }
    }
}

/// Left-aligned columns sized by display width. Trailing blanks are trimmed.
fn grid(header: &[String], rows: &[Vec<Cell>]) -> String {
    let clipped: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|c| truncate_to_width(&c.text, MAX_CELL_WIDTH)).collect())
        .collect();
    let mut widths: Vec<usize> = header.iter().map(|h| h.width()).collect();
    for row in &clipped {
        for (i, text) in row.iter().enumerate() {
            if i >= widths.len() {
                widths.push(0);
            }
            widths[i] = widths[i].max(text.width());
        }
    }

    let mut out = String::new();
    let head: Vec<Cell> = header.iter().map(|h| Cell::styled(h.clone(), &styles::HEADER)).collect();
    let head_text: Vec<String> = header.to_vec();
    push_line(&mut out, &head, &head_text, &widths);
    for (row, texts) in rows.iter().zip(&clipped) {
        push_line(&mut out, row, texts, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[Cell], texts: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (i, (cell, text)) in cells.iter().zip(texts).enumerate() {
        if i > 0 {
            line.push_str(GAP);
        }
        line.push_str(&cell.paint(text));
        if i + 1 < cells.len() {
            line.push_str(&" ".repeat(widths[i].saturating_sub(text.width())));
        }
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut current = 0;
    let limit = max_width.saturating_sub(1);
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if current + w > limit {
            break;
        }
        result.push(c);
        current += w;
    }
    result.push('…');
    result
}

fn status_cell(status: Option<&Status>) -> Cell {
    match status.map(Status::badge) {
        None => Cell::default(),
        Some(StatusBadge::Letter { letter, tone, .. }) => Cell::styled(letter.to_string(), styles::tone(tone)),
        Some(StatusBadge::ErrorIcon { message }) => Cell::styled(format!("! {}", message), &styles::ERROR),
    }
}

fn value_cell(value: &str, is_secret: bool) -> Cell {
    if is_secret {
        Cell::styled(value, &styles::SECRET)
    } else {
        Cell::plain(value)
    }
}

fn disabled_style(disabled: bool) -> Option<&'static Style> {
    disabled.then_some(&*styles::DELETED)
}

fn header(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn placeholder(text: &str) -> String {
    format!("{}\n", styles::MUTED.apply_to(text))
}

pub fn view_text(session: &ViewSession, kind: ViewKind) -> String {
    let mask = session.secret_mask();
    let (body, shown) = match kind {
        ViewKind::Table => {
            let rows = session.table().rows(mask);
            let cells: Vec<Vec<Cell>> = rows
                .iter()
                .map(|r| {
                    let off = disabled_style(r.disabled);
                    vec![
                        Cell::styled(r.group_name.as_str(), &styles::GROUP).with_style(off),
                        Cell::plain(r.name.as_str()).with_style(off),
                        value_cell(&r.value, r.is_secret).with_style(off),
                        status_cell(r.status.as_ref()),
                    ]
                })
                .collect();
            let body = match session.table().placeholder() {
                Some(text) => placeholder(text),
                None => grid(&header(&["GROUP", "NAME", "VALUE", "STATUS"]), &cells),
            };
            (body, rows.len())
        }
        ViewKind::Home => {
            let rows = session.tree().rows(mask);
            let cells: Vec<Vec<Cell>> = rows
                .iter()
                .map(|r| {
                    let marker = match (r.expandable, r.expanded) {
                        (true, true) => "▾ ",
                        (true, false) => "▸ ",
                        (false, _) => "  ",
                    };
                    let name = format!("{}{}{}", "  ".repeat(r.depth), marker, r.name);
                    let name = match r.kind {
                        NodeKind::Group => Cell::styled(name, &styles::GROUP),
                        NodeKind::File | NodeKind::FileProperty => Cell::styled(name, &styles::MUTED),
                        NodeKind::GroupVariable => Cell::plain(name),
                    };
                    let is_secret = r.icon == TreeIcon::Key;
                    let off = disabled_style(r.disabled);
                    vec![
                        name.with_style(off),
                        value_cell(&r.value, is_secret).with_style(off),
                        status_cell(r.status.as_ref()),
                    ]
                })
                .collect();
            let body = match session.tree().placeholder() {
                Some(text) => placeholder(text),
                None => grid(&header(&["NAME", "VALUE", "STATUS"]), &cells),
            };
            (body, rows.len())
        }
        ViewKind::Matrix => {
            let matrix = session.matrix();
            let rows = matrix.rows(mask);
            let mut head = vec!["NAME".to_string()];
            head.extend(matrix.groups().iter().map(|g| g.name.clone()));
            head.push("STATUS".to_string());
            let cells: Vec<Vec<Cell>> = rows
                .iter()
                .map(|r| {
                    let off = disabled_style(r.disabled);
                    let mut line = vec![Cell::plain(r.name.as_str()).with_style(off)];
                    line.extend(r.cells.iter().map(|c| {
                        let cell = match (&c.status, c.value.is_empty()) {
                            (Some(Status::Untracked), true) => Cell::styled("-", &styles::MUTED),
                            (Some(status), _) => Cell::plain(format!("{} [{}]", c.value, status.tag())),
                            (None, _) => value_cell(&c.value, c.is_secret),
                        };
                        cell.with_style(off)
                    }));
                    line.push(status_cell(r.status.as_ref()));
                    line
                })
                .collect();
            let body = match matrix.placeholder() {
                Some(text) => placeholder(text),
                None => grid(&head, &cells),
            };
            (body, rows.len())
        }
    };

    let mut out = body;
    out.push('\n');
    out.push_str(&footer(session, shown));
    out
}

fn footer(session: &ViewSession, shown: usize) -> String {
    let mut line = format!("{} {}", shown, if shown == 1 { "row" } else { "rows" });
    if let LoadState::Loaded { at } = session.load_state() {
        line.push_str(&format!(" · loaded {}", format_time_ago(*at)));
    }
    let mut out = format!("{}\n", styles::MUTED.apply_to(line));

    let summary = session.change_summary();
    if summary.is_clean() {
        out.push_str(&format!("{}\n", styles::MUTED.apply_to("no pending changes")));
    } else {
        out.push_str(&format!("pending: {}\n", describe(&summary)));
        if session.has_errors() {
            out.push_str(&format!("{}\n", styles::ERROR.apply_to("fix the errors above before saving")));
        }
    }
    out
}

fn describe(summary: &ChangeSummary) -> String {
    let mut parts = vec![
        styles::SUCCESS.apply_to(format!("{} added", summary.added)).to_string(),
        styles::WARNING.apply_to(format!("{} modified", summary.modified)).to_string(),
        styles::ERROR.apply_to(format!("{} deleted", summary.deleted)).to_string(),
    ];
    if summary.invalid > 0 {
        parts.push(styles::ERROR.apply_to(format!("{} invalid", summary.invalid)).to_string());
    }
    parts.join(", ")
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let elapsed = Utc::now().signed_duration_since(timestamp);
    timeago::Formatter::new().convert(elapsed.to_std().unwrap_or_default())
}

fn kind_name(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Group => "group",
        NodeKind::GroupVariable => "variable",
        NodeKind::File => "file",
        NodeKind::FileProperty => "property",
    }
}

pub fn view_json(session: &ViewSession, kind: ViewKind) -> Result<String> {
    let mask = session.secret_mask();
    let rows: Vec<Value> = match kind {
        ViewKind::Table => session
            .table()
            .rows(mask)
            .into_iter()
            .map(|r| {
                json!({
                    "group": r.group_name,
                    "name": r.name,
                    "value": r.value,
                    "secret": r.is_secret,
                    "deleted": r.disabled,
                    "status": r.status,
                })
            })
            .collect(),
        ViewKind::Home => session
            .tree()
            .rows(mask)
            .into_iter()
            .map(|r| {
                json!({
                    "kind": kind_name(r.kind),
                    "depth": r.depth,
                    "name": r.name,
                    "value": r.value,
                    "expanded": r.expanded,
                    "deleted": r.disabled,
                    "status": r.status,
                })
            })
            .collect(),
        ViewKind::Matrix => {
            let matrix = session.matrix();
            matrix
                .rows(mask)
                .into_iter()
                .map(|r| {
                    let cells: serde_json::Map<String, Value> = matrix
                        .groups()
                        .iter()
                        .zip(&r.cells)
                        .map(|(g, c)| {
                            let cell = json!({ "value": c.value, "secret": c.is_secret, "status": c.status });
                            (g.name.clone(), cell)
                        })
                        .collect();
                    json!({
                        "name": r.name,
                        "deleted": r.disabled,
                        "status": r.status,
                        "cells": cells,
                    })
                })
                .collect()
        }
    };

    let summary = session.change_summary();
    let doc = json!({
        "view": kind.as_str(),
        "rows": rows,
        "changes": {
            "added": summary.added,
            "modified": summary.modified,
            "deleted": summary.deleted,
            "invalid": summary.invalid,
        },
        "canSave": session.can_save(),
    });
    Ok(format!("{}\n", serde_json::to_string_pretty(&doc)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use varhubapp::model::{LibrarySnapshot, SecureFile, VariableGroup, VariableValue};

    fn session() -> ViewSession {
        console::set_colors_enabled(false);
        let mut session = ViewSession::default();
        session.load(LibrarySnapshot {
            variable_groups: vec![VariableGroup::new(1, "prod")
                .with_variable("Api.Url", VariableValue::plain("https://api"))
                .with_variable("Token", VariableValue::secret(None))],
            secure_files: vec![SecureFile::new("cert.pfx")],
        });
        session
    }

    #[test]
    fn truncates_by_display_width() {
        assert_eq!(truncate_to_width("short", 10), "short");
        assert_eq!(truncate_to_width("abcdefghij", 5), "abcd…");
        assert_eq!(truncate_to_width("日本語テキスト", 5), "日本…");
    }

    #[test]
    fn grid_aligns_and_trims() {
        console::set_colors_enabled(false);
        let out = grid(
            &header(&["A", "B"]),
            &[
                vec![Cell::plain("long-name"), Cell::plain("")],
                vec![Cell::plain("x"), Cell::plain("y")],
            ],
        );
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines, vec!["A          B", "long-name", "x          y"]);
    }

    #[test]
    fn table_text_masks_secrets() {
        let out = view_text(&session(), ViewKind::Table);
        assert!(out.contains("Api.Url"));
        assert!(out.contains("******"));
        assert!(out.contains("no pending changes"));
    }

    #[test]
    fn table_text_shows_placeholder_when_filtered_out() {
        let mut session = session();
        session.set_filter_keyword("zzz");
        let out = view_text(&session, ViewKind::Table);
        assert!(out.starts_with("No items found"));
        assert!(out.contains("0 rows"));
    }

    #[test]
    fn json_carries_statuses_and_summary() {
        let mut session = session();
        let id = session.add_variable(1).unwrap();
        session.edit(id, varhubapp::model::Field::Name, "New").unwrap();

        let doc: Value = serde_json::from_str(&view_json(&session, ViewKind::Table).unwrap()).unwrap();
        assert_eq!(doc["view"], "table");
        assert_eq!(doc["changes"]["added"], 1);
        assert_eq!(doc["canSave"], true);
        let new_row = doc["rows"]
            .as_array()
            .unwrap()
            .iter()
            .find(|r| r["name"] == "New")
            .unwrap();
        assert_eq!(new_row["status"]["type"], "Untracked");
    }

    #[test]
    fn tree_json_lists_files_at_root() {
        let doc: Value = serde_json::from_str(&view_json(&session(), ViewKind::Home).unwrap()).unwrap();
        let kinds: Vec<&str> = doc["rows"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["kind"].as_str().unwrap())
            .collect();
        assert_eq!(kinds, vec!["group", "file"]);
    }
}
