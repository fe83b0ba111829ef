//! Per-command handlers: build a session, apply scripted edits, hand rows to `render`.

use anyhow::{anyhow, bail, Context, Result};
use varhubapp::adapters::matrix::{self, MatrixEvent};
use varhubapp::adapters::{table, tree};
use varhubapp::config::PanelConfig;
use varhubapp::model::{Field, GroupId, RecordId, RowId};
use varhubapp::pipeline::SortSpec;
use varhubapp::session::LoadState;
use varhubapp::source::JsonFileSource;
use varhubapp::store::{Mutation, Rejection};
use varhubapp::{ViewKind, ViewSession};

use super::render;
use super::setup::{ConfigAction, Output, ViewArgs};
use super::styles;

pub fn view(config: PanelConfig, kind: ViewKind, args: &ViewArgs, collapsed: bool) -> Result<()> {
    let mut session = open(config, &args.file)?;
    session.set_view(kind);

    match kind {
        ViewKind::Matrix => apply_matrix_edits(&mut session, args)?,
        ViewKind::Home | ViewKind::Table => apply_store_edits(&mut session, args)?,
    }
    if let Some(column) = &args.sort {
        let spec = sort_spec(&session, kind, column, args.desc)?;
        session.set_sort(kind, spec);
    }
    if let Some(text) = &args.filter {
        session.set_filter_keyword(text);
    }
    if kind == ViewKind::Home && !collapsed {
        session.tree_mut().expand_all();
    }

    let output = match args.output {
        Output::Text => render::view_text(&session, kind),
        Output::Json => render::view_json(&session, kind)?,
    };
    print!("{}", output);
    Ok(())
}

pub fn config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Gen => print!("{}", PanelConfig::template()),
        ConfigAction::Path => match PanelConfig::user_config_path() {
            Some(path) => println!("{}", path.display()),
            None => bail!("no home directory to look up a config file in"),
        },
    }
    Ok(())
}

fn open(config: PanelConfig, file: &std::path::Path) -> Result<ViewSession> {
    let runtime = tokio::runtime::Runtime::new().context("starting runtime")?;
    let mut session = ViewSession::new(config);
    let source = JsonFileSource::new(file);
    runtime.block_on(session.refresh(&source));
    if let LoadState::Failed(message) = session.load_state() {
        bail!("{}", message);
    }
    Ok(session)
}

fn sort_spec(session: &ViewSession, kind: ViewKind, column: &str, desc: bool) -> Result<SortSpec> {
    let index = match (kind, column.to_lowercase().as_str()) {
        (ViewKind::Table, "name") => table::NAME_COLUMN,
        (ViewKind::Table, "value") => table::VALUE_COLUMN,
        (ViewKind::Home, "name") => tree::NAME_COLUMN,
        (ViewKind::Home, "value") => tree::VALUE_COLUMN,
        (ViewKind::Matrix, "name") => matrix::NAME_COLUMN,
        (ViewKind::Matrix, _) => session
            .matrix()
            .groups()
            .iter()
            .position(|g| g.name == column)
            .map(matrix::group_column)
            .ok_or_else(|| anyhow!("unknown matrix column: {}", column))?,
        _ => bail!("unknown column for {}: {} (expected name or value)", kind, column),
    };
    Ok(if desc {
        SortSpec::descending(index)
    } else {
        SortSpec::ascending(index)
    })
}

/// `GROUP:NAME`
fn parse_target(raw: &str) -> Result<(&str, &str)> {
    raw.split_once(':')
        .filter(|(group, name)| !group.is_empty() && !name.is_empty())
        .ok_or_else(|| anyhow!("expected GROUP:NAME, got '{}'", raw))
}

/// `GROUP:NAME=TEXT`
fn parse_assignment(raw: &str) -> Result<(&str, &str, &str)> {
    let (target, text) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected GROUP:NAME=VALUE, got '{}'", raw))?;
    let (group, name) = parse_target(target)?;
    Ok((group, name, text))
}

/// The matrix addresses rows by name alone; a group prefix is accepted and ignored.
fn row_name(raw: &str) -> &str {
    raw.split_once(':').map_or(raw, |(_, name)| name)
}

fn warn_rejected(target: &str, outcome: Mutation) {
    let reason = match outcome {
        Mutation::Rejected(Rejection::SecretName) => "secret variable names cannot be changed",
        Mutation::Rejected(Rejection::Deleted) => "variable is deleted",
        Mutation::Applied | Mutation::Unchanged => return,
    };
    eprintln!("{} {}: {}", styles::WARNING.apply_to("warning:"), target, reason);
}

fn find_record(session: &ViewSession, group: &str, name: &str) -> Option<RecordId> {
    session
        .store()
        .records()
        .iter()
        .find(|r| r.group_name == group && r.name == name && !r.is_deleted())
        .map(|r| r.id)
}

fn require_record(session: &ViewSession, group: &str, name: &str) -> Result<RecordId> {
    find_record(session, group, name).ok_or_else(|| anyhow!("no variable '{}' in group '{}'", name, group))
}

fn store_group_id(session: &ViewSession, group: &str) -> Result<GroupId> {
    session
        .store()
        .groups()
        .iter()
        .find(|g| g.name == group)
        .map(|g| g.id)
        .ok_or_else(|| anyhow!("unknown group: {}", group))
}

fn apply_store_edits(session: &mut ViewSession, args: &ViewArgs) -> Result<()> {
    for raw in &args.set {
        let (group, name, value) = parse_assignment(raw)?;
        let id = match find_record(session, group, name) {
            Some(id) => id,
            None => {
                let group_id = store_group_id(session, group)?;
                let id = session.add_variable(group_id)?;
                session.edit(id, Field::Name, name)?;
                id
            }
        };
        warn_rejected(raw, session.edit(id, Field::Value, value)?);
    }
    for raw in &args.rename {
        let (group, name, new_name) = parse_assignment(raw)?;
        let id = require_record(session, group, name)?;
        warn_rejected(raw, session.edit(id, Field::Name, new_name)?);
    }
    for raw in &args.toggle_secret {
        let (group, name) = parse_target(raw)?;
        let id = require_record(session, group, name)?;
        warn_rejected(raw, session.toggle_secret(id)?);
    }
    for raw in &args.delete {
        let (group, name) = parse_target(raw)?;
        let id = require_record(session, group, name)?;
        warn_rejected(raw, session.delete(id)?);
    }
    Ok(())
}

fn matrix_group_id(session: &ViewSession, group: &str) -> Result<GroupId> {
    session
        .matrix()
        .groups()
        .iter()
        .find(|g| g.name == group)
        .map(|g| g.id)
        .ok_or_else(|| anyhow!("unknown group: {}", group))
}

fn require_row(session: &ViewSession, name: &str) -> Result<RowId> {
    session
        .matrix()
        .find_by_name(name)
        .map(|r| r.id)
        .ok_or_else(|| anyhow!("no variable '{}' in the matrix", name))
}

fn apply_matrix_edits(session: &mut ViewSession, args: &ViewArgs) -> Result<()> {
    for raw in &args.set {
        let (group, name, value) = parse_assignment(raw)?;
        let group = matrix_group_id(session, group)?;
        let existing = session.matrix().find_by_name(name).map(|r| r.id);
        let row = match existing {
            Some(row) => row,
            None => {
                session.handle_matrix(MatrixEvent::AddRow)?;
                let row = session
                    .matrix()
                    .base_rows()
                    .last()
                    .map(|r| r.id)
                    .ok_or_else(|| anyhow!("matrix row was not added"))?;
                session.handle_matrix(MatrixEvent::Rename {
                    row,
                    name: name.to_string(),
                })?;
                row
            }
        };
        let outcome = session.handle_matrix(MatrixEvent::EditCell {
            row,
            group,
            value: value.to_string(),
        })?;
        warn_rejected(raw, outcome);
    }
    for raw in &args.rename {
        let (target, new_name) = raw
            .split_once('=')
            .ok_or_else(|| anyhow!("expected NAME=NEW_NAME, got '{}'", raw))?;
        let row = require_row(session, row_name(target))?;
        let outcome = session.handle_matrix(MatrixEvent::Rename {
            row,
            name: new_name.to_string(),
        })?;
        warn_rejected(raw, outcome);
    }
    for raw in &args.toggle_secret {
        let (group, name) = parse_target(raw)?;
        let group = matrix_group_id(session, group)?;
        let row = require_row(session, name)?;
        warn_rejected(raw, session.handle_matrix(MatrixEvent::ToggleCellSecret { row, group })?);
    }
    for raw in &args.delete {
        let row = require_row(session, row_name(raw))?;
        warn_rejected(raw, session.handle_matrix(MatrixEvent::DeleteRow(row))?);
    }
    Ok(())
}
