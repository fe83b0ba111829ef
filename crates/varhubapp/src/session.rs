//! # View Session
//!
//! [`ViewSession`] is the top-level object a host creates per panel. It owns the
//! record store, the shared filter, the configuration, the active view and the three
//! adapters, so none of them needs to be a process-wide global.
//!
//! ## Event Flow
//!
//! The rendering collaborator reports events through [`ViewSession::handle_table`],
//! [`ViewSession::handle_tree`] and [`ViewSession::handle_matrix`]. Every event runs to
//! completion before the call returns:
//!
//! 1. the store applies the mutation and re-derives statuses,
//! 2. dependent adapters recompute, sort then filter,
//! 3. session subscribers receive [`SessionEvent`]s.
//!
//! Matrix cell edits, cell locks and row deletes go to the store like any other edit.
//! Only a matrix row rename and an added row that has no value yet stay in the matrix.
//!
//! A keyword change only re-runs the filter stage of each view.
//!
//! ## Loading
//!
//! Loading is the only suspending operation. Each request gets a [`RefreshTicket`];
//! a result is applied only if its ticket is still the latest one issued, so a slow
//! response can never overwrite a newer one. A failed load replaces the view with
//! `"Error: <message>"` and leaves the previous data untouched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::adapters::matrix::{CellTarget, MatrixAdapter, MatrixEvent};
use crate::adapters::table::{TableAdapter, TableEvent};
use crate::adapters::tree::{NodeKey, TreeAdapter, TreeEvent};
use crate::config::PanelConfig;
use crate::error::{Result, VarhubError};
use crate::filter::FilterState;
use crate::model::{Field, GroupId, LibrarySnapshot, RecordId, RowId, VariableRecord};
use crate::observable::{Publisher, SubscriptionId};
use crate::pipeline::SortSpec;
use crate::source::LibrarySource;
use crate::store::{ChangeSummary, Mutation, RecordStore, Rejection};

/// The view tabs of the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    /// The grouped tree.
    #[default]
    Home,
    Table,
    Matrix,
}

impl ViewKind {
    pub const ALL: [ViewKind; 3] = [ViewKind::Home, ViewKind::Table, ViewKind::Matrix];

    pub fn as_str(&self) -> &'static str {
        match self {
            ViewKind::Home => "home",
            ViewKind::Table => "table",
            ViewKind::Matrix => "matrix",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewKind {
    type Err = VarhubError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "home" | "tree" => Ok(ViewKind::Home),
            "table" => Ok(ViewKind::Table),
            "matrix" => Ok(ViewKind::Matrix),
            other => Err(VarhubError::Config(format!("unknown view: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded {
        at: DateTime<Utc>,
    },
    Failed(String),
}

impl LoadState {
    /// What to show instead of the view, if anything.
    pub fn blocking_message(&self) -> Option<String> {
        match self {
            LoadState::Idle | LoadState::Loading => Some("Loading...".to_string()),
            LoadState::Failed(message) => Some(format!("Error: {}", message)),
            LoadState::Loaded { .. } => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadState::Loaded { .. })
    }
}

/// Handle of one load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    LoadStateChanged(LoadState),
    ViewChanged(ViewKind),
    /// A view's rows were re-derived. `resorted` is false for filter-only changes.
    Derived { view: ViewKind, rows: usize, resorted: bool },
    /// An edit was refused; nothing changed.
    Rejected(Rejection),
}

#[derive(Debug)]
pub struct ViewSession {
    store: RecordStore,
    filter: FilterState,
    config: PanelConfig,
    view: ViewKind,
    load_state: LoadState,
    latest_ticket: u64,
    table: TableAdapter,
    tree: TreeAdapter,
    matrix: MatrixAdapter,
    publisher: Publisher<SessionEvent>,
}

impl Default for ViewSession {
    fn default() -> Self {
        Self::new(PanelConfig::default())
    }
}

impl ViewSession {
    pub fn new(config: PanelConfig) -> Self {
        Self {
            store: RecordStore::new(),
            filter: FilterState::new(),
            view: config.default_view,
            load_state: LoadState::Idle,
            latest_ticket: 0,
            table: TableAdapter::new(&config),
            tree: TreeAdapter::new(&config),
            matrix: MatrixAdapter::new(&config),
            publisher: Publisher::new(),
            config,
        }
    }

    // --- loading ---

    /// Starts a load request. Any ticket issued earlier becomes stale.
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.latest_ticket += 1;
        self.set_load_state(LoadState::Loading);
        RefreshTicket(self.latest_ticket)
    }

    /// Applies the outcome of a load request. Returns false if the ticket is stale and
    /// the result was dropped.
    pub fn complete_refresh(&mut self, ticket: RefreshTicket, result: Result<LibrarySnapshot>) -> bool {
        if ticket.0 != self.latest_ticket {
            tracing::debug!(
                ticket = ticket.0,
                latest = self.latest_ticket,
                "dropping stale load result"
            );
            return false;
        }
        match result {
            Ok(snapshot) => {
                self.apply_snapshot(snapshot);
                self.set_load_state(LoadState::Loaded { at: Utc::now() });
            }
            Err(e) => {
                tracing::warn!(error = %e, "library load failed");
                self.set_load_state(LoadState::Failed(e.to_string()));
            }
        }
        true
    }

    /// Fetches from `source` and applies the result.
    pub async fn refresh<S: LibrarySource>(&mut self, source: &S) -> bool {
        let ticket = self.begin_refresh();
        let result = source.fetch_snapshot().await;
        self.complete_refresh(ticket, result)
    }

    /// Loads an already fetched snapshot.
    pub fn load(&mut self, snapshot: LibrarySnapshot) {
        let ticket = self.begin_refresh();
        self.complete_refresh(ticket, Ok(snapshot));
    }

    fn apply_snapshot(&mut self, snapshot: LibrarySnapshot) {
        self.store.load(snapshot.variable_groups, snapshot.secure_files);
        self.table.rebuild(&self.store);
        self.emit_derived(ViewKind::Table, true);
        self.tree.rebuild(&self.store);
        self.emit_derived(ViewKind::Home, true);
        self.matrix.rebuild(&self.store);
        self.emit_derived(ViewKind::Matrix, true);
    }

    fn set_load_state(&mut self, state: LoadState) {
        if self.load_state == state {
            return;
        }
        self.load_state = state.clone();
        self.publisher.emit(&SessionEvent::LoadStateChanged(state));
    }

    // --- view and filter ---

    pub fn set_view(&mut self, view: ViewKind) -> bool {
        if self.view == view {
            return false;
        }
        self.view = view;
        self.publisher.emit(&SessionEvent::ViewChanged(view));
        true
    }

    pub fn set_filter_keyword(&mut self, keyword: &str) -> bool {
        let changed = self.filter.set_keyword(keyword);
        if changed {
            self.apply_filter();
        }
        changed
    }

    pub fn set_filter_item(&mut self, key: &str, value: &str) -> bool {
        let changed = self.filter.set_item(key, value);
        if changed {
            self.apply_filter();
        }
        changed
    }

    pub fn reset_filter(&mut self) {
        self.filter.reset();
        self.apply_filter();
    }

    fn apply_filter(&mut self) {
        let text = self.filter.effective_keyword().to_string();
        if self.table.set_filter_text(&text) {
            self.emit_derived(ViewKind::Table, false);
        }
        if self.tree.set_filter_text(&text) {
            self.emit_derived(ViewKind::Home, false);
        }
        if self.matrix.set_filter_text(&text) {
            self.emit_derived(ViewKind::Matrix, false);
        }
    }

    pub fn set_sort(&mut self, view: ViewKind, spec: SortSpec) {
        match view {
            ViewKind::Home => self.tree.set_sort(spec),
            ViewKind::Table => self.table.set_sort(spec),
            ViewKind::Matrix => self.matrix.set_sort(spec),
        }
        self.emit_derived(view, true);
    }

    // --- store mutations ---

    pub fn edit(&mut self, id: RecordId, field: Field, value: &str) -> Result<Mutation> {
        let outcome = self.store.mutate(id, field, value)?;
        Ok(self.after_store_mutation(outcome))
    }

    pub fn toggle_secret(&mut self, id: RecordId) -> Result<Mutation> {
        let outcome = self.store.toggle_secret(id)?;
        Ok(self.after_store_mutation(outcome))
    }

    pub fn delete(&mut self, id: RecordId) -> Result<Mutation> {
        let outcome = self.store.soft_delete(id)?;
        Ok(self.after_store_mutation(outcome))
    }

    /// Appends an empty variable to the group with backend id `group` and expands the
    /// group in the tree so the new row shows.
    pub fn add_variable(&mut self, group: GroupId) -> Result<RecordId> {
        let name = self
            .store
            .groups()
            .iter()
            .find(|g| g.id == group)
            .map(|g| g.name.clone())
            .ok_or(VarhubError::UnknownGroup(group))?;
        let id = self.store.add_variable(&name);
        self.rederive_store_views();
        if self.tree.reveal(NodeKey::Variable(id)) {
            self.emit_derived(ViewKind::Home, false);
        }
        Ok(id)
    }

    fn after_store_mutation(&mut self, outcome: Mutation) -> Mutation {
        match outcome {
            Mutation::Applied => self.rederive_store_views(),
            Mutation::Rejected(reason) => self.publisher.emit(&SessionEvent::Rejected(reason)),
            Mutation::Unchanged => {}
        }
        outcome
    }

    fn rederive_store_views(&mut self) {
        self.table.rebuild(&self.store);
        self.emit_derived(ViewKind::Table, true);
        self.tree.refresh(&self.store);
        self.emit_derived(ViewKind::Home, true);
        self.matrix.sync(&self.store);
        self.emit_derived(ViewKind::Matrix, true);
    }

    fn emit_derived(&mut self, view: ViewKind, resorted: bool) {
        let rows = match view {
            ViewKind::Home => self.tree.rows(&self.config.secret_mask).len(),
            ViewKind::Table => self.table.len(),
            ViewKind::Matrix => self.matrix.len(),
        };
        self.publisher.emit(&SessionEvent::Derived { view, rows, resorted });
    }

    // --- rendering events ---

    pub fn handle_table(&mut self, event: TableEvent) -> Result<Mutation> {
        match event {
            TableEvent::Edit { id, field, value } => self.edit(id, field, &value),
            TableEvent::Delete(id) => self.delete(id),
            TableEvent::ToggleSecret(id) => self.toggle_secret(id),
            TableEvent::Interaction { id, signal } => Ok(changed(self.table.interact(id, signal))),
            TableEvent::Resize { column, width } => Ok(changed(self.table.resize_column(column, width))),
            TableEvent::Sort(spec) => {
                self.set_sort(ViewKind::Table, spec);
                Ok(Mutation::Applied)
            }
        }
    }

    pub fn handle_tree(&mut self, event: TreeEvent) -> Result<Mutation> {
        match event {
            TreeEvent::Toggle(node) => Ok(changed(self.tree.toggle(node)?)),
            TreeEvent::Edit { node, field, value } => {
                let id = self.tree.record_id(node)?;
                self.edit(id, field, &value)
            }
            TreeEvent::Delete(node) => {
                let id = self.tree.record_id(node)?;
                self.delete(id)
            }
            TreeEvent::ToggleSecret(node) => {
                let id = self.tree.record_id(node)?;
                self.toggle_secret(id)
            }
            TreeEvent::Add(node) => {
                let group = self.tree.group_id(node)?;
                self.add_variable(group)?;
                Ok(Mutation::Applied)
            }
            TreeEvent::Interaction { node, signal } => Ok(changed(self.tree.interact(node, signal)?)),
            TreeEvent::Resize { column, width } => Ok(changed(self.tree.resize_column(column, width))),
            TreeEvent::Sort(spec) => {
                self.set_sort(ViewKind::Home, spec);
                Ok(Mutation::Applied)
            }
        }
    }

    pub fn handle_matrix(&mut self, event: MatrixEvent) -> Result<Mutation> {
        match event {
            MatrixEvent::EditCell { row, group, value } => self.edit_matrix_cell(row, group, &value),
            MatrixEvent::ToggleCellSecret { row, group } => match self.matrix.cell_target(row, group)? {
                CellTarget::Record(id) => self.toggle_secret(id),
                CellTarget::Rejected(reason) => Ok(self.after_matrix_change(Mutation::Rejected(reason))),
                // nothing to lock until the cell has a record
                CellTarget::Missing { .. } => Ok(Mutation::Unchanged),
            },
            MatrixEvent::DeleteRow(row) => self.delete_matrix_row(row),
            MatrixEvent::Rename { row, name } => {
                let outcome = self.matrix.rename_row(row, &name)?;
                Ok(self.after_matrix_change(outcome))
            }
            MatrixEvent::AddRow => {
                self.matrix.add_row();
                Ok(self.after_matrix_change(Mutation::Applied))
            }
            MatrixEvent::Interaction { row, group, signal } => Ok(changed(self.matrix.interact(row, group, signal))),
            MatrixEvent::Resize { column, width } => Ok(changed(self.matrix.resize_column(column, width))),
            MatrixEvent::Sort(spec) => {
                self.set_sort(ViewKind::Matrix, spec);
                Ok(Mutation::Applied)
            }
        }
    }

    /// A synthesized cell becomes a new record once it gets a value.
    fn edit_matrix_cell(&mut self, row: RowId, group: GroupId, value: &str) -> Result<Mutation> {
        match self.matrix.cell_target(row, group)? {
            CellTarget::Record(id) => self.edit(id, Field::Value, value),
            CellTarget::Rejected(reason) => Ok(self.after_matrix_change(Mutation::Rejected(reason))),
            CellTarget::Missing { .. } if value.is_empty() => Ok(Mutation::Unchanged),
            CellTarget::Missing {
                group_name,
                name,
                is_secret,
            } => {
                let mut record = VariableRecord::new_untracked(group_name, name.as_str(), value);
                record.is_secret = is_secret;
                self.store.append(record);
                self.matrix.attach(row, &name)?;
                Ok(self.after_store_mutation(Mutation::Applied))
            }
        }
    }

    fn delete_matrix_row(&mut self, row: RowId) -> Result<Mutation> {
        let records: Vec<RecordId> = self
            .matrix
            .row(row)
            .ok_or(VarhubError::UnknownRow(row))?
            .records()
            .collect();
        if records.is_empty() {
            let outcome = self.matrix.soft_delete_pending(row)?;
            return Ok(self.after_matrix_change(outcome));
        }
        let mut outcome = Mutation::Unchanged;
        for id in records {
            if self.store.soft_delete(id)?.is_applied() {
                outcome = Mutation::Applied;
            }
        }
        Ok(self.after_store_mutation(outcome))
    }

    fn after_matrix_change(&mut self, outcome: Mutation) -> Mutation {
        match outcome {
            Mutation::Applied => self.emit_derived(ViewKind::Matrix, true),
            Mutation::Rejected(reason) => self.publisher.emit(&SessionEvent::Rejected(reason)),
            Mutation::Unchanged => {}
        }
        outcome
    }

    // --- unsaved changes ---

    /// Unsaved work: everything in the store plus matrix renames and matrix rows that
    /// have no record yet. The same in every view.
    pub fn change_summary(&self) -> ChangeSummary {
        let mut summary = self.store.change_summary();
        summary += self.matrix.overlay_summary();
        summary
    }

    pub fn has_errors(&self) -> bool {
        self.store.has_errors() || self.matrix.has_errors()
    }

    /// There is something to save and nothing invalid.
    pub fn can_save(&self) -> bool {
        !self.has_errors() && !self.change_summary().is_clean()
    }

    // --- accessors ---

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn view(&self) -> ViewKind {
        self.view
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn table(&self) -> &TableAdapter {
        &self.table
    }

    pub fn tree(&self) -> &TreeAdapter {
        &self.tree
    }

    /// Expand state is transient UI state, so the tree may be driven directly.
    pub fn tree_mut(&mut self) -> &mut TreeAdapter {
        &mut self.tree
    }

    pub fn matrix(&self) -> &MatrixAdapter {
        &self.matrix
    }

    pub fn secret_mask(&self) -> &str {
        &self.config.secret_mask
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&SessionEvent) + 'static) -> SubscriptionId {
        self.publisher.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.publisher.unsubscribe(id)
    }
}

fn changed(changed: bool) -> Mutation {
    if changed {
        Mutation::Applied
    } else {
        Mutation::Unchanged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::tree::NodeKey;
    use crate::interaction::InteractionSignal;
    use crate::source::MemorySource;
    use crate::status::{Status, NAME_REQUIRED};
    use crate::store::fixtures;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn loaded_session() -> ViewSession {
        let mut session = ViewSession::default();
        session.load(LibrarySnapshot {
            variable_groups: fixtures::two_groups(),
            secure_files: vec![],
        });
        session
    }

    fn record_id(session: &ViewSession, group: &str, name: &str) -> RecordId {
        session
            .store()
            .records()
            .iter()
            .find(|r| r.group_name == group && r.name == name)
            .unwrap()
            .id
    }

    #[test]
    fn view_kind_parses_and_prints() {
        assert_eq!("tree".parse::<ViewKind>().unwrap(), ViewKind::Home);
        assert_eq!(" Matrix ".parse::<ViewKind>().unwrap(), ViewKind::Matrix);
        assert!("grid".parse::<ViewKind>().is_err());
        assert_eq!(ViewKind::Table.to_string(), "table");
    }

    #[test]
    fn default_view_comes_from_config() {
        let session = ViewSession::new(PanelConfig {
            default_view: ViewKind::Matrix,
            ..Default::default()
        });
        assert_eq!(session.view(), ViewKind::Matrix);
        assert_eq!(session.load_state().blocking_message().as_deref(), Some("Loading..."));
    }

    #[tokio::test]
    async fn refresh_loads_every_view() {
        let mut session = ViewSession::default();
        let source = MemorySource::new(fixtures::two_groups(), vec![crate::model::SecureFile::new("a.pfx")]);
        assert!(session.refresh(&source).await);

        assert!(session.load_state().is_loaded());
        assert_eq!(session.load_state().blocking_message(), None);
        assert_eq!(session.table().len(), 3);
        assert_eq!(session.matrix().len(), 2);
        assert_eq!(session.tree().rows("*").len(), 3);
    }

    #[tokio::test]
    async fn failed_refresh_blocks_the_view() {
        let mut session = loaded_session();
        assert!(session.refresh(&MemorySource::failing("401 Unauthorized")).await);
        assert_eq!(
            session.load_state().blocking_message().as_deref(),
            Some("Error: 401 Unauthorized")
        );
        // previous data stays in memory
        assert_eq!(session.store().len(), 3);
    }

    #[test]
    fn last_request_wins() {
        let mut session = ViewSession::default();
        let first = session.begin_refresh();
        let second = session.begin_refresh();

        let newer = LibrarySnapshot {
            variable_groups: fixtures::two_groups(),
            secure_files: vec![],
        };
        assert!(session.complete_refresh(second, Ok(newer)));
        assert!(!session.complete_refresh(first, Ok(LibrarySnapshot::default())));
        assert_eq!(session.store().len(), 3);
    }

    #[test]
    fn keyword_change_only_refilters() {
        let mut session = loaded_session();
        let before = session.table().pipeline().stage_counts();

        assert!(session.set_filter_keyword("K2"));
        let after = session.table().pipeline().stage_counts();
        assert_eq!(after.sorts, before.sorts);
        assert_eq!(after.filters, before.filters + 1);
        assert_eq!(session.table().len(), 1);
        assert_eq!(session.matrix().len(), 1);

        session.reset_filter();
        assert_eq!(session.table().len(), 3);
    }

    #[test]
    fn table_edits_flow_into_tree() {
        let mut session = loaded_session();
        let id = record_id(&session, "group2", "K1");
        session
            .handle_table(TableEvent::Edit {
                id,
                field: Field::Value,
                value: "v9".into(),
            })
            .unwrap();

        let group2 = session.tree().find(NodeKey::Group(2)).unwrap();
        assert_eq!(session.tree().item(group2).unwrap().status(), Some(&Status::Modified));
        assert_eq!(session.change_summary().modified, 1);
        assert!(session.can_save());
    }

    #[test]
    fn tree_add_creates_invalid_record_until_named() {
        let mut session = loaded_session();
        let group1 = session.tree().find(NodeKey::Group(1)).unwrap();
        session.handle_tree(TreeEvent::Add(group1)).unwrap();

        assert_eq!(session.store().len(), 4);
        assert!(!session.can_save());
        let added = session.store().records().last().unwrap();
        assert_eq!(added.status, Some(Status::error(NAME_REQUIRED)));
        assert_eq!(added.group_name, "group1");
    }

    #[test]
    fn add_variable_to_unknown_group_fails() {
        let mut session = loaded_session();
        assert!(matches!(session.add_variable(99), Err(VarhubError::UnknownGroup(99))));
        assert!(session.add_variable(2).is_ok());
    }

    #[test]
    fn rejected_edits_are_reported_not_raised() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut session = loaded_session();
        let sink = events.clone();
        session.subscribe(move |e| sink.borrow_mut().push(e.clone()));

        let id = record_id(&session, "group1", "K1");
        session.delete(id).unwrap();
        let outcome = session.edit(id, Field::Value, "x").unwrap();
        assert_eq!(outcome, Mutation::Rejected(Rejection::Deleted));
        assert_eq!(
            events.borrow().last(),
            Some(&SessionEvent::Rejected(Rejection::Deleted))
        );
    }

    #[test]
    fn interactions_do_not_touch_the_store() {
        let mut session = loaded_session();
        let id = record_id(&session, "group1", "K1");
        let outcome = session
            .handle_table(TableEvent::Interaction {
                id,
                signal: InteractionSignal::MouseEnter,
            })
            .unwrap();
        assert_eq!(outcome, Mutation::Applied);
        assert!(session.change_summary().is_clean());
    }

    #[test]
    fn summary_is_the_same_in_every_view() {
        let mut session = loaded_session();
        session.handle_matrix(MatrixEvent::AddRow).unwrap();
        assert_eq!(session.change_summary().invalid, 1);
        assert!(session.set_view(ViewKind::Matrix));
        assert_eq!(session.change_summary().invalid, 1);
        assert!(!session.can_save());
    }

    fn tree_labels(session: &ViewSession) -> Vec<String> {
        session.tree().rows("*").into_iter().map(|r| r.name).collect()
    }

    #[test]
    fn tree_edits_keep_the_edited_row_visible() {
        let mut session = loaded_session();
        let group2 = session.tree().find(NodeKey::Group(2)).unwrap();
        session.handle_tree(TreeEvent::Toggle(group2)).unwrap();
        assert_eq!(tree_labels(&session), vec!["group1", "group2", "K1", "K2"]);

        let k2 = record_id(&session, "group2", "K2");
        let node = session.tree().find(NodeKey::Variable(k2)).unwrap();
        session
            .handle_tree(TreeEvent::Edit {
                node,
                field: Field::Value,
                value: "v9".into(),
            })
            .unwrap();
        assert_eq!(tree_labels(&session), vec!["group1", "group2", "K1", "K2"]);
        let row = session
            .tree()
            .rows("*")
            .into_iter()
            .find(|r| r.key == NodeKey::Variable(k2))
            .unwrap();
        assert_eq!(row.value, "v9");
        assert_eq!(row.status, Some(Status::Modified));
    }

    #[test]
    fn tree_add_shows_the_new_row() {
        let mut session = loaded_session();
        let group2 = session.tree().find(NodeKey::Group(2)).unwrap();
        session.handle_tree(TreeEvent::Add(group2)).unwrap();

        let added = session.store().records().last().unwrap().id;
        let rows = session.tree().rows("*");
        let row = rows.iter().find(|r| r.key == NodeKey::Variable(added)).unwrap();
        assert_eq!(row.depth, 1);
        assert!(row.name_editable);
        // group1 stays collapsed
        assert_eq!(rows.len(), 5);
    }

    fn matrix_row(session: &ViewSession, name: &str) -> RowId {
        session.matrix().find_by_name(name).unwrap().id
    }

    #[test]
    fn table_edits_reach_the_matrix() {
        let mut session = loaded_session();
        let id = record_id(&session, "group1", "K1");
        session
            .handle_table(TableEvent::Edit {
                id,
                field: Field::Value,
                value: "v9".into(),
            })
            .unwrap();

        let k1 = session.matrix().find_by_name("K1").unwrap();
        assert_eq!(k1.cell(1).unwrap().value, "v9");
        assert_eq!(k1.cell(1).unwrap().status, Some(Status::Modified));
        assert_eq!(k1.cell(2).unwrap().value, "v1");
    }

    #[test]
    fn matrix_cell_edits_reach_the_store() {
        let mut session = loaded_session();
        let k1 = matrix_row(&session, "K1");
        session
            .handle_matrix(MatrixEvent::EditCell {
                row: k1,
                group: 2,
                value: "v7".into(),
            })
            .unwrap();
        let id = record_id(&session, "group2", "K1");
        assert_eq!(session.store().record(id).unwrap().value, "v7");
        assert_eq!(session.store().record(id).unwrap().status, Some(Status::Modified));
        assert_eq!(session.table().rows("*").iter().filter(|r| r.value == "v7").count(), 1);

        // the synthesized group1 cell of K2 becomes a new record
        let k2 = matrix_row(&session, "K2");
        session
            .handle_matrix(MatrixEvent::EditCell {
                row: k2,
                group: 1,
                value: "fresh".into(),
            })
            .unwrap();
        let added = record_id(&session, "group1", "K2");
        assert_eq!(session.store().record(added).unwrap().status, Some(Status::Untracked));
        let cell = session.matrix().row(k2).unwrap().cell(1).unwrap().clone();
        assert_eq!((cell.record, cell.value.as_str()), (Some(added), "fresh"));
        assert_eq!(session.change_summary().added, 1);
        assert_eq!(session.change_summary().modified, 1);
        assert!(session.can_save());
    }

    #[test]
    fn matrix_lock_and_delete_go_through_the_store() {
        let mut session = loaded_session();
        let k2 = matrix_row(&session, "K2");
        let id = record_id(&session, "group2", "K2");

        session
            .handle_matrix(MatrixEvent::ToggleCellSecret { row: k2, group: 2 })
            .unwrap();
        assert!(session.store().record(id).unwrap().is_secret);
        let outcome = session
            .handle_matrix(MatrixEvent::Rename {
                row: k2,
                name: "K3".into(),
            })
            .unwrap();
        assert_eq!(outcome, Mutation::Rejected(Rejection::SecretName));

        let k1 = matrix_row(&session, "K1");
        session.handle_matrix(MatrixEvent::DeleteRow(k1)).unwrap();
        assert_eq!(session.store().change_summary().deleted, 2);
        assert!(session.matrix().row(k1).unwrap().is_deleted());
    }

    #[test]
    fn matrix_added_row_creates_records_on_first_value() {
        let mut session = loaded_session();
        session.handle_matrix(MatrixEvent::AddRow).unwrap();
        let row = session.matrix().base_rows().last().unwrap().id;
        session
            .handle_matrix(MatrixEvent::Rename {
                row,
                name: "K3".into(),
            })
            .unwrap();
        assert_eq!(session.store().len(), 3);
        assert_eq!(session.change_summary().added, 1);

        for group in [1, 2] {
            session
                .handle_matrix(MatrixEvent::EditCell {
                    row,
                    group,
                    value: "x".into(),
                })
                .unwrap();
        }
        assert_eq!(session.store().len(), 5);
        assert_eq!(session.change_summary().added, 2);
        assert_eq!(session.matrix().row(row).unwrap().store_name.as_deref(), Some("K3"));
        assert_eq!(session.table().rows("*").iter().filter(|r| r.name == "K3").count(), 2);
    }
}
