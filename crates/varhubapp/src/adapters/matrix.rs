//! # Matrix Adapter
//!
//! Pivots the store into one row per distinct variable name and one column per group,
//! to compare values side by side.
//!
//! ## Cells Are Store Records
//!
//! The matrix keeps no copy of values. Every cell is the store record for its
//! `(group, name)` pair, or a synthesized blank when the group lacks the variable:
//! empty value, no original, `Untracked`. Edits are routed back into the store by the
//! session (see [`CellTarget`]), after which the matrix re-derives with
//! [`MatrixAdapter::sync`]:
//!
//! - a cell edit mutates the backing record, or appends one for a synthesized cell,
//! - the cell lock toggles the backing record's secret flag,
//! - a row delete soft-deletes every record of the row.
//!
//! Records are gathered into rows by trimmed, case-folded name. A group holding the same
//! key twice (a duplicate the store flags) spills into a second row of the same name,
//! so the matrix flags it as well.
//!
//! ## What the Matrix Owns
//!
//! Only what has no store counterpart lives here, in a per-row slot that survives
//! re-derivation:
//!
//! - the row id, so hover state and events stay attached to the row,
//! - a display-name overlay: renaming a row never rewrites the per-group keys,
//! - rows added here that have no record yet. The first value typed into one of their
//!   cells creates the record, named after the row.
//!
//! A row is secret, and its name read-only, whenever any of its records is secret.
//! Synthesized cells of a secret row are masked too. Row names are validated across all
//! rows with the same tracker as the store.
//!
//! The column set is fixed between loads: [`MatrixAdapter::rebuild`] follows a load,
//! resets column widths and drops every overlay.

use std::collections::BTreeMap;

use crate::adapters::{display_value, NO_ITEMS_FOUND};
use crate::columns::{ColumnDescriptor, ColumnSet};
use crate::config::PanelConfig;
use crate::error::{Result, VarhubError};
use crate::filter::Searchable;
use crate::interaction::{
    name_action, status_trailer, value_trailer, InteractionSignal, InteractionTracker, RowAction, RowInteraction,
    Trailer,
};
use crate::model::{GroupId, RecordId, RowId, VariableRecord};
use crate::pipeline::{collate, collate_masked, Comparator, DerivationPipeline, SortSpec};
use crate::status::{content_status, name_key, Status, StatusTracker, TrackedRecord};
use crate::store::{ChangeSummary, Mutation, RecordStore, Rejection};

pub const NAME_COLUMN: usize = 0;

/// Column of the group at `index` in [`MatrixAdapter::groups`].
pub fn group_column(index: usize) -> usize {
    index + 1
}

/// Identifies a cell, or the name cell when the group is `None`.
pub type CellKey = (RowId, Option<GroupId>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixGroup {
    pub id: GroupId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueCell {
    /// Backing store record; `None` for a synthesized cell.
    pub record: Option<RecordId>,
    pub value: String,
    pub original_value: Option<String>,
    pub status: Option<Status>,
    pub is_secret: bool,
    deleted: bool,
}

impl ValueCell {
    fn backed(record: &VariableRecord) -> Self {
        Self {
            record: Some(record.id),
            value: record.value.clone(),
            original_value: record.original_value.clone(),
            status: record.status.clone(),
            is_secret: record.is_secret,
            deleted: record.is_deleted(),
        }
    }

    /// A group that lacks the variable.
    fn missing(is_secret: bool) -> Self {
        Self {
            record: None,
            value: String::new(),
            original_value: None,
            status: Some(Status::Untracked),
            is_secret,
            deleted: false,
        }
    }

    pub fn is_synthesized(&self) -> bool {
        self.record.is_none()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixRow {
    pub id: RowId,
    /// Display name: the rename overlay if any, else the records' name.
    pub name: String,
    /// Name the row's records carry in the store; `None` while the row has no record.
    pub store_name: Option<String>,
    pub original_name: Option<String>,
    pub status: Option<Status>,
    pub values: BTreeMap<GroupId, ValueCell>,
    deleted: bool,
}

impl MatrixRow {
    pub fn cell(&self, group: GroupId) -> Option<&ValueCell> {
        self.values.get(&group)
    }

    fn sort_key(&self, group: GroupId) -> (&str, bool) {
        self.cell(group).map_or(("", false), |c| (c.value.as_str(), c.is_secret))
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    pub fn is_secret(&self) -> bool {
        self.values.values().any(|c| c.is_secret)
    }

    /// Name is not editable. Follows the current secrecy of the row's cells.
    pub fn is_readonly(&self) -> bool {
        self.is_secret()
    }

    /// Backing records, by group id.
    pub fn records(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.values.values().filter_map(|c| c.record)
    }
}

impl TrackedRecord for MatrixRow {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn has_original_name(&self) -> bool {
        self.original_name.as_deref() == Some(self.name.as_str())
    }

    fn content_status(&self) -> Option<Status> {
        content_status(&self.name, self.original_name.as_deref())
    }

    fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    fn set_status(&mut self, status: Option<Status>) {
        self.status = status;
    }
}

impl Searchable for MatrixRow {
    /// Raw cell values are searched, masked ones included.
    fn search_fields(&self) -> Vec<&str> {
        std::iter::once(self.name.as_str())
            .chain(self.values.values().map(|c| c.value.as_str()))
            .collect()
    }
}

fn comparators(groups: &[MatrixGroup]) -> Vec<Comparator<MatrixRow>> {
    let mut list: Vec<Comparator<MatrixRow>> =
        vec![Box::new(|a: &MatrixRow, b: &MatrixRow| collate(&a.name, &b.name))];
    for group in groups {
        let id = group.id;
        list.push(Box::new(move |a: &MatrixRow, b: &MatrixRow| {
            collate_masked(a.sort_key(id), b.sort_key(id))
        }));
    }
    list
}

/// Where an edit of one cell has to go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellTarget {
    Record(RecordId),
    /// No record yet: a value creates one named `name` in `group_name`.
    Missing {
        group_name: String,
        name: String,
        is_secret: bool,
    },
    Rejected(Rejection),
}

/// Events the rendering collaborator reports for the matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatrixEvent {
    Rename { row: RowId, name: String },
    EditCell { row: RowId, group: GroupId, value: String },
    ToggleCellSecret { row: RowId, group: GroupId },
    AddRow,
    DeleteRow(RowId),
    Interaction {
        row: RowId,
        group: Option<GroupId>,
        signal: InteractionSignal,
    },
    Sort(SortSpec),
    Resize { column: usize, width: i32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixCellView {
    pub group: GroupId,
    /// Masked for secrets.
    pub value: String,
    pub is_secret: bool,
    pub status: Option<Status>,
    pub editable: bool,
    pub trailer: Trailer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatrixRowView {
    pub id: RowId,
    pub name: String,
    pub is_secret: bool,
    pub status: Option<Status>,
    pub name_editable: bool,
    pub disabled: bool,
    pub name_action: Option<RowAction>,
    pub name_trailer: Trailer,
    /// One per group, in column order.
    pub cells: Vec<MatrixCellView>,
}

/// Matrix-only state of one row.
#[derive(Debug, Clone)]
struct RowSlot {
    id: RowId,
    /// Name key of the records the row gathers. `None` for a row added here that has
    /// no record yet.
    key: Option<String>,
    rename: Option<String>,
    /// Soft delete of a row without records; other rows are deleted in the store.
    deleted: bool,
}

impl RowSlot {
    fn new(key: Option<String>) -> Self {
        Self {
            id: RowId::new(),
            key,
            rename: None,
            deleted: false,
        }
    }

    fn is_pending(&self) -> bool {
        self.key.is_none()
    }
}

/// Records sharing one name key, at most one per group, in store order.
struct Bucket<'a> {
    key: String,
    records: Vec<(GroupId, &'a VariableRecord)>,
}

#[derive(Debug)]
pub struct MatrixAdapter {
    groups: Vec<MatrixGroup>,
    /// Parallel to `rows`.
    slots: Vec<RowSlot>,
    rows: Vec<MatrixRow>,
    pipeline: DerivationPipeline<MatrixRow>,
    columns: ColumnSet,
    interaction: InteractionTracker<CellKey>,
    name_weight: u16,
    group_weight: u16,
}

impl MatrixAdapter {
    pub fn new(config: &PanelConfig) -> Self {
        let mut adapter = Self {
            groups: Vec::new(),
            slots: Vec::new(),
            rows: Vec::new(),
            pipeline: DerivationPipeline::new(comparators(&[])),
            columns: ColumnSet::default(),
            interaction: InteractionTracker::new(),
            name_weight: config.matrix_name_weight,
            group_weight: config.matrix_group_weight,
        };
        adapter.columns = adapter.column_set();
        adapter
    }

    fn column_set(&self) -> ColumnSet {
        let mut columns = vec![ColumnDescriptor::new(
            "name",
            "Name",
            PanelConfig::proportional(self.name_weight),
        )];
        columns.extend(self.groups.iter().map(|g| {
            ColumnDescriptor::new(g.id.to_string(), g.name.clone(), PanelConfig::proportional(self.group_weight))
        }));
        ColumnSet::new(columns)
    }

    /// Structural rebuild after a load: new columns, new row ids, overlays dropped.
    /// Sort spec and filter text carry over.
    pub fn rebuild(&mut self, store: &RecordStore) {
        self.groups = store
            .groups()
            .iter()
            .map(|g| MatrixGroup {
                id: g.id,
                name: g.name.clone(),
            })
            .collect();
        self.slots.clear();
        self.columns = self.column_set();
        self.interaction.clear();
        self.pipeline.set_comparators(comparators(&self.groups));
        self.sync(store);
        tracing::debug!(groups = self.groups.len(), rows = self.rows.len(), "matrix rebuilt");
    }

    /// Re-derives rows from the store after an edit. Row ids, renames and rows added
    /// here are kept; columns are not touched.
    pub fn sync(&mut self, store: &RecordStore) {
        let mut buckets: Vec<Option<Bucket<'_>>> = self.buckets(store).into_iter().map(Some).collect();
        let mut slots = Vec::with_capacity(self.slots.len());
        let mut rows = Vec::with_capacity(self.slots.len());

        for mut slot in std::mem::take(&mut self.slots) {
            let Some(key) = slot.key.clone() else {
                rows.push(self.pending_row(&slot));
                slots.push(slot);
                continue;
            };
            let bucket = buckets
                .iter_mut()
                .find(|b| matches!(b, Some(b) if b.key == key))
                .and_then(Option::take);
            // no bucket: every record of the row was renamed away
            if let Some(bucket) = bucket {
                rows.push(self.backed_row(&mut slot, &bucket));
                slots.push(slot);
            }
        }
        for bucket in buckets.into_iter().flatten() {
            let mut slot = RowSlot::new(Some(bucket.key.clone()));
            rows.push(self.backed_row(&mut slot, &bucket));
            slots.push(slot);
        }

        StatusTracker::recompute(&mut rows);
        self.slots = slots;
        self.rows = rows;
        let alive: Vec<RowId> = self.rows.iter().map(|r| r.id).collect();
        self.interaction.retain(|(row, _)| alive.contains(row));
        self.publish();
    }

    fn buckets<'a>(&self, store: &'a RecordStore) -> Vec<Bucket<'a>> {
        let mut buckets: Vec<Bucket<'a>> = Vec::new();
        for record in store.records() {
            let Some(group) = self.groups.iter().find(|g| g.name == record.group_name) else {
                tracing::debug!(group = %record.group_name, "record outside the matrix columns");
                continue;
            };
            let key = name_key(&record.name);
            let open = buckets
                .iter_mut()
                .find(|b| b.key == key && b.records.iter().all(|(g, _)| *g != group.id));
            match open {
                Some(bucket) => bucket.records.push((group.id, record)),
                None => buckets.push(Bucket {
                    key,
                    records: vec![(group.id, record)],
                }),
            }
        }
        buckets
    }

    fn backed_row(&self, slot: &mut RowSlot, bucket: &Bucket<'_>) -> MatrixRow {
        let store_name = bucket.records.first().map(|(_, r)| r.name.clone()).unwrap_or_default();
        if slot.rename.as_deref() == Some(store_name.as_str()) {
            slot.rename = None;
        }
        let is_secret = bucket.records.iter().any(|(_, r)| r.is_secret);
        let values = self
            .groups
            .iter()
            .map(|g| {
                let cell = bucket
                    .records
                    .iter()
                    .find(|(id, _)| *id == g.id)
                    .map_or_else(|| ValueCell::missing(is_secret), |(_, r)| ValueCell::backed(r));
                (g.id, cell)
            })
            .collect();
        MatrixRow {
            id: slot.id,
            name: slot.rename.clone().unwrap_or_else(|| store_name.clone()),
            original_name: bucket.records.iter().find_map(|(_, r)| r.original_name.clone()),
            store_name: Some(store_name),
            status: None,
            values,
            deleted: bucket.records.iter().all(|(_, r)| r.is_deleted()),
        }
    }

    /// An added row: one empty, non-secret cell per group.
    fn pending_row(&self, slot: &RowSlot) -> MatrixRow {
        MatrixRow {
            id: slot.id,
            name: slot.rename.clone().unwrap_or_default(),
            store_name: None,
            original_name: None,
            status: None,
            values: self.groups.iter().map(|g| (g.id, ValueCell::missing(false))).collect(),
            deleted: slot.deleted,
        }
    }

    fn publish(&mut self) {
        self.pipeline.set_base(self.rows.clone());
    }

    fn index_of(&self, id: RowId) -> Result<usize> {
        self.rows
            .iter()
            .position(|r| r.id == id)
            .ok_or(VarhubError::UnknownRow(id))
    }

    /// Changes a row's display name and revalidates every row name. The store keeps
    /// the per-group keys.
    pub fn rename_row(&mut self, id: RowId, name: &str) -> Result<Mutation> {
        let index = self.index_of(id)?;
        let row = &self.rows[index];
        if row.deleted {
            tracing::debug!(%id, "rejected rename of deleted matrix row");
            return Ok(Mutation::Rejected(Rejection::Deleted));
        }
        if row.is_readonly() {
            tracing::debug!(%id, "rejected rename of secret matrix row");
            return Ok(Mutation::Rejected(Rejection::SecretName));
        }
        if row.name == name {
            return Ok(Mutation::Unchanged);
        }
        let rename = (row.store_name.as_deref() != Some(name)).then(|| name.to_string());
        self.slots[index].rename = rename;
        self.rows[index].name = name.to_string();
        StatusTracker::recompute(&mut self.rows);
        self.publish();
        Ok(Mutation::Applied)
    }

    /// Resolves where a value typed into a cell goes.
    pub fn cell_target(&self, id: RowId, group: GroupId) -> Result<CellTarget> {
        let row = &self.rows[self.index_of(id)?];
        if row.deleted {
            return Ok(CellTarget::Rejected(Rejection::Deleted));
        }
        let cell = row.cell(group).ok_or(VarhubError::UnknownGroup(group))?;
        if let Some(record) = cell.record {
            return Ok(CellTarget::Record(record));
        }
        let group_name = self
            .groups
            .iter()
            .find(|g| g.id == group)
            .map(|g| g.name.clone())
            .ok_or(VarhubError::UnknownGroup(group))?;
        Ok(CellTarget::Missing {
            group_name,
            name: row.store_name.clone().unwrap_or_else(|| row.name.clone()),
            is_secret: cell.is_secret,
        })
    }

    /// Binds an added row to the records named `name`, once its first record exists.
    pub fn attach(&mut self, id: RowId, name: &str) -> Result<()> {
        let index = self.index_of(id)?;
        let slot = &mut self.slots[index];
        if slot.is_pending() {
            slot.key = Some(name_key(name));
        }
        Ok(())
    }

    /// Appends an unnamed row with an empty, non-secret cell per group.
    pub fn add_row(&mut self) -> RowId {
        let slot = RowSlot::new(None);
        let id = slot.id;
        let row = self.pending_row(&slot);
        self.rows.push(row);
        self.slots.push(slot);
        StatusTracker::recompute(&mut self.rows);
        self.publish();
        id
    }

    /// Soft-deletes an added row that has no record yet. Rows with records are
    /// deleted through the store.
    pub fn soft_delete_pending(&mut self, id: RowId) -> Result<Mutation> {
        let index = self.index_of(id)?;
        let slot = &mut self.slots[index];
        if !slot.is_pending() || slot.deleted {
            return Ok(Mutation::Unchanged);
        }
        slot.deleted = true;
        self.rows[index].deleted = true;
        StatusTracker::recompute(&mut self.rows);
        self.publish();
        Ok(Mutation::Applied)
    }

    pub fn set_sort(&mut self, spec: SortSpec) {
        self.pipeline.set_sort(spec);
    }

    pub fn set_filter_text(&mut self, text: &str) -> bool {
        self.pipeline.set_filter_text(text)
    }

    pub fn interact(&mut self, row: RowId, group: Option<GroupId>, signal: InteractionSignal) -> bool {
        self.interaction.apply((row, group), signal)
    }

    pub fn interaction(&self, row: RowId, group: Option<GroupId>) -> RowInteraction {
        self.interaction.state((row, group))
    }

    pub fn resize_column(&mut self, column: usize, width: i32) -> bool {
        self.columns.resize(column, width)
    }

    pub fn rows(&self, mask: &str) -> Vec<MatrixRowView> {
        self.pipeline.items().map(|row| self.view(row, mask)).collect()
    }

    fn view(&self, row: &MatrixRow, mask: &str) -> MatrixRowView {
        let disabled = row.deleted;
        let name_interaction = self.interaction.state((row.id, None));
        let cells = self
            .groups
            .iter()
            .filter_map(|g| row.cell(g.id).map(|cell| (g.id, cell)))
            .map(|(group, cell)| {
                let interaction = self.interaction.state((row.id, Some(group)));
                let off = disabled || cell.deleted;
                MatrixCellView {
                    group,
                    value: display_value(&cell.value, cell.is_secret, mask),
                    is_secret: cell.is_secret,
                    status: cell.status.clone(),
                    editable: !off,
                    trailer: if off {
                        status_trailer(cell.status.as_ref())
                    } else {
                        value_trailer(interaction, cell.is_secret, cell.status.as_ref())
                    },
                }
            })
            .collect();
        MatrixRowView {
            id: row.id,
            name: row.name.clone(),
            is_secret: row.is_secret(),
            status: row.status.clone(),
            name_editable: !disabled && !row.is_readonly(),
            disabled,
            name_action: if disabled { None } else { name_action(name_interaction) },
            name_trailer: status_trailer(row.status.as_ref()),
            cells,
        }
    }

    pub fn row(&self, id: RowId) -> Option<&MatrixRow> {
        self.rows.iter().find(|r| r.id == id)
    }

    /// Rows in derivation order, unsorted and unfiltered.
    pub fn base_rows(&self) -> &[MatrixRow] {
        &self.rows
    }

    pub fn find_by_name(&self, name: &str) -> Option<&MatrixRow> {
        self.rows.iter().find(|r| r.name == name)
    }

    pub fn groups(&self) -> &[MatrixGroup] {
        &self.groups
    }

    pub fn placeholder(&self) -> Option<&'static str> {
        self.pipeline.is_empty().then_some(NO_ITEMS_FOUND)
    }

    pub fn len(&self) -> usize {
        self.pipeline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipeline.is_empty()
    }

    pub fn pipeline(&self) -> &DerivationPipeline<MatrixRow> {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut DerivationPipeline<MatrixRow> {
        &mut self.pipeline
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    /// Unsaved work the store cannot see: renamed rows and added rows that have no
    /// record yet.
    pub fn overlay_summary(&self) -> ChangeSummary {
        let mut summary = ChangeSummary::default();
        for (slot, row) in self.slots.iter().zip(&self.rows) {
            let overlay = slot.rename.is_some() || (slot.is_pending() && !slot.deleted);
            if let Some(status) = row.status.as_ref().filter(|_| overlay) {
                summary.count(status);
            }
        }
        summary
    }

    pub fn has_errors(&self) -> bool {
        self.rows
            .iter()
            .any(|r| r.status.as_ref().is_some_and(Status::is_error))
    }
}
