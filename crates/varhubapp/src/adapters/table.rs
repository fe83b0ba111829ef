//! # Table Adapter
//!
//! A flat two-column (Name, Value) projection of the store. The base sequence is the
//! store's records with groups ordered by name (stable, so records keep store order
//! within a group). Sorting and filtering go through a [`DerivationPipeline`].
//!
//! Row identity is the record id: hover/focus state and edits are keyed by it, so they
//! survive re-sorting and re-filtering.

use crate::adapters::{display_value, NO_ITEMS_FOUND};
use crate::columns::{ColumnDescriptor, ColumnSet};
use crate::config::PanelConfig;
use crate::filter::Searchable;
use crate::interaction::{name_action, status_trailer, value_trailer, InteractionSignal, InteractionTracker, RowAction, RowInteraction, Trailer};
use crate::model::{Field, RecordId, VariableRecord};
use crate::pipeline::{collate, collate_masked, Comparator, DerivationPipeline, SortSpec};
use crate::status::Status;
use crate::store::RecordStore;

pub const NAME_COLUMN: usize = 0;
pub const VALUE_COLUMN: usize = 1;

/// Events the rendering collaborator reports for the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    Edit { id: RecordId, field: Field, value: String },
    Interaction { id: RecordId, signal: InteractionSignal },
    Resize { column: usize, width: i32 },
    Sort(SortSpec),
    Delete(RecordId),
    ToggleSecret(RecordId),
}

impl Searchable for VariableRecord {
    /// The raw value is searched even when it is displayed masked.
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.value.as_str()]
    }
}

/// View model of one table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRow {
    pub id: RecordId,
    pub group_name: String,
    pub name: String,
    /// Masked for secrets.
    pub value: String,
    pub is_secret: bool,
    pub status: Option<Status>,
    pub name_editable: bool,
    pub value_editable: bool,
    /// Soft-deleted rows render disabled.
    pub disabled: bool,
    pub name_action: Option<RowAction>,
    pub value_trailer: Trailer,
}

impl TableRow {
    fn build(record: &VariableRecord, interaction: RowInteraction, mask: &str) -> Self {
        let disabled = record.is_deleted();
        let (name_action, value_trailer) = if disabled {
            (None, status_trailer(record.status.as_ref()))
        } else {
            (
                name_action(interaction),
                value_trailer(interaction, record.is_secret, record.status.as_ref()),
            )
        };
        Self {
            id: record.id,
            group_name: record.group_name.clone(),
            name: record.name.clone(),
            value: display_value(&record.value, record.is_secret, mask),
            is_secret: record.is_secret,
            status: record.status.clone(),
            name_editable: !disabled && !record.is_secret,
            value_editable: !disabled,
            disabled,
            name_action,
            value_trailer,
        }
    }
}

pub fn comparators() -> Vec<Comparator<VariableRecord>> {
    vec![
        Box::new(|a: &VariableRecord, b: &VariableRecord| collate(&a.name, &b.name)),
        Box::new(|a: &VariableRecord, b: &VariableRecord| {
            collate_masked((&a.value, a.is_secret), (&b.value, b.is_secret))
        }),
    ]
}

#[derive(Debug)]
pub struct TableAdapter {
    pipeline: DerivationPipeline<VariableRecord>,
    columns: ColumnSet,
    interaction: InteractionTracker<RecordId>,
}

impl TableAdapter {
    pub fn new(config: &PanelConfig) -> Self {
        Self {
            pipeline: DerivationPipeline::new(comparators()),
            columns: ColumnSet::new(vec![
                ColumnDescriptor::new("name", "Name", PanelConfig::proportional(config.name_weight)),
                ColumnDescriptor::new("value", "Value", PanelConfig::proportional(config.value_weight)),
            ]),
            interaction: InteractionTracker::new(),
        }
    }

    /// Re-derives the base from the store; both pipeline stages run.
    pub fn rebuild(&mut self, store: &RecordStore) {
        let mut base = store.records().to_vec();
        base.sort_by(|a, b| collate(&a.group_name, &b.group_name));
        self.interaction.retain(|id| store.record(*id).is_some());
        self.pipeline.set_base(base);
    }

    pub fn set_sort(&mut self, spec: SortSpec) {
        self.pipeline.set_sort(spec);
    }

    pub fn set_filter_text(&mut self, text: &str) -> bool {
        self.pipeline.set_filter_text(text)
    }

    pub fn interact(&mut self, id: RecordId, signal: InteractionSignal) -> bool {
        self.interaction.apply(id, signal)
    }

    pub fn interaction(&self, id: RecordId) -> RowInteraction {
        self.interaction.state(id)
    }

    pub fn resize_column(&mut self, column: usize, width: i32) -> bool {
        self.columns.resize(column, width)
    }

    pub fn rows(&self, mask: &str) -> Vec<TableRow> {
        self.pipeline
            .items()
            .map(|record| TableRow::build(record, self.interaction.state(record.id), mask))
            .collect()
    }

    /// `Some("No items found")` when the filtered result is empty.
    pub fn placeholder(&self) -> Option<&'static str> {
        self.pipeline.is_empty().then_some(NO_ITEMS_FOUND)
    }

    pub fn len(&self) -> usize {
        self.pipeline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pipeline.is_empty()
    }

    pub fn pipeline(&self) -> &DerivationPipeline<VariableRecord> {
        &self.pipeline
    }

    pub fn pipeline_mut(&mut self) -> &mut DerivationPipeline<VariableRecord> {
        &mut self.pipeline
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }
}
