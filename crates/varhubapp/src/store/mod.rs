//! # Record Store
//!
//! The [`RecordStore`] is the single source of truth for the tree and table views: an
//! ordered collection of [`VariableRecord`]s plus the secure files and the raw group
//! snapshot they were flattened from. Views never keep their own copy of edit state;
//! they derive projections from the store and route user edits back into it.
//!
//! ## Lifecycle
//!
//! - **Load** replaces everything. There is no reconciliation with previous contents:
//!   a refresh discards all in-memory edits.
//! - **Append** adds a record with no backend counterpart (`Untracked`).
//! - **Mutate** edits `name` or `value`.
//! - **Soft delete** flags a record. It stays enumerable (views render it disabled),
//!   and physical removal is left to whoever persists the changes.
//!
//! After every operation the [`StatusTracker`] re-derives every status (see
//! [`crate::status`] for the precedence rules), and only then are subscribers called.
//!
//! ## Rejected Mutations
//!
//! Two edits are refused, silently from the user's point of view:
//!
//! - renaming a secret variable (its name is the stable identity across groups)
//! - editing a deleted record
//!
//! They come back as [`Mutation::Rejected`] and are logged at `debug`, never as an
//! error: the UI affordances (read-only or disabled fields) should have prevented them.

use crate::error::{Result, VarhubError};
use crate::model::{Field, RecordId, SecureFile, VariableGroup, VariableRecord};
use crate::observable::{Publisher, SubscriptionId};
use crate::status::{Status, StatusKind, StatusTracker};

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Loaded { records: usize, secure_files: usize },
    Appended(RecordId),
    Mutated { id: RecordId, field: Field },
    SecretToggled(RecordId),
    Deleted(RecordId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Secret variable names are read-only.
    SecretName,
    /// Deleted records accept no further edits.
    Deleted,
}

/// Outcome of an edit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Applied,
    /// The request would not change anything; no notification was sent.
    Unchanged,
    Rejected(Rejection),
}

impl Mutation {
    pub fn is_applied(&self) -> bool {
        matches!(self, Mutation::Applied)
    }
}

/// Unsaved work, by kind. Deleted records count only as deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeSummary {
    pub added: usize,
    pub modified: usize,
    pub deleted: usize,
    pub invalid: usize,
}

impl ChangeSummary {
    pub fn total(&self) -> usize {
        self.added + self.modified + self.deleted + self.invalid
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }

    pub fn count(&mut self, status: &Status) {
        match status.kind() {
            StatusKind::Untracked => self.added += 1,
            StatusKind::Modified => self.modified += 1,
            StatusKind::Deleted => self.deleted += 1,
            StatusKind::Error => self.invalid += 1,
        }
    }
}

impl std::ops::AddAssign for ChangeSummary {
    fn add_assign(&mut self, other: Self) {
        self.added += other.added;
        self.modified += other.modified;
        self.deleted += other.deleted;
        self.invalid += other.invalid;
    }
}

#[derive(Debug, Default)]
pub struct RecordStore {
    groups: Vec<VariableGroup>,
    records: Vec<VariableRecord>,
    secure_files: Vec<SecureFile>,
    publisher: Publisher<StoreEvent>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole contents with freshly loaded data.
    pub fn load(&mut self, groups: Vec<VariableGroup>, secure_files: Vec<SecureFile>) {
        self.records = groups
            .iter()
            .flat_map(|group| {
                group
                    .variables
                    .iter()
                    .map(|(name, variable)| VariableRecord::loaded(&group.name, name, variable))
            })
            .collect();
        self.groups = groups;
        self.secure_files = secure_files;
        StatusTracker::recompute(&mut self.records);

        tracing::info!(
            groups = self.groups.len(),
            records = self.records.len(),
            secure_files = self.secure_files.len(),
            "record store loaded"
        );
        self.publisher.emit(&StoreEvent::Loaded {
            records: self.records.len(),
            secure_files: self.secure_files.len(),
        });
    }

    /// Inserts a record at the end. Any original snapshot on `record` is dropped, so
    /// it always starts out `Untracked`.
    pub fn append(&mut self, mut record: VariableRecord) -> RecordId {
        record.original_name = None;
        record.original_value = None;
        record.deleted = false;
        let id = record.id;
        self.records.push(record);
        StatusTracker::recompute(&mut self.records);
        self.publisher.emit(&StoreEvent::Appended(id));
        id
    }

    /// The "add new variable" action: an empty, non-secret record in `group_name`.
    pub fn add_variable(&mut self, group_name: &str) -> RecordId {
        self.append(VariableRecord::new_untracked(group_name, "", ""))
    }

    pub fn mutate(&mut self, id: RecordId, field: Field, new_value: &str) -> Result<Mutation> {
        let record = self.record_mut(id)?;
        if record.deleted {
            tracing::debug!(%id, ?field, "rejected edit of deleted record");
            return Ok(Mutation::Rejected(Rejection::Deleted));
        }
        if record.is_secret && field == Field::Name {
            tracing::debug!(%id, "rejected rename of secret variable");
            return Ok(Mutation::Rejected(Rejection::SecretName));
        }
        let slot = match field {
            Field::Name => &mut record.name,
            Field::Value => &mut record.value,
        };
        if slot.as_str() == new_value {
            return Ok(Mutation::Unchanged);
        }
        *slot = new_value.to_string();

        StatusTracker::recompute(&mut self.records);
        self.publisher.emit(&StoreEvent::Mutated { id, field });
        Ok(Mutation::Applied)
    }

    /// The lock/unlock action on a value cell.
    pub fn toggle_secret(&mut self, id: RecordId) -> Result<Mutation> {
        let record = self.record_mut(id)?;
        if record.deleted {
            tracing::debug!(%id, "rejected secret toggle of deleted record");
            return Ok(Mutation::Rejected(Rejection::Deleted));
        }
        record.is_secret = !record.is_secret;

        StatusTracker::recompute(&mut self.records);
        self.publisher.emit(&StoreEvent::SecretToggled(id));
        Ok(Mutation::Applied)
    }

    pub fn soft_delete(&mut self, id: RecordId) -> Result<Mutation> {
        let record = self.record_mut(id)?;
        if record.deleted {
            return Ok(Mutation::Unchanged);
        }
        record.deleted = true;

        StatusTracker::recompute(&mut self.records);
        self.publisher.emit(&StoreEvent::Deleted(id));
        Ok(Mutation::Applied)
    }

    fn record_mut(&mut self, id: RecordId) -> Result<&mut VariableRecord> {
        self.records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(VarhubError::UnknownRecord(id))
    }

    pub fn record(&self, id: RecordId) -> Option<&VariableRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn records(&self) -> &[VariableRecord] {
        &self.records
    }

    /// Records owned by `group_name`, in store order.
    pub fn records_in_group<'a>(&'a self, group_name: &'a str) -> impl Iterator<Item = &'a VariableRecord> + 'a {
        self.records.iter().filter(move |r| r.group_name == group_name)
    }

    /// The group snapshot from the last load.
    pub fn groups(&self) -> &[VariableGroup] {
        &self.groups
    }

    pub fn secure_files(&self) -> &[SecureFile] {
        &self.secure_files
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn change_summary(&self) -> ChangeSummary {
        let mut summary = ChangeSummary::default();
        for status in self.records.iter().filter_map(|r| r.status.as_ref()) {
            summary.count(status);
        }
        summary
    }

    /// Validation errors block saving.
    pub fn has_errors(&self) -> bool {
        self.records
            .iter()
            .any(|r| r.status.as_ref().is_some_and(|s| s.is_error()))
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&StoreEvent) + 'static) -> SubscriptionId {
        self.publisher.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.publisher.unsubscribe(id)
    }
}
