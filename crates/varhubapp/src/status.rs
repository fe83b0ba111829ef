//! # Status / Change Tracking
//!
//! Every editable record carries an `Option<Status>`: `None` means clean (matches what
//! was loaded). The status is **derived**, never set directly by callers. The tracker
//! recomputes it from the record content after every store mutation.
//!
//! ## Precedence
//!
//! When several conditions apply at once, the first one wins:
//!
//! | Order | Status | Condition |
//! |-------|--------|-----------|
//! | 1 | `Deleted` | soft-deleted in this session |
//! | 2 | `Error("Name is required")` | trimmed name is empty |
//! | 3 | `Error("Names must be unique")` | another live record in the scope has the same trimmed, case-folded name |
//! | 4 | `Untracked` | no original snapshot (created in memory) |
//! | 5 | `Modified` | content differs from the original snapshot |
//! | 6 | clean (`None`) | otherwise |
//!
//! ## Uniqueness Scope
//!
//! Duplicates are counted per [`TrackedRecord::scope`]. Store records are scoped by
//! their owning group: `K1` in two groups is one variable seen from two groups, which
//! is exactly what a matrix row gathers. Matrix rows share a single scope.
//!
//! Soft-deleted records are out of the count, so a deleted name can be reused. Two
//! records that both still carry the name the backend gave them never collide with each
//! other (the backend may hold case variants such as `K1` and `k1`). As soon as either
//! side is renamed (or created in memory) the pair is validated like any other.

use serde::Serialize;
use std::collections::HashMap;

pub const NAME_REQUIRED: &str = "Name is required";
pub const NAMES_MUST_BE_UNIQUE: &str = "Names must be unique";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type")]
pub enum Status {
    /// Created in memory, no backend counterpart yet.
    Untracked,
    Modified,
    /// Marked for removal. Terminal for the session.
    Deleted,
    Error { message: String },
}

/// Discriminant of [`Status`], handy for counting and matching without the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StatusKind {
    Untracked,
    Modified,
    Deleted,
    Error,
}

/// Semantic color of a status marker. The rendering collaborator maps it to a palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Success,
    Warning,
    Error,
}

/// What the trailing status slot of a cell shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StatusBadge {
    /// One-character tag, e.g. `M` for modified, with the full tag as tooltip.
    Letter { letter: char, tone: Tone, tooltip: String },
    /// Error marker, tooltip carries the validation message.
    ErrorIcon { message: String },
}

impl Status {
    pub fn error(message: impl Into<String>) -> Self {
        Status::Error {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> StatusKind {
        match self {
            Status::Untracked => StatusKind::Untracked,
            Status::Modified => StatusKind::Modified,
            Status::Deleted => StatusKind::Deleted,
            Status::Error { .. } => StatusKind::Error,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self.kind() {
            StatusKind::Untracked => "Untracked",
            StatusKind::Modified => "Modified",
            StatusKind::Deleted => "Deleted",
            StatusKind::Error => "Error",
        }
    }

    pub fn tone(&self) -> Tone {
        match self.kind() {
            StatusKind::Untracked => Tone::Success,
            StatusKind::Modified => Tone::Warning,
            StatusKind::Deleted | StatusKind::Error => Tone::Error,
        }
    }

    pub fn badge(&self) -> StatusBadge {
        match self {
            Status::Error { message } => StatusBadge::ErrorIcon {
                message: message.clone(),
            },
            other => StatusBadge::Letter {
                letter: other.tag().chars().next().unwrap_or('?'),
                tone: other.tone(),
                tooltip: other.tag().to_string(),
            },
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Status::Error { .. })
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Error { message } => write!(f, "Error: {}", message),
            other => write!(f, "{}", other.tag()),
        }
    }
}

/// Comparison key for names: trimmed and case-folded.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

pub fn validate_required_name(name: &str) -> Option<Status> {
    if name.trim().is_empty() {
        Some(Status::error(NAME_REQUIRED))
    } else {
        None
    }
}

/// Status implied by content alone: `Untracked` without an original, `Modified` when
/// the current text differs from it, clean otherwise.
pub fn content_status(current: &str, original: Option<&str>) -> Option<Status> {
    match original {
        None => Some(Status::Untracked),
        Some(original) if original != current => Some(Status::Modified),
        Some(_) => None,
    }
}

/// Aggregated status of a container (a tree group): `Error` if any child errs,
/// `Modified` if any child carries any status, clean otherwise.
pub fn aggregate<'a>(children: impl IntoIterator<Item = Option<&'a Status>>) -> Option<Status> {
    let mut dirty = false;
    for status in children.into_iter().flatten() {
        if status.is_error() {
            return Some(Status::error("Contains invalid variables"));
        }
        dirty = true;
    }
    dirty.then_some(Status::Modified)
}

/// A record whose status the tracker can derive.
pub trait TrackedRecord {
    fn name(&self) -> &str;
    /// Names only collide within the same scope.
    fn scope(&self) -> &str {
        ""
    }
    fn is_deleted(&self) -> bool;
    /// True while the name is still the one loaded from the backend.
    fn has_original_name(&self) -> bool;
    /// Status implied by content (rules 4-6 of the precedence table).
    fn content_status(&self) -> Option<Status>;
    fn status(&self) -> Option<&Status>;
    fn set_status(&mut self, status: Option<Status>);
}

pub struct StatusTracker;

impl StatusTracker {
    /// Derive the status of every record in `records`. Uniqueness is checked per
    /// [`TrackedRecord::scope`]. Returns how many statuses changed.
    pub fn recompute<R: TrackedRecord>(records: &mut [R]) -> usize {
        // (renamed-or-new, still-original) per scope and name key
        let mut counts: HashMap<(String, String), (usize, usize)> = HashMap::new();
        for record in records.iter() {
            if record.is_deleted() {
                continue;
            }
            let key = name_key(record.name());
            if key.is_empty() {
                continue;
            }
            let entry = counts.entry((record.scope().to_string(), key)).or_default();
            if record.has_original_name() {
                entry.1 += 1;
            } else {
                entry.0 += 1;
            }
        }

        let mut changed = 0;
        for record in records.iter_mut() {
            let next = Self::derive(record, &counts);
            if record.status() != next.as_ref() {
                record.set_status(next);
                changed += 1;
            }
        }
        changed
    }

    fn derive<R: TrackedRecord>(record: &R, counts: &HashMap<(String, String), (usize, usize)>) -> Option<Status> {
        if record.is_deleted() {
            return Some(Status::Deleted);
        }
        if let Some(error) = validate_required_name(record.name()) {
            return Some(error);
        }
        let (edited, original) = counts
            .get(&(record.scope().to_string(), name_key(record.name())))
            .copied()
            .unwrap_or_default();
        let duplicated = if record.has_original_name() {
            edited > 0
        } else {
            edited + original > 1
        };
        if duplicated {
            return Some(Status::error(NAMES_MUST_BE_UNIQUE));
        }
        record.content_status()
    }
}

impl TrackedRecord for crate::model::VariableRecord {
    fn name(&self) -> &str {
        &self.name
    }

    fn scope(&self) -> &str {
        &self.group_name
    }

    fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn has_original_name(&self) -> bool {
        crate::model::VariableRecord::has_original_name(self)
    }

    fn content_status(&self) -> Option<Status> {
        let (Some(original_name), Some(original_value)) = (&self.original_name, &self.original_value) else {
            return Some(Status::Untracked);
        };
        let name_changed = !self.is_secret && &self.name != original_name;
        if name_changed || &self.value != original_value {
            Some(Status::Modified)
        } else {
            None
        }
    }

    fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    fn set_status(&mut self, status: Option<Status>) {
        self.status = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{VariableRecord, VariableValue};

    fn loaded(name: &str, value: &str) -> VariableRecord {
        VariableRecord::loaded("G", name, &VariableValue::plain(value))
    }

    #[test]
    fn content_status_rules() {
        assert_eq!(content_status("x", None), Some(Status::Untracked));
        assert_eq!(content_status("x", Some("y")), Some(Status::Modified));
        assert_eq!(content_status("x", Some("x")), None);
    }

    #[test]
    fn badge_uses_first_letter_and_tone() {
        assert_eq!(
            Status::Modified.badge(),
            StatusBadge::Letter {
                letter: 'M',
                tone: Tone::Warning,
                tooltip: "Modified".into()
            }
        );
        assert!(matches!(
            Status::error("boom").badge(),
            StatusBadge::ErrorIcon { message } if message == "boom"
        ));
    }

    #[test]
    fn empty_name_is_required_error() {
        let mut records = vec![VariableRecord::new_untracked("G", "   ", "v")];
        StatusTracker::recompute(&mut records);
        assert_eq!(records[0].status, Some(Status::error(NAME_REQUIRED)));
    }

    #[test]
    fn duplicates_flag_every_member() {
        let mut records = vec![
            VariableRecord::new_untracked("G", "X", ""),
            VariableRecord::new_untracked("G", " x ", ""),
            VariableRecord::new_untracked("G", "Y", ""),
        ];
        StatusTracker::recompute(&mut records);
        assert_eq!(records[0].status, Some(Status::error(NAMES_MUST_BE_UNIQUE)));
        assert_eq!(records[1].status, Some(Status::error(NAMES_MUST_BE_UNIQUE)));
        assert_eq!(records[2].status, Some(Status::Untracked));
    }

    #[test]
    fn same_name_in_another_group_is_not_a_duplicate() {
        let mut records = vec![loaded("K1", "v1"), VariableRecord::new_untracked("H", "k1", "v2")];
        StatusTracker::recompute(&mut records);
        assert_eq!(records[0].status, None);
        assert_eq!(records[1].status, Some(Status::Untracked));
    }

    #[test]
    fn deleted_record_does_not_block_replacement() {
        let mut records = vec![loaded("X", "old")];
        records[0].deleted = true;
        records.push(VariableRecord::new_untracked("G", "X", "new"));
        StatusTracker::recompute(&mut records);
        assert_eq!(records[0].status, Some(Status::Deleted));
        assert_eq!(records[1].status, Some(Status::Untracked));

        // a live duplicate still collides
        records.push(VariableRecord::new_untracked("G", "x", ""));
        StatusTracker::recompute(&mut records);
        assert_eq!(records[1].status, Some(Status::error(NAMES_MUST_BE_UNIQUE)));
        assert_eq!(records[2].status, Some(Status::error(NAMES_MUST_BE_UNIQUE)));
    }

    #[test]
    fn loaded_names_in_different_groups_do_not_collide() {
        let mut records = vec![loaded("K1", "v1"), loaded("K1", "v1")];
        StatusTracker::recompute(&mut records);
        assert!(records.iter().all(|r| r.status.is_none()));
    }

    #[test]
    fn renamed_record_collides_with_loaded_one() {
        let mut records = vec![loaded("K1", "v1"), loaded("K2", "v2")];
        records[1].name = "k1".into();
        StatusTracker::recompute(&mut records);
        assert!(records.iter().all(|r| r.status == Some(Status::error(NAMES_MUST_BE_UNIQUE))));
    }

    #[test]
    fn deleted_wins_over_error() {
        let mut records = vec![VariableRecord::new_untracked("G", "", "")];
        records[0].deleted = true;
        StatusTracker::recompute(&mut records);
        assert_eq!(records[0].status, Some(Status::Deleted));
    }

    #[test]
    fn secret_name_change_is_not_content_change() {
        let mut record = VariableRecord::loaded("G", "Token", &VariableValue::secret(Some("s".into())));
        record.name = "Other".into();
        assert_eq!(record.content_status(), None);
    }

    #[test]
    fn aggregate_prefers_errors() {
        let modified = Status::Modified;
        let error = Status::error("x");
        assert_eq!(aggregate([None, None]), None);
        assert_eq!(aggregate([None, Some(&modified)]), Some(Status::Modified));
        assert!(aggregate([Some(&modified), Some(&error)]).unwrap().is_error());
    }
}
