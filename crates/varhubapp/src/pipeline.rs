//! # Derivation Pipeline: Sort, then Filter
//!
//! Each view keeps a [`DerivationPipeline`] over its own row type. The pipeline holds
//! three inputs and two cached stages:
//!
//! ```text
//! base ──sort(spec)──▶ sorted ──filter(text)──▶ derived
//! ```
//!
//! - **Sort** is stable. Ties keep base (insertion) order, and `SortDirection::None`
//!   restores base order outright.
//! - **Filter** never reorders: the derived sequence is always a subsequence of the
//!   sorted one.
//! - Only the stages downstream of a changed input run again: a new filter text
//!   re-filters the cached sorted sequence without sorting.
//!
//! The derived sequence is a pure function of `(base, sort spec, filter text)`.
//! Stages are stored as indexes into `base`, so rows are not cloned per stage.
//!
//! Subscribers are told once per recomputation, after both stages ran; nobody
//! observes a sorted-but-unfiltered state.

use std::cmp::Ordering;

use crate::filter::{fold, Searchable};
use crate::observable::{Publisher, SubscriptionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    Ascending,
    Descending,
    #[default]
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SortSpec {
    /// Column index into the view's comparator list.
    pub column: usize,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(column: usize) -> Self {
        Self {
            column,
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(column: usize) -> Self {
        Self {
            column,
            direction: SortDirection::Descending,
        }
    }
}

pub type Comparator<T> = Box<dyn Fn(&T, &T) -> Ordering>;

/// Locale-style string ordering: case-insensitive first; on case-only ties the
/// lowercase form sorts first.
pub fn collate(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
        .then_with(|| b.cmp(a))
}

/// Value-column ordering that never looks behind the mask: secret values sort
/// together below every plain value and tie among themselves.
pub fn collate_masked((a, a_secret): (&str, bool), (b, b_secret): (&str, bool)) -> Ordering {
    match (a_secret, b_secret) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => collate(a, b),
    }
}

/// Stable sort of `items` by the comparator registered for `spec.column`.
///
/// Returns positions into `items`. Unknown columns and `SortDirection::None` keep the
/// original order.
pub fn sort_indexes<T>(spec: Option<SortSpec>, comparators: &[Comparator<T>], items: &[T]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..items.len()).collect();
    let Some(spec) = spec else {
        return order;
    };
    let Some(compare) = comparators.get(spec.column) else {
        tracing::debug!(column = spec.column, "no comparator for column, keeping source order");
        return order;
    };
    match spec.direction {
        SortDirection::Ascending => order.sort_by(|&a, &b| compare(&items[a], &items[b])),
        // Reversing the comparator (not the list) keeps equal keys in source order.
        SortDirection::Descending => order.sort_by(|&a, &b| compare(&items[b], &items[a])),
        SortDirection::None => {}
    }
    order
}

/// Emitted after each recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Derived {
    /// Whether the sort stage ran (false for filter-only changes).
    pub resorted: bool,
    pub len: usize,
}

/// How many times each stage ran, for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StageCounts {
    pub sorts: usize,
    pub filters: usize,
}

pub struct DerivationPipeline<T> {
    comparators: Vec<Comparator<T>>,
    base: Vec<T>,
    sort: Option<SortSpec>,
    folded_text: String,
    sorted: Vec<usize>,
    derived: Vec<usize>,
    counts: StageCounts,
    publisher: Publisher<Derived>,
}

impl<T> std::fmt::Debug for DerivationPipeline<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivationPipeline")
            .field("base", &self.base.len())
            .field("sort", &self.sort)
            .field("filter", &self.folded_text)
            .field("derived", &self.derived.len())
            .finish()
    }
}

impl<T: Searchable> DerivationPipeline<T> {
    pub fn new(comparators: Vec<Comparator<T>>) -> Self {
        Self {
            comparators,
            base: Vec::new(),
            sort: None,
            folded_text: String::new(),
            sorted: Vec::new(),
            derived: Vec::new(),
            counts: StageCounts::default(),
            publisher: Publisher::new(),
        }
    }

    /// Swaps the column comparators, e.g. after a structural rebuild changed the
    /// columns. Takes effect at the next recomputation.
    pub fn set_comparators(&mut self, comparators: Vec<Comparator<T>>) {
        self.comparators = comparators;
    }

    /// Replaces the base collection; both stages run.
    pub fn set_base(&mut self, items: Vec<T>) {
        self.base = items;
        self.resort();
        self.refilter();
        self.notify(true);
    }

    /// Changes the sort spec; both stages run. `SortDirection::None` clears sorting.
    pub fn set_sort(&mut self, spec: SortSpec) {
        self.sort = match spec.direction {
            SortDirection::None => None,
            _ => Some(spec),
        };
        self.resort();
        self.refilter();
        self.notify(true);
    }

    /// Changes the filter text; only the filter stage runs. Returns false when the
    /// folded text is unchanged and nothing ran.
    pub fn set_filter_text(&mut self, text: &str) -> bool {
        let folded = fold(text);
        if folded == self.folded_text {
            return false;
        }
        self.folded_text = folded;
        self.refilter();
        self.notify(false);
        true
    }

    fn resort(&mut self) {
        self.sorted = sort_indexes(self.sort, &self.comparators, &self.base);
        self.counts.sorts += 1;
    }

    fn refilter(&mut self) {
        let text = &self.folded_text;
        let base = &self.base;
        self.derived = self
            .sorted
            .iter()
            .copied()
            .filter(|&i| base[i].matches_text(text))
            .collect();
        self.counts.filters += 1;
    }

    fn notify(&mut self, resorted: bool) {
        let event = Derived {
            resorted,
            len: self.derived.len(),
        };
        self.publisher.emit(&event);
    }

    pub fn base(&self) -> &[T] {
        &self.base
    }

    pub fn sort_spec(&self) -> Option<SortSpec> {
        self.sort
    }

    pub fn filter_text(&self) -> &str {
        &self.folded_text
    }

    /// Sorted but unfiltered rows.
    pub fn sorted(&self) -> impl Iterator<Item = &T> + '_ {
        self.sorted.iter().map(move |&i| &self.base[i])
    }

    /// The view's final ordered, filtered rows.
    pub fn items(&self) -> impl Iterator<Item = &T> + '_ {
        self.derived.iter().map(move |&i| &self.base[i])
    }

    pub fn len(&self) -> usize {
        self.derived.len()
    }

    pub fn is_empty(&self) -> bool {
        self.derived.is_empty()
    }

    pub fn stage_counts(&self) -> StageCounts {
        self.counts
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&Derived) + 'static) -> SubscriptionId {
        self.publisher.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.publisher.unsubscribe(id)
    }
}
