//! # View Adapters
//!
//! Three projections over the loaded data, each with its own row shape and its own
//! ordering, none of them holding a second copy of the store's edit state:
//!
//! - [`table`]: flat list of [`crate::model::VariableRecord`]s, groups ordered by name.
//! - [`tree`]: group → variable and secure-file forest with per-node expand state.
//! - [`matrix`]: one row per distinct variable name, one column per group.
//!
//! Adapters shape data and translate rendering events into mutations. They never
//! render: every row they hand out is a plain view model the rendering collaborator
//! displays as-is, in the given order.

pub mod matrix;
pub mod table;
pub mod tree;

/// Placeholder shown instead of rows when the filtered result is empty.
pub const NO_ITEMS_FOUND: &str = "No items found";

/// Text shown in a value cell: the mask for secrets, the value otherwise.
pub fn display_value(value: &str, is_secret: bool, mask: &str) -> String {
    if is_secret {
        mask.to_string()
    } else {
        value.to_string()
    }
}
