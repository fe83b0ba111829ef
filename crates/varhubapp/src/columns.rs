//! Column descriptors handed to the rendering collaborator.
//!
//! Widths follow the table widget convention: a negative width is a proportional
//! weight (`-15` takes three times the space of `-5`), a positive one is fixed. A
//! resize only touches the column's own width; it never affects row order.

use crate::observable::ObservableValue;

#[derive(Debug)]
pub struct ColumnDescriptor {
    pub id: String,
    pub header: String,
    pub width: ObservableValue<i32>,
}

impl ColumnDescriptor {
    pub fn new(id: impl Into<String>, header: impl Into<String>, width: i32) -> Self {
        Self {
            id: id.into(),
            header: header.into(),
            width: ObservableValue::new(width),
        }
    }
}

#[derive(Debug, Default)]
pub struct ColumnSet {
    columns: Vec<ColumnDescriptor>,
}

impl ColumnSet {
    pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self { columns }
    }

    /// Stores a new width for the column at `index`. Returns false for an unknown
    /// index or an unchanged width.
    pub fn resize(&mut self, index: usize, width: i32) -> bool {
        match self.columns.get_mut(index) {
            Some(column) => column.width.set(width),
            None => {
                tracing::debug!(index, "resize of unknown column ignored");
                false
            }
        }
    }

    pub fn get(&self, index: usize) -> Option<&ColumnDescriptor> {
        self.columns.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ColumnDescriptor> {
        self.columns.get_mut(index)
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn widths(&self) -> Vec<i32> {
        self.columns.iter().map(|c| *c.width.get()).collect()
    }
}
