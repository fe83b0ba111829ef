//! # Filter State and Text Matching
//!
//! [`FilterState`] is the shared keyword filter every view reads from. It stores text
//! items under typed keys; the views only ever look at [`KEYWORD`].
//!
//! Matching is a plain case-insensitive substring test over the fields a row type
//! declares searchable through [`Searchable`]. There is no tokenizing and no fuzzy
//! matching: `"auth"` matches `"Auth.ClientId"` and nothing else in
//! `["Api.BaseUrl", "Auth.ClientId"]`.

use std::collections::BTreeMap;

use crate::observable::{Publisher, SubscriptionId};

/// Key of the free-text keyword item.
pub const KEYWORD: &str = "keyword";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterChanged {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Default)]
pub struct FilterState {
    items: BTreeMap<String, String>,
    publisher: Publisher<FilterChanged>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keyword(keyword: impl Into<String>) -> Self {
        let mut state = Self::new();
        state.items.insert(KEYWORD.to_string(), keyword.into());
        state
    }

    pub fn item(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    pub fn keyword(&self) -> &str {
        self.item(KEYWORD).unwrap_or("")
    }

    /// Stores an item and notifies when the stored text actually changed.
    pub fn set_item(&mut self, key: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.item(key).unwrap_or("") == value {
            return false;
        }
        self.items.insert(key.to_string(), value.clone());
        self.publisher.emit(&FilterChanged {
            key: key.to_string(),
            value,
        });
        true
    }

    pub fn set_keyword(&mut self, keyword: impl Into<String>) -> bool {
        self.set_item(KEYWORD, keyword)
    }

    pub fn has_active_filter(&self) -> bool {
        self.items.values().any(|v| !v.trim().is_empty())
    }

    /// The keyword the views should match against: empty while no filter is active.
    pub fn effective_keyword(&self) -> &str {
        if self.has_active_filter() {
            self.keyword()
        } else {
            ""
        }
    }

    /// Clears every item, notifying once per item that was non-empty.
    pub fn reset(&mut self) {
        let keys: Vec<String> = self.items.keys().cloned().collect();
        for key in keys {
            self.set_item(&key, "");
        }
    }

    pub fn subscribe(&mut self, callback: impl FnMut(&FilterChanged) + 'static) -> SubscriptionId {
        self.publisher.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.publisher.unsubscribe(id)
    }
}

/// Case folding applied to both the filter text and the searched fields.
pub fn fold(text: &str) -> String {
    text.to_lowercase()
}

/// A row type that exposes text fields to the keyword filter.
pub trait Searchable {
    fn search_fields(&self) -> Vec<&str>;

    /// `folded` must already be case-folded; empty text matches everything.
    fn matches_text(&self, folded: &str) -> bool {
        folded.is_empty()
            || self
                .search_fields()
                .iter()
                .any(|field| fold(field).contains(folded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    struct Row(&'static str, &'static str);

    impl Searchable for Row {
        fn search_fields(&self) -> Vec<&str> {
            vec![self.0, self.1]
        }
    }

    fn filter_items(text: &str, items: &[Row]) -> Vec<Row> {
        let folded = fold(text);
        items.iter().filter(|item| item.matches_text(&folded)).cloned().collect()
    }

    #[test]
    fn substring_match_is_case_insensitive() {
        let rows = vec![Row("Api.BaseUrl", "https://a"), Row("Auth.ClientId", "abc")];
        assert_eq!(filter_items("auth", &rows), vec![Row("Auth.ClientId", "abc")]);
        assert_eq!(filter_items("HTTPS", &rows), vec![Row("Api.BaseUrl", "https://a")]);
    }

    #[test]
    fn empty_text_matches_everything() {
        let rows = vec![Row("b", ""), Row("a", "")];
        assert_eq!(filter_items("", &rows), rows);
    }

    #[test]
    fn keyword_changes_notify_once() {
        let hits = Rc::new(RefCell::new(Vec::new()));
        let mut filter = FilterState::new();
        let sink = hits.clone();
        filter.subscribe(move |e| sink.borrow_mut().push(e.value.clone()));

        assert!(filter.set_keyword("auth"));
        assert!(!filter.set_keyword("auth"));
        assert!(filter.has_active_filter());
        filter.reset();

        assert_eq!(*hits.borrow(), vec!["auth".to_string(), String::new()]);
        assert!(!filter.has_active_filter());
        assert_eq!(filter.keyword(), "");
    }

    #[test]
    fn blank_keyword_is_not_an_active_filter() {
        let filter = FilterState::with_keyword("   ");
        assert!(!filter.has_active_filter());
    }
}
