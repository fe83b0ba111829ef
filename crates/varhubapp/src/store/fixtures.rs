//! Canned stores for tests.

use super::RecordStore;
use crate::model::{SecureFile, VariableGroup, VariableValue};

pub struct StoreFixture {
    pub store: RecordStore,
}

impl Default for StoreFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreFixture {
    pub fn new() -> Self {
        Self {
            store: RecordStore::new(),
        }
    }

    /// `group1 = {K1: v1}`, `group2 = {K1: v1, K2: v2}`.
    pub fn two_groups() -> Self {
        let mut fixture = Self::new();
        fixture.store.load(two_groups(), vec![]);
        fixture
    }

    /// A plain group plus a group holding a secret `Token`, and one secure file.
    pub fn with_secret() -> Self {
        let mut fixture = Self::new();
        fixture.store.load(
            vec![
                VariableGroup::new(1, "plain").with_variable("Url", VariableValue::plain("https://x")),
                VariableGroup::new(2, "secrets")
                    .with_variable("Token", VariableValue::secret(None))
                    .with_variable("Url", VariableValue::plain("https://y")),
            ],
            vec![SecureFile::new("signing.pfx")],
        );
        fixture
    }
}

pub fn two_groups() -> Vec<VariableGroup> {
    vec![
        VariableGroup::new(1, "group1").with_variable("K1", VariableValue::plain("v1")),
        VariableGroup::new(2, "group2")
            .with_variable("K1", VariableValue::plain("v1"))
            .with_variable("K2", VariableValue::plain("v2")),
    ]
}
