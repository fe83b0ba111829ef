//! # Tree Adapter
//!
//! The home view: a forest with two root categories, variable groups first, then
//! secure files.
//!
//! ```text
//! Group "Shared"            (Folder, aggregated status)
//!   GroupVariable "Url"     (Variable or Key icon)
//!   GroupVariable "Token"
//! File "signing.pfx"        (Document)
//!   FileProperty ...        (reserved, never populated today)
//! ```
//!
//! ## Arena
//!
//! Nodes live in a flat `Vec` and refer to each other by [`NodeId`]. Parents are always
//! pushed before their children, so sibling ids increase in source order. That makes
//! "restore source order" a sort by id, and lets the filter stage resolve every
//! subtree in a single reverse sweep.
//!
//! ## Rebuilds
//!
//! Any change to the store regenerates the whole forest. Two entry points differ only
//! in what happens to expand state:
//!
//! - [`TreeAdapter::rebuild`] follows a load. Expansion is reset unless
//!   `preserve_tree_expansion` is configured.
//! - [`TreeAdapter::refresh`] follows an edit. Every node whose [`NodeKey`] survives
//!   keeps its expand state, so the row being edited never disappears.
//!
//! Node ids are only valid until the next regeneration; keys are stable.
//!
//! ## Sort and Filter
//!
//! Sorting orders the children of every node and the roots within their category.
//! Filtering keeps a node when it matches or any descendant does. Neither touches
//! expand state.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::adapters::{display_value, NO_ITEMS_FOUND};
use crate::columns::{ColumnDescriptor, ColumnSet};
use crate::config::PanelConfig;
use crate::error::{Result, VarhubError};
use crate::filter::{fold, Searchable};
use crate::interaction::{
    lock_action, status_trailer, InteractionSignal, InteractionTracker, RowAction, RowInteraction, Trailer,
};
use crate::model::{Field, GroupId, RecordId, SecureFile, VariableRecord};
use crate::pipeline::{collate, collate_masked, SortDirection, SortSpec, StageCounts};
use crate::status::{aggregate, Status};
use crate::store::RecordStore;

pub type NodeId = usize;

pub const NAME_COLUMN: usize = 0;
pub const VALUE_COLUMN: usize = 1;

/// Identity of a node that survives rebuilds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Group(GroupId),
    Variable(RecordId),
    /// Position of the file in the loaded list.
    File(usize),
    FileProperty(usize, usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Group,
    GroupVariable,
    File,
    FileProperty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryItem {
    Group {
        id: GroupId,
        name: String,
        status: Option<Status>,
    },
    GroupVariable(VariableRecord),
    File(SecureFile),
    /// Secure-file metadata. Part of the shape, not produced by any source yet.
    FileProperty { name: String, value: String },
}

impl LibraryItem {
    pub fn kind(&self) -> NodeKind {
        match self {
            LibraryItem::Group { .. } => NodeKind::Group,
            LibraryItem::GroupVariable(_) => NodeKind::GroupVariable,
            LibraryItem::File(_) => NodeKind::File,
            LibraryItem::FileProperty { .. } => NodeKind::FileProperty,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            LibraryItem::Group { name, .. } => name,
            LibraryItem::GroupVariable(record) => &record.name,
            LibraryItem::File(file) => &file.name,
            LibraryItem::FileProperty { name, .. } => name,
        }
    }

    /// Raw value; empty for groups and files.
    pub fn value(&self) -> &str {
        match self {
            LibraryItem::GroupVariable(record) => &record.value,
            LibraryItem::FileProperty { value, .. } => value,
            LibraryItem::Group { .. } | LibraryItem::File(_) => "",
        }
    }

    pub fn status(&self) -> Option<&Status> {
        match self {
            LibraryItem::Group { status, .. } => status.as_ref(),
            LibraryItem::GroupVariable(record) => record.status.as_ref(),
            LibraryItem::File(_) | LibraryItem::FileProperty { .. } => None,
        }
    }

    fn is_secret(&self) -> bool {
        matches!(self, LibraryItem::GroupVariable(record) if record.is_secret)
    }
}

impl Searchable for LibraryItem {
    fn search_fields(&self) -> Vec<&str> {
        match self {
            LibraryItem::GroupVariable(record) => record.search_fields(),
            LibraryItem::FileProperty { name, value } => vec![name.as_str(), value.as_str()],
            other => vec![other.name()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeIcon {
    Folder,
    /// Secret variable.
    Key,
    Variable,
    Document,
    Property,
}

/// Events the rendering collaborator reports for the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeEvent {
    Toggle(NodeId),
    Edit { node: NodeId, field: Field, value: String },
    Interaction { node: NodeId, signal: InteractionSignal },
    /// Add-variable action on a group row.
    Add(NodeId),
    Delete(NodeId),
    ToggleSecret(NodeId),
    Sort(SortSpec),
    Resize { column: usize, width: i32 },
}

/// View model of one visible tree row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub node: NodeId,
    pub key: NodeKey,
    pub depth: usize,
    pub kind: NodeKind,
    pub icon: TreeIcon,
    pub name: String,
    /// Masked for secrets.
    pub value: String,
    pub status: Option<Status>,
    pub expandable: bool,
    pub expanded: bool,
    pub disabled: bool,
    pub name_editable: bool,
    pub value_editable: bool,
    pub name_action: Option<RowAction>,
    pub value_trailer: Trailer,
}

#[derive(Debug, Clone)]
struct TreeNode {
    key: NodeKey,
    item: LibraryItem,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    expanded: bool,
}

#[derive(Debug)]
pub struct TreeAdapter {
    nodes: Vec<TreeNode>,
    roots: Vec<NodeId>,
    sort: Option<SortSpec>,
    folded_text: String,
    /// Per node: survives the filter.
    visible: Vec<bool>,
    counts: StageCounts,
    rebuilds: usize,
    preserve_expansion: bool,
    columns: ColumnSet,
    interaction: InteractionTracker<NodeKey>,
}

impl TreeAdapter {
    pub fn new(config: &PanelConfig) -> Self {
        Self {
            nodes: Vec::new(),
            roots: Vec::new(),
            sort: None,
            folded_text: String::new(),
            visible: Vec::new(),
            counts: StageCounts::default(),
            rebuilds: 0,
            preserve_expansion: config.preserve_tree_expansion,
            columns: ColumnSet::new(vec![
                ColumnDescriptor::new("name", "Name", PanelConfig::proportional(config.name_weight)),
                ColumnDescriptor::new("value", "Value", PanelConfig::proportional(config.value_weight)),
            ]),
            interaction: InteractionTracker::new(),
        }
    }

    /// Regenerates the forest after a load.
    pub fn rebuild(&mut self, store: &RecordStore) {
        self.regenerate(store, self.preserve_expansion);
    }

    /// Regenerates the forest after an edit, keeping expand state by key.
    pub fn refresh(&mut self, store: &RecordStore) {
        self.regenerate(store, true);
    }

    fn regenerate(&mut self, store: &RecordStore, keep_expansion: bool) {
        let keep: HashSet<NodeKey> = if keep_expansion {
            self.nodes.iter().filter(|n| n.expanded).map(|n| n.key).collect()
        } else {
            HashSet::new()
        };

        self.nodes.clear();
        self.roots.clear();
        for group in store.groups() {
            let records: Vec<&VariableRecord> = store.records_in_group(&group.name).collect();
            let parent = self.push(
                None,
                NodeKey::Group(group.id),
                LibraryItem::Group {
                    id: group.id,
                    name: group.name.clone(),
                    status: aggregate(records.iter().map(|r| r.status.as_ref())),
                },
            );
            for record in records {
                self.push(
                    Some(parent),
                    NodeKey::Variable(record.id),
                    LibraryItem::GroupVariable(record.clone()),
                );
            }
        }
        for (index, file) in store.secure_files().iter().enumerate() {
            self.push(None, NodeKey::File(index), LibraryItem::File(file.clone()));
        }

        for node in self.nodes.iter_mut() {
            node.expanded = keep.contains(&node.key);
        }
        let alive: HashSet<NodeKey> = self.nodes.iter().map(|n| n.key).collect();
        self.interaction.retain(|key| alive.contains(key));
        self.rebuilds += 1;

        tracing::debug!(
            nodes = self.nodes.len(),
            roots = self.roots.len(),
            preserved = keep.len(),
            "library tree rebuilt"
        );
        self.resort();
        self.refilter();
    }

    fn push(&mut self, parent: Option<NodeId>, key: NodeKey, item: LibraryItem) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(TreeNode {
            key,
            item,
            parent,
            children: Vec::new(),
            expanded: false,
        });
        match parent {
            Some(parent) => self.nodes[parent].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn set_sort(&mut self, spec: SortSpec) {
        self.sort = match spec.direction {
            SortDirection::None => None,
            _ => Some(spec),
        };
        self.resort();
    }

    /// Only the filter stage runs. Returns false when the folded text is unchanged.
    pub fn set_filter_text(&mut self, text: &str) -> bool {
        let folded = fold(text);
        if folded == self.folded_text {
            return false;
        }
        self.folded_text = folded;
        self.refilter();
        true
    }

    fn compare(&self, a: NodeId, b: NodeId) -> Ordering {
        let (x, y) = (&self.nodes[a].item, &self.nodes[b].item);
        let category = |item: &LibraryItem| matches!(item, LibraryItem::File(_));
        let by_column = match self.sort {
            None => Ordering::Equal,
            Some(spec) => {
                let ord = match spec.column {
                    NAME_COLUMN => collate(x.name(), y.name()),
                    VALUE_COLUMN => collate_masked((x.value(), x.is_secret()), (y.value(), y.is_secret())),
                    _ => Ordering::Equal,
                };
                match spec.direction {
                    SortDirection::Descending => ord.reverse(),
                    _ => ord,
                }
            }
        };
        category(x)
            .cmp(&category(y))
            .then(by_column)
            .then_with(|| a.cmp(&b))
    }

    fn resort(&mut self) {
        let mut roots = std::mem::take(&mut self.roots);
        roots.sort_by(|&a, &b| self.compare(a, b));
        self.roots = roots;
        for id in 0..self.nodes.len() {
            let mut children = std::mem::take(&mut self.nodes[id].children);
            children.sort_by(|&a, &b| self.compare(a, b));
            self.nodes[id].children = children;
        }
        self.counts.sorts += 1;
    }

    fn refilter(&mut self) {
        let text = &self.folded_text;
        let mut visible = vec![false; self.nodes.len()];
        // children have larger ids than their parent
        for id in (0..self.nodes.len()).rev() {
            let node = &self.nodes[id];
            visible[id] = node.item.matches_text(text) || node.children.iter().any(|&c| visible[c]);
        }
        self.visible = visible;
        self.counts.filters += 1;
    }

    fn node(&self, id: NodeId) -> Result<&TreeNode> {
        self.nodes.get(id).ok_or(VarhubError::UnknownNode(id))
    }

    /// Flips a node's expand state. Leaves never expand; returns whether anything changed.
    pub fn toggle(&mut self, id: NodeId) -> Result<bool> {
        let expanded = !self.node(id)?.expanded;
        self.set_expanded(id, expanded)
    }

    pub fn set_expanded(&mut self, id: NodeId, expanded: bool) -> Result<bool> {
        let node = self.nodes.get_mut(id).ok_or(VarhubError::UnknownNode(id))?;
        if node.children.is_empty() || node.expanded == expanded {
            return Ok(false);
        }
        node.expanded = expanded;
        Ok(true)
    }

    pub fn expand_all(&mut self) {
        for node in self.nodes.iter_mut() {
            node.expanded = !node.children.is_empty();
        }
    }

    /// Expands every ancestor of the node with `key` so its row is visible. Returns
    /// whether anything changed.
    pub fn reveal(&mut self, key: NodeKey) -> bool {
        let mut changed = false;
        let mut cursor = self.find(key).and_then(|id| self.nodes[id].parent);
        while let Some(id) = cursor {
            let node = &mut self.nodes[id];
            changed |= !node.expanded;
            node.expanded = true;
            cursor = node.parent;
        }
        changed
    }

    pub fn collapse_all(&mut self) {
        for node in self.nodes.iter_mut() {
            node.expanded = false;
        }
    }

    pub fn interact(&mut self, id: NodeId, signal: InteractionSignal) -> Result<bool> {
        let key = self.node(id)?.key;
        Ok(self.interaction.apply(key, signal))
    }

    pub fn interaction(&self, id: NodeId) -> RowInteraction {
        self.nodes
            .get(id)
            .map(|n| self.interaction.state(n.key))
            .unwrap_or_default()
    }

    pub fn resize_column(&mut self, column: usize, width: i32) -> bool {
        self.columns.resize(column, width)
    }

    pub fn item(&self, id: NodeId) -> Option<&LibraryItem> {
        self.nodes.get(id).map(|n| &n.item)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(id).map_or(&[][..], |n| n.children.as_slice())
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn find(&self, key: NodeKey) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.key == key)
    }

    /// The record behind a variable node.
    pub fn record_id(&self, id: NodeId) -> Result<RecordId> {
        match &self.node(id)?.item {
            LibraryItem::GroupVariable(record) => Ok(record.id),
            _ => Err(VarhubError::UnknownNode(id)),
        }
    }

    /// Backend id of the group a group node stands for.
    pub fn group_id(&self, id: NodeId) -> Result<GroupId> {
        match &self.node(id)?.item {
            LibraryItem::Group { id, .. } => Ok(*id),
            _ => Err(VarhubError::UnknownNode(id)),
        }
    }

    /// Visible rows in display order: filtered, sorted, collapsed subtrees skipped.
    pub fn rows(&self, mask: &str) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        for &root in &self.roots {
            self.collect_rows(root, 0, mask, &mut rows);
        }
        rows
    }

    fn collect_rows(&self, id: NodeId, depth: usize, mask: &str, rows: &mut Vec<TreeRow>) {
        if !self.visible.get(id).copied().unwrap_or(false) {
            return;
        }
        let node = &self.nodes[id];
        rows.push(self.row(id, depth, mask));
        if node.expanded {
            for &child in &node.children {
                self.collect_rows(child, depth + 1, mask, rows);
            }
        }
    }

    fn row(&self, id: NodeId, depth: usize, mask: &str) -> TreeRow {
        let node = &self.nodes[id];
        let interaction = self.interaction.state(node.key);
        let item = &node.item;
        let status = item.status().cloned();
        let disabled = matches!(item, LibraryItem::GroupVariable(record) if record.is_deleted());

        let (icon, name_action, value_trailer) = match item {
            LibraryItem::Group { .. } => (
                TreeIcon::Folder,
                interaction.has_mouse.then_some(RowAction::Add),
                more_or_badge(interaction, status.as_ref()),
            ),
            LibraryItem::GroupVariable(record) => {
                let icon = if record.is_secret {
                    TreeIcon::Key
                } else {
                    TreeIcon::Variable
                };
                if disabled {
                    (icon, None, status_trailer(status.as_ref()))
                } else if interaction.is_engaged() {
                    (icon, Some(RowAction::Delete), Trailer::Action(lock_action(record.is_secret)))
                } else {
                    (icon, None, status_trailer(status.as_ref()))
                }
            }
            LibraryItem::File(_) => (TreeIcon::Document, None, more_or_badge(interaction, None)),
            LibraryItem::FileProperty { .. } => (TreeIcon::Property, None, Trailer::Empty),
        };

        let is_variable = item.kind() == NodeKind::GroupVariable;
        TreeRow {
            node: id,
            key: node.key,
            depth,
            kind: item.kind(),
            icon,
            name: item.name().to_string(),
            value: display_value(item.value(), item.is_secret(), mask),
            status,
            expandable: !node.children.is_empty(),
            expanded: node.expanded,
            disabled,
            name_editable: is_variable && !disabled && !item.is_secret(),
            value_editable: is_variable && !disabled,
            name_action,
            value_trailer,
        }
    }

    /// `Some("No items found")` when nothing survives the filter.
    pub fn placeholder(&self) -> Option<&'static str> {
        (!self.roots.iter().any(|&r| self.visible[r])).then_some(NO_ITEMS_FOUND)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn stage_counts(&self) -> StageCounts {
        self.counts
    }

    pub fn rebuild_count(&self) -> usize {
        self.rebuilds
    }

    pub fn sort_spec(&self) -> Option<SortSpec> {
        self.sort
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }
}

fn more_or_badge(interaction: RowInteraction, status: Option<&Status>) -> Trailer {
    if interaction.is_engaged() {
        Trailer::Action(RowAction::More)
    } else {
        status_trailer(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::fixtures::StoreFixture;

    fn tree_for(store: &RecordStore, config: &PanelConfig) -> TreeAdapter {
        let mut tree = TreeAdapter::new(config);
        tree.rebuild(store);
        tree
    }

    fn labels(tree: &TreeAdapter) -> Vec<(usize, String)> {
        tree.rows("*").into_iter().map(|r| (r.depth, r.name)).collect()
    }

    #[test]
    fn builds_groups_then_files_collapsed() {
        let fixture = StoreFixture::with_secret();
        let tree = tree_for(&fixture.store, &PanelConfig::default());

        let rows = tree.rows("*");
        let kinds: Vec<NodeKind> = rows.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![NodeKind::Group, NodeKind::Group, NodeKind::File]);
        assert!(rows.iter().all(|r| !r.expanded));
        assert_eq!(rows[0].icon, TreeIcon::Folder);
        assert_eq!(rows[2].icon, TreeIcon::Document);
        assert!(!rows[2].expandable);
    }

    #[test]
    fn toggle_reveals_children_with_key_icon_for_secrets() {
        let fixture = StoreFixture::with_secret();
        let mut tree = tree_for(&fixture.store, &PanelConfig::default());
        let secrets = tree.find(NodeKey::Group(2)).unwrap();

        assert!(tree.toggle(secrets).unwrap());
        let rows = tree.rows("*");
        let token = rows.iter().find(|r| r.name == "Token").unwrap();
        assert_eq!(token.depth, 1);
        assert_eq!(token.icon, TreeIcon::Key);
        assert_eq!(token.value, "*");
        assert!(!token.name_editable);

        assert!(tree.toggle(secrets).unwrap());
        assert_eq!(tree.rows("*").len(), 3);
    }

    #[test]
    fn leaves_do_not_toggle() {
        let fixture = StoreFixture::with_secret();
        let mut tree = tree_for(&fixture.store, &PanelConfig::default());
        let file = tree.find(NodeKey::File(0)).unwrap();
        assert!(!tree.toggle(file).unwrap());
        assert!(matches!(tree.toggle(99), Err(VarhubError::UnknownNode(99))));
    }

    #[test]
    fn rebuild_resets_expansion_by_default() {
        let mut fixture = StoreFixture::two_groups();
        let mut tree = tree_for(&fixture.store, &PanelConfig::default());
        tree.expand_all();
        assert_eq!(tree.rows("*").len(), 5);

        let id = fixture.store.records()[0].id;
        fixture.store.mutate(id, Field::Value, "x").unwrap();
        tree.rebuild(&fixture.store);
        assert_eq!(tree.rows("*").len(), 2);
    }

    #[test]
    fn rebuild_can_preserve_expansion() {
        let config = PanelConfig {
            preserve_tree_expansion: true,
            ..Default::default()
        };
        let mut fixture = StoreFixture::two_groups();
        let mut tree = tree_for(&fixture.store, &config);
        let group2 = tree.find(NodeKey::Group(2)).unwrap();
        tree.toggle(group2).unwrap();

        fixture.store.add_variable("group2");
        tree.rebuild(&fixture.store);
        assert_eq!(tree.rows("*").len(), 5);
        assert_eq!(tree.rebuild_count(), 2);
    }

    #[test]
    fn refresh_keeps_expansion_of_surviving_nodes() {
        let mut fixture = StoreFixture::two_groups();
        let mut tree = tree_for(&fixture.store, &PanelConfig::default());
        let group2 = tree.find(NodeKey::Group(2)).unwrap();
        tree.toggle(group2).unwrap();
        let k2 = fixture.store.records()[2].id;

        fixture.store.mutate(k2, Field::Value, "edited").unwrap();
        tree.refresh(&fixture.store);
        assert_eq!(
            labels(&tree),
            vec![(0, "group1".into()), (0, "group2".into()), (1, "K1".into()), (1, "K2".into())]
        );
        let row = tree.rows("*").into_iter().find(|r| r.key == NodeKey::Variable(k2)).unwrap();
        assert_eq!(row.value, "edited");
    }

    #[test]
    fn reveal_expands_ancestors() {
        let mut fixture = StoreFixture::two_groups();
        let added = fixture.store.add_variable("group1");
        let mut tree = tree_for(&fixture.store, &PanelConfig::default());
        assert_eq!(tree.rows("*").len(), 2);

        assert!(tree.reveal(NodeKey::Variable(added)));
        assert!(!tree.reveal(NodeKey::Variable(added)));
        let rows = tree.rows("*");
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().any(|r| r.key == NodeKey::Variable(added) && r.depth == 1));
    }

    #[test]
    fn value_sort_does_not_order_by_hidden_values() {
        let mut store = RecordStore::new();
        store.load(
            vec![crate::model::VariableGroup::new(1, "g")
                .with_variable("A", crate::model::VariableValue::secret(Some("aaa".into())))
                .with_variable("B", crate::model::VariableValue::plain("b"))
                .with_variable("C", crate::model::VariableValue::secret(Some("000".into())))],
            vec![],
        );
        let mut tree = tree_for(&store, &PanelConfig::default());
        tree.expand_all();
        tree.set_sort(SortSpec::descending(VALUE_COLUMN));
        let names: Vec<String> = tree.rows("*").into_iter().skip(1).map(|r| r.name).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }

    #[test]
    fn group_status_aggregates_children() {
        let mut fixture = StoreFixture::two_groups();
        let id = fixture.store.records()[0].id;
        fixture.store.mutate(id, Field::Value, "x").unwrap();
        fixture.store.add_variable("group2");
        let tree = tree_for(&fixture.store, &PanelConfig::default());

        let rows = tree.rows("*");
        assert_eq!(rows[0].status, Some(Status::Modified));
        assert!(rows[1].status.as_ref().is_some_and(Status::is_error));
    }

    #[test]
    fn filter_keeps_ancestors_of_matches() {
        let fixture = StoreFixture::two_groups();
        let mut tree = tree_for(&fixture.store, &PanelConfig::default());
        tree.expand_all();
        let before = tree.stage_counts();

        assert!(tree.set_filter_text("K2"));
        assert_eq!(labels(&tree), vec![(0, "group2".into()), (1, "K2".into())]);
        assert_eq!(tree.stage_counts().sorts, before.sorts);

        tree.set_filter_text("nothing");
        assert_eq!(tree.placeholder(), Some(NO_ITEMS_FOUND));
    }

    #[test]
    fn sort_orders_each_level_and_keeps_files_last() {
        let fixture = StoreFixture::with_secret();
        let mut tree = tree_for(&fixture.store, &PanelConfig::default());
        tree.expand_all();
        tree.set_sort(SortSpec::descending(NAME_COLUMN));

        assert_eq!(
            labels(&tree),
            vec![
                (0, "secrets".into()),
                (1, "Url".into()),
                (1, "Token".into()),
                (0, "plain".into()),
                (1, "Url".into()),
                (0, "signing.pfx".into()),
            ]
        );

        tree.set_sort(SortSpec {
            column: NAME_COLUMN,
            direction: SortDirection::None,
        });
        assert_eq!(labels(&tree)[0], (0, "plain".into()));
    }

    #[test]
    fn actions_depend_on_node_kind() {
        let fixture = StoreFixture::two_groups();
        let mut tree = tree_for(&fixture.store, &PanelConfig::default());
        tree.expand_all();
        let group = tree.find(NodeKey::Group(1)).unwrap();
        let variable = tree.children(group)[0];

        tree.interact(group, InteractionSignal::MouseEnter).unwrap();
        tree.interact(variable, InteractionSignal::Focus).unwrap();
        let rows = tree.rows("*");
        assert_eq!(rows[0].name_action, Some(RowAction::Add));
        assert_eq!(rows[0].value_trailer, Trailer::Action(RowAction::More));
        assert_eq!(rows[1].name_action, Some(RowAction::Delete));
        assert_eq!(rows[1].value_trailer, Trailer::Action(RowAction::Lock));

        // focus alone does not reveal add on a group
        tree.interact(group, InteractionSignal::MouseLeave).unwrap();
        tree.interact(group, InteractionSignal::Focus).unwrap();
        assert_eq!(tree.rows("*")[0].name_action, None);
    }

    #[test]
    fn node_lookups() {
        let fixture = StoreFixture::two_groups();
        let tree = tree_for(&fixture.store, &PanelConfig::default());
        let group = tree.find(NodeKey::Group(1)).unwrap();
        let child = tree.children(group)[0];
        assert_eq!(tree.group_id(group).unwrap(), 1);
        assert_eq!(tree.parent(child), Some(group));
        assert_eq!(tree.record_id(child).unwrap(), fixture.store.records()[0].id);
        assert!(tree.record_id(group).is_err());
    }
}
