//! # Dashboard View
//!
//! All UI state of a dashboard session lives in one plain, serializable value,
//! [`ViewState`]: which locations are expanded, what is selected, whether the add-item
//! form is open and for which location, and the current item filters.
//!
//! [`compose`] is a pure function of the Record Store and a `ViewState`. It produces a
//! [`DashboardView`]: the nested tree, the detail pane and the add-item target. UIs
//! render that value and never look at the store directly.
//!
//! ## Selection Rules
//!
//! - Selecting a location clears any selected item (and closes the add-item form).
//! - Selecting an item remembers its owning location and closes the add-item form.
//! - The add-item form only opens for an existing sub-location (never a godown).
//! - A selection whose record has since been deleted simply renders no detail.

use crate::error::{GodownError, Result};
use crate::filter::ItemFilter;
use crate::hierarchy::Hierarchy;
use crate::model::{Item, Location};
use crate::store::records::RecordStore;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

pub const ADD_ITEM_GODOWN_ERROR: &str = "Items can only be added to sub-locations.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selection {
    #[default]
    None,
    Location {
        location_id: String,
    },
    Item {
        item_id: String,
        location_id: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    #[serde(default)]
    pub expanded: BTreeSet<String>,
    #[serde(default)]
    pub selection: Selection,
    #[serde(default)]
    pub add_item_target: Option<String>,
    #[serde(default)]
    pub filter: ItemFilter,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    /// Flips one location's open flag and returns the new value.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.to_string());
            true
        }
    }

    pub fn expand(&mut self, id: &str) {
        self.expanded.insert(id.to_string());
    }

    pub fn expand_all(&mut self, store: &RecordStore) {
        self.expanded
            .extend(store.locations().iter().map(|l| l.id.clone()));
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    pub fn select_location(&mut self, location_id: &str) {
        self.selection = Selection::Location {
            location_id: location_id.to_string(),
        };
        self.add_item_target = None;
    }

    pub fn select_item(&mut self, item_id: &str, location_id: &str) {
        self.selection = Selection::Item {
            item_id: item_id.to_string(),
            location_id: location_id.to_string(),
        };
        self.add_item_target = None;
    }

    /// What clicking a location row does: toggle it open/closed and select it.
    pub fn activate_location(&mut self, location_id: &str) -> bool {
        let open = self.toggle(location_id);
        self.select_location(location_id);
        open
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::None;
    }

    /// Opens the add-item form for `location_id` if it is an existing sub-location.
    /// On failure the state is left untouched.
    pub fn request_add_item(&mut self, store: &RecordStore, location_id: &str) -> Result<()> {
        match store.location(location_id) {
            Some(location) if location.is_sub_location() => {
                self.add_item_target = Some(location_id.to_string());
                Ok(())
            }
            _ => Err(GodownError::validation(ADD_ITEM_GODOWN_ERROR)),
        }
    }

    pub fn cancel_add_item(&mut self) {
        self.add_item_target = None;
    }

    /// Drops expand flags for locations that no longer exist.
    pub fn prune(&mut self, store: &RecordStore) {
        self.expanded.retain(|id| store.location(id).is_some());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemLeaf {
    pub item: Item,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationNode {
    pub location: Location,
    pub expanded: bool,
    pub selected: bool,
    /// Sub-locations show an "add item" affordance when expanded; godowns never do.
    pub can_add_item: bool,
    /// Populated only when expanded.
    pub children: Vec<LocationNode>,
    /// Populated only when expanded.
    pub items: Vec<ItemLeaf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetailPane {
    #[default]
    Empty,
    Location {
        location: Location,
        path: Vec<Location>,
        sub_locations: Vec<Location>,
        items: Vec<Item>,
    },
    Item {
        item: Item,
        location: Option<Location>,
        path: Vec<Location>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardView {
    pub tree: Vec<LocationNode>,
    pub detail: DetailPane,
    pub add_item_target: Option<Location>,
    pub filter: ItemFilter,
    pub loading: bool,
}

/// Items stored directly in `location_id`, in store order.
pub fn render_items<'a>(store: &'a RecordStore, location_id: &str) -> Vec<&'a Item> {
    store
        .items()
        .iter()
        .filter(|item| item.sub_godown_id == location_id)
        .collect()
}

pub fn compose(store: &RecordStore, state: &ViewState) -> DashboardView {
    let hierarchy = Hierarchy::build(store.locations(), store.items());

    let mut seen = HashSet::new();
    let tree = hierarchy
        .roots()
        .iter()
        .filter_map(|root| build_node(&hierarchy, root, state, &mut seen))
        .collect();

    let add_item_target = state
        .add_item_target
        .as_deref()
        .and_then(|id| store.location(id))
        .filter(|l| l.is_sub_location())
        .cloned();

    DashboardView {
        tree,
        detail: compose_detail(&hierarchy, store, state),
        add_item_target,
        filter: state.filter.clone(),
        loading: false,
    }
}

fn build_node<'a>(
    hierarchy: &Hierarchy<'a>,
    location: &'a Location,
    state: &ViewState,
    seen: &mut HashSet<&'a str>,
) -> Option<LocationNode> {
    if !seen.insert(location.id.as_str()) {
        return None;
    }

    let expanded = state.is_expanded(&location.id);
    let (children, items) = if expanded {
        let children = hierarchy
            .children(&location.id)
            .into_iter()
            .filter_map(|child| build_node(hierarchy, child, state, seen))
            .collect();
        let items = hierarchy
            .items_of(&location.id)
            .into_iter()
            .map(|item| ItemLeaf {
                selected: matches!(&state.selection, Selection::Item { item_id, .. } if *item_id == item.id),
                item: item.clone(),
            })
            .collect();
        (children, items)
    } else {
        (Vec::new(), Vec::new())
    };

    Some(LocationNode {
        location: location.clone(),
        expanded,
        selected: matches!(&state.selection, Selection::Location { location_id } if *location_id == location.id),
        can_add_item: location.is_sub_location(),
        children,
        items,
    })
}

fn compose_detail(hierarchy: &Hierarchy<'_>, store: &RecordStore, state: &ViewState) -> DetailPane {
    match &state.selection {
        Selection::None => DetailPane::Empty,
        Selection::Location { location_id } => match store.location(location_id) {
            Some(location) => DetailPane::Location {
                location: location.clone(),
                path: cloned(hierarchy.path_to(location_id)),
                sub_locations: cloned(hierarchy.children(location_id)),
                items: render_items(store, location_id).into_iter().cloned().collect(),
            },
            None => DetailPane::Empty,
        },
        Selection::Item {
            item_id,
            location_id,
        } => match store.item(item_id) {
            Some(item) => DetailPane::Item {
                item: item.clone(),
                location: store.location(location_id).cloned(),
                path: cloned(hierarchy.path_to(location_id)),
            },
            None => DetailPane::Empty,
        },
    }
}

fn cloned(locations: Vec<&Location>) -> Vec<Location> {
    locations.into_iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::{godown, item, sub_location};

    fn store() -> RecordStore {
        RecordStore::with_records(
            vec![
                godown("g1", "Main"),
                sub_location("l1", "Shelf A", "g1"),
                sub_location("l2", "Shelf B", "g1"),
                godown("g2", "Overflow"),
            ],
            vec![
                item("i1", "Drill", "l1"),
                item("i2", "Hammer", "l2"),
                item("i3", "Saw", "l1"),
            ],
        )
    }

    #[test]
    fn toggle_flips_only_one_flag() {
        let mut state = ViewState::new();
        assert!(state.toggle("g1"));
        assert!(state.toggle("l1"));
        assert!(!state.toggle("g1"));
        assert!(!state.is_expanded("g1"));
        assert!(state.is_expanded("l1"));
    }

    #[test]
    fn collapsed_tree_shows_roots_only() {
        let view = compose(&store(), &ViewState::new());
        let names: Vec<&str> = view.tree.iter().map(|n| n.location.name.as_str()).collect();
        assert_eq!(names, vec!["Main", "Overflow"]);
        assert!(view.tree.iter().all(|n| n.children.is_empty() && n.items.is_empty()));
        assert_eq!(view.detail, DetailPane::Empty);
    }

    #[test]
    fn expanded_nodes_show_children_and_items() {
        let mut state = ViewState::new();
        state.expand("g1");
        state.expand("l1");
        let view = compose(&store(), &state);

        let main = &view.tree[0];
        assert!(main.expanded);
        assert!(!main.can_add_item);
        assert_eq!(main.children.len(), 2);

        let shelf_a = &main.children[0];
        assert!(shelf_a.can_add_item);
        let items: Vec<&str> = shelf_a.items.iter().map(|l| l.item.id.as_str()).collect();
        assert_eq!(items, vec!["i1", "i3"]);

        let shelf_b = &main.children[1];
        assert!(!shelf_b.expanded);
        assert!(shelf_b.items.is_empty());
    }

    #[test]
    fn selecting_location_clears_item() {
        let mut state = ViewState::new();
        state.select_item("i1", "l1");
        state.select_location("g1");
        assert_eq!(
            state.selection,
            Selection::Location {
                location_id: "g1".into()
            }
        );
    }

    #[test]
    fn selecting_item_closes_add_form_and_keeps_owner() {
        let store = store();
        let mut state = ViewState::new();
        state.request_add_item(&store, "l1").unwrap();
        state.select_item("i3", "l1");
        assert_eq!(state.add_item_target, None);

        match compose(&store, &state).detail {
            DetailPane::Item { item, location, path } => {
                assert_eq!(item.id, "i3");
                assert_eq!(location.unwrap().id, "l1");
                let crumbs: Vec<String> = path.into_iter().map(|l| l.name).collect();
                assert_eq!(crumbs, vec!["Main", "Shelf A"]);
            }
            other => panic!("unexpected detail: {:?}", other),
        }
    }

    #[test]
    fn activate_toggles_and_selects() {
        let mut state = ViewState::new();
        assert!(state.activate_location("g1"));
        assert!(state.is_expanded("g1"));
        assert!(!state.activate_location("g1"));
        assert_eq!(
            state.selection,
            Selection::Location {
                location_id: "g1".into()
            }
        );
    }

    #[test]
    fn add_item_rejected_for_godown() {
        let store = store();
        let mut state = ViewState::new();
        state.select_location("g1");
        let before = state.clone();

        let err = state.request_add_item(&store, "g1").unwrap_err();
        assert_eq!(err.to_string(), ADD_ITEM_GODOWN_ERROR);
        assert_eq!(state, before);
        assert!(compose(&store, &state).add_item_target.is_none());
    }

    #[test]
    fn add_item_rejected_for_unknown_location() {
        let mut state = ViewState::new();
        assert!(state.request_add_item(&store(), "ghost").is_err());
        assert_eq!(state.add_item_target, None);
    }

    #[test]
    fn add_item_opens_for_sub_location() {
        let store = store();
        let mut state = ViewState::new();
        state.request_add_item(&store, "l2").unwrap();
        let view = compose(&store, &state);
        assert_eq!(view.add_item_target.unwrap().id, "l2");
    }

    #[test]
    fn location_detail_lists_children_and_items() {
        let store = store();
        let mut state = ViewState::new();
        state.select_location("g1");
        match compose(&store, &state).detail {
            DetailPane::Location {
                sub_locations,
                items,
                ..
            } => {
                assert_eq!(sub_locations.len(), 2);
                assert!(items.is_empty());
            }
            other => panic!("unexpected detail: {:?}", other),
        }
    }

    #[test]
    fn deleted_selection_renders_nothing() {
        let mut store = store();
        let mut state = ViewState::new();
        state.select_item("i1", "l1");
        store.remove_item("i1");
        assert_eq!(compose(&store, &state).detail, DetailPane::Empty);
    }

    #[test]
    fn render_items_preserves_order() {
        let store = store();
        let ids: Vec<&str> = render_items(&store, "l1").iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["i1", "i3"]);
        assert!(render_items(&store, "g1").is_empty());
    }

    #[test]
    fn prune_drops_stale_flags() {
        let mut store = store();
        let mut state = ViewState::new();
        state.expand_all(&store);
        store.remove_location("l2");
        state.prune(&store);
        assert!(!state.is_expanded("l2"));
        assert!(state.is_expanded("l1"));
    }

    #[test]
    fn state_roundtrips_through_json() {
        let mut state = ViewState::new();
        state.expand("g1");
        state.select_item("i1", "l1");
        state.filter.category = "Tools".into();
        let json = serde_json::to_string(&state).unwrap();
        let back: ViewState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
