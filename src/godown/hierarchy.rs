//! # Location Hierarchy
//!
//! Locations arrive from the server as a flat list where each record may point at its
//! parent through `parent_id`. Items point at their location through `sub_godown_id`.
//! [`Hierarchy::build`] turns those two flat lists into explicit adjacency:
//!
//! ```text
//! parent id   -> [child locations, in input order]
//! location id -> [items, in input order]
//! ```
//!
//! The hierarchy borrows the records; nothing is copied into parents, and it is simply
//! rebuilt whenever the Record Store changes. At tens to hundreds of records this is a
//! single linear pass.
//!
//! ## Roots
//!
//! A location is a root when it has no `parent_id`, or when its `parent_id` matches no
//! known location. A deleted godown therefore turns its former children into roots
//! instead of hiding them.
//!
//! ## Corrupted Links
//!
//! Every traversal keeps a visited set, so a `parent_id` cycle cannot recurse forever.
//! Locations caught in a cycle with no way up to a root would otherwise be invisible;
//! the first of them (in input order) is promoted to a root so the whole loop shows up
//! exactly once.

use crate::model::{Item, Location};
use std::collections::{HashMap, HashSet};

pub struct Hierarchy<'a> {
    by_id: HashMap<&'a str, &'a Location>,
    children: HashMap<&'a str, Vec<&'a Location>>,
    items: HashMap<&'a str, Vec<&'a Item>>,
    roots: Vec<&'a Location>,
}

/// Everything below a location, ordered so that deleting front to back never removes
/// a parent before its children.
#[derive(Debug, Default)]
pub struct Descendants<'a> {
    pub items: Vec<&'a Item>,
    pub locations: Vec<&'a Location>,
}

impl Descendants<'_> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.locations.is_empty()
    }
}

impl<'a> Hierarchy<'a> {
    pub fn build(locations: &'a [Location], items: &'a [Item]) -> Self {
        let mut by_id: HashMap<&str, &Location> = HashMap::with_capacity(locations.len());
        for location in locations {
            by_id.entry(location.id.as_str()).or_insert(location);
        }

        let mut children: HashMap<&str, Vec<&Location>> = HashMap::new();
        let mut roots = Vec::new();
        for location in locations {
            match location.parent_id.as_deref() {
                Some(parent) if by_id.contains_key(parent) => {
                    children.entry(parent).or_default().push(location);
                }
                _ => roots.push(location),
            }
        }

        let mut by_location: HashMap<&str, Vec<&Item>> = HashMap::new();
        for item in items {
            by_location
                .entry(item.sub_godown_id.as_str())
                .or_default()
                .push(item);
        }

        let mut hierarchy = Self {
            by_id,
            children,
            items: by_location,
            roots,
        };
        hierarchy.promote_unreachable(locations);
        hierarchy
    }

    /// Promotes one member of each unreachable cycle to a root.
    fn promote_unreachable(&mut self, locations: &'a [Location]) {
        let mut seen: HashSet<&str> = HashSet::new();
        let roots = self.roots.clone();
        for root in roots {
            self.mark_reachable(root, &mut seen);
        }
        for location in locations {
            if !seen.contains(location.id.as_str()) {
                tracing::warn!(id = %location.id, "location unreachable from any root (parent cycle)");
                self.roots.push(location);
                self.mark_reachable(location, &mut seen);
            }
        }
    }

    fn mark_reachable(&self, start: &'a Location, seen: &mut HashSet<&'a str>) {
        let mut stack = vec![start];
        while let Some(location) = stack.pop() {
            if !seen.insert(location.id.as_str()) {
                continue;
            }
            stack.extend(self.children(&location.id));
        }
    }

    pub fn roots(&self) -> &[&'a Location] {
        &self.roots
    }

    pub fn location(&self, id: &str) -> Option<&'a Location> {
        self.by_id.get(id).copied()
    }

    /// Direct child locations of `id`, in input order.
    pub fn children(&self, id: &str) -> Vec<&'a Location> {
        self.children.get(id).cloned().unwrap_or_default()
    }

    /// Items whose `sub_godown_id` is `id`, in input order.
    pub fn items_of(&self, id: &str) -> Vec<&'a Item> {
        self.items.get(id).cloned().unwrap_or_default()
    }

    pub fn has_contents(&self, id: &str) -> bool {
        self.children.get(id).is_some_and(|c| !c.is_empty())
            || self.items.get(id).is_some_and(|i| !i.is_empty())
    }

    pub fn parent_of(&self, id: &str) -> Option<&'a Location> {
        let location = self.location(id)?;
        self.location(location.parent_id.as_deref()?)
    }

    /// Path from the outermost ancestor down to `id` (inclusive). Stops at a cycle.
    pub fn path_to(&self, id: &str) -> Vec<&'a Location> {
        let mut path = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.location(id);
        while let Some(location) = current {
            if !seen.insert(location.id.as_str()) {
                break;
            }
            path.push(location);
            current = location
                .parent_id
                .as_deref()
                .and_then(|parent| self.location(parent));
        }
        path.reverse();
        path
    }

    /// Pre-order walk from the roots. `visit` gets each location with its depth and
    /// returns whether to descend into it. Each location is visited at most once.
    pub fn walk<F>(&self, mut visit: F)
    where
        F: FnMut(&'a Location, usize) -> bool,
    {
        let mut seen = HashSet::new();
        for &root in &self.roots {
            self.walk_from(root, 0, &mut seen, &mut visit);
        }
    }

    fn walk_from<F>(
        &self,
        location: &'a Location,
        depth: usize,
        seen: &mut HashSet<&'a str>,
        visit: &mut F,
    ) where
        F: FnMut(&'a Location, usize) -> bool,
    {
        if !seen.insert(location.id.as_str()) {
            return;
        }
        if !visit(location, depth) {
            return;
        }
        for child in self.children(&location.id) {
            self.walk_from(child, depth + 1, seen, visit);
        }
    }

    /// Every location and item below `id`, deepest first.
    pub fn descendants(&self, id: &str) -> Descendants<'a> {
        let mut pre_order = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        seen.insert(id);
        let mut stack: Vec<&Location> = self.children(id).into_iter().rev().collect();
        while let Some(location) = stack.pop() {
            if !seen.insert(location.id.as_str()) {
                continue;
            }
            pre_order.push(location);
            stack.extend(self.children(&location.id).into_iter().rev());
        }

        let mut items = self.items_of(id);
        for location in &pre_order {
            items.extend(self.items_of(&location.id));
        }

        pre_order.reverse();
        Descendants {
            items,
            locations: pre_order,
        }
    }
}
