use crate::model::{Item, Location};

/// Session copy of locations and items, in server order.
///
/// Lookups are linear: the store holds tens to hundreds of records and every view is
/// re-derived from it anyway.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
    locations: Vec<Location>,
    items: Vec<Item>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(locations: Vec<Location>, items: Vec<Item>) -> Self {
        Self { locations, items }
    }

    /// Replaces everything with a fresh fetch.
    pub fn replace(&mut self, locations: Vec<Location>, items: Vec<Item>) {
        self.locations = locations;
        self.items = items;
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn location(&self, id: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn push_location(&mut self, location: Location) {
        self.locations.push(location);
    }

    pub fn push_item(&mut self, item: Item) {
        self.items.push(item);
    }

    /// Returns true if a record was removed.
    pub fn remove_location(&mut self, id: &str) -> bool {
        let before = self.locations.len();
        self.locations.retain(|l| l.id != id);
        self.locations.len() != before
    }

    /// Returns true if a record was removed.
    pub fn remove_item(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        self.items.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty() && self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::{godown, item, sub_location};

    #[test]
    fn push_and_lookup() {
        let mut store = RecordStore::new();
        store.push_location(godown("g1", "Main"));
        store.push_item(item("i1", "Drill", "l1"));
        assert_eq!(store.location("g1").unwrap().name, "Main");
        assert_eq!(store.item("i1").unwrap().name, "Drill");
        assert!(store.location("missing").is_none());
    }

    #[test]
    fn remove_by_identity() {
        let mut store = RecordStore::with_records(
            vec![godown("g1", "Main"), sub_location("l1", "Shelf", "g1")],
            vec![item("i1", "Drill", "l1"), item("i2", "Saw", "l1")],
        );
        assert!(store.remove_item("i1"));
        assert!(!store.remove_item("i1"));
        assert_eq!(store.items().len(), 1);
        assert!(store.remove_location("l1"));
        assert!(store.location("l1").is_none());
        assert_eq!(store.locations().len(), 1);
    }

    #[test]
    fn replace_discards_previous_records() {
        let mut store = RecordStore::with_records(vec![godown("g1", "Main")], vec![]);
        store.replace(vec![godown("g2", "North")], vec![]);
        assert!(store.location("g1").is_none());
        assert!(store.location("g2").is_some());
    }
}
