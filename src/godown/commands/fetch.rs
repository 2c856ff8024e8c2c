use crate::commands::{CmdMessage, CmdResult};
use crate::error::Result;
use crate::filter::ItemFilter;
use crate::model::{Item, Location};
use crate::store::records::RecordStore;
use crate::store::InventoryBackend;

/// What one fetch returned, before it is applied to the Record Store.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub locations: Vec<Location>,
    pub items: Vec<Item>,
}

impl Snapshot {
    pub fn apply(self, store: &mut RecordStore) {
        store.replace(self.locations, self.items);
    }
}

/// Locations, then items with `filter`. Runs on load and on every filter change.
pub fn load<B: InventoryBackend>(backend: &B, filter: &ItemFilter) -> Result<Snapshot> {
    let locations = backend.list_locations()?;
    let items = backend.list_items(filter)?;
    tracing::debug!(
        locations = locations.len(),
        items = items.len(),
        "fetched records"
    );
    Ok(Snapshot { locations, items })
}

/// Replaces the whole store with a fresh fetch. On failure the store is untouched.
pub fn refresh<B: InventoryBackend>(
    backend: &B,
    store: &mut RecordStore,
    filter: &ItemFilter,
) -> Result<CmdResult> {
    let snapshot = load(backend, filter)?;
    let message = loaded_message(&snapshot, filter);
    snapshot.apply(store);
    Ok(CmdResult::default().with_message(message))
}

pub fn loaded_message(snapshot: &Snapshot, filter: &ItemFilter) -> CmdMessage {
    if filter.is_empty() {
        CmdMessage::info(format!(
            "Loaded {} location(s) and {} item(s).",
            snapshot.locations.len(),
            snapshot.items.len()
        ))
    } else {
        CmdMessage::info(format!(
            "Loaded {} location(s); {} item(s) match the current filters.",
            snapshot.locations.len(),
            snapshot.items.len()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GodownError;
    use crate::store::memory::fixtures::{godown, BackendFixture};

    #[test]
    fn refresh_replaces_store() {
        let backend = BackendFixture::warehouse().build();
        let mut store = RecordStore::with_records(vec![godown("old", "Gone")], vec![]);
        refresh(&backend, &mut store, &ItemFilter::default()).unwrap();
        assert!(store.location("old").is_none());
        assert_eq!(store.locations().len(), 3);
        assert_eq!(store.items().len(), 2);
    }

    #[test]
    fn refresh_failure_leaves_store_alone() {
        let backend = BackendFixture::warehouse().build();
        let mut store = RecordStore::with_records(vec![godown("old", "Kept")], vec![]);
        backend.set_fail_next(500, "down");
        let err = refresh(&backend, &mut store, &ItemFilter::default()).unwrap_err();
        assert!(matches!(err, GodownError::Api { status: 500, .. }));
        assert!(store.location("old").is_some());
    }

    #[test]
    fn filtered_refresh_rebuilds_locations_too() {
        let backend = BackendFixture::warehouse().build();
        let mut store = RecordStore::new();
        refresh(&backend, &mut store, &ItemFilter::default()).unwrap();

        backend.seed_location(godown("g9", "Annex"));
        let filter = ItemFilter::new("nonexistent", "", "");
        let result = refresh(&backend, &mut store, &filter).unwrap();
        assert!(store.items().is_empty());
        assert!(store.location("g9").is_some());
        assert_eq!(backend.last_filter().unwrap(), filter);
        assert!(result.messages[0].content.contains("match the current filters"));
    }
}
