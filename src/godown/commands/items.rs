use crate::commands::{CmdMessage, CmdResult};
use crate::error::{GodownError, Result};
use crate::model::{ItemDraft, PendingItem};
use crate::store::records::RecordStore;
use crate::store::InventoryBackend;
use crate::view::ADD_ITEM_GODOWN_ERROR;

/// Checks the target location and validates the draft. Nothing is sent.
///
/// The returned [`PendingItem`] tells the caller whether the out-of-stock
/// confirmation has to be asked for.
pub fn prepare(store: &RecordStore, location_id: &str, draft: &ItemDraft) -> Result<PendingItem> {
    let location = store
        .location(location_id)
        .ok_or_else(|| GodownError::NotFound(format!("Location {}", location_id)))?;
    if !location.is_sub_location() {
        return Err(GodownError::validation(ADD_ITEM_GODOWN_ERROR));
    }
    draft.validate(location_id)
}

/// Adds an item to a sub-location.
///
/// An out-of-stock item with a non-zero quantity needs `confirmed`; it is then
/// stored with quantity 0.
pub fn create<B: InventoryBackend>(
    backend: &B,
    store: &mut RecordStore,
    location_id: &str,
    draft: &ItemDraft,
    confirmed: bool,
) -> Result<CmdResult> {
    let pending = prepare(store, location_id, draft)?;
    let coerced = pending.needs_confirmation();
    let item = pending.confirm(confirmed)?;

    let created = backend.create_item(&item)?;
    tracing::info!(id = %created.id, location = %location_id, "item created");

    let location_name = store
        .location(location_id)
        .map(|l| l.name.clone())
        .unwrap_or_else(|| location_id.to_string());
    let mut result = CmdResult::default().with_message(CmdMessage::success(format!(
        "Added '{}' to '{}'",
        created.name, location_name
    )));
    if coerced {
        result.add_message(CmdMessage::info("Quantity set to 0 (out of stock)."));
    }

    store.push_item(created.clone());
    Ok(result.with_affected_items(vec![created]))
}

pub fn delete<B: InventoryBackend>(
    backend: &B,
    store: &mut RecordStore,
    id: &str,
) -> Result<CmdResult> {
    let name = store
        .item(id)
        .map(|i| i.name.clone())
        .unwrap_or_else(|| id.to_string());

    backend.delete_item(id)?;
    tracing::info!(id, "item deleted");

    let mut result = CmdResult::default();
    if let Some(item) = store.item(id).cloned() {
        result.affected_items.push(item);
    }
    store.remove_item(id);
    result.add_message(CmdMessage::success(format!("Deleted item '{}'", name)));
    Ok(result)
}

/// Fetches one item fresh from the server.
pub fn get<B: InventoryBackend>(backend: &B, id: &str) -> Result<CmdResult> {
    let item = match backend.get_item(id) {
        Err(GodownError::Api { status: 404, .. }) => {
            return Err(GodownError::NotFound(format!("Item {}", id)))
        }
        other => other?,
    };
    Ok(CmdResult::default().with_listed_items(vec![item]))
}
