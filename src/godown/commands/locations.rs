use crate::commands::{CmdMessage, CmdResult};
use crate::error::{GodownError, Result};
use crate::hierarchy::Hierarchy;
use crate::model::{Item, ItemDraft, Location, LocationDraft, NewLocation};
use crate::store::records::RecordStore;
use crate::store::InventoryBackend;
use crate::view::ADD_ITEM_GODOWN_ERROR;

/// Validates the draft and checks the parent against the Record Store.
pub fn prepare(store: &RecordStore, draft: &LocationDraft) -> Result<NewLocation> {
    let location = draft.validate()?;
    if let Some(parent_id) = &location.parent_id {
        let parent = store.location(parent_id).ok_or_else(|| {
            GodownError::validation(format!("Parent location '{}' does not exist", parent_id))
        })?;
        if !parent.is_godown {
            return Err(GodownError::validation(format!(
                "'{}' is not a godown; sub-locations must be created inside a godown",
                parent.name
            )));
        }
    }
    Ok(location)
}

pub fn create<B: InventoryBackend>(
    backend: &B,
    store: &mut RecordStore,
    draft: &LocationDraft,
) -> Result<CmdResult> {
    let location = prepare(store, draft)?;
    let created = backend.create_location(&location)?;
    tracing::info!(id = %created.id, name = %created.name, "location created");

    let message = created_message(store, &created);
    store.push_location(created.clone());
    Ok(CmdResult::default()
        .with_affected_locations(vec![created])
        .with_message(message))
}

/// Creates a sub-location and its first item in one go.
///
/// Both drafts are validated (and the out-of-stock confirmation checked) before any
/// request. If the item request fails the new location is kept and the failure is
/// reported as an error message.
pub fn create_with_item<B: InventoryBackend>(
    backend: &B,
    store: &mut RecordStore,
    draft: &LocationDraft,
    item_draft: &ItemDraft,
    confirmed: bool,
) -> Result<CmdResult> {
    if draft.is_godown {
        return Err(GodownError::validation(ADD_ITEM_GODOWN_ERROR));
    }
    let location = prepare(store, draft)?;
    let mut item = item_draft.validate("")?.confirm(confirmed)?;

    let created = backend.create_location(&location)?;
    tracing::info!(id = %created.id, name = %created.name, "location created");
    let mut result = CmdResult::default().with_message(created_message(store, &created));
    store.push_location(created.clone());
    result.affected_locations.push(created.clone());

    item.sub_godown_id = created.id.clone();
    match backend.create_item(&item) {
        Ok(created_item) => {
            tracing::info!(id = %created_item.id, location = %created.id, "item created");
            result.add_message(CmdMessage::success(format!(
                "Added '{}' to '{}'",
                created_item.name, created.name
            )));
            store.push_item(created_item.clone());
            result.affected_items.push(created_item);
        }
        Err(GodownError::Unauthorized) => return Err(GodownError::Unauthorized),
        Err(e) => {
            tracing::warn!(error = %e, location = %created.id, "bundled item create failed");
            result.add_message(CmdMessage::error(format!(
                "Location '{}' was created but its item was not: {}",
                created.name, e
            )));
        }
    }
    Ok(result)
}

/// What deleting a location would remove, in deletion order.
#[derive(Debug, Clone, PartialEq)]
pub struct DeletePlan {
    pub location: Location,
    pub items: Vec<Item>,
    /// Descendant locations, deepest first.
    pub locations: Vec<Location>,
}

impl DeletePlan {
    pub fn has_contents(&self) -> bool {
        !self.items.is_empty() || !self.locations.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} sub-location(s) and {} item(s)",
            self.locations.len(),
            self.items.len()
        )
    }
}

pub fn delete_preview(store: &RecordStore, id: &str) -> Result<DeletePlan> {
    let location = store
        .location(id)
        .ok_or_else(|| GodownError::NotFound(format!("Location {}", id)))?;
    let hierarchy = Hierarchy::build(store.locations(), store.items());
    let descendants = hierarchy.descendants(id);
    Ok(DeletePlan {
        location: location.clone(),
        items: descendants.items.into_iter().cloned().collect(),
        locations: descendants.locations.into_iter().cloned().collect(),
    })
}

/// Deletes a location. A non-empty location is refused unless `cascade` is set, in
/// which case its items go first, then its sub-locations deepest first, then itself.
///
/// The server does not cascade, so each record is its own request. The store is
/// patched after every successful request; on a failure the rest is skipped and
/// the result carries an error message next to what was already removed.
pub fn delete<B: InventoryBackend>(
    backend: &B,
    store: &mut RecordStore,
    id: &str,
    cascade: bool,
) -> Result<CmdResult> {
    let plan = delete_preview(store, id)?;
    if plan.has_contents() && !cascade {
        return Err(GodownError::validation(format!(
            "'{}' still holds {}. Delete those first or delete with cascade.",
            plan.location.name,
            plan.summary()
        )));
    }

    let mut result = CmdResult::default();

    for item in plan.items {
        if let Err(e) = backend.delete_item(&item.id) {
            return stop_cascade(result, &plan.location, e);
        }
        store.remove_item(&item.id);
        result.add_message(CmdMessage::success(format!("Deleted item '{}'", item.name)));
        result.affected_items.push(item);
    }

    for location in plan.locations.into_iter().chain(std::iter::once(plan.location.clone())) {
        if let Err(e) = backend.delete_location(&location.id) {
            return stop_cascade(result, &plan.location, e);
        }
        tracing::info!(id = %location.id, name = %location.name, "location deleted");
        store.remove_location(&location.id);
        result.add_message(CmdMessage::success(format!(
            "Deleted location '{}'",
            location.name
        )));
        result.affected_locations.push(location);
    }

    Ok(result)
}

fn stop_cascade(mut result: CmdResult, target: &Location, error: GodownError) -> Result<CmdResult> {
    let removed = result.affected_items.len() + result.affected_locations.len();
    if removed == 0 || matches!(error, GodownError::Unauthorized) {
        return Err(error);
    }
    tracing::warn!(error = %error, removed, "cascade delete stopped");
    result.add_message(CmdMessage::error(format!(
        "Stopped deleting '{}' after removing {} record(s): {}",
        target.name, removed, error
    )));
    Ok(result)
}

fn created_message(store: &RecordStore, created: &Location) -> CmdMessage {
    match created.parent_id.as_deref().and_then(|p| store.location(p)) {
        Some(parent) => CmdMessage::success(format!(
            "Created sub-location '{}' in '{}'",
            created.name, parent.name
        )),
        None => CmdMessage::success(format!("Created godown '{}'", created.name)),
    }
}
