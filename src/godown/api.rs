//! # API Facade
//!
//! [`GodownApi`] is the single entry point for every godown operation, whichever UI
//! drives it. It owns one session's worth of state:
//!
//! - the backend (and through it the token store),
//! - the [`RecordStore`] with the records fetched so far,
//! - the [`ViewState`] (expanded nodes, selection, add-item form, filters),
//! - the filter [`Debouncer`], the fetch generation and the loading flag.
//!
//! ## What the Facade Does
//!
//! - **Dispatches** to `commands/*.rs`, handing them the store.
//! - **Guards the session**: operations that need a login fail with
//!   [`GodownError::NotLoggedIn`] before any request, and any
//!   [`GodownError::Unauthorized`] from the server drops the stored token.
//! - **Orders fetches**: every fetch gets a ticket; a result whose ticket is no longer
//!   the newest is discarded, so a slow stale response cannot overwrite a newer one.
//!
//! ## What It Does Not Do
//!
//! No printing, no prompting, no process exit. Results are `Result<CmdResult>` or
//! plain values, and [`GodownApi::dashboard`] hands the UI a fully composed view.
//!
//! ## Generic Over the Backend
//!
//! - Production: `GodownApi<RestBackend>`
//! - Testing: `GodownApi<MemBackend>`

use crate::commands::{self, fetch::Snapshot, CmdMessage, CmdResult};
use crate::config::GodownConfig;
use crate::error::{GodownError, Result};
use crate::filter::{Debouncer, FetchGeneration, FetchTicket, FilterField, ItemFilter};
use crate::model::{ItemDraft, LocationDraft, PendingItem};
use crate::store::records::RecordStore;
use crate::store::InventoryBackend;
use crate::view::{self, DashboardView, ViewState};
use std::time::{Duration, Instant};

pub struct GodownApi<B: InventoryBackend> {
    backend: B,
    config: GodownConfig,
    store: RecordStore,
    view: ViewState,
    debouncer: Debouncer<ItemFilter>,
    generation: FetchGeneration,
    loading: bool,
}

impl<B: InventoryBackend> GodownApi<B> {
    pub fn new(backend: B, config: GodownConfig) -> Self {
        let debouncer = Debouncer::new(config.debounce());
        Self {
            backend,
            config,
            store: RecordStore::new(),
            view: ViewState::new(),
            debouncer,
            generation: FetchGeneration::default(),
            loading: false,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn config(&self) -> CmdResult {
        CmdResult::default().with_config(self.config.clone())
    }

    // --- Session ---

    pub fn login(&mut self, email: &str, password: &str) -> Result<CmdResult> {
        commands::session::login(&self.backend, email, password)
    }

    pub fn register(&mut self, username: &str, email: &str, password: &str) -> Result<CmdResult> {
        commands::session::register(&self.backend, username, email, password)
    }

    /// Drops the token and everything fetched under it.
    pub fn logout(&mut self) -> Result<CmdResult> {
        let result = commands::session::logout(&self.backend)?;
        self.store = RecordStore::new();
        self.view = ViewState::new();
        self.debouncer.cancel();
        Ok(result)
    }

    pub fn whoami(&self) -> Result<CmdResult> {
        self.guard(commands::session::whoami(&self.backend))
    }

    pub fn is_authenticated(&self) -> Result<bool> {
        commands::session::is_authenticated(&self.backend)
    }

    fn ensure_session(&self) -> Result<()> {
        commands::session::require_login(&self.backend)
    }

    /// A server 401 ends the session: the token is removed so the next call reports
    /// `NotLoggedIn` instead of hitting the server again.
    fn guard<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(GodownError::Unauthorized) = &result {
            tracing::warn!("server rejected the session, clearing token");
            self.backend.tokens().clear()?;
        }
        result
    }

    // --- Fetching ---

    /// Marks a fetch as in flight and returns its ticket.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.loading = true;
        self.generation.next()
    }

    /// Applies a fetch outcome if `ticket` is still the newest; otherwise drops it.
    pub fn finish_fetch(
        &mut self,
        ticket: FetchTicket,
        outcome: Result<Snapshot>,
    ) -> Result<CmdResult> {
        if !self.generation.is_current(ticket) {
            tracing::debug!(?ticket, "discarding stale fetch result");
            // A rejected token is rejected no matter which fetch found out.
            if let Err(GodownError::Unauthorized) = outcome {
                return self.guard(Err(GodownError::Unauthorized));
            }
            return Ok(CmdResult::default());
        }
        self.loading = false;
        let snapshot = self.guard(outcome)?;
        let message = commands::fetch::loaded_message(&snapshot, &self.view.filter);
        snapshot.apply(&mut self.store);
        self.view.prune(&self.store);
        Ok(CmdResult::default().with_message(message))
    }

    /// Fetches locations and items (with the current filters) and replaces the store.
    pub fn refresh(&mut self) -> Result<CmdResult> {
        self.ensure_session()?;
        let ticket = self.begin_fetch();
        let outcome = commands::fetch::load(&self.backend, &self.view.filter);
        self.finish_fetch(ticket, outcome)
    }

    // --- Filters ---

    /// Sets all filters at once without debouncing. Takes effect on the next fetch.
    pub fn set_filters(&mut self, filter: ItemFilter) {
        self.debouncer.cancel();
        self.view.filter = filter;
    }

    /// Records a filter edit. The fetch happens once the input has been quiet for
    /// the debounce delay; see [`GodownApi::poll_filters`].
    pub fn edit_filter(&mut self, field: FilterField, value: &str, now: Instant) {
        self.view.filter.set(field, value);
        self.debouncer.push(self.view.filter.clone(), now);
    }

    pub fn clear_filters(&mut self, now: Instant) {
        self.view.filter.clear();
        self.debouncer.push(ItemFilter::default(), now);
    }

    /// Time left before a pending filter change is fetched, if any.
    pub fn filter_pending(&self, now: Instant) -> Option<Duration> {
        self.debouncer.remaining(now)
    }

    /// Rebuilds the store with the new filters once the debounce window has elapsed.
    pub fn poll_filters(&mut self, now: Instant) -> Result<Option<CmdResult>> {
        match self.debouncer.ready(now) {
            Some(filter) => {
                self.view.filter = filter;
                self.refresh().map(Some)
            }
            None => Ok(None),
        }
    }

    // --- View state ---

    pub fn dashboard(&self) -> DashboardView {
        let mut dashboard = view::compose(&self.store, &self.view);
        dashboard.loading = self.loading;
        dashboard
    }

    pub fn toggle(&mut self, location_id: &str) -> Result<bool> {
        self.known_location(location_id)?;
        Ok(self.view.toggle(location_id))
    }

    pub fn expand(&mut self, location_id: &str) -> Result<()> {
        self.known_location(location_id)?;
        self.view.expand(location_id);
        Ok(())
    }

    pub fn expand_all(&mut self) {
        self.view.expand_all(&self.store);
    }

    pub fn collapse_all(&mut self) {
        self.view.collapse_all();
    }

    /// Toggles and selects, like clicking a location in the tree.
    pub fn activate_location(&mut self, location_id: &str) -> Result<bool> {
        self.known_location(location_id)?;
        Ok(self.view.activate_location(location_id))
    }

    pub fn select_location(&mut self, location_id: &str) -> Result<()> {
        self.known_location(location_id)?;
        self.view.select_location(location_id);
        Ok(())
    }

    /// Selects an item; its owning location is taken from the item itself.
    pub fn select_item(&mut self, item_id: &str) -> Result<()> {
        let item = self
            .store
            .item(item_id)
            .ok_or_else(|| GodownError::NotFound(format!("Item {}", item_id)))?;
        let location_id = item.sub_godown_id.clone();
        self.view.select_item(item_id, &location_id);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.view.clear_selection();
    }

    pub fn request_add_item(&mut self, location_id: &str) -> Result<()> {
        self.view.request_add_item(&self.store, location_id)
    }

    pub fn cancel_add_item(&mut self) {
        self.view.cancel_add_item();
    }

    fn known_location(&self, id: &str) -> Result<()> {
        self.store
            .location(id)
            .map(|_| ())
            .ok_or_else(|| GodownError::NotFound(format!("Location {}", id)))
    }

    // --- Mutations ---

    pub fn create_location(&mut self, draft: &LocationDraft) -> Result<CmdResult> {
        self.ensure_session()?;
        let result = commands::locations::create(&self.backend, &mut self.store, draft);
        self.guard(result)
    }

    pub fn create_location_with_item(
        &mut self,
        draft: &LocationDraft,
        item: &ItemDraft,
        confirmed: bool,
    ) -> Result<CmdResult> {
        self.ensure_session()?;
        let result = commands::locations::create_with_item(
            &self.backend,
            &mut self.store,
            draft,
            item,
            confirmed,
        );
        self.guard(result)
    }

    /// Validates an item without sending it, so the UI can ask for confirmation.
    pub fn prepare_item(&self, location_id: &str, draft: &ItemDraft) -> Result<PendingItem> {
        commands::items::prepare(&self.store, location_id, draft)
    }

    /// Adds an item. On success the add-item form is closed if it was open for
    /// this location.
    pub fn create_item(
        &mut self,
        location_id: &str,
        draft: &ItemDraft,
        confirmed: bool,
    ) -> Result<CmdResult> {
        self.ensure_session()?;
        let result =
            commands::items::create(&self.backend, &mut self.store, location_id, draft, confirmed);
        let result = self.guard(result)?;
        if self.view.add_item_target.as_deref() == Some(location_id) {
            self.view.cancel_add_item();
        }
        Ok(result)
    }

    pub fn delete_location_preview(&self, id: &str) -> Result<commands::locations::DeletePlan> {
        commands::locations::delete_preview(&self.store, id)
    }

    pub fn delete_location(&mut self, id: &str, cascade: bool) -> Result<CmdResult> {
        self.ensure_session()?;
        let result = commands::locations::delete(&self.backend, &mut self.store, id, cascade);
        let result = self.guard(result)?;
        self.view.prune(&self.store);
        Ok(result)
    }

    pub fn delete_item(&mut self, id: &str) -> Result<CmdResult> {
        self.ensure_session()?;
        let result = commands::items::delete(&self.backend, &mut self.store, id);
        self.guard(result)
    }

    /// Item detail, fetched from the server.
    pub fn get_item(&self, id: &str) -> Result<CmdResult> {
        self.ensure_session()?;
        let mut result = self.guard(commands::items::get(&self.backend, id))?;
        if let Some(item) = result.listed_items.first() {
            if self.store.location(&item.sub_godown_id).is_none() && !self.store.is_empty() {
                result.add_message(CmdMessage::warning(format!(
                    "Location {} of this item is not in the current tree",
                    item.sub_godown_id
                )));
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::{godown, BackendFixture};
    use crate::store::memory::MemBackend;
    use crate::view::{DetailPane, ADD_ITEM_GODOWN_ERROR};

    fn logged_in(backend: MemBackend) -> GodownApi<MemBackend> {
        backend.require_auth(true);
        backend.seed_user("ana", "ana@example.com", "pw");
        let mut api = GodownApi::new(backend, GodownConfig::default());
        api.login("ana@example.com", "pw").unwrap();
        api
    }

    fn loaded() -> GodownApi<MemBackend> {
        let mut api = logged_in(BackendFixture::warehouse().build());
        api.refresh().unwrap();
        api
    }

    #[test]
    fn refresh_requires_login() {
        let mut api = GodownApi::new(MemBackend::new(), GodownConfig::default());
        assert!(matches!(api.refresh(), Err(GodownError::NotLoggedIn)));
        assert_eq!(api.backend().request_count(), 0);
    }

    #[test]
    fn refresh_fills_store_and_clears_loading() {
        let api = loaded();
        assert_eq!(api.store().locations().len(), 3);
        assert!(!api.is_loading());
        assert!(!api.dashboard().loading);
    }

    #[test]
    fn unauthorized_clears_token() {
        let mut api = loaded();
        api.backend().set_fail_next(401, "expired");
        assert!(matches!(api.refresh(), Err(GodownError::Unauthorized)));
        assert!(!api.is_authenticated().unwrap());
        assert!(matches!(api.refresh(), Err(GodownError::NotLoggedIn)));
    }

    #[test]
    fn stale_fetch_is_discarded() {
        let mut api = loaded();
        let older = api.begin_fetch();
        let newer = api.begin_fetch();

        let stale = Snapshot {
            locations: vec![godown("stale", "Stale")],
            items: vec![],
        };
        api.finish_fetch(older, Ok(stale)).unwrap();
        assert!(api.store().location("stale").is_none());
        assert!(api.is_loading());

        let fresh = Snapshot {
            locations: vec![godown("fresh", "Fresh")],
            items: vec![],
        };
        api.finish_fetch(newer, Ok(fresh)).unwrap();
        assert!(api.store().location("fresh").is_some());
        assert!(!api.is_loading());
    }

    #[test]
    fn filter_edits_are_debounced() {
        let mut api = loaded();
        let start = Instant::now();
        let requests = api.backend().request_count();

        api.edit_filter(FilterField::Category, "Too", start);
        api.edit_filter(FilterField::Category, "Tools", start + Duration::from_millis(100));
        assert!(api
            .poll_filters(start + Duration::from_millis(350))
            .unwrap()
            .is_none());
        assert_eq!(api.backend().request_count(), requests);

        let done = api.poll_filters(start + Duration::from_millis(400)).unwrap();
        assert!(done.is_some());
        assert_eq!(api.backend().request_count(), requests + 2);
        assert_eq!(api.backend().last_filter().unwrap().category, "Tools");
        assert!(api.store().items().is_empty());
        assert_eq!(api.store().locations().len(), 3);
    }

    #[test]
    fn filter_change_rebuilds_locations() {
        let mut api = loaded();
        api.backend().seed_location(godown("g9", "Annex"));
        let start = Instant::now();

        api.edit_filter(FilterField::Brand, "Acme", start);
        api.poll_filters(start + Duration::from_millis(400))
            .unwrap()
            .unwrap();
        assert!(api.store().location("g9").is_some());
        assert_eq!(api.store().items().len(), 2);
    }

    #[test]
    fn stale_unauthorized_still_clears_token() {
        let mut api = loaded();
        let older = api.begin_fetch();
        let _newer = api.begin_fetch();

        let result = api.finish_fetch(older, Err(GodownError::Unauthorized));
        assert!(matches!(result, Err(GodownError::Unauthorized)));
        assert!(!api.is_authenticated().unwrap());
    }

    #[test]
    fn dashboard_reflects_view_operations() {
        let mut api = loaded();
        assert!(api.activate_location("g1").unwrap());
        api.toggle("l1").unwrap();
        api.select_item("i2").unwrap();

        let dashboard = api.dashboard();
        let shelf = &dashboard.tree[0].children[0];
        assert_eq!(shelf.items.len(), 2);
        assert!(shelf.items[1].selected);
        assert!(matches!(dashboard.detail, DetailPane::Item { .. }));
    }

    #[test]
    fn add_item_gating() {
        let mut api = loaded();
        let err = api.request_add_item("g1").unwrap_err();
        assert_eq!(err.to_string(), ADD_ITEM_GODOWN_ERROR);
        assert!(api.dashboard().add_item_target.is_none());

        api.request_add_item("l1").unwrap();
        let draft = ItemDraft {
            name: "Tape".into(),
            quantity: "3".into(),
            category: "Supplies".into(),
            price: "2".into(),
            brand: "3M".into(),
            ..ItemDraft::default()
        };
        api.create_item("l1", &draft, false).unwrap();
        assert!(api.dashboard().add_item_target.is_none());
        assert_eq!(api.store().items().len(), 3);
    }

    #[test]
    fn deleting_selected_location_clears_detail() {
        let mut api = loaded();
        api.select_location("g2").unwrap();
        api.toggle("g2").unwrap();
        api.delete_location("g2", false).unwrap();
        assert_eq!(api.dashboard().detail, DetailPane::Empty);
        assert!(!api.view_state().is_expanded("g2"));
    }

    #[test]
    fn logout_forgets_session_data() {
        let mut api = loaded();
        api.logout().unwrap();
        assert!(api.store().is_empty());
        assert!(!api.is_authenticated().unwrap());
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let mut api = loaded();
        assert!(matches!(api.toggle("nope"), Err(GodownError::NotFound(_))));
        assert!(matches!(api.select_item("nope"), Err(GodownError::NotFound(_))));
    }
}
