use super::{AuthResponse, InventoryBackend};
use crate::auth::{bearer_token, encode_unsigned, Claims, MemoryTokenStore, TokenStore};
use crate::error::{GodownError, Result};
use crate::filter::ItemFilter;
use crate::model::{Item, Location, NewItem, NewLocation, User};
use chrono::Utc;
use std::cell::{Cell, RefCell};
use uuid::Uuid;

const TOKEN_TTL_SECS: i64 = 3600;

/// In-memory inventory server for testing.
///
/// Uses `RefCell`/`Cell` for interior mutability since godown is single-threaded.
/// Behaves like the real service where the client can observe it: ids are assigned
/// on create, items are filtered by exact match, deletes do not cascade, and
/// (when [`MemBackend::require_auth`] is on) requests without a live token get a 401.
pub struct MemBackend {
    locations: RefCell<Vec<Location>>,
    items: RefCell<Vec<Item>>,
    users: RefCell<Vec<(User, String)>>,
    tokens: MemoryTokenStore,
    require_auth: Cell<bool>,
    fail_next: RefCell<Option<(usize, u16, String)>>,
    requests: Cell<usize>,
    last_filter: RefCell<Option<ItemFilter>>,
}

impl Default for MemBackend {
    fn default() -> Self {
        Self {
            locations: RefCell::new(Vec::new()),
            items: RefCell::new(Vec::new()),
            users: RefCell::new(Vec::new()),
            tokens: MemoryTokenStore::new(),
            require_auth: Cell::new(false),
            fail_next: RefCell::new(None),
            requests: Cell::new(0),
            last_filter: RefCell::new(None),
        }
    }
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject requests that do not carry a live token.
    pub fn require_auth(&self, required: bool) {
        self.require_auth.set(required);
    }

    /// Make the next request fail with the given status and message.
    pub fn set_fail_next(&self, status: u16, message: impl Into<String>) {
        self.set_fail_after(0, status, message);
    }

    /// Let `skip` requests through, then fail the one after.
    pub fn set_fail_after(&self, skip: usize, status: u16, message: impl Into<String>) {
        *self.fail_next.borrow_mut() = Some((skip, status, message.into()));
    }

    /// Number of requests received so far (failed ones included).
    pub fn request_count(&self) -> usize {
        self.requests.get()
    }

    /// The filter of the most recent `list_items` call.
    pub fn last_filter(&self) -> Option<ItemFilter> {
        self.last_filter.borrow().clone()
    }

    /// Inserts a location as if it already existed server-side.
    pub fn seed_location(&self, location: Location) {
        self.locations.borrow_mut().push(location);
    }

    pub fn seed_item(&self, item: Item) {
        self.items.borrow_mut().push(item);
    }

    pub fn seed_user(&self, username: &str, email: &str, password: &str) -> User {
        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: email.to_string(),
        };
        self.users
            .borrow_mut()
            .push((user.clone(), password.to_string()));
        user
    }

    /// Server-side view of the data, bypassing request accounting.
    pub fn stored_locations(&self) -> Vec<Location> {
        self.locations.borrow().clone()
    }

    pub fn stored_items(&self) -> Vec<Item> {
        self.items.borrow().clone()
    }

    fn begin(&self) -> Result<()> {
        self.requests.set(self.requests.get() + 1);
        let mut fail_next = self.fail_next.borrow_mut();
        match fail_next.take() {
            Some((0, 401, _)) => return Err(GodownError::Unauthorized),
            Some((0, status, message)) => return Err(GodownError::Api { status, message }),
            Some((skip, status, message)) => *fail_next = Some((skip - 1, status, message)),
            None => {}
        }
        drop(fail_next);
        if self.require_auth.get() && bearer_token(&self.tokens, Utc::now())?.is_none() {
            return Err(GodownError::Unauthorized);
        }
        Ok(())
    }

    fn not_found(kind: &str, id: &str) -> GodownError {
        GodownError::Api {
            status: 404,
            message: format!("{} {} not found", kind, id),
        }
    }

    fn issue_token(&self, user: &User) -> Result<String> {
        encode_unsigned(&Claims {
            sub: Some(user.id.clone()),
            exp: Some(Utc::now().timestamp() + TOKEN_TTL_SECS),
        })
    }

    fn current_user(&self) -> Result<User> {
        let token = bearer_token(&self.tokens, Utc::now())?.ok_or(GodownError::Unauthorized)?;
        let claims = Claims::decode(&token)?;
        self.users
            .borrow()
            .iter()
            .find(|(u, _)| Some(&u.id) == claims.sub.as_ref())
            .map(|(u, _)| u.clone())
            .ok_or(GodownError::Unauthorized)
    }
}

impl InventoryBackend for MemBackend {
    fn list_locations(&self) -> Result<Vec<Location>> {
        self.begin()?;
        Ok(self.locations.borrow().clone())
    }

    fn create_location(&self, location: &NewLocation) -> Result<Location> {
        self.begin()?;
        let created = Location {
            id: Uuid::new_v4().to_string(),
            name: location.name.clone(),
            is_godown: location.is_godown,
            parent_id: location.parent_id.clone(),
        };
        self.locations.borrow_mut().push(created.clone());
        Ok(created)
    }

    fn delete_location(&self, id: &str) -> Result<()> {
        self.begin()?;
        let mut locations = self.locations.borrow_mut();
        let before = locations.len();
        locations.retain(|l| l.id != id);
        if locations.len() == before {
            return Err(Self::not_found("Location", id));
        }
        Ok(())
    }

    fn list_items(&self, filter: &ItemFilter) -> Result<Vec<Item>> {
        self.begin()?;
        *self.last_filter.borrow_mut() = Some(filter.clone());
        Ok(self
            .items
            .borrow()
            .iter()
            .filter(|i| filter.matches(i))
            .cloned()
            .collect())
    }

    fn get_item(&self, id: &str) -> Result<Item> {
        self.begin()?;
        self.items
            .borrow()
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| Self::not_found("Item", id))
    }

    fn create_item(&self, item: &NewItem) -> Result<Item> {
        self.begin()?;
        let created = Item {
            id: Uuid::new_v4().to_string(),
            name: item.name.clone(),
            quantity: item.quantity,
            category: item.category.clone(),
            status: item.status,
            sub_godown_id: item.sub_godown_id.clone(),
            price: item.price,
            brand: item.brand.clone(),
            attributes: item.attributes.clone(),
            image_url: item.image_url.clone(),
        };
        self.items.borrow_mut().push(created.clone());
        Ok(created)
    }

    fn delete_item(&self, id: &str) -> Result<()> {
        self.begin()?;
        let mut items = self.items.borrow_mut();
        let before = items.len();
        items.retain(|i| i.id != id);
        if items.len() == before {
            return Err(Self::not_found("Item", id));
        }
        Ok(())
    }

    fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        self.requests.set(self.requests.get() + 1);
        let user = self
            .users
            .borrow()
            .iter()
            .find(|(u, p)| u.email == email && p == password)
            .map(|(u, _)| u.clone())
            .ok_or_else(|| GodownError::Api {
                status: 400,
                message: "Invalid credentials".to_string(),
            })?;
        Ok(AuthResponse {
            token: self.issue_token(&user)?,
            user: None,
        })
    }

    fn register(&self, username: &str, email: &str, password: &str) -> Result<AuthResponse> {
        self.requests.set(self.requests.get() + 1);
        if self.users.borrow().iter().any(|(u, _)| u.email == email) {
            return Err(GodownError::Api {
                status: 400,
                message: "User already exists".to_string(),
            });
        }
        let user = self.seed_user(username, email, password);
        Ok(AuthResponse {
            token: self.issue_token(&user)?,
            user: Some(user),
        })
    }

    fn profile(&self) -> Result<User> {
        self.begin()?;
        self.current_user()
    }

    fn tokens(&self) -> &dyn TokenStore {
        &self.tokens
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::model::ItemStatus;

    pub fn godown(id: &str, name: &str) -> Location {
        Location {
            id: id.to_string(),
            name: name.to_string(),
            is_godown: true,
            parent_id: None,
        }
    }

    pub fn sub_location(id: &str, name: &str, parent: &str) -> Location {
        Location {
            id: id.to_string(),
            name: name.to_string(),
            is_godown: false,
            parent_id: Some(parent.to_string()),
        }
    }

    pub fn item(id: &str, name: &str, location: &str) -> Item {
        Item {
            id: id.to_string(),
            name: name.to_string(),
            quantity: 10,
            category: "General".to_string(),
            status: ItemStatus::InStock,
            sub_godown_id: location.to_string(),
            price: 9.5,
            brand: "Acme".to_string(),
            attributes: None,
            image_url: None,
        }
    }

    /// Builder for a backend pre-populated with a small hierarchy.
    pub struct BackendFixture {
        pub backend: MemBackend,
    }

    impl Default for BackendFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl BackendFixture {
        pub fn new() -> Self {
            Self {
                backend: MemBackend::new(),
            }
        }

        pub fn with_godown(self, id: &str, name: &str) -> Self {
            self.backend.seed_location(godown(id, name));
            self
        }

        pub fn with_sub_location(self, id: &str, name: &str, parent: &str) -> Self {
            self.backend.seed_location(sub_location(id, name, parent));
            self
        }

        pub fn with_item(self, id: &str, name: &str, location: &str) -> Self {
            self.backend.seed_item(item(id, name, location));
            self
        }

        pub fn with_custom_item(self, item: Item) -> Self {
            self.backend.seed_item(item);
            self
        }

        /// `g1` (godown) > `l1` (sub-location) > `i1`, `i2`; plus an empty godown `g2`.
        pub fn warehouse() -> Self {
            Self::new()
                .with_godown("g1", "Main Warehouse")
                .with_sub_location("l1", "Shelf A", "g1")
                .with_item("i1", "Drill", "l1")
                .with_item("i2", "Saw", "l1")
                .with_godown("g2", "Overflow")
        }

        pub fn build(self) -> MemBackend {
            self.backend
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::BackendFixture;
    use super::*;

    #[test]
    fn assigns_ids_on_create() {
        let backend = MemBackend::new();
        let created = backend
            .create_location(&NewLocation {
                name: "Main".into(),
                is_godown: true,
                parent_id: None,
            })
            .unwrap();
        assert!(!created.id.is_empty());
        assert_eq!(backend.stored_locations(), vec![created]);
    }

    #[test]
    fn filters_items_by_exact_match() {
        let backend = BackendFixture::warehouse().build();
        let all = backend.list_items(&ItemFilter::default()).unwrap();
        assert_eq!(all.len(), 2);

        let none = backend
            .list_items(&ItemFilter::new("nonexistent", "", ""))
            .unwrap();
        assert!(none.is_empty());
        assert_eq!(backend.last_filter().unwrap().category, "nonexistent");
    }

    #[test]
    fn fail_next_applies_once() {
        let backend = MemBackend::new();
        backend.set_fail_next(500, "boom");
        assert!(matches!(
            backend.list_locations(),
            Err(GodownError::Api { status: 500, .. })
        ));
        assert!(backend.list_locations().is_ok());
        assert_eq!(backend.request_count(), 2);
    }

    #[test]
    fn require_auth_rejects_anonymous_requests() {
        let backend = MemBackend::new();
        backend.require_auth(true);
        assert!(matches!(
            backend.list_locations(),
            Err(GodownError::Unauthorized)
        ));

        backend.seed_user("ana", "ana@example.com", "pw");
        let auth = backend.login("ana@example.com", "pw").unwrap();
        backend.tokens().save(&auth.token).unwrap();
        assert!(backend.list_locations().is_ok());
        assert_eq!(backend.profile().unwrap().username, "ana");
    }

    #[test]
    fn delete_unknown_is_not_found() {
        let backend = MemBackend::new();
        assert!(matches!(
            backend.delete_item("nope"),
            Err(GodownError::Api { status: 404, .. })
        ));
    }
}
