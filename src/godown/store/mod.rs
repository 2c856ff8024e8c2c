//! # Backend Layer
//!
//! Everything godown knows lives on the inventory server. This module defines the
//! boundary to it: the [`InventoryBackend`] trait, one method per REST call.
//!
//! ## Implementations
//!
//! - [`rest::RestBackend`]: production client over HTTP (`reqwest`, blocking).
//!   Attaches the bearer token from its [`TokenStore`] to every request.
//! - [`memory::MemBackend`]: an in-memory stand-in for the server, for tests.
//!   Assigns ids, filters items, issues tokens, and can simulate failures.
//!
//! ## The Record Store
//!
//! [`records::RecordStore`] is the client-side copy of the server's data for one
//! session. It is replaced wholesale on every fetch and patched only after the
//! server confirms a create or delete; it is never written to speculatively.
//!
//! ## Endpoints
//!
//! ```text
//! GET    /locations                         -> [Location]
//! POST   /locations                         -> Location
//! DELETE /locations/:id
//! GET    /items?category=&brand=&status=    -> [Item]
//! GET    /items/:id                         -> Item
//! POST   /items                             -> Item
//! DELETE /items/:id
//! POST   /auth/login                        -> { token }
//! POST   /auth/register                     -> { token, user }
//! GET    /auth/profile                      -> User
//! ```

use crate::auth::TokenStore;
use crate::error::Result;
use crate::filter::ItemFilter;
use crate::model::{Item, Location, NewItem, NewLocation, User};
use serde::{Deserialize, Serialize};

pub mod memory;
pub mod records;
pub mod rest;

/// What `/auth/login` and `/auth/register` return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
}

/// Abstract interface to the inventory service.
///
/// All methods take `&self`: the REST client is stateless apart from its token store,
/// and the in-memory backend uses interior mutability.
pub trait InventoryBackend {
    fn list_locations(&self) -> Result<Vec<Location>>;

    fn create_location(&self, location: &NewLocation) -> Result<Location>;

    fn delete_location(&self, id: &str) -> Result<()>;

    /// Items matching `filter`; the server does the filtering.
    fn list_items(&self, filter: &ItemFilter) -> Result<Vec<Item>>;

    fn get_item(&self, id: &str) -> Result<Item>;

    fn create_item(&self, item: &NewItem) -> Result<Item>;

    fn delete_item(&self, id: &str) -> Result<()>;

    fn login(&self, email: &str, password: &str) -> Result<AuthResponse>;

    fn register(&self, username: &str, email: &str, password: &str) -> Result<AuthResponse>;

    /// The user owning the current token.
    fn profile(&self) -> Result<User>;

    /// Token storage consulted on every request.
    fn tokens(&self) -> &dyn TokenStore;
}
