//! REST client for the inventory service.
//!
//! Wraps the HTTP API with a blocking [`reqwest`] client. Non-2xx responses become
//! [`GodownError::Api`], except 401 which becomes [`GodownError::Unauthorized`] so the
//! caller can drop the session.

use super::{AuthResponse, InventoryBackend};
use crate::auth::{bearer_token, TokenStore};
use crate::config::GodownConfig;
use crate::error::{GodownError, Result};
use crate::filter::ItemFilter;
use crate::model::{Item, Location, NewItem, NewLocation, User};
use chrono::Utc;
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;

pub struct RestBackend {
    client: Client,
    base_url: String,
    tokens: Box<dyn TokenStore>,
}

impl RestBackend {
    pub fn new(config: &GodownConfig, tokens: Box<dyn TokenStore>) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self::with_client(client, config.base_url(), tokens))
    }

    /// Reuses an existing client (connection pool, custom TLS, ...).
    pub fn with_client(client: Client, base_url: &str, tokens: Box<dyn TokenStore>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Builds a request with the bearer token attached when one is usable.
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let builder = self.client.request(method, self.url(path));
        Ok(match bearer_token(self.tokens.as_ref(), Utc::now())? {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    fn items_request(&self, filter: &ItemFilter) -> Result<RequestBuilder> {
        Ok(self.request(Method::GET, "items")?.query(&filter.query_pairs()))
    }

    fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let request = builder.build()?;
        let method = request.method().clone();
        let path = request.url().path().to_string();

        let response = self.client.execute(request).map_err(|e| {
            tracing::warn!(%method, %path, error = %e, "request failed");
            GodownError::Http(e)
        })?;

        let status = response.status();
        tracing::debug!(%method, %path, status = status.as_u16(), "response");

        if status == StatusCode::UNAUTHORIZED {
            return Err(GodownError::Unauthorized);
        }
        if !status.is_success() {
            let body = response
                .text()
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            tracing::warn!(%method, %path, status = status.as_u16(), "server rejected request");
            return Err(GodownError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok(response)
    }

    fn parse<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.send(builder)?;
        Ok(response.json::<T>()?)
    }
}

/// Pulls a human-readable message out of an error body: `{"message": ..}` or
/// `{"error": ..}` when JSON, otherwise the body itself.
pub fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error", "msg"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no details".to_string()
    } else {
        trimmed.to_string()
    }
}

impl InventoryBackend for RestBackend {
    fn list_locations(&self) -> Result<Vec<Location>> {
        self.parse(self.request(Method::GET, "locations")?)
    }

    fn create_location(&self, location: &NewLocation) -> Result<Location> {
        self.parse(self.request(Method::POST, "locations")?.json(location))
    }

    fn delete_location(&self, id: &str) -> Result<()> {
        self.send(self.request(Method::DELETE, &format!("locations/{}", id))?)?;
        Ok(())
    }

    fn list_items(&self, filter: &ItemFilter) -> Result<Vec<Item>> {
        self.parse(self.items_request(filter)?)
    }

    fn get_item(&self, id: &str) -> Result<Item> {
        self.parse(self.request(Method::GET, &format!("items/{}", id))?)
    }

    fn create_item(&self, item: &NewItem) -> Result<Item> {
        self.parse(self.request(Method::POST, "items")?.json(item))
    }

    fn delete_item(&self, id: &str) -> Result<()> {
        self.send(self.request(Method::DELETE, &format!("items/{}", id))?)?;
        Ok(())
    }

    fn login(&self, email: &str, password: &str) -> Result<AuthResponse> {
        let body = json!({ "email": email, "password": password });
        self.parse(self.request(Method::POST, "auth/login")?.json(&body))
    }

    fn register(&self, username: &str, email: &str, password: &str) -> Result<AuthResponse> {
        let body = json!({ "username": username, "email": email, "password": password });
        self.parse(self.request(Method::POST, "auth/register")?.json(&body))
    }

    fn profile(&self) -> Result<User> {
        self.parse(self.request(Method::GET, "auth/profile")?)
    }

    fn tokens(&self) -> &dyn TokenStore {
        self.tokens.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{encode_unsigned, Claims, MemoryTokenStore};
    use reqwest::header::AUTHORIZATION;

    fn backend(tokens: MemoryTokenStore) -> RestBackend {
        RestBackend::with_client(Client::new(), "http://inv.test/api/", Box::new(tokens))
    }

    #[test]
    fn joins_paths_without_double_slashes() {
        let b = backend(MemoryTokenStore::new());
        assert_eq!(b.base_url(), "http://inv.test/api");
        assert_eq!(b.url("/locations"), "http://inv.test/api/locations");
        assert_eq!(b.url("items/42"), "http://inv.test/api/items/42");
    }

    #[test]
    fn sends_every_filter_param_even_when_empty() {
        let b = backend(MemoryTokenStore::new());
        let filter = ItemFilter::new("", "Acme", "");
        let request = b.items_request(&filter).unwrap().build().unwrap();
        assert_eq!(
            request.url().as_str(),
            "http://inv.test/api/items?category=&brand=Acme&status="
        );
    }

    #[test]
    fn attaches_valid_bearer_token() {
        let token = encode_unsigned(&Claims {
            sub: Some("u1".into()),
            exp: Some(Utc::now().timestamp() + 3600),
        })
        .unwrap();
        let b = backend(MemoryTokenStore::with_token(token.clone()));
        let request = b.request(Method::GET, "locations").unwrap().build().unwrap();
        assert_eq!(
            request.headers().get(AUTHORIZATION).unwrap(),
            &format!("Bearer {}", token)
        );
    }

    #[test]
    fn expired_token_is_dropped_and_not_sent() {
        let token = encode_unsigned(&Claims {
            sub: None,
            exp: Some(Utc::now().timestamp() - 10),
        })
        .unwrap();
        let b = backend(MemoryTokenStore::with_token(token));
        let request = b.request(Method::GET, "locations").unwrap().build().unwrap();
        assert!(request.headers().get(AUTHORIZATION).is_none());
        assert_eq!(b.tokens().load().unwrap(), None);
    }

    #[test]
    fn error_message_prefers_json_fields() {
        assert_eq!(error_message(r#"{"message":"Name taken"}"#), "Name taken");
        assert_eq!(error_message(r#"{"error":"Bad input"}"#), "Bad input");
        assert_eq!(error_message("Gateway Timeout"), "Gateway Timeout");
        assert_eq!(error_message("  "), "no details");
    }
}
