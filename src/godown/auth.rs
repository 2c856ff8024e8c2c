//! # Authentication Tokens
//!
//! The server issues a JWT on login/register. The client keeps it in a [`TokenStore`]
//! (a file in the data directory for the CLI) and attaches it to every request.
//!
//! The client never verifies signatures: it has no key. It only reads the `exp`
//! claim so that an expired token is dropped locally instead of being sent.
//!
//! - Present and unexpired: sent as `Authorization: Bearer <token>`.
//! - Expired or unreadable: removed from the store; the request goes out
//!   unauthenticated and the server's rejection is handled like any other 401.
//! - A token without `exp` never expires client-side.

use crate::error::{GodownError, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// The claims the client cares about. Unknown claims are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

impl Claims {
    /// Reads the payload segment of a JWT. Fails on anything that is not `a.b.c`
    /// with a base64url JSON middle.
    pub fn decode(token: &str) -> Result<Self> {
        let mut parts = token.split('.');
        let payload = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(_), Some(payload), Some(_), None) => payload,
            _ => return Err(GodownError::validation("Malformed token")),
        };
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| GodownError::validation(format!("Malformed token payload: {}", e)))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.exp {
            Some(exp) => exp < now.timestamp(),
            None => false,
        }
    }
}

/// Builds an unsigned `header.payload.signature` token. Used by the in-memory backend.
pub fn encode_unsigned(claims: &Claims) -> Result<String> {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
    Ok(format!("{}.{}.unsigned", header, payload))
}

/// Where the current session token lives.
///
/// Methods take `&self`; implementations handle their own mutability.
pub trait TokenStore {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Returns the token to send, if any. Expired or malformed tokens are removed.
pub fn bearer_token(store: &dyn TokenStore, now: DateTime<Utc>) -> Result<Option<String>> {
    let Some(token) = store.load()? else {
        return Ok(None);
    };
    match Claims::decode(&token) {
        Ok(claims) if !claims.is_expired(now) => Ok(Some(token)),
        Ok(_) => {
            tracing::info!("stored token expired, clearing it");
            store.clear()?;
            Ok(None)
        }
        Err(e) => {
            tracing::warn!(error = %e, "stored token unreadable, clearing it");
            store.clear()?;
            Ok(None)
        }
    }
}

/// Token kept in a single file, e.g. `~/.local/share/godown/token`.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let token = fs::read_to_string(&self.path)?;
        let token = token.trim();
        Ok((!token.is_empty()).then(|| token.to_string()))
    }

    fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
            options.mode(0o600);
            let mut file = options.open(&self.path)?;
            // `mode` only applies on creation; an older file may be wider.
            file.set_permissions(fs::Permissions::from_mode(0o600))?;
            file.write_all(token.as_bytes())?;
        }
        #[cfg(not(unix))]
        {
            let mut file = options.open(&self.path)?;
            file.write_all(token.as_bytes())?;
        }
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Default)]
pub struct MemoryTokenStore {
    token: RefCell<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RefCell::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.token.borrow().clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        *self.token.borrow_mut() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.token.borrow_mut() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token_expiring_at(exp: i64) -> String {
        encode_unsigned(&Claims {
            sub: Some("u1".into()),
            exp: Some(exp),
        })
        .unwrap()
    }

    #[test]
    fn decodes_claims_roundtrip() {
        let token = token_expiring_at(1_900_000_000);
        let claims = Claims::decode(&token).unwrap();
        assert_eq!(claims.exp, Some(1_900_000_000));
        assert_eq!(claims.sub.as_deref(), Some("u1"));
    }

    #[test]
    fn rejects_non_jwt() {
        assert!(Claims::decode("not-a-token").is_err());
        assert!(Claims::decode("a.b").is_err());
        assert!(Claims::decode("a.%%%.c").is_err());
    }

    #[test]
    fn unexpired_token_is_attached() {
        let now = Utc::now();
        let token = token_expiring_at((now + Duration::hours(1)).timestamp());
        let store = MemoryTokenStore::with_token(token.clone());
        assert_eq!(bearer_token(&store, now).unwrap(), Some(token));
    }

    #[test]
    fn expired_token_is_stripped() {
        let now = Utc::now();
        let store =
            MemoryTokenStore::with_token(token_expiring_at((now - Duration::minutes(1)).timestamp()));
        assert_eq!(bearer_token(&store, now).unwrap(), None);
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn malformed_token_is_stripped() {
        let store = MemoryTokenStore::with_token("garbage");
        assert_eq!(bearer_token(&store, Utc::now()).unwrap(), None);
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn token_without_exp_never_expires() {
        let token = encode_unsigned(&Claims { sub: None, exp: None }).unwrap();
        let store = MemoryTokenStore::with_token(token.clone());
        assert_eq!(bearer_token(&store, Utc::now()).unwrap(), Some(token));
    }

    #[test]
    fn file_store_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join("token"));
        assert_eq!(store.load().unwrap(), None);

        store.save("abc.def.ghi").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("abc.def.ghi"));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn file_store_keeps_token_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        let mode = |p: &std::path::Path| fs::metadata(p).unwrap().permissions().mode() & 0o777;

        let store = FileTokenStore::new(path.clone());
        store.save("abc.def.ghi").unwrap();
        assert_eq!(mode(&path), 0o600);

        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        store.save("new.token.value").unwrap();
        assert_eq!(mode(&path), 0o600);
        assert_eq!(store.load().unwrap().as_deref(), Some("new.token.value"));
    }
}
