use crate::auth::bearer_token;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{GodownError, Result};
use crate::store::InventoryBackend;
use chrono::Utc;

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(GodownError::validation(format!("{} is required", field)));
    }
    Ok(trimmed)
}

/// Exchanges credentials for a token, stores it, then loads the profile.
pub fn login<B: InventoryBackend>(backend: &B, email: &str, password: &str) -> Result<CmdResult> {
    let email = required(email, "Email")?;
    if password.is_empty() {
        return Err(GodownError::validation("Password is required"));
    }

    let auth = backend.login(email, password)?;
    backend.tokens().save(&auth.token)?;
    tracing::info!(email, "logged in");

    let mut result = CmdResult::default();
    match auth.user.map(Ok).unwrap_or_else(|| backend.profile()) {
        Ok(user) => {
            result.add_message(CmdMessage::success(format!(
                "Logged in as {}",
                user.username
            )));
            result.user = Some(user);
        }
        Err(e) => {
            tracing::warn!(error = %e, "profile fetch after login failed");
            result.add_message(CmdMessage::success(format!("Logged in as {}", email)));
            result.add_message(CmdMessage::warning(format!(
                "Profile could not be loaded: {}",
                e
            )));
        }
    }
    Ok(result)
}

pub fn register<B: InventoryBackend>(
    backend: &B,
    username: &str,
    email: &str,
    password: &str,
) -> Result<CmdResult> {
    let username = required(username, "Username")?;
    let email = required(email, "Email")?;
    if password.is_empty() {
        return Err(GodownError::validation("Password is required"));
    }

    let auth = backend.register(username, email, password)?;
    backend.tokens().save(&auth.token)?;
    tracing::info!(username, "registered");

    let mut result = CmdResult::default().with_message(CmdMessage::success(format!(
        "Registered and logged in as {}",
        username
    )));
    result.user = auth.user;
    Ok(result)
}

pub fn logout<B: InventoryBackend>(backend: &B) -> Result<CmdResult> {
    let had_token = backend.tokens().load()?.is_some();
    backend.tokens().clear()?;
    let message = if had_token {
        CmdMessage::success("Logged out.")
    } else {
        CmdMessage::info("Not logged in.")
    };
    Ok(CmdResult::default().with_message(message))
}

/// True when a usable token is stored. Expired tokens are dropped on the way.
pub fn is_authenticated<B: InventoryBackend>(backend: &B) -> Result<bool> {
    Ok(bearer_token(backend.tokens(), Utc::now())?.is_some())
}

/// Guard for every operation that needs a session.
pub fn require_login<B: InventoryBackend>(backend: &B) -> Result<()> {
    if is_authenticated(backend)? {
        Ok(())
    } else {
        Err(GodownError::NotLoggedIn)
    }
}

pub fn whoami<B: InventoryBackend>(backend: &B) -> Result<CmdResult> {
    require_login(backend)?;
    let user = backend.profile()?;
    Ok(CmdResult::default().with_user(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{encode_unsigned, Claims};
    use crate::store::memory::MemBackend;

    fn backend_with_user() -> MemBackend {
        let backend = MemBackend::new();
        backend.require_auth(true);
        backend.seed_user("ana", "ana@example.com", "secret");
        backend
    }

    #[test]
    fn login_stores_token_and_loads_profile() {
        let backend = backend_with_user();
        let result = login(&backend, "ana@example.com", "secret").unwrap();
        assert_eq!(result.user.unwrap().username, "ana");
        assert!(backend.tokens().load().unwrap().is_some());
        assert!(is_authenticated(&backend).unwrap());
    }

    #[test]
    fn login_with_bad_credentials_stores_nothing() {
        let backend = backend_with_user();
        let err = login(&backend, "ana@example.com", "wrong").unwrap_err();
        assert!(matches!(err, GodownError::Api { status: 400, .. }));
        assert_eq!(backend.tokens().load().unwrap(), None);
    }

    #[test]
    fn login_rejects_blank_email_before_request() {
        let backend = backend_with_user();
        assert!(login(&backend, "  ", "secret").is_err());
        assert_eq!(backend.request_count(), 0);
    }

    #[test]
    fn register_keeps_returned_user() {
        let backend = MemBackend::new();
        let result = register(&backend, "bo", "bo@example.com", "pw").unwrap();
        assert_eq!(result.user.unwrap().email, "bo@example.com");
        assert!(is_authenticated(&backend).unwrap());

        let err = register(&backend, "bo", "bo@example.com", "pw").unwrap_err();
        assert!(matches!(err, GodownError::Api { status: 400, .. }));
    }

    #[test]
    fn logout_clears_token() {
        let backend = backend_with_user();
        login(&backend, "ana@example.com", "secret").unwrap();
        let result = logout(&backend).unwrap();
        assert_eq!(result.messages[0].content, "Logged out.");
        assert!(!is_authenticated(&backend).unwrap());
    }

    #[test]
    fn whoami_requires_session() {
        let backend = backend_with_user();
        assert!(matches!(whoami(&backend), Err(GodownError::NotLoggedIn)));
        assert_eq!(backend.request_count(), 0);
    }

    #[test]
    fn expired_token_is_not_authenticated() {
        let backend = backend_with_user();
        let token = encode_unsigned(&Claims {
            sub: None,
            exp: Some(Utc::now().timestamp() - 1),
        })
        .unwrap();
        backend.tokens().save(&token).unwrap();
        assert!(!is_authenticated(&backend).unwrap());
        assert_eq!(backend.tokens().load().unwrap(), None);
    }
}
