//! Authentication context and the on-disk token cache.
//!
//! The bearer token is an explicitly passed value with a set/clear
//! lifecycle: set on login, signup, or restore from the cache; cleared on
//! logout. It never lives in module-level state.

use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Holder for the current bearer token.
#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    token: Option<String>,
}

impl AuthContext {
    pub fn new() -> Self {
        AuthContext::default()
    }

    pub fn authenticated(token: impl Into<String>) -> Self {
        AuthContext {
            token: Some(token.into()),
        }
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    pub fn clear(&mut self) {
        self.token = None;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}

/// Where the bearer token survives between invocations.
pub fn default_token_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("pricewatch").join("token"))
}

/// Read a cached token. A missing, unreadable, or empty file means no
/// session, not an error.
pub fn load_token(path: &Path) -> Option<String> {
    let raw = fs::read_to_string(path).ok()?;
    let token = raw.trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Persist a token for later invocations.
pub fn store_token(path: &Path, token: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create token directory: {}", parent.display()))?;
    }
    fs::write(path, token)
        .with_context(|| format!("Failed to write token file: {}", path.display()))
}

/// Drop the cached token. Deleting an already-missing file is fine.
pub fn clear_token(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => {
            Err(e).with_context(|| format!("Failed to remove token file: {}", path.display()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_token_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("pricewatch-{}-{}", name, std::process::id()))
    }

    #[test]
    fn test_context_lifecycle() {
        let mut auth = AuthContext::new();
        assert!(!auth.is_authenticated());

        auth.set_token("abc123");
        assert!(auth.is_authenticated());
        assert_eq!(auth.token(), Some("abc123"));

        auth.clear();
        assert!(!auth.is_authenticated());
        assert_eq!(auth.token(), None);
    }

    #[test]
    fn test_token_cache_roundtrip() {
        let path = temp_token_path("roundtrip");
        store_token(&path, "tok-1").unwrap();
        assert_eq!(load_token(&path), Some("tok-1".to_string()));

        clear_token(&path).unwrap();
        assert_eq!(load_token(&path), None);

        // Clearing twice must not fail.
        clear_token(&path).unwrap();
    }

    #[test]
    fn test_blank_cache_is_no_session() {
        let path = temp_token_path("blank");
        store_token(&path, "  \n").unwrap();
        assert_eq!(load_token(&path), None);
        clear_token(&path).unwrap();
    }
}
