// Bearer-token source for authenticated calls. How the token is obtained
// and persisted is an external concern; the flow only asks whether one exists.

use parking_lot::RwLock;

pub trait SessionStore: Send + Sync + 'static {
    fn token(&self) -> Option<String>;
}

/// In-memory session, enough for embedding shells and tests.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: RwLock<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn signed_in(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    pub fn set_token(&self, token: Option<String>) {
        *self.token.write() = token;
    }
}

impl SessionStore for MemorySessionStore {
    fn token(&self) -> Option<String> {
        self.token.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_lifecycle() {
        let session = MemorySessionStore::new();
        assert_eq!(session.token(), None);

        session.set_token(Some("jwt-abc".to_string()));
        assert_eq!(session.token(), Some("jwt-abc".to_string()));

        session.set_token(None);
        assert_eq!(session.token(), None);

        let signed = MemorySessionStore::signed_in("jwt-def");
        assert_eq!(signed.token(), Some("jwt-def".to_string()));
    }
}
