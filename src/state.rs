use std::sync::Arc;

use crate::auth::{
    repo::{DynSessionStore, DynUserStore, PgSessionStore, PgUserStore},
    session::SessionManager,
};
use crate::config::AppConfig;
use sqlx::PgPool;

/// Everything a handler may touch, passed explicitly through the router.
#[derive(Clone)]
pub struct AppState {
    pub users: DynUserStore,
    pub session_store: DynSessionStore,
    pub sessions: SessionManager,
}

impl AppState {
    pub fn from_pool(db: PgPool, config: &AppConfig) -> Self {
        let users = Arc::new(PgUserStore::new(db.clone())) as DynUserStore;
        let session_store = Arc::new(PgSessionStore::new(db)) as DynSessionStore;
        Self::from_parts(config, users, session_store)
    }

    pub fn from_parts(
        config: &AppConfig,
        users: DynUserStore,
        session_store: DynSessionStore,
    ) -> Self {
        let sessions = SessionManager::new(&config.session, session_store.clone(), users.clone());
        Self {
            users,
            session_store,
            sessions,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::testing::{test_config, MemorySessionStore, MemoryUserStore};

        let users = Arc::new(MemoryUserStore::default()) as DynUserStore;
        let session_store = Arc::new(MemorySessionStore::default()) as DynSessionStore;
        Self::from_parts(&test_config(), users, session_store)
    }
}
