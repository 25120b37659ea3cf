//! Session invalidation: reaction to an unauthorized signal from any layer.

use std::sync::Arc;

use appshell_store::{LocalDatabase, SessionStore};

use crate::events::{EventSender, ShellEvent, emit};
use crate::lifecycle::Lifecycle;
use crate::notifications::Notifier;
use crate::supervisor::BackgroundTasks;

/// Published by any layer that observes an authorization failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UnauthorizedEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalidation {
    /// The context was already closing; nothing was done.
    IgnoredWhileFinishing,
    /// Cleanup was scheduled and the context will close and relaunch.
    Restarting,
}

#[derive(Clone)]
pub struct SessionInvalidator {
    store: Arc<dyn SessionStore>,
    database: Arc<dyn LocalDatabase>,
    notifier: Arc<dyn Notifier>,
    background: BackgroundTasks,
    events: EventSender,
}

impl SessionInvalidator {
    pub fn new(
        store: Arc<dyn SessionStore>,
        database: Arc<dyn LocalDatabase>,
        notifier: Arc<dyn Notifier>,
        background: BackgroundTasks,
        events: EventSender,
    ) -> Self {
        Self {
            store,
            database,
            notifier,
            background,
            events,
        }
    }

    /// Handle one unauthorized event for the context owning `lifecycle`.
    ///
    /// Notifications are cancelled synchronously. Local data is cleared on
    /// the background supervisor, never on the UI task, and the cleanup is
    /// not tied to the closing context.
    pub fn handle(&self, lifecycle: &Lifecycle) -> Invalidation {
        if lifecycle.is_finishing() {
            tracing::debug!("unauthorized event ignored, context already finishing");
            emit(&self.events, ShellEvent::UnauthorizedIgnored);
            return Invalidation::IgnoredWhileFinishing;
        }

        tracing::info!("session unauthorized, invalidating");
        self.notifier.cancel_all();

        let database = Arc::clone(&self.database);
        let store = Arc::clone(&self.store);
        let events = self.events.clone();
        self.background.spawn_blocking("clear_local_state", move || {
            let ok = clear_local_state(database.as_ref(), store.as_ref());
            emit(&events, ShellEvent::CleanupFinished { ok });
        });

        lifecycle.restart();
        emit(&self.events, ShellEvent::SessionInvalidated);
        Invalidation::Restarting
    }
}

/// Clear the database, then the session store. Both are attempted; failures
/// are logged and reported as `false`.
pub fn clear_local_state(database: &dyn LocalDatabase, store: &dyn SessionStore) -> bool {
    let mut ok = true;
    if let Err(e) = database.clear_all_tables() {
        tracing::warn!("failed to clear database tables: {e}");
        ok = false;
    }
    if let Err(e) = store.clear_all() {
        tracing::warn!("failed to clear session store: {e}");
        ok = false;
    }
    if ok {
        tracing::info!("local session state cleared");
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events;
    use crate::notifications::NotificationCenter;
    use appshell_core::Token;
    use appshell_store::{MemorySessionStore, SqliteDatabase, StoreError};
    use std::time::Duration;

    struct FailingDatabase;

    impl LocalDatabase for FailingDatabase {
        fn clear_all_tables(&self) -> Result<(), StoreError> {
            Err(StoreError::Poisoned("database connection"))
        }
    }

    struct Fixture {
        store: Arc<MemorySessionStore>,
        database: Arc<SqliteDatabase>,
        notifier: Arc<NotificationCenter>,
        background: BackgroundTasks,
        invalidator: SessionInvalidator,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemorySessionStore::with_token(Token::new("abc")));
        let database = Arc::new(SqliteDatabase::open_in_memory().expect("db"));
        database.put_cached("feed", "[]").expect("seed");
        let notifier = Arc::new(NotificationCenter::new());
        notifier.post("welcome");
        let background = BackgroundTasks::new();
        let (tx, _rx) = events::channel();
        let invalidator = SessionInvalidator::new(
            store.clone(),
            database.clone(),
            notifier.clone(),
            background.clone(),
            tx,
        );
        Fixture {
            store,
            database,
            notifier,
            background,
            invalidator,
        }
    }

    #[tokio::test]
    async fn invalidation_clears_everything_and_finishes() {
        let f = fixture();
        let lifecycle = Lifecycle::new();

        assert_eq!(f.invalidator.handle(&lifecycle), Invalidation::Restarting);
        assert!(lifecycle.is_restarting());
        assert!(f.notifier.active().is_empty());

        tokio::time::timeout(Duration::from_secs(2), f.background.wait_idle())
            .await
            .expect("cleanup finished");
        assert!(f.store.read_token().expect("read").is_none());
        assert_eq!(f.database.row_count().expect("count"), 0);
    }

    #[tokio::test]
    async fn ignored_while_finishing() {
        let f = fixture();
        let lifecycle = Lifecycle::new();
        lifecycle.finish();

        assert_eq!(
            f.invalidator.handle(&lifecycle),
            Invalidation::IgnoredWhileFinishing
        );
        f.background.wait_idle().await;
        assert!(f.store.read_token().expect("read").is_some());
        assert_eq!(f.database.row_count().expect("count"), 1);
        assert_eq!(f.notifier.active().len(), 1);
    }

    #[test]
    fn store_cleared_even_when_database_fails() {
        let store = MemorySessionStore::with_token(Token::new("abc"));
        assert!(!clear_local_state(&FailingDatabase, &store));
        assert!(store.read_token().expect("read").is_none());
    }
}
