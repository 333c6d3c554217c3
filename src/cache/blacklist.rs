use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use serenity::all::UserId;
use tracing::info;

use super::PersistenceError;
use crate::db::BlacklistStore;

/// Users the bot ignores.
///
/// The set is rebuilt from scratch on every reload and swapped in as one
/// `Arc`, so readers see either the old set or the new one.
#[derive(Clone)]
pub struct BlacklistCache {
    users: Arc<RwLock<Arc<HashSet<UserId>>>>,
    store: Arc<dyn BlacklistStore>,
}

impl BlacklistCache {
    pub fn new(store: Arc<dyn BlacklistStore>) -> Self {
        Self {
            users: Arc::new(RwLock::new(Arc::new(HashSet::new()))),
            store,
        }
    }

    /// Replaces the whole set with the current `blacklist` table.
    pub async fn reload_all(&self) -> Result<(), PersistenceError> {
        let users: HashSet<UserId> = self
            .store
            .fetch_all()
            .await
            .map_err(PersistenceError::table("blacklist"))?
            .into_iter()
            .collect();

        info!("loaded {} blacklisted users", users.len());
        *self.users.write() = Arc::new(users);
        Ok(())
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.users.read().contains(&user_id)
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serenity::all::UserId;

    use super::BlacklistCache;
    use crate::cache::LoadTarget;
    use crate::cache::testing::FakeBlacklistStore;

    #[tokio::test]
    async fn reload_replaces_the_whole_set() {
        let store = FakeBlacklistStore::with_users([1, 2, 3]);
        let cache = BlacklistCache::new(store.clone());
        cache.reload_all().await.expect("first load");
        assert!(cache.contains(UserId::new(1)));
        assert_eq!(cache.len(), 3);

        store.set_users([4]);
        cache.reload_all().await.expect("reload");

        assert!(!cache.contains(UserId::new(1)));
        assert!(!cache.contains(UserId::new(3)));
        assert!(cache.contains(UserId::new(4)));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn failed_reload_keeps_the_previous_set() {
        let store = FakeBlacklistStore::with_users([10]);
        let cache = BlacklistCache::new(store.clone());
        cache.reload_all().await.expect("load");

        store.set_users([]);
        store.fail(true);
        let err = cache.reload_all().await.expect_err("fetch fails");

        assert_eq!(err.target, LoadTarget::Table("blacklist"));
        assert!(cache.contains(UserId::new(10)));
    }

    #[tokio::test]
    async fn empty_before_first_load() {
        let cache = BlacklistCache::new(Arc::new(FakeBlacklistStore::default()));
        assert!(cache.is_empty());
        assert!(!cache.contains(UserId::new(1)));
    }
}
