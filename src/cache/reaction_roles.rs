use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use serenity::all::{MessageId, RoleId};
use tracing::{info, warn};

use super::PersistenceError;
use crate::db::ReactionRoleStore;

/// Message id to granted role.
///
/// Filled once at startup. Afterwards only the reaction-role command changes
/// it, through `upsert` and `remove`, right after writing the row.
#[derive(Clone)]
pub struct ReactionRoleIndex {
    roles: Arc<DashMap<MessageId, RoleId>>,
    loaded: Arc<AtomicBool>,
    store: Arc<dyn ReactionRoleStore>,
}

impl ReactionRoleIndex {
    pub fn new(store: Arc<dyn ReactionRoleStore>) -> Self {
        Self {
            roles: Arc::new(DashMap::new()),
            loaded: Arc::new(AtomicBool::new(false)),
            store,
        }
    }

    /// Loads the `reaction_roles` table. Later calls do nothing.
    pub async fn load_once(&self) -> Result<(), PersistenceError> {
        if self.loaded.load(Ordering::Acquire) {
            warn!("reaction roles already loaded, skipping reload");
            return Ok(());
        }

        let rows = self
            .store
            .fetch_all()
            .await
            .map_err(PersistenceError::table("reaction_roles"))?;

        for row in rows {
            self.roles.insert(row.message_id, row.role_id);
        }
        self.loaded.store(true, Ordering::Release);

        info!("loaded {} reaction roles", self.roles.len());
        Ok(())
    }

    pub fn lookup(&self, message_id: MessageId) -> Option<RoleId> {
        self.roles.get(&message_id).map(|entry| *entry.value())
    }

    pub fn upsert(&self, message_id: MessageId, role_id: RoleId) {
        self.roles.insert(message_id, role_id);
    }

    pub fn remove(&self, message_id: MessageId) -> Option<RoleId> {
        self.roles.remove(&message_id).map(|(_, role_id)| role_id)
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}
