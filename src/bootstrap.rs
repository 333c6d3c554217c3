//! Startup ordering: open the database, fill every cache, then hand the
//! caches to the gateway client.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info};

use crate::cache::{Caches, PersistenceError};
use crate::db::{DatabaseError, Stores};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    Unstarted,
    Connecting,
    LoadingCaches,
    Ready,
    Failed,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to open the database: {0}")]
    Connect(#[source] DatabaseError),
    #[error("failed to load caches: {0}")]
    Load(#[from] PersistenceError),
    #[error("bootstrap already ran and ended in {0:?}")]
    AlreadyRan(BootstrapState),
}

/// Fully loaded caches plus the stores they read from.
pub struct Ready {
    pub stores: Stores,
    pub caches: Arc<Caches>,
}

#[derive(Debug)]
pub struct Bootstrap {
    state: BootstrapState,
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self::new()
    }
}

impl Bootstrap {
    pub fn new() -> Self {
        Self {
            state: BootstrapState::Unstarted,
        }
    }

    pub fn state(&self) -> BootstrapState {
        self.state
    }

    /// Runs `connect`, then loads the blacklist, the guild configs and the
    /// reaction roles, in that order. Any failure ends in `Failed` and no
    /// caches are returned.
    pub async fn run<F>(&mut self, connect: F) -> Result<Ready, BootstrapError>
    where
        F: Future<Output = Result<Stores, DatabaseError>>,
    {
        if self.state != BootstrapState::Unstarted {
            return Err(BootstrapError::AlreadyRan(self.state));
        }

        self.transition(BootstrapState::Connecting);
        let stores = match connect.await {
            Ok(stores) => stores,
            Err(err) => return Err(self.fail(BootstrapError::Connect(err))),
        };

        self.transition(BootstrapState::LoadingCaches);
        let caches = Caches::empty(&stores);
        if let Err(err) = Self::load(&caches).await {
            return Err(self.fail(err.into()));
        }

        self.transition(BootstrapState::Ready);
        Ok(Ready {
            stores,
            caches: Arc::new(caches),
        })
    }

    async fn load(caches: &Caches) -> Result<(), PersistenceError> {
        caches.blacklist.reload_all().await?;
        caches.guild_configs.load_all().await?;
        caches.reaction_roles.load_once().await?;
        Ok(())
    }

    fn transition(&mut self, next: BootstrapState) {
        info!("bootstrap {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn fail(&mut self, err: BootstrapError) -> BootstrapError {
        error!("bootstrap failed during {:?}: {err}", self.state);
        self.state = BootstrapState::Failed;
        err
    }
}
