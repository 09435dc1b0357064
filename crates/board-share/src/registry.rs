//! Share registry: which live viewer connections watch which share token

use crate::connection::ViewerConnection;
use crate::types::{ConnectionId, ShareToken};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Live mapping from share token to the viewer connections bound to it.
///
/// Both the forward map and the reverse connection index sit behind one lock,
/// so every bind, unbind and snapshot observes a single consistent state.
/// Entries whose viewer set becomes empty are removed immediately.
#[derive(Default)]
pub struct ShareRegistry {
    inner: RwLock<RegistryInner>,
}

#[derive(Default)]
struct RegistryInner {
    shares: HashMap<ShareToken, HashMap<ConnectionId, ViewerConnection>>,
    bindings: HashMap<ConnectionId, ShareToken>,
}

impl RegistryInner {
    fn detach(&mut self, token: &ShareToken, id: ConnectionId) -> bool {
        let Some(viewers) = self.shares.get_mut(token) else {
            return false;
        };

        let removed = viewers.remove(&id).is_some();
        if viewers.is_empty() {
            self.shares.remove(token);
        }
        removed
    }
}

impl ShareRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `connection` to the viewers of `token`.
    ///
    /// Returns `false` when it was already bound to that token. A connection
    /// bound to another token is moved, so it is never in two viewer sets.
    pub async fn bind(&self, token: ShareToken, connection: ViewerConnection) -> bool {
        let id = connection.id;
        let mut inner = self.inner.write().await;

        if let Some(previous) = inner.bindings.get(&id).cloned() {
            if previous == token {
                return false;
            }
            inner.detach(&previous, id);
            debug!("Moved connection {} from share {} to {}", id, previous, token);
        }

        inner.bindings.insert(id, token.clone());
        inner.shares.entry(token).or_default().insert(id, connection);
        true
    }

    /// Remove connection `id` from the viewers of `token`.
    ///
    /// Unknown tokens and untracked connections are a no-op; returns whether
    /// anything was removed.
    pub async fn unbind(&self, token: &ShareToken, id: ConnectionId) -> bool {
        let mut inner = self.inner.write().await;

        let removed = inner.detach(token, id);
        if removed {
            inner.bindings.remove(&id);
        }
        removed
    }

    /// Point-in-time copy of the viewers bound to `token`
    pub async fn snapshot(&self, token: &ShareToken) -> Vec<ViewerConnection> {
        let inner = self.inner.read().await;
        inner
            .shares
            .get(token)
            .map(|viewers| viewers.values().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn has_viewers(&self, token: &ShareToken) -> bool {
        self.inner.read().await.shares.contains_key(token)
    }

    pub async fn viewer_count(&self, token: &ShareToken) -> usize {
        self.inner
            .read()
            .await
            .shares
            .get(token)
            .map_or(0, HashMap::len)
    }

    /// Token the connection is currently bound to, if any
    pub async fn token_for(&self, id: ConnectionId) -> Option<ShareToken> {
        self.inner.read().await.bindings.get(&id).cloned()
    }

    /// Number of tokens with at least one viewer
    pub async fn token_count(&self) -> usize {
        self.inner.read().await.shares.len()
    }

    /// Number of bound connections across all tokens
    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.bindings.len()
    }

    pub async fn stats(&self) -> RegistryStats {
        let inner = self.inner.read().await;
        RegistryStats {
            active_shares: inner.shares.len(),
            bound_connections: inner.bindings.len(),
            largest_audience: inner.shares.values().map(HashMap::len).max().unwrap_or(0),
        }
    }
}

/// Registry statistics
#[derive(Debug, Default, Clone, PartialEq, serde::Serialize)]
pub struct RegistryStats {
    pub active_shares: usize,
    pub bound_connections: usize,
    pub largest_audience: usize,
}
