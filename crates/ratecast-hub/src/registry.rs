//! Live peer set and the broadcast primitive.
//!
//! The registry owns one outbound queue sender per connected peer. Adding
//! and removing take the write lock; [`Registry::broadcast`] copies the live
//! set under the read lock and sends after releasing it, so a broadcast
//! sees either all or none of a concurrent add/remove. Sends never wait: a
//! peer that stops draining its queue is dropped instead of stalling the
//! room.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, Mutex};

use fake::faker::name::en::Name;
use fake::Fake;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

/// Sending half of a peer's outbound message queue.
pub type Outbound = mpsc::Sender<String>;

/// Opaque connection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeerId(Uuid);

impl PeerId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for PeerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Connection lifecycle. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    Connecting,
    Active,
    Closed,
}

/// A connected participant as seen by the hub.
#[derive(Debug, Clone)]
pub struct Peer {
    id: PeerId,
    name: Arc<str>,
    state: Arc<Mutex<PeerState>>,
}

impl Peer {
    fn new(name: String) -> Self {
        Self {
            id: PeerId::generate(),
            name: Arc::from(name),
            state: Arc::new(Mutex::new(PeerState::Connecting)),
        }
    }

    pub const fn id(&self) -> PeerId {
        self.id
    }

    /// Generated display name used to prefix this peer's chat lines.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> PeerState {
        *self.state.lock().expect("peer state lock is not poisoned")
    }

    pub fn is_active(&self) -> bool {
        self.state() == PeerState::Active
    }

    fn transition(&self, next: PeerState) {
        let mut state = self.state.lock().expect("peer state lock is not poisoned");
        if *state != PeerState::Closed {
            *state = next;
        }
    }
}

struct PeerEntry {
    peer: Peer,
    outbound: Outbound,
}

type Namer = Arc<dyn Fn() -> String + Send + Sync>;

/// Synchronized set of active peers.
pub struct Registry {
    peers: RwLock<HashMap<PeerId, PeerEntry>>,
    namer: Namer,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Registry that names peers with random full names.
    pub fn new() -> Self {
        Self::with_namer(|| Name().fake::<String>())
    }

    /// Registry with a caller-supplied display-name generator.
    pub fn with_namer(namer: impl Fn() -> String + Send + Sync + 'static) -> Self {
        Self {
            peers: RwLock::new(HashMap::new()),
            namer: Arc::new(namer),
        }
    }

    /// Name, activate and insert a new peer whose messages go to `outbound`.
    ///
    /// Any broadcast that starts after this returns will include the peer.
    pub async fn add(&self, outbound: Outbound) -> Peer {
        let peer = Peer::new((self.namer)());
        let mut peers = self.peers.write().await;
        peer.transition(PeerState::Active);
        peers.insert(
            peer.id(),
            PeerEntry {
                peer: peer.clone(),
                outbound,
            },
        );
        debug!(peer = %peer.id(), name = peer.name(), live = peers.len(), "peer registered");
        peer
    }

    /// Drop `peer` from the live set and mark it closed.
    ///
    /// Returns `false` when the peer was already gone.
    pub async fn remove(&self, peer: &Peer) -> bool {
        let removed = {
            let mut peers = self.peers.write().await;
            peers.remove(&peer.id()).is_some()
        };
        peer.transition(PeerState::Closed);
        if removed {
            debug!(peer = %peer.id(), name = peer.name(), "peer deregistered");
        }
        removed
    }

    /// Send `text` to every peer live at the time of the call.
    ///
    /// Delivery never waits on a peer: one whose queue is full or closed is
    /// removed and the others still receive the message. Returns how many
    /// peers accepted it.
    pub async fn broadcast(&self, text: &str) -> usize {
        let snapshot: Vec<(Peer, Outbound)> = {
            let peers = self.peers.read().await;
            peers
                .values()
                .map(|entry| (entry.peer.clone(), entry.outbound.clone()))
                .collect()
        };

        let mut delivered = 0;
        for (peer, outbound) in snapshot {
            match outbound.try_send(text.to_owned()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(peer = %peer.id(), name = peer.name(), "outbound queue full; dropping peer");
                    self.remove(&peer).await;
                }
                Err(TrySendError::Closed(_)) => {
                    warn!(peer = %peer.id(), name = peer.name(), "send failed; dropping peer");
                    self.remove(&peer).await;
                }
            }
        }
        delivered
    }

    pub async fn contains(&self, peer: &Peer) -> bool {
        self.peers.read().await.contains_key(&peer.id())
    }

    pub async fn len(&self) -> usize {
        self.peers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.peers.read().await.is_empty()
    }

    /// Display names of the live peers, sorted.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .peers
            .read()
            .await
            .values()
            .map(|entry| entry.peer.name().to_owned())
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
impl Registry {
    /// Registry naming peers `A`, `B`, `C`, ... in join order.
    pub(crate) fn lettered() -> Self {
        let next = std::sync::atomic::AtomicUsize::new(0);
        Self::with_namer(move || {
            let index = next.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            char::from(b'A' + index as u8).to_string()
        })
    }
}
