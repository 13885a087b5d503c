//! Bookkeeping for live connections and player identity allocation
//!
//! This module tracks every connection that has completed its name
//! announcement:
//! - Identity assignment from a counter that only ever grows
//! - Connection metadata (peer address, display name, connect time)
//! - Cleanup when a connection terminates
//!
//! Identities are never reused, even after the player that held one leaves.

use log::info;
use shared::PlayerId;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Represents a connected client that owns a player in the arena
#[derive(Debug, Clone)]
pub struct Client {
    /// Player identity assigned by the server
    pub id: PlayerId,
    /// Remote peer address
    pub addr: SocketAddr,
    /// Display name announced by the client, taken as-is
    pub name: String,
    /// When the name announcement completed
    pub connected_at: Instant,
}

impl Client {
    pub fn new(id: PlayerId, addr: SocketAddr, name: String) -> Self {
        Self {
            id,
            addr,
            name,
            connected_at: Instant::now(),
        }
    }

    /// How long this client has been in the arena
    pub fn session_length(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

/// Registry of all connected clients
///
/// The ClientManager hands out player identities and remembers which peer
/// owns each one for logging and diagnostics. It does not own any game
/// state; the world is told about joins and leaves separately.
#[derive(Debug)]
pub struct ClientManager {
    /// Connected clients indexed by their identity
    clients: HashMap<PlayerId, Client>,
    /// Next identity to hand out
    next_client_id: PlayerId,
}

impl Default for ClientManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientManager {
    /// Creates an empty registry. Identities start from 1.
    pub fn new() -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
        }
    }

    /// Registers a client that has announced its name and returns its identity
    pub fn register(&mut self, addr: SocketAddr, name: String) -> PlayerId {
        let client_id = self.next_client_id;
        self.next_client_id += 1;

        info!("Client {} ({}) connected from {}", client_id, name, addr);
        self.clients
            .insert(client_id, Client::new(client_id, addr, name));

        client_id
    }

    /// Removes a client, returning its record if it was still registered
    pub fn remove_client(&mut self, client_id: &PlayerId) -> Option<Client> {
        let client = self.clients.remove(client_id)?;
        info!(
            "Client {} ({}) at {} disconnected after {:.1}s",
            client.id,
            client.name,
            client.addr,
            client.session_length().as_secs_f32()
        );
        Some(client)
    }

    /// Returns the number of currently connected clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns true if no clients are currently connected
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
