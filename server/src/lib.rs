//! # Arena Server Library
//!
//! This library provides the authoritative server for the blob arena. It owns
//! the canonical game state, applies player inputs as they arrive, resolves
//! consumption between blobs and food, and streams consistent snapshots to
//! every connected client.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! The server runs the only copy of the arena. Movement, consumption, decay
//! and the match clock are all decided here; clients render whatever the
//! latest snapshot says.
//!
//! ### Connection Lifecycle
//! Each TCP connection announces a display name, receives its player
//! identity, then streams input targets while the server streams snapshots
//! back. Losing the stream removes the player from the arena for good.
//!
//! ## Architecture Design
//!
//! ### Task Per Connection
//! The listener spawns one task per accepted connection. Every task shares a
//! single [`game::SharedWorld`], which serialises all world operations behind
//! one coarse lock: one movement step, one collision pass, one snapshot read,
//! one join or leave at a time.
//!
//! ### Timer-Driven Handlers
//! A connection handler ticks at a fixed pace. Each tick applies the newest
//! input target (older unprocessed targets are superseded), runs the
//! world's collision and decay pass, and sends a snapshot if the snapshot
//! interval has elapsed. Because every handler drives the pass, the pass
//! rate grows with the number of players.
//!
//! ### Framed TCP Protocol
//! Messages are bincode-encoded [`shared::Packet`] values behind a 4-byte
//! length prefix. Decode errors and transport errors both terminate only the
//! offending connection.
//!
//! ## Module Organization
//!
//! - `physics`: 2D vector math and bounds clamping
//! - `entity`: player blobs and food pellets
//! - `game`: the world, its collision/decay pass and the shared handle
//! - `client_manager`: identity allocation and live connection records
//! - `connection`: handshake helpers and the per-connection loop
//! - `network`: listener and connection dispatch
//! - `config`: server and arena settings
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind(ServerConfig::default()).await?;
//!     let (_shutdown_tx, shutdown_rx) = watch::channel(false);
//!
//!     // Runs until the shutdown flag is raised
//!     server.run(shutdown_rx).await;
//!     Ok(())
//! }
//! ```

pub mod client_manager;
pub mod config;
pub mod connection;
pub mod entity;
pub mod game;
pub mod network;
pub mod physics;
