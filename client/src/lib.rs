//! # Blob Arena Client Library
//!
//! A headless player for the blob arena server. It joins under a display
//! name, steers its blob on its own and reports the leaderboard and the final
//! winner through the log.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! Owns the TCP stream:
//! - Name announcement and the bounded wait for an identity
//! - A reader task that keeps only the newest snapshot
//! - Fixed-rate input sending and periodic leaderboard logging
//!
//! ### Game Module (`game`)
//! The latest arena snapshot plus leaderboard and winner formatting.
//!
//! ### Input Module (`input`)
//! Steering: flee nearby larger blobs, otherwise chase the closest pellet
//! nobody bigger is guarding, otherwise drift to the arena centre.
//!
//! ## Usage Example
//!
//! ```no_run
//! use client::network::{Client, ClientConfig};
//!
//! # async fn play() -> Result<(), client::network::ClientError> {
//! let client = Client::connect(ClientConfig::default()).await?;
//! let summary = client.run().await?;
//! println!("{}", summary.winner_line);
//! # Ok(())
//! # }
//! ```

pub mod game;
pub mod input;
pub mod network;
