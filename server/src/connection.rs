//! Per-connection handler.
//!
//! A connection moves through `awaiting name -> active -> terminated`. The
//! name announcement and identity reply are time-bounded; once active the
//! handler runs a fixed-rate loop that applies the latest input, drives the
//! world's physics pass and sends snapshots no more often than the snapshot
//! interval.

use crate::game::SharedWorld;
use log::{debug, warn};
use shared::{read_packet, write_packet, Packet, PlayerId, ProtocolError};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;
use tokio::task::JoinError;
use tokio::time::{interval, timeout, Instant, MissedTickBehavior};

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("handshake not completed within {0:?}")]
    HandshakeTimeout(Duration),
    #[error("expected {expected} packet, got {got}")]
    UnexpectedPacket {
        expected: &'static str,
        got: &'static str,
    },
    #[error("non-finite input target ({x}, {y})")]
    InvalidTarget { x: f32, y: f32 },
    #[error("input reader stopped: {0}")]
    Reader(#[from] JoinError),
}

impl ConnectionError {
    /// True when the peer simply hung up.
    pub fn is_peer_closed(&self) -> bool {
        matches!(
            self,
            ConnectionError::Protocol(ProtocolError::ConnectionClosed)
        )
    }
}

/// Waits for the client's name announcement.
pub async fn read_hello<R>(reader: &mut R, deadline: Duration) -> Result<String, ConnectionError>
where
    R: AsyncRead + Unpin,
{
    let packet = timeout(deadline, read_packet(reader))
        .await
        .map_err(|_| ConnectionError::HandshakeTimeout(deadline))??;

    match packet {
        Packet::Hello { name } => Ok(name),
        other => Err(ConnectionError::UnexpectedPacket {
            expected: "hello",
            got: other.kind(),
        }),
    }
}

/// Sends the identity-assigned message, which is always the first server message.
pub async fn send_identity<W>(
    writer: &mut W,
    player_id: PlayerId,
    deadline: Duration,
) -> Result<(), ConnectionError>
where
    W: AsyncWrite + Unpin,
{
    timeout(deadline, write_packet(writer, &Packet::Identity { player_id }))
        .await
        .map_err(|_| ConnectionError::HandshakeTimeout(deadline))??;
    Ok(())
}

type Target = Option<(f32, f32)>;

/// Steady-state driver for one active player.
pub struct Connection {
    player_id: PlayerId,
    world: SharedWorld,
    tick_interval: Duration,
    snapshot_interval: Duration,
}

impl Connection {
    pub fn new(
        player_id: PlayerId,
        world: SharedWorld,
        tick_interval: Duration,
        snapshot_interval: Duration,
    ) -> Self {
        Self {
            player_id,
            world,
            tick_interval,
            snapshot_interval,
        }
    }

    /// Runs until the peer closes, sends something undecodable, or a write fails.
    ///
    /// A clean close by the peer is `Ok`. The caller owns cleanup of the
    /// player in every case.
    pub async fn run<R, W>(self, reader: R, mut writer: W) -> Result<(), ConnectionError>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin,
    {
        let (input_tx, mut input_rx) = watch::channel::<Target>(None);
        let mut reader_task = tokio::spawn(read_inputs(reader, input_tx));

        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_sent: Option<Instant> = None;

        let outcome = loop {
            tokio::select! {
                finished = &mut reader_task => {
                    break match finished {
                        Ok(Err(e)) if e.is_peer_closed() => Ok(()),
                        Ok(result) => result,
                        Err(e) => Err(e.into()),
                    };
                }

                _ = ticker.tick() => {
                    // Only the newest target survives between ticks
                    if input_rx.has_changed().unwrap_or(false) {
                        let target = *input_rx.borrow_and_update();
                        if let Some((x, y)) = target {
                            self.world.move_player(self.player_id, x, y).await;
                        }
                    }

                    self.world.step().await;

                    let due = last_sent.map_or(true, |sent| sent.elapsed() >= self.snapshot_interval);
                    if due {
                        let snapshot = self.world.snapshot().await;
                        if let Err(e) = write_packet(&mut writer, &Packet::StateUpdate(snapshot)).await {
                            break Err(e.into());
                        }
                        last_sent = Some(Instant::now());
                        debug!("Sent state to {}", self.player_id);
                    }
                }
            }
        };

        reader_task.abort();
        outcome
    }
}

async fn read_inputs<R>(mut reader: R, input_tx: watch::Sender<Target>) -> Result<(), ConnectionError>
where
    R: AsyncRead + Unpin,
{
    loop {
        match read_packet(&mut reader).await? {
            Packet::Input { target_x, target_y } => {
                if !target_x.is_finite() || !target_y.is_finite() {
                    return Err(ConnectionError::InvalidTarget {
                        x: target_x,
                        y: target_y,
                    });
                }
                if input_tx.send(Some((target_x, target_y))).is_err() {
                    return Ok(());
                }
            }
            other => {
                warn!("Unexpected {} packet from an active client", other.kind());
                return Err(ConnectionError::UnexpectedPacket {
                    expected: "input",
                    got: other.kind(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::game::World;
    use shared::{encode_packet, Snapshot};
    use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt};
    use tokio_test::io::Builder;

    fn test_world() -> SharedWorld {
        SharedWorld::new(World::new(GameConfig {
            seed: Some(1),
            ..GameConfig::default()
        }))
    }

    #[tokio::test]
    async fn test_read_hello() {
        let frame = encode_packet(&Packet::Hello {
            name: "nibbler".to_string(),
        })
        .unwrap();
        let mut stream = Builder::new().read(&frame).build();

        let name = read_hello(&mut stream, Duration::from_secs(1)).await.unwrap();
        assert_eq!(name, "nibbler");
    }

    #[tokio::test]
    async fn test_read_hello_rejects_other_packets() {
        let frame = encode_packet(&Packet::Input {
            target_x: 1.0,
            target_y: 2.0,
        })
        .unwrap();
        let mut stream = Builder::new().read(&frame).build();

        let err = read_hello(&mut stream, Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(
            err,
            ConnectionError::UnexpectedPacket {
                expected: "hello",
                got: "input"
            }
        ));
    }

    #[tokio::test]
    async fn test_read_hello_times_out() {
        let (_client, mut server) = duplex(64);
        let err = read_hello(&mut server, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectionError::HandshakeTimeout(_)));
    }

    #[tokio::test]
    async fn test_read_hello_peer_closed() {
        let mut stream = Builder::new().build();
        let err = read_hello(&mut stream, Duration::from_secs(1)).await.unwrap_err();
        assert!(err.is_peer_closed());
    }

    #[tokio::test]
    async fn test_send_identity() {
        let expected = encode_packet(&Packet::Identity { player_id: 12 }).unwrap();
        let mut stream = Builder::new().write(&expected).build();

        send_identity(&mut stream, 12, Duration::from_secs(1))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_active_connection_applies_input_and_streams_snapshots() {
        let world = test_world();
        world.add_player(1, "mover".to_string()).await;
        let start = world.read().await.player(1).unwrap().position;

        let (client_side, server_side) = duplex(1 << 20);
        let (server_read, server_write) = tokio::io::split(server_side);
        let (mut client_read, mut client_write) = tokio::io::split(client_side);

        let connection = Connection::new(
            1,
            world.clone(),
            Duration::from_millis(2),
            Duration::from_millis(5),
        );
        let handle = tokio::spawn(connection.run(server_read, server_write));

        // Steer far away from the spawn point
        let target = if start.x > 540.0 { 0.0 } else { 1080.0 };
        let frame = encode_packet(&Packet::Input {
            target_x: target,
            target_y: start.y,
        })
        .unwrap();
        client_write.write_all(&frame).await.unwrap();

        let mut received: Vec<Snapshot> = Vec::new();
        while received.len() < 5 {
            match read_packet(&mut client_read).await.unwrap() {
                Packet::StateUpdate(snapshot) => received.push(snapshot),
                other => panic!("Unexpected packet: {:?}", other),
            }
        }
        assert!(received.iter().all(|s| s.players.contains_key(&1)));

        let moved = world.read().await.player(1).unwrap().position;
        assert_ne!(moved.x, start.x);

        client_write.shutdown().await.unwrap();
        let outcome = handle.await.unwrap();
        assert!(outcome.is_ok());
        drop(client_read);
    }

    #[tokio::test]
    async fn test_active_connection_ends_on_decode_error() {
        let world = test_world();
        world.add_player(1, "garbler".to_string()).await;

        let (client_side, server_side) = duplex(1 << 20);
        let (server_read, server_write) = tokio::io::split(server_side);
        let (_client_read, mut client_write) = tokio::io::split(client_side);

        let connection = Connection::new(
            1,
            world.clone(),
            Duration::from_millis(2),
            Duration::from_millis(5),
        );
        let handle = tokio::spawn(connection.run(server_read, server_write));

        let mut garbage = 4u32.to_be_bytes().to_vec();
        garbage.extend_from_slice(&[0xff, 0xff, 0xff, 0xff]);
        client_write.write_all(&garbage).await.unwrap();

        let outcome = handle.await.unwrap();
        assert!(matches!(
            outcome,
            Err(ConnectionError::Protocol(ProtocolError::Codec(_)))
        ));
    }

    #[tokio::test]
    async fn test_active_connection_ends_on_unexpected_packet() {
        let world = test_world();
        world.add_player(1, "rehello".to_string()).await;

        let (client_side, server_side) = duplex(1 << 20);
        let (server_read, server_write) = tokio::io::split(server_side);
        let (_client_read, mut client_write) = tokio::io::split(client_side);

        let handle = tokio::spawn(
            Connection::new(1, world, Duration::from_millis(2), Duration::from_millis(5))
                .run(server_read, server_write),
        );

        let frame = encode_packet(&Packet::Hello {
            name: "again".to_string(),
        })
        .unwrap();
        client_write.write_all(&frame).await.unwrap();

        let outcome = handle.await.unwrap();
        assert!(matches!(
            outcome,
            Err(ConnectionError::UnexpectedPacket { got: "hello", .. })
        ));
    }

    #[tokio::test]
    async fn test_active_connection_rejects_non_finite_target() {
        let world = test_world();
        world.add_player(1, "nan".to_string()).await;

        let (client_side, server_side) = duplex(1 << 20);
        let (server_read, server_write) = tokio::io::split(server_side);
        let (_client_read, mut client_write) = tokio::io::split(client_side);

        let handle = tokio::spawn(
            Connection::new(1, world.clone(), Duration::from_millis(2), Duration::from_millis(5))
                .run(server_read, server_write),
        );

        let frame = encode_packet(&Packet::Input {
            target_x: f32::NAN,
            target_y: 100.0,
        })
        .unwrap();
        client_write.write_all(&frame).await.unwrap();

        let outcome = handle.await.unwrap();
        assert!(matches!(outcome, Err(ConnectionError::InvalidTarget { .. })));

        let position = world.read().await.player(1).unwrap().position;
        assert!(position.is_finite());
    }

    #[tokio::test]
    async fn test_active_connection_ends_on_write_failure() {
        let world = test_world();
        world.add_player(1, "unreachable".to_string()).await;

        let (mut client_side, server_side) = duplex(64);
        let writer = Builder::new()
            .write_error(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "peer gone"))
            .build();

        let outcome = Connection::new(1, world, Duration::from_millis(2), Duration::from_millis(5))
            .run(server_side, writer)
            .await;
        assert!(matches!(
            outcome,
            Err(ConnectionError::Protocol(ProtocolError::Io(_)))
        ));

        // The input reader owned the other end of the pipe; once it stops we see EOF
        let mut buf = [0u8; 8];
        let read = tokio::time::timeout(Duration::from_secs(1), client_side.read(&mut buf))
            .await
            .expect("input reader kept running");
        assert_eq!(read.unwrap(), 0);
    }
}
