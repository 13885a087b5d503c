use crate::game::ClientGameState;
use crate::input::InputManager;
use log::{debug, info, warn};
use shared::{read_packet, write_packet, Packet, PlayerId, ProtocolError, Snapshot, DEFAULT_PORT};
use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinError;
use tokio::time::{interval, timeout, Instant, MissedTickBehavior};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("failed to reach server: {0}")]
    Connect(#[from] io::Error),
    #[error("no identity received within {0:?}")]
    IdentityTimeout(Duration),
    #[error("expected {expected} packet, got {got}")]
    UnexpectedPacket {
        expected: &'static str,
        got: &'static str,
    },
    #[error("snapshot reader stopped: {0}")]
    Reader(#[from] JoinError),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_addr: String,
    pub name: String,
    /// Time between input messages
    pub input_interval: Duration,
    pub leaderboard_interval: Duration,
    pub identity_timeout: Duration,
    /// A finished match is only reported once we have been connected this long
    pub end_grace: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_addr: format!("127.0.0.1:{}", DEFAULT_PORT),
            name: "bot".to_string(),
            input_interval: Duration::from_secs_f64(1.0 / 60.0),
            leaderboard_interval: Duration::from_secs(5),
            identity_timeout: Duration::from_secs(5),
            end_grace: Duration::from_secs(5),
        }
    }
}

/// What the client saw by the time the match ended
#[derive(Debug, Clone)]
pub struct GameSummary {
    pub player_id: PlayerId,
    pub winner_line: String,
    pub final_snapshot: Option<Snapshot>,
    pub updates_received: u64,
    pub inputs_sent: u64,
}

/// A headless player that has completed the handshake
pub struct Client<R, W> {
    reader: R,
    writer: W,
    player_id: PlayerId,
    config: ClientConfig,
    connected_at: Instant,
}

impl Client<OwnedReadHalf, OwnedWriteHalf> {
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        info!("Connecting to {}...", config.server_addr);
        let stream = TcpStream::connect(&config.server_addr).await?;
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }

        let (reader, writer) = stream.into_split();
        Self::handshake(reader, writer, config).await
    }
}

impl<R, W> Client<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin,
{
    /// Announces our name and waits for the identity the server assigns
    pub async fn handshake(mut reader: R, mut writer: W, config: ClientConfig) -> Result<Self, ClientError> {
        write_packet(
            &mut writer,
            &Packet::Hello {
                name: config.name.clone(),
            },
        )
        .await?;

        let packet = timeout(config.identity_timeout, read_packet(&mut reader))
            .await
            .map_err(|_| ClientError::IdentityTimeout(config.identity_timeout))??;

        let player_id = match packet {
            Packet::Identity { player_id } => player_id,
            other => {
                return Err(ClientError::UnexpectedPacket {
                    expected: "identity-assigned",
                    got: other.kind(),
                })
            }
        };
        info!("Connected! Player ID: {}", player_id);

        Ok(Client {
            reader,
            writer,
            player_id,
            config,
            connected_at: Instant::now(),
        })
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    /// Plays until the match ends. Losing the stream before that is an error.
    pub async fn run(self) -> Result<GameSummary, ClientError> {
        let Client {
            reader,
            mut writer,
            player_id,
            config,
            connected_at,
        } = self;

        let (snapshot_tx, mut snapshot_rx) = watch::channel::<Option<Snapshot>>(None);
        let mut reader_task = tokio::spawn(read_snapshots(reader, snapshot_tx));

        let mut game_state = ClientGameState::new(player_id);
        let mut input_manager = InputManager::new(player_id);

        let mut input_ticker = interval(config.input_interval);
        input_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut leaderboard_ticker = interval(config.leaderboard_interval);
        leaderboard_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let outcome: Result<(), ClientError> = loop {
            tokio::select! {
                biased;

                Ok(()) = snapshot_rx.changed() => {
                    let latest = snapshot_rx.borrow_and_update().clone();
                    if let Some(snapshot) = latest {
                        game_state.apply_snapshot(snapshot);
                    }
                    if game_state.is_over() && connected_at.elapsed() >= config.end_grace {
                        info!("Game over!");
                        break Ok(());
                    }
                }

                finished = &mut reader_task => {
                    break Err(match finished {
                        Ok(Err(e)) => e,
                        Ok(Ok(())) => ProtocolError::ConnectionClosed.into(),
                        Err(e) => e.into(),
                    });
                }

                _ = input_ticker.tick() => {
                    let Some(snapshot) = game_state.latest() else { continue };
                    if let Some((target_x, target_y)) = input_manager.next_target(snapshot) {
                        if let Err(e) = write_packet(&mut writer, &Packet::Input { target_x, target_y }).await {
                            break Err(e.into());
                        }
                        debug!("Sent input ({:.1}, {:.1})", target_x, target_y);
                    }
                }

                _ = leaderboard_ticker.tick() => {
                    let lines = game_state.leaderboard_lines();
                    if !lines.is_empty() {
                        info!(
                            "Leaderboard ({}s left):\n{}",
                            game_state.time_left().unwrap_or_default(),
                            lines.join("\n")
                        );
                    }
                    if let Some(me) = game_state.own() {
                        info!("Our blob: size {:.1}, score {}", me.size, me.score);
                    }
                }
            }
        };

        reader_task.abort();
        let _ = writer.shutdown().await;
        outcome?;

        let winner_line = game_state.winner_line();
        info!("{}", winner_line);

        Ok(GameSummary {
            player_id,
            winner_line,
            final_snapshot: game_state.latest().cloned(),
            updates_received: game_state.updates_received(),
            inputs_sent: input_manager.inputs_sent(),
        })
    }
}

async fn read_snapshots<R>(mut reader: R, snapshot_tx: watch::Sender<Option<Snapshot>>) -> Result<(), ClientError>
where
    R: AsyncRead + Unpin,
{
    loop {
        match read_packet(&mut reader).await? {
            Packet::StateUpdate(snapshot) => {
                if snapshot_tx.send(Some(snapshot)).is_err() {
                    return Ok(());
                }
            }
            other => {
                return Err(ClientError::UnexpectedPacket {
                    expected: "state-update",
                    got: other.kind(),
                })
            }
        }
    }
}
