//! Server network layer: TCP listener, handshake and connection dispatch

use crate::client_manager::ClientManager;
use crate::config::ServerConfig;
use crate::connection::{read_hello, send_identity, Connection, ConnectionError};
use crate::game::{SharedWorld, World};
use log::{error, info, warn};
use shared::ProtocolError;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{watch, RwLock};
use tokio::time::timeout;

/// Accepts players and hands each one to its own connection task
pub struct Server {
    listener: TcpListener,
    world: SharedWorld,
    clients: Arc<RwLock<ClientManager>>,
    config: Arc<ServerConfig>,
}

impl Server {
    /// Binds the listener. Failure here is fatal to the process.
    pub async fn bind(config: ServerConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(&config.bind_addr).await?;
        info!("Server listening on {}", listener.local_addr()?);

        let world = SharedWorld::new(World::new(config.game.clone()));

        Ok(Server {
            listener,
            world,
            clients: Arc::new(RwLock::new(ClientManager::new())),
            config: Arc::new(config),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn world(&self) -> SharedWorld {
        self.world.clone()
    }

    pub fn clients(&self) -> Arc<RwLock<ClientManager>> {
        Arc::clone(&self.clients)
    }

    /// Accept loop. Returns once `shutdown` carries `true` or its sender is gone.
    ///
    /// Each accept waits at most `accept_timeout`, after which the shutdown
    /// flag is checked again and listening resumes.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!("Server started successfully");

        loop {
            if *shutdown.borrow() {
                info!("Shutdown requested, listener stopping");
                break;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        info!("Shutdown handle dropped, listener stopping");
                        break;
                    }
                }

                accepted = timeout(self.config.accept_timeout, self.listener.accept()) => {
                    match accepted {
                        Ok(Ok((stream, addr))) => {
                            info!("New connection from {}", addr);
                            self.spawn_connection(stream, addr);
                        }
                        Ok(Err(e)) => {
                            error!("Error accepting connection: {}", e);
                            tokio::time::sleep(Duration::from_millis(10)).await;
                        }
                        Err(_) => {
                            warn!("Socket accept timed out, continuing...");
                        }
                    }
                }
            }
        }
    }

    fn spawn_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let world = self.world.clone();
        let clients = Arc::clone(&self.clients);
        let config = Arc::clone(&self.config);

        tokio::spawn(async move {
            handle_connection(stream, addr, world, clients, config).await;
        });
    }
}

/// Full lifecycle of one TCP connection
///
/// No identity is allocated until the name arrives. Once the player has
/// been added to the world it is removed again on every exit path.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    world: SharedWorld,
    clients: Arc<RwLock<ClientManager>>,
    config: Arc<ServerConfig>,
) {
    if let Err(e) = stream.set_nodelay(true) {
        warn!("Failed to set TCP_NODELAY for {}: {}", addr, e);
    }
    let (mut reader, mut writer) = stream.into_split();

    let name = match read_hello(&mut reader, config.handshake_timeout).await {
        Ok(name) => name,
        Err(e) => {
            warn!("Error accepting {}: {}", addr, e);
            return;
        }
    };
    info!("Received name from {}: {}", addr, name);

    let player_id = clients.write().await.register(addr, name.clone());
    world.add_player(player_id, name).await;

    let result: Result<(), ConnectionError> = async {
        send_identity(&mut writer, player_id, config.handshake_timeout).await?;
        info!("Starting client handler for {}", player_id);

        Connection::new(
            player_id,
            world.clone(),
            config.tick_interval,
            config.snapshot_interval,
        )
        .run(reader, &mut writer)
        .await
    }
    .await;

    match result {
        Ok(()) => info!("Client {} closed the connection", player_id),
        Err(e @ ConnectionError::Protocol(ProtocolError::Io(_))) => {
            error!("I/O failure for client {} at {}: {}", player_id, addr, e)
        }
        Err(e) => warn!("Client {} at {} terminated: {}", player_id, addr, e),
    }

    world.remove_player(player_id).await;
    clients.write().await.remove_client(&player_id);
    let _ = writer.shutdown().await;
    info!("Client {} disconnected", addr);
}
