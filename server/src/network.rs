//! Server network layer: UDP transport around a single match owner

use crate::client_manager::ClientManager;
use crate::game::{ConnectOutcome, Game};
use crate::publisher::{Outbound, Target};
use crate::roster::Profile;
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{Packet, PROTOCOL_VERSION};
use std::error::Error;
use std::future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval_at, Interval, MissedTickBehavior};

pub type BoxError = Box<dyn Error + Send + Sync>;

/// Messages sent from network tasks to main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived { packet: Packet, addr: SocketAddr },
    ClientTimeout { client_id: u32 },
    Shutdown,
}

/// Messages sent from the match owner to the sender task
#[derive(Debug)]
pub enum GameMessage {
    SendPacket {
        packet: Packet,
        addr: SocketAddr,
    },
    BroadcastPacket {
        packet: Packet,
    },
}

/// Owns the match and the socket. Every mutation of the `Game` happens on
/// the task running [`Server::run`].
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: Arc<RwLock<ClientManager>>,
    game: Game,
    started_at: Instant,

    // Communication channels
    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(addr: &str, game: Game, max_clients: usize) -> Result<Self, BoxError> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", socket.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: Arc::new(RwLock::new(ClientManager::new(max_clients))),
            game,
            started_at: Instant::now(),
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, BoxError> {
        Ok(self.socket.local_addr()?)
    }

    /// Sender that can inject messages into the main loop, e.g. `Shutdown`.
    pub fn handle(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    /// Spawns task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 4096];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns task that processes outgoing packet queue
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let clients = Arc::clone(&self.clients);
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::SendPacket { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    GameMessage::BroadcastPacket { packet } => {
                        let client_addrs = {
                            let clients_guard = clients.read().await;
                            clients_guard.get_client_addrs()
                        };

                        for (client_id, addr) in client_addrs {
                            if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                                error!("Failed to send to client {}: {}", client_id, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns task that monitors client timeouts
    fn spawn_timeout_checker(&self) {
        let clients = Arc::clone(&self.clients);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let timed_out = {
                    let mut clients_guard = clients.write().await;
                    clients_guard.check_timeouts()
                };

                for client_id in timed_out {
                    if let Err(e) = server_tx.send(ServerMessage::ClientTimeout { client_id }) {
                        error!("Failed to send timeout message: {}", e);
                        return;
                    }
                }
            }
        });
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), BoxError> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::SendPacket { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    fn broadcast_packet(&self, packet: Packet) {
        if let Err(e) = self
            .game_tx
            .send(GameMessage::BroadcastPacket { packet })
        {
            error!("Failed to queue broadcast packet: {}", e);
        }
    }

    /// Milliseconds since the server started; the match clock.
    fn engine_now(&self) -> u64 {
        u64::try_from(self.started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Hands everything the match queued to the sender task. Client targets
    /// are resolved to addresses here so a client removed right after still
    /// gets its last packets.
    async fn flush_outbox(&mut self) {
        let outbound: Vec<Outbound> = self.game.drain_outbox();
        if outbound.is_empty() {
            return;
        }

        let clients = self.clients.read().await;
        for Outbound { target, packet } in outbound {
            match target {
                Target::All => self.broadcast_packet(packet),
                Target::Client(client_id) => match clients.addr_of(client_id) {
                    Some(addr) => self.send_packet(packet, addr),
                    None => debug!("Dropping packet for departed client {}", client_id),
                },
            }
        }
    }

    /// Releases a client from both the connection table and the match.
    async fn drop_client(&mut self, client_id: u32) {
        self.clients.write().await.remove_client(&client_id);
        if let Some(side) = self.game.disconnect(client_id) {
            info!("Side {:?} lost its player", side);
        }
    }

    async fn handle_connect(&mut self, client_version: u32, addr: SocketAddr) {
        info!(
            "Client connecting from {} (version: {})",
            addr, client_version
        );

        if client_version != PROTOCOL_VERSION {
            self.send_packet(
                Packet::Disconnected {
                    reason: "Protocol version mismatch".to_string(),
                },
                addr,
            );
            return;
        }

        // Remove existing connection if present
        let existing_client_id = self.clients.read().await.find_client_by_addr(addr);
        if let Some(existing_id) = existing_client_id {
            info!("Removing existing client {} from {}", existing_id, addr);
            self.drop_client(existing_id).await;
        }

        let client_id = self.clients.write().await.add_client(addr);
        let Some(client_id) = client_id else {
            self.send_packet(
                Packet::Disconnected {
                    reason: "Server full".to_string(),
                },
                addr,
            );
            return;
        };

        self.send_packet(Packet::Connected { client_id }, addr);
        if self.game.connect(client_id) == ConnectOutcome::Full {
            self.flush_outbox().await;
            self.clients.write().await.remove_client(&client_id);
        }
    }

    /// Processes incoming packets and updates the match
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        if let Packet::Connect { client_version } = packet {
            self.handle_connect(client_version, addr).await;
            return;
        }

        let client_id = self.clients.write().await.touch(addr);
        let Some(client_id) = client_id else {
            warn!("Packet from unknown sender {}", addr);
            return;
        };

        let result = match packet {
            Packet::Join {
                name,
                color,
                ability,
                gradient,
                background,
            } => self
                .game
                .join(
                    client_id,
                    Profile {
                        name,
                        color,
                        ability,
                        gradient,
                        background,
                    },
                )
                .map(|side| info!("Client {} joined on {:?}", client_id, side)),
            Packet::Move { direction, fast } => self.game.move_paddle(client_id, direction, fast),
            Packet::UseAbility => self.game.use_ability(client_id),
            Packet::ResetGame => {
                info!("Client {} requested a reset", client_id);
                self.game.reset_game();
                Ok(())
            }
            Packet::Heartbeat => Ok(()),
            Packet::Disconnect => {
                self.drop_client(client_id).await;
                Ok(())
            }
            _ => {
                warn!("Unexpected packet type from client at {}", addr);
                Ok(())
            }
        };

        if let Err(rejection) = result {
            debug!("Ignored request from client {}: {}", client_id, rejection);
        }
    }

    /// Starts or stops the physics and countdown schedules to follow the match.
    fn sync_schedulers(&self, physics: &mut Option<Interval>, countdown: &mut Option<Interval>) {
        if self.game.is_running() {
            if physics.is_none() {
                let period = Duration::from_millis(self.game.config().tick_interval_ms());
                let second = Duration::from_secs(1);
                let now = tokio::time::Instant::now();
                *physics = Some(schedule(now + period, period));
                *countdown = Some(schedule(now + second, second));
                info!(
                    "Match loop running at {} Hz",
                    self.game.config().tick_rate
                );
            }
        } else if physics.is_some() {
            *physics = None;
            *countdown = None;
            info!("Match loop stopped");
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), BoxError> {
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        let mut physics: Option<Interval> = None;
        let mut countdown: Option<Interval> = None;

        info!("Server started successfully");

        loop {
            let deadline = self
                .game
                .next_timer_deadline()
                .map(|ms| self.started_at + Duration::from_millis(ms));

            tokio::select! {
                message = self.server_rx.recv() => {
                    let now = self.engine_now();
                    self.game.advance_to(now);
                    match message {
                        Some(ServerMessage::PacketReceived { packet, addr }) => {
                            self.handle_packet(packet, addr).await;
                        },
                        Some(ServerMessage::ClientTimeout { client_id }) => {
                            info!("Client {} timed out", client_id);
                            if let Some(side) = self.game.disconnect(client_id) {
                                info!("Side {:?} lost its player", side);
                            }
                        },
                        Some(ServerMessage::Shutdown) | None => {
                            info!("Server shutting down");
                            self.flush_outbox().await;
                            break;
                        }
                    }
                },

                _ = next_tick(&mut physics) => {
                    let now = self.engine_now();
                    self.game.advance_to(now);
                    self.game.tick();

                    let tick = self.game.tick_count();
                    if tick % 300 == 0 {
                        debug!(
                            "Tick {}: {} players, {} balls, {} pending timers",
                            tick,
                            self.game.roster().len(),
                            self.game.arena().balls().count(),
                            self.game.pending_timers()
                        );
                    }
                },

                _ = next_tick(&mut countdown) => {
                    let now = self.engine_now();
                    self.game.advance_to(now);
                    self.game.countdown();
                },

                _ = sleep_until(deadline) => {
                    let now = self.engine_now();
                    self.game.advance_to(now);
                },
            }

            self.flush_outbox().await;
            self.sync_schedulers(&mut physics, &mut countdown);
        }

        Ok(())
    }
}

/// Repeating schedule that drops missed ticks instead of bursting to catch up.
fn schedule(start: tokio::time::Instant, period: Duration) -> Interval {
    let mut interval = interval_at(start, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval
}

async fn next_tick(interval: &mut Option<Interval>) {
    match interval {
        Some(interval) => {
            interval.tick().await;
        }
        None => future::pending::<()>().await,
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => future::pending::<()>().await,
    }
}
