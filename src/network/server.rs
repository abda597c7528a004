//! WebSocket Game Server
//!
//! Async WebSocket server for duel connections. Parses JSON frames into
//! engine commands and delivers the resulting outbox.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex, RwLock, broadcast};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn, error, debug, instrument};

use crate::game::rules::{env_parse, ConfigError};
use crate::game::state::PlayerId;
use crate::network::engine::{Command, DuelEngine, Outbox, Recipient};
use crate::network::protocol::{ClientMessage, ErrorCode, ServerMessage};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Outbound queue length per connection.
    pub channel_capacity: usize,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            max_connections: 1000,
            channel_capacity: 64,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `DUEL_BIND_ADDR`, `DUEL_MAX_CONNECTIONS`
    /// and `DUEL_CHANNEL_CAPACITY`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(addr) = env_parse("DUEL_BIND_ADDR")? {
            config.bind_addr = addr;
        }
        if let Some(max) = env_parse("DUEL_MAX_CONNECTIONS")? {
            config.max_connections = max;
        }
        if let Some(capacity) = env_parse::<usize>("DUEL_CHANNEL_CAPACITY")? {
            // mpsc::channel panics on zero
            config.channel_capacity = capacity.max(1);
        }
        Ok(config)
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Connection limit reached.
    #[error("Connection limit reached")]
    ConnectionLimitReached,
}

/// Outbound channel per connected player.
type Connections = Arc<RwLock<BTreeMap<PlayerId, mpsc::Sender<ServerMessage>>>>;

/// A reserved place under `max_connections`, released on drop.
#[derive(Debug)]
struct ConnectionSlot(Arc<AtomicUsize>);

impl ConnectionSlot {
    /// Take a slot if fewer than `max` are held.
    fn reserve(active: &Arc<AtomicUsize>, max: usize) -> Option<Self> {
        active
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| (n < max).then_some(n + 1))
            .ok()
            .map(|_| ConnectionSlot(active.clone()))
    }
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// The game server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// All duel state, one command at a time.
    engine: Arc<Mutex<DuelEngine>>,
    /// Open connections.
    connections: Connections,
    /// Slots held, counted from accept until the connection task ends.
    active: Arc<AtomicUsize>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new game server around an engine.
    pub fn new(config: ServerConfig, engine: DuelEngine) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            engine: Arc::new(Mutex::new(engine)),
            connections: Arc::new(RwLock::new(BTreeMap::new())),
            active: Arc::new(AtomicUsize::new(0)),
            shutdown_tx,
        }
    }

    /// Run the server until [`shutdown`](Self::shutdown) is called.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("Duel server v{} listening on {}", self.config.version, self.config.bind_addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            match ConnectionSlot::reserve(&self.active, self.config.max_connections) {
                                Some(slot) => {
                                    debug!("New connection from {}", addr);
                                    self.handle_connection(stream, addr, slot);
                                }
                                None => {
                                    warn!("{} for {}", GameServerError::ConnectionLimitReached, addr);
                                    reject_connection(stream, addr);
                                }
                            }
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr, slot: ConnectionSlot) {
        let engine = self.engine.clone();
        let connections = self.connections.clone();
        let capacity = self.config.channel_capacity;
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let _slot = slot;
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("{}", GameServerError::WebSocket(e));
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(capacity);
            let player_id = PlayerId::random();

            connections.write().await.insert(player_id, msg_tx.clone());
            debug!("Connection {} assigned player {}", addr, player_id.short());

            // Spawn message sender task
            let sender_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    let closing = matches!(msg, ServerMessage::Shutdown { .. });
                    if ws_sender.send(Message::Text(text)).await.is_err() || closing {
                        break;
                    }
                }
                let _ = ws_sender.close().await;
            });

            // Handle incoming messages
            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                Self::handle_frame(player_id, &text, &engine, &connections, &msg_tx).await;
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Client {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                warn!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        send(&msg_tx, ServerMessage::Shutdown {
                            reason: "Server shutting down".to_string(),
                        });
                        break;
                    }
                }
            }

            // Cleanup
            connections.write().await.remove(&player_id);
            drop(msg_tx);
            let outbox = engine.lock().await.handle(player_id, Command::Disconnect);
            dispatch(&connections, outbox).await;

            // Lets a queued shutdown notice flush
            let _ = sender_task.await;
            debug!("Client {} cleaned up", addr);
        });
    }

    /// Handle one text frame from a connection.
    async fn handle_frame(
        player_id: PlayerId,
        text: &str,
        engine: &Mutex<DuelEngine>,
        connections: &Connections,
        sender: &mpsc::Sender<ServerMessage>,
    ) {
        let msg = match ClientMessage::from_json(text) {
            Ok(m) => m,
            Err(e) => {
                debug!("Invalid message from {}: {}", player_id.short(), e);
                send(sender, ServerMessage::error(ErrorCode::InvalidInput, "Invalid message format"));
                return;
            }
        };

        let command = match msg {
            ClientMessage::Ping { timestamp } => {
                send(sender, ServerMessage::Pong { timestamp, server_time: server_time_millis() });
                return;
            }
            other => match command_for(other) {
                Some(command) => command,
                None => return,
            },
        };

        // Engine lock is released before delivery
        let outbox = engine.lock().await.handle(player_id, command);
        dispatch(connections, outbox).await;
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Get registered player count.
    pub async fn player_count(&self) -> usize {
        self.engine.lock().await.registry().len()
    }

    /// Get open room count.
    pub async fn room_count(&self) -> usize {
        self.engine.lock().await.rooms().len()
    }

    /// Get matchmaking queue size.
    pub async fn queue_size(&self) -> usize {
        self.engine.lock().await.matchmaker().len()
    }
}

/// Complete the handshake only to send `server_overloaded`, then close.
fn reject_connection(stream: TcpStream, addr: SocketAddr) {
    tokio::spawn(async move {
        let mut ws = match accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                debug!("Rejected handshake from {} failed: {}", addr, e);
                return;
            }
        };
        let reply = ServerMessage::error(ErrorCode::ServerOverloaded, "Server is full");
        match reply.to_json() {
            Ok(text) => {
                if let Err(e) = ws.send(Message::Text(text)).await {
                    debug!("Failed to notify {}: {}", addr, e);
                }
            }
            Err(e) => error!("Failed to serialize message: {}", e),
        }
        let _ = ws.close(None).await;
    });
}

/// Map a parsed client frame to an engine command.
fn command_for(msg: ClientMessage) -> Option<Command> {
    match msg {
        ClientMessage::Join { name } => Some(Command::Join { name }),
        ClientMessage::PlayAgain => Some(Command::PlayAgain),
        ClientMessage::Leave => Some(Command::Leave),
        ClientMessage::Ping { .. } => None,
        action => action.into_action().map(Command::Action),
    }
}

/// Deliver every message in the outbox. Full or closed channels drop.
async fn dispatch(connections: &Connections, outbox: Outbox) {
    if outbox.is_empty() {
        return;
    }

    let connections = connections.read().await;
    for delivery in outbox {
        match delivery.to {
            Recipient::Player(id) => {
                if let Some(tx) = connections.get(&id) {
                    send(tx, delivery.message);
                }
            }
            Recipient::Players(ids) => {
                for id in ids {
                    if let Some(tx) = connections.get(&id) {
                        send(tx, delivery.message.clone());
                    }
                }
            }
            Recipient::Everyone => {
                for tx in connections.values() {
                    send(tx, delivery.message.clone());
                }
            }
        }
    }
}

/// Fire-and-forget send.
fn send(tx: &mpsc::Sender<ServerMessage>, msg: ServerMessage) {
    if let Err(e) = tx.try_send(msg) {
        debug!("Dropped outbound message: {}", e);
    }
}

fn server_time_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::Catalog;
    use crate::game::combat::PlayerAction;
    use crate::game::rules::DuelRules;

    fn test_server() -> GameServer {
        let config = ServerConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            ..Default::default()
        };
        GameServer::new(config, DuelEngine::new(Catalog::standard(), DuelRules::default()))
    }

    async fn connect(server: &GameServer, id: PlayerId) -> mpsc::Receiver<ServerMessage> {
        let (tx, rx) = mpsc::channel(16);
        server.connections.write().await.insert(id, tx);
        rx
    }

    fn drain(rx: &mut mpsc::Receiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.max_connections, 1000);
        assert_eq!(config.channel_capacity, 64);
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[test]
    fn test_server_config_from_env() {
        std::env::set_var("DUEL_BIND_ADDR", "127.0.0.1:9001");
        std::env::set_var("DUEL_MAX_CONNECTIONS", "12");
        std::env::set_var("DUEL_CHANNEL_CAPACITY", "0");
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.bind_addr, SocketAddr::from(([127, 0, 0, 1], 9001)));
        assert_eq!(config.max_connections, 12);
        assert_eq!(config.channel_capacity, 1);

        std::env::set_var("DUEL_MAX_CONNECTIONS", "lots");
        let err = ServerConfig::from_env().unwrap_err();
        assert_eq!(err.var, "DUEL_MAX_CONNECTIONS");

        std::env::remove_var("DUEL_BIND_ADDR");
        std::env::remove_var("DUEL_MAX_CONNECTIONS");
        std::env::remove_var("DUEL_CHANNEL_CAPACITY");
    }

    #[test]
    fn test_connection_slots_cap_and_release() {
        let active = Arc::new(AtomicUsize::new(0));
        let first = ConnectionSlot::reserve(&active, 2).unwrap();
        let _second = ConnectionSlot::reserve(&active, 2).unwrap();
        assert!(ConnectionSlot::reserve(&active, 2).is_none());
        assert_eq!(active.load(Ordering::Acquire), 2);

        drop(first);
        assert_eq!(active.load(Ordering::Acquire), 1);
        assert!(ConnectionSlot::reserve(&active, 2).is_some());
    }

    #[test]
    fn test_zero_limit_rejects_everyone() {
        let active = Arc::new(AtomicUsize::new(0));
        assert!(ConnectionSlot::reserve(&active, 0).is_none());
        assert_eq!(active.load(Ordering::Acquire), 0);
    }

    #[tokio::test]
    async fn test_full_server_replies_overloaded() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accept = tokio::spawn(async move {
            let (stream, peer) = listener.accept().await.unwrap();
            reject_connection(stream, peer);
        });

        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}", addr)).await.unwrap();
        accept.await.unwrap();
        let frame = ws.next().await.unwrap().unwrap();
        let text = frame.into_text().unwrap();
        match ServerMessage::from_json(&text).unwrap() {
            ServerMessage::Error(e) => assert_eq!(e.code, ErrorCode::ServerOverloaded),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_command_mapping() {
        assert_eq!(
            command_for(ClientMessage::Join { name: "Alice".to_string() }),
            Some(Command::Join { name: "Alice".to_string() }),
        );
        assert_eq!(
            command_for(ClientMessage::UseSkill { skill: "heal".to_string() }),
            Some(Command::Action(PlayerAction::UseSkill { skill: "heal".to_string() })),
        );
        assert_eq!(command_for(ClientMessage::Leave), Some(Command::Leave));
        assert_eq!(command_for(ClientMessage::Ping { timestamp: 1 }), None);
    }

    #[tokio::test]
    async fn test_server_creation() {
        let server = test_server();
        assert_eq!(server.connection_count().await, 0);
        assert_eq!(server.player_count().await, 0);
        assert_eq!(server.room_count().await, 0);
        assert_eq!(server.queue_size().await, 0);
    }

    #[tokio::test]
    async fn test_server_shutdown() {
        let server = test_server();
        server.shutdown();
        // Should not panic
    }

    #[tokio::test]
    async fn test_invalid_frame_gets_error() {
        let server = test_server();
        let id = PlayerId::new([1; 16]);
        let mut rx = connect(&server, id).await;
        let tx = server.connections.read().await.get(&id).cloned().unwrap();

        GameServer::handle_frame(id, "{{nope", &server.engine, &server.connections, &tx).await;
        let messages = drain(&mut rx);
        assert_eq!(messages.len(), 1);
        assert!(matches!(
            &messages[0],
            ServerMessage::Error(e) if e.code == ErrorCode::InvalidInput
        ));
    }

    #[tokio::test]
    async fn test_ping_pong() {
        let server = test_server();
        let id = PlayerId::new([1; 16]);
        let mut rx = connect(&server, id).await;
        let tx = server.connections.read().await.get(&id).cloned().unwrap();

        GameServer::handle_frame(id, r#"{"type":"ping","timestamp":77}"#, &server.engine, &server.connections, &tx).await;
        match drain(&mut rx).as_slice() {
            [ServerMessage::Pong { timestamp, server_time }] => {
                assert_eq!(*timestamp, 77);
                assert!(*server_time > 0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_join_pair_and_attack_over_frames() {
        let server = test_server();
        let alice = PlayerId::new([1; 16]);
        let bob = PlayerId::new([2; 16]);
        let mut alice_rx = connect(&server, alice).await;
        let mut bob_rx = connect(&server, bob).await;
        let alice_tx = server.connections.read().await.get(&alice).cloned().unwrap();
        let bob_tx = server.connections.read().await.get(&bob).cloned().unwrap();

        GameServer::handle_frame(alice, r#"{"type":"join","name":"Alice"}"#, &server.engine, &server.connections, &alice_tx).await;
        GameServer::handle_frame(bob, r#"{"type":"join","name":"Bob"}"#, &server.engine, &server.connections, &bob_tx).await;

        let bob_messages = drain(&mut bob_rx);
        assert!(bob_messages.iter().any(|m| matches!(m, ServerMessage::Joined { name, .. } if name == "Bob")));
        assert!(bob_messages.iter().any(|m| matches!(m, ServerMessage::SessionStart(s) if s.current_player == alice)));
        assert_eq!(server.room_count().await, 1);
        drain(&mut alice_rx);

        // Bob is out of turn: silently ignored
        GameServer::handle_frame(bob, r#"{"type":"use_weapon","weapon":"sword"}"#, &server.engine, &server.connections, &bob_tx).await;
        assert!(drain(&mut bob_rx).is_empty());

        GameServer::handle_frame(alice, r#"{"type":"use_skill","skill":"heal"}"#, &server.engine, &server.connections, &alice_tx).await;
        let update = drain(&mut bob_rx);
        assert!(matches!(update.as_slice(), [ServerMessage::State(s)] if s.current_player == bob));
    }

    #[tokio::test]
    async fn test_dispatch_skips_missing_and_full() {
        let server = test_server();
        let id = PlayerId::new([1; 16]);
        let (tx, mut rx) = mpsc::channel(1);
        server.connections.write().await.insert(id, tx);

        let mut outbox = Outbox::new();
        outbox.to_player(PlayerId::new([9; 16]), ServerMessage::Shutdown { reason: "x".to_string() });
        outbox.broadcast(ServerMessage::Shutdown { reason: "a".to_string() });
        outbox.broadcast(ServerMessage::Shutdown { reason: "b".to_string() });
        dispatch(&server.connections, outbox).await;

        let messages = drain(&mut rx);
        assert_eq!(messages, vec![ServerMessage::Shutdown { reason: "a".to_string() }]);
    }
}
