//! Duel Engine
//!
//! The boundary between the transport and the game. Each inbound
//! `(PlayerId, Command)` produces an [`Outbox`] of addressed
//! [`ServerMessage`]s. The engine is synchronous and owns all state, so
//! the transport only has to serialize calls into it.
//!
//! Rejected actions never change state and never produce messages.

use tracing::{debug, info};

use crate::game::catalog::Catalog;
use crate::game::combat::{ActionError, CombatResolver, PlayerAction};
use crate::game::rewards::RewardCalculator;
use crate::game::rules::{DisconnectPolicy, DuelRules};
use crate::game::state::{PlayerId, RoomId};
use crate::game::turn::{TurnOutcome, TurnScheduler};
use crate::network::matchmaking::Matchmaker;
use crate::network::protocol::{NotificationLevel, ServerMessage};
use crate::network::registry::PlayerRegistry;
use crate::network::session::RoomManager;

// =============================================================================
// COMMANDS AND DELIVERIES
// =============================================================================

/// Inbound command from one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Register and enter matchmaking.
    Join {
        /// Display name.
        name: String,
    },
    /// A duel action.
    Action(PlayerAction),
    /// Re-enter matchmaking after a duel.
    PlayAgain,
    /// Leave the matchmaking queue.
    Leave,
    /// Connection closed.
    Disconnect,
}

/// Who a message is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// One player.
    Player(PlayerId),
    /// A fixed set of players.
    Players(Vec<PlayerId>),
    /// Every open connection.
    Everyone,
}

impl Recipient {
    /// Does this recipient include `player_id`?
    pub fn includes(&self, player_id: &PlayerId) -> bool {
        match self {
            Recipient::Player(id) => id == player_id,
            Recipient::Players(ids) => ids.contains(player_id),
            Recipient::Everyone => true,
        }
    }
}

/// One addressed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Recipient.
    pub to: Recipient,
    /// Message.
    pub message: ServerMessage,
}

/// Messages produced by one command, in send order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outbox {
    deliveries: Vec<Delivery>,
}

impl Outbox {
    /// Create an empty outbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a message.
    pub fn push(&mut self, to: Recipient, message: ServerMessage) {
        self.deliveries.push(Delivery { to, message });
    }

    /// Queue a message for one player.
    pub fn to_player(&mut self, player_id: PlayerId, message: ServerMessage) {
        self.push(Recipient::Player(player_id), message);
    }

    /// Queue a message for every connection.
    pub fn broadcast(&mut self, message: ServerMessage) {
        self.push(Recipient::Everyone, message);
    }

    /// Append another outbox.
    pub fn extend(&mut self, other: Outbox) {
        self.deliveries.extend(other.deliveries);
    }

    /// Messages `player_id` would receive, in order.
    pub fn messages_for(&self, player_id: &PlayerId) -> Vec<&ServerMessage> {
        self.deliveries
            .iter()
            .filter(|d| d.to.includes(player_id))
            .map(|d| &d.message)
            .collect()
    }

    /// Iterate deliveries.
    pub fn iter(&self) -> impl Iterator<Item = &Delivery> {
        self.deliveries.iter()
    }

    /// Number of deliveries.
    pub fn len(&self) -> usize {
        self.deliveries.len()
    }

    /// True if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.deliveries.is_empty()
    }
}

impl IntoIterator for Outbox {
    type Item = Delivery;
    type IntoIter = std::vec::IntoIter<Delivery>;

    fn into_iter(self) -> Self::IntoIter {
        self.deliveries.into_iter()
    }
}

// =============================================================================
// ENGINE
// =============================================================================

/// Authoritative duel state for a whole server.
pub struct DuelEngine {
    catalog: Catalog,
    rules: DuelRules,
    registry: PlayerRegistry,
    matchmaker: Matchmaker,
    rooms: RoomManager,
    rewards: RewardCalculator,
    scheduler: TurnScheduler,
}

impl DuelEngine {
    /// Create an engine with no players.
    pub fn new(catalog: Catalog, rules: DuelRules) -> Self {
        Self {
            registry: PlayerRegistry::new(&rules),
            matchmaker: Matchmaker::new(),
            rooms: RoomManager::new(rules.seed),
            rewards: RewardCalculator::from_rules(&rules),
            scheduler: TurnScheduler::from_rules(&rules),
            catalog,
            rules,
        }
    }

    /// Process one command. Rejected actions yield an empty outbox.
    pub fn handle(&mut self, player_id: PlayerId, command: Command) -> Outbox {
        match command {
            Command::Join { name } => self.join(player_id, name),
            Command::Action(action) => match self.act(player_id, action) {
                Ok(outbox) => outbox,
                Err(e) => {
                    debug!(
                        "Rejected action from {}: {} ({:?})",
                        player_id.short(), e, e.kind(),
                    );
                    Outbox::new()
                }
            },
            Command::PlayAgain => self.play_again(player_id),
            Command::Leave => self.leave(player_id),
            Command::Disconnect => self.disconnect(player_id),
        }
    }

    /// Register a player, announce them, and try to pair them.
    pub fn join(&mut self, player_id: PlayerId, name: String) -> Outbox {
        let mut outbox = Outbox::new();

        let player = self.registry.create(player_id, name);
        let in_session = player.in_session;
        info!("Player {} joined as {}", player_id.short(), player.name);

        outbox.to_player(player_id, ServerMessage::Joined {
            player_id,
            name: player.name.clone(),
        });
        outbox.broadcast(self.roster_message());

        if !in_session {
            self.matchmaker.enqueue(player_id);
            self.run_matchmaking(&mut outbox);
        }
        outbox
    }

    /// Put a player who is not in a duel back in the queue.
    pub fn play_again(&mut self, player_id: PlayerId) -> Outbox {
        let mut outbox = Outbox::new();
        match self.registry.get(&player_id) {
            Some(player) if !player.in_session => {
                self.matchmaker.enqueue(player_id);
                self.run_matchmaking(&mut outbox);
            }
            _ => {}
        }
        outbox
    }

    /// Leave the matchmaking queue. Ignored during a duel.
    pub fn leave(&mut self, player_id: PlayerId) -> Outbox {
        let mut outbox = Outbox::new();
        if self.matchmaker.remove(&player_id) {
            debug!("Player {} left the queue", player_id.short());
            outbox.broadcast(self.roster_message());
        }
        outbox
    }

    /// Validate and resolve one action.
    pub fn act(&mut self, player_id: PlayerId, action: PlayerAction) -> Result<Outbox, ActionError> {
        let player = self.registry.get(&player_id).ok_or(ActionError::UnknownPlayer)?;
        let (in_session, room_id) = (player.in_session, player.room_id);

        let room_id = match room_id {
            Some(room_id) if in_session => room_id,
            _ => return self.lobby_action(player_id, action),
        };

        let mut outbox = Outbox::new();

        let room = self.rooms.get_mut(&room_id).ok_or(ActionError::NotInSession)?;
        if !room.is_active() {
            return Err(ActionError::RoomInactive);
        }
        if room.current != player_id {
            return Err(ActionError::NotYourTurn);
        }
        let opponent_id = room.opponent_of(&player_id).ok_or(ActionError::NotInSession)?;
        let (actor, opponent) = self.registry
            .pair_mut(&player_id, &opponent_id)
            .ok_or(ActionError::UnknownPlayer)?;

        let resolver = CombatResolver::new(&self.catalog);
        let outcome = match action {
            PlayerAction::UseWeapon { weapon } => {
                resolver.use_weapon(actor, opponent, &weapon, &mut room.rng)?
            }
            PlayerAction::UseSkill { skill } => {
                resolver.use_skill(actor, opponent, &skill, &mut room.rng)?
            }
            PlayerAction::BuyItem { item, price } => {
                let outcome = resolver.buy_item(actor, &item, price)?;
                outbox.to_player(player_id, purchase_notice(&outcome.log));
                outcome
            }
            PlayerAction::UseItem { item } => resolver.use_item(actor, &item)?,
        };

        let mut log = outcome.log;
        let turn = self.scheduler.advance(room, actor, opponent, &mut log);
        debug!("Room {} turn {}: {}", room_id.short(), room.turn_count, log);

        match turn {
            TurnOutcome::Continue { .. } => {
                let members = room.members.to_vec();
                if let Some(update) = self.rooms.snapshot(&room_id, &self.registry, log, outcome.summary) {
                    outbox.push(Recipient::Players(members), ServerMessage::State(update));
                }
            }
            TurnOutcome::Ended { winner } => {
                self.finish_room(&room_id, winner, None, &mut outbox);
            }
        }

        Ok(outbox)
    }

    /// Shop purchases are the only action allowed outside a duel.
    fn lobby_action(&mut self, player_id: PlayerId, action: PlayerAction) -> Result<Outbox, ActionError> {
        let PlayerAction::BuyItem { item, price } = action else {
            return Err(ActionError::NotInSession);
        };

        let buyer = self.registry.get_mut(&player_id).ok_or(ActionError::UnknownPlayer)?;
        let outcome = CombatResolver::new(&self.catalog).buy_item(buyer, &item, price)?;
        debug!("Lobby purchase: {}", outcome.log);

        let mut outbox = Outbox::new();
        outbox.to_player(player_id, purchase_notice(&outcome.log));
        Ok(outbox)
    }

    /// A connection closed: end its duel, then forget the player.
    pub fn disconnect(&mut self, player_id: PlayerId) -> Outbox {
        let mut outbox = Outbox::new();
        let Some(player) = self.registry.get(&player_id) else {
            return outbox;
        };
        let room_id = player.room_id.filter(|_| player.in_session);

        self.matchmaker.remove(&player_id);

        if let Some(room_id) = room_id {
            let remaining = self.rooms.get(&room_id).and_then(|r| r.opponent_of(&player_id));
            let winner = match self.rules.disconnect_policy {
                DisconnectPolicy::Draw => None,
                DisconnectPolicy::Forfeit => remaining,
            };
            self.finish_room(&room_id, winner, Some(player_id), &mut outbox);
        }

        if let Some(player) = self.registry.remove(&player_id) {
            info!("Player {} ({}) disconnected", player_id.short(), player.name);
        }
        outbox.broadcast(self.roster_message());
        outbox
    }

    /// End a room and queue each remaining member's result.
    fn finish_room(
        &mut self,
        room_id: &RoomId,
        winner: Option<PlayerId>,
        leaver: Option<PlayerId>,
        outbox: &mut Outbox,
    ) {
        let Some(results) = self.rooms.end_room(room_id, winner, &mut self.registry, &self.rewards) else {
            return;
        };
        for (member, end) in results {
            if Some(member) != leaver {
                outbox.to_player(member, ServerMessage::SessionEnd(end));
            }
        }
        if leaver.is_none() {
            outbox.broadcast(self.roster_message());
        }
    }

    /// Pair waiting players until fewer than two remain.
    fn run_matchmaking(&mut self, outbox: &mut Outbox) {
        let mut started = false;
        while let Some((first, second)) = self.matchmaker.next_pair() {
            if let Some(start) = self.rooms.create_room(first, second, &mut self.registry) {
                outbox.push(Recipient::Players(vec![first, second]), ServerMessage::SessionStart(start));
                started = true;
            }
        }
        if started {
            outbox.broadcast(self.roster_message());
        }
    }

    fn roster_message(&self) -> ServerMessage {
        ServerMessage::Roster { players: self.registry.roster() }
    }

    /// Catalog in use.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Rules in use.
    pub fn rules(&self) -> &DuelRules {
        &self.rules
    }

    /// Registered players.
    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    /// Waiting players.
    pub fn matchmaker(&self) -> &Matchmaker {
        &self.matchmaker
    }

    /// Open rooms.
    pub fn rooms(&self) -> &RoomManager {
        &self.rooms
    }
}

fn purchase_notice(log: &str) -> ServerMessage {
    ServerMessage::notify(NotificationLevel::Success, log)
}
