use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info};

use holdem_engine::{ActionOutcome, GameError, HandResult, PlayerAction, Table, TablePhase};

use crate::registry::{Registry, RoomConfig, RoomHandle, RoomSummary};
use crate::session::{ClientTx, Sessions};
use crate::{ChatMessage, ClientMessage, ServerMessage, Snapshot};

pub const MAX_CHAT_LEN: usize = 200;

/// Everything a room can be asked to do, funneled through its inbox.
pub enum RoomMsg {
    Join {
        player_id: String,
        name: String,
        tx: ClientTx,
    },
    Client {
        player_id: String,
        msg: ClientMessage,
    },
    Disconnected {
        player_id: String,
    },
    TimerFired {
        hand_no: u64,
        action_index: u64,
    },
    Describe {
        reply: oneshot::Sender<RoomDescription>,
    },
}

/// Reply to a lobby/state query: summary plus a spectator snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomDescription {
    pub summary: RoomSummary,
    pub state: Snapshot,
}

/// One room: sole owner of its table state. All mutation happens on this
/// task; socket handlers only forward parsed messages into the inbox.
pub struct RoomActor {
    id: String,
    config: RoomConfig,
    rx: mpsc::Receiver<RoomMsg>,
    self_tx: mpsc::Sender<RoomMsg>,
    table: Table,
    sessions: Sessions,
    chat_log: Vec<ChatMessage>,
    last_result: Option<HandResult>,
    deadline: Option<Instant>,
    timer: Option<JoinHandle<()>>,
    /// seats that left mid-hand, removed once the hand completes
    departed: Vec<String>,
    registry: Arc<Registry>,
    /// the empty-room check only applies once someone has been seated
    ever_seated: bool,
    closing: bool,
}

impl RoomActor {
    pub fn spawn(room_id: String, config: RoomConfig, registry: Arc<Registry>) -> RoomHandle {
        let (tx, rx) = mpsc::channel(256);
        let table = Table::new(
            room_id.clone(),
            config.mode,
            config.small_blind,
            config.big_blind,
            config.ante,
        );
        let actor = RoomActor {
            id: room_id,
            config,
            rx,
            self_tx: tx.clone(),
            table,
            sessions: Sessions::default(),
            chat_log: Vec::new(),
            last_result: None,
            deadline: None,
            timer: None,
            departed: Vec::new(),
            registry,
            ever_seated: false,
            closing: false,
        };
        tokio::spawn(actor.run());
        RoomHandle { tx }
    }

    async fn run(mut self) {
        info!(room = %self.id, name = %self.config.name, "room opened");
        while let Some(msg) = self.rx.recv().await {
            match msg {
                RoomMsg::Join { player_id, name, tx } => self.on_join(&player_id, &name, tx),
                RoomMsg::Client { player_id, msg } => self.on_client(&player_id, msg),
                RoomMsg::Disconnected { player_id } => {
                    self.sessions.mark_disconnected(&player_id);
                }
                RoomMsg::TimerFired {
                    hand_no,
                    action_index,
                } => self.on_timer(hand_no, action_index),
                RoomMsg::Describe { reply } => {
                    let _ = reply.send(self.describe());
                }
            }
            if self.closing || (self.ever_seated && self.table.players.is_empty()) {
                break;
            }
        }
        self.shutdown().await;
    }

    fn on_join(&mut self, player_id: &str, name: &str, tx: ClientTx) {
        if self.table.seat_of(player_id).is_some() {
            // same player back on a fresh stream: replace the endpoint and
            // bring them up to date immediately
            self.sessions.attach(player_id, tx);
            self.system_chat(format!("{} reconnected", name));
            self.send_snapshot_to(player_id);
            return;
        }

        match self
            .table
            .add_player(player_id, name, self.config.starting_stack)
        {
            Ok(_) => {
                info!(room = %self.id, player = %player_id, "player seated");
                self.ever_seated = true;
                self.sessions.attach(player_id, tx);
                self.system_chat(format!("{} joined the table", name));
                self.broadcast_state();
            }
            Err(e) => {
                let reply = ServerMessage::Error {
                    code: e.code().to_string(),
                    message: e.to_string(),
                };
                if let Ok(text) = serde_json::to_string(&reply) {
                    let _ = tx.send(axum::extract::ws::Message::Text(text));
                }
            }
        }
    }

    fn on_client(&mut self, player_id: &str, msg: ClientMessage) {
        if let Some(action) = msg.as_player_action() {
            self.on_action(player_id, action);
            return;
        }
        match msg {
            ClientMessage::StartGame => self.on_start_game(player_id),
            ClientMessage::Chat { content } => self.on_chat(player_id, content),
            ClientMessage::Leave => self.on_leave(player_id),
            _ => {}
        }
    }

    fn on_start_game(&mut self, player_id: &str) {
        if !self.table.is_owner(player_id) {
            self.reply_error(player_id, &GameError::NotOwner);
            return;
        }
        match self.table.start_hand() {
            Ok(None) => {
                info!(room = %self.id, hand = self.table.hands_dealt, "hand started");
                self.last_result = None;
                self.arm_timer();
                self.broadcast_state();
            }
            Ok(Some(result)) => {
                // blinds put everyone all-in and the board ran out at once
                info!(room = %self.id, hand = self.table.hands_dealt, "hand started");
                self.last_result = None;
                self.finish_hand(result);
            }
            Err(e) => self.on_engine_error(player_id, e),
        }
    }

    fn on_action(&mut self, player_id: &str, action: PlayerAction) {
        match self.table.handle_action(player_id, action) {
            Ok(outcome) => {
                self.cancel_timer();
                self.on_outcome(outcome);
            }
            Err(e) => self.on_engine_error(player_id, e),
        }
    }

    fn on_outcome(&mut self, outcome: ActionOutcome) {
        match outcome {
            ActionOutcome::Continue | ActionOutcome::StreetAdvanced => {
                self.arm_timer();
                self.broadcast_state();
            }
            ActionOutcome::HandComplete(result) => self.finish_hand(result),
        }
    }

    fn finish_hand(&mut self, result: HandResult) {
        self.cancel_timer();
        for winner in &result.winners {
            let note = match &winner.hand_name {
                Some(hand_name) => {
                    format!("{} wins {} with {}", winner.name, winner.amount, hand_name)
                }
                None => format!("{} wins {} uncontested", winner.name, winner.amount),
            };
            self.system_chat(note);
        }
        self.last_result = Some(result);
        for player_id in std::mem::take(&mut self.departed) {
            let _ = self.table.remove_player(&player_id);
            self.sessions.remove(&player_id);
        }
        self.broadcast_state();
    }

    fn on_chat(&mut self, player_id: &str, content: String) {
        if content.is_empty() || content.chars().count() > MAX_CHAT_LEN {
            self.reply_error(player_id, &GameError::InvalidAction);
            return;
        }
        let Some(idx) = self.table.seat_of(player_id) else {
            return;
        };
        let entry = ChatMessage {
            player_name: self.table.players[idx].name.clone(),
            content,
            msg_type: "player".to_string(),
            timestamp: unix_now(),
        };
        self.chat_log.push(entry.clone());
        self.sessions.broadcast(&ServerMessage::Chat { data: entry });
    }

    fn on_leave(&mut self, player_id: &str) {
        let Some(idx) = self.table.seat_of(player_id) else {
            return;
        };
        let name = self.table.players[idx].name.clone();
        let is_owner = self.table.is_owner(player_id);

        if self.table.phase == TablePhase::InHand {
            self.departed.push(player_id.to_string());
            match self.table.fold_out(player_id) {
                Ok(Some(outcome)) => {
                    self.cancel_timer();
                    self.on_outcome(outcome);
                }
                Ok(None) => self.broadcast_state(),
                Err(e) if e.is_fatal() => {
                    self.fatal(e);
                    return;
                }
                Err(_) => {}
            }
        } else {
            let _ = self.table.remove_player(player_id);
            self.sessions.remove(player_id);
            self.broadcast_state();
        }

        self.system_chat(format!("{} left the table", name));
        if is_owner {
            self.closing = true;
        }
    }

    fn on_timer(&mut self, hand_no: u64, action_index: u64) {
        // a fire for a superseded turn is a no-op
        let current = self
            .table
            .hand
            .as_ref()
            .map(|h| (self.table.hands_dealt, h.action_index));
        if current != Some((hand_no, action_index)) {
            return;
        }
        let Some(hand) = self.table.hand.as_ref() else {
            return;
        };
        let idx = hand.acting_idx;
        let player_id = self.table.players[idx].id.clone();
        let action = if self.table.bounds_for(idx).can_check {
            PlayerAction::Check
        } else {
            PlayerAction::Fold
        };
        info!(room = %self.id, player = %player_id, "action timer expired");
        match self.table.handle_action(&player_id, action) {
            Ok(outcome) => {
                self.cancel_timer();
                self.on_outcome(outcome);
            }
            Err(e) if e.is_fatal() => self.fatal(e),
            Err(_) => {}
        }
    }

    fn on_engine_error(&mut self, player_id: &str, e: GameError) {
        if e.is_fatal() {
            self.fatal(e);
        } else {
            // only the offender hears about it; nothing changed, nothing to broadcast
            self.reply_error(player_id, &e);
        }
    }

    /// Internal invariants no longer hold: refund the hand and close the room.
    fn fatal(&mut self, e: GameError) {
        error!(room = %self.id, error = %e, "invariant violated, refunding hand");
        self.cancel_timer();
        self.table.abort_hand();
        self.sessions.broadcast(&ServerMessage::RoomError {
            message: e.to_string(),
        });
        self.closing = true;
    }

    fn arm_timer(&mut self) {
        self.cancel_timer();
        let Some(hand) = self.table.hand.as_ref() else {
            return;
        };
        if !self.table.players[hand.acting_idx].can_act() {
            return;
        }
        let wait = Duration::from_millis(self.config.action_time_ms);
        let hand_no = self.table.hands_dealt;
        let action_index = hand.action_index;
        self.deadline = Some(Instant::now() + wait);
        let tx = self.self_tx.clone();
        self.timer = Some(tokio::spawn(async move {
            sleep(wait).await;
            let _ = tx
                .send(RoomMsg::TimerFired {
                    hand_no,
                    action_index,
                })
                .await;
        }));
    }

    fn cancel_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.deadline = None;
    }

    fn remaining_secs(&self) -> Option<u64> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()).as_secs())
    }

    fn broadcast_state(&mut self) {
        let table = &self.table;
        let remaining = self
            .deadline
            .map(|d| d.saturating_duration_since(Instant::now()).as_secs());
        let last_result = self.last_result.as_ref();
        self.sessions.broadcast_with(|viewer| ServerMessage::GameState {
            data: Snapshot::build(table, Some(viewer), remaining, last_result),
        });
    }

    fn send_snapshot_to(&mut self, player_id: &str) {
        let snapshot = Snapshot::build(
            &self.table,
            Some(player_id),
            self.remaining_secs(),
            self.last_result.as_ref(),
        );
        self.sessions
            .send(player_id, &ServerMessage::GameState { data: snapshot });
    }

    fn reply_error(&mut self, player_id: &str, e: &GameError) {
        self.sessions.send(
            player_id,
            &ServerMessage::Error {
                code: e.code().to_string(),
                message: e.to_string(),
            },
        );
    }

    fn system_chat(&mut self, content: String) {
        let entry = ChatMessage {
            player_name: "system".to_string(),
            content,
            msg_type: "system".to_string(),
            timestamp: unix_now(),
        };
        self.chat_log.push(entry.clone());
        self.sessions.broadcast(&ServerMessage::Chat { data: entry });
    }

    fn describe(&self) -> RoomDescription {
        RoomDescription {
            summary: RoomSummary {
                room_id: self.id.clone(),
                name: self.config.name.clone(),
                betting_mode: self.table.mode,
                small_blind: self.table.small_blind,
                big_blind: self.table.big_blind,
                player_count: self.table.players.len(),
                phase: self.table.phase,
            },
            state: Snapshot::build(
                &self.table,
                None,
                self.remaining_secs(),
                self.last_result.as_ref(),
            ),
        }
    }

    async fn shutdown(mut self) {
        self.cancel_timer();
        self.sessions.broadcast(&ServerMessage::RoomClosed);
        self.rx.close();
        // drain: anything still queued is answered with room-closed
        while let Ok(msg) = self.rx.try_recv() {
            if let RoomMsg::Join { tx, .. } = msg {
                if let Ok(text) = serde_json::to_string(&ServerMessage::RoomClosed) {
                    let _ = tx.send(axum::extract::ws::Message::Text(text));
                }
            }
        }
        self.registry.remove(&self.id).await;
        info!(room = %self.id, "room closed");
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
