use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, Mutex};

use holdem_engine::{BettingMode, TablePhase};

use crate::room::{RoomActor, RoomMsg};

/// Per-room settings, supplied by the lobby on create.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    pub name: String,
    pub mode: BettingMode,
    pub small_blind: u32,
    pub big_blind: u32,
    #[serde(default)]
    pub ante: u32,
    #[serde(default = "default_starting_stack")]
    pub starting_stack: u32,
    #[serde(default = "default_action_time_ms")]
    pub action_time_ms: u64,
}

fn default_starting_stack() -> u32 {
    1000
}

fn default_action_time_ms() -> u64 {
    30_000
}

impl Default for RoomConfig {
    fn default() -> Self {
        RoomConfig {
            name: "table".to_string(),
            mode: BettingMode::NoLimit,
            small_blind: 5,
            big_blind: 10,
            ante: 0,
            starting_stack: default_starting_stack(),
            action_time_ms: default_action_time_ms(),
        }
    }
}

#[derive(Clone)]
pub struct RoomHandle {
    pub tx: mpsc::Sender<RoomMsg>,
}

/// Lobby-facing room description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSummary {
    pub room_id: String,
    pub name: String,
    pub betting_mode: BettingMode,
    pub small_blind: u32,
    pub big_blind: u32,
    pub player_count: usize,
    pub phase: TablePhase,
}

/// Process-wide map of live rooms. The lock guards only the map itself,
/// never any room's work.
#[derive(Default)]
pub struct Registry {
    rooms: Mutex<HashMap<String, RoomHandle>>,
}

impl Registry {
    pub async fn create(self: &Arc<Self>, config: RoomConfig) -> String {
        let room_id = new_room_id();
        let handle = RoomActor::spawn(room_id.clone(), config, Arc::clone(self));
        self.rooms.lock().await.insert(room_id.clone(), handle);
        room_id
    }

    pub async fn lookup(&self, room_id: &str) -> Option<RoomHandle> {
        self.rooms.lock().await.get(room_id).cloned()
    }

    pub async fn remove(&self, room_id: &str) {
        self.rooms.lock().await.remove(room_id);
    }

    /// Ask every room to describe itself for the lobby listing.
    pub async fn list(&self) -> Vec<RoomSummary> {
        let handles: Vec<RoomHandle> = self.rooms.lock().await.values().cloned().collect();
        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            let (reply_tx, reply_rx) = oneshot::channel();
            if handle.tx.send(RoomMsg::Describe { reply: reply_tx }).await.is_err() {
                continue;
            }
            if let Ok(Ok(description)) =
                tokio::time::timeout(Duration::from_secs(1), reply_rx).await
            {
                summaries.push(description.summary);
            }
        }
        summaries
    }
}

fn new_room_id() -> String {
    let id: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    id.to_lowercase()
}
