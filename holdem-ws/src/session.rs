use std::collections::HashMap;

use axum::extract::ws::Message as WsMessage;
use tokio::sync::mpsc;

use crate::ServerMessage;

pub type ClientTx = mpsc::UnboundedSender<WsMessage>;

/// The live transport endpoint per seat. A dropped endpoint leaves the
/// seat reserved (value `None`) so the player can reconnect mid-hand;
/// only the room frees it when the seat itself is removed.
#[derive(Default)]
pub struct Sessions {
    endpoints: HashMap<String, Option<ClientTx>>,
}

impl Sessions {
    pub fn attach(&mut self, player_id: &str, tx: ClientTx) {
        self.endpoints.insert(player_id.to_string(), Some(tx));
    }

    pub fn mark_disconnected(&mut self, player_id: &str) {
        if let Some(slot) = self.endpoints.get_mut(player_id) {
            *slot = None;
        }
    }

    pub fn remove(&mut self, player_id: &str) {
        self.endpoints.remove(player_id);
    }

    /// Send one message to one seat; a failed send marks the seat disconnected.
    pub fn send(&mut self, player_id: &str, msg: &ServerMessage) {
        let Some(slot) = self.endpoints.get_mut(player_id) else {
            return;
        };
        if let Some(tx) = slot {
            let Ok(text) = serde_json::to_string(msg) else {
                return;
            };
            if tx.send(WsMessage::Text(text)).is_err() {
                *slot = None;
            }
        }
    }

    /// Same message to every connected seat.
    pub fn broadcast(&mut self, msg: &ServerMessage) {
        let ids: Vec<String> = self.endpoints.keys().cloned().collect();
        for id in ids {
            self.send(&id, msg);
        }
    }

    /// Per-viewer message to every connected seat.
    pub fn broadcast_with(&mut self, mut per_viewer: impl FnMut(&str) -> ServerMessage) {
        let ids: Vec<String> = self.endpoints.keys().cloned().collect();
        for id in ids {
            let msg = per_viewer(&id);
            self.send(&id, &msg);
        }
    }
}
