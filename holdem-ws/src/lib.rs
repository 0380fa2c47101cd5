use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use holdem_engine::{
    ActionRecord, BettingMode, Card, GameStage, HandResult, PlayerAction, Table, WinnerInfo,
};

pub mod registry;
pub mod room;
pub mod session;

/// One frame from a client. The `action` tag mirrors the buttons on the table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientMessage {
    StartGame,
    Fold,
    Check,
    Call,
    Bet { amount: u32 },
    Raise { amount: u32 },
    AllIn,
    Chat { content: String },
    Leave,
}

impl ClientMessage {
    /// Betting messages map straight onto engine actions; the rest are room commands.
    pub fn as_player_action(&self) -> Option<PlayerAction> {
        match self {
            ClientMessage::Fold => Some(PlayerAction::Fold),
            ClientMessage::Check => Some(PlayerAction::Check),
            ClientMessage::Call => Some(PlayerAction::Call),
            ClientMessage::Bet { amount } => Some(PlayerAction::Bet(*amount)),
            ClientMessage::Raise { amount } => Some(PlayerAction::Raise(*amount)),
            ClientMessage::AllIn => Some(PlayerAction::AllIn),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub player_name: String,
    pub content: String,
    /// "player" or "system"
    pub msg_type: String,
    pub timestamp: u64,
}

/// One frame to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    GameState { data: Snapshot },
    Chat { data: ChatMessage },
    Error { code: String, message: String },
    RoomError { message: String },
    RoomClosed,
}

/// A card as the client renders it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardFace {
    pub rank: String,
    pub suit: String,
    pub color: String,
}

impl From<Card> for CardFace {
    fn from(card: Card) -> Self {
        CardFace {
            rank: card.rank.to_string(),
            suit: card.suit.to_string(),
            color: card.suit.color().to_string(),
        }
    }
}

/// A hole card in a snapshot: face up for the viewer (and at showdown),
/// a hidden marker for everyone else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CardView {
    Face(CardFace),
    Hidden { hidden: bool },
}

impl CardView {
    fn face(card: Card) -> Self {
        CardView::Face(card.into())
    }

    fn hidden() -> Self {
        CardView::Hidden { hidden: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub name: String,
    pub chips: u32,
    pub current_bet: u32,
    pub is_dealer: bool,
    pub is_sb: bool,
    pub is_bb: bool,
    pub is_self: bool,
    pub is_current: bool,
    pub folded: bool,
    pub all_in: bool,
    pub hand: Vec<CardView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinnerView {
    pub name: String,
    pub amount: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand_name: Option<String>,
}

impl From<&WinnerInfo> for WinnerView {
    fn from(info: &WinnerInfo) -> Self {
        WinnerView {
            name: info.name.clone(),
            amount: info.amount,
            hand_name: info.hand_name.clone(),
        }
    }
}

/// A complete, per-viewer description of room state, broadcast after
/// every accepted action or stage change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub stage: Option<GameStage>,
    pub community_cards: Vec<CardFace>,
    pub main_pot: u32,
    pub side_pots: Vec<u32>,
    pub small_blind: u32,
    pub big_blind: u32,
    pub ante: u32,
    pub betting_mode: BettingMode,
    pub players: Vec<PlayerView>,
    pub is_my_turn: bool,
    pub to_call: u32,
    pub min_raise: u32,
    pub max_raise: u32,
    pub can_raise: bool,
    pub has_bet_this_round: bool,
    pub remaining_time: Option<u64>,
    pub action_history: Vec<ActionRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winners: Option<Vec<WinnerView>>,
    pub is_room_owner: bool,
    pub can_start: bool,
}

impl Snapshot {
    /// Derive one viewer's variant of the table state. `viewer` of `None`
    /// produces the spectator view with every hole card hidden.
    pub fn build(
        table: &Table,
        viewer: Option<&str>,
        remaining_time: Option<u64>,
        last_result: Option<&HandResult>,
    ) -> Snapshot {
        let viewer_idx = viewer.and_then(|id| table.seat_of(id));
        let hand = table.hand.as_ref();
        // the previous hand's result is only shown between hands
        let result = if hand.is_none() { last_result } else { None };

        let pots = table.pots();
        let main_pot = pots.first().map(|p| p.amount).unwrap_or(0);
        let side_pots: Vec<u32> = pots.iter().skip(1).map(|p| p.amount).collect();

        let acting = hand.map(|h| h.acting_idx);
        let revealed: HashMap<usize, (Card, Card)> = result
            .map(|r| r.revealed.iter().copied().collect())
            .unwrap_or_default();

        let players = table
            .players
            .iter()
            .enumerate()
            .map(|(idx, p)| {
                let is_self = viewer_idx == Some(idx);
                let hand_cards = if let Some((a, b)) = p.cards {
                    if is_self {
                        vec![CardView::face(a), CardView::face(b)]
                    } else {
                        vec![CardView::hidden(), CardView::hidden()]
                    }
                } else if let Some(&(a, b)) = revealed.get(&idx) {
                    vec![CardView::face(a), CardView::face(b)]
                } else {
                    Vec::new()
                };
                PlayerView {
                    name: p.name.clone(),
                    chips: p.chips,
                    current_bet: p.current_bet,
                    is_dealer: p.is_dealer,
                    is_sb: p.is_sb,
                    is_bb: p.is_bb,
                    is_self,
                    is_current: hand.is_some() && acting == Some(idx),
                    folded: p.status == holdem_engine::PlayerStatus::Folded,
                    all_in: p.status == holdem_engine::PlayerStatus::AllIn,
                    hand: hand_cards,
                }
            })
            .collect();

        let is_my_turn = hand.is_some() && viewer_idx.is_some() && viewer_idx == acting;
        let bounds = match (is_my_turn, viewer_idx) {
            (true, Some(idx)) => table.bounds_for(idx),
            _ => holdem_engine::Bounds::default(),
        };

        let action_history = hand
            .map(|h| h.history.clone())
            .or_else(|| result.map(|r| r.history.clone()))
            .unwrap_or_default();

        let is_room_owner = viewer.is_some_and(|id| table.is_owner(id));

        Snapshot {
            stage: hand.map(|h| h.stage),
            community_cards: hand
                .map(|h| h.community_cards.iter().map(|&c| c.into()).collect())
                .unwrap_or_default(),
            main_pot,
            side_pots,
            small_blind: table.small_blind,
            big_blind: table.big_blind,
            ante: table.ante,
            betting_mode: table.mode,
            players,
            is_my_turn,
            to_call: bounds.to_call,
            min_raise: bounds.min_raise,
            max_raise: bounds.max_raise,
            can_raise: bounds.can_raise,
            has_bet_this_round: hand.map(|h| h.current_bet > 0).unwrap_or(false),
            remaining_time,
            action_history,
            winners: result.map(|r| r.winners.iter().map(WinnerView::from).collect()),
            is_room_owner,
            can_start: is_room_owner && table.can_start(),
        }
    }
}
