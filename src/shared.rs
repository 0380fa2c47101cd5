use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 扑克牌花色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suit {
    Hearts,   // 红心
    Diamonds, // 方块
    Clubs,    // 梅花
    Spades,   // 黑桃
}

impl Suit {
    /// 前端着色用：红心、方块为红色
    pub fn color(&self) -> &'static str {
        match self {
            Suit::Hearts | Suit::Diamonds => "red",
            Suit::Clubs | Suit::Spades => "black",
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Suit::Hearts => write!(f, "♥"),
            Suit::Diamonds => write!(f, "♦"),
            Suit::Clubs => write!(f, "♣"),
            Suit::Spades => write!(f, "♠"),
        }
    }
}

/// 扑克牌点数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    Two = 2,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,  // J
    Queen, // Q
    King,  // K
    Ace,   // A
}

impl Rank {
    pub fn value(&self) -> u8 {
        match self {
            Rank::Two => 2,
            Rank::Three => 3,
            Rank::Four => 4,
            Rank::Five => 5,
            Rank::Six => 6,
            Rank::Seven => 7,
            Rank::Eight => 8,
            Rank::Nine => 9,
            Rank::Ten => 10,
            Rank::Jack => 11,
            Rank::Queen => 12,
            Rank::King => 13,
            Rank::Ace => 14,
        }
    }

    pub fn from_value(value: u8) -> Self {
        match value {
            2 => Rank::Two,
            3 => Rank::Three,
            4 => Rank::Four,
            5 => Rank::Five,
            6 => Rank::Six,
            7 => Rank::Seven,
            8 => Rank::Eight,
            9 => Rank::Nine,
            10 => Rank::Ten,
            11 => Rank::Jack,
            12 => Rank::Queen,
            13 => Rank::King,
            14 | 1 => Rank::Ace, // Ace 表示 14 或 1
            _ => panic!("Invalid value for Rank: {}", value),
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Rank::Two => write!(f, "2"),
            Rank::Three => write!(f, "3"),
            Rank::Four => write!(f, "4"),
            Rank::Five => write!(f, "5"),
            Rank::Six => write!(f, "6"),
            Rank::Seven => write!(f, "7"),
            Rank::Eight => write!(f, "8"),
            Rank::Nine => write!(f, "9"),
            Rank::Ten => write!(f, "10"),
            Rank::Jack => write!(f, "J"),
            Rank::Queen => write!(f, "Q"),
            Rank::King => write!(f, "K"),
            Rank::Ace => write!(f, "A"),
        }
    }
}

/// 单张扑克牌
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub suit: Suit,
    pub rank: Rank,
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

/// 下注模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BettingMode {
    Limit,    // 限注
    NoLimit,  // 无限注
    PotLimit, // 底池限注
}

/// 玩家行动；Bet/Raise 携带的是在当前注额之上再加的数量
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PlayerAction {
    Fold,       // 弃牌
    Check,      // 过牌
    Call,       // 跟注
    Bet(u32),   // 下注
    Raise(u32), // 加注
    AllIn,      // 全下
}

/// 游戏阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStage {
    PreFlop,  // 翻牌前
    Flop,     // 翻牌圈
    Turn,     // 转牌圈
    River,    // 河牌圈
    Showdown, // 摊牌
}

/// 座位状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerStatus {
    Active,     // 仍可行动
    Folded,     // 已弃牌
    AllIn,      // 已全下
    SittingOut, // 本局不参与
}

/// 桌面阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TablePhase {
    Lobby,        // 等待开局
    InHand,       // 一局进行中
    BetweenHands, // 两局之间
}

/// 行动类别（行动历史用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Ante,
    SmallBlind,
    BigBlind,
    Fold,
    Check,
    Call,
    Bet,
    Raise,
    AllIn,
}

/// 一条行动历史记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub player: String,
    pub kind: ActionKind,
    pub amount: u32,
    pub stage: GameStage,
}

/// 玩家信息（一个座位）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub chips: u32,
    pub cards: Option<(Card, Card)>, // 两张底牌
    pub status: PlayerStatus,
    pub current_bet: u32,       // 本条街已下注额
    pub total_contributed: u32, // 本局累计投入
    pub has_acted: bool,        // 本条街是否已行动
    pub is_dealer: bool,
    pub is_sb: bool,
    pub is_bb: bool,
}

impl Player {
    pub fn new(id: impl Into<String>, name: impl Into<String>, chips: u32) -> Self {
        Player {
            id: id.into(),
            name: name.into(),
            chips,
            cards: None,
            status: PlayerStatus::Active,
            current_bet: 0,
            total_contributed: 0,
            has_acted: false,
            is_dealer: false,
            is_sb: false,
            is_bb: false,
        }
    }

    /// 本局仍可行动（有底牌、未弃牌、未全下）
    pub fn can_act(&self) -> bool {
        self.status == PlayerStatus::Active && self.cards.is_some()
    }

    /// 本局仍参与底池（未弃牌、未离座）
    pub fn in_hand(&self) -> bool {
        matches!(self.status, PlayerStatus::Active | PlayerStatus::AllIn) && self.cards.is_some()
    }

    /// 开新一局前重置座位；没有筹码的座位本局离座
    pub fn reset_for_hand(&mut self) {
        self.cards = None;
        self.status = if self.chips > 0 {
            PlayerStatus::Active
        } else {
            PlayerStatus::SittingOut
        };
        self.current_bet = 0;
        self.total_contributed = 0;
        self.has_acted = false;
        self.is_dealer = false;
        self.is_sb = false;
        self.is_bb = false;
    }

    /// 向本条街投入筹码，不足则全下；返回实际投入
    pub fn commit(&mut self, amount: u32) -> u32 {
        let pay = amount.min(self.chips);
        self.chips -= pay;
        self.current_bet += pay;
        self.total_contributed += pay;
        if self.chips == 0 {
            self.status = PlayerStatus::AllIn;
        }
        pay
    }

    /// 交前注：只进累计投入，不计入本条街注额
    pub fn post_ante(&mut self, amount: u32) -> u32 {
        let pay = amount.min(self.chips);
        self.chips -= pay;
        self.total_contributed += pay;
        if self.chips == 0 {
            self.status = PlayerStatus::AllIn;
        }
        pay
    }
}

/// 错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid player action")]
    InvalidAction,
    #[error("Not this player's turn")]
    NotYourTurn,
    #[error("Not enough chips")]
    InsufficientChips,
    #[error("Raise below minimum of {0}")]
    BelowMinRaise(u32),
    #[error("Raise above maximum of {0}")]
    AboveMaxRaise(u32),
    #[error("Raise cap reached for this street")]
    RaiseCapReached,
    #[error("Game stage error")]
    StageError,
    #[error("Player not found")]
    PlayerNotFound,
    #[error("No free seat at this table")]
    TableFull,
    #[error("Need at least two players with chips")]
    NotEnoughPlayers,
    #[error("Only the room owner can start the game")]
    NotOwner,
    #[error("Chip totals no longer balance")]
    ChipImbalance,
    #[error("Deck exhausted while dealing")]
    DeckExhausted,
}

impl GameError {
    /// 稳定的线路错误码
    pub fn code(&self) -> &'static str {
        match self {
            GameError::InvalidAction => "invalid_action",
            GameError::NotYourTurn => "not_your_turn",
            GameError::InsufficientChips => "insufficient_chips",
            GameError::BelowMinRaise(_) => "below_min_raise",
            GameError::AboveMaxRaise(_) => "above_max_raise",
            GameError::RaiseCapReached => "raise_cap_reached",
            GameError::StageError => "stage_error",
            GameError::PlayerNotFound => "player_not_found",
            GameError::TableFull => "table_full",
            GameError::NotEnoughPlayers => "not_enough_players",
            GameError::NotOwner => "not_owner",
            GameError::ChipImbalance => "chip_imbalance",
            GameError::DeckExhausted => "deck_exhausted",
        }
    }

    /// 致命错误：房间内部状态已不可信
    pub fn is_fatal(&self) -> bool {
        matches!(self, GameError::ChipImbalance | GameError::DeckExhausted)
    }
}
