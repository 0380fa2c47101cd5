use crate::pot::{build_pots, Pot};
use crate::shared::*;
use crate::state::HandState;

/// 一桌最多坐10人
pub const MAX_SEATS: usize = 10;

/// 一张牌桌：座位、按钮位、盲注配置与进行中的一局
#[derive(Debug, Clone)]
pub struct Table {
    pub id: String,
    /// 顺时针座位顺序
    pub players: Vec<Player>,
    /// 房主（第一个入座的玩家）
    pub owner_id: Option<String>,
    pub dealer_idx: usize,
    pub mode: BettingMode,
    pub small_blind: u32,
    pub big_blind: u32,
    pub ante: u32,
    pub phase: TablePhase,
    /// 已开局次数，用于给每一局编号
    pub hands_dealt: u64,
    pub hand: Option<HandState>,
}

impl Table {
    pub fn new(
        id: impl Into<String>,
        mode: BettingMode,
        small_blind: u32,
        big_blind: u32,
        ante: u32,
    ) -> Self {
        Table {
            id: id.into(),
            players: Vec::new(),
            owner_id: None,
            dealer_idx: 0,
            mode,
            small_blind,
            big_blind,
            ante,
            phase: TablePhase::Lobby,
            hands_dealt: 0,
            hand: None,
        }
    }

    /// 入座；第一个入座者成为房主
    pub fn add_player(
        &mut self,
        id: impl Into<String>,
        name: impl Into<String>,
        chips: u32,
    ) -> Result<usize, GameError> {
        if self.players.len() >= MAX_SEATS {
            return Err(GameError::TableFull);
        }
        let player = Player::new(id, name, chips);
        if self.owner_id.is_none() {
            self.owner_id = Some(player.id.clone());
        }
        self.players.push(player);
        Ok(self.players.len() - 1)
    }

    /// 拆座；只允许在两局之间进行，局中离开走 `fold_out`
    pub fn remove_player(&mut self, id: &str) -> Result<(), GameError> {
        if self.phase == TablePhase::InHand {
            return Err(GameError::StageError);
        }
        let idx = self.seat_of(id).ok_or(GameError::PlayerNotFound)?;
        self.players.remove(idx);
        if idx < self.dealer_idx {
            self.dealer_idx -= 1;
        }
        if !self.players.is_empty() {
            self.dealer_idx %= self.players.len();
        } else {
            self.dealer_idx = 0;
        }
        Ok(())
    }

    pub fn seat_of(&self, id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    pub fn is_owner(&self, id: &str) -> bool {
        self.owner_id.as_deref() == Some(id)
    }

    /// 有筹码、可以参加下一局的座位数
    pub fn runner_count(&self) -> usize {
        self.players.iter().filter(|p| p.chips > 0).count()
    }

    /// 是否满足开局条件
    pub fn can_start(&self) -> bool {
        self.phase != TablePhase::InHand && self.runner_count() >= 2
    }

    /// 从 idx 顺时针找下一个有筹码的座位
    pub(crate) fn next_runner_from(&self, idx: usize) -> usize {
        let n = self.players.len();
        let mut next = idx;
        for _ in 0..n {
            next = (next + 1) % n;
            if self.players[next].chips > 0 {
                return next;
            }
        }
        idx
    }

    /// 从 idx 顺时针找下一个本条街仍可行动的座位
    pub(crate) fn next_actor_after(&self, idx: usize) -> usize {
        let n = self.players.len();
        let mut next = idx;
        for _ in 0..n {
            next = (next + 1) % n;
            if self.players[next].can_act() {
                return next;
            }
        }
        idx
    }

    /// 已进入底池的筹码（不含本条街尚未结算的注）
    pub fn pot_committed(&self) -> u32 {
        self.players
            .iter()
            .map(|p| p.total_contributed - p.current_bet)
            .sum()
    }

    /// 当前的主池与边池
    pub fn pots(&self) -> Vec<Pot> {
        let contributions: Vec<u32> = self
            .players
            .iter()
            .map(|p| p.total_contributed - p.current_bet)
            .collect();
        let in_hand: Vec<bool> = self.players.iter().map(|p| p.in_hand()).collect();
        build_pots(&contributions, &in_hand)
    }

    /// 筹码守恒检查：所有座位筹码加上本局投入必须等于开局总量
    pub(crate) fn verify_chip_balance(&self) -> Result<(), GameError> {
        let Some(hand) = &self.hand else {
            return Ok(());
        };
        let total: u32 = self
            .players
            .iter()
            .map(|p| p.chips + p.total_contributed)
            .sum();
        if total != hand.opening_chips {
            return Err(GameError::ChipImbalance);
        }
        Ok(())
    }
}
