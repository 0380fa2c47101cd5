use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::pot::{build_pots, distribute};
use crate::rules::{create_shuffled_deck, evaluate_hand, HandEvaluation};
use crate::shared::*;
use crate::table::Table;

/// 一局牌的进行状态
#[derive(Debug, Clone)]
pub struct HandState {
    pub stage: GameStage,
    pub deck: Vec<Card>,
    pub community_cards: Vec<Card>,
    /// 本条街需要跟到的注额
    pub current_bet: u32,
    /// 最近一次完整加注的大小
    pub last_raise: u32,
    pub acting_idx: usize,
    /// 本条街最后的进攻者
    pub aggressor: Option<usize>,
    /// 摊牌时先亮牌的座位（上一条有下注的街的进攻者）
    pub reveal_from: Option<usize>,
    /// 本条街的主动下注次数（限注模式封顶用）
    pub raises_this_street: u32,
    /// 短加注全下后被锁定、不得再加注的座位
    pub(crate) no_reraise: Vec<usize>,
    pub history: Vec<ActionRecord>,
    /// 每接受一次行动递增，为行动计时器提供键
    pub action_index: u64,
    /// 开局时全桌筹码总量，守恒检查用
    pub(crate) opening_chips: u32,
}

impl HandState {
    fn new(deck: Vec<Card>, opening_chips: u32) -> Self {
        HandState {
            stage: GameStage::PreFlop,
            deck,
            community_cards: Vec::new(),
            current_bet: 0,
            last_raise: 0,
            acting_idx: 0,
            aggressor: None,
            reveal_from: None,
            raises_this_street: 0,
            no_reraise: Vec::new(),
            history: Vec::new(),
            action_index: 0,
            opening_chips,
        }
    }

    pub(crate) fn draw(&mut self) -> Result<Card, GameError> {
        self.deck.pop().ok_or(GameError::DeckExhausted)
    }
}

/// 一次被接受的行动对牌局的影响
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// 同一条街继续，轮到下一位
    Continue,
    /// 本条街结束，进入下一阶段
    StreetAdvanced,
    /// 本局结束
    HandComplete(HandResult),
}

/// 一个赢家及其所得
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinnerInfo {
    pub seat: usize,
    pub name: String,
    pub amount: u32,
    /// 无人跟注获胜时为 None（不亮牌）
    pub hand_name: Option<String>,
}

/// 一局结束后的结算信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandResult {
    pub winners: Vec<WinnerInfo>,
    /// 摊牌顺序亮出的底牌
    pub revealed: Vec<(usize, (Card, Card))>,
    pub history: Vec<ActionRecord>,
}

impl Table {
    /// 开始新的一局
    pub fn start_hand(&mut self) -> Result<Option<HandResult>, GameError> {
        self.start_hand_with_deck(create_shuffled_deck())
    }

    /// 用给定的牌堆开始新的一局（测试用牌堆从尾部发牌）
    pub fn start_hand_with_deck(&mut self, deck: Vec<Card>) -> Result<Option<HandResult>, GameError> {
        if self.phase == TablePhase::InHand {
            return Err(GameError::StageError);
        }
        if self.runner_count() < 2 {
            return Err(GameError::NotEnoughPlayers);
        }

        for player in &mut self.players {
            player.reset_for_hand();
        }
        let opening_chips: u32 = self.players.iter().map(|p| p.chips).sum();

        // 轮转按钮，跳过没有筹码的座位；首局保持初始按钮位
        if self.phase == TablePhase::BetweenHands {
            self.dealer_idx = self.next_runner_from(self.dealer_idx);
        } else if self.players[self.dealer_idx].chips == 0 {
            self.dealer_idx = self.next_runner_from(self.dealer_idx);
        }

        // 盲注位：单挑时按钮自己是小盲
        let heads_up = self.runner_count() == 2;
        let sb_idx = if heads_up {
            self.dealer_idx
        } else {
            self.next_runner_from(self.dealer_idx)
        };
        let bb_idx = self.next_runner_from(sb_idx);
        self.players[self.dealer_idx].is_dealer = true;
        self.players[sb_idx].is_sb = true;
        self.players[bb_idx].is_bb = true;

        let mut hand = HandState::new(deck, opening_chips);
        self.hands_dealt += 1;

        // 先收前注，再下盲注
        if self.ante > 0 {
            for idx in 0..self.players.len() {
                if self.players[idx].status == PlayerStatus::Active {
                    let pay = self.players[idx].post_ante(self.ante);
                    hand.history.push(ActionRecord {
                        player: self.players[idx].name.clone(),
                        kind: ActionKind::Ante,
                        amount: pay,
                        stage: GameStage::PreFlop,
                    });
                }
            }
        }

        let pay = self.players[sb_idx].commit(self.small_blind);
        hand.history.push(ActionRecord {
            player: self.players[sb_idx].name.clone(),
            kind: ActionKind::SmallBlind,
            amount: pay,
            stage: GameStage::PreFlop,
        });
        let pay = self.players[bb_idx].commit(self.big_blind);
        hand.history.push(ActionRecord {
            player: self.players[bb_idx].name.clone(),
            kind: ActionKind::BigBlind,
            amount: pay,
            stage: GameStage::PreFlop,
        });

        // 盲注规定了本条街的注额；大盲算作第一次主动下注
        hand.current_bet = self.big_blind;
        hand.last_raise = self.big_blind;
        hand.raises_this_street = 1;

        deal_hole_cards(&mut hand, &mut self.players, sb_idx)?;
        self.phase = TablePhase::InHand;
        self.hand = Some(hand);

        // 大盲左侧第一个可行动的座位先行动（单挑时即按钮位）
        let acting = self.next_actor_after(bb_idx);
        if !self.players[acting].can_act() {
            // 盲注已把所有人逼到全下，直接发完公共牌摊牌
            return match self.advance_street()? {
                ActionOutcome::HandComplete(result) => Ok(Some(result)),
                _ => Ok(None),
            };
        }
        if let Some(hand) = self.hand.as_mut() {
            hand.acting_idx = acting;
        }
        Ok(None)
    }

    /// 一次行动被接受后推进牌局
    pub(crate) fn resolve_turn(&mut self, from_idx: usize) -> Result<ActionOutcome, GameError> {
        self.verify_chip_balance()?;

        let in_hand: Vec<usize> = self
            .players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.in_hand())
            .map(|(i, _)| i)
            .collect();
        if in_hand.len() <= 1 {
            let winner = in_hand.first().copied().ok_or(GameError::StageError)?;
            return Ok(self.finish_uncontested(winner));
        }

        if self.street_settled() {
            return self.advance_street();
        }

        let next = self.next_actor_after(from_idx);
        if let Some(hand) = self.hand.as_mut() {
            hand.acting_idx = next;
        }
        Ok(ActionOutcome::Continue)
    }

    /// 本条街是否结清：所有可行动座位都已行动且注额对齐
    fn street_settled(&self) -> bool {
        let Some(hand) = &self.hand else {
            return false;
        };
        self.players
            .iter()
            .all(|p| !p.can_act() || (p.has_acted && p.current_bet == hand.current_bet))
    }

    /// 结束本条街并进入下一阶段；可行动座位不足两个时一路发到摊牌
    fn advance_street(&mut self) -> Result<ActionOutcome, GameError> {
        for player in &mut self.players {
            player.current_bet = 0;
            player.has_acted = false;
        }
        {
            let hand = self.hand.as_mut().ok_or(GameError::StageError)?;
            hand.reveal_from = hand.aggressor;
            hand.current_bet = 0;
            hand.last_raise = 0;
            hand.raises_this_street = 0;
            hand.aggressor = None;
            hand.no_reraise.clear();
        }

        loop {
            let hand = self.hand.as_mut().ok_or(GameError::StageError)?;
            match hand.stage {
                GameStage::PreFlop => {
                    // 烧一张，发三张翻牌
                    hand.draw()?;
                    for _ in 0..3 {
                        let card = hand.draw()?;
                        hand.community_cards.push(card);
                    }
                    hand.stage = GameStage::Flop;
                }
                GameStage::Flop => {
                    hand.draw()?;
                    let card = hand.draw()?;
                    hand.community_cards.push(card);
                    hand.stage = GameStage::Turn;
                }
                GameStage::Turn => {
                    hand.draw()?;
                    let card = hand.draw()?;
                    hand.community_cards.push(card);
                    hand.stage = GameStage::River;
                }
                GameStage::River => {
                    hand.stage = GameStage::Showdown;
                    return self.finish_showdown();
                }
                GameStage::Showdown => return Err(GameError::StageError),
            }

            if self.players.iter().filter(|p| p.can_act()).count() >= 2 {
                let acting = self.next_actor_after(self.dealer_idx);
                if let Some(hand) = self.hand.as_mut() {
                    hand.acting_idx = acting;
                }
                return Ok(ActionOutcome::StreetAdvanced);
            }
        }
    }

    /// 摊牌：评牌、分池、结算
    fn finish_showdown(&mut self) -> Result<ActionOutcome, GameError> {
        let hand = self.hand.as_ref().ok_or(GameError::StageError)?;
        let community = hand.community_cards.clone();
        let reveal_from = hand.reveal_from;
        let history = hand.history.clone();

        let evaluations: Vec<Option<HandEvaluation>> = self
            .players
            .iter()
            .map(|p| {
                if p.in_hand() {
                    p.cards.map(|cards| evaluate_hand(&cards, &community))
                } else {
                    None
                }
            })
            .collect();
        let contributions: Vec<u32> = self.players.iter().map(|p| p.total_contributed).collect();
        let in_hand: Vec<bool> = self.players.iter().map(|p| p.in_hand()).collect();

        let pots = build_pots(&contributions, &in_hand);
        let winnings = distribute(&pots, &evaluations, self.dealer_idx);

        // 亮牌顺序：从最后的进攻者开始，没有则按钮左侧第一个
        let seats = self.players.len();
        let start = reveal_from.unwrap_or((self.dealer_idx + 1) % seats);
        let mut revealed = Vec::new();
        for offset in 0..seats {
            let idx = (start + offset) % seats;
            if self.players[idx].in_hand() {
                if let Some(cards) = self.players[idx].cards {
                    revealed.push((idx, cards));
                }
            }
        }

        let mut winners = Vec::new();
        for (idx, &amount) in winnings.iter().enumerate() {
            if amount > 0 {
                winners.push(WinnerInfo {
                    seat: idx,
                    name: self.players[idx].name.clone(),
                    amount,
                    hand_name: evaluations[idx].as_ref().map(|e| e.rank.to_string()),
                });
            }
        }
        for (player, &won) in self.players.iter_mut().zip(&winnings) {
            player.chips += won;
        }

        self.end_hand();
        Ok(ActionOutcome::HandComplete(HandResult {
            winners,
            revealed,
            history,
        }))
    }

    /// 其余玩家全部弃牌，底池归最后一人，不亮牌
    fn finish_uncontested(&mut self, winner: usize) -> ActionOutcome {
        let pot: u32 = self.players.iter().map(|p| p.total_contributed).sum();
        self.players[winner].chips += pot;
        let history = self
            .hand
            .as_ref()
            .map(|h| h.history.clone())
            .unwrap_or_default();
        let result = HandResult {
            winners: vec![WinnerInfo {
                seat: winner,
                name: self.players[winner].name.clone(),
                amount: pot,
                hand_name: None,
            }],
            revealed: Vec::new(),
            history,
        };
        self.end_hand();
        ActionOutcome::HandComplete(result)
    }

    fn end_hand(&mut self) {
        for player in &mut self.players {
            player.cards = None;
            player.current_bet = 0;
            // 底池已经分掉，座位上不再挂着投入
            player.total_contributed = 0;
        }
        self.hand = None;
        self.phase = TablePhase::BetweenHands;
    }

    /// 玩家中途退出：立即按弃牌处理，座位留到局后再拆
    pub fn fold_out(&mut self, id: &str) -> Result<Option<ActionOutcome>, GameError> {
        let idx = self.seat_of(id).ok_or(GameError::PlayerNotFound)?;
        if self.phase != TablePhase::InHand || !self.players[idx].in_hand() {
            return Ok(None);
        }

        let was_acting = self.hand.as_ref().map(|h| h.acting_idx) == Some(idx);
        let name = self.players[idx].name.clone();
        self.players[idx].status = PlayerStatus::Folded;
        if let Some(hand) = self.hand.as_mut() {
            hand.history.push(ActionRecord {
                player: name,
                kind: ActionKind::Fold,
                amount: 0,
                stage: hand.stage,
            });
            hand.action_index += 1;
        }

        if was_acting {
            return self.resolve_turn(idx).map(Some);
        }

        // 不在行动位的弃牌也可能让本局或本条街提前结束
        self.verify_chip_balance()?;
        let in_hand: Vec<usize> = self
            .players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.in_hand())
            .map(|(i, _)| i)
            .collect();
        if in_hand.len() <= 1 {
            let winner = in_hand.first().copied().ok_or(GameError::StageError)?;
            return Ok(Some(self.finish_uncontested(winner)));
        }
        if self.street_settled() {
            return self.advance_street().map(Some);
        }
        Ok(Some(ActionOutcome::Continue))
    }

    /// 致命错误时放弃本局：退还每人投入并关闭牌局
    pub fn abort_hand(&mut self) {
        for player in &mut self.players {
            player.chips += player.total_contributed;
            player.total_contributed = 0;
            player.current_bet = 0;
            player.cards = None;
        }
        self.hand = None;
        self.phase = TablePhase::BetweenHands;
    }
}

/// 从小盲位起每人轮流发两张底牌
fn deal_hole_cards(
    hand: &mut HandState,
    players: &mut [Player],
    first: usize,
) -> Result<(), GameError> {
    let seats = players.len();
    let order: Vec<usize> = (0..seats)
        .map(|offset| (first + offset) % seats)
        .filter(|&i| matches!(players[i].status, PlayerStatus::Active | PlayerStatus::AllIn))
        .collect();

    let mut first_cards: HashMap<usize, Card> = HashMap::new();
    for &idx in &order {
        first_cards.insert(idx, hand.draw()?);
    }
    for &idx in &order {
        let second = hand.draw()?;
        players[idx].cards = Some((first_cards[&idx], second));
    }
    Ok(())
}
