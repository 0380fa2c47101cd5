use serde::{Deserialize, Serialize};

use crate::shared::*;
use crate::state::ActionOutcome;
use crate::table::Table;

/// 限注模式每条街最多的主动下注次数（一次下注加三次加注）
pub const LIMIT_RAISE_CAP: u32 = 4;

/// 行动座位当前的合法下注范围，校验与快照共用
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub to_call: u32,
    /// 最小加注量（无人下注时为最小下注量）
    pub min_raise: u32,
    pub max_raise: u32,
    pub can_check: bool,
    pub can_bet: bool,
    pub can_raise: bool,
}

impl Table {
    /// 限注模式本条街的固定注额：翻牌前后小注，转牌河牌大注
    fn fixed_bet(&self, stage: GameStage) -> u32 {
        match stage {
            GameStage::PreFlop | GameStage::Flop => self.big_blind,
            _ => self.big_blind * 2,
        }
    }

    /// 计算某座位的合法下注范围
    pub fn bounds_for(&self, idx: usize) -> Bounds {
        let Some(hand) = &self.hand else {
            return Bounds::default();
        };
        let player = &self.players[idx];
        let to_call = hand.current_bet.saturating_sub(player.current_bet);
        let can_check = player.can_act() && to_call == 0;
        let bet_open = hand.current_bet == 0;
        let locked = hand.no_reraise.contains(&idx);

        match self.mode {
            BettingMode::Limit => {
                let fixed = self.fixed_bet(hand.stage);
                let cap_open = hand.raises_this_street < LIMIT_RAISE_CAP;
                Bounds {
                    to_call,
                    min_raise: fixed,
                    max_raise: fixed,
                    can_check,
                    can_bet: player.can_act() && bet_open && cap_open,
                    can_raise: player.can_act()
                        && !bet_open
                        && cap_open
                        && !locked
                        && player.chips > to_call,
                }
            }
            BettingMode::NoLimit => Bounds {
                to_call,
                min_raise: hand.last_raise.max(self.big_blind),
                max_raise: player.chips.saturating_sub(to_call),
                can_check,
                can_bet: player.can_act() && bet_open && player.chips > 0,
                can_raise: player.can_act() && !bet_open && !locked && player.chips > to_call,
            },
            BettingMode::PotLimit => {
                // 底池限注：最大加注量 = 已入池筹码 + 桌面上其他人的注 + 跟注额
                let others_street: u32 = self
                    .players
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| *i != idx)
                    .map(|(_, q)| q.current_bet)
                    .sum();
                let pot_max = self.pot_committed() + others_street + to_call;
                Bounds {
                    to_call,
                    min_raise: hand.last_raise.max(self.big_blind),
                    max_raise: pot_max.min(player.chips.saturating_sub(to_call)),
                    can_check,
                    can_bet: player.can_act() && bet_open && player.chips > 0,
                    can_raise: player.can_act() && !bet_open && !locked && player.chips > to_call,
                }
            }
        }
    }

    /// 校验并执行一次玩家行动；行动非法时桌面状态不变
    pub fn handle_action(
        &mut self,
        player_id: &str,
        action: PlayerAction,
    ) -> Result<ActionOutcome, GameError> {
        let idx = self.seat_of(player_id).ok_or(GameError::PlayerNotFound)?;
        let (stage, street_bet, last_raise, raises, locked) = {
            let hand = self.hand.as_ref().ok_or(GameError::StageError)?;
            if hand.acting_idx != idx {
                return Err(GameError::NotYourTurn);
            }
            (
                hand.stage,
                hand.current_bet,
                hand.last_raise,
                hand.raises_this_street,
                hand.no_reraise.contains(&idx),
            )
        };
        if !self.players[idx].can_act() {
            return Err(GameError::InvalidAction);
        }

        let bounds = self.bounds_for(idx);
        match action {
            PlayerAction::Fold => {
                self.players[idx].status = PlayerStatus::Folded;
                self.players[idx].has_acted = true;
                self.record(idx, ActionKind::Fold, 0);
            }
            PlayerAction::Check => {
                if !bounds.can_check {
                    return Err(GameError::InvalidAction);
                }
                self.players[idx].has_acted = true;
                self.record(idx, ActionKind::Check, 0);
            }
            PlayerAction::Call => {
                if bounds.to_call == 0 {
                    return Err(GameError::InvalidAction); // 无需跟注
                }
                // 筹码不足时跟注即为全下
                let pay = self.players[idx].commit(bounds.to_call);
                self.players[idx].has_acted = true;
                self.record(idx, ActionKind::Call, pay);
            }
            PlayerAction::Bet(amount) => {
                if !bounds.can_bet || amount == 0 {
                    return Err(GameError::InvalidAction);
                }
                if amount > self.players[idx].chips {
                    return Err(GameError::InsufficientChips);
                }
                let all_in = amount == self.players[idx].chips;
                let full = match self.mode {
                    BettingMode::Limit => {
                        let fixed = self.fixed_bet(stage);
                        if amount != fixed && !(all_in && amount < fixed) {
                            return Err(if amount < fixed {
                                GameError::BelowMinRaise(fixed)
                            } else {
                                GameError::AboveMaxRaise(fixed)
                            });
                        }
                        amount == fixed
                    }
                    BettingMode::NoLimit | BettingMode::PotLimit => {
                        if self.mode == BettingMode::PotLimit && amount > bounds.max_raise {
                            return Err(GameError::AboveMaxRaise(bounds.max_raise));
                        }
                        if amount < bounds.min_raise && !all_in {
                            return Err(GameError::BelowMinRaise(bounds.min_raise));
                        }
                        amount >= bounds.min_raise
                    }
                };
                self.apply_aggressive(idx, amount, ActionKind::Bet, full)?;
            }
            PlayerAction::Raise(amount) => {
                if street_bet == 0 || locked || amount == 0 {
                    return Err(GameError::InvalidAction);
                }
                let need = bounds.to_call + amount;
                if need > self.players[idx].chips {
                    return Err(GameError::InsufficientChips);
                }
                let all_in = need == self.players[idx].chips;
                let full = match self.mode {
                    BettingMode::Limit => {
                        if raises >= LIMIT_RAISE_CAP {
                            return Err(GameError::RaiseCapReached);
                        }
                        let fixed = self.fixed_bet(stage);
                        if amount != fixed && !(all_in && amount < fixed) {
                            return Err(if amount < fixed {
                                GameError::BelowMinRaise(fixed)
                            } else {
                                GameError::AboveMaxRaise(fixed)
                            });
                        }
                        amount == fixed
                    }
                    BettingMode::NoLimit | BettingMode::PotLimit => {
                        if self.mode == BettingMode::PotLimit && amount > bounds.max_raise {
                            return Err(GameError::AboveMaxRaise(bounds.max_raise));
                        }
                        // 不足最小加注只有全下可以例外
                        if amount < bounds.min_raise && !all_in {
                            return Err(GameError::BelowMinRaise(bounds.min_raise));
                        }
                        amount >= bounds.min_raise
                    }
                };
                self.apply_aggressive(idx, amount, ActionKind::Raise, full)?;
            }
            PlayerAction::AllIn => {
                let chips = self.players[idx].chips;
                if chips == 0 {
                    return Err(GameError::InvalidAction);
                }
                let new_total = self.players[idx].current_bet + chips;
                if new_total <= street_bet {
                    // 不足跟注额的全下
                    self.players[idx].commit(chips);
                    self.players[idx].has_acted = true;
                    self.record(idx, ActionKind::AllIn, chips);
                } else {
                    let mut add = new_total - street_bet;
                    let full = match self.mode {
                        BettingMode::Limit => {
                            // 限注模式的全下同样受固定注额与封顶约束，
                            // 超出的部分留在手里
                            let fixed = self.fixed_bet(stage);
                            let allowed = if raises < LIMIT_RAISE_CAP && !locked {
                                fixed
                            } else {
                                0
                            };
                            add = add.min(allowed);
                            add == fixed
                        }
                        _ => add >= last_raise.max(self.big_blind) && !locked,
                    };
                    if add == 0 {
                        // 封顶后退化为跟注
                        let pay = self.players[idx].commit(bounds.to_call);
                        self.players[idx].has_acted = true;
                        self.record(idx, ActionKind::Call, pay);
                    } else {
                        let kind = if bounds.to_call + add == chips {
                            ActionKind::AllIn
                        } else {
                            ActionKind::Raise
                        };
                        self.apply_aggressive(idx, add, kind, full)?;
                    }
                }
            }
        }

        self.resolve_turn(idx)
    }

    /// 执行一次主动下注（下注/加注/进攻性全下）。
    /// full 为完整加注：重开整条街的行动；否则为短加注，
    /// 只抬高跟注线，已行动座位补跟或弃牌但不得再加注。
    fn apply_aggressive(
        &mut self,
        idx: usize,
        add: u32,
        kind: ActionKind,
        full: bool,
    ) -> Result<(), GameError> {
        let to_call = {
            let hand = self.hand.as_ref().ok_or(GameError::StageError)?;
            hand.current_bet
                .saturating_sub(self.players[idx].current_bet)
        };
        let pay = self.players[idx].commit(to_call + add);
        let new_total = self.players[idx].current_bet;
        self.players[idx].has_acted = true;

        let hand = self.hand.as_mut().ok_or(GameError::StageError)?;
        if full {
            hand.last_raise = new_total - hand.current_bet;
            hand.current_bet = new_total;
            hand.aggressor = Some(idx);
            hand.raises_this_street += 1;
            hand.no_reraise.clear();
            for (i, other) in self.players.iter_mut().enumerate() {
                if i != idx {
                    other.has_acted = false;
                }
            }
        } else if new_total > hand.current_bet {
            hand.current_bet = new_total;
            for (i, other) in self.players.iter_mut().enumerate() {
                if i == idx || !other.can_act() || other.current_bet >= new_total {
                    continue;
                }
                if other.has_acted && !hand.no_reraise.contains(&i) {
                    hand.no_reraise.push(i);
                }
                other.has_acted = false;
            }
        }

        self.record(idx, kind, pay);
        Ok(())
    }

    fn record(&mut self, idx: usize, kind: ActionKind, amount: u32) {
        let player = self.players[idx].name.clone();
        if let Some(hand) = self.hand.as_mut() {
            let stage = hand.stage;
            hand.history.push(ActionRecord {
                player,
                kind,
                amount,
                stage,
            });
            hand.action_index += 1;
        }
    }
}
