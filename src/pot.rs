use serde::{Deserialize, Serialize};

use crate::rules::HandEvaluation;

/// 一个筹码池（主池或边池）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pot {
    pub amount: u32,
    /// 有资格争夺该池的座位索引（投入达到该池上限且未弃牌）
    pub eligible: Vec<usize>,
}

/// 按每人累计投入分层构建主池与边池。
///
/// 投入水平升序分层：每层金额包含所有座位在该层内的投入（弃牌者
/// 的筹码也计入金额），资格只属于投入达到该层且仍在局内的座位。
/// 相邻两层资格相同则合并为一个池。
pub fn build_pots(contributions: &[u32], in_hand: &[bool]) -> Vec<Pot> {
    let mut levels: Vec<u32> = contributions.iter().copied().filter(|&c| c > 0).collect();
    levels.sort_unstable();
    levels.dedup();

    let mut pots: Vec<Pot> = Vec::new();
    let mut prev = 0u32;

    for &level in &levels {
        let mut amount = 0u32;
        let mut eligible = Vec::new();
        for (i, &c) in contributions.iter().enumerate() {
            amount += c.min(level) - c.min(prev);
            if in_hand[i] && c >= level {
                eligible.push(i);
            }
        }
        prev = level;

        if amount == 0 {
            continue;
        }
        if eligible.is_empty() {
            // 该层只剩弃牌者的筹码，并入前一个池
            if let Some(last) = pots.last_mut() {
                last.amount += amount;
            }
            continue;
        }
        match pots.last_mut() {
            Some(last) if last.eligible == eligible => last.amount += amount,
            _ => pots.push(Pot { amount, eligible }),
        }
    }

    pots
}

/// 依次结算每个池：池内牌力最强者均分，余数从按钮位顺时针就近分配。
/// 返回每个座位赢得的筹码。
pub fn distribute(
    pots: &[Pot],
    evaluations: &[Option<HandEvaluation>],
    dealer_idx: usize,
) -> Vec<u32> {
    let seats = evaluations.len();
    let mut winnings = vec![0u32; seats];

    for pot in pots {
        let mut best: Option<&HandEvaluation> = None;
        let mut winners: Vec<usize> = Vec::new();

        for &idx in &pot.eligible {
            if let Some(eval) = &evaluations[idx] {
                match best {
                    None => {
                        best = Some(eval);
                        winners = vec![idx];
                    }
                    Some(current_best) => match eval.cmp(current_best) {
                        std::cmp::Ordering::Greater => {
                            best = Some(eval);
                            winners = vec![idx];
                        }
                        std::cmp::Ordering::Equal => winners.push(idx),
                        std::cmp::Ordering::Less => {}
                    },
                }
            }
        }

        if winners.is_empty() {
            continue;
        }

        let share = pot.amount / winners.len() as u32;
        let mut remainder = pot.amount - share * winners.len() as u32;
        for &idx in &winners {
            winnings[idx] += share;
        }

        // 余数逐一分给按钮位之后顺时针最近的赢家
        let mut idx = (dealer_idx + 1) % seats;
        while remainder > 0 {
            if winners.contains(&idx) {
                winnings[idx] += 1;
                remainder -= 1;
            }
            idx = (idx + 1) % seats;
        }
    }

    winnings
}
