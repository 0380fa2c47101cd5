use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use super::shared::*;
use itertools::Itertools;
use rand::rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// 牌型等级，从高牌到皇家同花顺
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HandRank {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
    RoyalFlush,
}

impl std::fmt::Display for HandRank {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let name = match self {
            HandRank::HighCard => "High Card",
            HandRank::OnePair => "One Pair",
            HandRank::TwoPair => "Two Pair",
            HandRank::ThreeOfAKind => "Three of a Kind",
            HandRank::Straight => "Straight",
            HandRank::Flush => "Flush",
            HandRank::FullHouse => "Full House",
            HandRank::FourOfAKind => "Four of a Kind",
            HandRank::StraightFlush => "Straight Flush",
            HandRank::RoyalFlush => "Royal Flush",
        };
        write!(f, "{}", name)
    }
}

/// 一手牌的完整评估结果；派生的 Ord 先比牌型再按字典序比关键牌
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HandEvaluation {
    pub rank: HandRank,
    pub kickers: Vec<Rank>,
}

/// 创建一副洗好的牌
pub fn create_shuffled_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(52);

    let suits = [Suit::Hearts, Suit::Diamonds, Suit::Clubs, Suit::Spades];
    let ranks = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    for &suit in &suits {
        for &rank in &ranks {
            deck.push(Card { suit, rank });
        }
    }

    let mut rng = rng();
    deck.shuffle(&mut rng);
    deck
}

/// 评估玩家手牌强度
pub fn evaluate_hand(player_cards: &(Card, Card), community_cards: &[Card]) -> HandEvaluation {
    // 合并所有牌
    let mut all_cards = vec![player_cards.0, player_cards.1];
    all_cards.extend_from_slice(community_cards);

    evaluate_cards(&all_cards)
}

/// 从 5..7 张牌中取最佳 5 张组合的评估结果
pub fn evaluate_cards(cards: &[Card]) -> HandEvaluation {
    if cards.len() <= 5 {
        return evaluate_five_cards(cards);
    }

    // 遍历所有5张牌组合，保留最大的牌型
    let mut best = evaluate_five_cards(&cards[..5]);
    for hand in cards.iter().copied().combinations(5) {
        let evaluation = evaluate_five_cards(&hand);
        if evaluation > best {
            best = evaluation;
        }
    }
    best
}

/// 评估5张牌的牌型
fn evaluate_five_cards(cards: &[Card]) -> HandEvaluation {
    assert!(cards.len() == 5, "只能评估5张牌");

    // 按点数分组
    let mut rank_counts: HashMap<Rank, u8> = HashMap::new();
    for card in cards {
        *rank_counts.entry(card.rank).or_insert(0) += 1;
    }

    // 按花色分组
    let mut suit_counts: HashMap<Suit, u8> = HashMap::new();
    for card in cards {
        *suit_counts.entry(card.suit).or_insert(0) += 1;
    }

    // 检查同花
    let is_flush = suit_counts.values().any(|&count| count == 5);

    // 检查顺子
    let (is_straight, straight_high) = check_straight(cards);

    // 检查皇家同花顺
    if is_flush && is_straight && straight_high == Rank::Ace {
        return HandEvaluation {
            rank: HandRank::RoyalFlush,
            kickers: vec![Rank::Ace],
        };
    }

    // 检查同花顺
    if is_flush && is_straight {
        return HandEvaluation {
            rank: HandRank::StraightFlush,
            kickers: vec![straight_high],
        };
    }

    // 检查四条
    if let Some(quad_rank) = rank_counts
        .iter()
        .find(|&(_, &count)| count == 4)
        .map(|(r, _)| *r)
    {
        let kicker = rank_counts
            .keys()
            .copied()
            .filter(|r| *r != quad_rank)
            .max()
            .unwrap_or(quad_rank);

        return HandEvaluation {
            rank: HandRank::FourOfAKind,
            kickers: vec![quad_rank, kicker],
        };
    }

    // 检查葫芦（三条+对子）
    if let Some(three_rank) = rank_counts
        .iter()
        .find(|&(_, &count)| count == 3)
        .map(|(r, _)| *r)
    {
        if let Some(pair_rank) = rank_counts
            .iter()
            .filter(|(r, _)| **r != three_rank)
            .find(|&(_, &count)| count >= 2)
            .map(|(r, _)| *r)
        {
            return HandEvaluation {
                rank: HandRank::FullHouse,
                kickers: vec![three_rank, pair_rank],
            };
        }

        // 三条
        let mut kickers: Vec<Rank> = rank_counts
            .keys()
            .filter(|r| **r != three_rank)
            .copied()
            .collect();
        kickers.sort_by(|a, b| b.cmp(a)); // 降序排序
        kickers.truncate(2); // 只保留最大的两个踢脚牌

        return HandEvaluation {
            rank: HandRank::ThreeOfAKind,
            kickers: std::iter::once(three_rank).chain(kickers).collect(),
        };
    }

    // 检查同花
    if is_flush {
        let mut kickers: Vec<Rank> = cards.iter().map(|c| c.rank).collect();
        kickers.sort_by(|a, b| b.cmp(a)); // 降序排序
        return HandEvaluation {
            rank: HandRank::Flush,
            kickers,
        };
    }

    // 检查顺子
    if is_straight {
        return HandEvaluation {
            rank: HandRank::Straight,
            kickers: vec![straight_high],
        };
    }

    // 检查两对
    let mut pairs: Vec<Rank> = rank_counts
        .iter()
        .filter(|&(_, &count)| count == 2)
        .map(|(r, _)| *r)
        .collect();
    pairs.sort_by(|a, b| b.cmp(a)); // 降序排序

    if pairs.len() >= 2 {
        let high_pair = pairs[0];
        let low_pair = pairs[1];

        let kicker = rank_counts
            .keys()
            .copied()
            .filter(|r| *r != high_pair && *r != low_pair)
            .max()
            .unwrap_or(low_pair);

        return HandEvaluation {
            rank: HandRank::TwoPair,
            kickers: vec![high_pair, low_pair, kicker],
        };
    }

    // 检查一对
    if let Some(pair_rank) = pairs.first().copied() {
        let mut kickers: Vec<Rank> = rank_counts
            .keys()
            .filter(|r| **r != pair_rank)
            .copied()
            .collect();

        kickers.sort_by(|a, b| b.cmp(a)); // 降序排序
        kickers.truncate(3); // 只保留最大的三个踢脚牌

        return HandEvaluation {
            rank: HandRank::OnePair,
            kickers: std::iter::once(pair_rank).chain(kickers).collect(),
        };
    }

    // 高牌
    let mut kickers: Vec<Rank> = cards.iter().map(|c| c.rank).collect();
    kickers.sort_by(|a, b| b.cmp(a)); // 降序排序
    HandEvaluation {
        rank: HandRank::HighCard,
        kickers,
    }
}

/// 检查是否为顺子并返回最大牌
fn check_straight(cards: &[Card]) -> (bool, Rank) {
    // 用于数值判断的集合
    let mut values: HashSet<u8> = cards.iter().map(|c| c.rank.value()).collect();

    // 特殊处理：A=14 也可以视为 1
    if values.contains(&14) {
        values.insert(1);
    }

    let mut sorted_values: Vec<u8> = values.into_iter().collect();
    sorted_values.sort();

    let mut consecutive = 1;
    let mut max_value = 0;

    for i in 1..sorted_values.len() {
        if sorted_values[i] == sorted_values[i - 1] + 1 {
            consecutive += 1;
            if consecutive >= 5 {
                max_value = sorted_values[i];
            }
        } else {
            consecutive = 1;
        }
    }

    if max_value > 0 {
        return (true, Rank::from_value(max_value));
    }

    (false, Rank::Two)
}

/// 比较两手底牌在同一公共牌下的强弱
pub fn compare_hands(
    hand1: &(Card, Card),
    hand2: &(Card, Card),
    community_cards: &[Card],
) -> Ordering {
    evaluate_hand(hand1, community_cards).cmp(&evaluate_hand(hand2, community_cards))
}
