use std::cmp::Ordering;

use holdem_engine::rules::{compare_hands, evaluate_cards, evaluate_hand, HandRank};
use holdem_engine::*;

fn card(s: &str) -> Card {
    let bytes = s.as_bytes();
    let rank = match bytes[0] as char {
        '2' => Rank::Two,
        '3' => Rank::Three,
        '4' => Rank::Four,
        '5' => Rank::Five,
        '6' => Rank::Six,
        '7' => Rank::Seven,
        '8' => Rank::Eight,
        '9' => Rank::Nine,
        'T' => Rank::Ten,
        'J' => Rank::Jack,
        'Q' => Rank::Queen,
        'K' => Rank::King,
        'A' => Rank::Ace,
        _ => panic!("bad rank"),
    };
    let suit = match bytes[1] as char {
        's' => Suit::Spades,
        'h' => Suit::Hearts,
        'd' => Suit::Diamonds,
        'c' => Suit::Clubs,
        _ => panic!("bad suit"),
    };
    Card { suit, rank }
}

fn cards(list: &[&str]) -> Vec<Card> {
    list.iter().map(|s| card(s)).collect()
}

#[test]
fn test_royal_flush() {
    let player_cards = (card("Ah"), card("Kh"));
    let community_cards = cards(&["Qh", "Jh", "Th", "2d", "3c"]);

    let evaluation = evaluate_hand(&player_cards, &community_cards);
    assert_eq!(evaluation.rank, HandRank::RoyalFlush);
}

#[test]
fn test_straight_flush() {
    let player_cards = (card("9s"), card("8s"));
    let community_cards = cards(&["7s", "6s", "5s", "Kd", "Qc"]);

    let evaluation = evaluate_hand(&player_cards, &community_cards);
    assert_eq!(evaluation.rank, HandRank::StraightFlush);
    assert_eq!(evaluation.kickers, vec![Rank::Nine]);
}

#[test]
fn test_four_of_a_kind() {
    let player_cards = (card("Ah"), card("Ad"));
    let community_cards = cards(&["Ac", "As", "Kh", "2d", "3c"]);

    let evaluation = evaluate_hand(&player_cards, &community_cards);
    assert_eq!(evaluation.rank, HandRank::FourOfAKind);
    assert_eq!(evaluation.kickers, vec![Rank::Ace, Rank::King]);
}

#[test]
fn test_full_house() {
    let player_cards = (card("Kh"), card("Kd"));
    let community_cards = cards(&["Kc", "Qs", "Qh", "2d", "3c"]);

    let evaluation = evaluate_hand(&player_cards, &community_cards);
    assert_eq!(evaluation.rank, HandRank::FullHouse);
    assert_eq!(evaluation.kickers, vec![Rank::King, Rank::Queen]);
}

#[test]
fn test_flush() {
    let player_cards = (card("Ah"), card("Th"));
    let community_cards = cards(&["Kh", "Qh", "Jd", "2h", "3c"]);

    let evaluation = evaluate_hand(&player_cards, &community_cards);
    assert_eq!(evaluation.rank, HandRank::Flush);
    assert_eq!(
        evaluation.kickers,
        vec![Rank::Ace, Rank::King, Rank::Queen, Rank::Ten, Rank::Two]
    );
}

#[test]
fn test_straight() {
    let player_cards = (card("Th"), card("9d"));
    let community_cards = cards(&["8c", "7s", "6h", "2d", "3c"]);

    let evaluation = evaluate_hand(&player_cards, &community_cards);
    assert_eq!(evaluation.rank, HandRank::Straight);
    assert_eq!(evaluation.kickers, vec![Rank::Ten]);
}

#[test]
fn test_straight_ace_low() {
    let player_cards = (card("Ah"), card("2d"));
    let community_cards = cards(&["3c", "4s", "5h", "Kd", "Qc"]);

    let evaluation = evaluate_hand(&player_cards, &community_cards);
    assert_eq!(evaluation.rank, HandRank::Straight);
    assert_eq!(evaluation.kickers, vec![Rank::Five]); // A-5顺子，最大牌是5
}

#[test]
fn test_wheel_loses_to_six_high_straight() {
    let wheel = evaluate_cards(&cards(&["Ah", "2d", "3c", "4s", "5h"]));
    let six_high = evaluate_cards(&cards(&["2s", "3d", "4h", "5c", "6s"]));
    let no_pair = evaluate_cards(&cards(&["Ah", "Kd", "9c", "5s", "2h"]));

    assert!(wheel < six_high);
    assert!(wheel > no_pair); // 轮子顺虽小，也还是顺子
}

#[test]
fn test_three_of_a_kind() {
    let player_cards = (card("Jh"), card("Jd"));
    let community_cards = cards(&["Jc", "Ts", "9h", "2d", "3c"]);

    let evaluation = evaluate_hand(&player_cards, &community_cards);
    assert_eq!(evaluation.rank, HandRank::ThreeOfAKind);
    assert_eq!(evaluation.kickers, vec![Rank::Jack, Rank::Ten, Rank::Nine]);
}

#[test]
fn test_two_pair() {
    let player_cards = (card("Qh"), card("Qd"));
    let community_cards = cards(&["Tc", "Ts", "9h", "2d", "3c"]);

    let evaluation = evaluate_hand(&player_cards, &community_cards);
    assert_eq!(evaluation.rank, HandRank::TwoPair);
    assert_eq!(evaluation.kickers, vec![Rank::Queen, Rank::Ten, Rank::Nine]);
}

#[test]
fn test_one_pair() {
    let player_cards = (card("Ah"), card("Ad"));
    let community_cards = cards(&["Kc", "Qs", "Jh", "2d", "3c"]);

    let evaluation = evaluate_hand(&player_cards, &community_cards);
    assert_eq!(evaluation.rank, HandRank::OnePair);
    // 一对的踢脚牌只取三张
    assert_eq!(
        evaluation.kickers,
        vec![Rank::Ace, Rank::King, Rank::Queen, Rank::Jack]
    );
}

#[test]
fn test_high_card() {
    let player_cards = (card("Ah"), card("Kd"));
    let community_cards = cards(&["Qc", "Js", "9h", "2d", "3c"]);

    let evaluation = evaluate_hand(&player_cards, &community_cards);
    assert_eq!(evaluation.rank, HandRank::HighCard);
    assert_eq!(
        evaluation.kickers,
        vec![Rank::Ace, Rank::King, Rank::Queen, Rank::Jack, Rank::Nine]
    );
}

#[test]
fn test_evaluation_stable_under_permutation() {
    let mut seven = cards(&["Ah", "Kh", "Qh", "Jh", "Th", "2d", "3c"]);
    let reference = evaluate_cards(&seven);

    seven.reverse();
    assert_eq!(evaluate_cards(&seven), reference);

    seven.swap(0, 3);
    seven.swap(2, 6);
    assert_eq!(evaluate_cards(&seven), reference);
}

#[test]
fn test_same_seven_cards_same_value() {
    // 两个玩家拿到同样七张牌的不同划分，结果必须一致
    let board = cards(&["8c", "8d", "Kh", "Kd", "2s"]);
    let eval_x = evaluate_hand(&(card("As"), card("Qc")), &board);

    let board_y = cards(&["As", "Qc", "Kh", "Kd", "2s"]);
    let eval_y = evaluate_hand(&(card("8c"), card("8d")), &board_y);

    assert_eq!(eval_x, eval_y);
}

#[test]
fn test_compare_hands_breaks_ties_on_kickers() {
    // 同样的两对，踢脚牌Q对J
    let board = cards(&["Ah", "Ad", "Kc", "7c", "2s"]);
    let stronger = (card("Qd"), card("3c"));
    let weaker = (card("Jd"), card("4c"));

    assert_eq!(compare_hands(&stronger, &weaker, &board), Ordering::Greater);
    assert_eq!(compare_hands(&weaker, &stronger, &board), Ordering::Less);
    assert_eq!(compare_hands(&stronger, &stronger, &board), Ordering::Equal);
}

#[test]
fn test_best_five_of_seven_prefers_flush_over_straight() {
    let player_cards = (card("9h"), card("8h"));
    let community_cards = cards(&["7h", "6s", "5h", "2h", "Td"]);

    // 同时存在顺子和同花，取同花
    let evaluation = evaluate_hand(&player_cards, &community_cards);
    assert_eq!(evaluation.rank, HandRank::Flush);
}
