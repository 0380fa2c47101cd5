use rstest::rstest;

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

/// 发牌从牌堆尾部弹出；按想要的发牌次序写牌，倒转后即为牌堆
fn deck_from_pop_order(order: &[&str]) -> Vec<Card> {
    order.iter().rev().map(|s| card(s)).collect()
}

fn three_player_table() -> Table {
    let mut table = Table::new("t1", BettingMode::NoLimit, 10, 20, 0);
    table.add_player("a", "Alice", 1000).unwrap();
    table.add_player("b", "Bob", 1000).unwrap();
    table.add_player("c", "Carol", 1000).unwrap();
    table
}

#[test]
fn test_new_hand_setup() {
    let mut table = three_player_table();
    table.start_hand().unwrap();

    assert_eq!(table.phase, TablePhase::InHand);
    assert!(table.players.iter().all(|p| p.cards.is_some()));
    assert!(table.players[0].is_dealer);
    assert!(table.players[1].is_sb && table.players[1].current_bet == 10);
    assert!(table.players[2].is_bb && table.players[2].current_bet == 20);

    let hand = table.hand.as_ref().unwrap();
    assert_eq!(hand.stage, GameStage::PreFlop);
    assert_eq!(hand.current_bet, 20);
    assert_eq!(hand.acting_idx, 0); // 枪口位在大盲左侧
    // 发了6张底牌
    assert_eq!(hand.deck.len(), 46);
}

#[test]
fn test_cannot_start_with_one_player() {
    let mut table = Table::new("t1", BettingMode::NoLimit, 10, 20, 0);
    table.add_player("a", "Alice", 1000).unwrap();
    assert_eq!(table.start_hand(), Err(GameError::NotEnoughPlayers));
}

#[test]
fn test_cannot_start_mid_hand() {
    let mut table = three_player_table();
    table.start_hand().unwrap();
    assert_eq!(table.start_hand(), Err(GameError::StageError));
}

#[rstest]
#[case(PlayerAction::Fold, 995, 1005)] // 按钮弃牌，大盲不亮牌赢下盲注
#[case(PlayerAction::Call, 990, 990)] // 按钮跟注补齐大盲
fn test_heads_up_preflop_actions(
    #[case] action: PlayerAction,
    #[case] expected_a_chips: u32,
    #[case] expected_b_chips: u32,
) {
    let mut table = Table::new("t1", BettingMode::NoLimit, 5, 10, 0);
    table.add_player("a", "Alice", 1000).unwrap();
    table.add_player("b", "Bob", 1000).unwrap();
    table.start_hand().unwrap();

    // 单挑时按钮是小盲，翻牌前先行动
    table.handle_action("a", action).unwrap();

    assert_eq!(table.players[0].chips, expected_a_chips);
    assert_eq!(table.players[1].chips, expected_b_chips);
}

#[test]
fn test_uncontested_fold_awards_blinds() {
    // A按钮，B小盲，C大盲：A、B相继弃牌，C白拿30
    let mut table = three_player_table();
    table.start_hand().unwrap();

    table.handle_action("a", PlayerAction::Fold).unwrap();
    let outcome = table.handle_action("b", PlayerAction::Fold).unwrap();

    let ActionOutcome::HandComplete(result) = outcome else {
        panic!("hand should end uncontested");
    };
    assert_eq!(result.winners.len(), 1);
    assert_eq!(result.winners[0].name, "Carol");
    assert_eq!(result.winners[0].amount, 30);
    assert_eq!(result.winners[0].hand_name, None, "不亮牌");
    assert!(result.revealed.is_empty());

    assert_eq!(table.players[0].chips, 1000);
    assert_eq!(table.players[1].chips, 990);
    assert_eq!(table.players[2].chips, 1010);
    assert_eq!(table.phase, TablePhase::BetweenHands);
    assert!(table.hand.is_none());
}

#[test]
fn test_full_hand_to_showdown() {
    let mut table = Table::new("t1", BettingMode::NoLimit, 10, 20, 0);
    table.add_player("a", "Alice", 1000).unwrap();
    table.add_player("b", "Bob", 1000).unwrap();

    // 单挑发牌次序：A、B各两张，然后烧牌/公共牌
    let deck = deck_from_pop_order(&[
        "As", "Kd", "Ah", "Kc", // 底牌
        "2d", "7s", "9c", "3h", // 烧牌+翻牌
        "4d", "5h", // 烧牌+转牌
        "6c", "8s", // 烧牌+河牌
    ]);
    table.start_hand_with_deck(deck).unwrap();

    // 翻牌前：小盲跟注，大盲过牌
    table.handle_action("a", PlayerAction::Call).unwrap();
    assert_eq!(
        table.handle_action("b", PlayerAction::Check).unwrap(),
        ActionOutcome::StreetAdvanced
    );
    assert_eq!(table.hand.as_ref().unwrap().community_cards.len(), 3);

    // 三条街双方都过牌
    for _ in 0..2 {
        table.handle_action("b", PlayerAction::Check).unwrap();
        table.handle_action("a", PlayerAction::Check).unwrap();
    }
    table.handle_action("b", PlayerAction::Check).unwrap();
    let outcome = table.handle_action("a", PlayerAction::Check).unwrap();

    let ActionOutcome::HandComplete(result) = outcome else {
        panic!("river check should reach showdown");
    };
    // AA 胜 KK
    assert_eq!(result.winners.len(), 1);
    assert_eq!(result.winners[0].name, "Alice");
    assert_eq!(result.winners[0].amount, 40);
    assert_eq!(result.winners[0].hand_name.as_deref(), Some("One Pair"));
    // 摊牌双方都亮牌
    assert_eq!(result.revealed.len(), 2);

    assert_eq!(table.players[0].chips, 1020);
    assert_eq!(table.players[1].chips, 980);
}

#[test]
fn test_all_in_main_pot_only() {
    // A=100全下，B、C跟注后两人把剩下的街过完
    let mut table = Table::new("t1", BettingMode::NoLimit, 5, 10, 0);
    table.add_player("a", "Alice", 100).unwrap();
    table.add_player("b", "Bob", 500).unwrap();
    table.add_player("c", "Carol", 500).unwrap();

    let deck = deck_from_pop_order(&[
        "Kd", "Jh", "As", "Qc", "Ts", "Ah", // 底牌：B、C、A 轮流
        "6h", "2s", "3d", "8h", // 烧牌+翻牌
        "6s", "9c", // 烧牌+转牌
        "6d", "4s", // 烧牌+河牌
    ]);
    table.start_hand_with_deck(deck).unwrap();

    table.handle_action("a", PlayerAction::AllIn).unwrap();
    table.handle_action("b", PlayerAction::Call).unwrap();
    assert_eq!(
        table.handle_action("c", PlayerAction::Call).unwrap(),
        ActionOutcome::StreetAdvanced
    );

    // B、C把三条街过完
    let mut last = None;
    for _ in 0..3 {
        table.handle_action("b", PlayerAction::Check).unwrap();
        last = Some(table.handle_action("c", PlayerAction::Check).unwrap());
    }

    let Some(ActionOutcome::HandComplete(result)) = last else {
        panic!("board should run out to showdown");
    };
    // 三人投入相等，只有一个主池，A的对A赢下300
    assert_eq!(result.winners.len(), 1);
    assert_eq!(result.winners[0].name, "Alice");
    assert_eq!(result.winners[0].amount, 300);
    assert_eq!(table.players[0].chips, 300);
    assert_eq!(table.players[1].chips, 400);
    assert_eq!(table.players[2].chips, 400);
}

#[test]
fn test_chip_conservation_through_hand() {
    let mut table = three_player_table();
    table.start_hand().unwrap();
    let total = |t: &Table| -> u32 {
        t.players
            .iter()
            .map(|p| p.chips + p.total_contributed)
            .sum()
    };

    assert_eq!(total(&table), 3000);
    table.handle_action("a", PlayerAction::Raise(60)).unwrap();
    assert_eq!(total(&table), 3000);
    table.handle_action("b", PlayerAction::Call).unwrap();
    assert_eq!(total(&table), 3000);
    table.handle_action("c", PlayerAction::Fold).unwrap();
    assert_eq!(total(&table), 3000);

    // 翻牌圈
    table.handle_action("b", PlayerAction::Bet(100)).unwrap();
    let outcome = table.handle_action("a", PlayerAction::Fold).unwrap();
    assert!(matches!(outcome, ActionOutcome::HandComplete(_)));
    let final_total: u32 = table.players.iter().map(|p| p.chips).sum();
    assert_eq!(final_total, 3000);
}

#[test]
fn test_antes_collected_before_blinds() {
    let mut table = Table::new("t1", BettingMode::NoLimit, 10, 20, 5);
    table.add_player("a", "Alice", 1000).unwrap();
    table.add_player("b", "Bob", 1000).unwrap();
    table.add_player("c", "Carol", 1000).unwrap();
    table.start_hand().unwrap();

    // 前注直接进池，不算本条街的注
    assert_eq!(table.players[0].total_contributed, 5);
    assert_eq!(table.players[0].current_bet, 0);
    assert_eq!(table.players[1].total_contributed, 15);
    assert_eq!(table.players[2].total_contributed, 25);

    let pots = table.pots();
    assert_eq!(pots.len(), 1);
    assert_eq!(pots[0].amount, 15);

    // 历史里前注排在盲注之前
    let history = &table.hand.as_ref().unwrap().history;
    assert_eq!(history[0].kind, ActionKind::Ante);
    assert_eq!(history[3].kind, ActionKind::SmallBlind);
    assert_eq!(history[4].kind, ActionKind::BigBlind);
}

#[test]
fn test_dealer_button_rotates_between_hands() {
    let mut table = three_player_table();
    table.start_hand().unwrap();
    assert_eq!(table.dealer_idx, 0);

    table.handle_action("a", PlayerAction::Fold).unwrap();
    table.handle_action("b", PlayerAction::Fold).unwrap();

    table.start_hand().unwrap();
    assert_eq!(table.dealer_idx, 1);
    assert!(table.players[1].is_dealer);
    assert!(table.players[2].is_sb);
    assert!(table.players[0].is_bb);
    // 新一局枪口位是大盲左侧
    assert_eq!(table.hand.as_ref().unwrap().acting_idx, 1);
}

#[test]
fn test_leaving_player_is_folded_out() {
    let mut table = three_player_table();
    table.start_hand().unwrap();

    // 行动位玩家离开等于弃牌
    let outcome = table.fold_out("a").unwrap();
    assert!(matches!(outcome, Some(ActionOutcome::Continue)));
    assert_eq!(table.players[0].status, PlayerStatus::Folded);
    assert_eq!(table.hand.as_ref().unwrap().acting_idx, 1);

    // 剩下一人时直接结束
    let outcome = table.fold_out("b").unwrap();
    assert!(matches!(outcome, Some(ActionOutcome::HandComplete(_))));
    assert_eq!(table.players[2].chips, 1010);

    // 两局之间才能真正拆座
    table.remove_player("a").unwrap();
    assert_eq!(table.players.len(), 2);
    assert_eq!(table.seat_of("b"), Some(0));
}

#[test]
fn test_first_seated_player_owns_the_room() {
    let mut table = three_player_table();
    assert!(table.is_owner("a"));
    assert!(!table.is_owner("b"));

    table.remove_player("b").unwrap();
    assert!(table.is_owner("a"));
}

#[test]
fn test_everyone_all_in_runs_board_out() {
    // 三人全下，无人可再行动，直接发完摊牌
    let mut table = Table::new("t1", BettingMode::NoLimit, 10, 20, 0);
    table.add_player("a", "Alice", 500).unwrap();
    table.add_player("b", "Bob", 300).unwrap();
    table.add_player("c", "Carol", 200).unwrap();
    table.start_hand().unwrap();

    table.handle_action("a", PlayerAction::AllIn).unwrap();
    table.handle_action("b", PlayerAction::AllIn).unwrap();
    let outcome = table.handle_action("c", PlayerAction::AllIn).unwrap();

    let ActionOutcome::HandComplete(result) = outcome else {
        panic!("three all-ins must run the board out");
    };
    assert!(!result.winners.is_empty());
    let final_total: u32 = table.players.iter().map(|p| p.chips).sum();
    assert_eq!(final_total, 1000);
}
