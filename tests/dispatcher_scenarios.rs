//! Cross-module scenarios driven through `Dispatcher::dispatch`, the
//! same surface a host process talks to.

use marseillais::basetypes::*;
use marseillais::board::Position;
use marseillais::chess_move::{Move, NORMAL};
use marseillais::engine::{Dispatcher, FindBestTurnRequest, Response};
use marseillais::search;
use marseillais::tt::TranspositionTable;

fn request(fen: &str, skill: u8, max_moves: u8) -> FindBestTurnRequest {
    FindBestTurnRequest {
        kind: "find_best_turn".to_string(),
        fen: fen.to_string(),
        skill,
        max_moves,
        request_id: "scenario".to_string(),
    }
}

#[test]
fn initial_position_with_two_moves_returns_a_legal_two_move_turn() {
    let mut dispatcher = Dispatcher::new();
    let req = request(
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        1,
        2,
    );
    match dispatcher.dispatch(&req) {
        Response::BestTurn { moves, .. } => {
            assert!(moves.len() == 1 || moves.len() == 2);
            for mv in &moves {
                assert_eq!(mv.from.len(), 2);
                assert_eq!(mv.to.len(), 2);
            }
        }
        other => panic!("expected a best turn, got: {:?}", other),
    }
}

#[test]
fn mate_in_one_turn_is_found_and_reported_with_check_suffix() {
    // Scholar's-mate-style setup: White queen on h5, Black's f7 pawn
    // gone, Black king boxed in on e8 behind an undeveloped back rank.
    // Qxf7 is mate.
    let fen = "rnbqkbnr/ppppp1pp/8/5pQ1/4P3/8/PPPP1PPP/RNB1KBNR w KQkq - 0 1";
    let mut dispatcher = Dispatcher::new();
    let req = request(fen, 2, 2);
    match dispatcher.dispatch(&req) {
        Response::BestTurn { moves, .. } => {
            let last = moves.last().expect("at least one move");
            assert!(last.san.ends_with('#'), "expected a mating san, got {}", last.san);
        }
        other => panic!("expected a best turn, got: {:?}", other),
    }
}

#[test]
fn material_up_a_whole_rook_avoids_repeating_into_a_draw() {
    // White, up a whole rook against a lone king, shuffles the rook
    // a1-a2-a1 while Black's king shuffles e8-d8-e8 in reply -- real
    // moves, actually played through `Position::make_move`, not a
    // freshly parsed FEN. After six half-moves the position (rook a2,
    // king e1, Black king d8, White to move) has occurred twice: once
    // after move 2, again now after move 6.
    let mut pos = Position::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
    let ra1_a2 = Move::new(square(FILE_A, RANK_1), square(FILE_A, RANK_2), EMPTY, EMPTY, NORMAL);
    let ra2_a1 = Move::new(square(FILE_A, RANK_2), square(FILE_A, RANK_1), EMPTY, EMPTY, NORMAL);
    let ke8_d8 = Move::new(square(FILE_E, RANK_8), square(FILE_D, RANK_8), EMPTY, EMPTY, NORMAL);
    let kd8_e8 = Move::new(square(FILE_D, RANK_8), square(FILE_E, RANK_8), EMPTY, EMPTY, NORMAL);

    for mv in [ra1_a2, ke8_d8, ra2_a1, kd8_e8, ra1_a2, ke8_d8] {
        pos.make_move(mv);
    }
    assert_eq!(pos.side_to_move(), WHITE);
    assert_eq!(pos.occurrences_of_current(), 2, "rook-a2/king-d8 position must have recurred once already");

    // From here, repeating the shuffle once more (Ra2-a1, then Black's
    // only sensible reply Kd8-e8) would make the *original* starting
    // position recur a third time -- a draw, which a side up a whole
    // rook should refuse when any other legal turn is available.
    let mut tt = TranspositionTable::with_capacity(1 << 16);
    let result = search::find_best_turn(&pos, 2, 1, &mut tt);
    let best = result.best_turn.expect("a legal turn must be found");
    assert_ne!(
        best.first(),
        ra2_a1,
        "the engine should not walk back into a position that lets Black force a draw by repetition"
    );
    assert!(
        result.score > 300,
        "score should still reflect a winning material lead, not a contempt-adjusted draw, got {}",
        result.score
    );
}

#[test]
fn invalid_fen_is_rejected_without_reaching_search() {
    let mut dispatcher = Dispatcher::new();
    let req = request("not-a-fen", 1, 1);
    match dispatcher.dispatch(&req) {
        Response::Error { message, .. } => assert!(message.to_lowercase().contains("fen")),
        other => panic!("garbage FEN must not produce a best turn, got {:?}", other),
    }
}

#[test]
fn max_moves_out_of_range_is_rejected() {
    let mut dispatcher = Dispatcher::new();
    let req = request("4k3/8/8/8/8/8/8/R3K3 w - - 0 1", 1, 5);
    match dispatcher.dispatch(&req) {
        Response::Error { message, .. } => assert!(message.contains("max_moves")),
        other => panic!("expected rejection, got {:?}", other),
    }
}
