mod common;

use common::{fools_mate, fools_mate_lines, scholars_mate, ShakmatyEngine};
use movebranch_core::features::feature_index;
use movebranch_core::{
    CountStrategy, GameRecord, PairLabel, RecordError, SampleDistribution, TrainGame,
    FEATURE_COUNT,
};
use movebranch_worker::branch::build_branch;
use movebranch_worker::stages::build_train_game;
use movebranch_worker::WorkerError;

#[tokio::test]
async fn test_branch_at_mating_move() {
    let mut engine = ShakmatyEngine::new();
    let branch = build_branch(&mut engine, &fools_mate(1), 3, 6, 20).await.unwrap();

    assert_eq!(branch.ply(), 3);
    assert_eq!(branch.init_move_line(), &["f2f3", "e7e6", "g2g4"]);
    assert_eq!(branch.true_continuation(), &["d8h4"]);
    assert_eq!(branch.alt_continuations().len(), 29);
    assert_eq!(branch.alt_continuations_features().len(), 29);
    for line in branch.alt_continuations() {
        assert_ne!(line[0], "d8h4");
        assert!(line.len() <= 7);
    }

    let pawn = feature_index("material/pawn").unwrap();
    let queen = feature_index("material/queen").unwrap();
    let features = branch.true_continuation_features().values();
    assert_eq!((features[pawn].white, features[pawn].black), (8, 8));
    assert_eq!((features[queen].white, features[queen].black), (1, 1));
}

#[tokio::test]
async fn test_branch_true_continuation_follows_engine() {
    let mut engine = ShakmatyEngine::new();
    let branch = build_branch(&mut engine, &scholars_mate(2), 0, 2, 20).await.unwrap();

    assert!(branch.init_move_line().is_empty());
    assert_eq!(branch.true_continuation()[0], "e2e4");
    assert_eq!(branch.true_continuation().len(), 3);
    assert_eq!(branch.alt_continuations().len(), 19);
    assert!(branch.alt_continuations().iter().all(|l| l.len() == 3));
}

#[tokio::test]
async fn test_branch_ply_out_of_range() {
    let mut engine = ShakmatyEngine::new();
    let err = build_branch(&mut engine, &fools_mate(3), 4, 2, 20)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        WorkerError::Record(RecordError::IndexOutOfRange { index: 4, len: 4 })
    ));
}

#[tokio::test]
async fn test_train_game_round_trip() {
    let mut engine = ShakmatyEngine::new();
    let game = build_train_game(
        &mut engine,
        fools_mate(4),
        SampleDistribution::Normal,
        CountStrategy::Exact(2),
        7,
        2,
        20,
    )
    .await
    .unwrap();

    assert_eq!(game.sampled_plies(), &[1, 3]);
    assert_eq!(game.branches()[0].alt_continuations().len(), 19);
    assert_eq!(game.branches()[1].true_continuation(), &["d8h4"]);

    let lines = game.to_lines();
    assert!(lines.starts_with(&game.record().to_lines()));
    assert_eq!(TrainGame::from_lines(&lines).unwrap(), game);
}

#[tokio::test]
async fn test_train_game_samples_winner_plies_only() {
    let mut engine = ShakmatyEngine::new();
    let game = build_train_game(
        &mut engine,
        scholars_mate(5),
        SampleDistribution::Uniform,
        CountStrategy::Percentage(50.0),
        11,
        1,
        20,
    )
    .await
    .unwrap();

    assert_eq!(game.sampled_plies().len(), 2);
    assert!(game.sampled_plies().iter().all(|p| p % 2 == 0));
    for (branch, &ply) in game.branches().iter().zip(game.sampled_plies()) {
        assert_eq!(branch.played_move(), game.move_line()[ply]);
    }
}

#[tokio::test]
async fn test_train_game_small_percentage_is_empty() {
    let mut engine = ShakmatyEngine::new();
    let game = build_train_game(
        &mut engine,
        fools_mate(6),
        SampleDistribution::Normal,
        CountStrategy::Percentage(10.0),
        1,
        6,
        20,
    )
    .await
    .unwrap();

    assert!(game.branches().is_empty());
    assert_eq!(engine.commands, 0);
    assert_eq!(TrainGame::from_lines(&game.to_lines()).unwrap(), game);
}

#[tokio::test]
async fn test_train_game_rejects_draw() {
    let mut lines = fools_mate_lines(7);
    lines[1] = "Result       1/2-1/2".to_string();
    let record = GameRecord::from_lines(&lines).unwrap();

    let mut engine = ShakmatyEngine::new();
    let err = build_train_game(
        &mut engine,
        record,
        SampleDistribution::Normal,
        CountStrategy::Exact(1),
        1,
        6,
        20,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, WorkerError::Record(RecordError::NoWinner(7))));
}

#[tokio::test]
async fn test_comparison_rows_are_symmetric() {
    let mut engine = ShakmatyEngine::new();
    let game = build_train_game(
        &mut engine,
        scholars_mate(8),
        SampleDistribution::Normal,
        CountStrategy::Exact(4),
        3,
        2,
        20,
    )
    .await
    .unwrap();

    let rows = game.comparison_rows();
    let alternatives: usize = game
        .branches()
        .iter()
        .map(|b| b.alt_continuations().len())
        .sum();
    assert_eq!(rows.len(), 2 * alternatives);

    for pair in rows.chunks(2) {
        assert_eq!(pair[0].label, PairLabel::Left);
        assert_eq!(pair[1].label, PairLabel::Right);
        assert!(pair[0]
            .values
            .iter()
            .zip(&pair[1].values)
            .all(|(a, b)| *a == -*b));
    }
}

#[tokio::test]
async fn test_capture_shows_in_comparison_row() {
    let mut engine = ShakmatyEngine::new();
    // h5f7 wins a pawn; only the other pawn captures keep up with it
    let branch = build_branch(&mut engine, &scholars_mate(9), 6, 0, 20).await.unwrap();
    let pawn = feature_index("material/pawn").unwrap();

    assert_eq!(branch.true_continuation(), &["h5f7"]);
    for (line, rows) in branch
        .alt_continuations()
        .iter()
        .zip(branch.comparison_rows().chunks(2))
    {
        assert_eq!(line.len(), 1);
        let black_pawn_diff = rows[0].values[FEATURE_COUNT + pawn];
        let expected = match line[0].as_str() {
            "c4f7" | "h5e5" | "h5h7" => 0,
            _ => -1,
        };
        assert_eq!(black_pawn_diff, expected, "alternative {}", line[0]);
    }
}
