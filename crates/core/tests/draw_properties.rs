use randomizer_core::{
    draw_lottery_numbers, DraftPhase, DraftState, DrawError, RngState, WeightMode, WeightedPool,
};
use std::collections::HashSet;

fn percent_pool(entries: &[(&str, f64)]) -> WeightedPool {
    WeightedPool::from_entries(
        WeightMode::Percentage,
        entries.iter().map(|(label, _)| label.to_string()).collect(),
        entries.iter().map(|(_, weight)| *weight).collect(),
    )
    .expect("pool")
}

fn sorted_labels(picks: &[randomizer_core::Pick]) -> Vec<String> {
    let mut labels: Vec<String> = picks.iter().map(|pick| pick.label.clone()).collect();
    labels.sort();
    labels
}

macro_rules! frequency_case {
    ($name:ident, $mode:expr, $weights:expr) => {
        #[test]
        fn $name() {
            let weights: Vec<f64> = $weights;
            let labels: Vec<String> = (0..weights.len()).map(|i| format!("opt{i}")).collect();
            let pool =
                WeightedPool::from_entries($mode, labels, weights.clone())
                    .expect("pool");
            let total: f64 = weights.iter().sum();
            let mut rng = RngState::from_seed(0xBEEF);
            let trials = 50_000;
            let mut counts = vec![0usize; weights.len()];
            for _ in 0..trials {
                counts[pool.draw_one(&mut rng).expect("draw").index] += 1;
            }
            for (count, weight) in counts.iter().zip(&weights) {
                let observed = *count as f64 / trials as f64;
                let expected = weight / total;
                assert!(
                    (observed - expected).abs() < 0.015,
                    "observed {observed} expected {expected} in {counts:?}"
                );
            }
        }
    };
}

frequency_case!(frequency_even_pair, WeightMode::Percentage, vec![50.0, 50.0]);
frequency_case!(
    frequency_skewed_triple,
    WeightMode::Percentage,
    vec![50.0, 30.0, 20.0]
);
frequency_case!(
    frequency_unnormalized,
    WeightMode::Percentage,
    vec![10.0, 5.0, 5.0]
);
frequency_case!(
    frequency_with_zero,
    WeightMode::Percentage,
    vec![0.0, 75.0, 25.0]
);
frequency_case!(frequency_whole_three_to_one, WeightMode::WholeNumber, vec![3.0, 1.0]);
frequency_case!(
    frequency_whole_mixed,
    WeightMode::WholeNumber,
    vec![7.0, 2.0, 1.0, 10.0]
);

#[test]
fn scenario_abc_full_draft_without_replacement() {
    let pool = percent_pool(&[("A", 50.0), ("B", 30.0), ("C", 20.0)]);
    let mut rng = RngState::from_seed(99);
    for _ in 0..200 {
        let picks = pool.draw_many(3, false, &mut rng).expect("draw");
        assert_eq!(sorted_labels(&picks), ["A", "B", "C"]);
    }
}

#[test]
fn scenario_all_zero_weights() {
    let pool = percent_pool(&[("X", 0.0), ("Y", 0.0)]);
    let mut rng = RngState::from_seed(1);
    assert_eq!(pool.draw_one(&mut rng), Err(DrawError::AllZeroWeights));
}

#[test]
fn full_draft_is_permutation_for_many_sizes() {
    let mut rng = RngState::from_seed(12);
    for n in 1..=15 {
        let labels: Vec<String> = (0..n).map(|i| format!("p{i}")).collect();
        let pool = WeightedPool::with_labels(WeightMode::WholeNumber, labels.clone()).expect("pool");
        let picks = pool.draw_many(n, false, &mut rng).expect("draw");
        let unique: HashSet<_> = picks.iter().map(|pick| pick.index).collect();
        assert_eq!(unique.len(), n);
        let mut expected = labels;
        expected.sort();
        assert_eq!(sorted_labels(&picks), expected);
    }
}

#[test]
fn whole_number_full_draft_is_permutation() {
    let labels: Vec<String> = ["w", "x", "y", "z"].iter().map(|l| l.to_string()).collect();
    let pool = WeightedPool::from_entries(
        WeightMode::WholeNumber,
        labels.clone(),
        vec![5.0, 3.0, 1.0, 1.0],
    )
    .expect("pool");
    let mut rng = RngState::from_seed(31);
    for _ in 0..200 {
        let picks = pool.draw_many(pool.len(), false, &mut rng).expect("draw");
        assert_eq!(sorted_labels(&picks), labels);
    }
}

#[test]
fn first_pick_frequency_follows_weights_in_draft() {
    let pool = percent_pool(&[("heavy", 80.0), ("light", 20.0)]);
    let mut rng = RngState::from_seed(77);
    let trials = 20_000;
    let mut heavy_first = 0;
    for _ in 0..trials {
        let mut draft = DraftState::new();
        if draft.advance(&pool, &mut rng).expect("pick").label == "heavy" {
            heavy_first += 1;
        }
    }
    let observed = heavy_first as f64 / trials as f64;
    assert!((observed - 0.8).abs() < 0.02, "observed {observed}");
}

#[test]
fn draft_and_draw_many_agree_on_completeness() {
    let pool = percent_pool(&[("a", 10.0), ("b", 20.0), ("c", 30.0), ("d", 40.0)]);
    let mut rng = RngState::from_seed(5);
    let mut draft = DraftState::new();
    while draft.phase() != DraftPhase::Complete {
        draft.advance(&pool, &mut rng).expect("advance");
    }
    assert_eq!(sorted_labels(draft.picks()), ["a", "b", "c", "d"]);
    assert_eq!(draft.advance(&pool, &mut rng), Err(DrawError::DraftComplete));
}

#[test]
fn lottery_draws_are_well_formed() {
    let mut rng = RngState::from_seed(2024);
    let mut distinct_reds = HashSet::new();
    for _ in 0..1_000 {
        let numbers = draw_lottery_numbers(&mut rng);
        let unique: HashSet<_> = numbers.white_balls.iter().collect();
        assert_eq!(unique.len(), 5);
        assert!(numbers.white_balls.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(numbers.white_balls.iter().all(|ball| (1..=69).contains(ball)));
        assert!((1..=26).contains(&numbers.red_ball));
        distinct_reds.insert(numbers.red_ball);
    }
    assert_eq!(distinct_reds.len(), 26);
}
