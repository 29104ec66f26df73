//! End-to-end label anomaly scenario.
//!
//! The stream `aaaaabcdef` is repeated three times and the third repeat has `d`
//! replaced by `g`. Once the stream is learned the scores stay at zero until
//! the substitution, which must spike.

use anomblocks::blocks::{LabelTransformer, SequenceLearner};
use anomblocks::{Block, OutputAccess, WinnerPolicy};
use approx::assert_abs_diff_eq;
use itertools::Itertools;
use std::collections::HashMap;

const STREAM: &str = "aaaaabcdefaaaaabcdefaaaaabcgef";
const SPIKE: usize = 27;

fn encode_labels(symbols: &str) -> Vec<usize> {
    let table: HashMap<char, usize> = symbols
        .chars()
        .unique()
        .sorted()
        .enumerate()
        .map(|(i, c)| (c, i))
        .collect();
    symbols.chars().map(|c| table[&c]).collect()
}

fn run_scenario(policy: WinnerPolicy, always_update: bool, seed: u64) -> Vec<f64> {
    let mut lt = LabelTransformer::new(26, 208, 2, 0);
    let mut sl = SequenceLearner::new(208, 10, 10, 12, 6, 20, 2, 1, 2, always_update, seed)
        .with_policy(policy);
    sl.connect_input(lt.output(), 0).unwrap();

    encode_labels(STREAM)
        .into_iter()
        .map(|label| {
            lt.set_value(label).unwrap();
            lt.feedforward(false).unwrap();
            sl.feedforward(true).unwrap();
            sl.get_anomaly_score()
        })
        .collect()
}

fn check_scores(scores: &[f64]) {
    assert_eq!(scores.len(), STREAM.len());
    assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));

    // Nothing is known yet
    assert_abs_diff_eq!(scores[0], 1.0);

    // Third repeat up to the substitution is fully predicted
    for score in &scores[20..SPIKE] {
        assert_abs_diff_eq!(*score, 0.0);
    }

    assert_abs_diff_eq!(scores[SPIKE], 1.0);
    assert!(scores[SPIKE] > scores[SPIKE - 10]);

    // `e` after `g` was never seen either
    assert!(scores[SPIKE + 1] > 0.0);
}

#[test]
fn test_label_table() {
    let labels = encode_labels("aaaaabcdef");
    assert_eq!(labels, vec![0, 0, 0, 0, 0, 1, 2, 3, 4, 5]);
    assert_eq!(encode_labels(STREAM)[SPIKE], 6);
}

#[test]
fn test_substitution_spike() {
    for seed in 0..3 {
        check_scores(&run_scenario(WinnerPolicy::Random, false, seed));
    }
}

#[test]
fn test_substitution_spike_least_used() {
    check_scores(&run_scenario(WinnerPolicy::FewestDendrites, false, 0));
}

#[test]
fn test_substitution_spike_always_update() {
    check_scores(&run_scenario(WinnerPolicy::Random, true, 1));
}

#[test]
fn test_second_repeat_is_learned() {
    let scores = run_scenario(WinnerPolicy::Random, false, 4);

    // `a` after `f` is new on the second repeat, the rest was seen once
    assert_abs_diff_eq!(scores[10], 1.0);
    for score in &scores[11..20] {
        assert_abs_diff_eq!(*score, 0.0);
    }
}
