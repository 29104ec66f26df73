//! Integration tests for SequenceLearner driven by a LabelTransformer.

use anomblocks::blocks::{LabelTransformer, SequenceLearner};
use anomblocks::{Block, OutputAccess, SequenceLearnerConfig, WinnerPolicy, PERM_MAX};
use approx::assert_abs_diff_eq;

struct Detector {
    lt: LabelTransformer,
    sl: SequenceLearner,
}

impl Detector {
    fn new(policy: WinnerPolicy, seed: u64) -> Self {
        let lt = LabelTransformer::new(8, 64, 2, 0);
        let mut sl =
            SequenceLearner::new(64, 4, 4, 12, 6, 20, 2, 1, 2, false, seed).with_policy(policy);
        sl.connect_input(lt.output(), 0).unwrap();
        Self { lt, sl }
    }

    fn step(&mut self, label: usize, learn: bool) -> f64 {
        self.lt.set_value(label).unwrap();
        self.lt.feedforward(false).unwrap();
        self.sl.feedforward(learn).unwrap();
        self.sl.get_anomaly_score()
    }

    fn train_cycle(&mut self) -> Vec<f64> {
        (0..6)
            .flat_map(|_| [0, 1, 2])
            .map(|label| self.step(label, true))
            .collect()
    }
}

#[test]
fn test_cycle_is_learned() {
    for policy in [WinnerPolicy::Random, WinnerPolicy::FewestDendrites] {
        for seed in 0..4 {
            let mut det = Detector::new(policy, seed);
            let scores = det.train_cycle();

            for score in &scores[..4] {
                assert_abs_diff_eq!(*score, 1.0);
            }
            for score in &scores[4..] {
                assert_abs_diff_eq!(*score, 0.0);
            }
        }
    }
}

#[test]
fn test_substitution_is_anomalous() {
    let mut det = Detector::new(WinnerPolicy::Random, 7);
    det.train_cycle();

    assert_abs_diff_eq!(det.step(0, true), 0.0);
    assert_abs_diff_eq!(det.step(5, true), 1.0);
}

#[test]
fn test_inference_after_training() {
    let mut det = Detector::new(WinnerPolicy::Random, 3);
    det.train_cycle();
    let perms_before = det.sl.memory().all_perms().to_vec();

    for label in [0, 1, 2, 0, 1, 2] {
        assert_abs_diff_eq!(det.step(label, false), 0.0);
    }
    assert_eq!(det.sl.memory().all_perms(), perms_before.as_slice());
}

#[test]
fn test_prediction_names_next_label() {
    let mut det = Detector::new(WinnerPolicy::Random, 11);
    det.train_cycle();
    det.step(0, true);

    // Label 1 owns columns 8..16, i.e. statelets 32..64
    let predicted = det.sl.get_predicted_pattern();
    assert!(!predicted.is_empty());
    assert!(predicted.iter().all(|&s| (32..64).contains(&s)));
}

#[test]
fn test_one_winner_per_active_column() {
    let mut det = Detector::new(WinnerPolicy::Random, 5);
    for label in [0, 1, 2, 0, 1, 2, 4] {
        det.step(label, true);

        let winners = det.sl.get_winner_pattern();
        let output = det.sl.get_output_pattern();
        assert_eq!(winners.len(), 8);
        for (i, &s) in winners.iter().enumerate() {
            assert_eq!(s / 4, label * 8 + i);
            assert!(output.contains(&s));
        }
    }
}

#[test]
fn test_repeated_label_settles() {
    for always_update in [false, true] {
        let lt = LabelTransformer::new(8, 64, 2, 0);
        let mut sl = SequenceLearner::new(64, 4, 4, 12, 6, 20, 2, 1, 2, always_update, 2);
        sl.connect_input(lt.output(), 0).unwrap();
        let mut det = Detector { lt, sl };

        let scores: Vec<f64> = (0..5).map(|_| det.step(3, true)).collect();
        assert_abs_diff_eq!(scores[0], 1.0);
        assert_abs_diff_eq!(scores[1], 1.0);
        for score in &scores[2..] {
            assert_abs_diff_eq!(*score, 0.0);
        }
    }
}

#[test]
fn test_permanence_bounded() {
    let mut det = Detector::new(WinnerPolicy::Random, 0);
    for _ in 0..20 {
        det.train_cycle();
    }
    assert!(det.sl.memory().all_perms().iter().all(|&p| p <= PERM_MAX));
    assert!(det.sl.get_historical_count() <= det.sl.num_s());
}

#[test]
fn test_same_seed_same_scores() {
    let labels = [0, 3, 1, 3, 0, 2, 2, 5, 0, 3, 1, 3];

    let run = |seed| {
        let mut det = Detector::new(WinnerPolicy::Random, seed);
        labels.iter().map(|&l| det.step(l, true)).collect::<Vec<_>>()
    };
    assert_eq!(run(42), run(42));
}

#[test]
fn test_clear_forgets_context() {
    let mut det = Detector::new(WinnerPolicy::Random, 9);
    det.train_cycle();

    det.lt.clear();
    det.sl.clear();

    // Without context nothing is predicted, even a learned label
    assert_abs_diff_eq!(det.step(1, false), 1.0);
    // Memory survived: the learned successor is recognized again
    assert_abs_diff_eq!(det.step(2, false), 0.0);
}

#[test]
fn test_from_config() {
    let config = SequenceLearnerConfig {
        num_c: 64,
        num_spc: 4,
        num_dps: 4,
        policy: WinnerPolicy::FewestDendrites,
        ..Default::default()
    };
    let sl = SequenceLearner::from_config(&config).unwrap();
    assert_eq!(sl.num_s(), 256);
    assert_eq!(sl.policy(), WinnerPolicy::FewestDendrites);

    let bad = SequenceLearnerConfig {
        num_rpd: 4,
        d_thresh: 4,
        ..Default::default()
    };
    assert!(SequenceLearner::from_config(&bad).is_err());

    // A zero threshold would let never-learned receptors count as connected
    let bad = SequenceLearnerConfig {
        perm_thr: 0,
        ..config
    };
    assert!(SequenceLearner::from_config(&bad).is_err());
}
