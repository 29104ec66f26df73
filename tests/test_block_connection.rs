//! Integration tests for wiring blocks together.

use anomblocks::blocks::{LabelTransformer, SequenceLearner};
use anomblocks::{
    AnomError, Block, BlockBaseAccess, BlockOutput, InputAccess, OutputAccess, CURR, PREV,
};
use std::cell::RefCell;
use std::rc::Rc;

fn learner(num_c: usize) -> SequenceLearner {
    SequenceLearner::new(num_c, 4, 4, 12, 6, 20, 2, 1, 2, false, 0)
}

#[test]
fn test_feedforward_requires_input() {
    let mut sl = learner(64);
    assert_eq!(sl.feedforward(true), Err(AnomError::NotConnected));
    assert_eq!(sl.feedforward(false), Err(AnomError::NotConnected));
    assert!(!sl.is_initialized());
}

#[test]
fn test_connect_width_mismatch() {
    let lt = LabelTransformer::new(26, 208, 2, 0);
    let mut sl = learner(100);

    assert_eq!(
        sl.connect_input(lt.output(), CURR),
        Err(AnomError::DimensionMismatch {
            expected: 100,
            actual: 208
        })
    );

    // Nothing was bound
    assert_eq!(sl.input().num_children(), 0);
    assert_eq!(sl.feedforward(true), Err(AnomError::NotConnected));
}

#[test]
fn test_connect_invalid_slot() {
    let lt = LabelTransformer::new(8, 64, 2, 0);
    let mut sl = learner(64);

    assert!(matches!(
        sl.connect_input(lt.output(), 2),
        Err(AnomError::InvalidParameter(_))
    ));
    assert_eq!(sl.input().num_children(), 0);
}

#[test]
fn test_narrow_input_rejected_at_connect() {
    let lt = LabelTransformer::new(26, 100, 2, 0);
    let mut sl = learner(208);

    assert_eq!(
        sl.connect_input(lt.output(), CURR),
        Err(AnomError::DimensionMismatch {
            expected: 208,
            actual: 100
        })
    );
    assert_eq!(sl.input().num_children(), 0);
    assert!(!sl.is_initialized());
    assert!(!sl.memory().is_initialized());
    assert!(sl.get_output_pattern().is_empty());
}

#[test]
fn test_second_encoder_rejected() {
    let mut lt_a = LabelTransformer::new(8, 64, 2, 0);
    let lt_b = LabelTransformer::new(4, 32, 2, 0);
    let mut sl = learner(64);
    sl.connect_input(lt_a.output(), CURR).unwrap();

    assert_eq!(
        sl.connect_input(lt_b.output(), CURR),
        Err(AnomError::DimensionMismatch {
            expected: 64,
            actual: 96
        })
    );
    assert_eq!(sl.input().get_source_blocks(), vec![lt_a.block_id()]);

    // The original binding still works
    lt_a.set_value(3).unwrap();
    lt_a.feedforward(false).unwrap();
    sl.feedforward(true).unwrap();
    assert_eq!(sl.input().state.get_acts(), (24..32).collect::<Vec<_>>());
    assert_eq!(sl.get_winner_pattern().len(), 8);
}

#[test]
fn test_previous_slot_lags_one_step() {
    let mut lt = LabelTransformer::new(8, 64, 2, 0);
    let mut sl = learner(64);
    sl.connect_input(lt.output(), PREV).unwrap();

    lt.set_value(2).unwrap();
    lt.feedforward(false).unwrap();
    lt.set_value(5).unwrap();
    lt.feedforward(false).unwrap();
    sl.feedforward(true).unwrap();

    assert_eq!(sl.input().state.get_acts(), (16..24).collect::<Vec<_>>());
}

#[test]
fn test_raw_output_source() {
    let mut output = BlockOutput::new();
    output.setup(2, 16);
    let output = Rc::new(RefCell::new(output));

    let mut sl = learner(16);
    sl.connect_input(Rc::clone(&output), CURR).unwrap();

    {
        let mut out = output.borrow_mut();
        out.step();
        out.state.set_acts(&[1, 5, 9]);
        out.store();
    }
    sl.feedforward(true).unwrap();

    assert_eq!(sl.get_anomaly_score(), 1.0);
    assert_eq!(sl.get_winner_pattern().len(), 3);
    assert_eq!(sl.output().borrow().source_block(), Some(sl.block_id()));
}
