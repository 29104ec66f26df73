//! Computational blocks for label anomaly detection.
//!
//! # Transformer Blocks
//!
//! - `LabelTransformer` - Encodes integer labels with disjoint patterns
//!
//! # Temporal Blocks
//!
//! - `SequenceLearner` - Learns transitions between patterns and scores
//!   how unexpected each step is
//!
//! # Examples
//!
//! ```
//! use anomblocks::blocks::LabelTransformer;
//! use anomblocks::Block;
//!
//! let mut lt = LabelTransformer::new(10, 100, 2, 0);
//! lt.set_value(4).unwrap();
//! lt.feedforward(false).unwrap();
//!
//! // Output has 10 active bits representing label 4
//! assert_eq!(lt.get_output_pattern(), (40..50).collect::<Vec<_>>());
//! ```

pub mod label_transformer;
pub mod sequence_learner;

pub use label_transformer::LabelTransformer;
pub use sequence_learner::SequenceLearner;
