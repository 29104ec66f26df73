//! Anomblocks - Label sequence anomaly detection with binary patterns.
//!
//! Anomblocks models activity with **binary patterns** (sparse vectors of 1s and
//! 0s) flowing between blocks. A `LabelTransformer` turns each label of a stream
//! into a pattern and a `SequenceLearner` learns which pattern follows which,
//! scoring every step by the fraction of its input it failed to predict.
//!
//! # Architecture
//!
//! - **BitField**: Bit-level pattern storage on 32-bit words
//! - **Block System**: Blocks with a step → pull → compute → store → learn lifecycle
//! - **BlockMemory**: Dendrites with permanence-weighted receptors
//! - **Blocks**: `LabelTransformer` and `SequenceLearner`
//!
//! # Examples
//!
//! ```
//! use anomblocks::blocks::{LabelTransformer, SequenceLearner};
//! use anomblocks::{Block, OutputAccess};
//!
//! let mut lt = LabelTransformer::new(4, 32, 2, 0);
//! let mut sl = SequenceLearner::new(32, 4, 4, 12, 6, 20, 2, 1, 2, false, 0);
//! sl.connect_input(lt.output(), 0)?;
//!
//! for label in [0, 1, 2, 3, 0, 1, 2, 3, 0, 1, 2, 3] {
//!     lt.set_value(label)?;
//!     lt.feedforward(false)?;
//!     sl.feedforward(true)?;
//! }
//!
//! // The cycle is learned
//! assert_eq!(sl.get_anomaly_score(), 0.0);
//! # Ok::<(), anomblocks::AnomError>(())
//! ```
//!
//! # Safety
//!
//! Hot paths check indices with `debug_assert!`; release builds rely on the
//! bounds validated at construction.

pub mod bitfield;
pub mod error;

// Block infrastructure
pub mod block;
pub mod block_base;
pub mod block_input;
pub mod block_output;
pub mod block_memory;
pub mod config;

pub mod blocks;

// Re-exports for convenient access
pub use bitfield::{BitField, Word, BITS_PER_WORD};
pub use error::{AnomError, Result};

pub use block::Block;
pub use block_base::{BlockBase, BlockBaseAccess};
pub use block_input::{BlockInput, ChildInfo, InputAccess};
pub use block_output::{BlockOutput, OutputAccess, CURR, PREV};
pub use block_memory::{BlockMemory, PERM_MAX, PERM_MIN};
pub use config::{LabelTransformerConfig, SequenceLearnerConfig, WinnerPolicy};

pub use blocks::{LabelTransformer, SequenceLearner};

/// Sorted indices of the active bits of a pattern
pub type SparsePattern = Vec<usize>;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = "Anomblocks";

/// Get version string
pub fn version() -> String {
    format!("{} v{}", NAME, VERSION)
}
