//! LabelTransformer - Encodes integer labels into disjoint binary patterns.
//!
//! The output space of `num_s` statelets is split into `num_l` contiguous blocks
//! of `num_as = num_s / num_l` statelets. Label `l` activates exactly its block
//! `[l * num_as, (l + 1) * num_as)`; the `num_s % num_l` trailing statelets are
//! never used.
//!
//! # Semantic Properties
//!
//! - **Distinct**: two labels never share an active statelet
//! - **Deterministic**: a label always yields the same pattern
//! - **Uniform**: every label has the same number of active statelets
//!
//! # Examples
//!
//! ```
//! use anomblocks::blocks::LabelTransformer;
//! use anomblocks::Block;
//!
//! let mut lt = LabelTransformer::new(26, 208, 2, 0);
//!
//! lt.set_value(2).unwrap();
//! lt.feedforward(false).unwrap();
//! assert_eq!(lt.get_output_pattern(), (16..24).collect::<Vec<_>>());
//!
//! // Labels outside [0, num_l) are rejected
//! assert!(lt.set_value(26).is_err());
//! ```

use crate::block_base::{BlockBase, BlockBaseAccess};
use crate::block_output::{BlockOutput, OutputAccess};
use crate::config::LabelTransformerConfig;
use crate::error::{AnomError, Result};
use crate::{Block, SparsePattern};
use log::debug;
use std::cell::RefCell;
use std::rc::Rc;

/// Encodes labels `0..num_l` into disjoint blocks of active statelets.
///
/// # Performance
///
/// Encoding is a clear plus one range fill, and is skipped entirely when the
/// label did not change since the previous encode.
pub struct LabelTransformer {
    base: BlockBase,

    output: Rc<RefCell<BlockOutput>>,

    num_l: usize,  // Number of labels
    num_s: usize,  // Number of statelets
    num_as: usize, // Active statelets per label (num_s / num_l)

    value: usize,
    value_prev: Option<usize>, // Label of the last encode
}

impl LabelTransformer {
    /// Create a new LabelTransformer.
    ///
    /// # Arguments
    ///
    /// * `num_l` - Number of distinct labels
    /// * `num_s` - Number of statelets (output bits)
    /// * `num_t` - History depth (must be >= 2)
    /// * `seed` - RNG seed (the encoder makes no random choices)
    ///
    /// # Panics
    ///
    /// Panics if `num_l` == 0, `num_s` < `num_l` or `num_t` < 2. Use
    /// [`LabelTransformer::from_config`] for a fallible constructor.
    ///
    /// # Examples
    ///
    /// ```
    /// use anomblocks::blocks::LabelTransformer;
    ///
    /// let lt = LabelTransformer::new(26, 208, 2, 0);
    /// assert_eq!(lt.num_as(), 8);
    /// ```
    pub fn new(num_l: usize, num_s: usize, num_t: usize, seed: u64) -> Self {
        assert!(num_l > 0, "num_l must be > 0");
        assert!(num_s >= num_l, "num_s must be >= num_l");
        assert!(num_t >= 2, "num_t must be at least 2");

        let base = BlockBase::new(seed);

        let mut output = BlockOutput::new();
        output.setup(num_t, num_s);
        output.set_source_block(base.id());

        let mut lt = Self {
            base,
            output: Rc::new(RefCell::new(output)),
            num_l,
            num_s,
            num_as: num_s / num_l,
            value: 0,
            value_prev: None,
        };
        lt.base.set_initialized(true);

        lt
    }

    /// Build from a validated configuration.
    pub fn from_config(config: &LabelTransformerConfig) -> Result<Self> {
        config.validate()?;
        debug!(
            "building LabelTransformer: num_l={} num_s={}",
            config.num_l, config.num_s
        );
        Ok(Self::new(config.num_l, config.num_s, config.num_t, config.seed))
    }

    /// Set the label encoded by the next `feedforward()`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` if `value >= num_l`; the pending label is unchanged.
    pub fn set_value(&mut self, value: usize) -> Result<()> {
        if value >= self.num_l {
            return Err(AnomError::OutOfRange {
                value,
                limit: self.num_l,
            });
        }
        self.value = value;
        Ok(())
    }

    /// Pending label.
    pub fn get_value(&self) -> usize {
        self.value
    }

    /// Active statelets of the current output, ascending.
    pub fn get_output_pattern(&self) -> SparsePattern {
        self.output.borrow().get_acts()
    }

    /// Number of labels.
    pub fn num_l(&self) -> usize {
        self.num_l
    }

    /// Number of statelets.
    pub fn num_s(&self) -> usize {
        self.num_s
    }

    /// Active statelets per label.
    pub fn num_as(&self) -> usize {
        self.num_as
    }
}

impl Block for LabelTransformer {
    fn clear(&mut self) {
        self.output.borrow_mut().clear();
        self.value = 0;
        self.value_prev = None;
    }

    fn step(&mut self) {
        self.output.borrow_mut().step();
    }

    fn pull(&mut self) {
        // Source block
    }

    fn compute(&mut self) {
        if self.value_prev == Some(self.value) {
            return;
        }

        let mut output = self.output.borrow_mut();
        output.state.clear_all();
        output.state.set_range(self.value * self.num_as, self.num_as);

        self.value_prev = Some(self.value);
    }

    fn store(&mut self) {
        self.output.borrow_mut().store();
    }

    fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>() + self.output.borrow().memory_usage()
    }
}

impl OutputAccess for LabelTransformer {
    fn output(&self) -> Rc<RefCell<BlockOutput>> {
        Rc::clone(&self.output)
    }
}

impl BlockBaseAccess for LabelTransformer {
    fn base(&self) -> &BlockBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BlockBase {
        &mut self.base
    }
}
