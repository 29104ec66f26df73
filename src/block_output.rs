//! BlockOutput - A block's published pattern with history and change tracking.
//!
//! Every block writes its result into `state` and commits it with `store()`,
//! which pushes it into a small circular history. Downstream blocks read a
//! committed entry by its relative time offset (`CURR` = this step, `PREV` = the
//! step before), which is how the sequence learner sees its own previous output.
//!
//! `store()` also records whether the pattern differs from the previous step.
//! `BlockInput::pull()` skips copying unchanged entries and a learner may skip
//! its whole computation when nothing it reads has changed.
//!
//! # Examples
//!
//! ```
//! use anomblocks::BlockOutput;
//!
//! let mut output = BlockOutput::new();
//! output.setup(2, 208);
//!
//! output.state.set_range(0, 8);
//! output.store();
//! assert!(output.has_changed());
//!
//! output.step();
//! output.store();
//! assert!(!output.has_changed());
//! ```

use crate::bitfield::BitField;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Time offset of the current step
pub const CURR: usize = 0;

/// Time offset of the previous step
pub const PREV: usize = 1;

/// Output pattern plus a circular history of committed patterns.
#[derive(Clone)]
pub struct BlockOutput {
    /// Working pattern for the current step (public for direct access)
    pub state: BitField,

    /// Committed patterns, indexed through `idx()`
    history: Vec<BitField>,

    /// Change flag recorded with each committed pattern
    changes: Vec<bool>,

    changed_flag: bool,
    curr_idx: usize,

    /// Id of the block that owns this output, if any
    source_block: Option<u32>,

    id: u32,
}

impl BlockOutput {
    /// Create an empty output. Call `setup()` before use.
    pub fn new() -> Self {
        static NEXT_ID: AtomicU32 = AtomicU32::new(0);

        Self {
            state: BitField::new(0),
            history: Vec::new(),
            changes: Vec::new(),
            changed_flag: false,
            curr_idx: 0,
            source_block: None,
            id: NEXT_ID.fetch_add(1, Ordering::SeqCst),
        }
    }

    /// Size the output for `num_t` history steps of `num_b` bits.
    ///
    /// Every history entry starts out flagged as changed so the first `pull()`
    /// of a downstream input always copies.
    ///
    /// # Panics
    ///
    /// Panics if `num_t` < 2 or `num_b` == 0
    pub fn setup(&mut self, num_t: usize, num_b: usize) {
        assert!(num_t >= 2, "num_t must be >= 2");
        assert!(num_b > 0, "num_b must be > 0");

        self.state.resize(num_b);

        self.history.clear();
        self.history.resize(num_t, BitField::new(num_b));

        self.changes.clear();
        self.changes.resize(num_t, true);

        self.curr_idx = 0;
        self.changed_flag = true;
    }

    /// Clear the working pattern and the whole history.
    pub fn clear(&mut self) {
        self.state.clear_all();
        self.changed_flag = true;

        for (pattern, changed) in self.history.iter_mut().zip(self.changes.iter_mut()) {
            pattern.clear_all();
            *changed = true;
        }
    }

    /// Advance the history cursor by one step.
    #[inline]
    pub fn step(&mut self) {
        self.curr_idx += 1;
        if self.curr_idx >= self.history.len() {
            self.curr_idx = 0;
        }
    }

    /// Commit `state` into the history at the current step.
    #[inline]
    pub fn store(&mut self) {
        let prev_idx = self.idx(PREV);
        self.changed_flag = self.state != self.history[prev_idx];

        self.history[self.curr_idx].assign(&self.state);
        self.changes[self.curr_idx] = self.changed_flag;
    }

    /// Committed pattern at relative time offset `time`.
    #[inline]
    pub fn get_bitfield(&self, time: usize) -> &BitField {
        &self.history[self.idx(time)]
    }

    /// Did the last `store()` commit a different pattern than the step before?
    #[inline]
    pub fn has_changed(&self) -> bool {
        self.changed_flag
    }

    /// Change flag of the entry at relative time offset `time`.
    #[inline]
    pub fn has_changed_at(&self, time: usize) -> bool {
        self.changes[self.idx(time)]
    }

    /// Active indices of the working pattern.
    pub fn get_acts(&self) -> Vec<usize> {
        self.state.get_acts()
    }

    /// Number of history steps.
    #[inline]
    pub fn num_t(&self) -> usize {
        self.history.len()
    }

    /// Pattern width in bits.
    #[inline]
    pub fn num_bits(&self) -> usize {
        self.state.num_bits()
    }

    /// Unique output id.
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Record the id of the block that owns this output.
    pub fn set_source_block(&mut self, block_id: u32) {
        self.source_block = Some(block_id);
    }

    /// Id of the owning block, if one registered itself.
    pub fn source_block(&self) -> Option<u32> {
        self.source_block
    }

    /// Estimate memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        let mut bytes = std::mem::size_of::<Self>();

        bytes += self.state.memory_usage();
        bytes += self.history.iter().map(BitField::memory_usage).sum::<usize>();
        bytes += self.changes.capacity() * std::mem::size_of::<bool>();

        bytes
    }

    /// Map a relative time offset to a history index.
    ///
    /// With curr_idx=1 and num_t=3: idx(0)=1, idx(1)=0, idx(2)=2.
    #[inline]
    fn idx(&self, ts: usize) -> usize {
        debug_assert!(ts < self.history.len(), "time offset out of bounds");

        let num_t = self.history.len();
        if ts <= self.curr_idx {
            self.curr_idx - ts
        } else {
            num_t + self.curr_idx - ts
        }
    }
}

impl Default for BlockOutput {
    fn default() -> Self {
        Self::new()
    }
}

/// Blocks that publish a shared output.
///
/// The returned handle is what a downstream block binds to with
/// `connect_input()`.
pub trait OutputAccess {
    /// Shared handle to the block's output.
    fn output(&self) -> Rc<RefCell<BlockOutput>>;
}
