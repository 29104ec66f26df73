//! Block trait - Lifecycle shared by the transformer and the learner.
//!
//! # Lifecycle Methods
//!
//! - `init()` - Validate connections and allocate what depends on them
//! - `step()` - Advance the output history cursor
//! - `pull()` - Copy upstream outputs into the block's inputs
//! - `compute()` - Turn inputs into the output pattern
//! - `store()` - Commit the output pattern to history
//! - `learn()` - Update memories
//! - `clear()` - Reset run state (learned memory is kept)
//!
//! # High-Level Operation
//!
//! `feedforward(learn)` runs step → pull → compute → store → [learn]. Blocks
//! evaluate leaf-first: an upstream block's `feedforward` must finish before the
//! downstream one starts within the same timestep.

use crate::error::Result;

/// Core trait for computational blocks.
pub trait Block {
    /// Validate connections and prepare internal structures.
    ///
    /// Blocks with inputs run this on their first `feedforward()`.
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Reset input, output and working state. Learned memory is kept.
    fn clear(&mut self);

    /// Advance the output history by one step.
    fn step(&mut self);

    /// Copy changed upstream outputs into this block's inputs.
    fn pull(&mut self);

    /// Compute the output pattern from the inputs.
    fn compute(&mut self);

    /// Update internal memories from the current step.
    fn learn(&mut self) {}

    /// Commit the output pattern to history.
    fn store(&mut self);

    /// Estimate memory usage in bytes.
    fn memory_usage(&self) -> usize;

    /// Run one timestep.
    ///
    /// # Examples
    ///
    /// ```
    /// use anomblocks::blocks::LabelTransformer;
    /// use anomblocks::Block;
    ///
    /// let mut lt = LabelTransformer::new(26, 208, 2, 0);
    /// lt.set_value(3).unwrap();
    /// lt.feedforward(false).unwrap();
    /// assert_eq!(lt.get_output_pattern().len(), 8);
    /// ```
    fn feedforward(&mut self, learn: bool) -> Result<()> {
        self.step();
        self.pull();
        self.compute();
        self.store();
        if learn {
            self.learn();
        }
        Ok(())
    }
}
