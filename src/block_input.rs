//! BlockInput - Binds upstream outputs into one input pattern.
//!
//! A `BlockInput` holds an ordered list of binding records, each naming an
//! upstream `BlockOutput` and the history slot to read from it. Their patterns
//! are laid end to end in `state`. Binding is cheap: `add_child()` stores only
//! metadata and the bits are copied later by `pull()`, which skips every child
//! whose selected entry did not change.
//!
//! Outputs are shared as `Rc<RefCell<BlockOutput>>`. The upstream block stays the
//! only writer and the input only borrows immutably during `pull()`.
//!
//! # Examples
//!
//! ```
//! use anomblocks::{BlockInput, BlockOutput, CURR};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let mut output = BlockOutput::new();
//! output.setup(2, 64);
//! output.state.set_bit(5);
//! output.store();
//! let output = Rc::new(RefCell::new(output));
//!
//! let mut input = BlockInput::new();
//! input.add_child(Rc::clone(&output), CURR).unwrap();
//! input.pull();
//! assert_eq!(input.state.get_acts(), vec![5]);
//! ```

use crate::bitfield::BitField;
use crate::block_output::BlockOutput;
use crate::error::{AnomError, Result};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Binding record of one upstream output.
#[derive(Clone)]
pub struct ChildInfo {
    /// Shared upstream output
    pub output: Rc<RefCell<BlockOutput>>,
    /// History offset read from the upstream output (0 = current step)
    pub slot: usize,
    /// First bit of this child inside the concatenated input
    pub bit_offset: usize,
    /// Width of the child pattern
    pub num_bits: usize,
}

/// Concatenated input built from upstream outputs.
pub struct BlockInput {
    /// Concatenated input state (public for direct access)
    pub state: BitField,

    children: Vec<ChildInfo>,

    id: u32,
}

impl BlockInput {
    /// Create an input with no bindings.
    pub fn new() -> Self {
        static NEXT_ID: AtomicU32 = AtomicU32::new(0);

        Self {
            state: BitField::new(0),
            children: Vec::new(),
            id: NEXT_ID.fetch_add(1, Ordering::SeqCst),
        }
    }

    /// Bind an upstream output at history `slot`.
    ///
    /// No data is copied here. The input grows by the child's width and all
    /// bits are cleared until the next `pull()`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` if `slot` is outside the child's history;
    /// the input is left untouched in that case.
    pub fn add_child(&mut self, child: Rc<RefCell<BlockOutput>>, slot: usize) -> Result<()> {
        let (num_t, child_bits) = {
            let child_ref = child.borrow();
            (child_ref.num_t(), child_ref.num_bits())
        };

        if slot >= num_t {
            return Err(AnomError::InvalidParameter(format!(
                "slot {} out of bounds for child with num_t={}",
                slot, num_t
            )));
        }

        let bit_offset = self.state.num_bits();
        self.children.push(ChildInfo {
            output: child,
            slot,
            bit_offset,
            num_bits: child_bits,
        });
        self.state.resize(bit_offset + child_bits);

        Ok(())
    }

    /// Copy changed children into `state`.
    pub fn pull(&mut self) {
        for info in &self.children {
            let child = info.output.borrow();

            if !child.has_changed_at(info.slot) {
                continue;
            }

            self.state.copy_from(child.get_bitfield(info.slot), info.bit_offset);
        }
    }

    /// Did any child's selected entry change? Short-circuits on the first hit.
    #[inline]
    pub fn children_changed(&self) -> bool {
        self.children
            .iter()
            .any(|info| info.output.borrow().has_changed_at(info.slot))
    }

    /// Clear all bits in state.
    pub fn clear(&mut self) {
        self.state.clear_all();
    }

    /// Number of bindings.
    #[inline]
    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    /// Total width of the concatenated input.
    #[inline]
    pub fn num_bits(&self) -> usize {
        self.state.num_bits()
    }

    /// Unique input id.
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Ids of the blocks owning the bound outputs.
    pub fn get_source_blocks(&self) -> Vec<u32> {
        self.children
            .iter()
            .filter_map(|info| info.output.borrow().source_block())
            .collect()
    }

    /// Binding records in connection order.
    pub fn get_children(&self) -> &[ChildInfo] {
        &self.children
    }

    /// Estimate memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.state.memory_usage()
            + self.children.capacity() * std::mem::size_of::<ChildInfo>()
    }
}

impl Default for BlockInput {
    fn default() -> Self {
        Self::new()
    }
}

/// Blocks that expose a bindable input.
pub trait InputAccess {
    /// Immutable reference to the block's input.
    fn input(&self) -> &BlockInput;
}
