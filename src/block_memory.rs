//! BlockMemory - Dendrite and receptor arena with permanence learning.
//!
//! Each of `num_d` dendrites owns exactly `num_rpd` receptor slots. A slot holds
//! the address of the input bit it watches and a permanence in
//! `[PERM_MIN, PERM_MAX]`. A receptor is *connected* when its permanence is at
//! least `perm_thr`, and a slot with permanence 0 is empty and free for growth.
//!
//! Storage is two flat arrays indexed `d * num_rpd + r`, so the per-step loops
//! never allocate and no dendrite can ever exceed `num_rpd` receptors.
//!
//! # Core Operations
//!
//! - `overlap(d, input)` - Count connected receptors whose input bit is active
//! - `learn_move(d, input)` - Reinforce/decay live receptors, grow empty slots
//!   onto active input bits the dendrite does not watch yet
//!
//! # Examples
//!
//! ```
//! use anomblocks::{BitField, BlockMemory};
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! let mut memory = BlockMemory::new(4, 8, 20, 2, 1);
//! let mut rng = StdRng::seed_from_u64(42);
//! memory.init(64, &mut rng);
//!
//! let mut context = BitField::new(64);
//! context.set_range(0, 8);
//!
//! // Empty slots grow onto the active bits at the connection threshold
//! memory.learn_move(0, &context, &mut rng);
//! assert_eq!(memory.overlap(0, &context), 8);
//! ```

use crate::bitfield::BitField;
use rand::rngs::StdRng;
use rand::Rng;

/// Minimum permanence value
pub const PERM_MIN: u8 = 0;

/// Maximum permanence value
pub const PERM_MAX: u8 = 99;

/// Fixed-capacity arena of dendrites and their receptors.
pub struct BlockMemory {
    num_i: usize,   // Number of input bits
    num_d: usize,   // Number of dendrites
    num_rpd: usize, // Receptors per dendrite
    perm_thr: u8,
    perm_inc: u8,
    perm_dec: u8,

    r_addrs: Vec<usize>, // [num_d][num_rpd]
    r_perms: Vec<u8>,    // [num_d][num_rpd]

    // Scratch mask reused by learn_move()
    available: BitField,

    init_flag: bool,
}

impl BlockMemory {
    /// Create a memory of `num_d` dendrites with `num_rpd` receptors each.
    ///
    /// Must call `init()` before use.
    ///
    /// # Panics
    ///
    /// Panics if `num_d` or `num_rpd` is 0, or a permanence parameter is 0 or
    /// exceeds `PERM_MAX`. A zero threshold would make empty slots count as
    /// connected.
    pub fn new(num_d: usize, num_rpd: usize, perm_thr: u8, perm_inc: u8, perm_dec: u8) -> Self {
        assert!(num_d > 0, "num_d must be > 0");
        assert!(num_rpd > 0, "num_rpd must be > 0");
        assert!(perm_thr > PERM_MIN, "perm_thr must be > 0");
        assert!(perm_inc > 0, "perm_inc must be > 0");
        assert!(perm_dec > 0, "perm_dec must be > 0");
        assert!(perm_thr <= PERM_MAX, "perm_thr must be <= PERM_MAX");
        assert!(perm_inc <= PERM_MAX, "perm_inc must be <= PERM_MAX");
        assert!(perm_dec <= PERM_MAX, "perm_dec must be <= PERM_MAX");

        let num_r = num_d * num_rpd;

        Self {
            num_i: 0,
            num_d,
            num_rpd,
            perm_thr,
            perm_inc,
            perm_dec,
            r_addrs: vec![0; num_r],
            r_perms: vec![PERM_MIN; num_r],
            available: BitField::new(0),
            init_flag: false,
        }
    }

    /// Bind the memory to an input of `num_i` bits.
    ///
    /// Receptors get random addresses and zero permanence, so every slot
    /// starts out empty.
    pub fn init(&mut self, num_i: usize, rng: &mut StdRng) {
        assert!(num_i > 0, "num_i must be > 0");

        self.num_i = num_i;
        for addr in self.r_addrs.iter_mut() {
            *addr = rng.gen_range(0..num_i);
        }
        self.r_perms.fill(PERM_MIN);
        self.available.resize(num_i);

        self.init_flag = true;
    }

    /// Count connected receptors of dendrite `d` whose input bit is active.
    #[inline]
    pub fn overlap(&self, d: usize, input: &BitField) -> usize {
        debug_assert!(self.init_flag, "must call init() first");
        debug_assert!(d < self.num_d, "dendrite index out of bounds");

        let r_beg = d * self.num_rpd;
        let r_end = r_beg + self.num_rpd;

        (r_beg..r_end)
            .filter(|&r| self.r_perms[r] >= self.perm_thr && input.get_bit(self.r_addrs[r]) > 0)
            .count()
    }

    /// Learn `input` on dendrite `d`, moving empty receptors onto it.
    ///
    /// Live receptors (permanence > 0) gain `perm_inc` when their bit is active
    /// and lose `perm_dec` otherwise, clamped to `[PERM_MIN, PERM_MAX]`.
    /// Empty receptors are placed on active bits the dendrite does not already
    /// watch, searching from a random start, and begin at `perm_thr`. A receptor
    /// decayed to 0 here becomes empty for the next call.
    pub fn learn_move(&mut self, d: usize, input: &BitField, rng: &mut StdRng) {
        assert!(self.init_flag, "must call init() first");
        assert!(d < self.num_d, "dendrite index out of bounds");
        debug_assert_eq!(input.num_bits(), self.num_i, "input width must match num_i");

        let r_beg = d * self.num_rpd;
        let r_end = r_beg + self.num_rpd;

        self.available.assign(input);
        for r in r_beg..r_end {
            if self.r_perms[r] > PERM_MIN {
                self.available.clear_bit(self.r_addrs[r]);
            }
        }

        let mut next_addr = rng.gen_range(0..self.num_i);

        for r in r_beg..r_end {
            if self.r_perms[r] > PERM_MIN {
                if input.get_bit(self.r_addrs[r]) > 0 {
                    self.r_perms[r] = self.r_perms[r].saturating_add(self.perm_inc).min(PERM_MAX);
                } else {
                    self.r_perms[r] = self.r_perms[r].saturating_sub(self.perm_dec);
                }
            } else if let Some(addr) = self.available.find_next_set_bit(next_addr) {
                self.r_addrs[r] = addr;
                self.r_perms[r] = self.perm_thr;
                self.available.clear_bit(addr);
                next_addr = rng.gen_range(0..self.num_i);
            }
        }
    }

    /// Number of non-empty receptors on dendrite `d`.
    pub fn num_used(&self, d: usize) -> usize {
        debug_assert!(d < self.num_d);
        let r_beg = d * self.num_rpd;
        self.r_perms[r_beg..r_beg + self.num_rpd]
            .iter()
            .filter(|&&p| p > PERM_MIN)
            .count()
    }

    /// Receptor addresses of dendrite `d`.
    pub fn addrs(&self, d: usize) -> &[usize] {
        let r_beg = d * self.num_rpd;
        &self.r_addrs[r_beg..r_beg + self.num_rpd]
    }

    /// Receptor permanences of dendrite `d`.
    pub fn perms(&self, d: usize) -> &[u8] {
        let r_beg = d * self.num_rpd;
        &self.r_perms[r_beg..r_beg + self.num_rpd]
    }

    /// Every receptor permanence, dendrite-major.
    pub fn all_perms(&self) -> &[u8] {
        &self.r_perms
    }

    /// Number of dendrites.
    #[inline]
    pub fn num_dendrites(&self) -> usize {
        self.num_d
    }

    /// Receptors per dendrite.
    #[inline]
    pub fn num_rpd(&self) -> usize {
        self.num_rpd
    }

    /// Width of the input the memory is bound to.
    #[inline]
    pub fn num_inputs(&self) -> usize {
        self.num_i
    }

    /// Has `init()` been called?
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.init_flag
    }

    /// Estimate memory usage in bytes.
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.r_addrs.capacity() * std::mem::size_of::<usize>()
            + self.r_perms.capacity() * std::mem::size_of::<u8>()
            + self.available.memory_usage()
    }
}
