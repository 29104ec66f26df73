//! BlockBase - State every block carries.
//!
//! A unique block id (recorded on the block's output so bindings can name their
//! source), the initialization flag and a seeded RNG. Two blocks built with the
//! same seed make the same random choices, which keeps runs reproducible.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicU32, Ordering};

/// Id, init flag and seeded RNG shared by all blocks.
///
/// # Examples
///
/// ```
/// use anomblocks::BlockBase;
///
/// let mut base = BlockBase::new(42);
/// assert!(!base.is_initialized());
/// base.set_initialized(true);
/// assert!(base.is_initialized());
/// assert_eq!(base.seed(), 42);
/// ```
#[derive(Clone)]
pub struct BlockBase {
    id: u32,
    init_flag: bool,
    rng: StdRng,
    seed: u64,
}

impl BlockBase {
    /// Create a base with a fresh id and an RNG seeded with `seed`.
    pub fn new(seed: u64) -> Self {
        static NEXT_ID: AtomicU32 = AtomicU32::new(0);

        Self {
            id: NEXT_ID.fetch_add(1, Ordering::SeqCst),
            init_flag: false,
            rng: StdRng::seed_from_u64(seed),
            seed,
        }
    }

    /// Unique block id.
    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Seed the RNG was created with.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Has the block been initialized?
    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.init_flag
    }

    /// Set the initialization flag.
    #[inline]
    pub fn set_initialized(&mut self, flag: bool) {
        self.init_flag = flag;
    }

    /// Mutable access to the block's RNG.
    #[inline]
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

/// Blocks that contain a [`BlockBase`].
pub trait BlockBaseAccess {
    /// Immutable reference to the base.
    fn base(&self) -> &BlockBase;

    /// Mutable reference to the base.
    fn base_mut(&mut self) -> &mut BlockBase;

    /// Unique block id.
    #[inline]
    fn block_id(&self) -> u32 {
        self.base().id()
    }

    /// Has the block been initialized?
    #[inline]
    fn is_initialized(&self) -> bool {
        self.base().is_initialized()
    }
}
