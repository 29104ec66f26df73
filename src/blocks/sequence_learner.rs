//! SequenceLearner - Learns label sequences and scores how unexpected each step is.
//!
//! The learner has `num_c` columns, one per input bit, each holding `num_spc`
//! statelets. Every statelet owns `num_dps` dendrites and every dendrite watches up
//! to `num_rpd` bits of the learner's own recent outputs (its *context*: the
//! previous `num_t - 1` steps, most recent first). A dendrite whose connected
//! receptors see at least `d_thresh` active context bits predicts its statelet
//! for the next step.
//!
//! # Algorithm
//!
//! For each active column:
//! 1. **Recognition**: statelets with a dendrite predicted by the previous step
//!    activate. The column was expected.
//! 2. **Surprise**: otherwise the column bursts. A winner statelet (chosen by
//!    [`WinnerPolicy`]) and every statelet that already owns dendrites activate,
//!    each claiming its next free dendrite slot. The column counts towards the
//!    anomaly score.
//! 3. **Learning**: active dendrites learn the context, so the transition
//!    previous output → current output is remembered.
//! 4. **Prediction**: dendrites matching the next step's context are flagged.
//!
//! # Architecture
//!
//! ```text
//! output           memory (showing statelet 15 dendrites)
//! -----------      +----------------------------+
//! 0 0 0 0 0[0] --> | addr[0]: {00 00 00 00 ...} |
//! 0 0 0 0 0 0      | perm[0]: {00 00 00 00 ...} |
//! 0 0 0 0 0 0      | addr[1]: {00 00 00 00 ...} |
//!                  | perm[1]: {00 00 00 00 ...} |
//! context          | addr[2]: {00 00 00 00 ...} |
//! (prev outputs)   | perm[2]: {00 00 00 00 ...} |
//! -----------      |  ...                       |
//! 0 0 0 0 0 0      +----------------------------+
//! 0 0 0 0 0 0          ^
//! 0 0 0 0 0 0          | (self-feedback loop)
//!      ----------------+
//! input
//! (column activations)
//! -----------
//! 0 0 0 0 0 0
//! ```
//!
//! # Examples
//!
//! ```
//! use anomblocks::blocks::{LabelTransformer, SequenceLearner};
//! use anomblocks::{Block, OutputAccess};
//!
//! let mut encoder = LabelTransformer::new(8, 64, 2, 0);
//! let mut learner = SequenceLearner::new(64, 4, 4, 12, 6, 20, 2, 1, 2, false, 0);
//! learner.connect_input(encoder.output(), 0).unwrap();
//!
//! let mut scores = Vec::new();
//! for _ in 0..4 {
//!     for label in [0, 1, 2] {
//!         encoder.set_value(label).unwrap();
//!         encoder.feedforward(false).unwrap();
//!         learner.feedforward(true).unwrap();
//!         scores.push(learner.get_anomaly_score());
//!     }
//! }
//!
//! assert_eq!(scores[0], 1.0);
//! assert_eq!(*scores.last().unwrap(), 0.0);
//! ```

use crate::bitfield::BitField;
use crate::block_base::{BlockBase, BlockBaseAccess};
use crate::block_input::{BlockInput, InputAccess};
use crate::block_memory::BlockMemory;
use crate::block_output::{BlockOutput, OutputAccess, CURR, PREV};
use crate::config::{SequenceLearnerConfig, WinnerPolicy};
use crate::error::{AnomError, Result};
use crate::{Block, SparsePattern};
use itertools::Itertools;
use log::{debug, trace};
use rand::Rng;
use std::cell::RefCell;
use std::rc::Rc;

/// Learns temporal transitions between input patterns and reports an
/// anomaly score per step.
///
/// # Performance
///
/// - Recognition reads one predictive bit per dendrite of each active column
/// - Prediction computes the overlap of every used dendrite once per step
/// - Working vectors are reused between steps
pub struct SequenceLearner {
    base: BlockBase,

    /// Column activations
    input: BlockInput,

    /// Own output at slots PREV..num_t
    context: BlockInput,

    output: Rc<RefCell<BlockOutput>>,

    memory: BlockMemory,

    // Architecture parameters
    num_c: usize,   // Number of columns
    num_spc: usize, // Statelets per column
    num_dps: usize, // Dendrites per statelet
    num_dpc: usize, // Dendrites per column (num_spc × num_dps)
    num_rpd: usize, // Receptors per dendrite
    num_s: usize,   // Total statelets (num_c × num_spc)
    num_d: usize,   // Total dendrites (num_s × num_dps)
    d_thresh: u32,
    num_t: usize,

    perm_thr: u8,
    perm_inc: u8,
    perm_dec: u8,

    policy: WinnerPolicy,
    always_update: bool,

    // Learned structure
    next_sd: Vec<usize>, // Next free dendrite slot per statelet
    d_used: BitField,    // Dendrites that have learned at least once

    // Step state
    d_pred: BitField,       // Dendrites predicting the next step
    next_context: BitField, // Context the next step will pull
    anomaly_score: f64,
    updated: bool, // Did the last step compute?

    // Working memory
    input_acts: Vec<usize>, // Active columns
    d_acts: Vec<usize>,     // Dendrites that learn this step
    s_grow: Vec<usize>,     // Statelets that claimed a new slot this step
    winners: Vec<usize>,    // One statelet per active column
}

impl SequenceLearner {
    /// Create a new SequenceLearner with its context wired to its own previous
    /// `num_t - 1` outputs.
    ///
    /// # Arguments
    ///
    /// * `num_c` - Number of columns (must equal the connected input width)
    /// * `num_spc` - Statelets per column
    /// * `num_dps` - Dendrites per statelet
    /// * `num_rpd` - Receptors per dendrite
    /// * `d_thresh` - Connected active receptors needed for a dendrite to fire
    /// * `perm_thr` - Permanence threshold (1-99, typically 20)
    /// * `perm_inc` - Permanence increment (1-99, typically 2)
    /// * `perm_dec` - Permanence decrement (1-99, typically 1)
    /// * `num_t` - History depth; the context spans the last `num_t - 1` outputs
    /// * `always_update` - Compute even when inputs are unchanged
    /// * `seed` - RNG seed for reproducibility
    ///
    /// # Panics
    ///
    /// Panics if a count or `d_thresh` is 0, `d_thresh >= num_rpd`, a permanence
    /// parameter is 0 or exceeds 99, or `num_t < 2`. Use [`SequenceLearner::from_config`] for a
    /// fallible constructor.
    ///
    /// # Examples
    ///
    /// ```
    /// use anomblocks::blocks::SequenceLearner;
    ///
    /// let learner = SequenceLearner::new(208, 10, 10, 12, 6, 20, 2, 1, 2, false, 0);
    /// assert_eq!(learner.num_s(), 2080);
    /// ```
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        num_c: usize,
        num_spc: usize,
        num_dps: usize,
        num_rpd: usize,
        d_thresh: u32,
        perm_thr: u8,
        perm_inc: u8,
        perm_dec: u8,
        num_t: usize,
        always_update: bool,
        seed: u64,
    ) -> Self {
        assert!(num_c > 0, "num_c must be > 0");
        assert!(num_spc > 0, "num_spc must be > 0");
        assert!(num_dps > 0, "num_dps must be > 0");
        assert!(num_rpd > 0, "num_rpd must be > 0");
        assert!(d_thresh > 0, "d_thresh must be > 0");
        assert!((d_thresh as usize) < num_rpd, "d_thresh must be < num_rpd");
        assert!(perm_thr > 0, "perm_thr must be > 0");
        assert!(perm_inc > 0, "perm_inc must be > 0");
        assert!(perm_dec > 0, "perm_dec must be > 0");
        assert!(num_t >= 2, "num_t must be at least 2");

        let num_s = num_c * num_spc;
        let num_d = num_s * num_dps;
        let num_dpc = num_spc * num_dps;

        let base = BlockBase::new(seed);

        let mut output = BlockOutput::new();
        output.setup(num_t, num_s);
        output.set_source_block(base.id());
        let output = Rc::new(RefCell::new(output));

        let mut context = BlockInput::new();
        for slot in PREV..num_t {
            context
                .add_child(Rc::clone(&output), slot)
                .expect("context slots are inside the output history");
        }

        Self {
            base,
            input: BlockInput::new(),
            context,
            output,
            memory: BlockMemory::new(num_d, num_rpd, perm_thr, perm_inc, perm_dec),
            num_c,
            num_spc,
            num_dps,
            num_dpc,
            num_rpd,
            num_s,
            num_d,
            d_thresh,
            num_t,
            perm_thr,
            perm_inc,
            perm_dec,
            policy: WinnerPolicy::default(),
            always_update,
            next_sd: vec![0; num_s],
            d_used: BitField::new(num_d),
            d_pred: BitField::new(num_d),
            next_context: BitField::new((num_t - 1) * num_s),
            anomaly_score: 0.0,
            updated: false,
            input_acts: Vec::new(),
            d_acts: Vec::new(),
            s_grow: Vec::new(),
            winners: Vec::new(),
        }
    }

    /// Build from a validated configuration.
    pub fn from_config(config: &SequenceLearnerConfig) -> Result<Self> {
        config.validate()?;
        debug!(
            "building SequenceLearner: num_c={} num_spc={} num_dps={} num_rpd={} policy={:?}",
            config.num_c, config.num_spc, config.num_dps, config.num_rpd, config.policy
        );

        let learner = Self::new(
            config.num_c,
            config.num_spc,
            config.num_dps,
            config.num_rpd,
            config.d_thresh,
            config.perm_thr,
            config.perm_inc,
            config.perm_dec,
            config.num_t,
            config.always_update,
            config.seed,
        );
        Ok(learner.with_policy(config.policy))
    }

    /// Use `policy` to pick the winner of bursting columns.
    pub fn with_policy(mut self, policy: WinnerPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Bind an upstream output as (part of) the column input.
    ///
    /// `slot` is the history offset read from `child` (0 = its current step).
    /// The learner takes a single input whose width equals `num_c`.
    ///
    /// # Errors
    ///
    /// - `DimensionMismatch` if the input would not be exactly `num_c` bits wide,
    ///   including a second binding on top of a full one
    /// - `InvalidParameter` if `slot` is outside the child's history
    ///
    /// Neither block is modified on error.
    pub fn connect_input(&mut self, child: Rc<RefCell<BlockOutput>>, slot: usize) -> Result<()> {
        let child_bits = child.borrow().num_bits();
        let total = self.input.num_bits() + child_bits;

        if total != self.num_c {
            return Err(AnomError::DimensionMismatch {
                expected: self.num_c,
                actual: total,
            });
        }

        self.input.add_child(child, slot)?;
        debug!(
            "block {} bound {} input bits at slot {}",
            self.base.id(),
            child_bits,
            slot
        );
        Ok(())
    }

    /// Fraction of the last step's active columns that no dendrite predicted.
    ///
    /// - 0.0 = every column was predicted by the previous step
    /// - 1.0 = no column was predicted
    pub fn get_anomaly_score(&self) -> f64 {
        self.anomaly_score
    }

    /// Active statelets of the current output, ascending.
    pub fn get_output_pattern(&self) -> SparsePattern {
        self.output.borrow().get_acts()
    }

    /// One statelet per active column: the first confirmed prediction, or the
    /// statelet chosen for growth when the column burst.
    pub fn get_winner_pattern(&self) -> SparsePattern {
        self.winners.clone()
    }

    /// Statelets predicted to activate on the next step.
    pub fn get_predicted_pattern(&self) -> SparsePattern {
        self.d_pred
            .get_acts()
            .into_iter()
            .map(|d| d / self.num_dps)
            .dedup()
            .collect()
    }

    /// Number of statelets that own at least one dendrite.
    pub fn get_historical_count(&self) -> usize {
        self.next_sd.iter().filter(|&&n| n > 0).count()
    }

    /// Learned dendrite/receptor memory.
    pub fn memory(&self) -> &BlockMemory {
        &self.memory
    }

    /// Context input (own previous outputs, most recent first).
    pub fn context(&self) -> &BlockInput {
        &self.context
    }

    /// Winner policy in use.
    pub fn policy(&self) -> WinnerPolicy {
        self.policy
    }

    /// Get number of columns.
    pub fn num_c(&self) -> usize {
        self.num_c
    }

    /// Get statelets per column.
    pub fn num_spc(&self) -> usize {
        self.num_spc
    }

    /// Get dendrites per statelet.
    pub fn num_dps(&self) -> usize {
        self.num_dps
    }

    /// Get receptors per dendrite.
    pub fn num_rpd(&self) -> usize {
        self.num_rpd
    }

    /// Get total number of statelets.
    pub fn num_s(&self) -> usize {
        self.num_s
    }

    /// Get total number of dendrites.
    pub fn num_d(&self) -> usize {
        self.num_d
    }

    /// Get dendrite activation threshold.
    pub fn d_thresh(&self) -> u32 {
        self.d_thresh
    }

    /// Get history depth.
    pub fn num_t(&self) -> usize {
        self.num_t
    }

    /// Get permanence threshold, increment and decrement.
    pub fn perm_params(&self) -> (u8, u8, u8) {
        (self.perm_thr, self.perm_inc, self.perm_dec)
    }

    /// `connect_input()` only accepts a full-width binding, so a bound input is
    /// always `num_c` bits wide.
    fn check_input(&self) -> Result<()> {
        if self.input.num_children() == 0 {
            return Err(AnomError::NotConnected);
        }
        Ok(())
    }

    /// Activate statelets of column `c` that the previous step predicted.
    ///
    /// Returns whether the column was predicted.
    fn recognition(&mut self, c: usize) -> bool {
        let d_beg = c * self.num_dpc;
        let d_end = d_beg + self.num_dpc;
        let mut output = self.output.borrow_mut();
        let mut predicted = false;

        for d in d_beg..d_end {
            if self.d_pred.get_bit(d) > 0 {
                let s = d / self.num_dps;
                self.d_acts.push(d);
                output.state.set_bit(s);

                if !predicted {
                    self.winners.push(s);
                    predicted = true;
                }
            }
        }

        predicted
    }

    /// Burst column `c`: activate the winner and every historical statelet.
    fn surprise(&mut self, c: usize) {
        let s_beg = c * self.num_spc;
        let s_end = s_beg + self.num_spc;

        let winner = self.select_winner(s_beg, s_end);
        self.winners.push(winner);
        self.claim_next_dendrite(winner);

        for s in s_beg..s_end {
            if s != winner && self.next_sd[s] > 0 {
                self.claim_next_dendrite(s);
            }
        }
    }

    fn select_winner(&mut self, s_beg: usize, s_end: usize) -> usize {
        match self.policy {
            WinnerPolicy::Random if s_end - s_beg > 1 => self.base.rng().gen_range(s_beg..s_end),
            WinnerPolicy::Random => s_beg,
            WinnerPolicy::FewestDendrites => (s_beg..s_end)
                .min_by_key(|&s| self.next_sd[s])
                .unwrap_or(s_beg),
        }
    }

    /// Activate statelet `s` and queue its next free dendrite for growth.
    fn claim_next_dendrite(&mut self, s: usize) {
        self.output.borrow_mut().state.set_bit(s);
        self.d_acts.push(s * self.num_dps + self.next_sd[s]);
        self.s_grow.push(s);
    }

    /// Flag every used dendrite that matches the context of the next step.
    ///
    /// After `store()` the next context is this step's output followed by the
    /// older history entries, in the same layout `pull()` will produce.
    fn predict(&mut self) {
        {
            let output = self.output.borrow();
            for t in CURR..self.num_t - 1 {
                self.next_context
                    .copy_from(output.get_bitfield(t), t * self.num_s);
            }
        }

        self.d_pred.clear_all();
        for d in self.d_used.iter_acts() {
            if self.memory.overlap(d, &self.next_context) >= self.d_thresh as usize {
                self.d_pred.set_bit(d);
            }
        }
    }
}

impl Block for SequenceLearner {
    fn init(&mut self) -> Result<()> {
        self.check_input()?;

        if !self.memory.is_initialized() {
            let num_context_bits = self.context.num_bits();
            self.memory.init(num_context_bits, self.base.rng());
        }

        self.base.set_initialized(true);
        debug!(
            "block {} initialized: {} statelets, {} dendrites",
            self.base.id(),
            self.num_s,
            self.num_d
        );
        Ok(())
    }

    fn clear(&mut self) {
        self.input.clear();
        self.context.clear();
        self.output.borrow_mut().clear();
        self.d_pred.clear_all();
        self.anomaly_score = 0.0;
        self.updated = false;
        self.input_acts.clear();
        self.d_acts.clear();
        self.s_grow.clear();
        self.winners.clear();
    }

    fn step(&mut self) {
        self.output.borrow_mut().step();
    }

    fn pull(&mut self) {
        self.input.pull();
        self.context.pull();
    }

    fn compute(&mut self) {
        assert!(self.base.is_initialized(), "must call init() first");

        self.updated =
            self.always_update || self.input.children_changed() || self.context.children_changed();
        if !self.updated {
            return;
        }

        self.input_acts.clear();
        self.input_acts.extend(self.input.state.iter_acts());
        self.output.borrow_mut().state.clear_all();
        self.d_acts.clear();
        self.s_grow.clear();
        self.winners.clear();

        let mut num_surprised = 0;
        for k in 0..self.input_acts.len() {
            let c = self.input_acts[k];
            if !self.recognition(c) {
                self.surprise(c);
                num_surprised += 1;
            }
        }

        self.anomaly_score = if self.input_acts.is_empty() {
            0.0
        } else {
            num_surprised as f64 / self.input_acts.len() as f64
        };

        trace!(
            "block {}: {} active columns, {} surprised, score {:.3}",
            self.base.id(),
            self.input_acts.len(),
            num_surprised,
            self.anomaly_score
        );
    }

    fn learn(&mut self) {
        assert!(self.base.is_initialized(), "must call init() first");

        if !self.updated {
            return;
        }

        for &d in &self.d_acts {
            self.memory.learn_move(d, &self.context.state, self.base.rng());
            self.d_used.set_bit(d);
        }

        for &s in &self.s_grow {
            if self.next_sd[s] < self.num_dps - 1 {
                self.next_sd[s] += 1;
            }
        }

        trace!(
            "block {}: learned {} dendrites, {} grown",
            self.base.id(),
            self.d_acts.len(),
            self.s_grow.len()
        );
    }

    fn store(&mut self) {
        self.output.borrow_mut().store();
    }

    fn memory_usage(&self) -> usize {
        let mut bytes = std::mem::size_of::<Self>();
        bytes += self.input.memory_usage();
        bytes += self.context.memory_usage();
        bytes += self.output.borrow().memory_usage();
        bytes += self.memory.memory_usage();
        bytes += self.next_sd.capacity() * std::mem::size_of::<usize>();
        bytes += self.d_used.memory_usage();
        bytes += self.d_pred.memory_usage();
        bytes += self.next_context.memory_usage();
        bytes += (self.input_acts.capacity()
            + self.d_acts.capacity()
            + self.s_grow.capacity()
            + self.winners.capacity())
            * std::mem::size_of::<usize>();
        bytes
    }

    /// Run one timestep: validate, step → pull → compute → store → [learn],
    /// then predict the next step.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected` if no input is bound. Nothing is modified on error.
    fn feedforward(&mut self, learn: bool) -> Result<()> {
        if self.base.is_initialized() {
            self.check_input()?;
        } else {
            self.init()?;
        }

        self.step();
        self.pull();
        self.compute();
        self.store();
        if learn {
            self.learn();
        }
        if self.updated {
            self.predict();
        }
        Ok(())
    }
}

impl OutputAccess for SequenceLearner {
    fn output(&self) -> Rc<RefCell<BlockOutput>> {
        Rc::clone(&self.output)
    }
}

impl InputAccess for SequenceLearner {
    fn input(&self) -> &BlockInput {
        &self.input
    }
}

impl BlockBaseAccess for SequenceLearner {
    fn base(&self) -> &BlockBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BlockBase {
        &mut self.base
    }
}
