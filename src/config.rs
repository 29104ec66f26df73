//! Block configuration.
//!
//! Plain serde structs holding the constructor parameters of each block, so a
//! detector can be described as data, checked with `validate()` and built with
//! `from_config()`. The defaults are the parameters of the label anomaly demo.
//!
//! # Example
//!
//! ```
//! use anomblocks::config::{SequenceLearnerConfig, WinnerPolicy};
//!
//! let config = SequenceLearnerConfig {
//!     num_c: 64,
//!     policy: WinnerPolicy::FewestDendrites,
//!     ..Default::default()
//! };
//! config.validate().unwrap();
//!
//! let json = config.to_json().unwrap();
//! let restored = SequenceLearnerConfig::from_json(&json).unwrap();
//! assert_eq!(config, restored);
//! ```

use crate::block_memory::PERM_MAX;
use crate::error::{AnomError, Result};
use serde::{Deserialize, Serialize};

/// How a bursting column picks the statelet that grows a new dendrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WinnerPolicy {
    /// Uniform choice from the block's seeded RNG
    #[default]
    Random,
    /// Statelet owning the fewest dendrites, lowest index on ties.
    ///
    /// Counts claimed dendrites. Recency of use plays no part.
    FewestDendrites,
}

/// LabelTransformer parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelTransformerConfig {
    /// Number of distinct labels
    pub num_l: usize,
    /// Output pattern width
    pub num_s: usize,
    /// Output history depth
    pub num_t: usize,
    pub seed: u64,
}

impl Default for LabelTransformerConfig {
    fn default() -> Self {
        Self {
            num_l: 26,
            num_s: 208,
            num_t: 2,
            seed: 0,
        }
    }
}

impl LabelTransformerConfig {
    /// Check the parameters without building a block.
    pub fn validate(&self) -> Result<()> {
        if self.num_l == 0 {
            return Err(AnomError::InvalidParameter("num_l must be > 0".to_string()));
        }
        if self.num_s < self.num_l {
            return Err(AnomError::InvalidParameter(format!(
                "num_s ({}) must be >= num_l ({})",
                self.num_s, self.num_l
            )));
        }
        if self.num_t < 2 {
            return Err(AnomError::InvalidParameter("num_t must be at least 2".to_string()));
        }
        Ok(())
    }

    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON and validate.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

/// SequenceLearner parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceLearnerConfig {
    /// Number of columns (input width)
    pub num_c: usize,
    /// Statelets per column
    pub num_spc: usize,
    /// Dendrites per statelet
    pub num_dps: usize,
    /// Receptors per dendrite
    pub num_rpd: usize,
    /// Connected receptors needed for a dendrite to fire
    pub d_thresh: u32,
    pub perm_thr: u8,
    pub perm_inc: u8,
    pub perm_dec: u8,
    /// Output history depth
    pub num_t: usize,
    /// Compute even when neither input nor context changed
    pub always_update: bool,
    pub seed: u64,
    pub policy: WinnerPolicy,
}

impl Default for SequenceLearnerConfig {
    fn default() -> Self {
        Self {
            num_c: 208,
            num_spc: 10,
            num_dps: 10,
            num_rpd: 12,
            d_thresh: 6,
            perm_thr: 20,
            perm_inc: 2,
            perm_dec: 1,
            num_t: 2,
            always_update: false,
            seed: 0,
            policy: WinnerPolicy::Random,
        }
    }
}

impl SequenceLearnerConfig {
    /// Check the parameters without building a block.
    pub fn validate(&self) -> Result<()> {
        let counts = [
            ("num_c", self.num_c),
            ("num_spc", self.num_spc),
            ("num_dps", self.num_dps),
            ("num_rpd", self.num_rpd),
        ];
        if let Some((name, _)) = counts.iter().find(|(_, v)| *v == 0) {
            return Err(AnomError::InvalidParameter(format!("{} must be > 0", name)));
        }
        if self.d_thresh == 0 {
            return Err(AnomError::InvalidParameter("d_thresh must be > 0".to_string()));
        }
        if self.d_thresh as usize >= self.num_rpd {
            return Err(AnomError::InvalidParameter(format!(
                "d_thresh ({}) must be < num_rpd ({})",
                self.d_thresh, self.num_rpd
            )));
        }
        let perms = [
            ("perm_thr", self.perm_thr),
            ("perm_inc", self.perm_inc),
            ("perm_dec", self.perm_dec),
        ];
        if let Some((name, v)) = perms.iter().find(|(_, v)| *v == 0 || *v > PERM_MAX) {
            return Err(AnomError::InvalidParameter(format!(
                "{} ({}) must be in 1..={}",
                name, v, PERM_MAX
            )));
        }
        if self.num_t < 2 {
            return Err(AnomError::InvalidParameter("num_t must be at least 2".to_string()));
        }
        Ok(())
    }

    /// Encode as JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON and validate.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(LabelTransformerConfig::default().validate().is_ok());
        assert!(SequenceLearnerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_label_config_rejects_narrow_output() {
        let config = LabelTransformerConfig {
            num_l: 10,
            num_s: 9,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(AnomError::InvalidParameter(_))));
    }

    #[test]
    fn test_learner_config_rejects_zero_counts() {
        let config = SequenceLearnerConfig {
            num_dps: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err, AnomError::InvalidParameter("num_dps must be > 0".to_string()));
    }

    #[test]
    fn test_learner_config_rejects_threshold() {
        let config = SequenceLearnerConfig {
            d_thresh: 12,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = SequenceLearnerConfig {
            perm_thr: 120,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_learner_config_rejects_zero_permanence() {
        for (thr, inc, dec) in [(0, 2, 1), (20, 0, 1), (20, 2, 0)] {
            let config = SequenceLearnerConfig {
                perm_thr: thr,
                perm_inc: inc,
                perm_dec: dec,
                ..Default::default()
            };
            assert!(matches!(config.validate(), Err(AnomError::InvalidParameter(_))));
        }

        let config = SequenceLearnerConfig {
            d_thresh: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(AnomError::InvalidParameter("d_thresh must be > 0".to_string()))
        );
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SequenceLearnerConfig::from_json(r#"{ "num_c": 64, "policy": "FewestDendrites" }"#).unwrap();
        assert_eq!(config.num_c, 64);
        assert_eq!(config.num_spc, 10);
        assert_eq!(config.policy, WinnerPolicy::FewestDendrites);
    }

    #[test]
    fn test_from_json_validates() {
        let result = LabelTransformerConfig::from_json(r#"{ "num_l": 0 }"#);
        assert!(matches!(result, Err(AnomError::InvalidParameter(_))));

        let result = LabelTransformerConfig::from_json("{ num_l: }");
        assert!(matches!(result, Err(AnomError::Serialization(_))));
    }
}
