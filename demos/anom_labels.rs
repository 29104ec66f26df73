//! Label anomaly demo.
//!
//! Feeds a symbol stream with one substitution through a LabelTransformer and
//! a SequenceLearner and prints the anomaly score of every step.
//!
//! Run with: `cargo run --example anom_labels`

use anomblocks::blocks::{LabelTransformer, SequenceLearner};
use anomblocks::{Block, LabelTransformerConfig, OutputAccess, SequenceLearnerConfig};
use anyhow::{Context, Result};
use itertools::Itertools;
use std::collections::HashMap;

fn main() -> Result<()> {
    let values: Vec<char> = "aaaaabcdefaaaaabcdefaaaaabcgef".chars().collect();

    // Symbols become labels in sorted order
    let table: HashMap<char, usize> = values
        .iter()
        .copied()
        .unique()
        .sorted()
        .enumerate()
        .map(|(label, symbol)| (symbol, label))
        .collect();

    let mut lt = LabelTransformer::from_config(&LabelTransformerConfig::default())?;
    let mut sl = SequenceLearner::from_config(&SequenceLearnerConfig::default())?;
    sl.connect_input(lt.output(), 0)?;

    let mut scores = Vec::with_capacity(values.len());
    for symbol in &values {
        let label = table
            .get(symbol)
            .copied()
            .with_context(|| format!("no label for symbol {:?}", symbol))?;

        lt.set_value(label)?;
        lt.feedforward(false)?;
        sl.feedforward(true)?;

        scores.push(sl.get_anomaly_score());
    }

    println!("val, scr");
    for (symbol, score) in values.iter().zip(&scores) {
        println!("{:>3}, {:.1}", symbol, score);
    }

    Ok(())
}
