//! Deterministic train/test/validation split of the tile set.
//!
//! The permutation is a backward Fisher–Yates shuffle driven by a 32-bit
//! Mersenne Twister seeded with `init_genrand`, drawing bounded integers by
//! masked rejection. This is the exact procedure behind NumPy's legacy
//! `RandomState.permutation`, so existing datasets split with the same seed
//! are reproduced index for index.

use std::fmt;

use rand_mt::Mt;
use serde::Serialize;

use crate::error::PrepError;

/// Slack allowed on `train + test <= 1` for proportions written in decimal.
const PROPORTION_EPSILON: f64 = 1e-9;

/// Target shares of the train and test splits; validation takes the rest.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplitProportions {
    train: f64,
    test: f64,
}

impl SplitProportions {
    /// # Errors
    /// [`PrepError::Configuration`] unless both values are finite, within
    /// `[0, 1]`, and sum to at most 1.
    pub fn new(train: f64, test: f64) -> Result<Self, PrepError> {
        for (name, value) in [("train", train), ("test", test)] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(PrepError::Configuration(format!(
                    "{name} proportion must be within [0, 1], got {value}"
                )));
            }
        }
        if train + test > 1.0 + PROPORTION_EPSILON {
            return Err(PrepError::Configuration(format!(
                "split proportions {train} + {test} exceed 1"
            )));
        }
        Ok(Self { train, test })
    }

    pub fn train(&self) -> f64 {
        self.train
    }

    pub fn test(&self) -> f64 {
        self.test
    }

    /// `(train, test, validation)` sizes for `count` tiles.
    pub fn sizes(&self, count: usize) -> (usize, usize, usize) {
        let train = ((count as f64 * self.train).floor() as usize).min(count);
        let test = ((count as f64 * self.test).floor() as usize).min(count - train);
        (train, test, count - train - test)
    }
}

/// One of the three dataset subsets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitKind {
    Train,
    Test,
    Validation,
}

impl SplitKind {
    pub const ALL: [SplitKind; 3] = [SplitKind::Train, SplitKind::Test, SplitKind::Validation];

    pub fn name(&self) -> &'static str {
        match self {
            SplitKind::Train => "train",
            SplitKind::Test => "test",
            SplitKind::Validation => "validation",
        }
    }

    /// Output document name.
    pub fn document_file_name(&self) -> &'static str {
        match self {
            SplitKind::Train => "COCO_trn.json",
            SplitKind::Test => "COCO_tst.json",
            SplitKind::Validation => "COCO_val.json",
        }
    }
}

impl fmt::Display for SplitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Three disjoint index sets covering `0..count`, each in permutation order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SplitPartition {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
    pub validation: Vec<usize>,
}

impl SplitPartition {
    pub fn indices(&self, kind: SplitKind) -> &[usize] {
        match kind {
            SplitKind::Train => &self.train,
            SplitKind::Test => &self.test,
            SplitKind::Validation => &self.validation,
        }
    }

    pub fn len(&self) -> usize {
        self.train.len() + self.test.len() + self.validation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Split of every index, indexed by tile index.
    pub fn assignments(&self) -> Vec<Option<SplitKind>> {
        let mut out = vec![None; self.len()];
        for kind in SplitKind::ALL {
            for &index in self.indices(kind) {
                if let Some(slot) = out.get_mut(index) {
                    *slot = Some(kind);
                }
            }
        }
        out
    }
}

/// Partitions `0..count` into train, test and validation sets.
///
/// Identical arguments always give identical partitions. Every call owns
/// its own generator, so calls never interfere with each other.
pub fn split(count: usize, seed: u32, proportions: SplitProportions) -> SplitPartition {
    let order = permutation(count, seed);
    let (train, test, _) = proportions.sizes(count);

    let mut rest = order.into_iter();
    SplitPartition {
        train: rest.by_ref().take(train).collect(),
        test: rest.by_ref().take(test).collect(),
        validation: rest.collect(),
    }
}

/// Uniform random permutation of `0..count`.
pub fn permutation(count: usize, seed: u32) -> Vec<usize> {
    let mut rng = Mt::new(seed);
    let mut values: Vec<usize> = (0..count).collect();
    for i in (1..count).rev() {
        let j = bounded(&mut rng, i as u64) as usize;
        values.swap(i, j);
    }
    values
}

/// Uniform integer in `0..=max` by masked rejection sampling.
fn bounded(rng: &mut Mt, max: u64) -> u64 {
    if max == 0 {
        return 0;
    }

    let mut mask = max;
    mask |= mask >> 1;
    mask |= mask >> 2;
    mask |= mask >> 4;
    mask |= mask >> 8;
    mask |= mask >> 16;
    mask |= mask >> 32;

    loop {
        let value = if max <= u64::from(u32::MAX) {
            u64::from(rng.next_u32()) & mask
        } else {
            let high = u64::from(rng.next_u32());
            let low = u64::from(rng.next_u32());
            ((high << 32) | low) & mask
        };
        if value <= max {
            return value;
        }
    }
}
