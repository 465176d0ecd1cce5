//! Fragment: the recursive configuration value the generator merges.
//!
//! A fragment is a sequence, a mapping, or a scalar leaf. Merge is
//! right-biased: sequences concatenate, mappings merge per key, and any
//! other pairing (scalar involved, or mismatched shapes) is replaced by the
//! right-hand side. Shape conflicts are therefore lossy by contract, not an
//! error.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scalar leaf. Merged by replacement, never combined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Str(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Fragment {
    Sequence(Vec<Fragment>),
    Mapping(BTreeMap<String, Fragment>),
    Scalar(Scalar),
}

impl Fragment {
    pub fn empty_mapping() -> Self {
        Fragment::Mapping(BTreeMap::new())
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, Fragment::Mapping(_))
    }
}

/// Deep-merge two fragments into a new one.
///
/// Neither input is mutated; the result shares no mutable substructure with
/// either, so a fragment produced here can outlive and never alias its
/// sources. Later (right) fragments override earlier ones on scalar
/// conflicts; sequence-valued keys accumulate.
pub fn merge(a: &Fragment, b: &Fragment) -> Fragment {
    match (a, b) {
        (Fragment::Sequence(xs), Fragment::Sequence(ys)) => {
            let mut out = xs.clone();
            out.extend(ys.iter().cloned());
            Fragment::Sequence(out)
        }
        (Fragment::Mapping(ma), Fragment::Mapping(mb)) => {
            let mut out = ma.clone();
            for (k, v) in mb {
                let merged = match out.get(k) {
                    Some(prev) => merge(prev, v),
                    None => v.clone(),
                };
                out.insert(k.clone(), merged);
            }
            Fragment::Mapping(out)
        }
        // Scalar on either side, or mismatched shapes: b wins outright.
        (_, other) => other.clone(),
    }
}
