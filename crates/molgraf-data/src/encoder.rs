//! One-hot encoding of categorical molecular features.
//!
//! The encoder owns its state: the fixed vocabulary is supplied at
//! construction and the values encountered during a pass accumulate in
//! an inspectable `found_values` field on the encoder itself, so two
//! encoders never share state through anything process-wide.

use serde::{Deserialize, Serialize};

/// A categorical feature value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Integer category, e.g. a bond order or hybridization code.
    Int(i64),
    /// String category, e.g. an element symbol.
    Str(String),
}

impl From<i64> for Category {
    fn from(v: i64) -> Self {
        Category::Int(v)
    }
}

impl From<&str> for Category {
    fn from(v: &str) -> Self {
        Category::Str(v.to_string())
    }
}

impl From<String> for Category {
    fn from(v: String) -> Self {
        Category::Str(v)
    }
}

/// Maps a categorical value to a fixed-length indicator vector.
///
/// With `add_unknown` the vector carries one extra trailing slot that
/// lights up for out-of-vocabulary values; without it, unknown values
/// encode as all zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    categories: Vec<Category>,
    add_unknown: bool,
    found_values: Vec<Category>,
}

impl OneHotEncoder {
    /// Create an encoder over a fixed vocabulary.
    pub fn new(categories: Vec<Category>, add_unknown: bool) -> Self {
        Self {
            categories,
            add_unknown,
            found_values: Vec::new(),
        }
    }

    /// Vocabulary of string categories.
    pub fn from_strs(values: &[&str], add_unknown: bool) -> Self {
        Self::new(values.iter().map(|&v| v.into()).collect(), add_unknown)
    }

    /// Vocabulary of integer categories.
    pub fn from_ints(values: &[i64], add_unknown: bool) -> Self {
        Self::new(values.iter().map(|&v| v.into()).collect(), add_unknown)
    }

    /// Width of the indicator vector.
    pub fn width(&self) -> usize {
        self.categories.len() + usize::from(self.add_unknown)
    }

    /// Encode one value, recording it in `found_values`.
    pub fn encode(&mut self, value: &Category) -> Vec<f32> {
        if !self.found_values.contains(value) {
            self.found_values.push(value.clone());
        }
        let mut out = vec![0.0f32; self.width()];
        match self.categories.iter().position(|c| c == value) {
            Some(pos) => out[pos] = 1.0,
            None if self.add_unknown => *out.last_mut().expect("width >= 1") = 1.0,
            None => {}
        }
        out
    }

    /// Encode a string value.
    pub fn encode_str(&mut self, value: &str) -> Vec<f32> {
        self.encode(&Category::Str(value.to_string()))
    }

    /// Encode an integer value.
    pub fn encode_int(&mut self, value: i64) -> Vec<f32> {
        self.encode(&Category::Int(value))
    }

    /// Distinct values seen so far, in first-encounter order.
    ///
    /// Useful to audit whether the fixed vocabulary actually covers the
    /// dataset.
    pub fn found_values(&self) -> &[Category] {
        &self.found_values
    }
}
