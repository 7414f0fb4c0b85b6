//! Error measures between two series joined on `x`.
//!
//! Both the matcher and the assigner compare a training series against a
//! reference series. The two live in different tables whose rows are not
//! guaranteed to be in the same order, so every comparison first pairs rows
//! through the reference table's `x` index:
//!
//! ```text
//! pairs = { (train[i], ref[row_of(x_i)]) | x_i in training, row_of(x_i) exists }
//! ```
//!
//! [`RowAlignment::covering`] additionally requires every left row to find
//! its `x` on the right; that is what the matcher and assigner use.

use crate::domain::{Series, SeriesTable};
use crate::error::SchemaError;

/// Row pairs `(left_row, right_row)` sharing the same `x`, in left-table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowAlignment {
    pairs: Vec<(usize, usize)>,
    /// Left rows with no counterpart on the right.
    pub unmatched_left: usize,
}

impl RowAlignment {
    /// Align `left` onto `right` by exact `x` value.
    pub fn between(left: &SeriesTable, right: &SeriesTable) -> Self {
        let mut pairs = Vec::with_capacity(left.len());
        let mut unmatched_left = 0;
        for (i, &x) in left.xs().iter().enumerate() {
            match right.row_of(x) {
                Some(j) => pairs.push((i, j)),
                None => unmatched_left += 1,
            }
        }
        Self { pairs, unmatched_left }
    }

    /// Align `left` onto `right`, failing unless every left row has a partner.
    pub fn covering(left: &SeriesTable, right: &SeriesTable) -> Result<Self, SchemaError> {
        let alignment = Self::between(left, right);
        if alignment.is_empty() {
            return Err(SchemaError::NoCommonRows {
                left: left.name().to_string(),
                right: right.name().to_string(),
            });
        }
        if alignment.unmatched_left > 0 {
            return Err(SchemaError::UncoveredRows {
                table: left.name().to_string(),
                reference: right.name().to_string(),
                count: alignment.unmatched_left,
            });
        }
        Ok(alignment)
    }

    pub fn pairs(&self) -> &[(usize, usize)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// `Σ (left_i - right_i)^2` over aligned rows.
pub fn sum_squared_error(left: &Series, right: &Series, alignment: &RowAlignment) -> f64 {
    alignment
        .pairs()
        .iter()
        .map(|&(i, j)| {
            let d = left.values[i] - right.values[j];
            d * d
        })
        .sum()
}

/// `max |left_i - right_i|` over aligned rows (`0.0` when nothing aligns).
pub fn max_abs_deviation(left: &Series, right: &Series, alignment: &RowAlignment) -> f64 {
    alignment
        .pairs()
        .iter()
        .map(|&(i, j)| (left.values[i] - right.values[j]).abs())
        .fold(0.0, f64::max)
}
