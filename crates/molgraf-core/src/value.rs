//! Tagged array values stored inside a [`GraphRecord`](crate::GraphRecord).
//!
//! Every graph attribute is array-typed. Scalars and plain vectors are
//! coerced into arrays on assignment, so a record can never hold a bare
//! native value. Numeric data is kept as `f32` or `i64`; node symbols
//! (element labels) are kept as a string column.

use ndarray::{concatenate, Array1, Array2, ArrayD, Axis, IxDyn};
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};

/// Element type of a [`GraphValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DType {
    /// 32-bit float arrays (attributes, weights, coordinates, labels).
    F32,
    /// 64-bit integer arrays (index pairs, atomic numbers).
    I64,
    /// String columns (node symbols).
    Str,
}

impl DType {
    /// Human-readable name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            DType::F32 => "f32",
            DType::I64 => "i64",
            DType::Str => "str",
        }
    }
}

/// A single named attribute of a graph: a dynamically-ranked array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GraphValue {
    /// Float data of any rank.
    Float(ArrayD<f32>),
    /// Integer data of any rank.
    Int(ArrayD<i64>),
    /// A column of strings (rank 1 by construction).
    Str(Vec<String>),
}

impl GraphValue {
    /// Element type tag.
    pub fn dtype(&self) -> DType {
        match self {
            GraphValue::Float(_) => DType::F32,
            GraphValue::Int(_) => DType::I64,
            GraphValue::Str(_) => DType::Str,
        }
    }

    /// Length of the leading (row) axis.
    ///
    /// A rank-0 array counts as a single row.
    pub fn rows(&self) -> usize {
        match self {
            GraphValue::Float(a) => a.shape().first().copied().unwrap_or(1),
            GraphValue::Int(a) => a.shape().first().copied().unwrap_or(1),
            GraphValue::Str(v) => v.len(),
        }
    }

    /// Shape as a vector, strings report `[len]`.
    pub fn shape(&self) -> Vec<usize> {
        match self {
            GraphValue::Float(a) => a.shape().to_vec(),
            GraphValue::Int(a) => a.shape().to_vec(),
            GraphValue::Str(v) => vec![v.len()],
        }
    }

    /// Borrow as float array.
    pub fn as_float(&self) -> Option<&ArrayD<f32>> {
        match self {
            GraphValue::Float(a) => Some(a),
            _ => None,
        }
    }

    /// Borrow as integer array.
    pub fn as_int(&self) -> Option<&ArrayD<i64>> {
        match self {
            GraphValue::Int(a) => Some(a),
            _ => None,
        }
    }

    /// Borrow as string column.
    pub fn as_str_column(&self) -> Option<&[String]> {
        match self {
            GraphValue::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Interpret as a 2-column integer index array.
    ///
    /// This is the shape contract of every `<prefix>_indices` attribute.
    pub fn to_index2(&self, name: &str) -> Result<Array2<i64>> {
        let arr = self.as_int().ok_or_else(|| GraphError::DTypeMismatch {
            name: name.to_string(),
            expected: "i64",
        })?;
        let arr2 = arr
            .clone()
            .into_dimensionality::<ndarray::Ix2>()
            .map_err(|_| GraphError::ShapeMismatch {
                name: name.to_string(),
                expected: "(rows, 2)".to_string(),
                got: format!("{:?}", arr.shape()),
            })?;
        if arr2.ncols() != 2 {
            return Err(GraphError::ShapeMismatch {
                name: name.to_string(),
                expected: "(rows, 2)".to_string(),
                got: format!("{:?}", arr2.shape()),
            });
        }
        Ok(arr2)
    }

    /// Interpret as a rank-2 float array, e.g. node coordinates `(n, 3)`.
    pub fn to_float2(&self, name: &str) -> Result<Array2<f32>> {
        let arr = self.as_float().ok_or_else(|| GraphError::DTypeMismatch {
            name: name.to_string(),
            expected: "f32",
        })?;
        arr.clone()
            .into_dimensionality::<ndarray::Ix2>()
            .map_err(|_| GraphError::ShapeMismatch {
                name: name.to_string(),
                expected: "(rows, cols)".to_string(),
                got: format!("{:?}", arr.shape()),
            })
    }

    /// Select rows along axis 0, in the given order. Rows may repeat.
    pub fn take_rows(&self, rows: &[usize]) -> GraphValue {
        match self {
            GraphValue::Float(a) => GraphValue::Float(a.select(Axis(0), rows)),
            GraphValue::Int(a) => GraphValue::Int(a.select(Axis(0), rows)),
            GraphValue::Str(v) => GraphValue::Str(rows.iter().map(|&i| v[i].clone()).collect()),
        }
    }

    /// Append copies of own rows (by index) to the end, keeping trailing shape.
    pub fn append_rows(&self, rows: &[usize]) -> GraphValue {
        if rows.is_empty() {
            return self.clone();
        }
        match self {
            GraphValue::Float(a) => {
                let extra = a.select(Axis(0), rows);
                GraphValue::Float(concatenate(Axis(0), &[a.view(), extra.view()]).expect("same trailing shape"))
            }
            GraphValue::Int(a) => {
                let extra = a.select(Axis(0), rows);
                GraphValue::Int(concatenate(Axis(0), &[a.view(), extra.view()]).expect("same trailing shape"))
            }
            GraphValue::Str(v) => {
                let mut out = v.clone();
                out.extend(rows.iter().map(|&i| v[i].clone()));
                GraphValue::Str(out)
            }
        }
    }

    /// Append `count` constant-filled rows, keeping trailing shape.
    pub fn append_fill(&self, count: usize, fill: f64) -> GraphValue {
        if count == 0 {
            return self.clone();
        }
        match self {
            GraphValue::Float(a) => {
                let mut shape = a.shape().to_vec();
                if shape.is_empty() {
                    shape.push(1);
                }
                shape[0] = count;
                let extra = ArrayD::from_elem(IxDyn(&shape), fill as f32);
                GraphValue::Float(concatenate(Axis(0), &[a.view(), extra.view()]).expect("same trailing shape"))
            }
            GraphValue::Int(a) => {
                let mut shape = a.shape().to_vec();
                if shape.is_empty() {
                    shape.push(1);
                }
                shape[0] = count;
                let extra = ArrayD::from_elem(IxDyn(&shape), fill as i64);
                GraphValue::Int(concatenate(Axis(0), &[a.view(), extra.view()]).expect("same trailing shape"))
            }
            GraphValue::Str(v) => {
                let mut out = v.clone();
                out.extend(std::iter::repeat(String::new()).take(count));
                GraphValue::Str(out)
            }
        }
    }
}

// Coercions. Scalars become 1-element rank-1 arrays so that no bare native
// value can ever be stored in a record.

impl From<f32> for GraphValue {
    fn from(v: f32) -> Self {
        GraphValue::Float(ArrayD::from_elem(IxDyn(&[1]), v))
    }
}

impl From<i64> for GraphValue {
    fn from(v: i64) -> Self {
        GraphValue::Int(ArrayD::from_elem(IxDyn(&[1]), v))
    }
}

impl From<Vec<f32>> for GraphValue {
    fn from(v: Vec<f32>) -> Self {
        GraphValue::Float(Array1::from(v).into_dyn())
    }
}

impl From<Vec<i64>> for GraphValue {
    fn from(v: Vec<i64>) -> Self {
        GraphValue::Int(Array1::from(v).into_dyn())
    }
}

impl From<Vec<String>> for GraphValue {
    fn from(v: Vec<String>) -> Self {
        GraphValue::Str(v)
    }
}

impl From<Array1<f32>> for GraphValue {
    fn from(a: Array1<f32>) -> Self {
        GraphValue::Float(a.into_dyn())
    }
}

impl From<Array2<f32>> for GraphValue {
    fn from(a: Array2<f32>) -> Self {
        GraphValue::Float(a.into_dyn())
    }
}

impl From<Array1<i64>> for GraphValue {
    fn from(a: Array1<i64>) -> Self {
        GraphValue::Int(a.into_dyn())
    }
}

impl From<Array2<i64>> for GraphValue {
    fn from(a: Array2<i64>) -> Self {
        GraphValue::Int(a.into_dyn())
    }
}

impl From<ArrayD<f32>> for GraphValue {
    fn from(a: ArrayD<f32>) -> Self {
        GraphValue::Float(a)
    }
}

impl From<ArrayD<i64>> for GraphValue {
    fn from(a: ArrayD<i64>) -> Self {
        GraphValue::Int(a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn scalar_coercion_yields_rank_one() {
        let v: GraphValue = 3.5f32.into();
        assert_eq!(v.shape(), vec![1]);
        assert_eq!(v.rows(), 1);
    }

    #[test]
    fn take_rows_permutes_all_variants() {
        let v: GraphValue = array![[1.0f32, 2.0], [3.0, 4.0], [5.0, 6.0]].into();
        let p = v.take_rows(&[2, 0]);
        assert_eq!(
            p.as_float().unwrap(),
            &array![[5.0f32, 6.0], [1.0, 2.0]].into_dyn()
        );

        let s: GraphValue = vec!["C".to_string(), "N".to_string(), "O".to_string()].into();
        let p = s.take_rows(&[1, 1]);
        assert_eq!(p.as_str_column().unwrap(), &["N".to_string(), "N".to_string()]);
    }

    #[test]
    fn append_fill_keeps_trailing_shape() {
        let v: GraphValue = array![[1.0f32, 2.0]].into();
        let out = v.append_fill(2, 0.0);
        assert_eq!(out.shape(), vec![3, 2]);
        assert_eq!(out.as_float().unwrap()[[2, 1]], 0.0);
    }

    #[test]
    fn index_view_rejects_wrong_width() {
        let v: GraphValue = array![[0i64, 1, 2]].into();
        assert!(v.to_index2("edge_indices").is_err());
        let v: GraphValue = array![[0i64, 1]].into();
        assert!(v.to_index2("edge_indices").is_ok());
    }
}
