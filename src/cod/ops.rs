//! Operator nodes: unary, binary, ternary and quantization.
//!
//! Operators compute in `f64` and convert back to the pixel type, so integer
//! results round and saturate. Logical operators and comparisons produce `1`
//! for true and `0` for false; any non-zero value counts as true.

use super::{ensure_compatible, CodNode, CodRef, IntoCodNode, RegionInfo};
use crate::core::error::{CodError, CodResult};
use crate::core::geometry::Point;
use crate::core::scalar::Scalar;
use serde::{Deserialize, Serialize};

#[inline]
fn truth(v: bool) -> f64 {
    if v {
        1.0
    } else {
        0.0
    }
}

// ============================================================================
// Unary
// ============================================================================

/// Operators of one operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Negate,
    Abs,
    Sqrt,
    /// Logical not.
    Not,
    Reciprocal,
}

impl UnaryOp {
    #[inline]
    pub fn apply(self, v: f64) -> f64 {
        match self {
            UnaryOp::Negate => -v,
            UnaryOp::Abs => v.abs(),
            UnaryOp::Sqrt => v.sqrt(),
            UnaryOp::Not => truth(v == 0.0),
            UnaryOp::Reciprocal => 1.0 / v,
        }
    }
}

/// Operators of one operand and one fixed argument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamUnaryOp {
    Scale(f64),
    Offset(f64),
    Pow(f64),
    /// `1` where the value is at least the threshold.
    Threshold(f64),
}

impl ParamUnaryOp {
    #[inline]
    pub fn apply(self, v: f64) -> f64 {
        match self {
            ParamUnaryOp::Scale(k) => v * k,
            ParamUnaryOp::Offset(k) => v + k,
            ParamUnaryOp::Pow(k) => v.powf(k),
            ParamUnaryOp::Threshold(t) => truth(v >= t),
        }
    }
}

/// `op(a)`; keeps the operand's region info.
pub struct UnaryNode<T> {
    op: UnaryOp,
    operand: CodRef<T>,
}

impl<T> UnaryNode<T> {
    pub fn new(op: UnaryOp, operand: impl IntoCodNode<T>) -> Self {
        Self {
            op,
            operand: operand.into_cod_node(),
        }
    }
}

impl<T: Scalar> CodNode<T> for UnaryNode<T> {
    #[inline]
    fn get(&self, point: Point, index: usize) -> T {
        T::from_f64(self.op.apply(self.operand.get(point, index).to_f64()))
    }

    fn region_info(&self) -> &RegionInfo {
        self.operand.region_info()
    }

    fn referable_via_index(&self) -> bool {
        self.operand.referable_via_index()
    }

    fn prepare(&self) -> CodResult<()> {
        self.operand.prepare()
    }
}

/// `op(a, k)`; keeps the operand's region info.
pub struct ParamUnaryNode<T> {
    op: ParamUnaryOp,
    operand: CodRef<T>,
}

impl<T> ParamUnaryNode<T> {
    pub fn new(op: ParamUnaryOp, operand: impl IntoCodNode<T>) -> Self {
        Self {
            op,
            operand: operand.into_cod_node(),
        }
    }
}

impl<T: Scalar> CodNode<T> for ParamUnaryNode<T> {
    #[inline]
    fn get(&self, point: Point, index: usize) -> T {
        T::from_f64(self.op.apply(self.operand.get(point, index).to_f64()))
    }

    fn region_info(&self) -> &RegionInfo {
        self.operand.region_info()
    }

    fn referable_via_index(&self) -> bool {
        self.operand.referable_via_index()
    }

    fn prepare(&self) -> CodResult<()> {
        self.operand.prepare()
    }
}

// ============================================================================
// Binary
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Min,
    Max,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Equal,
    NotEqual,
    And,
    Or,
}

impl BinaryOp {
    #[inline]
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
            BinaryOp::Min => a.min(b),
            BinaryOp::Max => a.max(b),
            BinaryOp::Less => truth(a < b),
            BinaryOp::LessEqual => truth(a <= b),
            BinaryOp::Greater => truth(a > b),
            BinaryOp::GreaterEqual => truth(a >= b),
            BinaryOp::Equal => truth(a == b),
            BinaryOp::NotEqual => truth(a != b),
            BinaryOp::And => truth(a != 0.0 && b != 0.0),
            BinaryOp::Or => truth(a != 0.0 || b != 0.0),
        }
    }
}

/// `a op b` over two compatible operands.
pub struct BinaryNode<T> {
    op: BinaryOp,
    left: CodRef<T>,
    right: CodRef<T>,
    info: RegionInfo,
}

impl<T> BinaryNode<T> {
    pub fn new(op: BinaryOp, left: impl IntoCodNode<T>, right: impl IntoCodNode<T>) -> CodResult<Self> {
        let left = left.into_cod_node();
        let right = right.into_cod_node();
        ensure_compatible(left.region_info(), right.region_info())?;
        let info = RegionInfo::first_bounded([left.region_info(), right.region_info()]);
        Ok(Self {
            op,
            left,
            right,
            info,
        })
    }
}

impl<T: Scalar> CodNode<T> for BinaryNode<T> {
    #[inline]
    fn get(&self, point: Point, index: usize) -> T {
        let a = self.left.get(point, index).to_f64();
        let b = self.right.get(point, index).to_f64();
        T::from_f64(self.op.apply(a, b))
    }

    fn region_info(&self) -> &RegionInfo {
        &self.info
    }

    fn referable_via_index(&self) -> bool {
        self.left.referable_via_index() && self.right.referable_via_index()
    }

    fn prepare(&self) -> CodResult<()> {
        self.left.prepare()?;
        self.right.prepare()
    }
}

// ============================================================================
// Ternary
// ============================================================================

/// `cond ? a : b`, evaluating only the selected branch.
pub struct TernaryNode<C, T> {
    cond: CodRef<C>,
    then: CodRef<T>,
    otherwise: CodRef<T>,
    info: RegionInfo,
}

impl<C, T> TernaryNode<C, T> {
    pub fn new(
        cond: impl IntoCodNode<C>,
        then: impl IntoCodNode<T>,
        otherwise: impl IntoCodNode<T>,
    ) -> CodResult<Self> {
        let cond = cond.into_cod_node();
        let then = then.into_cod_node();
        let otherwise = otherwise.into_cod_node();
        let infos = [cond.region_info(), then.region_info(), otherwise.region_info()];
        ensure_compatible(infos[0], infos[1])?;
        ensure_compatible(infos[0], infos[2])?;
        ensure_compatible(infos[1], infos[2])?;
        let info = RegionInfo::first_bounded(infos);
        Ok(Self {
            cond,
            then,
            otherwise,
            info,
        })
    }
}

impl<C: Scalar, T: Send + Sync> CodNode<T> for TernaryNode<C, T> {
    #[inline]
    fn get(&self, point: Point, index: usize) -> T {
        if self.cond.get(point, index).to_f64() != 0.0 {
            self.then.get(point, index)
        } else {
            self.otherwise.get(point, index)
        }
    }

    fn region_info(&self) -> &RegionInfo {
        &self.info
    }

    fn referable_via_index(&self) -> bool {
        self.cond.referable_via_index()
            && self.then.referable_via_index()
            && self.otherwise.referable_via_index()
    }

    fn prepare(&self) -> CodResult<()> {
        self.cond.prepare()?;
        self.then.prepare()?;
        self.otherwise.prepare()
    }
}

// ============================================================================
// Quantize
// ============================================================================

/// Bin index of the clamped operand: `floor((clamp(v) - min) / bin_width)`.
///
/// Values below `min` land in bin 0 and values above `max` in the top bin.
pub struct QuantizeNode<T> {
    operand: CodRef<T>,
    min: f64,
    max: f64,
    bin_width: f64,
    top: u32,
}

impl<T> QuantizeNode<T> {
    pub fn new(operand: impl IntoCodNode<T>, min: f64, max: f64, bin_width: f64) -> CodResult<Self> {
        if !(bin_width > 0.0) || !bin_width.is_finite() {
            return Err(CodError::InvalidArgument(format!(
                "bin width must be positive, got {bin_width}"
            )));
        }
        if !(max >= min) {
            return Err(CodError::InvalidArgument(format!(
                "quantize range is inverted: {min} > {max}"
            )));
        }
        let top = ((max - min) / bin_width).floor() as u32;
        Ok(Self {
            operand: operand.into_cod_node(),
            min,
            max,
            bin_width,
            top,
        })
    }

    /// Number of bins.
    pub fn bins(&self) -> u32 {
        self.top.saturating_add(1)
    }

    #[inline]
    fn bin_of(&self, v: f64) -> u32 {
        if v.is_nan() {
            return 0;
        }
        let clamped = v.clamp(self.min, self.max);
        let bin = ((clamped - self.min) / self.bin_width).floor() as u32;
        bin.min(self.top)
    }
}

impl<T: Scalar> CodNode<u32> for QuantizeNode<T> {
    #[inline]
    fn get(&self, point: Point, index: usize) -> u32 {
        self.bin_of(self.operand.get(point, index).to_f64())
    }

    fn region_info(&self) -> &RegionInfo {
        self.operand.region_info()
    }

    fn referable_via_index(&self) -> bool {
        self.operand.referable_via_index()
    }

    fn prepare(&self) -> CodResult<()> {
        self.operand.prepare()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cod::{materialize, ConstantNode};
    use crate::core::geometry::Region;
    use crate::core::image::Image;
    use std::sync::Arc;

    fn region() -> Region {
        Region::from_size(Point::zero(), [4, 3, 1])
    }

    fn ramp() -> Arc<Image<f64>> {
        Arc::new(Image::from_fn(region(), |p| (p.x() - 2 * p.y()) as f64))
    }

    fn constant<T: Copy + Send + Sync + 'static>(v: T) -> CodRef<T> {
        Arc::new(ConstantNode::new(v))
    }

    #[test]
    fn test_composition_matches_scalar_evaluation() {
        // (|a| + 2) * b, with b = a + 0.5
        let a = ramp();
        let b: CodRef<f64> = Arc::new(ParamUnaryNode::new(ParamUnaryOp::Offset(0.5), a.clone()));
        let abs: CodRef<f64> = Arc::new(UnaryNode::new(UnaryOp::Abs, a.clone()));
        let sum: CodRef<f64> = Arc::new(BinaryNode::new(BinaryOp::Add, abs, constant(2.0)).unwrap());
        let prod = BinaryNode::new(BinaryOp::Mul, sum, b).unwrap();

        let out = materialize::<f64, _>(&prod).unwrap();
        for (i, p) in region().points().enumerate() {
            let v = a.at(i);
            assert_eq!(out.get(p), Some((v.abs() + 2.0) * (v + 0.5)));
        }
        assert_eq!(prod.region_info(), &RegionInfo::of_image(&a));
    }

    #[test]
    fn test_ternary_selects_branch() {
        let a = ramp();
        let cond: CodRef<f64> = Arc::new(BinaryNode::new(BinaryOp::Greater, a.clone(), constant(0.0)).unwrap());
        let neg: CodRef<f64> = Arc::new(UnaryNode::new(UnaryOp::Negate, a.clone()));
        let node = TernaryNode::new(cond, a.clone(), neg).unwrap();
        let out = materialize::<f64, _>(&node).unwrap();
        for i in 0..out.len() {
            assert_eq!(out.at(i), a.at(i).abs());
        }
    }

    #[test]
    fn test_ternary_region_from_first_bounded() {
        let a = ramp();
        let node: TernaryNode<u8, f64> = TernaryNode::new(constant(1u8), constant(3.0), a.clone()).unwrap();
        assert_eq!(node.region_info(), &RegionInfo::of_image(&a));
        assert_eq!(node.get(Point::zero(), 0), 3.0);
    }

    #[test]
    fn test_incompatible_operands_rejected() {
        let a = ramp();
        let b = Arc::new(Image::new(Region::from_size(Point::zero(), [3, 4, 1]), 1.0f64));
        let err = BinaryNode::new(BinaryOp::Add, a.clone(), b.clone()).err().unwrap();
        assert!(err.is_structural());
        assert!(TernaryNode::new(a.clone(), a.clone(), b.clone()).is_err());
        assert!(TernaryNode::new(b, a.clone(), a).is_err());
    }

    #[test]
    fn test_integer_results_saturate() {
        let img = Image::from_fn(region(), |p| (p.x() * 100).min(255) as u8);
        let doubled = ParamUnaryNode::new(ParamUnaryOp::Scale(2.0), img);
        assert_eq!(doubled.get(Point::zero(), 1), 200);
        assert_eq!(doubled.get(Point::zero(), 2), 255);
        assert_eq!(doubled.get(Point::zero(), 3), 255);
    }

    #[test]
    fn test_logical_ops() {
        assert_eq!(UnaryOp::Not.apply(0.0), 1.0);
        assert_eq!(UnaryOp::Not.apply(-3.0), 0.0);
        assert_eq!(BinaryOp::And.apply(2.0, 0.0), 0.0);
        assert_eq!(BinaryOp::Or.apply(2.0, 0.0), 1.0);
        assert_eq!(ParamUnaryOp::Threshold(1.5).apply(1.5), 1.0);
    }

    #[test]
    fn test_quantize_saturates() {
        let img = Arc::new(Image::from_vec(
            Region::from_size(Point::zero(), [6, 1, 1]),
            vec![-5.0, 0.0, 0.99, 1.0, 3.9, 100.0],
        )
        .unwrap());
        let q = QuantizeNode::new(img, 0.0, 4.0, 1.0).unwrap();
        assert_eq!(q.bins(), 5);
        let bins: Vec<u32> = (0..6).map(|i| q.get(Point::zero(), i)).collect();
        assert_eq!(bins, vec![0, 0, 0, 1, 3, 4]);
    }

    #[test]
    fn test_quantize_rejects_bad_parameters() {
        let img = ramp();
        assert!(QuantizeNode::new(img.clone(), 0.0, 1.0, 0.0).is_err());
        assert!(QuantizeNode::new(img.clone(), 0.0, 1.0, -1.0).is_err());
        assert!(QuantizeNode::new(img, 2.0, 1.0, 0.5).is_err());
    }
}
