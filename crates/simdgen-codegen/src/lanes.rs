//! Lane plans.
//!
//! The generators never decide lane arithmetic while formatting text. They
//! ask this module which lanes a swizzle reads, how a reduction splits, and
//! which lanes a cross product or transpose pairs up, then render the plan.
//! Each plan also has an evaluator over plain slices so the arithmetic can
//! be checked directly.

use std::fmt;

use simdgen_catalog::{NumericKind, TypeDescriptor};

/// A lane read by a swizzle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LaneRef {
    /// Lane `i` of the source vector.
    Lane(u8),
    /// The scalar's zero value.
    Zero,
}

/// The half-width swizzles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Swizzle {
    /// First half.
    Lo,
    /// Second half.
    Hi,
    /// Odd-indexed lanes.
    Odd,
    /// Even-indexed lanes.
    Even,
}

impl Swizzle {
    /// Every swizzle, in emission order.
    pub const ALL: [Swizzle; 4] = [Self::Lo, Self::Hi, Self::Odd, Self::Even];

    /// Get the method name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Lo => "lo",
            Self::Hi => "hi",
            Self::Odd => "odd",
            Self::Even => "even",
        }
    }

    /// Lanes read for a `width`-lane source.
    ///
    /// Width 2 yields a single lane. Width 3 yields two, with `hi` and `odd`
    /// padded by zero. Wider vectors yield exactly half their lanes.
    #[must_use]
    pub fn lanes(self, width: u8) -> Vec<LaneRef> {
        match width {
            0 | 1 => Vec::new(),
            2 => vec![LaneRef::Lane(match self {
                Self::Lo | Self::Even => 0,
                Self::Hi | Self::Odd => 1,
            })],
            3 => match self {
                Self::Lo => vec![LaneRef::Lane(0), LaneRef::Lane(1)],
                Self::Hi => vec![LaneRef::Lane(2), LaneRef::Zero],
                Self::Odd => vec![LaneRef::Lane(1), LaneRef::Zero],
                Self::Even => vec![LaneRef::Lane(0), LaneRef::Lane(2)],
            },
            _ => {
                let half = width / 2;
                (0..half)
                    .map(|i| {
                        LaneRef::Lane(match self {
                            Self::Lo => i,
                            Self::Hi => half + i,
                            Self::Odd => 2 * i + 1,
                            Self::Even => 2 * i,
                        })
                    })
                    .collect()
            }
        }
    }
}

impl fmt::Display for Swizzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Lane count of a swizzle result; 1 means a bare scalar.
#[must_use]
pub const fn half_width(width: u8) -> u8 {
    match width {
        0..=2 => 1,
        3 => 2,
        w => w / 2,
    }
}

/// Read `map` out of `lanes`.
#[must_use]
pub fn gather<T: Copy>(lanes: &[T], map: &[LaneRef], zero: T) -> Vec<T> {
    map.iter()
        .map(|r| match *r {
            LaneRef::Lane(i) => lanes[usize::from(i)],
            LaneRef::Zero => zero,
        })
        .collect()
}

/// Binary operators a vector can be reduced with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReduceOp {
    /// `+`
    Add,
    /// Minimum.
    Min,
    /// Maximum.
    Max,
    /// `&`, integers only.
    And,
    /// `|`, integers only.
    Or,
    /// `^`, integers only.
    Xor,
}

impl ReduceOp {
    /// Reductions on every vector.
    pub const COMMON: [ReduceOp; 3] = [Self::Add, Self::Min, Self::Max];

    /// Reductions on integer vectors only.
    pub const BITWISE: [ReduceOp; 3] = [Self::And, Self::Or, Self::Xor];

    /// Get the operator name used in `reduce_{name}`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Min => "min",
            Self::Max => "max",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
        }
    }

    /// Infix symbol for operators that have one.
    #[must_use]
    pub const fn symbol(self) -> Option<&'static str> {
        match self {
            Self::Add => Some("+"),
            Self::And => Some("&"),
            Self::Or => Some("|"),
            Self::Xor => Some("^"),
            Self::Min | Self::Max => None,
        }
    }

    /// Generated method name, e.g. `reduce_add`.
    #[must_use]
    pub fn method(self) -> String {
        format!("reduce_{}", self.name())
    }

    /// Render `a op b` for the scalar kind.
    #[must_use]
    pub fn combine(self, a: &str, b: &str, kind: NumericKind) -> String {
        match (self.symbol(), kind) {
            (Some(sym), _) => format!("{a} {sym} {b}"),
            (None, NumericKind::Float) => format!("{a}.{}({b})", self.name()),
            (None, _) => format!("std::cmp::{}({a}, {b})", self.name()),
        }
    }

    /// Render the lane-wise vector form of `a op b`.
    #[must_use]
    pub fn combine_vectors(self, a: &str, b: &str) -> String {
        match self.symbol() {
            Some(sym) => format!("({a} {sym} {b})"),
            None => format!("{a}.{}({b})", self.name()),
        }
    }
}

impl fmt::Display for ReduceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Shape of a reduction at one width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Reduction {
    /// Width 1: the value itself.
    Scalar,
    /// Width 2: `lane0 op lane1`.
    Pair,
    /// Width 3: `lane0 op lane1 op lane2`.
    Chain3,
    /// Width 3 integer min/max: `reduce(lo) op lane2`.
    LoThenLast,
    /// Width 3 float min/max: `lane2 op reduce(lo)`.
    LastThenLo,
    /// Width ≥ 4: `reduce(lo op hi)`.
    Halve,
}

/// Pick the reduction shape for `op` over `width` lanes of `kind`.
#[must_use]
pub fn reduction(op: ReduceOp, width: u8, kind: NumericKind) -> Reduction {
    match width {
        0 | 1 => Reduction::Scalar,
        2 => Reduction::Pair,
        3 => match (op, kind) {
            (ReduceOp::Min | ReduceOp::Max, NumericKind::Float) => Reduction::LastThenLo,
            (ReduceOp::Min | ReduceOp::Max, _) => Reduction::LoThenLast,
            _ => Reduction::Chain3,
        },
        _ => Reduction::Halve,
    }
}

/// Render the body of `reduce_{op}` for a `width`-lane vector.
#[must_use]
pub fn render_reduction(op: ReduceOp, width: u8, kind: NumericKind) -> String {
    let method = op.method();
    match reduction(op, width, kind) {
        Reduction::Scalar => "self".to_string(),
        Reduction::Pair => op.combine("self.0", "self.1", kind),
        Reduction::Chain3 => {
            let head = op.combine("self.0", "self.1", kind);
            op.combine(&head, "self.2", kind)
        }
        Reduction::LoThenLast => op.combine(&format!("self.lo().{method}()"), "self.2", kind),
        Reduction::LastThenLo => op.combine("self.2", &format!("self.lo().{method}()"), kind),
        Reduction::Halve => {
            format!("{}.{method}()", op.combine_vectors("self.lo()", "self.hi()"))
        }
    }
}

/// Evaluate a reduction the way the generated code computes it.
///
/// `zero` fills padded swizzle lanes; padded lanes are never read by a
/// reduction plan.
pub fn reduce<T, F>(lanes: &[T], op: ReduceOp, kind: NumericKind, zero: T, f: &F) -> T
where
    T: Copy,
    F: Fn(T, T) -> T,
{
    let width = lanes.len() as u8;
    let lo = || gather(lanes, &Swizzle::Lo.lanes(width), zero);
    match reduction(op, width, kind) {
        Reduction::Scalar => lanes[0],
        Reduction::Pair => f(lanes[0], lanes[1]),
        Reduction::Chain3 => f(f(lanes[0], lanes[1]), lanes[2]),
        Reduction::LoThenLast => f(reduce(&lo(), op, kind, zero, f), lanes[2]),
        Reduction::LastThenLo => f(lanes[2], reduce(&lo(), op, kind, zero, f)),
        Reduction::Halve => {
            let hi = gather(lanes, &Swizzle::Hi.lanes(width), zero);
            let folded: Vec<T> = lo().into_iter().zip(hi).map(|(a, b)| f(a, b)).collect();
            reduce(&folded, op, kind, zero, f)
        }
    }
}

/// Lanes of `self` multiplied in the first term of a 3-lane cross product.
pub const CROSS_LEFT: [u8; 3] = [1, 2, 0];

/// Lanes of `self` multiplied in the second term of a 3-lane cross product.
pub const CROSS_RIGHT: [u8; 3] = [2, 0, 1];

/// Evaluate the 3-lane cross product the way the generated code computes it:
/// `self.yzx * other.zxy - self.zxy * other.yzx`.
pub fn cross3<T>(a: [T; 3], b: [T; 3]) -> [T; 3]
where
    T: Copy + std::ops::Mul<Output = T> + std::ops::Sub<Output = T>,
{
    let l = CROSS_LEFT.map(usize::from);
    let r = CROSS_RIGHT.map(usize::from);
    [0usize, 1, 2].map(|k| a[l[k]] * b[r[k]] - a[r[k]] * b[l[k]])
}

/// Evaluate the 2-lane cross product: the z term in a 3-lane result.
pub fn cross2<T>(a: [T; 2], b: [T; 2], zero: T) -> [T; 3]
where
    T: Copy + std::ops::Mul<Output = T> + std::ops::Sub<Output = T>,
{
    [zero, zero, a[0] * b[1] - a[1] * b[0]]
}

/// Source of each output element of a transpose.
///
/// The input has `cols` columns of `rows` lanes. The output has `rows`
/// columns of `cols` lanes, and output column `k` lane `l` is input column
/// `l` lane `k`. Entries are `(input column, input lane)`.
#[must_use]
pub fn transpose_plan(rows: u8, cols: u8) -> Vec<Vec<(u8, u8)>> {
    (0..rows)
        .map(|k| (0..cols).map(|l| (l, k)).collect())
        .collect()
}

/// Apply a transpose plan to column-major data.
#[must_use]
pub fn transpose<T: Copy>(columns: &[Vec<T>]) -> Vec<Vec<T>> {
    let cols = columns.len() as u8;
    let rows = columns.first().map_or(0, Vec::len) as u8;
    transpose_plan(rows, cols)
        .iter()
        .map(|column| {
            column
                .iter()
                .map(|&(c, l)| columns[usize::from(c)][usize::from(l)])
                .collect()
        })
        .collect()
}

/// Columns of the `n`×`n` identity: `true` marks the unit lane.
#[must_use]
pub fn identity_plan(n: u8) -> Vec<Vec<bool>> {
    (0..n).map(|k| (0..n).map(|l| l == k).collect()).collect()
}

/// Literal testing the sign bit of a lane, as used by `all` and `any`.
///
/// Signed scalars use their most negative value; unsigned scalars use the
/// high-bit hex pattern.
#[must_use]
pub fn sign_mask_literal(desc: &TypeDescriptor) -> String {
    if desc.is_signed() {
        format!("{}::MIN", desc.primitive())
    } else {
        format!("0x8{}", "0".repeat(desc.size_bytes() * 2 - 1))
    }
}

/// Sign-bit mask as a two's complement bit pattern of `desc`'s width.
#[must_use]
pub fn sign_mask_bits(desc: &TypeDescriptor) -> u64 {
    1u64 << (desc.bits() - 1)
}

/// Evaluate `all()` over raw lane bit patterns.
#[must_use]
pub fn all_lanes(lanes: &[u64], desc: &TypeDescriptor) -> bool {
    let and = reduce(lanes, ReduceOp::And, desc.kind, 0, &|a, b| a & b);
    and & sign_mask_bits(desc) != 0
}

/// Evaluate `any()` over raw lane bit patterns.
#[must_use]
pub fn any_lanes(lanes: &[u64], desc: &TypeDescriptor) -> bool {
    let or = reduce(lanes, ReduceOp::Or, desc.kind, 0, &|a, b| a | b);
    or & sign_mask_bits(desc) != 0
}
