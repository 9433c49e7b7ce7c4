//! Conversion planning between catalog scalars.
//!
//! Every vector unit carries a plain conversion to each catalog scalar and,
//! between integer scalars, a saturating one. [`plan`] picks how each of
//! those is expressed; [`Strategy::apply`] evaluates the chosen strategy on
//! a single lane so the choice can be checked against numeric expectations.
//!
//! # Strategies
//!
//! | Strategy                     | Picked when                                        |
//! |------------------------------|----------------------------------------------------|
//! | `PerLaneCast`                | plain, width 3, integer source, widening           |
//! | `Identity`                   | same scalar                                        |
//! | `WidenCast`                  | same kind, widening                                |
//! | `PlainCast`                  | plain, anything else                               |
//! | `SaturateUnsignedFromSigned` | saturating, signed to unsigned, not narrowing      |
//! | `SaturateMinOnly`            | saturating, unsigned source                        |
//! | `SaturateClampBounds`        | saturating, anything else                          |

use std::cmp::Ordering;
use std::fmt;

use simdgen_catalog::{NumericKind, TypeDescriptor};

/// Whether a conversion wraps or clamps out-of-range values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConversionMode {
    /// Numeric `as` cast semantics.
    Plain,
    /// Clamp into the destination range first.
    Saturating,
}

impl ConversionMode {
    /// Suffix of the generated method name.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Plain => "",
            Self::Saturating => "_sat",
        }
    }
}

/// How one conversion is expressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Source and destination are the same scalar.
    Identity,
    /// Same kind, wider destination: every value fits.
    WidenCast,
    /// Clamp below at zero in the source type, then cast.
    SaturateUnsignedFromSigned,
    /// Clamp above at the destination maximum in the source type, then cast.
    SaturateMinOnly,
    /// Clamp into `[dst::MIN, dst::MAX]` in the source type, then cast.
    SaturateClampBounds,
    /// Bulk numeric cast.
    PlainCast,
    /// Three independent scalar casts.
    ///
    /// Bulk widening casts of 3-lane integer vectors miscompile on some
    /// targets, so those are spelled out lane by lane.
    PerLaneCast,
}

impl Strategy {
    /// Get the name of this strategy.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::WidenCast => "widen",
            Self::SaturateUnsignedFromSigned => "saturate-unsigned-from-signed",
            Self::SaturateMinOnly => "saturate-min-only",
            Self::SaturateClampBounds => "saturate-clamp-bounds",
            Self::PlainCast => "cast",
            Self::PerLaneCast => "per-lane-cast",
        }
    }

    /// Check if this strategy clamps before casting.
    #[must_use]
    pub const fn is_clamping(self) -> bool {
        matches!(
            self,
            Self::SaturateUnsignedFromSigned | Self::SaturateMinOnly | Self::SaturateClampBounds
        )
    }

    /// Evaluate this strategy on one lane of `src` converted to `dst`.
    #[must_use]
    pub fn apply(self, src: &TypeDescriptor, dst: &TypeDescriptor, lane: LaneValue) -> LaneValue {
        match self {
            Self::Identity => lane,
            Self::WidenCast | Self::PlainCast | Self::PerLaneCast => lane.cast(dst),
            Self::SaturateUnsignedFromSigned => lane.max(LaneValue::zero(src)).cast(dst),
            Self::SaturateMinOnly => lane.min(LaneValue::max_of(dst).cast(src)).cast(dst),
            Self::SaturateClampBounds => lane
                .max(LaneValue::min_of(dst).cast(src))
                .min(LaneValue::max_of(dst).cast(src))
                .cast(dst),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Choose the strategy for converting `width`-lane `src` vectors to `dst`.
///
/// Total over every pair of descriptors.
#[must_use]
pub fn plan(src: &TypeDescriptor, dst: &TypeDescriptor, width: u8, mode: ConversionMode) -> Strategy {
    if mode == ConversionMode::Plain && width == 3 && !src.is_float() && src.size < dst.size {
        return Strategy::PerLaneCast;
    }

    if src.name == dst.name {
        return Strategy::Identity;
    }

    if src.kind == dst.kind && src.size < dst.size {
        return Strategy::WidenCast;
    }

    match mode {
        ConversionMode::Plain => Strategy::PlainCast,
        ConversionMode::Saturating => match (src.kind, dst.kind) {
            (NumericKind::SignedInteger, NumericKind::UnsignedInteger) if src.size <= dst.size => {
                Strategy::SaturateUnsignedFromSigned
            }
            (NumericKind::UnsignedInteger, _) => Strategy::SaturateMinOnly,
            _ => Strategy::SaturateClampBounds,
        },
    }
}

/// Check if a saturating conversion is generated between the two scalars.
#[must_use]
pub const fn has_saturating(src: &TypeDescriptor, dst: &TypeDescriptor) -> bool {
    !src.is_float() && !dst.is_float()
}

/// Name of the generated conversion method, e.g. `to_uint_sat`.
#[must_use]
pub fn method_name(dst: &TypeDescriptor, mode: ConversionMode) -> String {
    format!("to_{}{}", dst.name, mode.suffix())
}

/// Expression converting `self` (a `width`-lane `src` vector) to `dst`.
///
/// Width 1 renders scalar casts and clamps on the primitive. Saturating
/// strategies clamp and then call the plain method.
#[must_use]
pub fn render(
    strategy: Strategy,
    mode: ConversionMode,
    src: &TypeDescriptor,
    dst: &TypeDescriptor,
    width: u8,
) -> String {
    let sp = src.primitive();
    let dp = dst.primitive();
    let plain = method_name(dst, ConversionMode::Plain);

    if width == 1 {
        return match strategy {
            Strategy::Identity => "self".to_string(),
            Strategy::WidenCast | Strategy::PlainCast | Strategy::PerLaneCast => {
                format!("self as {dp}")
            }
            Strategy::SaturateUnsignedFromSigned => format!("std::cmp::max(self, 0) as {dp}"),
            Strategy::SaturateMinOnly => format!("std::cmp::min(self, {dp}::MAX as {sp}) as {dp}"),
            Strategy::SaturateClampBounds => format!(
                "std::cmp::min(std::cmp::max(self, {dp}::MIN as {sp}), {dp}::MAX as {sp}) as {dp}"
            ),
        };
    }

    match strategy {
        Strategy::Identity => "self".to_string(),
        Strategy::PerLaneCast => {
            let lanes: Vec<_> = (0..width).map(|i| format!("self.{i} as {dp}")).collect();
            format!("{}({})", dst.vector_name(width), lanes.join(", "))
        }
        Strategy::WidenCast if mode == ConversionMode::Saturating => format!("self.{plain}()"),
        Strategy::WidenCast | Strategy::PlainCast => "unsafe { simd_cast(self) }".to_string(),
        Strategy::SaturateUnsignedFromSigned => {
            format!("self.max(Self::broadcast(0)).{plain}()")
        }
        Strategy::SaturateMinOnly => {
            format!("self.min(Self::broadcast({dp}::MAX as {sp})).{plain}()")
        }
        Strategy::SaturateClampBounds => format!(
            "self.clamp(Self::broadcast({dp}::MIN as {sp}), Self::broadcast({dp}::MAX as {sp})).{plain}()"
        ),
    }
}

/// A single lane value, wide enough for every catalog scalar.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LaneValue {
    /// Any integer lane.
    Int(i128),
    /// Any float lane, `f32` values held exactly.
    Float(f64),
}

impl LaneValue {
    /// Zero in the scalar's kind.
    #[must_use]
    pub fn zero(desc: &TypeDescriptor) -> Self {
        if desc.is_float() {
            Self::Float(0.0)
        } else {
            Self::Int(0)
        }
    }

    /// Largest finite value of the scalar.
    #[must_use]
    pub fn max_of(desc: &TypeDescriptor) -> Self {
        match desc.kind {
            NumericKind::Float if desc.bits() == 32 => Self::Float(f64::from(f32::MAX)),
            NumericKind::Float => Self::Float(f64::MAX),
            _ => Self::Int(int_bounds(desc).1),
        }
    }

    /// Smallest finite value of the scalar.
    #[must_use]
    pub fn min_of(desc: &TypeDescriptor) -> Self {
        match desc.kind {
            NumericKind::Float if desc.bits() == 32 => Self::Float(f64::from(f32::MIN)),
            NumericKind::Float => Self::Float(f64::MIN),
            _ => Self::Int(int_bounds(desc).0),
        }
    }

    /// Check if the value is representable in `desc` unchanged.
    #[must_use]
    pub fn fits(self, desc: &TypeDescriptor) -> bool {
        self.cast(desc) == self
    }

    /// Convert with `as` cast semantics: integers wrap, floats to integers
    /// truncate and saturate with NaN mapping to zero, and narrowing float
    /// casts round to nearest.
    #[must_use]
    pub fn cast(self, to: &TypeDescriptor) -> Self {
        match (self, to.kind) {
            (Self::Int(v), NumericKind::Float) => {
                if to.bits() == 32 {
                    Self::Float(f64::from(v as f32))
                } else {
                    Self::Float(v as f64)
                }
            }
            (Self::Int(v), _) => Self::Int(wrap(v, to)),
            (Self::Float(v), NumericKind::Float) => {
                if to.bits() == 32 {
                    Self::Float(f64::from(v as f32))
                } else {
                    Self::Float(v)
                }
            }
            (Self::Float(v), _) => {
                let (lo, hi) = int_bounds(to);
                if v.is_nan() {
                    Self::Int(0)
                } else if v.trunc() <= lo as f64 {
                    Self::Int(lo)
                } else if v.trunc() >= hi as f64 {
                    Self::Int(hi)
                } else {
                    Self::Int(v.trunc() as i128)
                }
            }
        }
    }

    /// Lane-wise maximum.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        match self.partial_cmp(&other) {
            Some(Ordering::Less) => other,
            _ => self,
        }
    }

    /// Lane-wise minimum.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        match self.partial_cmp(&other) {
            Some(Ordering::Greater) => other,
            _ => self,
        }
    }
}

impl PartialOrd for LaneValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl fmt::Display for LaneValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:?}"),
        }
    }
}

/// Inclusive range of an integer scalar.
fn int_bounds(desc: &TypeDescriptor) -> (i128, i128) {
    let bits = desc.bits();
    if desc.is_signed() {
        (-(1i128 << (bits - 1)), (1i128 << (bits - 1)) - 1)
    } else {
        (0, (1i128 << bits) - 1)
    }
}

/// Truncate to the scalar's width, sign-extending signed scalars.
fn wrap(v: i128, to: &TypeDescriptor) -> i128 {
    let bits = to.bits();
    let modulus = 1i128 << bits;
    let low = v.rem_euclid(modulus);
    if to.is_signed() && low >= modulus >> 1 {
        low - modulus
    } else {
        low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simdgen_catalog::Catalog;

    fn catalog() -> Catalog {
        Catalog::builtin().unwrap()
    }

    #[test]
    fn test_plan_is_total_over_catalog() {
        let catalog = catalog();
        for src in catalog.iter() {
            for dst in catalog.iter() {
                for width in [1, 2, 3, 4, 8, 16] {
                    let plain = plan(src, dst, width, ConversionMode::Plain);
                    assert!(!plain.is_clamping(), "{src} -> {dst}: {plain}");

                    let sat = plan(src, dst, width, ConversionMode::Saturating);
                    assert_ne!(sat, Strategy::PerLaneCast);
                    assert_ne!(sat, Strategy::PlainCast);
                }
            }
        }
    }

    #[test]
    fn test_saturating_picks() {
        let catalog = catalog();
        let get = |n: &str| catalog.get(n).unwrap();
        let sat = |a: &str, b: &str| plan(get(a), get(b), 4, ConversionMode::Saturating);

        assert_eq!(sat("int", "int"), Strategy::Identity);
        assert_eq!(sat("char", "short"), Strategy::WidenCast);
        assert_eq!(sat("uchar", "ulong"), Strategy::WidenCast);
        assert_eq!(sat("short", "ushort"), Strategy::SaturateUnsignedFromSigned);
        assert_eq!(sat("char", "ulong"), Strategy::SaturateUnsignedFromSigned);
        assert_eq!(sat("uint", "int"), Strategy::SaturateMinOnly);
        assert_eq!(sat("ulong", "uchar"), Strategy::SaturateMinOnly);
        assert_eq!(sat("int", "uchar"), Strategy::SaturateClampBounds);
        assert_eq!(sat("long", "char"), Strategy::SaturateClampBounds);
    }

    #[test]
    fn test_width_three_widening_is_per_lane() {
        let catalog = catalog();
        let uchar = catalog.get("uchar").unwrap();
        let uint = catalog.get("uint").unwrap();
        let float = catalog.get("float").unwrap();
        let double = catalog.get("double").unwrap();

        assert_eq!(plan(uchar, uint, 3, ConversionMode::Plain), Strategy::PerLaneCast);
        assert_eq!(plan(uchar, uint, 4, ConversionMode::Plain), Strategy::WidenCast);
        assert_eq!(plan(uchar, uint, 3, ConversionMode::Saturating), Strategy::WidenCast);
        assert_eq!(plan(uchar, double, 3, ConversionMode::Plain), Strategy::PerLaneCast);
        // Float sources keep the bulk cast.
        assert_eq!(plan(float, double, 3, ConversionMode::Plain), Strategy::WidenCast);
        assert_eq!(plan(uint, uchar, 3, ConversionMode::Plain), Strategy::PlainCast);
    }

    #[test]
    fn test_render_per_lane() {
        let catalog = catalog();
        let uchar = catalog.get("uchar").unwrap();
        let uint = catalog.get("uint").unwrap();
        assert_eq!(
            render(Strategy::PerLaneCast, ConversionMode::Plain, uchar, uint, 3),
            "uint3(self.0 as u32, self.1 as u32, self.2 as u32)"
        );
    }

    #[test]
    fn test_render_saturating() {
        let catalog = catalog();
        let int = catalog.get("int").unwrap();
        let char_ = catalog.get("char").unwrap();
        let uint = catalog.get("uint").unwrap();

        assert_eq!(
            render(Strategy::SaturateClampBounds, ConversionMode::Saturating, int, char_, 4),
            "self.clamp(Self::broadcast(i8::MIN as i32), Self::broadcast(i8::MAX as i32)).to_char()"
        );
        assert_eq!(
            render(Strategy::SaturateUnsignedFromSigned, ConversionMode::Saturating, int, uint, 2),
            "self.max(Self::broadcast(0)).to_uint()"
        );
        assert_eq!(
            render(Strategy::SaturateMinOnly, ConversionMode::Saturating, uint, int, 1),
            "std::cmp::min(self, i32::MAX as u32) as i32"
        );
        assert_eq!(method_name(uint, ConversionMode::Saturating), "to_uint_sat");

        let char4 = render(Strategy::WidenCast, ConversionMode::Plain, char_, int, 4);
        assert_eq!(char4, "unsafe { simd_cast(self) }");
        let char4 = render(Strategy::WidenCast, ConversionMode::Saturating, char_, int, 4);
        assert_eq!(char4, "self.to_int()");
    }

    #[test]
    fn test_cast_semantics() {
        let catalog = catalog();
        let uchar = catalog.get("uchar").unwrap();
        let char_ = catalog.get("char").unwrap();
        let int = catalog.get("int").unwrap();
        let float = catalog.get("float").unwrap();

        assert_eq!(LaneValue::Int(300).cast(uchar), LaneValue::Int(44));
        assert_eq!(LaneValue::Int(200).cast(char_), LaneValue::Int(-56));
        assert_eq!(LaneValue::Int(-1).cast(uchar), LaneValue::Int(255));
        assert_eq!(LaneValue::Float(-3.7).cast(int), LaneValue::Int(-3));
        assert_eq!(LaneValue::Float(1e20).cast(int), LaneValue::Int(i128::from(i32::MAX)));
        assert_eq!(LaneValue::Float(f64::NAN).cast(uchar), LaneValue::Int(0));
        assert_eq!(
            LaneValue::Int(16_777_217).cast(float),
            LaneValue::Float(16_777_216.0)
        );
    }

    #[test]
    fn test_apply_clamps() {
        let catalog = catalog();
        let short = catalog.get("short").unwrap();
        let uchar = catalog.get("uchar").unwrap();
        let strategy = plan(short, uchar, 8, ConversionMode::Saturating);

        assert_eq!(strategy.apply(short, uchar, LaneValue::Int(-500)), LaneValue::Int(0));
        assert_eq!(strategy.apply(short, uchar, LaneValue::Int(500)), LaneValue::Int(255));
        assert_eq!(strategy.apply(short, uchar, LaneValue::Int(17)), LaneValue::Int(17));
    }

    #[test]
    fn test_saturating_only_between_integers() {
        let catalog = catalog();
        let int = catalog.get("int").unwrap();
        let float = catalog.get("float").unwrap();
        assert!(has_saturating(int, int));
        assert!(!has_saturating(int, float));
        assert!(!has_saturating(float, int));
    }
}
