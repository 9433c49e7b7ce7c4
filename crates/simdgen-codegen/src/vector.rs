//! Vector unit generation.
//!
//! One [`VectorGenerator`] call produces everything a single `{name}{width}`
//! type needs: the declaration, operators, inherent helpers, comparisons,
//! swizzles and the trait impls that apply to its kind. Width 1 is the type
//! layout's folded scalar and takes the [`VectorGenerator::generate_scalar`]
//! path instead.

use simdgen_catalog::{Catalog, NumericKind, TypeDescriptor, VectorSpec};
use simdgen_emit::Emit;

use crate::convert::{self, ConversionMode};
use crate::lanes::{self, LaneRef, ReduceOp, Swizzle};
use crate::{inline_fn, inline_fn_lines};

/// Arithmetic operators on every vector: trait, method, intrinsic.
const ARITHMETIC: [(&str, &str, &str); 4] = [
    ("Add", "add", "simd_add"),
    ("Sub", "sub", "simd_sub"),
    ("Mul", "mul", "simd_mul"),
    ("Div", "div", "simd_div"),
];

/// Bitwise and shift operators on integer vectors.
const BITWISE: [(&str, &str, &str); 5] = [
    ("BitAnd", "bitand", "simd_and"),
    ("BitOr", "bitor", "simd_or"),
    ("BitXor", "bitxor", "simd_xor"),
    ("Shl", "shl", "simd_shl"),
    ("Shr", "shr", "simd_shr"),
];

/// Comparisons: method and intrinsic.
const COMPARISONS: [(&str, &str); 6] = [
    ("eq", "simd_eq"),
    ("ne", "simd_ne"),
    ("lt", "simd_lt"),
    ("le", "simd_le"),
    ("gt", "simd_gt"),
    ("ge", "simd_ge"),
];

/// Lane-wise float functions forwarded to the scalar method.
const FLOAT_LANE_FNS: [&str; 7] = ["sqrt", "fract", "ceil", "floor", "trunc", "sin", "cos"];

/// Generator for one vector type.
#[derive(Clone, Copy, Debug)]
pub struct VectorGenerator<'a> {
    catalog: &'a Catalog,
    spec: VectorSpec<'a>,
}

impl<'a> VectorGenerator<'a> {
    /// Create a generator for `spec`, resolving companions in `catalog`.
    #[must_use]
    pub fn new(catalog: &'a Catalog, spec: VectorSpec<'a>) -> Self {
        Self { catalog, spec }
    }

    /// Emit the unit body.
    pub fn generate<E: Emit>(&self, e: &mut E) {
        if self.spec.is_scalar() {
            self.generate_scalar(e);
            return;
        }

        self.emit_declaration(e);
        self.emit_arithmetic(e);
        self.emit_inherent(e);
        self.emit_vector_impl(e);
        self.emit_dot(e);

        if self.scalar().is_integer() {
            self.emit_integer(e);
        }
        if self.scalar().is_signed() {
            self.emit_select(e);
        }
        if self.scalar().is_float() {
            self.emit_float(e);
            self.emit_geometry(e);
            if matches!(self.width(), 2 | 3) && self.scalar().supports_width(3) {
                self.emit_cross(e);
            }
        }
    }

    /// Emit the folded width-1 unit: an alias for the primitive and the
    /// trait impls on it.
    pub fn generate_scalar<E: Emit>(&self, e: &mut E) {
        let prim = self.prim();
        e.padded(&format!("pub type {} = {prim};", self.name()));

        self.emit_vector_impl(e);
        e.padded_block(&format!("impl Dot<{prim}> for {prim}"), |e| {
            e.line(&format!("type DotProduct = {prim};"));
            inline_fn(e, &format!("fn dot(self, other: Self) -> {prim}"), "self * other");
        });

        if self.scalar().is_integer() {
            self.emit_integer(e);
        }
        if self.scalar().is_float() {
            self.emit_float(e);
            self.emit_geometry(e);
        }
    }

    fn scalar(&self) -> &'a TypeDescriptor {
        self.spec.scalar
    }

    fn width(&self) -> u8 {
        self.spec.width
    }

    fn name(&self) -> String {
        self.spec.type_name()
    }

    fn prim(&self) -> &'static str {
        self.scalar().primitive()
    }

    fn zero(&self) -> &'static str {
        self.scalar().zero_literal()
    }

    /// `{name}(f(0), f(1), ...)` over every lane.
    fn map_lanes(&self, f: impl Fn(u8) -> String) -> String {
        let lanes: Vec<_> = (0..self.width()).map(f).collect();
        format!("{}({})", self.name(), lanes.join(", "))
    }

    fn emit_declaration<E: Emit>(&self, e: &mut E) {
        let fields = vec![format!("pub {}", self.prim()); usize::from(self.width())];
        e.padded("#[repr(C)]");
        e.line("#[repr(simd)]");
        e.line("#[derive(Copy, Clone, Debug)]");
        e.line(&format!("pub struct {}({});", self.name(), fields.join(", ")));
    }

    fn emit_arithmetic<E: Emit>(&self, e: &mut E) {
        let name = self.name();
        for (trait_name, method, intrinsic) in ARITHMETIC {
            self.emit_binary_op(e, trait_name, method, intrinsic);
        }

        e.padded_block(&format!("impl std::ops::Neg for {name}"), |e| {
            e.line("type Output = Self;");
            inline_fn(
                e,
                "fn neg(self) -> Self",
                &format!("Self::broadcast({}) - self", self.zero()),
            );
        });

        // Lane-wise comparisons reduced through the boolean companion.
        e.padded_block(&format!("impl PartialEq for {name}"), |e| {
            inline_fn(
                e,
                "fn eq(&self, other: &Self) -> bool",
                &format!("{name}::eq(*self, *other).all()"),
            );
            inline_fn(
                e,
                "fn ne(&self, other: &Self) -> bool",
                &format!("{name}::ne(*self, *other).any()"),
            );
        });

        if !self.scalar().is_integer() {
            return;
        }

        e.padded_block(&format!("impl std::ops::Rem for {name}"), |e| {
            e.line("type Output = Self;");
            inline_fn(e, "fn rem(self, other: Self) -> Self", "self - (self / other) * other");
        });

        for (trait_name, method, intrinsic) in BITWISE {
            self.emit_binary_op(e, trait_name, method, intrinsic);
        }

        e.padded_block(&format!("impl std::ops::Not for {name}"), |e| {
            e.line("type Output = Self;");
            inline_fn(e, "fn not(self) -> Self", "self ^ Self::broadcast(!0)");
        });
    }

    /// Vector op vector, vector op scalar, scalar op vector.
    fn emit_binary_op<E: Emit>(&self, e: &mut E, trait_name: &str, method: &str, intrinsic: &str) {
        let name = self.name();
        let prim = self.prim();

        e.padded_block(&format!("impl std::ops::{trait_name} for {name}"), |e| {
            e.line("type Output = Self;");
            inline_fn(
                e,
                &format!("fn {method}(self, other: Self) -> Self"),
                &format!("unsafe {{ {intrinsic}(self, other) }}"),
            );
        });

        e.padded_block(&format!("impl std::ops::{trait_name}<{prim}> for {name}"), |e| {
            e.line("type Output = Self;");
            inline_fn(
                e,
                &format!("fn {method}(self, other: {prim}) -> Self"),
                &format!("unsafe {{ {intrinsic}(self, Self::broadcast(other)) }}"),
            );
        });

        e.padded_block(&format!("impl std::ops::{trait_name}<{name}> for {prim}"), |e| {
            e.line(&format!("type Output = {name};"));
            inline_fn(
                e,
                &format!("fn {method}(self, other: {name}) -> {name}"),
                &format!("unsafe {{ {intrinsic}({name}::broadcast(self), other) }}"),
            );
        });
    }

    fn emit_inherent<E: Emit>(&self, e: &mut E) {
        let name = self.name();
        let prim = self.prim();
        let boolean = self.spec.boolean_name();

        e.padded_block(&format!("impl {name}"), |e| {
            e.padded("#[inline]");
            e.block("pub fn bitcast<T>(x: T) -> Self", |e| {
                e.line("assert_eq!(std::mem::size_of::<T>(), std::mem::size_of::<Self>());");
                e.line("");
                e.line("unsafe { std::mem::transmute_copy(&x) }");
            });

            inline_fn(
                e,
                &format!("pub fn broadcast(x: {prim}) -> Self"),
                &self.map_lanes(|_| "x".to_string()),
            );
            inline_fn(
                e,
                &format!("pub fn extract(self, i: u32) -> {prim}"),
                "unsafe { simd_extract(self, i) }",
            );
            inline_fn(
                e,
                &format!("pub fn replace(self, i: u32, x: {prim}) -> Self"),
                "unsafe { simd_insert(self, i, x) }",
            );

            for (method, intrinsic) in COMPARISONS {
                inline_fn(
                    e,
                    &format!("pub fn {method}(self, other: Self) -> {boolean}"),
                    &format!("unsafe {{ {intrinsic}(self, other) }}"),
                );
            }

            for swizzle in Swizzle::ALL {
                self.emit_swizzle(e, swizzle);
            }
        });
    }

    fn emit_swizzle<E: Emit>(&self, e: &mut E, swizzle: Swizzle) {
        let width = self.width();
        let half = lanes::half_width(width);
        let parts: Vec<String> = swizzle
            .lanes(width)
            .into_iter()
            .map(|r| match r {
                LaneRef::Lane(i) => format!("self.{i}"),
                LaneRef::Zero => self.zero().to_string(),
            })
            .collect();

        let (ret, body) = if half == 1 {
            (self.prim().to_string(), parts.join(", "))
        } else {
            let ty = self.spec.sibling(half);
            let body = format!("{ty}({})", parts.join(", "));
            (ty, body)
        };

        inline_fn(e, &format!("pub fn {}(self) -> {ret}", swizzle.name()), &body);
    }

    fn emit_vector_impl<E: Emit>(&self, e: &mut E) {
        let name = self.name();
        let header = if self.spec.is_scalar() {
            format!("impl Vector for {}", self.prim())
        } else {
            format!("impl Vector for {name}")
        };

        e.padded_block(&header, |e| {
            e.line(&format!("type Scalar = {};", self.prim()));
            e.line(&format!("type Boolean = {};", self.spec.boolean_name()));
            self.emit_aliases(e);

            inline_fn_lines(e, "fn abs(self) -> Self", &self.abs_body());
            inline_fn(e, "fn max(self, other: Self) -> Self", &self.min_max_body("max"));
            inline_fn(e, "fn min(self, other: Self) -> Self", &self.min_max_body("min"));
            inline_fn(e, "fn clamp(self, min: Self, max: Self) -> Self", &self.clamp_body());
            inline_fn(e, "fn madd(self, a: Self, b: Self) -> Self", "self * a + b");

            for op in ReduceOp::COMMON {
                self.emit_reduction(e, op);
            }

            self.emit_conversions(e);
        });
    }

    /// `type {Kind}Vector = {name}{width};` for every catalog scalar.
    fn emit_aliases<E: Emit>(&self, e: &mut E) {
        let width = self.width();
        for kind in [
            NumericKind::SignedInteger,
            NumericKind::UnsignedInteger,
            NumericKind::Float,
        ] {
            e.pad();
            for desc in self.catalog.iter().filter(|d| d.kind == kind && d.supports_width(width)) {
                e.line(&format!("type {} = {};", alias_name(desc), desc.vector_name(width)));
            }
        }
    }

    fn abs_body(&self) -> Vec<String> {
        let scalar = self.scalar();
        match (scalar.kind, self.spec.is_scalar()) {
            (NumericKind::SignedInteger, true) => vec!["self.wrapping_abs()".to_string()],
            (NumericKind::SignedInteger, false) => vec![
                format!("let mask = self >> {};", scalar.bits() - 1),
                String::new(),
                "(self ^ mask) - mask".to_string(),
            ],
            (NumericKind::Float, true) => vec![format!("{}::abs(self)", self.prim())],
            (NumericKind::Float, false) => vec![format!(
                "Self::Boolean::broadcast({}::MAX).bitselect(Self::broadcast(0.0), self)",
                self.spec.boolean.primitive()
            )],
            (NumericKind::UnsignedInteger, _) => vec!["self".to_string()],
        }
    }

    fn min_max_body(&self, op: &str) -> String {
        let compare = if op == "max" { "gt" } else { "lt" };
        match (self.scalar().is_float(), self.spec.is_scalar()) {
            (true, true) => format!("{}::{op}(self, other)", self.prim()),
            (false, true) => format!("std::cmp::{op}(self, other)"),
            (true, false) => self.map_lanes(|i| format!("self.{i}.{op}(other.{i})")),
            (false, false) => format!("other.{compare}(self).bitselect(self, other)"),
        }
    }

    fn clamp_body(&self) -> String {
        match (self.scalar().is_float(), self.spec.is_scalar()) {
            (true, true) => format!("{}::clamp(self, min, max)", self.prim()),
            (false, true) => "std::cmp::min(std::cmp::max(self, min), max)".to_string(),
            (_, false) => "self.max(min).min(max)".to_string(),
        }
    }

    fn emit_reduction<E: Emit>(&self, e: &mut E, op: ReduceOp) {
        let body = lanes::render_reduction(op, self.width(), self.scalar().kind);
        inline_fn(e, &format!("fn {}(self) -> Self::Scalar", op.method()), &body);
    }

    /// A plain conversion to every scalar, and a saturating one between
    /// integers.
    fn emit_conversions<E: Emit>(&self, e: &mut E) {
        let src = self.scalar();
        let width = self.width();

        for dst in self.catalog.iter().filter(|d| d.supports_width(width)) {
            let mut modes = vec![ConversionMode::Plain];
            if convert::has_saturating(src, dst) {
                modes.push(ConversionMode::Saturating);
            }

            for mode in modes {
                let strategy = convert::plan(src, dst, width, mode);
                let body = convert::render(strategy, mode, src, dst, width);
                let signature = format!(
                    "fn {}(self) -> {}",
                    convert::method_name(dst, mode),
                    dst.vector_name(width)
                );
                inline_fn(e, &signature, &body);
            }
        }
    }

    fn emit_dot<E: Emit>(&self, e: &mut E) {
        let name = self.name();
        e.padded_block(&format!("impl Dot<{name}> for {name}"), |e| {
            e.line(&format!("type DotProduct = {};", self.prim()));
            inline_fn(
                e,
                "fn dot(self, other: Self) -> Self::DotProduct",
                "(self * other).reduce_add()",
            );
        });
    }

    fn emit_integer<E: Emit>(&self, e: &mut E) {
        let target = if self.spec.is_scalar() {
            self.prim().to_string()
        } else {
            self.name()
        };
        let mask = lanes::sign_mask_literal(self.scalar());

        e.padded_block(&format!("impl Integer for {target}"), |e| {
            for op in ReduceOp::BITWISE {
                self.emit_reduction(e, op);
            }

            let all = if self.spec.is_scalar() {
                format!("self & {mask} != 0")
            } else {
                format!("self.reduce_and() & {mask} != 0")
            };
            let any = if self.spec.is_scalar() {
                format!("self & {mask} != 0")
            } else {
                format!("self.reduce_or() & {mask} != 0")
            };
            inline_fn(e, "fn all(self) -> bool", &all);
            inline_fn(e, "fn any(self) -> bool", &any);
        });
    }

    /// `Select` for every catalog type whose boolean companion is this type.
    fn emit_select<E: Emit>(&self, e: &mut E) {
        let name = self.name();
        let width = self.width();
        let shift = self.scalar().bits() - 1;

        for other in self
            .catalog
            .with_boolean(self.scalar())
            .filter(|d| d.supports_width(width))
        {
            let other_name = other.vector_name(width);
            let bitselect = if other_name == name {
                "(a & !self) | (b & self)".to_string()
            } else {
                format!("{other_name}::bitcast(self.bitselect({name}::bitcast(a), {name}::bitcast(b)))")
            };

            e.padded_block(&format!("impl Select<{other_name}> for {name}"), |e| {
                inline_fn(
                    e,
                    &format!("fn select(self, a: {other_name}, b: {other_name}) -> {other_name}"),
                    &format!("(self >> {shift}).bitselect(a, b)"),
                );
                inline_fn(
                    e,
                    &format!("fn bitselect(self, a: {other_name}, b: {other_name}) -> {other_name}"),
                    &bitselect,
                );
            });
        }
    }

    fn emit_float<E: Emit>(&self, e: &mut E) {
        let prim = self.prim();
        let scalar = self.spec.is_scalar();
        let target = if scalar { prim.to_string() } else { self.name() };

        e.padded_block(&format!("impl Float for {target}"), |e| {
            let copysign = if scalar {
                format!("{prim}::copysign(self, sign)")
            } else {
                format!(
                    "Self::Boolean::broadcast({}::MAX).bitselect(sign, self)",
                    self.spec.boolean.primitive()
                )
            };
            inline_fn(e, "fn copysign(self, sign: Self) -> Self", &copysign);

            for f in FLOAT_LANE_FNS {
                let body = if scalar {
                    format!("{prim}::{f}(self)")
                } else {
                    self.map_lanes(|i| format!("self.{i}.{f}()"))
                };
                inline_fn(e, &format!("fn {f}(self) -> Self"), &body);
            }

            let (sign, recip, rsqrt, step) = if scalar {
                (
                    format!("if self == 0.0 {{ 0.0 }} else {{ {prim}::signum(self) }}"),
                    "1.0 / self".to_string(),
                    format!("1.0 / {prim}::sqrt(self)"),
                    "if self < edge { 0.0 } else { 1.0 }".to_string(),
                )
            } else {
                (
                    "self.ne(Self::broadcast(0.0)).bitselect(Self::broadcast(0.0), Self::broadcast(1.0).copysign(self))"
                        .to_string(),
                    "Self::broadcast(1.0) / self".to_string(),
                    "self.sqrt().recip()".to_string(),
                    "self.lt(edge).bitselect(Self::broadcast(1.0), Self::broadcast(0.0))".to_string(),
                )
            };
            inline_fn(e, "fn sign(self) -> Self", &sign);
            inline_fn(e, "fn mix(self, other: Self, t: Self) -> Self", "self + (other - self) * t");
            inline_fn(e, "fn recip(self) -> Self", &recip);
            inline_fn(e, "fn rsqrt(self) -> Self", &rsqrt);
            inline_fn(e, "fn step(self, edge: Self) -> Self", &step);

            let smooth = if scalar {
                vec![
                    format!("let t = {prim}::clamp((self - edge0) / (edge1 - edge0), 0.0, 1.0);"),
                    String::new(),
                    "t * t * (3.0 - 2.0 * t)".to_string(),
                ]
            } else {
                vec![
                    "let t = ((self - edge0) / (edge1 - edge0)).clamp(Self::broadcast(0.0), Self::broadcast(1.0));"
                        .to_string(),
                    String::new(),
                    "t * t * (Self::broadcast(3.0) - t * 2.0)".to_string(),
                ]
            };
            inline_fn_lines(e, "fn smoothstep(self, edge0: Self, edge1: Self) -> Self", &smooth);
        });
    }

    fn emit_geometry<E: Emit>(&self, e: &mut E) {
        let prim = self.prim();
        let target = if self.spec.is_scalar() {
            prim.to_string()
        } else {
            self.name()
        };

        e.padded_block(&format!("impl Geometry for {target}"), |e| {
            let fns = [
                (format!("fn length_squared(self) -> {prim}"), "self.dot(self)"),
                (format!("fn length(self) -> {prim}"), "self.length_squared().sqrt()"),
                (
                    format!("fn distance_squared(self, other: Self) -> {prim}"),
                    "(self - other).length_squared()",
                ),
                (format!("fn distance(self, other: Self) -> {prim}"), "(self - other).length()"),
                ("fn normalize(self) -> Self".to_string(), "self * (1.0 / self.length())"),
                (format!("fn norm_one(self) -> {prim}"), "self.abs().reduce_add()"),
                (format!("fn norm_inf(self) -> {prim}"), "self.abs().reduce_max()"),
                (
                    "fn project(self, onto: Self) -> Self".to_string(),
                    "onto * (self.dot(onto) / onto.dot(onto))",
                ),
                (
                    "fn reflect(self, normal: Self) -> Self".to_string(),
                    "self - normal * (2.0 * self.dot(normal))",
                ),
            ];
            for (signature, body) in &fns {
                inline_fn(e, signature, body);
            }
        });
    }

    fn emit_cross<E: Emit>(&self, e: &mut E) {
        let name = self.name();
        let product = self.spec.sibling(3);

        e.padded_block(&format!("impl Cross for {name}"), |e| {
            e.line(&format!("type CrossProduct = {product};"));

            if self.width() == 2 {
                inline_fn(
                    e,
                    "fn cross(self, other: Self) -> Self::CrossProduct",
                    &format!("{product}(0.0, 0.0, self.0 * other.1 - self.1 * other.0)"),
                );
                return;
            }

            let permute = |var: &str, lanes: [u8; 3]| {
                let parts: Vec<_> = lanes.iter().map(|l| format!("{var}.{l}")).collect();
                format!("{name}({})", parts.join(", "))
            };
            let body = vec![
                format!(
                    "let a = {} * {};",
                    permute("self", lanes::CROSS_LEFT),
                    permute("other", lanes::CROSS_RIGHT)
                ),
                format!(
                    "let b = {} * {};",
                    permute("self", lanes::CROSS_RIGHT),
                    permute("other", lanes::CROSS_LEFT)
                ),
                String::new(),
                "a - b".to_string(),
            ];
            inline_fn_lines(e, "fn cross(self, other: Self) -> Self::CrossProduct", &body);
        });
    }
}

/// Associated type name for a scalar's vectors, e.g. `UShortVector`.
#[must_use]
pub fn alias_name(desc: &TypeDescriptor) -> String {
    let (prefix, rest) = match desc.name.strip_prefix('u') {
        Some(rest) if desc.is_unsigned() && !rest.is_empty() => ("U", rest),
        _ => ("", desc.name.as_str()),
    };
    let mut chars = rest.chars();
    let head: String = chars.next().map(|c| c.to_ascii_uppercase()).into_iter().collect();
    format!("{prefix}{head}{}Vector", chars.as_str())
}
