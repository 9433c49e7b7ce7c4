//! Matrix unit generation.
//!
//! Matrices are column-major: `{name}{cols}x{rows}` holds `cols` column
//! vectors of type `{name}{rows}`. Every shape gets element-wise algebra and
//! a transpose. Square shapes additionally get products, an identity and an
//! inverse delegated to a native routine named by an [`InverseRoutine`].

use std::fmt;

use simdgen_catalog::{MatrixSpec, ScalarSize, TypeDescriptor};
use simdgen_emit::Emit;

use crate::lanes;
use crate::{inline_fn, inline_fn_lines};

/// Names the externally linked routine that inverts square matrices.
pub trait InverseRoutine: Send + Sync + fmt::Debug {
    /// Symbol inverting `dim`×`dim` matrices of `scalar`, if one exists.
    fn symbol(&self, scalar: &TypeDescriptor, dim: u8) -> Option<String>;
}

/// Native routines named `{prefix}{f|d}{dim}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeInverse {
    prefix: String,
}

impl NativeInverse {
    /// Prefix of the shipped runtime's routines.
    pub const DEFAULT_PREFIX: &'static str = "__invert_";

    /// Create a routine namer with a custom prefix.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// The symbol prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Default for NativeInverse {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PREFIX)
    }
}

impl InverseRoutine for NativeInverse {
    fn symbol(&self, scalar: &TypeDescriptor, dim: u8) -> Option<String> {
        precision_code(scalar).map(|code| format!("{}{code}{dim}", self.prefix))
    }
}

/// `f` for single and `d` for double precision floats.
#[must_use]
pub fn precision_code(scalar: &TypeDescriptor) -> Option<char> {
    match (scalar.is_float(), scalar.size) {
        (true, ScalarSize::Four) => Some('f'),
        (true, ScalarSize::Eight) => Some('d'),
        _ => None,
    }
}

/// Generator for one matrix shape.
#[derive(Clone, Copy, Debug)]
pub struct MatrixGenerator<'a> {
    spec: MatrixSpec<'a>,
    inverse: &'a dyn InverseRoutine,
}

impl<'a> MatrixGenerator<'a> {
    /// Create a generator for `spec`.
    #[must_use]
    pub fn new(spec: MatrixSpec<'a>, inverse: &'a dyn InverseRoutine) -> Self {
        Self { spec, inverse }
    }

    /// Emit the unit body.
    pub fn generate<E: Emit>(&self, e: &mut E) {
        let inverse = self.inverse_symbol();

        self.emit_declaration(e);
        if let Some(symbol) = &inverse {
            let name = self.name();
            e.padded_block("extern \"C\"", |e| {
                e.line(&format!("fn {symbol}(a: {name}) -> {name};"));
            });
        }

        self.emit_elementwise(e, "Add", "add", "+");
        self.emit_elementwise(e, "Sub", "sub", "-");
        if self.spec.is_square() {
            self.emit_products(e);
        }
        self.emit_scale(e);
        self.emit_inherent(e, inverse.as_deref());
    }

    fn name(&self) -> String {
        self.spec.type_name()
    }

    fn cols(&self) -> u8 {
        self.spec.cols
    }

    fn prim(&self) -> &'static str {
        self.spec.scalar.primitive()
    }

    fn inverse_symbol(&self) -> Option<String> {
        if self.spec.is_square() {
            self.inverse.symbol(self.spec.scalar, self.spec.rows)
        } else {
            None
        }
    }

    /// `{name}(f(0), ..., f(cols - 1))`.
    fn map_columns(&self, f: impl Fn(u8) -> String) -> String {
        let columns: Vec<_> = (0..self.cols()).map(f).collect();
        format!("{}({})", self.name(), columns.join(", "))
    }

    fn emit_declaration<E: Emit>(&self, e: &mut E) {
        let column = self.spec.column_type();
        let fields = vec![format!("pub {column}"); usize::from(self.cols())];
        e.padded("#[repr(C)]");
        e.line("#[derive(Copy, Clone, Debug)]");
        e.line(&format!("pub struct {}({});", self.name(), fields.join(", ")));
    }

    fn emit_elementwise<E: Emit>(&self, e: &mut E, trait_name: &str, method: &str, op: &str) {
        e.padded_block(&format!("impl std::ops::{trait_name} for {}", self.name()), |e| {
            e.line("type Output = Self;");
            inline_fn(
                e,
                &format!("fn {method}(self, other: Self) -> Self"),
                &self.map_columns(|k| format!("self.{k} {op} other.{k}")),
            );
        });
    }

    /// Matrix and vector products, both through `Dot`.
    fn emit_products<E: Emit>(&self, e: &mut E) {
        let name = self.name();
        let column = self.spec.column_type();

        e.padded_block(&format!("impl std::ops::Mul for {name}"), |e| {
            e.line("type Output = Self;");
            inline_fn(e, "fn mul(self, other: Self) -> Self", "self.dot(other)");
        });

        e.padded_block(&format!("impl std::ops::Mul<{column}> for {name}"), |e| {
            e.line(&format!("type Output = {column};"));
            inline_fn(e, &format!("fn mul(self, other: {column}) -> {column}"), "self.dot(other)");
        });

        e.padded_block(&format!("impl Dot<{name}> for {name}"), |e| {
            e.line(&format!("type DotProduct = {name};"));
            inline_fn(
                e,
                &format!("fn dot(self, other: {name}) -> {name}"),
                &self.map_columns(|k| format!("self.dot(other.{k})")),
            );
        });

        e.padded_block(&format!("impl Dot<{column}> for {name}"), |e| {
            e.line(&format!("type DotProduct = {column};"));
            let terms: Vec<_> = (0..self.cols())
                .map(|k| format!("self.{k} * other.{k}"))
                .collect();
            inline_fn(e, &format!("fn dot(self, other: {column}) -> {column}"), &terms.join(" + "));
        });
    }

    fn emit_scale<E: Emit>(&self, e: &mut E) {
        let prim = self.prim();
        let column = self.spec.column_type();

        e.padded_block(&format!("impl std::ops::Mul<{prim}> for {}", self.name()), |e| {
            e.line("type Output = Self;");
            inline_fn_lines(
                e,
                &format!("fn mul(self, other: {prim}) -> Self"),
                &[
                    format!("let a = {column}::broadcast(other);"),
                    String::new(),
                    self.map_columns(|k| format!("a * self.{k}")),
                ],
            );
        });
    }

    fn emit_inherent<E: Emit>(&self, e: &mut E, inverse: Option<&str>) {
        let name = self.name();
        let prim = self.prim();
        let column = self.spec.column_type();

        e.padded_block(&format!("impl {name}"), |e| {
            let params: Vec<_> = (0..self.cols()).map(|k| format!("c{k}: {column}")).collect();
            inline_fn(
                e,
                &format!("pub fn from_columns({}) -> Self", params.join(", ")),
                &self.map_columns(|k| format!("c{k}")),
            );

            if self.spec.is_square() {
                inline_fn(e, "pub fn identity() -> Self", &self.identity_body());
            }

            inline_fn_lines(
                e,
                &format!("pub fn linear_combination(a: {prim}, x: Self, b: {prim}, y: Self) -> Self"),
                &[
                    format!("let a = {column}::broadcast(a);"),
                    format!("let b = {column}::broadcast(b);"),
                    String::new(),
                    self.map_columns(|k| format!("a * x.{k} + b * y.{k}")),
                ],
            );

            inline_fn_lines(
                e,
                &format!("pub fn transpose(self) -> {}", self.spec.transpose_name()),
                &self.transpose_body(),
            );

            let row = self.spec.row_type();
            let rows: Vec<_> = (0..self.spec.rows).map(|k| format!("r{k}: {row}")).collect();
            let args: Vec<_> = (0..self.spec.rows).map(|k| format!("r{k}")).collect();
            inline_fn(
                e,
                &format!("pub fn from_rows({}) -> Self", rows.join(", ")),
                &format!("{}({}).transpose()", self.spec.transpose_name(), args.join(", ")),
            );

            if let Some(symbol) = inverse {
                inline_fn(e, "pub fn inverse(self) -> Self", &format!("unsafe {{ {symbol}(self) }}"));
            }
        });
    }

    fn identity_body(&self) -> String {
        let column = self.spec.column_type();
        let columns: Vec<_> = lanes::identity_plan(self.spec.rows)
            .into_iter()
            .map(|unit| {
                let lanes: Vec<_> = unit
                    .into_iter()
                    .map(|one| if one { "1.0" } else { "0.0" })
                    .collect();
                format!("{column}({})", lanes.join(", "))
            })
            .collect();
        format!("{}({})", self.name(), columns.join(", "))
    }

    fn transpose_body(&self) -> Vec<String> {
        let row = self.spec.row_type();
        let plan = lanes::transpose_plan(self.spec.rows, self.spec.cols);

        let mut body: Vec<String> = plan
            .iter()
            .enumerate()
            .map(|(k, sources)| {
                let lanes: Vec<_> = sources.iter().map(|(c, l)| format!("self.{c}.{l}")).collect();
                format!("let c{k} = {row}({});", lanes.join(", "))
            })
            .collect();

        let columns: Vec<_> = (0..plan.len()).map(|k| format!("c{k}")).collect();
        body.push(String::new());
        body.push(format!("{}({})", self.spec.transpose_name(), columns.join(", ")));
        body
    }
}
