//! Source generators for SIMD vector and matrix types.
//!
//! This crate turns catalog specs into named units of Rust source for a SIMD
//! support crate. Each unit is independent: generation is a pure function of
//! the catalog and one (type, width) or (type, rows, cols) combination.
//!
//! # Overview
//!
//! ```text
//! VectorSpec ──▶ VectorGenerator ──┐
//!                  │  convert      │
//!                  │  lanes        ├──▶ Emit ──▶ Unit
//! MatrixSpec ──▶ MatrixGenerator ──┘
//!                  │  InverseRoutine
//! ```
//!
//! The numeric decisions live in [`convert`] and [`lanes`] as plain data
//! with evaluators; the generators only render them.
//!
//! # Generated Target
//!
//! Units assume the consuming crate brings the `simd_*` platform intrinsics
//! and the `Vector`, `Dot`, `Cross`, `Float`, `Geometry`, `Integer` and
//! `Select` traits into scope at its root.

#![warn(missing_docs)]

pub mod convert;
pub mod lanes;
pub mod matrix;
pub mod vector;

pub use convert::{ConversionMode, LaneValue, Strategy};
pub use matrix::{InverseRoutine, MatrixGenerator, NativeInverse};
pub use vector::VectorGenerator;

use std::fmt;

use simdgen_catalog::{Catalog, Layout, MatrixSpec, VectorSpec};
use simdgen_emit::{Emit, TextEmitter, DEFAULT_INDENT};
use tracing::debug;

/// Import line opening every unit.
pub const PRELUDE: &str = "use crate::*;";

/// Which generator produced a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UnitKind {
    /// A vector type.
    Vector,
    /// A matrix type.
    Matrix,
}

impl UnitKind {
    /// Directory the unit is materialized under.
    #[must_use]
    pub const fn dir(self) -> &'static str {
        match self {
            Self::Vector => "vector",
            Self::Matrix => "matrix",
        }
    }

    /// Directory under `layout`: type-layout vectors live in `types`.
    #[must_use]
    pub const fn dir_in(self, layout: Layout) -> &'static str {
        match (self, layout) {
            (Self::Vector, Layout::Type) => "types",
            _ => self.dir(),
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir())
    }
}

/// One named piece of generated text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Unit {
    /// Unit name, e.g. `vector_float4` or `matrix_double3x2`.
    pub name: String,
    /// Generator that produced it.
    pub kind: UnitKind,
    /// Generated source.
    pub text: String,
}

/// Formatting options shared by every unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnitOptions {
    /// Vector naming and width set.
    pub layout: Layout,
    /// Spaces per indentation level.
    pub indent: usize,
    /// Comment line written at the top of each unit.
    pub header: Option<String>,
}

impl Default for UnitOptions {
    fn default() -> Self {
        Self {
            layout: Layout::default(),
            indent: DEFAULT_INDENT,
            header: None,
        }
    }
}

impl UnitOptions {
    fn emitter(&self) -> TextEmitter {
        let mut e = TextEmitter::with_indent(self.indent);
        if let Some(header) = &self.header {
            e.line(&format!("// {header}"));
            e.pad();
        }
        e.line(PRELUDE);
        e
    }
}

/// Name of the unit for a vector spec under `layout`.
#[must_use]
pub fn vector_unit_name(spec: &VectorSpec<'_>, layout: Layout) -> String {
    format!("{}_{}", layout.prefix(), spec.type_name())
}

/// Name of the unit for a matrix spec.
#[must_use]
pub fn matrix_unit_name(spec: &MatrixSpec<'_>) -> String {
    format!("matrix_{}", spec.type_name())
}

/// Generate the unit for one vector type.
#[must_use]
pub fn vector_unit(catalog: &Catalog, spec: VectorSpec<'_>, options: &UnitOptions) -> Unit {
    let name = vector_unit_name(&spec, options.layout);
    let mut e = options.emitter();
    VectorGenerator::new(catalog, spec).generate(&mut e);
    let text = e.finish();

    debug!(unit = %name, bytes = text.len(), "generated vector unit");
    Unit {
        name,
        kind: UnitKind::Vector,
        text,
    }
}

/// Generate the unit for one matrix shape.
#[must_use]
pub fn matrix_unit(spec: MatrixSpec<'_>, inverse: &dyn InverseRoutine, options: &UnitOptions) -> Unit {
    let name = matrix_unit_name(&spec);
    let mut e = options.emitter();
    MatrixGenerator::new(spec, inverse).generate(&mut e);
    let text = e.finish();

    debug!(unit = %name, bytes = text.len(), "generated matrix unit");
    Unit {
        name,
        kind: UnitKind::Matrix,
        text,
    }
}

/// Emit `#[inline(always)]` and a one-expression function.
pub(crate) fn inline_fn<E: Emit>(e: &mut E, signature: &str, body: &str) {
    e.padded("#[inline(always)]");
    e.block(signature, |e| e.line(body));
}

/// Emit `#[inline(always)]` and a multi-line function; empty strings are
/// blank lines.
pub(crate) fn inline_fn_lines<E: Emit>(e: &mut E, signature: &str, body: &[String]) {
    e.padded("#[inline(always)]");
    e.block(signature, |e| {
        for line in body {
            e.line(line);
        }
    });
}
