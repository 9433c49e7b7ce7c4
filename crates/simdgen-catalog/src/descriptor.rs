//! Scalar type descriptors.
//!
//! A [`TypeDescriptor`] is one row of the catalog: the scalar's name as used
//! in generated type names (`char`, `uint`, `double`, ...), its size, its
//! numeric kind, and the companion types it needs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::CatalogError;

/// The numeric kind of a scalar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericKind {
    /// Two's complement signed integer.
    SignedInteger,
    /// Unsigned integer.
    UnsignedInteger,
    /// IEEE 754 floating point.
    Float,
}

impl NumericKind {
    /// Get the name of this kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SignedInteger => "signed integer",
            Self::UnsignedInteger => "unsigned integer",
            Self::Float => "float",
        }
    }

    /// Check if this is an integer kind.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::SignedInteger | Self::UnsignedInteger)
    }
}

impl fmt::Display for NumericKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Size of a scalar in bytes.
///
/// Serialized as a plain integer; only 1, 2, 4 and 8 are accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ScalarSize {
    /// 8 bits.
    One,
    /// 16 bits.
    Two,
    /// 32 bits.
    Four,
    /// 64 bits.
    Eight,
}

impl ScalarSize {
    /// Returns the size in bytes.
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Four => 4,
            Self::Eight => 8,
        }
    }

    /// Returns the size in bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.bytes() as u32 * 8
    }
}

impl TryFrom<u8> for ScalarSize {
    type Error = CatalogError;

    fn try_from(bytes: u8) -> Result<Self, Self::Error> {
        match bytes {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            4 => Ok(Self::Four),
            8 => Ok(Self::Eight),
            other => Err(CatalogError::InvalidSize(other)),
        }
    }
}

impl From<ScalarSize> for u8 {
    fn from(size: ScalarSize) -> u8 {
        size.bytes() as u8
    }
}

/// One entry of the type catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Scalar name used to build type names (`char` gives `char4`).
    pub name: String,
    /// Scalar size.
    pub size: ScalarSize,
    /// Numeric kind.
    pub kind: NumericKind,
    /// Largest supported lane count.
    pub max_width: u8,
    /// Name of the catalog entry holding per-lane comparison results.
    pub boolean: String,
    /// Largest square matrix dimension, if matrices are generated.
    #[serde(default)]
    pub max_matrix_size: Option<u8>,
}

impl TypeDescriptor {
    /// Create a descriptor without matrix support.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        size: ScalarSize,
        kind: NumericKind,
        max_width: u8,
        boolean: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            size,
            kind,
            max_width,
            boolean: boolean.into(),
            max_matrix_size: None,
        }
    }

    /// Enable matrix generation up to `size`×`size`.
    #[must_use]
    pub fn with_matrix_size(mut self, size: u8) -> Self {
        self.max_matrix_size = Some(size);
        self
    }

    /// Returns the size in bytes.
    #[must_use]
    pub const fn size_bytes(&self) -> usize {
        self.size.bytes()
    }

    /// Returns the size in bits.
    #[must_use]
    pub const fn bits(&self) -> u32 {
        self.size.bits()
    }

    /// Check if this is a floating point scalar.
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self.kind, NumericKind::Float)
    }

    /// Check if this is a signed integer scalar.
    #[must_use]
    pub const fn is_signed(&self) -> bool {
        matches!(self.kind, NumericKind::SignedInteger)
    }

    /// Check if this is an unsigned integer scalar.
    #[must_use]
    pub const fn is_unsigned(&self) -> bool {
        matches!(self.kind, NumericKind::UnsignedInteger)
    }

    /// Check if this is an integer scalar of either signedness.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        self.kind.is_integer()
    }

    /// The target-language primitive for this scalar.
    ///
    /// Floats narrower than four bytes are rejected by catalog validation and
    /// map to `f32` here.
    #[must_use]
    pub const fn primitive(&self) -> &'static str {
        match (self.kind, self.size) {
            (NumericKind::SignedInteger, ScalarSize::One) => "i8",
            (NumericKind::SignedInteger, ScalarSize::Two) => "i16",
            (NumericKind::SignedInteger, ScalarSize::Four) => "i32",
            (NumericKind::SignedInteger, ScalarSize::Eight) => "i64",
            (NumericKind::UnsignedInteger, ScalarSize::One) => "u8",
            (NumericKind::UnsignedInteger, ScalarSize::Two) => "u16",
            (NumericKind::UnsignedInteger, ScalarSize::Four) => "u32",
            (NumericKind::UnsignedInteger, ScalarSize::Eight) => "u64",
            (NumericKind::Float, ScalarSize::Eight) => "f64",
            (NumericKind::Float, _) => "f32",
        }
    }

    /// Literal for zero in this scalar type.
    #[must_use]
    pub const fn zero_literal(&self) -> &'static str {
        if self.is_float() {
            "0.0"
        } else {
            "0"
        }
    }

    /// Check if vectors of `width` lanes are generated for this scalar.
    #[must_use]
    pub const fn supports_width(&self, width: u8) -> bool {
        width >= 1 && width <= self.max_width
    }

    /// Name of the vector type with `width` lanes, e.g. `uint4`.
    #[must_use]
    pub fn vector_name(&self, width: u8) -> String {
        format!("{}{}", self.name, width)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.primitive())
    }
}
