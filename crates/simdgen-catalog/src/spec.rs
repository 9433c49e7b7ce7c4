//! Generation specs: the (type, width) and (type, rows, cols) combinations.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypeDescriptor;

/// Lane counts generated in the vector layout.
pub const VECTOR_WIDTHS: &[u8] = &[2, 3, 4, 8, 16];

/// Lane counts generated in the type layout, which folds the scalar in as
/// width 1.
pub const TYPE_WIDTHS: &[u8] = &[1, 2, 3, 4, 8, 16];

/// Ordered set of vector lane counts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WidthSet(&'static [u8]);

impl WidthSet {
    /// Widths `{2, 3, 4, 8, 16}`.
    #[must_use]
    pub const fn vector() -> Self {
        Self(VECTOR_WIDTHS)
    }

    /// Widths `{1, 2, 3, 4, 8, 16}`.
    #[must_use]
    pub const fn with_scalar() -> Self {
        Self(TYPE_WIDTHS)
    }

    /// Iterate the widths in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }

    /// Widths from this set that `desc` supports.
    pub fn supported_by<'a>(&'a self, desc: &'a TypeDescriptor) -> impl Iterator<Item = u8> + 'a {
        self.iter().filter(move |&w| desc.supports_width(w))
    }

    /// Check if `width` is in the set.
    #[must_use]
    pub fn contains(&self, width: u8) -> bool {
        self.0.contains(&width)
    }
}

/// How vector units are named and which widths they cover.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// `vector_{name}{width}` units for widths 2 through 16.
    #[default]
    Vector,
    /// `type_{name}{width}` units, including the scalar as width 1.
    Type,
}

impl Layout {
    /// Unit name prefix for vector units.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Vector => "vector",
            Self::Type => "type",
        }
    }

    /// Widths generated under this layout.
    #[must_use]
    pub const fn widths(self) -> WidthSet {
        match self {
            Self::Vector => WidthSet::vector(),
            Self::Type => WidthSet::with_scalar(),
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// A vector type to generate: one scalar at one width.
#[derive(Clone, Copy, Debug)]
pub struct VectorSpec<'a> {
    /// Lane scalar.
    pub scalar: &'a TypeDescriptor,
    /// Boolean companion scalar.
    pub boolean: &'a TypeDescriptor,
    /// Lane count.
    pub width: u8,
}

impl<'a> VectorSpec<'a> {
    /// Type name, e.g. `float4`.
    #[must_use]
    pub fn type_name(&self) -> String {
        self.scalar.vector_name(self.width)
    }

    /// Boolean companion type name, e.g. `int4` for `float4`.
    #[must_use]
    pub fn boolean_name(&self) -> String {
        self.boolean.vector_name(self.width)
    }

    /// Name of the same scalar at another width.
    #[must_use]
    pub fn sibling(&self, width: u8) -> String {
        self.scalar.vector_name(width)
    }

    /// Check if this is the scalar folded in as a one-lane vector.
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        self.width == 1
    }
}

impl fmt::Display for VectorSpec<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.scalar.name, self.width)
    }
}

/// A matrix type to generate: `cols` column vectors of `rows` lanes each.
#[derive(Clone, Copy, Debug)]
pub struct MatrixSpec<'a> {
    /// Element scalar.
    pub scalar: &'a TypeDescriptor,
    /// Lanes per column.
    pub rows: u8,
    /// Number of columns.
    pub cols: u8,
}

impl<'a> MatrixSpec<'a> {
    /// Type name, `{name}{cols}x{rows}`.
    #[must_use]
    pub fn type_name(&self) -> String {
        format!("{}{}x{}", self.scalar.name, self.cols, self.rows)
    }

    /// Column vector type, `{name}{rows}`.
    #[must_use]
    pub fn column_type(&self) -> String {
        self.scalar.vector_name(self.rows)
    }

    /// Row vector type, `{name}{cols}`.
    #[must_use]
    pub fn row_type(&self) -> String {
        self.scalar.vector_name(self.cols)
    }

    /// Dimension-swapped matrix type, `{name}{rows}x{cols}`.
    #[must_use]
    pub fn transpose_name(&self) -> String {
        format!("{}{}x{}", self.scalar.name, self.rows, self.cols)
    }

    /// Check if rows and columns agree.
    #[must_use]
    pub const fn is_square(&self) -> bool {
        self.rows == self.cols
    }
}

impl fmt::Display for MatrixSpec<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}x{}", self.scalar.name, self.cols, self.rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{NumericKind, ScalarSize};

    #[test]
    fn test_layout_widths() {
        assert_eq!(Layout::Vector.widths().iter().collect::<Vec<_>>(), vec![2, 3, 4, 8, 16]);
        assert_eq!(
            Layout::Type.widths().iter().collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 8, 16]
        );
        assert_eq!(Layout::Vector.prefix(), "vector");
        assert_eq!(Layout::Type.to_string(), "type");
    }

    #[test]
    fn test_supported_widths_respect_max() {
        let short4 =
            TypeDescriptor::new("short", ScalarSize::Two, NumericKind::SignedInteger, 4, "short");
        let widths: Vec<_> = WidthSet::vector().supported_by(&short4).collect();
        assert_eq!(widths, vec![2, 3, 4]);
    }

    #[test]
    fn test_matrix_names() {
        let double = TypeDescriptor::new("double", ScalarSize::Eight, NumericKind::Float, 16, "long")
            .with_matrix_size(4);
        let spec = MatrixSpec {
            scalar: &double,
            rows: 2,
            cols: 4,
        };
        assert_eq!(spec.type_name(), "double4x2");
        assert_eq!(spec.column_type(), "double2");
        assert_eq!(spec.row_type(), "double4");
        assert_eq!(spec.transpose_name(), "double2x4");
        assert!(!spec.is_square());
    }
}
