//! Scalar type catalog for simdgen.
//!
//! The catalog is the declarative table that drives generation: every vector
//! and matrix unit is derived from one of its entries and a width or a pair
//! of dimensions. Nothing else carries type information.
//!
//! # Built-in Catalog
//!
//! | Name     | Size | Kind     | Boolean | Matrices |
//! |----------|------|----------|---------|----------|
//! | `char`   | 1    | signed   | `char`  | -        |
//! | `uchar`  | 1    | unsigned | `char`  | -        |
//! | `short`  | 2    | signed   | `short` | -        |
//! | `ushort` | 2    | unsigned | `short` | -        |
//! | `int`    | 4    | signed   | `int`   | -        |
//! | `uint`   | 4    | unsigned | `int`   | -        |
//! | `float`  | 4    | float    | `int`   | up to 4  |
//! | `long`   | 8    | signed   | `long`  | -        |
//! | `ulong`  | 8    | unsigned | `long`  | -        |
//! | `double` | 8    | float    | `long`  | up to 4  |
//!
//! # Validation
//!
//! [`Catalog::new`] checks the table once. A catalog that fails validation
//! is a configuration defect and is reported before any generation starts.

#![warn(missing_docs)]

mod descriptor;
mod spec;

pub use descriptor::{NumericKind, ScalarSize, TypeDescriptor};
pub use spec::{Layout, MatrixSpec, VectorSpec, WidthSet, TYPE_WIDTHS, VECTOR_WIDTHS};

use rustc_hash::FxHashMap;
use thiserror::Error;

/// Widest vector the generators know how to lay out.
pub const MAX_WIDTH: u8 = 16;

/// Largest matrix dimension supported.
pub const MAX_MATRIX_SIZE: u8 = 4;

/// Errors found while validating a catalog.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// Two entries share a name.
    #[error("duplicate catalog entry `{0}`")]
    DuplicateName(String),

    /// A boolean companion names no catalog entry.
    #[error("boolean type `{boolean}` of `{name}` is not in the catalog")]
    UnresolvedBoolean {
        /// Entry being checked.
        name: String,
        /// The missing boolean name.
        boolean: String,
    },

    /// A boolean companion is not a same-size signed integer.
    #[error("boolean type `{boolean}` of `{name}` must be a signed integer of the same size")]
    InvalidBoolean {
        /// Entry being checked.
        name: String,
        /// The offending boolean name.
        boolean: String,
    },

    /// Scalar size not in {1, 2, 4, 8}.
    #[error("invalid scalar size {0}, expected 1, 2, 4 or 8")]
    InvalidSize(u8),

    /// Float entry with a size other than 4 or 8.
    #[error("float entry `{name}` must be 4 or 8 bytes, found {size}")]
    InvalidFloatSize {
        /// Entry being checked.
        name: String,
        /// Its size in bytes.
        size: usize,
    },

    /// `max_width` outside `1..=16`.
    #[error("max width {width} of `{name}` is outside 1..={MAX_WIDTH}")]
    InvalidWidth {
        /// Entry being checked.
        name: String,
        /// The declared width.
        width: u8,
    },

    /// A boolean companion supports fewer lanes than its entry.
    #[error("boolean type `{boolean}` of `{name}` has max width {boolean_width}, below {width}")]
    CompanionWidth {
        /// Entry being checked.
        name: String,
        /// The boolean companion.
        boolean: String,
        /// Max width of the entry.
        width: u8,
        /// Max width of the companion.
        boolean_width: u8,
    },

    /// Matrix size on a non-float entry, outside `2..=4`, or above the
    /// entry's max width.
    #[error("matrix size {size} of `{name}` requires a float entry, 2..={MAX_MATRIX_SIZE} and column vectors of that width")]
    InvalidMatrixSize {
        /// Entry being checked.
        name: String,
        /// The declared matrix size.
        size: u8,
    },
}

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// A validated, immutable table of scalar types.
#[derive(Clone, Debug)]
pub struct Catalog {
    entries: Vec<TypeDescriptor>,
    by_name: FxHashMap<String, usize>,
}

impl Catalog {
    /// Validate `entries` and build a catalog.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure in entry order.
    pub fn new(entries: Vec<TypeDescriptor>) -> CatalogResult<Self> {
        let mut by_name = FxHashMap::default();

        for (index, entry) in entries.iter().enumerate() {
            if by_name.insert(entry.name.clone(), index).is_some() {
                return Err(CatalogError::DuplicateName(entry.name.clone()));
            }

            if entry.max_width == 0 || entry.max_width > MAX_WIDTH {
                return Err(CatalogError::InvalidWidth {
                    name: entry.name.clone(),
                    width: entry.max_width,
                });
            }

            if entry.is_float() && entry.size < ScalarSize::Four {
                return Err(CatalogError::InvalidFloatSize {
                    name: entry.name.clone(),
                    size: entry.size_bytes(),
                });
            }

            if let Some(size) = entry.max_matrix_size {
                if !entry.is_float()
                    || !(2..=MAX_MATRIX_SIZE).contains(&size)
                    || size > entry.max_width
                {
                    return Err(CatalogError::InvalidMatrixSize {
                        name: entry.name.clone(),
                        size,
                    });
                }
            }
        }

        // Companions are checked once every name is known.
        for entry in &entries {
            let boolean = by_name
                .get(&entry.boolean)
                .map(|&i| &entries[i])
                .ok_or_else(|| CatalogError::UnresolvedBoolean {
                    name: entry.name.clone(),
                    boolean: entry.boolean.clone(),
                })?;

            if !boolean.is_signed() || boolean.size != entry.size {
                return Err(CatalogError::InvalidBoolean {
                    name: entry.name.clone(),
                    boolean: entry.boolean.clone(),
                });
            }

            // Comparisons name `{boolean}{width}` at every width of the entry.
            if boolean.max_width < entry.max_width {
                return Err(CatalogError::CompanionWidth {
                    name: entry.name.clone(),
                    boolean: entry.boolean.clone(),
                    width: entry.max_width,
                    boolean_width: boolean.max_width,
                });
            }
        }

        Ok(Self { entries, by_name })
    }

    /// The built-in catalog.
    ///
    /// # Errors
    ///
    /// Never fails for the shipped table; the signature matches [`Catalog::new`].
    pub fn builtin() -> CatalogResult<Self> {
        Self::new(builtin_entries())
    }

    /// Look up an entry by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    /// Boolean companion of `desc`.
    #[must_use]
    pub fn boolean_of(&self, desc: &TypeDescriptor) -> Option<&TypeDescriptor> {
        self.get(&desc.boolean)
    }

    /// Entries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.entries.iter()
    }

    /// Entries as a slice.
    #[must_use]
    pub fn entries(&self) -> &[TypeDescriptor] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the catalog has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose boolean companion is `desc`.
    pub fn with_boolean<'a>(
        &'a self,
        desc: &'a TypeDescriptor,
    ) -> impl Iterator<Item = &'a TypeDescriptor> + 'a {
        self.entries.iter().filter(move |e| e.boolean == desc.name)
    }

    /// Every (entry, width) pair from `widths` the entry supports.
    #[must_use]
    pub fn vector_specs(&self, widths: WidthSet) -> Vec<VectorSpec<'_>> {
        let mut specs = Vec::new();
        for scalar in &self.entries {
            let Some(boolean) = self.boolean_of(scalar) else {
                continue;
            };
            for width in widths.supported_by(scalar) {
                specs.push(VectorSpec {
                    scalar,
                    boolean,
                    width,
                });
            }
        }
        specs
    }

    /// Every (entry, rows, cols) triple for entries declaring a matrix size.
    #[must_use]
    pub fn matrix_specs(&self) -> Vec<MatrixSpec<'_>> {
        let mut specs = Vec::new();
        for scalar in &self.entries {
            let Some(max) = scalar.max_matrix_size else {
                continue;
            };
            for rows in 2..=max {
                for cols in 2..=max {
                    specs.push(MatrixSpec { scalar, rows, cols });
                }
            }
        }
        specs
    }
}

/// Entries of the built-in catalog, in declaration order.
#[must_use]
pub fn builtin_entries() -> Vec<TypeDescriptor> {
    use NumericKind::{Float, SignedInteger, UnsignedInteger};
    use ScalarSize::{Eight, Four, One, Two};

    vec![
        TypeDescriptor::new("char", One, SignedInteger, 16, "char"),
        TypeDescriptor::new("uchar", One, UnsignedInteger, 16, "char"),
        TypeDescriptor::new("short", Two, SignedInteger, 16, "short"),
        TypeDescriptor::new("ushort", Two, UnsignedInteger, 16, "short"),
        TypeDescriptor::new("int", Four, SignedInteger, 16, "int"),
        TypeDescriptor::new("uint", Four, UnsignedInteger, 16, "int"),
        TypeDescriptor::new("float", Four, Float, 16, "int").with_matrix_size(4),
        TypeDescriptor::new("long", Eight, SignedInteger, 16, "long"),
        TypeDescriptor::new("ulong", Eight, UnsignedInteger, 16, "long"),
        TypeDescriptor::new("double", Eight, Float, 16, "long").with_matrix_size(4),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builtin() -> Catalog {
        Catalog::builtin().expect("builtin catalog validates")
    }

    #[test]
    fn test_builtin_is_valid() {
        let catalog = builtin();
        assert_eq!(catalog.len(), 10);
        for entry in catalog.iter() {
            let boolean = catalog.boolean_of(entry).expect("boolean resolves");
            assert!(boolean.is_signed());
            assert_eq!(boolean.size, entry.size);
        }
    }

    #[test]
    fn test_lookup_by_name() {
        let catalog = builtin();
        let float = catalog.get("float").unwrap();
        assert_eq!(float.primitive(), "f32");
        assert_eq!(float.boolean, "int");
        assert!(catalog.get("half").is_none());
    }

    #[test]
    fn test_vector_spec_count() {
        let catalog = builtin();
        assert_eq!(catalog.vector_specs(WidthSet::vector()).len(), 50);
        assert_eq!(catalog.vector_specs(WidthSet::with_scalar()).len(), 60);
    }

    #[test]
    fn test_matrix_specs_only_for_floats() {
        let catalog = builtin();
        let specs = catalog.matrix_specs();
        assert_eq!(specs.len(), 18);
        assert!(specs.iter().all(|s| s.scalar.is_float()));
        assert!(specs.iter().any(|s| s.type_name() == "double4x2"));
    }

    #[test]
    fn test_entries_sharing_boolean() {
        let catalog = builtin();
        let int = catalog.get("int").unwrap();
        let names: Vec<_> = catalog.with_boolean(int).map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["int", "uint", "float"]);
    }

    #[test]
    fn test_unresolved_boolean_is_rejected() {
        let mut entries = builtin_entries();
        entries[1].boolean = "bool".to_string();
        let err = Catalog::new(entries).unwrap_err();
        assert_eq!(
            err,
            CatalogError::UnresolvedBoolean {
                name: "uchar".to_string(),
                boolean: "bool".to_string(),
            }
        );
    }

    #[test]
    fn test_boolean_must_be_same_size_signed() {
        let mut entries = builtin_entries();
        entries[4].boolean = "uint".to_string();
        assert!(matches!(
            Catalog::new(entries),
            Err(CatalogError::InvalidBoolean { .. })
        ));

        let mut entries = builtin_entries();
        entries[6].boolean = "long".to_string();
        assert!(matches!(
            Catalog::new(entries),
            Err(CatalogError::InvalidBoolean { .. })
        ));
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let mut entries = builtin_entries();
        entries.push(entries[0].clone());
        assert_eq!(
            Catalog::new(entries).unwrap_err(),
            CatalogError::DuplicateName("char".to_string())
        );
    }

    #[test]
    fn test_matrix_size_requires_float() {
        let mut entries = builtin_entries();
        entries[4].max_matrix_size = Some(4);
        assert!(matches!(
            Catalog::new(entries),
            Err(CatalogError::InvalidMatrixSize { .. })
        ));

        let mut entries = builtin_entries();
        entries[6].max_matrix_size = Some(5);
        assert!(matches!(
            Catalog::new(entries),
            Err(CatalogError::InvalidMatrixSize { size: 5, .. })
        ));
    }

    #[test]
    fn test_matrix_size_needs_column_width() {
        let entries = vec![
            TypeDescriptor::new("int", ScalarSize::Four, NumericKind::SignedInteger, 16, "int"),
            TypeDescriptor::new("float", ScalarSize::Four, NumericKind::Float, 2, "int")
                .with_matrix_size(4),
        ];
        assert_eq!(
            Catalog::new(entries).unwrap_err(),
            CatalogError::InvalidMatrixSize {
                name: "float".to_string(),
                size: 4,
            }
        );

        let entries = vec![
            TypeDescriptor::new("int", ScalarSize::Four, NumericKind::SignedInteger, 16, "int"),
            TypeDescriptor::new("float", ScalarSize::Four, NumericKind::Float, 3, "int")
                .with_matrix_size(3),
        ];
        assert_eq!(Catalog::new(entries).unwrap().matrix_specs().len(), 4);
    }

    #[test]
    fn test_companion_must_cover_entry_widths() {
        let entries = vec![
            TypeDescriptor::new("int", ScalarSize::Four, NumericKind::SignedInteger, 4, "int"),
            TypeDescriptor::new("float", ScalarSize::Four, NumericKind::Float, 16, "int"),
        ];
        assert_eq!(
            Catalog::new(entries).unwrap_err(),
            CatalogError::CompanionWidth {
                name: "float".to_string(),
                boolean: "int".to_string(),
                width: 16,
                boolean_width: 4,
            }
        );

        // A wider companion is fine.
        let entries = vec![
            TypeDescriptor::new("int", ScalarSize::Four, NumericKind::SignedInteger, 16, "int"),
            TypeDescriptor::new("float", ScalarSize::Four, NumericKind::Float, 4, "int"),
        ];
        assert!(Catalog::new(entries).is_ok());
    }

    #[test]
    fn test_width_bounds() {
        let mut entries = builtin_entries();
        entries[0].max_width = 32;
        assert!(matches!(
            Catalog::new(entries),
            Err(CatalogError::InvalidWidth { width: 32, .. })
        ));
    }

    #[test]
    fn test_descriptor_from_toml() {
        let desc: TypeDescriptor = toml::from_str(
            r#"
            name = "half"
            size = 2
            kind = "float"
            max_width = 8
            boolean = "short"
            "#,
        )
        .unwrap();
        assert_eq!(desc.size, ScalarSize::Two);

        let mut entries = builtin_entries();
        entries.push(desc);
        assert!(matches!(
            Catalog::new(entries),
            Err(CatalogError::InvalidFloatSize { size: 2, .. })
        ));
    }
}
