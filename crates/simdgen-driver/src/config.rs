//! Generator configuration.
//!
//! Configuration is plain TOML. Every field is optional:
//!
//! ```toml
//! layout = "type"
//! indent = 4
//! parallel = true
//! emit_index = true
//! inverse_prefix = "__invert_"
//! header = "Generated by simdgen. Do not edit."
//!
//! [[catalog]]
//! name = "int"
//! size = 4
//! kind = "signed_integer"
//! max_width = 16
//! boolean = "int"
//! ```
//!
//! A `catalog` table replaces the built-in catalog entirely.

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use simdgen_catalog::{Catalog, CatalogResult, Layout, TypeDescriptor};
use simdgen_codegen::{NativeInverse, UnitOptions};

use crate::{GenerateError, GenerateResult};

/// Settings for one generation run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Vector naming and width set.
    pub layout: Layout,
    /// Spaces per indentation level.
    pub indent: usize,
    /// Generate and write units on the rayon pool.
    pub parallel: bool,
    /// Write a `mod.rs` declaring every unit in each output directory.
    pub emit_index: bool,
    /// Prefix of the native matrix inversion routines.
    pub inverse_prefix: String,
    /// Comment line written at the top of every unit.
    pub header: Option<String>,
    /// Custom catalog entries replacing the built-in table.
    pub catalog: Option<Vec<TypeDescriptor>>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            layout: Layout::Vector,
            indent: UnitOptions::default().indent,
            parallel: true,
            emit_index: true,
            inverse_prefix: NativeInverse::DEFAULT_PREFIX.to_string(),
            header: None,
            catalog: None,
        }
    }
}

impl GeneratorConfig {
    /// Parse a configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not valid TOML or has unknown keys.
    pub fn from_toml_str(content: &str) -> GenerateResult<Self> {
        toml::from_str(content).map_err(GenerateError::Config)
    }

    /// Load a configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Utf8Path>) -> GenerateResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| GenerateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Set the layout.
    #[must_use]
    pub fn with_layout(mut self, layout: Layout) -> Self {
        self.layout = layout;
        self
    }

    /// Set sequential or parallel generation.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Replace the catalog.
    #[must_use]
    pub fn with_catalog(mut self, entries: Vec<TypeDescriptor>) -> Self {
        self.catalog = Some(entries);
        self
    }

    /// Build and validate the configured catalog.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn catalog(&self) -> CatalogResult<Catalog> {
        match &self.catalog {
            Some(entries) => Catalog::new(entries.clone()),
            None => Catalog::builtin(),
        }
    }

    /// The configured inversion routine namer.
    #[must_use]
    pub fn inverse(&self) -> NativeInverse {
        NativeInverse::new(self.inverse_prefix.clone())
    }

    /// Formatting options for every unit.
    #[must_use]
    pub fn unit_options(&self) -> UnitOptions {
        UnitOptions {
            layout: self.layout,
            indent: self.indent,
            header: self.header.clone(),
        }
    }
}
