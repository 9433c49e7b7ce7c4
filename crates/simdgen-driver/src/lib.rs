//! Generation runs for simdgen.
//!
//! The driver validates the catalog once, enumerates every vector and matrix
//! spec, generates the units and optionally writes them to disk.
//!
//! # Pipeline
//!
//! ```text
//! GeneratorConfig
//!      │
//!      ▼
//! ┌─────────┐     ┌───────────┐     ┌─────────────┐
//! │ Catalog │ ──▶ │ Enumerate │ ──▶ │  Generate   │ ──▶ Vec<Unit>
//! └─────────┘     └───────────┘     └─────────────┘
//!                                          │
//!                                          ▼
//!                                   ┌─────────────┐
//!                                   │ Materialize │ ──▶ {output}/{vector|types|matrix}/*.rs
//!                                   └─────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use simdgen_driver::{Generator, GeneratorConfig};
//!
//! let generator = Generator::new(GeneratorConfig::default())?;
//! let units = generator.generate("target/simd")?;
//! generator.materialize("target/simd", &units)?;
//! # Ok::<(), simdgen_driver::GenerateError>(())
//! ```

#![warn(missing_docs)]

mod config;
mod sink;

pub use config::GeneratorConfig;
pub use sink::UnitSink;

pub use simdgen_catalog::{Catalog, CatalogError, Layout};
pub use simdgen_codegen::{Unit, UnitKind};

use camino::{Utf8Path, Utf8PathBuf};
use rayon::prelude::*;
use rustc_hash::FxHashSet;
use simdgen_catalog::{MatrixSpec, VectorSpec};
use simdgen_codegen::{matrix_unit, vector_unit, NativeInverse, UnitOptions};
use thiserror::Error;
use tracing::{debug, info, instrument};

/// File declaring every unit module of one output directory.
pub const INDEX_FILE: &str = "mod.rs";

/// Errors that can occur during a generation run.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The catalog failed validation.
    #[error("invalid catalog: {0}")]
    Catalog(#[from] simdgen_catalog::CatalogError),

    /// The configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// A file or directory could not be read or written.
    #[error("i/o error at {path}")]
    Io {
        /// The path involved.
        path: Utf8PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Two units share a name.
    #[error("duplicate unit: {0}")]
    DuplicateUnit(String),
}

/// Result type for generation runs.
pub type GenerateResult<T> = Result<T, GenerateError>;

/// One unit to produce.
#[derive(Clone, Copy, Debug)]
enum Job<'a> {
    Vector(VectorSpec<'a>),
    Matrix(MatrixSpec<'a>),
}

/// A validated generation run.
#[derive(Debug)]
pub struct Generator {
    config: GeneratorConfig,
    catalog: Catalog,
    inverse: NativeInverse,
    options: UnitOptions,
}

impl Generator {
    /// Validate the configured catalog and prepare a run.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::Catalog`] if the catalog is invalid.
    #[instrument(skip(config), fields(layout = ?config.layout))]
    pub fn new(config: GeneratorConfig) -> GenerateResult<Self> {
        let catalog = config.catalog()?;
        info!(entries = catalog.len(), "catalog validated");

        Ok(Self {
            inverse: config.inverse(),
            options: config.unit_options(),
            catalog,
            config,
        })
    }

    /// A run with the default configuration.
    ///
    /// # Errors
    ///
    /// Never fails for the built-in catalog.
    pub fn with_defaults() -> GenerateResult<Self> {
        Self::new(GeneratorConfig::default())
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// The validated catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn jobs(&self) -> Vec<Job<'_>> {
        let vectors = self
            .catalog
            .vector_specs(self.config.layout.widths())
            .into_iter()
            .map(Job::Vector);
        let matrices = self.catalog.matrix_specs().into_iter().map(Job::Matrix);
        vectors.chain(matrices).collect()
    }

    fn run_job(&self, job: Job<'_>) -> Unit {
        match job {
            Job::Vector(spec) => vector_unit(&self.catalog, spec, &self.options),
            Job::Matrix(spec) => matrix_unit(spec, &self.inverse, &self.options),
        }
    }

    /// Generate every unit in catalog order, vectors first.
    ///
    /// # Errors
    ///
    /// Returns [`GenerateError::DuplicateUnit`] if two specs map to one name.
    #[instrument(skip(self), fields(parallel = self.config.parallel))]
    pub fn units(&self) -> GenerateResult<Vec<Unit>> {
        let jobs = self.jobs();
        debug!(jobs = jobs.len(), "enumerated specs");

        let units: Vec<Unit> = if self.config.parallel {
            jobs.par_iter().map(|&job| self.run_job(job)).collect()
        } else {
            jobs.iter().map(|&job| self.run_job(job)).collect()
        };

        let mut seen = FxHashSet::default();
        for unit in &units {
            if !seen.insert(unit.name.as_str()) {
                return Err(GenerateError::DuplicateUnit(unit.name.clone()));
            }
        }

        info!(units = units.len(), "generation complete");
        Ok(units)
    }

    /// Ensure `output` exists, then generate every unit.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or generation fails.
    #[instrument(skip(self, output), fields(output = %output.as_ref()))]
    pub fn generate(&self, output: impl AsRef<Utf8Path>) -> GenerateResult<Vec<Unit>> {
        create_dir(output.as_ref())?;
        self.units()
    }

    /// Write `units` under `output` and return the written paths.
    ///
    /// Units go to `{output}/{vector|types|matrix}/{name}.rs`, with `types`
    /// holding vectors of the type layout. With `emit_index`
    /// set, each directory also gets a [`INDEX_FILE`] declaring its units.
    ///
    /// # Errors
    ///
    /// Returns the first write failure, or [`GenerateError::DuplicateUnit`]
    /// if `units` repeats a name.
    #[instrument(skip(self, output, units), fields(output = %output.as_ref(), units = units.len()))]
    pub fn materialize(
        &self,
        output: impl AsRef<Utf8Path>,
        units: &[Unit],
    ) -> GenerateResult<Vec<Utf8PathBuf>> {
        let sink = UnitSink::new(output.as_ref(), self.config.layout);
        for kind in [UnitKind::Vector, UnitKind::Matrix] {
            create_dir(&sink.dir_for(kind))?;
        }

        let mut paths: Vec<Utf8PathBuf> = if self.config.parallel {
            units
                .par_iter()
                .map(|unit| sink.write(unit))
                .collect::<GenerateResult<_>>()?
        } else {
            units
                .iter()
                .map(|unit| sink.write(unit))
                .collect::<GenerateResult<_>>()?
        };

        if self.config.emit_index {
            for kind in [UnitKind::Vector, UnitKind::Matrix] {
                paths.push(write_index(&sink.dir_for(kind), kind, units)?);
            }
        }

        info!(files = paths.len(), "materialization complete");
        Ok(paths)
    }

    /// Generate and materialize in one step.
    ///
    /// # Errors
    ///
    /// Returns the first failure of either step.
    pub fn run(&self, output: impl AsRef<Utf8Path>) -> GenerateResult<Vec<Unit>> {
        let output = output.as_ref();
        let units = self.generate(output)?;
        self.materialize(output, &units)?;
        Ok(units)
    }
}

/// Generate every unit with the default configuration.
///
/// # Errors
///
/// Returns an error if `output` cannot be created.
pub fn generate(output: impl AsRef<Utf8Path>) -> GenerateResult<Vec<Unit>> {
    Generator::with_defaults()?.generate(output)
}

fn create_dir(path: &Utf8Path) -> GenerateResult<()> {
    std::fs::create_dir_all(path).map_err(|source| GenerateError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Render the module index for the units of one kind.
fn index_text(kind: UnitKind, units: &[Unit]) -> String {
    let mut names: Vec<&str> = units
        .iter()
        .filter(|unit| unit.kind == kind)
        .map(|unit| unit.name.as_str())
        .collect();
    names.sort_unstable();

    let mut text = String::new();
    for name in names {
        text.push_str("pub mod ");
        text.push_str(name);
        text.push_str(";\n");
    }
    text
}

fn write_index(dir: &Utf8Path, kind: UnitKind, units: &[Unit]) -> GenerateResult<Utf8PathBuf> {
    let path = dir.join(INDEX_FILE);
    std::fs::write(&path, index_text(kind, units)).map_err(|source| GenerateError::Io {
        path: path.clone(),
        source,
    })?;
    debug!(path = %path, "wrote index");
    Ok(path)
}
