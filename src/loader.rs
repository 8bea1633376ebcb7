//! Genome Loader - Clean API for loading genomes from disk
//!
//! # Usage
//!
//! ## Runtime loading
//!
//! ```ignore
//! use orgcpu::loader::{GenomeLoader, load_path};
//!
//! // Configure data directory once at startup
//! GenomeLoader::set_data_dir("/path/to/genomes");
//!
//! // Load ancestors/replicator.org
//! let genome = GenomeLoader::load("ancestors/replicator", false, &table)?;
//!
//! // Or any file, format picked by extension
//! let genome = load_path("saved/child.orgb", &table)?;
//! ```
//!
//! ## Testing only
//!
//! ```ignore
//! use orgcpu::loader::load_string;
//!
//! let genome = load_string("HAlloc HCopy HDivide", &table)?;
//! ```
//!
//! # File Locations
//!
//! Both formats use the same name, extension determined by `binary`:
//! - `GenomeLoader::resolve("foo/bar", false)` → `{data_dir}/foo/bar.org`
//! - `GenomeLoader::resolve("foo/bar", true)` → `{data_dir}/foo/bar.orgb`

use crate::vm::{self, format_genome, parse_genome, Genome, InstructionTable};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Extension of text genomes
pub const TEXT_EXTENSION: &str = "org";

/// Extension of binary genomes
pub const BINARY_EXTENSION: &str = "orgb";

/// On-disk genome format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenomeFormat {
    /// Whitespace-separated instruction names (`.org`)
    Text,
    /// Name table plus position indices (`.orgb`)
    Binary,
}

impl GenomeFormat {
    /// Format implied by a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            TEXT_EXTENSION => Some(Self::Text),
            BINARY_EXTENSION => Some(Self::Binary),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Text => TEXT_EXTENSION,
            Self::Binary => BINARY_EXTENSION,
        }
    }
}

// =============================================================================
// Genome Loader
// =============================================================================

/// Global data directory for named genomes
static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Genome loader configuration and utilities
pub struct GenomeLoader;

impl GenomeLoader {
    /// Set the data directory for named genome loading
    ///
    /// Call this once at application startup. Later calls are ignored.
    pub fn set_data_dir<P: AsRef<Path>>(path: P) {
        let _ = DATA_DIR.set(path.as_ref().to_path_buf());
    }

    /// Get the configured data directory, or default to "data/genomes"
    pub fn data_dir() -> PathBuf {
        DATA_DIR.get().cloned().unwrap_or_else(|| PathBuf::from("data/genomes"))
    }

    /// Path of a named genome inside the data directory
    ///
    /// # Arguments
    /// * `name` - Genome path without extension, e.g. "ancestors/replicator"
    /// * `binary` - Pick `.orgb` instead of `.org`
    pub fn resolve(name: &str, binary: bool) -> PathBuf {
        let format = if binary { GenomeFormat::Binary } else { GenomeFormat::Text };
        Self::data_dir().join(name).with_extension(format.extension())
    }

    /// Load a named genome from the data directory
    pub fn load(name: &str, binary: bool, table: &InstructionTable) -> Result<Genome> {
        load_path(Self::resolve(name, binary), table)
    }

    /// Save a genome; the format follows the path's extension
    pub fn save<P: AsRef<Path>>(genome: &Genome, table: &InstructionTable, path: P) -> Result<()> {
        let path = path.as_ref();
        match format_of(path)? {
            GenomeFormat::Text => {
                let mut text = format_genome(genome, table);
                text.push('\n');
                std::fs::write(path, text)
                    .with_context(|| format!("Failed to write {}", path.display()))
            }
            GenomeFormat::Binary => vm::save_to_file(genome, table, path)
                .with_context(|| format!("Failed to write {}", path.display())),
        }
    }
}

fn format_of(path: &Path) -> Result<GenomeFormat> {
    GenomeFormat::from_path(path).with_context(|| {
        format!(
            "Unknown genome extension: {} (expected .{} or .{})",
            path.display(),
            TEXT_EXTENSION,
            BINARY_EXTENSION
        )
    })
}

/// Load a genome from a path, picking the format by extension
pub fn load_path<P: AsRef<Path>>(path: P, table: &InstructionTable) -> Result<Genome> {
    let path = path.as_ref();
    match format_of(path)? {
        GenomeFormat::Text => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            parse_genome(&source, table)
                .with_context(|| format!("Failed to parse {}", path.display()))
        }
        GenomeFormat::Binary => vm::load_from_file(path, table)
            .with_context(|| format!("Failed to load {}", path.display())),
    }
}

/// Load a genome from a text string (testing only)
pub fn load_string(source: &str, table: &InstructionTable) -> Result<Genome> {
    parse_genome(source, table).context("Failed to parse genome")
}
