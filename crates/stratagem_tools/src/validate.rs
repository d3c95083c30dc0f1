//! Content validation.

use std::path::Path;

use serde::Serialize;
use stratagem_core::catalog::{Catalog, LoadReport};
use stratagem_core::data::{from_ron_str, ContentData};

use crate::error::{read_file, Result, ToolError};

/// Summary of a content document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Loaded unit types.
    pub unit_types: usize,
    /// Loaded upgrades.
    pub upgrades: usize,
    /// Configuration errors, rendered.
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn new(catalog: &Catalog, report: &LoadReport) -> Self {
        Self {
            unit_types: catalog.unit_types().count(),
            upgrades: catalog.upgrades().count(),
            errors: report.errors.iter().map(ToString::to_string).collect(),
        }
    }

    /// True when the content loaded without errors.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Load a content file into a catalog, keeping the load report.
///
/// # Errors
///
/// Fails if the file cannot be read or is not a content document.
pub fn load_content(path: &Path) -> Result<(Catalog, LoadReport)> {
    let text = read_file(path)?;
    let data: ContentData = from_ron_str(&text).map_err(|source| ToolError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    let (catalog, report) = Catalog::load(data);
    tracing::debug!(
        path = %path.display(),
        unit_types = catalog.unit_types().count(),
        upgrades = catalog.upgrades().count(),
        errors = report.errors.len(),
        "Loaded content"
    );
    Ok((catalog, report))
}

/// Validate a content file.
///
/// Configuration errors do not fail the call; they are listed in the
/// report.
///
/// # Errors
///
/// Fails if the file cannot be read or parsed.
pub fn validate_content(path: &Path) -> Result<ValidationReport> {
    let (catalog, report) = load_content(path)?;
    for error in &report.errors {
        tracing::warn!("{error}");
    }
    Ok(ValidationReport::new(&catalog, &report))
}

/// Load a content file and insist that it is clean.
///
/// # Errors
///
/// Fails like [`load_content`], or with [`ToolError::InvalidContent`].
pub fn load_clean_content(path: &Path) -> Result<Catalog> {
    let (catalog, report) = load_content(path)?;
    if report.is_clean() {
        Ok(catalog)
    } else {
        Err(ToolError::InvalidContent {
            path: path.to_path_buf(),
            count: report.errors.len(),
        })
    }
}
