//! Payload rendering at the template boundary.

use std::collections::BTreeMap;

use serde_json::Value;

use monaco_core::coordinate::Coordinate;
use monaco_core::template;

use crate::error::{Error, Result};

/// Renders a configuration template against its resolved properties.
///
/// # Errors
///
/// Returns [`Error::Template`] carrying the coordinate when the template
/// references an undefined property or is malformed.
pub fn render_config(
    coordinate: &Coordinate,
    template: &str,
    properties: &BTreeMap<String, Value>,
) -> Result<String> {
    template::render(template, properties).map_err(|source| Error::Template {
        coordinate: coordinate.clone(),
        source,
    })
}
