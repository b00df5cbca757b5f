//! Deterministic identifier derivation.
//!
//! Two derivations are interoperability requirements and must stay stable
//! across runs and platforms:
//!
//! - the settings 2.0 external id, `base64url(sha256(project "$" schema "$"
//!   configId))`, which keys settings upserts
//! - the UUID generated for classic configurations of non-unique-name APIs,
//!   derived from the configuration coordinate

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::coordinate::Coordinate;
use crate::featureflags;

/// Computes the settings 2.0 external id for a coordinate-equivalent triple.
///
/// The derivation is `base64url(sha256(project "$" schema "$" configId))`
/// without padding, byte-for-byte identical across platforms.
#[must_use]
pub fn settings_external_id(project: &str, schema: &str, config_id: &str) -> String {
    let digest = Sha256::digest(format!("{project}${schema}${config_id}").as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Computes the external id of a settings configuration coordinate.
#[must_use]
pub fn settings_external_id_for(coordinate: &Coordinate) -> String {
    settings_external_id(
        &coordinate.project,
        &coordinate.config_type,
        &coordinate.config_id,
    )
}

/// Generates the deterministic UUID used as remote id for classic
/// configurations of non-unique-name APIs.
///
/// With `MONACO_FEAT_CONSISTENT_UUID_GENERATION` enabled (the default), path
/// separators in the coordinate are normalized to `/` before hashing so the
/// generated id does not depend on the OS the configuration was authored on.
#[must_use]
pub fn non_unique_name_id(coordinate: &Coordinate) -> String {
    let raw = coordinate.to_string();
    let input = if featureflags::CONSISTENT_UUID_GENERATION.enabled() {
        raw.replace('\\', "/")
    } else {
        raw
    };
    Uuid::new_v5(&Uuid::NAMESPACE_URL, input.as_bytes()).to_string()
}
