//! CLI-aware wrappers over `catc-config`.

use std::path::Path;

use secrecy::SecretString;

use catc_config::{Document, Overrides, ProfileFile, Resolved};
use catc_core::State;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Translate global flags (plus per-command run flags) into overrides.
pub fn overrides(global: &GlobalOpts, state: Option<State>, verify: bool) -> Overrides {
    Overrides {
        profile: global.profile.clone(),
        host: global.host.clone(),
        username: global.username.clone(),
        password: global.password.clone().map(SecretString::from),
        insecure: global.insecure,
        version: global.controller_version.clone(),
        state,
        config_verify: verify.then_some(true),
        timeout: global.timeout,
    }
}

pub fn load_profiles(global: &GlobalOpts) -> Result<ProfileFile, CliError> {
    let path = global
        .profiles_file
        .clone()
        .unwrap_or_else(catc_config::config_path);
    tracing::debug!(path = %path.display(), "loading profiles");
    Ok(catc_config::load_profiles(&path)?)
}

/// Load a document (or start from an empty one) and resolve everything a run needs.
pub fn resolve_run(
    document: Option<&Path>,
    global: &GlobalOpts,
    overrides: &Overrides,
) -> Result<Resolved, CliError> {
    let document = match document {
        Some(path) => catc_config::load_document(path)?,
        None => Document::default(),
    };
    let profiles = load_profiles(global)?;
    Ok(catc_config::resolve(document, &profiles, overrides)?)
}
