//! `catc version`: controller release and derived capability flags.

use catc_core::{Engine, EngineSettings};

use crate::cli::{GlobalOpts, VersionArgs};
use crate::error::CliError;
use crate::{config, output};

pub async fn handle(args: &VersionArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let overrides = config::overrides(global, None, false);
    let resolved = config::resolve_run(args.document.as_deref(), global, &overrides)?;

    let engine = Engine::connect(&resolved.controller, EngineSettings::default()).await?;
    let caps = engine.capabilities();

    let rendered = output::render(global.output, &caps, output::capabilities_detail)?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}
