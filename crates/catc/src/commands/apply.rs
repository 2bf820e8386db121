//! `catc apply`: reconcile the controller with a document.

use std::sync::Arc;

use tracing::{info, warn};

use catc_core::{Engine, ProgressFn, Report};

use crate::cli::{ApplyArgs, GlobalOpts};
use crate::error::CliError;
use crate::{config, output};

pub async fn handle(args: &ApplyArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let overrides = config::overrides(global, args.state.map(Into::into), args.verify);
    let resolved = config::resolve_run(Some(&args.document), global, &overrides)?;
    info!(
        url = %resolved.controller.url,
        state = %resolved.settings.state,
        "applying {}",
        args.document.display()
    );

    let mut engine = Engine::connect(&resolved.controller, resolved.settings).await?;

    let bar = super::spinner(global, "reconciling");
    if let Some(bar) = &bar {
        let bar = bar.clone();
        let progress: Arc<ProgressFn> = Arc::new(move |text: &str| bar.set_message(text.to_owned()));
        engine = engine.on_progress(progress);
    }

    let cancel = engine.cancellation_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted; stopping after the current request");
            cancel.cancel();
        }
    });

    let result = engine.apply(&resolved.config).await;
    interrupt.abort();
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    let report = result?;

    output::print_output(&output::render_report(&report, global)?, global.quiet);
    outcome(&report)
}

/// A report with failed items is a partial failure.
fn outcome(report: &Report) -> Result<(), CliError> {
    let failed: usize = report.response.iter().map(|k| k.failed.len()).sum();
    if failed == 0 {
        return Ok(());
    }
    let summary = report
        .response
        .iter()
        .flat_map(|k| k.failed.iter())
        .map(|f| format!("{}: {}", f.item, f.reason))
        .collect::<Vec<_>>()
        .join("\n");
    Err(CliError::PartialFailure { failed, summary })
}
