//! `catc validate`: run the validator only; no controller is contacted.

use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use catc_core::ConfigElement;

use crate::cli::{GlobalOpts, ValidateArgs};
use crate::error::CliError;
use crate::{config, output};

#[derive(Debug, Serialize, Tabled)]
struct ElementRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Items")]
    items: usize,
}

pub fn handle(args: &ValidateArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let document = catc_config::load_document(&args.document)?;
    let overrides = config::overrides(global, args.state.map(Into::into), false);
    let settings = catc_config::engine_settings(&document, &overrides)?;

    let elements = catc_core::validate(&document.config, settings.state)?;
    let rows = element_rows(&elements);
    let rendered = output::render(global.output, &rows, |rows| {
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        format!("{table}\n{} element(s) valid for state '{}'", rows.len(), settings.state)
    })?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}

fn element_rows(elements: &[ConfigElement]) -> Vec<ElementRow> {
    elements
        .iter()
        .enumerate()
        .map(|(index, element)| ElementRow {
            index,
            kind: element.kind().to_string(),
            items: element.len(),
        })
        .collect()
}
