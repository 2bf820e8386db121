//! Output formatting: table, JSON, YAML.
//!
//! Reports render as a per-kind bucket table (`tabled`) with coloured status
//! words, or as the raw report structure through serde.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use catc_core::{Capabilities, KindReport, Report};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render any serialisable value in a structured format.
///
/// `table` falls back to the `detail` text.
pub fn render<T: Serialize>(
    format: OutputFormat,
    data: &T,
    detail: impl FnOnce(&T) -> String,
) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Table => detail(data),
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
    })
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Reports ──────────────────────────────────────────────────────────

#[derive(Tabled)]
struct BucketRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Items")]
    items: String,
}

pub fn render_report(report: &Report, global: &GlobalOpts) -> Result<String, CliError> {
    let color = should_color(global.color);
    render(global.output, report, |report| report_table(report, color))
}

fn report_table(report: &Report, color: bool) -> String {
    let rows: Vec<BucketRow> = report
        .response
        .iter()
        .flat_map(|kind| bucket_rows(kind, color))
        .collect();

    let mut out = if rows.is_empty() {
        String::new()
    } else {
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        format!("{table}\n")
    };

    let changed = if report.changed { "changed" } else { "unchanged" };
    out.push_str(&paint(changed, if report.changed { Tone::Warn } else { Tone::Ok }, color));
    if let Some(verified) = report.verified {
        let (word, tone) = if verified {
            ("verified", Tone::Ok)
        } else {
            ("verification failed", Tone::Bad)
        };
        out.push_str(", ");
        out.push_str(&paint(word, tone, color));
    }
    out.push('\n');
    out.push_str(&report.msg);
    out
}

fn bucket_rows(kind: &KindReport, color: bool) -> Vec<BucketRow> {
    let name = kind.kind.to_string();
    let buckets = [
        ("created", Tone::Warn, &kind.created),
        ("updated", Tone::Warn, &kind.updated),
        ("no update", Tone::Ok, &kind.no_update),
        ("deleted", Tone::Warn, &kind.deleted),
        ("absent", Tone::Dim, &kind.absent),
    ];

    let mut rows: Vec<BucketRow> = buckets
        .into_iter()
        .filter(|(_, _, items)| !items.is_empty())
        .map(|(status, tone, items)| BucketRow {
            kind: name.clone(),
            status: paint(status, tone, color),
            items: items.join("\n"),
        })
        .collect();

    rows.extend(kind.failed.iter().map(|failure| BucketRow {
        kind: name.clone(),
        status: paint(&format!("failed ({})", failure.kind), Tone::Bad, color),
        items: format!("{}: {}", failure.item, failure.reason),
    }));
    rows
}

#[derive(Clone, Copy)]
enum Tone {
    Ok,
    Warn,
    Bad,
    Dim,
}

fn paint(text: &str, tone: Tone, color: bool) -> String {
    if !color {
        return text.to_owned();
    }
    match tone {
        Tone::Ok => text.green().to_string(),
        Tone::Warn => text.yellow().to_string(),
        Tone::Bad => text.red().bold().to_string(),
        Tone::Dim => text.dimmed().to_string(),
    }
}

// ── Capabilities ─────────────────────────────────────────────────────

pub fn capabilities_detail(caps: &Capabilities) -> String {
    let flag = |on: bool| if on { "yes" } else { "no" };
    format!(
        "Catalyst Center {}\n\
         events & notifications: {}\n\
         SDA fabric:             {}\n\
         site design & images:   {}\n\
         flooding controls:      {}",
        caps.version,
        flag(caps.events),
        flag(caps.sda),
        flag(caps.site_design),
        flag(caps.flooding_controls),
    )
}
