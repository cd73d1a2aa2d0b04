use std::{io::Write, sync::Arc};

use anyhow::Context;
use colored_json::{ColorMode, Output};
use doit_models::FloatingIps;

use crate::state::State;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub trait Displayer {
    fn display(&self, item: &FloatingIps) -> anyhow::Result<()>;
}

pub struct StdoutDisplayer {
    format: OutputFormat,
    header: bool,
}

impl Displayer for StdoutDisplayer {
    fn display(&self, item: &FloatingIps) -> anyhow::Result<()> {
        let output = match self.format {
            OutputFormat::Text => render_text(item, self.header),
            OutputFormat::Json => render_json(item, ColorMode::Auto(Output::StdOut))? + "\n",
        };

        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(output.as_bytes())
            .context("failed to write to stdout")?;
        stdout.flush()?;

        Ok(())
    }
}

const HEADERS: [&str; 4] = ["IP", "Region", "Droplet ID", "Droplet Name"];
const COLUMN_PADDING: usize = 4;

/// Aligned columns, one row per floating IP. Unassigned IPs leave the droplet
/// columns blank.
pub fn render_text(item: &FloatingIps, header: bool) -> String {
    let mut rows: Vec<[String; 4]> = Vec::with_capacity(item.len() + 1);
    if header {
        rows.push(HEADERS.map(String::from));
    }

    for ip in item.iter() {
        let (droplet_id, droplet_name) = match &ip.droplet {
            Some(droplet) => (droplet.id.to_string(), droplet.name.clone()),
            None => (String::new(), String::new()),
        };

        rows.push([
            ip.ip.clone(),
            ip.region_slug().to_string(),
            droplet_id,
            droplet_name,
        ]);
    }

    let mut widths = [0; 4];
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut output = String::new();
    for row in rows {
        let mut line = String::new();
        for (cell, width) in row.iter().zip(widths) {
            line.push_str(&format!("{cell:<width$}", width = width + COLUMN_PADDING));
        }
        output.push_str(line.trim_end());
        output.push('\n');
    }

    output
}

/// Pretty printed array of records, colorized according to `mode`.
pub fn render_json(item: &FloatingIps, mode: ColorMode) -> anyhow::Result<String> {
    let value = serde_json::to_value(item).context("serialize floating ips")?;

    colored_json::to_colored_json(&value, mode).context("render json")
}

pub trait DisplayerState {
    fn displayer(&self) -> Arc<dyn Displayer + Send + Sync + 'static>;
}

impl DisplayerState for State {
    fn displayer(&self) -> Arc<dyn Displayer + Send + Sync + 'static> {
        Arc::new(StdoutDisplayer {
            format: self.global.output,
            header: !self.global.no_header,
        })
    }
}
