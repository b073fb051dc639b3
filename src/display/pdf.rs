//! PDF export of the portfolio history chart

use super::{format_money, CHART_TITLE};
use crate::history::HistorySample;
use anyhow::{anyhow, bail, Result};
use printpdf::*;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

// Chart area on an A4 landscape page
const CHART_LEFT: f32 = 40.0;
const CHART_RIGHT: f32 = 277.0;
const CHART_BOTTOM: f32 = 35.0;
const CHART_TOP: f32 = 175.0;

/// PDF export result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfExportResult {
    pub path: String,
    pub samples: usize,
}

/// Create a new A4 landscape document
fn create_pdf(title: &str) -> (PdfDocumentReference, PdfPageIndex, PdfLayerIndex) {
    PdfDocument::new(title, Mm(297.0), Mm(210.0), "Layer 1")
}

fn get_font(doc: &PdfDocumentReference, font: BuiltinFont) -> Result<IndirectFontRef> {
    doc.add_builtin_font(font)
        .map_err(|e| anyhow!("Failed to load PDF font: {:?}", e))
}

fn add_line(layer: &PdfLayerReference, points: &[(f32, f32)]) {
    let line = Line {
        points: points
            .iter()
            .map(|(x, y)| (Point::new(Mm(*x), Mm(*y)), false))
            .collect(),
        is_closed: false,
    };
    layer.add_line(line);
}

/// Map samples into chart coordinates (mm). A flat series sits mid-height.
fn chart_points(samples: &[HistorySample]) -> Vec<(f32, f32)> {
    let (min, max) = samples.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
        (lo.min(s.total_value), hi.max(s.total_value))
    });
    let first = samples[0].timestamp.timestamp_millis();
    let last = samples[samples.len() - 1].timestamp.timestamp_millis();

    samples
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let x_frac = if last > first {
                (s.timestamp.timestamp_millis() - first) as f64 / (last - first) as f64
            } else if samples.len() > 1 {
                i as f64 / (samples.len() - 1) as f64
            } else {
                0.5
            };
            let y_frac = if max > min {
                (s.total_value - min) / (max - min)
            } else {
                0.5
            };
            (
                CHART_LEFT + (CHART_RIGHT - CHART_LEFT) * x_frac as f32,
                CHART_BOTTOM + (CHART_TOP - CHART_BOTTOM) * y_frac as f32,
            )
        })
        .collect()
}

/// Write the history as a line chart to `path`.
pub fn export_history_chart(
    samples: &[HistorySample],
    currency: &str,
    path: &Path,
) -> Result<PdfExportResult> {
    if samples.is_empty() {
        bail!("No portfolio history to export");
    }

    let (doc, page1, layer1) = create_pdf(CHART_TITLE);
    let font = get_font(&doc, BuiltinFont::Helvetica)?;
    let font_bold = get_font(&doc, BuiltinFont::HelveticaBold)?;
    let layer = doc.get_page(page1).get_layer(layer1);

    layer.use_text(CHART_TITLE, 18.0, Mm(CHART_LEFT), Mm(195.0), &font_bold);
    layer.use_text(
        format!("Portfolio Value ({})", currency.to_uppercase()),
        10.0,
        Mm(CHART_LEFT),
        Mm(186.0),
        &font,
    );

    // Axes
    layer.set_outline_thickness(0.5);
    add_line(
        &layer,
        &[(CHART_LEFT, CHART_TOP), (CHART_LEFT, CHART_BOTTOM), (CHART_RIGHT, CHART_BOTTOM)],
    );

    let (min, max) = samples.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
        (lo.min(s.total_value), hi.max(s.total_value))
    });
    layer.use_text(format_money(max, currency), 8.0, Mm(5.0), Mm(CHART_TOP), &font);
    layer.use_text(format_money(min, currency), 8.0, Mm(5.0), Mm(CHART_BOTTOM), &font);

    let time_format = "%Y-%m-%d %H:%M:%S";
    layer.use_text(
        samples[0].timestamp.format(time_format).to_string(),
        8.0,
        Mm(CHART_LEFT),
        Mm(CHART_BOTTOM - 8.0),
        &font,
    );
    if samples.len() > 1 {
        layer.use_text(
            samples[samples.len() - 1].timestamp.format(time_format).to_string(),
            8.0,
            Mm(CHART_RIGHT - 30.0),
            Mm(CHART_BOTTOM - 8.0),
            &font,
        );
    }

    // Series
    let points = chart_points(samples);
    layer.set_outline_color(Color::Rgb(Rgb::new(0.12, 0.47, 0.71, None)));
    layer.set_outline_thickness(1.5);
    if points.len() == 1 {
        let (x, y) = points[0];
        add_line(&layer, &[(x - 1.0, y), (x + 1.0, y)]);
    } else {
        add_line(&layer, &points);
    }

    let file = File::create(path)
        .map_err(|e| anyhow!("Failed to create {}: {}", path.display(), e))?;
    doc.save(&mut BufWriter::new(file))
        .map_err(|e| anyhow!("Failed to save PDF: {:?}", e))?;

    log::info!("Exported {} history samples to {}", samples.len(), path.display());

    Ok(PdfExportResult {
        path: path.display().to_string(),
        samples: samples.len(),
    })
}
