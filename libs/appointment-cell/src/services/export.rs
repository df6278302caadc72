//! Appointment summary export.
//!
//! The default exporter lays the summary out as text on a single PDF page
//! and saves it next to the other output of the client. DejaVu Sans is
//! embedded so names and places outside Latin-1 keep their glyphs; text the
//! font cannot draw fails the export instead of producing a lossy document.

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use printpdf::{Mm, PdfDocument};
use tracing::{debug, info, instrument, warn};

use shared_config::AppConfig;

use crate::models::{AppointmentSummary, ExportError, ExportedDocument};

const BODY_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
const TITLE_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");

const MM_PER_INCH: f32 = 25.4;
const TITLE_SIZE: f32 = 18.0;
const BODY_SIZE: f32 = 12.0;
const TITLE_GAP: Mm = Mm(12.0);
const LINE_GAP: Mm = Mm(7.0);
// DejaVu Sans at 12pt fits roughly this many characters per 6.5in line.
const MAX_LINE_CHARS: usize = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFormat {
    Letter,
    A4,
}

impl PageFormat {
    /// Portrait width and height in millimetres.
    pub fn size_mm(&self) -> (f32, f32) {
        match self {
            PageFormat::Letter => (215.9, 279.4),
            PageFormat::A4 => (210.0, 297.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Layout options for the exported document.
///
/// `raster_scale` and `image_quality` are read only by exporters that
/// rasterize the summary before embedding it. `PdfExporter` draws text and
/// never reads them.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    pub filename: String,
    pub margin_in: f32,
    pub format: PageFormat,
    pub orientation: Orientation,
    pub raster_scale: f32,
    pub image_quality: f32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            filename: "appointment.pdf".to_string(),
            margin_in: 1.0,
            format: PageFormat::Letter,
            orientation: Orientation::Portrait,
            raster_scale: 2.0,
            image_quality: 0.98,
        }
    }
}

impl ExportOptions {
    pub fn page_size_mm(&self) -> (f32, f32) {
        let (width, height) = self.format.size_mm();
        match self.orientation {
            Orientation::Portrait => (width, height),
            Orientation::Landscape => (height, width),
        }
    }

    pub fn margin_mm(&self) -> f32 {
        self.margin_in * MM_PER_INCH
    }
}

#[async_trait]
pub trait DocumentExporter: Send + Sync {
    async fn export(&self, summary: &AppointmentSummary) -> Result<ExportedDocument, ExportError>;
}

pub struct PdfExporter {
    output_dir: PathBuf,
    options: ExportOptions,
}

impl PdfExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            options: ExportOptions::default(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.pdf_output_dir.clone())
    }

    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    pub fn target_path(&self) -> PathBuf {
        self.output_dir.join(&self.options.filename)
    }
}

#[async_trait]
impl DocumentExporter for PdfExporter {
    #[instrument(skip(self, summary))]
    async fn export(&self, summary: &AppointmentSummary) -> Result<ExportedDocument, ExportError> {
        let summary = summary.clone();
        let options = self.options.clone();
        let path = self.target_path();

        let bytes = tokio::task::spawn_blocking(move || render_pdf(&summary, &options))
            .await
            .map_err(|e| ExportError::Task(e.to_string()))??;

        write_document(&path, &bytes).await?;
        info!("Saved appointment document ({} bytes)", bytes.len());

        Ok(ExportedDocument {
            path,
            size_bytes: bytes.len(),
        })
    }
}

async fn write_document(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

/// Renders the summary to PDF bytes on a single page.
pub fn render_pdf(summary: &AppointmentSummary, options: &ExportOptions) -> Result<Vec<u8>, ExportError> {
    let (width, height) = options.page_size_mm();
    let margin = Mm(options.margin_mm());

    let lines = summary.lines();
    check_coverage(BODY_FONT, &lines)?;

    let (doc, page1, layer1) = PdfDocument::new(summary.title(), Mm(width), Mm(height), "Layer 1");
    let layer = doc.get_page(page1).get_layer(layer1);
    let font = doc
        .add_external_font(BODY_FONT)
        .map_err(|e| ExportError::Render(format!("PDF font error: {e}")))?;
    let bold = doc
        .add_external_font(TITLE_FONT)
        .map_err(|e| ExportError::Render(format!("PDF font error: {e}")))?;

    let mut y = Mm(height - margin.0 - TITLE_GAP.0);
    layer.use_text(summary.title(), TITLE_SIZE, margin, y, &bold);
    y -= TITLE_GAP;

    let mut written = 0usize;
    'lines: for line in lines {
        for wrapped in wrap_text(&line, MAX_LINE_CHARS) {
            if y.0 < margin.0 {
                warn!("Summary does not fit on one page, truncated after {} lines", written);
                break 'lines;
            }
            layer.use_text(wrapped, BODY_SIZE, margin, y, &font);
            y -= LINE_GAP;
            written += 1;
        }
    }
    debug!("Rendered {} summary lines", written);

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ExportError::Render(format!("PDF save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| ExportError::Render(format!("PDF buffer error: {e}")))
}

/// Fails on the first character the embedded font has no glyph for.
fn check_coverage(font: &[u8], lines: &[String]) -> Result<(), ExportError> {
    let face = ttf_parser::Face::parse(font, 0)
        .map_err(|e| ExportError::Render(format!("PDF font error: {e}")))?;

    for line in lines {
        if let Some(c) = line
            .chars()
            .find(|c| !c.is_whitespace() && face.glyph_index(*c).is_none())
        {
            warn!("No glyph for {:?} (U+{:04X})", c, c as u32);
            return Err(ExportError::Render(format!(
                "cannot render character '{}' in \"{}\"",
                c, line
            )));
        }
    }
    Ok(())
}

/// Greedy word wrap. Words longer than `max_chars` are split.
fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(max_chars);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let word: String = word.into_iter().collect();

        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
