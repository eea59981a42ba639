//! Certificate rendering.
//!
//! The issuance pipeline only depends on the [`Renderer`] trait; the job
//! worker treats rendering as an external collaborator that either produces
//! a non-empty output file or fails for that row. [`PdfRenderer`] is the
//! built-in implementation: it substitutes `{{placeholder}}` tokens in a
//! text template, lays the lines out with genpdf, appends a verification
//! block (certificate id + verification URL) at the requested alignment and
//! embeds an optional signature image.

use crate::services::data_sources::placeholders::PLACEHOLDER_PATTERN;
use genpdf::elements::{Break, Image as PdfImage, Paragraph};
use genpdf::{Alignment, Document};
use image::{load_from_memory, DynamicImage, GenericImageView};
use png::{BitDepth as PngBitDepth, ColorType as PngColorType, Encoder as PngEncoder};
use regex::Regex;
use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;
use tempfile::NamedTempFile;

const IMAGE_DPI: f64 = 150.0;
/// Cap for the embedded signature image, in CSS-ish pixels at 96 dpi.
const SIGNATURE_MAX_PX: f64 = 200.0;

/// Everything the renderer needs to produce one certificate document.
pub struct RenderJob<'a> {
    pub template_path: &'a Path,
    pub output_path: &'a Path,
    /// Column name -> normalized value for this row.
    pub values: &'a HashMap<String, String>,
    /// Placeholder keys discovered in the template.
    pub placeholders: &'a [String],
    pub cert_id: &'a str,
    pub verification_url: &'a str,
    /// Alignment hint for the verification block ("bottom-right", ...).
    pub qr_position: &'a str,
    pub signature_path: Option<&'a Path>,
    pub sig_position: &'a str,
}

/// Produces one certificate document for one dataset row.
///
/// Implementations must leave a non-empty file at `output_path` on success.
pub trait Renderer: Send + Sync {
    fn render(&self, job: &RenderJob<'_>) -> Result<(), Box<dyn Error>>;
}

/// genpdf-backed default renderer.
pub struct PdfRenderer;

impl Renderer for PdfRenderer {
    fn render(&self, job: &RenderJob<'_>) -> Result<(), Box<dyn Error>> {
        render_certificate(job)
    }
}

/// Replaces `{{key}}` tokens with row values, matching columns
/// case-insensitively. Tokens with no matching column are left as-is so an
/// unresolved placeholder stays visible in the output.
fn substitute_placeholders(
    text: &str,
    values: &HashMap<String, String>,
) -> Result<String, Box<dyn Error>> {
    let re = Regex::new(PLACEHOLDER_PATTERN)?;
    let lowered: HashMap<String, &String> = values
        .iter()
        .map(|(k, v)| (k.trim().to_lowercase(), v))
        .collect();
    Ok(re
        .replace_all(text, |caps: &regex::Captures| {
            let key = caps[1].trim().to_lowercase();
            match lowered.get(&key) {
                Some(value) => (*value).clone(),
                None => caps[0].to_string(),
            }
        })
        .into_owned())
}

/// Load the font family (adjust path/name if needed).
fn load_font() -> Result<genpdf::fonts::FontFamily<genpdf::fonts::FontData>, Box<dyn Error>> {
    if let Ok(family) = genpdf::fonts::from_files("./fonts", "Arial", None) {
        return Ok(family);
    }
    genpdf::fonts::from_files("./fonts", "LiberationSans", None).map_err(Into::into)
}

fn configure_document() -> Result<Document, Box<dyn Error>> {
    let font_family = load_font()?;
    let mut doc = Document::new(font_family);
    doc.set_title("Certificate");
    doc.set_font_size(12);
    doc.set_line_spacing(1.2f64);
    let mut decorator = genpdf::SimplePageDecorator::new();
    decorator.set_margins(15);
    doc.set_page_decorator(decorator);
    Ok(doc)
}

/// Maps a layout hint like "bottom-right" to a horizontal alignment.
fn alignment_for(position: &str) -> Alignment {
    let p = position.to_lowercase();
    if p.contains("left") {
        Alignment::Left
    } else if p.contains("center") {
        Alignment::Center
    } else {
        Alignment::Right
    }
}

/// Flattens the signature image over a white background, rescales it and
/// embeds it as a temporary PNG; the temp file must outlive rendering.
fn embed_signature(
    doc: &mut Document,
    signature_path: &Path,
    sig_position: &str,
    temp_files: &mut Vec<NamedTempFile>,
) -> Result<(), Box<dyn Error>> {
    let bytes = fs::read(signature_path)?;
    let img = load_from_memory(&bytes)?;
    let (orig_w, orig_h) = img.dimensions();

    let css_to_px = IMAGE_DPI / 96.0;
    let max_side_px = SIGNATURE_MAX_PX * css_to_px;
    let scale = (max_side_px / orig_w as f64)
        .min(max_side_px / orig_h as f64)
        .min(1.0);
    let resized: DynamicImage = if scale >= 1.0 {
        img
    } else {
        let new_w = ((orig_w as f64) * scale).max(1.0).round() as u32;
        let new_h = ((orig_h as f64) * scale).max(1.0).round() as u32;
        img.resize(new_w, new_h, image::imageops::FilterType::Lanczos3)
    };

    // Flatten alpha over white and convert to RGB; genpdf's PNG support does
    // not take transparency.
    let rgba = resized.to_rgba8();
    let (w, h) = rgba.dimensions();
    let mut background = image::RgbaImage::from_pixel(w, h, image::Rgba([255, 255, 255, 255]));
    image::imageops::overlay(&mut background, &rgba, 0, 0);
    let rgb_image = DynamicImage::ImageRgba8(background).to_rgb8();
    let raw = rgb_image.into_raw();

    let mut tmp = NamedTempFile::new()?;
    {
        let file = tmp.as_file_mut();
        let mut encoder = PngEncoder::new(file, w, h);
        encoder.set_color(PngColorType::Rgb);
        encoder.set_depth(PngBitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&raw)?;
    }

    let mut img_elem = PdfImage::from_path(tmp.path().to_path_buf())?;
    img_elem.set_dpi(IMAGE_DPI);
    img_elem.set_alignment(alignment_for(sig_position));
    temp_files.push(tmp);
    doc.push(img_elem);
    Ok(())
}

fn render_certificate(job: &RenderJob<'_>) -> Result<(), Box<dyn Error>> {
    let template_text = fs::read_to_string(job.template_path)?;
    let text = substitute_placeholders(&template_text, job.values)?;

    let mut doc = configure_document()?;
    let mut temp_files: Vec<NamedTempFile> = Vec::new();

    // Do not trim lines: empty lines are deliberate vertical space.
    for line in text.lines() {
        if line.is_empty() {
            doc.push(Break::new(1));
        } else if let Some(item) = line.strip_prefix("- ") {
            doc.push(Paragraph::new(format!("\u{2022} {item}")));
        } else {
            doc.push(Paragraph::new(line));
        }
    }

    if let Some(signature) = job.signature_path {
        doc.push(Break::new(2));
        embed_signature(&mut doc, signature, job.sig_position, &mut temp_files)?;
    }

    let verify_align = alignment_for(job.qr_position);
    doc.push(Break::new(2));
    doc.push(Paragraph::new(format!("Certificate ID: {}", job.cert_id)).aligned(verify_align));
    doc.push(Paragraph::new(format!("Verify at {}", job.verification_url)).aligned(verify_align));

    if let Some(parent) = job.output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out_file = fs::File::create(job.output_path)?;
    doc.render(&mut out_file)?;

    // temp_files dropped and cleaned up here
    Ok(())
}
