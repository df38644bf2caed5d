use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use log::{debug, info};
use printpdf::{
    BuiltinFont, ColorBits, ColorSpace, Image, ImageFilter, ImageTransform, ImageXObject,
    IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Px,
};

use super::{headings, placeholder, ComposeSummary, Figure, Section};
use crate::error::{ReportError, Result};

// ---------------------------------------------------------------------------
// Page geometry (millimetres, origin bottom-left)
// ---------------------------------------------------------------------------

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 10.0;
const IMAGE_WIDTH: f32 = 180.0;
/// Lowest point content may reach; the footer sits below.
const CONTENT_BOTTOM: f32 = 20.0;

const HEADER: &str = "Teacher Salary Analysis Report";
const HEADER_SIZE: f32 = 15.0;
const TITLE_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 11.0;
const FOOTER_SIZE: f32 = 8.0;

/// Charts are resampled to at most this resolution at their placed size.
const EMBED_DPI: f32 = 150.0;
const MM_PER_INCH: f32 = 25.4;
const JPEG_QUALITY: u8 = 90;

const PT_TO_MM: f32 = 0.3528;
/// Mean Helvetica glyph advance as a fraction of the font size.
const GLYPH_WIDTH: f32 = 0.5;

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

fn pdf_err(e: impl std::fmt::Debug) -> ReportError {
    ReportError::Pdf(format!("{e:?}"))
}

/// Approximate rendered width of `text` in millimetres.
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * GLYPH_WIDTH * PT_TO_MM
}

/// Greedy word wrap so no line exceeds `width` millimetres at `size`.
fn wrap(text: &str, size: f32, width: f32) -> Vec<String> {
    let max_chars = ((width / (size * GLYPH_WIDTH * PT_TO_MM)) as usize).max(1);
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > max_chars {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Write the PDF report: one page per section, static charts embedded at
/// full content width. Interactive figures are left out; missing charts get
/// a placeholder line.
pub fn compose(sections: &[Section], chart_dir: &Path, output: &Path) -> Result<ComposeSummary> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(HEADER, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_err)?,
        italic: doc.add_builtin_font(BuiltinFont::HelveticaOblique).map_err(pdf_err)?,
    };

    let printable = sections
        .iter()
        .filter(|s| !matches!(s.figure, Some(Figure::Interactive { .. })));

    let mut summary = ComposeSummary::default();
    for (page_no, (section, heading)) in headings(printable).into_iter().enumerate() {
        let layer = if page_no == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            doc.get_page(page).get_layer(layer)
        };
        write_page(&layer, &fonts, page_no + 1, section, &heading, chart_dir, &mut summary)?;
    }

    let bytes = doc.save_to_bytes().map_err(pdf_err)?;
    std::fs::write(output, bytes)?;
    info!(
        "Saved {} ({} charts, {} missing)",
        output.display(),
        summary.embedded.len(),
        summary.placeholders.len()
    );
    Ok(summary)
}

fn write_page(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    page_no: usize,
    section: &Section,
    heading: &str,
    chart_dir: &Path,
    summary: &mut ComposeSummary,
) -> Result<()> {
    debug!("PDF page {page_no}: {heading}");

    // Header, centred.
    let mut y = PAGE_HEIGHT - 2.0 * MARGIN;
    let x = (PAGE_WIDTH - text_width(HEADER, HEADER_SIZE)) / 2.0;
    layer.use_text(HEADER, HEADER_SIZE, Mm(x.max(MARGIN)), Mm(y), &fonts.bold);
    y -= 20.0;

    layer.use_text(heading, TITLE_SIZE, Mm(MARGIN), Mm(y), &fonts.bold);
    y -= 10.0;

    let line_height = BODY_SIZE * PT_TO_MM * 1.6;
    for paragraph in &section.paragraphs {
        for line in wrap(paragraph, BODY_SIZE, PAGE_WIDTH - 2.0 * MARGIN) {
            layer.use_text(line, BODY_SIZE, Mm(MARGIN), Mm(y), &fonts.regular);
            y -= line_height;
        }
        y -= line_height;
    }

    if let Some(Figure::Image { file, .. }) = &section.figure {
        match summary.resolve(chart_dir, file) {
            Some(path) => place_image(layer, &path, y)?,
            None => layer.use_text(placeholder(file), BODY_SIZE, Mm(MARGIN), Mm(y), &fonts.regular),
        }
    }

    let footer = format!("Page {page_no}");
    let x = (PAGE_WIDTH - text_width(&footer, FOOTER_SIZE)) / 2.0;
    layer.use_text(footer, FOOTER_SIZE, Mm(x), Mm(MARGIN), &fonts.italic);
    Ok(())
}

/// Draw the image with its top edge at `top`, 180 mm wide unless that would
/// cross into the footer.
fn place_image(layer: &PdfLayerReference, path: &Path, top: f32) -> Result<()> {
    let decoded =
        image::open(path).map_err(|e| ReportError::Pdf(format!("{}: {e}", path.display())))?;
    let (w, h) = decoded.dimensions();
    if w == 0 || h == 0 {
        return Err(ReportError::Pdf(format!("{}: empty image", path.display())));
    }
    let aspect = h as f32 / w as f32;

    let available = (top - CONTENT_BOTTOM).max(10.0);
    let width = IMAGE_WIDTH.min(available / aspect);
    let height = width * aspect;

    let embedded = fit_resolution(decoded, width);
    debug!(
        "Embedding {} at {}x{} px ({w}x{h} source)",
        path.display(),
        embedded.width(),
        embedded.height()
    );
    let dpi = embedded.width() as f32 * MM_PER_INCH / width;
    let xobject = jpeg_xobject(&embedded)
        .map_err(|e| ReportError::Pdf(format!("{}: {e}", path.display())))?;
    Image::from(xobject).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(MARGIN)),
            translate_y: Some(Mm(top - height)),
            dpi: Some(dpi),
            ..Default::default()
        },
    );
    Ok(())
}

/// Downsample `image` so that, drawn `width_mm` wide, it carries no more than
/// `EMBED_DPI`. Smaller images pass through untouched.
fn fit_resolution(image: DynamicImage, width_mm: f32) -> DynamicImage {
    let max_width = ((width_mm / MM_PER_INCH * EMBED_DPI).round() as u32).max(1);
    if image.width() <= max_width {
        return image;
    }
    let height = (image.height() as u64 * max_width as u64 / image.width() as u64).max(1) as u32;
    image.resize_exact(max_width, height, FilterType::Triangle)
}

/// JPEG-compressed RGB image object. Alpha is dropped.
fn jpeg_xobject(image: &DynamicImage) -> image::ImageResult<ImageXObject> {
    let rgb = image.to_rgb8();
    let mut data = Vec::new();
    JpegEncoder::new_with_quality(&mut data, JPEG_QUALITY).encode_image(&rgb)?;
    Ok(ImageXObject {
        width: Px(rgb.width() as usize),
        height: Px(rgb.height() as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: data,
        image_filter: Some(ImageFilter::DCT),
        smask: None,
        clipping_bbox: None,
    })
}
