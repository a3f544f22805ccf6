// PDF backend: replays the composed layout onto printpdf layers

use std::io::{BufWriter, Cursor};
use std::path::Path;

use ::image::DynamicImage;
use printpdf::*;

use crate::assets::{flatten_to_rgb, qr_image};
use crate::error::AppError;
use crate::layout::{self, DrawOp, FontStyle, ImageSlot, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use crate::render::{DocumentRenderer, OutputFormat};
use crate::worksheet::Worksheet;

#[derive(Debug, Clone, Default)]
pub struct PdfRenderer {
    /// TrueType font used for every style instead of the builtin Helvetica
    /// and Courier, which cannot show Thai.
    font: Option<Vec<u8>>,
}

impl PdfRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_font_file(path: &Path) -> Result<Self, AppError> {
        let bytes = std::fs::read(path).map_err(|e| AppError::FontError(format!("{}: {}", path.display(), e)))?;
        Ok(Self { font: Some(bytes) })
    }

    fn load_fonts(&self, doc: &PdfDocumentReference) -> Result<FontSet, AppError> {
        if let Some(bytes) = &self.font {
            let font = doc
                .add_external_font(Cursor::new(bytes.as_slice()))
                .map_err(|e| AppError::FontError(e.to_string()))?;
            return Ok(FontSet {
                regular: font.clone(),
                bold: font.clone(),
                mono: font.clone(),
                mono_bold: font,
            });
        }

        let builtin = |font: BuiltinFont| doc.add_builtin_font(font).map_err(|e| AppError::PdfError(e.to_string()));
        Ok(FontSet {
            regular: builtin(BuiltinFont::Helvetica)?,
            bold: builtin(BuiltinFont::HelveticaBold)?,
            mono: builtin(BuiltinFont::Courier)?,
            mono_bold: builtin(BuiltinFont::CourierBold)?,
        })
    }
}

struct FontSet {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    mono: IndirectFontRef,
    mono_bold: IndirectFontRef,
}

impl FontSet {
    fn get(&self, style: FontStyle) -> &IndirectFontRef {
        match style {
            FontStyle::Regular => &self.regular,
            FontStyle::Bold => &self.bold,
            FontStyle::Mono => &self.mono,
            FontStyle::MonoBold => &self.mono_bold,
        }
    }
}

impl DocumentRenderer for PdfRenderer {
    fn format(&self) -> OutputFormat {
        OutputFormat::Pdf
    }

    fn render(&self, worksheet: &Worksheet) -> Result<Vec<u8>, AppError> {
        let layout = layout::compose(worksheet);

        let (doc, page1, layer1) = PdfDocument::new(
            worksheet.title.as_str(),
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "Layer 1",
        );
        let fonts = self.load_fonts(&doc)?;
        let qr = worksheet.qr_url.as_deref().map(qr_image).transpose()?;

        for (index, page) in layout.pages.iter().enumerate() {
            let layer = if index == 0 {
                doc.get_page(page1).get_layer(layer1)
            } else {
                let (new_page, new_layer) = doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
                doc.get_page(new_page).get_layer(new_layer)
            };

            for op in &page.ops {
                match op {
                    DrawOp::Text {
                        text,
                        x,
                        y,
                        size,
                        font,
                        color,
                    } => {
                        layer.set_fill_color(pdf_color(*color));
                        layer.use_text(text.as_str(), *size, Mm(*x), Mm(*y), fonts.get(*font));
                    }
                    DrawOp::Line {
                        from,
                        to,
                        thickness,
                        color,
                        dash,
                    } => {
                        layer.set_outline_color(pdf_color(*color));
                        layer.set_outline_thickness(*thickness);
                        if let Some((on, off)) = dash {
                            layer.set_line_dash_pattern(LineDashPattern {
                                dash_1: Some(*on),
                                gap_1: Some(*off),
                                ..Default::default()
                            });
                        }
                        draw_line(&layer, from.0, from.1, to.0, to.1);
                        if dash.is_some() {
                            layer.set_line_dash_pattern(LineDashPattern::default());
                        }
                    }
                    DrawOp::Image {
                        slot,
                        x,
                        y,
                        width,
                        ..
                    } => {
                        let source = match slot {
                            ImageSlot::Logo => worksheet.logo.as_ref(),
                            ImageSlot::Qr => qr.as_ref(),
                        };
                        if let Some(image) = source {
                            embed_image(&layer, image, *x, *y, *width, *slot == ImageSlot::Logo);
                        }
                    }
                }
            }
        }

        let mut writer = BufWriter::new(Vec::new());
        doc.save(&mut writer).map_err(|e| AppError::PdfError(e.to_string()))?;
        writer.into_inner().map_err(|e| AppError::PdfError(e.to_string()))
    }
}

// ============================================================================
// Drawing Utilities
// ============================================================================

fn pdf_color(color: layout::Rgb) -> Color {
    Color::Rgb(Rgb::new(color.r, color.g, color.b, None))
}

fn draw_line(layer: &PdfLayerReference, x1: f32, y1: f32, x2: f32, y2: f32) {
    let points = vec![
        (Point::new(Mm(x1), Mm(y1)), false),
        (Point::new(Mm(x2), Mm(y2)), false),
    ];
    let line = Line {
        points,
        is_closed: false,
    };
    layer.add_line(line);
}

/// Places an image with its bottom-left corner at (x, y), scaled to `width_mm`.
fn embed_image(layer: &PdfLayerReference, image: &DynamicImage, x: f32, y: f32, width_mm: f32, smooth: bool) {
    let rgb_image = flatten_to_rgb(image);
    let (width_px, height_px) = rgb_image.dimensions();
    if width_px == 0 || height_px == 0 || width_mm <= 0.0 {
        return;
    }

    let image = Image::from(ImageXObject {
        width: Px(width_px as usize),
        height: Px(height_px as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: smooth,
        image_data: rgb_image.into_raw(),
        image_filter: None,
        clipping_bbox: None,
        smask: None,
    });

    // DPI = pixels / (mm / 25.4)
    let dpi = (width_px as f32) / (width_mm / 25.4);

    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x)),
            translate_y: Some(Mm(y)),
            dpi: Some(dpi),
            ..Default::default()
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{MathFactGenerator, Operation};
    use crate::wordsearch::GridPlacer;
    use crate::worksheet::WorksheetContent;

    fn page_count(bytes: &[u8]) -> usize {
        lopdf::Document::load_mem(bytes).unwrap().get_pages().len()
    }

    fn math_sheet(count: usize) -> Worksheet {
        let (questions, answers) = MathFactGenerator::new().with_seed(Some(3)).generate(Operation::Mul, count, 1, 12);
        Worksheet::new("Times Tables", "Example School", WorksheetContent::MathQuestions { questions, answers })
    }

    #[test]
    fn pdf_page_count_matches_layout() {
        for count in [5, 40] {
            let ws = math_sheet(count);
            let bytes = PdfRenderer::new().render(&ws).unwrap();
            assert!(bytes.starts_with(b"%PDF"));
            assert_eq!(page_count(&bytes), layout::compose(&ws).pages.len());
        }
    }

    #[test]
    fn header_images_are_embedded() {
        let logo = DynamicImage::new_rgba8(60, 30);
        let ws = math_sheet(3)
            .with_qr_url(Some("https://example.com/answers/1".into()))
            .with_logo(Some(logo));
        let plain = PdfRenderer::new().render(&math_sheet(3)).unwrap();
        let decorated = PdfRenderer::new().render(&ws).unwrap();
        assert!(decorated.len() > plain.len());
        assert_eq!(page_count(&decorated), 2);
    }

    #[test]
    fn word_search_renders() {
        let puzzle = GridPlacer::default().with_seed(Some(2)).generate(&["planet", "comet", "star"]);
        let ws = Worksheet::new("Space", "", WorksheetContent::WordSearch(puzzle));
        let bytes = PdfRenderer::new().render(&ws).unwrap();
        assert_eq!(page_count(&bytes), 2);
    }

    #[test]
    fn missing_font_file_is_reported() {
        let err = PdfRenderer::with_font_file(Path::new("no/such/font.ttf")).unwrap_err();
        assert!(matches!(err, AppError::FontError(_)));
    }
}
