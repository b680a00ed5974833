use crate::charts::renderer::ChartRenderer;
use crate::charts::svg::{
    BREAKDOWN_CHART, CURVE_CHART, PIE_CHART, color_breakdown_document, color_pie_document,
    mana_curve_document,
};
use crate::core::error::RenderError;
use crate::core::types::{ColorCounts, ColorPercentages, ManaCurve};
use base64::Engine;
use base64::prelude::*;
use resvg::usvg::fontdb;
use resvg::{tiny_skia, usvg};
use std::sync::Arc;
use tracing::debug;

const FONT_FAMILY: &str = "DejaVu Sans";
static FONT_DATA: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

/// Base64 PNG charts, rasterized from the SVG documents with an embedded font.
pub struct PngChartRenderer {
    fonts: Arc<fontdb::Database>,
}

impl PngChartRenderer {
    pub fn new() -> Self {
        let mut fonts = fontdb::Database::new();
        fonts.load_font_data(FONT_DATA.to_vec());
        fonts.set_sans_serif_family(FONT_FAMILY);
        debug!(faces = fonts.len(), "Loaded chart fonts");
        Self {
            fonts: Arc::new(fonts),
        }
    }

    fn rasterize(&self, chart: &'static str, svg: &str) -> Result<String, RenderError> {
        let raster_err = |reason: String| RenderError::Raster { chart, reason };

        let options = usvg::Options {
            font_family: FONT_FAMILY.to_string(),
            fontdb: Arc::clone(&self.fonts),
            ..usvg::Options::default()
        };
        let tree = usvg::Tree::from_str(svg, &options).map_err(|e| raster_err(e.to_string()))?;

        let size = tree.size().to_int_size();
        let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
            .ok_or_else(|| raster_err(format!("invalid canvas {}x{}", size.width(), size.height())))?;
        pixmap.fill(tiny_skia::Color::WHITE);
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

        let png = pixmap.encode_png().map_err(|e| raster_err(e.to_string()))?;
        Ok(BASE64_STANDARD.encode(png))
    }
}

impl Default for PngChartRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartRenderer for PngChartRenderer {
    fn media_type(&self) -> &'static str {
        "image/png"
    }

    fn color_pie(&self, counts: &ColorCounts) -> Result<String, RenderError> {
        self.rasterize(PIE_CHART, &color_pie_document(counts)?)
    }

    fn mana_curve_bar(&self, curve: &ManaCurve) -> Result<String, RenderError> {
        self.rasterize(CURVE_CHART, &mana_curve_document(curve)?)
    }

    fn color_breakdown(&self, percentages: &ColorPercentages) -> Result<String, RenderError> {
        self.rasterize(BREAKDOWN_CHART, &color_breakdown_document(percentages)?)
    }
}
