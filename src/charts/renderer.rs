use crate::core::error::RenderError;
use crate::core::types::{Color, ColorCounts, ColorPercentages, ManaCurve};

/// Turns deck aggregates into base64-encoded chart images.
///
/// Every method returns `RenderError::Unavailable` for empty input.
pub trait ChartRenderer: Send + Sync + 'static {
    /// MIME type of the images this renderer produces.
    fn media_type(&self) -> &'static str;

    fn color_pie(&self, counts: &ColorCounts) -> Result<String, RenderError>;

    fn mana_curve_bar(&self, curve: &ManaCurve) -> Result<String, RenderError>;

    fn color_breakdown(&self, percentages: &ColorPercentages) -> Result<String, RenderError>;
}

pub fn color_hex(color: Color) -> &'static str {
    match color {
        Color::W => "#F9FAF9",
        Color::U => "#ADD8E6",
        Color::B => "#36454F",
        Color::R => "#DC143C",
        Color::G => "#7CFC00",
        Color::C => "#A9A9A9",
    }
}
