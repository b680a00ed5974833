use crate::charts::renderer::{ChartRenderer, color_hex};
use crate::core::error::RenderError;
use crate::core::types::{ColorCounts, ColorPercentages, ManaCurve};
use base64::Engine;
use base64::prelude::*;
use std::fmt::{self, Write};

const FONT: &str = "DejaVu Sans, Arial, sans-serif";

/// Base64 SVG charts for clients that can display vector images.
#[derive(Default)]
pub struct SvgChartRenderer;

impl SvgChartRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl ChartRenderer for SvgChartRenderer {
    fn media_type(&self) -> &'static str {
        "image/svg+xml"
    }

    fn color_pie(&self, counts: &ColorCounts) -> Result<String, RenderError> {
        color_pie_document(counts).map(|svg| BASE64_STANDARD.encode(svg))
    }

    fn mana_curve_bar(&self, curve: &ManaCurve) -> Result<String, RenderError> {
        mana_curve_document(curve).map(|svg| BASE64_STANDARD.encode(svg))
    }

    fn color_breakdown(&self, percentages: &ColorPercentages) -> Result<String, RenderError> {
        color_breakdown_document(percentages).map(|svg| BASE64_STANDARD.encode(svg))
    }
}

pub(crate) const PIE_CHART: &str = "color identity";
pub(crate) const CURVE_CHART: &str = "mana curve";
pub(crate) const BREAKDOWN_CHART: &str = "color breakdown";

/// Raw SVG document for the color identity pie.
pub fn color_pie_document(counts: &ColorCounts) -> Result<String, RenderError> {
    if counts.values().all(|v| *v == 0) {
        return Err(RenderError::Unavailable(PIE_CHART));
    }
    pie_svg(counts).map_err(|source| RenderError::Failed {
        chart: PIE_CHART,
        source,
    })
}

pub fn mana_curve_document(curve: &ManaCurve) -> Result<String, RenderError> {
    if curve.is_empty() {
        return Err(RenderError::Unavailable(CURVE_CHART));
    }
    curve_svg(curve).map_err(|source| RenderError::Failed {
        chart: CURVE_CHART,
        source,
    })
}

pub fn color_breakdown_document(percentages: &ColorPercentages) -> Result<String, RenderError> {
    if percentages.is_empty() {
        return Err(RenderError::Unavailable(BREAKDOWN_CHART));
    }
    breakdown_svg(percentages).map_err(|source| RenderError::Failed {
        chart: BREAKDOWN_CHART,
        source,
    })
}

fn open(svg: &mut String, width: f64, height: f64, title: &str) -> fmt::Result {
    write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" font-family="{FONT}">"#
    )?;
    write!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#)?;
    write!(
        svg,
        r#"<text x="{:.1}" y="40" font-size="22" text-anchor="middle">{title}</text>"#,
        width / 2.0
    )
}

/// Screen point at `deg` degrees counter-clockwise from 3 o'clock.
fn polar(cx: f64, cy: f64, r: f64, deg: f64) -> (f64, f64) {
    let rad = deg.to_radians();
    (cx + r * rad.cos(), cy - r * rad.sin())
}

fn pie_svg(counts: &ColorCounts) -> Result<String, fmt::Error> {
    let (width, height) = (1000.0, 800.0);
    let (cx, cy, r) = (500.0, 430.0, 300.0);
    let total: u64 = counts.values().sum();

    let mut svg = String::new();
    open(
        &mut svg,
        width,
        height,
        "Deck Color Identity Distribution (Per Nonland Card)",
    )?;

    // slices run counter-clockwise from 12 o'clock
    let mut start = 90.0_f64;
    for (color, value) in counts.iter().filter(|(_, v)| **v > 0) {
        let fraction = *value as f64 / total as f64;
        let sweep = fraction * 360.0;
        let end = start + sweep;
        let fill = color_hex(*color);

        if fraction >= 1.0 {
            write!(
                svg,
                r#"<circle cx="{cx}" cy="{cy}" r="{r}" fill="{fill}" stroke="black" stroke-width="0.5"/>"#
            )?;
        } else {
            let (x0, y0) = polar(cx, cy, r, start);
            let (x1, y1) = polar(cx, cy, r, end);
            let large_arc = u8::from(sweep > 180.0);
            write!(
                svg,
                r#"<path d="M {cx} {cy} L {x0:.2} {y0:.2} A {r} {r} 0 {large_arc} 0 {x1:.2} {y1:.2} Z" fill="{fill}" stroke="black" stroke-width="0.5"/>"#
            )?;
        }

        let mid = start + sweep / 2.0;
        let (lx, ly) = polar(cx, cy, r * 1.1, mid);
        let (px, py) = polar(cx, cy, r * 0.6, mid);
        write!(
            svg,
            r#"<text x="{lx:.2}" y="{ly:.2}" font-size="16" text-anchor="middle" dominant-baseline="middle">{}</text>"#,
            color.code()
        )?;
        write!(
            svg,
            r#"<text x="{px:.2}" y="{py:.2}" font-size="16" text-anchor="middle" dominant-baseline="middle">{:.1}%</text>"#,
            fraction * 100.0
        )?;

        start = end;
    }

    svg.push_str("</svg>");
    Ok(svg)
}

/// Smallest 1/2/5 x 10^k step giving at most ~5 ticks up to `max`.
fn tick_step(max: u64) -> u64 {
    let raw = max.div_ceil(5).max(1);
    let mut magnitude = 1;
    loop {
        for m in [1, 2, 5] {
            if m * magnitude >= raw {
                return m * magnitude;
            }
        }
        magnitude *= 10;
    }
}

/// Blue -> light gray -> red, `t` in [0, 1].
fn coolwarm(t: f64) -> String {
    const COOL: (f64, f64, f64) = (59.0, 76.0, 192.0);
    const MID: (f64, f64, f64) = (221.0, 221.0, 221.0);
    const WARM: (f64, f64, f64) = (180.0, 4.0, 38.0);

    let t = t.clamp(0.0, 1.0);
    let (a, b, u) = if t < 0.5 {
        (COOL, MID, t * 2.0)
    } else {
        (MID, WARM, (t - 0.5) * 2.0)
    };
    let mix = |x: f64, y: f64| (x + (y - x) * u).round() as u8;
    format!("#{:02X}{:02X}{:02X}", mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

fn curve_svg(curve: &ManaCurve) -> Result<String, fmt::Error> {
    let (width, height) = (1200.0, 600.0);
    let (left, right, top, bottom) = (90.0, 30.0, 70.0, 80.0);
    let plot_w = width - left - right;
    let plot_h = height - top - bottom;
    let baseline = top + plot_h;

    let max = curve.values().copied().max().unwrap_or(0).max(1);
    let step = tick_step(max);
    let y_top = max.div_ceil(step) * step;
    let y_of = |v: u64| baseline - v as f64 / y_top as f64 * plot_h;

    let mut svg = String::new();
    open(
        &mut svg,
        width,
        height,
        "Mana Curve (Converted Mana Cost Distribution of Spells)",
    )?;

    let mut tick = 0;
    while tick <= y_top {
        let y = y_of(tick);
        write!(
            svg,
            r##"<line x1="{left}" y1="{y:.2}" x2="{:.2}" y2="{y:.2}" stroke="#B0B0B0" stroke-dasharray="6 4" stroke-opacity="0.7"/>"##,
            left + plot_w
        )?;
        write!(
            svg,
            r#"<text x="{:.2}" y="{y:.2}" font-size="13" text-anchor="end" dominant-baseline="middle">{tick}</text>"#,
            left - 8.0
        )?;
        tick += step;
    }

    let n = curve.len();
    let slot = plot_w / n as f64;
    let bar_w = slot * 0.8;
    for (i, (cmc, count)) in curve.iter().enumerate() {
        let t = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.5 };
        let x = left + slot * i as f64 + (slot - bar_w) / 2.0;
        let y = y_of(*count);
        write!(
            svg,
            r#"<rect x="{x:.2}" y="{y:.2}" width="{bar_w:.2}" height="{:.2}" fill="{}" stroke="black"/>"#,
            baseline - y,
            coolwarm(t)
        )?;
        write!(
            svg,
            r#"<text x="{:.2}" y="{:.2}" font-size="13" text-anchor="middle">{cmc}</text>"#,
            x + bar_w / 2.0,
            baseline + 20.0
        )?;
    }

    write!(
        svg,
        r#"<line x1="{left}" y1="{baseline}" x2="{:.2}" y2="{baseline}" stroke="black"/>"#,
        left + plot_w
    )?;
    write!(
        svg,
        r#"<text x="{:.2}" y="{:.2}" font-size="18" text-anchor="middle">Converted Mana Cost (CMC)</text>"#,
        left + plot_w / 2.0,
        height - 20.0
    )?;
    write!(
        svg,
        r#"<text x="25" y="{:.2}" font-size="18" text-anchor="middle" transform="rotate(-90 25 {:.2})">Number of Spells</text>"#,
        top + plot_h / 2.0,
        top + plot_h / 2.0
    )?;

    svg.push_str("</svg>");
    Ok(svg)
}

fn breakdown_svg(percentages: &ColorPercentages) -> Result<String, fmt::Error> {
    let (width, height) = (1000.0, 400.0);
    let (left, right, top, bottom) = (40.0, 160.0, 70.0, 80.0);
    let plot_w = width - left - right;
    let plot_h = height - top - bottom;
    let baseline = top + plot_h;
    let bar_h = plot_h * 0.5;
    let bar_y = top + (plot_h - bar_h) / 2.0;
    let x_of = |pct: f64| left + pct.clamp(0.0, 100.0) / 100.0 * plot_w;

    let mut svg = String::new();
    open(
        &mut svg,
        width,
        height,
        "Color Identity Breakdown (Percentage of Total Identity)",
    )?;

    // stacked in WUBRG-C order
    let mut acc = 0.0_f64;
    for (color, pct) in percentages {
        let x0 = x_of(acc);
        let x1 = x_of(acc + *pct);
        write!(
            svg,
            r#"<rect x="{x0:.2}" y="{bar_y:.2}" width="{:.2}" height="{bar_h:.2}" fill="{}" stroke="black" stroke-width="0.5"/>"#,
            x1 - x0,
            color_hex(*color)
        )?;
        acc += *pct;
    }

    for tick in (0..=100).step_by(10) {
        let x = x_of(tick as f64);
        write!(
            svg,
            r#"<line x1="{x:.2}" y1="{baseline}" x2="{x:.2}" y2="{:.2}" stroke="black"/>"#,
            baseline + 5.0
        )?;
        write!(
            svg,
            r#"<text x="{x:.2}" y="{:.2}" font-size="13" text-anchor="middle">{tick}</text>"#,
            baseline + 20.0
        )?;
    }
    write!(
        svg,
        r#"<line x1="{left}" y1="{baseline}" x2="{:.2}" y2="{baseline}" stroke="black"/>"#,
        left + plot_w
    )?;
    write!(
        svg,
        r#"<text x="{:.2}" y="{:.2}" font-size="18" text-anchor="middle">Percentage of Deck Color Identity</text>"#,
        left + plot_w / 2.0,
        height - 20.0
    )?;

    let legend_x = left + plot_w + 25.0;
    write!(
        svg,
        r#"<text x="{legend_x:.2}" y="{top}" font-size="15">Color</text>"#
    )?;
    for (i, color) in percentages.keys().enumerate() {
        let y = top + 15.0 + i as f64 * 24.0;
        write!(
            svg,
            r#"<rect x="{legend_x:.2}" y="{y:.2}" width="18" height="14" fill="{}" stroke="black" stroke-width="0.5"/>"#,
            color_hex(*color)
        )?;
        write!(
            svg,
            r#"<text x="{:.2}" y="{:.2}" font-size="14">{}</text>"#,
            legend_x + 26.0,
            y + 12.0,
            color.code()
        )?;
    }

    svg.push_str("</svg>");
    Ok(svg)
}
