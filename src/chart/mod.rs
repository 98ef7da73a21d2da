//! Deterministic SVG rendering of a language report.
//!
//! - `circular`: donut and pie layouts
//! - `bar`: horizontal bars
//! - `legend`: legend column and totals footer
//! - `theme`: named color themes
//!
//! Author: kelexine (<https://github.com/kelexine>)

mod bar;
mod circular;
mod legend;
pub mod svg;
pub mod theme;

pub use theme::{find_theme, theme_names, Theme};

use crate::error::StatsError;
use crate::metrics;
use crate::models::LanguageReport;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use svg::{close_document, escape, num, open_document};

pub const PADDING: f64 = 20.0;
pub const LEGEND_WIDTH: f64 = 220.0;
pub const TITLE_HEIGHT: f64 = 40.0;
pub const FOOTER_HEIGHT: f64 = 28.0;
/// Segments at or below this percentage get no on-chart label.
pub const LABEL_THRESHOLD: f64 = 3.0;
pub const INNER_RADIUS_RATIO: f64 = 0.45;
pub const LEGEND_NAME_CAP: usize = 14;

const DEFAULT_TITLE: &str = "Most Used Languages";
const FONT_FAMILY: &str = "'Segoe UI', Ubuntu, 'Helvetica Neue', Sans-Serif";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Donut,
    Pie,
    Bar,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Donut => "donut",
            ChartKind::Pie => "pie",
            ChartKind::Bar => "bar",
        }
    }
}

impl FromStr for ChartKind {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "donut" => Ok(ChartKind::Donut),
            "pie" => Ok(ChartKind::Pie),
            "bar" => Ok(ChartKind::Bar),
            other => Err(StatsError::InvalidRequest(format!(
                "Unknown chart type '{}' (expected donut, pie or bar)",
                other
            ))),
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl ChartSize {
    /// Edge length of the square chart area in pixels.
    pub fn chart_area(&self) -> f64 {
        match self {
            ChartSize::Small => 180.0,
            ChartSize::Medium => 240.0,
            ChartSize::Large => 300.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartSize::Small => "small",
            ChartSize::Medium => "medium",
            ChartSize::Large => "large",
        }
    }
}

impl FromStr for ChartSize {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(ChartSize::Small),
            "medium" => Ok(ChartSize::Medium),
            "large" => Ok(ChartSize::Large),
            other => Err(StatsError::InvalidRequest(format!(
                "Unknown chart size '{}' (expected small, medium or large)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFlags {
    pub hide_border: bool,
    pub hide_title: bool,
    pub custom_title: Option<String>,
    pub show_percentages: bool,
}

impl Default for DisplayFlags {
    fn default() -> Self {
        Self {
            hide_border: false,
            hide_title: false,
            custom_title: None,
            show_percentages: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Theme name; unknown names render with the default theme.
    pub theme: String,
    pub size: ChartSize,
    pub kind: ChartKind,
    pub flags: DisplayFlags,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            theme: theme::DEFAULT_THEME.name.to_string(),
            size: ChartSize::default(),
            kind: ChartKind::default(),
            flags: DisplayFlags::default(),
        }
    }
}

/// Canvas geometry shared by the layouts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub width: f64,
    pub height: f64,
    /// Top of the chart body, below the title.
    pub top: f64,
    pub body_height: f64,
    pub chart_area: f64,
    pub chart_x: f64,
    pub legend_x: f64,
    /// Displayed entry count, at least 1.
    pub rows: usize,
}

impl Layout {
    pub fn compute(options: &RenderOptions, entries: usize) -> Self {
        let chart_area = options.size.chart_area();
        let title_height = if options.flags.hide_title { 0.0 } else { TITLE_HEIGHT };
        let rows = entries.max(1);

        let mut layout = Self {
            width: chart_area + LEGEND_WIDTH + PADDING * 3.0,
            height: 0.0,
            top: title_height + PADDING,
            body_height: chart_area,
            chart_area,
            chart_x: PADDING,
            legend_x: PADDING * 2.0 + chart_area,
            rows,
        };

        let mut body = chart_area.max(layout.row_spacing() * rows as f64);
        if options.kind == ChartKind::Bar {
            body = body.max(layout.bar_height() * rows as f64);
        }
        layout.body_height = body;
        layout.height = layout.top + body + FOOTER_HEIGHT + PADDING;
        layout
    }

    /// Legend row spacing, clamp(available / rows, 30, 36).
    pub fn row_spacing(&self) -> f64 {
        (self.chart_area / self.rows as f64).clamp(30.0, 36.0)
    }

    /// Bar row height, clamp(available / rows, 25, 40).
    pub fn bar_height(&self) -> f64 {
        (self.chart_area / self.rows as f64).clamp(25.0, 40.0)
    }
}

/// Render a report as a complete SVG document.
///
/// Output depends only on the arguments; `timing` adds a processing-time
/// badge and is the only variable part.
pub fn render_chart(report: &LanguageReport, options: &RenderOptions, timing: Option<Duration>) -> String {
    let theme = find_theme(&options.theme);
    let layout = Layout::compute(options, report.languages.len());
    let title = options
        .flags
        .custom_title
        .as_deref()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(DEFAULT_TITLE);

    let mut out = String::with_capacity(4096);
    open_document(&mut out, layout.width, layout.height, title);
    frame(&mut out, &layout, theme, options.flags.hide_border);

    if !options.flags.hide_title {
        out.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" font-family=\"{}\" font-size=\"16\" font-weight=\"600\" fill=\"{}\">{}</text>",
            num(PADDING),
            num(PADDING + 16.0),
            FONT_FAMILY,
            theme.title,
            escape(title),
        ));
    }

    out.push_str(&format!("<g font-family=\"{}\">", FONT_FAMILY));
    if report.languages.is_empty() {
        out.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" dominant-baseline=\"central\" font-size=\"13\" fill=\"{}\">No language data</text>",
            num(layout.width / 2.0),
            num(layout.top + layout.body_height / 2.0),
            theme.muted,
        ));
    } else {
        let show = options.flags.show_percentages;
        match options.kind {
            ChartKind::Donut | ChartKind::Pie => {
                circular::render(&mut out, report, &layout, theme, options.kind, show)
            }
            ChartKind::Bar => bar::render(&mut out, report, &layout, theme, show),
        }
        legend::render(&mut out, report, &layout, theme, show);
    }
    legend::footer(&mut out, report, &layout, theme);

    if let Some(elapsed) = timing {
        out.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" text-anchor=\"end\" font-size=\"9\" fill=\"{}\">{}ms</text>",
            num(layout.width - PADDING),
            num(layout.height - PADDING + 6.0),
            theme.muted,
            elapsed.as_millis(),
        ));
    }
    out.push_str("</g>");
    close_document(&mut out);

    metrics::record_render(options.kind.as_str());
    out
}

/// Small card describing a failed request.
pub fn render_error_card(message: &str, theme_name: &str) -> String {
    const WIDTH: f64 = 420.0;
    const HEIGHT: f64 = 120.0;
    const MESSAGE_CAP: usize = 64;

    let theme = find_theme(theme_name);
    let mut out = String::with_capacity(1024);
    open_document(&mut out, WIDTH, HEIGHT, "Error");
    frame_rect(&mut out, WIDTH, HEIGHT, theme, false);
    out.push_str(&format!(
        "<g font-family=\"{}\"><text x=\"{}\" y=\"{}\" font-size=\"16\" font-weight=\"600\" fill=\"{}\">Something went wrong</text>",
        FONT_FAMILY,
        num(PADDING),
        num(PADDING + 24.0),
        theme.title,
    ));
    out.push_str(&format!(
        "<text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"{}\">{}</text></g>",
        num(PADDING),
        num(PADDING + 56.0),
        theme.text,
        escape(&svg::truncate_name(message.trim(), MESSAGE_CAP)),
    ));
    close_document(&mut out);
    out
}

fn frame(out: &mut String, layout: &Layout, theme: &Theme, hide_border: bool) {
    frame_rect(out, layout.width, layout.height, theme, hide_border);
}

fn frame_rect(out: &mut String, width: f64, height: f64, theme: &Theme, hide_border: bool) {
    let stroke = if hide_border {
        "stroke=\"none\"".to_string()
    } else {
        format!("stroke=\"{}\"", theme.border)
    };
    out.push_str(&format!(
        "<rect x=\"0.50\" y=\"0.50\" rx=\"6\" width=\"{}\" height=\"{}\" fill=\"{}\" {}/>",
        num(width - 1.0),
        num(height - 1.0),
        theme.background,
        stroke,
    ));
}
