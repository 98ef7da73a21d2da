// Horizontal bar layout
// Author: kelexine (https://github.com/kelexine)

use super::svg::{escape, num};
use super::theme::Theme;
use super::Layout;
use crate::models::LanguageReport;
use crate::utils::format::{format_bytes, format_percentage};

/// Share of the track a 100% bar may fill; the rest leaves room for the label.
const TRACK_FILL: f64 = 0.95;

pub(super) fn render(
    out: &mut String,
    report: &LanguageReport,
    layout: &Layout,
    theme: &Theme,
    show_percentages: bool,
) {
    let track_width = layout.chart_area;
    let row_height = layout.bar_height();
    let thickness = row_height * 0.6;
    let offset = (layout.body_height - row_height * report.languages.len() as f64) / 2.0;

    out.push_str("<g class=\"bars\">");
    for (index, entry) in report.languages.iter().enumerate() {
        let row_y = layout.top + offset + row_height * index as f64;
        let bar_y = row_y + (row_height - thickness) / 2.0;
        let width = entry.percentage / 100.0 * (TRACK_FILL * track_width);

        out.push_str(&format!(
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"3\" fill=\"{}\"/>",
            num(layout.chart_x),
            num(bar_y),
            num(track_width),
            num(thickness),
            theme.track,
        ));
        out.push_str(&format!(
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" rx=\"3\" fill=\"{}\"><title>{}: {} ({})</title></rect>",
            num(layout.chart_x),
            num(bar_y),
            num(width),
            num(thickness),
            escape(&entry.color),
            escape(&entry.name),
            format_percentage(entry.percentage),
            format_bytes(entry.bytes),
        ));

        if show_percentages {
            let label_x = (layout.chart_x + width + 4.0).min(layout.chart_x + track_width - 34.0);
            out.push_str(&format!(
                "<text x=\"{}\" y=\"{}\" dominant-baseline=\"central\" font-size=\"10\" fill=\"{}\">{}</text>",
                num(label_x.max(layout.chart_x + 2.0)),
                num(bar_y + thickness / 2.0),
                theme.text,
                escape(&format_percentage(entry.percentage)),
            ));
        }
    }
    out.push_str("</g>");
}
