// Legend column and totals footer
// Author: kelexine (https://github.com/kelexine)

use super::svg::{escape, num, truncate_name};
use super::theme::Theme;
use super::{Layout, FOOTER_HEIGHT, LEGEND_NAME_CAP, LEGEND_WIDTH, PADDING};
use crate::models::LanguageReport;
use crate::utils::format::{format_bytes, format_percentage, pluralize};

const SWATCH: f64 = 12.0;

pub(super) fn render(
    out: &mut String,
    report: &LanguageReport,
    layout: &Layout,
    theme: &Theme,
    show_percentages: bool,
) {
    let spacing = layout.row_spacing();
    let offset = (layout.body_height - spacing * report.languages.len() as f64) / 2.0;
    let right = layout.legend_x + LEGEND_WIDTH;

    out.push_str("<g class=\"legend\">");
    for (index, entry) in report.languages.iter().enumerate() {
        let y = layout.top + offset + spacing * index as f64;

        out.push_str(&format!(
            "<rect x=\"{}\" y=\"{}\" width=\"{s}\" height=\"{s}\" rx=\"2\" fill=\"{}\"/>",
            num(layout.legend_x),
            num(y),
            escape(&entry.color),
            s = num(SWATCH),
        ));
        out.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" font-size=\"12\" font-weight=\"600\" fill=\"{}\">{}</text>",
            num(layout.legend_x + SWATCH + 6.0),
            num(y + 10.0),
            theme.text,
            escape(&truncate_name(&entry.name, LEGEND_NAME_CAP)),
        ));
        if show_percentages {
            out.push_str(&format!(
                "<text x=\"{}\" y=\"{}\" text-anchor=\"end\" font-size=\"12\" fill=\"{}\">{}</text>",
                num(right),
                num(y + 10.0),
                theme.text,
                escape(&format_percentage(entry.percentage)),
            ));
        }
        out.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" font-size=\"10\" fill=\"{}\">{} · {}</text>",
            num(layout.legend_x + SWATCH + 6.0),
            num(y + 23.0),
            theme.muted,
            escape(&format_bytes(entry.bytes)),
            escape(&pluralize(entry.repo_count, "repo")),
        ));
    }
    out.push_str("</g>");
}

pub(super) fn footer(out: &mut String, report: &LanguageReport, layout: &Layout, theme: &Theme) {
    let y = layout.top + layout.body_height + FOOTER_HEIGHT * 0.65;
    let text = format!(
        "{} · {} · {}",
        pluralize(report.total_languages, "language"),
        format_bytes(report.total_bytes),
        repositories(report.total_repositories),
    );
    out.push_str(&format!(
        "<text x=\"{}\" y=\"{}\" font-size=\"11\" fill=\"{}\">{}</text>",
        num(PADDING),
        num(y),
        theme.muted,
        escape(&text),
    ));
}

fn repositories(count: usize) -> String {
    if count == 1 {
        "1 repository".to_string()
    } else {
        format!("{} repositories", count)
    }
}
