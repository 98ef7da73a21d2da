// Donut and pie layouts
// Author: kelexine (https://github.com/kelexine)

use super::svg::{escape, num, polar};
use super::theme::Theme;
use super::{ChartKind, Layout, INNER_RADIUS_RATIO, LABEL_THRESHOLD};
use crate::models::{LanguageEntry, LanguageReport};
use crate::utils::format::{format_bytes, format_percentage};

/// Sweeps at or above this are drawn as a closed circle; an arc whose end
/// point equals its start point renders as nothing.
const FULL_CIRCLE_DEGREES: f64 = 359.99;

const START_ANGLE: f64 = -90.0;

/// Gap between the outer radius and the chart area edge.
const EDGE_INSET: f64 = 4.0;

pub(super) fn render(
    out: &mut String,
    report: &LanguageReport,
    layout: &Layout,
    theme: &Theme,
    kind: ChartKind,
    show_percentages: bool,
) {
    let cx = layout.chart_x + layout.chart_area / 2.0;
    let cy = layout.top + layout.body_height / 2.0;
    let outer = layout.chart_area / 2.0 - EDGE_INSET;
    let inner = match kind {
        ChartKind::Donut => outer * INNER_RADIUS_RATIO,
        _ => 0.0,
    };

    out.push_str("<g class=\"segments\">");
    let mut start = START_ANGLE;
    for entry in &report.languages {
        let sweep = entry.percentage / 100.0 * 360.0;
        if sweep <= 0.0 {
            continue;
        }
        let end = start + sweep;

        out.push_str("<g>");
        if sweep >= FULL_CIRCLE_DEGREES {
            full_circle(out, cx, cy, outer, inner, &entry.color);
        } else {
            wedge(out, cx, cy, outer, inner, start, end, &entry.color);
        }
        tooltip(out, entry);
        out.push_str("</g>");

        if show_percentages && entry.percentage > LABEL_THRESHOLD {
            let label_radius = if inner > 0.0 {
                (outer + inner) / 2.0
            } else {
                outer * 0.62
            };
            let (x, y) = polar(cx, cy, label_radius, start + sweep / 2.0);
            out.push_str(&format!(
                "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" dominant-baseline=\"central\" font-size=\"10\" font-weight=\"600\" fill=\"{}\">{}</text>",
                num(x),
                num(y),
                theme.label,
                escape(&format_percentage(entry.percentage)),
            ));
        }

        start = end;
    }
    out.push_str("</g>");

    if kind == ChartKind::Donut {
        center_count(out, cx, cy, report.total_repositories, theme);
    }
}

fn full_circle(out: &mut String, cx: f64, cy: f64, outer: f64, inner: f64, color: &str) {
    if inner > 0.0 {
        out.push_str(&format!(
            "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"{}\"/>",
            num(cx),
            num(cy),
            num((outer + inner) / 2.0),
            escape(color),
            num(outer - inner),
        ));
    } else {
        out.push_str(&format!(
            "<circle cx=\"{}\" cy=\"{}\" r=\"{}\" fill=\"{}\"/>",
            num(cx),
            num(cy),
            num(outer),
            escape(color),
        ));
    }
}

#[allow(clippy::too_many_arguments)]
fn wedge(
    out: &mut String,
    cx: f64,
    cy: f64,
    outer: f64,
    inner: f64,
    start: f64,
    end: f64,
    color: &str,
) {
    let large_arc = if end - start > 180.0 { 1 } else { 0 };
    let (ox0, oy0) = polar(cx, cy, outer, start);
    let (ox1, oy1) = polar(cx, cy, outer, end);

    let d = if inner > 0.0 {
        let (ix1, iy1) = polar(cx, cy, inner, end);
        let (ix0, iy0) = polar(cx, cy, inner, start);
        format!(
            "M {} {} A {r} {r} 0 {large} 1 {} {} L {} {} A {ir} {ir} 0 {large} 0 {} {} Z",
            num(ox0),
            num(oy0),
            num(ox1),
            num(oy1),
            num(ix1),
            num(iy1),
            num(ix0),
            num(iy0),
            r = num(outer),
            ir = num(inner),
            large = large_arc,
        )
    } else {
        format!(
            "M {} {} L {} {} A {r} {r} 0 {large} 1 {} {} Z",
            num(cx),
            num(cy),
            num(ox0),
            num(oy0),
            num(ox1),
            num(oy1),
            r = num(outer),
            large = large_arc,
        )
    };

    out.push_str(&format!("<path d=\"{}\" fill=\"{}\"/>", d, escape(color)));
}

fn tooltip(out: &mut String, entry: &LanguageEntry) {
    out.push_str(&format!(
        "<title>{}: {} ({})</title>",
        escape(&entry.name),
        format_percentage(entry.percentage),
        format_bytes(entry.bytes),
    ));
}

fn center_count(out: &mut String, cx: f64, cy: f64, repositories: usize, theme: &Theme) {
    out.push_str(&format!(
        "<text x=\"{x}\" y=\"{}\" text-anchor=\"middle\" font-size=\"22\" font-weight=\"700\" fill=\"{}\">{}</text>",
        num(cy + 4.0),
        theme.title,
        repositories,
        x = num(cx),
    ));
    let unit = if repositories == 1 { "repo" } else { "repos" };
    out.push_str(&format!(
        "<text x=\"{}\" y=\"{}\" text-anchor=\"middle\" font-size=\"10\" fill=\"{}\">{}</text>",
        num(cx),
        num(cy + 20.0),
        theme.muted,
        unit,
    ));
}
