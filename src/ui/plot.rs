use std::f64::consts::TAU;

use eframe::egui::{Color32, RichText, Stroke, Ui};
use egui_plot::{Bar, BarChart, Legend, Plot, PlotPoints, Polygon};

use crate::color::{generate_palette, BRAND_RED};
use crate::data::aggregate::AggregationResult;
use crate::format::format_grouped;

const CHART_HEIGHT: f32 = 300.0;
const DONUT_HOLE: f64 = 0.3;
/// Arc resolution; each slice is drawn as convex quads of this angular size.
const ARC_STEP: f64 = TAU / 180.0;

// ---------------------------------------------------------------------------
// Top-N bar chart
// ---------------------------------------------------------------------------

/// Ranked bar chart, one bar per group, with a value list underneath.
pub fn top_n_bars(ui: &mut Ui, id: &str, result: &AggregationResult) {
    if result.is_empty() {
        no_groups(ui, result);
        return;
    }

    let bars: Vec<Bar> = result
        .entries
        .iter()
        .enumerate()
        .map(|(i, (group, value))| {
            Bar::new(i as f64, *value)
                .name(group.to_string())
                .fill(BRAND_RED)
        })
        .collect();

    let chart = BarChart::new(bars)
        .color(BRAND_RED)
        .name(&result.metric_column);

    Plot::new(id)
        .height(CHART_HEIGHT)
        .y_axis_label(result.metric_column.as_str())
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .show(ui, |plot_ui| plot_ui.bar_chart(chart));

    ranking_list(ui, result, None);
}

// ---------------------------------------------------------------------------
// Top-N donut chart
// ---------------------------------------------------------------------------

/// Share of each group as a donut; legend entries carry the group names.
pub fn top_n_donut(ui: &mut Ui, id: &str, result: &AggregationResult) {
    if result.is_empty() {
        no_groups(ui, result);
        return;
    }

    let total: f64 = result.entries.iter().map(|(_, v)| v.max(0.0)).sum();
    let colours = generate_palette(result.len());

    Plot::new(id)
        .height(CHART_HEIGHT)
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
        .legend(Legend::default())
        .show(ui, |plot_ui| {
            if total <= 0.0 {
                return;
            }
            // Start at 12 o'clock, run clockwise.
            let mut start = TAU / 4.0;
            for ((group, value), colour) in result.entries.iter().zip(&colours) {
                let sweep = value.max(0.0) / total * TAU;
                let label = group.to_string();
                for points in slice_segments(start, start - sweep) {
                    plot_ui.polygon(
                        Polygon::new(PlotPoints::new(points))
                            .fill_color(*colour)
                            .stroke(Stroke::new(0.0, *colour))
                            .name(&label),
                    );
                }
                start -= sweep;
            }
        });

    ranking_list(ui, result, Some((colours.as_slice(), total)));
}

fn no_groups(ui: &mut Ui, result: &AggregationResult) {
    ui.label(RichText::new(format!("No {} values to rank.", result.group_column)).weak());
}

/// Convex quads approximating the ring section between two angles.
fn slice_segments(from: f64, to: f64) -> Vec<Vec<[f64; 2]>> {
    let sweep = (from - to).abs();
    let steps = ((sweep / ARC_STEP - 1e-9).ceil() as usize).max(1);
    let delta = (to - from) / steps as f64;

    (0..steps)
        .map(|i| {
            let a0 = from + delta * i as f64;
            let a1 = a0 + delta;
            vec![
                [a0.cos(), a0.sin()],
                [a1.cos(), a1.sin()],
                [DONUT_HOLE * a1.cos(), DONUT_HOLE * a1.sin()],
                [DONUT_HOLE * a0.cos(), DONUT_HOLE * a0.sin()],
            ]
        })
        .collect()
}

/// Numbered "group – value" list under a chart, with share % for donuts.
fn ranking_list(ui: &mut Ui, result: &AggregationResult, donut: Option<(&[Color32], f64)>) {
    for (i, (group, value)) in result.entries.iter().enumerate() {
        let mut text = format!("{}. {group}  –  {}", i + 1, format_grouped(*value, 2));
        let mut colour = None;
        if let Some((colours, total)) = donut {
            if total > 0.0 {
                text.push_str(&format!("  ({:.1}%)", value / total * 100.0));
            }
            colour = colours.get(i).copied();
        }
        let rich = RichText::new(text);
        ui.label(match colour {
            Some(c) => rich.color(c),
            None => rich,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_circle_is_split_into_small_segments() {
        let segments = slice_segments(0.0, -TAU);
        assert_eq!(segments.len(), 180);
        assert!(segments.iter().all(|quad| quad.len() == 4));
    }

    #[test]
    fn tiny_slice_still_gets_one_segment() {
        assert_eq!(slice_segments(1.0, 1.0).len(), 1);
    }
}
