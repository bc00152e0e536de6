use crate::ExportError;
use analysis_core::PricePoint;
use chrono::Duration;
use plotters::prelude::*;

const WIDTH: u32 = 900;
const HEIGHT: u32 = 420;
const LINE_COLOR: RGBColor = RGBColor(0x1f, 0x77, 0xb4);
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Render closing prices as an SVG line chart.
///
/// The x axis counts days from the first point and is labelled with dates.
pub fn render_price_chart(title: &str, points: &[PricePoint]) -> Result<String, ExportError> {
    let Some(first) = points.first() else {
        return Err(ExportError::EmptySeries);
    };
    let start = first.timestamp;

    let series: Vec<(f64, f64)> = points
        .iter()
        .map(|p| {
            let offset = (p.timestamp - start).num_seconds() as f64 / SECONDS_PER_DAY;
            (offset, p.close)
        })
        .collect();

    let x_end = series.iter().map(|(x, _)| *x).fold(0.0_f64, f64::max).max(1.0);
    let (low, high) = series
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), (_, y)| (lo.min(*y), hi.max(*y)));
    let pad = ((high - low) * 0.05).max(0.5);

    let date_label = |x: &f64| {
        let at = start + Duration::seconds((x * SECONDS_PER_DAY) as i64);
        at.format("%Y-%m-%d").to_string()
    };

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(60)
            .build_cartesian_2d(0.0..x_end, (low - pad)..(high + pad))
            .map_err(chart_error)?;

        chart
            .configure_mesh()
            .x_labels(6)
            .x_label_formatter(&date_label)
            .y_desc("Price (USD)")
            .draw()
            .map_err(chart_error)?;

        chart
            .draw_series(LineSeries::new(
                series.iter().copied(),
                LINE_COLOR.stroke_width(2),
            ))
            .map_err(chart_error)?;

        root.present().map_err(chart_error)?;
    }

    tracing::debug!("Rendered chart '{}' with {} points", title, points.len());
    Ok(svg)
}

fn chart_error<E: std::fmt::Display>(e: E) -> ExportError {
    ExportError::Chart(e.to_string())
}
