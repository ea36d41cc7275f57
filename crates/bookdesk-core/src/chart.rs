// Overview chart geometry: views as a line with a filled area, downloads
// as bars, both scaled against the same maximum. Renders to SVG or to a
// one-line terminal sparkline.

use std::fmt::Write as _;

use bookdesk_api::OverviewPoint;

pub const HEIGHT: f64 = 300.0;
pub const PADDING: f64 = 24.0;
pub const MIN_WIDTH: f64 = 320.0;
pub const DEFAULT_WIDTH: f64 = 640.0;
pub const VIEWS_COLOR: &str = "#3b82f6";
pub const DOWNLOADS_COLOR: &str = "#10b981";
const BAR_RADIUS: f64 = 3.0;

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Chart width for a container of `container` pixels.
pub fn chart_width(container: Option<f64>) -> f64 {
    container.map_or(DEFAULT_WIDTH, |w| (w - 16.0).max(MIN_WIDTH))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// What the chart area shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartState {
    Loading,
    Empty,
    Ready(ChartGeometry),
}

impl ChartState {
    pub fn new(loading: bool, points: &[OverviewPoint], width: f64) -> Self {
        if loading {
            Self::Loading
        } else {
            ChartGeometry::compute(points, width).map_or(Self::Empty, Self::Ready)
        }
    }

    /// Placeholder text for the non-ready states.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::Loading => Some("Loading chart..."),
            Self::Empty => Some("No data"),
            Self::Ready(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartGeometry {
    pub width: f64,
    pub height: f64,
    pub step: f64,
    /// Largest value across both series; 1 when everything is zero.
    pub max: u64,
    pub views: Vec<(f64, f64)>,
    pub line_path: String,
    /// Only present with at least two points.
    pub area_path: Option<String>,
    pub bars: Vec<Bar>,
}

impl ChartGeometry {
    /// `None` for an empty series.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn compute(points: &[OverviewPoint], width: f64) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let n = points.len();
        let height = HEIGHT;
        let step = if n > 1 {
            (width - 2.0 * PADDING) / (n - 1) as f64
        } else {
            0.0
        };
        let max = points
            .iter()
            .map(|p| p.views.max(p.downloads))
            .max()
            .filter(|m| *m > 0)
            .unwrap_or(1);

        let x = |i: usize| PADDING + i as f64 * step;
        let y = |v: u64| height - PADDING - ((height - 2.0 * PADDING) * v as f64) / max as f64;
        let baseline = height - PADDING;

        let views: Vec<(f64, f64)> = points
            .iter()
            .enumerate()
            .map(|(i, p)| (x(i), y(p.views)))
            .collect();

        let mut line_path = String::new();
        for (i, (px, py)) in views.iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            if i > 0 {
                line_path.push(' ');
            }
            let _ = write!(line_path, "{cmd}{px:.2},{py:.2}");
        }

        let area_path = match (views.first(), views.last()) {
            (Some((first_x, _)), Some((last_x, _))) if n > 1 => Some(format!(
                "{line_path} L{last_x:.2},{baseline:.2} L{first_x:.2},{baseline:.2} Z"
            )),
            _ => None,
        };

        let bar_width = (0.6 * step).max(4.0);
        let bars = points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let top = y(p.downloads);
                Bar {
                    x: x(i) - bar_width / 2.0,
                    y: top,
                    width: bar_width,
                    height: baseline - top,
                }
            })
            .collect();

        Some(Self {
            width,
            height,
            step,
            max,
            views,
            line_path,
            area_path,
            bars,
        })
    }

    /// Standalone SVG document.
    pub fn to_svg(&self) -> String {
        let (w, h) = (self.width, self.height);
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}">"#
        );
        svg.push('\n');
        for bar in &self.bars {
            let _ = writeln!(
                svg,
                r#"  <rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" rx="{BAR_RADIUS}" fill="{DOWNLOADS_COLOR}" opacity="0.8"/>"#,
                bar.x, bar.y, bar.width, bar.height
            );
        }
        if let Some(area) = &self.area_path {
            let _ = writeln!(svg, r#"  <path d="{area}" fill="{VIEWS_COLOR}" opacity="0.15"/>"#);
        }
        let _ = writeln!(
            svg,
            r#"  <path d="{}" fill="none" stroke="{VIEWS_COLOR}" stroke-width="2"/>"#,
            self.line_path
        );
        svg.push_str("</svg>\n");
        svg
    }
}

/// One block character per value, scaled to the series maximum.
#[allow(clippy::cast_precision_loss, clippy::as_conversions, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn sparkline(values: &[u64]) -> String {
    let max = values.iter().copied().max().unwrap_or(0);
    if max == 0 {
        return SPARK_LEVELS[0].to_string().repeat(values.len());
    }
    let top = (SPARK_LEVELS.len() - 1) as f64;
    values
        .iter()
        .map(|v| {
            let level = ((*v as f64 / max as f64) * top).round() as usize;
            SPARK_LEVELS[level.min(SPARK_LEVELS.len() - 1)]
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn point(views: u64, downloads: u64) -> OverviewPoint {
        OverviewPoint {
            date: None,
            views,
            downloads,
        }
    }

    #[test]
    fn width_has_a_floor() {
        assert!((chart_width(None) - 640.0).abs() < f64::EPSILON);
        assert!((chart_width(Some(200.0)) - 320.0).abs() < f64::EPSILON);
        assert!((chart_width(Some(816.0)) - 800.0).abs() < f64::EPSILON);
    }

    #[test]
    fn geometry_scales_against_shared_maximum() {
        let chart = ChartGeometry::compute(&[point(10, 0), point(0, 20), point(5, 5)], 640.0).unwrap();
        assert_eq!(chart.max, 20);
        assert!((chart.step - 296.0).abs() < 1e-9);
        // views[0] = 10 of 20 sits halfway between padding and baseline.
        assert!((chart.views[0].1 - 150.0).abs() < 1e-9);
        assert!(chart.line_path.starts_with("M24.00,150.00 L320.00,276.00"));
        assert!(chart.area_path.as_ref().unwrap().ends_with("L24.00,276.00 Z"));
        // Bars are 0.6 * step wide and centred on their x.
        assert!((chart.bars[1].width - 177.6).abs() < 1e-9);
        assert!((chart.bars[1].height - 252.0).abs() < 1e-9);
    }

    #[test]
    fn single_point_has_no_area_and_minimum_bar() {
        let chart = ChartGeometry::compute(&[point(0, 0)], 640.0).unwrap();
        assert_eq!(chart.max, 1);
        assert!(chart.area_path.is_none());
        assert!((chart.bars[0].width - 4.0).abs() < f64::EPSILON);
        assert!(chart.to_svg().contains(VIEWS_COLOR));
    }

    #[test]
    fn chart_states() {
        assert_eq!(ChartState::new(true, &[], 640.0).message(), Some("Loading chart..."));
        assert_eq!(ChartState::new(false, &[], 640.0).message(), Some("No data"));
        assert!(ChartState::new(false, &[point(1, 1)], 640.0).message().is_none());
    }

    #[test]
    fn sparkline_levels() {
        assert_eq!(sparkline(&[0, 4, 8]), "▁▅█");
        assert_eq!(sparkline(&[0, 0]), "▁▁");
        assert_eq!(sparkline(&[]), "");
    }
}
