use std::path::PathBuf;

use tracing::debug;

use crate::chart::sink::{ChartHandle, RenderSink};
use crate::error::{DashError, Result};
use crate::series::Column;

const PALETTE: [&str; 6] = ["#dc2626", "#1e40af", "#16a34a", "#d97706", "#7c3aed", "#0891b2"];

/// Render sink that paints each column set as an SVG line chart.
///
/// Every `generate`/`load` re-renders the whole chart from the full column
/// set. When an output path is set the SVG is written there as well.
pub struct SvgChart {
    width:  f64,
    height: f64,
    output: Option<PathBuf>,
    charts: Vec<String>,
}

impl SvgChart {
    pub fn new(width: u32, height: u32) -> Self {
        SvgChart {
            width:  width.max(120) as f64,
            height: height.max(80) as f64,
            output: None,
            charts: Vec::new(),
        }
    }

    /// Also writes every render to `path`.
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Last SVG rendered for `handle`.
    pub fn svg(&self, handle: ChartHandle) -> Option<&str> {
        self.charts.get(handle.0 as usize).map(String::as_str)
    }

    fn publish(&mut self, idx: usize, svg: String) -> Result<()> {
        if let Some(path) = &self.output {
            std::fs::write(path, &svg)?;
            debug!(path = %path.display(), "chart written");
        }
        self.charts[idx] = svg;
        Ok(())
    }
}

impl Default for SvgChart {
    fn default() -> Self {
        SvgChart::new(760, 220)
    }
}

impl RenderSink for SvgChart {
    fn generate(&mut self, columns: &[Column]) -> Result<ChartHandle> {
        let svg = render_svg(columns, self.width, self.height);
        self.charts.push(String::new());
        let idx = self.charts.len() - 1;
        self.publish(idx, svg)?;
        Ok(ChartHandle(idx as u64))
    }

    fn load(&mut self, handle: ChartHandle, columns: &[Column]) -> Result<()> {
        let idx = handle.0 as usize;
        if idx >= self.charts.len() {
            return Err(DashError::Invariant(format!("unknown chart handle {}", handle.0)));
        }
        let svg = render_svg(columns, self.width, self.height);
        self.publish(idx, svg)
    }
}

// ---------------------------------------------------------------------------
// SVG line chart
// ---------------------------------------------------------------------------

/// Renders the column set as one path per series on a shared y-range.
/// Absent values break the line instead of dropping to zero.
pub fn render_svg(columns: &[Column], w: f64, h: f64) -> String {
    let pad_l = 60.0f64;
    let pad_r = 16.0f64;
    let pad_t = 24.0f64;
    let pad_b = 30.0f64;

    let n = columns.iter().map(Column::len).max().unwrap_or(0);
    let values: Vec<f64> = columns.iter()
        .flat_map(|c| c.values.iter().flatten().copied())
        .filter(|v| v.is_finite())
        .collect();

    if n == 0 || values.is_empty() {
        return format!(
            "<svg class=\"epoch-chart\" width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n\
             <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" fill=\"#999\" font-size=\"12\">no epochs yet</text>\n\
             </svg>",
            w, h, w / 2.0, h / 2.0
        );
    }

    let raw_min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let raw_max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let span    = (raw_max - raw_min).abs().max(1e-12);
    let min_y   = if raw_min >= 0.0 { 0.0 } else { raw_min - span * 0.05 };
    let max_y   = raw_max + span * 0.05;

    let px = |i: usize, v: f64| -> (f64, f64) {
        let frac = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.5 };
        let x = pad_l + frac * (w - pad_l - pad_r);
        let y = pad_t + (max_y - v) / (max_y - min_y + 1e-12) * (h - pad_t - pad_b);
        (x, y)
    };

    // Y axis labels.
    let grey_grid = "#f0f2f5";
    let grey_text = "#999";
    let y_labels: String = (0..=4).map(|g| {
        let frac = g as f64 / 4.0;
        let val  = min_y + (max_y - min_y) * frac;
        let y    = pad_t + (1.0 - frac) * (h - pad_t - pad_b);
        format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\" fill=\"{}\" font-size=\"10\">{:.3}</text>\n\
             <line x1=\"{:.1}\" y1=\"{:.1}\" x2=\"{:.1}\" y2=\"{:.1}\" stroke=\"{}\" stroke-width=\"1\"/>",
            pad_l - 4.0, y + 4.0, grey_text, val,
            pad_l, y, w - pad_r, y, grey_grid
        )
    }).collect::<Vec<_>>().join("\n");

    // X axis labels (1-based epochs).
    let mut ticks = vec![0, n / 2, n - 1];
    ticks.dedup();
    let x_labels: String = ticks.iter().map(|&i| {
        let (x, _) = px(i, min_y);
        format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" fill=\"{}\" font-size=\"10\">{}</text>",
            x, h - 4.0, grey_text, i + 1
        )
    }).collect::<Vec<_>>().join("\n");

    let mut paths  = Vec::with_capacity(columns.len());
    let mut legend = Vec::with_capacity(columns.len());
    for (ci, col) in columns.iter().enumerate() {
        let colour = PALETTE[ci % PALETTE.len()];

        let mut d = String::new();
        let mut pen_down = false;
        for (i, v) in col.values.iter().enumerate() {
            match v {
                Some(v) if v.is_finite() => {
                    let (x, y) = px(i, *v);
                    let op = if pen_down { 'L' } else { 'M' };
                    if !d.is_empty() { d.push(' '); }
                    d.push_str(&format!("{}{:.1},{:.1}", op, x, y));
                    pen_down = true;
                }
                _ => pen_down = false,
            }
        }
        if !d.is_empty() {
            paths.push(format!(
                "<path class=\"series\" data-metric=\"{}\" d=\"{}\" stroke=\"{}\" stroke-width=\"2\" fill=\"none\"/>",
                xml_escape(&col.name), d, colour
            ));
        }

        let lx = pad_l + ci as f64 * 110.0;
        legend.push(format!(
            "<rect x=\"{:.1}\" y=\"6\" width=\"18\" height=\"4\" fill=\"{}\"/>\n\
             <text x=\"{:.1}\" y=\"12\" fill=\"#333\" font-size=\"10\">{}</text>",
            lx, colour, lx + 22.0, xml_escape(&col.name)
        ));
    }

    format!(
        "<svg class=\"epoch-chart\" width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n\
         {}\n{}\n{}\n\
         <!-- Legend -->\n\
         {}\n\
         </svg>",
        w, h,
        y_labels, x_labels,
        paths.join("\n"),
        legend.join("\n"),
    )
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
