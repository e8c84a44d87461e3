pub mod sink;
pub mod svg;

pub use sink::{ChartHandle, RenderSink};
pub use svg::SvgChart;
