pub mod error;
pub mod config;
pub mod series;
pub mod chart;
pub mod stream;
pub mod session;
pub mod tags;

// Convenience re-exports
pub use error::{DashError, Result};
pub use config::DashConfig;
pub use series::{Column, EpochRecord, SeriesStore};
pub use chart::{ChartHandle, RenderSink, SvgChart};
pub use stream::{ConnectionState, LiveUpdateSubscriber, ModelId, Outcome, StreamEvent};
pub use session::DashboardSession;
