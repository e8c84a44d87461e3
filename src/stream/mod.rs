pub mod sse;
pub mod event;
pub mod notice;
pub mod subscriber;
pub mod transport;

pub use sse::{SseDecoder, SseEvent};
pub use event::{ModelId, StreamEvent};
pub use notice::{LogNotifier, Notifier, TrainNotice};
pub use subscriber::{ConnectionState, LiveUpdateSubscriber, Outcome};
pub use transport::{ChannelEvent, ChannelMessage, EventSource, EventSourceConfig};
