#![allow(dead_code)]

use epochline::stream::{ChannelEvent, ChannelMessage, SseEvent};
use epochline::{ChartHandle, Column, EpochRecord, RenderSink, Result};

/// Render sink that remembers every column set it was handed.
#[derive(Default)]
pub struct RecordingSink {
    pub generated: Vec<Vec<Column>>,
    pub loads:     Vec<Vec<Column>>,
}

impl RenderSink for RecordingSink {
    fn generate(&mut self, columns: &[Column]) -> Result<ChartHandle> {
        self.generated.push(columns.to_vec());
        Ok(ChartHandle(self.generated.len() as u64 - 1))
    }

    fn load(&mut self, _handle: ChartHandle, columns: &[Column]) -> Result<()> {
        self.loads.push(columns.to_vec());
        Ok(())
    }
}

pub fn scenario_a() -> Vec<EpochRecord> {
    vec![
        EpochRecord::new().with("loss", 0.9),
        EpochRecord::new().with("loss", 0.5).with("acc", 0.7),
    ]
}

pub fn epoch_msg(data: &str) -> ChannelMessage {
    frame("/subscribe/epoch/end/", "epoch", data)
}

pub fn frame(path: &str, event: &str, data: &str) -> ChannelMessage {
    ChannelMessage {
        path:  path.to_owned(),
        event: ChannelEvent::Event(SseEvent {
            event: event.to_owned(),
            data:  data.to_owned(),
            id:    None,
        }),
    }
}

pub fn lifecycle(path: &str, event: ChannelEvent) -> ChannelMessage {
    ChannelMessage { path: path.to_owned(), event }
}
