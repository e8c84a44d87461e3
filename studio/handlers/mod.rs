pub mod epoch_sse;
pub mod train_sse;
pub mod tags;
