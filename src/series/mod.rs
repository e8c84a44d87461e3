pub mod epoch_record;
pub mod column;
pub mod store;
pub mod bootstrap;

pub use epoch_record::EpochRecord;
pub use column::Column;
pub use store::SeriesStore;
pub use bootstrap::load_epochs;
