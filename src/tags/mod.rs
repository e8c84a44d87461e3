pub mod form;
pub mod tag_request;

pub use tag_request::{HttpTagEndpoint, TagAction, TagEndpoint, TagRequest, TagResult, TAGS_PATH};
