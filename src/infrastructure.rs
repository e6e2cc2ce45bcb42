pub mod captioning;
pub mod metadata;
pub mod utils;
