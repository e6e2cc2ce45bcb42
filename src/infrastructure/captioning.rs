pub mod generator;
pub mod http_model;
pub mod model;
