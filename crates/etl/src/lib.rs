pub mod connector;
pub mod pipeline;

pub use connector::{Connector, ExtractionError, JsonFileConnector};
pub use pipeline::{Pipeline, RunReport};
