pub mod errors;
pub mod report;
pub mod service;

pub use errors::LoadError;
pub use report::{Collection, CollectionReport, Counts, LoadReport};
pub use service::Loader;
