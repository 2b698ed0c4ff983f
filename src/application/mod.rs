// Application layer: use cases over a stock store.
// The service owns every write; reporting derives read-only summaries.

pub mod error;
pub mod reporting;
pub mod service;

pub use error::*;
pub use service::*;
