pub mod cleaning;
pub mod columns;
pub mod estimate;
pub mod etl;
pub mod geo;
pub mod pipeline;
pub mod provider;
pub mod stats;

pub use crate::domain::model::{FareReport, ProviderStats, RawTable, TripRecord};
pub use crate::domain::ports::{Pipeline, Storage};
pub use crate::utils::error::Result;
