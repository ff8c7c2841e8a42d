pub mod aggregator;
pub mod orchestrator;
pub mod pager;

pub use crate::domain::model::{
    AggregationOutcome, Category, ListingBatch, OutcomeStatus, Report, Subcategory,
    TeacherListing,
};
pub use crate::domain::ports::{
    CatalogSource, ConfigProvider, ListingSource, PricePublisher, Storage,
};
pub use crate::utils::error::Result;
