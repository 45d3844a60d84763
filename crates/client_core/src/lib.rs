//! Client-side core for the product catalog: the remote gateway plus the
//! catalog and form controllers that presentation layers drive.

pub mod catalog;
pub mod config;
pub mod events;
pub mod form;
pub mod gateway;
pub mod image;

pub use catalog::{filter_products, CatalogController, CatalogPhase, PendingDelete};
pub use config::{load_settings, Settings};
pub use events::{CatalogEvent, FormEvent};
pub use form::{DraftField, FormController, FormMode, SubmitOutcome};
pub use gateway::{HttpProductGateway, ProductGateway};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
