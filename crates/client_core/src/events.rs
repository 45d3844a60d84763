//! User actions forwarded from presentation views to the controllers.

use std::path::PathBuf;

use shared::domain::{Category, ProductId};

use crate::form::DraftField;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogEvent {
    Mount,
    NextPage,
    PreviousPage,
    Retry,
    Search(String),
    RequestDelete(ProductId),
    ConfirmDelete,
    CancelDelete,
    DismissBanner,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    /// Free-text input for title, price, description, or image URL.
    FieldChanged { field: DraftField, value: String },
    CategorySelected(Category),
    ImageFileSelected(PathBuf),
    Submit,
    DismissSubmitError,
}
