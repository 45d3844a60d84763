//! Form controller: single-product draft, validation, and create/update
//! submission.

use std::{collections::BTreeMap, path::Path, sync::Arc};

use shared::{
    domain::{Category, ProductId},
    error::{ErrorKind, GatewayError},
    protocol::{Product, ProductInput},
};
use tracing::{info, warn};

use crate::{
    config::Settings,
    events::FormEvent,
    gateway::ProductGateway,
    image::{read_image_file, ImageSource},
};

pub const PLACEHOLDER_IMAGE: &str = "https://placehold.co/600x400";
pub const LOAD_FAILED_MESSAGE: &str =
    "Failed to load product details. It might have been deleted.";
pub const SUBMIT_FAILED_MESSAGE: &str = "Failed to save product. Please try again.";
pub const SAVE_NOT_FOUND_MESSAGE: &str =
    "This product no longer exists. It may have been deleted.";

pub const TITLE_REQUIRED: &str = "title required";
pub const PRICE_INVALID: &str = "price must be > 0";
pub const DESCRIPTION_REQUIRED: &str = "description required";
pub const IMAGE_REQUIRED: &str = "image required";
pub const TITLE_TAKEN: &str = "title already exists";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(ProductId),
}

/// Error map keys. `Submit` carries non-field failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DraftField {
    Title,
    Price,
    Category,
    Description,
    Image,
    Submit,
}

impl DraftField {
    pub fn label(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Price => "price",
            Self::Category => "category",
            Self::Description => "description",
            Self::Image => "image",
            Self::Submit => "submit",
        }
    }
}

pub type FieldErrors = BTreeMap<DraftField, String>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Draft {
    pub title: String,
    /// Raw price input; parsed during validation and normalization.
    pub price: String,
    pub category: Category,
    pub description: String,
    pub image: Option<String>,
    pub image_source: Option<ImageSource>,
}

impl Draft {
    pub fn from_product(product: &Product) -> Self {
        let image = product.images.first().cloned();
        Self {
            title: product.title.clone(),
            price: if product.price > 0.0 {
                product.price.to_string()
            } else {
                String::new()
            },
            category: product.category_or_default(),
            description: product.description.clone(),
            image_source: image.as_deref().map(ImageSource::for_reference),
            image,
        }
    }

    pub fn images(&self) -> Vec<String> {
        self.image.iter().cloned().collect()
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// Saved remotely; the caller navigates away.
    Saved(Product),
    Invalid,
    Failed(GatewayError),
    Busy,
}

pub fn parse_price(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn normalized_title(title: &str) -> String {
    title.trim().to_lowercase()
}

pub struct FormController {
    gateway: Arc<dyn ProductGateway>,
    mode: FormMode,
    draft: Draft,
    errors: FieldErrors,
    submitting: bool,
    uniqueness_batch: usize,
    max_image_bytes: usize,
}

impl FormController {
    pub fn create(gateway: Arc<dyn ProductGateway>) -> Self {
        Self::with_draft(gateway, FormMode::Create, Draft::default())
    }

    pub fn edit(gateway: Arc<dyn ProductGateway>, product: &Product) -> Self {
        Self::with_draft(
            gateway,
            FormMode::Edit(product.id),
            Draft::from_product(product),
        )
    }

    pub async fn load_for_edit(
        gateway: Arc<dyn ProductGateway>,
        id: ProductId,
    ) -> Result<Self, GatewayError> {
        let product = gateway.get_by_id(id).await.map_err(|err| {
            warn!(product_id = id.0, "failed to load product for editing: {err}");
            err
        })?;
        Ok(Self::edit(gateway, &product))
    }

    fn with_draft(gateway: Arc<dyn ProductGateway>, mode: FormMode, draft: Draft) -> Self {
        let defaults = Settings::default();
        Self {
            gateway,
            mode,
            draft,
            errors: FieldErrors::new(),
            submitting: false,
            uniqueness_batch: defaults.uniqueness_batch,
            max_image_bytes: defaults.max_image_bytes,
        }
    }

    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.uniqueness_batch = settings.uniqueness_batch.max(1);
        self.max_image_bytes = settings.max_image_bytes;
        self
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn error(&self, field: DraftField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn set_title(&mut self, value: impl Into<String>) {
        self.draft.title = value.into();
        self.errors.remove(&DraftField::Title);
    }

    pub fn set_price(&mut self, value: impl Into<String>) {
        self.draft.price = value.into();
        self.errors.remove(&DraftField::Price);
    }

    pub fn set_description(&mut self, value: impl Into<String>) {
        self.draft.description = value.into();
        self.errors.remove(&DraftField::Description);
    }

    pub fn select_category(&mut self, category: Category) {
        self.draft.category = category;
        self.errors.remove(&DraftField::Category);
    }

    pub fn set_image_url(&mut self, url: impl Into<String>) {
        self.draft.image = Some(url.into());
        self.draft.image_source = Some(ImageSource::Url);
        self.errors.remove(&DraftField::Image);
    }

    /// Embeds a local file as the draft's image. A failed read leaves the
    /// current image in place and reports on the image field.
    pub async fn attach_image_file(&mut self, path: &Path) -> bool {
        match read_image_file(path, self.max_image_bytes).await {
            Ok(image) => {
                self.draft.image = Some(image.data_url);
                self.draft.image_source = Some(ImageSource::EmbeddedFile {
                    filename: Some(image.filename),
                });
                self.errors.remove(&DraftField::Image);
                true
            }
            Err(err) => {
                warn!("failed to embed image file: {err}");
                self.errors.insert(DraftField::Image, err.to_string());
                false
            }
        }
    }

    pub fn set_field(&mut self, field: DraftField, value: impl Into<String>) {
        let value = value.into();
        match field {
            DraftField::Title => self.set_title(value),
            DraftField::Price => self.set_price(value),
            DraftField::Description => self.set_description(value),
            DraftField::Image => self.set_image_url(value),
            DraftField::Category => match value
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(Category::from_id)
            {
                Some(category) => self.select_category(category),
                None => warn!(%value, "ignoring unknown category"),
            },
            DraftField::Submit => {}
        }
    }

    pub fn dismiss_submit_error(&mut self) {
        self.errors.remove(&DraftField::Submit);
    }

    /// Required-field checks that need no network access.
    pub fn validate_local(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if self.draft.title.trim().is_empty() {
            errors.insert(DraftField::Title, TITLE_REQUIRED.to_string());
        }
        if !parse_price(&self.draft.price).is_some_and(|price| price > 0.0) {
            errors.insert(DraftField::Price, PRICE_INVALID.to_string());
        }
        if self.draft.description.trim().is_empty() {
            errors.insert(DraftField::Description, DESCRIPTION_REQUIRED.to_string());
        }
        if self
            .draft
            .image
            .as_deref()
            .map_or(true, |image| image.trim().is_empty())
        {
            errors.insert(DraftField::Image, IMAGE_REQUIRED.to_string());
        }
        errors
    }

    /// Scans one bounded batch of remote products for a title collision.
    /// Gateway failures skip the check rather than block the save.
    pub async fn check_title_unique(&self) -> Option<String> {
        let wanted = normalized_title(&self.draft.title);
        let editing = match self.mode {
            FormMode::Edit(id) => Some(id),
            FormMode::Create => None,
        };

        match self.gateway.list(self.uniqueness_batch, 0).await {
            Ok(products) => products
                .iter()
                .any(|p| Some(p.id) != editing && normalized_title(&p.title) == wanted)
                .then(|| TITLE_TAKEN.to_string()),
            Err(err) => {
                warn!("title uniqueness check skipped: {err}");
                None
            }
        }
    }

    pub async fn validate(&mut self) -> bool {
        let mut errors = self.validate_local();
        if !errors.contains_key(&DraftField::Title) {
            if let Some(message) = self.check_title_unique().await {
                errors.insert(DraftField::Title, message);
            }
        }
        self.errors = errors;
        self.errors.is_empty()
    }

    pub fn normalize(&self) -> ProductInput {
        let images = self
            .draft
            .image
            .as_deref()
            .map(str::trim)
            .filter(|image| !image.is_empty())
            .map(|image| vec![image.to_string()])
            .unwrap_or_else(|| vec![PLACEHOLDER_IMAGE.to_string()]);

        ProductInput {
            title: self.draft.title.trim().to_string(),
            price: parse_price(&self.draft.price).unwrap_or(0.0),
            description: self.draft.description.trim().to_string(),
            category_id: self.draft.category.id(),
            images,
        }
    }

    /// Marks the form busy and returns the payload, or `None` while a
    /// previous submission is still outstanding.
    pub fn begin_submit(&mut self) -> Option<ProductInput> {
        if self.submitting {
            return None;
        }
        self.submitting = true;
        self.errors.remove(&DraftField::Submit);
        Some(self.normalize())
    }

    pub fn finish_submit(&mut self, result: Result<Product, GatewayError>) -> SubmitOutcome {
        self.submitting = false;
        match result {
            Ok(product) => {
                info!(product_id = product.id.0, mode = ?self.mode, "product saved");
                SubmitOutcome::Saved(product)
            }
            Err(err) => {
                warn!(mode = ?self.mode, "failed to save product: {err}");
                let message = match err.kind() {
                    ErrorKind::NotFound => SAVE_NOT_FOUND_MESSAGE.to_string(),
                    ErrorKind::Network | ErrorKind::Server => SUBMIT_FAILED_MESSAGE.to_string(),
                };
                self.errors.insert(DraftField::Submit, message);
                SubmitOutcome::Failed(err)
            }
        }
    }

    pub async fn submit(&mut self) -> SubmitOutcome {
        if self.submitting {
            return SubmitOutcome::Busy;
        }
        if !self.validate().await {
            return SubmitOutcome::Invalid;
        }
        let Some(input) = self.begin_submit() else {
            return SubmitOutcome::Busy;
        };

        let result = match self.mode {
            FormMode::Create => self.gateway.create(&input).await,
            FormMode::Edit(id) => self.gateway.update(id, &input).await,
        };
        self.finish_submit(result)
    }

    /// Applies one view event. Only `Submit` yields an outcome.
    pub async fn dispatch(&mut self, event: FormEvent) -> Option<SubmitOutcome> {
        match event {
            FormEvent::FieldChanged { field, value } => self.set_field(field, value),
            FormEvent::CategorySelected(category) => self.select_category(category),
            FormEvent::ImageFileSelected(path) => {
                self.attach_image_file(&path).await;
            }
            FormEvent::Submit => return Some(self.submit().await),
            FormEvent::DismissSubmitError => self.dismiss_submit_error(),
        }
        None
    }
}

#[cfg(test)]
#[path = "tests/form_tests.rs"]
mod tests;
