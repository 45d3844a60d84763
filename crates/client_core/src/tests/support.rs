//! In-memory gateway double shared by controller tests.

use std::sync::Mutex;

use async_trait::async_trait;
use shared::{
    domain::{Category, ProductId},
    error::GatewayError,
    protocol::{Product, ProductCategory, ProductInput},
};

use crate::gateway::ProductGateway;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum GatewayCall {
    List { limit: usize, offset: usize },
    GetById(ProductId),
    Create(ProductInput),
    Update(ProductId, ProductInput),
    Delete(ProductId),
}

#[derive(Default)]
pub(crate) struct FakeGateway {
    products: Mutex<Vec<Product>>,
    calls: Mutex<Vec<GatewayCall>>,
    list_error: Mutex<Option<GatewayError>>,
    delete_error: Mutex<Option<GatewayError>>,
    save_error: Mutex<Option<GatewayError>>,
}

impl FakeGateway {
    pub(crate) fn with_products(products: Vec<Product>) -> Self {
        Self {
            products: Mutex::new(products),
            ..Self::default()
        }
    }

    pub(crate) fn fail_list(&self, err: Option<GatewayError>) {
        *self.list_error.lock().expect("lock") = err;
    }

    pub(crate) fn fail_delete(&self, err: Option<GatewayError>) {
        *self.delete_error.lock().expect("lock") = err;
    }

    pub(crate) fn fail_save(&self, err: Option<GatewayError>) {
        *self.save_error.lock().expect("lock") = err;
    }

    pub(crate) fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().expect("lock").clone()
    }

    pub(crate) fn saves(&self) -> Vec<GatewayCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, GatewayCall::Create(_) | GatewayCall::Update(..)))
            .collect()
    }

    pub(crate) fn product_ids(&self) -> Vec<ProductId> {
        self.products
            .lock()
            .expect("lock")
            .iter()
            .map(|p| p.id)
            .collect()
    }

    fn record(&self, call: GatewayCall) {
        self.calls.lock().expect("lock").push(call);
    }
}

#[async_trait]
impl ProductGateway for FakeGateway {
    async fn list(&self, limit: usize, offset: usize) -> Result<Vec<Product>, GatewayError> {
        self.record(GatewayCall::List { limit, offset });
        if let Some(err) = self.list_error.lock().expect("lock").clone() {
            return Err(err);
        }
        Ok(self
            .products
            .lock()
            .expect("lock")
            .iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: ProductId) -> Result<Product, GatewayError> {
        self.record(GatewayCall::GetById(id));
        self.products
            .lock()
            .expect("lock")
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(GatewayError::NotFound(id))
    }

    async fn create(&self, input: &ProductInput) -> Result<Product, GatewayError> {
        self.record(GatewayCall::Create(input.clone()));
        if let Some(err) = self.save_error.lock().expect("lock").clone() {
            return Err(err);
        }
        let mut products = self.products.lock().expect("lock");
        let next_id = products.iter().map(|p| p.id.0).max().unwrap_or(0) + 1;
        let product = product_from_input(ProductId(next_id), input);
        products.push(product.clone());
        Ok(product)
    }

    async fn update(&self, id: ProductId, input: &ProductInput) -> Result<Product, GatewayError> {
        self.record(GatewayCall::Update(id, input.clone()));
        if let Some(err) = self.save_error.lock().expect("lock").clone() {
            return Err(err);
        }
        let mut products = self.products.lock().expect("lock");
        let slot = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(GatewayError::NotFound(id))?;
        *slot = product_from_input(id, input);
        Ok(slot.clone())
    }

    async fn delete(&self, id: ProductId) -> Result<(), GatewayError> {
        self.record(GatewayCall::Delete(id));
        if let Some(err) = self.delete_error.lock().expect("lock").clone() {
            return Err(err);
        }
        self.products.lock().expect("lock").retain(|p| p.id != id);
        Ok(())
    }
}

fn product_from_input(id: ProductId, input: &ProductInput) -> Product {
    let category = Category::from_id(input.category_id).unwrap_or_default();
    Product {
        id,
        title: input.title.clone(),
        price: input.price,
        description: input.description.clone(),
        category: Some(ProductCategory {
            id: category.id(),
            name: category.label().to_string(),
            slug: None,
            image: None,
        }),
        images: input.images.clone(),
        slug: None,
        creation_at: None,
        updated_at: None,
    }
}

pub(crate) fn product(id: i64, title: &str, category: Category) -> Product {
    product_from_input(
        ProductId(id),
        &ProductInput {
            title: title.to_string(),
            price: 10.0 + id as f64,
            description: format!("{title} description"),
            category_id: category.id(),
            images: vec![format!("https://placehold.co/600x400?id={id}")],
        },
    )
}

pub(crate) fn numbered_products(count: i64) -> Vec<Product> {
    (1..=count)
        .map(|id| product(id, &format!("Product {id}"), Category::Miscellaneous))
        .collect()
}
