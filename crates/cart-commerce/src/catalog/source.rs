//! Where product records and stock levels come from.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use cart_data::{FetchClient, FetchError};

use crate::catalog::{Product, Stock};
use crate::ids::ProductId;

/// Read-only product and stock lookups.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the product record for `id`.
    async fn product(&self, id: ProductId) -> Result<Product, FetchError>;

    /// Fetch the current stock level for `id`.
    async fn stock(&self, id: ProductId) -> Result<Stock, FetchError>;
}

/// Catalog served over HTTP.
///
/// Expects `GET /products/{id}` and `GET /stock/{id}` relative to the
/// client's base URL. Non-2xx answers, a 404 included, are errors.
#[derive(Debug, Clone)]
pub struct RestCatalog {
    client: FetchClient,
}

impl RestCatalog {
    /// Create a catalog over a configured client.
    pub fn new(client: FetchClient) -> Self {
        Self { client }
    }

    /// Path of a product record.
    pub fn product_path(id: ProductId) -> String {
        format!("/products/{}", id)
    }

    /// Path of a stock level.
    pub fn stock_path(id: ProductId) -> String {
        format!("/stock/{}", id)
    }
}

#[async_trait]
impl CatalogSource for RestCatalog {
    async fn product(&self, id: ProductId) -> Result<Product, FetchError> {
        self.client
            .get(Self::product_path(id))
            .accept("application/json")
            .send()
            .await?
            .error_for_status()?
            .json()
    }

    async fn stock(&self, id: ProductId) -> Result<Stock, FetchError> {
        self.client
            .get(Self::stock_path(id))
            .accept("application/json")
            .send()
            .await?
            .error_for_status()?
            .json()
    }
}

/// In-memory catalog for development and testing.
///
/// Unknown ids answer like a REST catalog would: HTTP 404.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    products: Mutex<HashMap<ProductId, Product>>,
    stock: Mutex<HashMap<ProductId, i64>>,
}

impl InMemoryCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product with its stock level.
    pub fn with_product(self, product: Product, stock: i64) -> Self {
        self.insert(product, stock);
        self
    }

    /// Add or replace a product with its stock level.
    pub fn insert(&self, product: Product, stock: i64) {
        let id = product.id;
        self.products
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, product);
        self.set_stock(id, stock);
    }

    /// Change the stock level of a product.
    pub fn set_stock(&self, id: ProductId, amount: i64) {
        self.stock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, amount);
    }

    /// Drop the stock record of a product, so lookups answer 404.
    pub fn remove_stock(&self, id: ProductId) {
        self.stock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }
}

fn not_found(path: String) -> FetchError {
    FetchError::HttpError {
        status: 404,
        message: format!("{} not found", path),
    }
}

#[async_trait]
impl CatalogSource for InMemoryCatalog {
    async fn product(&self, id: ProductId) -> Result<Product, FetchError> {
        self.products
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(RestCatalog::product_path(id)))
    }

    async fn stock(&self, id: ProductId) -> Result<Stock, FetchError> {
        self.stock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .map(|amount| Stock::new(id, *amount))
            .ok_or_else(|| not_found(RestCatalog::stock_path(id)))
    }
}
