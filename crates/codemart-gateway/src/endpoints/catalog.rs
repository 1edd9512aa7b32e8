//! Products and categories.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use codemart_core::{Category, Product};

use crate::api::CatalogGateway;
use crate::client::{take_list, take_object, GatewayClient};
use crate::error::GatewayResult;

/// Query for `GET /products`. Unset fields are omitted from the URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Category slug.
    pub category: Option<String>,
    pub search: Option<String>,
    pub per_page: Option<u32>,
    pub page: Option<u32>,
}

impl ProductFilter {
    pub fn category(mut self, slug: impl Into<String>) -> Self {
        self.category = Some(slug.into());
        self
    }

    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search = Some(query.into());
        self
    }

    pub fn page(mut self, page: u32, per_page: u32) -> Self {
        self.page = Some(page);
        self.per_page = Some(per_page);
        self
    }

    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(category) = self.category.as_deref().filter(|c| !c.is_empty()) {
            pairs.push(("category", category.to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        if let Some(per_page) = self.per_page {
            pairs.push(("per_page", per_page.to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }
        pairs
    }
}

/// How a single product is addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductLookup {
    Id(u64),
    Slug(String),
}

impl ProductLookup {
    /// Numeric input is an id, anything else a slug.
    pub fn parse(input: &str) -> Self {
        match input.trim().parse::<u64>() {
            Ok(id) => ProductLookup::Id(id),
            Err(_) => ProductLookup::Slug(input.trim().to_string()),
        }
    }
}

#[async_trait]
impl CatalogGateway for GatewayClient {
    async fn list_products(&self, filter: &ProductFilter) -> GatewayResult<Vec<Product>> {
        let value: Value = self.get_json(&["products"], &filter.query_pairs()).await?;
        let products: Vec<Product> = take_list(value, "products")?;
        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    async fn product(&self, lookup: &ProductLookup, with_variations: bool) -> GatewayResult<Product> {
        let query = if with_variations {
            vec![("include_variations", "true".to_string())]
        } else {
            Vec::new()
        };

        let id;
        let segments: Vec<&str> = match lookup {
            ProductLookup::Id(product_id) => {
                id = product_id.to_string();
                vec!["products", id.as_str()]
            }
            ProductLookup::Slug(slug) => vec!["products", "slug", slug.as_str()],
        };

        let value: Value = self.get_json(&segments, &query).await?;
        take_object(value, "product")
    }

    async fn categories(&self) -> GatewayResult<Vec<Category>> {
        let value: Value = self.get_json(&["categories"], &[]).await?;
        take_list(value, "categories")
    }
}
