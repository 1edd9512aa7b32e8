//! Catalog reads.
//!
//! The gateway reports typed errors; here they are logged and turned into
//! empty results so a flaky backend shows an empty shelf, not a failure.

use std::sync::Arc;
use tracing::{debug, warn};

use codemart_core::validation::validate_search_query;
use codemart_core::{Category, Product, ValidationError};
use codemart_gateway::{CatalogGateway, ProductFilter, ProductLookup};

pub struct Catalog {
    gateway: Arc<dyn CatalogGateway>,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog").finish_non_exhaustive()
    }
}

impl Catalog {
    pub fn new(gateway: Arc<dyn CatalogGateway>) -> Self {
        Catalog { gateway }
    }

    /// Lists products. Only an over-long search query is an error.
    pub async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, ValidationError> {
        let filter = match filter.search.as_deref() {
            Some(query) => {
                let query = validate_search_query(query)?;
                ProductFilter {
                    search: (!query.is_empty()).then_some(query),
                    ..filter
                }
            }
            None => filter,
        };

        let products = self.gateway.list_products(&filter).await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to list products");
            Vec::new()
        });

        debug!(count = products.len(), "Products listed");
        Ok(products)
    }

    /// A single product, or `None` when it is missing or the lookup failed.
    pub async fn get_product(&self, lookup: &ProductLookup, with_variations: bool) -> Option<Product> {
        match self.gateway.product(lookup, with_variations).await {
            Ok(product) => Some(product),
            Err(e) if e.is_not_found() => {
                debug!(?lookup, "Product not found");
                None
            }
            Err(e) => {
                warn!(?lookup, error = %e, "Failed to load product");
                None
            }
        }
    }

    pub async fn list_categories(&self) -> Vec<Category> {
        self.gateway.categories().await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to list categories");
            Vec::new()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use codemart_core::Money;
    use codemart_gateway::{GatewayError, GatewayResult};
    use std::sync::Mutex;

    /// Serves one product (id 42, slug "steam-wallet"); categories always fail.
    #[derive(Default)]
    struct FakeCatalog {
        last_filter: Mutex<Option<ProductFilter>>,
    }

    #[async_trait]
    impl CatalogGateway for FakeCatalog {
        async fn list_products(&self, filter: &ProductFilter) -> GatewayResult<Vec<Product>> {
            *self.last_filter.lock().unwrap() = Some(filter.clone());
            if filter.category.as_deref() == Some("offline") {
                return Err(GatewayError::Network("connection refused".into()));
            }
            Ok(vec![Product::new(42, "Steam Wallet", Money::from_major(1300))])
        }

        async fn product(&self, lookup: &ProductLookup, _with_variations: bool) -> GatewayResult<Product> {
            match lookup {
                ProductLookup::Id(42) => Ok(Product::new(42, "Steam Wallet", Money::from_major(1300))),
                ProductLookup::Slug(slug) if slug == "broken" => Err(GatewayError::Timeout),
                _ => Err(GatewayError::Http {
                    status: 404,
                    body: "not found".into(),
                }),
            }
        }

        async fn categories(&self) -> GatewayResult<Vec<Category>> {
            Err(GatewayError::Http {
                status: 500,
                body: "boom".into(),
            })
        }
    }

    #[tokio::test]
    async fn test_list_products_trims_search() {
        let fake = Arc::new(FakeCatalog::default());
        let catalog = Catalog::new(fake.clone());

        let products = catalog
            .list_products(ProductFilter::default().search("  steam "))
            .await
            .unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(
            fake.last_filter.lock().unwrap().as_ref().unwrap().search.as_deref(),
            Some("steam")
        );

        catalog.list_products(ProductFilter::default().search("   ")).await.unwrap();
        assert_eq!(fake.last_filter.lock().unwrap().as_ref().unwrap().search, None);
    }

    #[tokio::test]
    async fn test_long_search_rejected() {
        let catalog = Catalog::new(Arc::new(FakeCatalog::default()));
        let err = catalog
            .list_products(ProductFilter::default().search("x".repeat(101)))
            .await
            .unwrap_err();
        assert!(matches!(err, ValidationError::TooLong { max: 100, .. }));
    }

    #[tokio::test]
    async fn test_read_failures_degrade_to_empty() {
        let catalog = Catalog::new(Arc::new(FakeCatalog::default()));

        let products = catalog
            .list_products(ProductFilter::default().category("offline"))
            .await
            .unwrap();
        assert!(products.is_empty());
        assert!(catalog.list_categories().await.is_empty());
    }

    #[tokio::test]
    async fn test_get_product() {
        let catalog = Catalog::new(Arc::new(FakeCatalog::default()));

        let product = catalog.get_product(&ProductLookup::Id(42), true).await.unwrap();
        assert_eq!(product.name, "Steam Wallet");
        assert!(catalog.get_product(&ProductLookup::Id(7), true).await.is_none());
        assert!(catalog
            .get_product(&ProductLookup::parse("broken"), false)
            .await
            .is_none());
    }
}
