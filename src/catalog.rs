//! Product catalog
//!
//! The immutable product list that every view is derived from. Built once at
//! process start and validated up front; all later access is read-only.

use std::fmt;

use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

/// Stable product identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub u32);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Errors related to catalog construction.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Two products share an id.
    #[error("Duplicate product id {0}")]
    DuplicateProduct(ProductId),

    /// A product has an empty variant list.
    #[error("Product {0} has no variants")]
    NoVariants(ProductId),

    /// A product's currency differs from the catalog currency (id, product
    /// currency, catalog currency).
    #[error("Product {0} has currency {1}, but catalog has currency {2}")]
    CurrencyMismatch(ProductId, &'static str, &'static str),
}

/// A single catalog entry.
#[derive(Debug, Clone)]
pub struct Product {
    /// Stable identity.
    pub id: ProductId,

    /// Display title.
    pub title: String,

    /// Long-form description.
    pub description: String,

    /// Category slug, e.g. `footwear`.
    pub category: String,

    /// Unit price.
    pub price: Money<'static, Currency>,

    /// Image reference.
    pub image: String,

    /// Ordered variant labels; never empty in a validated catalog.
    pub variants: SmallVec<[String; 8]>,
}

impl Product {
    /// The variant used when the shopper picks none.
    #[must_use]
    pub fn default_variant(&self) -> &str {
        self.variants.first().map_or("", String::as_str)
    }

    /// Case-insensitive substring match over title, description and
    /// category; an empty query matches everything.
    #[must_use]
    pub fn matches_query(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }

        let query = query.to_lowercase();

        self.title.to_lowercase().contains(&query)
            || self.description.to_lowercase().contains(&query)
            || self.category.to_lowercase().contains(&query)
    }
}

/// The immutable product catalog, source of truth for all views.
#[derive(Debug)]
pub struct Catalog {
    products: Vec<Product>,
    index: FxHashMap<ProductId, usize>,
    currency: &'static Currency,
}

impl Catalog {
    /// Build a catalog from a product list.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::DuplicateProduct`]: two products share an id.
    /// - [`CatalogError::NoVariants`]: a product has an empty variant list.
    /// - [`CatalogError::CurrencyMismatch`]: a price carries a currency
    ///   other than the catalog currency.
    pub fn new(
        products: impl Into<Vec<Product>>,
        currency: &'static Currency,
    ) -> Result<Self, CatalogError> {
        let products = products.into();
        let mut index = FxHashMap::default();

        for (position, product) in products.iter().enumerate() {
            if product.variants.is_empty() {
                return Err(CatalogError::NoVariants(product.id));
            }

            let product_currency = product.price.currency();

            if product_currency != currency {
                return Err(CatalogError::CurrencyMismatch(
                    product.id,
                    product_currency.iso_alpha_code,
                    currency.iso_alpha_code,
                ));
            }

            if index.insert(product.id, position).is_some() {
                return Err(CatalogError::DuplicateProduct(product.id));
            }
        }

        Ok(Self {
            products,
            index,
            currency,
        })
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.index
            .get(&id)
            .and_then(|&position| self.products.get(position))
    }

    /// Products in the given category, in catalog order; an empty slug or
    /// `all` matches everything.
    pub fn by_category<'a>(&'a self, category: &'a str) -> impl Iterator<Item = &'a Product> {
        self.products.iter().filter(move |product| {
            category.is_empty() || category == "all" || product.category == category
        })
    }

    /// Case-insensitive substring search over title, description and
    /// category; an empty query returns the full catalog.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|product| product.matches_query(query))
            .collect()
    }

    /// Distinct categories in catalog order.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();

        for product in &self.products {
            if !seen.contains(&product.category.as_str()) {
                seen.push(product.category.as_str());
            }
        }

        seen
    }

    /// Iterate over products in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    /// Number of products in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Check if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Currency shared by every product price.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }
}
