//! Cart store
//!
//! The live cart collection. Line items are keyed by `(product, variant)`
//! and carry a denormalized snapshot of the product taken at add time, so
//! later catalog changes never reprice an existing line. Every mutation
//! persists the full serialized cart before returning.

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{
    catalog::{Catalog, ProductId},
    money,
    storage::{Storage, StorageError, keys},
};

/// Errors related to cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The referenced product is absent from the catalog.
    #[error("Product {0} not found")]
    ProductNotFound(ProductId),

    /// Durable storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The persisted cart could not be encoded or decoded.
    #[error("cart encoding error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// One distinct `(product, variant)` entry in the cart with a quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    /// Referenced product.
    pub product_id: ProductId,

    /// Product title at add time.
    pub title: String,

    /// Unit price at add time.
    #[serde(with = "crate::money::codec")]
    pub price: Money<'static, Currency>,

    /// Image reference at add time.
    pub image: String,

    /// Chosen variant label.
    pub variant: String,

    /// Units of this line; always positive.
    pub quantity: u32,
}

impl LineItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Money<'static, Currency> {
        money::line_total(&self.price, self.quantity)
    }
}

/// The live cart, with its persistence backend injected at construction.
///
/// The store exclusively owns the collection; the view layer mutates it only
/// through these operations.
#[derive(Debug)]
pub struct CartStore<S: Storage> {
    lines: Vec<LineItem>,
    storage: S,
    currency: &'static Currency,
}

impl<S: Storage> CartStore<S> {
    /// Open the cart, restoring any persisted line items.
    ///
    /// # Errors
    ///
    /// - [`CartError::Storage`]: the backend could not be read.
    /// - [`CartError::Codec`]: the persisted payload was malformed.
    pub fn open(storage: S, currency: &'static Currency) -> Result<Self, CartError> {
        let lines = match storage.get(keys::CART)? {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            lines,
            storage,
            currency,
        })
    }

    /// Add `quantity` units of a product to the cart.
    ///
    /// The variant defaults to the product's first when omitted and is not
    /// re-validated against the product's list. Adding an already-present
    /// `(product, variant)` pair increments its quantity instead of creating
    /// a duplicate line.
    ///
    /// # Errors
    ///
    /// - [`CartError::ProductNotFound`]: the id does not resolve; nothing
    ///   changes.
    /// - [`CartError::Storage`] / [`CartError::Codec`]: persistence failed.
    pub fn add(
        &mut self,
        catalog: &Catalog,
        product_id: ProductId,
        variant: Option<&str>,
        quantity: u32,
    ) -> Result<(), CartError> {
        let product = catalog
            .get(product_id)
            .ok_or(CartError::ProductNotFound(product_id))?;
        let variant = variant.unwrap_or_else(|| product.default_variant()).to_owned();

        debug!(product = %product_id, variant = %variant, quantity, "adding to cart");

        if let Some(line) = self.find_line_mut(product_id, &variant) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            self.lines.push(LineItem {
                product_id,
                title: product.title.clone(),
                price: product.price,
                image: product.image.clone(),
                variant,
                quantity,
            });
        }

        self.persist()
    }

    /// Remove the matching line; a missing line is a no-op, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] or [`CartError::Codec`] if persistence
    /// fails.
    pub fn remove(&mut self, product_id: ProductId, variant: &str) -> Result<(), CartError> {
        self.lines
            .retain(|line| !(line.product_id == product_id && line.variant == variant));

        self.persist()
    }

    /// Overwrite a line's quantity.
    ///
    /// A quantity of zero removes the line; a missing line is a silent
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] or [`CartError::Codec`] if persistence
    /// fails.
    pub fn set_quantity(
        &mut self,
        product_id: ProductId,
        variant: &str,
        quantity: u32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return self.remove(product_id, variant);
        }

        if let Some(line) = self.find_line_mut(product_id, variant) {
            line.quantity = quantity;
            self.persist()?;
        }

        Ok(())
    }

    /// Empty the cart; used after a successful order submission.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] or [`CartError::Codec`] if persistence
    /// fails.
    pub fn clear(&mut self) -> Result<(), CartError> {
        self.lines.clear();

        self.persist()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Sum of unit price times quantity across all lines.
    #[must_use]
    pub fn subtotal(&self) -> Money<'static, Currency> {
        let minor = self.lines.iter().fold(0_i64, |acc, line| {
            acc.saturating_add(line.line_total().to_minor_units())
        });

        Money::from_minor(minor, self.currency)
    }

    /// Look up a line by its `(product, variant)` key.
    #[must_use]
    pub fn find_line(&self, product_id: ProductId, variant: &str) -> Option<&LineItem> {
        self.lines
            .iter()
            .find(|line| line.product_id == product_id && line.variant == variant)
    }

    /// Iterate over the lines in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &LineItem> {
        self.lines.iter()
    }

    /// Number of distinct lines in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if the cart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Currency shared by every line.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Deep copy of the current lines, used to freeze order items.
    #[must_use]
    pub fn snapshot(&self) -> Vec<LineItem> {
        self.lines.clone()
    }

    /// Consume the store, returning its storage backend.
    pub fn into_storage(self) -> S {
        self.storage
    }

    fn find_line_mut(&mut self, product_id: ProductId, variant: &str) -> Option<&mut LineItem> {
        self.lines
            .iter_mut()
            .find(|line| line.product_id == product_id && line.variant == variant)
    }

    fn persist(&mut self) -> Result<(), CartError> {
        let raw = serde_json::to_string(&self.lines)?;
        self.storage.set(keys::CART, &raw)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;
    use smallvec::smallvec;
    use testresult::TestResult;

    use crate::{catalog::Product, storage::MemoryStore};

    use super::*;

    fn test_catalog() -> Result<Catalog, crate::catalog::CatalogError> {
        Catalog::new(
            vec![
                Product {
                    id: ProductId(1),
                    title: "Canvas Clogs".to_owned(),
                    description: "Comfortable clogs".to_owned(),
                    category: "footwear".to_owned(),
                    price: Money::from_minor(8999, USD),
                    image: "images/clogs.png".to_owned(),
                    variants: smallvec!["Size 8".to_owned(), "Size 9".to_owned()],
                },
                Product {
                    id: ProductId(2),
                    title: "Logo Shirt".to_owned(),
                    description: "Cotton shirt".to_owned(),
                    category: "apparel".to_owned(),
                    price: Money::from_minor(3999, USD),
                    image: "images/shirt.png".to_owned(),
                    variants: smallvec!["Medium".to_owned(), "Large".to_owned()],
                },
            ],
            USD,
        )
    }

    fn empty_cart() -> Result<CartStore<MemoryStore>, CartError> {
        CartStore::open(MemoryStore::new(), USD)
    }

    #[test]
    fn add_unknown_product_errors_without_state_change() -> TestResult {
        let catalog = test_catalog()?;
        let mut cart = empty_cart()?;

        let result = cart.add(&catalog, ProductId(99), None, 1);

        assert!(matches!(
            result,
            Err(CartError::ProductNotFound(ProductId(99)))
        ));
        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn add_defaults_to_the_first_variant() -> TestResult {
        let catalog = test_catalog()?;
        let mut cart = empty_cart()?;

        cart.add(&catalog, ProductId(1), None, 1)?;

        assert!(cart.find_line(ProductId(1), "Size 8").is_some());

        Ok(())
    }

    #[test]
    fn add_snapshots_price_title_and_image() -> TestResult {
        let catalog = test_catalog()?;
        let mut cart = empty_cart()?;

        cart.add(&catalog, ProductId(2), Some("Large"), 1)?;

        let line = cart.find_line(ProductId(2), "Large").ok_or("missing line")?;
        assert_eq!(line.title, "Logo Shirt");
        assert_eq!(line.price, Money::from_minor(3999, USD));
        assert_eq!(line.image, "images/shirt.png");

        Ok(())
    }

    #[test]
    fn same_key_merges_into_one_line() -> TestResult {
        let catalog = test_catalog()?;
        let mut cart = empty_cart()?;

        cart.add(&catalog, ProductId(1), Some("Size 8"), 2)?;
        cart.add(&catalog, ProductId(1), Some("Size 8"), 3)?;

        assert_eq!(cart.len(), 1);
        assert_eq!(
            cart.find_line(ProductId(1), "Size 8").map(|line| line.quantity),
            Some(5)
        );

        Ok(())
    }

    #[test]
    fn different_variants_are_distinct_lines() -> TestResult {
        let catalog = test_catalog()?;
        let mut cart = empty_cart()?;

        cart.add(&catalog, ProductId(1), Some("Size 8"), 1)?;
        cart.add(&catalog, ProductId(1), Some("Size 9"), 1)?;

        assert_eq!(cart.len(), 2);

        Ok(())
    }

    #[test]
    fn set_quantity_zero_removes_the_line() -> TestResult {
        let catalog = test_catalog()?;
        let mut cart = empty_cart()?;

        cart.add(&catalog, ProductId(1), Some("Size 8"), 2)?;
        cart.set_quantity(ProductId(1), "Size 8", 0)?;

        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn set_quantity_overwrites_an_existing_line() -> TestResult {
        let catalog = test_catalog()?;
        let mut cart = empty_cart()?;

        cart.add(&catalog, ProductId(1), Some("Size 8"), 2)?;
        cart.set_quantity(ProductId(1), "Size 8", 7)?;

        assert_eq!(cart.total_item_count(), 7);

        Ok(())
    }

    #[test]
    fn set_quantity_on_a_missing_line_is_a_no_op() -> TestResult {
        let catalog = test_catalog()?;
        let mut cart = empty_cart()?;

        cart.add(&catalog, ProductId(1), Some("Size 8"), 2)?;
        cart.set_quantity(ProductId(2), "Large", 4)?;

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.total_item_count(), 2);

        Ok(())
    }

    #[test]
    fn remove_missing_line_is_a_no_op() -> TestResult {
        let catalog = test_catalog()?;
        let mut cart = empty_cart()?;

        cart.add(&catalog, ProductId(1), Some("Size 8"), 1)?;
        cart.remove(ProductId(1), "Size 9")?;

        assert_eq!(cart.len(), 1);

        Ok(())
    }

    #[test]
    fn subtotal_and_count_aggregate_all_lines() -> TestResult {
        let catalog = test_catalog()?;
        let mut cart = empty_cart()?;

        cart.add(&catalog, ProductId(1), None, 2)?;
        cart.add(&catalog, ProductId(2), None, 1)?;

        assert_eq!(cart.total_item_count(), 3);
        assert_eq!(cart.subtotal(), Money::from_minor(2 * 8999 + 3999, USD));

        Ok(())
    }

    #[test]
    fn persisted_cart_survives_reopen() -> TestResult {
        let catalog = test_catalog()?;
        let mut cart = empty_cart()?;

        cart.add(&catalog, ProductId(1), Some("Size 9"), 2)?;
        cart.add(&catalog, ProductId(2), None, 1)?;
        let expected = cart.snapshot();

        let reopened = CartStore::open(cart.into_storage(), USD)?;

        assert_eq!(reopened.snapshot(), expected);

        Ok(())
    }

    #[test]
    fn clear_empties_and_persists() -> TestResult {
        let catalog = test_catalog()?;
        let mut cart = empty_cart()?;

        cart.add(&catalog, ProductId(1), None, 1)?;
        cart.clear()?;

        let reopened = CartStore::open(cart.into_storage(), USD)?;

        assert!(reopened.is_empty());

        Ok(())
    }
}
