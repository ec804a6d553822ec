//! Orders
//!
//! Immutable order records and the append-only history they live in. An
//! order is created only by a successful checkout submission and never
//! mutated afterwards.

use jiff::Timestamp;
use rand::{Rng, distributions::Alphanumeric, rngs::OsRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{
    cart::LineItem,
    storage::{Storage, StorageError, keys},
    totals::{OrderTotals, PaymentMethod, ShippingMethod},
};

/// Errors related to the order history store.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Durable storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The persisted history could not be encoded or decoded.
    #[error("order history encoding error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Customer contact details captured at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Contact email.
    pub email: String,

    /// First name.
    pub first_name: String,

    /// Last name.
    pub last_name: String,

    /// Contact phone number.
    pub phone: String,
}

/// Shipping destination captured at submission time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    /// Street address.
    pub address: String,

    /// Apartment, suite or unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apartment: Option<String>,

    /// City.
    pub city: String,

    /// State or region.
    pub state: String,

    /// ZIP code.
    pub zip_code: String,
}

/// An immutable record of a placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub(crate) order_number: String,
    pub(crate) customer: Customer,
    pub(crate) shipping_address: ShippingAddress,
    pub(crate) shipping_method: ShippingMethod,
    pub(crate) payment_method: PaymentMethod,
    pub(crate) items: Vec<LineItem>,
    pub(crate) totals: OrderTotals,
    pub(crate) created_at: Timestamp,
}

impl Order {
    /// Generated order identifier.
    #[must_use]
    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    /// Customer contact details.
    #[must_use]
    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    /// Shipping destination.
    #[must_use]
    pub fn shipping_address(&self) -> &ShippingAddress {
        &self.shipping_address
    }

    /// Selected shipping method.
    #[must_use]
    pub fn shipping_method(&self) -> ShippingMethod {
        self.shipping_method
    }

    /// Selected payment method.
    #[must_use]
    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    /// Cart snapshot frozen at submission time.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Totals computed once at submission time.
    #[must_use]
    pub fn totals(&self) -> &OrderTotals {
        &self.totals
    }

    /// Submission timestamp.
    #[must_use]
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

/// Append-only order history persisted under the `orders` key.
#[derive(Debug)]
pub struct OrderHistory<S: Storage> {
    orders: Vec<Order>,
    storage: S,
}

impl<S: Storage> OrderHistory<S> {
    /// Open the history, restoring any persisted orders.
    ///
    /// # Errors
    ///
    /// - [`HistoryError::Storage`]: the backend could not be read.
    /// - [`HistoryError::Codec`]: the persisted payload was malformed.
    pub fn open(storage: S) -> Result<Self, HistoryError> {
        let orders = match storage.get(keys::ORDERS)? {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Vec::new(),
        };

        Ok(Self { orders, storage })
    }

    /// Append a placed order and persist the full list.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Storage`] or [`HistoryError::Codec`] if
    /// persistence fails.
    pub fn append(&mut self, order: Order) -> Result<(), HistoryError> {
        info!(order_number = %order.order_number, "order recorded");
        self.orders.push(order);

        let raw = serde_json::to_string(&self.orders)?;
        self.storage.set(keys::ORDERS, &raw)?;

        Ok(())
    }

    /// Look up an order by its number.
    #[must_use]
    pub fn find(&self, order_number: &str) -> Option<&Order> {
        self.orders
            .iter()
            .find(|order| order.order_number == order_number)
    }

    /// The most recently placed order.
    #[must_use]
    pub fn latest(&self) -> Option<&Order> {
        self.orders.last()
    }

    /// Iterate over orders, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }

    /// Number of recorded orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Check if the history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Consume the store, returning its storage backend.
    pub fn into_storage(self) -> S {
        self.storage
    }
}

/// Generate a time-plus-random order number, e.g. `ORD-MF2K81QZ-7A2QZ`.
///
/// Unique with overwhelming probability, not guaranteed; acceptable for
/// single-user local use.
#[must_use]
pub fn generate_order_number() -> String {
    let millis = Timestamp::now().as_millisecond().max(0);
    let suffix: String = OsRng
        .sample_iter(&Alphanumeric)
        .take(5)
        .map(char::from)
        .collect();

    format!("ORD-{}-{}", base36(millis), suffix).to_uppercase()
}

fn base36(mut value: i64) -> String {
    if value == 0 {
        return "0".to_owned();
    }

    let mut digits = Vec::new();

    while value > 0 {
        let digit = u32::try_from(value % 36).unwrap_or(0);
        digits.push(char::from_digit(digit, 36).unwrap_or('0'));
        value /= 36;
    }

    digits.iter().rev().collect()
}
