//! Order totals
//!
//! Derives subtotal, shipping, tax and grand total from the cart and a
//! shipping selection. Shipping and payment methods are closed enumerations;
//! unknown labels are rejected rather than silently defaulted.

use std::str::FromStr;

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{cart::CartStore, storage::Storage};

/// Flat tax rate applied to the subtotal when the caller has no override.
pub const DEFAULT_TAX_RATE: f64 = 0.08;

/// Errors related to totals computation.
#[derive(Debug, Error)]
pub enum TotalsError {
    /// The shipping method label is not one of the known methods.
    #[error("Unknown shipping method: {0}")]
    UnknownShippingMethod(String),

    /// The payment method label is not one of the known methods.
    #[error("Unknown payment method: {0}")]
    UnknownPaymentMethod(String),

    /// Tax multiplication overflowed or was not finite.
    #[error("tax conversion overflowed or was not finite")]
    TaxConversion,
}

/// Closed set of shipping options with flat fees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShippingMethod {
    /// Free shipping.
    Standard,

    /// Flat 15.00.
    Express,

    /// Flat 35.00.
    Overnight,
}

impl ShippingMethod {
    /// Flat fee in minor units.
    #[must_use]
    pub const fn fee_minor(self) -> i64 {
        match self {
            Self::Standard => 0,
            Self::Express => 1500,
            Self::Overnight => 3500,
        }
    }

    /// Flat fee in the given currency.
    #[must_use]
    pub fn fee(self, currency: &'static Currency) -> Money<'static, Currency> {
        Money::from_minor(self.fee_minor(), currency)
    }

    /// Wire label, e.g. `express`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Express => "express",
            Self::Overnight => "overnight",
        }
    }
}

impl FromStr for ShippingMethod {
    type Err = TotalsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(Self::Standard),
            "express" => Ok(Self::Express),
            "overnight" => Ok(Self::Overnight),
            other => Err(TotalsError::UnknownShippingMethod(other.to_owned())),
        }
    }
}

/// Closed set of payment options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    /// Credit or debit card; requires card details at checkout.
    Card,

    /// External wallet redirect.
    Paypal,

    /// Device wallet.
    ApplePay,
}

impl PaymentMethod {
    /// Wire label, e.g. `card`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Paypal => "paypal",
            Self::ApplePay => "apple-pay",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = TotalsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(Self::Card),
            "paypal" => Ok(Self::Paypal),
            "apple-pay" => Ok(Self::ApplePay),
            other => Err(TotalsError::UnknownPaymentMethod(other.to_owned())),
        }
    }
}

/// Subtotal, shipping, tax and grand total, computed once and frozen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderTotals {
    /// Sum of line totals before shipping and tax.
    #[serde(with = "crate::money::codec")]
    pub subtotal: Money<'static, Currency>,

    /// Flat fee for the selected shipping method.
    #[serde(with = "crate::money::codec")]
    pub shipping: Money<'static, Currency>,

    /// Tax on the subtotal only; shipping is not taxed.
    #[serde(with = "crate::money::codec")]
    pub tax: Money<'static, Currency>,

    /// Subtotal plus shipping plus tax.
    #[serde(with = "crate::money::codec")]
    pub total: Money<'static, Currency>,
}

/// The default 8% tax rate.
#[must_use]
pub fn default_tax_rate() -> Percentage {
    Percentage::from(DEFAULT_TAX_RATE)
}

/// Derive order totals from the cart and a shipping selection.
///
/// All arithmetic stays in integer minor units; the tax rate multiply runs
/// through [`Decimal`] and rounds midpoint-away-from-zero back to minor
/// units.
///
/// # Errors
///
/// Returns [`TotalsError::TaxConversion`] if the tax multiplication cannot
/// be represented.
pub fn compute_totals<S: Storage>(
    cart: &CartStore<S>,
    shipping: ShippingMethod,
    tax_rate: Percentage,
) -> Result<OrderTotals, TotalsError> {
    let currency = cart.currency();
    let subtotal_minor = cart.subtotal().to_minor_units();
    let shipping_minor = shipping.fee_minor();
    let tax_minor = percent_of_minor(tax_rate, subtotal_minor)?;
    let total_minor = subtotal_minor
        .saturating_add(shipping_minor)
        .saturating_add(tax_minor);

    Ok(OrderTotals {
        subtotal: Money::from_minor(subtotal_minor, currency),
        shipping: shipping.fee(currency),
        tax: Money::from_minor(tax_minor, currency),
        total: Money::from_minor(total_minor, currency),
    })
}

fn percent_of_minor(rate: Percentage, minor: i64) -> Result<i64, TotalsError> {
    let Some(minor) = Decimal::from_i64(minor) else {
        unreachable!("always returns `Some` for every `i64`")
    };

    let applied = rate * minor;
    let rounded = applied.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    rounded.to_i64().ok_or(TotalsError::TaxConversion)
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;
    use smallvec::smallvec;
    use testresult::TestResult;

    use crate::{
        catalog::{Catalog, Product, ProductId},
        storage::MemoryStore,
    };

    use super::*;

    fn cart_with(prices_and_quantities: &[(i64, u32)]) -> TestResult<CartStore<MemoryStore>> {
        let products: Vec<Product> = prices_and_quantities
            .iter()
            .enumerate()
            .map(|(position, &(minor, _))| Product {
                id: ProductId(u32::try_from(position).unwrap_or(0) + 1),
                title: format!("Product {position}"),
                description: String::new(),
                category: "test".to_owned(),
                price: Money::from_minor(minor, USD),
                image: String::new(),
                variants: smallvec!["One Size".to_owned()],
            })
            .collect();

        let catalog = Catalog::new(products, USD)?;
        let mut cart = CartStore::open(MemoryStore::new(), USD)?;

        for (position, &(_, quantity)) in prices_and_quantities.iter().enumerate() {
            let id = ProductId(u32::try_from(position).unwrap_or(0) + 1);
            cart.add(&catalog, id, None, quantity)?;
        }

        Ok(cart)
    }

    #[test]
    fn express_totals_match_the_worked_example() -> TestResult {
        // 10.00 x 2 plus 5.00 x 1, express shipping, 8% tax.
        let cart = cart_with(&[(1000, 2), (500, 1)])?;

        let totals = compute_totals(&cart, ShippingMethod::Express, default_tax_rate())?;

        assert_eq!(totals.subtotal, Money::from_minor(2500, USD));
        assert_eq!(totals.shipping, Money::from_minor(1500, USD));
        assert_eq!(totals.tax, Money::from_minor(200, USD));
        assert_eq!(totals.total, Money::from_minor(4200, USD));

        Ok(())
    }

    #[test]
    fn standard_shipping_is_free_and_untaxed() -> TestResult {
        let cart = cart_with(&[(1000, 1)])?;

        let totals = compute_totals(&cart, ShippingMethod::Standard, default_tax_rate())?;

        assert_eq!(totals.shipping, Money::from_minor(0, USD));
        assert_eq!(totals.tax, Money::from_minor(80, USD));
        assert_eq!(totals.total, Money::from_minor(1080, USD));

        Ok(())
    }

    #[test]
    fn shipping_is_not_taxed() -> TestResult {
        let cart = cart_with(&[(1000, 1)])?;

        let standard = compute_totals(&cart, ShippingMethod::Standard, default_tax_rate())?;
        let overnight = compute_totals(&cart, ShippingMethod::Overnight, default_tax_rate())?;

        assert_eq!(standard.tax, overnight.tax);

        Ok(())
    }

    #[test]
    fn tax_rounds_to_the_nearest_minor_unit() -> TestResult {
        // 1.99 x 1 at 8% is 15.92 minor units; rounds to 16.
        let cart = cart_with(&[(199, 1)])?;

        let totals = compute_totals(&cart, ShippingMethod::Standard, default_tax_rate())?;

        assert_eq!(totals.tax, Money::from_minor(16, USD));

        Ok(())
    }

    #[test]
    fn empty_cart_totals_are_the_shipping_fee() -> TestResult {
        let cart = CartStore::open(MemoryStore::new(), USD)?;

        let totals = compute_totals(&cart, ShippingMethod::Overnight, default_tax_rate())?;

        assert_eq!(totals.subtotal, Money::from_minor(0, USD));
        assert_eq!(totals.total, Money::from_minor(3500, USD));

        Ok(())
    }

    #[test]
    fn fee_schedule_is_fixed() {
        assert_eq!(ShippingMethod::Standard.fee_minor(), 0);
        assert_eq!(ShippingMethod::Express.fee_minor(), 1500);
        assert_eq!(ShippingMethod::Overnight.fee_minor(), 3500);

        for method in [
            ShippingMethod::Standard,
            ShippingMethod::Express,
            ShippingMethod::Overnight,
        ] {
            assert_eq!(method.fee(USD), Money::from_minor(method.fee_minor(), USD));
        }
    }

    #[test]
    fn unknown_shipping_method_is_rejected() {
        let result: Result<ShippingMethod, _> = "drone".parse();

        assert!(matches!(
            result,
            Err(TotalsError::UnknownShippingMethod(label)) if label == "drone"
        ));
    }

    #[test]
    fn unknown_payment_method_is_rejected() {
        let result: Result<PaymentMethod, _> = "barter".parse();

        assert!(matches!(
            result,
            Err(TotalsError::UnknownPaymentMethod(label)) if label == "barter"
        ));
    }

    #[test]
    fn labels_round_trip_through_from_str() -> TestResult {
        for method in [
            ShippingMethod::Standard,
            ShippingMethod::Express,
            ShippingMethod::Overnight,
        ] {
            assert_eq!(method.label().parse::<ShippingMethod>()?, method);
        }

        for method in [PaymentMethod::Card, PaymentMethod::Paypal, PaymentMethod::ApplePay] {
            assert_eq!(method.label().parse::<PaymentMethod>()?, method);
        }

        Ok(())
    }
}
