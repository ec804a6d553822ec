//! Checkout
//!
//! Field validation and the order submission state machine. Submission runs
//! `Idle -> Submitting -> Completed`; a rejected submission is reported as
//! an error and leaves the machine in `Idle` awaiting corrected input.
//!
//! The simulated processing delay belongs to the view layer, between
//! [`Checkout::begin`] and [`Checkout::complete`]. While a submission is in
//! flight, further `begin` calls are rejected so a repeated submit cannot
//! place two orders.

use decimal_percentage::Percentage;
use jiff::{Timestamp, civil::Date};
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    cart::{CartError, CartStore},
    orders::{Customer, HistoryError, Order, OrderHistory, ShippingAddress, generate_order_number},
    storage::Storage,
    totals::{PaymentMethod, ShippingMethod, TotalsError, compute_totals},
};

/// A single failed checkout field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct FieldError {
    /// Form field identifier, e.g. `email`.
    pub field: &'static str,

    /// Human-readable reason.
    pub reason: &'static str,
}

/// Errors related to order submission.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Checkout attempted with no line items; no order is created.
    #[error("cannot place an order with an empty cart")]
    EmptyCart,

    /// One or more fields failed validation; all failures are collected.
    #[error("{} invalid checkout field(s)", .0.len())]
    Invalid(Vec<FieldError>),

    /// A submission is already in flight; the repeat submit is dropped.
    #[error("a submission is already in progress")]
    SubmissionInProgress,

    /// `complete` was called without a preceding successful `begin`.
    #[error("no submission in progress")]
    NotSubmitting,

    /// Shipping or payment method parsing, or tax computation, failed.
    #[error(transparent)]
    Totals(#[from] TotalsError),

    /// Cart mutation or persistence failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// Order history persistence failed.
    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Card details, required only for the `card` payment method.
#[derive(Debug, Clone, Default)]
pub struct CardDetails {
    /// Card number; spaces allowed.
    pub number: String,

    /// Name printed on the card.
    pub holder: String,

    /// Expiry in `MM/YY` form.
    pub expiry: String,

    /// Card verification value.
    pub cvv: String,
}

/// Raw checkout input as captured by the view layer.
///
/// Method selections stay strings here; they are parsed into their closed
/// enumerations during submission so unknown labels are rejected.
#[derive(Debug, Clone, Default)]
pub struct CheckoutForm {
    /// Contact email.
    pub email: String,

    /// First name.
    pub first_name: String,

    /// Last name.
    pub last_name: String,

    /// Contact phone number.
    pub phone: String,

    /// Street address.
    pub address: String,

    /// Apartment, suite or unit; may be empty.
    pub apartment: String,

    /// City.
    pub city: String,

    /// State or region.
    pub state: String,

    /// ZIP code.
    pub zip_code: String,

    /// Selected shipping method label, e.g. `express`.
    pub shipping_method: String,

    /// Selected payment method label, e.g. `card`.
    pub payment_method: String,

    /// Card details when paying by card.
    pub card: CardDetails,
}

/// Submission lifecycle state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CheckoutState {
    /// Waiting for a submit action.
    #[default]
    Idle,

    /// A validated submission is in flight; repeat submits are rejected.
    Submitting,

    /// An order was placed; [`Checkout::reset`] starts the next purchase.
    Completed,
}

/// A validated submission waiting for the processing delay to elapse.
///
/// Holds everything captured from the form; the cart snapshot and totals
/// are taken at completion time.
#[derive(Debug)]
pub struct PendingOrder {
    customer: Customer,
    shipping_address: ShippingAddress,
    shipping_method: ShippingMethod,
    payment_method: PaymentMethod,
}

impl PendingOrder {
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
}

/// The order submission state machine.
#[derive(Debug, Default)]
pub struct Checkout {
    state: CheckoutState,
}

impl Checkout {
    /// Create a machine in `Idle`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> CheckoutState {
        self.state
    }

    /// Validate the form against the cart and enter `Submitting`.
    ///
    /// `today` anchors card expiry validation. A rejection mutates nothing
    /// and leaves the machine in `Idle`.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::SubmissionInProgress`]: the machine is not idle.
    /// - [`CheckoutError::EmptyCart`]: the cart has no line items.
    /// - [`CheckoutError::Invalid`]: one or more fields failed validation;
    ///   every failure is collected.
    /// - [`CheckoutError::Totals`]: an unknown shipping or payment method
    ///   label was selected.
    pub fn begin<S: Storage>(
        &mut self,
        cart: &CartStore<S>,
        form: &CheckoutForm,
        today: Date,
    ) -> Result<PendingOrder, CheckoutError> {
        if self.state != CheckoutState::Idle {
            return Err(CheckoutError::SubmissionInProgress);
        }

        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let errors = validate(form, today);
        if !errors.is_empty() {
            return Err(CheckoutError::Invalid(errors));
        }

        let shipping_method: ShippingMethod = form.shipping_method.parse()?;
        let payment_method: PaymentMethod = form.payment_method.parse()?;

        let apartment = form.apartment.trim();
        let pending = PendingOrder {
            customer: Customer {
                email: form.email.trim().to_owned(),
                first_name: form.first_name.trim().to_owned(),
                last_name: form.last_name.trim().to_owned(),
                phone: form.phone.trim().to_owned(),
            },
            shipping_address: ShippingAddress {
                address: form.address.trim().to_owned(),
                apartment: (!apartment.is_empty()).then(|| apartment.to_owned()),
                city: form.city.trim().to_owned(),
                state: form.state.trim().to_owned(),
                zip_code: form.zip_code.trim().to_owned(),
            },
            shipping_method,
            payment_method,
        };

        self.state = CheckoutState::Submitting;
        debug!(
            shipping = shipping_method.label(),
            payment = payment_method.label(),
            "submission accepted"
        );

        Ok(pending)
    }

    /// Assemble the order, append it to history, clear the cart and enter
    /// `Completed`.
    ///
    /// Called by the view once the simulated processing delay elapses. The
    /// returned order owns a cart snapshot and frozen totals; later cart
    /// mutations cannot touch it.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::NotSubmitting`]: no submission is in flight.
    /// - [`CheckoutError::Totals`]: tax computation failed.
    /// - [`CheckoutError::History`] / [`CheckoutError::Cart`]: persistence
    ///   failed.
    pub fn complete<S, H>(
        &mut self,
        pending: PendingOrder,
        cart: &mut CartStore<S>,
        history: &mut OrderHistory<H>,
        tax_rate: Percentage,
    ) -> Result<Order, CheckoutError>
    where
        S: Storage,
        H: Storage,
    {
        if self.state != CheckoutState::Submitting {
            return Err(CheckoutError::NotSubmitting);
        }

        let totals = compute_totals(cart, pending.shipping_method, tax_rate)?;
        let order = Order {
            order_number: generate_order_number(),
            customer: pending.customer,
            shipping_address: pending.shipping_address,
            shipping_method: pending.shipping_method,
            payment_method: pending.payment_method,
            items: cart.snapshot(),
            totals,
            created_at: Timestamp::now(),
        };

        history.append(order.clone())?;
        cart.clear()?;
        self.state = CheckoutState::Completed;
        info!(order_number = %order.order_number(), "order placed");

        Ok(order)
    }

    /// Return to `Idle` for the next purchase.
    pub fn reset(&mut self) {
        self.state = CheckoutState::Idle;
    }
}

fn validate(form: &CheckoutForm, today: Date) -> Vec<FieldError> {
    let mut errors = Vec::new();

    require(&mut errors, "email", &form.email);
    require(&mut errors, "firstName", &form.first_name);
    require(&mut errors, "lastName", &form.last_name);
    require(&mut errors, "phone", &form.phone);
    require(&mut errors, "address", &form.address);
    require(&mut errors, "city", &form.city);
    require(&mut errors, "state", &form.state);
    require(&mut errors, "zipCode", &form.zip_code);

    let email = form.email.trim();
    if !email.is_empty() && !is_valid_email(email) {
        errors.push(FieldError {
            field: "email",
            reason: "enter a valid email address",
        });
    }

    let zip_code = form.zip_code.trim();
    if !zip_code.is_empty() && !is_valid_zip(zip_code) {
        errors.push(FieldError {
            field: "zipCode",
            reason: "enter a valid ZIP code",
        });
    }

    // Card fields only matter when paying by card.
    if form.payment_method == "card" {
        require(&mut errors, "cardNumber", &form.card.number);
        require(&mut errors, "cardName", &form.card.holder);
        require(&mut errors, "expiry", &form.card.expiry);
        require(&mut errors, "cvv", &form.card.cvv);

        let number = form.card.number.trim();
        if !number.is_empty() && !is_valid_card_number(number) {
            errors.push(FieldError {
                field: "cardNumber",
                reason: "enter a valid card number",
            });
        }

        let expiry = form.card.expiry.trim();
        if !expiry.is_empty() && !is_valid_expiry(expiry, today) {
            errors.push(FieldError {
                field: "expiry",
                reason: "enter a valid expiry date (MM/YY)",
            });
        }

        let cvv = form.card.cvv.trim();
        if !cvv.is_empty() && !is_valid_cvv(cvv) {
            errors.push(FieldError {
                field: "cvv",
                reason: "enter a valid CVV",
            });
        }
    }

    errors
}

fn require(errors: &mut Vec<FieldError>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError {
            field,
            reason: "this field is required",
        });
    }
}

/// `local@domain.tld` with no whitespace anywhere.
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }

    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };

    !host.is_empty() && !tld.is_empty()
}

/// Thirteen to nineteen digits, spaces ignored.
#[must_use]
pub fn is_valid_card_number(number: &str) -> bool {
    let cleaned: String = number.chars().filter(|c| !c.is_whitespace()).collect();

    (13..=19).contains(&cleaned.len()) && cleaned.chars().all(|c| c.is_ascii_digit())
}

/// `MM/YY` with a month of 01 to 12, not in the past relative to `today`.
#[must_use]
pub fn is_valid_expiry(expiry: &str, today: Date) -> bool {
    let Some((month, year)) = expiry.split_once('/') else {
        return false;
    };

    if month.len() != 2 || year.len() != 2 {
        return false;
    }

    let (Ok(month), Ok(year)) = (month.parse::<i8>(), year.parse::<i16>()) else {
        return false;
    };

    if !(1..=12).contains(&month) {
        return false;
    }

    let current_year = today.year().rem_euclid(100);

    year > current_year || (year == current_year && month >= today.month())
}

/// Three or four digits.
#[must_use]
pub fn is_valid_cvv(cvv: &str) -> bool {
    (3..=4).contains(&cvv.len()) && cvv.chars().all(|c| c.is_ascii_digit())
}

/// `12345` or `12345-6789`.
#[must_use]
pub fn is_valid_zip(zip: &str) -> bool {
    let (five, plus_four) = match zip.split_once('-') {
        Some((five, four)) => (five, Some(four)),
        None => (zip, None),
    };

    let five_ok = five.len() == 5 && five.chars().all(|c| c.is_ascii_digit());
    let plus_four_ok =
        plus_four.is_none_or(|four| four.len() == 4 && four.chars().all(|c| c.is_ascii_digit()));

    five_ok && plus_four_ok
}
