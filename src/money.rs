//! Money helpers
//!
//! Monetary state is held as [`Money`] backed by integer minor units;
//! fractional arithmetic happens only at rate boundaries and rounds back to
//! minor units immediately.

use rusty_money::{Money, iso::Currency};

/// Serde codec persisting [`Money`] as integer minor units plus an ISO
/// currency code.
///
/// Use with `#[serde(with = "crate::money::codec")]` on a
/// `Money<'static, Currency>` field. Deserialization fails on unknown
/// currency codes.
pub mod codec {
    use rusty_money::{Money, iso};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Encoded {
        minor: i64,
        currency: String,
    }

    /// Serialize a money value as `{minor, currency}`.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(
        money: &Money<'static, iso::Currency>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        Encoded {
            minor: money.to_minor_units(),
            currency: money.currency().iso_alpha_code.to_string(),
        }
        .serialize(serializer)
    }

    /// Deserialize a money value from `{minor, currency}`.
    ///
    /// # Errors
    ///
    /// Fails on malformed input or a currency code absent from the ISO set.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Money<'static, iso::Currency>, D::Error> {
        let encoded = Encoded::deserialize(deserializer)?;

        let currency = iso::find(&encoded.currency).ok_or_else(|| {
            serde::de::Error::custom(format!("unknown currency code: {}", encoded.currency))
        })?;

        Ok(Money::from_minor(encoded.minor, currency))
    }
}

/// Unit price times quantity, saturating at the minor-unit range.
#[must_use]
pub fn line_total(price: &Money<'static, Currency>, quantity: u32) -> Money<'static, Currency> {
    let minor = price.to_minor_units().saturating_mul(i64::from(quantity));

    Money::from_minor(minor, price.currency())
}
