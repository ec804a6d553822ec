//! Mercato
//!
//! Mercato is a client-side storefront engine: catalog browsing with
//! filtering, sorting and pagination, a shopping cart persisted to durable
//! key-value storage, order totals, and a simulated checkout flow.
//!
//! The crate holds only the state-bearing core; rendering and input
//! collection belong to a view layer that calls into these modules and
//! displays whatever they return. All errors cross that boundary as values.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod fixtures;
pub mod money;
pub mod orders;
pub mod session;
pub mod storage;
pub mod totals;
pub mod view;
