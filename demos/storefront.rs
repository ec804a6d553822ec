//! Storefront Example
//!
//! Walks the full purchase flow against the demo catalog: browse a sorted
//! view, fill a cart, then submit and complete an order.

use anyhow::Result;

use jiff::Zoned;
use mercato::{
    cart::CartStore,
    checkout::{CardDetails, Checkout, CheckoutForm},
    fixtures::{DEMO_CURRENCY, demo_catalog},
    orders::OrderHistory,
    storage::MemoryStore,
    totals::default_tax_rate,
    view::{Filter, SortKey, compute_view},
};

/// Storefront Example
#[expect(clippy::print_stdout, reason = "Example code")]
pub fn main() -> Result<()> {
    let catalog = demo_catalog()?;

    let filter = Filter {
        sort: SortKey::PriceLow,
        ..Filter::default()
    };
    let window = compute_view(&catalog, &filter);

    println!("Catalog, cheapest first:");
    for product in &window.items {
        println!("  {} - {}", product.title, product.price);
    }

    let mut cart = CartStore::open(MemoryStore::new(), DEMO_CURRENCY)?;
    let first = window.items.first().map(|product| product.id);
    let last = window.items.last().map(|product| product.id);

    if let Some(id) = first {
        cart.add(&catalog, id, None, 2)?;
    }
    if let Some(id) = last {
        cart.add(&catalog, id, Some("10x12 ft"), 1)?;
    }

    println!("\nCart holds {} item(s)", cart.total_item_count());

    let form = CheckoutForm {
        email: "shopper@example.com".to_owned(),
        first_name: "Sam".to_owned(),
        last_name: "Moreno".to_owned(),
        phone: "555-0142".to_owned(),
        address: "12 Pine St".to_owned(),
        apartment: String::new(),
        city: "Portland".to_owned(),
        state: "OR".to_owned(),
        zip_code: "97201".to_owned(),
        shipping_method: "express".to_owned(),
        payment_method: "card".to_owned(),
        card: CardDetails {
            number: "4242 4242 4242 4242".to_owned(),
            holder: "Sam Moreno".to_owned(),
            expiry: "12/29".to_owned(),
            cvv: "123".to_owned(),
        },
    };

    let mut history = OrderHistory::open(MemoryStore::new())?;
    let mut checkout = Checkout::new();

    let today = Zoned::now().date();
    let pending = checkout.begin(&cart, &form, today)?;
    let order = checkout.complete(pending, &mut cart, &mut history, default_tax_rate())?;

    println!("\nOrder {} placed", order.order_number());
    println!("  Subtotal: {}", order.totals().subtotal);
    println!("  Shipping: {}", order.totals().shipping);
    println!("  Tax:      {}", order.totals().tax);
    println!("  Total:    {}", order.totals().total);

    Ok(())
}
