//! Fixtures
//!
//! The built-in demo catalog used by the example and integration tests.

use rusty_money::{
    Money,
    iso::{self, Currency},
};
use smallvec::SmallVec;

use crate::catalog::{Catalog, CatalogError, Product, ProductId};

/// Currency of the demo catalog.
pub const DEMO_CURRENCY: &Currency = iso::USD;

/// Build the six-product demo catalog.
///
/// # Errors
///
/// Returns an error if the fixture data violates a catalog invariant,
/// which would be a bug in the fixture itself.
pub fn demo_catalog() -> Result<Catalog, CatalogError> {
    let products = vec![
        Product {
            id: ProductId(1),
            title: "Black Canvas Clogs".to_owned(),
            description: "Slip-on clogs with a cushioned footbed and stitched canvas upper."
                .to_owned(),
            category: "footwear".to_owned(),
            price: Money::from_minor(8999, DEMO_CURRENCY),
            image: "images/black-canvas-clogs.jpg".to_owned(),
            variants: variants(&[
                "Size 6", "Size 7", "Size 8", "Size 9", "Size 10", "Size 11", "Size 12",
            ]),
        },
        Product {
            id: ProductId(2),
            title: "Trail Runner Sneakers".to_owned(),
            description: "Lightweight trail sneakers with a lugged outsole and mesh upper."
                .to_owned(),
            category: "footwear".to_owned(),
            price: Money::from_minor(12999, DEMO_CURRENCY),
            image: "images/trail-runner-sneakers.jpg".to_owned(),
            variants: variants(&[
                "Size 6", "Size 7", "Size 8", "Size 9", "Size 10", "Size 11", "Size 12",
            ]),
        },
        Product {
            id: ProductId(3),
            title: "Marbled Phone Case".to_owned(),
            description: "Impact-resistant case with a marbled resin back.".to_owned(),
            category: "accessories".to_owned(),
            price: Money::from_minor(2499, DEMO_CURRENCY),
            image: "images/marbled-phone-case.jpg".to_owned(),
            variants: variants(&["iPhone 15", "iPhone 15 Pro", "Pixel 9", "Galaxy S25"]),
        },
        Product {
            id: ProductId(4),
            title: "Enamel Pin Set".to_owned(),
            description: "Set of four hard-enamel pins with rubber clutch backs.".to_owned(),
            category: "accessories".to_owned(),
            price: Money::from_minor(2499, DEMO_CURRENCY),
            image: "images/enamel-pin-set.jpg".to_owned(),
            variants: variants(&["Standard"]),
        },
        Product {
            id: ProductId(5),
            title: "Graphic Logo Tee".to_owned(),
            description: "Heavyweight cotton tee with a screen-printed front graphic.".to_owned(),
            category: "apparel".to_owned(),
            price: Money::from_minor(3999, DEMO_CURRENCY),
            image: "images/graphic-logo-tee.jpg".to_owned(),
            variants: variants(&["S", "M", "L", "XL", "XXL"]),
        },
        Product {
            id: ProductId(6),
            title: "Panorama Wall Mural".to_owned(),
            description: "Peel-and-stick wall mural printed on matte fabric panels.".to_owned(),
            category: "wall-murals".to_owned(),
            price: Money::from_minor(29999, DEMO_CURRENCY),
            image: "images/panorama-wall-mural.jpg".to_owned(),
            variants: variants(&["8x10 ft", "10x12 ft", "12x16 ft"]),
        },
    ];

    Catalog::new(products, DEMO_CURRENCY)
}

fn variants(names: &[&str]) -> SmallVec<[String; 8]> {
    names.iter().map(|name| (*name).to_owned()).collect()
}
