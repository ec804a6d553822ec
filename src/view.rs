//! Catalog views
//!
//! Pure filter, sort and pagination over the catalog. The engine keeps no
//! state and trusts its `page` input: a page past the end yields an empty
//! window rather than an error. Callers clamp with [`clamp_page`] when a
//! shopper navigates.

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Product};

/// Number of products per catalog page.
pub const PAGE_SIZE: usize = 9;

/// Sort order applied after filtering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    /// Preserve catalog order.
    #[default]
    Default,

    /// Cheapest first.
    PriceLow,

    /// Most expensive first.
    PriceHigh,

    /// Title ascending, case-insensitive.
    NameAsc,

    /// Title descending, case-insensitive.
    NameDesc,
}

/// Filter, sort and page selection for a catalog view.
#[derive(Debug, Clone)]
pub struct Filter {
    /// Category slugs to keep; empty matches everything (OR semantics).
    pub categories: Vec<String>,

    /// Inclusive lower price bound.
    pub min_price: Option<Money<'static, Currency>>,

    /// Inclusive upper price bound.
    pub max_price: Option<Money<'static, Currency>>,

    /// Case-insensitive substring query over title, description and
    /// category; empty matches everything.
    pub search: String,

    /// Sort order.
    pub sort: SortKey,

    /// 1-based page index.
    pub page: usize,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            min_price: None,
            max_price: None,
            search: String::new(),
            sort: SortKey::Default,
            page: 1,
        }
    }
}

/// One page of filtered, sorted catalog products.
#[derive(Debug)]
pub struct ViewWindow<'a> {
    /// Products on the requested page, in display order.
    pub items: Vec<&'a Product>,

    /// Products matching the filter across all pages.
    pub total_count: usize,

    /// Page count for the match set; never less than one.
    pub total_pages: usize,
}

/// Compute the view window for a filter state.
///
/// Stages run in a fixed order, each narrowing the last: search, category,
/// price bounds, stable sort, paginate.
#[must_use]
pub fn compute_view<'a>(catalog: &'a Catalog, filter: &Filter) -> ViewWindow<'a> {
    let mut matched: Vec<&Product> = catalog
        .iter()
        .filter(|product| product.matches_query(&filter.search))
        .filter(|product| {
            filter.categories.is_empty()
                || filter
                    .categories
                    .iter()
                    .any(|category| *category == product.category)
        })
        .filter(|product| {
            filter
                .min_price
                .is_none_or(|min| product.price.to_minor_units() >= min.to_minor_units())
        })
        .filter(|product| {
            filter
                .max_price
                .is_none_or(|max| product.price.to_minor_units() <= max.to_minor_units())
        })
        .collect();

    sort_products(&mut matched, filter.sort);

    let total_count = matched.len();
    let total_pages = total_count.div_ceil(PAGE_SIZE).max(1);
    let start = filter.page.saturating_sub(1).saturating_mul(PAGE_SIZE);
    let items = matched.into_iter().skip(start).take(PAGE_SIZE).collect();

    ViewWindow {
        items,
        total_count,
        total_pages,
    }
}

/// Clamp a requested page into `1..=total_pages`.
#[must_use]
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

fn sort_products(products: &mut [&Product], sort: SortKey) {
    match sort {
        SortKey::Default => {}
        SortKey::PriceLow => products.sort_by_key(|product| product.price.to_minor_units()),
        SortKey::PriceHigh => {
            products.sort_by_key(|product| std::cmp::Reverse(product.price.to_minor_units()));
        }
        SortKey::NameAsc => products.sort_by(|a, b| title_key(a).cmp(&title_key(b))),
        SortKey::NameDesc => products.sort_by(|a, b| title_key(b).cmp(&title_key(a))),
    }
}

// Case-insensitive stand-in for locale-aware title comparison.
fn title_key(product: &Product) -> String {
    product.title.to_lowercase()
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;
    use smallvec::smallvec;
    use testresult::TestResult;

    use crate::catalog::{CatalogError, ProductId};

    use super::*;

    fn product(id: u32, title: &str, category: &str, minor: i64) -> Product {
        Product {
            id: ProductId(id),
            title: title.to_owned(),
            description: format!("{title} description"),
            category: category.to_owned(),
            price: Money::from_minor(minor, USD),
            image: String::new(),
            variants: smallvec!["One Size".to_owned()],
        }
    }

    fn test_catalog() -> Result<Catalog, CatalogError> {
        Catalog::new(
            vec![
                product(1, "Walnut Desk", "furniture", 24999),
                product(2, "alder chair", "furniture", 9999),
                product(3, "Brass Lamp", "lighting", 4999),
                product(4, "Desk Mat", "accessories", 1999),
                product(5, "Birch Shelf", "furniture", 9999),
            ],
            USD,
        )
    }

    #[test]
    fn active_predicates_apply_together() -> TestResult {
        let catalog = test_catalog()?;
        let filter = Filter {
            categories: vec!["furniture".to_owned()],
            min_price: Some(Money::from_minor(5000, USD)),
            max_price: Some(Money::from_minor(20000, USD)),
            search: "chair".to_owned(),
            ..Filter::default()
        };

        let window = compute_view(&catalog, &filter);

        assert_eq!(window.total_count, 1);
        assert_eq!(
            window.items.first().map(|product| product.id),
            Some(ProductId(2))
        );

        Ok(())
    }

    #[test]
    fn empty_filter_matches_the_whole_catalog_in_order() -> TestResult {
        let catalog = test_catalog()?;

        let window = compute_view(&catalog, &Filter::default());

        let ids: Vec<ProductId> = window.items.iter().map(|product| product.id).collect();
        assert_eq!(
            ids,
            vec![
                ProductId(1),
                ProductId(2),
                ProductId(3),
                ProductId(4),
                ProductId(5)
            ]
        );

        Ok(())
    }

    #[test]
    fn category_semantics_are_or_across_the_set() -> TestResult {
        let catalog = test_catalog()?;
        let filter = Filter {
            categories: vec!["lighting".to_owned(), "accessories".to_owned()],
            ..Filter::default()
        };

        let window = compute_view(&catalog, &filter);

        assert_eq!(window.total_count, 2);

        Ok(())
    }

    #[test]
    fn price_sorts_are_monotonic_and_mirror_each_other() -> TestResult {
        let catalog = test_catalog()?;

        let low = compute_view(
            &catalog,
            &Filter {
                sort: SortKey::PriceLow,
                ..Filter::default()
            },
        );
        let high = compute_view(
            &catalog,
            &Filter {
                sort: SortKey::PriceHigh,
                ..Filter::default()
            },
        );

        let low_prices: Vec<i64> = low
            .items
            .iter()
            .map(|product| product.price.to_minor_units())
            .collect();
        let mut reversed: Vec<i64> = high
            .items
            .iter()
            .map(|product| product.price.to_minor_units())
            .collect();
        reversed.reverse();

        assert!(
            low_prices.windows(2).all(|pair| pair.first() <= pair.last()),
            "prices must be non-decreasing"
        );
        assert_eq!(low_prices, reversed);

        Ok(())
    }

    #[test]
    fn price_sort_is_stable_for_equal_keys() -> TestResult {
        let catalog = test_catalog()?;
        let filter = Filter {
            sort: SortKey::PriceLow,
            ..Filter::default()
        };

        let window = compute_view(&catalog, &filter);

        // Products 2 and 5 share a price; catalog order must survive.
        let ids: Vec<ProductId> = window.items.iter().map(|product| product.id).collect();
        assert_eq!(
            ids,
            vec![
                ProductId(4),
                ProductId(3),
                ProductId(2),
                ProductId(5),
                ProductId(1)
            ]
        );

        Ok(())
    }

    #[test]
    fn name_sort_ignores_case() -> TestResult {
        let catalog = test_catalog()?;
        let filter = Filter {
            sort: SortKey::NameAsc,
            ..Filter::default()
        };

        let window = compute_view(&catalog, &filter);

        let titles: Vec<&str> = window
            .items
            .iter()
            .map(|product| product.title.as_str())
            .collect();
        assert_eq!(
            titles,
            vec![
                "alder chair",
                "Birch Shelf",
                "Brass Lamp",
                "Desk Mat",
                "Walnut Desk"
            ]
        );

        Ok(())
    }

    #[test]
    fn pagination_slices_nine_per_page() -> TestResult {
        let products: Vec<Product> = (1..=20)
            .map(|id| product(id, &format!("Product {id:02}"), "bulk", i64::from(id) * 100))
            .collect();
        let catalog = Catalog::new(products, USD)?;

        let first = compute_view(&catalog, &Filter::default());
        let third = compute_view(
            &catalog,
            &Filter {
                page: 3,
                ..Filter::default()
            },
        );

        assert_eq!(first.total_count, 20);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.items.len(), PAGE_SIZE);
        assert_eq!(third.items.len(), 2);

        Ok(())
    }

    #[test]
    fn page_past_the_end_is_empty_not_an_error() -> TestResult {
        let catalog = test_catalog()?;
        let filter = Filter {
            page: 7,
            ..Filter::default()
        };

        let window = compute_view(&catalog, &filter);

        assert!(window.items.is_empty());
        assert_eq!(window.total_count, 5);

        Ok(())
    }

    #[test]
    fn no_matches_still_reports_one_page() -> TestResult {
        let catalog = test_catalog()?;
        let filter = Filter {
            search: "nothing matches this".to_owned(),
            ..Filter::default()
        };

        let window = compute_view(&catalog, &filter);

        assert_eq!(window.total_count, 0);
        assert_eq!(window.total_pages, 1);

        Ok(())
    }

    #[test]
    fn clamp_page_bounds_navigation() {
        assert_eq!(clamp_page(0, 3), 1);
        assert_eq!(clamp_page(2, 3), 2);
        assert_eq!(clamp_page(9, 3), 3);
        assert_eq!(clamp_page(1, 0), 1);
    }

    #[test]
    fn sort_keys_use_kebab_case_labels() -> TestResult {
        assert_eq!(serde_json::to_string(&SortKey::PriceLow)?, r#""price-low""#);
        assert_eq!(
            serde_json::from_str::<SortKey>(r#""name-desc""#)?,
            SortKey::NameDesc
        );

        Ok(())
    }
}
