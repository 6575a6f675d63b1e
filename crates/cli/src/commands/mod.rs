//! Subcommand implementations.
//!
//! Commands print to stdout; diagnostics and toasts go through tracing.

pub mod cart;
pub mod catalog;
pub mod compare;
pub mod favorites;
pub mod preferences;
pub mod stats;

use zapastyle_storefront::catalog::Product;
use zapastyle_storefront::state::Storefront;

/// One-line product summary shared by listings.
fn product_line(storefront: &Storefront, product: &Product) -> String {
    format!(
        "{:>4}  {:<24} {:<10} {:>12}",
        product.id,
        product.name,
        product.category,
        storefront.format_price(product.price).to_string()
    )
}
