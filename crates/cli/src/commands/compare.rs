//! Product comparison.
//!
//! The comparison list is not persisted, so it is built from the given IDs
//! on each invocation.

use zapastyle_core::ProductId;
use zapastyle_storefront::compare::CompareOutcome;
use zapastyle_storefront::error::Result;
use zapastyle_storefront::state::Storefront;

#[allow(clippy::print_stdout)]
pub fn show(storefront: &mut Storefront, ids: &[ProductId]) -> Result<()> {
    storefront.compare_mut().clear();
    for &id in ids {
        if storefront.compare_mut().toggle(id)? == CompareOutcome::Full {
            tracing::debug!(product_id = %id, "Comparison full, skipping");
        }
    }

    let products = storefront.compare().products();
    println!("{:<10} {}", "", products.iter().map(|p| format!("{:<24}", p.name)).collect::<String>());
    println!(
        "{:<10} {}",
        "Price",
        products
            .iter()
            .map(|p| format!("{:<24}", storefront.format_price(p.price).to_string()))
            .collect::<String>()
    );
    println!(
        "{:<10} {}",
        "Category",
        products
            .iter()
            .map(|p| format!("{:<24}", p.category))
            .collect::<String>()
    );
    Ok(())
}
