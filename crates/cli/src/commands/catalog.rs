//! Catalog browsing commands.

use zapastyle_core::ProductId;
use zapastyle_storefront::error::Result;
use zapastyle_storefront::listing::{ProductQuery, SortOrder};
use zapastyle_storefront::state::Storefront;

use super::product_line;

/// List products matching the given filters.
#[allow(clippy::print_stdout)]
pub fn list(
    storefront: &Storefront,
    category: Option<String>,
    search: Option<String>,
    sort: SortOrder,
) {
    let mut query = ProductQuery::new().sort(sort);
    if let Some(category) = category {
        query = query.category(category);
    }
    if let Some(search) = search {
        query = query.search(search);
    }

    let products = query.run(storefront.catalog());
    if products.is_empty() {
        println!("No products found");
        return;
    }
    for product in &products {
        println!("{}", product_line(storefront, product));
    }
    println!("{} product(s)", products.len());
}

/// Show one product and count the view.
#[allow(clippy::print_stdout)]
pub fn show(storefront: &Storefront, id: ProductId) -> Result<()> {
    let product = storefront.catalog().require(id)?;
    storefront.analytics().track_product_view(id);

    println!("{}", product.name);
    println!("  ID:        {}", product.id);
    println!("  Category:  {}", product.category);
    println!("  Price:     {}", storefront.format_price(product.price));
    println!("  Image:     {}", product.image);
    println!(
        "  In cart:   {}",
        storefront.cart().quantity_of(product.id)
    );
    if storefront.favorites().contains(product.id) {
        println!("  Favorite:  yes");
    }
    Ok(())
}
