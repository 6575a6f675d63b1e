//! Favorites commands.

use zapastyle_core::ProductId;
use zapastyle_storefront::error::Result;
use zapastyle_storefront::favorites::Toggle;
use zapastyle_storefront::state::Storefront;

use super::product_line;

#[allow(clippy::print_stdout)]
pub fn list(storefront: &Storefront) {
    let products = storefront.favorites().products();
    if products.is_empty() {
        println!("No favorites yet");
        return;
    }
    for product in &products {
        println!("{}", product_line(storefront, product));
    }
}

#[allow(clippy::print_stdout)]
pub fn toggle(storefront: &mut Storefront, id: ProductId) -> Result<()> {
    match storefront.favorites_mut().toggle(id)? {
        Toggle::Added => println!("Added {id} to favorites"),
        Toggle::Removed => println!("Removed {id} from favorites"),
    }
    Ok(())
}
