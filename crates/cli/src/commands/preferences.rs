//! Display preferences.

use zapastyle_storefront::state::Storefront;

#[allow(clippy::print_stdout)]
pub fn show_theme(storefront: &Storefront) {
    println!("{}", storefront.theme().current());
}

#[allow(clippy::print_stdout)]
pub fn toggle_theme(storefront: &mut Storefront) {
    println!("{}", storefront.theme_mut().toggle());
}
