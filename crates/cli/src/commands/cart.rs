//! Cart commands.

use rust_decimal::Decimal;
use zapastyle_core::ProductId;
use zapastyle_storefront::error::Result;
use zapastyle_storefront::state::Storefront;

/// Print each cart line and the cart total.
#[allow(clippy::print_stdout)]
pub fn show(storefront: &Storefront) {
    let cart = storefront.cart();
    if cart.state().is_empty() {
        println!("Your cart is empty");
        return;
    }

    for line in cart.items() {
        // Prefer the live catalog entry; fall back to the snapshot taken when added
        let product = storefront
            .catalog()
            .get_by_id(line.product_id)
            .unwrap_or(line.product);
        let subtotal = product.price * Decimal::from(line.quantity);
        println!(
            "{:>4}  {:<24} x{:<3} {:>12}",
            line.product_id,
            product.name,
            line.quantity,
            storefront.format_price(subtotal).to_string()
        );
    }
    println!(
        "{} item(s), total {}",
        cart.item_count(),
        storefront.format_price(cart.total())
    );
}

fn count_line(storefront: &Storefront) -> String {
    format!("Cart now holds {} item(s)", storefront.cart().item_count())
}

fn not_in_cart(id: ProductId) -> String {
    format!("Product {id} is not in the cart")
}

fn add_line(storefront: &mut Storefront, id: ProductId, quantity: u32) -> Result<String> {
    storefront.cart_mut().add_item(id, quantity)?;
    Ok(count_line(storefront))
}

fn remove_line(storefront: &mut Storefront, id: ProductId) -> String {
    if storefront.cart_mut().remove_item(id) {
        count_line(storefront)
    } else {
        not_in_cart(id)
    }
}

fn update_line(storefront: &mut Storefront, id: ProductId, quantity: u32) -> String {
    if storefront.cart_mut().update_quantity(id, quantity) {
        count_line(storefront)
    } else {
        not_in_cart(id)
    }
}

fn clear_line(storefront: &mut Storefront) -> String {
    storefront.cart_mut().clear();
    count_line(storefront)
}

#[allow(clippy::print_stdout)]
pub fn add(storefront: &mut Storefront, id: ProductId, quantity: u32) -> Result<()> {
    println!("{}", add_line(storefront, id, quantity)?);
    Ok(())
}

#[allow(clippy::print_stdout)]
pub fn remove(storefront: &mut Storefront, id: ProductId) {
    println!("{}", remove_line(storefront, id));
}

#[allow(clippy::print_stdout)]
pub fn update(storefront: &mut Storefront, id: ProductId, quantity: u32) {
    println!("{}", update_line(storefront, id, quantity));
}

#[allow(clippy::print_stdout)]
pub fn clear(storefront: &mut Storefront) {
    println!("{}", clear_line(storefront));
}

/// Place the order and print its summary.
#[allow(clippy::print_stdout)]
pub fn checkout(storefront: &mut Storefront, order_number: &str) -> Result<()> {
    let order = storefront.checkout(order_number)?;

    println!("Order {}", order.order_number);
    for line in &order.lines {
        println!(
            "  {} x{} @ {}",
            line.name,
            line.quantity,
            storefront.format_price(line.unit_price)
        );
    }
    println!("Total: {}", storefront.format_price(order.total));
    Ok(())
}
