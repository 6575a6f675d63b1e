//! Analytics summary.

use zapastyle_storefront::analytics::CartEventKind;
use zapastyle_storefront::state::Storefront;

#[allow(clippy::print_stdout)]
pub fn show(storefront: &Storefront, limit: usize) {
    let analytics = storefront.analytics();
    let stats = analytics.stats();

    println!(
        "Total page views: {}, product views: {}",
        stats.total_page_views, stats.total_product_views
    );
    println!("Page views:");
    for (page, views) in analytics.page_views() {
        println!("  {page:<24} {views:>6}");
    }

    println!("Popular products:");
    for popular in analytics.popular_products(limit) {
        println!(
            "  {:<24} {:>6}",
            popular.product.name, popular.views
        );
    }

    let purchases = analytics
        .cart_events()
        .iter()
        .filter(|e| e.kind == CartEventKind::Purchase)
        .count();
    println!(
        "Cart events: {} ({} add to cart, {} purchase)",
        stats.cart_events,
        stats.cart_events.saturating_sub(purchases),
        purchases
    );
}
