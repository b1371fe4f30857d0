//! Cart pricing engine.
//!
//! Joins stored line items to remotely fetched product snapshots, computes
//! the subtotal over matched items, and conditionally applies a coupon
//! discount. Pure over its inputs; the service layer is responsible for
//! fetching them.

use tracing::{info, warn};

use crate::model::{
    CartHeader, CartHeaderView, CartLine, CartLineView, CartView, Coupon, DiscountKind, Product,
};

/// Synthetic snapshot substituted when a line's product id is missing from
/// the fetched catalog. Contributes zero to the subtotal.
pub fn placeholder_product(product_id: u64) -> Product {
    Product {
        product_id,
        name: "Product not found".to_string(),
        price: 0.0,
        description: "This product is no longer available".to_string(),
        category_name: "N/A".to_string(),
        image_url: String::new(),
    }
}

/// Price a cart against the fetched catalog and optional coupon snapshot.
///
/// A coupon qualifies only when the subtotal strictly exceeds its minimum
/// amount. The discount is capped at the subtotal, so the final total never
/// goes negative. The stored coupon code is reported back regardless of
/// whether it applied.
pub fn price_cart(
    header: &CartHeader,
    lines: &[CartLine],
    products: &[Product],
    coupon: Option<&Coupon>,
) -> CartView {
    let mut subtotal = 0.0;
    let mut items = Vec::with_capacity(lines.len());

    for line in lines {
        let product = match products.iter().find(|p| p.product_id == line.product_id) {
            Some(found) => {
                subtotal += f64::from(line.count) * found.price;
                found.clone()
            }
            None => {
                warn!(
                    product_id = line.product_id,
                    user_id = %header.user_id,
                    "product not found in catalog, substituting placeholder"
                );
                placeholder_product(line.product_id)
            }
        };
        items.push(CartLineView {
            cart_line_id: line.id,
            cart_header_id: line.header_id,
            product_id: line.product_id,
            count: line.count,
            product,
        });
    }

    let mut discount = 0.0;
    let mut total = subtotal;

    if let Some(code) = header.active_coupon_code() {
        match coupon {
            Some(coupon) if subtotal > coupon.min_amount => {
                let raw = match coupon.amount_type {
                    DiscountKind::Percentage => subtotal * coupon.discount_amount / 100.0,
                    DiscountKind::Fixed => coupon.discount_amount,
                };
                discount = raw.min(subtotal);
                total = subtotal - discount;
                info!(
                    coupon_code = code,
                    discount,
                    kind = ?coupon.amount_type,
                    "applied coupon discount"
                );
            }
            _ => {
                warn!(
                    coupon_code = code,
                    subtotal,
                    min_amount = coupon.map(|c| c.min_amount).unwrap_or(0.0),
                    "coupon not applied, invalid or below minimum"
                );
            }
        }
    }

    CartView {
        header: CartHeaderView {
            cart_header_id: header.id,
            user_id: header.user_id.clone(),
            coupon_code: header.coupon_code.clone(),
            discount,
            cart_total: total,
        },
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(coupon: Option<&str>) -> CartHeader {
        CartHeader {
            id: 1,
            user_id: "user-1".to_string(),
            coupon_code: coupon.map(str::to_string),
        }
    }

    fn line(id: u64, product_id: u64, count: u32) -> CartLine {
        CartLine {
            id,
            header_id: 1,
            product_id,
            count,
        }
    }

    fn product(product_id: u64, price: f64) -> Product {
        Product {
            product_id,
            name: format!("product-{product_id}"),
            price,
            description: String::new(),
            category_name: String::new(),
            image_url: String::new(),
        }
    }

    fn coupon(kind: DiscountKind, amount: f64, min: f64) -> Coupon {
        serde_json::from_value(serde_json::json!({
            "couponCode": "SAVE",
            "discountAmount": amount,
            "minAmount": min,
            "amountType": match kind {
                DiscountKind::Percentage => "PERCENTAGE",
                DiscountKind::Fixed => "FIXED",
            },
        }))
        .unwrap()
    }

    #[test]
    fn subtotal_sums_count_times_price_over_matched_items() {
        let lines = [line(1, 10, 2), line(2, 11, 3)];
        let products = [product(10, 5.0), product(11, 1.5)];
        let view = price_cart(&header(None), &lines, &products, None);
        assert_eq!(view.header.cart_total, 14.5);
        assert_eq!(view.header.discount, 0.0);
        assert_eq!(view.items.len(), 2);
    }

    #[test]
    fn unmatched_product_gets_placeholder_and_contributes_zero() {
        let lines = [line(1, 10, 2), line(2, 99, 4)];
        let products = [product(10, 5.0)];
        let view = price_cart(&header(None), &lines, &products, None);
        assert_eq!(view.header.cart_total, 10.0);

        let missing = &view.items[1];
        assert_eq!(missing.product.price, 0.0);
        assert_eq!(missing.product.name, "Product not found");
        assert_eq!(missing.product.category_name, "N/A");
        assert_eq!(missing.count, 4);
    }

    #[test]
    fn percentage_coupon_applies_above_minimum() {
        // subtotal 100, 10% off with min 50 -> discount 10, total 90
        let lines = [line(1, 10, 10)];
        let products = [product(10, 10.0)];
        let coupon = coupon(DiscountKind::Percentage, 10.0, 50.0);
        let view = price_cart(&header(Some("SAVE")), &lines, &products, Some(&coupon));
        assert_eq!(view.header.discount, 10.0);
        assert_eq!(view.header.cart_total, 90.0);
        assert_eq!(view.header.coupon_code.as_deref(), Some("SAVE"));
    }

    #[test]
    fn coupon_below_minimum_is_not_applied() {
        // subtotal 40 with min 50 -> untouched
        let lines = [line(1, 10, 4)];
        let products = [product(10, 10.0)];
        let coupon = coupon(DiscountKind::Percentage, 10.0, 50.0);
        let view = price_cart(&header(Some("SAVE")), &lines, &products, Some(&coupon));
        assert_eq!(view.header.discount, 0.0);
        assert_eq!(view.header.cart_total, 40.0);
        assert_eq!(view.header.coupon_code.as_deref(), Some("SAVE"));
    }

    #[test]
    fn qualification_is_strictly_greater_than_minimum() {
        let lines = [line(1, 10, 5)];
        let products = [product(10, 10.0)];
        let coupon = coupon(DiscountKind::Fixed, 5.0, 50.0);
        // subtotal exactly equals the minimum: not applied
        let view = price_cart(&header(Some("SAVE")), &lines, &products, Some(&coupon));
        assert_eq!(view.header.discount, 0.0);
        assert_eq!(view.header.cart_total, 50.0);
    }

    #[test]
    fn fixed_discount_is_capped_at_subtotal() {
        // subtotal 5, fixed 20 -> discount capped at 5, total 0
        let lines = [line(1, 10, 1)];
        let products = [product(10, 5.0)];
        let coupon = coupon(DiscountKind::Fixed, 20.0, 0.0);
        let view = price_cart(&header(Some("SAVE")), &lines, &products, Some(&coupon));
        assert_eq!(view.header.discount, 5.0);
        assert_eq!(view.header.cart_total, 0.0);
    }

    #[test]
    fn missing_coupon_snapshot_leaves_total_untouched() {
        let lines = [line(1, 10, 2)];
        let products = [product(10, 3.0)];
        let view = price_cart(&header(Some("GONE")), &lines, &products, None);
        assert_eq!(view.header.discount, 0.0);
        assert_eq!(view.header.cart_total, 6.0);
        // the stored code survives even when the coupon did not apply
        assert_eq!(view.header.coupon_code.as_deref(), Some("GONE"));
    }

    #[test]
    fn empty_coupon_code_skips_coupon_path() {
        let lines = [line(1, 10, 2)];
        let products = [product(10, 3.0)];
        let coupon = coupon(DiscountKind::Fixed, 100.0, 0.0);
        let view = price_cart(&header(Some("")), &lines, &products, Some(&coupon));
        assert_eq!(view.header.discount, 0.0);
        assert_eq!(view.header.cart_total, 6.0);
    }
}
