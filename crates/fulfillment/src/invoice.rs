//! Invoice body rendering.

use domain::{CartItem, Locale, OrderTotals, ShippingDestination};

use crate::error::FulfillmentError;

/// Renders the invoice body for a confirmed order.
///
/// Pure: produces content and nothing else. A rendering failure is soft;
/// the saga completes with a note instead of aborting.
pub fn render_invoice(
    cart: &[CartItem],
    totals: &OrderTotals,
    destination: &ShippingDestination,
    shipment_ref: &str,
    locale: Locale,
) -> Result<String, FulfillmentError> {
    if cart.is_empty() {
        return Err(FulfillmentError::InvoiceRender(
            "no items to invoice".to_string(),
        ));
    }
    if shipment_ref.is_empty() {
        return Err(FulfillmentError::InvoiceRender(
            "missing shipment reference".to_string(),
        ));
    }

    let mut body = String::new();
    match locale {
        Locale::English => {
            body.push_str(&format!(
                "Thank you for your order, {} {}.\n\n",
                destination.given_name, destination.family_name
            ));
            body.push_str("Items:\n");
            for item in cart {
                body.push_str(&format!("  {} x{}\n", item.product_id, item.quantity));
            }
            body.push_str(&format!("\nSubtotal: {}\n", totals.sub_total));
            body.push_str(&format!("Tax: {}\n", totals.tax));
            body.push_str(&format!("Total: {}\n", totals.grand_total));
            body.push_str(&format!("\nShipment reference: {shipment_ref}\n"));
            body.push_str(&format!(
                "Shipping to: {}, {} {}\n",
                destination.address_line1, destination.city, destination.postal_code
            ));
        }
        Locale::Japanese => {
            body.push_str(&format!(
                "{} {} 様、ご注文ありがとうございます。\n\n",
                destination.family_name, destination.given_name
            ));
            body.push_str("ご注文内容:\n");
            for item in cart {
                body.push_str(&format!("  {} x{}\n", item.product_id, item.quantity));
            }
            body.push_str(&format!("\n小計: {}\n", totals.sub_total));
            body.push_str(&format!("税額: {}\n", totals.tax));
            body.push_str(&format!("合計: {}\n", totals.grand_total));
            body.push_str(&format!("\n配送番号: {shipment_ref}\n"));
            body.push_str(&format!(
                "お届け先: 〒{} {} {}\n",
                destination.postal_code, destination.city, destination.address_line1
            ));
        }
    }

    Ok(body)
}
