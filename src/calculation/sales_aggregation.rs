//! Per-staff sales aggregation over a day's invoices.

use std::collections::HashSet;

use rust_decimal::Decimal;

use crate::models::{Invoice, ItemType, SalesAggregate};

/// Sums one staff member's sales across a slice of invoices.
///
/// Service and product line items credited to `staff_id` are summed
/// separately; package and gift card lines are ignored. A customer is counted
/// once per day no matter how many of their invoices involve the staff
/// member.
///
/// The result depends only on the invoices given, so re-running it over the
/// same invoices always yields the same aggregate.
///
/// # Example
///
/// ```
/// use incentive_engine::calculation::aggregate_staff_sales;
/// use incentive_engine::models::{Invoice, ItemType, LineItem};
/// use chrono::Utc;
/// use rust_decimal::Decimal;
///
/// let invoice = Invoice {
///     id: "inv_1".to_string(),
///     tenant_id: "t1".to_string(),
///     created_at: Utc::now(),
///     customer_id: "cus_1".to_string(),
///     line_items: vec![LineItem {
///         staff_id: "stf_001".to_string(),
///         item_type: ItemType::Service,
///         final_price: Decimal::from(1200),
///     }],
/// };
///
/// let sales = aggregate_staff_sales(&[invoice], "stf_001");
/// assert_eq!(sales.service_sale, Decimal::from(1200));
/// assert_eq!(sales.customer_count, 1);
/// ```
pub fn aggregate_staff_sales(invoices: &[Invoice], staff_id: &str) -> SalesAggregate {
    let mut service_sale = Decimal::ZERO;
    let mut product_sale = Decimal::ZERO;
    let mut customers: HashSet<&str> = HashSet::new();

    for invoice in invoices {
        let mut involved = false;
        for item in invoice.line_items.iter().filter(|i| i.staff_id == staff_id) {
            involved = true;
            match item.item_type {
                ItemType::Service => service_sale += item.final_price,
                ItemType::Product => product_sale += item.final_price,
                ItemType::Package | ItemType::GiftCard => {}
            }
        }
        if involved {
            customers.insert(invoice.customer_id.as_str());
        }
    }

    SalesAggregate {
        service_sale,
        product_sale,
        customer_count: u32::try_from(customers.len()).unwrap_or(u32::MAX),
    }
}
