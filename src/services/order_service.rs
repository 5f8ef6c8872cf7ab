use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder};

use crate::{
    entity::{
        order_items::{Column as OrderItemCol, Entity as OrderItems, Model as OrderItemModel},
        orders::{Entity as Orders, Model as OrderModel},
    },
    models::{OrderItemSummary, OrderSummary},
};

// ASCII digits only: `\d` would also accept other scripts' digits, which do
// not parse as an id.
static ORDER_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:order|details).*?(?:id|#)\s*[:#]?\s*([0-9]+)").expect("valid order id regex")
});

/// Best-effort scan of free text for phrases like "order id 123" or
/// "details #456". Returns the digits of the first match.
pub fn extract_order_digits(text: &str) -> Option<&str> {
    ORDER_ID_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Split a run of digits into the label shown to the user and the key to
/// look up. The key is `None` when the number does not fit an `i64`.
pub fn order_number(digits: &str) -> (String, Option<i64>) {
    let trimmed = digits.trim_start_matches('0');
    let label = if trimmed.is_empty() { "0" } else { trimmed };
    (label.to_string(), label.parse().ok())
}

/// Fetch an order by primary key together with its line items.
pub async fn find_order_summary<C>(conn: &C, order_id: i64) -> Result<Option<OrderSummary>, DbErr>
where
    C: ConnectionTrait,
{
    let Some(order) = Orders::find_by_id(order_id).one(conn).await? else {
        return Ok(None);
    };

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.order_id))
        .order_by_asc(OrderItemCol::Id)
        .all(conn)
        .await?;

    Ok(Some(order_summary_from_entity(order, items)))
}

/// Human-readable rendering of an order for the chat transcript.
pub fn format_order_message(order: &OrderSummary) -> String {
    format!(
        "Here are details for order #{}: Status: {}\nCreated at: {}\nNumber of items: {}",
        order.order_id,
        order.status,
        format_timestamp(order.created_at),
        order.num_items
    )
}

fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| "unknown".to_string())
}

fn order_summary_from_entity(model: OrderModel, items: Vec<OrderItemModel>) -> OrderSummary {
    OrderSummary {
        order_id: model.order_id,
        status: model.status,
        created_at: model.created_at.map(|dt| dt.with_timezone(&Utc)),
        shipped_at: model.shipped_at.map(|dt| dt.with_timezone(&Utc)),
        delivered_at: model.delivered_at.map(|dt| dt.with_timezone(&Utc)),
        returned_at: model.returned_at.map(|dt| dt.with_timezone(&Utc)),
        num_items: model.num_of_item,
        items: items.into_iter().map(order_item_from_entity).collect(),
    }
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItemSummary {
    OrderItemSummary {
        id: model.id,
        product_id: model.product_id,
        quantity: model.quantity,
        price: model.price,
        status: model.status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn extract_order_id(text: &str) -> Option<i64> {
        extract_order_digits(text).and_then(|digits| order_number(digits).1)
    }

    #[test]
    fn extracts_ids_from_common_phrasings() {
        assert_eq!(extract_order_id("What is the status of order id 123?"), Some(123));
        assert_eq!(extract_order_id("Show me the details #456 please"), Some(456));
        assert_eq!(extract_order_id("ORDER ID: 789"), Some(789));
        assert_eq!(extract_order_id("order #12"), Some(12));
        // Arabic-Indic digits are not an order number
        assert_eq!(extract_order_digits("order id \u{0661}\u{0662}\u{0663}"), None);
        // too long for a key, still reported back as digits
        assert_eq!(
            extract_order_digits("order id 99999999999999999999"),
            Some("99999999999999999999")
        );
        assert_eq!(extract_order_id("order id 99999999999999999999"), None);
    }

    #[test]
    fn order_numbers_keep_their_label_when_out_of_range() {
        assert_eq!(order_number("0042"), ("42".to_string(), Some(42)));
        assert_eq!(order_number("000"), ("0".to_string(), Some(0)));
        assert_eq!(
            order_number("99999999999999999999"),
            ("99999999999999999999".to_string(), None)
        );
    }

    #[test]
    fn returns_first_match_only() {
        assert_eq!(extract_order_id("order id 1 and order id 2"), Some(1));
    }

    #[test]
    fn ignores_text_without_an_order_reference() {
        assert_eq!(extract_order_id("hello there"), None);
        assert_eq!(extract_order_id("I bought 3 shirts"), None);
        assert_eq!(extract_order_id("order id unknown"), None);
    }

    #[test]
    fn formats_summary_message() {
        let order = OrderSummary {
            order_id: 7,
            status: "Shipped".into(),
            created_at: Some(Utc.with_ymd_and_hms(2023, 5, 1, 10, 30, 0).unwrap()),
            shipped_at: None,
            delivered_at: None,
            returned_at: None,
            num_items: 2,
            items: Vec::new(),
        };
        assert_eq!(
            format_order_message(&order),
            "Here are details for order #7: Status: Shipped\nCreated at: 2023-05-01T10:30:00Z\nNumber of items: 2"
        );
    }
}
