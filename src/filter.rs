use rayon::prelude::*;

use crate::record::{OrderStatus, Row};

/// Which fields the search box matches against, per list screen.
pub const USER_SEARCH_FIELDS: [&str; 3] = ["name", "email", "role"];
pub const PRODUCT_SEARCH_FIELDS: [&str; 3] = ["name", "category", "sku"];
pub const ORDER_SEARCH_FIELDS: [&str; 3] = ["id", "customer", "product"];

/// Categorical filter on the orders screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(OrderStatus),
}

impl StatusFilter {
    pub fn next(&self) -> StatusFilter {
        match self {
            StatusFilter::All => StatusFilter::Only(OrderStatus::Pending),
            StatusFilter::Only(OrderStatus::Cancelled) => StatusFilter::All,
            StatusFilter::Only(s) => StatusFilter::Only(s.next()),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusFilter::All => "All Statuses",
            StatusFilter::Only(s) => s.as_str(),
        }
    }

    fn as_match(&self) -> Option<&'static str> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Only(s) => Some(s.as_str()),
        }
    }
}

/// Recomputes the derived view from scratch: a row is kept when the query
/// (lowercased) is a substring of at least one searchable field, and the
/// status field equals the categorical filter exactly when one is active.
/// Source order is preserved; nothing is mutated in place. The scan fans
/// out across rows but the collect keeps encounter order.
pub fn filter_rows(
    rows: &[Row],
    query: &str,
    fields: &[&str],
    status: StatusFilter,
) -> Vec<Row> {
    let needle = query.to_lowercase();
    let wanted = status.as_match();
    rows.par_iter()
        .filter(|row| {
            let text_hit =
                needle.is_empty() || fields.iter().any(|f| row.text_of(f).contains(&needle));
            let status_hit = match wanted {
                None => true,
                Some(s) => row.get("status").to_string() == s,
            };
            text_hit && status_hit
        })
        .cloned()
        .collect()
}
