use std::fmt;
use tracing::{info, warn};

use crate::api::OrderApi;
use crate::models::order::Order;

/// One way of retrieving an order. Tried in order by [`fetch_with_fallback`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStrategy {
    /// The configured base address, optionally skipping line items
    Primary { include_lines: bool },

    /// A known alternate base address, full representation
    Alternate { base_url: String },
}

impl fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStrategy::Primary { include_lines: true } => write!(f, "primary"),
            FetchStrategy::Primary { include_lines: false } => write!(f, "primary without lines"),
            FetchStrategy::Alternate { base_url } => write!(f, "alternate {}", base_url),
        }
    }
}

impl FetchStrategy {
    /// Whether a result obtained this way carries the order's line items.
    pub fn includes_lines(&self) -> bool {
        match self {
            FetchStrategy::Primary { include_lines } => *include_lines,
            FetchStrategy::Alternate { .. } => true,
        }
    }
}

/// An order together with the strategy that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    pub order: Order,

    /// `None` when every strategy failed and `order` is a placeholder
    pub via: Option<FetchStrategy>,
}

impl Fetched {
    /// True only for a real order retrieved with its line items. Anything
    /// else must not become an editable working copy: saving it back would
    /// drop the stored lines.
    pub fn is_complete(&self) -> bool {
        self.via.as_ref().map_or(false, FetchStrategy::includes_lines)
    }
}

/// Degraded-mode retrieval plan: the primary address with lines, then
/// without lines, then each alternate address in the given order.
pub fn fetch_plan(alternate_base_urls: &[String]) -> Vec<FetchStrategy> {
    let mut plan = vec![
        FetchStrategy::Primary { include_lines: true },
        FetchStrategy::Primary { include_lines: false },
    ];
    plan.extend(
        alternate_base_urls
            .iter()
            .map(|base_url| FetchStrategy::Alternate { base_url: base_url.clone() }),
    );
    plan
}

/// Retrieves an order, walking `plan` until one strategy succeeds.
///
/// Never fails: when every attempt errors the result is
/// [`Order::placeholder`] for `id`, with no strategy attached.
///
/// # Arguments
///
/// * `api` - Backend to query
/// * `id` - Order identifier
/// * `plan` - Strategies in the order they are tried, see [`fetch_plan`]
pub async fn fetch_with_fallback<A>(api: &A, id: i64, plan: &[FetchStrategy]) -> Fetched
where
    A: OrderApi + ?Sized,
{
    for strategy in plan {
        match api.fetch(id, strategy).await {
            Ok(order) => {
                info!("Loaded order {} via {}", id, strategy);
                return Fetched {
                    order,
                    via: Some(strategy.clone()),
                };
            }
            Err(e) => {
                warn!("Fetching order {} via {} failed: {}", id, strategy, e);
            }
        }
    }

    warn!("All {} strategies failed for order {}, returning placeholder", plan.len(), id);
    Fetched {
        order: Order::placeholder(id),
        via: None,
    }
}
