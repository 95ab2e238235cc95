pub mod amounts;
pub mod fetch;
pub mod manager;
pub mod transition;
pub mod validation;


pub use amounts::{compute_line_amounts, compute_totals, Amounts};
pub use fetch::{fetch_plan, fetch_with_fallback, FetchStrategy, Fetched};
pub use manager::{DismissHandle, FormMode, OrderLifecycleManager};
pub use transition::StatusTransition;
pub use validation::{is_valid_email, validate_for_save, SupplierMode};
