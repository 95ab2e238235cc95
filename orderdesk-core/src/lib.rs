//! Purchase order (commande) lifecycle for the OrderDesk ERP front end.
//!
//! The [`OrderLifecycleManager`] owns one order working copy: it edits line
//! items, derives totals, validates before saving, and asks the backend to
//! persist and transition orders through the [`OrderApi`] seam.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod export;
pub mod lifecycle;
pub mod models;
pub mod telemetry;

pub use api::{HttpOrderApi, OrderApi};
pub use config::ApiConfig;
pub use error::{OrderError, ValidationError};
pub use events::{BusMessage, EventBus, Notification};
pub use lifecycle::{FormMode, OrderLifecycleManager, SupplierMode};
pub use models::{LineItem, Order, OrderStatus};
