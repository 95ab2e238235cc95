//! Backend seam: the REST services consumed as a black box.

pub mod http;


use async_trait::async_trait;

use crate::error::OrderError;
use crate::export::{ExportFormat, ExportedFile};
use crate::lifecycle::fetch::FetchStrategy;
use crate::lifecycle::transition::StatusTransition;
use crate::models::{LineItem, Order, OrderFilters, Page, PartialDelivery, Product, Supplier};

pub use http::HttpOrderApi;

/// Remote order operations.
///
/// The backend is the sole authority for identifiers, order numbers and
/// status transitions; implementations only carry requests and responses.
#[async_trait]
pub trait OrderApi: Send + Sync {
    /// Creates an order placed with a known supplier record.
    async fn create_with_supplier(&self, order: &Order, supplier_id: i64) -> Result<Order, OrderError>;

    /// Creates an order addressed to a raw supplier email.
    async fn create_with_email(&self, order: &Order, email: &str) -> Result<Order, OrderError>;

    /// Replaces persisted order `id`, lines included.
    async fn update(&self, id: i64, order: &Order) -> Result<Order, OrderError>;

    /// Retrieves order `id` the way `strategy` describes.
    async fn fetch(&self, id: i64, strategy: &FetchStrategy) -> Result<Order, OrderError>;

    /// Plain paged listing.
    async fn list(&self, page: u32, size: u32) -> Result<Page<Order>, OrderError>;

    /// Advanced search; only the page envelope is shared with [`OrderApi::list`].
    async fn search(&self, filters: &OrderFilters, page: u32, size: u32) -> Result<Page<Order>, OrderError>;

    /// Requests a status transition; the backend decides whether it is legal.
    async fn transition(&self, id: i64, transition: StatusTransition) -> Result<(), OrderError>;

    /// Records received quantities for some lines of order `id`.
    async fn deliver_partial(&self, id: i64, delivery: &PartialDelivery) -> Result<(), OrderError>;

    /// Adds a line to a persisted order.
    async fn add_remote_line(&self, order_id: i64, line: &LineItem) -> Result<LineItem, OrderError>;

    async fn update_remote_line(&self, order_id: i64, line_id: i64, line: &LineItem) -> Result<LineItem, OrderError>;

    async fn delete_remote_line(&self, order_id: i64, line_id: i64) -> Result<(), OrderError>;

    /// Downloads a rendered document; the bytes are opaque to the client.
    async fn export(&self, id: i64, format: ExportFormat) -> Result<ExportedFile, OrderError>;

    async fn list_suppliers(&self) -> Result<Vec<Supplier>, OrderError>;

    async fn list_products(&self) -> Result<Vec<Product>, OrderError>;

    async fn list_low_stock_products(&self) -> Result<Vec<Product>, OrderError>;
}
