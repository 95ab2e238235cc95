pub mod order;
pub mod page;
pub mod product;
pub mod supplier;

pub use order::{LineItem, LineReceipt, LineStatus, Order, OrderStatus, PartialDelivery, SupplierRef};
pub use page::{OrderFilters, Page};
pub use product::Product;
pub use supplier::Supplier;
