use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};

use crate::api::OrderApi;
use crate::error::{OrderError, ValidationError};
use crate::config::ApiConfig;
use crate::events::{BusMessage, EventBus, Notification};
use crate::export::{ExportFormat, FileSink};
use crate::lifecycle::amounts::{compute_totals, Amounts};
use crate::lifecycle::fetch::{fetch_plan, fetch_with_fallback, FetchStrategy, Fetched};
use crate::lifecycle::transition::StatusTransition;
use crate::lifecycle::validation::{validate_for_save, SupplierMode};
use crate::models::{LineItem, Order, OrderFilters, Page, PartialDelivery, SupplierRef};

/// What the open form is doing with its working copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormMode {
    /// New, unsaved order
    Create,

    /// Persisted order being modified
    Edit,

    /// Read-only display
    View,
}

impl fmt::Display for FormMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormMode::Create => write!(f, "create"),
            FormMode::Edit => write!(f, "edit"),
            FormMode::View => write!(f, "view"),
        }
    }
}

/// Marks the view owning a manager as dismissed.
///
/// Requests still in flight when this fires are discarded.
#[derive(Debug, Clone)]
pub struct DismissHandle {
    dismissed: Arc<watch::Sender<bool>>,
}

impl DismissHandle {
    /// Dismisses the view. Idempotent.
    pub fn dismiss(&self) {
        self.dismissed.send_replace(true);
    }
}

/// Owns one order working copy and the requests that persist or
/// transition it.
///
/// The working copy only changes on local edits or when the backend
/// confirmed an operation; a failed remote call leaves it as it was.
pub struct OrderLifecycleManager<A: OrderApi + ?Sized> {
    api: Arc<A>,
    bus: EventBus,
    plan: Vec<FetchStrategy>,
    mode: FormMode,
    supplier_mode: SupplierMode,
    order: Order,
    dismissed: Arc<watch::Sender<bool>>,
}

impl<A: OrderApi + ?Sized> OrderLifecycleManager<A> {
    /// Creates a manager in [`FormMode::Create`] holding a fresh draft.
    pub fn new(api: Arc<A>, bus: EventBus) -> Self {
        let (dismissed, _) = watch::channel(false);
        Self {
            api,
            bus,
            plan: fetch_plan(&[]),
            mode: FormMode::Create,
            supplier_mode: SupplierMode::Id,
            order: Order::draft(),
            dismissed: Arc::new(dismissed),
        }
    }

    /// Creates a manager whose fetch plan includes the alternate base
    /// addresses of `config`.
    ///
    /// # Arguments
    ///
    /// * `api` - Backend client, usually an [`crate::HttpOrderApi`] built from the same config
    /// * `bus` - Channel receiving notifications and change events
    /// * `config` - Client configuration; only `fallback_base_urls` is read here
    pub fn from_config(api: Arc<A>, bus: EventBus, config: &ApiConfig) -> Self {
        Self::new(api, bus).with_fallback_base_urls(&config.fallback_base_urls)
    }

    /// Alternate base addresses tried when fetching an order fails.
    pub fn with_fallback_base_urls(mut self, base_urls: &[String]) -> Self {
        self.plan = fetch_plan(base_urls);
        self
    }

    /// The working copy.
    pub fn order(&self) -> &Order {
        &self.order
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn supplier_mode(&self) -> SupplierMode {
        self.supplier_mode
    }

    /// Chooses which supplier reference [`Self::save`] sends.
    pub fn set_supplier_mode(&mut self, mode: SupplierMode) {
        self.supplier_mode = mode;
    }

    /// Sets the supplier record used in [`SupplierMode::Id`].
    pub fn select_supplier(&mut self, supplier_id: Option<i64>) {
        self.order.supplier_id = supplier_id;
    }

    /// Sets the raw address used in [`SupplierMode::Email`].
    pub fn set_supplier_email(&mut self, email: Option<String>) {
        self.order.supplier_email = email;
    }

    pub fn set_notes(&mut self, notes: Option<String>) {
        self.order.notes = notes;
    }

    /// Handle the owning view fires when it closes. Cloneable and `Send`.
    pub fn dismiss_handle(&self) -> DismissHandle {
        DismissHandle {
            dismissed: Arc::clone(&self.dismissed),
        }
    }

    /// Whether the owning view has been dismissed.
    pub fn is_dismissed(&self) -> bool {
        *self.dismissed.borrow()
    }

    /// Replaces the working copy with a fresh draft and returns to
    /// [`FormMode::Create`]. No backend call.
    pub fn create_draft(&mut self) -> &Order {
        self.order = Order::draft();
        self.mode = FormMode::Create;
        &self.order
    }

    /// Shows an order read-only.
    pub fn open_read_only(&mut self, order: Order) {
        self.order = order;
        self.mode = FormMode::View;
    }

    /// Loads a persisted order into the working copy for editing.
    ///
    /// Refuses placeholders and reduced results without line items: saving
    /// either back would overwrite the stored order with a partial one.
    #[instrument(skip(self))]
    pub async fn open_for_edit(&mut self, id: i64) -> Result<&Order, OrderError> {
        let fetched = self.fetch(id).await;
        if fetched.via.is_none() {
            return Err(OrderError::Placeholder(id));
        }
        if !fetched.is_complete() {
            warn!("Order {} was only retrievable without its lines, not opening for edit", id);
            return Err(OrderError::Incomplete(id));
        }
        self.order = fetched.order;
        self.mode = FormMode::Edit;
        self.supplier_mode = if self.order.supplier_id.is_none() && self.order.supplier_email.is_some() {
            SupplierMode::Email
        } else {
            SupplierMode::Id
        };
        Ok(&self.order)
    }

    fn ensure_editable(&self) -> Result<(), OrderError> {
        match self.mode {
            FormMode::Create | FormMode::Edit => Ok(()),
            FormMode::View => Err(OrderError::FormMode(self.mode)),
        }
    }

    fn line_mut(&mut self, index: usize) -> Result<&mut LineItem, OrderError> {
        let len = self.order.lines.len();
        self.order
            .lines
            .get_mut(index)
            .ok_or(OrderError::LineIndex { index, len })
    }

    /// Appends a line and returns its index.
    pub fn add_line(&mut self, mut line: LineItem) -> Result<usize, OrderError> {
        self.ensure_editable()?;
        line.recompute();
        self.order.lines.push(line);
        self.order.recompute_totals();
        Ok(self.order.lines.len() - 1)
    }

    /// Removes the line at `index`; later lines shift down by one.
    pub fn remove_line(&mut self, index: usize) -> Result<LineItem, OrderError> {
        self.ensure_editable()?;
        let len = self.order.lines.len();
        if index >= len {
            return Err(OrderError::LineIndex { index, len });
        }
        let removed = self.order.lines.remove(index);
        self.order.recompute_totals();
        Ok(removed)
    }

    /// Changes the quantity of the line at `index` and recomputes totals.
    ///
    /// # Arguments
    ///
    /// * `index` - Position of the line in the working copy
    /// * `quantity` - New ordered quantity
    pub fn set_line_quantity(&mut self, index: usize, quantity: u32) -> Result<(), OrderError> {
        self.ensure_editable()?;
        self.line_mut(index)?.quantity = quantity;
        self.order.recompute_totals();
        Ok(())
    }

    /// Changes the pretax unit price of the line at `index`.
    pub fn set_line_unit_price(&mut self, index: usize, unit_price: Decimal) -> Result<(), OrderError> {
        self.ensure_editable()?;
        self.line_mut(index)?.unit_price = unit_price;
        self.order.recompute_totals();
        Ok(())
    }

    /// Changes the tax rate (percent) of the line at `index`.
    pub fn set_line_tax_rate(&mut self, index: usize, tax_rate: Decimal) -> Result<(), OrderError> {
        self.ensure_editable()?;
        self.line_mut(index)?.tax_rate = tax_rate;
        self.order.recompute_totals();
        Ok(())
    }

    /// Current totals of the working copy.
    pub fn totals(&self) -> Amounts {
        compute_totals(&self.order)
    }

    /// Checks the working copy against the current supplier mode without
    /// contacting the backend.
    ///
    /// # Returns
    ///
    /// The supplier reference [`Self::save`] would send.
    pub fn validate(&self) -> Result<SupplierRef, ValidationError> {
        validate_for_save(&self.order, self.supplier_mode)
    }

    /// Runs `request` unless the view is dismissed first; a result arriving
    /// after dismissal is dropped.
    async fn guarded<T, F>(&self, request: F) -> Result<T, OrderError>
    where
        F: Future<Output = Result<T, OrderError>>,
    {
        let mut dismissed = self.dismissed.subscribe();
        if *dismissed.borrow_and_update() {
            return Err(OrderError::Dismissed);
        }

        let result = tokio::select! {
            result = request => result,
            _ = dismissed.wait_for(|d| *d) => Err(OrderError::Dismissed),
        };

        if self.is_dismissed() {
            return Err(OrderError::Dismissed);
        }
        result
    }

    /// Publishes a remote failure as a notification. Local and dismissal
    /// errors are reported to the caller only.
    fn report(&self, context: &str, e: &OrderError) {
        if e.is_remote() {
            error!("{}: {}", context, e);
            self.bus.notify(Notification::error(format!("{}: {}", context, e)));
        }
    }

    /// Validates and persists the working copy.
    ///
    /// In create mode exactly one of the supplier-id or email creation calls
    /// is made, following the supplier mode; in edit mode the order is
    /// updated by id. On success the working copy becomes the server's
    /// representation.
    #[instrument(skip(self), fields(mode = %self.mode, supplier_mode = %self.supplier_mode))]
    pub async fn save(&mut self) -> Result<&Order, OrderError> {
        if self.mode == FormMode::View {
            return Err(OrderError::FormMode(self.mode));
        }

        self.order.recompute_totals();
        let supplier = self.validate()?;

        let api = Arc::clone(&self.api);
        let result = match (self.mode, &supplier) {
            (FormMode::Edit, _) => {
                let id = self.order.id.ok_or(OrderError::MissingId)?;
                let payload = self.order.with_supplier(&supplier);
                self.guarded(async { api.update(id, &payload).await }).await
            }
            (_, SupplierRef::Id(supplier_id)) => {
                let supplier_id = *supplier_id;
                self.guarded(async { api.create_with_supplier(&self.order, supplier_id).await })
                    .await
            }
            (_, SupplierRef::Email(email)) => {
                self.guarded(async { api.create_with_email(&self.order, email).await })
                    .await
            }
        };

        match result {
            Ok(saved) => {
                info!("Saved order {:?} ({})", saved.id, saved.number);
                self.bus.notify(Notification::success(format!("Order {} saved", saved.number)));
                self.order = saved;
                self.mode = FormMode::Edit;
                Ok(&self.order)
            }
            Err(e) => {
                self.report("Saving the order failed", &e);
                Err(e)
            }
        }
    }

    /// Retrieves an order, falling back through the configured strategies.
    ///
    /// Never fails. When nothing could be retrieved (or the view was
    /// dismissed meanwhile) the result is a placeholder, recognisable with
    /// [`Order::is_placeholder`].
    pub async fn fetch_by_id(&self, id: i64) -> Order {
        self.fetch(id).await.order
    }

    async fn fetch(&self, id: i64) -> Fetched {
        let api = Arc::clone(&self.api);
        let plan = self.plan.clone();
        self.guarded(async move { Ok(fetch_with_fallback(&*api, id, &plan).await) })
            .await
            .unwrap_or_else(|_| Fetched {
                order: Order::placeholder(id),
                via: None,
            })
    }

    /// Asks the backend to confirm order `id`.
    pub async fn confirm(&mut self, id: i64) -> Result<Order, OrderError> {
        self.request_transition(id, StatusTransition::Confirm).await
    }

    /// Asks the backend to mark order `id` fully delivered.
    pub async fn deliver(&mut self, id: i64) -> Result<Order, OrderError> {
        self.request_transition(id, StatusTransition::Deliver).await
    }

    /// Asks the backend to cancel order `id`, whatever its current status.
    pub async fn cancel(&mut self, id: i64) -> Result<Order, OrderError> {
        self.request_transition(id, StatusTransition::Cancel).await
    }

    #[instrument(skip(self))]
    async fn request_transition(&mut self, id: i64, transition: StatusTransition) -> Result<Order, OrderError> {
        let api = Arc::clone(&self.api);
        if let Err(e) = self.guarded(async { api.transition(id, transition).await }).await {
            self.report(&format!("Could not {} order {}", transition, id), &e);
            return Err(e);
        }

        let reloaded = self.reload_after_change(id, transition.affects_stock()).await;
        if !reloaded.is_placeholder() && reloaded.status != transition.expected_status() {
            warn!(
                "Order {} reports status {} after {} (expected {})",
                id,
                reloaded.status,
                transition,
                transition.expected_status()
            );
        }
        Ok(reloaded)
    }

    /// Records a partial delivery for order `id`.
    #[instrument(skip(self, delivery))]
    pub async fn deliver_partial(&mut self, id: i64, delivery: &PartialDelivery) -> Result<Order, OrderError> {
        let api = Arc::clone(&self.api);
        if let Err(e) = self.guarded(async { api.deliver_partial(id, delivery).await }).await {
            self.report(&format!("Could not record delivery for order {}", id), &e);
            return Err(e);
        }
        Ok(self.reload_after_change(id, true).await)
    }

    /// Reloads the authoritative record after the backend accepted a change,
    /// refreshing the working copy when it is the same order.
    ///
    /// A reload without line items only refreshes the working copy's status;
    /// its lines and totals are kept.
    async fn reload_after_change(&mut self, id: i64, stock_changed: bool) -> Order {
        let fetched = self.fetch(id).await;
        if fetched.via.is_none() {
            return fetched.order;
        }
        let complete = fetched.is_complete();
        let reloaded = fetched.order;

        self.bus.publish(BusMessage::OrderChanged {
            order_id: id,
            status: reloaded.status,
        });
        if stock_changed {
            let product_ids: Vec<i64> = reloaded.lines.iter().filter_map(|l| l.product_id).collect();
            if !product_ids.is_empty() {
                self.bus.publish(BusMessage::StockUpdated { product_ids });
            }
        }

        if self.order.id == Some(id) {
            if complete {
                self.order = reloaded.clone();
            } else {
                self.order.status = reloaded.status;
            }
        }
        reloaded
    }

    /// Lists orders. Any non-empty filter switches to the advanced search
    /// endpoint; the two share only the page envelope.
    #[instrument(skip(self))]
    pub async fn list_paged(&self, filters: &OrderFilters, page: u32, size: u32) -> Result<Page<Order>, OrderError> {
        let api = Arc::clone(&self.api);
        let result = if filters.is_empty() {
            self.guarded(async { api.list(page, size).await }).await
        } else {
            self.guarded(async { api.search(filters, page, size).await }).await
        };
        if let Err(e) = &result {
            self.report("Loading orders failed", e);
        }
        result
    }

    /// Downloads an export of order `id` and hands it to `sink`.
    #[instrument(skip(self, sink))]
    pub async fn export(&self, id: i64, format: ExportFormat, sink: &dyn FileSink) -> Result<PathBuf, OrderError> {
        let api = Arc::clone(&self.api);
        let file = match self.guarded(async { api.export(id, format).await }).await {
            Ok(file) => file,
            Err(e) => {
                self.report(&format!("Exporting order {} failed", id), &e);
                return Err(e);
            }
        };

        sink.save(&file).await.map_err(|e| {
            let e = OrderError::Export(format!("{:#}", e));
            error!("{}", e);
            self.bus.notify(Notification::error(e.to_string()));
            e
        })
    }
}
