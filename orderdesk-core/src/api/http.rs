use async_trait::async_trait;
use reqwest::{header, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::api::OrderApi;
use crate::auth::{Credentials, LoginResponse, Session, StaticToken, TokenSource};
use crate::config::ApiConfig;
use crate::error::OrderError;
use crate::export::{filename_from_disposition, ExportFormat, ExportedFile};
use crate::lifecycle::fetch::FetchStrategy;
use crate::lifecycle::transition::StatusTransition;
use crate::models::{LineItem, Order, OrderFilters, Page, PartialDelivery, Product, Supplier};

/// reqwest-backed [`OrderApi`].
///
/// Every request carries the bearer token of the configured
/// [`TokenSource`], when it has one.
#[derive(Clone)]
pub struct HttpOrderApi {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenSource>,
}

impl HttpOrderApi {
    /// Builds a client for the primary base address of `config`.
    ///
    /// # Arguments
    ///
    /// * `config` - Base address and request timeout
    /// * `tokens` - Supplies the bearer token for each request, e.g. a [`crate::auth::SessionStore`]
    pub fn new(config: &ApiConfig, tokens: Arc<dyn TokenSource>) -> Result<Self, OrderError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            tokens,
        })
    }

    /// Builds a client authenticated with the static `api_token` of
    /// `config`, or sending no bearer token when none is configured.
    pub fn from_config(config: &ApiConfig) -> Result<Self, OrderError> {
        Self::new(config, Arc::new(StaticToken(config.api_token.clone())))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.tokens.bearer_token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Exchanges credentials for a session. Sent without a bearer token.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, OrderError> {
        let response: LoginResponse = send_json(
            self.http.post(self.url("/auth/login")).json(credentials),
        )
        .await?;
        info!("Login succeeded for {}", credentials.username);
        Session::from_token(response.token)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Turns a non-success response into [`OrderError::Api`], using the
/// backend's `message` field when the body carries one.
async fn check(response: Response) -> Result<Response, OrderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                body
            }
        });

    error!("Backend returned {}: {}", status.as_u16(), message);
    Err(OrderError::Api {
        status: status.as_u16(),
        message,
    })
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, OrderError> {
    let response = check(request.send().await?).await?;
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| OrderError::Decode(e.to_string()))
}

async fn send_empty(request: RequestBuilder) -> Result<(), OrderError> {
    check(request.send().await?).await?;
    Ok(())
}

#[async_trait]
impl OrderApi for HttpOrderApi {
    #[instrument(skip(self, order))]
    async fn create_with_supplier(&self, order: &Order, supplier_id: i64) -> Result<Order, OrderError> {
        let body = order.with_supplier(&crate::models::SupplierRef::Id(supplier_id));
        let request = self.http.post(self.url("/commandes")).json(&body);
        send_json(self.authorized(request)).await
    }

    #[instrument(skip(self, order))]
    async fn create_with_email(&self, order: &Order, email: &str) -> Result<Order, OrderError> {
        let body = order.with_supplier(&crate::models::SupplierRef::Email(email.to_string()));
        let request = self.http.post(self.url("/commandes/email")).json(&body);
        send_json(self.authorized(request)).await
    }

    #[instrument(skip(self, order))]
    async fn update(&self, id: i64, order: &Order) -> Result<Order, OrderError> {
        let request = self.http.put(self.url(&format!("/commandes/{}", id))).json(order);
        send_json(self.authorized(request)).await
    }

    #[instrument(skip(self))]
    async fn fetch(&self, id: i64, strategy: &FetchStrategy) -> Result<Order, OrderError> {
        let path = format!("/commandes/{}", id);
        let request = match strategy {
            FetchStrategy::Primary { include_lines: true } => self.http.get(self.url(&path)),
            FetchStrategy::Primary { include_lines: false } => self
                .http
                .get(self.url(&path))
                .query(&[("withLines", "false")]),
            FetchStrategy::Alternate { base_url } => self.http.get(join_url(base_url, &path)),
        };
        send_json(self.authorized(request)).await
    }

    #[instrument(skip(self))]
    async fn list(&self, page: u32, size: u32) -> Result<Page<Order>, OrderError> {
        let request = self
            .http
            .get(self.url("/commandes"))
            .query(&[("page", page), ("size", size)]);
        send_json(self.authorized(request)).await
    }

    #[instrument(skip(self))]
    async fn search(&self, filters: &OrderFilters, page: u32, size: u32) -> Result<Page<Order>, OrderError> {
        let request = self
            .http
            .get(self.url("/commandes/search"))
            .query(&filters.query_pairs())
            .query(&[("page", page), ("size", size)]);
        send_json(self.authorized(request)).await
    }

    #[instrument(skip(self))]
    async fn transition(&self, id: i64, transition: StatusTransition) -> Result<(), OrderError> {
        let path = format!("/commandes/{}/{}", id, transition.path_segment());
        send_empty(self.authorized(self.http.post(self.url(&path)))).await
    }

    #[instrument(skip(self, delivery))]
    async fn deliver_partial(&self, id: i64, delivery: &PartialDelivery) -> Result<(), OrderError> {
        let path = format!("/commandes/{}/deliver-partial", id);
        let request = self.http.post(self.url(&path)).json(delivery);
        send_empty(self.authorized(request)).await
    }

    #[instrument(skip(self, line))]
    async fn add_remote_line(&self, order_id: i64, line: &LineItem) -> Result<LineItem, OrderError> {
        let path = format!("/commandes/{}/lines", order_id);
        let request = self.http.post(self.url(&path)).json(line);
        send_json(self.authorized(request)).await
    }

    #[instrument(skip(self, line))]
    async fn update_remote_line(&self, order_id: i64, line_id: i64, line: &LineItem) -> Result<LineItem, OrderError> {
        let path = format!("/commandes/{}/lines/{}", order_id, line_id);
        let request = self.http.put(self.url(&path)).json(line);
        send_json(self.authorized(request)).await
    }

    #[instrument(skip(self))]
    async fn delete_remote_line(&self, order_id: i64, line_id: i64) -> Result<(), OrderError> {
        let path = format!("/commandes/{}/lines/{}", order_id, line_id);
        send_empty(self.authorized(self.http.delete(self.url(&path)))).await
    }

    #[instrument(skip(self))]
    async fn export(&self, id: i64, format: ExportFormat) -> Result<ExportedFile, OrderError> {
        let path = format!("/commandes/{}/export/{}", id, format.path_segment());
        let response = check(self.authorized(self.http.get(self.url(&path))).send().await?).await?;

        let file_name = response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| ExportedFile::default_name(id, format));
        let bytes = response.bytes().await?.to_vec();

        info!("Downloaded {} export of order {} ({} bytes)", format, id, bytes.len());
        Ok(ExportedFile {
            format,
            file_name,
            bytes,
        })
    }

    async fn list_suppliers(&self) -> Result<Vec<Supplier>, OrderError> {
        send_json(self.authorized(self.http.get(self.url("/fournisseurs")))).await
    }

    async fn list_products(&self) -> Result<Vec<Product>, OrderError> {
        send_json(self.authorized(self.http.get(self.url("/products")))).await
    }

    async fn list_low_stock_products(&self) -> Result<Vec<Product>, OrderError> {
        send_json(self.authorized(self.http.get(self.url("/products/low-stock")))).await
    }
}
