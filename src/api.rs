//! HTTP client for the alerting and portfolio service.
//!
//! One method per remote operation. The service owns all the interesting
//! logic (threshold evaluation, notification de-duplication, valuation
//! math); this client shapes requests, enforces the per-operation deadlines,
//! and maps failures into the [`ApiError`] taxonomy. It never retries: every
//! failure is reported to the caller for a manual retry.

use std::path::Path;
use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::alerts::{AlertDraft, AlertUpdate};
use crate::auth::AuthContext;
use crate::config::TimeoutConfig;
use crate::error::{ApiError, ErrorBody};
use crate::models::{
    Alert, AlertHistoryResponse, AlertStatsSummary, Asset, AssetFilter, HealthStatus,
    JobRunResult, NewPortfolioItem, PortfolioItem, PortfolioItemUpdate, PortfolioPerformance,
    PortfolioValuation, PushTokenRegistration, ScreenshotImportResponse, SubscriptionStatus,
    TestPushResponse, TokenResponse, User, VerifyRequest, VerifyResponse,
};

/// Client identifier sent with every request.
const USER_AGENT: &str = concat!("pricewatch/", env!("CARGO_PKG_VERSION"));

/// Per-operation deadlines.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub health: Duration,
    pub default: Duration,
    pub jobs: Duration,
    pub image: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            health: Duration::from_secs(5),
            default: Duration::from_secs(8),
            jobs: Duration::from_secs(20),
            image: Duration::from_secs(60),
        }
    }
}

impl From<TimeoutConfig> for Timeouts {
    fn from(config: TimeoutConfig) -> Self {
        Self {
            health: Duration::from_secs(config.health),
            default: Duration::from_secs(config.default),
            jobs: Duration::from_secs(config.jobs),
            image: Duration::from_secs(config.image),
        }
    }
}

/// Client for the remote alerting service.
pub struct ApiClient {
    http: Client,
    base_url: String,
    api_key: String,
    auth: AuthContext,
    timeouts: Timeouts,
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

impl ApiClient {
    /// Create a new client. `base_url` may carry a trailing slash.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(ApiError::from_transport)?;

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Ok(Self {
            http,
            base_url,
            api_key: api_key.into(),
            auth: AuthContext::new(),
            timeouts: Timeouts::default(),
        })
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_auth(mut self, auth: AuthContext) -> Self {
        self.auth = auth;
        self
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        self.auth.set_token(token);
    }

    /// Forget the bearer token. Purely local; the service keeps no session.
    pub fn logout(&mut self) {
        self.auth.clear();
    }

    fn request(&self, method: Method, path: &str, timeout: Duration) -> RequestBuilder {
        debug!("{} {}", method, path);
        let mut req = self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .timeout(timeout)
            .header("X-API-Key", &self.api_key);
        // Health, login and signup run before a token exists; everything
        // else carries the bearer token.
        if let Some(token) = self.auth.token() {
            req = req.bearer_auth(token);
        }
        req
    }

    async fn execute<T: DeserializeOwned>(req: RequestBuilder) -> Result<T, ApiError> {
        let response = req.send().await.map_err(ApiError::from_transport)?;
        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                body: ErrorBody::parse(raw),
            });
        }
        response.json::<T>().await.map_err(ApiError::from_transport)
    }

    /// Like [`Self::execute`] for endpoints whose success body carries
    /// nothing we use (204s, bare acknowledgements).
    async fn execute_empty(req: RequestBuilder) -> Result<(), ApiError> {
        let response = req.send().await.map_err(ApiError::from_transport)?;
        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                body: ErrorBody::parse(raw),
            });
        }
        Ok(())
    }

    // ===== Health =====

    pub async fn health(&self) -> Result<HealthStatus, ApiError> {
        Self::execute(self.request(Method::GET, "/health", self.timeouts.health)).await
    }

    // ===== Auth =====

    /// Exchange credentials for a bearer token and hold it for subsequent
    /// calls.
    pub async fn login(&mut self, email: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ApiError::validation("email and password are required"));
        }
        let response: TokenResponse = Self::execute(
            self.request(Method::POST, "/auth/login", self.timeouts.default)
                .json(&Credentials { email, password }),
        )
        .await?;
        self.auth.set_token(&response.access_token);
        Ok(response)
    }

    /// Create an account; the service signs the new user straight in.
    pub async fn signup(&mut self, email: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(ApiError::validation("email and password are required"));
        }
        let response: TokenResponse = Self::execute(
            self.request(Method::POST, "/auth/signup", self.timeouts.default)
                .json(&Credentials { email, password }),
        )
        .await?;
        self.auth.set_token(&response.access_token);
        Ok(response)
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        Self::execute(self.request(Method::GET, "/auth/me", self.timeouts.default)).await
    }

    // ===== Alerts =====

    pub async fn list_alerts(&self) -> Result<Vec<Alert>, ApiError> {
        Self::execute(self.request(Method::GET, "/alerts", self.timeouts.default)).await
    }

    pub async fn get_alert(&self, id: i64) -> Result<Alert, ApiError> {
        Self::execute(self.request(Method::GET, &format!("/alerts/{id}"), self.timeouts.default))
            .await
    }

    pub async fn create_alert(&self, draft: &AlertDraft) -> Result<Alert, ApiError> {
        Self::execute(
            self.request(Method::POST, "/alerts", self.timeouts.default)
                .json(draft),
        )
        .await
    }

    /// Apply a partial update. Concurrent updates for the same id are not
    /// serialized here; the service is the sole arbiter of final state.
    pub async fn update_alert(&self, id: i64, update: &AlertUpdate) -> Result<Alert, ApiError> {
        Self::execute(
            self.request(Method::PUT, &format!("/alerts/{id}"), self.timeouts.default)
                .json(update),
        )
        .await
    }

    /// Terminal and irreversible; a second delete surfaces the service's 404.
    pub async fn delete_alert(&self, id: i64) -> Result<(), ApiError> {
        Self::execute_empty(self.request(
            Method::DELETE,
            &format!("/alerts/{id}"),
            self.timeouts.default,
        ))
        .await
    }

    pub async fn alert_history(&self, days: u32) -> Result<AlertHistoryResponse, ApiError> {
        Self::execute(
            self.request(Method::GET, "/alerts/history", self.timeouts.default)
                .query(&[("days", days)]),
        )
        .await
    }

    pub async fn alert_stats(&self, days: u32) -> Result<AlertStatsSummary, ApiError> {
        Self::execute(
            self.request(Method::GET, "/alerts/stats/summary", self.timeouts.default)
                .query(&[("days", days)]),
        )
        .await
    }

    // ===== Push tokens & jobs =====

    pub async fn register_push_token(
        &self,
        registration: &PushTokenRegistration,
    ) -> Result<(), ApiError> {
        if registration.token.trim().is_empty() {
            return Err(ApiError::validation("push token must not be empty"));
        }
        Self::execute_empty(
            self.request(Method::POST, "/push-tokens", self.timeouts.default)
                .json(registration),
        )
        .await
    }

    /// Ask the service to send a test notification to every registered
    /// device of the current user.
    pub async fn test_push(&self) -> Result<TestPushResponse, ApiError> {
        Self::execute(self.request(Method::POST, "/push-tokens/test", self.timeouts.jobs)).await
    }

    /// Manually invoke the remote evaluator.
    pub async fn run_alert_check(&self) -> Result<JobRunResult, ApiError> {
        Self::execute(self.request(Method::POST, "/jobs/run-alert-check", self.timeouts.jobs))
            .await
    }

    // ===== Portfolio =====

    pub async fn list_portfolio(&self) -> Result<Vec<PortfolioItem>, ApiError> {
        Self::execute(self.request(Method::GET, "/portfolio", self.timeouts.default)).await
    }

    pub async fn get_portfolio_item(&self, id: i64) -> Result<PortfolioItem, ApiError> {
        Self::execute(self.request(
            Method::GET,
            &format!("/portfolio/{id}"),
            self.timeouts.default,
        ))
        .await
    }

    pub async fn create_portfolio_item(
        &self,
        item: &NewPortfolioItem,
    ) -> Result<PortfolioItem, ApiError> {
        item.validate()?;
        Self::execute(
            self.request(Method::POST, "/portfolio", self.timeouts.default)
                .json(item),
        )
        .await
    }

    pub async fn update_portfolio_item(
        &self,
        id: i64,
        update: &PortfolioItemUpdate,
    ) -> Result<PortfolioItem, ApiError> {
        update.validate()?;
        Self::execute(
            self.request(Method::PUT, &format!("/portfolio/{id}"), self.timeouts.default)
                .json(update),
        )
        .await
    }

    pub async fn delete_portfolio_item(&self, id: i64) -> Result<(), ApiError> {
        Self::execute_empty(self.request(
            Method::DELETE,
            &format!("/portfolio/{id}"),
            self.timeouts.default,
        ))
        .await
    }

    /// Server-computed valuation; the client does no arithmetic on it.
    pub async fn portfolio_valuation(&self) -> Result<PortfolioValuation, ApiError> {
        Self::execute(self.request(Method::GET, "/portfolio/valuation", self.timeouts.default))
            .await
    }

    pub async fn portfolio_performance(&self) -> Result<PortfolioPerformance, ApiError> {
        Self::execute(self.request(
            Method::GET,
            "/portfolio/performance",
            self.timeouts.default,
        ))
        .await
    }

    // ===== Asset master =====

    pub async fn search_assets(&self, filter: &AssetFilter) -> Result<Vec<Asset>, ApiError> {
        Self::execute(
            self.request(Method::GET, "/assets", self.timeouts.default)
                .query(filter),
        )
        .await
    }

    // ===== Screenshot import =====

    /// Upload a screenshot for AI extraction of asset candidates. The
    /// analysis can take a while, hence the dedicated deadline.
    pub async fn import_screenshot(
        &self,
        path: &Path,
    ) -> Result<ScreenshotImportResponse, ApiError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ApiError::validation(format!("cannot read {}: {e}", path.display())))?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("screenshot.png")
            .to_string();
        let mime = match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("webp") => "image/webp",
            _ => "image/png",
        };

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime)
            .map_err(ApiError::from_transport)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        Self::execute(
            self.request(Method::POST, "/screenshot/import", self.timeouts.image)
                .multipart(form),
        )
        .await
    }

    // ===== Subscriptions =====

    pub async fn subscription_status(&self) -> Result<SubscriptionStatus, ApiError> {
        Self::execute(self.request(
            Method::GET,
            "/subscriptions/status",
            self.timeouts.default,
        ))
        .await
    }

    /// Submit a store receipt for verification. The service talks to the
    /// store, so this gets the long deadline.
    pub async fn verify_subscription(
        &self,
        request: &VerifyRequest,
    ) -> Result<VerifyResponse, ApiError> {
        if request.receipt_data.trim().is_empty() {
            return Err(ApiError::validation("receipt data must not be empty"));
        }
        Self::execute(
            self.request(Method::POST, "/subscriptions/verify", self.timeouts.jobs)
                .json(request),
        )
        .await
    }
}
