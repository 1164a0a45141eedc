//! Wire-level data models for the alerting and portfolio service.
//!
//! These mirror the service's JSON shapes field for field. Alert records in
//! particular are flat and full of optionals, because the service kept its
//! legacy single-direction columns alongside the newer dual-direction ones;
//! readers should go through [`Alert::label`] and [`Alert::threshold`]
//! instead of poking at the raw fields.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// How an alert's threshold values are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    #[default]
    Absolute,
    Percent,
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertType::Absolute => write!(f, "absolute"),
            AlertType::Percent => write!(f, "percent"),
        }
    }
}

/// Trigger direction for single-direction alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    Above,
    Below,
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::Above => write!(f, "above"),
            Condition::Below => write!(f, "below"),
        }
    }
}

/// A price alert as the service returns it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: i64,
    pub symbol: String,
    #[serde(default)]
    pub alert_type: AlertType,
    #[serde(default)]
    pub asset_class: Option<String>,

    // Legacy single-direction fields.
    #[serde(default)]
    pub condition: Option<Condition>,
    #[serde(default)]
    pub threshold_price: Option<f64>,
    #[serde(default)]
    pub percent_threshold: Option<f64>,

    // Dual-direction fields.
    #[serde(default)]
    pub threshold_price_up: Option<f64>,
    #[serde(default)]
    pub threshold_price_down: Option<f64>,
    #[serde(default)]
    pub alert_up_pct: Option<f64>,
    #[serde(default)]
    pub alert_down_pct: Option<f64>,

    /// Reference price percentage thresholds are computed against.
    #[serde(default)]
    pub base_price: Option<f64>,

    /// Gates whether the remote evaluator considers this alert at all.
    pub is_active: bool,

    /// Notification latch. Once set, the evaluator will not re-fire until a
    /// reactivation request explicitly clears it.
    #[serde(default)]
    pub notified: bool,

    #[serde(default)]
    pub last_notified_price: Option<f64>,
    #[serde(default)]
    pub last_notified_at: Option<NaiveDateTime>,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Threshold configuration derived from an alert's flat record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThresholdView {
    AbsoluteSingle {
        condition: Condition,
        threshold_price: Option<f64>,
    },
    AbsoluteDual {
        up: Option<f64>,
        down: Option<f64>,
    },
    PercentSingle {
        condition: Condition,
        percent_threshold: Option<f64>,
    },
    PercentDual {
        up_pct: Option<f64>,
        down_pct: Option<f64>,
    },
    /// The record carries neither a dual-direction pair nor a condition.
    Unset,
}

impl Alert {
    /// Classify the record's threshold fields.
    ///
    /// Dual-direction fields win over the legacy single-direction pair; a
    /// record with neither is `Unset`. The same precedence drives
    /// [`Alert::label`].
    pub fn threshold(&self) -> ThresholdView {
        match self.alert_type {
            AlertType::Percent => {
                if self.alert_up_pct.is_some() || self.alert_down_pct.is_some() {
                    ThresholdView::PercentDual {
                        up_pct: self.alert_up_pct,
                        down_pct: self.alert_down_pct,
                    }
                } else if let Some(condition) = self.condition {
                    ThresholdView::PercentSingle {
                        condition,
                        percent_threshold: self.percent_threshold,
                    }
                } else {
                    ThresholdView::Unset
                }
            }
            AlertType::Absolute => {
                if self.threshold_price_up.is_some() || self.threshold_price_down.is_some() {
                    ThresholdView::AbsoluteDual {
                        up: self.threshold_price_up,
                        down: self.threshold_price_down,
                    }
                } else if let Some(condition) = self.condition {
                    ThresholdView::AbsoluteSingle {
                        condition,
                        threshold_price: self.threshold_price,
                    }
                } else {
                    ThresholdView::Unset
                }
            }
        }
    }

    /// Human-readable threshold summary, e.g. `above 150` or `↑ 5% / ↓ 3%`.
    ///
    /// A dual-direction side the server omitted renders as `?`; a record
    /// with no usable fields renders as `—`.
    pub fn label(&self) -> String {
        match self.threshold() {
            ThresholdView::PercentDual { up_pct, down_pct } => {
                format!("↑ {}% / ↓ {}%", opt_num(up_pct), opt_num(down_pct))
            }
            ThresholdView::PercentSingle {
                condition,
                percent_threshold,
            } => format!("{} {}%", condition, opt_num(percent_threshold)),
            ThresholdView::AbsoluteDual { up, down } => {
                format!("↑ {} / ↓ {}", opt_num(up), opt_num(down))
            }
            ThresholdView::AbsoluteSingle {
                condition,
                threshold_price,
            } => format!("{} {}", condition, opt_num(threshold_price)),
            ThresholdView::Unset => "—".to_string(),
        }
    }
}

/// Render an optional number the way the service's own clients do: trailing
/// fractional zeros dropped, missing value shown as `?`.
fn opt_num(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "?".to_string())
}

// ===== Auth =====

/// Bearer token issued by login/signup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Account record from `GET /auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub plan_type: PlanType,
    #[serde(default)]
    pub plan_expiry: Option<NaiveDateTime>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// Entitlement tier. Opaque to this client beyond the free/paid split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    #[default]
    Free,
    Paid,
}

impl std::fmt::Display for PlanType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanType::Free => write!(f, "free"),
            PlanType::Paid => write!(f, "paid"),
        }
    }
}

// ===== Subscriptions =====

/// Lifecycle state of a store subscription, as the service reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionState {
    Active,
    GracePeriod,
    Expired,
    Canceled,
    #[default]
    Free,
    /// A state this client does not know yet. The service owns the enum.
    #[serde(other)]
    Unknown,
}

/// Entitlement snapshot from `GET /subscriptions/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionStatus {
    #[serde(default)]
    pub plan_type: PlanType,
    #[serde(default)]
    pub status: SubscriptionState,
    #[serde(default)]
    pub expiry_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub product_id: Option<String>,
}

impl SubscriptionStatus {
    /// Plan the subscription state actually grants right now. An active or
    /// grace-period subscription is paid regardless of the stored tier.
    pub fn effective_plan(&self) -> PlanType {
        match self.status {
            SubscriptionState::Active | SubscriptionState::GracePeriod => PlanType::Paid,
            _ => PlanType::Free,
        }
    }
}

/// App store a receipt came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Ios,
    Android,
}

/// Receipt verification request for `POST /subscriptions/verify`.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyRequest {
    pub platform: Platform,
    pub receipt_data: String,
    pub product_id: String,
}

/// Outcome of a receipt verification.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub subscription: Option<SubscriptionStatus>,
}

// ===== Push tokens & jobs =====

/// Device token registration for `POST /push-tokens`.
#[derive(Debug, Clone, Serialize)]
pub struct PushTokenRegistration {
    pub token: String,
    pub device_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
}

/// Response from `POST /push-tokens/test`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestPushResponse {
    pub message: String,
    #[serde(default)]
    pub token_count: u32,
}

/// A triggered alert reference in a job result. Older servers send bare ids,
/// newer ones send objects; both are tolerated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TriggeredAlert {
    Id(i64),
    Entry { id: i64 },
}

impl TriggeredAlert {
    pub fn id(&self) -> i64 {
        match *self {
            TriggeredAlert::Id(id) | TriggeredAlert::Entry { id } => id,
        }
    }
}

/// Result of a manual `POST /jobs/run-alert-check`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRunResult {
    #[serde(default)]
    pub triggered_alerts: Vec<TriggeredAlert>,
    #[serde(default)]
    pub token_count: u32,
}

// ===== Alert history & stats =====

/// Direction of a recorded trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// One fired alert from `GET /alerts/history`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertHistoryItem {
    pub id: i64,
    pub ticker: String,
    #[serde(default)]
    pub asset_class: Option<String>,
    pub triggered_at: NaiveDateTime,
    pub trigger_price: f64,
    #[serde(default)]
    pub base_price: Option<f64>,
    pub alert_type: AlertType,
    pub direction: Direction,
    #[serde(default)]
    pub threshold_value: Option<f64>,
    #[serde(default)]
    pub price_change_pct: Option<f64>,
    #[serde(default)]
    pub notification_sent: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertHistoryResponse {
    #[serde(default)]
    pub history: Vec<AlertHistoryItem>,
    #[serde(default)]
    pub total: Option<u32>,
}

/// Aggregates from `GET /alerts/stats/summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertStatsSummary {
    pub total_triggers: u32,
    pub notification_success_rate: f64,
    pub up_triggers: u32,
    pub down_triggers: u32,
    pub up_percentage: f64,
    pub down_percentage: f64,
}

// ===== Portfolio =====

/// A stored position, as created and edited by the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioItem {
    pub id: i64,
    pub ticker: String,
    #[serde(default)]
    pub asset_class: Option<String>,
    pub quantity: f64,
    pub purchase_price: f64,
    pub purchase_date: NaiveDateTime,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

/// Creation payload for `POST /portfolio`.
#[derive(Debug, Clone, Serialize)]
pub struct NewPortfolioItem {
    pub ticker: String,
    pub quantity: f64,
    pub purchase_price: f64,
    pub purchase_date: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl NewPortfolioItem {
    pub(crate) fn validate(&self) -> Result<(), ApiError> {
        if self.ticker.trim().is_empty() {
            return Err(ApiError::validation("ticker must not be empty"));
        }
        if self.quantity <= 0.0 {
            return Err(ApiError::validation(format!(
                "quantity must be positive, got {}",
                self.quantity
            )));
        }
        if self.purchase_price <= 0.0 {
            return Err(ApiError::validation(format!(
                "purchase_price must be positive, got {}",
                self.purchase_price
            )));
        }
        Ok(())
    }
}

/// Partial update for `PUT /portfolio/{id}`. Absent fields are untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PortfolioItemUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl PortfolioItemUpdate {
    pub(crate) fn validate(&self) -> Result<(), ApiError> {
        if let Some(quantity) = self.quantity {
            if quantity <= 0.0 {
                return Err(ApiError::validation(format!(
                    "quantity must be positive, got {quantity}"
                )));
            }
        }
        if let Some(price) = self.purchase_price {
            if price <= 0.0 {
                return Err(ApiError::validation(format!(
                    "purchase_price must be positive, got {price}"
                )));
            }
        }
        Ok(())
    }
}

/// One line of the server-computed valuation. All arithmetic happens
/// server-side; the client only formats these numbers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationLine {
    pub id: i64,
    pub ticker: String,
    pub quantity: f64,
    pub purchase_price: f64,
    pub current_price: f64,
    pub value: f64,
    pub profit_loss: f64,
    pub profit_loss_pct: f64,
}

/// Precomputed valuation from `GET /portfolio/valuation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioValuation {
    pub total_value: f64,
    pub total_profit_loss: f64,
    pub total_profit_loss_pct: f64,
    #[serde(default)]
    pub items: Vec<ValuationLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformerRef {
    pub ticker: String,
    pub profit_loss_pct: f64,
}

/// Precomputed aggregates from `GET /portfolio/performance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioPerformance {
    #[serde(default)]
    pub winners: u32,
    #[serde(default)]
    pub losers: u32,
    #[serde(default)]
    pub best_performer: Option<PerformerRef>,
    #[serde(default)]
    pub worst_performer: Option<PerformerRef>,
}

// ===== Asset master & screenshot import =====

/// One entry of the searchable asset master.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub asset_id: i64,
    pub ticker: String,
    pub name: String,
    #[serde(default)]
    pub name_ja: Option<String>,
    pub asset_class: String,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub exchange: Option<String>,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default)]
    pub default_threshold_up: Option<f64>,
    #[serde(default)]
    pub default_threshold_down: Option<f64>,
}

/// Query filter for `GET /assets`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AssetFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popular_only: Option<bool>,
}

/// One candidate the screenshot analyzer extracted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedAsset {
    pub ticker: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub asset_class: Option<String>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// Response from `POST /screenshot/import`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenshotImportResponse {
    pub success: bool,
    #[serde(default)]
    pub extracted_assets: Vec<ExtractedAsset>,
    #[serde(default)]
    pub message: Option<String>,
}

// ===== Health =====

#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}
