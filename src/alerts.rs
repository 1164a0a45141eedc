//! Alert creation and mutation payloads.
//!
//! The service stores an alert as one flat record, and several of its field
//! combinations are contractually invalid (percent fields on an absolute
//! alert, a base-price reset next to an explicit base price, a reactivation
//! that leaves the notified latch set). This module is the only place that
//! builds write payloads, and its constructors make those combinations
//! unrepresentable.

use serde::Serialize;

use crate::error::ApiError;
use crate::models::{AlertType, Condition, PlanType};

/// Threshold configuration, keyed by alert type and direction mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThresholdSpec {
    /// One absolute price boundary, crossed in one direction.
    Absolute {
        condition: Condition,
        threshold_price: f64,
    },
    /// Independent absolute boundaries above and below.
    AbsoluteDual { up: f64, down: f64 },
    /// One percentage move from `base_price`. The service anchors the base
    /// at the current market price when it is omitted.
    Percent {
        condition: Condition,
        percent_threshold: f64,
        base_price: Option<f64>,
    },
    /// Independent percentage moves above and below `base_price`.
    PercentDual {
        up_pct: f64,
        down_pct: f64,
        base_price: f64,
    },
}

impl ThresholdSpec {
    pub fn alert_type(&self) -> AlertType {
        match self {
            ThresholdSpec::Absolute { .. } | ThresholdSpec::AbsoluteDual { .. } => {
                AlertType::Absolute
            }
            ThresholdSpec::Percent { .. } | ThresholdSpec::PercentDual { .. } => AlertType::Percent,
        }
    }

    /// Assemble a spec from loose CLI-style parts. Dual-direction values win
    /// when present; otherwise a condition plus a single threshold is
    /// required.
    pub fn from_parts(
        alert_type: AlertType,
        condition: Option<Condition>,
        threshold: Option<f64>,
        up: Option<f64>,
        down: Option<f64>,
        base_price: Option<f64>,
    ) -> Result<Self, ApiError> {
        if up.is_some() || down.is_some() {
            let (Some(up), Some(down)) = (up, down) else {
                return Err(ApiError::validation(
                    "a dual-direction alert needs both an up and a down threshold",
                ));
            };
            return match alert_type {
                AlertType::Absolute => Ok(ThresholdSpec::AbsoluteDual { up, down }),
                AlertType::Percent => {
                    let Some(base_price) = base_price else {
                        return Err(ApiError::validation(
                            "a dual-direction percent alert needs a base price",
                        ));
                    };
                    Ok(ThresholdSpec::PercentDual {
                        up_pct: up,
                        down_pct: down,
                        base_price,
                    })
                }
            };
        }

        let (Some(condition), Some(threshold)) = (condition, threshold) else {
            return Err(ApiError::validation(
                "a single-direction alert needs a condition and a threshold",
            ));
        };
        match alert_type {
            AlertType::Absolute => Ok(ThresholdSpec::Absolute {
                condition,
                threshold_price: threshold,
            }),
            AlertType::Percent => Ok(ThresholdSpec::Percent {
                condition,
                percent_threshold: threshold,
                base_price,
            }),
        }
    }

    fn validate(&self) -> Result<(), ApiError> {
        match *self {
            ThresholdSpec::Absolute {
                threshold_price, ..
            } => positive("threshold_price", threshold_price),
            ThresholdSpec::AbsoluteDual { up, down } => {
                positive("threshold_price_up", up)?;
                positive("threshold_price_down", down)
            }
            ThresholdSpec::Percent {
                percent_threshold,
                base_price,
                ..
            } => {
                positive("percent_threshold", percent_threshold)?;
                match base_price {
                    Some(base) => positive("base_price", base),
                    None => Ok(()),
                }
            }
            ThresholdSpec::PercentDual {
                up_pct,
                down_pct,
                base_price,
            } => {
                positive("alert_up_pct", up_pct)?;
                positive("alert_down_pct", down_pct)?;
                positive("base_price", base_price)
            }
        }
    }
}

fn positive(name: &str, value: f64) -> Result<(), ApiError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(ApiError::validation(format!(
            "{name} must be positive, got {value}"
        )))
    }
}

/// A validated alert creation request.
///
/// Serializes to the flat shape `POST /alerts` expects, with `is_active`
/// always true; a brand-new alert that starts paused is not a thing the
/// product has.
#[derive(Debug, Clone, Serialize)]
pub struct AlertDraft {
    symbol: String,
    alert_type: AlertType,
    #[serde(skip_serializing_if = "Option::is_none")]
    condition: Option<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    threshold_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    percent_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    threshold_price_up: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    threshold_price_down: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alert_up_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alert_down_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    base_price: Option<f64>,
    is_active: bool,
}

impl AlertDraft {
    pub fn new(symbol: &str, threshold: ThresholdSpec) -> Result<Self, ApiError> {
        let symbol = symbol.trim();
        if symbol.is_empty() {
            return Err(ApiError::validation("symbol must not be empty"));
        }
        threshold.validate()?;

        let mut draft = AlertDraft {
            symbol: symbol.to_string(),
            alert_type: threshold.alert_type(),
            condition: None,
            threshold_price: None,
            percent_threshold: None,
            threshold_price_up: None,
            threshold_price_down: None,
            alert_up_pct: None,
            alert_down_pct: None,
            base_price: None,
            is_active: true,
        };
        match threshold {
            ThresholdSpec::Absolute {
                condition,
                threshold_price,
            } => {
                draft.condition = Some(condition);
                draft.threshold_price = Some(threshold_price);
            }
            ThresholdSpec::AbsoluteDual { up, down } => {
                draft.threshold_price_up = Some(up);
                draft.threshold_price_down = Some(down);
            }
            ThresholdSpec::Percent {
                condition,
                percent_threshold,
                base_price,
            } => {
                draft.condition = Some(condition);
                draft.percent_threshold = Some(percent_threshold);
                draft.base_price = base_price;
            }
            ThresholdSpec::PercentDual {
                up_pct,
                down_pct,
                base_price,
            } => {
                draft.alert_up_pct = Some(up_pct);
                draft.alert_down_pct = Some(down_pct);
                draft.base_price = Some(base_price);
            }
        }
        Ok(draft)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn alert_type(&self) -> AlertType {
        self.alert_type
    }
}

/// A validated partial-update payload for `PUT /alerts/{id}`.
///
/// Only the named constructors can build one, so the field combinations
/// they produce are the only ones this client ever sends.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AlertUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    condition: Option<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    threshold_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    percent_threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    threshold_price_up: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    threshold_price_down: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alert_up_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    alert_down_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    base_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reset_base_price: Option<bool>,
}

impl AlertUpdate {
    /// Stop the evaluator from considering this alert. The notified latch is
    /// deliberately left untouched.
    pub fn deactivate() -> Self {
        AlertUpdate {
            is_active: Some(false),
            ..AlertUpdate::default()
        }
    }

    /// Re-arm an alert. The off→on transition must clear the notified latch
    /// in the same request, or the alert stays latched forever and never
    /// fires again; the two fields therefore travel together unconditionally.
    pub fn reactivate() -> Self {
        AlertUpdate {
            is_active: Some(true),
            notified: Some(false),
            ..AlertUpdate::default()
        }
    }

    /// Ask the service to re-anchor `base_price` at the current market price.
    pub fn reset_base_price() -> Self {
        AlertUpdate {
            reset_base_price: Some(true),
            ..AlertUpdate::default()
        }
    }

    /// Replace the threshold configuration of an existing alert.
    ///
    /// `current_type` is the alert's stored `alert_type`, which is immutable;
    /// a spec for the other type is a caller error, caught here before it
    /// reaches the wire.
    pub fn edit(current_type: AlertType, threshold: ThresholdSpec) -> Result<Self, ApiError> {
        if threshold.alert_type() != current_type {
            return Err(ApiError::validation(format!(
                "cannot apply {} thresholds to an {} alert",
                threshold.alert_type(),
                current_type
            )));
        }
        threshold.validate()?;

        let mut update = AlertUpdate::default();
        match threshold {
            ThresholdSpec::Absolute {
                condition,
                threshold_price,
            } => {
                update.condition = Some(condition);
                update.threshold_price = Some(threshold_price);
            }
            ThresholdSpec::AbsoluteDual { up, down } => {
                update.threshold_price_up = Some(up);
                update.threshold_price_down = Some(down);
            }
            ThresholdSpec::Percent {
                condition,
                percent_threshold,
                base_price,
            } => {
                update.condition = Some(condition);
                update.percent_threshold = Some(percent_threshold);
                update.base_price = base_price;
            }
            ThresholdSpec::PercentDual {
                up_pct,
                down_pct,
                base_price,
            } => {
                update.alert_up_pct = Some(up_pct);
                update.alert_down_pct = Some(down_pct);
                update.base_price = Some(base_price);
            }
        }
        Ok(update)
    }

    /// Chain a base-price reset onto a threshold edit.
    ///
    /// The service treats `reset_base_price` and an explicit `base_price` as
    /// mutually exclusive, so an edit that already carries one is rejected.
    pub fn and_reset_base_price(mut self) -> Result<Self, ApiError> {
        if self.base_price.is_some() {
            return Err(ApiError::validation(
                "reset_base_price cannot be combined with an explicit base_price",
            ));
        }
        self.reset_base_price = Some(true);
        Ok(self)
    }

    /// True when the payload touches fields the free plan may not change.
    pub fn requires_paid_plan(&self) -> bool {
        self.condition.is_some()
            || self.threshold_price.is_some()
            || self.percent_threshold.is_some()
            || self.threshold_price_up.is_some()
            || self.threshold_price_down.is_some()
            || self.alert_up_pct.is_some()
            || self.alert_down_pct.is_some()
            || self.base_price.is_some()
            || self.reset_base_price.is_some()
    }

    /// Advisory entitlement check mirroring the server's. It saves the round
    /// trip; the server still rejects on its own authority.
    pub fn ensure_permitted(&self, plan: PlanType) -> Result<(), ApiError> {
        if plan == PlanType::Free && self.requires_paid_plan() {
            return Err(ApiError::PlanRestriction(
                "threshold changes require the paid plan; only activation toggles are free"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json(value: &impl Serialize) -> serde_json::Value {
        serde_json::to_value(value).unwrap()
    }

    #[test]
    fn test_draft_rejects_blank_symbol() {
        let spec = ThresholdSpec::Absolute {
            condition: Condition::Above,
            threshold_price: 150.0,
        };
        assert!(matches!(
            AlertDraft::new("   ", spec),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_draft_trims_symbol() {
        let spec = ThresholdSpec::Absolute {
            condition: Condition::Above,
            threshold_price: 150.0,
        };
        let draft = AlertDraft::new(" AAPL ", spec).unwrap();
        assert_eq!(draft.symbol(), "AAPL");
    }

    #[test]
    fn test_draft_rejects_non_positive_percent() {
        let spec = ThresholdSpec::Percent {
            condition: Condition::Above,
            percent_threshold: 0.0,
            base_price: None,
        };
        assert!(matches!(
            AlertDraft::new("AAPL", spec),
            Err(ApiError::Validation(_))
        ));

        let spec = ThresholdSpec::Percent {
            condition: Condition::Above,
            percent_threshold: -5.0,
            base_price: None,
        };
        assert!(AlertDraft::new("AAPL", spec).is_err());
    }

    #[test]
    fn test_draft_rejects_non_positive_dual_side() {
        let spec = ThresholdSpec::AbsoluteDual { up: 160.0, down: 0.0 };
        assert!(AlertDraft::new("AAPL", spec).is_err());
    }

    #[test]
    fn test_draft_absolute_payload_shape() {
        let draft = AlertDraft::new(
            "AAPL",
            ThresholdSpec::Absolute {
                condition: Condition::Above,
                threshold_price: 150.0,
            },
        )
        .unwrap();
        assert_eq!(
            json(&draft),
            serde_json::json!({
                "symbol": "AAPL",
                "alert_type": "absolute",
                "condition": "above",
                "threshold_price": 150.0,
                "is_active": true
            })
        );
    }

    #[test]
    fn test_draft_percent_dual_payload_shape() {
        let draft = AlertDraft::new(
            "BTC-USD",
            ThresholdSpec::PercentDual {
                up_pct: 5.0,
                down_pct: 3.0,
                base_price: 100.0,
            },
        )
        .unwrap();
        assert_eq!(
            json(&draft),
            serde_json::json!({
                "symbol": "BTC-USD",
                "alert_type": "percent",
                "alert_up_pct": 5.0,
                "alert_down_pct": 3.0,
                "base_price": 100.0,
                "is_active": true
            })
        );
    }

    #[test]
    fn test_deactivate_never_touches_notified() {
        assert_eq!(
            json(&AlertUpdate::deactivate()),
            serde_json::json!({ "is_active": false })
        );
    }

    #[test]
    fn test_reactivate_always_clears_notified() {
        assert_eq!(
            json(&AlertUpdate::reactivate()),
            serde_json::json!({ "is_active": true, "notified": false })
        );
    }

    #[test]
    fn test_reset_base_price_payload() {
        assert_eq!(
            json(&AlertUpdate::reset_base_price()),
            serde_json::json!({ "reset_base_price": true })
        );
    }

    #[test]
    fn test_edit_rejects_type_mismatch() {
        let percent_spec = ThresholdSpec::Percent {
            condition: Condition::Above,
            percent_threshold: 5.0,
            base_price: None,
        };
        assert!(matches!(
            AlertUpdate::edit(AlertType::Absolute, percent_spec),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_edit_only_sends_matching_fields() {
        let update = AlertUpdate::edit(
            AlertType::Absolute,
            ThresholdSpec::AbsoluteDual {
                up: 160.0,
                down: 140.0,
            },
        )
        .unwrap();
        assert_eq!(
            json(&update),
            serde_json::json!({
                "threshold_price_up": 160.0,
                "threshold_price_down": 140.0
            })
        );
    }

    #[test]
    fn test_reset_conflicts_with_explicit_base_price() {
        let update = AlertUpdate::edit(
            AlertType::Percent,
            ThresholdSpec::Percent {
                condition: Condition::Above,
                percent_threshold: 5.0,
                base_price: Some(100.0),
            },
        )
        .unwrap();
        assert!(matches!(
            update.and_reset_base_price(),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_reset_chains_onto_base_free_edit() {
        let update = AlertUpdate::edit(
            AlertType::Percent,
            ThresholdSpec::Percent {
                condition: Condition::Above,
                percent_threshold: 5.0,
                base_price: None,
            },
        )
        .unwrap()
        .and_reset_base_price()
        .unwrap();
        assert_eq!(
            json(&update),
            serde_json::json!({
                "condition": "above",
                "percent_threshold": 5.0,
                "reset_base_price": true
            })
        );
    }

    #[test]
    fn test_free_plan_blocks_threshold_edits() {
        let update = AlertUpdate::edit(
            AlertType::Absolute,
            ThresholdSpec::Absolute {
                condition: Condition::Above,
                threshold_price: 150.0,
            },
        )
        .unwrap();
        assert!(matches!(
            update.ensure_permitted(PlanType::Free),
            Err(ApiError::PlanRestriction(_))
        ));
        assert!(update.ensure_permitted(PlanType::Paid).is_ok());
    }

    #[test]
    fn test_free_plan_allows_activation_toggles() {
        assert!(AlertUpdate::deactivate().ensure_permitted(PlanType::Free).is_ok());
        assert!(AlertUpdate::reactivate().ensure_permitted(PlanType::Free).is_ok());
    }

    #[test]
    fn test_free_plan_blocks_base_price_reset() {
        assert!(matches!(
            AlertUpdate::reset_base_price().ensure_permitted(PlanType::Free),
            Err(ApiError::PlanRestriction(_))
        ));
    }

    #[test]
    fn test_from_parts_dual_needs_both_sides() {
        let result = ThresholdSpec::from_parts(
            AlertType::Absolute,
            None,
            None,
            Some(160.0),
            None,
            None,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_from_parts_percent_dual_needs_base() {
        let result = ThresholdSpec::from_parts(
            AlertType::Percent,
            None,
            None,
            Some(5.0),
            Some(3.0),
            None,
        );
        assert!(result.is_err());

        let spec = ThresholdSpec::from_parts(
            AlertType::Percent,
            None,
            None,
            Some(5.0),
            Some(3.0),
            Some(100.0),
        )
        .unwrap();
        assert_eq!(
            spec,
            ThresholdSpec::PercentDual {
                up_pct: 5.0,
                down_pct: 3.0,
                base_price: 100.0
            }
        );
    }

    #[test]
    fn test_from_parts_single_needs_condition_and_threshold() {
        let result =
            ThresholdSpec::from_parts(AlertType::Absolute, Some(Condition::Above), None, None, None, None);
        assert!(result.is_err());

        let spec = ThresholdSpec::from_parts(
            AlertType::Absolute,
            Some(Condition::Above),
            Some(150.0),
            None,
            None,
            None,
        )
        .unwrap();
        assert_eq!(
            spec,
            ThresholdSpec::Absolute {
                condition: Condition::Above,
                threshold_price: 150.0
            }
        );
    }
}
