//! Plain-text rendering for command output.
//!
//! Every number here was computed server-side; this module only formats.

use chrono::NaiveDateTime;
use num_format::{Locale, ToFormattedString};

use crate::models::{
    Alert, AlertHistoryItem, AlertStatsSummary, Asset, ExtractedAsset, PortfolioItem,
    PortfolioPerformance, PortfolioValuation,
};

/// Render alerts as a fixed-width table.
pub fn alerts_table(alerts: &[Alert]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<6} {:<10} {:<9} {:<24} {:<7} {:<9}\n",
        "ID", "SYMBOL", "TYPE", "THRESHOLD", "ACTIVE", "NOTIFIED"
    ));
    for alert in alerts {
        out.push_str(&format!(
            "{:<6} {:<10} {:<9} {:<24} {:<7} {:<9}\n",
            alert.id,
            alert.symbol,
            alert.alert_type.to_string(),
            alert.label(),
            if alert.is_active { "on" } else { "off" },
            if alert.notified { "yes" } else { "no" },
        ));
    }
    if alerts.is_empty() {
        out.push_str("(no alerts)\n");
    }
    out
}

/// Render one alert in full.
pub fn alert_detail(alert: &Alert) -> String {
    let mut out = String::new();
    out.push_str(&format!("Alert #{}\n", alert.id));
    out.push_str(&format!("  Symbol:    {}\n", alert.symbol));
    out.push_str(&format!("  Type:      {}\n", alert.alert_type));
    out.push_str(&format!("  Threshold: {}\n", alert.label()));
    if let Some(base) = alert.base_price {
        out.push_str(&format!("  Base:      {}\n", base));
    }
    out.push_str(&format!(
        "  Active:    {}\n",
        if alert.is_active { "on" } else { "off" }
    ));
    out.push_str(&format!(
        "  Notified:  {}\n",
        if alert.notified { "yes" } else { "no" }
    ));
    if let Some(at) = alert.last_notified_at {
        let price = alert
            .last_notified_price
            .map(|p| format!(" at {}", p))
            .unwrap_or_default();
        out.push_str(&format!("  Last fire: {}{}\n", ago(at), price));
    }
    if alert.notified {
        out.push_str("  This alert will not fire again until it is disabled and re-enabled.\n");
    }
    out
}

/// Render raw positions.
pub fn portfolio_table(items: &[PortfolioItem]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<6} {:<10} {:>12} {:>12} {:<12}\n",
        "ID", "TICKER", "QUANTITY", "PRICE", "PURCHASED"
    ));
    for item in items {
        out.push_str(&format!(
            "{:<6} {:<10} {:>12} {:>12} {:<12}\n",
            item.id,
            item.ticker,
            item.quantity,
            item.purchase_price,
            item.purchase_date.format("%Y-%m-%d"),
        ));
    }
    if items.is_empty() {
        out.push_str("(portfolio is empty)\n");
    }
    out
}

/// Render the server-computed valuation block.
pub fn valuation_summary(valuation: &PortfolioValuation) -> String {
    let mut out = String::new();
    out.push_str(&format!("Total value:  {}\n", format_money(valuation.total_value)));
    out.push_str(&format!(
        "Profit/loss:  {} ({:+.2}%)\n",
        format_money(valuation.total_profit_loss),
        valuation.total_profit_loss_pct
    ));
    if !valuation.items.is_empty() {
        out.push('\n');
        out.push_str(&format!(
            "{:<6} {:<10} {:>12} {:>12} {:>10}\n",
            "ID", "TICKER", "VALUE", "P/L", "P/L %"
        ));
        for line in &valuation.items {
            out.push_str(&format!(
                "{:<6} {:<10} {:>12} {:>12} {:>9.2}%\n",
                line.id,
                line.ticker,
                format_money(line.value),
                format_money(line.profit_loss),
                line.profit_loss_pct,
            ));
        }
    }
    out
}

/// Render the performance aggregates.
pub fn performance_summary(performance: &PortfolioPerformance) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Winners: {}   Losers: {}\n",
        performance.winners, performance.losers
    ));
    if let Some(best) = &performance.best_performer {
        out.push_str(&format!(
            "Best:  {} ({:+.2}%)\n",
            best.ticker, best.profit_loss_pct
        ));
    }
    if let Some(worst) = &performance.worst_performer {
        out.push_str(&format!(
            "Worst: {} ({:+.2}%)\n",
            worst.ticker, worst.profit_loss_pct
        ));
    }
    out
}

/// Render the trigger history, newest first as the service sends it.
pub fn history_list(items: &[AlertHistoryItem]) -> String {
    let mut out = String::new();
    for item in items {
        let arrow = match item.direction {
            crate::models::Direction::Up => "↑",
            crate::models::Direction::Down => "↓",
        };
        let change = item
            .price_change_pct
            .map(|pct| format!("{pct:+.2}%"))
            .unwrap_or_else(|| "--".to_string());
        out.push_str(&format!(
            "{:<10} {} {:<8} at {:<10} {}\n",
            item.ticker,
            arrow,
            change,
            item.trigger_price,
            ago(item.triggered_at),
        ));
    }
    if items.is_empty() {
        out.push_str("(no triggers yet)\n");
    }
    out
}

/// Render the stats summary block.
pub fn stats_summary(summary: &AlertStatsSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!("Triggers:     {}\n", summary.total_triggers));
    out.push_str(&format!(
        "Push success: {:.1}%\n",
        summary.notification_success_rate
    ));
    out.push_str(&format!(
        "Up:           {} ({:.1}%)\n",
        summary.up_triggers, summary.up_percentage
    ));
    out.push_str(&format!(
        "Down:         {} ({:.1}%)\n",
        summary.down_triggers, summary.down_percentage
    ));
    out
}

/// Render asset master search results.
pub fn assets_table(assets: &[Asset]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<10} {:<28} {:<14} {:<8}\n",
        "TICKER", "NAME", "CLASS", "POPULAR"
    ));
    for asset in assets {
        out.push_str(&format!(
            "{:<10} {:<28} {:<14} {:<8}\n",
            asset.ticker,
            asset.name_ja.as_deref().unwrap_or(&asset.name),
            asset.asset_class,
            if asset.is_popular { "yes" } else { "" },
        ));
    }
    if assets.is_empty() {
        out.push_str("(no matches)\n");
    }
    out
}

/// Render screenshot extraction candidates.
pub fn candidates_table(candidates: &[ExtractedAsset]) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{:<10} {:<24} {:>12} {:>11}\n",
        "TICKER", "NAME", "PRICE", "CONFIDENCE"
    ));
    for candidate in candidates {
        let price = candidate
            .current_price
            .map(|p| p.to_string())
            .unwrap_or_else(|| "?".to_string());
        let confidence = candidate
            .confidence
            .map(|c| format!("{:.0}%", c * 100.0))
            .unwrap_or_else(|| "?".to_string());
        out.push_str(&format!(
            "{:<10} {:<24} {:>12} {:>11}\n",
            candidate.ticker,
            candidate.name.as_deref().unwrap_or(""),
            price,
            confidence,
        ));
    }
    out
}

/// Format a dollar amount with thousands separators and two decimals.
pub fn format_money(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();
    let whole = abs.trunc() as i64;
    let cents = ((abs - abs.trunc()) * 100.0).round() as i64;
    let (whole, cents) = if cents >= 100 { (whole + 1, 0) } else { (whole, cents) };
    format!("{sign}${}.{:02}", whole.to_formatted_string(&Locale::en), cents)
}

/// Coarse "how long ago" rendering; sub-minute detail is noise here.
pub fn ago(timestamp: NaiveDateTime) -> String {
    let now = chrono::Utc::now().naive_utc();
    let secs = now.signed_duration_since(timestamp).num_seconds();
    if secs < 60 {
        return "just now".to_string();
    }
    let rounded = std::time::Duration::from_secs((secs - secs % 60) as u64);
    format!("{} ago", humantime::format_duration(rounded))
}
