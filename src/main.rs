//! Pricewatch - command-line client for the price alerting and portfolio
//! service.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use pricewatch::alerts::{AlertDraft, AlertUpdate, ThresholdSpec};
use pricewatch::api::{ApiClient, Timeouts};
use pricewatch::auth;
use pricewatch::cli::{AlertCommand, Cli, Command, PlanCommand, PortfolioCommand, PushCommand};
use pricewatch::config::Config;
use pricewatch::models::{
    AssetFilter, Condition, ExtractedAsset, NewPortfolioItem, PlanType, PortfolioItemUpdate,
    PushTokenRegistration, TriggeredAlert, VerifyRequest,
};
use pricewatch::output;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let json = cli.json;

    let mut config = if let Some(ref path) = cli.config {
        Config::load(path)?
    } else {
        Config::load_or_default()
    };
    if let Some(base_url) = cli.base_url.clone() {
        config.server.base_url = base_url;
    }

    let token_path = config
        .token_path
        .clone()
        .or_else(auth::default_token_path)
        .context("cannot determine a token cache location")?;

    let mut client = ApiClient::new(&config.server.base_url, &config.server.api_key)?
        .with_timeouts(Timeouts::from(config.timeouts));
    if let Some(token) = auth::load_token(&token_path) {
        client.set_token(token);
    }

    match cli.command {
        Command::Health => {
            let health = client.health().await?;
            println!("status: {}", health.status);
        }

        Command::Login { email, password } => {
            client.login(&email, &password).await?;
            store_session(&client, &token_path)?;
            println!("Logged in as {}", email.trim());
        }

        Command::Signup { email, password } => {
            client.signup(&email, &password).await?;
            store_session(&client, &token_path)?;
            println!("Account created for {}", email.trim());
        }

        Command::Logout => {
            client.logout();
            auth::clear_token(&token_path)?;
            println!("Logged out");
        }

        Command::Whoami => {
            require_auth(&client)?;
            let user = client.current_user().await?;
            let subscription = client.subscription_status().await.ok();
            let plan = subscription
                .as_ref()
                .map(|s| s.effective_plan())
                .unwrap_or(user.plan_type);
            println!("{} (plan: {})", user.email, plan);
            if let Some(expiry) = subscription.and_then(|s| s.expiry_date) {
                println!("plan expires: {}", expiry.format("%Y-%m-%d"));
            }
        }

        Command::Alert(command) => {
            require_auth(&client)?;
            run_alert_command(&client, command, json).await?;
        }

        Command::Portfolio(command) => {
            require_auth(&client)?;
            run_portfolio_command(&client, command, json).await?;
        }

        Command::Assets { class, query, popular } => {
            require_auth(&client)?;
            let filter = AssetFilter {
                asset_class: class,
                query,
                popular_only: popular.then_some(true),
            };
            let assets = client.search_assets(&filter).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&assets)?);
            } else {
                print!("{}", output::assets_table(&assets));
            }
        }

        Command::Push(command) => {
            require_auth(&client)?;
            match command {
                PushCommand::Register { token, device_id, platform } => {
                    let device_id = device_id
                        .or_else(|| config.push.device_id.clone())
                        .unwrap_or_else(|| "pricewatch-cli".to_string());
                    let registration = PushTokenRegistration {
                        token,
                        device_id: device_id.clone(),
                        platform: platform.map(Into::into),
                    };
                    client.register_push_token(&registration).await?;
                    println!("Push token registered for device {device_id}");
                }
                PushCommand::Test => {
                    let response = client.test_push().await?;
                    println!("{} ({} tokens)", response.message, response.token_count);
                }
            }
        }

        Command::Check => {
            require_auth(&client)?;
            let result = client.run_alert_check().await?;
            let ids: Vec<String> = result
                .triggered_alerts
                .iter()
                .map(|t| TriggeredAlert::id(t).to_string())
                .collect();
            if ids.is_empty() {
                println!("Triggered: none");
            } else {
                println!("Triggered: {}", ids.join(", "));
            }
            println!("Tokens notified: {}", result.token_count);
        }

        Command::Import { image, tickers, percent } => {
            require_auth(&client)?;
            run_import(&client, &image, tickers, percent).await?;
        }

        Command::Plan(command) => {
            require_auth(&client)?;
            match command {
                PlanCommand::Status => {
                    let status = client.subscription_status().await?;
                    if json {
                        println!("{}", serde_json::to_string_pretty(&status)?);
                    } else {
                        println!("plan:   {}", status.effective_plan());
                        println!("status: {:?}", status.status);
                        if let Some(expiry) = status.expiry_date {
                            println!("expiry: {}", expiry.format("%Y-%m-%d"));
                        }
                    }
                }
                PlanCommand::Verify { platform, receipt, product } => {
                    let request = VerifyRequest {
                        platform: platform.into(),
                        receipt_data: receipt,
                        product_id: product,
                    };
                    let response = client.verify_subscription(&request).await?;
                    if !response.success {
                        bail!(
                            "verification failed: {}",
                            response.message.unwrap_or_else(|| "unknown error".to_string())
                        );
                    }
                    println!("Receipt verified");
                    if let Some(subscription) = response.subscription {
                        println!("plan: {}", subscription.effective_plan());
                    }
                }
            }
        }
    }

    Ok(())
}

/// Persist the freshly issued token for later invocations.
fn store_session(client: &ApiClient, token_path: &Path) -> Result<()> {
    let token = client
        .auth()
        .token()
        .context("login succeeded but no token was issued")?;
    auth::store_token(token_path, token)
}

fn require_auth(client: &ApiClient) -> Result<()> {
    if !client.auth().is_authenticated() {
        bail!("not logged in; run `pricewatch login` first");
    }
    Ok(())
}

async fn run_alert_command(client: &ApiClient, command: AlertCommand, json: bool) -> Result<()> {
    match command {
        AlertCommand::List => {
            let alerts = client.list_alerts().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&alerts)?);
            } else {
                print!("{}", output::alerts_table(&alerts));
            }
        }

        AlertCommand::Get { id } => {
            let alert = client.get_alert(id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&alert)?);
            } else {
                print!("{}", output::alert_detail(&alert));
            }
        }

        AlertCommand::Create { symbol, kind, condition, threshold, up, down, base_price } => {
            let spec = ThresholdSpec::from_parts(
                kind.into(),
                condition.map(Into::into),
                threshold,
                up,
                down,
                base_price,
            )?;
            let draft = AlertDraft::new(&symbol, spec)?;
            let created = client.create_alert(&draft).await?;
            println!("Created alert #{}: {} {}", created.id, created.symbol, created.label());
        }

        AlertCommand::Enable { id } => {
            let updated = client.update_alert(id, &AlertUpdate::reactivate()).await?;
            println!("Alert #{} enabled ({})", updated.id, updated.label());
        }

        AlertCommand::Disable { id } => {
            let updated = client.update_alert(id, &AlertUpdate::deactivate()).await?;
            println!("Alert #{} disabled", updated.id);
        }

        AlertCommand::Edit { id, condition, threshold, up, down, base_price, reset_base } => {
            let alert = client.get_alert(id).await?;
            let touches_thresholds = condition.is_some()
                || threshold.is_some()
                || up.is_some()
                || down.is_some()
                || base_price.is_some();

            let update = if touches_thresholds {
                let spec = ThresholdSpec::from_parts(
                    alert.alert_type,
                    condition.map(Into::into),
                    threshold,
                    up,
                    down,
                    base_price,
                )?;
                let update = AlertUpdate::edit(alert.alert_type, spec)?;
                if reset_base {
                    update.and_reset_base_price()?
                } else {
                    update
                }
            } else if reset_base {
                AlertUpdate::reset_base_price()
            } else {
                bail!("nothing to change; pass threshold flags or --reset-base");
            };

            update.ensure_permitted(effective_plan(client).await)?;
            let updated = client.update_alert(id, &update).await?;
            println!("Alert #{} updated: {}", updated.id, updated.label());
        }

        AlertCommand::Delete { id } => {
            client.delete_alert(id).await?;
            println!("Alert #{id} deleted");
        }

        AlertCommand::History { days } => {
            let response = client.alert_history(days).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print!("{}", output::history_list(&response.history));
            }
        }

        AlertCommand::Stats { days } => {
            let summary = client.alert_stats(days).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print!("{}", output::stats_summary(&summary));
            }
        }
    }
    Ok(())
}

async fn run_portfolio_command(
    client: &ApiClient,
    command: PortfolioCommand,
    json: bool,
) -> Result<()> {
    match command {
        PortfolioCommand::List => {
            let items = client.list_portfolio().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                print!("{}", output::portfolio_table(&items));
            }
        }

        PortfolioCommand::Get { id } => {
            let item = client.get_portfolio_item(id).await?;
            println!("{}", serde_json::to_string_pretty(&item)?);
        }

        PortfolioCommand::Add { ticker, quantity, price, date, class, notes } => {
            let item = NewPortfolioItem {
                ticker,
                quantity,
                purchase_price: price,
                purchase_date: parse_purchase_date(&date)?,
                asset_class: class,
                notes,
            };
            let created = client.create_portfolio_item(&item).await?;
            println!("Added {} as position #{}", created.ticker, created.id);
        }

        PortfolioCommand::Edit { id, quantity, price, date, notes } => {
            let update = PortfolioItemUpdate {
                quantity,
                purchase_price: price,
                purchase_date: date.as_deref().map(parse_purchase_date).transpose()?,
                notes,
            };
            let updated = client.update_portfolio_item(id, &update).await?;
            println!("Position #{} updated", updated.id);
        }

        PortfolioCommand::Remove { id } => {
            client.delete_portfolio_item(id).await?;
            println!("Position #{id} removed");
        }

        PortfolioCommand::Summary => {
            let (valuation, performance) = futures::try_join!(
                client.portfolio_valuation(),
                client.portfolio_performance()
            )?;
            if json {
                println!(
                    "{}",
                    serde_json::json!({
                        "valuation": serde_json::to_value(&valuation)?,
                        "performance": serde_json::to_value(&performance)?,
                    })
                );
            } else {
                print!("{}", output::valuation_summary(&valuation));
                println!();
                print!("{}", output::performance_summary(&performance));
            }
        }
    }
    Ok(())
}

async fn run_import(
    client: &ApiClient,
    image: &Path,
    tickers: Option<Vec<String>>,
    percent: f64,
) -> Result<()> {
    let response = client.import_screenshot(image).await?;
    if !response.success {
        bail!(
            "analysis failed: {}",
            response.message.unwrap_or_else(|| "unknown error".to_string())
        );
    }
    if response.extracted_assets.is_empty() {
        println!("No assets detected; try another image.");
        return Ok(());
    }
    print!("{}", output::candidates_table(&response.extracted_assets));

    let keep: Vec<ExtractedAsset> = match tickers {
        Some(list) => {
            let wanted: HashSet<String> = list.iter().map(|t| t.to_uppercase()).collect();
            response
                .extracted_assets
                .into_iter()
                .filter(|c| wanted.contains(&c.ticker.to_uppercase()))
                .collect()
        }
        None => response.extracted_assets,
    };
    if keep.is_empty() {
        bail!("none of the requested tickers were detected");
    }

    let mut created = 0usize;
    for candidate in &keep {
        let spec = ThresholdSpec::Percent {
            condition: Condition::Above,
            percent_threshold: percent,
            base_price: candidate.current_price,
        };
        let draft = AlertDraft::new(&candidate.ticker, spec)?;
        match client.create_alert(&draft).await {
            Ok(alert) => {
                created += 1;
                println!("Created alert #{} for {}", alert.id, alert.symbol);
            }
            Err(e) => warn!("failed to create alert for {}: {}", candidate.ticker, e),
        }
    }
    println!("Imported {created} of {} candidates", keep.len());
    Ok(())
}

/// Plan used for the advisory client-side gate. When the plan cannot be
/// determined, the gate stays open and the server decides on its own.
async fn effective_plan(client: &ApiClient) -> PlanType {
    match client.subscription_status().await {
        Ok(status) => status.effective_plan(),
        Err(_) => match client.current_user().await {
            Ok(user) => user.plan_type,
            Err(_) => PlanType::Paid,
        },
    }
}

fn parse_purchase_date(date: &str) -> Result<chrono::NaiveDateTime> {
    let day = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("invalid date {date:?}, expected YYYY-MM-DD"))?;
    day.and_hms_opt(0, 0, 0)
        .context("invalid purchase date")
}
