//! estate-replay: runs a JSON command script against an in-memory estate.
//!
//! The script opens one estate and applies its steps in order:
//!
//! ```json
//! {
//!   "actor": "executor-1",
//!   "create": { "date_of_death": "2024-01-05", "currency": "KES" },
//!   "steps": [
//!     { "command": "activate" },
//!     { "command": "add_debt", "bind": "funeral", "kind": "FUNERAL_EXPENSE",
//!       "creditor": "Lee Funeral Home", "incurred_date": "2024-01-06",
//!       "amount": { "amount": "1000", "currency": "KES" } },
//!     { "command": "dispute_debt", "debt_id": "@funeral", "reason": "overbilled" }
//!   ]
//! }
//! ```
//!
//! A step's `bind` names the id the step creates; later steps refer to it
//! as `"@name"`. Committed events are relayed through the tracing
//! publisher, and the per-step replies plus the final estate view are
//! printed as JSON.

use anyhow::{Context, bail};
use clap::Parser;
use estate_settlement::application::commands::{CommandOutput, CommandReply, CreateEstate, EstateCommand};
use estate_settlement::application::services::EstateService;
use estate_settlement::application::views::EstateView;
use estate_settlement::config::SettlementConfig;
use estate_settlement::domain::value_objects::UserId;
use estate_settlement::infrastructure::events::{OutboxRelay, TracingEventPublisher};
use estate_settlement::infrastructure::persistence::in_memory::InMemoryEstateRepository;
use estate_settlement::telemetry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "estate-replay", version, about = "Replay an estate command script")]
struct Args {
    /// Path to the JSON script.
    script: PathBuf,

    /// Configuration file; defaults to ./estate-settlement.toml if present.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Stop at the first rejected step.
    #[arg(long)]
    stop_on_error: bool,

    /// Pretty-print the report.
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Deserialize)]
struct Script {
    actor: UserId,
    create: CreateEstate,
    #[serde(default)]
    steps: Vec<Value>,
}

#[derive(Debug, Serialize)]
struct Report {
    replies: Vec<CommandReply>,
    delivered_events: usize,
    estate: EstateView,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let settings = SettlementConfig::load(args.config.as_deref()).context("loading configuration")?;
    telemetry::init_tracing(&settings.log)?;

    let raw = std::fs::read_to_string(&args.script)
        .with_context(|| format!("reading {}", args.script.display()))?;
    let script: Script = serde_json::from_str(&raw).context("parsing script")?;

    let repository = InMemoryEstateRepository::new();
    let service = EstateService::new(
        Arc::new(repository.clone()),
        settings.inflation.build_adjuster()?,
        settings.service_config(),
    );
    info!(adjuster = service.adjuster_name(), steps = script.steps.len(), "replaying script");

    let estate_id = service.create(script.create, &script.actor).await?.id;
    let mut bindings = HashMap::new();
    let mut replies = Vec::with_capacity(script.steps.len());

    for (index, mut step) in script.steps.into_iter().enumerate() {
        let label = take_label(&mut step);
        resolve_labels(&mut step, &bindings).with_context(|| format!("step {index}"))?;
        let command: EstateCommand =
            serde_json::from_value(step).with_context(|| format!("step {index} is not a command"))?;

        let result = service
            .execute_with_retry(estate_id, command, &script.actor)
            .await;
        let rejected = match &result {
            Ok(committed) => {
                if let (Some(label), Some(id)) = (&label, created_id(&committed.output)) {
                    bindings.insert(label.clone(), id);
                }
                false
            }
            Err(err) => {
                warn!(step = index, kind = ?err.kind(), error = %err, "step rejected");
                true
            }
        };
        replies.push(CommandReply::from(result));
        if rejected && args.stop_on_error {
            break;
        }
    }

    let relay = OutboxRelay::new(Arc::new(repository), Arc::new(TracingEventPublisher));
    let delivered_events = relay.drain().await?;
    info!(delivered_events, "outbox drained");

    let report = Report {
        replies,
        delivered_events,
        estate: service.view(estate_id).await?,
    };
    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}

fn take_label(step: &mut Value) -> Option<String> {
    step.as_object_mut()
        .and_then(|fields| fields.remove("bind"))
        .and_then(|value| value.as_str().map(str::to_string))
}

fn resolve_labels(value: &mut Value, bindings: &HashMap<String, String>) -> anyhow::Result<()> {
    match value {
        Value::String(text) => {
            if let Some(label) = text.strip_prefix('@') {
                let Some(id) = bindings.get(label) else {
                    bail!("unknown label `@{label}`");
                };
                *text = id.clone();
            }
        }
        Value::Array(items) => {
            for item in items {
                resolve_labels(item, bindings)?;
            }
        }
        Value::Object(fields) => {
            for field in fields.values_mut() {
                resolve_labels(field, bindings)?;
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
    Ok(())
}

fn created_id(output: &CommandOutput) -> Option<String> {
    match output {
        CommandOutput::AssetAdded { asset_id } => Some(asset_id.to_string()),
        CommandOutput::DebtRecorded { debt_id } => Some(debt_id.to_string()),
        CommandOutput::LiquidationInitiated { liquidation_id } => Some(liquidation_id.to_string()),
        CommandOutput::GiftRecorded { gift_id } => Some(gift_id.to_string()),
        CommandOutput::ClaimFiled { claim_id } => Some(claim_id.to_string()),
        _ => None,
    }
}
