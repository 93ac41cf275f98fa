//! Store inspection and seeding
//!
//! Usage:
//!   patchx store get <KEY>
//!   patchx store set <KEY> <VALUE>
//!   patchx store list [--json]
//!   patchx store features [--json]
//!   patchx store put-feature <ID> --type <TYPE> [--field NAME=VALUE]...
//!   patchx store lock <KEY> [--unlock]
//!
//! These commands write directly, bypassing locks and expectations. Patches
//! go through `patchx apply`.

use crate::config::Settings;
use clap::{Args, Subcommand};
use patchx_core::errors::PatchError;
use patchx_core::model::{is_secret_field, FeatureRecord, SecretRef};
use patchx_core::ops::ConfigStore;
use patchx_core_types::Sensitive;
use patchx_store::SqliteConfigStore;

#[derive(Debug, Args)]
pub struct StoreArgs {
    #[command(subcommand)]
    pub command: StoreCommand,
}

#[derive(Debug, Subcommand)]
pub enum StoreCommand {
    /// Print a parameter value
    Get { key: String },
    /// Insert or overwrite a parameter
    Set { key: String, value: String },
    /// List all parameters
    List {
        #[arg(long)]
        json: bool,
    },
    /// List all features
    Features {
        #[arg(long)]
        json: bool,
    },
    /// Insert or replace a feature record
    PutFeature(PutFeatureArgs),
    /// Lock (or unlock) a parameter or feature against patch writes
    Lock {
        key: String,
        #[arg(long)]
        unlock: bool,
    },
}

#[derive(Debug, Args)]
pub struct PutFeatureArgs {
    pub id: String,

    #[arg(long = "type")]
    pub feature_type: String,

    /// Field as NAME=VALUE; secret fields take credentialsJSON:<id> or env:<VAR>
    #[arg(long = "field", value_parser = parse_field)]
    pub fields: Vec<(String, String)>,
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;
    if name.trim().is_empty() {
        return Err("field name must not be empty".to_string());
    }
    Ok((name.trim().to_string(), value.to_string()))
}

fn persistence(err: patchx_core::ops::StoreError) -> PatchError {
    PatchError::Persistence {
        message: err.to_string(),
    }
}

/// Copy of `record` with secret field values masked
fn redacted(mut record: FeatureRecord) -> FeatureRecord {
    for (name, value) in record.fields.iter_mut() {
        if is_secret_field(name) {
            *value = Sensitive::new(value.as_str()).to_string();
        }
    }
    record
}

/// Execute store command
pub fn execute(args: StoreArgs, settings: &Settings) -> Result<(), PatchError> {
    let store = SqliteConfigStore::open(&settings.store)?;

    match args.command {
        StoreCommand::Get { key } => match store.get(&key).map_err(persistence)? {
            Some(value) => println!("{}", value),
            None => {
                return Err(PatchError::Persistence {
                    message: format!("no parameter named '{}'", key),
                })
            }
        },
        StoreCommand::Set { key, value } => {
            store.put_param(&key, &value)?;
            println!("✓ {} = {}", key, value);
        }
        StoreCommand::List { json } => {
            let params = store.list_params().map_err(persistence)?;
            if json {
                let map: serde_json::Map<String, serde_json::Value> = params
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::String(v)))
                    .collect();
                println!("{}", serde_json::Value::Object(map));
            } else {
                for (key, value) in params {
                    println!("{} = {}", key, value);
                }
            }
        }
        StoreCommand::Features { json } => {
            let features: Vec<FeatureRecord> = store
                .list_features()
                .map_err(persistence)?
                .into_iter()
                .map(redacted)
                .collect();
            if json {
                let text = serde_json::to_string_pretty(&features).map_err(|e| {
                    PatchError::Internal {
                        message: format!("failed to render JSON: {}", e),
                    }
                })?;
                println!("{}", text);
            } else {
                for feature in features {
                    println!("{} ({})", feature.id, feature.feature_type);
                    for (name, value) in &feature.fields {
                        println!("  {} = {}", name, value);
                    }
                }
            }
        }
        StoreCommand::PutFeature(put) => {
            let mut record = FeatureRecord::new(&put.id, &put.feature_type);
            for (name, value) in put.fields {
                if is_secret_field(&name) && SecretRef::parse(&value).is_none() {
                    return Err(PatchError::InlineSecret {
                        feature_id: put.id.clone(),
                        field: name,
                    });
                }
                record = record.with_field(name, value);
            }
            store.put_feature(&record)?;
            println!("✓ feature {} stored", put.id);
        }
        StoreCommand::Lock { key, unlock } => {
            if !store.set_locked(&key, !unlock)? {
                return Err(PatchError::Persistence {
                    message: format!("no parameter or feature named '{}'", key),
                });
            }
            let state = if unlock { "unlocked" } else { "locked" };
            println!("✓ {} {}", key, state);
        }
    }

    Ok(())
}
