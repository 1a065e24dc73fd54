// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Deployment configuration, sanitization, and A/B bucket resolution.
//!
//! Weights reach production through a config document: per environment, a
//! set of control weights, optional treatment weights, and an A/B policy
//! (enabled flag, treatment ratio, salt). Bucketing is a pure function of
//! `(salt, user_id)` — FNV-1a 64 over `salt + "|" + user_id`, reduced to a
//! four-digit fraction — so the same user lands in the same bucket on every
//! call, every process, every reimplementation that follows the same hash.
//!
//! Nothing downstream ever sees a raw config: [`DeploymentConfig::sanitize`]
//! clamps every weight into its domain, forces the ratio into [0, 1],
//! disables A/B when there are no treatment weights to serve, substitutes
//! the default salt for an empty one, and merges in defaults for any missing
//! environment. After sanitization, [`resolve`] can only fail on a truly
//! unknown environment — and [`resolve_or_default`] won't even do that.

pub mod store;

use crate::scoring::SimilarityWeights;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// FNV-1a 64-bit offset basis.
const FNV_OFFSET: u64 = 14695981039346656037;
/// FNV-1a 64-bit prime.
const FNV_PRIME: u64 = 1099511628211;

/// Bucket granularity: the hash reduces to `1/BUCKET_SCALE` steps.
const BUCKET_SCALE: u64 = 10_000;

/// Salt used when a config carries an empty one.
pub const DEFAULT_SALT: &str = "geomsaek-ab";

/// Model version used when a config carries an empty one.
pub const DEFAULT_MODEL_VERSION: &str = "baseline";

const DEFAULT_SCHEMA_VERSION: i64 = 1;

/// Timestamp substituted for epoch-or-earlier `updated_at` values.
fn default_updated_at() -> DateTime<Utc> {
    // Fixed so that sanitization is deterministic.
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

// =============================================================================
// ERRORS
// =============================================================================

/// Failures at the deployment boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum DeployError {
    /// Requested environment absent from the (sanitized) config.
    MissingEnvironment(Environment),
    /// Strict load: the config file does not exist.
    MissingFile(PathBuf),
    /// Strict load: the file exists but is not a valid config document.
    Parse(String),
}

impl fmt::Display for DeployError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployError::MissingEnvironment(env) => {
                write!(f, "environment {} missing from deployment config", env.name())
            }
            DeployError::MissingFile(path) => {
                write!(f, "deployment config not found at {}", path.display())
            }
            DeployError::Parse(reason) => write!(f, "invalid deployment config: {reason}"),
        }
    }
}

impl std::error::Error for DeployError {}

// =============================================================================
// CONFIG MODEL
// =============================================================================

/// Deployment environments, in promotion order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub const ALL: [Environment; 3] = [
        Environment::Development,
        Environment::Staging,
        Environment::Production,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

/// A/B rollout policy for one environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AbPolicy {
    pub enabled: bool,
    /// Fraction of users served treatment weights, in [0, 1].
    pub treatment_ratio: f64,
    /// Per-environment hash salt; empty is replaced by [`DEFAULT_SALT`].
    pub salt: String,
}

impl Default for AbPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            treatment_ratio: 0.0,
            salt: DEFAULT_SALT.to_string(),
        }
    }
}

/// Weights and rollout policy for one environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvConfig {
    pub control_weights: SimilarityWeights,
    pub treatment_weights: Option<SimilarityWeights>,
    pub ab_policy: AbPolicy,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            control_weights: SimilarityWeights::default(),
            treatment_weights: None,
            ab_policy: AbPolicy::default(),
        }
    }
}

/// The whole deployment document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeploymentConfig {
    pub schema_version: i64,
    pub model_version: String,
    pub updated_at: DateTime<Utc>,
    pub environments: BTreeMap<Environment, EnvConfig>,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            schema_version: DEFAULT_SCHEMA_VERSION,
            model_version: DEFAULT_MODEL_VERSION.to_string(),
            updated_at: default_updated_at(),
            environments: Environment::ALL
                .iter()
                .map(|&env| (env, EnvConfig::default()))
                .collect(),
        }
    }
}

impl DeploymentConfig {
    /// Clamp, default, and merge until every invariant holds.
    ///
    /// Post-conditions: all weights in-domain; ratio in [0, 1]; missing
    /// treatment weights force `enabled = false` and `ratio = 0`; disabled
    /// A/B forces `ratio = 0`; no empty salt; all three environments
    /// present; schema version positive; model version and timestamp
    /// non-degenerate.
    pub fn sanitize(&self) -> Self {
        let mut environments: BTreeMap<Environment, EnvConfig> = BTreeMap::new();
        for &env in &Environment::ALL {
            let mut cfg = self.environments.get(&env).cloned().unwrap_or_default();

            cfg.control_weights = cfg.control_weights.clamped();
            cfg.treatment_weights = cfg.treatment_weights.map(|w| w.clamped());

            if cfg.treatment_weights.is_none() {
                cfg.ab_policy.enabled = false;
                cfg.ab_policy.treatment_ratio = 0.0;
            }
            if !cfg.ab_policy.enabled {
                cfg.ab_policy.treatment_ratio = 0.0;
            }
            cfg.ab_policy.treatment_ratio = cfg.ab_policy.treatment_ratio.clamp(0.0, 1.0);
            if cfg.ab_policy.salt.is_empty() {
                cfg.ab_policy.salt = DEFAULT_SALT.to_string();
            }

            environments.insert(env, cfg);
        }

        Self {
            schema_version: if self.schema_version <= 0 {
                DEFAULT_SCHEMA_VERSION
            } else {
                self.schema_version
            },
            model_version: if self.model_version.is_empty() {
                DEFAULT_MODEL_VERSION.to_string()
            } else {
                self.model_version.clone()
            },
            updated_at: if self.updated_at.timestamp() <= 0 {
                default_updated_at()
            } else {
                self.updated_at
            },
            environments,
        }
    }
}

// =============================================================================
// BUCKETING
// =============================================================================

/// Control/treatment assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Bucket {
    Control,
    Treatment,
}

/// FNV-1a 64 over a byte slice.
fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Deterministic bucket for `(salt, user_id)` at the given treatment ratio.
///
/// The hash covers the UTF-8 bytes of `salt + "|" + user_id`; the bucket
/// value is `(hash mod 10000) / 10000`, compared strictly against the
/// ratio. Stable across calls and processes by construction.
pub fn bucket_for(salt: &str, user_id: &str, treatment_ratio: f64) -> Bucket {
    let keyed = format!("{salt}|{user_id}");
    let value = (fnv1a64(keyed.as_bytes()) % BUCKET_SCALE) as f64 / BUCKET_SCALE as f64;
    if value < treatment_ratio {
        Bucket::Treatment
    } else {
        Bucket::Control
    }
}

// =============================================================================
// RESOLUTION
// =============================================================================

/// The outcome of resolving weights for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resolution {
    pub environment: Environment,
    pub bucket: Bucket,
    pub weights: SimilarityWeights,
    pub model_version: String,
    pub updated_at: DateTime<Utc>,
}

/// Pick the bucket and weights for a user in an environment.
///
/// Decision ladder, first match wins:
/// 1. Forced treatment without treatment weights downgrades to control.
/// 2. Any other forced bucket is honored.
/// 3. Disabled A/B or missing treatment weights → control.
/// 4. Ratio at the boundaries short-circuits (≤ 0 control, ≥ 1 treatment).
/// 5. No usable user id → control.
/// 6. Otherwise the hash decides.
pub fn resolve(
    config: &DeploymentConfig,
    environment: Environment,
    user_id: Option<&str>,
    forced: Option<Bucket>,
) -> Result<Resolution, DeployError> {
    let env_config = config
        .environments
        .get(&environment)
        .ok_or(DeployError::MissingEnvironment(environment))?;

    let bucket = decide_bucket(env_config, user_id, forced);
    let weights = match bucket {
        Bucket::Treatment => env_config
            .treatment_weights
            .unwrap_or(env_config.control_weights),
        Bucket::Control => env_config.control_weights,
    };

    Ok(Resolution {
        environment,
        bucket,
        weights,
        model_version: config.model_version.clone(),
        updated_at: config.updated_at,
    })
}

fn decide_bucket(
    env_config: &EnvConfig,
    user_id: Option<&str>,
    forced: Option<Bucket>,
) -> Bucket {
    let has_treatment = env_config.treatment_weights.is_some();
    match forced {
        Some(Bucket::Treatment) => {
            return if has_treatment {
                Bucket::Treatment
            } else {
                Bucket::Control
            }
        }
        Some(Bucket::Control) => return Bucket::Control,
        None => {}
    }

    let policy = &env_config.ab_policy;
    if !policy.enabled || !has_treatment {
        return Bucket::Control;
    }
    if policy.treatment_ratio <= 0.0 {
        return Bucket::Control;
    }
    if policy.treatment_ratio >= 1.0 {
        return Bucket::Treatment;
    }
    let user_id = match user_id {
        Some(id) if !id.is_empty() => id,
        _ => return Bucket::Control,
    };
    bucket_for(&policy.salt, user_id, policy.treatment_ratio)
}

/// Sanitize first, then resolve with fallbacks: the requested environment,
/// then production, then a freshly defaulted config. Never fails.
pub fn resolve_or_default(
    config: &DeploymentConfig,
    environment: Environment,
    user_id: Option<&str>,
    forced: Option<Bucket>,
) -> Resolution {
    let sanitized = config.sanitize();
    resolve(&sanitized, environment, user_id, forced)
        .or_else(|_| resolve(&sanitized, Environment::Production, user_id, forced))
        .unwrap_or_else(|_| {
            // Sanitization guarantees all environments exist, so this arm
            // only runs against a hand-built pathological config.
            let fallback = DeploymentConfig::default();
            Resolution {
                environment: Environment::Production,
                bucket: Bucket::Control,
                weights: SimilarityWeights::default(),
                model_version: fallback.model_version,
                updated_at: fallback.updated_at,
            }
        })
}
