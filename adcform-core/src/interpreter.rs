//! Interpreter - Execute Effects using a Provider
//!
//! The Interpreter executes Effects contained in a Plan in order,
//! collecting the results. This is where side effects actually occur.

use log::{debug, warn};

use crate::effect::Effect;
use crate::plan::Plan;
use crate::provider::{Provider, ProviderError, ProviderResult};
use crate::resource::State;

/// Result of executing each Effect
#[derive(Debug)]
pub enum EffectOutcome {
    /// Read succeeded
    Read { state: State },
    /// Create succeeded
    Created { state: State },
    /// Update succeeded
    Updated { state: State },
    /// Delete succeeded
    Deleted,
    /// The appliance cannot perform the operation; nothing was changed
    Unsupported { reason: String },
    /// Skipped (e.g., dry-run)
    Skipped { reason: String },
}

/// Result of executing the entire Plan
#[derive(Debug)]
pub struct ApplyResult {
    pub outcomes: Vec<Result<EffectOutcome, ProviderError>>,
    pub success_count: usize,
    pub failure_count: usize,
}

impl ApplyResult {
    pub fn is_success(&self) -> bool {
        self.failure_count == 0
    }
}

/// Interpreter configuration
#[derive(Debug, Clone, Default)]
pub struct InterpreterConfig {
    /// If true, skip actual side effects
    pub dry_run: bool,
    /// Continue on error
    pub continue_on_error: bool,
}

/// Interpreter that executes Effects using a Provider
pub struct Interpreter<P: Provider> {
    provider: P,
    config: InterpreterConfig,
}

impl<P: Provider> Interpreter<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            config: InterpreterConfig::default(),
        }
    }

    pub fn with_config(mut self, config: InterpreterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Execute a Plan, interpreting all Effects and causing side effects
    pub async fn apply(&self, plan: &Plan) -> ApplyResult {
        let mut outcomes = Vec::new();
        let mut success_count = 0;
        let mut failure_count = 0;

        for effect in plan.effects() {
            let result = self.execute(effect).await;

            match &result {
                Ok(_) => success_count += 1,
                Err(_) => {
                    failure_count += 1;
                    if !self.config.continue_on_error {
                        outcomes.push(result);
                        break;
                    }
                }
            }

            outcomes.push(result);
        }

        ApplyResult {
            outcomes,
            success_count,
            failure_count,
        }
    }

    /// Execute a single Effect
    pub async fn execute(&self, effect: &Effect) -> ProviderResult<EffectOutcome> {
        // Data sources are side-effect free and always evaluated
        if self.config.dry_run && effect.is_mutating() {
            return Ok(EffectOutcome::Skipped {
                reason: "dry-run mode".to_string(),
            });
        }

        debug!("executing effect on {}", effect.resource_id());

        let result = match effect {
            Effect::Read(resource) => self
                .provider
                .read_data_source(resource)
                .await
                .map(|state| EffectOutcome::Read { state }),
            Effect::Create(resource) => self
                .provider
                .create(resource)
                .await
                .map(|state| EffectOutcome::Created { state }),
            Effect::Update { id, from, to, .. } => {
                let identifier = from.identifier.as_deref().unwrap_or("");
                self.provider
                    .update(id, identifier, from, to)
                    .await
                    .map(|state| EffectOutcome::Updated { state })
            }
            Effect::Delete { id, identifier } => self
                .provider
                .delete(id, identifier)
                .await
                .map(|()| EffectOutcome::Deleted),
        };

        match result {
            Err(e) if e.is_unsupported() => {
                warn!("{}", e);
                Ok(EffectOutcome::Unsupported {
                    reason: e.to_string(),
                })
            }
            other => other,
        }
    }
}
