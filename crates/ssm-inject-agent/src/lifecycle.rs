//! Build lifecycle hook
//!
//! Listeners are registered explicitly on a [`BuildEventSource`]; the host
//! fires `build_started` with the running build, and each listener works
//! through the [`RunningBuild`] it is handed.

use crate::build::RunningBuild;
use crate::dispatch::dispatch;
use crate::resolver::{extract_placeholders, fetch_secrets, merge_parameters};
use crate::store::{SsmConnector, StoreConnector, StoreCredentials};
use async_trait::async_trait;
use ssm_inject_core::{FailureKind, Result, Settings};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Build log line written when a cycle begins
pub const STARTING_MESSAGE: &str = "ssm-inject starting...";

/// Build log line written when a cycle ends, whatever the outcome
pub const FINISHED_MESSAGE: &str = "ssm-inject finished";

/// Receives agent lifecycle events
#[async_trait]
pub trait AgentLifecycleListener: Send + Sync {
    async fn build_started(&self, build: &mut dyn RunningBuild);
}

/// Listeners interested in build events, notified in registration order
#[derive(Default)]
pub struct BuildEventSource {
    listeners: Vec<Arc<dyn AgentLifecycleListener>>,
}

impl BuildEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&mut self, listener: Arc<dyn AgentLifecycleListener>) {
        self.listeners.push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Notify every listener that `build` is starting
    pub async fn fire_build_started(&self, build: &mut dyn RunningBuild) {
        for listener in &self.listeners {
            listener.build_started(build).await;
        }
    }
}

/// What one resolution cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionOutcome {
    /// No parameter held a placeholder; the store was never contacted
    NoPlaceholders,
    /// All placeholders were resolved and written
    Applied(usize),
    /// The cycle aborted; values not yet written when the failure occurred are
    /// never written, though earlier ones stay applied and masked
    Failed(FailureKind),
}

impl ResolutionOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ResolutionOutcome::Failed(_))
    }
}

/// Replaces placeholder parameters with their values from the parameter store
pub struct ParameterReplacer<C = SsmConnector> {
    settings: Settings,
    connector: C,
}

impl ParameterReplacer<SsmConnector> {
    /// Replacer backed by AWS SSM, configured from `settings`
    pub fn new(settings: Settings) -> Self {
        let connector = SsmConnector::new(settings.store.clone());
        Self::with_connector(settings, connector)
    }
}

impl<C: StoreConnector + 'static> ParameterReplacer<C> {
    /// Create with a custom connector (for testing or other stores)
    pub fn with_connector(settings: Settings, connector: C) -> Self {
        Self {
            settings,
            connector,
        }
    }

    /// Attach to `source` so the replacer runs on every build start
    pub fn register(self, source: &mut BuildEventSource) -> Arc<Self> {
        let replacer = Arc::new(self);
        source.add_listener(replacer.clone());
        replacer
    }

    /// Run one resolution cycle against `build`.
    ///
    /// Failures are logged to the build and reported in the outcome, never
    /// propagated: the build continues without the secrets.
    pub async fn update_build_parameters<B>(&self, build: &mut B) -> ResolutionOutcome
    where
        B: RunningBuild + ?Sized,
    {
        build.message(STARTING_MESSAGE);
        info!("Resolving parameter store placeholders");

        let outcome = match self.resolve_and_apply(build).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let kind = e.kind();
                warn!("{}: {}", kind, e);
                build.message(&format!("{} while fetching parameter: {}", kind, e));
                ResolutionOutcome::Failed(kind)
            }
        };

        build.message(FINISHED_MESSAGE);
        info!("Parameter resolution finished: {:?}", outcome);
        outcome
    }

    async fn resolve_and_apply<B>(&self, build: &mut B) -> Result<ResolutionOutcome>
    where
        B: RunningBuild + ?Sized,
    {
        let config = build.shared_config_parameters();
        let credentials = StoreCredentials::from_parameters(config, &self.settings.credentials);
        let parameters = merge_parameters(config, build.shared_build_parameters());

        let identifiers = extract_placeholders(&parameters, &self.settings.placeholder, build);
        if identifiers.is_empty() {
            debug!("No placeholders found, skipping parameter store");
            return Ok(ResolutionOutcome::NoPlaceholders);
        }

        let resolved = {
            let store = self.connector.connect(&credentials).await?;
            debug!("Connected to {} store", store.name());
            fetch_secrets(identifiers, store.as_ref(), build).await?
        };

        let count = resolved.len();
        dispatch(build, resolved)?;
        Ok(ResolutionOutcome::Applied(count))
    }
}

#[async_trait]
impl<C: StoreConnector + 'static> AgentLifecycleListener for ParameterReplacer<C> {
    async fn build_started(&self, build: &mut dyn RunningBuild) {
        self.update_build_parameters(build).await;
    }
}
