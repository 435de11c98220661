//! Integration tests for the build-start resolution cycle
//!
//! Drives `ParameterReplacer` through a fake build host and a scripted store,
//! checking the build log, host writes and store connection lifetime.

use async_trait::async_trait;
use ssm_inject_agent::lifecycle::{FINISHED_MESSAGE, STARTING_MESSAGE};
use ssm_inject_agent::{
    BuildEventSource, BuildLog, ParameterReplacer, ResolutionOutcome, RunningBuild, SecretStore,
    StoreConnector, StoreCredentials,
};
use ssm_inject_core::{Error, FailureKind, ParameterMap, Result, SecureString, Settings};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ─── Helpers ───────────────────────────────────────────────────────────────

fn params(entries: &[(&str, &str)]) -> ParameterMap {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[derive(Default)]
struct FakeBuild {
    config: ParameterMap,
    build: ParameterMap,
    log: Vec<String>,
    env: BTreeMap<String, String>,
    system: BTreeMap<String, String>,
    written_config: BTreeMap<String, String>,
    masked: Vec<String>,
    reject_env: bool,
}

impl FakeBuild {
    fn new(config: &[(&str, &str)], build: &[(&str, &str)]) -> Self {
        Self {
            config: params(config),
            build: params(build),
            ..Default::default()
        }
    }

    fn writes(&self) -> usize {
        self.env.len() + self.system.len() + self.written_config.len()
    }
}

impl BuildLog for FakeBuild {
    fn message(&mut self, text: &str) {
        self.log.push(text.to_string());
    }
}

impl RunningBuild for FakeBuild {
    fn shared_config_parameters(&self) -> &ParameterMap {
        &self.config
    }

    fn shared_build_parameters(&self) -> &ParameterMap {
        &self.build
    }

    fn add_environment_variable(&mut self, name: &str, value: &str) -> Result<()> {
        if self.reject_env {
            return Err(Error::host("add_environment_variable", "environment is frozen"));
        }
        self.env.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn add_system_property(&mut self, name: &str, value: &str) -> Result<()> {
        self.system.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn add_config_parameter(&mut self, name: &str, value: &str) -> Result<()> {
        self.written_config.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn mask_value(&mut self, value: &str) {
        self.masked.push(value.to_string());
    }
}

#[derive(Clone, Copy)]
enum Failure {
    Service,
    Client,
    NoValue,
}

/// Shared bookkeeping so tests can inspect the connector after the cycle
#[derive(Default)]
struct StoreStats {
    connects: AtomicUsize,
    releases: AtomicUsize,
    requests: Mutex<Vec<String>>,
    credentials: Mutex<Option<StoreCredentials>>,
}

struct ScriptedConnector {
    values: HashMap<String, String>,
    failures: HashMap<String, Failure>,
    stats: Arc<StoreStats>,
}

impl ScriptedConnector {
    fn new(values: &[(&str, &str)]) -> Self {
        Self {
            values: values
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            failures: HashMap::new(),
            stats: Arc::new(StoreStats::default()),
        }
    }

    fn failing(mut self, identifier: &str, failure: Failure) -> Self {
        self.failures.insert(identifier.to_string(), failure);
        self
    }
}

#[async_trait]
impl StoreConnector for ScriptedConnector {
    async fn connect(&self, credentials: &StoreCredentials) -> Result<Box<dyn SecretStore>> {
        self.stats.connects.fetch_add(1, Ordering::SeqCst);
        *self.stats.credentials.lock().unwrap() = Some(credentials.clone());
        Ok(Box::new(ScriptedStore {
            values: self.values.clone(),
            failures: self.failures.clone(),
            stats: self.stats.clone(),
        }))
    }
}

struct ScriptedStore {
    values: HashMap<String, String>,
    failures: HashMap<String, Failure>,
    stats: Arc<StoreStats>,
}

#[async_trait]
impl SecretStore for ScriptedStore {
    async fn get_parameter(&self, identifier: &str) -> Result<SecureString> {
        self.stats
            .requests
            .lock()
            .unwrap()
            .push(identifier.to_string());

        match self.failures.get(identifier) {
            Some(Failure::Service) => Err(Error::service(identifier, "AccessDeniedException")),
            Some(Failure::Client) => Err(Error::client(identifier, "dispatch failure")),
            Some(Failure::NoValue) => Err(Error::missing_value(identifier)),
            None => self
                .values
                .get(identifier)
                .map(|v| SecureString::from(v.as_str()))
                .ok_or_else(|| Error::service(identifier, "ParameterNotFound")),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

impl Drop for ScriptedStore {
    fn drop(&mut self) {
        self.stats.releases.fetch_add(1, Ordering::SeqCst);
    }
}

fn replacer(connector: ScriptedConnector) -> (ParameterReplacer<ScriptedConnector>, Arc<StoreStats>) {
    let stats = connector.stats.clone();
    (
        ParameterReplacer::with_connector(Settings::default(), connector),
        stats,
    )
}

// ─── Tests ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn resolves_config_and_build_parameters() {
    let mut build = FakeBuild::new(
        &[
            ("aws_ssm_access_key_id", "fakeAccessKey"),
            ("aws_ssm_secret_access_key", "fakeSecretKey"),
            ("aws_region", "fakeRegion"),
            ("test_build_param_1", "%aws-ssm:fake-param1%"),
        ],
        &[
            ("env.test_build_param_2", "%aws-ssm:fake-param2%"),
            ("system.test_build_param_3", "fake-param3"),
        ],
    );
    let (replacer, stats) = replacer(ScriptedConnector::new(&[
        ("fake-param1", "ssm-value-1"),
        ("fake-param2", "ssm-value-2"),
    ]));

    let outcome = replacer.update_build_parameters(&mut build).await;

    assert_eq!(outcome, ResolutionOutcome::Applied(2));
    assert_eq!(
        build.log,
        vec![
            STARTING_MESSAGE,
            "Detected ssm parameters: [env.test_build_param_2, test_build_param_1]",
            "Requesting ssm parameter value for env.test_build_param_2",
            "SSM request completed for env.test_build_param_2",
            "Requesting ssm parameter value for test_build_param_1",
            "SSM request completed for test_build_param_1",
            FINISHED_MESSAGE,
        ]
    );
    assert_eq!(build.env["test_build_param_2"], "ssm-value-2");
    assert_eq!(build.written_config["test_build_param_1"], "ssm-value-1");
    assert!(build.system.is_empty());
    assert_eq!(build.masked.len(), 2);
    assert!(build.masked.contains(&"ssm-value-1".to_string()));
    assert!(build.masked.contains(&"ssm-value-2".to_string()));

    let credentials = stats.credentials.lock().unwrap().clone().unwrap();
    assert_eq!(credentials.access_key_id.as_deref(), Some("fakeAccessKey"));
    assert_eq!(credentials.region.as_deref(), Some("fakeRegion"));
    assert_eq!(
        credentials.secret_access_key.map(|s| s.into_string()).as_deref(),
        Some("fakeSecretKey")
    );
}

#[tokio::test]
async fn no_placeholders_never_connects() {
    let mut build = FakeBuild::new(&[("aws_region", "us-east-1")], &[("env.TEAMCITY_BUILD", "22")]);
    let (replacer, stats) = replacer(ScriptedConnector::new(&[]));

    let outcome = replacer.update_build_parameters(&mut build).await;

    assert_eq!(outcome, ResolutionOutcome::NoPlaceholders);
    assert_eq!(stats.connects.load(Ordering::SeqCst), 0);
    assert_eq!(build.writes(), 0);
    assert!(build.masked.is_empty());
    assert_eq!(
        build.log,
        vec![STARTING_MESSAGE, "Detected ssm parameters: []", FINISHED_MESSAGE]
    );
}

#[tokio::test]
async fn service_error_aborts_before_dispatch() {
    let mut build = FakeBuild::new(
        &[],
        &[
            ("env.A", "%aws-ssm:ok/a%"),
            ("env.B", "%aws-ssm:denied/b%"),
            ("env.C", "%aws-ssm:ok/c%"),
        ],
    );
    let (replacer, stats) = replacer(
        ScriptedConnector::new(&[("ok/a", "a"), ("ok/c", "c")])
            .failing("denied/b", Failure::Service),
    );

    let outcome = replacer.update_build_parameters(&mut build).await;

    assert_eq!(outcome, ResolutionOutcome::Failed(FailureKind::Service));
    assert_eq!(build.writes(), 0);
    assert!(build.masked.is_empty());
    assert_eq!(*stats.requests.lock().unwrap(), vec!["ok/a", "denied/b"]);
    assert_eq!(stats.releases.load(Ordering::SeqCst), 1);

    let failure_line = &build.log[build.log.len() - 2];
    assert!(failure_line.starts_with("Parameter store service error while fetching parameter"));
    assert!(failure_line.contains("AccessDeniedException"));
    assert_eq!(build.log.last().map(String::as_str), Some(FINISHED_MESSAGE));
}

#[tokio::test]
async fn client_error_is_reported_as_client_failure() {
    let mut build = FakeBuild::new(&[("key1", "%aws-ssm:param1%")], &[]);
    let (replacer, stats) =
        replacer(ScriptedConnector::new(&[]).failing("param1", Failure::Client));

    let outcome = replacer.update_build_parameters(&mut build).await;

    assert_eq!(outcome, ResolutionOutcome::Failed(FailureKind::Client));
    assert!(build
        .log
        .iter()
        .any(|l| l.starts_with("Parameter store client error while fetching parameter")));
    assert_eq!(stats.releases.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn parameter_without_value_is_unexpected_failure() {
    let mut build = FakeBuild::new(&[], &[("system.KEY", "%aws-ssm:empty%")]);
    let (replacer, _) = replacer(ScriptedConnector::new(&[]).failing("empty", Failure::NoValue));

    let outcome = replacer.update_build_parameters(&mut build).await;

    assert_eq!(outcome, ResolutionOutcome::Failed(FailureKind::Other));
    assert!(build
        .log
        .iter()
        .any(|l| l.starts_with("Unexpected error while fetching parameter")));
    assert!(build.system.is_empty());
}

#[tokio::test]
async fn host_write_failure_is_caught() {
    let mut build = FakeBuild::new(&[], &[("env.TOKEN", "%aws-ssm:token%")]);
    build.reject_env = true;
    let (replacer, stats) = replacer(ScriptedConnector::new(&[("token", "t0k3n")]));

    let outcome = replacer.update_build_parameters(&mut build).await;

    assert_eq!(outcome, ResolutionOutcome::Failed(FailureKind::Other));
    assert!(build.masked.is_empty());
    assert_eq!(build.log.last().map(String::as_str), Some(FINISHED_MESSAGE));
    // Connection is already released when dispatch runs
    assert_eq!(stats.releases.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn host_write_failure_keeps_earlier_writes() {
    let mut build = FakeBuild::new(
        &[],
        &[
            ("api_key", "%aws-ssm:api%"),
            ("env.TOKEN", "%aws-ssm:token%"),
            ("system.ZONE", "%aws-ssm:zone%"),
        ],
    );
    build.reject_env = true;
    let (replacer, _) = replacer(ScriptedConnector::new(&[
        ("api", "k3y"),
        ("token", "t0k3n"),
        ("zone", "eu"),
    ]));

    let outcome = replacer.update_build_parameters(&mut build).await;

    assert_eq!(outcome, ResolutionOutcome::Failed(FailureKind::Other));
    assert_eq!(build.written_config.get("api_key").map(String::as_str), Some("k3y"));
    assert_eq!(build.masked, vec!["k3y".to_string()]);
    assert!(build.env.is_empty());
    assert!(build.system.is_empty());
}

#[tokio::test]
async fn build_parameter_overrides_config_parameter() {
    let mut build = FakeBuild::new(
        &[("env.SHARED", "%aws-ssm:from-config%")],
        &[("env.SHARED", "%aws-ssm:from-build%")],
    );
    let (replacer, stats) = replacer(ScriptedConnector::new(&[
        ("from-config", "config-value"),
        ("from-build", "build-value"),
    ]));

    replacer.update_build_parameters(&mut build).await;

    assert_eq!(*stats.requests.lock().unwrap(), vec!["from-build"]);
    assert_eq!(build.env["SHARED"], "build-value");
}

#[tokio::test]
async fn event_source_runs_registered_replacer() {
    let mut source = BuildEventSource::new();
    let (replacer, stats) = replacer(ScriptedConnector::new(&[("db/pass", "hunter2")]));
    let _replacer = replacer.register(&mut source);
    assert_eq!(source.listener_count(), 1);

    let mut build = FakeBuild::new(&[], &[("env.DB_PASS", "%aws-ssm:db/pass%")]);
    source.fire_build_started(&mut build).await;

    assert_eq!(stats.connects.load(Ordering::SeqCst), 1);
    assert_eq!(build.env["DB_PASS"], "hunter2");
    assert_eq!(build.masked, vec!["hunter2"]);
}

#[tokio::test]
async fn each_build_start_is_independent() {
    let mut source = BuildEventSource::new();
    let (replacer, stats) = replacer(ScriptedConnector::new(&[("p", "v")]));
    replacer.register(&mut source);

    let mut first = FakeBuild::new(&[], &[("env.P", "%aws-ssm:p%")]);
    let mut second = FakeBuild::new(&[], &[("env.P", "%aws-ssm:p%")]);
    source.fire_build_started(&mut first).await;
    source.fire_build_started(&mut second).await;

    assert_eq!(stats.connects.load(Ordering::SeqCst), 2);
    assert_eq!(stats.releases.load(Ordering::SeqCst), 2);
    assert_eq!(*stats.requests.lock().unwrap(), vec!["p", "p"]);
    assert_eq!(second.env["P"], "v");
}
