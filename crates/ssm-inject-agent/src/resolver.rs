//! Placeholder detection and secret fetching
//!
//! Resolution is split in two phases: extraction is pure and local, fetching
//! crosses the network boundary and is driven by the caller with a store
//! connection it owns.

use crate::build::BuildLog;
use crate::store::SecretStore;
use ssm_inject_core::config::PlaceholderPattern;
use ssm_inject_core::{ParameterMap, ResolvedSecret, Result};
use std::collections::BTreeMap;
use tracing::debug;

/// Merge the host's parameter groups into one mapping.
///
/// Config parameters go in first, build parameters second, so a build
/// parameter wins over a config parameter with the same key.
pub fn merge_parameters(config: &ParameterMap, build: &ParameterMap) -> ParameterMap {
    let mut merged = ParameterMap::with_capacity(config.len() + build.len());
    merged.extend(config.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged.extend(build.iter().map(|(k, v)| (k.clone(), v.clone())));
    merged
}

/// Turn `{KEY: "%aws-ssm:some/secret%"}` into `{KEY: "some/secret"}`.
///
/// Entries whose value is not a placeholder are left out. The qualifying keys
/// are reported to the build log once, in sorted order.
pub fn extract_placeholders<L>(
    parameters: &ParameterMap,
    pattern: &PlaceholderPattern,
    log: &mut L,
) -> BTreeMap<String, String>
where
    L: BuildLog + ?Sized,
{
    let identifiers: BTreeMap<String, String> = parameters
        .iter()
        .filter_map(|(key, value)| {
            pattern
                .extract(value)
                .map(|id| (key.clone(), id.to_string()))
        })
        .collect();

    let keys: Vec<&str> = identifiers.keys().map(String::as_str).collect();
    log.message(&format!("Detected ssm parameters: [{}]", keys.join(", ")));
    debug!("{} of {} parameters are placeholders", identifiers.len(), parameters.len());

    identifiers
}

/// Fetch the plaintext for every identifier, strictly one request at a time.
///
/// The first failure aborts the loop; nothing fetched so far is returned.
pub async fn fetch_secrets<L>(
    identifiers: BTreeMap<String, String>,
    store: &dyn SecretStore,
    log: &mut L,
) -> Result<Vec<ResolvedSecret>>
where
    L: BuildLog + ?Sized,
{
    let mut resolved = Vec::with_capacity(identifiers.len());

    for (key, identifier) in identifiers {
        log.message(&format!("Requesting ssm parameter value for {}", key));
        let value = store.get_parameter(&identifier).await?;
        log.message(&format!("SSM request completed for {}", key));
        debug!("Resolved {} ({} bytes)", key, value.len());
        resolved.push(ResolvedSecret::new(key, value));
    }

    Ok(resolved)
}
