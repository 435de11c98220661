//! Parameter store placeholder resolution for build agents
//!
//! On every build start the agent:
//! - **Detects** parameters whose value is a placeholder such as `%aws-ssm:db/password%`
//! - **Fetches** each referenced value from AWS SSM Parameter Store, one request at a time
//! - **Dispatches** the plaintext into environment variables, system properties or
//!   config parameters depending on the key's category marker
//! - **Masks** every resolved value in the build's output

pub mod build;
pub mod dispatch;
pub mod lifecycle;
pub mod resolver;
pub mod store;

pub use build::{BuildLog, RunningBuild};
pub use dispatch::{dispatch, Destination};
pub use lifecycle::{AgentLifecycleListener, BuildEventSource, ParameterReplacer, ResolutionOutcome};
pub use resolver::{extract_placeholders, fetch_secrets, merge_parameters};
pub use store::{SecretStore, SsmConnector, StoreConnector, StoreCredentials};

#[cfg(test)]
mod test_support;
