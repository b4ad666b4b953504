use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

pub const METRIC_CACHE_HIT: &str = "spendwise_cache_hit_total";
pub const METRIC_CACHE_MISS: &str = "spendwise_cache_miss_total";
pub const METRIC_CACHE_INVALIDATED: &str = "spendwise_cache_invalidated_total";
pub const METRIC_RENEWAL: &str = "spendwise_session_renewal_total";
pub const METRIC_RENEWAL_FAILED: &str = "spendwise_session_renewal_failed_total";
pub const METRIC_AUTH_RETRY: &str = "spendwise_request_auth_retry_total";

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Output goes to stderr so that command output on stdout stays parseable.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_CACHE_HIT,
            Unit::Count,
            "Reads served from a fresh cache entry."
        );
        describe_counter!(
            METRIC_CACHE_MISS,
            Unit::Count,
            "Reads that had to go to the network."
        );
        describe_counter!(
            METRIC_CACHE_INVALIDATED,
            Unit::Count,
            "Cache entries dropped after a successful write."
        );
        describe_counter!(
            METRIC_RENEWAL,
            Unit::Count,
            "Credential renewal calls issued to the backend."
        );
        describe_counter!(
            METRIC_RENEWAL_FAILED,
            Unit::Count,
            "Credential renewals that failed and ended the session."
        );
        describe_counter!(
            METRIC_AUTH_RETRY,
            Unit::Count,
            "Requests re-dispatched after an authorization failure."
        );
    });
}
