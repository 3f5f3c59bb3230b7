//! Logging and metrics initialization.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the configured level applies.
pub fn init(config: &ObservabilityConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));

    if config.json_logging {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    metrics::register_metrics();

    Ok(())
}

/// Metric descriptions.
pub mod metrics {
    use metrics::{describe_counter, describe_gauge};

    /// Register all metric descriptions.
    pub fn register_metrics() {
        describe_counter!(
            "netsim_projects_created_total",
            "Total number of projects created"
        );
        describe_counter!(
            "netsim_projects_updated_total",
            "Total number of project metadata updates"
        );
        describe_counter!(
            "netsim_projects_deleted_total",
            "Total number of projects deleted"
        );
        describe_counter!(
            "netsim_events_applied_total",
            "Total number of simulation events folded into aggregates"
        );
        describe_counter!("netsim_errors_total", "Total number of errors raised");

        describe_gauge!(
            "netsim_hub_subscribers",
            "Number of currently connected subscribers"
        );
    }
}
