// backend/src/lib.rs
// Modules principaux
pub mod api;
pub mod core;
pub mod models;
pub mod services;
pub mod utils;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Version de l'application
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = "Dental Clinic";

/// Configure le tracing pour le logging structuré
pub fn setup_tracing(log_level: &str, log_format: &str) {
    let level = log_level.parse().unwrap_or(tracing::Level::INFO);

    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with(if log_format == "json" {
            Box::new(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(true),
            ) as Box<dyn tracing_subscriber::Layer<_> + Send + Sync>
        } else {
            Box::new(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_line_number(true)
                    .with_file(true),
            ) as Box<dyn tracing_subscriber::Layer<_> + Send + Sync>
        });

    subscriber.init();
}
