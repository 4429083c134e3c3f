//! The synthetic heart-rate simulator: publishes a steady (and periodically
//! bursty) stream of mostly-valid, occasionally-invalid readings to the raw
//! topic, standing in for the real sensor fleet this pipeline would
//! otherwise ingest from.

mod generator;

use chrono::Utc;
use heartpulse_core::config::AppConfig;
use heartpulse_kafka::producer::{self, DEFAULT_SEND_TIMEOUT};
use heartpulse_runtime::metrics::MetricsServer;
use heartpulse_runtime::shutdown::ShutdownFlag;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rdkafka::producer::Producer;
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    tracing::info!(%config, "simulator starting");

    let metrics_addr: SocketAddr = ([0, 0, 0, 0], config.prometheus_port).into();
    MetricsServer::new(metrics_addr).serve()?;

    let producer = producer::build_producer(&config)?;
    let customers = generator::customer_id_pool(config.sim_customer_count);

    let shutdown = ShutdownFlag::default();
    shutdown.spawn_signal_listener();

    tracing::info!(
        topic = %config.kafka_topic_raw,
        brokers = %config.kafka_bootstrap_servers,
        customers = customers.len(),
        "producing synthetic heartbeats"
    );

    let mut rng = StdRng::from_entropy();

    while !shutdown.is_set() {
        let mut batch_size = config.sim_events_per_second;
        if generator::is_burst_second(Utc::now().timestamp()) {
            batch_size *= config.sim_burst_multiplier;
        }

        for _ in 0..batch_size {
            let (key, raw) = generator::next_raw(
                &mut rng,
                &customers,
                config.sim_invalid_ratio,
                config.heart_rate_min,
                config.heart_rate_max,
            );

            if let Err(error) = producer::publish(
                &producer,
                &config.kafka_topic_raw,
                &key,
                &raw,
                DEFAULT_SEND_TIMEOUT,
            )
            .await
            {
                tracing::error!(%error, "failed to publish simulated heartbeat");
            }
        }

        tokio::time::sleep(Duration::from_secs_f64(config.sim_sleep_seconds)).await;
    }

    if let Err(error) = producer.flush(DEFAULT_SEND_TIMEOUT) {
        tracing::error!(%error, "failed to flush producer during shutdown");
    }

    tracing::info!("simulator shutting down");
    Ok(())
}
