//! LabMet Station Simulator
//!
//! Publishes random station readings, for running the server and the
//! dashboard without hardware.
//!
//! ```text
//! labmet-sim --host broker.local --topic weather_data --delay 2
//! labmet-sim --station 3 --count 10
//! labmet-sim --api-url http://localhost:5000
//! ```

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rumqttc::{AsyncClient, MqttOptions, QoS};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use labmet::station::{SensorValues, StationId, StationReading, COLLECTED_AT_FORMAT};

#[derive(Parser, Debug)]
#[command(name = "labmet-sim")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Simulate a LabMet weather station")]
struct Args {
    /// Broker host
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Broker port
    #[arg(long, default_value_t = 1883)]
    port: u16,

    /// Keep-alive in seconds
    #[arg(short, long, default_value_t = 60)]
    keepalive: u64,

    /// Broker user
    #[arg(short, long, default_value = "server_listener")]
    user: String,

    /// Broker password
    #[arg(short, long, default_value = "l4b804")]
    password: String,

    /// Base topic
    #[arg(short, long, default_value = "weather_data")]
    topic: String,

    /// Seconds between two readings
    #[arg(short, long, default_value_t = 1.0)]
    delay: f64,

    /// Station id, published on `<topic>/<id>`
    #[arg(short, long)]
    station: Option<StationId>,

    /// Stop after this many readings
    #[arg(short, long)]
    count: Option<u64>,

    /// Seed for reproducible readings
    #[arg(long)]
    seed: Option<u64>,

    /// Post to the ingest API of this server instead of the broker
    #[arg(long)]
    api_url: Option<String>,
}

/// Where readings go
enum Sink {
    Mqtt {
        client: AsyncClient,
        topic: String,
    },
    Http {
        client: reqwest::Client,
        url: String,
    },
}

impl Sink {
    async fn send(&self, reading: &StationReading) -> anyhow::Result<()> {
        match self {
            Sink::Mqtt { client, topic } => {
                let payload = serde_json::to_vec(reading)?;
                client
                    .publish(topic.as_str(), QoS::AtMostOnce, false, payload)
                    .await
                    .context("publish failed")?;
            }
            Sink::Http { client, url } => {
                let response = client.post(url).json(reading).send().await?;
                if !response.status().is_success() {
                    let status = response.status();
                    let text = response.text().await.unwrap_or_default();
                    anyhow::bail!("ingest rejected ({}): {}", status, text);
                }
            }
        }
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "labmet_sim=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    if !(args.delay.is_finite() && args.delay >= 0.0) {
        anyhow::bail!("--delay must be a non-negative number of seconds");
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let sink = match &args.api_url {
        Some(base) => Sink::Http {
            client: reqwest::Client::new(),
            url: format!("{}/api/v1/ingest", base.trim_end_matches('/')),
        },
        None => connect_broker(&args),
    };

    let delay = Duration::from_secs_f64(args.delay);
    let mut sent = 0u64;

    loop {
        if args.count.is_some_and(|count| sent >= count) {
            break;
        }

        let reading = random_reading(&mut rng, args.station);
        match sink.send(&reading).await {
            Ok(()) => {
                sent += 1;
                tracing::info!(
                    sent,
                    soil_moisture = reading.sensors.analog_soil_moisture,
                    temperature = reading.sensors.ds18b20_temp,
                    "Reading sent"
                );
            }
            Err(e) => tracing::warn!(error = %e, "Failed to send reading"),
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    tracing::info!(sent, "Simulator stopped");
    Ok(())
}

/// Connect to the broker and drive its event loop in the background
fn connect_broker(args: &Args) -> Sink {
    let client_id = format!("labmet-sim-{}", uuid::Uuid::new_v4().simple());
    let mut options = MqttOptions::new(client_id, &args.host, args.port);
    options.set_keep_alive(Duration::from_secs(args.keepalive));
    options.set_credentials(&args.user, &args.password);

    let (client, mut eventloop) = AsyncClient::new(options, 16);
    tokio::spawn(async move {
        loop {
            if let Err(e) = eventloop.poll().await {
                tracing::warn!(error = %e, "Broker connection error");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    });

    let topic = match args.station {
        Some(id) => format!("{}/{}", args.topic.trim_end_matches('/'), id),
        None => args.topic.clone(),
    };
    tracing::info!(host = %args.host, port = args.port, topic = %topic, "Publishing to broker");

    Sink::Mqtt { client, topic }
}

/// A reading with every sensor drawn uniformly from its plausible range
fn random_reading(rng: &mut impl Rng, station: Option<StationId>) -> StationReading {
    StationReading {
        id: station,
        collected_at: Some(Local::now().format(COLLECTED_AT_FORMAT).to_string()),
        sensors: SensorValues {
            bmp180_temp: Some(rng.gen_range(-10.0..50.0)),
            bmp180_alt: Some(rng.gen_range(-100.0..3000.0)),
            bmp180_press: Some(rng.gen_range(1.5..1.9)),
            ds18b20_temp: rng.gen_range(-10.0..50.0),
            dht22_temp: Some(rng.gen_range(-10.0..50.0)),
            dht22_humid: Some(rng.gen_range(1.0..95.0)),
            bh1750_illuminance: f64::from(rng.gen_range(0u32..=1000)),
            analog_soil_moisture: rng.gen_range(1.0..50.0),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_readings_are_valid() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let reading = random_reading(&mut rng, Some(2));
            assert!(reading.validate().is_ok());
            assert!(reading.collected_at_time().unwrap().is_some());
            assert_eq!(reading.id, Some(2));
        }
    }

    #[test]
    fn test_seeded_readings_repeat() {
        let a = random_reading(&mut StdRng::seed_from_u64(1), None);
        let b = random_reading(&mut StdRng::seed_from_u64(1), None);
        assert_eq!(a.sensors, b.sensors);
    }
}
