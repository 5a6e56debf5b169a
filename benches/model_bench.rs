//! Benchmarks for the LabMet crop model and ingestion
//!
//! Run with: cargo bench

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::sync::Arc;

use labmet::agro::{
    CropModel, CropParameters, ModelInputs, SolarGeometry, Thornthwaite, WaterBalance,
    WaterBalancePeriod,
};
use labmet::ingest::IngestPipeline;
use labmet::station::StationRegistry;
use labmet::websocket::{ConnectionHub, HubConfig};

const PAYLOAD: &str = r#"{
    "collected_at": "06/15/2016T13:45:10",
    "ds18b20_temp": 18.0,
    "dht22_humid": 60.0,
    "bh1750_illuminance": 800,
    "analog_soil_moisture": 25.0
}"#;

fn inputs() -> ModelInputs {
    ModelInputs {
        soil_moisture: 25.0,
        temperature: 18.0,
        illuminance: 800.0,
        date: NaiveDate::from_ymd_opt(2016, 6, 15)
            .unwrap()
            .and_hms_opt(13, 45, 10)
            .unwrap(),
    }
}

fn bench_science(c: &mut Criterion) {
    let mut group = c.benchmark_group("science");
    let date = NaiveDate::from_ymd_opt(2016, 6, 15).unwrap();

    group.bench_function("solar_geometry", |b| {
        b.iter(|| {
            let geometry = SolarGeometry::new(black_box(date), black_box(51.5)).unwrap();
            geometry.extraterrestrial_irradiance()
        })
    });

    group.bench_function("thornthwaite_daily", |b| {
        b.iter(|| {
            Thornthwaite::new(black_box(18.0), 16.4, 30, 19.0)
                .unwrap()
                .daily()
                .unwrap()
        })
    });

    group.finish();
}

fn bench_model(c: &mut Criterion) {
    let mut group = c.benchmark_group("model");
    let model = CropModel::new(CropParameters::default()).unwrap();
    let inputs = inputs();

    group.bench_function("estimate", |b| {
        b.iter(|| model.estimate(black_box(&inputs)).unwrap())
    });

    for size in [12, 120, 1200] {
        let periods: Vec<WaterBalancePeriod> = (0..size)
            .map(|i| WaterBalancePeriod {
                precipitation: if i % 3 == 0 { 120.0 } else { 15.0 },
                pet: 45.0,
            })
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(format!("water_balance_{}", size), |b| {
            b.iter(|| WaterBalance::run(100.0, 0.0, black_box(&periods)).unwrap())
        });
    }

    group.finish();
}

fn bench_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest");
    let runtime = tokio::runtime::Runtime::new().unwrap();

    let model = Arc::new(CropModel::new(CropParameters::default()).unwrap());
    let registry = Arc::new(StationRegistry::default());
    let hub = Arc::new(ConnectionHub::new(HubConfig::default()));
    let pipeline = IngestPipeline::new(model, registry, hub, 1);

    group.throughput(Throughput::Elements(1));
    group.bench_function("process_payload", |b| {
        b.iter(|| {
            runtime
                .block_on(pipeline.process_payload("weather_data/3", black_box(PAYLOAD.as_bytes())))
                .unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_science, bench_model, bench_ingest);
criterion_main!(benches);
