//! Four-sensor AHT21 node for RP2350
//!
//! Reads four AHT21 sensors, each on its own software-timed bus, every
//! sampling interval and logs the readings over RTT. A sensor that keeps
//! failing triggers a full reset of the node.
//!
//! # Hardware
//!
//! Raspberry Pi Pico 2 W, one AHT21 per bus with 4.7 kΩ pull-ups at the
//! node end of each cable:
//!
//! | Sensor | Data   | Clock  |
//! |--------|--------|--------|
//! | 001    | GPIO16 | GPIO17 |
//! | 002    | GPIO18 | GPIO19 |
//! | 003    | GPIO20 | GPIO21 |
//! | 004    | GPIO14 | GPIO15 |
//!
//! GPIO23-25 and GPIO29 belong to the wireless chip and cannot carry a bus.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release --example sensor_node --features pico2_w
//! ```

#![no_std]
#![no_main]

use aht_node::core::config::{BusConfig, NodeConfig};
use aht_node::core::traits::{Sample, TelemetrySink};
use aht_node::platform::rp2350::{EmbassyClock, FlexLine};
use aht_node::subsystems::{BusHandle, Sampler};
use embassy_executor::Spawner;
use embassy_time::Timer;
use {defmt_rtt as _, panic_probe as _};

/// Sink that logs every sample; an uplink task would drain a buffer instead.
struct LogSink;

impl TelemetrySink for LogSink {
    fn publish(&mut self, sample: &Sample) {
        defmt::info!(
            "sensor {}: {} C, {} % RH",
            sample.bus,
            sample.temperature_c,
            sample.humidity_pct
        );
    }
}

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    let p = embassy_rp::init(Default::default());
    let clock = EmbassyClock;

    let config = NodeConfig::default()
        .with_bus(BusConfig::new(1, 16, 17))
        .and_then(|c| c.with_bus(BusConfig::new(2, 18, 19)))
        .and_then(|c| c.with_bus(BusConfig::new(3, 20, 21)))
        .and_then(|c| c.with_bus(BusConfig::new(4, 14, 15)))
        .unwrap();
    config.validate().unwrap();

    // Pin claims must match the table in `config`
    let lines = [
        (FlexLine::new(p.PIN_16), FlexLine::new(p.PIN_17)),
        (FlexLine::new(p.PIN_18), FlexLine::new(p.PIN_19)),
        (FlexLine::new(p.PIN_20), FlexLine::new(p.PIN_21)),
        (FlexLine::new(p.PIN_14), FlexLine::new(p.PIN_15)),
    ];

    let mut sampler = Sampler::new(&config, clock, LogSink);
    for (bus, (sda, scl)) in config.buses.iter().zip(lines) {
        sampler
            .add_bus(BusHandle::new(*bus, sda, scl, clock, config.timing))
            .unwrap();
    }

    defmt::info!("Sampling {} buses", sampler.buses().len());

    loop {
        let report = sampler.run_cycle();
        if report.escalation.requires_restart() {
            defmt::error!("Escalation {}: restarting", report.escalation);
            Timer::after_millis(100).await;
            cortex_m::peripheral::SCB::sys_reset();
        }
        Timer::after_millis(sampler.sample_interval_ms() as u64).await;
    }
}
