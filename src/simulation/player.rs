//! Event playback.
//!
//! Applies scripted events to the registry in order, sleeping for each
//! event's delay, and invokes the consumer callback of enabled sensors.
//! The registry itself never calls callbacks; this driver does.

use super::events::{EventValue, SensorEvent};
use crate::error::Result;
use crate::registry::SensorRegistry;
use crate::script::ScriptReader;
use log::{debug, info};
use std::io::BufRead;
use std::ops::Deref;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Default)]
pub struct EventPlayer {
    events: Vec<SensorEvent>,
}

impl EventPlayer {
    pub fn new(events: Vec<SensorEvent>) -> Self {
        Self { events }
    }

    /// Parse the remaining script lines as events.
    pub fn from_script<R: BufRead>(
        script: &mut ScriptReader<R>,
        registry: &SensorRegistry,
    ) -> Result<Self> {
        let mut events = Vec::new();
        while let Some(line) = script.next_line()? {
            events.push(SensorEvent::parse(&line, registry)?);
        }
        debug!("Parsed {} sensor event(s)", events.len());
        Ok(Self { events })
    }

    pub fn events(&self) -> &[SensorEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Apply one event. Returns whether a callback was invoked.
    pub fn apply(registry: &SensorRegistry, event: &SensorEvent) -> bool {
        let Some(updater) = registry.updater(event.sensor) else {
            return false;
        };

        match event.value {
            EventValue::Acceleration { x, y, z } => updater.set_acceleration(x, y, z),
            EventValue::Distance(distance) => updater.set_distance(distance),
            EventValue::Light(lux) => updater.set_light(lux),
        }
        debug!("[Sim] {} <- {:?}", event.sensor, event.value);

        let record = updater.record();
        if !record.is_enabled() {
            return false;
        }
        match record.reading_cb() {
            Some(callback) => {
                callback(record);
                true
            }
            None => false,
        }
    }

    /// Play all events on the current thread.
    pub fn play_blocking(&self, registry: &SensorRegistry) {
        info!("[Sim] Playing {} sensor event(s)", self.events.len());
        for event in &self.events {
            if !event.delay.is_zero() {
                std::thread::sleep(event.delay);
            }
            Self::apply(registry, event);
        }
        info!("[Sim] Sensor event playback finished");
    }

    /// Spawn a task that plays all events.
    ///
    /// # Returns
    ///
    /// A `JoinHandle` that can be used to abort the playback task.
    pub fn spawn<R>(self, registry: R) -> JoinHandle<()>
    where
        R: Deref<Target = SensorRegistry> + Send + 'static,
    {
        tokio::spawn(async move {
            info!("[Sim] Playing {} sensor event(s)", self.events.len());
            for event in &self.events {
                if !event.delay.is_zero() {
                    tokio::time::sleep(event.delay).await;
                }
                Self::apply(&registry, event);
            }
            info!("[Sim] Sensor event playback finished");
        })
    }

    /// Play all events on a dedicated thread, for hosts without a runtime.
    pub fn spawn_thread<R>(self, registry: R) -> std::io::Result<std::thread::JoinHandle<()>>
    where
        R: Deref<Target = SensorRegistry> + Send + 'static,
    {
        std::thread::Builder::new()
            .name("sensor-playback".into())
            .spawn(move || self.play_blocking(&registry))
    }
}
