//! Shared fixtures for the apidump-core integration tests.

#![allow(dead_code)]

use std::io;
use std::sync::Arc;
use std::time::Instant;

use apidump_core::config::{LayerConfig, ViolationPolicy};
use apidump_core::record::CallRecord;
use apidump_core::{DispatchKey, KeyExtractor, LayerContext, OutputSink};
use parking_lot::Mutex;

/// Fake loader convention: the dispatch key lives in the upper bits of the
/// handle, so a device and every queue or command buffer made from it
/// (`0xD_0000`, `0xD_0001`, ...) share one key.
pub struct OwnerBitsKey;

impl KeyExtractor for OwnerBitsKey {
    fn key_of(&self, raw_handle: u64) -> DispatchKey {
        DispatchKey((raw_handle >> 16) as usize)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct FakeInstanceTable {
    pub id: u64,
}

#[derive(Debug, PartialEq, Eq)]
pub struct FakeDeviceTable {
    pub id: u64,
}

pub type TestContext = LayerContext<FakeInstanceTable, FakeDeviceTable>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Half {
    Head,
    Tail,
}

#[derive(Debug, Clone)]
pub struct Event {
    pub half: Half,
    pub name: &'static str,
    pub thread: u64,
    pub frame: u64,
    pub outputs: usize,
    pub at: Instant,
}

/// Sink that remembers every head and tail it was handed.
#[derive(Clone, Default)]
pub struct CaptureSink {
    pub events: Arc<Mutex<Vec<Event>>>,
}

impl CaptureSink {
    fn push(&self, half: Half, record: &CallRecord) {
        self.events.lock().push(Event {
            half,
            name: record.name,
            thread: record.thread,
            frame: record.frame,
            outputs: record.outputs.len(),
            at: Instant::now(),
        });
    }

    pub fn snapshot(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.half == Half::Tail)
            .map(|e| e.name)
            .collect()
    }
}

impl OutputSink for CaptureSink {
    fn head(&mut self, record: &CallRecord) -> io::Result<()> {
        self.push(Half::Head, record);
        Ok(())
    }

    fn tail(&mut self, record: &CallRecord) -> io::Result<()> {
        self.push(Half::Tail, record);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Sink whose every write fails.
pub struct FailingSink;

impl OutputSink for FailingSink {
    fn head(&mut self, _: &CallRecord) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Other, "disk full"))
    }

    fn tail(&mut self, _: &CallRecord) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Other, "disk full"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Other, "disk full"))
    }
}

pub fn log_config() -> LayerConfig {
    LayerConfig {
        on_violation: ViolationPolicy::Log,
        ..LayerConfig::default()
    }
}

pub fn capture_context(config: LayerConfig) -> (TestContext, CaptureSink) {
    let sink = CaptureSink::default();
    let ctx = LayerContext::new(config, Box::new(OwnerBitsKey), Box::new(sink.clone()));
    (ctx, sink)
}
