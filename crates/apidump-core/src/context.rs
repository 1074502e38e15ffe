//! The layer context: registries, tracker, output and the generic call
//! interceptor every trampoline goes through.

use std::sync::Arc;
use std::time::Instant;

use ash::vk;
use ash::vk::Handle;

use crate::config::{LayerConfig, ViolationPolicy};
use crate::entry_point::{EntryPoint, TableCategory};
use crate::error::LayerError;
use crate::frame::FrameCounter;
use crate::output::OutputSerializer;
use crate::record::{thread_index, Arg, ArgValue, CallRecord};
use crate::registry::{DispatchKey, DispatchRegistry, KeyExtractor};
use crate::sink::{self, NullSink, OutputSink};
use crate::tracker::ResourceTracker;

/// Return type of an intercepted entry point.
pub trait CallResult: Sized {
    /// Whether registry and tracker updates should be committed.
    fn succeeded(&self) -> bool;
    /// The return value as it appears in output.
    fn record(&self) -> Option<ArgValue>;
    /// Value handed back when no dispatch table can be found and violations
    /// are logged rather than fatal.
    fn missing_table() -> Self;
}

impl CallResult for () {
    fn succeeded(&self) -> bool {
        true
    }

    fn record(&self) -> Option<ArgValue> {
        None
    }

    fn missing_table() -> Self {}
}

impl CallResult for vk::Result {
    fn succeeded(&self) -> bool {
        self.as_raw() >= 0
    }

    fn record(&self) -> Option<ArgValue> {
        Some(ArgValue::result(*self))
    }

    fn missing_table() -> Self {
        vk::Result::ERROR_INITIALIZATION_FAILED
    }
}

/// All shared state of the layer. Built once when the layer is loaded and
/// passed by reference to every trampoline.
///
/// `I` and `D` are the instance-level and device-level dispatch tables.
pub struct LayerContext<I, D> {
    config: LayerConfig,
    keys: Box<dyn KeyExtractor>,
    instances: DispatchRegistry<I>,
    devices: DispatchRegistry<D>,
    tracker: ResourceTracker,
    output: OutputSerializer,
    frames: FrameCounter,
    started: Instant,
}

impl<I, D> LayerContext<I, D> {
    pub fn new(config: LayerConfig, keys: Box<dyn KeyExtractor>, sink: Box<dyn OutputSink>) -> Self {
        Self {
            config,
            keys,
            instances: DispatchRegistry::new(TableCategory::Instance),
            devices: DispatchRegistry::new(TableCategory::Device),
            tracker: ResourceTracker::new(),
            output: OutputSerializer::new(sink),
            frames: FrameCounter::new(),
            started: Instant::now(),
        }
    }

    /// Build a context writing to the sink the configuration selects. If the
    /// sink cannot be opened the layer keeps forwarding calls without output.
    pub fn from_config(config: LayerConfig, keys: Box<dyn KeyExtractor>) -> Self {
        let sink = sink::open(&config.output).unwrap_or_else(|e| {
            tracing::warn!(file = ?config.output.file, error = %e, "cannot open dump output; output disabled");
            Box::new(NullSink)
        });
        Self::new(config, keys, sink)
    }

    pub fn config(&self) -> &LayerConfig {
        &self.config
    }

    pub fn tracker(&self) -> &ResourceTracker {
        &self.tracker
    }

    pub fn frames(&self) -> &FrameCounter {
        &self.frames
    }

    pub fn output(&self) -> &OutputSerializer {
        &self.output
    }

    pub fn instances(&self) -> &DispatchRegistry<I> {
        &self.instances
    }

    pub fn devices(&self) -> &DispatchRegistry<D> {
        &self.devices
    }

    pub fn key_of<H: Handle>(&self, handle: H) -> DispatchKey {
        self.keys.key_of(handle.as_raw())
    }

    // ── Registration ────────────────────────────────────────

    pub fn register_instance(&self, instance: vk::Instance, table: I) -> Arc<I> {
        let key = self.key_of(instance);
        tracing::debug!(?instance, %key, category = %self.instances.category(), "registering dispatch table");
        register(&self.instances, key, table, |e| self.violation(e))
    }

    pub fn register_device(&self, device: vk::Device, table: D) -> Arc<D> {
        let key = self.key_of(device);
        tracing::debug!(?device, %key, category = %self.devices.category(), "registering dispatch table");
        register(&self.devices, key, table, |e| self.violation(e))
    }

    /// Drop the instance table and the physical devices enumerated from it.
    pub fn unregister_instance(&self, instance: vk::Instance) -> Option<Arc<I>> {
        let key = self.key_of(instance);
        tracing::debug!(?instance, %key, category = %self.instances.category(), "unregistering dispatch table");
        self.tracker.forget_instance(instance);
        self.instances.unregister(key)
    }

    /// Drop the device table and every command pool tracked for the device.
    pub fn unregister_device(&self, device: vk::Device) -> Option<Arc<D>> {
        let key = self.key_of(device);
        tracing::debug!(?device, %key, category = %self.devices.category(), "unregistering dispatch table");
        self.tracker.erase_device_pools(device);
        self.devices.unregister(key)
    }

    // ── Table resolution ────────────────────────────────────

    pub fn instance_table(&self, instance: vk::Instance) -> Option<Arc<I>> {
        let key = self.key_of(instance);
        self.resolve(self.instances.lookup(key))
    }

    /// Physical devices carry no table of their own; go through the instance
    /// that enumerated them.
    pub fn physical_device_table(&self, physical_device: vk::PhysicalDevice) -> Option<Arc<I>> {
        let lookup = match self.tracker.resolve_owning_instance(physical_device) {
            Some(instance) => self.instances.lookup(self.key_of(instance)),
            None => Err(LayerError::UnknownPhysicalDevice(physical_device.as_raw())),
        };
        self.resolve(lookup)
    }

    /// Table for any device-level dispatchable handle: device, queue or
    /// command buffer.
    pub fn device_table<H: Handle>(&self, handle: H) -> Option<Arc<D>> {
        let key = self.key_of(handle);
        self.resolve(self.devices.lookup(key))
    }

    fn resolve<T>(&self, lookup: Result<Arc<T>, LayerError>) -> Option<Arc<T>> {
        match lookup {
            Ok(table) => Some(table),
            Err(e) => {
                self.violation(e);
                None
            }
        }
    }

    fn violation(&self, error: LayerError) {
        match self.config.on_violation {
            ViolationPolicy::Abort => panic!("apidump registry violation: {}", error),
            ViolationPolicy::Log => tracing::error!(error = %error, "registry violation"),
        }
    }

    // ── Interception ────────────────────────────────────────

    /// Forward one call to the next layer and record it.
    ///
    /// * `inputs` captures the arguments before the call; it only runs when
    ///   the call produces output.
    /// * `invoke` performs the next-layer call.
    /// * `commit` runs only if the call succeeded. It updates registries and
    ///   the tracker and returns the output arguments to record.
    ///
    /// Non-blocking calls hold the output lock around the next-layer call so
    /// heads appear in call order. Blocking calls run first and are recorded
    /// afterwards so a long wait never stalls other threads' output.
    pub fn intercept<R, In, Inv, Com>(
        &self,
        entry: &EntryPoint,
        inputs: In,
        invoke: Inv,
        commit: Com,
    ) -> R
    where
        R: CallResult,
        In: FnOnce() -> Vec<Arg>,
        Inv: FnOnce() -> R,
        Com: FnOnce(&R) -> Vec<Arg>,
    {
        let frame = self.frames.current();
        if !self.config.should_output(frame) {
            let result = invoke();
            if result.succeeded() {
                commit(&result);
            }
            self.finish(entry);
            return result;
        }

        let mut record = CallRecord {
            name: entry.name,
            thread: thread_index(),
            frame,
            timestamp_us: self.timestamp(),
            inputs: inputs(),
            result: None,
            outputs: Vec::new(),
        };

        let result = if entry.blocking {
            let result = invoke();
            complete(&mut record, &result, commit);
            self.output.with_exclusive_output(|out| {
                out.head(&record);
                out.tail(&record);
            });
            result
        } else {
            self.output.with_exclusive_output(|out| {
                out.head(&record);
                let result = invoke();
                complete(&mut record, &result, commit);
                out.tail(&record);
                result
            })
        };

        self.finish(entry);
        result
    }

    fn finish(&self, entry: &EntryPoint) {
        if entry.frame_boundary {
            let frame = self.frames.advance();
            tracing::trace!(frame, "frame boundary");
        }
    }

    fn timestamp(&self) -> Option<u64> {
        self.config
            .output
            .timestamps
            .then(|| self.started.elapsed().as_micros() as u64)
    }
}

impl<I, D> Drop for LayerContext<I, D> {
    fn drop(&mut self) {
        self.output.flush();
    }
}

fn complete<R, Com>(record: &mut CallRecord, result: &R, commit: Com)
where
    R: CallResult,
    Com: FnOnce(&R) -> Vec<Arg>,
{
    record.result = result.record();
    if result.succeeded() {
        record.outputs = commit(result);
    }
}

fn register<T>(
    registry: &DispatchRegistry<T>,
    key: DispatchKey,
    table: T,
    on_violation: impl FnOnce(LayerError),
) -> Arc<T> {
    let table = Arc::new(table);
    if let Err(e) = registry.register(key, Arc::clone(&table)) {
        // Reached only when violations are logged. The handle was recycled
        // behind our back, so the new object's table wins.
        on_violation(e);
        tracing::warn!(%key, category = %registry.category(), "replacing dispatch table");
        registry.replace(key, Arc::clone(&table));
    }
    table
}
