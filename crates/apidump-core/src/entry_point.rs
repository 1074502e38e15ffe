//! Static descriptor table for every intercepted entry point.
//!
//! Trampolines look up their descriptor once and hand it to
//! [`LayerContext::intercept`](crate::LayerContext::intercept), which derives
//! the locking order and frame bookkeeping from it.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use serde::Serialize;

/// Which kind of dispatch table serves an entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableCategory {
    /// No table exists yet (instance creation, global queries).
    Global,
    Instance,
    Device,
}

impl fmt::Display for TableCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TableCategory::Global => "global",
            TableCategory::Instance => "instance",
            TableCategory::Device => "device",
        })
    }
}

/// The argument whose handle selects the dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeySource {
    Global,
    Instance,
    PhysicalDevice,
    Device,
    Queue,
    CommandBuffer,
}

impl KeySource {
    pub fn category(self) -> TableCategory {
        match self {
            KeySource::Global => TableCategory::Global,
            KeySource::Instance | KeySource::PhysicalDevice => TableCategory::Instance,
            KeySource::Device | KeySource::Queue | KeySource::CommandBuffer => {
                TableCategory::Device
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Create,
    Destroy,
    Use,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct EntryPoint {
    pub name: &'static str,
    pub key_source: KeySource,
    pub lifecycle: Lifecycle,
    /// May block for an application-controlled duration; the next-layer call
    /// is issued outside the output lock.
    pub blocking: bool,
    /// Advances the frame counter once the call returns.
    pub frame_boundary: bool,
    /// Device extension that provides the command, if it is not core.
    pub extension: Option<&'static str>,
}

impl EntryPoint {
    const fn new(name: &'static str, key_source: KeySource, lifecycle: Lifecycle) -> Self {
        Self {
            name,
            key_source,
            lifecycle,
            blocking: false,
            frame_boundary: false,
            extension: None,
        }
    }

    const fn blocking(mut self) -> Self {
        self.blocking = true;
        self
    }

    const fn frame_boundary(mut self) -> Self {
        self.frame_boundary = true;
        self
    }

    const fn extension(mut self, extension: &'static str) -> Self {
        self.extension = Some(extension);
        self
    }

    pub fn category(&self) -> TableCategory {
        self.key_source.category()
    }
}

use KeySource as K;
use Lifecycle as L;

// ── Instance ────────────────────────────────────────────────
pub const CREATE_INSTANCE: EntryPoint = EntryPoint::new("vkCreateInstance", K::Global, L::Create);
pub const DESTROY_INSTANCE: EntryPoint =
    EntryPoint::new("vkDestroyInstance", K::Instance, L::Destroy);
pub const ENUMERATE_PHYSICAL_DEVICES: EntryPoint =
    EntryPoint::new("vkEnumeratePhysicalDevices", K::Instance, L::Create);

// ── Physical device ─────────────────────────────────────────
pub const GET_PHYSICAL_DEVICE_PROPERTIES: EntryPoint =
    EntryPoint::new("vkGetPhysicalDeviceProperties", K::PhysicalDevice, L::Use);
pub const GET_PHYSICAL_DEVICE_FEATURES: EntryPoint =
    EntryPoint::new("vkGetPhysicalDeviceFeatures", K::PhysicalDevice, L::Use);
pub const GET_PHYSICAL_DEVICE_MEMORY_PROPERTIES: EntryPoint =
    EntryPoint::new("vkGetPhysicalDeviceMemoryProperties", K::PhysicalDevice, L::Use);
pub const GET_PHYSICAL_DEVICE_QUEUE_FAMILY_PROPERTIES: EntryPoint = EntryPoint::new(
    "vkGetPhysicalDeviceQueueFamilyProperties",
    K::PhysicalDevice,
    L::Use,
);
pub const ENUMERATE_DEVICE_EXTENSION_PROPERTIES: EntryPoint =
    EntryPoint::new("vkEnumerateDeviceExtensionProperties", K::PhysicalDevice, L::Use);
pub const CREATE_DEVICE: EntryPoint =
    EntryPoint::new("vkCreateDevice", K::PhysicalDevice, L::Create);

// ── Device ──────────────────────────────────────────────────
pub const DESTROY_DEVICE: EntryPoint = EntryPoint::new("vkDestroyDevice", K::Device, L::Destroy);
pub const GET_DEVICE_QUEUE: EntryPoint = EntryPoint::new("vkGetDeviceQueue", K::Device, L::Use);
pub const DEVICE_WAIT_IDLE: EntryPoint =
    EntryPoint::new("vkDeviceWaitIdle", K::Device, L::Use).blocking();

// ── Command pool / buffer ───────────────────────────────────
pub const CREATE_COMMAND_POOL: EntryPoint =
    EntryPoint::new("vkCreateCommandPool", K::Device, L::Create);
pub const DESTROY_COMMAND_POOL: EntryPoint =
    EntryPoint::new("vkDestroyCommandPool", K::Device, L::Destroy);
pub const RESET_COMMAND_POOL: EntryPoint =
    EntryPoint::new("vkResetCommandPool", K::Device, L::Use);
pub const ALLOCATE_COMMAND_BUFFERS: EntryPoint =
    EntryPoint::new("vkAllocateCommandBuffers", K::Device, L::Create);
pub const FREE_COMMAND_BUFFERS: EntryPoint =
    EntryPoint::new("vkFreeCommandBuffers", K::Device, L::Destroy);
pub const BEGIN_COMMAND_BUFFER: EntryPoint =
    EntryPoint::new("vkBeginCommandBuffer", K::CommandBuffer, L::Use);
pub const END_COMMAND_BUFFER: EntryPoint =
    EntryPoint::new("vkEndCommandBuffer", K::CommandBuffer, L::Use);
pub const RESET_COMMAND_BUFFER: EntryPoint =
    EntryPoint::new("vkResetCommandBuffer", K::CommandBuffer, L::Use);
pub const CMD_DRAW: EntryPoint = EntryPoint::new("vkCmdDraw", K::CommandBuffer, L::Use);
pub const CMD_DISPATCH: EntryPoint = EntryPoint::new("vkCmdDispatch", K::CommandBuffer, L::Use);

// ── Synchronization ─────────────────────────────────────────
pub const CREATE_FENCE: EntryPoint = EntryPoint::new("vkCreateFence", K::Device, L::Create);
pub const DESTROY_FENCE: EntryPoint = EntryPoint::new("vkDestroyFence", K::Device, L::Destroy);
pub const RESET_FENCES: EntryPoint = EntryPoint::new("vkResetFences", K::Device, L::Use);
pub const GET_FENCE_STATUS: EntryPoint = EntryPoint::new("vkGetFenceStatus", K::Device, L::Use);
pub const WAIT_FOR_FENCES: EntryPoint =
    EntryPoint::new("vkWaitForFences", K::Device, L::Use).blocking();

// ── Queue ───────────────────────────────────────────────────
pub const QUEUE_SUBMIT: EntryPoint = EntryPoint::new("vkQueueSubmit", K::Queue, L::Use);
pub const QUEUE_WAIT_IDLE: EntryPoint =
    EntryPoint::new("vkQueueWaitIdle", K::Queue, L::Use).blocking();

// ── Swapchain ───────────────────────────────────────────────
pub const ACQUIRE_NEXT_IMAGE_KHR: EntryPoint =
    EntryPoint::new("vkAcquireNextImageKHR", K::Device, L::Use)
        .blocking()
        .extension("VK_KHR_swapchain");
pub const QUEUE_PRESENT_KHR: EntryPoint =
    EntryPoint::new("vkQueuePresentKHR", K::Queue, L::Use)
        .frame_boundary()
        .extension("VK_KHR_swapchain");

pub static ENTRY_POINTS: &[EntryPoint] = &[
    CREATE_INSTANCE,
    DESTROY_INSTANCE,
    ENUMERATE_PHYSICAL_DEVICES,
    GET_PHYSICAL_DEVICE_PROPERTIES,
    GET_PHYSICAL_DEVICE_FEATURES,
    GET_PHYSICAL_DEVICE_MEMORY_PROPERTIES,
    GET_PHYSICAL_DEVICE_QUEUE_FAMILY_PROPERTIES,
    ENUMERATE_DEVICE_EXTENSION_PROPERTIES,
    CREATE_DEVICE,
    DESTROY_DEVICE,
    GET_DEVICE_QUEUE,
    DEVICE_WAIT_IDLE,
    CREATE_COMMAND_POOL,
    DESTROY_COMMAND_POOL,
    RESET_COMMAND_POOL,
    ALLOCATE_COMMAND_BUFFERS,
    FREE_COMMAND_BUFFERS,
    BEGIN_COMMAND_BUFFER,
    END_COMMAND_BUFFER,
    RESET_COMMAND_BUFFER,
    CMD_DRAW,
    CMD_DISPATCH,
    CREATE_FENCE,
    DESTROY_FENCE,
    RESET_FENCES,
    GET_FENCE_STATUS,
    WAIT_FOR_FENCES,
    QUEUE_SUBMIT,
    QUEUE_WAIT_IDLE,
    ACQUIRE_NEXT_IMAGE_KHR,
    QUEUE_PRESENT_KHR,
];

static BY_NAME: OnceLock<HashMap<&'static str, &'static EntryPoint>> = OnceLock::new();

/// Find the descriptor for an intercepted entry point by its API name.
pub fn find(name: &str) -> Option<&'static EntryPoint> {
    BY_NAME
        .get_or_init(|| ENTRY_POINTS.iter().map(|ep| (ep.name, ep)).collect())
        .get(name)
        .copied()
}
