//! VK_LAYER_APIDUMP_trace
//!
//! This cdylib is an implicit or explicit Vulkan layer. It sits between the
//! application and the next layer (or driver), forwards every intercepted
//! call unchanged and writes a readable record of each call and its result.
#![allow(non_snake_case)]

use std::ffi::{c_char, CStr};
use std::sync::OnceLock;

use apidump_core::{LayerConfig, LayerContext, TableCategory};
use ash::vk;

pub mod args;
pub mod command;
pub mod device;
pub mod dispatch;
pub mod instance;
pub mod loader;
pub mod physical_device;
pub mod swapchain;
pub mod sync;
pub mod tables;

use loader::{NegotiateLayerInterface, LAYER_INTERFACE_VERSION, LAYER_NEGOTIATE_INTERFACE_STRUCT};
use tables::{DeviceTable, InstanceTable};

pub type Context = LayerContext<InstanceTable, DeviceTable>;

// ── Context singleton ───────────────────────────────────────

static CONTEXT: OnceLock<Context> = OnceLock::new();

/// The process-wide layer state, created on first use.
pub fn context() -> &'static Context {
    CONTEXT.get_or_init(|| {
        apidump_common::init_logging_with_default("warn");
        let config = LayerConfig::load_from_environment();
        tracing::info!(
            format = ?config.output.format,
            file = ?config.output.file,
            range = ?config.range,
            "apidump layer loaded"
        );
        LayerContext::from_config(config, Box::new(dispatch::LoaderDispatchKey))
    })
}

// ── Loader negotiation ──────────────────────────────────────

#[no_mangle]
pub unsafe extern "system" fn vkNegotiateLoaderLayerInterfaceVersion(
    p_version_struct: *mut NegotiateLayerInterface,
) -> vk::Result {
    if p_version_struct.is_null() {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }
    let negotiate = &mut *p_version_struct;
    if negotiate.s_type != LAYER_NEGOTIATE_INTERFACE_STRUCT {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    }
    if negotiate.loader_layer_interface_version < LAYER_INTERFACE_VERSION {
        // Older loaders find our entry points by symbol name instead.
        return vk::Result::SUCCESS;
    }
    negotiate.loader_layer_interface_version = LAYER_INTERFACE_VERSION;
    negotiate.pfn_get_instance_proc_addr = Some(vkGetInstanceProcAddr);
    negotiate.pfn_get_device_proc_addr = Some(vkGetDeviceProcAddr);
    negotiate.pfn_get_physical_device_proc_addr = None;
    vk::Result::SUCCESS
}

// ── Proc address lookup ─────────────────────────────────────

/// Resolve any instance-level or device-level name. Names this layer does not
/// intercept are forwarded to the next layer's `vkGetInstanceProcAddr`.
#[no_mangle]
pub unsafe extern "system" fn vkGetInstanceProcAddr(
    instance: vk::Instance,
    p_name: *const c_char,
) -> vk::PFN_vkVoidFunction {
    if p_name.is_null() {
        return None;
    }
    let name = CStr::from_ptr(p_name);
    if let Some(pfn) = name.to_str().ok().and_then(intercepted) {
        return Some(pfn);
    }
    if instance == vk::Instance::null() {
        return None;
    }
    context().instance_table(instance)?.forward(instance, name)
}

/// Resolve device-level names only. Everything else goes to the next layer's
/// `vkGetDeviceProcAddr`. Extension commands are served only when the next
/// layer provides them for this device.
#[no_mangle]
pub unsafe extern "system" fn vkGetDeviceProcAddr(
    device: vk::Device,
    p_name: *const c_char,
) -> vk::PFN_vkVoidFunction {
    if p_name.is_null() {
        return None;
    }
    let name = CStr::from_ptr(p_name);
    let trampoline = name.to_str().ok().and_then(intercepted_device_level);
    if let Some((pfn, None)) = trampoline {
        return Some(pfn);
    }
    if device == vk::Device::null() {
        return None;
    }
    let next = context().device_table(device)?.forward(device, name);
    match trampoline {
        Some((pfn, Some(extension))) => {
            if next.is_none() {
                tracing::debug!(?device, name = ?name, extension, "extension command not enabled");
            }
            next.map(|_| pfn)
        }
        _ => next,
    }
}

/// The trampoline for a device-level name, with the extension that must be
/// enabled for it to exist.
fn intercepted_device_level(
    name: &str,
) -> Option<(unsafe extern "system" fn(), Option<&'static str>)> {
    if name == "vkGetDeviceProcAddr" {
        return intercepted(name).map(|pfn| (pfn, None));
    }
    match apidump_core::entry_point::find(name) {
        Some(ep) if ep.key_source.category() == TableCategory::Device => {
            intercepted(name).map(|pfn| (pfn, ep.extension))
        }
        _ => None,
    }
}

/// The trampoline for every name this layer intercepts.
fn intercepted(name: &str) -> Option<unsafe extern "system" fn()> {
    unsafe {
        match name {
            // ── Proc address ────────────────────────────────────
            "vkGetInstanceProcAddr" => {
                Some(std::mem::transmute(vkGetInstanceProcAddr as *const ()))
            }
            "vkGetDeviceProcAddr" => {
                Some(std::mem::transmute(vkGetDeviceProcAddr as *const ()))
            }

            // ── Instance ────────────────────────────────────────
            "vkCreateInstance" => {
                Some(std::mem::transmute(instance::vkCreateInstance as *const ()))
            }
            "vkDestroyInstance" => {
                Some(std::mem::transmute(instance::vkDestroyInstance as *const ()))
            }
            "vkEnumeratePhysicalDevices" => {
                Some(std::mem::transmute(
                    instance::vkEnumeratePhysicalDevices as *const (),
                ))
            }

            // ── Physical device ─────────────────────────────────
            "vkGetPhysicalDeviceProperties" => {
                Some(std::mem::transmute(
                    physical_device::vkGetPhysicalDeviceProperties as *const (),
                ))
            }
            "vkGetPhysicalDeviceFeatures" => {
                Some(std::mem::transmute(
                    physical_device::vkGetPhysicalDeviceFeatures as *const (),
                ))
            }
            "vkGetPhysicalDeviceMemoryProperties" => {
                Some(std::mem::transmute(
                    physical_device::vkGetPhysicalDeviceMemoryProperties as *const (),
                ))
            }
            "vkGetPhysicalDeviceQueueFamilyProperties" => {
                Some(std::mem::transmute(
                    physical_device::vkGetPhysicalDeviceQueueFamilyProperties as *const (),
                ))
            }
            "vkEnumerateDeviceExtensionProperties" => {
                Some(std::mem::transmute(
                    physical_device::vkEnumerateDeviceExtensionProperties as *const (),
                ))
            }

            // ── Device ──────────────────────────────────────────
            "vkCreateDevice" => Some(std::mem::transmute(device::vkCreateDevice as *const ())),
            "vkDestroyDevice" => Some(std::mem::transmute(device::vkDestroyDevice as *const ())),
            "vkGetDeviceQueue" => {
                Some(std::mem::transmute(device::vkGetDeviceQueue as *const ()))
            }
            "vkDeviceWaitIdle" => {
                Some(std::mem::transmute(device::vkDeviceWaitIdle as *const ()))
            }

            // ── Command pools and buffers ───────────────────────
            "vkCreateCommandPool" => {
                Some(std::mem::transmute(command::vkCreateCommandPool as *const ()))
            }
            "vkDestroyCommandPool" => {
                Some(std::mem::transmute(command::vkDestroyCommandPool as *const ()))
            }
            "vkResetCommandPool" => {
                Some(std::mem::transmute(command::vkResetCommandPool as *const ()))
            }
            "vkAllocateCommandBuffers" => {
                Some(std::mem::transmute(
                    command::vkAllocateCommandBuffers as *const (),
                ))
            }
            "vkFreeCommandBuffers" => {
                Some(std::mem::transmute(command::vkFreeCommandBuffers as *const ()))
            }
            "vkBeginCommandBuffer" => {
                Some(std::mem::transmute(command::vkBeginCommandBuffer as *const ()))
            }
            "vkEndCommandBuffer" => {
                Some(std::mem::transmute(command::vkEndCommandBuffer as *const ()))
            }
            "vkResetCommandBuffer" => {
                Some(std::mem::transmute(command::vkResetCommandBuffer as *const ()))
            }
            "vkCmdDraw" => Some(std::mem::transmute(command::vkCmdDraw as *const ())),
            "vkCmdDispatch" => Some(std::mem::transmute(command::vkCmdDispatch as *const ())),

            // ── Synchronization and submission ──────────────────
            "vkCreateFence" => Some(std::mem::transmute(sync::vkCreateFence as *const ())),
            "vkDestroyFence" => Some(std::mem::transmute(sync::vkDestroyFence as *const ())),
            "vkResetFences" => Some(std::mem::transmute(sync::vkResetFences as *const ())),
            "vkGetFenceStatus" => Some(std::mem::transmute(sync::vkGetFenceStatus as *const ())),
            "vkWaitForFences" => Some(std::mem::transmute(sync::vkWaitForFences as *const ())),
            "vkQueueSubmit" => Some(std::mem::transmute(sync::vkQueueSubmit as *const ())),
            "vkQueueWaitIdle" => Some(std::mem::transmute(sync::vkQueueWaitIdle as *const ())),

            // ── Swapchain ───────────────────────────────────────
            "vkAcquireNextImageKHR" => {
                Some(std::mem::transmute(
                    swapchain::vkAcquireNextImageKHR as *const (),
                ))
            }
            "vkQueuePresentKHR" => {
                Some(std::mem::transmute(swapchain::vkQueuePresentKHR as *const ()))
            }

            _ => None,
        }
    }
}
