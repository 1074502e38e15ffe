//! Next-layer dispatch tables.
//!
//! One `InstanceTable` is registered per instance and one `DeviceTable` per
//! device. Both are filled by asking the next layer's proc-addr functions for
//! every entry point, the same way ash loads its own function tables.

use std::ffi::{c_void, CStr};
use std::ptr;

use ash::vk;

pub struct InstanceTable {
    pub get_instance_proc_addr: vk::PFN_vkGetInstanceProcAddr,
    pub fp: ash::InstanceFnV1_0,
}

impl InstanceTable {
    /// # Safety
    /// `gipa` must be the next layer's `vkGetInstanceProcAddr` and `instance`
    /// a live instance created through it.
    pub unsafe fn load(instance: vk::Instance, gipa: vk::PFN_vkGetInstanceProcAddr) -> Self {
        let fp = ash::InstanceFnV1_0::load(|name| resolve(gipa(instance, name.as_ptr())));
        Self {
            get_instance_proc_addr: gipa,
            fp,
        }
    }

    /// Next layer's pointer for an entry point this layer does not intercept.
    pub unsafe fn forward(&self, instance: vk::Instance, name: &CStr) -> vk::PFN_vkVoidFunction {
        (self.get_instance_proc_addr)(instance, name.as_ptr())
    }
}

pub struct DeviceTable {
    pub get_device_proc_addr: vk::PFN_vkGetDeviceProcAddr,
    pub fp: ash::DeviceFnV1_0,
    pub swapchain: ash::khr::swapchain::DeviceFn,
}

impl DeviceTable {
    /// # Safety
    /// `gdpa` must be the next layer's `vkGetDeviceProcAddr` and `device` a
    /// live device created through the same chain.
    pub unsafe fn load(device: vk::Device, gdpa: vk::PFN_vkGetDeviceProcAddr) -> Self {
        let mut load = |name: &CStr| resolve(gdpa(device, name.as_ptr()));
        Self {
            get_device_proc_addr: gdpa,
            fp: ash::DeviceFnV1_0::load(&mut load),
            swapchain: ash::khr::swapchain::DeviceFn::load(&mut load),
        }
    }

    pub unsafe fn forward(&self, device: vk::Device, name: &CStr) -> vk::PFN_vkVoidFunction {
        (self.get_device_proc_addr)(device, name.as_ptr())
    }
}

fn resolve(pfn: vk::PFN_vkVoidFunction) -> *const c_void {
    match pfn {
        Some(f) => f as *const c_void,
        None => ptr::null(),
    }
}
