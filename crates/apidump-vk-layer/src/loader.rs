//! Loader/layer interface structures (vk_layer.h) and chain walking.
//!
//! The loader passes each layer a link into the layer chain through the
//! `pNext` chain of `VkInstanceCreateInfo` / `VkDeviceCreateInfo`. A layer
//! takes the next layer's `vkGetInstanceProcAddr` (and `vkGetDeviceProcAddr`)
//! from its link and advances the link before calling down.

use std::ffi::c_void;

use ash::vk;

/// Highest loader/layer interface version this layer speaks.
pub const LAYER_INTERFACE_VERSION: u32 = 2;

pub const LOADER_INSTANCE_CREATE_INFO: vk::StructureType = vk::StructureType::from_raw(47);
pub const LOADER_DEVICE_CREATE_INFO: vk::StructureType = vk::StructureType::from_raw(48);

/// `VkLayerFunction::VK_LAYER_LINK_INFO`
pub const LAYER_LINK_INFO: i32 = 0;

/// `VkNegotiateLayerStructType::LAYER_NEGOTIATE_INTERFACE_STRUCT`
pub const LAYER_NEGOTIATE_INTERFACE_STRUCT: i32 = 1;

pub type PfnGetPhysicalDeviceProcAddr =
    unsafe extern "system" fn(vk::Instance, *const std::ffi::c_char) -> vk::PFN_vkVoidFunction;

#[repr(C)]
pub struct LayerInstanceLink {
    pub p_next: *mut LayerInstanceLink,
    pub pfn_next_get_instance_proc_addr: vk::PFN_vkGetInstanceProcAddr,
    pub pfn_next_get_physical_device_proc_addr: Option<PfnGetPhysicalDeviceProcAddr>,
}

#[repr(C)]
pub union LayerInstanceCreateInfoUnion {
    pub layer_info: *mut LayerInstanceLink,
    pub pfn_set_instance_loader_data: *const c_void,
    pub layer_device: [*const c_void; 2],
    pub loader_features: u32,
}

#[repr(C)]
pub struct LayerInstanceCreateInfo {
    pub s_type: vk::StructureType,
    pub p_next: *const c_void,
    pub function: i32,
    pub u: LayerInstanceCreateInfoUnion,
}

#[repr(C)]
pub struct LayerDeviceLink {
    pub p_next: *mut LayerDeviceLink,
    pub pfn_next_get_instance_proc_addr: vk::PFN_vkGetInstanceProcAddr,
    pub pfn_next_get_device_proc_addr: vk::PFN_vkGetDeviceProcAddr,
}

#[repr(C)]
pub union LayerDeviceCreateInfoUnion {
    pub layer_info: *mut LayerDeviceLink,
    pub pfn_set_device_loader_data: *const c_void,
}

#[repr(C)]
pub struct LayerDeviceCreateInfo {
    pub s_type: vk::StructureType,
    pub p_next: *const c_void,
    pub function: i32,
    pub u: LayerDeviceCreateInfoUnion,
}

#[repr(C)]
pub struct NegotiateLayerInterface {
    pub s_type: i32,
    pub p_next: *mut c_void,
    pub loader_layer_interface_version: u32,
    pub pfn_get_instance_proc_addr: Option<vk::PFN_vkGetInstanceProcAddr>,
    pub pfn_get_device_proc_addr: Option<vk::PFN_vkGetDeviceProcAddr>,
    pub pfn_get_physical_device_proc_addr: Option<PfnGetPhysicalDeviceProcAddr>,
}

/// Minimal view of any Vulkan input structure: enough to walk `pNext`.
#[repr(C)]
struct BaseInStructure {
    s_type: vk::StructureType,
    p_next: *const BaseInStructure,
}

unsafe fn find_link_info(mut p_next: *const c_void, s_type: vk::StructureType) -> *mut c_void {
    while !p_next.is_null() {
        let base = p_next as *const BaseInStructure;
        if (*base).s_type == s_type {
            // Both loader create-info structs share this prefix.
            let info = p_next as *const LayerInstanceCreateInfo;
            if (*info).function == LAYER_LINK_INFO {
                return p_next as *mut c_void;
            }
        }
        p_next = (*base).p_next as *const c_void;
    }
    std::ptr::null_mut()
}

/// Next layer's `vkGetInstanceProcAddr`, taken from the chain info in
/// `create_info`. The link is advanced so the next layer finds its own.
///
/// # Safety
/// `create_info` must be a valid `VkInstanceCreateInfo` built by the loader.
pub unsafe fn take_instance_link(
    create_info: *const vk::InstanceCreateInfo<'_>,
) -> Option<vk::PFN_vkGetInstanceProcAddr> {
    if create_info.is_null() {
        return None;
    }
    let chain = find_link_info((*create_info).p_next, LOADER_INSTANCE_CREATE_INFO)
        as *mut LayerInstanceCreateInfo;
    if chain.is_null() {
        return None;
    }
    let link = (*chain).u.layer_info;
    if link.is_null() {
        return None;
    }
    (*chain).u.layer_info = (*link).p_next;
    Some((*link).pfn_next_get_instance_proc_addr)
}

/// Next layer's `vkGetInstanceProcAddr` and `vkGetDeviceProcAddr`, taken
/// from the chain info in `create_info`. The link is advanced.
///
/// # Safety
/// `create_info` must be a valid `VkDeviceCreateInfo` built by the loader.
pub unsafe fn take_device_link(
    create_info: *const vk::DeviceCreateInfo<'_>,
) -> Option<(vk::PFN_vkGetInstanceProcAddr, vk::PFN_vkGetDeviceProcAddr)> {
    if create_info.is_null() {
        return None;
    }
    let chain = find_link_info((*create_info).p_next, LOADER_DEVICE_CREATE_INFO)
        as *mut LayerDeviceCreateInfo;
    if chain.is_null() {
        return None;
    }
    let link = (*chain).u.layer_info;
    if link.is_null() {
        return None;
    }
    (*chain).u.layer_info = (*link).p_next;
    Some((
        (*link).pfn_next_get_instance_proc_addr,
        (*link).pfn_next_get_device_proc_addr,
    ))
}
