//! Logical device and queue functions.

use ash::vk;

use apidump_core::entry_point as ep;
use apidump_core::{Arg, ArgValue};

use crate::args;
use crate::context;
use crate::loader::take_device_link;
use crate::tables::DeviceTable;

pub unsafe extern "system" fn vkCreateDevice(
    physical_device: vk::PhysicalDevice,
    p_create_info: *const vk::DeviceCreateInfo<'_>,
    p_allocator: *const vk::AllocationCallbacks<'_>,
    p_device: *mut vk::Device,
) -> vk::Result {
    let ctx = context();
    let Some(instance) = ctx.tracker().resolve_owning_instance(physical_device) else {
        // Goes through the violation policy for the unknown physical device.
        let _ = ctx.physical_device_table(physical_device);
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    };
    let Some((gipa, gdpa)) = take_device_link(p_create_info) else {
        tracing::error!("vkCreateDevice: no layer link in the create info chain");
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    };
    let Some(next) = gipa(instance, c"vkCreateDevice".as_ptr()) else {
        tracing::error!("vkCreateDevice: next layer does not provide vkCreateDevice");
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    };
    let create_device: vk::PFN_vkCreateDevice = std::mem::transmute(next);

    ctx.intercept(
        &ep::CREATE_DEVICE,
        || {
            vec![
                Arg::new("physicalDevice", "VkPhysicalDevice", ArgValue::handle(physical_device)),
                Arg::new("pCreateInfo", "const VkDeviceCreateInfo*", create_info(p_create_info)),
                Arg::new("pAllocator", "const VkAllocationCallbacks*", ArgValue::pointer(p_allocator)),
            ]
        },
        || create_device(physical_device, p_create_info, p_allocator, p_device),
        |_| {
            let device = *p_device;
            ctx.register_device(device, DeviceTable::load(device, gdpa));
            vec![Arg::new("pDevice", "VkDevice*", ArgValue::handle(device))]
        },
    )
}

pub unsafe extern "system" fn vkDestroyDevice(
    device: vk::Device,
    p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    if device == vk::Device::null() {
        return;
    }
    let ctx = context();
    let Some(table) = ctx.device_table(device) else {
        return;
    };
    ctx.intercept(
        &ep::DESTROY_DEVICE,
        || {
            vec![
                Arg::new("device", "VkDevice", ArgValue::handle(device)),
                Arg::new("pAllocator", "const VkAllocationCallbacks*", ArgValue::pointer(p_allocator)),
            ]
        },
        || (table.fp.destroy_device)(device, p_allocator),
        |_| {
            ctx.unregister_device(device);
            Vec::new()
        },
    )
}

pub unsafe extern "system" fn vkGetDeviceQueue(
    device: vk::Device,
    queue_family_index: u32,
    queue_index: u32,
    p_queue: *mut vk::Queue,
) {
    let ctx = context();
    let Some(table) = ctx.device_table(device) else {
        return;
    };
    ctx.intercept(
        &ep::GET_DEVICE_QUEUE,
        || {
            vec![
                Arg::new("device", "VkDevice", ArgValue::handle(device)),
                Arg::new("queueFamilyIndex", "uint32_t", args::uint(queue_family_index)),
                Arg::new("queueIndex", "uint32_t", args::uint(queue_index)),
            ]
        },
        || (table.fp.get_device_queue)(device, queue_family_index, queue_index, p_queue),
        |_| {
            if p_queue.is_null() {
                return Vec::new();
            }
            vec![Arg::new("pQueue", "VkQueue*", ArgValue::handle(*p_queue))]
        },
    )
}

pub unsafe extern "system" fn vkDeviceWaitIdle(device: vk::Device) -> vk::Result {
    let ctx = context();
    let Some(table) = ctx.device_table(device) else {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    };
    ctx.intercept(
        &ep::DEVICE_WAIT_IDLE,
        || vec![Arg::new("device", "VkDevice", ArgValue::handle(device))],
        || (table.fp.device_wait_idle)(device),
        |_| Vec::new(),
    )
}

unsafe fn create_info(p: *const vk::DeviceCreateInfo<'_>) -> ArgValue {
    if p.is_null() {
        return ArgValue::Null;
    }
    let ci = &*p;
    let queues = args::slice(ci.p_queue_create_infos, ci.queue_create_info_count)
        .iter()
        .map(|q| {
            ArgValue::Struct(vec![
                Arg::new("queueFamilyIndex", "uint32_t", args::uint(q.queue_family_index)),
                Arg::new("queueCount", "uint32_t", args::uint(q.queue_count)),
            ])
        })
        .collect();
    ArgValue::Struct(vec![
        Arg::new("pQueueCreateInfos", "const VkDeviceQueueCreateInfo*", ArgValue::List(queues)),
        Arg::new(
            "ppEnabledExtensionNames",
            "const char* const*",
            args::string_list(ci.pp_enabled_extension_names, ci.enabled_extension_count),
        ),
        Arg::new(
            "pEnabledFeatures",
            "const VkPhysicalDeviceFeatures*",
            ArgValue::pointer(ci.p_enabled_features),
        ),
    ])
}
