//! Vulkan instance and enumeration functions.

use ash::vk;

use apidump_core::entry_point as ep;
use apidump_core::{Arg, ArgValue};

use crate::args;
use crate::context;
use crate::loader::take_instance_link;
use crate::tables::InstanceTable;

pub unsafe extern "system" fn vkCreateInstance(
    p_create_info: *const vk::InstanceCreateInfo<'_>,
    p_allocator: *const vk::AllocationCallbacks<'_>,
    p_instance: *mut vk::Instance,
) -> vk::Result {
    let ctx = context();
    let Some(gipa) = take_instance_link(p_create_info) else {
        tracing::error!("vkCreateInstance: no layer link in the create info chain");
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    };
    let Some(next) = gipa(vk::Instance::null(), c"vkCreateInstance".as_ptr()) else {
        tracing::error!("vkCreateInstance: next layer does not provide vkCreateInstance");
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    };
    let create_instance: vk::PFN_vkCreateInstance = std::mem::transmute(next);

    ctx.intercept(
        &ep::CREATE_INSTANCE,
        || {
            vec![
                Arg::new("pCreateInfo", "const VkInstanceCreateInfo*", create_info(p_create_info)),
                Arg::new("pAllocator", "const VkAllocationCallbacks*", ArgValue::pointer(p_allocator)),
            ]
        },
        || create_instance(p_create_info, p_allocator, p_instance),
        |_| {
            let instance = *p_instance;
            ctx.register_instance(instance, InstanceTable::load(instance, gipa));
            vec![Arg::new("pInstance", "VkInstance*", ArgValue::handle(instance))]
        },
    )
}

pub unsafe extern "system" fn vkDestroyInstance(
    instance: vk::Instance,
    p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    if instance == vk::Instance::null() {
        return;
    }
    let ctx = context();
    let Some(table) = ctx.instance_table(instance) else {
        return;
    };
    ctx.intercept(
        &ep::DESTROY_INSTANCE,
        || {
            vec![
                Arg::new("instance", "VkInstance", ArgValue::handle(instance)),
                Arg::new("pAllocator", "const VkAllocationCallbacks*", ArgValue::pointer(p_allocator)),
            ]
        },
        || (table.fp.destroy_instance)(instance, p_allocator),
        |_| {
            ctx.unregister_instance(instance);
            Vec::new()
        },
    )
}

pub unsafe extern "system" fn vkEnumeratePhysicalDevices(
    instance: vk::Instance,
    p_physical_device_count: *mut u32,
    p_physical_devices: *mut vk::PhysicalDevice,
) -> vk::Result {
    let ctx = context();
    let Some(table) = ctx.instance_table(instance) else {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    };
    ctx.intercept(
        &ep::ENUMERATE_PHYSICAL_DEVICES,
        || {
            vec![
                Arg::new("instance", "VkInstance", ArgValue::handle(instance)),
                Arg::new("pPhysicalDeviceCount", "uint32_t*", args::count(p_physical_device_count)),
            ]
        },
        || (table.fp.enumerate_physical_devices)(instance, p_physical_device_count, p_physical_devices),
        |_| {
            let mut outputs = vec![Arg::new(
                "pPhysicalDeviceCount",
                "uint32_t*",
                args::count(p_physical_device_count),
            )];
            // A count-only query returns no handles to track.
            if !p_physical_devices.is_null() && !p_physical_device_count.is_null() {
                let devices = args::slice(p_physical_devices, *p_physical_device_count);
                ctx.tracker().record_physical_devices(instance, devices);
                outputs.push(Arg::new(
                    "pPhysicalDevices",
                    "VkPhysicalDevice*",
                    ArgValue::handles(devices),
                ));
            }
            outputs
        },
    )
}

unsafe fn create_info(p: *const vk::InstanceCreateInfo<'_>) -> ArgValue {
    if p.is_null() {
        return ArgValue::Null;
    }
    let ci = &*p;
    let application = if ci.p_application_info.is_null() {
        ArgValue::Null
    } else {
        let ai = &*ci.p_application_info;
        ArgValue::Struct(vec![
            Arg::new("pApplicationName", "const char*", args::c_string(ai.p_application_name)),
            Arg::new("applicationVersion", "uint32_t", args::uint(ai.application_version)),
            Arg::new("pEngineName", "const char*", args::c_string(ai.p_engine_name)),
            Arg::new("engineVersion", "uint32_t", args::uint(ai.engine_version)),
            Arg::new("apiVersion", "uint32_t", args::api_version(ai.api_version)),
        ])
    };
    ArgValue::Struct(vec![
        Arg::new("pApplicationInfo", "const VkApplicationInfo*", application),
        Arg::new(
            "ppEnabledLayerNames",
            "const char* const*",
            args::string_list(ci.pp_enabled_layer_names, ci.enabled_layer_count),
        ),
        Arg::new(
            "ppEnabledExtensionNames",
            "const char* const*",
            args::string_list(ci.pp_enabled_extension_names, ci.enabled_extension_count),
        ),
    ])
}
