//! Physical device queries.
//!
//! Physical devices have no dispatch table of their own. The table is found
//! through the instance that enumerated them.

use std::ffi::c_char;

use ash::vk;

use apidump_core::entry_point as ep;
use apidump_core::{Arg, ArgValue};

use crate::args;
use crate::context;

pub unsafe extern "system" fn vkGetPhysicalDeviceProperties(
    physical_device: vk::PhysicalDevice,
    p_properties: *mut vk::PhysicalDeviceProperties,
) {
    let ctx = context();
    let Some(table) = ctx.physical_device_table(physical_device) else {
        return;
    };
    ctx.intercept(
        &ep::GET_PHYSICAL_DEVICE_PROPERTIES,
        || vec![physical_device_arg(physical_device)],
        || (table.fp.get_physical_device_properties)(physical_device, p_properties),
        |_| {
            if p_properties.is_null() {
                return Vec::new();
            }
            let props = &*p_properties;
            vec![Arg::new(
                "pProperties",
                "VkPhysicalDeviceProperties*",
                ArgValue::Struct(vec![
                    Arg::new("apiVersion", "uint32_t", args::api_version(props.api_version)),
                    Arg::new("driverVersion", "uint32_t", args::uint(props.driver_version)),
                    Arg::new("vendorID", "uint32_t", args::uint(props.vendor_id)),
                    Arg::new("deviceID", "uint32_t", args::uint(props.device_id)),
                    Arg::new(
                        "deviceType",
                        "VkPhysicalDeviceType",
                        args::named(props.device_type, props.device_type.as_raw() as i64),
                    ),
                    Arg::new("deviceName", "char[]", args::fixed_string(&props.device_name)),
                ]),
            )]
        },
    )
}

pub unsafe extern "system" fn vkGetPhysicalDeviceFeatures(
    physical_device: vk::PhysicalDevice,
    p_features: *mut vk::PhysicalDeviceFeatures,
) {
    let ctx = context();
    let Some(table) = ctx.physical_device_table(physical_device) else {
        return;
    };
    ctx.intercept(
        &ep::GET_PHYSICAL_DEVICE_FEATURES,
        || vec![physical_device_arg(physical_device)],
        || (table.fp.get_physical_device_features)(physical_device, p_features),
        |_| {
            if p_features.is_null() {
                return Vec::new();
            }
            let f = &*p_features;
            vec![Arg::new(
                "pFeatures",
                "VkPhysicalDeviceFeatures*",
                ArgValue::Struct(vec![
                    Arg::new("robustBufferAccess", "VkBool32", args::bool32(f.robust_buffer_access)),
                    Arg::new("geometryShader", "VkBool32", args::bool32(f.geometry_shader)),
                    Arg::new("tessellationShader", "VkBool32", args::bool32(f.tessellation_shader)),
                    Arg::new("multiDrawIndirect", "VkBool32", args::bool32(f.multi_draw_indirect)),
                    Arg::new("samplerAnisotropy", "VkBool32", args::bool32(f.sampler_anisotropy)),
                    Arg::new("shaderFloat64", "VkBool32", args::bool32(f.shader_float64)),
                    Arg::new("shaderInt64", "VkBool32", args::bool32(f.shader_int64)),
                ]),
            )]
        },
    )
}

pub unsafe extern "system" fn vkGetPhysicalDeviceMemoryProperties(
    physical_device: vk::PhysicalDevice,
    p_memory_properties: *mut vk::PhysicalDeviceMemoryProperties,
) {
    let ctx = context();
    let Some(table) = ctx.physical_device_table(physical_device) else {
        return;
    };
    ctx.intercept(
        &ep::GET_PHYSICAL_DEVICE_MEMORY_PROPERTIES,
        || vec![physical_device_arg(physical_device)],
        || (table.fp.get_physical_device_memory_properties)(physical_device, p_memory_properties),
        |_| {
            if p_memory_properties.is_null() {
                return Vec::new();
            }
            let mp = &*p_memory_properties;
            let type_count = (mp.memory_type_count as usize).min(vk::MAX_MEMORY_TYPES);
            let heap_count = (mp.memory_heap_count as usize).min(vk::MAX_MEMORY_HEAPS);
            let types = mp.memory_types[..type_count].iter().map(|t| {
                ArgValue::Struct(vec![
                    Arg::new(
                        "propertyFlags",
                        "VkMemoryPropertyFlags",
                        args::named(t.property_flags, t.property_flags.as_raw() as i64),
                    ),
                    Arg::new("heapIndex", "uint32_t", args::uint(t.heap_index)),
                ])
            });
            let heaps = mp.memory_heaps[..heap_count].iter().map(|h| {
                ArgValue::Struct(vec![
                    Arg::new("size", "VkDeviceSize", args::uint(h.size)),
                    Arg::new(
                        "flags",
                        "VkMemoryHeapFlags",
                        args::named(h.flags, h.flags.as_raw() as i64),
                    ),
                ])
            });
            vec![Arg::new(
                "pMemoryProperties",
                "VkPhysicalDeviceMemoryProperties*",
                ArgValue::Struct(vec![
                    Arg::new("memoryTypes", "VkMemoryType[]", ArgValue::List(types.collect())),
                    Arg::new("memoryHeaps", "VkMemoryHeap[]", ArgValue::List(heaps.collect())),
                ]),
            )]
        },
    )
}

pub unsafe extern "system" fn vkGetPhysicalDeviceQueueFamilyProperties(
    physical_device: vk::PhysicalDevice,
    p_queue_family_property_count: *mut u32,
    p_queue_family_properties: *mut vk::QueueFamilyProperties,
) {
    let ctx = context();
    let Some(table) = ctx.physical_device_table(physical_device) else {
        return;
    };
    ctx.intercept(
        &ep::GET_PHYSICAL_DEVICE_QUEUE_FAMILY_PROPERTIES,
        || {
            vec![
                physical_device_arg(physical_device),
                Arg::new(
                    "pQueueFamilyPropertyCount",
                    "uint32_t*",
                    args::count(p_queue_family_property_count),
                ),
            ]
        },
        || {
            (table.fp.get_physical_device_queue_family_properties)(
                physical_device,
                p_queue_family_property_count,
                p_queue_family_properties,
            )
        },
        |_| {
            let mut outputs = vec![Arg::new(
                "pQueueFamilyPropertyCount",
                "uint32_t*",
                args::count(p_queue_family_property_count),
            )];
            if !p_queue_family_property_count.is_null() {
                let families = args::slice(p_queue_family_properties, *p_queue_family_property_count);
                if !families.is_empty() {
                    let list = families.iter().map(|q| {
                        ArgValue::Struct(vec![
                            Arg::new(
                                "queueFlags",
                                "VkQueueFlags",
                                args::named(q.queue_flags, q.queue_flags.as_raw() as i64),
                            ),
                            Arg::new("queueCount", "uint32_t", args::uint(q.queue_count)),
                        ])
                    });
                    outputs.push(Arg::new(
                        "pQueueFamilyProperties",
                        "VkQueueFamilyProperties*",
                        ArgValue::List(list.collect()),
                    ));
                }
            }
            outputs
        },
    )
}

pub unsafe extern "system" fn vkEnumerateDeviceExtensionProperties(
    physical_device: vk::PhysicalDevice,
    p_layer_name: *const c_char,
    p_property_count: *mut u32,
    p_properties: *mut vk::ExtensionProperties,
) -> vk::Result {
    let ctx = context();
    let Some(table) = ctx.physical_device_table(physical_device) else {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    };
    ctx.intercept(
        &ep::ENUMERATE_DEVICE_EXTENSION_PROPERTIES,
        || {
            vec![
                physical_device_arg(physical_device),
                Arg::new("pLayerName", "const char*", args::c_string(p_layer_name)),
                Arg::new("pPropertyCount", "uint32_t*", args::count(p_property_count)),
            ]
        },
        || {
            (table.fp.enumerate_device_extension_properties)(
                physical_device,
                p_layer_name,
                p_property_count,
                p_properties,
            )
        },
        |_| {
            let mut outputs =
                vec![Arg::new("pPropertyCount", "uint32_t*", args::count(p_property_count))];
            if !p_properties.is_null() && !p_property_count.is_null() {
                let names = args::slice(p_properties, *p_property_count)
                    .iter()
                    .map(|e| args::fixed_string(&e.extension_name))
                    .collect();
                outputs.push(Arg::new("pProperties", "VkExtensionProperties*", ArgValue::List(names)));
            }
            outputs
        },
    )
}

fn physical_device_arg(physical_device: vk::PhysicalDevice) -> Arg {
    Arg::new("physicalDevice", "VkPhysicalDevice", ArgValue::handle(physical_device))
}
