//! Drives the layer's trampolines against a fake next layer, the way the
//! loader would, and checks the layer's state and output after each step.

use std::ffi::{c_char, CStr, c_void};
use std::ptr;

use ash::vk;
use ash::vk::Handle;

use apidump_vk_layer::loader::{
    LayerDeviceCreateInfo, LayerDeviceCreateInfoUnion, LayerDeviceLink, LayerInstanceCreateInfo,
    LayerInstanceCreateInfoUnion, LayerInstanceLink, LAYER_LINK_INFO, LOADER_DEVICE_CREATE_INFO,
    LOADER_INSTANCE_CREATE_INFO,
};
use apidump_vk_layer::{command, context, device, instance, swapchain, vkGetDeviceProcAddr, vkGetInstanceProcAddr};

const INSTANCE_DISPATCH: usize = 0x1000;
const DEVICE_DISPATCH: usize = 0x2000;
const BARE_DEVICE_DISPATCH: usize = 0x3000;
const PHYSICAL_DEVICES: [u64; 2] = [0xA1, 0xA2];
const COMMAND_POOL: u64 = 0xC0;

/// Same layout the loader gives dispatchable objects.
#[repr(C)]
struct FakeObject {
    loader_data: usize,
}

fn dispatchable<H: Handle>(loader_data: usize) -> H {
    H::from_raw(Box::into_raw(Box::new(FakeObject { loader_data })) as usize as u64)
}

// ── Fake next layer ─────────────────────────────────────────

unsafe extern "system" fn next_create_instance(
    _: *const vk::InstanceCreateInfo<'_>,
    _: *const vk::AllocationCallbacks<'_>,
    p_instance: *mut vk::Instance,
) -> vk::Result {
    *p_instance = dispatchable(INSTANCE_DISPATCH);
    vk::Result::SUCCESS
}

unsafe extern "system" fn next_destroy_instance(_: vk::Instance, _: *const vk::AllocationCallbacks<'_>) {}

unsafe extern "system" fn next_enumerate_physical_devices(
    _: vk::Instance,
    p_count: *mut u32,
    p_devices: *mut vk::PhysicalDevice,
) -> vk::Result {
    if !p_devices.is_null() {
        for (i, raw) in PHYSICAL_DEVICES.iter().enumerate() {
            *p_devices.add(i) = vk::PhysicalDevice::from_raw(*raw);
        }
    }
    *p_count = PHYSICAL_DEVICES.len() as u32;
    vk::Result::SUCCESS
}

unsafe extern "system" fn next_create_device(
    _: vk::PhysicalDevice,
    _: *const vk::DeviceCreateInfo<'_>,
    _: *const vk::AllocationCallbacks<'_>,
    p_device: *mut vk::Device,
) -> vk::Result {
    *p_device = dispatchable(DEVICE_DISPATCH);
    vk::Result::SUCCESS
}

unsafe extern "system" fn next_destroy_device(_: vk::Device, _: *const vk::AllocationCallbacks<'_>) {}

unsafe extern "system" fn next_get_device_queue(_: vk::Device, _: u32, _: u32, p_queue: *mut vk::Queue) {
    *p_queue = dispatchable(DEVICE_DISPATCH);
}

unsafe extern "system" fn next_create_command_pool(
    _: vk::Device,
    _: *const vk::CommandPoolCreateInfo<'_>,
    _: *const vk::AllocationCallbacks<'_>,
    p_pool: *mut vk::CommandPool,
) -> vk::Result {
    *p_pool = vk::CommandPool::from_raw(COMMAND_POOL);
    vk::Result::SUCCESS
}

unsafe extern "system" fn next_destroy_command_pool(
    _: vk::Device,
    _: vk::CommandPool,
    _: *const vk::AllocationCallbacks<'_>,
) {
}

unsafe extern "system" fn next_allocate_command_buffers(
    _: vk::Device,
    p_info: *const vk::CommandBufferAllocateInfo<'_>,
    p_buffers: *mut vk::CommandBuffer,
) -> vk::Result {
    for i in 0..(*p_info).command_buffer_count as usize {
        *p_buffers.add(i) = dispatchable(DEVICE_DISPATCH);
    }
    vk::Result::SUCCESS
}

unsafe extern "system" fn next_free_command_buffers(
    _: vk::Device,
    _: vk::CommandPool,
    _: u32,
    _: *const vk::CommandBuffer,
) {
}

unsafe extern "system" fn next_queue_present(_: vk::Queue, _: *const vk::PresentInfoKHR<'_>) -> vk::Result {
    vk::Result::SUCCESS
}

unsafe extern "system" fn next_get_instance_proc_addr(
    _: vk::Instance,
    p_name: *const c_char,
) -> vk::PFN_vkVoidFunction {
    let f = match CStr::from_ptr(p_name).to_bytes() {
        b"vkCreateInstance" => next_create_instance as *const (),
        b"vkDestroyInstance" => next_destroy_instance as *const (),
        b"vkEnumeratePhysicalDevices" => next_enumerate_physical_devices as *const (),
        b"vkCreateDevice" => next_create_device as *const (),
        _ => return None,
    };
    Some(std::mem::transmute::<*const (), unsafe extern "system" fn()>(f))
}

unsafe extern "system" fn next_get_device_proc_addr(
    _: vk::Device,
    p_name: *const c_char,
) -> vk::PFN_vkVoidFunction {
    let f = match CStr::from_ptr(p_name).to_bytes() {
        b"vkDestroyDevice" => next_destroy_device as *const (),
        b"vkGetDeviceQueue" => next_get_device_queue as *const (),
        b"vkCreateCommandPool" => next_create_command_pool as *const (),
        b"vkDestroyCommandPool" => next_destroy_command_pool as *const (),
        b"vkAllocateCommandBuffers" => next_allocate_command_buffers as *const (),
        b"vkFreeCommandBuffers" => next_free_command_buffers as *const (),
        b"vkQueuePresentKHR" => next_queue_present as *const (),
        _ => return None,
    };
    Some(std::mem::transmute::<*const (), unsafe extern "system" fn()>(f))
}

// A device created without VK_KHR_swapchain.

unsafe extern "system" fn bare_create_device(
    _: vk::PhysicalDevice,
    _: *const vk::DeviceCreateInfo<'_>,
    _: *const vk::AllocationCallbacks<'_>,
    p_device: *mut vk::Device,
) -> vk::Result {
    *p_device = dispatchable(BARE_DEVICE_DISPATCH);
    vk::Result::SUCCESS
}

unsafe extern "system" fn bare_get_instance_proc_addr(
    instance: vk::Instance,
    p_name: *const c_char,
) -> vk::PFN_vkVoidFunction {
    if CStr::from_ptr(p_name) == c"vkCreateDevice" {
        return Some(std::mem::transmute::<*const (), unsafe extern "system" fn()>(
            bare_create_device as *const (),
        ));
    }
    next_get_instance_proc_addr(instance, p_name)
}

unsafe extern "system" fn bare_get_device_proc_addr(
    device: vk::Device,
    p_name: *const c_char,
) -> vk::PFN_vkVoidFunction {
    match CStr::from_ptr(p_name).to_bytes() {
        b"vkQueuePresentKHR" | b"vkAcquireNextImageKHR" => None,
        _ => next_get_device_proc_addr(device, p_name),
    }
}

// ── Scenario ────────────────────────────────────────────────

#[test]
fn application_lifecycle_through_the_layer() {
    let dir = tempfile::tempdir().unwrap();
    let dump = dir.path().join("dump.txt");
    // Only test in this binary, so nothing else reads the environment yet.
    std::env::set_var("APIDUMP_CONFIG", dir.path().join("absent.toml"));
    std::env::set_var("APIDUMP_OUTPUT_FORMAT", "text");
    std::env::set_var("APIDUMP_OUTPUT_RANGE", "0");
    std::env::set_var("APIDUMP_LOG_FILENAME", &dump);
    let ctx = context();

    unsafe {
        // Instance creation walks the loader chain.
        let mut instance_link = LayerInstanceLink {
            p_next: ptr::null_mut(),
            pfn_next_get_instance_proc_addr: next_get_instance_proc_addr,
            pfn_next_get_physical_device_proc_addr: None,
        };
        let mut instance_chain = LayerInstanceCreateInfo {
            s_type: LOADER_INSTANCE_CREATE_INFO,
            p_next: ptr::null(),
            function: LAYER_LINK_INFO,
            u: LayerInstanceCreateInfoUnion { layer_info: &mut instance_link },
        };
        let mut instance_info = vk::InstanceCreateInfo::default();
        instance_info.p_next = ptr::addr_of_mut!(instance_chain) as *const c_void;

        let mut inst = vk::Instance::null();
        let result = instance::vkCreateInstance(&instance_info, ptr::null(), &mut inst);
        assert_eq!(result, vk::Result::SUCCESS);
        assert_ne!(inst, vk::Instance::null());
        assert_eq!(ctx.instances().len(), 1);

        // Unintercepted names go to the next layer.
        assert!(vkGetInstanceProcAddr(inst, c"vkCreateBuffer".as_ptr()).is_none());
        assert!(vkGetInstanceProcAddr(inst, c"vkQueueSubmit".as_ptr()).is_some());

        // Two-call enumeration.
        let mut count = 0u32;
        let result = instance::vkEnumeratePhysicalDevices(inst, &mut count, ptr::null_mut());
        assert_eq!(result, vk::Result::SUCCESS);
        assert_eq!(count, 2);
        assert_eq!(ctx.tracker().physical_device_count(), 0);

        let mut physical_devices = [vk::PhysicalDevice::null(); 2];
        instance::vkEnumeratePhysicalDevices(inst, &mut count, physical_devices.as_mut_ptr());
        assert_eq!(ctx.tracker().resolve_owning_instance(physical_devices[1]), Some(inst));

        // Device creation resolves the instance through the physical device.
        let mut device_link = LayerDeviceLink {
            p_next: ptr::null_mut(),
            pfn_next_get_instance_proc_addr: next_get_instance_proc_addr,
            pfn_next_get_device_proc_addr: next_get_device_proc_addr,
        };
        let mut device_chain = LayerDeviceCreateInfo {
            s_type: LOADER_DEVICE_CREATE_INFO,
            p_next: ptr::null(),
            function: LAYER_LINK_INFO,
            u: LayerDeviceCreateInfoUnion { layer_info: &mut device_link },
        };
        let mut device_info = vk::DeviceCreateInfo::default();
        device_info.p_next = ptr::addr_of_mut!(device_chain) as *const c_void;

        let mut dev = vk::Device::null();
        let result = device::vkCreateDevice(physical_devices[0], &device_info, ptr::null(), &mut dev);
        assert_eq!(result, vk::Result::SUCCESS);
        assert_eq!(ctx.devices().len(), 1);
        assert!(vkGetDeviceProcAddr(dev, c"vkCmdDraw".as_ptr()).is_some());
        assert!(vkGetDeviceProcAddr(dev, c"vkCreateInstance".as_ptr()).is_none());

        // Queues share the device's table.
        let mut queue = vk::Queue::null();
        device::vkGetDeviceQueue(dev, 0, 0, &mut queue);
        assert!(ctx.device_table(queue).is_some());

        // Pool membership.
        let pool_info = vk::CommandPoolCreateInfo::default();
        let mut pool = vk::CommandPool::null();
        command::vkCreateCommandPool(dev, &pool_info, ptr::null(), &mut pool);
        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(3);
        let mut buffers = [vk::CommandBuffer::null(); 3];
        let result = command::vkAllocateCommandBuffers(dev, &alloc_info, buffers.as_mut_ptr());
        assert_eq!(result, vk::Result::SUCCESS);
        assert_eq!(ctx.tracker().pool_buffers(dev, pool).unwrap().len(), 3);

        command::vkFreeCommandBuffers(dev, pool, 1, &buffers[1]);
        let remaining = ctx.tracker().pool_buffers(dev, pool).unwrap();
        assert!(remaining.contains_key(&buffers[0]) && remaining.contains_key(&buffers[2]));
        assert!(!remaining.contains_key(&buffers[1]));
        assert!(ctx.device_table(buffers[0]).is_some());

        // Present ends frame 0.
        let present_info = vk::PresentInfoKHR::default();
        assert_eq!(swapchain::vkQueuePresentKHR(queue, &present_info), vk::Result::SUCCESS);
        assert_eq!(ctx.frames().current(), 1);

        // Swapchain commands are only handed out where the extension exists.
        assert!(vkGetDeviceProcAddr(dev, c"vkQueuePresentKHR".as_ptr()).is_some());
        assert!(vkGetDeviceProcAddr(dev, c"vkAcquireNextImageKHR".as_ptr()).is_none());
        let mut bare_link = LayerDeviceLink {
            p_next: ptr::null_mut(),
            pfn_next_get_instance_proc_addr: bare_get_instance_proc_addr,
            pfn_next_get_device_proc_addr: bare_get_device_proc_addr,
        };
        let mut bare_chain = LayerDeviceCreateInfo {
            s_type: LOADER_DEVICE_CREATE_INFO,
            p_next: ptr::null(),
            function: LAYER_LINK_INFO,
            u: LayerDeviceCreateInfoUnion { layer_info: &mut bare_link },
        };
        let mut bare_info = vk::DeviceCreateInfo::default();
        bare_info.p_next = ptr::addr_of_mut!(bare_chain) as *const c_void;

        let mut bare = vk::Device::null();
        let result = device::vkCreateDevice(physical_devices[1], &bare_info, ptr::null(), &mut bare);
        assert_eq!(result, vk::Result::SUCCESS);
        assert_eq!(ctx.devices().len(), 2);
        assert!(vkGetDeviceProcAddr(bare, c"vkQueuePresentKHR".as_ptr()).is_none());
        assert!(vkGetDeviceProcAddr(bare, c"vkAcquireNextImageKHR".as_ptr()).is_none());
        assert!(vkGetDeviceProcAddr(bare, c"vkCmdDraw".as_ptr()).is_some());
        device::vkDestroyDevice(bare, ptr::null());
        assert_eq!(ctx.devices().len(), 1);

        // Teardown.
        command::vkDestroyCommandPool(dev, pool, ptr::null());
        assert_eq!(ctx.tracker().pool_count(), 0);
        device::vkDestroyDevice(dev, ptr::null());
        assert!(ctx.devices().is_empty());
        instance::vkDestroyInstance(inst, ptr::null());
        assert!(ctx.instances().is_empty());
        assert_eq!(ctx.tracker().physical_device_count(), 0);
    }

    ctx.output().flush();
    let text = std::fs::read_to_string(&dump).unwrap();
    let created = text.find("vkCreateInstance(").unwrap();
    let destroyed = text.find("vkDestroyInstance(").unwrap();
    assert!(created < destroyed);
    assert!(text.contains("Frame 0"));
    assert!(text.contains("Frame 1"));
    assert!(text.contains("vkQueuePresentKHR("));
}
