//! Fences, queue submission and idle waits.
//!
//! `vkWaitForFences` and `vkQueueWaitIdle` may block for a long time; they
//! are recorded only after the next layer returns.

use ash::vk;

use apidump_core::entry_point as ep;
use apidump_core::{Arg, ArgValue};

use crate::args;
use crate::context;

// ── Fence ───────────────────────────────────────────────────

pub unsafe extern "system" fn vkCreateFence(
    device: vk::Device,
    p_create_info: *const vk::FenceCreateInfo<'_>,
    p_allocator: *const vk::AllocationCallbacks<'_>,
    p_fence: *mut vk::Fence,
) -> vk::Result {
    let ctx = context();
    let Some(table) = ctx.device_table(device) else {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    };
    ctx.intercept(
        &ep::CREATE_FENCE,
        || {
            let create_info = if p_create_info.is_null() {
                ArgValue::Null
            } else {
                let flags = (*p_create_info).flags;
                ArgValue::Struct(vec![Arg::new(
                    "flags",
                    "VkFenceCreateFlags",
                    args::named(flags, flags.as_raw() as i64),
                )])
            };
            vec![
                device_arg(device),
                Arg::new("pCreateInfo", "const VkFenceCreateInfo*", create_info),
                Arg::new("pAllocator", "const VkAllocationCallbacks*", ArgValue::pointer(p_allocator)),
            ]
        },
        || (table.fp.create_fence)(device, p_create_info, p_allocator, p_fence),
        |_| vec![Arg::new("pFence", "VkFence*", ArgValue::handle(*p_fence))],
    )
}

pub unsafe extern "system" fn vkDestroyFence(
    device: vk::Device,
    fence: vk::Fence,
    p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    let ctx = context();
    let Some(table) = ctx.device_table(device) else {
        return;
    };
    ctx.intercept(
        &ep::DESTROY_FENCE,
        || {
            vec![
                device_arg(device),
                Arg::new("fence", "VkFence", ArgValue::handle(fence)),
                Arg::new("pAllocator", "const VkAllocationCallbacks*", ArgValue::pointer(p_allocator)),
            ]
        },
        || (table.fp.destroy_fence)(device, fence, p_allocator),
        |_| Vec::new(),
    )
}

pub unsafe extern "system" fn vkResetFences(
    device: vk::Device,
    fence_count: u32,
    p_fences: *const vk::Fence,
) -> vk::Result {
    let ctx = context();
    let Some(table) = ctx.device_table(device) else {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    };
    ctx.intercept(
        &ep::RESET_FENCES,
        || {
            vec![
                device_arg(device),
                Arg::new("fenceCount", "uint32_t", args::uint(fence_count)),
                Arg::new("pFences", "const VkFence*", ArgValue::handles(args::slice(p_fences, fence_count))),
            ]
        },
        || (table.fp.reset_fences)(device, fence_count, p_fences),
        |_| Vec::new(),
    )
}

pub unsafe extern "system" fn vkGetFenceStatus(device: vk::Device, fence: vk::Fence) -> vk::Result {
    let ctx = context();
    let Some(table) = ctx.device_table(device) else {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    };
    ctx.intercept(
        &ep::GET_FENCE_STATUS,
        || vec![device_arg(device), Arg::new("fence", "VkFence", ArgValue::handle(fence))],
        || (table.fp.get_fence_status)(device, fence),
        |_| Vec::new(),
    )
}

pub unsafe extern "system" fn vkWaitForFences(
    device: vk::Device,
    fence_count: u32,
    p_fences: *const vk::Fence,
    wait_all: vk::Bool32,
    timeout: u64,
) -> vk::Result {
    let ctx = context();
    let Some(table) = ctx.device_table(device) else {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    };
    ctx.intercept(
        &ep::WAIT_FOR_FENCES,
        || {
            vec![
                device_arg(device),
                Arg::new("fenceCount", "uint32_t", args::uint(fence_count)),
                Arg::new("pFences", "const VkFence*", ArgValue::handles(args::slice(p_fences, fence_count))),
                Arg::new("waitAll", "VkBool32", args::bool32(wait_all)),
                Arg::new("timeout", "uint64_t", args::uint(timeout)),
            ]
        },
        || (table.fp.wait_for_fences)(device, fence_count, p_fences, wait_all, timeout),
        |_| Vec::new(),
    )
}

// ── Queue ───────────────────────────────────────────────────

pub unsafe extern "system" fn vkQueueSubmit(
    queue: vk::Queue,
    submit_count: u32,
    p_submits: *const vk::SubmitInfo<'_>,
    fence: vk::Fence,
) -> vk::Result {
    let ctx = context();
    let Some(table) = ctx.device_table(queue) else {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    };
    ctx.intercept(
        &ep::QUEUE_SUBMIT,
        || {
            let submits = args::slice(p_submits, submit_count)
                .iter()
                .map(|s| {
                    ArgValue::Struct(vec![
                        Arg::new(
                            "pWaitSemaphores",
                            "const VkSemaphore*",
                            ArgValue::handles(args::slice(s.p_wait_semaphores, s.wait_semaphore_count)),
                        ),
                        Arg::new(
                            "pCommandBuffers",
                            "const VkCommandBuffer*",
                            ArgValue::handles(args::slice(s.p_command_buffers, s.command_buffer_count)),
                        ),
                        Arg::new(
                            "pSignalSemaphores",
                            "const VkSemaphore*",
                            ArgValue::handles(args::slice(
                                s.p_signal_semaphores,
                                s.signal_semaphore_count,
                            )),
                        ),
                    ])
                })
                .collect();
            vec![
                queue_arg(queue),
                Arg::new("submitCount", "uint32_t", args::uint(submit_count)),
                Arg::new("pSubmits", "const VkSubmitInfo*", ArgValue::List(submits)),
                Arg::new("fence", "VkFence", ArgValue::handle(fence)),
            ]
        },
        || (table.fp.queue_submit)(queue, submit_count, p_submits, fence),
        |_| Vec::new(),
    )
}

pub unsafe extern "system" fn vkQueueWaitIdle(queue: vk::Queue) -> vk::Result {
    let ctx = context();
    let Some(table) = ctx.device_table(queue) else {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    };
    ctx.intercept(
        &ep::QUEUE_WAIT_IDLE,
        || vec![queue_arg(queue)],
        || (table.fp.queue_wait_idle)(queue),
        |_| Vec::new(),
    )
}

fn device_arg(device: vk::Device) -> Arg {
    Arg::new("device", "VkDevice", ArgValue::handle(device))
}

pub(crate) fn queue_arg(queue: vk::Queue) -> Arg {
    Arg::new("queue", "VkQueue", ArgValue::handle(queue))
}
