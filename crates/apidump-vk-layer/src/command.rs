//! Command pool, command buffer and recording functions.
//!
//! Command buffers are tracked per pool so that destroying a pool also
//! forgets every buffer it still owned.

use ash::vk;

use apidump_core::entry_point as ep;
use apidump_core::{Arg, ArgValue};

use crate::args;
use crate::context;

// ── Command Pool ────────────────────────────────────────────

pub unsafe extern "system" fn vkCreateCommandPool(
    device: vk::Device,
    p_create_info: *const vk::CommandPoolCreateInfo<'_>,
    p_allocator: *const vk::AllocationCallbacks<'_>,
    p_command_pool: *mut vk::CommandPool,
) -> vk::Result {
    let ctx = context();
    let Some(table) = ctx.device_table(device) else {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    };
    ctx.intercept(
        &ep::CREATE_COMMAND_POOL,
        || {
            let create_info = if p_create_info.is_null() {
                ArgValue::Null
            } else {
                let ci = &*p_create_info;
                ArgValue::Struct(vec![
                    Arg::new(
                        "flags",
                        "VkCommandPoolCreateFlags",
                        args::named(ci.flags, ci.flags.as_raw() as i64),
                    ),
                    Arg::new("queueFamilyIndex", "uint32_t", args::uint(ci.queue_family_index)),
                ])
            };
            vec![
                device_arg(device),
                Arg::new("pCreateInfo", "const VkCommandPoolCreateInfo*", create_info),
                Arg::new("pAllocator", "const VkAllocationCallbacks*", ArgValue::pointer(p_allocator)),
            ]
        },
        || (table.fp.create_command_pool)(device, p_create_info, p_allocator, p_command_pool),
        |_| {
            vec![Arg::new(
                "pCommandPool",
                "VkCommandPool*",
                ArgValue::handle(*p_command_pool),
            )]
        },
    )
}

pub unsafe extern "system" fn vkDestroyCommandPool(
    device: vk::Device,
    command_pool: vk::CommandPool,
    p_allocator: *const vk::AllocationCallbacks<'_>,
) {
    let ctx = context();
    let Some(table) = ctx.device_table(device) else {
        return;
    };
    ctx.intercept(
        &ep::DESTROY_COMMAND_POOL,
        || {
            vec![
                device_arg(device),
                pool_arg(command_pool),
                Arg::new("pAllocator", "const VkAllocationCallbacks*", ArgValue::pointer(p_allocator)),
            ]
        },
        || (table.fp.destroy_command_pool)(device, command_pool, p_allocator),
        |_| {
            ctx.tracker().erase_pool(device, command_pool);
            Vec::new()
        },
    )
}

pub unsafe extern "system" fn vkResetCommandPool(
    device: vk::Device,
    command_pool: vk::CommandPool,
    flags: vk::CommandPoolResetFlags,
) -> vk::Result {
    let ctx = context();
    let Some(table) = ctx.device_table(device) else {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    };
    ctx.intercept(
        &ep::RESET_COMMAND_POOL,
        || {
            vec![
                device_arg(device),
                pool_arg(command_pool),
                Arg::new(
                    "flags",
                    "VkCommandPoolResetFlags",
                    args::named(flags, flags.as_raw() as i64),
                ),
            ]
        },
        || (table.fp.reset_command_pool)(device, command_pool, flags),
        |_| Vec::new(),
    )
}

// ── Command Buffer ──────────────────────────────────────────

pub unsafe extern "system" fn vkAllocateCommandBuffers(
    device: vk::Device,
    p_allocate_info: *const vk::CommandBufferAllocateInfo<'_>,
    p_command_buffers: *mut vk::CommandBuffer,
) -> vk::Result {
    let ctx = context();
    let Some(table) = ctx.device_table(device) else {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    };
    ctx.intercept(
        &ep::ALLOCATE_COMMAND_BUFFERS,
        || {
            let allocate_info = if p_allocate_info.is_null() {
                ArgValue::Null
            } else {
                let ai = &*p_allocate_info;
                ArgValue::Struct(vec![
                    pool_arg(ai.command_pool),
                    Arg::new(
                        "level",
                        "VkCommandBufferLevel",
                        args::named(ai.level, ai.level.as_raw() as i64),
                    ),
                    Arg::new("commandBufferCount", "uint32_t", args::uint(ai.command_buffer_count)),
                ])
            };
            vec![
                device_arg(device),
                Arg::new("pAllocateInfo", "const VkCommandBufferAllocateInfo*", allocate_info),
            ]
        },
        || (table.fp.allocate_command_buffers)(device, p_allocate_info, p_command_buffers),
        |_| {
            if p_allocate_info.is_null() {
                return Vec::new();
            }
            let ai = &*p_allocate_info;
            let buffers = args::slice(p_command_buffers, ai.command_buffer_count);
            ctx.tracker()
                .add_command_buffers(device, ai.command_pool, buffers, ai.level);
            vec![Arg::new(
                "pCommandBuffers",
                "VkCommandBuffer*",
                ArgValue::handles(buffers),
            )]
        },
    )
}

pub unsafe extern "system" fn vkFreeCommandBuffers(
    device: vk::Device,
    command_pool: vk::CommandPool,
    command_buffer_count: u32,
    p_command_buffers: *const vk::CommandBuffer,
) {
    let ctx = context();
    let Some(table) = ctx.device_table(device) else {
        return;
    };
    let buffers = args::slice(p_command_buffers, command_buffer_count);
    ctx.intercept(
        &ep::FREE_COMMAND_BUFFERS,
        || {
            vec![
                device_arg(device),
                pool_arg(command_pool),
                Arg::new("commandBufferCount", "uint32_t", args::uint(command_buffer_count)),
                Arg::new("pCommandBuffers", "const VkCommandBuffer*", ArgValue::handles(buffers)),
            ]
        },
        || (table.fp.free_command_buffers)(device, command_pool, command_buffer_count, p_command_buffers),
        |_| {
            ctx.tracker().remove_command_buffers(device, command_pool, buffers);
            Vec::new()
        },
    )
}

pub unsafe extern "system" fn vkBeginCommandBuffer(
    command_buffer: vk::CommandBuffer,
    p_begin_info: *const vk::CommandBufferBeginInfo<'_>,
) -> vk::Result {
    let ctx = context();
    let Some(table) = ctx.device_table(command_buffer) else {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    };
    ctx.intercept(
        &ep::BEGIN_COMMAND_BUFFER,
        || {
            let begin_info = if p_begin_info.is_null() {
                ArgValue::Null
            } else {
                let bi = &*p_begin_info;
                ArgValue::Struct(vec![Arg::new(
                    "flags",
                    "VkCommandBufferUsageFlags",
                    args::named(bi.flags, bi.flags.as_raw() as i64),
                )])
            };
            vec![
                command_buffer_arg(command_buffer),
                Arg::new("pBeginInfo", "const VkCommandBufferBeginInfo*", begin_info),
            ]
        },
        || (table.fp.begin_command_buffer)(command_buffer, p_begin_info),
        |_| Vec::new(),
    )
}

pub unsafe extern "system" fn vkEndCommandBuffer(command_buffer: vk::CommandBuffer) -> vk::Result {
    let ctx = context();
    let Some(table) = ctx.device_table(command_buffer) else {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    };
    ctx.intercept(
        &ep::END_COMMAND_BUFFER,
        || vec![command_buffer_arg(command_buffer)],
        || (table.fp.end_command_buffer)(command_buffer),
        |_| Vec::new(),
    )
}

pub unsafe extern "system" fn vkResetCommandBuffer(
    command_buffer: vk::CommandBuffer,
    flags: vk::CommandBufferResetFlags,
) -> vk::Result {
    let ctx = context();
    let Some(table) = ctx.device_table(command_buffer) else {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    };
    ctx.intercept(
        &ep::RESET_COMMAND_BUFFER,
        || {
            vec![
                command_buffer_arg(command_buffer),
                Arg::new(
                    "flags",
                    "VkCommandBufferResetFlags",
                    args::named(flags, flags.as_raw() as i64),
                ),
            ]
        },
        || (table.fp.reset_command_buffer)(command_buffer, flags),
        |_| Vec::new(),
    )
}

// ── Recording ───────────────────────────────────────────────

pub unsafe extern "system" fn vkCmdDraw(
    command_buffer: vk::CommandBuffer,
    vertex_count: u32,
    instance_count: u32,
    first_vertex: u32,
    first_instance: u32,
) {
    let ctx = context();
    let Some(table) = ctx.device_table(command_buffer) else {
        return;
    };
    ctx.intercept(
        &ep::CMD_DRAW,
        || {
            vec![
                command_buffer_arg(command_buffer),
                Arg::new("vertexCount", "uint32_t", args::uint(vertex_count)),
                Arg::new("instanceCount", "uint32_t", args::uint(instance_count)),
                Arg::new("firstVertex", "uint32_t", args::uint(first_vertex)),
                Arg::new("firstInstance", "uint32_t", args::uint(first_instance)),
            ]
        },
        || {
            (table.fp.cmd_draw)(
                command_buffer,
                vertex_count,
                instance_count,
                first_vertex,
                first_instance,
            )
        },
        |_| Vec::new(),
    )
}

pub unsafe extern "system" fn vkCmdDispatch(
    command_buffer: vk::CommandBuffer,
    group_count_x: u32,
    group_count_y: u32,
    group_count_z: u32,
) {
    let ctx = context();
    let Some(table) = ctx.device_table(command_buffer) else {
        return;
    };
    ctx.intercept(
        &ep::CMD_DISPATCH,
        || {
            vec![
                command_buffer_arg(command_buffer),
                Arg::new("groupCountX", "uint32_t", args::uint(group_count_x)),
                Arg::new("groupCountY", "uint32_t", args::uint(group_count_y)),
                Arg::new("groupCountZ", "uint32_t", args::uint(group_count_z)),
            ]
        },
        || (table.fp.cmd_dispatch)(command_buffer, group_count_x, group_count_y, group_count_z),
        |_| Vec::new(),
    )
}

fn device_arg(device: vk::Device) -> Arg {
    Arg::new("device", "VkDevice", ArgValue::handle(device))
}

fn pool_arg(command_pool: vk::CommandPool) -> Arg {
    Arg::new("commandPool", "VkCommandPool", ArgValue::handle(command_pool))
}

fn command_buffer_arg(command_buffer: vk::CommandBuffer) -> Arg {
    Arg::new("commandBuffer", "VkCommandBuffer", ArgValue::handle(command_buffer))
}
