//! VK_KHR_swapchain image acquisition and presentation.
//!
//! `vkQueuePresentKHR` ends the current frame.

use ash::vk;

use apidump_core::entry_point as ep;
use apidump_core::{Arg, ArgValue};

use crate::args;
use crate::context;
use crate::sync::queue_arg;

pub unsafe extern "system" fn vkAcquireNextImageKHR(
    device: vk::Device,
    swapchain: vk::SwapchainKHR,
    timeout: u64,
    semaphore: vk::Semaphore,
    fence: vk::Fence,
    p_image_index: *mut u32,
) -> vk::Result {
    let ctx = context();
    let Some(table) = ctx.device_table(device) else {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    };
    ctx.intercept(
        &ep::ACQUIRE_NEXT_IMAGE_KHR,
        || {
            vec![
                Arg::new("device", "VkDevice", ArgValue::handle(device)),
                Arg::new("swapchain", "VkSwapchainKHR", ArgValue::handle(swapchain)),
                Arg::new("timeout", "uint64_t", args::uint(timeout)),
                Arg::new("semaphore", "VkSemaphore", ArgValue::handle(semaphore)),
                Arg::new("fence", "VkFence", ArgValue::handle(fence)),
            ]
        },
        || {
            (table.swapchain.acquire_next_image_khr)(
                device,
                swapchain,
                timeout,
                semaphore,
                fence,
                p_image_index,
            )
        },
        |_| vec![Arg::new("pImageIndex", "uint32_t*", args::count(p_image_index))],
    )
}

pub unsafe extern "system" fn vkQueuePresentKHR(
    queue: vk::Queue,
    p_present_info: *const vk::PresentInfoKHR<'_>,
) -> vk::Result {
    let ctx = context();
    let Some(table) = ctx.device_table(queue) else {
        return vk::Result::ERROR_INITIALIZATION_FAILED;
    };
    ctx.intercept(
        &ep::QUEUE_PRESENT_KHR,
        || {
            let present_info = if p_present_info.is_null() {
                ArgValue::Null
            } else {
                let pi = &*p_present_info;
                ArgValue::Struct(vec![
                    Arg::new(
                        "pWaitSemaphores",
                        "const VkSemaphore*",
                        ArgValue::handles(args::slice(pi.p_wait_semaphores, pi.wait_semaphore_count)),
                    ),
                    Arg::new(
                        "pSwapchains",
                        "const VkSwapchainKHR*",
                        ArgValue::handles(args::slice(pi.p_swapchains, pi.swapchain_count)),
                    ),
                    Arg::new(
                        "pImageIndices",
                        "const uint32_t*",
                        ArgValue::List(
                            args::slice(pi.p_image_indices, pi.swapchain_count)
                                .iter()
                                .map(|i| args::uint(*i))
                                .collect(),
                        ),
                    ),
                ])
            };
            vec![
                queue_arg(queue),
                Arg::new("pPresentInfo", "const VkPresentInfoKHR*", present_info),
            ]
        },
        || (table.swapchain.queue_present_khr)(queue, p_present_info),
        |_| Vec::new(),
    )
}
