//! Dispatch keys for dispatchable handles.
//!
//! The Vulkan loader requires that dispatchable handles (VkInstance, VkDevice,
//! VkQueue, VkCommandBuffer, VkPhysicalDevice) have their first
//! `sizeof(void*)` bytes point to the loader's dispatch table. Every handle
//! created under one instance or device carries the same pointer, which makes
//! it a stable key for the layer's own tables.

use apidump_core::{DispatchKey, KeyExtractor};

/// Reads the loader dispatch pointer out of a dispatchable handle.
pub struct LoaderDispatchKey;

impl KeyExtractor for LoaderDispatchKey {
    fn key_of(&self, raw_handle: u64) -> DispatchKey {
        if raw_handle == 0 {
            return DispatchKey(0);
        }
        // SAFETY: only called with dispatchable handles the loader handed to
        // the application, whose first word is the loader dispatch pointer.
        let loader_data = unsafe { *(raw_handle as usize as *const usize) };
        DispatchKey(loader_data)
    }
}
