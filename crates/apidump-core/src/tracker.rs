//! Bookkeeping for handles that cannot find their owner on their own.
//!
//! Physical devices are traced back to the instance that enumerated them, and
//! command buffers are grouped under the pool that allocated them. Pool
//! handles are only unique within a device, so pools are keyed by both.

use std::collections::HashMap;

use ash::vk;
use dashmap::DashMap;

/// Live command buffers of one pool, tagged with their allocation level.
#[derive(Debug, Clone, Default)]
pub struct PoolMembership {
    pub buffers: HashMap<vk::CommandBuffer, vk::CommandBufferLevel>,
}

#[derive(Default)]
pub struct ResourceTracker {
    physical_devices: DashMap<vk::PhysicalDevice, vk::Instance>,
    command_pools: DashMap<(vk::Device, vk::CommandPool), PoolMembership>,
}

impl ResourceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Physical devices ────────────────────────────────────

    pub fn record_physical_devices(&self, instance: vk::Instance, devices: &[vk::PhysicalDevice]) {
        for &pd in devices {
            self.physical_devices.insert(pd, instance);
        }
    }

    pub fn resolve_owning_instance(&self, physical_device: vk::PhysicalDevice) -> Option<vk::Instance> {
        self.physical_devices.get(&physical_device).map(|v| *v)
    }

    /// Drop every physical device association that points at `instance`.
    pub fn forget_instance(&self, instance: vk::Instance) {
        self.physical_devices.retain(|_, owner| *owner != instance);
    }

    pub fn physical_device_count(&self) -> usize {
        self.physical_devices.len()
    }

    // ── Command pools ───────────────────────────────────────

    pub fn add_command_buffers(
        &self,
        device: vk::Device,
        pool: vk::CommandPool,
        buffers: &[vk::CommandBuffer],
        level: vk::CommandBufferLevel,
    ) {
        let mut membership = self.command_pools.entry((device, pool)).or_default();
        for &cb in buffers {
            membership.buffers.insert(cb, level);
        }
    }

    pub fn remove_command_buffers(
        &self,
        device: vk::Device,
        pool: vk::CommandPool,
        buffers: &[vk::CommandBuffer],
    ) {
        if let Some(mut membership) = self.command_pools.get_mut(&(device, pool)) {
            for cb in buffers {
                membership.buffers.remove(cb);
            }
        }
    }

    /// Forget a destroyed pool and every buffer it still owned.
    pub fn erase_pool(&self, device: vk::Device, pool: vk::CommandPool) {
        self.command_pools.remove(&(device, pool));
    }

    /// Forget every pool that belonged to a destroyed device.
    pub fn erase_device_pools(&self, device: vk::Device) {
        self.command_pools.retain(|(owner, _), _| *owner != device);
    }

    /// Snapshot of a pool's live buffers.
    pub fn pool_buffers(
        &self,
        device: vk::Device,
        pool: vk::CommandPool,
    ) -> Option<HashMap<vk::CommandBuffer, vk::CommandBufferLevel>> {
        self.command_pools.get(&(device, pool)).map(|m| m.buffers.clone())
    }

    pub fn pool_count(&self) -> usize {
        self.command_pools.len()
    }
}
