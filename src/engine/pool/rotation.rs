//! ### English
//! Render-thread owner of the three surface units.
//!
//! ### 中文
//! 渲染线程上持有三个 surface unit 的所有者。

use std::rc::Rc;
use std::sync::Arc;

use dpi::PhysicalSize;

use super::shared_state::SlotInfo;
use super::{
    DisplaySurface, POOL_CAPACITY, ReinitOutcome, RoleCounts, SharedPoolState, SlotRole,
    WriteLease,
};
use crate::engine::device::GpuDevice;
use crate::engine::error::BridgeResult;
use crate::engine::surface::{SurfaceUnit, UnitId};

/// ### English
/// Triple-buffered pool of surface units.
///
/// Owned by the render thread. Consumers only see the `SharedPoolState` it publishes into.
///
/// ### 中文
/// 三缓冲的 surface unit 池。
///
/// 由渲染线程持有。消费者只能看到它写入的 `SharedPoolState`。
pub struct RotationPool<D: GpuDevice> {
    context: Rc<D>,
    units: [Option<SurfaceUnit<D>>; POOL_CAPACITY],
    shared: Arc<SharedPoolState>,
    /// ### English
    /// Size of the live units; `None` while the pool is empty.
    ///
    /// ### 中文
    /// 当前 unit 的尺寸；pool 为空时为 `None`。
    size: Option<PhysicalSize<u32>>,
    /// ### English
    /// Bumped on every rebuild/clear; leases from older generations are stale.
    ///
    /// ### 中文
    /// 每次重建/清空时递增；旧代次的租约即为过期租约。
    generation: u64,
    next_unit_id: u64,
    next_frame_seq: u64,
    retry_unit_creation: bool,
}

impl<D: GpuDevice> RotationPool<D> {
    /// ### English
    /// Creates an empty pool; call `reinit` to build units.
    ///
    /// #### Parameters
    /// - `context`: Render context used to create units.
    /// - `shared`: Lock-free state the consumer reads.
    /// - `retry_unit_creation`: Retry a failed unit creation once before failing the rebuild.
    ///
    /// ### 中文
    /// 创建一个空 pool；调用 `reinit` 构建 unit。
    ///
    /// #### 参数
    /// - `context`：用于创建 unit 的渲染上下文。
    /// - `shared`：消费者读取的无锁状态。
    /// - `retry_unit_creation`：unit 创建失败时先重试一次，再让重建失败。
    pub fn new(context: Rc<D>, shared: Arc<SharedPoolState>, retry_unit_creation: bool) -> Self {
        Self {
            context,
            units: std::array::from_fn(|_| None),
            shared,
            size: None,
            generation: 0,
            next_unit_id: 1,
            next_frame_seq: 1,
            retry_unit_creation,
        }
    }

    pub fn shared(&self) -> &Arc<SharedPoolState> {
        &self.shared
    }

    pub fn size(&self) -> Option<PhysicalSize<u32>> {
        self.size
    }

    pub fn role_counts(&self) -> RoleCounts {
        self.shared.role_counts()
    }

    pub fn unit_ids(&self) -> [Option<UnitId>; POOL_CAPACITY] {
        std::array::from_fn(|slot| self.units[slot].as_ref().map(SurfaceUnit::id))
    }

    /// ### English
    /// Destroys every unit and builds `POOL_CAPACITY` new units of `size`.
    ///
    /// A zero dimension is rejected and leaves the pool untouched. If any unit fails to build, the
    /// units built so far are released and the pool is left empty.
    ///
    /// ### 中文
    /// 销毁所有 unit，并构建 `POOL_CAPACITY` 个尺寸为 `size` 的新 unit。
    ///
    /// 零维度会被拒绝，pool 保持不变。若任一 unit 构建失败，已构建的 unit 会被释放，pool 保持为空。
    pub fn reinit(&mut self, size: PhysicalSize<u32>) -> BridgeResult<ReinitOutcome> {
        if size.width == 0 || size.height == 0 {
            tracing::debug!(
                width = size.width,
                height = size.height,
                "ignoring pool rebuild with zero dimension"
            );
            return Ok(ReinitOutcome::Rejected);
        }

        self.clear();

        let mut built: [Option<SurfaceUnit<D>>; POOL_CAPACITY] = std::array::from_fn(|_| None);
        for unit in built.iter_mut() {
            match self.create_unit(size) {
                Ok(created) => *unit = Some(created),
                Err(err) => {
                    tracing::error!(
                        %err,
                        width = size.width,
                        height = size.height,
                        "surface pool rebuild failed; pool left empty"
                    );
                    drop(built);
                    return Err(err);
                }
            }
        }

        for (slot, unit) in built.into_iter().enumerate() {
            if let Some(unit) = &unit {
                self.shared.install(
                    slot,
                    self.generation,
                    SlotInfo {
                        unit_id: unit.id(),
                        image: unit.image_info(),
                        width: size.width,
                        height: size.height,
                    },
                );
            }
            self.units[slot] = unit;
        }
        self.size = Some(size);

        tracing::info!(
            width = size.width,
            height = size.height,
            generation = self.generation,
            "surface pool rebuilt"
        );
        Ok(ReinitOutcome::Rebuilt)
    }

    fn create_unit(&mut self, size: PhysicalSize<u32>) -> BridgeResult<SurfaceUnit<D>> {
        let id = UnitId(self.next_unit_id);
        self.next_unit_id += 1;

        match SurfaceUnit::create(&self.context, id, size) {
            Err(err) if self.retry_unit_creation && err.is_resource() => {
                tracing::warn!(unit = %id, %err, "surface unit creation failed; retrying once");
                SurfaceUnit::create(&self.context, id, size)
            }
            result => result,
        }
    }

    /// ### English
    /// Leases the least-recently-published Idle unit for drawing.
    ///
    /// Returns `None` if the pool is empty, a unit is already InFlight, or no unit is Idle.
    ///
    /// ### 中文
    /// 租出最久未发布的 Idle unit 用于绘制。
    ///
    /// 若 pool 为空、已有 unit 处于 InFlight 或没有 Idle unit，则返回 `None`。
    pub fn acquire_for_write(&mut self) -> Option<WriteLease> {
        let size = self.size?;

        let mut candidate: Option<(usize, u64)> = None;
        for slot in 0..POOL_CAPACITY {
            match self.shared.role(slot) {
                SlotRole::InFlight => return None,
                SlotRole::Idle => {
                    let seq = self.shared.slot_seq_relaxed(slot);
                    if candidate.is_none_or(|(_, best)| seq < best) {
                        candidate = Some((slot, seq));
                    }
                }
                SlotRole::Empty | SlotRole::Current => {}
            }
        }

        let (slot, _) = candidate?;
        let unit = self.units[slot].as_ref()?;
        if !self.shared.begin_write(slot) {
            return None;
        }

        Some(WriteLease {
            slot,
            generation: self.generation,
            unit_id: unit.id(),
            framebuffer: unit.framebuffer(),
            size,
        })
    }

    /// ### English
    /// Marks the leased unit Current and demotes the previous current unit to Idle.
    ///
    /// Returns the new frame sequence. Fails with `StaleUnit` if the pool was rebuilt or cleared
    /// after the lease was issued.
    ///
    /// ### 中文
    /// 将租出的 unit 标记为 Current，并将之前的 current unit 降为 Idle。
    ///
    /// 返回新的帧序号。若租约发出后 pool 被重建或清空，返回 `StaleUnit`。
    pub fn publish(&mut self, lease: WriteLease) -> BridgeResult<u64> {
        let frame_seq = self.next_frame_seq;
        self.shared
            .publish(lease.slot, lease.generation, frame_seq)?;
        self.next_frame_seq += 1;
        Ok(frame_seq)
    }

    /// ### English
    /// Returns a leased unit to Idle without publishing it. Stale leases are ignored.
    ///
    /// ### 中文
    /// 不发布，直接将租出的 unit 归还为 Idle。过期租约会被忽略。
    pub fn abandon(&mut self, lease: WriteLease) {
        if !self.shared.abandon(lease.slot, lease.generation) {
            tracing::debug!(
                slot = lease.slot,
                generation = lease.generation,
                "abandoned a stale lease"
            );
        }
    }

    pub fn peek_current(&self) -> Option<DisplaySurface> {
        self.shared.peek_current()
    }

    /// ### English
    /// Reads back the pixels of the current unit (render thread only).
    ///
    /// ### 中文
    /// 读回当前 unit 的像素（仅限渲染线程）。
    pub fn read_current_pixels(&self) -> Option<Vec<u8>> {
        let current = self.shared.peek_current()?;
        self.units
            .iter()
            .flatten()
            .find(|unit| unit.id() == current.unit_id)
            .map(SurfaceUnit::read_pixels)
    }

    /// ### English
    /// Destroys every unit; the pool becomes empty and all outstanding leases become stale.
    ///
    /// ### 中文
    /// 销毁所有 unit；pool 变为空，所有未归还的租约都将过期。
    pub fn clear(&mut self) {
        self.shared.evict_all();
        self.generation += 1;
        for unit in self.units.iter_mut() {
            drop(unit.take());
        }
        self.size = None;
    }
}

impl<D: GpuDevice> Drop for RotationPool<D> {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::device::software::SoftwareDevice;
    use crate::engine::error::{BridgeError, ResourceError};

    fn pool_with(device: &Rc<SoftwareDevice>, retry: bool) -> RotationPool<SoftwareDevice> {
        RotationPool::new(device.clone(), Arc::new(SharedPoolState::new()), retry)
    }

    fn built_pool(device: &Rc<SoftwareDevice>) -> RotationPool<SoftwareDevice> {
        let mut pool = pool_with(device, false);
        assert_eq!(
            pool.reinit(PhysicalSize::new(32, 18)).unwrap(),
            ReinitOutcome::Rebuilt
        );
        pool
    }

    fn draw(pool: &mut RotationPool<SoftwareDevice>) -> UnitId {
        let lease = pool.acquire_for_write().expect("idle unit");
        let unit = lease.unit_id();
        pool.publish(lease).unwrap();
        unit
    }

    #[test]
    fn fresh_pool_is_empty() {
        let device = Rc::new(SoftwareDevice::new());
        let mut pool = pool_with(&device, false);

        assert_eq!(pool.size(), None);
        assert_eq!(pool.role_counts().empty, POOL_CAPACITY);
        assert!(pool.acquire_for_write().is_none());
        assert!(pool.peek_current().is_none());
    }

    #[test]
    fn reinit_builds_three_idle_units() {
        let device = Rc::new(SoftwareDevice::new());
        let pool = built_pool(&device);

        assert_eq!(pool.size(), Some(PhysicalSize::new(32, 18)));
        assert_eq!(pool.role_counts().idle, 3);
        assert!(pool.unit_ids().iter().all(Option::is_some));
        assert!(pool.peek_current().is_none());
        assert_eq!(device.live_framebuffers(), 3);
    }

    #[test]
    fn steady_state_rotates_through_all_units() {
        let device = Rc::new(SoftwareDevice::new());
        let mut pool = built_pool(&device);

        let drawn: Vec<UnitId> = (0..6).map(|_| draw(&mut pool)).collect();
        assert_eq!(&drawn[..3], &drawn[3..]);
        assert_ne!(drawn[0], drawn[1]);
        assert_ne!(drawn[1], drawn[2]);

        let current = pool.peek_current().unwrap();
        assert_eq!(current.unit_id, drawn[5]);
        assert_eq!(current.frame_seq, 6);

        let counts = pool.role_counts();
        assert_eq!(counts.current, 1);
        assert_eq!(counts.idle, 2);
        assert_eq!(counts.total(), POOL_CAPACITY);
    }

    #[test]
    fn acquire_never_hands_out_the_current_unit() {
        let device = Rc::new(SoftwareDevice::new());
        let mut pool = built_pool(&device);

        for _ in 0..10 {
            let current = pool.peek_current().map(|surface| surface.unit_id);
            let lease = pool.acquire_for_write().unwrap();
            assert_ne!(Some(lease.unit_id()), current);
            pool.publish(lease).unwrap();
        }
    }

    #[test]
    fn only_one_lease_at_a_time() {
        let device = Rc::new(SoftwareDevice::new());
        let mut pool = built_pool(&device);

        let lease = pool.acquire_for_write().unwrap();
        assert!(pool.acquire_for_write().is_none());
        assert_eq!(pool.role_counts().in_flight, 1);

        pool.abandon(lease);
        assert_eq!(pool.role_counts().idle, 3);
        assert!(pool.acquire_for_write().is_some());
    }

    #[test]
    fn abandon_keeps_previous_current() {
        let device = Rc::new(SoftwareDevice::new());
        let mut pool = built_pool(&device);
        let first = draw(&mut pool);

        let lease = pool.acquire_for_write().unwrap();
        pool.abandon(lease);

        let current = pool.peek_current().unwrap();
        assert_eq!(current.unit_id, first);
        assert_eq!(current.frame_seq, 1);
    }

    #[test]
    fn publish_after_rebuild_is_stale() {
        let device = Rc::new(SoftwareDevice::new());
        let mut pool = built_pool(&device);

        let lease = pool.acquire_for_write().unwrap();
        pool.reinit(PhysicalSize::new(64, 36)).unwrap();

        let err = pool.publish(lease).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::Resource(ResourceError::StaleUnit { .. })
        ));
        assert!(pool.peek_current().is_none());
        assert_eq!(pool.role_counts().idle, 3);
    }

    #[test]
    fn zero_size_reinit_is_a_no_op() {
        let device = Rc::new(SoftwareDevice::new());
        let mut pool = built_pool(&device);
        draw(&mut pool);
        let ids = pool.unit_ids();
        let current = pool.peek_current();

        assert_eq!(
            pool.reinit(PhysicalSize::new(0, 100)).unwrap(),
            ReinitOutcome::Rejected
        );
        assert_eq!(
            pool.reinit(PhysicalSize::new(100, 0)).unwrap(),
            ReinitOutcome::Rejected
        );

        assert_eq!(pool.unit_ids(), ids);
        assert_eq!(pool.peek_current(), current);
        assert_eq!(pool.size(), Some(PhysicalSize::new(32, 18)));
    }

    #[test]
    fn reinit_replaces_every_unit() {
        let device = Rc::new(SoftwareDevice::new());
        let mut pool = built_pool(&device);
        let before = pool.unit_ids();

        pool.reinit(PhysicalSize::new(640, 360)).unwrap();
        let after = pool.unit_ids();

        for id in after.iter().flatten() {
            assert!(!before.contains(&Some(*id)));
        }
        assert_eq!(device.live_framebuffers(), 3);
        assert_eq!(pool.size(), Some(PhysicalSize::new(640, 360)));

        let surface = {
            draw(&mut pool);
            pool.peek_current().unwrap()
        };
        assert_eq!((surface.width, surface.height), (640, 360));
    }

    #[test]
    fn creation_failure_leaves_pool_empty() {
        let device = Rc::new(SoftwareDevice::new());
        let mut pool = built_pool(&device);
        draw(&mut pool);

        device.fail_next_framebuffers(1);
        let err = pool.reinit(PhysicalSize::new(8, 8)).unwrap_err();

        assert!(err.is_resource());
        assert_eq!(pool.size(), None);
        assert_eq!(pool.role_counts().empty, 3);
        assert!(pool.peek_current().is_none());
        assert!(pool.acquire_for_write().is_none());
        assert_eq!(device.live_resources(), 0);
    }

    #[test]
    fn creation_failure_is_retried_once_when_enabled() {
        let device = Rc::new(SoftwareDevice::new());
        let mut pool = pool_with(&device, true);

        device.fail_next_framebuffers(1);
        assert_eq!(
            pool.reinit(PhysicalSize::new(8, 8)).unwrap(),
            ReinitOutcome::Rebuilt
        );
        assert_eq!(pool.role_counts().idle, 3);

        device.fail_next_framebuffers(2);
        assert!(pool.reinit(PhysicalSize::new(8, 8)).is_err());
        assert_eq!(device.live_resources(), 0);
    }

    #[test]
    fn clear_releases_everything() {
        let device = Rc::new(SoftwareDevice::new());
        let mut pool = built_pool(&device);
        let lease = pool.acquire_for_write().unwrap();

        pool.clear();

        assert_eq!(device.live_resources(), 0);
        assert!(pool.publish(lease).is_err());
        assert_eq!(Rc::strong_count(&device), 2);
        drop(pool);
        assert_eq!(Rc::strong_count(&device), 1);
    }

    #[test]
    fn current_pixels_follow_the_last_publish() {
        let device = Rc::new(SoftwareDevice::new());
        let mut pool = built_pool(&device);

        let lease = pool.acquire_for_write().unwrap();
        device.begin_draw(lease.framebuffer(), lease.size());
        assert!(device.fill_bound([255, 0, 0, 255]));
        device.end_draw();
        pool.publish(lease).unwrap();

        let pixels = pool.read_current_pixels().unwrap();
        assert_eq!(pixels.len(), 32 * 18 * 4);
        assert!(pixels.chunks_exact(4).all(|px| px == [255, 0, 0, 255]));
    }

    #[test]
    fn concurrent_reader_sees_monotonic_published_frames() {
        use std::sync::atomic::{AtomicU64, Ordering};
        use std::thread;

        const FRAMES: u64 = 20_000;

        let shared = Arc::new(SharedPoolState::new());
        let attempted = Arc::new(AtomicU64::new(0));

        let producer = {
            let shared = shared.clone();
            let attempted = attempted.clone();
            thread::spawn(move || {
                let device = Rc::new(SoftwareDevice::new());
                let mut pool = RotationPool::new(device, shared, false);
                pool.reinit(PhysicalSize::new(32, 18)).unwrap();
                for seq in 1..=FRAMES {
                    let lease = pool.acquire_for_write().expect("idle unit");
                    attempted.store(seq, Ordering::Release);
                    assert_eq!(pool.publish(lease).unwrap(), seq);
                }
                let latest = pool.peek_current();
                let counts = pool.role_counts();
                (latest, counts)
            })
        };

        let mut last = 0;
        while !producer.is_finished() {
            let Some(surface) = shared.peek_current() else {
                continue;
            };
            assert!(
                surface.frame_seq >= last,
                "frame_seq went backwards: {} after {last}",
                surface.frame_seq
            );
            assert!(surface.frame_seq <= attempted.load(Ordering::Acquire));
            assert_eq!((surface.width, surface.height), (32, 18));
            last = surface.frame_seq;
        }

        let (latest, counts) = producer.join().unwrap();
        assert_eq!(latest.map(|surface| surface.frame_seq), Some(FRAMES));
        assert_eq!(counts.current, 1);
        assert_eq!(shared.peek_current(), None);
    }
}
