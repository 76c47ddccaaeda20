//! Display-refresh frame scheduling.

/// Opaque identifier of one requested frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

/// Host side of "run this callback on the next display refresh".
pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameHandle;
    fn cancel_frame(&mut self, handle: FrameHandle);
    /// Remove and return every callback due at this refresh, in request order.
    fn take_due(&mut self) -> Vec<FrameHandle>;
    fn pending_count(&self) -> usize;
}

/// Animation-frame style request list, drained once per vsync.
///
/// Requests are not de-duplicated: two requests before a refresh fire twice.
#[derive(Debug, Default)]
pub struct VsyncScheduler {
    next_id: u64,
    queued: Vec<FrameHandle>,
}

impl VsyncScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameScheduler for VsyncScheduler {
    fn request_frame(&mut self) -> FrameHandle {
        self.next_id += 1;
        let handle = FrameHandle(self.next_id);
        self.queued.push(handle);
        tracing::trace!("requested frame {:?}", handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        self.queued.retain(|&h| h != handle);
    }

    fn take_due(&mut self) -> Vec<FrameHandle> {
        std::mem::take(&mut self.queued)
    }

    fn pending_count(&self) -> usize {
        self.queued.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{FrameScheduler, VsyncScheduler};

    #[test]
    fn handles_are_unique() {
        let mut scheduler = VsyncScheduler::new();
        let a = scheduler.request_frame();
        let b = scheduler.request_frame();
        assert_ne!(a, b);
        assert_eq!(scheduler.pending_count(), 2);
    }

    #[test]
    fn cancelled_frames_never_fire() {
        let mut scheduler = VsyncScheduler::new();
        let a = scheduler.request_frame();
        let b = scheduler.request_frame();
        scheduler.cancel_frame(a);
        assert_eq!(scheduler.take_due(), vec![b]);
    }

    #[test]
    fn take_due_drains_the_queue() {
        let mut scheduler = VsyncScheduler::new();
        scheduler.request_frame();
        assert_eq!(scheduler.take_due().len(), 1);
        assert_eq!(scheduler.pending_count(), 0);
        assert!(scheduler.take_due().is_empty());
    }

    #[test]
    fn cancelling_unknown_handle_is_harmless() {
        let mut scheduler = VsyncScheduler::new();
        let a = scheduler.request_frame();
        scheduler.take_due();
        scheduler.cancel_frame(a);
        assert_eq!(scheduler.pending_count(), 0);
    }
}
