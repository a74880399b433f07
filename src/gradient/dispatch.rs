// gradient/dispatch.rs - Shared dispatch region and cycle detection
//
// Gradient evaluation can call into the surface subsystem and the surface
// subsystem can call back into gradients. If each side took only its own
// lock, a Gradient->Surface chain on one thread and a Surface->Gradient chain
// on another would deadlock. Both sides therefore enter one re-entrant
// region before doing anything else. Every thread evaluating gradients or
// surfaces through the same coordinator is serialized here; that is the
// price of never inverting lock order.
//
// Each thread also keeps a stack of the gradients it is currently
// dispatching to. Entering a gradient that is already on this thread's
// stack means the reference chain loops back on itself. Every frame from the
// repeated gradient up to the top of the stack is then part of the loop and
// gets marked, so the callers that own those frames discard their results.

use crate::gradient::source::EntityId;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use smallvec::SmallVec;
use std::cell::RefCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

static NEXT_COORDINATOR_ID: AtomicUsize = AtomicUsize::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Gradient(EntityId),
    Surface,
}

#[derive(Debug, Clone, Copy)]
struct DispatchFrame {
    coordinator: usize,
    kind: FrameKind,
    cycle_hit: bool,
}

thread_local! {
    static DISPATCH_STACK: RefCell<SmallVec<[DispatchFrame; 8]>> = RefCell::new(SmallVec::new());
}

/// Returned when a gradient is entered while already being dispatched to on
/// the current thread.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cyclic dispatch into gradient {0}")]
pub struct CyclicDispatch(pub EntityId);

/// The single synchronization point shared by the gradient and surface
/// subsystems.
pub struct DispatchCoordinator {
    id: usize,
    lock: ReentrantMutex<()>,
}

impl DispatchCoordinator {
    pub fn new() -> Self {
        DispatchCoordinator {
            id: NEXT_COORDINATOR_ID.fetch_add(1, Ordering::Relaxed),
            lock: ReentrantMutex::new(()),
        }
    }

    /// Enter the region to dispatch to `gradient`.
    ///
    /// Blocks until no other thread is inside the region. Re-entry from the
    /// same thread succeeds unless `gradient` is already being dispatched
    /// to further up this thread's stack, in which case the region is
    /// released again and `CyclicDispatch` is returned.
    pub fn enter_gradient(&self, gradient: EntityId) -> Result<DispatchGuard<'_>, CyclicDispatch> {
        let lock = self.lock.lock();
        if self.is_dispatching(gradient) {
            drop(lock);
            return Err(CyclicDispatch(gradient));
        }
        Ok(self.push(lock, FrameKind::Gradient(gradient)))
    }

    /// Enter the region on behalf of the surface subsystem.
    pub fn enter_surface(&self) -> DispatchGuard<'_> {
        let lock = self.lock.lock();
        self.push(lock, FrameKind::Surface)
    }

    /// Mark every frame of this thread's stack that belongs to the loop
    /// closing on `gradient`: its own frame and everything entered after it.
    pub fn mark_cycle(&self, gradient: EntityId) {
        let wanted = FrameKind::Gradient(gradient);
        DISPATCH_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            let start = match stack
                .iter()
                .rposition(|f| f.coordinator == self.id && f.kind == wanted)
            {
                Some(start) => start,
                None => return,
            };
            for frame in stack[start..].iter_mut() {
                if frame.coordinator == self.id {
                    frame.cycle_hit = true;
                }
            }
        });
    }

    /// Whether the current thread is inside a dispatch to `gradient`.
    pub fn is_dispatching(&self, gradient: EntityId) -> bool {
        let wanted = FrameKind::Gradient(gradient);
        DISPATCH_STACK.with(|stack| {
            stack
                .borrow()
                .iter()
                .any(|f| f.coordinator == self.id && f.kind == wanted)
        })
    }

    /// Number of frames the current thread holds in this coordinator.
    pub fn depth(&self) -> usize {
        DISPATCH_STACK.with(|stack| {
            stack
                .borrow()
                .iter()
                .filter(|f| f.coordinator == self.id)
                .count()
        })
    }

    fn push<'a>(&'a self, lock: ReentrantMutexGuard<'a, ()>, kind: FrameKind) -> DispatchGuard<'a> {
        DISPATCH_STACK.with(|stack| {
            stack.borrow_mut().push(DispatchFrame {
                coordinator: self.id,
                kind,
                cycle_hit: false,
            })
        });
        DispatchGuard {
            _lock: lock,
            coordinator: self.id,
            kind,
        }
    }
}

impl Default for DispatchCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds the dispatch region. Dropping it pops this thread's frame and then
/// releases the region, on every exit path including unwinding.
#[derive(Debug)]
pub struct DispatchGuard<'a> {
    // Dropped after `Drop::drop` has popped the frame.
    _lock: ReentrantMutexGuard<'a, ()>,
    coordinator: usize,
    kind: FrameKind,
}

impl DispatchGuard<'_> {
    /// Whether a cycle closing through this frame was detected while it was
    /// held.
    pub fn cycle_detected(&self) -> bool {
        DISPATCH_STACK.with(|stack| {
            stack
                .borrow()
                .iter()
                .rev()
                .find(|f| f.coordinator == self.coordinator && f.kind == self.kind)
                .is_some_and(|f| f.cycle_hit)
        })
    }
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        let _ = DISPATCH_STACK.try_with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack
                .iter()
                .rposition(|f| f.coordinator == self.coordinator && f.kind == self.kind)
            {
                stack.remove(pos);
            }
        });
    }
}
