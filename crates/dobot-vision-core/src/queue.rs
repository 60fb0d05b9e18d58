//! Blocking arm control on top of a command queue.
//!
//! The arm firmware executes commands from an internal queue and exposes the
//! index of the last executed command. [`QueuedArm`] enqueues one command,
//! then polls that index until the command has run, turning the queue into
//! the synchronous [`ArmController`] contract.

use std::thread;
use std::time::{Duration, Instant};

use crate::{ArmController, ArmError, GripperCommand, MotionMode, Pose};

/// Low-level queued command interface, one implementation per SDK binding.
pub trait CommandQueue {
    /// Query the current pose (immediate, not queued).
    fn current_pose(&mut self) -> Result<Pose, ArmError>;

    /// Enqueue a point-to-point move; returns the command's queue index.
    fn enqueue_move(&mut self, pose: &Pose, mode: MotionMode) -> Result<u64, ArmError>;

    /// Enqueue a gripper command; returns the command's queue index.
    fn enqueue_gripper(&mut self, command: GripperCommand) -> Result<u64, ArmError>;

    /// Index of the last command the arm finished executing.
    fn executed_index(&mut self) -> Result<u64, ArmError>;

    fn clear_alarms(&mut self) -> Result<(), ArmError>;
}

/// Bounded poll loop over [`CommandQueue::executed_index`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueWaiter {
    /// Sleep between polls. Zero yields the thread instead.
    pub poll_interval: Duration,
    /// Give up after this long. `None` waits forever.
    pub timeout: Option<Duration>,
}

impl Default for QueueWaiter {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(5),
            timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl QueueWaiter {
    /// Spin with `yield_now` and no timeout; for simulated queues.
    pub fn immediate() -> Self {
        Self {
            poll_interval: Duration::ZERO,
            timeout: None,
        }
    }

    /// Block until the command at `index` has been executed.
    pub fn wait<Q: CommandQueue + ?Sized>(
        &self,
        queue: &mut Q,
        index: u64,
    ) -> Result<(), ArmError> {
        let started = Instant::now();
        loop {
            let executed = queue.executed_index()?;
            if executed >= index {
                return Ok(());
            }
            if let Some(timeout) = self.timeout {
                if started.elapsed() >= timeout {
                    return Err(ArmError::MotionTimeout { index, executed });
                }
            }
            if self.poll_interval.is_zero() {
                thread::yield_now();
            } else {
                thread::sleep(self.poll_interval);
            }
        }
    }
}

/// [`ArmController`] that waits for each queued command to finish.
pub struct QueuedArm<Q> {
    queue: Q,
    waiter: QueueWaiter,
}

impl<Q: CommandQueue> QueuedArm<Q> {
    pub fn new(queue: Q) -> Self {
        Self::with_waiter(queue, QueueWaiter::default())
    }

    pub fn with_waiter(queue: Q, waiter: QueueWaiter) -> Self {
        Self { queue, waiter }
    }

    #[inline]
    pub fn queue(&self) -> &Q {
        &self.queue
    }

    #[inline]
    pub fn queue_mut(&mut self) -> &mut Q {
        &mut self.queue
    }

    pub fn into_inner(self) -> Q {
        self.queue
    }
}

impl<Q: CommandQueue> ArmController for QueuedArm<Q> {
    fn get_pose(&mut self) -> Result<Pose, ArmError> {
        self.queue.current_pose()
    }

    fn move_to(&mut self, pose: &Pose, mode: MotionMode) -> Result<(), ArmError> {
        if !pose.is_finite() {
            return Err(ArmError::InvalidPose(*pose));
        }
        let index = self.queue.enqueue_move(pose, mode)?;
        log::trace!(
            "{mode:?} to ({:.2}, {:.2}, {:.2}, {:.2}) queued as #{index}",
            pose.x,
            pose.y,
            pose.z,
            pose.r
        );
        self.waiter.wait(&mut self.queue, index)
    }

    fn set_gripper(&mut self, command: GripperCommand) -> Result<(), ArmError> {
        let index = self.queue.enqueue_gripper(command)?;
        self.waiter.wait(&mut self.queue, index)
    }

    fn clear_alarms(&mut self) -> Result<(), ArmError> {
        self.queue.clear_alarms()
    }
}
