//! Runner control channel
//!
//! A bounded command queue built on `critical-section` and `heapless::Deque`.
//! The runner owns the [`CommandReceiver`] and drains it at the start of
//! every tick; any number of [`RunnerHandle`] clones can push commands from
//! other threads (a web handler, a motion sensor callback).

use core::cell::RefCell;
use std::sync::Arc;

use critical_section::Mutex;
use embassy_time::Instant;
use heapless::Deque;

/// Capacity of the command queue
pub const CONTROL_QUEUE_SIZE: usize = 8;

/// Commands accepted by a running animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerCommand {
    /// Start (or restart) at the given time, `None` meaning now
    Start(Option<Instant>),
    /// Stop and black out
    Stop,
    /// Toggle infinite looping
    SetLooping(bool),
}

/// Error returned when the command queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFull(pub RunnerCommand);

type Queue = Mutex<RefCell<Deque<RunnerCommand, CONTROL_QUEUE_SIZE>>>;

/// Create a connected handle/receiver pair.
pub fn channel() -> (RunnerHandle, CommandReceiver) {
    let queue: Arc<Queue> = Arc::new(Mutex::new(RefCell::new(Deque::new())));
    (
        RunnerHandle {
            queue: Arc::clone(&queue),
        },
        CommandReceiver { queue },
    )
}

/// Sending side of the control channel.
#[derive(Clone)]
pub struct RunnerHandle {
    queue: Arc<Queue>,
}

impl RunnerHandle {
    /// Push a raw command.
    pub fn send(&self, command: RunnerCommand) -> Result<(), QueueFull> {
        critical_section::with(|cs| {
            let mut queue = self.queue.borrow(cs).borrow_mut();
            queue.push_back(command).map_err(QueueFull)
        })
    }

    pub fn start(&self, at: Option<Instant>) -> Result<(), QueueFull> {
        self.send(RunnerCommand::Start(at))
    }

    pub fn stop(&self) -> Result<(), QueueFull> {
        self.send(RunnerCommand::Stop)
    }

    pub fn set_looping(&self, enabled: bool) -> Result<(), QueueFull> {
        self.send(RunnerCommand::SetLooping(enabled))
    }
}

impl core::fmt::Debug for RunnerHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RunnerHandle").finish_non_exhaustive()
    }
}

/// Receiving side of the control channel.
pub struct CommandReceiver {
    queue: Arc<Queue>,
}

impl CommandReceiver {
    /// Pop the oldest pending command, if any.
    pub fn try_receive(&self) -> Option<RunnerCommand> {
        critical_section::with(|cs| self.queue.borrow(cs).borrow_mut().pop_front())
    }

    /// Check whether commands are waiting.
    pub fn has_pending(&self) -> bool {
        critical_section::with(|cs| !self.queue.borrow(cs).borrow().is_empty())
    }
}

impl core::fmt::Debug for CommandReceiver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CommandReceiver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_arrive_in_order() {
        let (handle, receiver) = channel();
        handle.start(None).unwrap();
        handle.set_looping(true).unwrap();
        handle.stop().unwrap();

        assert!(receiver.has_pending());
        assert_eq!(receiver.try_receive(), Some(RunnerCommand::Start(None)));
        assert_eq!(receiver.try_receive(), Some(RunnerCommand::SetLooping(true)));
        assert_eq!(receiver.try_receive(), Some(RunnerCommand::Stop));
        assert_eq!(receiver.try_receive(), None);
    }

    #[test]
    fn full_queue_hands_command_back() {
        let (handle, _receiver) = channel();
        for _ in 0..CONTROL_QUEUE_SIZE {
            handle.stop().unwrap();
        }
        assert_eq!(handle.start(None), Err(QueueFull(RunnerCommand::Start(None))));
    }
}
