//! Sample-Accurate Automation
//!
//! Host parameter events that must land on a specific frame travel through
//! a wait-free SPSC ring buffer (rtrb). The control side pushes
//! [`AutomationEvent`]s; the kernel drains them during `render` and applies
//! each one at its frame offset.
//!
//! Offsets are relative to the start of the next rendered block. At the start
//! of every block the receiver moves everything queued into a schedule keyed
//! by absolute frame, so an event beyond the end of that block lands in a
//! later block at the same absolute position no matter how many others are
//! waiting with it.

use std::collections::VecDeque;

use rtrb::{Consumer, Producer, RingBuffer};

use crate::error::{KernelError, KernelResult};
use crate::params::ParamId;

/// One parameter change at a frame position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutomationEvent {
    /// Frames from the start of the next rendered block
    pub frame_offset: u32,
    pub param: ParamId,
    pub value: f32,
}

impl AutomationEvent {
    pub fn new(frame_offset: u32, param: ParamId, value: f32) -> Self {
        Self {
            frame_offset,
            param,
            value,
        }
    }
}

/// An event pinned to an absolute frame of the receiver's timeline
#[derive(Debug, Clone, Copy)]
struct Scheduled {
    at: u64,
    event: AutomationEvent,
}

/// Create a connected sender/receiver pair holding up to `capacity` events
pub fn queue(capacity: usize) -> (AutomationSender, AutomationReceiver) {
    let capacity = capacity.max(1);
    let (producer, consumer) = RingBuffer::new(capacity);
    (
        AutomationSender { producer },
        AutomationReceiver {
            consumer,
            scheduled: VecDeque::with_capacity(capacity),
            limit: capacity,
            block_start: 0,
        },
    )
}

/// Control-thread half of the automation queue
pub struct AutomationSender {
    producer: Producer<AutomationEvent>,
}

impl AutomationSender {
    /// Queue an event without blocking
    ///
    /// Events must be sent in non-decreasing frame order.
    pub fn send(&mut self, event: AutomationEvent) -> KernelResult<()> {
        self.producer
            .push(event)
            .map_err(|_| KernelError::QueueFull)
    }

    /// Free slots left in the queue
    pub fn available(&self) -> usize {
        self.producer.slots()
    }

    /// Whether the kernel side has been dropped
    pub fn is_abandoned(&self) -> bool {
        self.producer.is_abandoned()
    }
}

/// Audio-thread half of the automation queue
pub struct AutomationReceiver {
    consumer: Consumer<AutomationEvent>,
    /// Sorted by `at`, at most `limit` long
    scheduled: VecDeque<Scheduled>,
    limit: usize,
    /// Absolute frame of the current block's first frame
    block_start: u64,
}

impl AutomationReceiver {
    /// Move queued events onto the schedule, relative to this block
    ///
    /// Events that do not fit stay queued until earlier ones have fired.
    ///
    /// # Real-time Safety
    /// Wait-free, no allocations.
    pub fn begin_block(&mut self) {
        while self.scheduled.len() < self.limit {
            let Ok(event) = self.consumer.pop() else {
                break;
            };
            let at = self.block_start + u64::from(event.frame_offset);
            // Stable: equal frames keep their send order
            let index = self.scheduled.partition_point(|s| s.at <= at);
            self.scheduled.insert(index, Scheduled { at, event });
        }
    }

    /// Next event due at or before `frame` within the current block
    ///
    /// # Real-time Safety
    /// Wait-free, no allocations.
    #[inline]
    pub fn next_due(&mut self, frame: usize) -> Option<AutomationEvent> {
        let now = self.block_start + frame as u64;
        match self.scheduled.front() {
            Some(next) if next.at <= now => self.scheduled.pop_front().map(|s| s.event),
            _ => None,
        }
    }

    /// Advance the timeline past a finished block of `frames`
    #[inline]
    pub fn end_block(&mut self, frames: usize) {
        self.block_start += frames as u64;
    }

    /// Events waiting on the schedule (not counting the ring)
    pub fn pending(&self) -> usize {
        self.scheduled.len()
    }

    /// Drop everything scheduled or still queued
    pub fn clear(&mut self) {
        self.scheduled.clear();
        while self.consumer.pop().is_ok() {}
    }
}
