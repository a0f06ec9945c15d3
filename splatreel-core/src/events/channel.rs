//! Bounded channel bridge from the processing thread to a consumer thread.
//!
//! Status events always reach the consumer; the processing thread waits for
//! room if the consumer falls behind. Progress events are sent with
//! `try_send` and dropped when the channel is full: a later count supersedes
//! them, so the processing thread never waits on progress alone.

use super::{Event, EventHandler};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

/// Default channel capacity.
pub const DEFAULT_CAPACITY: usize = 64;

pub struct ChannelEventHandler {
    sender: Sender<Event>,
}

impl ChannelEventHandler {
    /// Creates a handler and the receiving end of its channel.
    pub fn new(capacity: usize) -> (Self, Receiver<Event>) {
        let (sender, receiver) = bounded(capacity.max(1));
        (Self { sender }, receiver)
    }
}

impl EventHandler for ChannelEventHandler {
    fn handle(&self, event: &Event) {
        if event.is_progress() {
            match self.sender.try_send(event.clone()) {
                Ok(()) | Err(TrySendError::Full(_)) => {}
                Err(TrySendError::Disconnected(_)) => {
                    log::trace!("Status feed receiver dropped; discarding progress");
                }
            }
        } else if self.sender.send(event.clone()).is_err() {
            log::trace!("Status feed receiver dropped; discarding event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::StatusLevel;

    fn status(index: u64) -> Event {
        Event::FrameStatus {
            index,
            level: StatusLevel::Success,
            message: format!("frame {index}"),
            output_path: None,
        }
    }

    #[test]
    fn test_full_channel_drops_progress_only() {
        let (handler, receiver) = ChannelEventHandler::new(2);
        handler.handle(&status(0));
        handler.handle(&Event::Progress { completed: 1, total: 3 });
        // Channel is full now; this progress event is dropped without blocking.
        handler.handle(&Event::Progress { completed: 2, total: 3 });

        assert_eq!(receiver.recv().unwrap(), status(0));
        handler.handle(&status(1));

        let rest: Vec<Event> = receiver.try_iter().collect();
        assert_eq!(rest, vec![Event::Progress { completed: 1, total: 3 }, status(1)]);
    }

    #[test]
    fn test_status_events_wait_for_room() {
        let (handler, receiver) = ChannelEventHandler::new(1);
        let producer = std::thread::spawn(move || {
            for i in 0..20 {
                handler.handle(&status(i));
            }
        });

        let received: Vec<Event> = receiver.iter().collect();
        producer.join().unwrap();
        assert_eq!(received.len(), 20);
        assert_eq!(received[19], status(19));
    }

    #[test]
    fn test_disconnected_receiver_does_not_panic() {
        let (handler, receiver) = ChannelEventHandler::new(1);
        drop(receiver);
        handler.handle(&status(0));
        handler.handle(&Event::Progress { completed: 1, total: 1 });
    }
}
