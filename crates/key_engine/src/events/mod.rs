//! Entity message bus
//!
//! Key principles:
//! - Messages are move-only envelopes addressed to explicit recipients
//! - The bus is a thread-safe queue (producers on any thread)
//! - Dispatch delivers to each recipient in order; a handler returning
//!   `true` marks the message handled and stops forwarding
//! - The dispatcher owns the bus and drains it once per frame

use std::any::Any;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use crate::core::{EngineError, EngineResult};
use crate::scene::EntityId;

/// Message type identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// No-op message, useful for keep-alives and tests
    Idle,
    /// Recipient takes damage
    Damage,
    /// Recipient is healed
    Heal,
    /// Social ping between entities
    Greet,
    /// Physics collision notification
    PhysicsCollision,
}

/// Move-only message envelope with sender, recipients and optional payload
pub struct Message {
    kind: MessageKind,
    sender: EntityId,
    recipients: Vec<EntityId>,
    handled: bool,
    payload: Option<Box<dyn Any + Send>>,
}

impl Message {
    /// Create a message without payload
    pub fn new(kind: MessageKind, sender: EntityId, recipients: Vec<EntityId>) -> Self {
        Self {
            kind,
            sender,
            recipients,
            handled: false,
            payload: None,
        }
    }

    /// Create a message carrying an arbitrary payload
    pub fn with_payload<T: Any + Send>(
        kind: MessageKind,
        sender: EntityId,
        recipients: Vec<EntityId>,
        payload: T,
    ) -> Self {
        Self {
            kind,
            sender,
            recipients,
            handled: false,
            payload: Some(Box::new(payload)),
        }
    }

    /// Message type
    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    /// Sending entity
    pub fn sender(&self) -> EntityId {
        self.sender
    }

    /// Addressed recipients
    pub fn recipients(&self) -> &[EntityId] {
        &self.recipients
    }

    /// Whether some handler already consumed the message
    pub fn is_handled(&self) -> bool {
        self.handled
    }

    /// Typed view of the payload, if one of type `T` is attached
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.as_deref()?.downcast_ref()
    }
}

/// Thread-safe message queue
///
/// Enqueue from any thread; the dispatcher drains it on the game thread.
pub struct MessageBus {
    queue: Mutex<VecDeque<Message>>,
    available: Condvar,
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create a bus with preallocated storage
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            available: Condvar::new(),
        }
    }

    /// Push a message at the back of the queue
    pub fn enqueue(&self, message: Message) {
        let mut queue = self.queue.lock().unwrap();
        queue.push_back(message);
        self.available.notify_one();
    }

    /// Pop the front message without blocking
    pub fn try_dequeue(&self) -> Option<Message> {
        self.queue.lock().unwrap().pop_front()
    }

    /// Pop the front message, blocking until one is available
    pub fn dequeue(&self) -> Message {
        let mut queue = self.queue.lock().unwrap();
        loop {
            if let Some(message) = queue.pop_front() {
                return message;
            }
            queue = self.available.wait(queue).unwrap();
        }
    }

    /// Kind of the front message, if any
    pub fn peek_kind(&self) -> Option<MessageKind> {
        self.queue.lock().unwrap().front().map(Message::kind)
    }

    /// Number of queued messages
    pub fn len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.queue.lock().unwrap().is_empty()
    }

    /// Allocated queue capacity
    pub fn capacity(&self) -> usize {
        self.queue.lock().unwrap().capacity()
    }

    /// Drop all queued messages
    pub fn clear(&self) {
        self.queue.lock().unwrap().clear();
    }
}

/// Receiver side of message delivery
///
/// Return `true` to consume the message and stop forwarding to the
/// remaining recipients.
pub trait MessageHandler {
    /// Deliver `message` to `recipient`
    fn on_message(&mut self, recipient: EntityId, message: &Message) -> bool;
}

/// Owns the bus and delivers queued messages to their recipients
pub struct MessageDispatcher {
    bus: MessageBus,
}

impl Default for MessageDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageDispatcher {
    /// Create a dispatcher with an empty bus
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Create a dispatcher with preallocated bus storage
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bus: MessageBus::with_capacity(capacity),
        }
    }

    /// Queue a message for the next dispatch
    pub fn post(&self, message: Message) {
        self.bus.enqueue(message);
    }

    /// Shared access to the underlying bus
    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    /// Deliver every queued message to its recipients in queue order
    ///
    /// A message with no recipients is a programming error and aborts the
    /// dispatch. Delivery to a recipient stops once a handler consumes the
    /// message.
    pub fn dispatch_all(&self, handler: &mut dyn MessageHandler) -> EngineResult<()> {
        while let Some(mut message) = self.bus.try_dequeue() {
            if message.recipients.is_empty() {
                return Err(EngineError::gameplay(format!(
                    "message {:?} from {:?} has no recipients",
                    message.kind, message.sender
                )));
            }
            let recipients = std::mem::take(&mut message.recipients);
            for recipient in &recipients {
                if handler.on_message(*recipient, &message) {
                    message.handled = true;
                    break;
                }
            }
            message.recipients = recipients;
        }
        Ok(())
    }

    /// Number of messages awaiting dispatch
    pub fn pending(&self) -> usize {
        self.bus.len()
    }

    /// Drop all pending messages (state transitions)
    pub fn clear(&self) {
        self.bus.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::EntityManager;

    struct Recorder {
        received: Vec<(EntityId, MessageKind)>,
        consume: bool,
    }

    impl MessageHandler for Recorder {
        fn on_message(&mut self, recipient: EntityId, message: &Message) -> bool {
            self.received.push((recipient, message.kind()));
            self.consume
        }
    }

    fn ids(n: usize) -> Vec<EntityId> {
        let mut manager = EntityManager::new();
        (0..n)
            .map(|i| manager.spawn(format!("e{i}"), crate::scene::Category::Uncategorized, None))
            .collect()
    }

    #[test]
    fn bus_is_fifo() {
        let entities = ids(2);
        let bus = MessageBus::new();
        bus.enqueue(Message::new(MessageKind::Damage, entities[0], vec![entities[1]]));
        bus.enqueue(Message::new(MessageKind::Heal, entities[0], vec![entities[1]]));
        assert_eq!(bus.peek_kind(), Some(MessageKind::Damage));
        assert_eq!(bus.try_dequeue().map(|m| m.kind()), Some(MessageKind::Damage));
        assert_eq!(bus.try_dequeue().map(|m| m.kind()), Some(MessageKind::Heal));
        assert!(bus.try_dequeue().is_none());
    }

    #[test]
    fn blocking_dequeue_wakes_on_enqueue() {
        let entities = ids(2);
        let bus = std::sync::Arc::new(MessageBus::new());
        let producer = std::sync::Arc::clone(&bus);
        let sender = entities[0];
        let recipient = entities[1];
        let t = std::thread::spawn(move || {
            producer.enqueue(Message::new(MessageKind::Greet, sender, vec![recipient]));
        });
        let message = bus.dequeue();
        assert_eq!(message.kind(), MessageKind::Greet);
        t.join().unwrap();
    }

    #[test]
    fn dispatch_delivers_to_all_recipients() {
        let entities = ids(3);
        let dispatcher = MessageDispatcher::new();
        dispatcher.post(Message::new(
            MessageKind::PhysicsCollision,
            entities[0],
            vec![entities[1], entities[2]],
        ));
        let mut handler = Recorder { received: Vec::new(), consume: false };
        dispatcher.dispatch_all(&mut handler).unwrap();
        assert_eq!(handler.received.len(), 2);
        assert_eq!(dispatcher.pending(), 0);
    }

    #[test]
    fn consumed_message_stops_forwarding() {
        let entities = ids(3);
        let dispatcher = MessageDispatcher::new();
        dispatcher.post(Message::new(
            MessageKind::Damage,
            entities[0],
            vec![entities[1], entities[2]],
        ));
        let mut handler = Recorder { received: Vec::new(), consume: true };
        dispatcher.dispatch_all(&mut handler).unwrap();
        assert_eq!(handler.received.len(), 1);
    }

    #[test]
    fn empty_recipients_is_an_error() {
        let entities = ids(1);
        let dispatcher = MessageDispatcher::new();
        dispatcher.post(Message::new(MessageKind::Idle, entities[0], vec![]));
        let mut handler = Recorder { received: Vec::new(), consume: false };
        assert!(dispatcher.dispatch_all(&mut handler).is_err());
    }

    #[test]
    fn payload_downcasts_by_type() {
        let entities = ids(2);
        let message =
            Message::with_payload(MessageKind::Damage, entities[0], vec![entities[1]], 42_i32);
        assert_eq!(message.payload::<i32>(), Some(&42));
        assert!(message.payload::<String>().is_none());
    }
}
