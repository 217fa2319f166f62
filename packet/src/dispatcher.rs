//! Route packets to handlers registered for their type.

use crate::{Frame, Packet};
use std::{
    any::{type_name, Any, TypeId},
    collections::HashMap,
};
use tracing::trace;

type Handler<C> = Box<dyn Fn(&dyn Any, &C) + Send + Sync>;

/// Ordered handlers per packet type, invoked with a shared context `C`.
pub struct Dispatcher<C> {
    handlers: HashMap<TypeId, Vec<Handler<C>>>,
}

impl<C> Default for Dispatcher<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Dispatcher<C> {
    /// A dispatcher without handlers.
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Adds a handler for `P`, run after any handlers already added for `P`.
    pub fn on<P, F>(&mut self, handler: F) -> &mut Self
    where
        P: Packet,
        C: 'static,
        F: Fn(&P, &C) + Send + Sync + 'static,
    {
        self.handlers
            .entry(TypeId::of::<P>())
            .or_default()
            .push(Box::new(move |packet: &dyn Any, ctx: &C| {
                if let Some(packet) = packet.downcast_ref::<P>() {
                    handler(packet, ctx);
                }
            }));
        self
    }

    /// Invokes every handler for the type of `packet`, returning how many ran.
    ///
    /// Packets without handlers are ignored.
    pub fn dispatch<P: Packet>(&self, packet: &P, ctx: &C) -> usize {
        self.invoke(TypeId::of::<P>(), type_name::<P>(), packet, ctx)
    }

    /// Invokes every handler for the packet held by `frame`.
    pub fn dispatch_any(&self, frame: &Frame, ctx: &C) -> usize {
        self.invoke(frame.packet_type(), frame.id(), frame.value(), ctx)
    }

    fn invoke(&self, ty: TypeId, name: &str, packet: &dyn Any, ctx: &C) -> usize {
        let Some(handlers) = self.handlers.get(&ty) else {
            trace!(packet = name, "no handlers");
            return 0;
        };
        for handler in handlers {
            handler(packet, ctx);
        }
        trace!(packet = name, handlers = handlers.len(), "dispatched packet");
        handlers.len()
    }

    /// Number of handlers registered for `P`.
    pub fn handlers<P: Packet>(&self) -> usize {
        self.handlers.get(&TypeId::of::<P>()).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Removes every handler.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use packetwire_codec::{Reflect, TypeInfo};
    use std::sync::Mutex;

    #[derive(Debug, PartialEq)]
    struct Chat(String);

    impl Reflect for Chat {
        fn type_info() -> TypeInfo {
            packetwire_codec::AggregateInfo::builder::<Self>()
                .field::<String>("0", |c| &c.0, |c, v| c.0 = v)
                .constructor(|args| Ok(Chat(args.take()?)))
                .build()
        }
    }

    impl Packet for Chat {}

    struct Leave;

    impl Reflect for Leave {
        fn type_info() -> TypeInfo {
            packetwire_codec::AggregateInfo::builder::<Self>()
                .constructor(|_| Ok(Leave))
                .build()
        }
    }

    impl Packet for Leave {}

    #[test]
    fn test_handlers_run_in_order() {
        let mut dispatcher = Dispatcher::<Mutex<Vec<String>>>::new();
        dispatcher
            .on(|chat: &Chat, log| log.lock().unwrap().push(format!("first {}", chat.0)))
            .on(|chat: &Chat, log| log.lock().unwrap().push(format!("second {}", chat.0)));
        assert_eq!(dispatcher.handlers::<Chat>(), 2);

        let log = Mutex::new(Vec::new());
        assert_eq!(dispatcher.dispatch(&Chat("hi".into()), &log), 2);
        assert_eq!(*log.lock().unwrap(), vec!["first hi", "second hi"]);
    }

    #[test]
    fn test_unhandled_packets_are_ignored() {
        let mut dispatcher = Dispatcher::<Mutex<usize>>::new();
        dispatcher.on(|_: &Chat, count| *count.lock().unwrap() += 1);
        let count = Mutex::new(0);
        assert_eq!(dispatcher.dispatch(&Leave, &count), 0);
        assert_eq!(*count.lock().unwrap(), 0);
    }

    #[test]
    fn test_clear() {
        let mut dispatcher = Dispatcher::<()>::new();
        dispatcher.on(|_: &Leave, _| {});
        assert!(!dispatcher.is_empty());
        dispatcher.clear();
        assert!(dispatcher.is_empty());
        assert_eq!(dispatcher.dispatch(&Leave, &()), 0);
    }
}
