//! A registration-order table of packet-kind handlers. The core registers
//! its own handlers for the kinds it acts on; nothing stops a second
//! consumer (a renderer, a recorder) from registering another handler for
//! the same kind and getting invoked right after it.

use std::collections::HashMap;

pub type PacketHandler<C> = Box<dyn FnMut(&mut C, &[u8])>;

pub struct PacketDispatcher<C> {
    handlers: HashMap<u8, Vec<PacketHandler<C>>>,
}

impl<C> Default for PacketDispatcher<C> {
    fn default() -> Self {
        PacketDispatcher { handlers: HashMap::new() }
    }
}

impl<C> PacketDispatcher<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `handler` to `kind`'s list. Multiple handlers for the same
    /// kind run in the order they were registered.
    pub fn register(&mut self, kind: u8, handler: PacketHandler<C>) {
        self.handlers.entry(kind).or_default().push(handler);
    }

    pub fn dispatch(&mut self, ctx: &mut C, kind: u8, payload: &[u8]) {
        if let Some(handlers) = self.handlers.get_mut(&kind) {
            for handler in handlers {
                handler(ctx, payload);
            }
        }
    }

    pub fn handler_count(&self, kind: u8) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_kind_dispatches_to_nothing() {
        let mut dispatcher: PacketDispatcher<Vec<u8>> = PacketDispatcher::new();
        let mut ctx = Vec::new();
        dispatcher.dispatch(&mut ctx, 0x07, b"hi");
        assert!(ctx.is_empty());
    }

    #[test]
    fn multiple_handlers_run_in_registration_order() {
        let mut dispatcher: PacketDispatcher<u32> = PacketDispatcher::new();
        dispatcher.register(0x01, Box::new(|ctx: &mut u32, _| *ctx = *ctx * 2 + 1));
        dispatcher.register(0x01, Box::new(|ctx: &mut u32, _| *ctx = *ctx * 2 + 1));
        let mut ctx = 0u32;
        dispatcher.dispatch(&mut ctx, 0x01, &[]);
        assert_eq!(ctx, 3);
        assert_eq!(dispatcher.handler_count(0x01), 2);
        assert_eq!(dispatcher.handler_count(0x02), 0);
    }
}
