//! Automation dispatch (spec §9): a subscribe/unsubscribe registry called by
//! the façade on every inbound Insteon message. Grounded on
//! `examples/original_source/pysteon/automation/__init__.py`'s
//! `Automate.fire_on_event`/`handle_message`, with the decorator/metaclass
//! machinery replaced by plain `subscribe`/`unsubscribe` (spec §9).

use crate::category::{DeviceCategory, DeviceSubcategory};
use crate::message::InsteonMessage;

/// A filter matching inbound messages by device class and command bytes. A
/// `None` field matches anything, mirroring `pysteon`'s `in_list(value,
/// choices)` where an empty/absent choice list matches everything.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Predicate {
    pub categories: Option<Vec<DeviceCategory>>,
    pub subcategories: Option<Vec<DeviceSubcategory>>,
    pub command_byte_0: Option<Vec<u8>>,
    pub command_byte_1: Option<Vec<u8>>,
}

impl Predicate {
    pub fn any() -> Self {
        Predicate::default()
    }

    fn matches(
        &self,
        category: DeviceCategory,
        subcategory: DeviceSubcategory,
        msg: &InsteonMessage,
    ) -> bool {
        fn in_list<T: PartialEq>(value: &T, choices: &Option<Vec<T>>) -> bool {
            match choices {
                None => true,
                Some(choices) => choices.contains(value),
            }
        }

        in_list(&category, &self.categories)
            && in_list(&subcategory, &self.subcategories)
            && in_list(&msg.command_bytes[0], &self.command_byte_0)
            && in_list(&msg.command_bytes[1], &self.command_byte_1)
    }
}

/// Identifies a registered subscription so it can be removed later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Token(u64);

type Handler = Box<dyn Fn(DeviceCategory, DeviceSubcategory, &InsteonMessage) + Send>;

struct Subscription {
    token: Token,
    predicate: Predicate,
    handler: Handler,
}

/// The subscription registry. Owned by the façade; `dispatch` is called for
/// every inbound Insteon message once its sender's device class has been
/// resolved (normally via the `DeviceDirectory`).
#[derive(Default)]
pub struct AutomationRegistry {
    next_token: u64,
    subscriptions: Vec<Subscription>,
}

impl AutomationRegistry {
    pub fn new() -> Self {
        AutomationRegistry::default()
    }

    /// Registers `handler` to run on every inbound message matching
    /// `predicate`. Returns a token usable with [`unsubscribe`](Self::unsubscribe).
    pub fn subscribe(
        &mut self,
        predicate: Predicate,
        handler: impl Fn(DeviceCategory, DeviceSubcategory, &InsteonMessage) + Send + 'static,
    ) -> Token {
        let token = Token(self.next_token);
        self.next_token += 1;
        self.subscriptions.push(Subscription {
            token,
            predicate,
            handler: Box::new(handler),
        });
        token
    }

    pub fn unsubscribe(&mut self, token: Token) {
        self.subscriptions.retain(|s| s.token != token);
    }

    /// Runs every matching handler against `msg`, in registration order.
    pub fn dispatch(
        &self,
        category: DeviceCategory,
        subcategory: DeviceSubcategory,
        msg: &InsteonMessage,
    ) {
        for subscription in &self.subscriptions {
            if subscription.predicate.matches(category, subcategory, msg) {
                (subscription.handler)(category, subcategory, msg);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn msg(cmd0: u8, cmd1: u8) -> InsteonMessage {
        InsteonMessage::standard(Identity::from([0x01, 0x02, 0x03]), [cmd0, cmd1])
    }

    #[test]
    fn dispatch_runs_matching_handlers_only() {
        let mut registry = AutomationRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = hits.clone();
        registry.subscribe(
            Predicate {
                command_byte_0: Some(vec![0x11, 0x12]),
                ..Predicate::any()
            },
            move |_, _, _| {
                hits_clone.fetch_add(1, Ordering::SeqCst);
            },
        );

        registry.dispatch(
            DeviceCategory::DimmableLightingControl,
            DeviceSubcategory::Generic(0),
            &msg(0x11, 0x00),
        );
        registry.dispatch(
            DeviceCategory::DimmableLightingControl,
            DeviceSubcategory::Generic(0),
            &msg(0x13, 0x00),
        );

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let mut registry = AutomationRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = hits.clone();

        let token = registry.subscribe(Predicate::any(), move |_, _, _| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        registry.dispatch(
            DeviceCategory::Generic(0xaa),
            DeviceSubcategory::Generic(0),
            &msg(0x11, 0x00),
        );
        registry.unsubscribe(token);
        registry.dispatch(
            DeviceCategory::Generic(0xaa),
            DeviceSubcategory::Generic(0),
            &msg(0x11, 0x00),
        );

        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
