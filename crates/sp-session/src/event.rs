use sp_dom::NodePath;
use std::fmt;

/// Where a source change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceOrigin {
    User,
    Patch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchSkip {
    /// A previous patch is still inside its guard window.
    Guarded,
    /// The override set serializes the same as the last one patched.
    Redundant,
    /// The patcher could not rewrite the tag. Not shown to the user.
    Failed { code: &'static str },
}

/// Notification sent to subscribers after each state change.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SourceChanged { origin: SourceOrigin },
    Compiled { component: String, render_key: u64 },
    CompileFailed { code: &'static str, message: String },
    PreviewRendered { render_key: u64 },
    RenderFailed { render_key: u64, message: String },
    OverridesChanged { path: Option<NodePath> },
    SelectionChanged { path: Option<NodePath> },
    PatchApplied { path: NodePath },
    PatchSkipped { reason: PatchSkip },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&SessionEvent)>;

#[derive(Default)]
pub(crate) struct Subscribers {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("count", &self.listeners.len())
            .finish()
    }
}

impl Subscribers {
    pub(crate) fn add(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub(crate) fn emit(&mut self, event: &SessionEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SessionEvent;
    use super::SourceOrigin;
    use super::Subscribers;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn removed_listeners_stop_receiving() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut subscribers = Subscribers::default();

        let sink = Rc::clone(&seen);
        let first = subscribers.add(Box::new(move |event| sink.borrow_mut().push(event.clone())));
        let sink = Rc::clone(&seen);
        let second = subscribers.add(Box::new(move |event| sink.borrow_mut().push(event.clone())));
        assert_ne!(first, second);

        subscribers.emit(&SessionEvent::SourceChanged {
            origin: SourceOrigin::User,
        });
        assert!(subscribers.remove(first));
        assert!(!subscribers.remove(first));
        subscribers.emit(&SessionEvent::PreviewRendered { render_key: 3 });

        assert_eq!(seen.borrow().len(), 3);
    }
}
