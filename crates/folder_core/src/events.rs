//! Request-scoped notification bus
//!
//! Observers run synchronously, in registration order. Folder observers may
//! replace the target name or stop the operation; response observers decorate
//! the outgoing payload once per request.

use crate::{Response, WorkingFolder};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Handle returned by `subscribe*`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FolderEventKind {
    CreateFolder,
    RenameFolder,
}

impl FolderEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FolderEventKind::CreateFolder => "folder.create",
            FolderEventKind::RenameFolder => "folder.rename",
        }
    }
}

/// Folder mutation about to happen
pub struct FolderEvent<'a> {
    pub kind: FolderEventKind,
    pub folder: &'a WorkingFolder,
    /// Target name as seen after earlier observers
    pub name: &'a str,
}

/// What a folder observer decided
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verdict {
    pub override_name: Option<String>,
    pub stop: bool,
}

impl Verdict {
    pub fn proceed() -> Self {
        Self::default()
    }

    pub fn rename_to(name: impl Into<String>) -> Self {
        Self {
            override_name: Some(name.into()),
            stop: false,
        }
    }

    /// Observer performed the operation itself
    pub fn handled() -> Self {
        Self {
            override_name: None,
            stop: true,
        }
    }

    pub fn and_stop(mut self) -> Self {
        self.stop = true;
        self
    }
}

/// Result of a folder dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub name: String,
    pub stopped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Continue,
    Stop,
}

type FolderObserver = Rc<dyn Fn(&FolderEvent<'_>) -> Verdict>;
type ResponseObserver = Rc<dyn Fn(&mut Response) -> Propagation>;

/// Single-threaded, ordered observer registry for one request
#[derive(Default)]
pub struct NotificationBus {
    next_id: Cell<u64>,
    folder_observers: RefCell<Vec<(SubscriptionId, FolderEventKind, FolderObserver)>>,
    response_observers: RefCell<Vec<(SubscriptionId, ResponseObserver)>>,
    response_fired: Cell<bool>,
}

impl NotificationBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> SubscriptionId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        SubscriptionId(id)
    }

    pub fn subscribe<F>(&self, kind: FolderEventKind, observer: F) -> SubscriptionId
    where
        F: Fn(&FolderEvent<'_>) -> Verdict + 'static,
    {
        let id = self.allocate_id();
        self.folder_observers
            .borrow_mut()
            .push((id, kind, Rc::new(observer)));
        id
    }

    pub fn subscribe_response<F>(&self, observer: F) -> SubscriptionId
    where
        F: Fn(&mut Response) -> Propagation + 'static,
    {
        let id = self.allocate_id();
        self.response_observers.borrow_mut().push((id, Rc::new(observer)));
        id
    }

    /// Returns whether the subscription existed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut folder = self.folder_observers.borrow_mut();
        let before = folder.len();
        folder.retain(|(sid, _, _)| *sid != id);
        if folder.len() != before {
            return true;
        }
        drop(folder);

        let mut response = self.response_observers.borrow_mut();
        let before = response.len();
        response.retain(|(sid, _)| *sid != id);
        response.len() != before
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.folder_observers.borrow().iter().any(|(sid, _, _)| *sid == id)
            || self.response_observers.borrow().iter().any(|(sid, _)| *sid == id)
    }

    pub fn observer_count(&self, kind: FolderEventKind) -> usize {
        self.folder_observers
            .borrow()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .count()
    }

    pub fn response_observer_count(&self) -> usize {
        self.response_observers.borrow().len()
    }

    /// Fold the observers of `kind` over `name`
    ///
    /// Each observer sees the name left by the previous one. Dispatch ends at
    /// the first observer that stops.
    pub fn dispatch_folder(&self, kind: FolderEventKind, folder: &WorkingFolder, name: &str) -> Dispatch {
        let snapshot: Vec<(SubscriptionId, FolderObserver)> = self
            .folder_observers
            .borrow()
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(id, _, observer)| (*id, Rc::clone(observer)))
            .collect();

        let mut current = name.to_string();
        for (id, observer) in snapshot {
            if !self.is_subscribed(id) {
                continue;
            }

            let verdict = observer(&FolderEvent {
                kind,
                folder,
                name: &current,
            });

            if let Some(new_name) = verdict.override_name {
                tracing::debug!("{}: observer renamed {} -> {}", kind.as_str(), current, new_name);
                current = new_name;
            }
            if verdict.stop {
                tracing::debug!("{}: stopped by observer", kind.as_str());
                return Dispatch {
                    name: current,
                    stopped: true,
                };
            }
        }

        Dispatch {
            name: current,
            stopped: false,
        }
    }

    /// Run the response observers; only the first call per bus does anything
    pub fn dispatch_response(&self, response: &mut Response) -> bool {
        if self.response_fired.replace(true) {
            return false;
        }

        let snapshot: Vec<(SubscriptionId, ResponseObserver)> = self
            .response_observers
            .borrow()
            .iter()
            .map(|(id, observer)| (*id, Rc::clone(observer)))
            .collect();

        for (id, observer) in snapshot {
            if !self.is_subscribed(id) {
                continue;
            }
            if observer(response) == Propagation::Stop {
                break;
            }
        }
        true
    }
}

impl fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationBus")
            .field("folder_observers", &self.folder_observers.borrow().len())
            .field("response_observers", &self.response_observers.borrow().len())
            .field("response_fired", &self.response_fired.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_fires_once_in_order() {
        let bus = NotificationBus::new();
        bus.subscribe_response(|r| {
            if let Some(map) = r.as_json_mut() {
                map.insert("first".into(), json!(1));
            }
            Propagation::Continue
        });
        bus.subscribe_response(|r| {
            if let Some(map) = r.as_json_mut() {
                map.insert("first".into(), json!(2));
            }
            Propagation::Stop
        });
        bus.subscribe_response(|r| {
            if let Some(map) = r.as_json_mut() {
                map.insert("third".into(), json!(true));
            }
            Propagation::Continue
        });

        let mut response = Response::empty();
        assert!(bus.dispatch_response(&mut response));
        let map = response.as_json().unwrap();
        assert_eq!(map["first"], 2);
        assert!(!map.contains_key("third"));

        let mut again = Response::empty();
        assert!(!bus.dispatch_response(&mut again));
        assert!(again.as_json().unwrap().is_empty());
    }

    #[test]
    fn test_unsubscribe_during_dispatch() {
        let bus = Rc::new(NotificationBus::new());
        let later: Rc<Cell<Option<SubscriptionId>>> = Rc::new(Cell::new(None));
        let hits = Rc::new(Cell::new(0));

        {
            let bus_ref = Rc::downgrade(&bus);
            let later = Rc::clone(&later);
            bus.subscribe_response(move |_| {
                if let (Some(bus), Some(id)) = (bus_ref.upgrade(), later.get()) {
                    assert!(bus.unsubscribe(id));
                }
                Propagation::Continue
            });
        }
        {
            let hits = Rc::clone(&hits);
            later.set(Some(bus.subscribe_response(move |_| {
                hits.set(hits.get() + 1);
                Propagation::Continue
            })));
        }

        bus.dispatch_response(&mut Response::empty());
        assert_eq!(hits.get(), 0);
        assert_eq!(bus.response_observer_count(), 1);
    }

    #[test]
    fn test_unsubscribe_unknown() {
        let bus = NotificationBus::new();
        let id = bus.subscribe_response(|_| Propagation::Continue);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert!(!bus.is_subscribed(id));
    }

    #[test]
    fn test_verdict_builders() {
        assert_eq!(Verdict::proceed(), Verdict { override_name: None, stop: false });
        assert_eq!(
            Verdict::rename_to("x").and_stop(),
            Verdict { override_name: Some("x".into()), stop: true }
        );
        assert!(Verdict::handled().stop);
    }
}
