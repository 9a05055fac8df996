//! Synchronous publish/subscribe for world and body lifecycle events.
//!
//! Listeners are registered per event kind and called in registration
//! order. Registering the same listener (same `Rc`) twice for one kind is
//! ignored.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::Rc;

use crate::dynamics::BodyId;
use crate::shapes::ShapeId;

pub trait Event {
    type Kind: Copy + Eq + Hash + Debug;

    fn kind(&self) -> Self::Kind;
}

/// The object that fired an event.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EventTarget {
    World,
    Body(BodyId),
}

/// What a listener receives: the event plus the object that fired it.
#[derive(Debug)]
pub struct Emitted<'a, E> {
    pub target: EventTarget,
    pub event: &'a E,
}

pub type Listener<E> = Rc<dyn Fn(&Emitted<'_, E>)>;

pub struct EventEmitter<E: Event> {
    listeners: HashMap<E::Kind, Vec<Listener<E>>>,
}

impl<E: Event> EventEmitter<E> {
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
        }
    }

    /// Register `listener` for `kind`. Returns false if it was already registered.
    pub fn on(&mut self, kind: E::Kind, listener: Listener<E>) -> bool {
        let list = self.listeners.entry(kind).or_default();
        if list.iter().any(|l| Rc::ptr_eq(l, &listener)) {
            return false;
        }
        list.push(listener);
        true
    }

    /// Whether anything listens for `kind`.
    pub fn has(&self, kind: E::Kind) -> bool {
        self.listeners.get(&kind).is_some_and(|l| !l.is_empty())
    }

    pub fn has_listener(&self, kind: E::Kind, listener: &Listener<E>) -> bool {
        self.listeners
            .get(&kind)
            .is_some_and(|l| l.iter().any(|x| Rc::ptr_eq(x, listener)))
    }

    /// Unregister `listener` from `kind`. Returns false if it was not registered.
    pub fn off(&mut self, kind: E::Kind, listener: &Listener<E>) -> bool {
        let Some(list) = self.listeners.get_mut(&kind) else {
            return false;
        };
        match list.iter().position(|l| Rc::ptr_eq(l, listener)) {
            Some(idx) => {
                list.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn emit(&self, target: EventTarget, event: &E) {
        let Some(list) = self.listeners.get(&event.kind()) else {
            return;
        };
        log::trace!("Dispatching {:?} from {:?} to {} listener(s).", event.kind(), target, list.len());

        let emitted = Emitted { target, event };
        for listener in list {
            listener(&emitted);
        }
    }
}

impl<E: Event> Default for EventEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Identifies one shape of one body in contact events.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ShapeRef {
    pub body: BodyId,
    pub shape: ShapeId,
}

#[derive(Clone, Debug, PartialEq)]
pub enum WorldEvent {
    AddBody { body: BodyId },
    RemoveBody { body: BodyId },
    /// Candidate body pairs after broadphase filtering.
    PostBroadphase { pairs: Vec<(BodyId, BodyId)> },
    BeginContact { shape_a: ShapeRef, shape_b: ShapeRef },
    EndContact { shape_a: ShapeRef, shape_b: ShapeRef },
    /// Two bodies touched that were apart during the previous step.
    Impact { body_a: BodyId, body_b: BodyId },
    PostStep,
    Sleepy,
    Sleep,
    WakeUp,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum WorldEventKind {
    AddBody,
    RemoveBody,
    PostBroadphase,
    BeginContact,
    EndContact,
    Impact,
    PostStep,
    Sleepy,
    Sleep,
    WakeUp,
}

impl Event for WorldEvent {
    type Kind = WorldEventKind;

    fn kind(&self) -> WorldEventKind {
        match self {
            WorldEvent::AddBody { .. } => WorldEventKind::AddBody,
            WorldEvent::RemoveBody { .. } => WorldEventKind::RemoveBody,
            WorldEvent::PostBroadphase { .. } => WorldEventKind::PostBroadphase,
            WorldEvent::BeginContact { .. } => WorldEventKind::BeginContact,
            WorldEvent::EndContact { .. } => WorldEventKind::EndContact,
            WorldEvent::Impact { .. } => WorldEventKind::Impact,
            WorldEvent::PostStep => WorldEventKind::PostStep,
            WorldEvent::Sleepy => WorldEventKind::Sleepy,
            WorldEvent::Sleep => WorldEventKind::Sleep,
            WorldEvent::WakeUp => WorldEventKind::WakeUp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn recorder(log: &Rc<RefCell<Vec<String>>>, tag: &'static str) -> Listener<WorldEvent> {
        let log = Rc::clone(log);
        Rc::new(move |e: &Emitted<'_, WorldEvent>| {
            log.borrow_mut().push(format!("{tag}:{:?}:{:?}", e.target, e.event.kind()));
        })
    }

    #[test]
    fn dispatches_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut emitter = EventEmitter::new();
        emitter.on(WorldEventKind::PostStep, recorder(&log, "a"));
        emitter.on(WorldEventKind::PostStep, recorder(&log, "b"));

        emitter.emit(EventTarget::World, &WorldEvent::PostStep);

        assert_eq!(
            *log.borrow(),
            vec!["a:World:PostStep".to_string(), "b:World:PostStep".to_string()]
        );
    }

    #[test]
    fn duplicate_registration_is_suppressed() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut emitter = EventEmitter::new();
        let l = recorder(&log, "a");

        assert!(emitter.on(WorldEventKind::Sleep, Rc::clone(&l)));
        assert!(!emitter.on(WorldEventKind::Sleep, Rc::clone(&l)));
        assert!(emitter.has_listener(WorldEventKind::Sleep, &l));

        emitter.emit(EventTarget::Body(BodyId(3)), &WorldEvent::Sleep);
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(log.borrow()[0], "a:Body(BodyId(3)):Sleep");
    }

    #[test]
    fn listeners_only_see_their_kind() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut emitter = EventEmitter::new();
        emitter.on(WorldEventKind::WakeUp, recorder(&log, "w"));

        emitter.emit(EventTarget::World, &WorldEvent::PostStep);
        assert!(log.borrow().is_empty());
        assert!(!emitter.has(WorldEventKind::PostStep));
        assert!(emitter.has(WorldEventKind::WakeUp));
    }

    #[test]
    fn off_removes_listener() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut emitter = EventEmitter::new();
        let l = recorder(&log, "a");
        emitter.on(WorldEventKind::PostStep, Rc::clone(&l));

        assert!(emitter.off(WorldEventKind::PostStep, &l));
        assert!(!emitter.off(WorldEventKind::PostStep, &l));

        emitter.emit(EventTarget::World, &WorldEvent::PostStep);
        assert!(log.borrow().is_empty());
    }
}
