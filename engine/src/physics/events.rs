//! Deferred contact events
//!
//! The engine reports new contacts from inside a step, on worker threads.
//! [`ContactListener`] only records an immutable [`ContactEvent`] into a
//! pre-sized queue; the game thread drains it after `simulate` returns. No
//! game code ever runs on a physics worker.

use crate::physics::body::BodyId;
use crate::physics::diagnostics::LogOnce;
use crate::physics::units::direction_from_sim;
use glam::Vec3;
use rapier3d::prelude::{
    ColliderSet, CollisionEvent, ContactPair, EventHandler, Real, RigidBodySet,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{trace, warn};

static QUEUE_FULL: LogOnce = LogOnce::new();

/// Two bodies started touching during a step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    pub body_a: BodyId,
    pub body_b: BodyId,
    /// User data attached to `body_a` at creation
    pub user_data_a: u64,
    /// User data attached to `body_b` at creation
    pub user_data_b: u64,
    /// World-space unit normal pointing from `body_a` towards `body_b`; zero if unknown
    pub normal: Vec3,
}

impl ContactEvent {
    pub fn involves(&self, body: BodyId) -> bool {
        self.body_a == body || self.body_b == body
    }
}

/// Shared, bounded contact-event queue
pub type ContactEventQueue = Arc<Mutex<Vec<ContactEvent>>>;

/// Engine event handler feeding a [`ContactEventQueue`]
pub struct ContactListener {
    queue: ContactEventQueue,
    capacity: usize,
}

impl ContactListener {
    /// `buffer` must already hold its full capacity; the listener never grows it.
    pub fn new(buffer: Vec<ContactEvent>) -> Self {
        let capacity = buffer.capacity();
        Self {
            queue: Arc::new(Mutex::new(buffer)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn queue(&self) -> &ContactEventQueue {
        &self.queue
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ContactEvent>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, event: ContactEvent) {
        let mut queue = self.lock();
        if queue.len() >= self.capacity {
            if QUEUE_FULL.first() {
                warn!(
                    capacity = self.capacity,
                    "Contact event queue full; dropping events until drained"
                );
            }
            return;
        }
        queue.push(event);
    }

    /// Move every queued event into `out`, keeping those `keep` accepts
    pub fn drain_into(&self, out: &mut Vec<ContactEvent>, keep: impl Fn(&ContactEvent) -> bool) {
        let mut queue = self.lock();
        out.extend(queue.drain(..).filter(|event| keep(event)));
    }

    pub fn pending(&self) -> usize {
        self.lock().len()
    }
}

impl EventHandler for ContactListener {
    fn handle_collision_event(
        &self,
        bodies: &RigidBodySet,
        colliders: &ColliderSet,
        event: CollisionEvent,
        contact_pair: Option<&ContactPair>,
    ) {
        let CollisionEvent::Started(collider_a, collider_b, _) = event else {
            return;
        };

        let parent_a = colliders.get(collider_a).and_then(|c| c.parent());
        let parent_b = colliders.get(collider_b).and_then(|c| c.parent());
        let (Some(handle_a), Some(handle_b)) = (parent_a, parent_b) else {
            return;
        };
        let (Some(rb_a), Some(rb_b)) = (bodies.get(handle_a), bodies.get(handle_b)) else {
            return;
        };

        let normal = contact_pair
            .and_then(|pair| pair.manifolds.iter().find(|m| !m.points.is_empty()))
            .map(|manifold| direction_from_sim(&manifold.data.normal))
            .unwrap_or(Vec3::ZERO);

        // The engine orders the pair by collider; keep `normal` pointing a -> b.
        let (body_a, body_b) = match contact_pair {
            Some(pair) if pair.collider1 != collider_a => (handle_b, handle_a),
            _ => (handle_a, handle_b),
        };
        let (user_a, user_b) = if body_a == handle_a {
            (rb_a.user_data, rb_b.user_data)
        } else {
            (rb_b.user_data, rb_a.user_data)
        };

        trace!(?body_a, ?body_b, ?normal, "Contact started");
        self.push(ContactEvent {
            body_a: BodyId(body_a),
            body_b: BodyId(body_b),
            user_data_a: user_a as u64,
            user_data_b: user_b as u64,
            normal,
        });
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}
