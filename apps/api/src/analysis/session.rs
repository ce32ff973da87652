//! Per-session request tracking.
//!
//! Each submission takes a `RequestTicket`. A session has at most one ticket
//! outstanding, and only the ticket carrying the session's latest request id
//! may write the view. Dropping a ticket without finishing it releases the
//! session.
//!
//! The registry never holds more than its capacity. Idle sessions are evicted
//! oldest first; when every slot is in flight, new sessions are rejected.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::analysis::view::{AnalysisView, ErrorView, SessionView};
use crate::errors::AppError;

pub const DEFAULT_SESSION_CAPACITY: usize = 1024;

#[derive(Debug)]
struct Slot {
    latest_request: u64,
    in_flight: bool,
    view: SessionView,
    touched_at: DateTime<Utc>,
}

impl Slot {
    fn new() -> Self {
        Self {
            latest_request: 0,
            in_flight: false,
            view: SessionView::Idle,
            touched_at: Utc::now(),
        }
    }
}

#[derive(Clone)]
pub struct SessionRegistry {
    slots: Arc<Mutex<HashMap<Uuid, Slot>>>,
    capacity: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_CAPACITY)
    }
}

impl SessionRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a new request for `session_id`, rejecting it if one is outstanding
    /// or if a new session would not fit.
    pub fn begin(&self, session_id: Uuid) -> Result<RequestTicket, AppError> {
        let mut slots = self.lock();

        if !slots.contains_key(&session_id) && slots.len() >= self.capacity {
            evict_oldest_idle(&mut slots);
            if slots.len() >= self.capacity {
                return Err(AppError::SessionCapacity(slots.len()));
            }
        }

        let slot = slots.entry(session_id).or_insert_with(Slot::new);
        if slot.in_flight {
            return Err(AppError::AnalysisInProgress);
        }

        slot.latest_request += 1;
        slot.in_flight = true;
        slot.view = SessionView::Analyzing {
            request_id: slot.latest_request,
        };
        slot.touched_at = Utc::now();

        debug!("Session {session_id}: request {} started", slot.latest_request);

        Ok(RequestTicket {
            registry: self.clone(),
            session_id,
            request_id: slot.latest_request,
            finished: false,
        })
    }

    pub fn view(&self, session_id: Uuid) -> Option<SessionView> {
        self.lock().get(&session_id).map(|slot| slot.view.clone())
    }

    /// Clears the session. Any outstanding request becomes stale and can no longer write.
    pub fn reset(&self, session_id: Uuid) -> bool {
        let mut slots = self.lock();
        match slots.get_mut(&session_id) {
            Some(slot) => {
                slot.latest_request += 1;
                slot.in_flight = false;
                slot.view = SessionView::Idle;
                slot.touched_at = Utc::now();
                info!("Session {session_id} reset");
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Writes `view` if `request_id` is still the session's latest request.
    fn apply(&self, session_id: Uuid, request_id: u64, view: SessionView) -> bool {
        let mut slots = self.lock();
        let Some(slot) = slots.get_mut(&session_id) else {
            return false;
        };
        if slot.latest_request != request_id {
            debug!(
                "Session {session_id}: dropping stale result of request {request_id} (latest {})",
                slot.latest_request
            );
            return false;
        }
        slot.view = view;
        slot.in_flight = false;
        slot.touched_at = Utc::now();
        true
    }
}

fn evict_oldest_idle(slots: &mut HashMap<Uuid, Slot>) {
    let oldest = slots
        .iter()
        .filter(|(_, slot)| !slot.in_flight)
        .min_by_key(|(_, slot)| slot.touched_at)
        .map(|(id, _)| *id);
    if let Some(id) = oldest {
        slots.remove(&id);
        debug!("Evicted idle session {id}");
    }
}

/// Write access to one session for the duration of one request.
pub struct RequestTicket {
    registry: SessionRegistry,
    session_id: Uuid,
    request_id: u64,
    finished: bool,
}

impl RequestTicket {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn request_id(&self) -> u64 {
        self.request_id
    }

    /// Publishes a successful analysis. Returns false if the request went stale.
    pub fn succeed(mut self, analysis: AnalysisView) -> bool {
        self.finished = true;
        self.registry.apply(
            self.session_id,
            self.request_id,
            SessionView::Ready {
                request_id: self.request_id,
                analysis: Box::new(analysis),
            },
        )
    }

    /// Publishes a failure. Returns false if the request went stale.
    pub fn fail(mut self, err: &AppError) -> bool {
        self.finished = true;
        self.registry.apply(
            self.session_id,
            self.request_id,
            SessionView::Failed {
                request_id: self.request_id,
                error: ErrorView::from(err),
            },
        )
    }
}

impl Drop for RequestTicket {
    fn drop(&mut self) {
        if !self.finished {
            debug!(
                "Session {}: request {} abandoned",
                self.session_id, self.request_id
            );
            self.registry
                .apply(self.session_id, self.request_id, SessionView::Idle);
        }
    }
}
