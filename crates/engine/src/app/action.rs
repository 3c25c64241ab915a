use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::iso::TransformError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActionId(pub u64);

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionStatus {
    Pending,
    Done,
}

impl ActionStatus {
    pub fn done_if(done: bool) -> Self {
        if done {
            Self::Done
        } else {
            Self::Pending
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionError {
    #[error("{context}: {message}")]
    Failed {
        context: &'static str,
        message: String,
    },
    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl ActionError {
    pub fn failed(context: &'static str, message: impl Into<String>) -> Self {
        Self::Failed {
            context,
            message: message.into(),
        }
    }
}

/// One unit of polled work. `poll` runs to completion and must not block;
/// waiting is expressed by returning [`ActionStatus::Pending`].
pub trait Action<C> {
    fn poll(&mut self, cx: &mut ActionContext<'_, C>) -> Result<ActionStatus, ActionError>;
}

impl<C, F> Action<C> for F
where
    F: FnMut(&mut ActionContext<'_, C>) -> Result<ActionStatus, ActionError>,
{
    fn poll(&mut self, cx: &mut ActionContext<'_, C>) -> Result<ActionStatus, ActionError> {
        self(cx)
    }
}

type BoxedAction<C> = Box<dyn Action<C>>;

/// What a polled action can see: the scene state, the tick time, and a way
/// to enqueue successors. Added actions first run on the next pass.
pub struct ActionContext<'a, C> {
    state: &'a mut C,
    now: Instant,
    next_id: &'a mut u64,
    added: &'a mut Vec<(ActionId, BoxedAction<C>)>,
}

impl<'a, C> ActionContext<'a, C> {
    pub fn now(&self) -> Instant {
        self.now
    }

    pub fn state(&self) -> &C {
        self.state
    }

    pub fn state_mut(&mut self) -> &mut C {
        self.state
    }

    pub fn add(&mut self, action: impl Action<C> + 'static) -> ActionId {
        let id = allocate_id(self.next_id);
        self.added.push((id, Box::new(action)));
        id
    }
}

fn allocate_id(next_id: &mut u64) -> ActionId {
    let id = ActionId(*next_id);
    *next_id = next_id.saturating_add(1);
    id
}

/// Cooperative per-tick queue. Identifiers increase monotonically and are
/// never handed out twice.
pub struct ActionQueue<C> {
    next_id: u64,
    actions: BTreeMap<ActionId, BoxedAction<C>>,
    added: Vec<(ActionId, BoxedAction<C>)>,
    finished: Vec<ActionId>,
}

impl<C> Default for ActionQueue<C> {
    fn default() -> Self {
        Self {
            next_id: 0,
            actions: BTreeMap::new(),
            added: Vec::new(),
            finished: Vec::new(),
        }
    }
}

impl<C> fmt::Debug for ActionQueue<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionQueue")
            .field("next_id", &self.next_id)
            .field("pending", &self.actions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<C> ActionQueue<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, action: impl Action<C> + 'static) -> ActionId {
        let id = allocate_id(&mut self.next_id);
        self.actions.insert(id, Box::new(action));
        id
    }

    pub fn remove(&mut self, id: ActionId) -> bool {
        self.actions.remove(&id).is_some()
    }

    pub fn contains(&self, id: ActionId) -> bool {
        self.actions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn clear(&mut self) {
        self.actions.clear();
        self.added.clear();
        self.finished.clear();
    }

    /// Polls every queued action once. The first error stops the pass and is
    /// returned; completions and additions made before it are kept.
    pub fn update(&mut self, state: &mut C, now: Instant) -> Result<(), ActionError> {
        self.finished.clear();
        let mut outcome = Ok(());
        {
            let mut cx = ActionContext {
                state,
                now,
                next_id: &mut self.next_id,
                added: &mut self.added,
            };
            for (id, action) in self.actions.iter_mut() {
                match action.poll(&mut cx) {
                    Ok(ActionStatus::Done) => self.finished.push(*id),
                    Ok(ActionStatus::Pending) => {}
                    Err(error) => {
                        outcome = Err(error);
                        break;
                    }
                }
            }
        }

        for id in self.finished.drain(..) {
            self.actions.remove(&id);
        }
        for (id, action) in self.added.drain(..) {
            self.actions.insert(id, action);
        }
        outcome
    }
}

/// Fires `f` once, on the first poll at or after `fire_at`.
pub struct TimerAction<F> {
    fire_at: Instant,
    callback: Option<F>,
}

impl<F> TimerAction<F> {
    pub fn new(fire_at: Instant, f: F) -> Self {
        Self {
            fire_at,
            callback: Some(f),
        }
    }

    pub fn fire_at(&self) -> Instant {
        self.fire_at
    }
}

impl<C, F> Action<C> for TimerAction<F>
where
    F: FnOnce(&mut ActionContext<'_, C>) -> Result<(), ActionError>,
{
    fn poll(&mut self, cx: &mut ActionContext<'_, C>) -> Result<ActionStatus, ActionError> {
        if cx.now() < self.fire_at {
            return Ok(ActionStatus::Pending);
        }
        // A callback that errored is spent; the next poll only reports Done.
        match self.callback.take() {
            Some(callback) => callback(cx).map(|()| ActionStatus::Done),
            None => Ok(ActionStatus::Done),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Elapsed fraction of `duration`, starting at 0.
    pub percent_complete: f64,
    pub duration: Duration,
}

/// Calls `f` on every poll until `duration` has elapsed since `start`, or
/// until `f` returns `true` to finish early.
pub struct ContinuousTimedAction<F> {
    start: Instant,
    duration: Duration,
    callback: F,
}

impl<F> ContinuousTimedAction<F> {
    pub fn new(start: Instant, duration: Duration, f: F) -> Self {
        Self {
            start,
            duration,
            callback: f,
        }
    }
}

impl<C, F> Action<C> for ContinuousTimedAction<F>
where
    F: FnMut(&mut ActionContext<'_, C>, Progress) -> Result<bool, ActionError>,
{
    fn poll(&mut self, cx: &mut ActionContext<'_, C>) -> Result<ActionStatus, ActionError> {
        let elapsed = cx.now().saturating_duration_since(self.start);
        if elapsed > self.duration || self.duration.is_zero() {
            return Ok(ActionStatus::Done);
        }
        let progress = Progress {
            percent_complete: elapsed.as_secs_f64() / self.duration.as_secs_f64(),
            duration: self.duration,
        };
        let done_early = (self.callback)(cx, progress)?;
        Ok(ActionStatus::done_if(done_early))
    }
}
