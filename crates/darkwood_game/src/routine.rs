//! Timed routines.
//!
//! A [`Routines`] set holds delayed actions owned by one component. The owner
//! starts them with a delay, may stop them by id or by predicate, and polls
//! [`Routines::drain_due`] from its update to receive the actions whose time
//! has come. Multi-step sequences are chains: handling one action starts the
//! next.

/// Handle of a started routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoutineId(u64);

#[derive(Debug, Clone)]
struct Pending<A> {
    id: RoutineId,
    due: f32,
    action: A,
}

/// Pending delayed actions of type `A`.
#[derive(Debug, Clone)]
pub struct Routines<A> {
    next_id: u64,
    pending: Vec<Pending<A>>,
}

impl<A> Routines<A> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 1,
            pending: Vec::new(),
        }
    }

    /// Schedule `action` to fire `delay` seconds after `now`.
    pub fn start(&mut self, now: f32, delay: f32, action: A) -> RoutineId {
        let id = RoutineId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            id,
            due: now + delay.max(0.0),
            action,
        });
        id
    }

    /// Cancel one routine. Returns `false` if it already fired or was stopped.
    pub fn stop(&mut self, id: RoutineId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    /// Cancel every routine whose action matches `pred`.
    pub fn stop_where(&mut self, pred: impl Fn(&A) -> bool) -> usize {
        let before = self.pending.len();
        self.pending.retain(|p| !pred(&p.action));
        before - self.pending.len()
    }

    pub fn stop_all(&mut self) {
        self.pending.clear();
    }

    #[must_use]
    pub fn is_running(&self, id: RoutineId) -> bool {
        self.pending.iter().any(|p| p.id == id)
    }

    /// Whether any pending action matches `pred`.
    #[must_use]
    pub fn any(&self, pred: impl Fn(&A) -> bool) -> bool {
        self.pending.iter().any(|p| pred(&p.action))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return every action due at `now`, earliest first. Actions
    /// due at the same instant come out in start order.
    pub fn drain_due(&mut self, now: f32) -> Vec<A> {
        let (mut due, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|p| p.due <= now);
        self.pending = rest;
        due.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.id.cmp(&b.id)));
        due.into_iter().map(|p| p.action).collect()
    }
}

impl<A> Default for Routines<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Step {
        Hit,
        Decide,
        Recover,
    }

    #[test]
    fn test_drain_due_in_time_order() {
        let mut r = Routines::new();
        r.start(0.0, 1.1, Step::Decide);
        r.start(0.0, 0.3, Step::Hit);
        assert!(r.drain_due(0.2).is_empty());
        assert_eq!(r.drain_due(2.0), vec![Step::Hit, Step::Decide]);
        assert!(r.is_empty());
    }

    #[test]
    fn test_same_due_keeps_start_order() {
        let mut r = Routines::new();
        r.start(1.0, 0.5, Step::Recover);
        r.start(1.0, 0.5, Step::Hit);
        assert_eq!(r.drain_due(1.5), vec![Step::Recover, Step::Hit]);
    }

    #[test]
    fn test_stop_by_id() {
        let mut r = Routines::new();
        let id = r.start(0.0, 1.0, Step::Hit);
        assert!(r.is_running(id));
        assert!(r.stop(id));
        assert!(!r.is_running(id));
        assert!(!r.stop(id));
        assert!(r.drain_due(5.0).is_empty());
    }

    #[test]
    fn test_stop_where_and_stop_all() {
        let mut r = Routines::new();
        r.start(0.0, 1.0, Step::Hit);
        r.start(0.0, 1.0, Step::Decide);
        r.start(0.0, 1.0, Step::Hit);
        assert_eq!(r.stop_where(|s| *s == Step::Hit), 2);
        assert!(r.any(|s| *s == Step::Decide));
        assert_eq!(r.len(), 1);
        r.stop_all();
        assert!(r.is_empty());
    }

    #[test]
    fn test_negative_delay_is_immediate() {
        let mut r = Routines::new();
        r.start(3.0, -1.0, Step::Recover);
        assert_eq!(r.drain_due(3.0), vec![Step::Recover]);
    }
}
