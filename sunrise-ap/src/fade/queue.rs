//! FIFO session guard
//!
//! A mutual-exclusion guard whose place in line is taken when a ticket is
//! issued, not when the holder first tries to acquire. Ticket issue happens
//! synchronously at dispatch, so sessions run in dispatch order even though
//! each one waits on its own background thread.
//!
//! The turn is released when the session closure returns or unwinds. A ticket
//! dropped without being run forfeits its turn and never blocks later tickets.

use std::collections::BTreeSet;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct Turns {
    next_ticket: u64,
    now_serving: u64,
    /// Tickets dropped before their turn came up
    forfeited: BTreeSet<u64>,
}

impl Turns {
    fn advance(&mut self) {
        self.now_serving += 1;
        while self.forfeited.remove(&self.now_serving) {
            self.now_serving += 1;
        }
    }

    /// Tickets issued but not yet finished, excluding forfeits
    fn outstanding(&self) -> usize {
        let issued = (self.next_ticket - self.now_serving) as usize;
        issued - self.forfeited.len()
    }
}

/// Exclusive, first-come-first-served access to a resource.
pub struct SessionQueue<T> {
    turns: Mutex<Turns>,
    turn_changed: Condvar,
    resource: Mutex<T>,
}

impl<T> SessionQueue<T> {
    /// Wrap `resource` in a new queue
    pub fn new(resource: T) -> Self {
        Self {
            turns: Mutex::new(Turns::default()),
            turn_changed: Condvar::new(),
            resource: Mutex::new(resource),
        }
    }

    /// Take a place in line.
    pub fn ticket(self: &Arc<Self>) -> Ticket<T> {
        let mut turns = lock(&self.turns);
        let number = turns.next_ticket;
        let ahead = turns.outstanding();
        turns.next_ticket += 1;

        Ticket {
            queue: Arc::clone(self),
            number,
            ahead,
            redeemed: false,
        }
    }

    /// Sessions holding a ticket, including the one currently running
    pub fn outstanding(&self) -> usize {
        lock(&self.turns).outstanding()
    }

    fn wait_for_turn(&self, number: u64) {
        let mut turns = lock(&self.turns);
        while turns.now_serving != number {
            turns = self
                .turn_changed
                .wait(turns)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn finish_turn(&self, number: u64) {
        let mut turns = lock(&self.turns);
        debug_assert_eq!(turns.now_serving, number);
        turns.advance();
        drop(turns);
        self.turn_changed.notify_all();
    }

    fn forfeit(&self, number: u64) {
        let mut turns = lock(&self.turns);
        if turns.now_serving == number {
            turns.advance();
            drop(turns);
            self.turn_changed.notify_all();
        } else {
            turns.forfeited.insert(number);
        }
    }
}

/// A reserved place in a `SessionQueue`.
pub struct Ticket<T> {
    queue: Arc<SessionQueue<T>>,
    number: u64,
    ahead: usize,
    redeemed: bool,
}

impl<T> Ticket<T> {
    /// Sessions in line before this one when the ticket was issued
    pub fn ahead(&self) -> usize {
        self.ahead
    }

    /// Block until this ticket's turn, run `f` with exclusive access, then
    /// release the turn (also on unwind).
    pub fn run<R>(mut self, f: impl FnOnce(&mut T) -> R) -> R {
        self.redeemed = true;
        let queue = Arc::clone(&self.queue);

        queue.wait_for_turn(self.number);
        let _turn = TurnRelease {
            queue: &queue,
            number: self.number,
        };

        let mut resource = lock(&queue.resource);
        f(&mut *resource)
    }
}

impl<T> Drop for Ticket<T> {
    fn drop(&mut self) {
        if !self.redeemed {
            self.queue.forfeit(self.number);
        }
    }
}

struct TurnRelease<'a, T> {
    queue: &'a SessionQueue<T>,
    number: u64,
}

impl<T> Drop for TurnRelease<'_, T> {
    fn drop(&mut self) {
        self.queue.finish_turn(self.number);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_runs_in_ticket_order() {
        let queue = Arc::new(SessionQueue::new(Vec::<u32>::new()));

        let first = queue.ticket();
        let second = queue.ticket();
        let third = queue.ticket();

        // Start in reverse order; turns still follow ticket order
        let t3 = std::thread::spawn(move || third.run(|log| log.push(3)));
        let t2 = std::thread::spawn(move || second.run(|log| log.push(2)));
        std::thread::sleep(Duration::from_millis(20));
        first.run(|log| log.push(1));

        t2.join().unwrap();
        t3.join().unwrap();

        queue.ticket().run(|log| assert_eq!(*log, vec![1, 2, 3]));
    }

    #[test]
    fn test_ahead_counts_outstanding_tickets() {
        let queue = Arc::new(SessionQueue::new(()));

        let first = queue.ticket();
        let second = queue.ticket();
        assert_eq!(first.ahead(), 0);
        assert_eq!(second.ahead(), 1);
        assert_eq!(queue.outstanding(), 2);

        first.run(|_| ());
        assert_eq!(queue.outstanding(), 1);
        second.run(|_| ());
        assert_eq!(queue.outstanding(), 0);
    }

    #[test]
    fn test_forfeited_ticket_does_not_block() {
        let queue = Arc::new(SessionQueue::new(0u32));

        let first = queue.ticket();
        let abandoned = queue.ticket();
        let third = queue.ticket();

        drop(abandoned);
        assert_eq!(queue.outstanding(), 2);

        first.run(|n| *n += 1);
        third.run(|n| *n += 1);

        assert_eq!(queue.outstanding(), 0);
        queue.ticket().run(|n| assert_eq!(*n, 2));
    }

    #[test]
    fn test_forfeit_at_head_releases_turn() {
        let queue = Arc::new(SessionQueue::new(()));

        let head = queue.ticket();
        let next = queue.ticket();
        drop(head);

        // Would block forever if the forfeited head kept its turn
        next.run(|_| ());
        assert_eq!(queue.outstanding(), 0);
    }

    #[test]
    fn test_turn_released_after_panic() {
        let queue = Arc::new(SessionQueue::new(0u32));

        let failing = queue.ticket();
        let result = std::thread::spawn(move || {
            failing.run(|_| panic!("session blew up"));
        })
        .join();
        assert!(result.is_err());

        queue.ticket().run(|n| *n += 1);
        queue.ticket().run(|n| assert_eq!(*n, 1));
    }
}
