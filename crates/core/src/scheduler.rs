/// Logical clock for everything the original design expressed as awaited
/// sleeps. Hosts drive it via `GameSession::tick`; tests run the state
/// machine without real time passing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledAction {
    EnemyThink,
}

#[derive(Debug, Clone)]
struct Scheduled {
    id: TimerId,
    due: u64,
    action: ScheduledAction,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    now: u64,
    next_id: u64,
    queue: Vec<Scheduled>,
}

impl Scheduler {
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn schedule(&mut self, delay: u64, action: ScheduledAction) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.queue.push(Scheduled {
            id,
            due: self.now + delay,
            action,
        });
        id
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|entry| entry.id != id);
        self.queue.len() != before
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.queue.iter().any(|entry| entry.id == id)
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Advance one tick and return the actions that came due, in schedule
    /// order.
    pub fn advance(&mut self) -> Vec<ScheduledAction> {
        self.now += 1;
        let now = self.now;
        let mut fired = Vec::new();
        self.queue.retain(|entry| {
            if entry.due <= now {
                fired.push(entry.action);
                false
            } else {
                true
            }
        });
        fired
    }
}
