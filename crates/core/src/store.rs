use crate::{GameSnapshot, GameState, RuntimeFlags};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Mutation metadata carried on every frame. The suppress flags are
/// advisory and honored only by the originating store, never by a replay
/// consumer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FrameMeta {
    pub label: String,
    #[serde(default)]
    pub suppress_history: bool,
    #[serde(default)]
    pub suppress_log: bool,
}

impl FrameMeta {
    pub fn label(label: &str) -> Self {
        Self {
            label: label.to_string(),
            ..Self::default()
        }
    }

    /// Excluded from the undo timeline and the action log.
    pub fn transient(label: &str) -> Self {
        Self {
            label: label.to_string(),
            suppress_history: true,
            suppress_log: true,
        }
    }
}

/// Replay/history interchange record. `seq` is the store's logical
/// timestamp (a monotonic mutation counter).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReplayFrame {
    pub snapshot: GameSnapshot,
    pub meta: FrameMeta,
    pub seq: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplayOptions {
    /// Inter-frame pacing hint in ticks; the host decides what it means.
    pub frame_delay: u32,
    pub looped: bool,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self {
            frame_delay: 1,
            looped: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordingOptions {
    /// Capture the current snapshot as the first frame.
    pub include_current: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionLogEntry {
    pub seq: u64,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Bounded undo/redo history. The cursor always points at the frame whose
/// snapshot equals the live state.
#[derive(Debug, Default)]
struct TimelineTracker {
    frames: VecDeque<ReplayFrame>,
    cursor: usize,
    limit: usize,
}

impl TimelineTracker {
    fn new(limit: usize) -> Self {
        Self {
            frames: VecDeque::new(),
            cursor: 0,
            limit: limit.max(2),
        }
    }

    fn push(&mut self, frame: ReplayFrame) {
        // A new mutation discards the redo branch.
        self.frames.truncate(self.cursor + 1);
        self.frames.push_back(frame);
        while self.frames.len() > self.limit {
            self.frames.pop_front();
        }
        self.cursor = self.frames.len() - 1;
    }

    fn seed(&mut self, frame: ReplayFrame) {
        self.frames.clear();
        self.frames.push_back(frame);
        self.cursor = 0;
    }

    fn undo(&mut self) -> Option<&ReplayFrame> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.frames.get(self.cursor)
    }

    fn redo(&mut self) -> Option<&ReplayFrame> {
        if self.cursor + 1 >= self.frames.len() {
            return None;
        }
        self.cursor += 1;
        self.frames.get(self.cursor)
    }

    fn load(&mut self, frames: Vec<ReplayFrame>) {
        self.frames = frames.into();
        while self.frames.len() > self.limit {
            self.frames.pop_front();
        }
        self.cursor = self.frames.len().saturating_sub(1);
    }
}

/// Bounded ring of human-readable mutation labels.
#[derive(Debug, Default)]
struct ActionLogger {
    entries: VecDeque<ActionLogEntry>,
    limit: usize,
}

impl ActionLogger {
    fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    fn append(&mut self, seq: u64, label: &str) {
        self.entries.push_back(ActionLogEntry {
            seq,
            label: label.to_string(),
        });
        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
    }
}

#[derive(Debug)]
struct ReplayCursor {
    frames: Vec<ReplayFrame>,
    index: usize,
    options: ReplayOptions,
}

type Listener = Box<dyn FnMut(&GameSnapshot)>;

/// The single canonical state container. Every mutation publishes a frozen
/// deep-copy snapshot to subscribers and feeds the timeline, the action
/// log and any active recording.
pub struct GameStore {
    state: GameState,
    flags: RuntimeFlags,
    timeline: TimelineTracker,
    logger: ActionLogger,
    recording: Option<Vec<ReplayFrame>>,
    replay: Option<ReplayCursor>,
    subscribers: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    seq: u64,
}

impl GameStore {
    pub fn new(initial: GameState, history_limit: usize, log_limit: usize) -> Self {
        let flags = RuntimeFlags::default();
        let mut timeline = TimelineTracker::new(history_limit);
        timeline.seed(ReplayFrame {
            snapshot: GameSnapshot {
                state: initial.clone(),
                flags,
            },
            meta: FrameMeta::label("init"),
            seq: 0,
        });
        Self {
            state: initial,
            flags,
            timeline,
            logger: ActionLogger::new(log_limit),
            recording: None,
            replay: None,
            subscribers: Vec::new(),
            next_subscription: 0,
            seq: 0,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn flags(&self) -> RuntimeFlags {
        self.flags
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            state: self.state.clone(),
            flags: self.flags,
        }
    }

    /// Apply a mutator to the live state, then publish.
    pub fn update(
        &mut self,
        meta: FrameMeta,
        mutator: impl FnOnce(&mut GameState, &mut RuntimeFlags),
    ) {
        mutator(&mut self.state, &mut self.flags);
        self.finish_mutation(meta);
    }

    /// Replace the live state wholesale, then publish.
    pub fn set_state(&mut self, state: GameState, meta: FrameMeta) {
        self.state = state;
        self.finish_mutation(meta);
    }

    fn finish_mutation(&mut self, meta: FrameMeta) {
        self.seq += 1;
        let snapshot = self.snapshot();
        let frame = ReplayFrame {
            snapshot: snapshot.clone(),
            meta: meta.clone(),
            seq: self.seq,
        };
        if !meta.suppress_history {
            self.timeline.push(frame.clone());
        }
        if let Some(recording) = self.recording.as_mut() {
            recording.push(frame);
        }
        if !meta.suppress_log {
            self.logger.append(self.seq, &meta.label);
        }
        log::trace!("store mutation #{} [{}]", self.seq, meta.label);
        self.publish(&snapshot);
    }

    fn publish(&mut self, snapshot: &GameSnapshot) {
        for (_, listener) in self.subscribers.iter_mut() {
            listener(snapshot);
        }
    }

    /// Register a listener; it immediately receives the current snapshot.
    pub fn subscribe(&mut self, mut listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        listener(&self.snapshot());
        self.subscribers.push((id, listener));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    /// Move the timeline pointer one frame back and republish it as the
    /// current state. Pure state replacement: no logic is re-run and flags
    /// are restored exactly as captured.
    pub fn undo(&mut self) -> bool {
        let Some(frame) = self.timeline.undo() else {
            return false;
        };
        let snapshot = frame.snapshot.clone();
        self.state = snapshot.state.clone();
        self.flags = snapshot.flags;
        self.publish(&snapshot);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(frame) = self.timeline.redo() else {
            return false;
        };
        let snapshot = frame.snapshot.clone();
        self.state = snapshot.state.clone();
        self.flags = snapshot.flags;
        self.publish(&snapshot);
        true
    }

    /// Replace the whole timeline and jump to its last frame.
    pub fn load_history(&mut self, frames: Vec<ReplayFrame>) -> bool {
        if frames.is_empty() {
            return false;
        }
        self.timeline.load(frames);
        let Some(frame) = self.timeline.frames.get(self.timeline.cursor) else {
            return false;
        };
        let snapshot = frame.snapshot.clone();
        self.state = snapshot.state.clone();
        self.flags = snapshot.flags;
        self.publish(&snapshot);
        true
    }

    /// Start an independent recording session. Frames accumulate until
    /// `stop_recording`, regardless of history suppression.
    pub fn start_recording(&mut self, options: RecordingOptions) {
        let mut frames = Vec::new();
        if options.include_current {
            frames.push(ReplayFrame {
                snapshot: self.snapshot(),
                meta: FrameMeta::label("recording-start"),
                seq: self.seq,
            });
        }
        self.recording = Some(frames);
    }

    pub fn stop_recording(&mut self) -> Option<Vec<ReplayFrame>> {
        self.recording.take()
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// Begin stepping through a frame list. Each `replay_step` republishes
    /// the next frame as current state; the configured frame delay is a
    /// pacing hint for the host.
    pub fn start_replay(&mut self, frames: Vec<ReplayFrame>, options: ReplayOptions) -> bool {
        if frames.is_empty() {
            return false;
        }
        self.replay = Some(ReplayCursor {
            frames,
            index: 0,
            options,
        });
        true
    }

    /// Publish the next replay frame. Returns false once the replay is
    /// exhausted (or was never started); a looping replay never exhausts.
    pub fn replay_step(&mut self) -> bool {
        let Some(replay) = self.replay.as_mut() else {
            return false;
        };
        if replay.index >= replay.frames.len() {
            if replay.options.looped {
                replay.index = 0;
            } else {
                self.replay = None;
                return false;
            }
        }
        let snapshot = replay.frames[replay.index].snapshot.clone();
        replay.index += 1;
        let finished = replay.index >= replay.frames.len() && !replay.options.looped;
        self.state = snapshot.state.clone();
        self.flags = snapshot.flags;
        self.publish(&snapshot);
        if finished {
            self.replay = None;
        }
        true
    }

    pub fn stop_replay(&mut self) {
        self.replay = None;
    }

    pub fn replay_active(&self) -> bool {
        self.replay.is_some()
    }

    pub fn replay_frame_delay(&self) -> Option<u32> {
        self.replay.as_ref().map(|replay| replay.options.frame_delay)
    }

    pub fn history_len(&self) -> usize {
        self.timeline.frames.len()
    }

    pub fn action_log(&self) -> impl Iterator<Item = &ActionLogEntry> {
        self.logger.entries.iter()
    }
}

impl std::fmt::Debug for GameStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameStore")
            .field("seq", &self.seq)
            .field("history_len", &self.timeline.frames.len())
            .field("subscribers", &self.subscribers.len())
            .field("recording", &self.recording.is_some())
            .field("replay", &self.replay.is_some())
            .finish()
    }
}
