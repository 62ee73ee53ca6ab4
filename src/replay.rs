//! Replay (demo) input streams
//!
//! A replay is three header bytes followed by `(delay, mask)` pairs. The
//! delay says how many 60 Hz frames the *previous* input was held, so the
//! decoder emits the old input state once per 20 Hz tick before applying
//! the new mask.

use crate::common::Direction;

/// Display frames per simulation tick
pub const FRAMES_PER_TICK: u32 = 3;

/// Delay byte that ends the input stream
pub const END_OF_INPUT: u8 = 0xFF;

/// Mask bit marking a second-player record
pub const PLAYER_2_FLAG: u8 = 0x80;

const INPUT_START: usize = 3;

/// One player action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Drop an item
    Drop,
    /// Move down
    Down,
    /// Move left
    Left,
    /// Move right
    Right,
    /// Move up
    Up,
    /// Swap players
    Swap,
    /// Cycle the inventory
    Cycle,
}

impl Action {
    /// Every action, in mask bit order
    pub const ALL: [Action; 7] = [
        Action::Drop,
        Action::Down,
        Action::Left,
        Action::Right,
        Action::Up,
        Action::Swap,
        Action::Cycle,
    ];

    /// Flag for this action in a replay mask
    pub fn flag(self) -> InputSet {
        match self {
            Action::Drop => InputSet::DROP,
            Action::Down => InputSet::DOWN,
            Action::Left => InputSet::LEFT,
            Action::Right => InputSet::RIGHT,
            Action::Up => InputSet::UP,
            Action::Swap => InputSet::SWAP,
            Action::Cycle => InputSet::CYCLE,
        }
    }

    /// Lowercase name
    pub fn name(self) -> &'static str {
        match self {
            Action::Drop => "drop",
            Action::Down => "down",
            Action::Left => "left",
            Action::Right => "right",
            Action::Up => "up",
            Action::Swap => "swap",
            Action::Cycle => "cycle",
        }
    }
}

bitflags::bitflags! {
    /// The set of actions held during one tick
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InputSet: u8 {
        /// Drop an item
        const DROP = 0x01;
        /// Move down
        const DOWN = 0x02;
        /// Move left
        const LEFT = 0x04;
        /// Move right
        const RIGHT = 0x08;
        /// Move up
        const UP = 0x10;
        /// Swap players
        const SWAP = 0x20;
        /// Cycle the inventory
        const CYCLE = 0x40;
    }
}

impl Default for InputSet {
    fn default() -> Self {
        Self::empty()
    }
}

impl InputSet {
    /// Whether `action` is held
    pub fn holds(self, action: Action) -> bool {
        self.contains(action.flag())
    }

    /// Held actions in bit order
    pub fn actions(self) -> impl Iterator<Item = Action> {
        Action::ALL.into_iter().filter(move |a| self.holds(*a))
    }
}

impl FromIterator<Action> for InputSet {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        iter.into_iter().map(Action::flag).collect()
    }
}

/// A recorded solution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replay {
    bytes: Vec<u8>,
    /// Direction force floors start cycling from
    pub initial_force_floor_direction: Direction,
    /// Seed for the blob random number generator
    pub blob_seed: u8,
}

impl Replay {
    /// Wrap raw (inflated) replay bytes
    ///
    /// Missing header bytes read as zero.
    pub fn new(bytes: Vec<u8>) -> Self {
        let header = |i: usize| bytes.get(i).copied().unwrap_or(0);
        // Byte 1 looks like a counter that is allowed to overflow, so only
        // its value mod 4 matters
        let initial_force_floor_direction = Direction::from_index(header(1) as u32);
        let blob_seed = header(2);
        Self {
            bytes,
            initial_force_floor_direction,
            blob_seed,
        }
    }

    /// Raw replay bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Start a fresh pass over the inputs
    pub fn inputs(&self) -> ReplayInputs<'_> {
        ReplayInputs::new(&self.bytes)
    }

    /// Number of ticks the replay lasts
    pub fn tick_count(&self) -> usize {
        self.inputs().count()
    }
}

/// Cursor over a replay's per-tick input states
///
/// Each call to [`advance`](Self::advance) yields the input for the next
/// tick. The cursor is single-pass and cannot be cloned; call
/// [`Replay::inputs`] again to start over.
#[derive(Debug)]
pub struct ReplayInputs<'a> {
    bytes: &'a [u8],
    /// End of the last complete pair
    limit: usize,
    pos: usize,
    frames: u32,
    ticks_pending: u32,
    mask_pending: Option<u8>,
    input: InputSet,
    finished: bool,
}

impl<'a> ReplayInputs<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        // Drop a trailing half pair
        let mut limit = bytes.len();
        if limit % 2 == 0 {
            limit = limit.saturating_sub(1);
        }
        Self {
            bytes,
            limit,
            pos: INPUT_START,
            frames: 0,
            ticks_pending: 0,
            mask_pending: None,
            input: InputSet::empty(),
            finished: false,
        }
    }

    /// Input for the next tick, or `None` once the replay is over
    pub fn advance(&mut self) -> Option<InputSet> {
        loop {
            if self.ticks_pending > 0 {
                self.ticks_pending -= 1;
                return Some(self.input);
            }

            if let Some(mask) = self.mask_pending.take() {
                if mask & PLAYER_2_FLAG != 0 {
                    // TODO: second player records are parsed but not applied
                    log::debug!("Skipping player 2 input 0x{:02x}", mask);
                } else {
                    self.input = InputSet::from_bits_truncate(mask);
                }
            }

            if self.finished || self.pos >= self.limit {
                self.finished = true;
                return None;
            }

            let delay = self.bytes[self.pos];
            if delay == END_OF_INPUT {
                self.finished = true;
                return None;
            }

            self.frames += delay as u32;
            self.ticks_pending = self.frames / FRAMES_PER_TICK;
            self.frames %= FRAMES_PER_TICK;
            self.mask_pending = Some(self.bytes[self.pos + 1]);
            self.pos += 2;
        }
    }
}

impl Iterator for ReplayInputs<'_> {
    type Item = InputSet;

    fn next(&mut self) -> Option<InputSet> {
        self.advance()
    }
}
