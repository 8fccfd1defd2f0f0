//! Restart heuristics.
//!
//! Each restart runs under a conflict budget drawn from a Luby sequence.
//! Alongside the budget the engine tracks an agility value (an exponential
//! moving average of how often newly asserted literals flip their saved
//! polarity) and short sliding windows over learnt-clause glue and size.
//! Persistently low agility or an exhausted budget requests a restart, as
//! does the cooperative interrupt flag.

use std::collections::VecDeque;

use crate::config::Config;

/// Exponential moving average of polarity flips.
///
/// Low agility means the search keeps re-assigning variables to their saved
/// polarity, a sign that it is stuck in one region of the search space.
pub struct Agility {
    value: f64,
    decay: f64,
    too_low: u32,
}

impl Agility {
    fn new(decay: f64) -> Self {
        Agility {
            value: 1.0,
            decay,
            too_low: 0,
        }
    }

    /// Folds one observation into the average.
    pub fn update(&mut self, flipped: bool) {
        self.value = self.decay * self.value + if flipped { 1.0 - self.decay } else { 0.0 };
    }

    /// Current agility in `[0, 1]`.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Tracks whether agility stayed below `limit` this conflict.
    ///
    /// Consecutive low-agility conflicts accumulate; one agile conflict
    /// resets the count.
    fn note_conflict(&mut self, limit: f64) {
        if self.value < limit {
            self.too_low += 1;
        } else {
            self.too_low = 0;
        }
    }

    /// Number of consecutive conflicts with agility below the limit.
    pub fn too_low(&self) -> u32 {
        self.too_low
    }

    fn reset(&mut self) {
        self.value = 1.0;
        self.too_low = 0;
    }
}

/// Fixed-capacity sliding window average.
pub struct Window {
    cap: usize,
    items: VecDeque<u64>,
    sum: u64,
}

impl Window {
    fn new(cap: usize) -> Self {
        assert!(cap > 0);
        Window {
            cap,
            items: VecDeque::with_capacity(cap),
            sum: 0,
        }
    }

    /// Appends a value, dropping the oldest once the window is full.
    pub fn push(&mut self, value: u64) {
        if self.items.len() == self.cap {
            self.sum -= self.items.pop_front().expect("window is full");
        }
        self.items.push_back(value);
        self.sum += value;
    }

    /// Average over the window, or zero while empty.
    pub fn avg(&self) -> f64 {
        if self.items.is_empty() {
            0.0
        } else {
            self.sum as f64 / self.items.len() as f64
        }
    }

    fn clear(&mut self) {
        self.items.clear();
        self.sum = 0;
    }
}

/// The Luby restart sequence 1, 1, 2, 1, 1, 2, 4, ...
#[derive(Default)]
struct Luby {
    seq: u64,
    step: u64,
}

impl Luby {
    /// Returns the next element of the sequence.
    fn advance(&mut self) -> u64 {
        if self.seq == 0 {
            self.seq = 1;
            self.step = 1;
            return 1;
        }
        if self.seq & self.seq.wrapping_neg() == self.step {
            self.seq += 1;
            self.step = 1;
        } else {
            self.step *= 2;
        }
        self.step
    }
}

/// Per-restart bookkeeping and the restart decision.
pub struct Restarts {
    /// Agility tracker, reset at every restart.
    pub agility: Agility,
    /// Sliding window over learnt-clause glue values.
    pub glue_window: Window,
    /// Sliding window over learnt-clause sizes.
    pub size_window: Window,
    /// Conflicts handled during the current restart.
    pub conflicts_done: u64,
    /// Conflict budget of the current restart.
    pub conflicts_to_do: u64,
    luby: Luby,
    scale: u64,
    agility_limit: f64,
    too_low_limit: u32,
}

impl Restarts {
    /// Creates restart state from the engine configuration.
    pub fn new(config: &Config) -> Self {
        let mut restarts = Restarts {
            agility: Agility::new(config.agility_decay),
            glue_window: Window::new(config.glue_window),
            size_window: Window::new(config.size_window),
            conflicts_done: 0,
            conflicts_to_do: 0,
            luby: Luby::default(),
            scale: config.restart_scale,
            agility_limit: config.agility_limit,
            too_low_limit: config.agility_too_low_limit,
        };
        restarts.begin();
        restarts
    }

    /// Starts a new restart: draws the next conflict budget and clears the
    /// per-restart trackers.
    pub fn begin(&mut self) {
        self.conflicts_done = 0;
        self.conflicts_to_do = self.luby.advance() * self.scale;
        self.glue_window.clear();
        self.size_window.clear();
        self.agility.reset();
    }

    /// Records a handled conflict.
    ///
    /// `flipped` reports whether the conflict's asserting literal differs
    /// from its variable's saved polarity.
    pub fn on_conflict(&mut self, glue: u32, size: usize, flipped: bool) {
        self.conflicts_done += 1;
        self.glue_window.push(glue as u64);
        self.size_window.push(size as u64);
        self.agility.update(flipped);
        self.agility.note_conflict(self.agility_limit);
    }

    /// Whether the current restart should end.
    pub fn wants_restart(&self, interrupted: bool) -> bool {
        interrupted
            || self.agility.too_low() > self.too_low_limit
            || self.conflicts_done > self.conflicts_to_do
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luby_prefix() {
        let mut luby = Luby::default();
        let prefix: Vec<u64> = (0..15).map(|_| luby.advance()).collect();
        assert_eq!(prefix, [1, 1, 2, 1, 1, 2, 4, 1, 1, 2, 1, 1, 2, 4, 8]);
    }

    #[test]
    fn window_average() {
        let mut window = Window::new(3);
        assert_eq!(window.avg(), 0.0);
        window.push(2);
        window.push(4);
        assert_eq!(window.avg(), 3.0);
        window.push(6);
        window.push(8); // evicts 2
        assert_eq!(window.avg(), 6.0);
    }

    #[test]
    fn low_agility_requests_restart() {
        let config = Config {
            agility_decay: 0.5,
            agility_limit: 0.3,
            agility_too_low_limit: 2,
            restart_scale: 1_000_000,
            ..Config::default()
        };
        let mut restarts = Restarts::new(&config);

        assert!(!restarts.wants_restart(false));
        // No flips: agility decays quickly below the limit.
        for _ in 0..10 {
            restarts.on_conflict(2, 5, false);
        }
        assert!(restarts.agility.value() < 0.3);
        assert!(restarts.agility.too_low() > 2);
        assert!(restarts.wants_restart(false));

        restarts.begin();
        assert!(!restarts.wants_restart(false));
        assert!(restarts.wants_restart(true));
    }

    #[test]
    fn budget_requests_restart() {
        let config = Config {
            restart_scale: 3,
            ..Config::default()
        };
        let mut restarts = Restarts::new(&config);
        for _ in 0..4 {
            restarts.on_conflict(1, 2, true);
        }
        assert!(restarts.wants_restart(false));
    }
}
