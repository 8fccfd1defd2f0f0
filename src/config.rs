//! Engine configuration.

/// Tunable parameters of a worker engine.
///
/// The defaults are sensible for general use; workers of one solver usually
/// differ only in `seed`.
#[derive(Clone, Debug)]
pub struct Config {
    /// Seed for the worker's random number generator.
    pub seed: u64,

    /// Probability of making a uniformly random decision instead of an
    /// activity-guided one.
    pub random_var_freq: f64,

    /// Per-conflict decay factor for variable activities, in `(0, 1)`.
    pub var_decay: f64,

    /// Smoothing factor of the agility moving average, in `(0, 1)`.
    pub agility_decay: f64,

    /// Agility below this value counts as a low-agility conflict.
    pub agility_limit: f64,

    /// Number of consecutive low-agility conflicts that requests a restart.
    pub agility_too_low_limit: u32,

    /// Base conflict budget per restart; scaled by the Luby sequence.
    pub restart_scale: u64,

    /// Capacity of the sliding window over learnt-clause glue values.
    pub glue_window: usize,

    /// Capacity of the sliding window over learnt-clause sizes.
    pub size_window: usize,

    /// Upper bound on reported glue values.
    pub max_glue: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            seed: 91_648_253,
            random_var_freq: 0.001,
            var_decay: 0.95,
            agility_decay: 0.9999,
            agility_limit: 0.14,
            agility_too_low_limit: 30,
            restart_scale: 100,
            glue_window: 100,
            size_window: 1000,
            max_glue: 65_534,
        }
    }
}
