/// Configuration for building and running a world.
#[derive(Debug, Clone)]
pub struct WorldConfig {
    /// RNG seed; every level seed is drawn from it.
    pub seed: u64,
    /// Width and height of every level, in tiles.
    pub world_size: i32,
    /// Maximum event log size (oldest events dropped when exceeded). 0 = unlimited.
    pub max_events: usize,
    /// Numerator of the spawn throttle curve.
    pub spawn_factor: u32,
    /// Candidate positions tried per spawn invocation.
    pub spawn_attempts: u32,
    /// Anchor samples tried before a structure placement gives up.
    pub placement_attempts: u32,
    /// Eviction draws allowed per active entity before a stall is reported.
    pub eviction_attempt_factor: u32,
    /// Ticks in one day.
    pub day_length: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            world_size: 128,
            max_events: 0,
            spawn_factor: 100,
            spawn_attempts: 15,
            placement_attempts: 512,
            eviction_attempt_factor: 8,
            day_length: 64_800,
        }
    }
}

impl WorldConfig {
    /// Set the RNG seed for deterministic generation and ticking.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the level edge length in tiles.
    pub fn with_world_size(mut self, size: i32) -> Self {
        self.world_size = size;
        self
    }

    /// Set the maximum event log size (0 = unlimited).
    pub fn with_max_events(mut self, max: usize) -> Self {
        self.max_events = max;
        self
    }

    /// Set the spawn throttle factor.
    pub fn with_spawn_factor(mut self, factor: u32) -> Self {
        self.spawn_factor = factor;
        self
    }

    /// Set the candidate positions tried per spawn invocation.
    pub fn with_spawn_attempts(mut self, attempts: u32) -> Self {
        self.spawn_attempts = attempts;
        self
    }

    /// Set the anchor samples allowed per structure.
    pub fn with_placement_attempts(mut self, attempts: u32) -> Self {
        self.placement_attempts = attempts;
        self
    }

    /// Set the eviction draws allowed per active entity.
    pub fn with_eviction_attempt_factor(mut self, factor: u32) -> Self {
        self.eviction_attempt_factor = factor;
        self
    }

    /// Set the number of ticks in one day.
    pub fn with_day_length(mut self, ticks: u64) -> Self {
        self.day_length = ticks;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let config = WorldConfig::default();
        assert_eq!(config.seed, 42);
        assert_eq!(config.world_size, 128);
        assert_eq!(config.max_events, 0);
        assert_eq!(config.spawn_factor, 100);
        assert_eq!(config.spawn_attempts, 15);
        assert_eq!(config.day_length, 64_800);
    }

    #[test]
    fn config_builder_chain() {
        let config = WorldConfig::default()
            .with_seed(123)
            .with_world_size(64)
            .with_max_events(500)
            .with_placement_attempts(32)
            .with_eviction_attempt_factor(2);
        assert_eq!(config.seed, 123);
        assert_eq!(config.world_size, 64);
        assert_eq!(config.max_events, 500);
        assert_eq!(config.placement_attempts, 32);
        assert_eq!(config.eviction_attempt_factor, 2);
    }
}
