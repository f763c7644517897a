use std::fmt;

/// Quarter of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeOfDay {
    /// First quarter.
    Morning,
    /// Second quarter.
    Day,
    /// Third quarter.
    Evening,
    /// Last quarter.
    Night,
}

impl TimeOfDay {
    /// Index of the quarter, `0..4`.
    pub fn index(self) -> u64 {
        match self {
            Self::Morning => 0,
            Self::Day => 1,
            Self::Evening => 2,
            Self::Night => 3,
        }
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Morning => "Morning",
            Self::Day => "Day",
            Self::Evening => "Evening",
            Self::Night => "Night",
        };
        f.write_str(name)
    }
}

/// Tracks world time: a monotonic tick counter and the position within the day.
#[derive(Debug, Clone)]
pub struct DayClock {
    tick: u64,
    day_tick: u64,
    day_length: u64,
    day: u64,
}

impl DayClock {
    /// Create a clock at tick 0, the start of the first morning.
    pub fn new(day_length: u64) -> Self {
        Self {
            tick: 0,
            day_tick: 0,
            day_length: day_length.max(4),
            day: 0,
        }
    }

    /// Advance the clock by one tick. Returns the new tick number.
    pub fn advance(&mut self) -> u64 {
        self.tick += 1;
        self.day_tick += 1;
        if self.day_tick >= self.day_length {
            self.day_tick = 0;
            self.day += 1;
        }
        self.tick
    }

    /// Return the current tick number.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Ticks elapsed since the start of the current day.
    pub fn day_tick(&self) -> u64 {
        self.day_tick
    }

    /// Number of completed days.
    pub fn day(&self) -> u64 {
        self.day
    }

    /// Ticks in one day.
    pub fn day_length(&self) -> u64 {
        self.day_length
    }

    /// Quarter of the day the clock is in.
    pub fn time_of_day(&self) -> TimeOfDay {
        match self.day_tick * 4 / self.day_length {
            0 => TimeOfDay::Morning,
            1 => TimeOfDay::Day,
            2 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    /// Jump to the first tick of the given quarter of the current day.
    pub fn set_time_of_day(&mut self, time: TimeOfDay) {
        self.day_tick = time.index() * self.day_length / 4;
    }
}

impl Default for DayClock {
    fn default() -> Self {
        Self::new(64_800)
    }
}
