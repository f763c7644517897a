use std::collections::HashMap;

use rand::Rng;
use rand::rngs::StdRng;

use crate::clock::DayClock;
use crate::error::SimResult;
use crate::event::{EventLog, SimEventKind};
use crate::settings::{AmbientMode, Settings};

/// Context handed to a trigger when a level runs its ambient step.
pub struct TriggerContext<'a> {
    /// Depth of the level being ticked.
    pub depth: i32,
    /// World clock.
    pub clock: &'a DayClock,
    /// Session settings.
    pub settings: &'a dyn Settings,
    /// World event log.
    pub events: &'a mut EventLog,
    /// Level RNG.
    pub rng: &'a mut StdRng,
}

impl TriggerContext<'_> {
    /// Emit a simulation event at the current tick.
    pub fn emit(&mut self, kind: SimEventKind, description: impl Into<String>) {
        self.events.emit(self.clock.tick(), kind, description);
    }
}

/// A pluggable ambient hook run once per full level tick.
///
/// Triggers run in registration order, after pending adds are resolved and
/// before tiles and entities are ticked.
pub trait Trigger: std::fmt::Debug {
    /// Human-readable name for this trigger.
    fn name(&self) -> &str;

    /// Called once per full tick of each level.
    fn tick(&mut self, ctx: &mut TriggerContext<'_>) -> SimResult<()>;

    /// Support downcasting to concrete types.
    fn as_any(&self) -> &dyn std::any::Any;

    /// Support downcasting to concrete types.
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

/// Ticks between ambient cues.
pub const MUSIC_PERIOD: u32 = 16_000;

/// Picks an ambient track per level every [`MUSIC_PERIOD`] ticks.
#[derive(Debug)]
pub struct MusicTrigger {
    counters: HashMap<i32, u32>,
    period: u32,
}

impl Default for MusicTrigger {
    fn default() -> Self {
        Self::new()
    }
}

impl MusicTrigger {
    /// A trigger with every counter at zero.
    pub fn new() -> Self {
        Self {
            counters: HashMap::new(),
            period: MUSIC_PERIOD,
        }
    }

    /// Set the number of ticks between cues.
    pub fn with_period(mut self, period: u32) -> Self {
        self.period = period.max(1);
        self
    }

    /// Ticks counted so far on the level at `depth`.
    pub fn counter(&self, depth: i32) -> u32 {
        self.counters.get(&depth).copied().unwrap_or(0)
    }
}

fn tracks(depth: i32, mode: AmbientMode) -> &'static [&'static str] {
    match (depth, mode) {
        (0, AmbientMode::Scary) => &["Surface Theme", "Night Howl"],
        (0, _) => &["Surface Theme", "Peaceful Meadow"],
        (-1 | -2, _) => &["Cave Ambience", "Dripping Stone"],
        (-3, _) => &["Lava Rumble"],
        (-4, _) => &["Dungeon Hum"],
        (1, _) => &["Sky Winds"],
        _ => &["Void Hum"],
    }
}

impl Trigger for MusicTrigger {
    fn name(&self) -> &str {
        "music"
    }

    fn tick(&mut self, ctx: &mut TriggerContext<'_>) -> SimResult<()> {
        let mode = ctx.settings.ambient();
        if mode == AmbientMode::Off {
            return Ok(());
        }
        let counter = self.counters.entry(ctx.depth).or_insert(0);
        *counter += 1;
        if *counter < self.period {
            return Ok(());
        }
        *counter = 0;
        let choices = tracks(ctx.depth, mode);
        let track = choices[ctx.rng.random_range(0..choices.len())];
        let depth = ctx.depth;
        ctx.emit(
            SimEventKind::AmbientCue {
                depth,
                track: track.to_string(),
            },
            format!("playing \"{track}\""),
        );
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MapSettings;
    use rand::SeedableRng;

    fn run(trigger: &mut MusicTrigger, settings: &MapSettings, depth: i32, ticks: u32, events: &mut EventLog) {
        let clock = DayClock::default();
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..ticks {
            let mut ctx = TriggerContext {
                depth,
                clock: &clock,
                settings,
                events: &mut *events,
                rng: &mut rng,
            };
            trigger.tick(&mut ctx).unwrap();
        }
    }

    #[test]
    fn silent_when_ambient_is_off() {
        let mut trigger = MusicTrigger::new().with_period(10);
        let mut events = EventLog::new(0);
        run(&mut trigger, &MapSettings::new(), 0, 50, &mut events);
        assert!(events.is_empty());
        assert_eq!(trigger.counter(0), 0);
    }

    #[test]
    fn cues_once_per_period() {
        let mut trigger = MusicTrigger::new().with_period(10);
        let settings = MapSettings::new().with_ambient(AmbientMode::Nice);
        let mut events = EventLog::new(0);
        run(&mut trigger, &settings, -1, 25, &mut events);
        assert_eq!(events.len(), 2);
        assert_eq!(trigger.counter(-1), 5);
        assert!(matches!(
            &events.events()[0].kind,
            SimEventKind::AmbientCue { depth: -1, track } if track == "Cave Ambience" || track == "Dripping Stone"
        ));
    }

    #[test]
    fn counters_are_per_level() {
        let mut trigger = MusicTrigger::new().with_period(100);
        let settings = MapSettings::new().with_ambient(AmbientMode::Scary);
        let mut events = EventLog::new(0);
        run(&mut trigger, &settings, 0, 30, &mut events);
        run(&mut trigger, &settings, -4, 7, &mut events);
        assert_eq!(trigger.counter(0), 30);
        assert_eq!(trigger.counter(-4), 7);
    }

    #[test]
    fn default_period() {
        assert_eq!(MusicTrigger::default().period, MUSIC_PERIOD);
        assert_eq!(MusicTrigger::new().name(), "music");
    }
}
