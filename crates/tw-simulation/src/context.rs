use crate::clock::DayClock;
use crate::config::WorldConfig;
use crate::event::{EventLog, SimEvent, SimEventKind};
use crate::registry::EntityId;
use crate::settings::{Difficulty, Settings};
use crate::spawn::SpawnPlanner;
use crate::trigger::Trigger;

/// World-wide progress flags that gate spawn tables and structures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorldFlags {
    /// The sky level's boss has been slain.
    pub air_wizard_beaten: bool,
    /// Calm nights spawn fireflies instead of monsters on the surface.
    pub nice_night: bool,
}

/// Mutable context passed to a level for one tick.
pub struct TickContext<'a> {
    /// World clock.
    pub clock: &'a DayClock,
    /// World configuration.
    pub config: &'a WorldConfig,
    /// Settings collaborator.
    pub settings: &'a dyn Settings,
    /// World progress flags; changes are written back by the caller.
    pub flags: WorldFlags,
    /// Spawn tables and limits.
    pub planner: &'a SpawnPlanner,
    /// Ambient triggers, run in order.
    pub triggers: &'a mut [Box<dyn Trigger>],
    /// World event log.
    pub events: &'a mut EventLog,
    /// Entity driven from outside the level tick, skipped by entity dispatch.
    pub controlled: Option<EntityId>,
}

impl TickContext<'_> {
    /// Emit a simulation event at the current tick.
    pub fn emit(&mut self, kind: SimEventKind, description: impl Into<String>) {
        self.events
            .push(SimEvent::new(self.clock.tick(), kind, description));
    }

    /// Current world tick.
    pub fn tick(&self) -> u64 {
        self.clock.tick()
    }

    /// Difficulty as currently configured; re-read every tick.
    pub fn difficulty(&self) -> Difficulty {
        self.settings.difficulty()
    }
}
