use tw_core::entity::Eid;

/// What kind of simulation event occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEventKind {
    // Bootstrap
    /// A level finished generating.
    LevelGenerated {
        /// Depth of the new level.
        depth: i32,
    },
    /// A structure footprint was stamped onto a level.
    StructurePlaced {
        /// Depth of the level.
        depth: i32,
        /// Structure name.
        structure: String,
        /// Anchor column.
        x: i32,
        /// Anchor row.
        y: i32,
    },
    /// A structure could not be placed within its attempt bound.
    PlacementFailed {
        /// Depth of the level.
        depth: i32,
        /// Structure name.
        structure: String,
        /// Anchors sampled before giving up.
        attempts: u32,
    },

    // Population
    /// A mob was spawned by the planner or a spawner block.
    Spawned {
        /// Depth of the level.
        depth: i32,
        /// The new mob.
        entity: Eid,
        /// Species display name.
        species: String,
    },
    /// A mob was removed to bring the population under the cap.
    Evicted {
        /// Depth of the level.
        depth: i32,
        /// The evicted mob.
        entity: Eid,
    },
    /// Eviction ran out of attempts with the population still over the cap.
    EvictionStall {
        /// Depth of the level.
        depth: i32,
        /// Mob count left after eviction.
        mob_count: u32,
        /// The cap that could not be reached.
        max_mob_count: u32,
    },
    /// A mob's health reached zero or its lifetime ran out.
    EntityDied {
        /// Depth of the level.
        depth: i32,
        /// The mob.
        entity: Eid,
        /// Why it went away.
        cause: String,
    },

    // Faults
    /// An entity's behaviour failed; the entity was skipped for this tick.
    EntityFault {
        /// Depth of the level.
        depth: i32,
        /// The failing entity.
        entity: Eid,
        /// Error text.
        message: String,
    },

    // Interaction
    /// A player unlocked a dungeon chest.
    ChestUnlocked {
        /// Depth of the level.
        depth: i32,
        /// The chest.
        entity: Eid,
        /// Locked chests left on the level.
        remaining: u32,
    },
    /// The last locked dungeon chest was opened.
    DungeonCleared {
        /// Depth of the level.
        depth: i32,
    },
    /// The player moved between levels.
    LevelChanged {
        /// The player.
        entity: Eid,
        /// Depth left.
        from: i32,
        /// Depth entered.
        to: i32,
    },

    // Ambience
    /// A trigger picked an ambient track to play.
    AmbientCue {
        /// Depth of the level.
        depth: i32,
        /// Track name.
        track: String,
    },

    // Custom
    /// A user-defined event.
    Custom {
        /// A label identifying the custom event type.
        label: String,
        /// The entities involved in this custom event.
        entities: Vec<Eid>,
    },
}

impl SimEventKind {
    /// Check whether a given entity is involved in this event.
    pub fn involves(&self, id: Eid) -> bool {
        match self {
            Self::Spawned { entity, .. }
            | Self::Evicted { entity, .. }
            | Self::EntityDied { entity, .. }
            | Self::EntityFault { entity, .. }
            | Self::ChestUnlocked { entity, .. }
            | Self::LevelChanged { entity, .. } => *entity == id,
            Self::Custom { entities, .. } => entities.contains(&id),
            _ => false,
        }
    }

    /// Depth of the level the event happened on, if it is tied to one.
    pub fn depth(&self) -> Option<i32> {
        match self {
            Self::LevelGenerated { depth }
            | Self::StructurePlaced { depth, .. }
            | Self::PlacementFailed { depth, .. }
            | Self::Spawned { depth, .. }
            | Self::Evicted { depth, .. }
            | Self::EvictionStall { depth, .. }
            | Self::EntityDied { depth, .. }
            | Self::EntityFault { depth, .. }
            | Self::ChestUnlocked { depth, .. }
            | Self::DungeonCleared { depth }
            | Self::AmbientCue { depth, .. } => Some(*depth),
            Self::LevelChanged { to, .. } => Some(*to),
            Self::Custom { .. } => None,
        }
    }

    /// Short label used when summarising events.
    pub fn label(&self) -> &str {
        match self {
            Self::LevelGenerated { .. } => "level generated",
            Self::StructurePlaced { .. } => "structure placed",
            Self::PlacementFailed { .. } => "placement failed",
            Self::Spawned { .. } => "spawned",
            Self::Evicted { .. } => "evicted",
            Self::EvictionStall { .. } => "eviction stall",
            Self::EntityDied { .. } => "died",
            Self::EntityFault { .. } => "entity fault",
            Self::ChestUnlocked { .. } => "chest unlocked",
            Self::DungeonCleared { .. } => "dungeon cleared",
            Self::LevelChanged { .. } => "level changed",
            Self::AmbientCue { .. } => "ambient cue",
            Self::Custom { label, .. } => label,
        }
    }
}

/// A record of something that happened during simulation.
#[derive(Debug, Clone)]
pub struct SimEvent {
    /// The simulation tick when this event occurred.
    pub tick: u64,
    /// The specific kind of event that occurred.
    pub kind: SimEventKind,
    /// A human-readable description of the event.
    pub description: String,
}

impl SimEvent {
    /// Create a new simulation event with the given tick, kind, and description.
    pub fn new(tick: u64, kind: SimEventKind, description: impl Into<String>) -> Self {
        Self {
            tick,
            kind,
            description: description.into(),
        }
    }
}

/// Accumulates events during a simulation run.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<SimEvent>,
    max_events: usize,
}

impl EventLog {
    /// Create a new event log with the given maximum capacity (0 = unlimited).
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Vec::new(),
            max_events,
        }
    }

    /// Append an event, dropping the oldest events if the log exceeds its capacity.
    pub fn push(&mut self, event: SimEvent) {
        self.events.push(event);
        if self.max_events > 0 && self.events.len() > self.max_events {
            let drain_count = self.events.len() - self.max_events;
            self.events.drain(..drain_count);
        }
    }

    /// Record an event at the given tick.
    pub fn emit(&mut self, tick: u64, kind: SimEventKind, description: impl Into<String>) {
        self.push(SimEvent::new(tick, kind, description));
    }

    /// Return a slice of all recorded events.
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Return all events that occurred at the given tick.
    pub fn events_at_tick(&self, tick: u64) -> Vec<&SimEvent> {
        self.events.iter().filter(|e| e.tick == tick).collect()
    }

    /// Return all events involving the given entity.
    pub fn events_for_entity(&self, id: Eid) -> Vec<&SimEvent> {
        self.events.iter().filter(|e| e.kind.involves(id)).collect()
    }

    /// Return all events tied to the level at `depth`.
    pub fn events_on_level(&self, depth: i32) -> Vec<&SimEvent> {
        self.events
            .iter()
            .filter(|e| e.kind.depth() == Some(depth))
            .collect()
    }

    /// Count events matching a predicate.
    pub fn count_where(&self, pred: impl Fn(&SimEventKind) -> bool) -> usize {
        self.events.iter().filter(|e| pred(&e.kind)).count()
    }

    /// Return the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Return `true` if no events have been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Remove all recorded events.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}
