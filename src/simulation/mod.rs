pub mod clock;
pub mod events;
pub mod snapshot;
pub mod tick;

pub use clock::WorldClock;
pub use events::{EventKind, EventLog, WorldEvent};
pub use snapshot::WorldSnapshot;
pub use tick::{advance, AdvanceReport, StopReason, TickHook};
