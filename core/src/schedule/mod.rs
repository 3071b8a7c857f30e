pub mod clock;
pub mod frame;
pub mod refresh;
pub mod scheduler;
pub mod state;

pub use clock::{Clock, FixedClock, SystemClock};
pub use frame::FrameCycle;
pub use refresh::RefreshCycle;
pub use scheduler::{Scheduler, SchedulerHandle};
pub use state::{SchedulerPhase, SharedView, ViewOutput, ViewState};
