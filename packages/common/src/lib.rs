pub mod academic;
pub mod grading;
pub mod kind;
pub mod realtime;
pub mod storage;

pub use academic::{ClassPeriod, CourseworkKind, Gender, RoutineDay, Shift, TimeSlot, Weekday};
pub use kind::{MessageKind, ResourceKind};
