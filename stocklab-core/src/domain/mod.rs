//! Domain types for stocklab

pub mod account;
pub mod bar;
pub mod directive;
pub mod fill;
pub mod trajectory;

pub use account::AccountState;
pub use bar::Bar;
pub use directive::{Action, AnnotatedBar, Directive, UnknownAction};
pub use fill::{Fill, FillKind, SkipReason, SkippedDirective};
pub use trajectory::{Trajectory, TrajectoryPoint};
