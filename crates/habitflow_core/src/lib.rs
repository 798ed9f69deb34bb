pub mod domain;
pub mod ports;

pub use domain::{Habit, HabitCompletion, NewHabit};
pub use ports::{HabitStore, PortError, PortResult};
