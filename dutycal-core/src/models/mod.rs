mod calendar;
mod cycle;
mod history;
mod roster;

pub use calendar::*;
pub use cycle::*;
pub use history::*;
pub use roster::*;
