pub mod betting;
pub mod pot;
pub mod rules;
pub mod shared;
pub mod state;
pub mod table;

pub use betting::Bounds;
pub use shared::*;
pub use state::{ActionOutcome, HandResult, HandState, WinnerInfo};
pub use table::Table;
