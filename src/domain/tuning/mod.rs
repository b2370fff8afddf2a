// Gameplay tuning, kept separate from runtime/server configuration
// (tick rates, channel capacities, etc. live in `frameworks::config`).

pub mod ball;
pub mod paddle;
pub mod spin;
pub mod strike;
pub mod table;

pub use ball::BallTuning;
pub use paddle::PaddleTuning;
pub use spin::SpinTuning;
pub use strike::StrikeTuning;
pub use table::TableTuning;
