// Interface adapters layer: wire protocol, shared state, and the peer
// transport for both roles.

pub mod net;
pub mod protocol;
pub mod state;
pub mod utils;
