// Domain layer: the simulation core shared by both peers.

pub mod ball;
pub mod history;
pub mod paddle;
pub mod rally;
pub mod resolver;
pub mod rollback;
pub mod spin;
pub mod tuning;
pub mod world;

pub use ball::{BallState, PlayerSide};
pub use history::{HistorySnapshot, SnapshotRing};
pub use paddle::{PaddleState, RemotePaddle};
pub use rally::{Fault, FaultReason, RallyPhase, RallyState};
pub use resolver::{PaddleContact, resolve_paddle_contact};
pub use rollback::{Reconciliation, RollbackManager};
pub use world::{CollisionEvent, RigidBodyWorld};
