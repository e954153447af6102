//! WebSocket transport: topic routing, reconnection, hybrid JSON/binary
//! framing.

pub mod dispatch;
pub mod envelope;
pub mod frame_format;
pub mod reconnect;
pub mod socket;
mod topic;
#[allow(clippy::module_inception)]
mod transport;

pub use dispatch::{Dispatcher, Handler, Subscription};
pub use envelope::Payload;
pub use reconnect::{delay_for_attempt, ReconnectDecision, ReconnectLadder};
pub use transport::{ConnectionState, Transport};
