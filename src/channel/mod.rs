//! The explorers <-> control channel: two bounded queues, and two gates that make the
//! control-to-explorers direction deliver messages in unsplittable pairs.

mod cancel;
mod communication_channel;
mod error;
mod gate;
mod message;
mod queue;

pub use cancel::CancelToken;
pub use communication_channel::{ChannelConfig, CommunicationChannel};
pub use error::ChannelError;
pub use gate::PairingGate;
pub use message::{Message, END, ID};
pub use queue::{BoundedQueue, DEFAULT_CAPACITY};
