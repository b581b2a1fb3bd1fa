//! Remote command channel for tvremote.
//!
//! This crate defines the [`CommandChannel`] contract consumed by the key
//! repeat dispatcher and the gesture recognizer: one best-effort delivery
//! attempt per command, with the remote's reply observed asynchronously.
//! [`RemoteChannel`] implements it on top of a request/response
//! [`Transport`]; the transport itself is an external collaborator.

use std::future::Future;
use std::pin::Pin;

use tvremote_types::RemoteCommand;

pub mod emitter;
pub mod error;
pub mod loopback;
#[cfg(feature = "mock")]
pub mod mock;
pub mod remote;
pub mod status;
pub mod wire;

pub use emitter::Emitter;
pub use error::ChannelError;
pub use loopback::LoopbackTransport;
pub use remote::{RemoteChannel, Transport};
pub use status::{Connectivity, LinkStatus};
pub use wire::{Ack, WireRequest};

/// The remote's reply to one issued command, resolved asynchronously.
pub type PendingAck = Pin<Box<dyn Future<Output = Result<Ack, ChannelError>> + Send + 'static>>;

/// Delivers commands to the remote device.
///
/// `issue` starts exactly one delivery attempt before it returns. The
/// returned future only observes the reply; dropping it does not cancel the
/// delivery. No retries, no queueing, and no ordering guarantee between two
/// deliveries in flight.
pub trait CommandChannel: Send + Sync + 'static {
    /// Start delivering `command`.
    fn issue(&self, command: RemoteCommand) -> PendingAck;
}
