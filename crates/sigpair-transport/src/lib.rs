//! Byte transports for the sigpair interop rig.
//!
//! The framing layer only needs two things from a transport: a way to push
//! bytes out ([`Transport::send`]) and a way to be handed raw chunks as they
//! arrive. Stream transports expose the second half through [`std::io::Read`]
//! on an [`IpcStream`]; packet transports call back into the delivery context
//! directly (see [`memory::MemoryTransport`]).

pub mod endpoint;
pub mod error;
pub mod listener;
pub mod memory;
pub mod tcp;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use endpoint::Endpoint;
pub use error::{Result, TransportError};
pub use listener::StreamListener;
pub use memory::{LinkHandle, MemoryTransport};
pub use tcp::TcpEndpoint;
pub use traits::{IpcStream, Transport};

#[cfg(unix)]
pub use uds::UnixDomainSocket;
