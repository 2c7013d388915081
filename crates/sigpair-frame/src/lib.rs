//! Length-prefixed framing for the sigpair interop rig.
//!
//! Every message on the wire is a 2-byte big-endian length followed by
//! exactly that many payload bytes. Transports may deliver those bytes in
//! any chunking they like; [`FrameDecoder`] reassembles complete frames and
//! never exposes a partial one.
//!
//! Reassembled frames cross from the delivery context (a reader thread or a
//! transport callback) to the test context through a bounded [`inbox`].

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod delivery;
pub mod error;
pub mod inbox;
pub mod reassembly;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::FrameCodec;
pub use codec::{encode, encode_frame, Frame, FrameConfig, HEADER_SIZE, MAX_PAYLOAD};
pub use delivery::{spawn_stream_delivery, DeliveryContext, DeliveryEnd, DeliveryReport};
pub use error::{FrameError, Result};
pub use inbox::{
    inbox, Delivery, DropReason, InboxCloser, InboxConfig, InboxReceiver, InboxSender, InboxStats,
    PopError,
};
pub use reassembly::{DecoderStats, Feed, FrameDecoder, ReassemblyState};
pub use writer::FrameWriter;
