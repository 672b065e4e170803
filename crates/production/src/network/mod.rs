//! Network layer: the frame codec and the one-frame-per-connection TCP
//! transport.

mod codec;
mod transport;

pub use codec::{decode_frame, decode_message, encode_message, CodecError, MAX_FRAME_SIZE};
pub use transport::{TcpTransport, TransportError};
