pub mod codec;
pub mod forwarding;
pub mod framing;
pub mod transport;

pub use codec::HickoryDnsCodec;
pub use forwarding::DnsForwarder;
pub use framing::{read_frame, write_frame, FrameRead, MAX_FRAME_LEN};
