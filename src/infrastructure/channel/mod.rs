//! Message channel adapters

mod loopback;
mod packet;
#[cfg(unix)]
mod unix_socket;

pub use loopback::{HostEndpoint, LoopbackChannel};
pub use packet::{read_packet, write_packet, Packet, PacketError};
#[cfg(unix)]
pub use unix_socket::UnixSocketChannel;
