//! Wire framing and packet catalog.
pub mod command;
pub mod framer;
pub mod packet;

pub use command::{pack, Verb};
pub use framer::Framer;
pub use packet::{Packet, PacketType};
