//! Response framer: turns a raw byte stream into discrete packets.

use crate::error::Error;
use crate::wire::packet::{Packet, PacketType};

const HEADER_LEN: usize = 12;
const RES_MAGIC: [u8; 4] = *b"\0RES";

/// Maximum payload size we'll buffer for a single frame, guarding against a
/// corrupt or malicious length field forcing unbounded allocation.
const MAX_PAYLOAD_LEN: u32 = 64 * 1024 * 1024;

/// Incremental parser bound to one endpoint's byte stream.
///
/// Bytes arrive in arbitrary chunks via [`Framer::feed`]; complete frames are
/// drained from the front of the internal buffer as soon as they're whole, and
/// any trailing partial frame is kept for the next call.
#[derive(Debug, Default)]
pub struct Framer {
    buf: Vec<u8>,
}

impl Framer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Append `bytes` to the stream and return every packet that became
    /// complete as a result. A malformed header is a protocol violation.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<Packet>, Error> {
        self.buf.extend_from_slice(bytes);

        let mut packets = Vec::new();
        loop {
            if self.buf.len() < HEADER_LEN {
                break;
            }
            if self.buf[0..4] != RES_MAGIC {
                return Err(Error::Protocol(format!(
                    "bad frame magic: {:?}",
                    &self.buf[0..4]
                )));
            }
            let type_code = u32::from_be_bytes(self.buf[4..8].try_into().unwrap());
            let len = u32::from_be_bytes(self.buf[8..12].try_into().unwrap());
            if len > MAX_PAYLOAD_LEN {
                return Err(Error::Protocol(format!("frame too large: {len} bytes")));
            }
            let total = HEADER_LEN + len as usize;
            if self.buf.len() < total {
                break;
            }

            let payload = self.buf[HEADER_LEN..total].to_vec();
            self.buf.drain(..total);

            packets.push(Packet {
                kind: PacketType::from_code(type_code),
                payload,
            });
        }
        Ok(packets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(type_code: u32, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&RES_MAGIC);
        out.extend_from_slice(&type_code.to_be_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn parses_single_frame() {
        let mut framer = Framer::new();
        let packets = framer.feed(&frame(8, b"H:1")).unwrap();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].kind, PacketType::JobCreated);
        assert_eq!(packets[0].payload, b"H:1");
    }

    #[test]
    fn parses_frames_split_across_feeds() {
        let mut framer = Framer::new();
        let bytes = frame(13, b"H:1\0result");

        let first = framer.feed(&bytes[0..5]).unwrap();
        assert!(first.is_empty());

        let second = framer.feed(&bytes[5..]).unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].kind, PacketType::WorkComplete);
    }

    #[test]
    fn parses_multiple_frames_in_one_feed() {
        let mut framer = Framer::new();
        let mut bytes = frame(6, b"");
        bytes.extend_from_slice(&frame(10, b""));

        let packets = framer.feed(&bytes).unwrap();
        assert_eq!(packets.len(), 2);
        assert_eq!(packets[0].kind, PacketType::Noop);
        assert_eq!(packets[1].kind, PacketType::NoJob);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut framer = Framer::new();
        let err = framer.feed(b"XXXX\0\0\0\x08\0\0\0\0").unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    quickcheck::quickcheck! {
        /// However a valid run of frames is chopped into feed() calls, the
        /// decoded (type, payload) sequence comes out the same as feeding it
        /// whole.
        fn split_feeding_matches_whole_feeding(parts: Vec<(u8, Vec<u8>)>, cut: usize) -> bool {
            let parts: Vec<(u8, Vec<u8>)> = parts
                .into_iter()
                .map(|(code, payload)| (code, payload.into_iter().take(64).collect()))
                .take(16)
                .collect();

            let mut whole_bytes = Vec::new();
            for (code, payload) in &parts {
                whole_bytes.extend_from_slice(&frame(*code as u32, payload));
            }

            let expected: Vec<(PacketType, Vec<u8>)> = Framer::new()
                .feed(&whole_bytes)
                .unwrap()
                .into_iter()
                .map(|p| (p.kind, p.payload))
                .collect();

            if whole_bytes.is_empty() {
                return expected.is_empty();
            }
            let cut = cut % whole_bytes.len();

            let mut framer = Framer::new();
            let mut got = framer.feed(&whole_bytes[..cut]).unwrap();
            got.extend(framer.feed(&whole_bytes[cut..]).unwrap());
            let got: Vec<(PacketType, Vec<u8>)> = got.into_iter().map(|p| (p.kind, p.payload)).collect();

            got == expected
        }
    }
}
