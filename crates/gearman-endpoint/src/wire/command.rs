//! Command encoder: turns an outbound verb and payload into wire bytes.

/// Magic four bytes that open every request frame sent to the job server.
const REQ_MAGIC: [u8; 4] = *b"\0REQ";

/// Outbound verbs the endpoint itself emits. Submission packets (`submit_…`)
/// are produced by the task, not by this encoder; the endpoint writes their
/// bytes verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    OptionReq,
    CanDo,
    GrabJob,
    PreSleep,
    WorkStatus,
    WorkComplete,
    WorkFail,
}

impl Verb {
    fn code(self) -> u32 {
        match self {
            Verb::CanDo => 1,
            Verb::PreSleep => 4,
            Verb::GrabJob => 9,
            Verb::WorkStatus => 12,
            Verb::WorkComplete => 13,
            Verb::WorkFail => 14,
            Verb::OptionReq => 26,
        }
    }
}

/// Serialize `verb` with `payload` into a single wire frame.
pub fn pack(verb: Verb, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(12 + payload.len());
    out.extend_from_slice(&REQ_MAGIC);
    out.extend_from_slice(&verb.code().to_be_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// Join several arguments with the protocol's `\0` separator.
pub fn join(args: &[&[u8]]) -> Vec<u8> {
    args.join(&0u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_frames_header_correctly() {
        let bytes = pack(Verb::CanDo, b"reverse");
        assert_eq!(&bytes[0..4], b"\0REQ");
        assert_eq!(u32::from_be_bytes(bytes[4..8].try_into().unwrap()), 1);
        assert_eq!(u32::from_be_bytes(bytes[8..12].try_into().unwrap()), 7);
        assert_eq!(&bytes[12..], b"reverse");
    }

    #[test]
    fn join_separates_with_nul() {
        assert_eq!(join(&[b"a", b"b", b"c"]), b"a\0b\0c");
    }
}
