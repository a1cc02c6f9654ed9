//! QR rendering collaborator.
//!
//! The encoder is opaque to the rest of the crate: it gets the short URL and
//! an optional icon and hands back PNG bytes, or nothing.

pub trait QrEncoder: Send + Sync {
    fn encode(&self, text: &str, icon: Option<&[u8]>) -> Option<Vec<u8>>;
}

/// Encoder used when no renderer is linked in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullQrEncoder;

impl QrEncoder for NullQrEncoder {
    fn encode(&self, _text: &str, _icon: Option<&[u8]>) -> Option<Vec<u8>> {
        None
    }
}
