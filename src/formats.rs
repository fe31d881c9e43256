//! Content formats.

use crate::error::Error;
use crate::handlers::Marshaler;
use ssb_proto::{KnownContent, RawContent};

/// Marshals known content as JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMarshaler;

impl JsonMarshaler {
    /// Decode content previously produced by [`Marshaler::marshal`].
    pub fn unmarshal(&self, raw: &RawContent) -> Result<KnownContent, Error> {
        KnownContent::unmarshal(raw).map_err(Error::Marshal)
    }
}

impl Marshaler for JsonMarshaler {
    fn marshal(&self, content: &KnownContent) -> Result<RawContent, Error> {
        content.marshal().map_err(Error::Marshal)
    }
}
