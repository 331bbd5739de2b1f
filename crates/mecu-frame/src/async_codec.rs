//! `tokio_util::codec` adapter for use with `FramedRead`/`FramedWrite`.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{decode_frame, encode_frame, Frame, FrameConfig};
use crate::error::{FrameError, Result};

/// Frame codec for async byte streams.
#[derive(Debug, Clone, Default)]
pub struct EcuCodec {
    config: FrameConfig,
}

impl EcuCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FrameConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}

impl Decoder for EcuCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>> {
        decode_frame(src, &self.config)
    }
}

impl Encoder<Frame> for EcuCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<()> {
        Encoder::<&Frame>::encode(self, &item, dst)
    }
}

impl<'a> Encoder<&'a Frame> for EcuCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &'a Frame, dst: &mut BytesMut) -> Result<()> {
        if item.payload().len() > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: item.payload().len(),
                max: self.config.max_payload_size,
            });
        }
        encode_frame(item, dst);
        Ok(())
    }
}
