//! JSON format.
//!
//! serde over the representation tree, one object per line. The stream
//! deserializer reports exactly how many bytes each object occupied, so
//! sequential writes read back in order like the other codecs.

use fg_core::ReprNode;

use crate::channel::Codec;
use crate::error::{ChannelError, Result};

pub struct JsonCodec;

impl Codec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, node: &ReprNode) -> Result<String> {
        let mut text = serde_json::to_string(node)
            .map_err(|e| ChannelError::Parse(format!("serialize failed: {e}")))?;
        text.push('\n');
        Ok(text)
    }

    fn decode(&self, input: &str) -> Result<(ReprNode, usize)> {
        let mut objects = serde_json::Deserializer::from_str(input).into_iter::<ReprNode>();
        match objects.next() {
            Some(Ok(node)) => Ok((node, objects.byte_offset())),
            Some(Err(e)) => Err(ChannelError::Parse(e.to_string())),
            None => Err(ChannelError::EndOfStream),
        }
    }
}
