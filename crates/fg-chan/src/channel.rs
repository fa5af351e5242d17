//! The persistence front-end.
//!
//! A [`Channel`] wraps a [`StringStream`] and a [`Codec`] strategy. `write`
//! renders an object's representation tree onto the stream; `read` decodes
//! the next object from it. Every codec satisfies the same round-trip
//! contract, so the choice of wire format never leaks into the object model.

use fg_core::{AnyObject, Object, ReprNode, is_known_class, object_from_repr};

use crate::error::{ChannelError, Result};
use crate::json::JsonCodec;
use crate::stream::StringStream;
use crate::text::TextCodec;
use crate::xml::XmlCodec;

/// A wire-format strategy: render one representation tree to text, or decode
/// one from the front of the input, reporting how many bytes it consumed.
pub trait Codec {
    fn name(&self) -> &'static str;
    fn encode(&self, node: &ReprNode) -> Result<String>;
    fn decode(&self, input: &str) -> Result<(ReprNode, usize)>;
}

pub struct Channel {
    stream: StringStream,
    codec: Box<dyn Codec>,
}

impl Channel {
    /// A channel in the native text format.
    pub fn text(stream: StringStream) -> Self {
        Self::with_codec(stream, Box::new(TextCodec))
    }

    /// A channel in the XML format.
    pub fn xml(stream: StringStream) -> Self {
        Self::with_codec(stream, Box::new(XmlCodec))
    }

    /// A channel in the JSON format.
    pub fn json(stream: StringStream) -> Self {
        Self::with_codec(stream, Box::new(JsonCodec))
    }

    pub fn with_codec(stream: StringStream, codec: Box<dyn Codec>) -> Self {
        Self { stream, codec }
    }

    /// Serialize an object onto the stream.
    pub fn write(&mut self, obj: &impl Object) -> Result<()> {
        let node = obj.to_repr();
        let encoded = self.codec.encode(&node)?;
        tracing::debug!(
            class = obj.class_name(),
            codec = self.codec.name(),
            bytes = encoded.len(),
            "wrote object"
        );
        self.stream.write_str(&encoded);
        Ok(())
    }

    /// Reconstruct the next object from the stream. The result is a fully
    /// independent instance of the object that was written.
    pub fn read(&mut self) -> Result<AnyObject> {
        if self.stream.is_exhausted() {
            return Err(ChannelError::EndOfStream);
        }
        let (node, consumed) = self.codec.decode(self.stream.remaining())?;
        self.stream.advance(consumed);
        if !is_known_class(node.class()) {
            return Err(ChannelError::UnsupportedClass(node.class().to_string()));
        }
        let obj = object_from_repr(&node)?;
        tracing::debug!(
            class = obj.class_name(),
            codec = self.codec.name(),
            "read object"
        );
        Ok(obj)
    }

    /// Rewind the stream so everything written becomes readable.
    pub fn sink_to_source(&mut self) {
        self.stream.sink_to_source();
    }

    pub fn stream(&self) -> &StringStream {
        &self.stream
    }

    pub fn into_stream(self) -> StringStream {
        self.stream
    }
}
