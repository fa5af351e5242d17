//! Persistence channels for fg-core object graphs.
//!
//! A [`Channel`] serializes any engine object onto a [`StringStream`] and
//! reconstructs an equivalent, fully independent object from it. Three wire
//! formats — native text, XML, and JSON — implement the same [`Codec`]
//! strategy and the same round-trip contract: identical class, identical
//! canonical dump, equivalent behavior, distinct identity.

pub mod channel;
pub mod error;
pub mod json;
pub mod stream;
pub mod text;
pub mod xml;

pub use channel::{Channel, Codec};
pub use error::{ChannelError, Result};
pub use json::JsonCodec;
pub use stream::StringStream;
pub use text::TextCodec;
pub use xml::XmlCodec;
