//! Frame/mapping graph engine.
//!
//! Models coordinate systems as a tree of frames connected by composable,
//! invertible mappings: build frames and mappings, assemble them into a
//! [`FrameSet`] or domain-indexed [`FrameDict`], derive the composite
//! transform between any two frames, and evaluate it over point batches.
//! Every object is deep-copyable with explicit identity semantics and
//! converts to a self-describing representation tree for persistence.
//!
//! Zero I/O — pure transform algebra with no opinions about wire formats or
//! storage; see the channel crate for those.

pub mod error;
pub mod frame;
pub mod framedict;
pub mod frameset;
pub mod mapping;
pub mod object;
pub mod points;
pub mod repr;
mod simplify;

pub use error::{Error, Result};
pub use frame::Frame;
pub use framedict::{FrameDict, FrameRef};
pub use frameset::FrameSet;
pub use mapping::{EPSILON, Mapping};
pub use object::{Object, live_instances};
pub use points::CoordBlock;
pub use repr::{AnyObject, ReprNode, ReprValue, is_known_class, object_from_repr, render_text};
