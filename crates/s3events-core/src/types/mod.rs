//! Core types for s3events

mod clock;
mod destination;
mod event;
mod filter;
mod object;
mod path;

pub use clock::*;
pub use destination::*;
pub use event::*;
pub use filter::*;
pub use object::*;
pub use path::*;
