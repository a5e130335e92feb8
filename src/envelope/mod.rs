//! Action envelopes.
//!
//! ```text
//! request fields (ordered)
//!     → params.rs (drop reserved fields, split "id,value", unquote)
//!     → writer.rs (escape, Latin-1 encode, render XML)
//!     → bytes handed to the queue
//! ```

pub mod params;
pub mod writer;

pub use params::Parameter;
pub use writer::EnvelopeWriter;
