//! Turns dnstap captures into a line-oriented DNS audit log.
//!
//! Each frame of a [Frame Streams] file holds one dnstap envelope, which
//! records a DNS query or response seen by a server, resolver or tool. The
//! [`Pipeline`] decodes each envelope, parses the DNS message for the side
//! of the transaction it records, and renders it as one line:
//!
//! ```text
//! 27-Oct-2021 18:29:47.412 CQ 192.0.2.1:31337 -> 192.0.2.53:53 UDP 29b foo.example/IN/A
//! ```
//!
//! [Frame Streams]: https://farsightsec.github.io/fstrm/
mod display;
mod dns;
mod envelope;
mod errors;
pub mod frames;
mod io;
mod pipeline;
pub mod schema;
pub mod types;
mod util;

#[macro_use]
extern crate num_derive;

pub use crate::types::*;

// Pull up the various types that should be on the front page of the docs.
#[doc(inline)]
pub use crate::display::{Endpoint, LineFormatter, Options, Payload, RecordField};
#[doc(inline)]
pub use crate::envelope::{Envelope, MessageType, Phase, Role, SocketProtocol, Timestamp};
#[doc(inline)]
pub use crate::errors::{Error, Result};
#[doc(inline)]
pub use crate::pipeline::Pipeline;

pub use crate::display::{NO_RECORD, TIME_FORMAT};
