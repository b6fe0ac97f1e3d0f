//! Renders an envelope as one audit log line, for example:
//!
//! ```text
//! 27-Oct-2021 18:29:47.412 CQ 192.0.2.1:31337 -> 192.0.2.53:53 UDP 29b foo.example/IN/A
//! ```

use crate::envelope::{Envelope, Phase, SocketProtocol, Timestamp};
use crate::types::{Message, Question};
use chrono::{DateTime, TimeZone};
use std::convert::TryFrom;
use std::fmt;
use std::net::IpAddr;

/// Timestamp format, like `27-Oct-2021 18:29:47.412`. The fraction is
/// truncated, not rounded.
pub const TIME_FORMAT: &str = "%d-%b-%Y %H:%M:%S%.3f";

/// Written in place of name/class/type when there is no question to show.
pub const NO_RECORD: &str = "?/?/?";

/// Written in place of any other field that was not recorded.
const UNKNOWN: &str = "?";

/// The operator options the formatter honours.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Options {
    /// Append ` ID: <id>` to lines that have a question.
    pub print_id: bool,
}

/// Outcome of decoding an event's DNS payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Parsed(Message),
    Unparseable,
}

impl Payload {
    pub fn message(&self) -> Option<&Message> {
        match self {
            Payload::Parsed(m) => Some(m),
            Payload::Unparseable => None,
        }
    }
}

/// Formats envelopes into lines. Holds no state besides its options and
/// the timezone timestamps are shown in.
#[derive(Clone, Debug)]
pub struct LineFormatter<Tz: TimeZone> {
    options: Options,
    tz: Tz,
}

impl<Tz: TimeZone> LineFormatter<Tz>
where
    Tz::Offset: fmt::Display,
{
    pub fn new(options: Options, tz: Tz) -> Self {
        LineFormatter { options, tz }
    }

    pub fn options(&self) -> Options {
        self.options
    }

    /// Returns the line for this envelope, including the trailing newline.
    pub fn format(&self, envelope: &Envelope, payload: &Payload) -> String {
        Line {
            envelope,
            payload,
            formatter: self,
        }
        .to_string()
    }
}

struct Line<'a, Tz: TimeZone> {
    envelope: &'a Envelope,
    payload: &'a Payload,
    formatter: &'a LineFormatter<Tz>,
}

impl<Tz: TimeZone> fmt::Display for Line<'_, Tz>
where
    Tz::Offset: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let e = self.envelope;
        let record = RecordField(self.payload.message());

        write!(
            f,
            "{time} {code} {query} {arrow} {response} {protocol} {size}b {record}",
            time = TimeField {
                time: e.active_time(),
                tz: &self.formatter.tz,
            },
            code = e.r#type.code(),
            query = Endpoint::new(e.query_address, e.query_port),
            arrow = Arrow(e.phase()),
            response = Endpoint::new(e.response_address, e.response_port),
            protocol = ProtocolField(e.socket_protocol),
            size = e.active_payload().map_or(0, |p| p.len()),
            record = record,
        )?;

        if self.formatter.options.print_id {
            if let Some(m) = record.message() {
                write!(f, " ID: {}", m.id)?;
            }
        }

        writeln!(f)
    }
}

/// The active timestamp in the formatter's timezone, or `?`.
struct TimeField<'a, Tz: TimeZone> {
    time: Option<Timestamp>,
    tz: &'a Tz,
}

impl<Tz: TimeZone> TimeField<'_, Tz> {
    fn datetime(&self) -> Option<DateTime<Tz>> {
        let t = self.time?;
        let secs = i64::try_from(t.secs)
            .ok()?
            .checked_add(i64::from(t.nanos / 1_000_000_000))?;
        self.tz.timestamp_opt(secs, t.nanos % 1_000_000_000).single()
    }
}

impl<Tz: TimeZone> fmt::Display for TimeField<'_, Tz>
where
    Tz::Offset: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.datetime() {
            Some(dt) => write!(f, "{}", dt.format(TIME_FORMAT)),
            None => f.write_str(UNKNOWN),
        }
    }
}

/// An address and port, as `ip:port`, or `?` when no address was recorded.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Endpoint {
    addr: Option<IpAddr>,
    port: Option<u16>,
}

impl Endpoint {
    pub fn new(addr: Option<IpAddr>, port: Option<u16>) -> Endpoint {
        Endpoint { addr, port }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let addr = match self.addr {
            None => return f.write_str(UNKNOWN),
            // IPv4 mapped IPv6 addresses are shown as plain IPv4.
            Some(IpAddr::V6(ip)) => match ip.to_ipv4_mapped() {
                Some(v4) => IpAddr::V4(v4),
                None => IpAddr::V6(ip),
            },
            Some(ip) => ip,
        };

        match self.port {
            Some(port) => write!(f, "{}:{}", addr, port),
            None => write!(f, "{}", addr),
        }
    }
}

/// Points from the query side to the response side of the line.
struct Arrow(Phase);

impl fmt::Display for Arrow {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            Phase::Query => f.write_str("->"),
            Phase::Response => f.write_str("<-"),
        }
    }
}

struct ProtocolField(Option<SocketProtocol>);

impl fmt::Display for ProtocolField {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            Some(p) => write!(f, "{}", p),
            None => f.write_str(UNKNOWN),
        }
    }
}

/// The first question of a message as `name/class/type`, or `?/?/?`.
///
/// The name loses its trailing dot, except for the root zone which stays
/// `.`. Classes and types without a mnemonic are written as `CLASS<n>` and
/// `TYPE<n>`.
#[derive(Copy, Clone, Debug)]
pub struct RecordField<'a>(pub Option<&'a Message>);

impl<'a> RecordField<'a> {
    /// The message, if it has a question that can be shown.
    fn message(&self) -> Option<&'a Message> {
        self.parts().map(|(m, _, _)| m)
    }

    fn parts(&self) -> Option<(&'a Message, &'a Question, &'a str)> {
        let m = self.0?;
        let q = m.question()?;

        let name = if q.name == "." {
            q.name.as_str()
        } else {
            // A name without its terminating dot is malformed.
            q.name.strip_suffix('.')?
        };

        Some((m, q, name))
    }
}

impl fmt::Display for RecordField<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (_, q, name) = match self.parts() {
            Some(parts) => parts,
            None => return f.write_str(NO_RECORD),
        };

        write!(f, "{}/", name)?;
        match q.known_class() {
            Some(class) => write!(f, "{}/", class)?,
            None => write!(f, "CLASS{}/", q.class)?,
        }
        match q.known_type() {
            Some(r#type) => write!(f, "{}", r#type),
            None => write!(f, "TYPE{}", q.r#type),
        }
    }
}
