use crate::errors::{Error, Result};
use crate::schema;
use log::{debug, warn};
use prost::Message as _;
use std::convert::TryFrom;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

pub use crate::schema::message::Type as MessageType;
pub use crate::schema::SocketProtocol;

/// The network position of the software that emitted an event.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Role {
    Auth,
    Client,
    Forwarder,
    Resolver,
    Stub,
    Tool,
}

/// Which half of the transaction an event records.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Phase {
    Query,
    Response,
}

impl MessageType {
    /// Returns [`Phase::Query`] for the `*_QUERY` types, and
    /// [`Phase::Response`] otherwise.
    pub fn phase(self) -> Phase {
        let name: &'static str = self.into();
        if name.ends_with("_QUERY") {
            Phase::Query
        } else {
            Phase::Response
        }
    }

    pub fn role(self) -> Role {
        match self {
            MessageType::AuthQuery | MessageType::AuthResponse => Role::Auth,
            MessageType::ClientQuery | MessageType::ClientResponse => Role::Client,
            MessageType::ForwarderQuery | MessageType::ForwarderResponse => Role::Forwarder,
            MessageType::ResolverQuery | MessageType::ResolverResponse => Role::Resolver,
            MessageType::StubQuery | MessageType::StubResponse => Role::Stub,
            MessageType::ToolQuery | MessageType::ToolResponse => Role::Tool,
        }
    }

    /// The two letter mnemonic used in the log line, e.g. `AQ` or `CR`.
    pub fn code(self) -> &'static str {
        match self {
            MessageType::AuthQuery => "AQ",
            MessageType::AuthResponse => "AR",
            MessageType::ClientQuery => "CQ",
            MessageType::ClientResponse => "CR",
            MessageType::ForwarderQuery => "FQ",
            MessageType::ForwarderResponse => "FR",
            MessageType::ResolverQuery => "RQ",
            MessageType::ResolverResponse => "RR",
            MessageType::StubQuery => "SQ",
            MessageType::StubResponse => "SR",
            MessageType::ToolQuery => "TQ",
            MessageType::ToolResponse => "TR",
        }
    }
}

/// POSIX time with a nanosecond fraction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Timestamp {
    pub secs: u64,
    pub nanos: u32,
}

impl Timestamp {
    fn from_parts(secs: Option<u64>, nanos: Option<u32>) -> Option<Timestamp> {
        secs.map(|secs| Timestamp {
            secs,
            nanos: nanos.unwrap_or(0),
        })
    }
}

/// One captured tap event.
///
/// Everything except the type is optional, and absence is kept as `None`
/// rather than a zero value, so that "no address recorded" is not confused
/// with `0.0.0.0`.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    pub identity: Option<Vec<u8>>,
    pub version: Option<Vec<u8>>,

    pub r#type: MessageType,
    pub socket_protocol: Option<SocketProtocol>,

    pub query_address: Option<IpAddr>,
    pub query_port: Option<u16>,
    pub response_address: Option<IpAddr>,
    pub response_port: Option<u16>,

    pub query_time: Option<Timestamp>,
    pub response_time: Option<Timestamp>,

    pub query_message: Option<Vec<u8>>,
    pub response_message: Option<Vec<u8>>,
}

impl Envelope {
    /// Decodes one serialised dnstap frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaViolation`] if the buffer is not a dnstap
    /// protobuf, is not of type MESSAGE, has no message, or the message
    /// type is missing or unknown.
    pub fn decode(buf: &[u8]) -> Result<Envelope> {
        let dt = schema::Dnstap::decode(buf)
            .map_err(|e| Error::SchemaViolation(format!("invalid dnstap frame: {}", e)))?;

        match dt.r#type {
            Some(t) if t == schema::dnstap::Type::Message as i32 => (),
            Some(t) => return Err(Error::SchemaViolation(format!("unexpected dnstap type {}", t))),
            None => return Err(Error::SchemaViolation("missing dnstap type".to_string())),
        }

        let m = dt
            .message
            .ok_or_else(|| Error::SchemaViolation("missing dnstap message".to_string()))?;

        let r#type = match m.r#type {
            Some(t) => MessageType::try_from(t)
                .map_err(|_| Error::SchemaViolation(format!("unexpected message type: {}", t)))?,
            None => return Err(Error::SchemaViolation("missing message type".to_string())),
        };

        let socket_protocol = m.socket_protocol.and_then(|p| match SocketProtocol::try_from(p) {
            Ok(p) => Some(p),
            Err(_) => {
                warn!("unknown socket protocol {}", p);
                None
            }
        });

        let envelope = Envelope {
            identity: dt.identity,
            version: dt.version,

            r#type,
            socket_protocol,

            query_address: ip_addr("query", m.query_address),
            query_port: port("query", m.query_port),
            response_address: ip_addr("response", m.response_address),
            response_port: port("response", m.response_port),

            query_time: Timestamp::from_parts(m.query_time_sec, m.query_time_nsec),
            response_time: Timestamp::from_parts(m.response_time_sec, m.response_time_nsec),

            query_message: m.query_message,
            response_message: m.response_message,
        };

        debug!(
            "decoded {} envelope (identity {:?}, version {:?})",
            envelope.r#type,
            envelope.identity.as_deref().map(String::from_utf8_lossy),
            envelope.version.as_deref().map(String::from_utf8_lossy),
        );
        Ok(envelope)
    }

    pub fn phase(&self) -> Phase {
        self.r#type.phase()
    }

    /// The wire format DNS message for this event's phase.
    pub fn active_payload(&self) -> Option<&[u8]> {
        match self.phase() {
            Phase::Query => self.query_message.as_deref(),
            Phase::Response => self.response_message.as_deref(),
        }
    }

    /// The time of this event's phase.
    pub fn active_time(&self) -> Option<Timestamp> {
        match self.phase() {
            Phase::Query => self.query_time,
            Phase::Response => self.response_time,
        }
    }
}

fn ip_addr(side: &str, bytes: Option<Vec<u8>>) -> Option<IpAddr> {
    let bytes = bytes?;
    if let Ok(b) = <[u8; 4]>::try_from(bytes.as_slice()) {
        return Some(Ipv4Addr::from(b).into());
    }
    if let Ok(b) = <[u8; 16]>::try_from(bytes.as_slice()) {
        return Some(Ipv6Addr::from(b).into());
    }

    warn!("ignoring {} address of {} bytes", side, bytes.len());
    None
}

fn port(side: &str, port: Option<u32>) -> Option<u16> {
    let port = port?;
    match u16::try_from(port) {
        Ok(p) => Some(p),
        Err(_) => {
            warn!("ignoring out of range {} port {}", side, port);
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// A fully populated message of the given type, to be tweaked by tests.
    pub(crate) fn message(r#type: MessageType) -> schema::Message {
        schema::Message {
            r#type: Some(r#type as i32),
            socket_family: Some(schema::SocketFamily::Inet as i32),
            socket_protocol: Some(SocketProtocol::Udp as i32),
            query_address: Some(vec![192, 0, 2, 1]),
            query_port: Some(31337),
            response_address: Some(vec![192, 0, 2, 53]),
            response_port: Some(53),
            query_time_sec: Some(1_635_359_387),
            query_time_nsec: Some(412_999_999),
            response_time_sec: Some(1_635_359_388),
            response_time_nsec: Some(1_000_000),
            ..Default::default()
        }
    }

    pub(crate) fn encode(m: schema::Message) -> Vec<u8> {
        schema::Dnstap {
            identity: Some(b"ns1".to_vec()),
            r#type: Some(schema::dnstap::Type::Message as i32),
            message: Some(m),
            ..Default::default()
        }
        .encode_to_vec()
    }

    fn schema_violation(buf: &[u8]) -> bool {
        matches!(Envelope::decode(buf), Err(Error::SchemaViolation(_)))
    }

    #[test]
    fn test_decode() {
        let mut m = message(MessageType::ClientQuery);
        m.query_message = Some(vec![1, 2, 3]);

        let e = Envelope::decode(&encode(m)).unwrap();
        assert_eq!(
            e,
            Envelope {
                identity: Some(b"ns1".to_vec()),
                version: None,
                r#type: MessageType::ClientQuery,
                socket_protocol: Some(SocketProtocol::Udp),
                query_address: Some("192.0.2.1".parse().unwrap()),
                query_port: Some(31337),
                response_address: Some("192.0.2.53".parse().unwrap()),
                response_port: Some(53),
                query_time: Some(Timestamp {
                    secs: 1_635_359_387,
                    nanos: 412_999_999
                }),
                response_time: Some(Timestamp {
                    secs: 1_635_359_388,
                    nanos: 1_000_000
                }),
                query_message: Some(vec![1, 2, 3]),
                response_message: None,
            }
        );
        assert_eq!(e.active_payload(), Some(&[1u8, 2, 3][..]));
    }

    #[test_env_log::test]
    fn test_decode_identity_and_version() {
        // Neither field has to be valid UTF-8.
        let dt = schema::Dnstap {
            identity: Some(b"ns\xff".to_vec()),
            version: Some(b"bind 9.18".to_vec()),
            r#type: Some(schema::dnstap::Type::Message as i32),
            message: Some(message(MessageType::ResolverResponse)),
            ..Default::default()
        };

        let e = Envelope::decode(&dt.encode_to_vec()).unwrap();
        assert_eq!(e.identity.as_deref(), Some(&b"ns\xff"[..]));
        assert_eq!(e.version.as_deref(), Some(&b"bind 9.18"[..]));
    }

    #[test]
    fn test_absent_fields_stay_absent() {
        let m = schema::Message {
            r#type: Some(MessageType::AuthResponse as i32),
            response_address: Some(vec![0, 0, 0, 0]),
            ..Default::default()
        };

        let e = Envelope::decode(&encode(m)).unwrap();
        assert_eq!(e.query_address, None);
        assert_eq!(e.query_port, None);
        assert_eq!(e.response_address, Some(Ipv4Addr::UNSPECIFIED.into()));
        assert_eq!(e.socket_protocol, None);
        assert_eq!(e.active_time(), None);
        assert_eq!(e.active_payload(), None);
    }

    #[test]
    fn test_ipv6_and_odd_addresses() {
        let mut m = message(MessageType::ResolverQuery);
        m.query_address = Some("2001:db8::1".parse::<Ipv6Addr>().unwrap().octets().to_vec());
        m.response_address = Some(vec![1, 2, 3]);
        m.response_port = Some(70000);

        let e = Envelope::decode(&encode(m)).unwrap();
        assert_eq!(e.query_address, Some("2001:db8::1".parse().unwrap()));
        assert_eq!(e.response_address, None);
        assert_eq!(e.response_port, None);
    }

    #[test]
    fn test_schema_violations() {
        // Not a protobuf at all.
        assert!(schema_violation(&[0xff, 0xff, 0xff]));

        // Unknown message type.
        let mut m = message(MessageType::ClientQuery);
        m.r#type = Some(13);
        assert!(schema_violation(&encode(m)));

        // Missing message type.
        let mut m = message(MessageType::ClientQuery);
        m.r#type = None;
        assert!(schema_violation(&encode(m)));

        // Missing message.
        let dt = schema::Dnstap {
            r#type: Some(schema::dnstap::Type::Message as i32),
            ..Default::default()
        };
        assert!(schema_violation(&dt.encode_to_vec()));

        // Not a MESSAGE.
        let dt = schema::Dnstap {
            r#type: Some(2),
            message: Some(message(MessageType::ClientQuery)),
            ..Default::default()
        };
        assert!(schema_violation(&dt.encode_to_vec()));
    }

    #[test]
    fn test_direction() {
        let tests = vec![
            (MessageType::AuthQuery, "AQ", Role::Auth, Phase::Query),
            (MessageType::AuthResponse, "AR", Role::Auth, Phase::Response),
            (MessageType::ClientQuery, "CQ", Role::Client, Phase::Query),
            (MessageType::ClientResponse, "CR", Role::Client, Phase::Response),
            (MessageType::ForwarderQuery, "FQ", Role::Forwarder, Phase::Query),
            (MessageType::ForwarderResponse, "FR", Role::Forwarder, Phase::Response),
            (MessageType::ResolverQuery, "RQ", Role::Resolver, Phase::Query),
            (MessageType::ResolverResponse, "RR", Role::Resolver, Phase::Response),
            (MessageType::StubQuery, "SQ", Role::Stub, Phase::Query),
            (MessageType::StubResponse, "SR", Role::Stub, Phase::Response),
            (MessageType::ToolQuery, "TQ", Role::Tool, Phase::Query),
            (MessageType::ToolResponse, "TR", Role::Tool, Phase::Response),
        ];

        for (t, code, role, phase) in tests {
            assert_eq!(t.code(), code, "{}", t);
            assert_eq!(t.role(), role, "{}", t);
            assert_eq!(t.phase(), phase, "{}", t);
        }
    }

    #[test]
    fn test_active_side() {
        let mut m = message(MessageType::ForwarderResponse);
        m.query_message = Some(vec![1]);
        m.response_message = Some(vec![2, 2]);

        let e = Envelope::decode(&encode(m)).unwrap();
        assert_eq!(e.active_payload(), Some(&[2u8, 2][..]));
        assert_eq!(e.active_time().unwrap().secs, 1_635_359_388);
    }
}
