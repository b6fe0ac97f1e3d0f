//! The dnstap protobuf schema, declared by hand.
//!
//! Mirrors `dnstap.proto` from <https://github.com/dnstap/dnstap.pb>. Fields
//! that the schema marks `required` are declared optional here so that a
//! missing value can be told apart from a zero value.

use strum_macros::{Display, IntoStaticStr};

/// The top level dnstap container.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Dnstap {
    /// DNS server identity.
    #[prost(bytes = "vec", optional, tag = "1")]
    pub identity: Option<Vec<u8>>,

    /// DNS server version.
    #[prost(bytes = "vec", optional, tag = "2")]
    pub version: Option<Vec<u8>>,

    /// Extra data for this payload.
    #[prost(bytes = "vec", optional, tag = "3")]
    pub extra: Option<Vec<u8>>,

    #[prost(message, optional, tag = "14")]
    pub message: Option<Message>,

    #[prost(enumeration = "dnstap::Type", optional, tag = "15")]
    pub r#type: Option<i32>,
}

pub mod dnstap {
    /// Identifies which field below is filled in.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum Type {
        Message = 1,
    }
}

/// One DNS transaction event, as seen by a resolver, forwarder, server or tool.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Message {
    #[prost(enumeration = "message::Type", optional, tag = "1")]
    pub r#type: Option<i32>,

    #[prost(enumeration = "SocketFamily", optional, tag = "2")]
    pub socket_family: Option<i32>,

    #[prost(enumeration = "SocketProtocol", optional, tag = "3")]
    pub socket_protocol: Option<i32>,

    /// The initiator's address, in network byte order.
    #[prost(bytes = "vec", optional, tag = "4")]
    pub query_address: Option<Vec<u8>>,

    /// The responder's address, in network byte order.
    #[prost(bytes = "vec", optional, tag = "5")]
    pub response_address: Option<Vec<u8>>,

    #[prost(uint32, optional, tag = "6")]
    pub query_port: Option<u32>,

    #[prost(uint32, optional, tag = "7")]
    pub response_port: Option<u32>,

    #[prost(uint64, optional, tag = "8")]
    pub query_time_sec: Option<u64>,

    #[prost(fixed32, optional, tag = "9")]
    pub query_time_nsec: Option<u32>,

    /// The wire format DNS query message.
    #[prost(bytes = "vec", optional, tag = "10")]
    pub query_message: Option<Vec<u8>>,

    /// The zone of the query, for resolver queries (wire format name).
    #[prost(bytes = "vec", optional, tag = "11")]
    pub query_zone: Option<Vec<u8>>,

    #[prost(uint64, optional, tag = "12")]
    pub response_time_sec: Option<u64>,

    #[prost(fixed32, optional, tag = "13")]
    pub response_time_nsec: Option<u32>,

    /// The wire format DNS response message.
    #[prost(bytes = "vec", optional, tag = "14")]
    pub response_message: Option<Vec<u8>>,
}

pub mod message {
    use super::{Display, IntoStaticStr};

    /// The role of the emitting software and the phase of the transaction.
    #[derive(
        Clone,
        Copy,
        Debug,
        Display,
        IntoStaticStr,
        PartialEq,
        Eq,
        Hash,
        PartialOrd,
        Ord,
        ::prost::Enumeration,
    )]
    #[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
    #[repr(i32)]
    pub enum Type {
        AuthQuery = 1,
        AuthResponse = 2,
        ResolverQuery = 3,
        ResolverResponse = 4,
        ClientQuery = 5,
        ClientResponse = 6,
        ForwarderQuery = 7,
        ForwarderResponse = 8,
        StubQuery = 9,
        StubResponse = 10,
        ToolQuery = 11,
        ToolResponse = 12,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum SocketFamily {
    /// IPv4 (RFC 791).
    Inet = 1,
    /// IPv6 (RFC 2460).
    Inet6 = 2,
}

/// The transport the DNS message was carried over.
#[derive(
    Clone, Copy, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration,
)]
#[repr(i32)]
pub enum SocketProtocol {
    #[strum(serialize = "UDP")]
    Udp = 1,
    #[strum(serialize = "TCP")]
    Tcp = 2,
    #[strum(serialize = "DOT")]
    Dot = 3,
    #[strum(serialize = "DOH")]
    Doh = 4,
    #[strum(serialize = "DNSCryptUDP")]
    DnsCryptUdp = 5,
    #[strum(serialize = "DNSCryptTCP")]
    DnsCryptTcp = 6,
    #[strum(serialize = "DOQ")]
    Doq = 7,
}
