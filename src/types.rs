use num_traits::FromPrimitive;
use strum_macros::{Display, EnumString};

/// The parts of a DNS message needed to summarise it on one line.
///
/// Only the header and the question section are decoded. The answer,
/// authority and additional sections are checked for structure and counted,
/// but their records are not kept.
///
/// # Examples
///
/// ```rust
/// use tapfmt::Message;
///
/// // id 0x1234, one question: foo.example. IN A
/// let buf = [
///     0x12, 0x34, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
///     3, b'f', b'o', b'o', 7, b'e', b'x', b'a', b'm', b'p', b'l', b'e', 0,
///     0x00, 0x01, 0x00, 0x01,
/// ];
///
/// let m = Message::from_slice(&buf).expect("invalid message");
/// assert_eq!(m.id, 0x1234);
/// assert_eq!(m.questions[0].name, "foo.example.");
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Message {
    /// 16-bit identifier assigned by the program that generated the query.
    /// Copied into the corresponding reply.
    pub id: u16,

    /// Specifies whether this message is a query (0), or a response (1).
    pub qr: QR,

    /// Kind of query, kept numeric (4 bits).
    pub opcode: u8,

    /// Response code, kept numeric (4 bits).
    pub rcode: u8,

    /// The questions, in wire order.
    pub questions: Vec<Question>,

    /// Number of records walked in the answer section.
    pub answers: u16,

    /// Number of records walked in the authority section.
    pub authorities: u16,

    /// Number of records walked in the additional section.
    pub additionals: u16,
}

/// DNS Question.
///
/// The class and type are left numeric so values unknown to [`Type`] and
/// [`Class`] survive decoding.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Question {
    /// Domain name in presentation format, with a trailing dot.
    pub name: String,
    pub r#type: u16,
    pub class: u16,
}

impl Question {
    /// Returns the known [`Type`] for this question, if any.
    pub fn known_type(&self) -> Option<Type> {
        Type::from_u16(self.r#type)
    }

    /// Returns the known [`Class`] for this question, if any.
    pub fn known_class(&self) -> Option<Class> {
        Class::from_u16(self.class)
    }
}

#[derive(Copy, Clone, Debug, EnumString, PartialEq)]
pub enum QR {
    Query = 0,
    Response = 1,
}

impl Default for QR {
    fn default() -> Self {
        QR::Query
    }
}

impl QR {
    pub fn from_bool(b: bool) -> QR {
        match b {
            false => QR::Query,
            true => QR::Response,
        }
    }

    pub fn to_bool(self) -> bool {
        match self {
            QR::Query => false,
            QR::Response => true,
        }
    }
}

/// Resource Record Type, for example, A, CNAME or SOA.
///
/// See <https://www.iana.org/assignments/dns-parameters/dns-parameters.xhtml#dns-parameters-4>
// The Display form is the canonical mnemonic.
#[derive(Copy, Clone, Debug, Display, EnumString, FromPrimitive, PartialEq)]
#[allow(clippy::upper_case_acronyms)]
#[repr(u16)]
pub enum Type {
    None = 0,

    /// IPv4 Address.
    A = 1,
    NS = 2,
    MD = 3,
    MF = 4,
    CNAME = 5,
    SOA = 6,
    MB = 7,
    MG = 8,
    MR = 9,
    NULL = 10,

    /// Domain name pointer.
    PTR = 12,
    HINFO = 13,
    MINFO = 14,

    /// Mail exchange.
    MX = 15,

    /// Text strings.
    TXT = 16,
    RP = 17,
    AFSDB = 18,
    X25 = 19,
    ISDN = 20,
    RT = 21,
    #[strum(serialize = "NSAP-PTR")]
    NSAPPTR = 23,
    SIG = 24,
    KEY = 25,
    PX = 26,
    GPOS = 27,

    /// IPv6 Address.
    AAAA = 28,
    LOC = 29,
    NXT = 30,
    EID = 31,
    NIMLOC = 32,

    /// Server Selection
    SRV = 33,
    ATMA = 34,
    NAPTR = 35,
    KX = 36,
    CERT = 37,
    DNAME = 39,

    /// EDNS(0) Opt type. See [rfc6891].
    ///
    /// [rfc6891]: https://datatracker.ietf.org/doc/html/rfc6891
    OPT = 41,
    APL = 42,
    DS = 43,
    SSHFP = 44,
    IPSECKEY = 45,
    RRSIG = 46,
    NSEC = 47,
    DNSKEY = 48,
    DHCID = 49,
    NSEC3 = 50,
    NSEC3PARAM = 51,
    TLSA = 52,
    SMIMEA = 53,
    HIP = 55,
    NINFO = 56,
    RKEY = 57,
    TALINK = 58,
    CDS = 59,
    CDNSKEY = 60,
    OPENPGPKEY = 61,
    CSYNC = 62,
    ZONEMD = 63,
    SVCB = 64,
    HTTPS = 65,
    SPF = 99,
    UINFO = 100,
    UID = 101,
    GID = 102,
    UNSPEC = 103,
    NID = 104,
    L32 = 105,
    L64 = 106,
    LP = 107,
    EUI48 = 108,
    EUI64 = 109,
    TKEY = 249,
    TSIG = 250,
    IXFR = 251,
    AXFR = 252,
    MAILB = 253,
    MAILA = 254,

    /// Any record type.
    /// Only valid as a Question Type.
    ANY = 255,
    URI = 256,
    CAA = 257,
    AVC = 258,
    AMTRELAY = 260,
    TA = 32768,
    DLV = 32769,
    Reserved = 65535,
}

/// Resource Record Class, for example Internet.
#[derive(Copy, Clone, Debug, Display, EnumString, FromPrimitive, PartialEq)]
#[repr(u16)]
pub enum Class {
    /// The Internet (IN), see [rfc1035].
    ///
    /// [rfc1035]: https://datatracker.ietf.org/doc/html/rfc1035
    #[strum(serialize = "IN")]
    Internet = 1,

    /// CSNET (CS), obsolete (used only for examples in some obsolete RFCs).
    #[strum(serialize = "CS")]
    CsNet = 2,

    /// Chaosnet (CH), obsolete LAN protocol created at MIT in the mid-1970s.
    #[strum(serialize = "CH")]
    Chaos = 3,

    /// Hesiod (HS), an information service developed by MIT's Project Athena.
    #[strum(serialize = "HS")]
    Hesiod = 4,

    /// NONE [rfc2136]
    ///
    /// [rfc2136]: https://datatracker.ietf.org/doc/html/rfc2136
    #[strum(serialize = "NONE")]
    None = 254,

    #[strum(serialize = "ANY")]
    Any = 255,
    //     5-253     Unassigned
    //   256-65279   Unassigned
    // 65280-65534   Reserved for Private Use    [RFC6895]
    // 65535         Reserved    [RFC6895]
}
