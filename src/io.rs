//! Various traits to help parsing of DNS messages.

use crate::bail;
use byteorder::{ReadBytesExt, BE};
use std::io;
use std::io::Cursor;
use std::io::SeekFrom;

/// Maximum length of a domain name on the wire, as defined by [rfc1035].
///
/// [rfc1035]: https://datatracker.ietf.org/doc/html/rfc1035#section-2.3.4
pub const MAX_NAME_LEN: usize = 255;

pub trait SeekExt: io::Seek {
    /// Returns the number of bytes remaining to be consumed.
    /// This is used as a way to check for malformed input.
    fn remaining(&mut self) -> io::Result<u64> {
        let pos = self.stream_position()?;
        let len = self.seek(SeekFrom::End(0))?;

        // reset position
        self.seek(SeekFrom::Start(pos))?;

        Ok(len.saturating_sub(pos))
    }
}

impl<'a> SeekExt for Cursor<&'a [u8]> {
    fn remaining(self: &mut std::io::Cursor<&'a [u8]>) -> io::Result<u64> {
        let pos = self.position();
        let len = self.get_ref().len() as u64;

        Ok(len.saturating_sub(pos))
    }
}

/// All types that implement `Read` and `Seek` get methods defined
/// in `DNSReadExt` for free.
impl<R: io::Read + ?Sized + io::Seek> DNSReadExt for R {}

/// Extensions to io::Read to add some DNS specific types.
pub trait DNSReadExt: io::Read + io::Seek {
    /// Reads a domain name from a DNS message, following compression pointers.
    ///
    /// The name is returned in presentation format with a trailing dot, and
    /// the root domain as `.`. Bytes that are not printable ASCII, and the
    /// characters with special meaning in zone files, are escaped.
    ///
    /// # Errors
    ///
    /// Will return a io::Error(InvalidData) if the name is invalid (forward
    /// pointer, reserved label type, too long), or a more general io::Error
    /// (typically UnexpectedEof) on any other read failure.
    fn read_qname(&mut self) -> io::Result<String> {
        let mut qname = String::new();
        let mut wire_len = 0;

        // Pointers must always jump to before the start of the labels
        // currently being read, which guarantees we terminate.
        let mut start = self.stream_position()?;

        // Where to continue once the name is read, if we jumped.
        let mut resume = None;

        loop {
            // Length of the next label
            let len = self.read_u8()?;

            match len & 0xC0 {
                // No compression
                0x00 => {
                    wire_len += usize::from(len) + 1;
                    if wire_len > MAX_NAME_LEN {
                        bail!(InvalidData, "domain name longer than {} octets", MAX_NAME_LEN);
                    }

                    if len == 0 {
                        break;
                    }

                    let mut label = vec![0; len.into()];
                    self.read_exact(&mut label)?;

                    push_label(&mut qname, &label);
                    qname.push('.');
                }

                // Compression
                0xC0 => {
                    // Read the 14 bit pointer.
                    let b2 = u16::from(self.read_u8()?);
                    let ptr = u64::from((u16::from(len) & 0x3F) << 8 | b2);

                    if ptr >= start {
                        bail!(
                            InvalidData,
                            "invalid compressed pointer pointing to future bytes"
                        );
                    }

                    if resume.is_none() {
                        resume = Some(self.stream_position()?);
                    }

                    self.seek(SeekFrom::Start(ptr))?;
                    start = ptr;
                }

                // Unknown
                _ => bail!(
                    InvalidData,
                    "unsupported compression type {0:b}",
                    len & 0xC0
                ),
            }
        }

        if let Some(pos) = resume {
            self.seek(SeekFrom::Start(pos))?;
        }

        if qname.is_empty() {
            qname.push('.') // Root domain
        }

        Ok(qname)
    }

    /// Reads past one resource record, checking only that it is well formed.
    fn skip_record(&mut self) -> io::Result<()> {
        self.read_qname()?;
        let _type = self.read_u16::<BE>()?;
        let _class = self.read_u16::<BE>()?;
        let _ttl = self.read_u32::<BE>()?;
        let len = self.read_u16::<BE>()?;

        let pos = self.stream_position()?;
        let end = self.seek(SeekFrom::End(0))?;
        if pos + u64::from(len) > end {
            bail!(
                UnexpectedEof,
                "record data of {} bytes overruns message by {} bytes",
                len,
                pos + u64::from(len) - end
            );
        }

        self.seek(SeekFrom::Start(pos + u64::from(len)))?;
        Ok(())
    }
}

/// Appends one label to `qname`, escaping as needed.
fn push_label(qname: &mut String, label: &[u8]) {
    for &b in label {
        match b {
            b'.' | b' ' | b'\'' | b'@' | b';' | b'(' | b')' | b'"' | b'\\' => {
                qname.push('\\');
                qname.push(char::from(b));
            }
            0x21..=0x7E => qname.push(char::from(b)),
            _ => qname.push_str(&format!("\\{:03}", b)),
        }
    }
}
