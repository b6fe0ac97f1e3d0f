use crate::bail;
use crate::io::{DNSReadExt, SeekExt};
use crate::types::*;
use byteorder::{ReadBytesExt, BE};
use log::{debug, trace};
use std::io;
use std::io::Cursor;

/// Size of the fixed DNS header.
const HEADER_LEN: usize = 12;

// A helper class to hold state while the parsing is happening.
pub(crate) struct MessageParser<'a> {
    cur: Cursor<&'a [u8]>,

    m: Message,
}

#[derive(Copy, Clone, Debug, PartialEq)]
enum RecordSection {
    Answers,
    Authorities,
    Additionals,
}

impl<'a> MessageParser<'a> {
    fn new(buf: &'a [u8]) -> MessageParser<'a> {
        MessageParser {
            cur: Cursor::new(buf),
            m: Message::default(),
        }
    }

    /// Consume the MessageParser and returned the resulting Message.
    fn parse(mut self) -> io::Result<Message> {
        let len = self.cur.get_ref().len();
        if len < HEADER_LEN {
            bail!(
                UnexpectedEof,
                "message of {} bytes is shorter than the {} byte header",
                len,
                HEADER_LEN
            );
        }

        self.m.id = self.cur.read_u16::<BE>()?;

        let b = self.cur.read_u8()?;
        self.m.qr = QR::from_bool(0b1000_0000 & b != 0);
        self.m.opcode = (0b0111_1000 & b) >> 3;

        let b = self.cur.read_u8()?;
        self.m.rcode = 0b0000_1111 & b;

        let qd_count = self.cur.read_u16::<BE>()?;
        let an_count = self.cur.read_u16::<BE>()?;
        let ns_count = self.cur.read_u16::<BE>()?;
        let ar_count = self.cur.read_u16::<BE>()?;

        self.read_questions(qd_count)?;
        self.m.answers = self.skip_records(an_count, RecordSection::Answers)?;
        self.m.authorities = self.skip_records(ns_count, RecordSection::Authorities)?;
        self.m.additionals = self.skip_records(ar_count, RecordSection::Additionals)?;

        let left = self.cur.remaining()?;
        if left > 0 {
            debug!("message {} finished parsing with {} bytes left over", self.m.id, left);
        }

        trace!(
            "parsed message id={} qr={:?} opcode={} rcode={} questions={}",
            self.m.id,
            self.m.qr,
            self.m.opcode,
            self.m.rcode,
            self.m.questions.len()
        );

        Ok(self.m)
    }

    /// Returns true if the message ended exactly where the next entry would
    /// start. The header count was a lie, and the section is cut short.
    fn at_end(&mut self, count: u16, read: u16, what: &str) -> io::Result<bool> {
        if self.cur.remaining()? > 0 {
            return Ok(false);
        }

        debug!(
            "message {} claims {} {} entries but only has {}",
            self.m.id, count, what, read
        );
        Ok(true)
    }

    fn read_questions(&mut self, count: u16) -> io::Result<()> {
        for i in 0..count {
            if self.at_end(count, i, "question")? {
                break;
            }

            let name = self.cur.read_qname()?;
            let r#type = self.cur.read_u16::<BE>()?;
            let class = self.cur.read_u16::<BE>()?;

            self.m.questions.push(Question {
                name,
                r#type,
                class,
            });
        }

        Ok(())
    }

    fn skip_records(&mut self, count: u16, section: RecordSection) -> io::Result<u16> {
        let what = match section {
            RecordSection::Answers => "answer",
            RecordSection::Authorities => "authority",
            RecordSection::Additionals => "additional",
        };

        for i in 0..count {
            if self.at_end(count, i, what)? {
                return Ok(i);
            }
            self.cur.skip_record()?;
        }

        Ok(count)
    }
}

impl Message {
    /// Decodes a wire-format DNS message.
    ///
    /// # Errors
    ///
    /// Returns a io::Error if the message is truncated or structurally
    /// invalid. The header must be complete; a section may be shorter than
    /// the header claims as long as the message ends on an entry boundary.
    pub fn from_slice(buf: &[u8]) -> io::Result<Message> {
        MessageParser::new(buf).parse()
    }

    /// Returns the first question, if there is one.
    pub fn question(&self) -> Option<&Question> {
        self.questions.first()
    }
}
