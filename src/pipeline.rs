use crate::display::{Endpoint, LineFormatter, Options, Payload};
use crate::envelope::{Envelope, Phase};
use crate::errors::Result;
use crate::types::Message;
use crate::util::hexdump;
use chrono::{Local, TimeZone};
use log::{debug, log_enabled, warn, Level};
use std::fmt;

/// Turns raw envelope frames into formatted lines, one per frame, in order.
///
/// Frames come from any iterator, typically a [`crate::frames::Reader`].
/// A DNS payload that does not parse is logged and shown as `?/?/?`; the
/// stream carries on. Any other error is yielded once, and then the
/// pipeline stops.
///
/// # Example
///
/// ```rust,no_run
/// use std::fs::File;
/// use std::io::BufReader;
/// use tapfmt::frames::Reader;
/// use tapfmt::{Options, Pipeline};
///
/// let file = BufReader::new(File::open("capture.dnstap")?);
/// for line in Pipeline::new(Reader::new(file)?, Options::default()) {
///     print!("{}", line?);
/// }
/// # Ok::<(), tapfmt::Error>(())
/// ```
pub struct Pipeline<I, Tz: TimeZone = Local> {
    frames: I,
    formatter: LineFormatter<Tz>,
    failed: bool,
}

impl<I> Pipeline<I, Local>
where
    I: Iterator<Item = Result<Vec<u8>>>,
{
    /// Creates a pipeline that shows times in the local timezone.
    pub fn new(frames: I, options: Options) -> Self {
        Self::with_timezone(frames, options, Local)
    }
}

impl<I, Tz> Pipeline<I, Tz>
where
    I: Iterator<Item = Result<Vec<u8>>>,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    pub fn with_timezone(frames: I, options: Options, tz: Tz) -> Self {
        Pipeline {
            frames,
            formatter: LineFormatter::new(options, tz),
            failed: false,
        }
    }

    /// Decodes and formats a single frame.
    pub fn process(&self, frame: &[u8]) -> Result<String> {
        let envelope = Envelope::decode(frame)?;
        let payload = unpack(&envelope);
        Ok(self.formatter.format(&envelope, &payload))
    }
}

impl<I, Tz> Iterator for Pipeline<I, Tz>
where
    I: Iterator<Item = Result<Vec<u8>>>,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let result = match self.frames.next()? {
            Ok(frame) => self.process(&frame),
            Err(e) => Err(e),
        };

        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

/// Parses the DNS message for the envelope's phase. Failures are reported
/// here and nowhere else.
fn unpack(envelope: &Envelope) -> Payload {
    let buf = envelope.active_payload().unwrap_or_default();

    match Message::from_slice(buf) {
        Ok(m) => Payload::Parsed(m),
        Err(e) => {
            let query = Endpoint::new(envelope.query_address, envelope.query_port);
            let response = Endpoint::new(envelope.response_address, envelope.response_port);

            match envelope.phase() {
                Phase::Query => warn!(
                    "unable to unpack query message ({} -> {}): {}",
                    query, response, e
                ),
                Phase::Response => warn!(
                    "unable to unpack response message ({} <- {}): {}",
                    query, response, e
                ),
            }

            if log_enabled!(Level::Debug) && !buf.is_empty() {
                debug!("{} payload:\n{}", envelope.r#type, hexdump(buf));
            }

            Payload::Unparseable
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::tests::query;
    use crate::envelope::tests::{encode, message};
    use crate::envelope::MessageType;
    use crate::frames::tests::stream;
    use crate::frames::Reader;
    use crate::Error;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn frame(r#type: MessageType, payload: Option<Vec<u8>>) -> Vec<u8> {
        let mut m = message(r#type);
        m.query_message = payload.clone();
        m.response_message = payload;
        encode(m)
    }

    fn run(frames: Vec<Result<Vec<u8>>>, print_id: bool) -> Vec<Result<String>> {
        Pipeline::with_timezone(frames.into_iter(), Options { print_id }, Utc).collect()
    }

    fn lines(results: Vec<Result<String>>) -> Vec<String> {
        results.into_iter().map(|r| r.expect("unexpected error")).collect()
    }

    #[test_env_log::test]
    fn test_unparseable_payload_continues() {
        let frames = vec![
            Ok(frame(MessageType::ClientQuery, Some(vec![0x12, 0x34, 0x01]))),
            Ok(frame(MessageType::ClientQuery, None)),
            Ok(frame(MessageType::ClientResponse, Some(query(7, "foo.example.", 1, 1)))),
        ];

        let got = lines(run(frames, true));
        assert_eq!(
            got,
            vec![
                "27-Oct-2021 18:29:47.412 CQ 192.0.2.1:31337 -> 192.0.2.53:53 UDP 3b ?/?/?\n",
                "27-Oct-2021 18:29:47.412 CQ 192.0.2.1:31337 -> 192.0.2.53:53 UDP 0b ?/?/?\n",
                "27-Oct-2021 18:29:48.001 CR 192.0.2.1:31337 <- 192.0.2.53:53 UDP 29b foo.example/IN/A ID: 7\n",
            ]
        );
    }

    #[test]
    fn test_schema_violation_stops() {
        let mut bad = message(MessageType::AuthQuery);
        bad.r#type = Some(42);

        let frames = vec![
            Ok(frame(MessageType::AuthQuery, Some(query(1, "a.", 1, 1)))),
            Ok(encode(bad)),
            Ok(frame(MessageType::AuthQuery, Some(query(2, "b.", 1, 1)))),
        ];

        let got = run(frames, false);
        assert_eq!(got.len(), 2);
        assert!(got[0].is_ok());
        assert!(matches!(got[1], Err(Error::SchemaViolation(_))));
    }

    #[test]
    fn test_frame_error_stops() {
        let frames = vec![
            Err(Error::FrameCorruption("bad".to_string())),
            Ok(frame(MessageType::AuthQuery, Some(query(1, "a.", 1, 1)))),
        ];

        let got = run(frames, false);
        assert_eq!(got.len(), 1);
        assert!(matches!(got[0], Err(Error::FrameCorruption(_))));
    }

    #[test]
    fn test_from_reader() {
        let buf = stream(&[
            frame(MessageType::AuthQuery, Some(query(1, "foo.example.", 1, 1))),
            frame(MessageType::AuthResponse, Some(query(1, "foo.example.", 1, 1))),
            frame(MessageType::ClientQuery, Some(query(2, ".", 2, 1))),
        ]);

        let reader = Reader::new(&buf[..]).unwrap();
        let got: Vec<String> = Pipeline::with_timezone(reader, Options::default(), Utc)
            .map(|r| r.unwrap())
            .collect();

        let codes: Vec<&str> = got.iter().map(|l| &l[25..27]).collect();
        assert_eq!(codes, vec!["AQ", "AR", "CQ"]);

        let records: Vec<&str> = got
            .iter()
            .map(|l| l.trim_end().rsplit(' ').next().unwrap())
            .collect();
        assert_eq!(records, vec!["foo.example/IN/A", "foo.example/IN/A", "./IN/NS"]);
    }

    #[test]
    fn test_no_frames() {
        let buf = stream(&[]);
        let reader = Reader::new(&buf[..]).unwrap();
        assert_eq!(Pipeline::new(reader, Options::default()).count(), 0);
    }
}
