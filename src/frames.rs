//! Reads [Frame Streams] containers, the framing dnstap files are written in.
//!
//! A unidirectional stream is a START control frame, any number of data
//! frames, and a STOP control frame. Each data frame is a big-endian `u32`
//! length followed by the payload. A zero length escapes a control frame.
//!
//! [Frame Streams]: https://farsightsec.github.io/fstrm/

use crate::bail;
use crate::errors::{Error, Result};
use byteorder::{ReadBytesExt, BE};
use log::{debug, trace};
use num_traits::FromPrimitive;
use std::io;
use std::io::{Cursor, Read};

/// The content type dnstap producers announce in their START frame.
pub const CONTENT_TYPE: &[u8] = b"protobuf:dnstap.Dnstap";

/// Largest data frame accepted unless configured otherwise.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 8192;

const MAX_CONTROL_FRAME_SIZE: u32 = 512;

const CONTROL_FIELD_CONTENT_TYPE: u32 = 1;

#[derive(Copy, Clone, Debug, FromPrimitive, PartialEq)]
enum ControlType {
    Accept = 1,
    Start = 2,
    Stop = 3,
    Ready = 4,
    Finish = 5,
}

#[derive(Debug)]
struct Control {
    r#type: ControlType,
    content_types: Vec<Vec<u8>>,
}

#[derive(Clone, Debug)]
pub struct ReaderOptions {
    /// Data frames longer than this are rejected as corrupt.
    pub max_frame_size: usize,

    /// Required content type, if the START frame names any.
    pub content_type: Vec<u8>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            content_type: CONTENT_TYPE.to_vec(),
        }
    }
}

/// Pulls data frames out of a unidirectional Frame Streams container.
///
/// # Example
///
/// ```rust
/// use tapfmt::frames::Reader;
///
/// // START (no content type), one data frame, STOP.
/// let buf = [
///     0, 0, 0, 0, 0, 0, 0, 4, 0, 0, 0, 2,
///     0, 0, 0, 3, b'a', b'b', b'c',
///     0, 0, 0, 0, 0, 0, 0, 4, 0, 0, 0, 3,
/// ];
///
/// let frames: Vec<Vec<u8>> = Reader::new(&buf[..])?.collect::<Result<_, _>>()?;
/// assert_eq!(frames, vec![b"abc".to_vec()]);
/// # Ok::<(), tapfmt::Error>(())
/// ```
pub struct Reader<R> {
    input: R,
    options: ReaderOptions,

    // Set at STOP, end of input, or after the first error.
    done: bool,
}

impl<R: Read> Reader<R> {
    /// Creates a Reader expecting dnstap content, with default options.
    pub fn new(input: R) -> Result<Self> {
        Self::with_options(input, ReaderOptions::default())
    }

    /// Creates a Reader and consumes the START control frame.
    ///
    /// Completely empty input is accepted as a stream with no frames.
    pub fn with_options(input: R, options: ReaderOptions) -> Result<Self> {
        let mut reader = Reader {
            input,
            options,
            done: false,
        };

        match reader.read_len()? {
            None => {
                debug!("empty input, no frames to read");
                reader.done = true;
            }
            Some(0) => {
                let control = reader.read_control()?;
                if control.r#type != ControlType::Start {
                    return Err(Error::FrameCorruption(format!(
                        "expected START control frame, got {:?}",
                        control.r#type
                    )));
                }
                reader.check_content_type(&control)?;
            }
            Some(len) => {
                return Err(Error::FrameCorruption(format!(
                    "missing START control frame, stream begins with {} byte data frame",
                    len
                )))
            }
        }

        Ok(reader)
    }

    /// Returns the next data frame, or None at the end of the stream.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        if self.done {
            return Ok(None);
        }

        let len = match self.read_len()? {
            Some(len) => len,
            None => {
                debug!("input ended without a STOP control frame");
                self.done = true;
                return Ok(None);
            }
        };

        if len == 0 {
            let control = self.read_control()?;
            if control.r#type != ControlType::Stop {
                return Err(Error::FrameCorruption(format!(
                    "unexpected {:?} control frame",
                    control.r#type
                )));
            }

            trace!("STOP control frame");
            self.done = true;
            return Ok(None);
        }

        let len = len as usize;
        if len > self.options.max_frame_size {
            return Err(Error::FrameCorruption(format!(
                "frame of {} bytes exceeds maximum frame size of {} bytes",
                len, self.options.max_frame_size
            )));
        }

        let mut frame = vec![0; len];
        self.input
            .read_exact(&mut frame)
            .map_err(|e| truncated(e, "data frame"))?;

        trace!("data frame of {} bytes", len);
        Ok(Some(frame))
    }

    /// Reads a frame length, or None if the input ended cleanly before it.
    fn read_len(&mut self) -> Result<Option<u32>> {
        let mut buf = [0; 4];
        let mut filled = 0;

        while filled < buf.len() {
            match self.input.read(&mut buf[filled..]) {
                Ok(0) if filled == 0 => return Ok(None),
                Ok(0) => {
                    return Err(Error::FrameCorruption(format!(
                        "truncated frame length ({} of 4 bytes)",
                        filled
                    )))
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(Some(u32::from_be_bytes(buf)))
    }

    /// Reads a control frame, following the escape.
    fn read_control(&mut self) -> Result<Control> {
        let len = self
            .input
            .read_u32::<BE>()
            .map_err(|e| truncated(e, "control frame length"))?;

        if len > MAX_CONTROL_FRAME_SIZE {
            return Err(Error::FrameCorruption(format!(
                "control frame of {} bytes exceeds {} bytes",
                len, MAX_CONTROL_FRAME_SIZE
            )));
        }

        let mut buf = vec![0; len as usize];
        self.input
            .read_exact(&mut buf)
            .map_err(|e| truncated(e, "control frame"))?;

        parse_control(&buf).map_err(|e| truncated(e, "control frame"))
    }

    fn check_content_type(&self, control: &Control) -> Result<()> {
        if control.content_types.is_empty()
            || control
                .content_types
                .iter()
                .any(|ct| *ct == self.options.content_type)
        {
            return Ok(());
        }

        let offered: Vec<String> = control
            .content_types
            .iter()
            .map(|ct| String::from_utf8_lossy(ct).into_owned())
            .collect();

        Err(Error::FrameCorruption(format!(
            "content type mismatch: want {}, stream has {}",
            String::from_utf8_lossy(&self.options.content_type),
            offered.join(", ")
        )))
    }
}

impl<R: Read> Iterator for Reader<R> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => None,
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn parse_control(buf: &[u8]) -> io::Result<Control> {
    let mut cur = Cursor::new(buf);

    let value = cur.read_u32::<BE>()?;
    let r#type = match ControlType::from_u32(value) {
        Some(t) => t,
        None => bail!(InvalidData, "unknown control type {}", value),
    };

    let mut content_types = Vec::new();
    while (cur.position() as usize) < buf.len() {
        let field = cur.read_u32::<BE>()?;
        let len = cur.read_u32::<BE>()? as usize;

        let remaining = buf.len() - cur.position() as usize;
        if len > remaining {
            bail!(UnexpectedEof, "control field of {} bytes overruns frame", len);
        }

        let mut value = vec![0; len];
        cur.read_exact(&mut value)?;

        if field == CONTROL_FIELD_CONTENT_TYPE {
            content_types.push(value);
        } else {
            debug!("ignoring unknown control field {}", field);
        }
    }

    Ok(Control {
        r#type,
        content_types,
    })
}

/// Maps an io::Error from inside a frame to FrameCorruption, keeping other
/// io errors as they are.
fn truncated(e: io::Error, what: &str) -> Error {
    match e.kind() {
        io::ErrorKind::UnexpectedEof | io::ErrorKind::InvalidData => {
            Error::FrameCorruption(format!("invalid {}: {}", what, e))
        }
        _ => Error::Io(e),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn control(r#type: u32, content_type: Option<&[u8]>) -> Vec<u8> {
        let mut body = r#type.to_be_bytes().to_vec();
        if let Some(ct) = content_type {
            body.extend_from_slice(&CONTROL_FIELD_CONTENT_TYPE.to_be_bytes());
            body.extend_from_slice(&(ct.len() as u32).to_be_bytes());
            body.extend_from_slice(ct);
        }

        let mut buf = 0u32.to_be_bytes().to_vec();
        buf.extend_from_slice(&(body.len() as u32).to_be_bytes());
        buf.extend_from_slice(&body);
        buf
    }

    /// Wraps the frames in a complete dnstap Frame Streams container.
    pub(crate) fn stream(frames: &[Vec<u8>]) -> Vec<u8> {
        let mut buf = control(2, Some(CONTENT_TYPE));
        for frame in frames {
            buf.extend_from_slice(&(frame.len() as u32).to_be_bytes());
            buf.extend_from_slice(frame);
        }
        buf.extend_from_slice(&control(3, None));
        buf
    }

    fn read_all(buf: &[u8]) -> Result<Vec<Vec<u8>>> {
        Reader::new(buf)?.collect()
    }

    fn is_corrupt<T>(r: Result<T>) -> bool {
        matches!(r, Err(Error::FrameCorruption(_)))
    }

    #[test]
    fn test_frames() {
        let frames = vec![b"one".to_vec(), b"two".to_vec(), vec![0; 100]];
        assert_eq!(read_all(&stream(&frames)).unwrap(), frames);
    }

    #[test]
    fn test_empty() {
        assert_eq!(read_all(&stream(&[])).unwrap(), Vec::<Vec<u8>>::new());
        assert_eq!(read_all(&[]).unwrap(), Vec::<Vec<u8>>::new());
    }

    #[test]
    fn test_without_stop() {
        let mut buf = control(2, None);
        buf.extend_from_slice(&[0, 0, 0, 1, 0xaa]);
        assert_eq!(read_all(&buf).unwrap(), vec![vec![0xaa]]);
    }

    #[test]
    fn test_stop_ends_stream() {
        let mut buf = stream(&[b"x".to_vec()]);
        buf.extend_from_slice(b"garbage after stop");
        assert_eq!(read_all(&buf).unwrap(), vec![b"x".to_vec()]);
    }

    #[test]
    fn test_truncated() {
        let buf = stream(&[b"hello".to_vec()]);

        // Cut inside the data frame, and inside the next length.
        let start_len = control(2, Some(CONTENT_TYPE)).len();
        assert!(is_corrupt(read_all(&buf[..start_len + 6])));
        assert!(is_corrupt(read_all(&buf[..start_len + 2])));

        // Cut inside the START frame.
        assert!(is_corrupt(Reader::new(&buf[..6])));
    }

    #[test]
    fn test_errors_are_fused() {
        let buf = stream(&[b"hello".to_vec()]);
        let start_len = control(2, Some(CONTENT_TYPE)).len();

        let mut reader = Reader::new(&buf[..start_len + 6]).unwrap();
        assert!(reader.next().unwrap().is_err());
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_max_frame_size() {
        let buf = stream(&[vec![0; 10]]);
        let options = ReaderOptions {
            max_frame_size: 9,
            ..Default::default()
        };

        let mut reader = Reader::with_options(&buf[..], options).unwrap();
        assert!(is_corrupt(reader.next_frame()));
    }

    #[test]
    fn test_content_type_mismatch() {
        let buf = control(2, Some(b"protobuf:something.Else"));
        assert!(is_corrupt(Reader::new(&buf[..])));
    }

    #[test]
    fn test_missing_start() {
        assert!(is_corrupt(Reader::new(&[0, 0, 0, 1, 0xaa][..])));
        assert!(is_corrupt(Reader::new(&control(3, None)[..])));
    }

    #[test]
    fn test_unexpected_control() {
        let mut buf = control(2, None);
        buf.extend_from_slice(&control(4, None));
        assert!(is_corrupt(read_all(&buf)));

        let mut buf = control(2, None);
        buf.extend_from_slice(&control(99, None));
        assert!(is_corrupt(read_all(&buf)));
    }

    #[test]
    fn test_oversized_control() {
        let mut buf = 0u32.to_be_bytes().to_vec();
        buf.extend_from_slice(&1024u32.to_be_bytes());
        assert!(is_corrupt(Reader::new(&buf[..])));
    }
}
