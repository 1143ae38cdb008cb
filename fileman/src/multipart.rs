//! Incremental `multipart/form-data` parser.
//!
//! The connection layer delivers the request body in chunks of whatever size
//! the socket produced. [`MultipartStream`] consumes those chunks and emits
//! [`UploadEvent`]s: `Start` when a file part's headers are complete, `Chunk`
//! for its content, `End` when its closing delimiter is seen. The upload
//! session never learns about sockets or boundaries.
//!
//! A delimiter can straddle two input chunks; the parser keeps the last
//! `delimiter.len() - 1` bytes buffered until it can rule a match out.

use heapless::Vec;

/// RFC 2046 caps the boundary at 70 characters.
const MAX_BOUNDARY_LEN: usize = 70;

/// A delimiter is `\r\n--` followed by the boundary.
const MAX_DELIMITER_LEN: usize = MAX_BOUNDARY_LEN + 4;

/// Working buffer. Must hold one delimiter plus room to make progress; part
/// header blocks must fit it entirely.
const BUF_LEN: usize = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultipartError {
    /// Boundary longer than RFC 2046 allows.
    BoundaryTooLong,
    /// A part's header block exceeded the working buffer.
    HeadersTooLong,
    /// Bytes after a delimiter were neither `--` nor CRLF.
    Malformed,
    /// The body ended before the closing delimiter.
    Truncated,
}

/// Error produced while feeding the parser: either the body is bad, or the
/// event consumer failed.
#[derive(Debug, PartialEq, Eq)]
pub enum UploadError<E> {
    Multipart(MultipartError),
    Sink(E),
}

impl<E> From<MultipartError> for UploadError<E> {
    fn from(err: MultipartError) -> Self {
        UploadError::Multipart(err)
    }
}

/// One step of an upload, decoupled from the transport.
#[derive(Debug, PartialEq, Eq)]
pub enum UploadEvent<'a> {
    /// A file part began; carries the client-declared file name.
    Start { filename: &'a str },
    /// Content bytes of the current file part.
    Chunk(&'a [u8]),
    /// The current file part is complete.
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Searching for the first delimiter.
    Preamble,
    /// Just consumed a delimiter; deciding between another part and the end.
    Delimiter,
    /// Accumulating part headers up to the blank line.
    PartHeaders,
    /// Streaming part content, watching for the next delimiter.
    Body,
    /// Closing delimiter seen; remaining bytes are epilogue.
    Done,
}

#[derive(Debug)]
pub struct MultipartStream {
    delimiter: Vec<u8, MAX_DELIMITER_LEN>,
    buf: Vec<u8, BUF_LEN>,
    state: State,
    /// Whether the current part carried a `filename` and emits events.
    in_file: bool,
}

impl MultipartStream {
    pub fn new(boundary: &str) -> Result<Self, MultipartError> {
        let mut delimiter = Vec::new();
        delimiter
            .extend_from_slice(b"\r\n--")
            .map_err(|()| MultipartError::BoundaryTooLong)?;
        delimiter
            .extend_from_slice(boundary.as_bytes())
            .map_err(|()| MultipartError::BoundaryTooLong)?;

        // Seeding the buffer with CRLF lets the first delimiter, which the
        // client sends without a preceding CRLF, match the same search.
        let mut buf = Vec::new();
        buf.extend_from_slice(b"\r\n").unwrap();

        Ok(Self {
            delimiter,
            buf,
            state: State::Preamble,
            in_file: false,
        })
    }

    /// Feed one chunk of the request body, invoking `on_event` for every
    /// completed event. Stops at the first error.
    pub fn feed<E>(
        &mut self,
        mut input: &[u8],
        on_event: &mut impl FnMut(UploadEvent<'_>) -> Result<(), E>,
    ) -> Result<(), UploadError<E>> {
        while !input.is_empty() {
            let space = BUF_LEN - self.buf.len();
            let take = space.min(input.len());
            self.buf.extend_from_slice(&input[..take]).unwrap();
            input = &input[take..];
            self.process(on_event)?;
        }
        Ok(())
    }

    /// Signal that the request body is exhausted.
    ///
    /// Errors with [`MultipartError::Truncated`] when the closing delimiter
    /// never arrived; a dangling file part is still closed with `End` first
    /// so the store sees a consistent sequence.
    pub fn finish<E>(
        &mut self,
        on_event: &mut impl FnMut(UploadEvent<'_>) -> Result<(), E>,
    ) -> Result<(), UploadError<E>> {
        if self.state == State::Done {
            return Ok(());
        }
        if self.in_file {
            on_event(UploadEvent::End).map_err(UploadError::Sink)?;
            self.in_file = false;
        }
        Err(MultipartError::Truncated.into())
    }

    /// Drain as much buffered data as the current state allows.
    fn process<E>(
        &mut self,
        on_event: &mut impl FnMut(UploadEvent<'_>) -> Result<(), E>,
    ) -> Result<(), UploadError<E>> {
        loop {
            match self.state {
                State::Preamble => {
                    if let Some(pos) = find(&self.buf, &self.delimiter) {
                        self.consume(pos + self.delimiter.len());
                        self.state = State::Delimiter;
                    } else {
                        // Keep only what could still be a delimiter prefix.
                        let keep = self.delimiter.len() - 1;
                        if self.buf.len() > keep {
                            self.consume(self.buf.len() - keep);
                        }
                        return Ok(());
                    }
                }
                State::Delimiter => {
                    if self.buf.len() < 2 {
                        return Ok(());
                    }
                    match &self.buf[..2] {
                        b"--" => {
                            self.buf.clear();
                            self.state = State::Done;
                        }
                        b"\r\n" => {
                            self.consume(2);
                            self.state = State::PartHeaders;
                        }
                        _ => return Err(MultipartError::Malformed.into()),
                    }
                }
                State::PartHeaders => {
                    let Some(pos) = find(&self.buf, b"\r\n\r\n") else {
                        if self.buf.is_full() {
                            return Err(MultipartError::HeadersTooLong.into());
                        }
                        return Ok(());
                    };
                    let headers = core::str::from_utf8(&self.buf[..pos])
                        .map_err(|_| MultipartError::Malformed)?;
                    // Parts without a filename (plain form fields) are
                    // consumed silently.
                    match part_filename(headers) {
                        Some(filename) => {
                            on_event(UploadEvent::Start { filename })
                                .map_err(UploadError::Sink)?;
                            self.in_file = true;
                        }
                        None => self.in_file = false,
                    }
                    self.consume(pos + 4);
                    self.state = State::Body;
                }
                State::Body => {
                    if let Some(pos) = find(&self.buf, &self.delimiter) {
                        if pos > 0 && self.in_file {
                            on_event(UploadEvent::Chunk(&self.buf[..pos]))
                                .map_err(UploadError::Sink)?;
                        }
                        if self.in_file {
                            on_event(UploadEvent::End).map_err(UploadError::Sink)?;
                            self.in_file = false;
                        }
                        self.consume(pos + self.delimiter.len());
                        self.state = State::Delimiter;
                    } else {
                        let keep = self.delimiter.len() - 1;
                        if self.buf.len() > keep {
                            let flush = self.buf.len() - keep;
                            if self.in_file {
                                on_event(UploadEvent::Chunk(&self.buf[..flush]))
                                    .map_err(UploadError::Sink)?;
                            }
                            self.consume(flush);
                        }
                        return Ok(());
                    }
                }
                State::Done => {
                    self.buf.clear();
                    return Ok(());
                }
            }
        }
    }

    /// Drop the first `count` buffered bytes.
    fn consume(&mut self, count: usize) {
        let len = self.buf.len();
        self.buf.copy_within(count..len, 0);
        self.buf.truncate(len - count);
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// Pull the `filename="..."` value out of a part's header block.
fn part_filename(headers: &str) -> Option<&str> {
    const MARKER: &str = "filename=\"";
    let start = headers.find(MARKER)? + MARKER.len();
    let rest = &headers[start..];
    let end = rest.find('"')?;
    Some(&rest[..end])
}

#[cfg(test)]
mod tests {
    use super::{MultipartError, MultipartStream, UploadError, UploadEvent};

    /// Owned copy of an event, for asserting on sequences.
    #[derive(Debug, PartialEq, Eq)]
    enum Seen {
        Start(String),
        Chunk(Vec<u8>),
        End,
    }

    fn collect(events: &mut Vec<Seen>) -> impl FnMut(UploadEvent<'_>) -> Result<(), ()> + '_ {
        |event| {
            events.push(match event {
                UploadEvent::Start { filename } => Seen::Start(filename.to_string()),
                UploadEvent::Chunk(data) => Seen::Chunk(data.to_vec()),
                UploadEvent::End => Seen::End,
            });
            Ok(())
        }
    }

    fn content_of(events: &[Seen]) -> Vec<u8> {
        events
            .iter()
            .filter_map(|event| match event {
                Seen::Chunk(data) => Some(data.as_slice()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .concat()
    }

    fn body(parts: &[(&str, &[u8])]) -> Vec<u8> {
        let mut out = Vec::new();
        for (name, content) in parts {
            out.extend_from_slice(b"--XBOUND\r\n");
            out.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            out.extend_from_slice(content);
            out.extend_from_slice(b"\r\n");
        }
        out.extend_from_slice(b"--XBOUND--\r\n");
        out
    }

    #[test]
    fn single_part_in_one_feed() {
        let mut events = Vec::new();
        let mut stream = MultipartStream::new("XBOUND").unwrap();
        stream
            .feed(&body(&[("foo.txt", b"abcdef")]), &mut collect(&mut events))
            .unwrap();
        stream.finish(&mut collect(&mut events)).unwrap();

        assert_eq!(events[0], Seen::Start("foo.txt".to_string()));
        assert_eq!(*events.last().unwrap(), Seen::End);
        assert_eq!(content_of(&events), b"abcdef");
    }

    #[test]
    fn delimiter_straddling_tiny_chunks() {
        let payload: Vec<u8> = (0..=255u8).cycle().take(5000).collect();
        let full = body(&[("blob.bin", &payload)]);

        let mut events = Vec::new();
        let mut stream = MultipartStream::new("XBOUND").unwrap();
        for chunk in full.chunks(3) {
            stream.feed(chunk, &mut collect(&mut events)).unwrap();
        }
        stream.finish(&mut collect(&mut events)).unwrap();

        assert_eq!(events[0], Seen::Start("blob.bin".to_string()));
        assert_eq!(content_of(&events), payload);
    }

    #[test]
    fn delimiter_prefix_inside_content_is_preserved() {
        // "\r\n--XBOUN" is a proper prefix of the delimiter but never
        // completes it; the retained tail must not swallow it.
        let payload = b"head\r\n--XBOUNtail".to_vec();
        let full = body(&[("tricky.bin", &payload)]);

        for chunk_size in 1..=16 {
            let mut events = Vec::new();
            let mut stream = MultipartStream::new("XBOUND").unwrap();
            for chunk in full.chunks(chunk_size) {
                stream.feed(chunk, &mut collect(&mut events)).unwrap();
            }
            stream.finish(&mut collect(&mut events)).unwrap();
            assert_eq!(content_of(&events), payload, "chunk size {chunk_size}");
        }
    }

    #[test]
    fn two_parts_produce_two_start_end_pairs() {
        let mut events = Vec::new();
        let mut stream = MultipartStream::new("XBOUND").unwrap();
        stream
            .feed(
                &body(&[("a.txt", b"AAA"), ("b.txt", b"BB")]),
                &mut collect(&mut events),
            )
            .unwrap();
        stream.finish(&mut collect(&mut events)).unwrap();

        let starts: Vec<_> = events
            .iter()
            .filter(|event| matches!(event, Seen::Start(_)))
            .collect();
        let ends = events.iter().filter(|event| **event == Seen::End).count();
        assert_eq!(starts.len(), 2);
        assert_eq!(ends, 2);
    }

    #[test]
    fn plain_form_fields_are_skipped() {
        let mut raw = Vec::new();
        raw.extend_from_slice(b"--XBOUND\r\n");
        raw.extend_from_slice(b"Content-Disposition: form-data; name=\"note\"\r\n\r\n");
        raw.extend_from_slice(b"just text\r\n");
        raw.extend_from_slice(&body(&[("real.txt", b"data")]));

        let mut events = Vec::new();
        let mut stream = MultipartStream::new("XBOUND").unwrap();
        stream.feed(&raw, &mut collect(&mut events)).unwrap();
        stream.finish(&mut collect(&mut events)).unwrap();

        assert_eq!(events[0], Seen::Start("real.txt".to_string()));
        assert_eq!(content_of(&events), b"data");
    }

    #[test]
    fn missing_terminator_is_truncated() {
        let mut full = body(&[("foo.txt", b"abc")]);
        full.truncate(full.len() - 12);

        let mut events = Vec::new();
        let mut stream = MultipartStream::new("XBOUND").unwrap();
        stream.feed(&full, &mut collect(&mut events)).unwrap();
        let result = stream.finish(&mut collect(&mut events));
        assert_eq!(
            result,
            Err(UploadError::Multipart(MultipartError::Truncated))
        );
        // The dangling part still got closed.
        assert_eq!(*events.last().unwrap(), Seen::End);
    }

    #[test]
    fn oversized_part_headers_are_rejected() {
        let mut raw = Vec::new();
        raw.extend_from_slice(b"--XBOUND\r\nX-Filler: ");
        raw.extend_from_slice(&[b'y'; 4096]);

        let mut events = Vec::new();
        let mut stream = MultipartStream::new("XBOUND").unwrap();
        let result = stream.feed(&raw, &mut collect(&mut events));
        assert_eq!(
            result,
            Err(UploadError::Multipart(MultipartError::HeadersTooLong))
        );
    }

    #[test]
    fn overlong_boundary_is_rejected() {
        let boundary: String = core::iter::repeat('b').take(80).collect();
        assert_eq!(
            MultipartStream::new(&boundary).unwrap_err(),
            MultipartError::BoundaryTooLong
        );
    }
}
