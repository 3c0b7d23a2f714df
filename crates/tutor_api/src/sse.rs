//! Event Frame Decoder: raw response bytes to `data:` payload frames.
//!
//! Only lines carrying the literal `data: ` prefix are frames. Blank lines,
//! comments and other SSE fields are dropped without error, so one corrupted
//! line never aborts an otherwise healthy stream.

/// Literal prefix that marks a payload line.
pub const DATA_PREFIX: &str = "data: ";
/// Payload that terminates a stream explicitly.
pub const DONE_MARKER: &str = "[DONE]";

/// One decoded logical line of the event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Text after `data: `, excluding the line terminator.
    Payload(String),
    /// The `[DONE]` termination marker.
    Done,
}

/// Incremental, line-oriented decoder for `text/event-stream` bodies.
///
/// The carry-over is kept as raw bytes, so a UTF-8 sequence or a line split
/// across chunk boundaries decodes exactly as if it had arrived in one piece.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    pending: Vec<u8>,
    dropped_lines: usize,
}

impl FrameDecoder {
    /// Feed one chunk and drain every frame completed by it, in order.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Frame> {
        self.pending.extend_from_slice(bytes);
        let mut frames = Vec::new();
        let mut consumed = 0;

        while let Some(offset) = self.pending[consumed..].iter().position(|b| *b == b'\n') {
            let end = consumed + offset;
            let line = String::from_utf8_lossy(&self.pending[consumed..end]).into_owned();
            consumed = end + 1;
            self.push_line(&line, &mut frames);
        }

        self.pending.drain(..consumed);
        frames
    }

    /// Flush an unterminated final line once the byte stream has closed.
    pub fn finish(&mut self) -> Vec<Frame> {
        let mut frames = Vec::new();
        if self.pending.is_empty() {
            return frames;
        }

        let line = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        self.push_line(&line, &mut frames);
        frames
    }

    /// Decode a complete body in one shot.
    pub fn decode_all(input: &[u8]) -> Vec<Frame> {
        let mut decoder = Self::default();
        let mut frames = decoder.feed(input);
        frames.extend(decoder.finish());
        frames
    }

    /// Bytes received after the last line terminator.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Lines discarded because they were not `data: ` frames.
    pub fn dropped_lines(&self) -> usize {
        self.dropped_lines
    }

    fn push_line(&mut self, line: &str, frames: &mut Vec<Frame>) {
        match classify_line(line) {
            Some(frame) => frames.push(frame),
            None => {
                if !line.trim().is_empty() {
                    tracing::trace!(line, "dropping non-data event stream line");
                }
                self.dropped_lines += 1;
            }
        }
    }
}

/// Classify one line (terminator already removed).
pub fn classify_line(line: &str) -> Option<Frame> {
    let line = line.strip_suffix('\r').unwrap_or(line);
    let payload = line.strip_prefix(DATA_PREFIX)?;
    if payload == DONE_MARKER {
        Some(Frame::Done)
    } else {
        Some(Frame::Payload(payload.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::{Frame, FrameDecoder};

    #[test]
    fn carries_partial_line_until_terminator_arrives() {
        let mut decoder = FrameDecoder::default();
        assert!(decoder.feed(b"data: {\"a\":").is_empty());
        assert_eq!(decoder.pending_len(), 11);

        let frames = decoder.feed(b"1}\ndata: [DONE]\n");
        assert_eq!(
            frames,
            vec![Frame::Payload("{\"a\":1}".to_owned()), Frame::Done]
        );
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn reassembles_multibyte_character_split_across_chunks() {
        let text = "data: caf\u{e9}\n".as_bytes();
        let split = text.len() - 2;
        let mut decoder = FrameDecoder::default();

        let mut frames = decoder.feed(&text[..split]);
        frames.extend(decoder.feed(&text[split..]));

        assert_eq!(frames, vec![Frame::Payload("caf\u{e9}".to_owned())]);
    }
}
