use futures::{Stream, StreamExt};

use super::decoder::Utf8StreamDecoder;

/// Default window size for foreground fetches
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// Turns a byte stream into complete text lines.
///
/// Incoming blocks are copied into a fixed-size window. Each time the window
/// fills it is decoded, appended to the carried partial line and split on
/// `\n`; every complete line is emitted and the unterminated tail is carried
/// into the next window. Memory use is bounded by the window plus the longest
/// line seen.
pub struct ChunkedStreamReader {
    window: Box<[u8]>,
    filled: usize,
    decoder: Utf8StreamDecoder,
    carry: String,
}

impl ChunkedStreamReader {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            window: vec![0; chunk_size.max(1)].into_boxed_slice(),
            filled: 0,
            decoder: Utf8StreamDecoder::new(),
            carry: String::new(),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.window.len()
    }

    /// Bytes sitting in the window, not yet decoded
    pub fn buffered(&self) -> usize {
        self.filled
    }

    /// The unterminated fragment carried between windows
    pub fn carry(&self) -> &str {
        &self.carry
    }

    /// Copy one block from the source into the window, draining it every time it fills
    pub fn feed<F: FnMut(String)>(&mut self, mut block: &[u8], emit: &mut F) {
        while !block.is_empty() {
            let take = (self.window.len() - self.filled).min(block.len());
            self.window[self.filled..self.filled + take].copy_from_slice(&block[..take]);
            self.filled += take;
            block = &block[take..];

            if self.filled == self.window.len() {
                self.drain_window(emit);
            }
        }
    }

    /// End of stream: drain the partial window, then emit the carried line if non-empty
    pub fn finish<F: FnMut(String)>(&mut self, emit: &mut F) {
        if self.filled > 0 {
            self.drain_window(emit);
        }
        let tail = self.decoder.finish();
        if !tail.is_empty() {
            self.split_lines(&tail, emit);
        }
        if !self.carry.is_empty() {
            emit(std::mem::take(&mut self.carry));
        }
    }

    /// Drive the reader over an async byte stream.
    ///
    /// Returns the number of bytes read. The first error from the stream is
    /// returned as is and nothing more is read. Complete lines received
    /// before it are emitted, even from a partly filled window; the
    /// unterminated tail is dropped.
    pub async fn read_stream<S, B, E, F>(&mut self, stream: S, mut emit: F) -> Result<u64, E>
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        F: FnMut(String),
    {
        futures::pin_mut!(stream);
        let mut total = 0u64;
        while let Some(block) = stream.next().await {
            let block = match block {
                Ok(block) => block,
                Err(err) => {
                    if self.filled > 0 {
                        self.drain_window(&mut emit);
                    }
                    return Err(err);
                }
            };
            let bytes = block.as_ref();
            total += bytes.len() as u64;
            self.feed(bytes, &mut emit);
        }
        self.finish(&mut emit);
        Ok(total)
    }

    fn drain_window<F: FnMut(String)>(&mut self, emit: &mut F) {
        let text = self.decoder.decode(&self.window[..self.filled]);
        self.filled = 0;
        self.split_lines(&text, emit);
    }

    fn split_lines<F: FnMut(String)>(&mut self, text: &str, emit: &mut F) {
        self.carry.push_str(text);
        let Some(last_newline) = self.carry.rfind('\n') else {
            return;
        };
        let tail = self.carry.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.carry, tail);
        for line in complete[..last_newline].split('\n') {
            emit(line.to_string());
        }
    }
}

impl Default for ChunkedStreamReader {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_blocks(chunk_size: usize, blocks: &[&str]) -> Vec<String> {
        let blocks: Vec<&[u8]> = blocks.iter().map(|b| b.as_bytes()).collect();
        read_byte_blocks(chunk_size, &blocks)
    }

    fn read_byte_blocks(chunk_size: usize, blocks: &[&[u8]]) -> Vec<String> {
        let mut reader = ChunkedStreamReader::new(chunk_size);
        let mut lines = Vec::new();
        let mut emit = |line: String| lines.push(line);
        for block in blocks {
            reader.feed(block, &mut emit);
        }
        reader.finish(&mut emit);
        lines
    }

    #[test]
    fn test_lines_split_across_windows() {
        let lines = read_blocks(4, &["alpha\nbe", "ta\ngamma"]);
        assert_eq!(lines, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_trailing_newline_has_no_empty_record() {
        let lines = read_blocks(8, &["one\ntwo\n"]);
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[test]
    fn test_blank_line_in_the_middle_is_kept() {
        let lines = read_blocks(3, &["a\n\nb\n"]);
        assert_eq!(lines, vec!["a", "", "b"]);
    }

    #[test]
    fn test_empty_stream_emits_nothing() {
        assert!(read_blocks(16, &[]).is_empty());
        assert!(read_blocks(16, &[""]).is_empty());
    }

    #[test]
    fn test_line_exactly_filling_window() {
        // "abcdefg\n" is exactly one 8-byte window
        let lines = read_blocks(8, &["abcdefg\nhij"]);
        assert_eq!(lines, vec!["abcdefg", "hij"]);
    }

    #[test]
    fn test_multibyte_char_across_window_boundary() {
        // The window ends in the middle of "é"
        let lines = read_blocks(4, &["abcé\nü\n"]);
        assert_eq!(lines, vec!["abcé", "ü"]);
        assert!(lines.iter().all(|l| !l.contains('\u{FFFD}')));
    }

    #[test]
    fn test_window_state_between_feeds() {
        let mut reader = ChunkedStreamReader::new(4);
        let mut lines = Vec::new();
        let mut emit = |line: String| lines.push(line);
        reader.feed(b"ab\ncd", &mut emit);
        // First window "ab\nc" drained, "d" still buffered
        assert_eq!(reader.buffered(), 1);
        assert_eq!(reader.carry(), "c");
        reader.finish(&mut emit);
        assert_eq!(lines, vec!["ab", "cd"]);
        assert_eq!(reader.carry(), "");
    }

    #[test]
    fn test_chunk_boundary_invariance() {
        let input = "{\"_time\":1,\"m\":\"x\"}\nplain text\n\n{\"k\":\"日本語\"}\nlast line without newline";
        let bytes = input.as_bytes();
        let expected = read_byte_blocks(1024, &[bytes]);
        assert_eq!(expected.len(), 5);

        for chunk_size in 1..=24 {
            for block_size in 1..=13 {
                let blocks: Vec<&[u8]> = bytes.chunks(block_size).collect();
                assert_eq!(
                    read_byte_blocks(chunk_size, &blocks),
                    expected,
                    "chunk_size={chunk_size} block_size={block_size}"
                );
            }
        }
    }

    #[tokio::test]
    async fn test_read_stream_counts_bytes() {
        let blocks: Vec<Result<Vec<u8>, std::io::Error>> =
            vec![Ok(b"a\nb".to_vec()), Ok(b"c\n".to_vec())];
        let mut reader = ChunkedStreamReader::new(2);
        let mut lines = Vec::new();
        let total = reader
            .read_stream(futures::stream::iter(blocks), |line| lines.push(line))
            .await
            .unwrap();
        assert_eq!(total, 5);
        assert_eq!(lines, vec!["a", "bc"]);
    }

    #[tokio::test]
    async fn test_read_stream_stops_at_first_error() {
        let blocks: Vec<Result<&[u8], &str>> = vec![
            Ok(&b"one\ntwo\npartial"[..]),
            Err("connection reset"),
            Ok(&b"\nnever read\n"[..]),
        ];
        let mut reader = ChunkedStreamReader::new(4);
        let mut lines = Vec::new();
        let result = reader
            .read_stream(futures::stream::iter(blocks), |line| lines.push(line))
            .await;
        assert_eq!(result, Err("connection reset"));
        assert_eq!(lines, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_error_keeps_complete_lines_of_partial_window() {
        let blocks: Vec<Result<&[u8], &str>> = vec![Ok(&b"one
two
part"[..]), Err("reset")];
        // Window never fills before the error
        let mut reader = ChunkedStreamReader::new(64);
        let mut lines = Vec::new();
        let result = reader
            .read_stream(futures::stream::iter(blocks), |line| lines.push(line))
            .await;
        assert_eq!(result, Err("reset"));
        assert_eq!(lines, vec!["one", "two"]);
    }
}
