//! Text encoding normalization
//!
//! Registry files are published in a legacy single-byte encoding. Before
//! loading, each file is re-emitted as UTF-8 with a byte order mark. The
//! rewrite is validated by counting lines before and after: both passes use
//! universal newlines (`\n`, `\r\n` and a lone `\r` each end a line, and a
//! trailing unterminated line still counts), so a rewrite that drops or
//! merges lines is caught by the caller.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chardetng::EncodingDetector;
use encoding_rs::{CoderResult, Encoding, UTF_8};
use tracing::debug;

use crate::constants::{encoding as limits, files};
use crate::errors::{TranscodeError, TranscodeResult};

/// Outcome of normalizing one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Encoding detected for the source file
    pub source_encoding: &'static str,
    /// Lines in the source under the detected encoding
    pub source_lines: u64,
    /// Lines in the rewritten file
    pub output_lines: u64,
}

impl NormalizeReport {
    /// Whether the rewrite kept every line
    pub fn is_lossless(&self) -> bool {
        self.source_lines == self.output_lines
    }
}

/// Encoding normalization capability used by the pipeline
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Rewrite `source` as canonical UTF-8 at `destination` and report the
    /// line counts of both files
    async fn normalize(&self, source: &Path, destination: &Path)
        -> TranscodeResult<NormalizeReport>;
}

/// Sniffs the source encoding and rewrites files as UTF-8 with BOM
#[derive(Debug, Clone)]
pub struct EncodingNormalizer {
    sample_bytes: usize,
}

impl Default for EncodingNormalizer {
    fn default() -> Self {
        Self {
            sample_bytes: limits::SNIFF_SAMPLE_BYTES,
        }
    }
}

impl EncodingNormalizer {
    pub fn new(sample_bytes: usize) -> Self {
        Self { sample_bytes }
    }
}

#[async_trait]
impl Transcoder for EncodingNormalizer {
    async fn normalize(
        &self,
        source: &Path,
        destination: &Path,
    ) -> TranscodeResult<NormalizeReport> {
        let source = source.to_path_buf();
        let destination = destination.to_path_buf();
        let sample_bytes = self.sample_bytes;

        tokio::task::spawn_blocking(move || normalize_file(&source, &destination, sample_bytes))
            .await
            .map_err(|e| TranscodeError::Task {
                reason: e.to_string(),
            })?
    }
}

/// Detect, count, rewrite and recount one file
pub fn normalize_file(
    source: &Path,
    destination: &Path,
    sample_bytes: usize,
) -> TranscodeResult<NormalizeReport> {
    let encoding = detect_encoding(source, sample_bytes)?;
    debug!("Detected {} for {}", encoding.name(), source.display());

    let source_lines = count_lines(source, encoding)?;
    transcode_to_utf8(source, destination, encoding)?;
    let output_lines = count_lines(destination, UTF_8)?;

    Ok(NormalizeReport {
        source_encoding: encoding.name(),
        source_lines,
        output_lines,
    })
}

/// Guess the encoding of `path` from its first `sample_bytes` bytes
pub fn detect_encoding(path: &Path, sample_bytes: usize) -> io::Result<&'static Encoding> {
    let mut sample = Vec::with_capacity(sample_bytes);
    File::open(path)?
        .take(sample_bytes as u64)
        .read_to_end(&mut sample)?;

    if let Some((encoding, _)) = Encoding::for_bom(&sample) {
        return Ok(encoding);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(&sample, sample.len() < sample_bytes);
    Ok(detector.guess(None, true))
}

/// Count lines of `path` decoded as `encoding`
pub fn count_lines(path: &Path, encoding: &'static Encoding) -> io::Result<u64> {
    let mut counter = LineCounter::default();
    decode_stream(BufReader::new(File::open(path)?), encoding, |text| {
        counter.feed(text);
        Ok(())
    })?;
    Ok(counter.finish())
}

/// Rewrite `source` as UTF-8 with BOM at `destination`, normalizing line
/// endings to `\n`; undecodable bytes become U+FFFD
pub fn transcode_to_utf8(
    source: &Path,
    destination: &Path,
    encoding: &'static Encoding,
) -> io::Result<()> {
    if let Some(parent) = destination.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(File::create(destination)?);
    writer.write_all(limits::UTF8_BOM)?;

    let mut newlines = NewlineNormalizer::default();
    let mut buffer: Vec<u8> = Vec::with_capacity(limits::BUFFER_SIZE);
    decode_stream(BufReader::new(File::open(source)?), encoding, |text| {
        buffer.clear();
        newlines.normalize(text, &mut buffer);
        writer.write_all(&buffer)
    })?;

    writer.flush()
}

/// Name of the corrected output for `source`: `<stem>__corrigido<.ext>`
pub fn corrected_file_name(source: &Path) -> Option<String> {
    let stem = source.file_stem()?.to_str()?;
    let name = match source.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("{}{}.{}", stem, files::CORRECTED_MARKER, ext),
        None => format!("{}{}", stem, files::CORRECTED_MARKER),
    };
    Some(name)
}

/// Full corrected output path for `source` inside `destination_dir`
pub fn corrected_path(source: &Path, destination_dir: &Path) -> TranscodeResult<PathBuf> {
    corrected_file_name(source)
        .map(|name| destination_dir.join(name))
        .ok_or_else(|| TranscodeError::InvalidName {
            path: source.to_path_buf(),
        })
}

/// Stream-decode `reader` as `encoding`, handing UTF-8 chunks to `sink`
///
/// The decoder sniffs and drops a leading BOM.
fn decode_stream<R, F>(mut reader: R, encoding: &'static Encoding, mut sink: F) -> io::Result<()>
where
    R: Read,
    F: FnMut(&str) -> io::Result<()>,
{
    let mut decoder = encoding.new_decoder();
    let mut input = vec![0u8; limits::BUFFER_SIZE];
    let capacity = decoder
        .max_utf8_buffer_length(limits::BUFFER_SIZE)
        .unwrap_or(limits::BUFFER_SIZE * 4);
    let mut output = String::with_capacity(capacity);

    loop {
        let read = reader.read(&mut input)?;
        let last = read == 0;
        let mut consumed_total = 0;

        loop {
            output.clear();
            let (result, consumed, _had_replacements) =
                decoder.decode_to_string(&input[consumed_total..read], &mut output, last);
            consumed_total += consumed;
            if !output.is_empty() {
                sink(&output)?;
            }
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => continue,
            }
        }

        if last {
            return Ok(());
        }
    }
}

/// Universal-newline line counter fed with decoded text
#[derive(Debug, Default)]
pub struct LineCounter {
    lines: u64,
    after_cr: bool,
    open_line: bool,
}

impl LineCounter {
    pub fn feed(&mut self, text: &str) {
        // '\r' and '\n' never occur inside multi-byte UTF-8 sequences
        for byte in text.bytes() {
            match byte {
                b'\n' => {
                    if !self.after_cr {
                        self.lines += 1;
                    }
                    self.after_cr = false;
                    self.open_line = false;
                }
                b'\r' => {
                    self.lines += 1;
                    self.after_cr = true;
                    self.open_line = false;
                }
                _ => {
                    self.after_cr = false;
                    self.open_line = true;
                }
            }
        }
    }

    /// Total lines, counting a trailing unterminated line
    pub fn finish(&self) -> u64 {
        self.lines + u64::from(self.open_line)
    }
}

/// Rewrites `\r\n` and lone `\r` as `\n`, across chunk boundaries
#[derive(Debug, Default)]
struct NewlineNormalizer {
    after_cr: bool,
}

impl NewlineNormalizer {
    fn normalize(&mut self, text: &str, out: &mut Vec<u8>) {
        for byte in text.bytes() {
            match byte {
                b'\r' => {
                    out.push(b'\n');
                    self.after_cr = true;
                }
                b'\n' => {
                    if !self.after_cr {
                        out.push(b'\n');
                    }
                    self.after_cr = false;
                }
                other => {
                    out.push(other);
                    self.after_cr = false;
                }
            }
        }
    }
}
