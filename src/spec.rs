//! Reconstruction of a chunked job spec from command-line flags.
//!
//! The flag surface exists to smuggle a payload of arbitrary size through
//! argv: the producer splits the encoded text into indexed chunks and emits
//! one `--spec-chunk-<index>` flag per chunk, in whatever order it likes.
//! Scanning is a single left-to-right pass; at each position an ordered list
//! of matchers probes the token and the first match consumes one or two
//! tokens. Unrecognized tokens are skipped.

use crate::error::LaunchError;

const OPT_VERSION: &str = "--spec-version";
const OPT_NUM_CHUNKS: &str = "--spec-num-chunks";
const OPT_CHUNK: &str = "--spec-chunk-";
const OPT_SHA256SUM: &str = "--spec-sha256sum";

/// Fully parsed and reordered launch request carried by `--spec-*` flags.
///
/// `--spec-num-chunks` and at least one `--spec-chunk-<index>` flag are
/// required; version and checksum are carried as-is when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spec {
    /// Spec layout revision; informational only.
    pub version: u64,
    /// Declared number of chunks; equals `chunks.len()` after finalization.
    pub num_chunks: usize,
    /// Encoded payload chunks, restored to declaration order.
    pub chunks: Vec<String>,
    /// Hex digest carried alongside the payload; never verified here.
    pub sha256sum: String,
}

impl Spec {
    /// Scan `args` (with `args[0]` being the program name) and finalize the
    /// collected fields into a spec.
    pub fn from_args(args: &[String]) -> Result<Self, LaunchError> {
        let mut builder = SpecBuilder::default();
        let mut cursor = 1;
        while cursor < args.len() {
            let consumed = builder.advance(args, cursor);
            cursor += consumed.max(1);
        }
        builder.finalize()
    }
}

/// Declared chunk position paired with its arrival order in the scan.
type ChunkRecord = (usize, usize);

/// Outcome of one matcher probing the token at the cursor.
enum FlagMatch<T> {
    /// The token does not carry this flag.
    Miss,
    /// The flag is present but its value is unusable; the occurrence is
    /// dropped and the scan continues.
    Invalid,
    /// The value and the number of tokens it took to express it.
    Value(T, usize),
}

#[derive(Default)]
struct SpecBuilder {
    version: Option<u64>,
    num_chunks: Option<usize>,
    chunks: Vec<String>,
    records: Vec<ChunkRecord>,
    sha256sum: Option<String>,
    malformed: Vec<&'static str>,
}

impl SpecBuilder {
    /// Probe the matchers in fixed priority order and fold the first match
    /// into the builder. Returns the number of tokens consumed: 0 when the
    /// token matched nothing, 1 when a malformed occurrence was dropped.
    fn advance(&mut self, args: &[String], pos: usize) -> usize {
        match match_uint(args, pos, OPT_VERSION) {
            FlagMatch::Value(version, consumed) => {
                self.version = Some(version);
                return consumed;
            }
            FlagMatch::Invalid => {
                self.malformed.push(OPT_VERSION);
                return 1;
            }
            FlagMatch::Miss => {}
        }

        match match_uint(args, pos, OPT_NUM_CHUNKS) {
            FlagMatch::Value(count, consumed) => {
                self.num_chunks = Some(count as usize);
                return consumed;
            }
            FlagMatch::Invalid => {
                self.malformed.push(OPT_NUM_CHUNKS);
                return 1;
            }
            FlagMatch::Miss => {}
        }

        match match_chunk(args, pos) {
            FlagMatch::Value((index, text), consumed) => {
                self.records.push((index, self.chunks.len()));
                self.chunks.push(text);
                return consumed;
            }
            FlagMatch::Invalid => {
                self.malformed.push(OPT_CHUNK);
                return 1;
            }
            FlagMatch::Miss => {}
        }

        match match_text(args, pos, OPT_SHA256SUM) {
            FlagMatch::Value(digest, consumed) => {
                self.sha256sum = Some(digest);
                consumed
            }
            FlagMatch::Invalid | FlagMatch::Miss => 0,
        }
    }

    /// Validate the collected fields and restore chunk declaration order.
    fn finalize(mut self) -> Result<Spec, LaunchError> {
        let Some(num_chunks) = self.num_chunks else {
            return Err(self.missing(OPT_NUM_CHUNKS));
        };
        if self.records.is_empty() {
            return Err(self.missing(OPT_CHUNK));
        }
        if num_chunks != self.chunks.len() {
            return Err(LaunchError::ChunkCountMismatch {
                declared: num_chunks,
                collected: self.chunks.len(),
            });
        }

        // Sorting the (declared, arrival) pairs yields the inverse
        // permutation; the declared indices must then cover [0, num_chunks)
        // exactly, or some index is duplicated, missing, or out of range.
        self.records.sort_unstable();
        for (expected, &(declared, _)) in self.records.iter().enumerate() {
            if declared != expected {
                return Err(LaunchError::ChunkOrdering {
                    expected,
                    found: declared,
                });
            }
        }

        let mut chunks = std::mem::take(&mut self.chunks);
        let ordered = self
            .records
            .iter()
            .map(|&(_, arrival)| std::mem::take(&mut chunks[arrival]))
            .collect();

        Ok(Spec {
            version: self.version.unwrap_or(0),
            num_chunks,
            chunks: ordered,
            sha256sum: self.sha256sum.unwrap_or_default(),
        })
    }

    fn missing(&self, flag: &'static str) -> LaunchError {
        if self.malformed.contains(&flag) {
            LaunchError::MalformedArgument { flag }
        } else {
            LaunchError::IncompleteSpec { flag }
        }
    }
}

/// Split a `--flag value` or `--flag=value` occurrence into its value text
/// and the number of tokens it spans. The caller has already verified the
/// prefix; `None` means the token is not a well-shaped occurrence after all.
fn split_value<'a>(args: &'a [String], pos: usize, prefix: usize) -> Option<(&'a str, usize)> {
    let token = &args[pos];
    if token.len() == prefix {
        args.get(pos + 1).map(|value| (value.as_str(), 2))
    } else if token.as_bytes()[prefix] == b'=' {
        Some((&token[prefix + 1..], 1))
    } else {
        None
    }
}

/// A complete, non-negative integer literal; no sign, no trailing characters.
fn parse_uint(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

fn match_uint(args: &[String], pos: usize, flag: &'static str) -> FlagMatch<u64> {
    if !args[pos].starts_with(flag) {
        return FlagMatch::Miss;
    }
    match split_value(args, pos, flag.len()) {
        None => FlagMatch::Miss,
        Some((value, consumed)) => match parse_uint(value) {
            Some(number) => FlagMatch::Value(number, consumed),
            None => FlagMatch::Invalid,
        },
    }
}

fn match_text(args: &[String], pos: usize, flag: &'static str) -> FlagMatch<String> {
    if !args[pos].starts_with(flag) {
        return FlagMatch::Miss;
    }
    match split_value(args, pos, flag.len()) {
        None => FlagMatch::Miss,
        Some((value, consumed)) => FlagMatch::Value(value.to_owned(), consumed),
    }
}

/// The chunk flag carries its declared index as a numeric suffix, either
/// `--spec-chunk-3 <text>` or `--spec-chunk-3=<text>`.
fn match_chunk(args: &[String], pos: usize) -> FlagMatch<(usize, String)> {
    let token = &args[pos];
    if !token.starts_with(OPT_CHUNK) {
        return FlagMatch::Miss;
    }
    let (index, value, consumed) = match token.find('=') {
        None => {
            let Some(next) = args.get(pos + 1) else {
                return FlagMatch::Miss;
            };
            (&token[OPT_CHUNK.len()..], next.as_str(), 2)
        }
        Some(offset) => (&token[OPT_CHUNK.len()..offset], &token[offset + 1..], 1),
    };
    match parse_uint(index).and_then(|index| usize::try_from(index).ok()) {
        Some(index) => FlagMatch::Value((index, value.to_owned()), consumed),
        None => FlagMatch::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(tokens: &[&str]) -> Vec<String> {
        std::iter::once("job_launcher")
            .chain(tokens.iter().copied())
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn parses_split_and_inline_forms_identically() {
        let split = Spec::from_args(&args(&[
            "--spec-version",
            "7",
            "--spec-num-chunks",
            "1",
            "--spec-chunk-0",
            "QQ==",
        ]))
        .unwrap();
        let inline = Spec::from_args(&args(&[
            "--spec-version=7",
            "--spec-num-chunks=1",
            "--spec-chunk-0=QQ==",
        ]))
        .unwrap();
        assert_eq!(split, inline);
        assert_eq!(split.version, 7);
        assert_eq!(split.chunks, ["QQ=="]);
    }

    #[test]
    fn restores_declaration_order() {
        let spec = Spec::from_args(&args(&[
            "--spec-num-chunks",
            "3",
            "--spec-chunk-2",
            "C",
            "--spec-chunk-0",
            "A",
            "--spec-chunk-1",
            "B",
        ]))
        .unwrap();
        assert_eq!(spec.chunks, ["A", "B", "C"]);
    }

    #[test]
    fn index_gap_fails() {
        let err = Spec::from_args(&args(&[
            "--spec-num-chunks",
            "2",
            "--spec-chunk-0",
            "A",
            "--spec-chunk-2",
            "C",
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            LaunchError::ChunkOrdering {
                expected: 1,
                found: 2
            }
        ));
    }

    #[test]
    fn duplicate_index_fails() {
        let err = Spec::from_args(&args(&[
            "--spec-num-chunks",
            "2",
            "--spec-chunk-0",
            "A",
            "--spec-chunk-0",
            "B",
        ]))
        .unwrap_err();
        assert!(matches!(err, LaunchError::ChunkOrdering { .. }));
    }

    #[test]
    fn count_mismatch_fails() {
        let err = Spec::from_args(&args(&["--spec-num-chunks", "2", "--spec-chunk-0", "A"]))
            .unwrap_err();
        assert!(matches!(
            err,
            LaunchError::ChunkCountMismatch {
                declared: 2,
                collected: 1
            }
        ));
    }

    #[test]
    fn missing_num_chunks_fails() {
        let err = Spec::from_args(&args(&["--spec-chunk-0", "A"])).unwrap_err();
        assert!(matches!(err, LaunchError::IncompleteSpec { .. }));
    }

    #[test]
    fn chunkless_spec_fails() {
        let err = Spec::from_args(&args(&["--spec-num-chunks", "0"])).unwrap_err();
        assert!(matches!(err, LaunchError::IncompleteSpec { .. }));
    }

    #[test]
    fn malformed_required_value_is_reported() {
        let err = Spec::from_args(&args(&["--spec-num-chunks", "two", "--spec-chunk-0", "A"]))
            .unwrap_err();
        assert!(matches!(err, LaunchError::MalformedArgument { .. }));
    }

    #[test]
    fn malformed_version_occurrence_is_dropped() {
        let spec = Spec::from_args(&args(&[
            "--spec-version=x7",
            "--spec-num-chunks",
            "1",
            "--spec-chunk-0",
            "A",
        ]))
        .unwrap();
        assert_eq!(spec.version, 0);
    }

    #[test]
    fn unrelated_arguments_are_skipped() {
        let spec = Spec::from_args(&args(&[
            "--verbose",
            "--spec-num-chunks=1",
            "positional",
            "--spec-chunk-0=A",
            "--spec-sha256sum",
            "deadbeef",
        ]))
        .unwrap();
        assert_eq!(spec.num_chunks, 1);
        assert_eq!(spec.chunks, ["A"]);
        assert_eq!(spec.sha256sum, "deadbeef");
    }

    #[test]
    fn optional_fields_default_when_absent() {
        let spec = Spec::from_args(&args(&["--spec-num-chunks=1", "--spec-chunk-0=A"])).unwrap();
        assert_eq!(spec.version, 0);
        assert_eq!(spec.sha256sum, "");
    }

    #[test]
    fn chunk_value_keeps_embedded_equals_signs() {
        let spec = Spec::from_args(&args(&["--spec-num-chunks=1", "--spec-chunk-0=YQ=="])).unwrap();
        assert_eq!(spec.chunks, ["YQ=="]);
    }
}
