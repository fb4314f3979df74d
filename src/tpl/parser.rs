use crate::error::{Result, TemplateError};
use crate::tpl::ast::{BlockOccurrence, ExtractionResult, strip_occurrences};
use std::collections::HashMap;
use std::ops::Range;
use tracing::{trace, warn};

const BLOCK_OPEN: &str = "[[#";
const BLOCK_CLOSE: &str = "[[/";
const MARKER_END: &str = "]]";

struct RawMatch<'a> {
    name: &'a str,
    span: Range<usize>,
    body: Range<usize>,
}

/// Finds every `[[#NAME]]…[[/NAME]]` block in `subject`, at any depth.
///
/// Returns `None` when the subject holds no block. Nesting deeper than
/// `max_depth` levels is rejected.
pub fn extract_blocks(subject: &str, max_depth: usize) -> Result<Option<ExtractionResult>> {
    let extracted = extract_at_depth(subject, 1, max_depth)?;
    if let Some(result) = &extracted {
        trace!(
            blocks = result.blocks.len(),
            top_level = result.occurrences.len(),
            "blocks extracted"
        );
    }
    Ok(extracted)
}

fn extract_at_depth(
    subject: &str,
    depth: usize,
    max_depth: usize,
) -> Result<Option<ExtractionResult>> {
    let matches = scan_blocks(subject);
    if matches.is_empty() {
        return Ok(None);
    }
    if depth > max_depth {
        warn!(limit = max_depth, "block nesting too deep");
        return Err(TemplateError::DepthExceeded { limit: max_depth });
    }

    let mut result = ExtractionResult::default();
    for found in matches {
        let body = &subject[found.body];
        match extract_at_depth(body, depth + 1, max_depth)? {
            Some(inner) => {
                let clear = strip_occurrences(body, &inner.occurrences);
                result.blocks.insert(found.name.to_string(), clear);
                result.blocks.extend(inner.blocks);
            }
            None => {
                result.blocks.insert(found.name.to_string(), body.to_string());
            }
        }
        result.occurrences.push(BlockOccurrence {
            name: found.name.to_string(),
            raw: subject[found.span].to_string(),
        });
    }
    Ok(Some(result))
}

/// Top-level, non-overlapping matches, left to right.
fn scan_blocks(subject: &str) -> Vec<RawMatch<'_>> {
    let mut scanner = Scanner::new(subject);
    let mut found = Vec::new();
    let mut pos = 0;
    while let Some(offset) = subject[pos..].find(BLOCK_OPEN) {
        let start = pos + offset;
        match scanner.match_block(start) {
            Some(m) => {
                pos = m.span.end;
                found.push(m);
            }
            None => pos = start + 1,
        }
    }
    found
}

/// Result of the last forward search for one needle.
#[derive(Debug, Clone, Copy, Default)]
enum Lookahead {
    #[default]
    Unknown,
    At(usize),
    Absent,
}

impl Lookahead {
    /// First `needle` at or after `from`. Calls must come with a
    /// non-decreasing `from`, so a miss stays a miss.
    fn find(&mut self, haystack: &str, from: usize, needle: &str) -> Option<usize> {
        match *self {
            Lookahead::Absent => return None,
            Lookahead::At(at) if at >= from => return Some(at),
            _ => {}
        }
        let found = haystack[from..].find(needle).map(|at| from + at);
        *self = found.map_or(Lookahead::Absent, Lookahead::At);
        found
    }
}

/// Block matcher over one subject. Openers are tried left to right, so the
/// searches for `]]` and for each `[[/NAME]]` only ever move forward.
struct Scanner<'a> {
    subject: &'a str,
    marker_end: Lookahead,
    closes: HashMap<&'a str, (String, Lookahead)>,
}

impl<'a> Scanner<'a> {
    fn new(subject: &'a str) -> Self {
        Self {
            subject,
            marker_end: Lookahead::default(),
            closes: HashMap::new(),
        }
    }

    /// Matches one block opening at `start`.
    ///
    /// The name runs up to the first `]]` and the body up to the first
    /// `[[/NAME]]` after it. Both must be at least one character long.
    fn match_block(&mut self, start: usize) -> Option<RawMatch<'a>> {
        let subject = self.subject;
        let name_start = start + BLOCK_OPEN.len();
        let name_end = self
            .marker_end
            .find(subject, after_first_char(subject, name_start)?, MARKER_END)?;
        let name = &subject[name_start..name_end];

        let body_start = name_end + MARKER_END.len();
        let body_from = after_first_char(subject, body_start)?;
        let (close, ahead) = self.closes.entry(name).or_insert_with(|| {
            let close = format!("{BLOCK_CLOSE}{name}{MARKER_END}");
            (close, Lookahead::Unknown)
        });
        let body_end = ahead.find(subject, body_from, close)?;

        Some(RawMatch {
            name,
            span: start..body_end + close.len(),
            body: body_start..body_end,
        })
    }
}

fn after_first_char(subject: &str, at: usize) -> Option<usize> {
    Some(at + subject[at..].chars().next()?.len_utf8())
}
