use crate::error::Result;
use crate::tpl::render_context::Context;
use std::ops::Range;

const TAG_OPEN: &str = "{{";
const TAG_CLOSE: &str = "}}";
const PREDEFINED_OPEN: &str = "{{#";
const VALUES_OPEN: &str = "=[";
const DELIMITER_CLAUSE: &str = "delimiter=[";
const CLAUSE_END: &str = "]}}";

/// Runs both substitution passes over one unit of text.
pub(crate) fn substitute(text: &str, ctx: &Context) -> Result<String> {
    let text = replace_tags(text, ctx)?;
    Ok(replace_predefined(&text, ctx))
}

/// Replaces every plain `{{TAG}}` with its stringified value.
pub(crate) fn replace_tags(text: &str, ctx: &Context) -> Result<String> {
    let tag_char = ctx.options().tag_char;
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find(TAG_OPEN) {
        out.push_str(&rest[..start]);
        let after = &rest[start + TAG_OPEN.len()..];
        let tag_len = after.find(|c: char| !tag_char(c)).unwrap_or(after.len());

        if after[tag_len..].starts_with(TAG_CLOSE) {
            out.push_str(&ctx.resolve(&after[..tag_len])?);
            rest = &after[tag_len + TAG_CLOSE.len()..];
        } else {
            // Not a tag here; a tag may still start on the next brace.
            out.push('{');
            rest = &rest[start + 1..];
        }
    }
    out.push_str(rest);
    Ok(out)
}

struct PredefinedMatch {
    end: usize,
    tag: Range<usize>,
    values: Range<usize>,
    delimiter: Option<Range<usize>>,
}

/// Replaces every `{{#TAG=[V0|V1|…] delimiter=[D]}}` with the option picked by
/// the integer value of `TAG`, or the first option when there is no such index.
pub(crate) fn replace_predefined(text: &str, ctx: &Context) -> String {
    let closers = Closers::scan(text);
    let mut out = String::with_capacity(text.len());
    let mut copied = 0;
    let mut pos = 0;

    while let Some(offset) = text[pos..].find(PREDEFINED_OPEN) {
        let start = pos + offset;
        match match_predefined(text, start, ctx.options().tag_char, &closers) {
            Some(m) => {
                out.push_str(&text[copied..start]);
                out.push_str(select_option(text, &m, ctx));
                copied = m.end;
                pos = m.end;
            }
            None => pos = start + 1,
        }
    }
    out.push_str(&text[copied..]);
    out
}

fn select_option<'t>(text: &'t str, m: &PredefinedMatch, ctx: &Context) -> &'t str {
    let delimiter = match &m.delimiter {
        Some(range) => &text[range.clone()],
        None => ctx.options().default_delimiter.as_str(),
    };
    let options: Vec<&str> = text[m.values.clone()].split(delimiter).collect();
    ctx.index(&text[m.tag.clone()])
        .and_then(|i| options.get(i))
        .or_else(|| options.first())
        .copied()
        .unwrap_or_default()
}

/// Every `]` of one text that the rest of a predefined marker can follow.
///
/// Whether a `]` closes an option list does not depend on where the marker
/// opened, so one pass over the text answers it for every opening.
struct Closers {
    positions: Vec<usize>,
}

impl Closers {
    fn scan(text: &str) -> Self {
        let last_clause_end = text.rfind(CLAUSE_END);
        let positions = text
            .match_indices(']')
            .map(|(at, _)| at)
            .filter(|&at| tail_fits(text, at + 1, last_clause_end))
            .collect();
        Self { positions }
    }

    /// First usable `]` at or after `from`.
    fn first_from(&self, from: usize) -> Option<usize> {
        let i = self.positions.partition_point(|&at| at < from);
        self.positions.get(i).copied()
    }
}

fn tail_fits(text: &str, pos: usize, last_clause_end: Option<usize>) -> bool {
    clause_fits(text, pos, last_clause_end)
        || text
            .as_bytes()
            .get(pos)
            .is_some_and(|&b| is_space(b) && clause_fits(text, pos + 1, last_clause_end))
}

fn clause_fits(text: &str, pos: usize, last_clause_end: Option<usize>) -> bool {
    let rest = &text[pos..];
    rest.starts_with(TAG_CLOSE)
        || (rest.starts_with(DELIMITER_CLAUSE)
            && last_clause_end.is_some_and(|at| at > pos + DELIMITER_CLAUSE.len()))
}

/// Matches one predefined tag opening at `start`.
///
/// The option list is the shortest run (at least one character) ending in a `]`
/// that can be followed by the rest of the marker: `}}`, or an optional
/// whitespace character and a `delimiter=[D]}}` clause.
fn match_predefined(
    text: &str,
    start: usize,
    tag_char: fn(char) -> bool,
    closers: &Closers,
) -> Option<PredefinedMatch> {
    let tag_start = start + PREDEFINED_OPEN.len();
    let tag_len = text[tag_start..]
        .find(|c: char| !tag_char(c))
        .unwrap_or(text.len() - tag_start);
    if tag_len == 0 {
        return None;
    }
    let tag_end = tag_start + tag_len;
    if !text[tag_end..].starts_with(VALUES_OPEN) {
        return None;
    }

    let values_start = tag_end + VALUES_OPEN.len();
    let values_end = closers.first_from(values_start + 1)?;
    let (end, delimiter) = match_tail(text, values_end + 1)?;
    Some(PredefinedMatch {
        end,
        tag: tag_start..tag_end,
        values: values_start..values_end,
        delimiter,
    })
}

/// Everything after the option list's `]`.
fn match_tail(text: &str, pos: usize) -> Option<(usize, Option<Range<usize>>)> {
    match_clause(text, pos).or_else(|| {
        let next = *text.as_bytes().get(pos)?;
        if is_space(next) {
            match_clause(text, pos + 1)
        } else {
            None
        }
    })
}

fn match_clause(text: &str, pos: usize) -> Option<(usize, Option<Range<usize>>)> {
    let rest = &text[pos..];
    if rest.starts_with(TAG_CLOSE) {
        return Some((pos + TAG_CLOSE.len(), None));
    }
    if !rest.starts_with(DELIMITER_CLAUSE) {
        return None;
    }

    let delimiter_start = pos + DELIMITER_CLAUSE.len();
    let search_from = delimiter_start + text[delimiter_start..].chars().next()?.len_utf8();
    let delimiter_end = search_from + text[search_from..].find(CLAUSE_END)?;
    Some((
        delimiter_end + CLAUSE_END.len(),
        Some(delimiter_start..delimiter_end),
    ))
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\x0B' | b'\x0C' | b'\r')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data;
    use crate::models::options::TemplaterOptions;
    use crate::values::value::Data;
    use std::time::{Duration, Instant};

    fn run(text: &str, data: &Data) -> String {
        let options = TemplaterOptions::default();
        substitute(text, &Context::new(data, &options)).unwrap()
    }

    #[test]
    fn test_plain_tags() {
        let data = data! { "greeting" => "Hello", "name" => "John" };
        assert_eq!(run("{{greeting}}, {{name}}!", &data), "Hello, John!");
    }

    #[test]
    fn test_plain_tag_edge_cases() {
        let data = data! { "a" => "A", "list" => vec!["x", "y"] };
        assert_eq!(run("[{{}}][{{missing}}]", &data), "[][]");
        assert_eq!(run("{{{a}}}", &data), "{A}");
        assert_eq!(run("{{ a }} {{a.b}}", &data), "{{ a }} {{a.b}}");
        assert_eq!(run("{{list}}", &data), "xy");
        assert_eq!(run("unclosed {{a", &data), "unclosed {{a");
    }

    #[test]
    fn test_predefined_tags() {
        let tpl = "{{#class=[zero|one|two|three]}}";
        assert_eq!(run(tpl, &data! { "class" => 2 }), "two");
        assert_eq!(run(tpl, &data! { "class" => 10 }), "zero");
        assert_eq!(run(tpl, &data! { "class" => "1" }), "one");
        assert_eq!(run(tpl, &data! { "class" => -1 }), "zero");
        assert_eq!(run(tpl, &Data::new()), "zero");
    }

    #[test]
    fn test_predefined_custom_delimiter() {
        let data = data! { "id" => 1 };
        assert_eq!(run("{{#id=[*foo*bar] delimiter=[*]}}", &data), "foo");
        assert_eq!(run("{{#id=[a;;b]delimiter=[;;]}}", &data), "b");
        assert_eq!(run("{{#id=[a|b]\tdelimiter=[,]}}", &data), "a|b");
    }

    #[test]
    fn test_predefined_runs_after_plain_tags() {
        let data = data! { "opts" => "x|y", "pick" => 1 };
        assert_eq!(run("{{#pick=[{{opts}}]}}", &data), "y");
    }

    #[test]
    fn test_predefined_malformed_left_alone() {
        let data = data! { "a" => 1 };
        assert_eq!(run("{{#=[x|y]}}", &data), "{{#=[x|y]}}");
        assert_eq!(run("{{#a=[]}}", &data), "{{#a=[]}}");
        assert_eq!(run("{{#a=[x|y]  }}", &data), "{{#a=[x|y]  }}");
    }

    #[test]
    fn test_predefined_single_space_before_close() {
        assert_eq!(run("{{#a=[x|y] }}", &data! { "a" => 1 }), "y");
    }

    #[test]
    fn test_predefined_option_list_may_contain_brackets() {
        let data = data! { "a" => 1 };
        assert_eq!(run("{{#a=[x]|[y]}}", &data), "[y");
    }

    #[test]
    fn test_unterminated_clauses_scan_in_linear_time() {
        let data = data! { "a" => 1 };
        let text = "{{#a=[x]delimiter=[".repeat(4000);

        let started = Instant::now();
        assert_eq!(run(&text, &data), text);
        assert_eq!(run(&format!("{text}]}}}}"), &data), "x");
        assert_eq!(run(&format!("{text} }}}}"), &data), format!("{text} }}}}"));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_delimiter_clause_picks_first_terminator() {
        let data = data! { "a" => 1 };
        assert_eq!(run("{{#a=[x;y] delimiter=[;]}}]}}", &data), "y]}}");
        assert_eq!(run("{{#a=[xéy] delimiter=[é]}}", &data), "y");
    }

    #[test]
    fn test_configured_default_delimiter() {
        let options = TemplaterOptions::new().default_delimiter(",");
        let data = data! { "a" => 1 };
        let out = substitute("{{#a=[x,y]}}", &Context::new(&data, &options)).unwrap();
        assert_eq!(out, "y");
    }
}
