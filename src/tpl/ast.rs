use std::collections::HashMap;

/// One top-level `[[#NAME]]…[[/NAME]]` match, markers included.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockOccurrence {
    pub name: String,
    pub raw: String,
}

/// Blocks found in a template.
///
/// `blocks` maps every block name, at any depth, to its clear content: the body
/// with nested block regions cut out. When a name occurs more than once the last
/// parsed occurrence wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionResult {
    pub blocks: HashMap<String, String>,
    pub occurrences: Vec<BlockOccurrence>,
}

impl ExtractionResult {
    pub fn block(&self, name: &str) -> Option<&str> {
        self.blocks.get(name).map(String::as_str)
    }

    /// The template with every top-level block region removed.
    pub fn skeleton(&self, template: &str) -> String {
        strip_occurrences(template, &self.occurrences)
    }
}

/// Removes every occurrence of each raw match text, one match after another.
pub(crate) fn strip_occurrences(subject: &str, occurrences: &[BlockOccurrence]) -> String {
    let mut stripped = subject.to_string();
    for occurrence in occurrences {
        if stripped.contains(&occurrence.raw) {
            stripped = stripped.replace(&occurrence.raw, "");
        }
    }
    stripped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn occurrence(name: &str, raw: &str) -> BlockOccurrence {
        BlockOccurrence {
            name: name.into(),
            raw: raw.into(),
        }
    }

    #[test]
    fn test_strip_occurrences_removes_all_copies() {
        let occurrences = vec![occurrence("a", "[[#a]]x[[/a]]")];
        assert_eq!(
            strip_occurrences("1[[#a]]x[[/a]]2[[#a]]x[[/a]]3", &occurrences),
            "123"
        );
    }

    #[test]
    fn test_skeleton_and_lookup() {
        let mut result = ExtractionResult::default();
        result.blocks.insert("a".into(), "x".into());
        result.occurrences.push(occurrence("a", "[[#a]]x[[/a]]"));
        assert_eq!(result.skeleton("<[[#a]]x[[/a]]>"), "<>");
        assert_eq!(result.block("a"), Some("x"));
        assert_eq!(result.block("b"), None);
    }
}
