//! Block-style YAML rendering with provenance comments.
//!
//! [`ProvenanceRenderer`] walks a [`Tree`], emitting every [`Parameter`] as its
//! bare value. When comments are on, the parameter's origin is written next to
//! the value:
//!
//! ```yaml
//! paramString: value1 # system
//! # file
//! multiLineParam: |-
//!   line1
//!   line2
//! ```
//!
//! Sequence items never carry comments; only mapping values do.
//!
//! [`Parameter`]: crate::Parameter

use crate::defaults::default_uncommented_files;
use crate::parameter::{Node, Scalar, Tree};
use std::path::Path;

const INDENT: usize = 2;

/// Decides whether provenance comments may be written for a destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentPolicy {
    enabled: bool,
    excluded_files: Vec<String>,
}

impl CommentPolicy {
    /// Policy with the given switch and the default exclusions (`mapping.yaml`).
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            excluded_files: default_uncommented_files().into_vec(),
        }
    }

    /// Policy that never writes comments.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// Replace the set of file names that are always written without comments.
    #[must_use]
    pub fn with_excluded_files<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_files = names.into_iter().map(Into::into).collect();
        self
    }

    /// Global switch.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// File names that force comments off.
    #[must_use]
    pub fn excluded_files(&self) -> &[String] {
        &self.excluded_files
    }

    /// True when `file_name` is on the exclusion list.
    #[must_use]
    pub fn is_excluded(&self, file_name: &str) -> bool {
        self.excluded_files.iter().any(|n| n == file_name)
    }

    /// Whether comments are allowed when writing `destination`.
    ///
    /// `requested` is the caller's intent; the exclusion list always wins.
    #[must_use]
    pub fn allows(&self, destination: &Path, requested: bool) -> bool {
        let excluded = destination
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| self.is_excluded(n));
        requested && !excluded
    }

    /// [`allows`](Self::allows) using the policy's own switch as the intent.
    #[must_use]
    pub fn allows_default(&self, destination: &Path) -> bool {
        self.allows(destination, self.enabled)
    }
}

impl Default for CommentPolicy {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Renders trees to YAML text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvenanceRenderer {
    comments: bool,
}

impl ProvenanceRenderer {
    /// Renderer with provenance comments on or off.
    #[must_use]
    pub const fn new(comments: bool) -> Self {
        Self { comments }
    }

    /// Renderer that emits values only.
    #[must_use]
    pub const fn without_comments() -> Self {
        Self::new(false)
    }

    /// Whether this renderer emits comments.
    #[must_use]
    pub const fn comments(&self) -> bool {
        self.comments
    }

    /// Render a tree as a complete YAML document.
    #[must_use]
    pub fn render(&self, tree: &Tree) -> String {
        if tree.is_empty() {
            return "{}\n".to_owned();
        }
        let mut emitter = Emitter {
            out: String::new(),
            comments: self.comments,
        };
        emitter.mapping(tree, 0, false);
        emitter.out
    }
}

struct Emitter {
    out: String,
    comments: bool,
}

impl Emitter {
    /// Writes indentation, unless the line was already opened by a `- ` marker.
    fn pad(&mut self, indent: usize, lead: &mut bool) {
        if *lead {
            *lead = false;
        } else {
            self.out.extend(std::iter::repeat(' ').take(indent));
        }
    }

    fn mapping(&mut self, map: &Tree, indent: usize, mut lead: bool) {
        for (key, node) in map {
            let value = node.unwrapped();
            // Only scalar values carry an origin comment.
            let origin = match (node, value) {
                (Node::Parameter(p), Node::Scalar(_)) if self.comments => p.provenance(),
                _ => None,
            };
            let multiline = matches!(value, Node::Scalar(s) if s.is_multiline());

            if let (Some(origin), true) = (origin, multiline) {
                self.pad(indent, &mut lead);
                self.block_comment(origin, indent);
            }

            self.pad(indent, &mut lead);
            self.key(key);
            self.out.push(':');
            self.value(value, indent, if multiline { None } else { origin });
        }
    }

    fn sequence(&mut self, items: &[Node], indent: usize, mut lead: bool) {
        for item in items {
            let value = item.unwrapped();
            self.pad(indent, &mut lead);
            self.out.push('-');
            match value {
                Node::Mapping(map) if !map.is_empty() => {
                    self.out.push(' ');
                    self.mapping(map, indent + INDENT, true);
                }
                Node::Sequence(nested) if !nested.is_empty() => {
                    self.out.push(' ');
                    self.sequence(nested, indent + INDENT, true);
                }
                other => self.value(other, indent, None),
            }
        }
    }

    /// Writes everything after `key:` or `-` through the end of the value.
    fn value(&mut self, value: &Node, indent: usize, comment: Option<&str>) {
        match value {
            Node::Scalar(scalar) => {
                self.out.push(' ');
                self.scalar(scalar, indent, comment);
            }
            Node::Mapping(map) if map.is_empty() => {
                self.out.push_str(" {}");
                self.end_line(comment);
            }
            Node::Sequence(items) if items.is_empty() => {
                self.out.push_str(" []");
                self.end_line(comment);
            }
            Node::Mapping(map) => {
                self.end_line(comment);
                self.mapping(map, indent + INDENT, false);
            }
            Node::Sequence(items) => {
                self.end_line(comment);
                self.sequence(items, indent, false);
            }
            Node::Parameter(p) => self.value(p.value().unwrapped(), indent, comment),
        }
    }

    fn scalar(&mut self, scalar: &Scalar, indent: usize, comment: Option<&str>) {
        match scalar {
            Scalar::Null => self.out.push_str("null"),
            Scalar::Bool(b) => self.out.push_str(if *b { "true" } else { "false" }),
            Scalar::Int(i) => {
                self.out.push_str(&i.to_string());
            }
            Scalar::Float(f) => self.out.push_str(&format_float(*f)),
            Scalar::String(s) => match string_style(s) {
                Style::Literal => {
                    self.literal(s, indent, comment);
                    return;
                }
                Style::Plain => self.out.push_str(s),
                Style::SingleQuoted => single_quoted(&mut self.out, s),
                Style::DoubleQuoted => double_quoted(&mut self.out, s),
            },
        }
        self.end_line(comment);
    }

    fn literal(&mut self, text: &str, indent: usize, comment: Option<&str>) {
        let body = text.trim_end_matches('\n');
        let trailing = text.len() - body.len();
        self.out.push('|');
        match trailing {
            0 => self.out.push('-'),
            1 => {}
            _ => self.out.push('+'),
        }
        self.end_line(comment);

        for line in body.split('\n') {
            if !line.is_empty() {
                self.out.extend(std::iter::repeat(' ').take(indent + INDENT));
                self.out.push_str(line);
            }
            self.out.push('\n');
        }
        for _ in 1..trailing {
            self.out.push('\n');
        }
    }

    fn key(&mut self, key: &str) {
        match string_style(key) {
            Style::Plain => self.out.push_str(key),
            Style::SingleQuoted => single_quoted(&mut self.out, key),
            Style::DoubleQuoted | Style::Literal => double_quoted(&mut self.out, key),
        }
    }

    fn end_line(&mut self, comment: Option<&str>) {
        if let Some(comment) = comment {
            self.out.push_str(" # ");
            let flat: String = comment
                .chars()
                .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
                .collect();
            self.out.push_str(flat.trim_end());
        }
        self.out.push('\n');
    }

    /// Writes `# line` for each origin line. The first line's indent is already out.
    fn block_comment(&mut self, origin: &str, indent: usize) {
        for (i, line) in origin.lines().enumerate() {
            if i > 0 {
                self.out.extend(std::iter::repeat(' ').take(indent));
            }
            self.out.push_str("# ");
            self.out.push_str(line.trim_end());
            self.out.push('\n');
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
}

fn string_style(s: &str) -> Style {
    if s.chars().any(needs_escape) {
        return Style::DoubleQuoted;
    }
    if s.contains('\n') {
        return if literal_ok(s) {
            Style::Literal
        } else {
            Style::DoubleQuoted
        };
    }
    if plain_ok(s) {
        Style::Plain
    } else {
        Style::SingleQuoted
    }
}

fn needs_escape(c: char) -> bool {
    (c.is_control() && c != '\n' && c != '\t')
        || matches!(c, '\u{2028}' | '\u{2029}' | '\u{feff}')
}

fn literal_ok(s: &str) -> bool {
    let body = s.trim_end_matches('\n');
    !body.is_empty() && !body.starts_with([' ', '\n', '\t'])
}

fn plain_ok(s: &str) -> bool {
    let Some(first) = s.chars().next() else {
        return false;
    };
    if s.starts_with([' ', '\t']) || s.ends_with([' ', '\t']) || s.contains('\t') {
        return false;
    }
    if "[]{},#&*!|>'\"%@`".contains(first) {
        return false;
    }
    if matches!(first, '-' | '?' | ':') {
        let second = s.chars().nth(1);
        if second.map_or(true, |c| c == ' ') {
            return false;
        }
    }
    if s.starts_with("---") || s.starts_with("...") {
        return false;
    }
    if s.contains(": ") || s.contains(" #") || s.ends_with(':') {
        return false;
    }
    !resolves_to_non_string(s)
}

/// True when a plain scalar with this text would load as something other than a string.
fn resolves_to_non_string(s: &str) -> bool {
    let lower = s.to_ascii_lowercase();
    if matches!(
        lower.as_str(),
        "~" | "null" | "true" | "false" | "yes" | "no" | "on" | "off" | "y" | "n" | "<<" | "="
    ) {
        return true;
    }
    let unsigned = lower.trim_start_matches(['+', '-']);
    if matches!(unsigned, ".inf" | ".nan")
        || unsigned.starts_with("0x")
        || unsigned.starts_with("0o")
        || unsigned.starts_with("0b")
    {
        return true;
    }
    if s.parse::<f64>().is_ok() {
        return true;
    }
    s.chars().any(|c| c.is_ascii_digit())
        && s.chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | '_' | ':' | 'e' | 'E'))
}

fn single_quoted(out: &mut String, s: &str) {
    out.push('\'');
    out.push_str(&s.replace('\'', "''"));
    out.push('\'');
}

fn double_quoted(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c if needs_escape(c) => {
                let code = c as u32;
                if code <= 0xFF {
                    out.push_str(&format!("\\x{:02X}", code));
                } else {
                    out.push_str(&format!("\\u{:04X}", code));
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        ".nan".to_owned()
    } else if f.is_infinite() {
        (if f > 0.0 { ".inf" } else { "-.inf" }).to_owned()
    } else if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        format!("{:?}", f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::Parameter;

    fn tree(entries: Vec<(&str, Node)>) -> Tree {
        entries.into_iter().map(|(k, v)| (k.to_owned(), v)).collect()
    }

    fn annotated(value: impl Into<Node>, origin: &str) -> Node {
        Parameter::new(value).with_origin(origin).into()
    }

    fn commented(t: &Tree) -> String {
        ProvenanceRenderer::new(true).render(t)
    }

    #[test]
    fn inline_comment_on_scalar() {
        let t = tree(vec![("paramString", annotated("value1", "system"))]);
        assert_eq!(commented(&t), "paramString: value1 # system\n");
    }

    #[test]
    fn block_comment_before_multiline_key() {
        let t = tree(vec![("multiLineParam", annotated("line1\nline2", "fileA"))]);
        assert_eq!(
            commented(&t),
            "# fileA\nmultiLineParam: |-\n  line1\n  line2\n"
        );
    }

    #[test]
    fn literal_chomping_indicators() {
        let t = tree(vec![
            ("clip", Node::from("a\nb\n")),
            ("keep", Node::from("a\nb\n\n")),
            ("blank", Node::from("a\n\nb")),
        ]);
        assert_eq!(
            ProvenanceRenderer::without_comments().render(&t),
            "clip: |\n  a\n  b\nkeep: |+\n  a\n  b\n\nblank: |-\n  a\n\n  b\n"
        );
    }

    #[test]
    fn blank_and_missing_origins_emit_nothing() {
        let t = tree(vec![
            ("blank", annotated("noComment", "")),
            ("missing", Parameter::new("noComment2").into()),
        ]);
        assert_eq!(commented(&t), "blank: noComment\nmissing: noComment2\n");
    }

    #[test]
    fn comments_disabled_drops_origins() {
        let t = tree(vec![
            ("a", annotated("value1", "system")),
            ("b", annotated("x\ny", "file")),
        ]);
        let out = ProvenanceRenderer::without_comments().render(&t);
        assert!(!out.contains('#'));
        assert_eq!(out, "a: value1\nb: |-\n  x\n  y\n");
    }

    #[test]
    fn raw_values_and_scalars() {
        let t = tree(vec![
            ("stringValue", Node::from("plainText")),
            ("intValue", Node::from(100i64)),
            ("booleanValue", Node::from(true)),
            ("nullValue", Node::null()),
            ("floatValue", Node::from(2.0f64)),
            ("mergeExample", Node::from("!merge")),
        ]);
        assert_eq!(
            commented(&t),
            "stringValue: plainText\nintValue: 100\nbooleanValue: true\nnullValue: null\n\
             floatValue: 2.0\nmergeExample: '!merge'\n"
        );
    }

    #[test]
    fn ambiguous_strings_are_quoted() {
        let t = tree(vec![
            ("a", Node::from("true")),
            ("b", Node::from("123")),
            ("c", Node::from("")),
            ("d", Node::from("it's: here")),
            ("e", Node::from("tab\there")),
            ("f", Node::from("bell\u{7}")),
            ("g", Node::from(" padded")),
        ]);
        assert_eq!(
            commented(&t),
            "a: 'true'\nb: '123'\nc: ''\nd: 'it''s: here'\ne: 'tab\there'\nf: \"bell\\x07\"\ng: ' padded'\n"
        );
    }

    #[test]
    fn sequences_are_unwrapped_without_comments() {
        let t = tree(vec![
            (
                "mixedList",
                Node::Sequence(vec![
                    8080i64.into(),
                    annotated(9090i64, "config"),
                    "text".into(),
                    annotated("text2", "runtime"),
                ]),
            ),
            ("emptyList", Node::Sequence(Vec::new())),
            ("emptyMap", Node::Mapping(Tree::new())),
        ]);
        assert_eq!(
            commented(&t),
            "mixedList:\n- 8080\n- 9090\n- text\n- text2\nemptyList: []\nemptyMap: {}\n"
        );
    }

    #[test]
    fn list_of_maps_keeps_inner_comments() {
        let first = tree(vec![
            ("name", annotated("dev", "profile")),
            ("enabled", true.into()),
        ]);
        let second = tree(vec![
            ("name", annotated("prod", "profile")),
            ("enabled", false.into()),
        ]);
        let t = tree(vec![(
            "listOfMaps",
            Node::Sequence(vec![Node::Mapping(first), Node::Mapping(second)]),
        )]);
        assert_eq!(
            commented(&t),
            "listOfMaps:\n- name: dev # profile\n  enabled: true\n- name: prod # profile\n  enabled: false\n"
        );
    }

    #[test]
    fn nested_structures() {
        let level1 = tree(vec![(
            "level1",
            Node::Mapping(tree(vec![("level2", annotated("deepValue", "deepOrigin"))])),
        )]);
        let wrapping = tree(vec![("innerKey", annotated("innerValue", "innerOrigin"))]);
        let t = tree(vec![
            ("nestedMap", Node::Mapping(level1)),
            ("paramWrappingMap", annotated(Node::Mapping(wrapping), "outerOrigin")),
            (
                "paramWrappingList",
                annotated(
                    Node::Sequence(vec![annotated("inside1", "listOrigin"), "plainInside".into()]),
                    "outerListOrigin",
                ),
            ),
            (
                "grid",
                Node::Sequence(vec![Node::Sequence(vec![1i64.into(), 2i64.into()])]),
            ),
        ]);
        assert_eq!(
            commented(&t),
            "nestedMap:\n  level1:\n    level2: deepValue # deepOrigin\n\
             paramWrappingMap:\n  innerKey: innerValue # innerOrigin\n\
             paramWrappingList:\n- inside1\n- plainInside\n\
             grid:\n- - 1\n  - 2\n"
        );
    }

    #[test]
    fn block_comment_on_first_key_of_list_item() {
        let item = tree(vec![("script", annotated("a\nb", "hooks"))]);
        let t = tree(vec![("steps", Node::Sequence(vec![Node::Mapping(item)]))]);
        assert_eq!(
            commented(&t),
            "steps:\n- # hooks\n  script: |-\n    a\n    b\n"
        );
    }

    #[test]
    fn multiline_origin_becomes_multiple_comment_lines() {
        let t = tree(vec![
            ("block", annotated("x\ny", "first\nsecond")),
            ("inline", annotated("v", "first\nsecond")),
        ]);
        assert_eq!(
            commented(&t),
            "# first\n# second\nblock: |-\n  x\n  y\ninline: v # first second\n"
        );
    }

    #[test]
    fn awkward_multiline_falls_back_to_double_quotes() {
        let t = tree(vec![("k", annotated("  indented\nnext", "src"))]);
        assert_eq!(commented(&t), "# src\nk: \"  indented\\nnext\"\n");
    }

    #[test]
    fn container_values_carry_no_origin_comment() {
        let t = tree(vec![
            ("m", annotated(Node::Mapping(tree(vec![("k", "v".into())])), "outer")),
            ("l", annotated(Node::Sequence(vec![1i64.into()]), "lst")),
            ("e", annotated(Node::Mapping(Tree::new()), "empty")),
            ("s", annotated(Node::Sequence(Vec::new()), "none")),
        ]);
        let out = commented(&t);
        assert!(!out.contains('#'), "unexpected comment in:\n{out}");
        assert_eq!(out, "m:\n  k: v\nl:\n- 1\ne: {}\ns: []\n");
    }

    #[test]
    fn integer_and_escape_formatting() {
        let t = tree(vec![
            ("min", Node::from(i64::MIN)),
            ("sep", Node::from("a\u{2028}b")),
            ("bell", Node::from("\u{7}")),
        ]);
        assert_eq!(
            ProvenanceRenderer::without_comments().render(&t),
            "min: -9223372036854775808\nsep: \"a\\u2028b\"\nbell: \"\\x07\"\n"
        );
    }

    #[test]
    fn empty_tree_renders_empty_mapping() {
        assert_eq!(commented(&Tree::new()), "{}\n");
    }

    #[test]
    fn rendered_output_loads_back() {
        let t = tree(vec![
            ("a", annotated("value1", "system")),
            ("b", annotated("l1\nl2\n", "file")),
            ("c", Node::Sequence(vec![annotated("x", "o"), 3i64.into()])),
            ("d: e", Node::from("#hash")),
        ]);
        let loaded: serde_yaml::Value = serde_yaml::from_str(&commented(&t)).unwrap();
        let expected = serde_yaml::to_value(&t).unwrap();
        assert_eq!(loaded, expected);
    }

    #[test]
    fn policy_excludes_mapping_yaml() {
        let policy = CommentPolicy::new(true);
        assert!(policy.allows(Path::new("/out/parameters.yaml"), true));
        assert!(!policy.allows(Path::new("/out/mapping.yaml"), true));
        assert!(!policy.allows(Path::new("/out/parameters.yaml"), false));
        assert!(policy.allows_default(Path::new("values.yaml")));
        assert!(!CommentPolicy::disabled().allows_default(Path::new("values.yaml")));
    }

    #[test]
    fn policy_exclusions_are_configurable() {
        let policy = CommentPolicy::new(true).with_excluded_files(["raw.yaml"]);
        assert!(policy.allows(Path::new("mapping.yaml"), true));
        assert!(!policy.allows(Path::new("dir/raw.yaml"), true));
        assert_eq!(policy.excluded_files(), ["raw.yaml".to_owned()]);
    }

    #[test]
    fn float_formatting() {
        assert_eq!(format_float(1.5), "1.5");
        assert_eq!(format_float(3.0), "3.0");
        assert_eq!(format_float(f64::INFINITY), ".inf");
        assert_eq!(format_float(f64::NEG_INFINITY), "-.inf");
        assert_eq!(format_float(f64::NAN), ".nan");
        assert_eq!(format_float(1e20), "1e20");
    }
}
