//! Keyword-driven re-indentation of stored view and rule definitions.
//!
//! Older servers return definitions on a single line. [`reformat`] breaks
//! them into a canonical multi-line layout: one pass over whitespace tokens,
//! with indentation driven by a fixed keyword-action table.

use crate::sql::QueryTokenizer;

/// How a keyword interacts with its neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordClass {
    Normal,
    /// `LEFT`, `RIGHT`, ...: swallows the following token.
    JoinModifier,
    Join,
    On,
    Union,
}

/// Formatting action for one keyword.
#[derive(Debug, Clone, Copy)]
pub struct KeywordAction {
    /// Keyword matched case-insensitively against the bare token.
    pub keyword: &'static str,
    /// Text emitted in place of the token.
    pub replacement: &'static str,
    /// Indent change applied before emitting.
    pub indent_before: i32,
    /// Indent change applied after emitting.
    pub indent_after: i32,
    pub class: KeywordClass,
    /// Start a new line (at the current indent) instead of a single space.
    pub line_break: bool,
}

const fn action(
    keyword: &'static str,
    replacement: &'static str,
    indent_before: i32,
    indent_after: i32,
    class: KeywordClass,
    line_break: bool,
) -> KeywordAction {
    KeywordAction { keyword, replacement, indent_before, indent_after, class, line_break }
}

/// The keyword-action table.
pub static KEYWORDS: &[KeywordAction] = &[
    action("WHERE", "  WHERE", -8, 8, KeywordClass::Normal, true),
    action("SELECT", " SELECT", 0, 8, KeywordClass::Normal, true),
    action("FROM", "   FROM", -8, 8, KeywordClass::Normal, true),
    action("LEFT", "   LEFT", -8, 13, KeywordClass::JoinModifier, true),
    action("RIGHT", "   RIGHT", -8, 13, KeywordClass::JoinModifier, true),
    action("NATURAL", "   NATURAL", -8, 13, KeywordClass::JoinModifier, true),
    action("FULL", "   FULL", -8, 13, KeywordClass::JoinModifier, true),
    action("CROSS", "   CROSS", -8, 13, KeywordClass::JoinModifier, true),
    action("UNION", "   UNION", -8, 13, KeywordClass::Union, true),
    action("JOIN", "   JOIN", -8, 13, KeywordClass::Join, true),
    action("ON", "ON", 0, -5, KeywordClass::On, false),
    action("ORDER", "  ORDER", -8, 8, KeywordClass::Normal, true),
    action("GROUP", "  GROUP", -8, 8, KeywordClass::Normal, true),
    action("HAVING", " HAVING", -8, 8, KeywordClass::Normal, true),
    action("LIMIT", "  LIMIT", -8, 8, KeywordClass::Normal, true),
    action("CASE", "CASE", 0, 4, KeywordClass::Normal, true),
    action("WHEN", "WHEN", 0, 0, KeywordClass::Normal, true),
    action("ELSE", "ELSE", 0, 0, KeywordClass::Normal, true),
    action("END", "END ", -4, 0, KeywordClass::Normal, true),
];

/// Used for an `ON` that follows another `ON` with no keyword in between.
pub static SECOND_ON: KeywordAction = action("ON", "ON", -5, 0, KeywordClass::On, true);

/// Return the definition as it should be displayed.
///
/// A non-empty `pretty_option` means the server already formats
/// definitions, so the text is returned untouched.
pub fn formatted_definition(definition: &str, pretty_option: Option<&str>) -> String {
    match pretty_option {
        Some(option) if !option.is_empty() => definition.to_string(),
        _ => reformat(definition),
    }
}

/// Re-indent a raw SQL definition.
pub fn reformat(raw: &str) -> String {
    let mut tokens = QueryTokenizer::whitespace(raw);
    let mut out = String::with_capacity(raw.len() * 2);
    let mut indent: i32 = 0;
    let mut was_on = false;
    let mut pending: Option<&str> = None;

    loop {
        let token = match pending.take().or_else(|| tokens.next()) {
            Some(token) => token,
            None => break,
        };

        let (leading, word, closing) = split_brackets(token);
        out.push_str(leading);
        let mut trailing = closing.to_string();

        match lookup(word, &mut was_on) {
            Some(action) => {
                if matches!(action.class, KeywordClass::Union | KeywordClass::JoinModifier) {
                    let next = tokens.next().unwrap_or("");
                    if action.class == KeywordClass::Union && !next.eq_ignore_ascii_case("JOIN") {
                        out.push_str("\nUNION\n");
                        indent = 0;
                        pending = Some(next);
                        continue;
                    }
                    trailing = format!("{next} {trailing}");
                }

                indent = (indent + action.indent_before).max(0);
                if action.line_break {
                    out.push('\n');
                    out.extend(std::iter::repeat(' ').take(indent as usize));
                } else {
                    out.push(' ');
                }
                out.push_str(action.replacement);
                indent = (indent + action.indent_after).max(0);
            }
            None => out.push_str(word),
        }

        out.push(' ');
        if !trailing.is_empty() {
            out.push_str(&trailing);
            out.push(' ');
        }
    }

    out
}

/// Split a token into the text up to and including its last `(`, the bare
/// word, and everything from the first `)` after that.
fn split_brackets(token: &str) -> (&str, &str, &str) {
    let (leading, rest) = match token.rfind('(') {
        Some(pos) => token.split_at(pos + 1),
        None => ("", token),
    };
    match rest.find(')') {
        Some(pos) => {
            let (word, closing) = rest.split_at(pos);
            (leading, word, closing)
        }
        None => (leading, rest, ""),
    }
}

fn lookup(word: &str, was_on: &mut bool) -> Option<&'static KeywordAction> {
    let action = KEYWORDS.iter().find(|a| a.keyword.eq_ignore_ascii_case(word))?;
    if action.class == KeywordClass::On && *was_on {
        return Some(&SECOND_ON);
    }
    *was_on = action.class == KeywordClass::On;
    Some(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// (indent, first word) for each non-blank line.
    fn layout(text: &str) -> Vec<(usize, String)> {
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                let indent = line.len() - line.trim_start().len();
                let word = line.split_whitespace().next().unwrap_or_default().to_string();
                (indent, word)
            })
            .collect()
    }

    #[test]
    fn test_select_with_left_join() {
        let out = reformat("SELECT a, b FROM t1 LEFT JOIN t2 ON t1.id=t2.id WHERE a > 1 ORDER BY b");
        assert_eq!(
            out,
            "\n SELECT a, b \n   FROM t1 \n   LEFT JOIN  t2  ON t1.id=t2.id \n  WHERE a > 1 \n  ORDER BY b "
        );

        let lines: Vec<&str> = out.lines().filter(|l| !l.is_empty()).collect();
        assert!(lines[0].trim_start().starts_with("SELECT"));
        assert!(lines[1].trim_start().starts_with("FROM"));
        assert!(lines[2].trim_start().starts_with("LEFT JOIN"));
        assert!(lines[2].contains(" ON "));
        assert!(lines[3].trim_start().starts_with("WHERE"));
        assert!(lines[4].trim_start().starts_with("ORDER BY"));

        let select_col = lines[0].find("SELECT").unwrap();
        let join_col = lines[2].find("LEFT").unwrap();
        assert!(join_col > select_col);
    }

    #[test]
    fn test_keywords_match_case_insensitively() {
        let out = reformat("select x from t where y");
        assert_eq!(out, "\n SELECT x \n   FROM t \n  WHERE y ");
    }

    #[test]
    fn test_unmatched_tokens_pass_through() {
        assert_eq!(reformat("foo bar"), "foo bar ");
        assert_eq!(reformat(""), "");
    }

    #[test]
    fn test_brackets_are_carried() {
        // Leading brackets precede the keyword's line break; closing
        // brackets follow the emitted token.
        let out = reformat("(SELECT a FROM t)");
        assert_eq!(out, "(\n SELECT a \n   FROM t ) ");

        assert_eq!(reformat("count(x)"), "count(x ) ");
        assert_eq!(reformat("f(g(x))"), "f(g(x )) ");
    }

    #[test]
    fn test_second_on_breaks_and_outdents() {
        let out = reformat("SELECT a FROM t JOIN u ON x ON y");
        assert_eq!(out, "\n SELECT a \n   FROM t \n   JOIN u  ON x \n   ON y ");

        // JOIN puts the indent at 13, ON drops it to 8, the second ON to 3.
        let out = reformat("SELECT a FROM t JOIN u ON x ON y WHERE z");
        let layout = layout(&out);
        assert_eq!(layout[3], (3, "ON".to_string()));
    }

    #[test]
    fn test_was_on_survives_plain_tokens_only() {
        // A keyword between the two ONs resets the pairing.
        let out = reformat("SELECT a FROM t JOIN u ON x JOIN v ON y");
        assert!(!out.lines().any(|line| line.trim_start().starts_with("ON")));
    }

    #[test]
    fn test_union_resets_indent_and_reprocesses_next_token() {
        let out = reformat("SELECT a FROM t UNION SELECT b FROM u");
        assert_eq!(out, "\n SELECT a \n   FROM t \nUNION\n\n SELECT b \n   FROM u ");
    }

    #[test]
    fn test_union_join_is_a_join_modifier() {
        let out = reformat("SELECT a FROM t UNION JOIN u ON x");
        assert_eq!(out, "\n SELECT a \n   FROM t \n   UNION JOIN  u  ON x ");
    }

    #[test]
    fn test_union_at_end_of_input() {
        assert_eq!(reformat("SELECT a UNION"), "\n SELECT a \nUNION\n ");
    }

    #[test]
    fn test_case_expression_indents() {
        let out = reformat("SELECT CASE WHEN a THEN b ELSE c END FROM t");
        assert_eq!(
            out,
            "\n SELECT \n        CASE \n            WHEN a THEN b \n            ELSE c \n        END  \n   FROM t "
        );
    }

    #[test]
    fn test_indent_never_negative() {
        let out = reformat("FROM a WHERE b");
        assert_eq!(out, "\n   FROM a \n  WHERE b ");
    }

    #[test]
    fn test_quoted_strings_stay_whole() {
        let out = reformat("SELECT 'from where' FROM t");
        assert_eq!(out, "\n SELECT 'from where' \n   FROM t ");
    }

    #[test]
    fn test_reformat_is_structurally_idempotent() {
        let inputs = [
            "SELECT a, b FROM t1 LEFT JOIN t2 ON t1.id=t2.id WHERE a > 1 ORDER BY b",
            "SELECT count(x) FROM (SELECT x FROM t WHERE y) s GROUP BY z HAVING count(x) > 1",
            "SELECT a FROM t UNION SELECT b FROM u LIMIT 5",
            "SELECT CASE WHEN a THEN b ELSE c END FROM t JOIN u ON p ON q",
        ];
        for input in inputs {
            let once = reformat(input);
            let twice = reformat(&once);
            assert_eq!(layout(&once), layout(&twice), "input: {input}");
        }
    }

    #[test]
    fn test_pretty_option_bypasses_formatting() {
        let raw = "SELECT a FROM t WHERE b";
        assert_eq!(formatted_definition(raw, Some("true")), raw);
        assert_eq!(formatted_definition("  weird   text ", Some("1")), "  weird   text ");
        assert_eq!(formatted_definition(raw, Some("")), reformat(raw));
        assert_eq!(formatted_definition(raw, None), reformat(raw));
    }
}
