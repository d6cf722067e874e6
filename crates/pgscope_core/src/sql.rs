//! SQL text helpers: identifier and literal quoting, and a quote-aware
//! tokenizer.

/// Words that must be quoted when used as identifiers.
const RESERVED_WORDS: &[&str] = &[
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric", "both",
    "case", "cast", "check", "collate", "column", "constraint", "create", "current_date",
    "current_role", "current_time", "current_timestamp", "current_user", "default",
    "deferrable", "desc", "distinct", "do", "else", "end", "except", "false", "for",
    "foreign", "from", "grant", "group", "having", "in", "initially", "intersect", "into",
    "leading", "limit", "localtime", "localtimestamp", "new", "not", "null", "off", "offset",
    "old", "on", "only", "or", "order", "placing", "primary", "references", "select",
    "session_user", "some", "symmetric", "table", "then", "to", "trailing", "true", "union",
    "unique", "user", "using", "when", "where", "with",
];

fn needs_quoting(ident: &str) -> bool {
    let mut chars = ident.chars();
    let starts_ok = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_');
    if !starts_ok {
        return true;
    }
    if !chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '$') {
        return true;
    }
    RESERVED_WORDS.binary_search(&ident).is_ok()
}

/// Quote an identifier when PostgreSQL would otherwise fold or reject it.
/// An empty identifier stays empty.
pub fn quote_ident(ident: &str) -> String {
    if ident.is_empty() || !needs_quoting(ident) {
        return ident.to_string();
    }
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "''"))
}

#[derive(Debug, Clone, Copy)]
enum Delimiter {
    Whitespace,
    Char(char),
}

/// Splits SQL text into tokens without breaking inside `'...'` or `"..."`.
///
/// In whitespace mode runs of whitespace separate tokens and empty tokens
/// never appear. In character mode every delimiter ends a token.
#[derive(Debug, Clone)]
pub struct QueryTokenizer<'a> {
    rest: &'a str,
    delimiter: Delimiter,
    done: bool,
}

impl<'a> QueryTokenizer<'a> {
    /// Tokenize on whitespace.
    pub fn whitespace(text: &'a str) -> Self {
        Self { rest: text, delimiter: Delimiter::Whitespace, done: false }
    }

    /// Tokenize on a single delimiter character.
    pub fn with_delimiter(text: &'a str, delimiter: char) -> Self {
        Self { rest: text, delimiter: Delimiter::Char(delimiter), done: text.is_empty() }
    }

    fn is_delimiter(&self, c: char) -> bool {
        match self.delimiter {
            Delimiter::Whitespace => c.is_whitespace(),
            Delimiter::Char(d) => c == d,
        }
    }
}

impl<'a> Iterator for QueryTokenizer<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.done {
            return None;
        }
        if let Delimiter::Whitespace = self.delimiter {
            self.rest = self.rest.trim_start();
            if self.rest.is_empty() {
                self.done = true;
                return None;
            }
        }

        let mut quote: Option<char> = None;
        let mut end = None;
        for (i, c) in self.rest.char_indices() {
            match quote {
                Some(q) if c == q => quote = None,
                Some(_) => {}
                None if c == '\'' || c == '"' => quote = Some(c),
                None if self.is_delimiter(c) => {
                    end = Some((i, c.len_utf8()));
                    break;
                }
                None => {}
            }
        }

        let token;
        match end {
            Some((i, width)) => {
                token = &self.rest[..i];
                self.rest = &self.rest[i + width..];
            }
            None => {
                token = self.rest;
                self.rest = "";
                self.done = true;
            }
        }
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_words_sorted_for_binary_search() {
        let mut sorted = RESERVED_WORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, RESERVED_WORDS);
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("orders"), "orders");
        assert_eq!(quote_ident("order_2"), "order_2");
        assert_eq!(quote_ident("Orders"), "\"Orders\"");
        assert_eq!(quote_ident("my table"), "\"my table\"");
        assert_eq!(quote_ident("user"), "\"user\"");
        assert_eq!(quote_ident("2fa"), "\"2fa\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
        assert_eq!(quote_ident(""), "");
    }

    #[test]
    fn test_quote_literal() {
        assert_eq!(quote_literal("it's"), "'it''s'");
        assert_eq!(quote_literal("a\\b"), "'a\\\\b'");
    }

    #[test]
    fn test_whitespace_tokens_respect_quotes() {
        let tokens: Vec<_> =
            QueryTokenizer::whitespace("  SELECT 'a b'  FROM\n\t\"My Table\" ").collect();
        assert_eq!(tokens, ["SELECT", "'a b'", "FROM", "\"My Table\""]);
    }

    #[test]
    fn test_whitespace_empty_input() {
        assert_eq!(QueryTokenizer::whitespace("   ").next(), None);
        assert_eq!(QueryTokenizer::whitespace("").next(), None);
    }

    #[test]
    fn test_delimiter_tokens_respect_quotes() {
        let tokens: Vec<_> =
            QueryTokenizer::with_delimiter("=r/pg,\"a,b\"=w/pg,,x", ',').collect();
        assert_eq!(tokens, ["=r/pg", "\"a,b\"=w/pg", "", "x"]);
    }
}
