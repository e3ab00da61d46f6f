// Statement splitter: cuts a dump into ordered statement candidates
use crate::config::SplitMode;
use crate::error::InputError;
use crate::types::{Backend, RawScript, StatementCandidate};
use sqlparser::dialect::{Dialect, MySqlDialect, PostgreSqlDialect};
use sqlparser::tokenizer::{Token, TokenWithLocation, Tokenizer};
use std::iter::Peekable;
use std::str::CharIndices;
use tracing::debug;

/// Statement terminator.
pub const TERMINATOR: char = ';';

/// Split on every terminator, trim each part and drop the empty ones.
///
/// Terminators inside string literals and comments are treated as boundaries
/// too. Use [`split_lexical`] for dumps that embed them.
pub fn split(raw: &str) -> Vec<StatementCandidate> {
    number(
        raw.split(TERMINATOR)
            .map(str::trim)
            .filter(|part| !part.is_empty()),
    )
}

/// Split on terminators that sit at the top level of the token stream.
///
/// Quoted strings, quoted identifiers and comments are opaque. Each candidate
/// starts at its first code token and ends after its last one, so leading and
/// trailing comments are not part of the statement. Segments holding only
/// comments produce no candidate.
pub fn split_lexical(raw: &str, backend: Backend) -> Result<Vec<StatementCandidate>, InputError> {
    let tokens = tokenize(raw, backend)?;
    let mut cursor = SourceCursor::new(raw);
    let mut parts = Vec::new();
    let mut start: Option<usize> = None;
    let mut end = 0;
    let mut after_code = false;

    for TokenWithLocation { token, location } in &tokens {
        let offset = cursor.seek(location.line, location.column);
        if after_code {
            end = offset;
        }
        match token {
            Token::EOF => {
                after_code = false;
                break;
            }
            Token::SemiColon => {
                if let Some(begin) = start.take() {
                    parts.push(&raw[begin..end]);
                }
                after_code = false;
            }
            Token::Whitespace(_) => after_code = false,
            _ => {
                start.get_or_insert(offset);
                after_code = true;
            }
        }
    }
    if let Some(begin) = start {
        if after_code {
            end = raw.len();
        }
        parts.push(&raw[begin..end]);
    }

    debug!(tokens = tokens.len(), statements = parts.len(), "Lexical split finished");
    Ok(number(parts.into_iter().map(str::trim).filter(|part| !part.is_empty())))
}

/// Split a loaded dump with the requested mode.
pub fn split_script(
    script: &RawScript,
    mode: SplitMode,
    backend: Backend,
) -> Result<Vec<StatementCandidate>, InputError> {
    match mode {
        SplitMode::Naive => Ok(split(script.as_str())),
        SplitMode::Lexical => split_lexical(script.as_str(), backend),
    }
}

fn number<'a>(parts: impl Iterator<Item = &'a str>) -> Vec<StatementCandidate> {
    parts
        .enumerate()
        .map(|(index, text)| StatementCandidate::new(index + 1, text))
        .collect()
}

fn tokenize(raw: &str, backend: Backend) -> Result<Vec<TokenWithLocation>, InputError> {
    let dialect: &dyn Dialect = match backend {
        Backend::MySql => &MySqlDialect {},
        Backend::Postgres => &PostgreSqlDialect {},
    };
    Tokenizer::new(dialect, raw)
        .tokenize_with_location()
        .map_err(|e| InputError::Tokenize { message: e.to_string() })
}

/// Converts tokenizer locations (1-based line and character column) into byte
/// offsets. Locations must be requested in non-decreasing order.
struct SourceCursor<'a> {
    chars: Peekable<CharIndices<'a>>,
    len: usize,
    line: u64,
    column: u64,
    offset: usize,
}

impl<'a> SourceCursor<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.char_indices().peekable(),
            len: source.len(),
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    fn seek(&mut self, line: u64, column: u64) -> usize {
        while (self.line, self.column) < (line, column) {
            let Some((index, ch)) = self.chars.next() else {
                self.offset = self.len;
                break;
            };
            if ch == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.offset = index + ch.len_utf8();
        }
        self.offset
    }
}

#[cfg(test)]
mod cursor_tests {
    use super::SourceCursor;

    #[test]
    fn test_seek_maps_lines_and_multibyte_columns() {
        let source = "añb\ncd";
        let mut cursor = SourceCursor::new(source);
        assert_eq!(cursor.seek(1, 1), 0);
        assert_eq!(cursor.seek(1, 3), 3);
        assert_eq!(cursor.seek(2, 1), 5);
        assert_eq!(cursor.seek(2, 2), 6);
        assert_eq!(cursor.seek(9, 1), source.len());
    }
}
