//! Parser for the query subset the file store executes.
//!
//! ```text
//! SELECT (* | COUNT(*)) FROM [keyspace.]table
//!     [WHERE column op ? [AND column op ?]...]
//!     [ALLOW FILTERING]
//!
//! op = "=" | ">" | ">=" | "<" | "<=" | IN (?, ...)
//! ```
//!
//! Keywords are case-insensitive. Values are always bound positionally.

use userbase_core::Result;
use userbase_core::error::QueryError;
use userbase_core::query::Operator;

/// What a SELECT returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    All,
    Count,
}

/// A condition with its parameter slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub column: String,
    pub op: Operator,
    /// Number of `?` markers the clause consumes.
    pub arity: usize,
}

/// A parsed SELECT statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Select {
    pub projection: Projection,
    pub keyspace: Option<String>,
    pub table: String,
    pub clauses: Vec<Clause>,
    pub allow_filtering: bool,
}

impl Select {
    /// Total number of bound parameters the statement expects.
    pub fn parameter_count(&self) -> usize {
        self.clauses.iter().map(|c| c.arity).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Star,
    Comma,
    Dot,
    Open,
    Close,
    Mark,
    Op(Operator),
}

/// Parse a statement.
///
/// # Errors
///
/// Returns [`QueryError::Syntax`] with the byte offset of the first
/// offending token.
pub fn parse(query: &str) -> Result<Select> {
    let tokens = tokenize(query)?;
    Parser {
        tokens,
        pos: 0,
        end: query.len(),
    }
    .select()
}

fn tokenize(query: &str) -> Result<Vec<(usize, Token)>> {
    let mut tokens = Vec::new();
    let mut chars = query.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            '*' => Token::Star,
            ',' => Token::Comma,
            '.' => Token::Dot,
            '(' => Token::Open,
            ')' => Token::Close,
            '?' => Token::Mark,
            ';' => {
                if chars.peek().is_none() {
                    continue;
                }
                return Err(syntax(offset, "statement continues after ';'".to_string()));
            }
            '=' => Token::Op(Operator::Eq),
            '>' | '<' => {
                let inclusive = chars.next_if(|(_, next)| *next == '=').is_some();
                Token::Op(match (c, inclusive) {
                    ('>', false) => Operator::Gt,
                    ('>', true) => Operator::Gte,
                    ('<', false) => Operator::Lt,
                    _ => Operator::Lte,
                })
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut word = String::from(c);
                while let Some((_, next)) =
                    chars.next_if(|(_, next)| next.is_ascii_alphanumeric() || *next == '_')
                {
                    word.push(next);
                }
                Token::Word(word)
            }
            other => {
                return Err(syntax(offset, format!("unexpected character '{}'", other)));
            }
        };
        tokens.push((offset, token));
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    end: usize,
}

impl Parser {
    fn select(mut self) -> Result<Select> {
        self.keyword("SELECT")?;
        let projection = self.projection()?;
        self.keyword("FROM")?;

        let first = self.identifier()?;
        let (keyspace, table) = if self.eat(&Token::Dot) {
            (Some(first), self.identifier()?)
        } else {
            (None, first)
        };

        let mut clauses = Vec::new();
        if self.eat_keyword("WHERE") {
            clauses.push(self.clause()?);
            while self.eat_keyword("AND") {
                clauses.push(self.clause()?);
            }
        }

        let allow_filtering = if self.eat_keyword("ALLOW") {
            self.keyword("FILTERING")?;
            true
        } else {
            false
        };

        if let Some((offset, token)) = self.tokens.get(self.pos) {
            return Err(syntax(*offset, format!("unexpected trailing {:?}", token)));
        }

        Ok(Select {
            projection,
            keyspace,
            table,
            clauses,
            allow_filtering,
        })
    }

    fn projection(&mut self) -> Result<Projection> {
        if self.eat(&Token::Star) {
            return Ok(Projection::All);
        }
        self.keyword("COUNT")?;
        self.expect(&Token::Open)?;
        self.expect(&Token::Star)?;
        self.expect(&Token::Close)?;
        Ok(Projection::Count)
    }

    fn clause(&mut self) -> Result<Clause> {
        let column = self.identifier()?;

        if self.eat_keyword("IN") {
            self.expect(&Token::Open)?;
            self.expect(&Token::Mark)?;
            let mut arity = 1;
            while self.eat(&Token::Comma) {
                self.expect(&Token::Mark)?;
                arity += 1;
            }
            self.expect(&Token::Close)?;
            return Ok(Clause {
                column,
                op: Operator::In,
                arity,
            });
        }

        let (offset, token) = self.next()?;
        let Token::Op(op) = token else {
            return Err(syntax(offset, format!("expected operator, found {:?}", token)));
        };
        self.expect(&Token::Mark)?;
        Ok(Clause {
            column,
            op,
            arity: 1,
        })
    }

    fn next(&mut self) -> Result<(usize, Token)> {
        let token = self
            .tokens
            .get(self.pos)
            .cloned()
            .ok_or_else(|| syntax(self.end, "unexpected end of query".to_string()))?;
        self.pos += 1;
        Ok(token)
    }

    fn eat(&mut self, expected: &Token) -> bool {
        match self.tokens.get(self.pos) {
            Some((_, token)) if token == expected => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        match self.tokens.get(self.pos) {
            Some((_, Token::Word(word))) if word.eq_ignore_ascii_case(keyword) => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<()> {
        let (offset, token) = self.next()?;
        if &token != expected {
            return Err(syntax(
                offset,
                format!("expected {:?}, found {:?}", expected, token),
            ));
        }
        Ok(())
    }

    fn keyword(&mut self, keyword: &str) -> Result<()> {
        let (offset, token) = self.next()?;
        match token {
            Token::Word(word) if word.eq_ignore_ascii_case(keyword) => Ok(()),
            other => Err(syntax(offset, format!("expected {}, found {:?}", keyword, other))),
        }
    }

    fn identifier(&mut self) -> Result<String> {
        let (offset, token) = self.next()?;
        match token {
            Token::Word(word) => Ok(word),
            other => Err(syntax(offset, format!("expected identifier, found {:?}", other))),
        }
    }
}

fn syntax(offset: usize, message: String) -> userbase_core::Error {
    QueryError::Syntax { offset, message }.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_unfiltered_select() {
        let select = parse("SELECT * FROM users").unwrap();
        assert_eq!(select.projection, Projection::All);
        assert_eq!(select.table, "users");
        assert!(select.keyspace.is_none());
        assert!(select.clauses.is_empty());
        assert!(!select.allow_filtering);
    }

    #[test]
    fn parses_filtered_select() {
        let select = parse(
            "SELECT * FROM users WHERE name = ? AND age >= ? AND email IN (?, ?) ALLOW FILTERING",
        )
        .unwrap();

        assert!(select.allow_filtering);
        assert_eq!(
            select.clauses,
            [
                Clause { column: "name".into(), op: Operator::Eq, arity: 1 },
                Clause { column: "age".into(), op: Operator::Gte, arity: 1 },
                Clause { column: "email".into(), op: Operator::In, arity: 2 },
            ]
        );
        assert_eq!(select.parameter_count(), 4);
    }

    #[test]
    fn parses_count_with_keyspace() {
        let select = parse("select count(*) from ks.users;").unwrap();
        assert_eq!(select.projection, Projection::Count);
        assert_eq!(select.keyspace.as_deref(), Some("ks"));
        assert_eq!(select.table, "users");
    }

    #[test]
    fn rejects_literals() {
        let err = parse("SELECT * FROM users WHERE name = 'x'").unwrap_err();
        assert!(matches!(
            err,
            userbase_core::Error::Query(QueryError::Syntax { offset: 33, .. })
        ));
    }

    #[test]
    fn rejects_incomplete_queries() {
        assert!(parse("SELECT * FROM").is_err());
        assert!(parse("SELECT * FROM users WHERE").is_err());
        assert!(parse("SELECT * FROM users ALLOW").is_err());
        assert!(parse("DELETE FROM users").is_err());
        assert!(parse("SELECT * FROM users LIMIT 5").is_err());
    }
}
