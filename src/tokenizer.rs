//! Lexical analysis: turns PL/0 source text into a vector of tokens.
//!
//! The tokenizer is intentionally tiny – it knows nothing about the grammar
//! beyond recognising reserved words, operators and numeric literals.
//! Two-character operators are matched before single-character ones to
//! avoid ambiguity.

use crate::error::{CompileError, CompileResult};

/// Kinds of tokens recognised by the front-end.
///
/// `Null` is never produced by the tokenizer; it is the sentinel the code
/// generator's cursor reports past the end of input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  Null,
  Ident,
  Number,
  Plus,
  Minus,
  Star,
  Slash,
  Odd,
  Eq,
  Neq,
  Less,
  Leq,
  Greater,
  Geq,
  LParen,
  RParen,
  Comma,
  Semicolon,
  Period,
  Becomes,
  Begin,
  End,
  If,
  Then,
  Else,
  While,
  Do,
  Call,
  Const,
  Var,
  Procedure,
  Write,
  Read,
}

/// One lexical unit. Identifiers and numbers carry their text; for every
/// other kind the lexeme is empty.
#[derive(Debug, Clone)]
pub struct Token {
  pub kind: TokenKind,
  pub lexeme: String,
}

impl Token {
  pub fn new(kind: TokenKind) -> Self {
    Self {
      kind,
      lexeme: String::new(),
    }
  }

  pub fn ident(name: impl Into<String>) -> Self {
    Self {
      kind: TokenKind::Ident,
      lexeme: name.into(),
    }
  }

  pub fn number(text: impl Into<String>) -> Self {
    Self {
      kind: TokenKind::Number,
      lexeme: text.into(),
    }
  }
}

/// Map a reserved word to its keyword kind.
fn keyword(word: &str) -> Option<TokenKind> {
  use TokenKind as K;
  let kind = match word {
    "odd" => K::Odd,
    "begin" => K::Begin,
    "end" => K::End,
    "if" => K::If,
    "then" => K::Then,
    "else" => K::Else,
    "while" => K::While,
    "do" => K::Do,
    "call" => K::Call,
    "const" => K::Const,
    "var" => K::Var,
    "procedure" => K::Procedure,
    "write" => K::Write,
    "read" => K::Read,
    _ => return None,
  };
  Some(kind)
}

/// Lex the input into a flat vector of tokens.
///
/// No end-of-input marker is appended; the generator's cursor reports the
/// `Null` sentinel past the last token.
pub fn tokenize(input: &str) -> CompileResult<Vec<Token>> {
  let mut tokens = Vec::new();
  let bytes = input.as_bytes();
  let mut i = 0;

  while i < bytes.len() {
    let c = bytes[i];
    if c.is_ascii_whitespace() {
      i += 1;
      continue;
    }

    if c.is_ascii_digit() {
      let start = i;
      while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
      }
      tokens.push(Token::number(&input[start..i]));
      continue;
    }

    if c.is_ascii_alphabetic() {
      let start = i;
      while i < bytes.len() && bytes[i].is_ascii_alphanumeric() {
        i += 1;
      }
      let word = &input[start..i];
      match keyword(word) {
        Some(kind) => tokens.push(Token::new(kind)),
        None => tokens.push(Token::ident(word)),
      }
      continue;
    }

    if let Some((op, kind)) = [
      (":=", TokenKind::Becomes),
      ("<=", TokenKind::Leq),
      (">=", TokenKind::Geq),
      ("<>", TokenKind::Neq),
    ]
    .into_iter()
    .find(|(op, _)| input[i..].starts_with(op))
    {
      tokens.push(Token::new(kind));
      i += op.len();
      continue;
    }

    let kind = match c {
      b'+' => TokenKind::Plus,
      b'-' => TokenKind::Minus,
      b'*' => TokenKind::Star,
      b'/' => TokenKind::Slash,
      b'=' => TokenKind::Eq,
      b'<' => TokenKind::Less,
      b'>' => TokenKind::Greater,
      b'(' => TokenKind::LParen,
      b')' => TokenKind::RParen,
      b',' => TokenKind::Comma,
      b';' => TokenKind::Semicolon,
      b'.' => TokenKind::Period,
      _ => {
        let ch = input[i..].chars().next().unwrap_or('\0');
        return Err(CompileError::InvalidCharacter { ch });
      }
    };
    tokens.push(Token::new(kind));
    i += 1;
  }

  Ok(tokens)
}
