//! Shared error type for the whole pipeline.
//!
//! Diagnostics are kept lightweight on purpose – the numeric code is the
//! contract surface callers and the driver key off, and the display strings
//! double as the message table. No source positions are tracked.

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

/// Every failure the pipeline can report.
///
/// Codes 1–19 belong to the code generator; 20–21 cover lexical analysis.
#[derive(Debug, Snafu)]
pub enum CompileError {
  #[snafu(display("number expected after '=' in constant declaration"))]
  NumberExpected,
  #[snafu(display("'=' expected after constant identifier"))]
  EqExpected,
  #[snafu(display("identifier expected"))]
  IdentExpected,
  #[snafu(display("';' expected after declaration"))]
  DeclSemicolonExpected,
  #[snafu(display("';' expected in procedure declaration"))]
  ProcSemicolonExpected,
  #[snafu(display("'.' expected at end of program"))]
  PeriodExpected,
  #[snafu(display("':=' expected in assignment"))]
  BecomesExpected,
  #[snafu(display("identifier expected after 'call'"))]
  CallIdentExpected,
  #[snafu(display("'then' expected after condition"))]
  ThenExpected,
  #[snafu(display("'end' expected"))]
  EndExpected,
  #[snafu(display("'do' expected after condition"))]
  DoExpected,
  #[snafu(display("relational operator expected"))]
  RelOpExpected,
  #[snafu(display("')' expected"))]
  RParenExpected,
  #[snafu(display("factor must be an identifier, number or parenthesised expression"))]
  InvalidFactor,
  #[snafu(display("undeclared identifier"))]
  Undeclared,
  #[snafu(display("assignment target must be a variable"))]
  AssignToNonVar,
  #[snafu(display("'call' must name a procedure"))]
  CallNonProc,
  #[snafu(display("'write' cannot output a procedure"))]
  WriteProc,
  #[snafu(display("'read' target must be a variable"))]
  ReadNonVar,
  #[snafu(display("invalid character '{ch}'"))]
  InvalidCharacter { ch: char },
  #[snafu(display("number literal is not a valid machine integer"))]
  InvalidNumber,
}

impl CompileError {
  /// Numeric error code. Non-zero by construction; zero means success.
  pub fn code(&self) -> i64 {
    use CompileError as E;
    match self {
      E::NumberExpected => 1,
      E::EqExpected => 2,
      E::IdentExpected => 3,
      E::DeclSemicolonExpected => 4,
      E::ProcSemicolonExpected => 5,
      E::PeriodExpected => 6,
      E::BecomesExpected => 7,
      E::CallIdentExpected => 8,
      E::ThenExpected => 9,
      E::EndExpected => 10,
      E::DoExpected => 11,
      E::RelOpExpected => 12,
      E::RParenExpected => 13,
      E::InvalidFactor => 14,
      E::Undeclared => 15,
      E::AssignToNonVar => 16,
      E::CallNonProc => 17,
      E::WriteProc => 18,
      E::ReadNonVar => 19,
      E::InvalidCharacter { .. } => 20,
      E::InvalidNumber => 21,
    }
  }
}
