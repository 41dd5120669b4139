//! Code generation: a single pass from token stream to stack-machine code.
//!
//! There is no syntax tree. Each grammar production is a method on the
//! per-run [`CodeGen`] context and emits instructions as it recognises
//! input. Forward control flow (if/else, while, procedure bodies) emits a
//! placeholder jump, parses ahead, then patches the recorded index once the
//! target address is known.

use crate::bytecode::{Emitter, Instruction, Opcode};
use crate::error::{CompileError, CompileResult};
use crate::symtab::{Symbol, SymbolId, SymbolKind, SymbolTable};
use crate::tokenizer::{Token, TokenKind};
use log::trace;

/// Bookkeeping slots at the base of every activation record (return value,
/// static link, dynamic link, return address). Local variables are
/// addressed from this offset upward.
const FRAME_SIZE: i64 = 4;

/// Generate machine code for a whole token stream.
///
/// On success the returned vector is the complete program, halt included.
/// The first failure aborts generation; no partial code is returned.
pub fn generate(tokens: &[Token]) -> CompileResult<Vec<Instruction>> {
  let mut generator = CodeGen::new(tokens);
  generator.program()?;
  Ok(generator.emitter.into_code())
}

/// Forward-only view over the token slice.
struct TokenCursor<'a> {
  tokens: &'a [Token],
  pos: usize,
}

impl<'a> TokenCursor<'a> {
  fn new(tokens: &'a [Token]) -> Self {
    Self { tokens, pos: 0 }
  }

  fn peek(&self) -> Option<&Token> {
    self.tokens.get(self.pos)
  }

  /// Kind of the current token; `Null` past the end of input.
  fn kind(&self) -> TokenKind {
    self.peek().map(|token| token.kind).unwrap_or(TokenKind::Null)
  }

  /// Lexeme of the current token; empty past the end of input.
  fn lexeme(&self) -> &str {
    self.peek().map(|token| token.lexeme.as_str()).unwrap_or("")
  }

  /// Step past the current token. Past the end this is a no-op.
  fn advance(&mut self) {
    if self.pos < self.tokens.len() {
      self.pos += 1;
    }
  }
}

/// Per-run state shared by every production: the cursor position, scope
/// bookkeeping, and the growing instruction vector.
struct CodeGen<'a> {
  cursor: TokenCursor<'a>,
  symbols: SymbolTable,
  emitter: Emitter,
  /// Current nesting depth; 0 in the outermost block.
  level: u32,
  /// Procedure whose body is being generated, `None` in the outermost block.
  scope: Option<SymbolId>,
}

impl<'a> CodeGen<'a> {
  fn new(tokens: &'a [Token]) -> Self {
    Self {
      cursor: TokenCursor::new(tokens),
      symbols: SymbolTable::new(),
      emitter: Emitter::new(),
      level: 0,
      scope: None,
    }
  }

  fn declare(&mut self, name: String, kind: SymbolKind) -> SymbolId {
    self.symbols.insert(Symbol {
      name,
      kind,
      level: self.level,
      scope: self.scope,
    })
  }

  /// Name lookup from the active scope; a miss is an error.
  fn resolve(&self, name: &str) -> CompileResult<SymbolId> {
    self
      .symbols
      .lookup(name, self.scope)
      .ok_or(CompileError::Undeclared)
  }

  /// Static distance between the use site and a symbol's declaration.
  /// Never negative: lookup only yields symbols from enclosing scopes.
  fn level_distance(&self, id: SymbolId) -> i64 {
    i64::from(self.level - self.symbols.get(id).level)
  }

  // ----- Program structure -----

  /// Program = Block "."
  fn program(&mut self) -> CompileResult<()> {
    self.block(None)?;
    if self.cursor.kind() != TokenKind::Period {
      return Err(CompileError::PeriodExpected);
    }
    self.cursor.advance();
    self.emitter.emit(Opcode::SioHalt, 0, 0, 3);
    Ok(())
  }

  /// Block = [ ConstDecl ] [ VarDecl ] { ProcDecl } Statement
  ///
  /// The leading jump skips the code of nested procedures so that control
  /// entering the block – from program start or from a `CAL` – reaches the
  /// block's own statement. `owner` is the procedure whose body this is;
  /// its entry address becomes known here, when that jump is patched.
  fn block(&mut self, owner: Option<SymbolId>) -> CompileResult<()> {
    let skip = self.emitter.emit(Opcode::Jmp, 0, 0, 0);

    if self.cursor.kind() == TokenKind::Const {
      self.const_declaration()?;
    }
    if self.cursor.kind() == TokenKind::Var {
      self.var_declaration()?;
    }
    if self.cursor.kind() == TokenKind::Procedure {
      self.proc_declaration()?;
    }

    let body = self.emitter.len();
    self.emitter.patch(skip, body as i64);
    if let Some(id) = owner {
      self.symbols.set_proc_address(id, body);
    }

    self.emitter.emit(Opcode::Inc, 0, 0, FRAME_SIZE);
    self.statement()?;
    self.emitter.emit(Opcode::Rtn, 0, 0, 0);
    Ok(())
  }

  /// ConstDecl = "const" ident "=" number { "," ident "=" number } ";"
  fn const_declaration(&mut self) -> CompileResult<()> {
    loop {
      // Past "const" on the first round, past "," afterwards.
      self.cursor.advance();
      if self.cursor.kind() != TokenKind::Ident {
        return Err(CompileError::IdentExpected);
      }
      let name = self.cursor.lexeme().to_owned();

      self.cursor.advance();
      if self.cursor.kind() != TokenKind::Eq {
        return Err(CompileError::EqExpected);
      }

      self.cursor.advance();
      if self.cursor.kind() != TokenKind::Number {
        return Err(CompileError::NumberExpected);
      }
      let value = parse_number(self.cursor.lexeme())?;
      self.declare(name, SymbolKind::Const { value });

      self.cursor.advance();
      if self.cursor.kind() != TokenKind::Comma {
        break;
      }
    }

    if self.cursor.kind() != TokenKind::Semicolon {
      return Err(CompileError::DeclSemicolonExpected);
    }
    self.cursor.advance();
    Ok(())
  }

  /// VarDecl = "var" ident { "," ident } ";"
  ///
  /// Variables occupy frame slots past the activation-record header, in
  /// declaration order; each also extends the frame by one slot.
  fn var_declaration(&mut self) -> CompileResult<()> {
    let mut slot = FRAME_SIZE;
    loop {
      self.cursor.advance();
      if self.cursor.kind() != TokenKind::Ident {
        return Err(CompileError::IdentExpected);
      }
      let name = self.cursor.lexeme().to_owned();

      self.declare(name, SymbolKind::Var { address: slot });
      slot += 1;
      self.emitter.emit(Opcode::Inc, 0, 0, 1);

      self.cursor.advance();
      if self.cursor.kind() != TokenKind::Comma {
        break;
      }
    }

    if self.cursor.kind() != TokenKind::Semicolon {
      return Err(CompileError::DeclSemicolonExpected);
    }
    self.cursor.advance();
    Ok(())
  }

  /// ProcDecl = { "procedure" ident ";" Block ";" }
  fn proc_declaration(&mut self) -> CompileResult<()> {
    while self.cursor.kind() == TokenKind::Procedure {
      self.cursor.advance();
      if self.cursor.kind() != TokenKind::Ident {
        return Err(CompileError::IdentExpected);
      }
      let name = self.cursor.lexeme().to_owned();

      // The entry address is provisional; block() replaces it with the
      // index of the body's frame-setup instruction.
      let here = self.emitter.len();
      let id = self.declare(name, SymbolKind::Proc { address: here });

      self.cursor.advance();
      if self.cursor.kind() != TokenKind::Semicolon {
        return Err(CompileError::ProcSemicolonExpected);
      }
      self.cursor.advance();

      let enclosing = self.scope;
      self.scope = Some(id);
      self.level += 1;
      trace!("enter procedure scope {id} at level {}", self.level);

      self.block(Some(id))?;

      self.level -= 1;
      self.scope = enclosing;
      trace!("leave procedure scope {id}");

      if self.cursor.kind() != TokenKind::Semicolon {
        return Err(CompileError::ProcSemicolonExpected);
      }
      self.cursor.advance();
    }
    Ok(())
  }

  // ----- Statements -----

  fn statement(&mut self) -> CompileResult<()> {
    match self.cursor.kind() {
      TokenKind::Ident => self.assignment(),
      TokenKind::Call => self.call_statement(),
      TokenKind::Begin => self.begin_statement(),
      TokenKind::If => self.if_statement(),
      TokenKind::While => self.while_statement(),
      TokenKind::Read => self.read_statement(),
      TokenKind::Write => self.write_statement(),
      // The empty statement: no opening token matched, nothing emitted.
      _ => Ok(()),
    }
  }

  /// ident ":=" Expression
  fn assignment(&mut self) -> CompileResult<()> {
    let id = self.resolve(self.cursor.lexeme())?;
    let SymbolKind::Var { address } = self.symbols.get(id).kind else {
      return Err(CompileError::AssignToNonVar);
    };
    let distance = self.level_distance(id);

    self.cursor.advance();
    if self.cursor.kind() != TokenKind::Becomes {
      return Err(CompileError::BecomesExpected);
    }
    self.cursor.advance();

    self.expression()?;
    self.emitter.emit(Opcode::Sto, 0, distance, address);
    Ok(())
  }

  /// "call" ident
  fn call_statement(&mut self) -> CompileResult<()> {
    self.cursor.advance();
    if self.cursor.kind() != TokenKind::Ident {
      return Err(CompileError::CallIdentExpected);
    }
    let id = self.resolve(self.cursor.lexeme())?;
    let SymbolKind::Proc { address } = self.symbols.get(id).kind else {
      return Err(CompileError::CallNonProc);
    };
    let distance = self.level_distance(id);
    self.emitter.emit(Opcode::Cal, 0, distance, address as i64);
    self.cursor.advance();
    Ok(())
  }

  /// "begin" Statement { ";" Statement } "end"
  fn begin_statement(&mut self) -> CompileResult<()> {
    self.cursor.advance();
    self.statement()?;
    while self.cursor.kind() == TokenKind::Semicolon {
      self.cursor.advance();
      self.statement()?;
    }
    if self.cursor.kind() != TokenKind::End {
      return Err(CompileError::EndExpected);
    }
    self.cursor.advance();
    Ok(())
  }

  /// "if" Condition "then" Statement [ "else" Statement ]
  ///
  /// The conditional jump lands on the else branch (or past the whole
  /// statement when there is none); the then branch closes with a jump
  /// past the else branch.
  fn if_statement(&mut self) -> CompileResult<()> {
    self.cursor.advance();
    self.condition()?;

    if self.cursor.kind() != TokenKind::Then {
      return Err(CompileError::ThenExpected);
    }
    self.cursor.advance();

    let branch = self.emitter.emit(Opcode::Jpc, 0, 0, 0);
    self.statement()?;

    if self.cursor.kind() == TokenKind::Else {
      let exit = self.emitter.emit(Opcode::Jmp, 0, 0, 0);
      self.cursor.advance();

      let else_start = self.emitter.len();
      self.emitter.patch(branch, else_start as i64);
      self.statement()?;

      let after_else = self.emitter.len();
      self.emitter.patch(exit, after_else as i64);
    } else {
      let after_then = self.emitter.len();
      self.emitter.patch(branch, after_then as i64);
    }
    Ok(())
  }

  /// "while" Condition "do" Statement
  fn while_statement(&mut self) -> CompileResult<()> {
    let top = self.emitter.len();
    self.cursor.advance();
    self.condition()?;

    let exit = self.emitter.emit(Opcode::Jpc, 0, 0, 0);
    if self.cursor.kind() != TokenKind::Do {
      return Err(CompileError::DoExpected);
    }
    self.cursor.advance();

    self.statement()?;
    self.emitter.emit(Opcode::Jmp, 0, 0, top as i64);

    let after_loop = self.emitter.len();
    self.emitter.patch(exit, after_loop as i64);
    Ok(())
  }

  /// "read" ident: the runtime pushes the value read, which is then stored
  /// into the named variable.
  fn read_statement(&mut self) -> CompileResult<()> {
    self.emitter.emit(Opcode::SioRead, 0, 0, 0);
    self.cursor.advance();
    if self.cursor.kind() != TokenKind::Ident {
      return Err(CompileError::IdentExpected);
    }
    let id = self.resolve(self.cursor.lexeme())?;
    let SymbolKind::Var { address } = self.symbols.get(id).kind else {
      return Err(CompileError::ReadNonVar);
    };
    let distance = self.level_distance(id);
    self.cursor.advance();
    self.emitter.emit(Opcode::Sto, 0, distance, address);
    Ok(())
  }

  /// "write" ident: constants are written as immediates, variables are
  /// loaded from their frame slot.
  fn write_statement(&mut self) -> CompileResult<()> {
    self.cursor.advance();
    if self.cursor.kind() != TokenKind::Ident {
      return Err(CompileError::IdentExpected);
    }
    let id = self.resolve(self.cursor.lexeme())?;
    match self.symbols.get(id).kind {
      SymbolKind::Proc { .. } => return Err(CompileError::WriteProc),
      SymbolKind::Const { value } => {
        self.emitter.emit(Opcode::Lit, 0, 0, value);
      }
      SymbolKind::Var { address } => {
        let distance = self.level_distance(id);
        self.emitter.emit(Opcode::Lod, 0, distance, address);
      }
    }
    self.emitter.emit(Opcode::SioWrite, 0, 0, 0);
    self.cursor.advance();
    Ok(())
  }

  // ----- Conditions and expressions -----

  /// Condition = "odd" Expression | Expression RelOp Expression
  ///
  /// Operands are emitted before their operator, keeping the whole
  /// expression layer in postfix order for the evaluation stack.
  fn condition(&mut self) -> CompileResult<()> {
    if self.cursor.kind() == TokenKind::Odd {
      self.cursor.advance();
      self.expression()?;
      self.emitter.emit(Opcode::Odd, 0, 0, 0);
      return Ok(());
    }

    self.expression()?;
    let op = match self.cursor.kind() {
      TokenKind::Eq => Opcode::Eql,
      TokenKind::Neq => Opcode::Neq,
      TokenKind::Less => Opcode::Lss,
      TokenKind::Leq => Opcode::Leq,
      TokenKind::Greater => Opcode::Gtr,
      TokenKind::Geq => Opcode::Geq,
      _ => return Err(CompileError::RelOpExpected),
    };
    self.cursor.advance();
    self.expression()?;
    self.emitter.emit(op, 0, 0, 0);
    Ok(())
  }

  /// Expression = [ "+" | "-" ] Term { ("+"|"-") Term }
  fn expression(&mut self) -> CompileResult<()> {
    let mut negate = false;
    if matches!(self.cursor.kind(), TokenKind::Plus | TokenKind::Minus) {
      negate = self.cursor.kind() == TokenKind::Minus;
      self.cursor.advance();
    }

    self.term()?;
    if negate {
      self.emitter.emit(Opcode::Neg, 0, 0, 0);
    }

    loop {
      let op = match self.cursor.kind() {
        TokenKind::Plus => Opcode::Add,
        TokenKind::Minus => Opcode::Sub,
        _ => break,
      };
      self.cursor.advance();
      self.term()?;
      self.emitter.emit(op, 0, 0, 0);
    }
    Ok(())
  }

  /// Term = Factor { ("*"|"/") Factor }
  fn term(&mut self) -> CompileResult<()> {
    self.factor()?;
    loop {
      let op = match self.cursor.kind() {
        TokenKind::Star => Opcode::Mul,
        TokenKind::Slash => Opcode::Div,
        _ => break,
      };
      self.cursor.advance();
      self.factor()?;
      self.emitter.emit(op, 0, 0, 0);
    }
    Ok(())
  }

  /// Factor = ident | number | "(" Expression ")"
  fn factor(&mut self) -> CompileResult<()> {
    match self.cursor.kind() {
      TokenKind::Ident => {
        let id = self.resolve(self.cursor.lexeme())?;
        match self.symbols.get(id).kind {
          SymbolKind::Proc { .. } => return Err(CompileError::InvalidFactor),
          SymbolKind::Const { value } => {
            self.emitter.emit(Opcode::Lit, 0, 0, value);
          }
          SymbolKind::Var { address } => {
            let distance = self.level_distance(id);
            self.emitter.emit(Opcode::Lod, 0, distance, address);
          }
        }
        self.cursor.advance();
        Ok(())
      }
      TokenKind::Number => {
        let value = parse_number(self.cursor.lexeme())?;
        self.emitter.emit(Opcode::Lit, 0, 0, value);
        self.cursor.advance();
        Ok(())
      }
      TokenKind::LParen => {
        self.cursor.advance();
        self.expression()?;
        if self.cursor.kind() != TokenKind::RParen {
          return Err(CompileError::RParenExpected);
        }
        self.cursor.advance();
        Ok(())
      }
      _ => Err(CompileError::InvalidFactor),
    }
  }
}

/// Base-10 value of a number lexeme.
fn parse_number(text: &str) -> CompileResult<i64> {
  text.parse::<i64>().map_err(|_| CompileError::InvalidNumber)
}
