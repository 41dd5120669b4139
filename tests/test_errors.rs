//! Failure-path checks: one test per numeric code, plus the fail-fast
//! guarantees.

fn code_of(source: &str) -> i64 {
  rpl0::compile(source)
    .expect_err("program should be rejected")
    .code()
}

#[test]
fn missing_number_after_eq() {
  assert_eq!(code_of("const x = ;"), 1);
}

#[test]
fn missing_eq_in_constant() {
  assert_eq!(code_of("const x 5 ;"), 2);
}

#[test]
fn missing_ident_after_var() {
  assert_eq!(code_of("var ;"), 3);
}

#[test]
fn declaration_semicolon_code_is_unified() {
  assert_eq!(code_of("const c = 1 write c."), 4);
  assert_eq!(code_of("var x x := 0."), 4);
}

#[test]
fn missing_semicolon_around_procedure() {
  assert_eq!(code_of("procedure p call p."), 5);
  assert_eq!(code_of("procedure p; ."), 5);
}

#[test]
fn missing_period() {
  assert_eq!(code_of("var x; x := 0"), 6);
}

#[test]
fn missing_becomes() {
  assert_eq!(code_of("var x; x = 0."), 7);
}

#[test]
fn missing_ident_after_call() {
  assert_eq!(code_of("call 1."), 8);
}

#[test]
fn missing_then() {
  assert_eq!(code_of("var x; if 1 = 1 x := 0."), 9);
}

#[test]
fn missing_end() {
  assert_eq!(code_of("var x; begin x := 0 ."), 10);
}

#[test]
fn missing_do() {
  assert_eq!(code_of("var x; while odd x x := 0."), 11);
}

#[test]
fn missing_relational_operator() {
  assert_eq!(code_of("var x; if x x then x := 0."), 12);
}

#[test]
fn missing_right_parenthesis() {
  assert_eq!(code_of("var x; x := (1 + 2."), 13);
}

#[test]
fn invalid_factor_start() {
  assert_eq!(code_of("var x; x := * 1."), 14);
}

#[test]
fn procedure_in_expression() {
  assert_eq!(code_of("var x; procedure p; ; x := p."), 14);
}

#[test]
fn undeclared_identifier() {
  assert_eq!(code_of("x := 0."), 15);
}

#[test]
fn assignment_to_constant() {
  assert_eq!(code_of("const c = 1; c := 2."), 16);
}

#[test]
fn call_of_non_procedure() {
  assert_eq!(code_of("var x; call x."), 17);
}

#[test]
fn write_of_procedure() {
  assert_eq!(code_of("procedure p; ; write p."), 18);
}

#[test]
fn read_into_non_variable() {
  assert_eq!(code_of("const c = 1; read c."), 19);
}

#[test]
fn invalid_character() {
  assert_eq!(code_of("var x; x := 0 @."), 20);
}

#[test]
fn oversized_number_literal() {
  assert_eq!(code_of("var x; x := 99999999999999999999."), 21);
}

#[test]
fn sibling_procedure_locals_are_invisible() {
  // `inner` belongs to p's scope; q must not see it.
  let source = "procedure p; var inner; inner := 1; \
                procedure q; inner := 2; \
                call p.";
  assert_eq!(code_of(source), 15);
}

#[test]
fn failures_are_repeatable() {
  let source = "const x 5 ;";
  assert_eq!(code_of(source), 2);
  assert_eq!(code_of(source), 2);
}

#[test]
fn failed_runs_write_nothing() {
  // The driver only writes a listing after a successful run; mirror that
  // flow and make sure the sink stays untouched.
  let mut out = Vec::new();
  if let Ok(code) = rpl0::compile("const x 5 ;") {
    rpl0::bytecode::write_listing(&code, &mut out).expect("write to a vec cannot fail");
  }
  assert!(out.is_empty());
}
