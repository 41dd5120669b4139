use std::env;
use std::fs;
use std::io;
use std::process;

fn main() {
  simple_logger::SimpleLogger::new().env().init().unwrap();

  let args: Vec<String> = env::args().collect();
  if args.len() != 2 {
    let program = args.first().map(String::as_str).unwrap_or("rpl0");
    eprintln!("usage: {program} <file.pl0>");
    process::exit(1);
  }

  let source = match fs::read_to_string(&args[1]) {
    Ok(source) => source,
    Err(err) => {
      eprintln!("cannot read '{}': {err}", args[1]);
      process::exit(1);
    }
  };

  match rpl0::compile(&source) {
    Ok(code) => {
      if let Err(err) = rpl0::bytecode::write_listing(&code, io::stdout().lock()) {
        eprintln!("{err}");
        process::exit(1);
      }
    }
    Err(err) => {
      eprintln!("error[{}]: {err}", err.code());
      process::exit(err.code() as i32);
    }
  }
}
