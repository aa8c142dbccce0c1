use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::exit;

use log::info;

use crate::error::Result;
use crate::expr::ExprId;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::token::Token;

/// One interpreter session: the pipeline plus the error flags that gate
/// it.  Scan/parse/resolve diagnostics suppress execution; a runtime
/// error abandons the current program but leaves the session usable,
/// which is what keeps the REPL alive.
pub struct Lox {
    interpreter: Interpreter<io::Stdout>,
    next_expr_id: ExprId,
    had_error: bool,
    had_runtime_error: bool,
}

impl Lox {
    pub fn new() -> Self {
        Lox {
            interpreter: Interpreter::new(io::stdout()),
            next_expr_id: 0,
            had_error: false,
            had_runtime_error: false,
        }
    }

    pub fn run_file(&mut self, path: &Path) -> Result<()> {
        info!("Running file {}", path.display());

        let source: String = fs::read_to_string(path)?;

        self.run(&source);

        if self.had_error {
            exit(65);
        }

        if self.had_runtime_error {
            exit(70);
        }

        Ok(())
    }

    pub fn run_prompt(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut line = String::new();

        loop {
            print!("> ");
            io::stdout().flush()?;

            line.clear();

            // EOF ends the session.
            if stdin.lock().read_line(&mut line)? == 0 {
                break;
            }

            self.run(&line);

            self.had_error = false;
            self.had_runtime_error = false;
        }

        Ok(())
    }

    fn run(&mut self, source: &str) {
        let mut tokens: Vec<Token> = Vec::new();

        for item in Scanner::new(source) {
            match item {
                Ok(token) => tokens.push(token),

                Err(e) => {
                    eprintln!("{}", e);
                    self.had_error = true;
                }
            }
        }

        // Parsing still runs over an error-bearing token stream so that
        // syntax diagnostics surface alongside lexical ones.
        let mut parser = Parser::with_id_base(tokens, self.next_expr_id);
        let (statements, parse_errors) = parser.parse();
        self.next_expr_id = parser.next_expr_id();

        for e in parse_errors {
            eprintln!("{}", e);
            self.had_error = true;
        }

        if self.had_error {
            return;
        }

        let resolve_errors = Resolver::new(&mut self.interpreter).resolve(&statements);

        for e in resolve_errors {
            eprintln!("{}", e);
            self.had_error = true;
        }

        if self.had_error {
            return;
        }

        if let Err(e) = self.interpreter.interpret(&statements) {
            eprintln!("{}", e);
            self.had_runtime_error = true;
        }
    }
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}
