// File: src/repl.rs
//
// Interactive REPL (Read-Eval-Print Loop) for the mini language.
// Provides an interactive shell with:
// - Multi-line input while brackets, strings or block comments are open
// - Command history with up/down arrow navigation
// - Special commands (:help, :clear, :quit, :vars, :doc, :reset)
// - Persistent state across inputs, rolled back per failing expression

use crate::errors::MiniError;
use crate::interpreter::{Interpreter, Value};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// REPL session that maintains interpreter state and handles user interaction
pub struct Repl {
    interpreter: Interpreter,
    editor: DefaultEditor,
}

impl Repl {
    /// Creates a new REPL session with a fresh interpreter
    pub fn new(debug: bool) -> Result<Self, Box<dyn std::error::Error>> {
        let editor = DefaultEditor::new()?;
        Ok(Repl { interpreter: Interpreter::new().with_debug(debug), editor })
    }

    /// Displays the welcome banner with version and help information
    fn show_banner(&self) {
        println!(
            "{} {}",
            "mini".bright_cyan().bold(),
            format!("v{} interactive shell", env!("CARGO_PKG_VERSION")).bright_cyan()
        );
        println!(
            "  Type {} for commands or {} to exit",
            ":help".bright_yellow(),
            ":quit".bright_yellow()
        );
        println!();
    }

    /// Starts the REPL loop
    pub fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.show_banner();

        let mut buffer = String::new();

        loop {
            let prompt = if buffer.is_empty() {
                "mini> ".bright_green().to_string()
            } else {
                "....> ".bright_blue().to_string()
            };

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let _ = self.editor.add_history_entry(line.as_str());

                    // Commands are only recognized at the start of an input
                    if buffer.is_empty() && line.trim().starts_with(':') {
                        if self.handle_command(line.trim()) {
                            continue;
                        }
                        break;
                    }

                    buffer.push_str(&line);
                    buffer.push('\n');

                    if is_input_complete(&buffer) {
                        self.eval_input(&buffer);
                        buffer.clear();
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C (use :quit or Ctrl+D to exit)".bright_yellow());
                    buffer.clear();
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "Goodbye!".bright_cyan());
                    break;
                }
                Err(err) => {
                    eprintln!("{} {}", "Error:".bright_red(), err);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handles special REPL commands starting with ':'
    /// Returns true to continue REPL, false to quit
    fn handle_command(&mut self, cmd: &str) -> bool {
        let (name, argument) = match cmd.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (cmd, ""),
        };
        match name {
            ":help" | ":h" => self.show_help(),
            ":quit" | ":q" | ":exit" => {
                println!("{}", "Goodbye!".bright_cyan());
                return false;
            }
            ":clear" | ":c" => {
                print!("\x1B[2J\x1B[1;1H");
                self.show_banner();
            }
            ":vars" | ":v" => self.show_variables(),
            ":doc" | ":d" => self.show_doc(argument),
            ":reset" | ":r" => {
                self.interpreter.reset();
                println!("{}", "Environment reset".bright_green());
            }
            _ => println!(
                "{} Unknown command: {}. Type {} for available commands.",
                "Error:".bright_red(),
                cmd.bright_yellow(),
                ":help".bright_yellow()
            ),
        }
        true
    }

    /// Displays help information about available commands
    fn show_help(&self) {
        println!();
        println!("{}", "REPL Commands:".bright_cyan().bold());
        println!("  {}{}  Display this help message", ":help".bright_yellow(), " or :h     ".dimmed());
        println!("  {}{}  Exit the REPL", ":quit".bright_yellow(), " or :q     ".dimmed());
        println!("  {}{}  Clear the screen", ":clear".bright_yellow(), " or :c    ".dimmed());
        println!("  {}{}  Show global bindings", ":vars".bright_yellow(), " or :v    ".dimmed());
        println!("  {}{}  Show a function's doc comment", ":doc <name>".bright_yellow(), "     ".dimmed());
        println!("  {}{}  Reset environment", ":reset".bright_yellow(), " or :r   ".dimmed());
        println!();
        println!("{}", "Multi-line Input:".bright_cyan().bold());
        println!("  Leave braces, brackets, or parentheses unclosed to continue");
        println!("  on the next line. Close them to evaluate.");
        println!();
        println!("{}", "Examples:".bright_cyan().bold());
        println!("  {}", "mini> // Greets someone by name".dimmed());
        println!("  {}", "mini> greet(name) = {".dimmed());
        println!("  {}", "....>     print(\"Hello, \" + name)".dimmed());
        println!("  {}", "....> }".dimmed());
        println!("  {}", "mini> greet(\"World\")".dimmed());
        println!();
    }

    /// Displays the user's global bindings (builtins are left out)
    fn show_variables(&self) {
        let bindings: Vec<(String, Value)> = self
            .interpreter
            .globals()
            .local_bindings()
            .into_iter()
            .filter(|(_, value)| !matches!(value, Value::Builtin(_)))
            .collect();

        if bindings.is_empty() {
            println!("  {}", "(no bindings)".dimmed());
            return;
        }
        for (name, value) in bindings {
            println!(
                "  {} {} {}",
                name.bright_yellow(),
                format!(": {}", value.type_name()).dimmed(),
                format!("= {}", value.repr()).bright_white()
            );
        }
    }

    fn show_doc(&self, name: &str) {
        if name.is_empty() {
            println!("{} usage: :doc <name>", "Error:".bright_red());
            return;
        }
        match self.interpreter.globals().get(name) {
            Some(Value::Function(func)) => {
                println!("{}", Value::Function(func.clone()).to_string().bright_cyan());
                match &func.doc {
                    Some(doc) => println!("  {}", doc),
                    None => println!("  {}", "(no documentation)".dimmed()),
                }
            }
            Some(Value::Builtin(builtin)) => {
                println!("{}", format!("<builtin {}>", builtin.name).bright_cyan());
                println!("  {}", "(builtin function)".dimmed());
            }
            Some(other) => println!("  {} is a {}, not a function", name.bright_yellow(), other.type_name()),
            None => println!("{} '{}' is not defined", "Error:".bright_red(), name),
        }
    }

    /// Evaluates the input code and displays the result
    fn eval_input(&mut self, input: &str) {
        if input.trim().is_empty() {
            return;
        }
        match self.interpreter.run(input) {
            Ok(Value::Unit) => {}
            Ok(value) => print_value(&value),
            Err(err) => self.print_error(&err),
        }
    }

    fn print_error(&self, err: &MiniError) {
        eprint!("{}", err);
        if self.interpreter.is_debug() && !err.call_stack.is_empty() {
            eprintln!("{}", "Call stack (innermost first):".dimmed());
            for frame in &err.call_stack {
                eprintln!("  {} {}", "at".dimmed(), frame);
            }
        }
    }
}

/// Formats and displays a value
fn print_value(value: &Value) {
    let rendered = value.repr();
    let colored = match value {
        Value::Number(_) => rendered.bright_white(),
        Value::Str(_) => rendered.bright_green(),
        Value::Bool(_) => rendered.bright_magenta(),
        Value::Function(_) | Value::Builtin(_) => rendered.bright_cyan(),
        _ => rendered.normal(),
    };
    println!("{} {}", "=>".bright_blue(), colored);
}

/// Checks if the input is syntactically complete
/// Returns true if all brackets are balanced and no string or block comment
/// is left open
pub fn is_input_complete(input: &str) -> bool {
    let mut depth: i32 = 0;
    let mut quote: Option<char> = None;
    let mut escape_next = false;
    let mut in_line_comment = false;
    let mut in_block_comment = false;

    let chars: Vec<char> = input.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        let next = chars.get(i + 1).copied();
        i += 1;

        if in_line_comment {
            in_line_comment = ch != '\n';
            continue;
        }
        if in_block_comment {
            if ch == '*' && next == Some('/') {
                in_block_comment = false;
                i += 1;
            }
            continue;
        }
        if let Some(q) = quote {
            if escape_next {
                escape_next = false;
            } else if ch == '\\' {
                escape_next = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }

        match (ch, next) {
            ('/', Some('/')) => in_line_comment = true,
            ('/', Some('*')) => {
                in_block_comment = true;
                i += 1;
            }
            ('"' | '\'', _) => quote = Some(ch),
            ('{' | '[' | '(', _) => depth += 1,
            ('}' | ']' | ')', _) => depth -= 1,
            _ => {}
        }
    }

    // Over-closed input is complete so the parser can report it
    quote.is_none() && !in_block_comment && depth <= 0
}
