use minishell::autocomplete::{Autocomplete, ShellHelper};
use minishell::env::Environment;
use minishell::executor::{Executor, ShellIo};
use minishell::history::PipelineHistory;
use minishell::parser::parse_pipeline;
use minishell::registry::CommandRegistry;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;

fn main() -> anyhow::Result<()> {
    let registry = CommandRegistry::with_defaults();

    let mut autocomplete = Autocomplete::new();
    autocomplete.register_many(registry.names());
    autocomplete.register_path_executables();

    let mut rl: Editor<ShellHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(ShellHelper::new(autocomplete)));

    let mut executor = Executor::new(registry, Environment::new());
    let mut history = PipelineHistory::new();

    loop {
        match rl.readline("$ ") {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                let pipeline = parse_pipeline(&line);
                history.add(&pipeline);

                let mut io = ShellIo::inherited();
                match executor.execute(&pipeline, &mut io) {
                    Ok(outcome) => {
                        if !outcome.continue_shell {
                            break;
                        }
                    }
                    Err(e) => eprintln!("{}", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("Interrupted");
                break;
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
