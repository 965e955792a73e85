use color_print::cformat;
use rustyline::{Config, Editor, Result};

/// Prompt shown before each line of user input.
pub fn user_prompt() -> String {
    cformat!("<bold><cyan>You:</></> ")
}

pub fn rl() -> Result<Editor<()>> {
    let config = Config::builder()
        .history_ignore_space(true)
        .completion_type(rustyline::CompletionType::List)
        .build();
    Editor::with_config(config)
}
