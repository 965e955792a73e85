pub mod conversation_state;
pub mod prompt;

use std::io::Write;
use std::process::ExitCode;

use color_print::cwriteln;
use conversation_state::ConversationState;
use eyre::{bail, Result};
use rustyline::error::ReadlineError;
use tracing::info;

use crate::openai_client::{ChatClient, Message, OpenAiClient};

const WELCOME_TEXT: &str = "Type 'exit' or 'quit' to leave.

/help         Show the help dialogue
/clear        Clear the conversation history
/quit         Quit the application
";

const HELP_TEXT: &str = "
ChatGPT CLI

/clear        Clear the conversation history
/help         Show this help dialogue
/quit         Quit the application

Typing 'exit' or 'quit' (any case) also leaves the application.
";

const FAREWELL_TEXT: &str = "Bye!";

pub struct ChatContext {
    output: Box<dyn Write>,
    input: Option<String>,
    interactive: bool,
    model: String,
    system_prompt: String,
    memory: bool,
    conversation_state: ConversationState,
    client: Option<Box<dyn ChatClient>>,
}

impl ChatContext {
    pub fn new(
        output: Box<dyn Write>,
        input: Option<String>,
        interactive: bool,
        model: String,
        system_prompt: String,
        memory: bool,
    ) -> Self {
        let conversation_state = ConversationState::new(&system_prompt);
        Self {
            output,
            input,
            interactive,
            model,
            system_prompt,
            memory,
            conversation_state,
            client: None,
        }
    }

    pub async fn run(&mut self) -> Result<ExitCode> {
        // The credential check happens here, before any prompt is shown.
        match OpenAiClient::new(self.model.clone()) {
            Ok(client) => self.client = Some(Box::new(client)),
            Err(e) => {
                cwriteln!(self.output, "<bold><red>{}</></>", e)?;
                return Ok(ExitCode::from(2));
            }
        }

        info!("Chat session ready (model: {})", self.model);

        if self.interactive {
            self.print_welcome()?;
        }

        // Handle non-interactive mode (single query)
        if let Some(input) = self.input.take() {
            self.handle_input(&input).await?;
            return Ok(ExitCode::SUCCESS);
        }

        // Interactive mode
        if self.interactive {
            self.run_interactive().await?;
        }

        Ok(ExitCode::SUCCESS)
    }

    fn print_welcome(&mut self) -> Result<()> {
        cwriteln!(
            self.output,
            "\nHi, I'm ChatGPT. Model: <bold>{}</>",
            self.model
        )?;
        writeln!(self.output, "{}", WELCOME_TEXT)?;
        Ok(())
    }

    fn print_farewell(&mut self) -> Result<()> {
        writeln!(self.output, "{}", FAREWELL_TEXT)?;
        Ok(())
    }

    async fn run_interactive(&mut self) -> Result<()> {
        let mut rl = prompt::rl()?;

        loop {
            let prompt_text = prompt::user_prompt();
            let readline = rl.readline(&prompt_text);

            match readline {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }

                    rl.add_history_entry(line.as_str());

                    if is_quit_command(&line) {
                        self.print_farewell()?;
                        break;
                    }

                    if let Err(e) = self.handle_input(&line).await {
                        cwriteln!(self.output, "<bold><red>API error:</></> {}", e)?;
                    }
                }
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                    // End of input and interrupt both end the session gracefully.
                    self.print_farewell()?;
                    break;
                }
                Err(e) => {
                    cwriteln!(self.output, "<bold><red>Error:</></> {}", e)?;
                    break;
                }
            }
        }

        Ok(())
    }

    async fn handle_input(&mut self, input: &str) -> Result<()> {
        match input.trim() {
            "/help" => {
                writeln!(self.output, "{}", HELP_TEXT)?;
            }
            "/clear" => {
                self.conversation_state.clear();
                writeln!(self.output, "Conversation cleared.")?;
            }
            _ => {
                self.process_chat_input(input).await?;
            }
        }

        Ok(())
    }

    async fn process_chat_input(&mut self, input: &str) -> Result<()> {
        // In stateless mode a fresh system + user pair is sent instead of
        // the retained history.
        let outgoing = if self.memory {
            self.conversation_state.request_messages(input)
        } else {
            ConversationState::new(&self.system_prompt).request_messages(input)
        };

        let reply = self.request_completion(&outgoing).await?;

        self.display_response(&reply)?;

        if self.memory {
            self.conversation_state.commit_turn(input, &reply);
        }

        Ok(())
    }

    async fn request_completion(&self, messages: &[Message]) -> Result<String> {
        let client = match &self.client {
            Some(client) => client,
            None => bail!("chat client not initialized"),
        };

        client.complete(messages).await
    }

    fn display_response(&mut self, response: &str) -> Result<()> {
        cwriteln!(self.output, "<bold><green>Assistant:</></> {}", response.trim())?;
        Ok(())
    }
}

fn is_quit_command(input: &str) -> bool {
    let trimmed = input.trim();
    trimmed.eq_ignore_ascii_case("exit")
        || trimmed.eq_ignore_ascii_case("quit")
        || trimmed == "/quit"
}
