use std::sync::Arc;

use crate::food::analysis::FoodAnalyzer;

pub mod food_cmd;
mod system;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Continue,
    Exit,
}

pub struct CommandHandler {
    analyzer: Arc<FoodAnalyzer>,
}

impl CommandHandler {
    pub fn new(analyzer: Arc<FoodAnalyzer>) -> Self {
        Self { analyzer }
    }

    pub async fn handle_command(&mut self, input: &str) -> Result<CommandOutcome, String> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(CommandOutcome::Continue);
        }

        match input.to_lowercase().as_str() {
            "help" | "exit" | "quit" => return system::handle_command(input),
            _ => {}
        }

        match input.split_whitespace().next() {
            Some("analyze") | Some("nutrition") => {
                food_cmd::handle_command(input, &self.analyzer).await?;
                Ok(CommandOutcome::Continue)
            }
            _ => Err("Unknown command. Type 'help' for available commands.".to_string()),
        }
    }
}
