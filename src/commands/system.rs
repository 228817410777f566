use colored::Colorize;

use super::CommandOutcome;

pub fn handle_command(input: &str) -> Result<CommandOutcome, String> {
    match input.to_lowercase().as_str() {
        "help" => {
            println!("\n{}", "🍎 Food Commands:".bold());
            println!("  analyze <image path>  - Identify the food in a photo and show nutrition");
            println!("  nutrition <food>      - Look up nutrition facts by name");
            println!("  Example: analyze ./lunch.jpg, nutrition banana");
            println!();

            println!("{}", "⚙️ System Commands:".bold());
            println!("  help  - Show this help menu");
            println!("  exit  - Exit the program");
            println!();
            Ok(CommandOutcome::Continue)
        }
        "exit" | "quit" => {
            println!("👋 Goodbye!");
            Ok(CommandOutcome::Exit)
        }
        _ => Err("Unknown system command. Type 'help' for available commands.".to_string()),
    }
}
