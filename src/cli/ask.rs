//! Ask command handler (one-shot and interactive).

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use docent::config::Config;
use docent::gateway::ChatHandler;

const DEFAULT_SESSION: &str = "cli";

/// Answer one message, or read messages from stdin until EOF or `quit`.
pub(crate) async fn cmd_ask(
    config: Config,
    message: Option<String>,
    session: Option<String>,
) -> Result<()> {
    let handler = ChatHandler::from_config(&config).context("Failed to initialize chat handler")?;
    let session = session.unwrap_or_else(|| DEFAULT_SESSION.to_string());

    if let Some(msg) = message {
        println!("{}", handler.handle_message(&session, &msg, None).await);
        return Ok(());
    }

    println!("Docent Interactive Mode (model: {})", handler.model());
    println!("Type your question and press Enter. '/clear' forgets the conversation, 'quit' exits.");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            // EOF
            println!();
            break;
        }

        let input = input.trim();
        match input {
            "" => continue,
            "quit" | "exit" => {
                println!("Goodbye!");
                break;
            }
            "/clear" => {
                handler.clear_session(&session).await;
                println!("Conversation cleared.");
            }
            _ => {
                let reply = handler.handle_message(&session, input, None).await;
                println!("{}\n", reply);
            }
        }
    }

    Ok(())
}
