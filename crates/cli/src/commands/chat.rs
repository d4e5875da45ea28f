//! `cardsense chat`: interactive or single-message chat mode.
//!
//! The continuation token from each reply is sent with the next question,
//! so the service keeps the conversation history.

use cardsense_assistant::Assistant;
use cardsense_core::ConversationToken;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_with_api_key()?;
    let assistant = cardsense_gateway::assistant_from_config(&config)?;

    if let Some(msg) = message {
        eprint!("  Thinking...");
        let reply = assistant.ask(&msg, None, None).await?;
        eprint!("\r              \r");
        println!("{}", reply.text);
        return Ok(());
    }

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        CardSense AI: Interactive Mode        ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Model:       {}", config.model);
    println!("  Deployment:  {}", config.deployment);
    println!();
    println!("  Ask about credit cards and press Enter.");
    println!("  Type 'exit' or 'quit' to leave.");
    println!();

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    repl(&assistant, stdin, &mut stdout).await?;

    println!();
    println!("  Goodbye! 👋");
    println!();

    Ok(())
}

/// Read questions line by line until `exit`, `quit` or end of input.
///
/// Returns the last continuation token.
pub(crate) async fn repl<R, W>(
    assistant: &Assistant,
    input: R,
    out: &mut W,
) -> Result<Option<ConversationToken>, Box<dyn std::error::Error>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut token: Option<ConversationToken> = None;

    loop {
        write!(out, "  You > ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line.to_ascii_lowercase().as_str(), "exit" | "quit") {
            break;
        }

        match assistant.ask(line, None, token.clone()).await {
            Ok(reply) => {
                writeln!(out)?;
                for text_line in reply.text.lines() {
                    writeln!(out, "  CardSense > {text_line}")?;
                }
                writeln!(out)?;
                token = reply.token;
            }
            Err(e) => {
                writeln!(out, "  [Error] {e}")?;
                writeln!(out)?;
            }
        }
    }

    Ok(token)
}
