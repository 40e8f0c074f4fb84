use std::io::{self, Write};

use dotenv::dotenv;
use futures::StreamExt;
use llm_gradientai::{AsyncLlm, ChatMessage, GradientAi, GradientAiConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let llm = GradientAi::new(GradientAiConfig::from_env("llama3.3-70b-instruct")?)?;

    let mut stream = llm
        .astream_chat(&[ChatMessage::user(
            "Explain the process of photosynthesis step by step.",
        )])
        .await?;

    while let Some(delta) = stream.next().await {
        match delta {
            Ok(delta) => {
                print!("{}", delta.delta);
                io::stdout().flush()?;
            }
            Err(e) => {
                eprintln!("\nError during streaming: {e}");
                break;
            }
        }
    }

    println!();
    Ok(())
}
