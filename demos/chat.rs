use dotenv::dotenv;
use llm_gradientai::{AsyncLlm, ChatMessage, GradientAi, GradientAiConfig, Llm};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = GradientAiConfig::from_env("llama3.3-70b-instruct")?
        .with_temperature(0.7)
        .with_timeout(30.0);
    let llm = GradientAi::new(config)?;

    println!("Model: {}", llm.metadata().model_name);

    let completion = llm.acomplete("Tell me a random fact about space.").await?;
    println!("Completion: {}", completion.text);

    let response = llm
        .achat(&[
            ChatMessage::system("You answer in exactly one sentence."),
            ChatMessage::user("Why do cats purr?"),
        ])
        .await?;
    println!("{}: {}", response.message.role, response.message.content);

    Ok(())
}
