use dotenv::dotenv;
use llm_gradientai::{
    AsyncLlm, ChatMessage, GradientAi, GradientAiConfig, Tool, ToolChoice, ToolSelection,
};
use serde_json::json;

#[derive(schemars::JsonSchema, serde::Deserialize)]
#[allow(dead_code)]
/// Arguments of the weather lookup.
struct WeatherArgs {
    /// City to look up (e.g. Lisbon).
    city: String,
}

fn get_weather(selection: &ToolSelection) -> serde_json::Value {
    let city = selection.arguments["city"].as_str().unwrap_or("unknown");
    json!({ "city": city, "temperature": 19.0, "conditions": "clear skies" })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let llm = GradientAi::new(GradientAiConfig::from_env("llama3.3-70b-instruct")?)?;
    let tools = [Tool::from_schema::<WeatherArgs>(
        "get_weather",
        Some("Get the current weather for a city.".to_string()),
    )?];

    let mut messages = vec![ChatMessage::user("What's the weather like in Lisbon?")];
    let response = llm
        .achat_with_tools(&messages, &tools, Some(&ToolChoice::Auto))
        .await?;

    let selections = response.tool_selections(false)?;
    if selections.is_empty() {
        println!("{}", response.message.content);
        return Ok(());
    }

    messages.push(response.message.clone());
    for selection in &selections {
        println!("Calling {} with {}", selection.name, selection.arguments);
        messages.push(ChatMessage::tool(
            selection.id.clone(),
            get_weather(selection).to_string(),
        ));
    }

    let answer = llm.achat(&messages).await?;
    println!("{}", answer.message.content);

    Ok(())
}
