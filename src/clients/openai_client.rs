use std::time::Duration;

use serde::{Deserialize, Serialize};

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const SYSTEM_MESSAGE: &str = "You are a strict JSON calendar planning engine. You read a day's \
     work hours, busy times, and tasks and reply ONLY with a single JSON object describing the \
     schedule, with no markdown, no backticks, and no extra text.";

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: String,
}

/// Sends the planning prompt to OpenAI and returns the raw completion text.
/// Interpreting that text as a schedule is the proposal adapter's job.
pub async fn generate_plan_completion(
    prompt: &str,
    api_key: &str,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let request = OpenAIRequest {
        model: "gpt-4o-mini".to_string(),
        messages: vec![
            OpenAIMessage {
                role: "system".to_string(),
                content: SYSTEM_MESSAGE.to_string(),
            },
            OpenAIMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            },
        ],
        max_tokens: 1500,
        temperature: 0.2,
    };

    let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
    let response = client
        .post(OPENAI_URL)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&request)
        .send()
        .await?;

    let status = response.status();
    let text = response.text().await?;

    if !status.is_success() {
        return Err(format!("OpenAI API returned status {}: {}", status, text).into());
    }

    let parsed: OpenAIResponse = serde_json::from_str(&text)
        .map_err(|e| format!("failed to parse OpenAI response: {}\nRaw body: {}", e, text))?;

    if let Some(choice) = parsed.choices.first() {
        Ok(choice.message.content.clone())
    } else {
        Err("no choices in OpenAI response".to_string().into())
    }
}
