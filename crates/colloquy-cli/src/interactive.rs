use anyhow::Result;
use std::io::{BufRead, Write};

use colloquy_context::available_presets;
use colloquy_core::Assistant;
use colloquy_llm::ProviderConfig;

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, prompt: &str) -> Result<String> {
    write!(output, "{}", prompt)?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Prompt for a provider and a prompt preset before the session starts.
/// Blank answers keep the configured values.
pub async fn configure<R: BufRead, W: Write>(
    assistant: &Assistant,
    mut input: R,
    mut output: W,
) -> Result<()> {
    writeln!(output, "\n=== Interactive Configuration ===")?;

    writeln!(output, "\nLLM Configuration:")?;
    writeln!(output, "Available providers: openai, anthropic, or any OpenAI-compatible name")?;
    let provider = ask(&mut input, &mut output, "Enter LLM provider (or press Enter for default): ")?;

    if !provider.is_empty() {
        let endpoint = ask(&mut input, &mut output, "Enter API endpoint: ")?;
        let api_key = ask(&mut input, &mut output, "Enter API key: ")?;
        let model = ask(&mut input, &mut output, "Enter model name: ")?;

        let mut config = match provider.as_str() {
            "openai" => ProviderConfig::openai(api_key),
            "anthropic" => ProviderConfig::anthropic(api_key),
            other => ProviderConfig::new(other, String::new()).with_api_key(api_key),
        };
        if !endpoint.is_empty() {
            config.api_endpoint = endpoint;
        }
        if !model.is_empty() {
            config = config.with_model(model);
        }

        if assistant.switch_provider(config).await {
            writeln!(output, "Provider set to {}.", provider)?;
        } else {
            writeln!(output, "Invalid provider settings; keeping the previous provider.")?;
        }
    }

    writeln!(output, "\nPrompt Templates:")?;
    writeln!(output, "Available templates: {}", available_presets().join(", "))?;
    let preset = ask(&mut input, &mut output, "Enter prompt template (or press Enter for default): ")?;
    if !preset.is_empty() && !assistant.load_prompt_preset(&preset).await {
        writeln!(output, "Unknown template '{}'; keeping the current prompt.", preset)?;
    }

    writeln!(output, "\nConfiguration completed!")?;
    Ok(())
}
