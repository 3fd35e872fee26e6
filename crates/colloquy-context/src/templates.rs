use colloquy_types::DEFAULT_SYSTEM_PROMPT;

pub const CREATIVE_SYSTEM_PROMPT: &str = "You are a creative and imaginative AI assistant. Provide engaging, innovative responses while maintaining accuracy.";
pub const ANALYTICAL_SYSTEM_PROMPT: &str = "You are an analytical AI assistant. Provide detailed, logical, and well-structured responses with clear reasoning.";
pub const CASUAL_SYSTEM_PROMPT: &str = "You are a friendly and casual AI assistant. Keep responses relaxed and conversational, like talking to a friend.";
pub const PROFESSIONAL_SYSTEM_PROMPT: &str = "You are a professional AI assistant. Provide formal, precise, and business-appropriate responses.";

const PRESETS: &[(&str, &str)] = &[
    ("default", DEFAULT_SYSTEM_PROMPT),
    ("creative", CREATIVE_SYSTEM_PROMPT),
    ("analytical", ANALYTICAL_SYSTEM_PROMPT),
    ("casual", CASUAL_SYSTEM_PROMPT),
    ("professional", PROFESSIONAL_SYSTEM_PROMPT),
];

/// Names accepted by [`prompt_preset`]
pub fn available_presets() -> Vec<&'static str> {
    PRESETS.iter().map(|(name, _)| *name).collect()
}

/// System prompt for a named preset
pub fn prompt_preset(name: &str) -> Option<&'static str> {
    PRESETS
        .iter()
        .find(|(preset, _)| *preset == name)
        .map(|(_, prompt)| *prompt)
}
