mod builder;
mod template;
mod templates;

pub use builder::ContextBuilder;
pub use template::expand_template;
pub use templates::{
    available_presets, prompt_preset, ANALYTICAL_SYSTEM_PROMPT, CASUAL_SYSTEM_PROMPT,
    CREATIVE_SYSTEM_PROMPT, PROFESSIONAL_SYSTEM_PROMPT,
};
