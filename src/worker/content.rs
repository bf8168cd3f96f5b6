//! Game content for `content` queue tasks.

use serde::Serialize;

use crate::backend::GameAi;

const NPC_DIALOGUE: &[&str] = &[
    "Welcome, brave adventurer! What can I help you with today?",
    "These items will surely aid you on your journey!",
    "Come back anytime you need supplies!",
];

const ITEM_DESCRIPTION: &[&str] = &[
    "A powerful item that grants special abilities.",
    "Rare and valuable, sought after by many.",
];

const DEFAULT_CONTENT: &[&str] = &["Default content"];

/// Canned lines for a content type.
pub fn templates(content_type: &str) -> &'static [&'static str] {
    match content_type {
        "npc_dialogue" => NPC_DIALOGUE,
        "item_description" => ITEM_DESCRIPTION,
        _ => DEFAULT_CONTENT,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedContent {
    pub content_type: String,
    pub context: String,
    /// `"huggingface"` or `"template"`
    pub source: &'static str,
    pub generated: Vec<String>,
}

/// Generate content with hosted text generation, falling back to templates.
pub async fn generate(ai: Option<&GameAi>, content_type: &str, context: &str) -> GeneratedContent {
    if let Some(ai) = ai {
        match ai.generate_game_content(content_type, context).await {
            Ok(generated) => {
                return GeneratedContent {
                    content_type: content_type.to_string(),
                    context: context.to_string(),
                    source: "huggingface",
                    generated,
                }
            }
            Err(e) => tracing::warn!("Content generation failed, using templates: {}", e),
        }
    }

    GeneratedContent {
        content_type: content_type.to_string(),
        context: context.to_string(),
        source: "template",
        generated: templates(content_type).iter().map(|s| s.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_type_gets_default_content() {
        assert_eq!(templates("quest_log"), ["Default content"]);
        assert_eq!(templates("npc_dialogue").len(), 3);
    }

    #[tokio::test]
    async fn without_ai_uses_templates() {
        let content = generate(None, "item_description", "sword").await;
        assert_eq!(content.source, "template");
        assert_eq!(content.context, "sword");
        assert_eq!(content.generated.len(), 2);
    }
}
