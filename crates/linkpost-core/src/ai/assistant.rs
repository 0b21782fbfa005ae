//! Prompt templates for the editing actions.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::{LanguageModel, Message};
use crate::models::Language;
use crate::{Error, Result};

/// Maximum length of a LinkedIn post.
pub const LINKEDIN_CHAR_LIMIT: usize = 3000;

/// Counts above this are close enough to the limit to warn about.
pub const CHAR_WARNING_THRESHOLD: usize = 2700;

static LIST_NUMBERING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.?\s*").expect("valid numbering regex"));

/// Wraps a language model with the editor's prompts.
#[derive(Clone)]
pub struct Assistant {
    model: Arc<dyn LanguageModel>,
    markdown: bool,
}

impl Assistant {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            markdown: false,
        }
    }

    #[must_use]
    pub fn with_markdown(mut self, markdown: bool) -> Self {
        self.markdown = markdown;
        self
    }

    fn format_rule(&self) -> &'static str {
        if self.markdown {
            "You may use markdown formatting."
        } else {
            "Return plain text only without any markdown formatting."
        }
    }

    async fn ask(&self, system: &str, text: &str) -> Result<String> {
        let reply = self.model.complete(system, &[Message::user(text)]).await?;
        Ok(reply.trim().to_string())
    }

    /// Correct grammar, spelling and tone of Swedish text.
    pub async fn proofread_swedish(&self, text: &str) -> Result<String> {
        let system = format!(
            "You are a professional Swedish language editor. Your task is to proofread the \
             following Swedish text for grammar, spelling, style, and professional tone suitable \
             for LinkedIn posts.\n\n\
             Make corrections and improvements while preserving the original meaning and voice.\n\
             {}\n\n\
             Return only the corrected text, nothing else.",
            self.format_rule()
        );
        self.ask(&system, text).await
    }

    /// Shorten Swedish text towards the LinkedIn length limit.
    pub async fn condense(&self, text: &str) -> Result<String> {
        let system = format!(
            "You are a professional content editor. Your task is to make the following Swedish \
             text more concise while preserving its core meaning and professional tone for \
             LinkedIn.\n\n\
             The LinkedIn character limit is {LINKEDIN_CHAR_LIMIT}. Aim to reduce the text length \
             while keeping all important information.\n\
             {}\n\n\
             Return only the shortened text, nothing else.",
            self.format_rule()
        );
        self.ask(&system, text).await
    }

    /// Translate Swedish text to English or Romanian.
    pub async fn translate_from_swedish(&self, text: &str, target: Language) -> Result<String> {
        if target == Language::Swedish {
            return Err(Error::InvalidInput("Swedish is the source language".into()));
        }
        let name = target.display_name();
        let system = format!(
            "You are a professional translator specializing in Swedish to {name} translation for \
             business and professional content.\n\n\
             Translate the following Swedish text to {name}, maintaining a professional tone \
             suitable for LinkedIn.\n\
             {}\n\n\
             Return only the {name} translation, nothing else.",
            self.format_rule()
        );
        self.ask(&system, text).await
    }

    /// Translate English or Romanian text to Swedish.
    pub async fn translate_to_swedish(&self, text: &str, source: Language) -> Result<String> {
        if source == Language::Swedish {
            return Err(Error::InvalidInput("Text is already Swedish".into()));
        }
        let name = source.display_name();
        let system = format!(
            "You are a professional translator specializing in {name} to Swedish translation for \
             business and professional content.\n\n\
             Translate the following {name} text to Swedish, maintaining a professional tone \
             suitable for LinkedIn.\n\
             {}\n\n\
             Return only the Swedish translation, nothing else.",
            self.format_rule()
        );
        self.ask(&system, text).await
    }

    /// Three to five alternative phrasings of `text`.
    pub async fn translation_help(&self, text: &str, source: Language) -> Result<Vec<String>> {
        let system = format!(
            "You are a professional translator and language expert. Provide 3-5 alternative \
             translations or phrasings for the given text.\n\n\
             The source language is {}. Provide alternatives that maintain the professional tone \
             suitable for LinkedIn.\n\n\
             Return only the alternatives, one per line, numbered 1-5. Do not include any other \
             text or explanation.",
            source.display_name()
        );
        let reply = self.ask(&system, text).await?;
        Ok(parse_alternatives(&reply))
    }
}

fn parse_alternatives(reply: &str) -> Vec<String> {
    reply
        .lines()
        .map(|line| LIST_NUMBERING.replace(line.trim(), "").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AiError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Replies with a fixed text and records every system prompt.
    struct Scripted {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn last_prompt(&self) -> String {
            self.prompts.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait]
    impl LanguageModel for Scripted {
        async fn complete(
            &self,
            system: &str,
            messages: &[Message],
        ) -> std::result::Result<String, AiError> {
            assert_eq!(messages.len(), 1);
            self.prompts.lock().unwrap().push(system.to_string());
            Ok(self.reply.clone())
        }
    }

    #[test]
    fn parse_alternatives_strips_numbering() {
        let reply = "1. Hej alla\n2.Hej allihop\n\n3 Tjena\n  4.   God dag  \n";
        assert_eq!(
            parse_alternatives(reply),
            vec!["Hej alla", "Hej allihop", "Tjena", "God dag"]
        );
    }

    #[tokio::test]
    async fn proofread_trims_reply_and_follows_markdown_switch() {
        let model = Scripted::new("  Rättad text \n");
        let assistant = Assistant::new(model.clone());

        assert_eq!(assistant.proofread_swedish("text").await.unwrap(), "Rättad text");
        assert!(model.last_prompt().contains("plain text only"));

        let assistant = assistant.with_markdown(true);
        assistant.proofread_swedish("text").await.unwrap();
        assert!(model.last_prompt().contains("You may use markdown formatting."));
    }

    #[tokio::test]
    async fn condense_mentions_linkedin_limit() {
        let model = Scripted::new("kort");
        Assistant::new(model.clone()).condense("lång").await.unwrap();
        assert!(model.last_prompt().contains("character limit is 3000"));
    }

    #[tokio::test]
    async fn translation_prompts_name_languages() {
        let model = Scripted::new("Salut");
        let assistant = Assistant::new(model.clone());

        assistant
            .translate_from_swedish("Hej", Language::Romanian)
            .await
            .unwrap();
        assert!(model.last_prompt().contains("Swedish to Romanian"));

        assistant
            .translate_to_swedish("Hello", Language::English)
            .await
            .unwrap();
        assert!(model.last_prompt().contains("English to Swedish"));
    }

    #[tokio::test]
    async fn translation_rejects_swedish_pairs() {
        let assistant = Assistant::new(Scripted::new("x"));
        assert!(assistant
            .translate_from_swedish("Hej", Language::Swedish)
            .await
            .is_err());
        assert!(assistant
            .translate_to_swedish("Hej", Language::Swedish)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn translation_help_returns_alternatives() {
        let model = Scripted::new("1. One\n2. Two\n3. Three");
        let alternatives = Assistant::new(model)
            .translation_help("Ett", Language::Swedish)
            .await
            .unwrap();
        assert_eq!(alternatives, vec!["One", "Two", "Three"]);
    }
}
