//! Prompt assembly from persona, Scripture and user sections.
//!
//! A prompt is rendered from three typed sections in a fixed order:
//!
//! ```text
//! <persona instructions>
//!
//! Relevant Scripture:
//! - John 3:16 (WEB): For God so loved the world, ...
//! Draw on these passages where they fit and cite the reference when quoting.
//!
//! About the user:
//! <user context>
//! ```
//!
//! The Scripture section is left out entirely when there are no passages and
//! the user section when there is no context, so a degraded retrieval
//! produces a prompt with no `Relevant Scripture:` marker at all.

use crate::document::{Chunk, RetrievedPassage};

/// Heading that opens the Scripture section.
pub const SCRIPTURE_HEADING: &str = "Relevant Scripture:";
/// Heading that opens the user-context section.
pub const USER_CONTEXT_HEADING: &str = "About the user:";

const SCRIPTURE_GUIDANCE: &str =
    "Draw on these passages where they fit and cite the reference when quoting.";

/// The character persona's system instructions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersonaSection(String);

impl PersonaSection {
    pub fn new(instructions: impl Into<String>) -> Self {
        Self(instructions.into())
    }

    fn render(&self) -> Option<String> {
        let text = self.0.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// Retrieved passages, most relevant first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptureContext {
    passages: Vec<RetrievedPassage>,
}

impl ScriptureContext {
    pub fn new(passages: Vec<RetrievedPassage>) -> Self {
        Self { passages }
    }

    pub fn from_chunks(chunks: &[Chunk]) -> Self {
        Self::new(chunks.iter().map(RetrievedPassage::from).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    pub fn passages(&self) -> &[RetrievedPassage] {
        &self.passages
    }

    fn render(&self) -> Option<String> {
        if self.passages.is_empty() {
            return None;
        }
        let mut out = String::from(SCRIPTURE_HEADING);
        for passage in &self.passages {
            out.push_str(&format!(
                "\n- {} ({}): {}",
                passage.reference, passage.translation, passage.text
            ));
        }
        out.push('\n');
        out.push_str(SCRIPTURE_GUIDANCE);
        Some(out)
    }
}

/// Personalisation hints about the user (study progress, prayer requests, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext(String);

impl UserContext {
    pub fn new(context: impl Into<String>) -> Self {
        Self(context.into())
    }

    fn render(&self) -> Option<String> {
        let text = self.0.trim();
        (!text.is_empty()).then(|| format!("{USER_CONTEXT_HEADING}\n{text}"))
    }
}

/// Builds the final instruction handed to the completion model.
///
/// # Example
///
/// ```rust,ignore
/// use scripture_rag::PromptBuilder;
///
/// let prompt = PromptBuilder::new("You are Ruth, the Moabite widow...")
///     .scripture_chunks(&chunks)
///     .user_context("Has read through Ruth 2 this week.")
///     .render();
/// ```
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    persona: PersonaSection,
    scripture: ScriptureContext,
    user: Option<UserContext>,
}

impl PromptBuilder {
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: PersonaSection::new(persona),
            scripture: ScriptureContext::default(),
            user: None,
        }
    }

    pub fn scripture(mut self, scripture: ScriptureContext) -> Self {
        self.scripture = scripture;
        self
    }

    pub fn scripture_chunks(self, chunks: &[Chunk]) -> Self {
        self.scripture(ScriptureContext::from_chunks(chunks))
    }

    pub fn user_context(mut self, context: impl Into<String>) -> Self {
        self.user = Some(UserContext::new(context));
        self
    }

    /// Render persona, Scripture and user sections, separated by blank lines.
    pub fn render(&self) -> String {
        [
            self.persona.render(),
            self.scripture.render(),
            self.user.as_ref().and_then(UserContext::render),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join("\n\n")
    }
}

/// Render a prompt from persona text, retrieved chunks and optional user context.
pub fn build_prompt(persona: &str, chunks: &[Chunk], user_context: Option<&str>) -> String {
    let mut builder = PromptBuilder::new(persona).scripture_chunks(chunks);
    if let Some(context) = user_context {
        builder = builder.user_context(context);
    }
    builder.render()
}
