//! Prompt templates for RECALL feedback synthesis.
//!
//! Templates live as plain-text files under a prompt directory so they can be
//! edited without rebuilding. A missing file is seeded from the built-in
//! default the first time it is asked for.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::LlmError;

/// Default system instruction for feedback synthesis.
pub const FEEDBACK_SYSTEM: &str = r"
You are an AI assistant that helps NPCs process feedback about their actions.
Your task is to create a natural language summary of the feedback that describes how an action affected the NPC.
You will analyze the action details, success/failure information, and how the action affected the NPC's needs.

Respond with a concise, first-person perspective description of the experience.
";

/// Default user prompt for feedback synthesis.
pub const FEEDBACK_PROMPT: &str = r"
I am {agent_name}, and I just tried to {action} {interactable} at {location}.

Result: {success_status}
{feedback_description}

Changes in my needs:
- Hunger: {hunger_diff} {hunger_feeling}
- Sleepiness: {sleepiness_diff} {sleepiness_feeling}
- Loneliness: {loneliness_diff} {loneliness_feeling}
- Stress: {stress_diff} {stress_feeling}

Please create a concise, first-person perspective description of my experience that I can remember.
";

/// Render a template by replacing `{key}` placeholders with values.
///
/// Single left-to-right pass: substituted values are never re-scanned, so a
/// value containing `{key}` is kept literally. Unknown placeholders are left
/// as they are.
#[must_use]
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find(['{', '}']) {
            Some(close) if after.as_bytes()[close] == b'}' => {
                let key = &after[..close];
                match vars.iter().find(|(k, _)| *k == key) {
                    Some((_, value)) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Identifies a prompt template by purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    /// The user prompt describing the action and its effect on needs.
    FeedbackPrompt,
    /// The system instruction sent alongside it.
    FeedbackSystem,
}

impl PromptId {
    /// File name of this template inside the prompt directory.
    #[must_use]
    pub fn filename(self) -> &'static str {
        match self {
            Self::FeedbackPrompt => "feedback_prompt.txt",
            Self::FeedbackSystem => "feedback_system.txt",
        }
    }

    /// Built-in text used when the file is missing or unreadable.
    #[must_use]
    pub fn default_template(self) -> &'static str {
        match self {
            Self::FeedbackPrompt => FEEDBACK_PROMPT,
            Self::FeedbackSystem => FEEDBACK_SYSTEM,
        }
    }

    /// All template ids.
    #[must_use]
    pub fn all() -> &'static [PromptId] {
        &[Self::FeedbackPrompt, Self::FeedbackSystem]
    }
}

impl fmt::Display for PromptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FeedbackPrompt => write!(f, "feedback_prompt"),
            Self::FeedbackSystem => write!(f, "feedback_system"),
        }
    }
}

/// File-backed template store rooted at one directory.
#[derive(Debug, Clone)]
pub struct PromptStore {
    dir: PathBuf,
}

impl PromptStore {
    /// Create a store over `dir`. Nothing is touched on disk yet.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The prompt directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of a template file.
    #[must_use]
    pub fn path_of(&self, id: PromptId) -> PathBuf {
        self.dir.join(id.filename())
    }

    /// Load a template.
    ///
    /// Reads the file when it exists. Otherwise writes the default there
    /// (creating the directory) and returns it. Any I/O failure is logged
    /// and the default is returned instead; this never fails.
    #[must_use]
    pub fn load(&self, id: PromptId) -> String {
        match self.try_load(id) {
            Ok(text) => text,
            Err(e) => {
                warn!(prompt = %id, error = %e, "Falling back to built-in prompt template");
                id.default_template().to_string()
            }
        }
    }

    /// Write every missing template file with its default.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::TemplateLoad`] if a file cannot be written.
    pub fn ensure_defaults(&self) -> Result<(), LlmError> {
        for id in PromptId::all() {
            let path = self.path_of(*id);
            if !path.exists() {
                self.write_default(*id, &path)?;
            }
        }
        Ok(())
    }

    fn try_load(&self, id: PromptId) -> Result<String, LlmError> {
        let path = self.path_of(id);
        if path.exists() {
            return fs::read_to_string(&path)
                .map_err(|e| LlmError::TemplateLoad(format!("{}: {e}", path.display())));
        }
        self.write_default(id, &path)?;
        Ok(id.default_template().to_string())
    }

    fn write_default(&self, id: PromptId, path: &Path) -> Result<(), LlmError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| LlmError::TemplateLoad(format!("{}: {e}", self.dir.display())))?;
        fs::write(path, id.default_template())
            .map_err(|e| LlmError::TemplateLoad(format!("{}: {e}", path.display())))?;
        debug!(prompt = %id, path = %path.display(), "Wrote default prompt template");
        Ok(())
    }
}
