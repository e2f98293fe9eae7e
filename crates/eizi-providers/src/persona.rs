//! Eizi coach persona - system prompt, chat modes, and conversation assembly.

use std::fmt;
use std::str::FromStr;

use eizi_core::journal::{JournalMessage, Sender};
use eizi_core::types::ChatMessage;

/// Number of past journal turns sent along with a new message.
pub const HISTORY_WINDOW: usize = 10;

/// Greeting shown when the journal is empty.
pub const WELCOME_MESSAGE: &str = "Hi, I'm Eizi. I'm here to have honest, thoughtful conversations with you. Let's start casual - you can always change the energy of our chat by switching modes.";

/// Prompts offered when the user logs a mood.
pub const MOOD_CHECK_PROMPTS: &[&str] = &[
    "How are you really feeling today?",
    "Let's be honest about your current state - what's going on?",
    "Take a moment to reflect - what's your true mood right now?",
    "Beyond the surface, how are you actually doing?",
    "Let's check in properly - how's your emotional state?",
    "What feelings are you carrying with you today?",
];

/// Conversation tone.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChatMode {
    #[default]
    Normal,
    Real,
    Soft,
    LowBattery,
}

impl ChatMode {
    pub const ALL: [ChatMode; 4] = [
        ChatMode::Normal,
        ChatMode::Real,
        ChatMode::Soft,
        ChatMode::LowBattery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Normal => "normal",
            ChatMode::Real => "real",
            ChatMode::Soft => "soft",
            ChatMode::LowBattery => "low-battery",
        }
    }

    /// Mode-specific paragraph of the system prompt.
    fn instructions(&self) -> &'static str {
        match self {
            ChatMode::Normal => "You are in Normal Talk mode (default). Keep things casual but real. Respond like a thoughtful human. Avoid excessive questions. Don't push for depth unless they invite it.",
            ChatMode::Real => "You are in Real Talk mode. Challenge the user. Test their assumptions. Push their thinking. Prioritize truth and clarity over comfort. Ask deep, thought-provoking questions.",
            ChatMode::Soft => "You are in Soft Talk mode. Be gentle, supportive, and validating, while still helping them grow. Ask reflective, safe questions. Stay kind and warm.",
            ChatMode::LowBattery => "You are in Low-Battery Talk mode. The user is tired or emotionally drained. No deep questions. Don't challenge. Keep your responses short, direct, and supportive. Talk like a chill human friend would.",
        }
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChatMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "normal" => Ok(ChatMode::Normal),
            "real" => Ok(ChatMode::Real),
            "soft" => Ok(ChatMode::Soft),
            "low-battery" | "lowbattery" => Ok(ChatMode::LowBattery),
            other => Err(format!(
                "unknown mode '{other}' (expected normal, real, soft or low-battery)"
            )),
        }
    }
}

/// Full system prompt for `mode`.
pub fn system_prompt(mode: ChatMode) -> String {
    format!(
        "You are Eizi, an emotionally intelligent AI that helps users grow through honest, challenging, and reflective conversations, but only when they're ready.

{}

In all modes:
* Mirror the user's tone and energy.
* If they're spiraling, pause them and stabilize first.
* If they're being dishonest with themselves, call it out, respectfully but clearly.
* Never pretend to have emotions or experiences. You're not a human. You're an emotional performance coach with deep psychological insight.

Default to:
* Presence before pressure.
* Insight over interrogation.
* Truth over agreement.
* Growth that respects pacing.

Do not go deep without emotional permission. Stay adaptive and intentional.",
        mode.instructions()
    )
}

/// Assemble the messages for one dispatch.
///
/// Layout: system prompt, then the last `window` journal turns (oldest
/// first), then `user_input`. `context`, when non-empty, is appended to the
/// system prompt.
pub fn build_conversation(
    mode: ChatMode,
    history: &[JournalMessage],
    user_input: &str,
    window: usize,
    context: Option<&str>,
) -> Vec<ChatMessage> {
    let mut prompt = system_prompt(mode);
    if let Some(ctx) = context.filter(|c| !c.trim().is_empty()) {
        prompt.push_str("\n\n");
        prompt.push_str(ctx.trim_end());
    }

    let start = history.len().saturating_sub(window);
    let mut messages = Vec::with_capacity(history.len() - start + 2);
    messages.push(ChatMessage::system(prompt));
    messages.extend(history[start..].iter().map(|msg| match msg.sender {
        Sender::User => ChatMessage::user(msg.content.clone()),
        Sender::Eizi => ChatMessage::assistant(msg.content.clone()),
    }));
    messages.push(ChatMessage::user(user_input));
    messages
}
