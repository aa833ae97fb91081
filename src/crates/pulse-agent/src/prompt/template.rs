//! Minimal string templates with `{name}` placeholders.
//!
//! `{{` and `}}` render as literal braces. A `{` that does not open a valid
//! identifier followed by `}` is kept as text, so JSON snippets survive in
//! hand-written templates. Substituted values are inserted verbatim and never
//! scanned for placeholders.

use crate::error::{AgentError, Result};
use llm::Message;
use std::collections::HashMap;

/// Values for template placeholders, keyed by variable name.
pub type PromptValues = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    Var(String),
}

/// A text template.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
    partials: HashMap<String, String>,
}

impl PromptTemplate {
    /// Parse `template`. Never fails; malformed braces are kept as text.
    pub fn from_template(template: &str) -> Self {
        Self {
            segments: parse(template),
            partials: HashMap::new(),
        }
    }

    /// A template with no placeholders at all.
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Text(text.into())],
            partials: HashMap::new(),
        }
    }

    /// Pre-fill a variable. Filling a variable the template does not use is a no-op.
    pub fn partial(mut self, name: &str, value: impl Into<String>) -> Self {
        if self.mentions(name) {
            self.partials.insert(name.to_string(), value.into());
        }
        self
    }

    /// Variables still needing a value, in order of first appearance.
    pub fn input_variables(&self) -> Vec<String> {
        let mut vars: Vec<String> = Vec::new();
        for segment in &self.segments {
            if let Segment::Var(name) = segment {
                if !self.partials.contains_key(name) && !vars.contains(name) {
                    vars.push(name.clone());
                }
            }
        }
        vars
    }

    /// Whether `name` is still an open input variable.
    pub fn declares(&self, name: &str) -> bool {
        self.mentions(name) && !self.partials.contains_key(name)
    }

    fn mentions(&self, name: &str) -> bool {
        self.segments
            .iter()
            .any(|s| matches!(s, Segment::Var(v) if v == name))
    }

    /// Render with `values`; every open variable must have a value.
    pub fn format(&self, values: &PromptValues) -> Result<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Var(name) => {
                    let value = self
                        .partials
                        .get(name)
                        .or_else(|| values.get(name))
                        .ok_or_else(|| {
                            AgentError::Config(format!(
                                "Missing value for prompt variable '{}'",
                                name
                            ))
                        })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse(template: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut rest = template;

    while let Some(c) = rest.chars().next() {
        if rest.starts_with("{{") {
            text.push('{');
            rest = &rest[2..];
        } else if rest.starts_with("}}") {
            text.push('}');
            rest = &rest[2..];
        } else if c == '{' {
            match rest[1..].find('}') {
                Some(end) if is_identifier(&rest[1..1 + end]) => {
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(Segment::Var(rest[1..1 + end].to_string()));
                    rest = &rest[end + 2..];
                }
                _ => {
                    text.push('{');
                    rest = &rest[1..];
                }
            }
        } else {
            text.push(c);
            rest = &rest[c.len_utf8()..];
        }
    }

    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
    segments
}

/// One entry of a chat prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageTemplate {
    System(PromptTemplate),
    Human(PromptTemplate),
    Ai(PromptTemplate),
    /// Expands to a list of messages supplied at format time.
    Placeholder(String),
}

impl MessageTemplate {
    fn map_template(self, f: impl FnOnce(PromptTemplate) -> PromptTemplate) -> Self {
        match self {
            MessageTemplate::System(t) => MessageTemplate::System(f(t)),
            MessageTemplate::Human(t) => MessageTemplate::Human(f(t)),
            MessageTemplate::Ai(t) => MessageTemplate::Ai(f(t)),
            placeholder => placeholder,
        }
    }

    fn template(&self) -> Option<&PromptTemplate> {
        match self {
            MessageTemplate::System(t) | MessageTemplate::Human(t) | MessageTemplate::Ai(t) => {
                Some(t)
            }
            MessageTemplate::Placeholder(_) => None,
        }
    }
}

/// An ordered list of message templates.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPromptTemplate {
    messages: Vec<MessageTemplate>,
}

impl ChatPromptTemplate {
    pub fn from_messages(messages: Vec<MessageTemplate>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[MessageTemplate] {
        &self.messages
    }

    /// Pre-fill a variable in every message that uses it.
    pub fn partial(self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            messages: self
                .messages
                .into_iter()
                .map(|m| m.map_template(|t| t.partial(name, value.clone())))
                .collect(),
        }
    }

    /// Open text variables followed by placeholder names.
    pub fn input_variables(&self) -> Vec<String> {
        let mut vars: Vec<String> = Vec::new();
        for message in &self.messages {
            let names = match message {
                MessageTemplate::Placeholder(name) => vec![name.clone()],
                other => other
                    .template()
                    .map(PromptTemplate::input_variables)
                    .unwrap_or_default(),
            };
            for name in names {
                if !vars.contains(&name) {
                    vars.push(name);
                }
            }
        }
        vars
    }

    pub fn declares(&self, name: &str) -> bool {
        self.messages.iter().any(|m| match m {
            MessageTemplate::Placeholder(p) => p == name,
            other => other.template().is_some_and(|t| t.declares(name)),
        })
    }

    pub fn has_placeholder(&self, name: &str) -> bool {
        self.messages
            .iter()
            .any(|m| matches!(m, MessageTemplate::Placeholder(p) if p == name))
    }

    /// Render to messages. Every placeholder needs an entry in `placeholders`.
    pub fn format_messages(
        &self,
        values: &PromptValues,
        placeholders: &HashMap<String, Vec<Message>>,
    ) -> Result<Vec<Message>> {
        let mut out = Vec::with_capacity(self.messages.len());
        for message in &self.messages {
            match message {
                MessageTemplate::System(t) => out.push(Message::system(t.format(values)?)),
                MessageTemplate::Human(t) => out.push(Message::human(t.format(values)?)),
                MessageTemplate::Ai(t) => out.push(Message::assistant(t.format(values)?)),
                MessageTemplate::Placeholder(name) => {
                    let messages = placeholders.get(name).ok_or_else(|| {
                        AgentError::Config(format!(
                            "Missing messages for prompt placeholder '{}'",
                            name
                        ))
                    })?;
                    out.extend(messages.iter().cloned());
                }
            }
        }
        Ok(out)
    }
}

/// Build a [`PromptValues`] map from pairs.
pub fn values<'a>(pairs: impl IntoIterator<Item = (&'a str, String)>) -> PromptValues {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}
