//! `${NAME}` expansion for raw config text.
//!
//! Only well-formed names (`[A-Za-z_][A-Za-z0-9_]*`) are treated as
//! placeholders. Anything else, including an unterminated `${`, stays literal.

/// Config text after placeholder expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expanded {
    pub text: String,
    /// Placeholder names with no value, in first-seen order, deduplicated.
    /// Their `${NAME}` text is kept in [`Expanded::text`].
    pub unresolved: Vec<String>,
}

impl Expanded {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Expand placeholders from the process environment.
pub fn expand_env(input: &str) -> Expanded {
    expand_with(input, |name| std::env::var(name).ok())
}

/// Expand placeholders through `lookup`.
pub fn expand_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> Expanded {
    let mut text = String::with_capacity(input.len());
    let mut unresolved: Vec<String> = Vec::new();
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        text.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            break;
        };
        let name = &after[..end];
        let placeholder = &rest[start..start + 2 + end + 1];
        rest = &after[end + 1..];

        if !is_var_name(name) {
            text.push_str(placeholder);
            continue;
        }
        match lookup(name) {
            Some(value) => text.push_str(&value),
            None => {
                if !unresolved.iter().any(|n| n == name) {
                    unresolved.push(name.to_string());
                }
                text.push_str(placeholder);
            },
        }
    }
    text.push_str(rest);

    Expanded { text, unresolved }
}

fn is_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
