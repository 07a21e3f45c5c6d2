use qwery_store::{
    Conversation, Datasource, Message, Notebook, Organization, Project, StorageKey, Usage, User,
};
use serde_json::Value;

const LABEL_MAX: usize = 60;

/// One-line description of an entity: id, slug and a label.
pub trait Summary {
    fn id(&self) -> String;
    fn slug(&self) -> &str;
    fn label(&self) -> String;
}

impl Summary for Organization {
    fn id(&self) -> String {
        self.id.clone()
    }
    fn slug(&self) -> &str {
        &self.slug
    }
    fn label(&self) -> String {
        self.name.clone()
    }
}

impl Summary for Project {
    fn id(&self) -> String {
        self.id.clone()
    }
    fn slug(&self) -> &str {
        &self.slug
    }
    fn label(&self) -> String {
        format!("{} [{}]", self.name, self.status)
    }
}

impl Summary for Datasource {
    fn id(&self) -> String {
        self.id.clone()
    }
    fn slug(&self) -> &str {
        &self.slug
    }
    fn label(&self) -> String {
        format!("{} ({})", self.name, self.provider)
    }
}

impl Summary for Conversation {
    fn id(&self) -> String {
        self.id.clone()
    }
    fn slug(&self) -> &str {
        &self.slug
    }
    fn label(&self) -> String {
        self.title.clone()
    }
}

impl Summary for Message {
    fn id(&self) -> String {
        self.id.clone()
    }
    fn slug(&self) -> &str {
        "-"
    }
    fn label(&self) -> String {
        let role = serde_json::to_value(self.role)
            .ok()
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_default();
        format!("{}: {}", role, content_text(&self.content))
    }
}

impl Summary for Notebook {
    fn id(&self) -> String {
        self.id.clone()
    }
    fn slug(&self) -> &str {
        &self.slug
    }
    fn label(&self) -> String {
        format!("{} (v{})", self.title, self.version)
    }
}

impl Summary for Usage {
    fn id(&self) -> String {
        self.id.to_string()
    }
    fn slug(&self) -> &str {
        "-"
    }
    fn label(&self) -> String {
        format!(
            "{} {} tokens at {}",
            self.model,
            self.total_tokens,
            self.timestamp.to_rfc3339()
        )
    }
}

impl Summary for User {
    fn id(&self) -> String {
        self.id.clone()
    }
    fn slug(&self) -> &str {
        &self.username
    }
    fn label(&self) -> String {
        self.username.clone()
    }
}

/// Text of a message body: a bare string, a `text` field, or compact JSON.
fn content_text(content: &Value) -> String {
    let text = match content {
        Value::String(text) => text.clone(),
        Value::Object(map) => match map.get("text").and_then(Value::as_str) {
            Some(text) => text.to_string(),
            None => content.to_string(),
        },
        other => other.to_string(),
    };
    truncate(&text, LABEL_MAX)
}

fn truncate(value: &str, max: usize) -> String {
    let single_line = value.replace('\n', " ");
    if single_line.chars().count() <= max {
        return single_line;
    }
    let mut out: String = single_line.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

pub fn print_keys(keys: &[StorageKey], quiet: bool) {
    for key in keys {
        println!("{}", key);
    }
    if !quiet && keys.is_empty() {
        eprintln!("No documents found.");
    }
}

pub fn print_summaries<T: Summary>(items: &[T], quiet: bool) {
    for item in items {
        println!(
            "{}\t{}\t{}",
            item.id(),
            item.slug(),
            truncate(&item.label(), LABEL_MAX)
        );
    }
    if !quiet && items.is_empty() {
        eprintln!("No entities found.");
    }
}
