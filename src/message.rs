//! Chat message segments and change-set rendering.

use serde_json::{json, Value};

use crate::models::{ChangeEntry, ChangeSet, EndpointStatus};

pub const CHANGE_HEADER: &str = "Proxy status changed:";

/// One piece of a gateway message.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text { text: String },
    /// Local path or URL the gateway can load.
    Image { file: String },
}

impl Segment {
    pub fn text(text: impl Into<String>) -> Self {
        Segment::Text { text: text.into() }
    }

    pub fn image(file: impl Into<String>) -> Self {
        Segment::Image { file: file.into() }
    }

    pub fn render(&self) -> Value {
        match self {
            Segment::Text { text } => json!({ "type": "text", "data": { "text": text } }),
            Segment::Image { file } => json!({ "type": "image", "data": { "file": file } }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Message {
    segments: Vec<Segment>,
}

impl Message {
    pub fn new(segments: impl IntoIterator<Item = Segment>) -> Self {
        Self {
            segments: segments.into_iter().collect(),
        }
    }

    pub fn push(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn render(&self) -> Vec<Value> {
        self.segments.iter().map(Segment::render).collect()
    }

    /// Concatenated text segments; images are skipped.
    pub fn plain_text(&self) -> String {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Text { text } => Some(text.as_str()),
                Segment::Image { .. } => None,
            })
            .collect()
    }
}

fn render_line(entry: &ChangeEntry) -> String {
    let old = match &entry.previous_status {
        Some(status) => status.as_str(),
        None => "new",
    };
    let mut line = format!("{}: {} -> {}", entry.name, old, entry.current_status);

    if !entry.is_new {
        let since = match entry.current_status {
            EndpointStatus::Online => Some(("started", &entry.last_start)),
            EndpointStatus::Offline => Some(("closed", &entry.last_close)),
            EndpointStatus::Other(_) => None,
        };
        if let Some((label, at)) = since.filter(|(_, at)| !at.is_empty()) {
            line.push_str(&format!(" ({label} {at})"));
        }
    }
    line
}

/// Render a change-set as one text message, or `None` when there is nothing to say.
pub fn format_changes(changes: &ChangeSet) -> Option<Message> {
    if changes.is_empty() {
        return None;
    }

    let mut text = String::from(CHANGE_HEADER);
    for entry in changes {
        text.push('\n');
        text.push_str(&render_line(entry));
    }
    Some(Message::new([Segment::text(text)]))
}
