//! Line types delivered to the chat channel.

/// Which part of the relay produced a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Producer {
    /// `/push_buildbot` webhook.
    Buildbot,
    /// `/push_commit` webhook.
    Commit,
    /// Title lookup of a link posted in the channel.
    LinkInfo,
    /// `>name` documentation reference posted in the channel.
    DocReference,
}

impl std::fmt::Display for Producer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Producer::Buildbot => write!(f, "buildbot"),
            Producer::Commit => write!(f, "commit"),
            Producer::LinkInfo => write!(f, "link-info"),
            Producer::DocReference => write!(f, "doc-reference"),
        }
    }
}

/// An immutable line of text scheduled for delivery to the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    producer: Producer,
    text: String,
}

impl ChatLine {
    pub fn new(producer: Producer, text: impl Into<String>) -> Self {
        Self {
            producer,
            text: text.into(),
        }
    }

    /// `[Link info] {title}`
    pub fn link_info(title: &str) -> Self {
        Self::new(Producer::LinkInfo, format!("[Link info] {title}"))
    }

    /// `[Documentation reference] {url}`
    pub fn doc_reference(url: &str) -> Self {
        Self::new(
            Producer::DocReference,
            format!("[Documentation reference] {url}"),
        )
    }

    /// Split a commit announcement body on `\n`. A trailing newline yields a
    /// trailing empty line, which is kept.
    pub fn commit_lines(body: &str) -> Vec<Self> {
        body.split('\n')
            .map(|line| Self::new(Producer::Commit, line))
            .collect()
    }

    pub fn producer(&self) -> Producer {
        self.producer
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl std::fmt::Display for ChatLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}
