use chrono::{DateTime, Utc};

/// A harvested topic candidate. Created and consumed within one harvesting
/// pass; never persisted directly.
#[derive(Debug, Clone)]
pub struct RawTopic {
    pub title: String,
    /// Source link the topic was harvested from.
    pub link: String,
    /// Publish marker as reported by the source. Free-form, may be empty.
    pub published: String,
    /// Category label of the source that produced this topic.
    pub category: String,
    /// SHA-256 of `link + "|" + title` — the exact-duplicate identity key.
    pub fingerprint: String,
}

/// Downstream production category for a committed content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Debate-bait angle: provocative takes meant to draw argument.
    Controversy,
    /// Informative angle: context and explanation.
    Explainer,
}

impl ContentKind {
    /// Wire tag sent to the production service.
    pub fn tag(&self) -> &'static str {
        match self {
            ContentKind::Controversy => "controversy",
            ContentKind::Explainer => "explainer",
        }
    }

    /// Derive the kind from a script's editorial angle. Anything that is not
    /// explicitly controversy-angled is produced as an explainer.
    pub fn from_angle(angle: &str) -> Self {
        if angle.to_lowercase().contains("controversy") {
            ContentKind::Controversy
        } else {
            ContentKind::Explainer
        }
    }
}

/// A new content item headed for the store. The `fingerprint` column's
/// uniqueness constraint makes the store the final authority on duplicates.
#[derive(Debug, Clone)]
pub struct NewContentItem {
    pub persona_id: String,
    pub author_name: String,
    pub category: String,
    pub title: String,
    pub body: String,
    /// Short-video script JSON attached at generation time.
    pub script: Option<String>,
    pub fingerprint: String,
    pub source_url: String,
}

/// A persisted content item as read back for similarity comparison.
#[derive(Debug, Clone)]
pub struct ContentItem {
    pub id: i64,
    pub persona_id: String,
    pub category: String,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A member of the persona pool.
#[derive(Debug, Clone)]
pub struct Persona {
    pub id: String,
    pub name: String,
    /// Role/job label shown alongside the name.
    pub role: String,
    /// Generation instruction defining this persona's voice.
    pub voice_prompt: String,
    pub avatar_url: Option<String>,
}

/// A generated reaction to a content item.
#[derive(Debug, Clone)]
pub struct NewReply {
    pub item_id: i64,
    pub persona_id: String,
    pub author_name: String,
    pub body: String,
    /// Archetype assignment order, 1..=5.
    pub position: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_derived_from_angle() {
        assert_eq!(ContentKind::from_angle("controversy"), ContentKind::Controversy);
        assert_eq!(ContentKind::from_angle("Controversy bait"), ContentKind::Controversy);
        assert_eq!(ContentKind::from_angle("explainer"), ContentKind::Explainer);
        assert_eq!(ContentKind::from_angle(""), ContentKind::Explainer);
    }
}
