use serde::{Deserialize, Serialize};
use std::fmt;

use super::adventure::SchemaError;

/// Newtype wrapper for passage IDs.
///
/// Id `0` never names a real passage: it is the "reset to introduction"
/// sentinel used by choices and routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PassageId(pub u32);

impl PassageId {
    /// The reserved "back to the introduction" id.
    pub const RESET: PassageId = PassageId(0);

    pub fn is_reset(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for PassageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A labeled edge from one passage to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    pub goto: PassageId,
}

/// The two kinds of inventory mutation a passage can author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    AddItem,
    RemoveItem,
}

impl EffectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddItem => "add_item",
            Self::RemoveItem => "remove_item",
        }
    }

    /// Parse the wire name of an effect kind. Unknown names yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "add_item" => Some(Self::AddItem),
            "remove_item" => Some(Self::RemoveItem),
            _ => None,
        }
    }
}

/// An inventory mutation applied when the player arrives at a passage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Effect {
    #[serde(rename = "type")]
    pub kind: EffectKind,
    pub item: String,
}

impl Effect {
    pub fn add(item: &str) -> Self {
        Self {
            kind: EffectKind::AddItem,
            item: item.to_string(),
        }
    }

    pub fn remove(item: &str) -> Self {
        Self {
            kind: EffectKind::RemoveItem,
            item: item.to_string(),
        }
    }
}

/// How an ending passage resolves the story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndingType {
    Victory,
    Defeat,
    Neutral,
}

impl EndingType {
    pub const ALL: [EndingType; 3] = [Self::Victory, Self::Defeat, Self::Neutral];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Victory => "victory",
            Self::Defeat => "defeat",
            Self::Neutral => "neutral",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s)
    }
}

/// A passage the player can leave through one of its choices.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegularPassage {
    pub paragraphs: Vec<String>,
    pub notes: Option<String>,
    pub choices: Vec<Choice>,
    pub effects: Vec<Effect>,
}

/// A terminal passage. Endings never carry choices or effects.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EndingPassage {
    pub paragraphs: Vec<String>,
    pub notes: Option<String>,
    pub ending_type: Option<EndingType>,
}

/// One node of the adventure graph.
///
/// On the wire an ending is flagged with `ending: true`; the conversion
/// from [`RawPassage`] is the single place that shape is checked, so an
/// ending with choices cannot be constructed from a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPassage", into = "PersistedPassage")]
pub enum Passage {
    Regular(RegularPassage),
    Ending(EndingPassage),
}

impl Passage {
    pub fn paragraphs(&self) -> &[String] {
        match self {
            Self::Regular(p) => &p.paragraphs,
            Self::Ending(p) => &p.paragraphs,
        }
    }

    pub fn notes(&self) -> Option<&str> {
        match self {
            Self::Regular(p) => p.notes.as_deref(),
            Self::Ending(p) => p.notes.as_deref(),
        }
    }

    pub fn is_ending(&self) -> bool {
        matches!(self, Self::Ending(_))
    }

    /// Choices of a regular passage; empty for endings.
    pub fn choices(&self) -> &[Choice] {
        match self {
            Self::Regular(p) => &p.choices,
            Self::Ending(_) => &[],
        }
    }

    /// Effects of a regular passage; empty for endings.
    pub fn effects(&self) -> &[Effect] {
        match self {
            Self::Regular(p) => &p.effects,
            Self::Ending(_) => &[],
        }
    }

    pub fn ending_type(&self) -> Option<EndingType> {
        match self {
            Self::Regular(_) => None,
            Self::Ending(p) => p.ending_type,
        }
    }
}

/// Persisted shape of a passage as read from a document. Every field but
/// `paragraphs` may be absent.
#[derive(Debug, Clone, Deserialize)]
struct RawPassage {
    paragraphs: Vec<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    effects: Vec<Effect>,
    #[serde(default)]
    ending: bool,
    #[serde(default, rename = "type")]
    ending_type: Option<EndingType>,
}

/// Persisted shape of a passage as written: endings carry `ending: true`
/// and no choices, regular passages omit empty effects.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum PersistedPassage {
    Regular {
        paragraphs: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
        choices: Vec<Choice>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        effects: Vec<Effect>,
    },
    Ending {
        paragraphs: Vec<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
        ending: bool,
        #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
        ending_type: Option<EndingType>,
    },
}

impl TryFrom<RawPassage> for Passage {
    type Error = SchemaError;

    fn try_from(raw: RawPassage) -> Result<Self, Self::Error> {
        if let Some(index) = raw.paragraphs.iter().position(|p| p.is_empty()) {
            return Err(SchemaError::EmptyParagraph(index));
        }

        if raw.ending {
            if !raw.choices.is_empty() || !raw.effects.is_empty() {
                return Err(SchemaError::EndingWithChoices);
            }
            Ok(Passage::Ending(EndingPassage {
                paragraphs: raw.paragraphs,
                notes: raw.notes,
                ending_type: raw.ending_type,
            }))
        } else {
            if raw.ending_type.is_some() {
                return Err(SchemaError::EndingTypeOnRegular);
            }
            Ok(Passage::Regular(RegularPassage {
                paragraphs: raw.paragraphs,
                notes: raw.notes,
                choices: raw.choices,
                effects: raw.effects,
            }))
        }
    }
}

impl From<Passage> for PersistedPassage {
    fn from(passage: Passage) -> Self {
        match passage {
            Passage::Regular(p) => PersistedPassage::Regular {
                paragraphs: p.paragraphs,
                notes: p.notes,
                choices: p.choices,
                effects: p.effects,
            },
            Passage::Ending(p) => PersistedPassage::Ending {
                paragraphs: p.paragraphs,
                notes: p.notes,
                ending: true,
                ending_type: p.ending_type,
            },
        }
    }
}
