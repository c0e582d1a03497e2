//! Authoring rules a draft must satisfy before it can be persisted.
//!
//! The ending-type requirement and the group-level effects check are
//! injectable rules so an application can decide how strict to be.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::editor::{ChoiceDraft, DraftErrors, EffectDraft, PassageDraft};
use crate::schema::adventure::SchemaError;
use crate::schema::passage::{Effect, EndingType};

pub const TEXT_REQUIRED: &str = "Passage text is required";
pub const NO_CHOICES: &str = "Regular passages must have at least one choice";
pub const CHOICE_TEXT_REQUIRED: &str = "Choice text is required";
pub const CHOICE_TARGET_REQUIRED: &str = "Choose a target passage";
pub const EFFECT_INCOMPLETE: &str = "Effect type and item are required";
pub const ENDING_TYPE_REQUIRED: &str = "Ending type is required";
pub const DUPLICATE_EFFECTS: &str = "Duplicate effects are not allowed";

/// Decides whether an ending type value is acceptable.
///
/// Names outside [`EndingType`] are rejected before the rule is consulted,
/// so a rule can only tighten what is accepted.
pub trait EndingTypeRule: Send + Sync {
    /// Returns an error message for a rejected value.
    fn check(&self, ending_type: &str) -> Option<String>;
}

/// Decides whether a set of well-formed effects is acceptable as a group.
pub trait EffectsRule: Send + Sync {
    fn check(&self, effects: &[Effect]) -> Option<String>;
}

impl<F> EndingTypeRule for F
where
    F: Fn(&str) -> Option<String> + Send + Sync,
{
    fn check(&self, ending_type: &str) -> Option<String> {
        self(ending_type)
    }
}

impl<F> EffectsRule for F
where
    F: Fn(&[Effect]) -> Option<String> + Send + Sync,
{
    fn check(&self, effects: &[Effect]) -> Option<String> {
        self(effects)
    }
}

fn unknown_ending_type(ending_type: &str) -> Option<String> {
    if EndingType::parse(ending_type).is_none() {
        Some(format!("Unknown ending type '{}'", ending_type))
    } else {
        None
    }
}

/// Every ending must name its type.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireEndingType;

impl EndingTypeRule for RequireEndingType {
    fn check(&self, ending_type: &str) -> Option<String> {
        if ending_type.is_empty() {
            return Some(ENDING_TYPE_REQUIRED.to_string());
        }
        unknown_ending_type(ending_type)
    }
}

/// An ending may leave its type blank, but a non-blank type must be known.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionalEndingType;

impl EndingTypeRule for OptionalEndingType {
    fn check(&self, ending_type: &str) -> Option<String> {
        if ending_type.is_empty() {
            None
        } else {
            unknown_ending_type(ending_type)
        }
    }
}

/// Rejects the same `(type, item)` pair appearing twice.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectDuplicateEffects;

impl EffectsRule for RejectDuplicateEffects {
    fn check(&self, effects: &[Effect]) -> Option<String> {
        let mut seen = FxHashSet::default();
        for effect in effects {
            if !seen.insert((effect.kind, effect.item.as_str())) {
                return Some(DUPLICATE_EFFECTS.to_string());
            }
        }
        None
    }
}

/// Accepts any list of well-formed effects.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAnyEffects;

impl EffectsRule for AllowAnyEffects {
    fn check(&self, _effects: &[Effect]) -> Option<String> {
        None
    }
}

/// Serializable switchboard for the built-in rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub require_ending_type: bool,
    #[serde(default = "default_true")]
    pub reject_duplicate_effects: bool,
}

fn default_true() -> bool {
    true
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            require_ending_type: false,
            reject_duplicate_effects: true,
        }
    }
}

/// The rules applied by the save controller.
pub struct ValidationPolicy {
    ending_type: Box<dyn EndingTypeRule>,
    effects: Box<dyn EffectsRule>,
}

/// Builder for constructing a `ValidationPolicy`.
pub struct ValidationPolicyBuilder {
    ending_type: Option<Box<dyn EndingTypeRule>>,
    effects: Option<Box<dyn EffectsRule>>,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self::from_config(&PolicyConfig::default())
    }
}

impl std::fmt::Debug for ValidationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationPolicy").finish_non_exhaustive()
    }
}

impl ValidationPolicy {
    pub fn builder() -> ValidationPolicyBuilder {
        ValidationPolicyBuilder {
            ending_type: None,
            effects: None,
        }
    }

    pub fn from_config(config: &PolicyConfig) -> Self {
        let builder = Self::builder();
        let builder = if config.require_ending_type {
            builder.ending_type_rule(RequireEndingType)
        } else {
            builder.ending_type_rule(OptionalEndingType)
        };
        let builder = if config.reject_duplicate_effects {
            builder.effects_rule(RejectDuplicateEffects)
        } else {
            builder.effects_rule(AllowAnyEffects)
        };
        builder.build()
    }

    /// Load a policy from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<ValidationPolicy, SchemaError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a policy from a RON string holding a [`PolicyConfig`].
    pub fn parse_ron(input: &str) -> Result<ValidationPolicy, SchemaError> {
        let config: PolicyConfig = ron::from_str(input)?;
        Ok(Self::from_config(&config))
    }

    /// Run every check against `draft` and collect the results.
    ///
    /// Checks never stop early: a text error and a choices error are
    /// reported in the same pass.
    pub fn validate(&self, draft: &PassageDraft) -> DraftReport {
        let mut errors = DraftErrors::default();
        let mut choices = draft.choices.clone();
        let mut effects = draft.effects.clone();
        let mut well_formed = Vec::new();

        if draft.text.trim().is_empty() {
            errors.text = Some(TEXT_REQUIRED.to_string());
        }

        if draft.is_ending {
            errors.ending_type = if draft.ending_type.is_empty() {
                self.ending_type.check("")
            } else {
                unknown_ending_type(&draft.ending_type)
                    .or_else(|| self.ending_type.check(&draft.ending_type))
            };
        } else {
            if choices.is_empty() {
                errors.choices = Some(NO_CHOICES.to_string());
            }
            for choice in &mut choices {
                annotate_choice(choice);
            }
            for effect in &mut effects {
                match effect.to_effect() {
                    Some(valid) => {
                        effect.error = None;
                        well_formed.push(valid);
                    }
                    None => effect.error = Some(EFFECT_INCOMPLETE.to_string()),
                }
            }
            errors.effects = self.effects.check(&well_formed);
        }

        DraftReport {
            choices,
            effects,
            errors,
            well_formed_effects: well_formed,
        }
    }
}

fn annotate_choice(choice: &mut ChoiceDraft) {
    choice.text_error = if choice.text.trim().is_empty() {
        Some(CHOICE_TEXT_REQUIRED.to_string())
    } else {
        None
    };
    choice.goto_error = if choice.goto.is_none() {
        Some(CHOICE_TARGET_REQUIRED.to_string())
    } else {
        None
    };
}

impl ValidationPolicyBuilder {
    pub fn ending_type_rule<R: EndingTypeRule + 'static>(mut self, rule: R) -> Self {
        self.ending_type = Some(Box::new(rule));
        self
    }

    pub fn effects_rule<R: EffectsRule + 'static>(mut self, rule: R) -> Self {
        self.effects = Some(Box::new(rule));
        self
    }

    pub fn build(self) -> ValidationPolicy {
        ValidationPolicy {
            ending_type: self
                .ending_type
                .unwrap_or_else(|| Box::new(OptionalEndingType)),
            effects: self
                .effects
                .unwrap_or_else(|| Box::new(RejectDuplicateEffects)),
        }
    }
}

/// Outcome of one validation pass over a draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftReport {
    /// Choice rows with per-field errors attached.
    pub choices: Vec<ChoiceDraft>,
    /// Effect rows with per-row errors attached.
    pub effects: Vec<EffectDraft>,
    pub errors: DraftErrors,
    /// Effects with both fields filled in, in draft order.
    pub well_formed_effects: Vec<Effect>,
}

impl DraftReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
            && self
                .choices
                .iter()
                .all(|c| c.text_error.is_none() && c.goto_error.is_none())
            && self.effects.iter().all(|e| e.error.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::passage::{EffectKind, PassageId};

    fn draft(text: &str) -> PassageDraft {
        PassageDraft {
            text: text.to_string(),
            ..Default::default()
        }
    }

    fn choice(text: &str, goto: Option<u32>) -> ChoiceDraft {
        ChoiceDraft {
            text: text.to_string(),
            goto: goto.map(PassageId),
            ..Default::default()
        }
    }

    #[test]
    fn all_checks_accumulate() {
        let policy = ValidationPolicy::default();
        let report = policy.validate(&draft("   "));
        assert_eq!(report.errors.text.as_deref(), Some(TEXT_REQUIRED));
        assert_eq!(report.errors.choices.as_deref(), Some(NO_CHOICES));
        assert!(!report.is_valid());
    }

    #[test]
    fn choice_errors_can_co_occur() {
        let policy = ValidationPolicy::default();
        let mut d = draft("x");
        d.choices = vec![choice("", None), choice("Go", Some(2))];
        let report = policy.validate(&d);
        assert_eq!(report.choices[0].text_error.as_deref(), Some(CHOICE_TEXT_REQUIRED));
        assert_eq!(report.choices[0].goto_error.as_deref(), Some(CHOICE_TARGET_REQUIRED));
        assert!(report.choices[1].text_error.is_none());
        assert!(report.errors.choices.is_none());
        assert!(!report.is_valid());
    }

    #[test]
    fn malformed_effects_are_excluded_from_group_check() {
        let policy = ValidationPolicy::default();
        let mut d = draft("x");
        d.choices = vec![choice("Go", Some(2))];
        d.effects = vec![
            EffectDraft {
                kind: Some(EffectKind::AddItem),
                item: "key".to_string(),
                error: None,
            },
            EffectDraft::default(),
        ];
        let report = policy.validate(&d);
        assert!(report.effects[0].error.is_none());
        assert_eq!(report.effects[1].error.as_deref(), Some(EFFECT_INCOMPLETE));
        assert_eq!(report.well_formed_effects, vec![Effect::add("key")]);
        assert!(report.errors.effects.is_none());
    }

    #[test]
    fn duplicate_effects_rejected_by_default() {
        let policy = ValidationPolicy::default();
        let mut d = draft("x");
        d.choices = vec![choice("Go", Some(2))];
        let row = EffectDraft {
            kind: Some(EffectKind::AddItem),
            item: "key".to_string(),
            error: None,
        };
        d.effects = vec![row.clone(), row];
        let report = policy.validate(&d);
        assert_eq!(report.errors.effects.as_deref(), Some(DUPLICATE_EFFECTS));
    }

    #[test]
    fn add_and_remove_of_same_item_are_not_duplicates() {
        let effects = [Effect::add("key"), Effect::remove("key")];
        assert!(RejectDuplicateEffects.check(&effects).is_none());
    }

    #[test]
    fn ending_type_rules() {
        assert_eq!(
            RequireEndingType.check("").as_deref(),
            Some(ENDING_TYPE_REQUIRED)
        );
        assert!(RequireEndingType.check("victory").is_none());
        assert!(OptionalEndingType.check("").is_none());
        assert!(OptionalEndingType.check("triumph").is_some());
        assert!(RequireEndingType.check("triumph").is_some());
    }

    #[test]
    fn ending_draft_skips_choice_checks() {
        let policy = ValidationPolicy::builder()
            .ending_type_rule(RequireEndingType)
            .build();
        let mut d = draft("The end");
        d.is_ending = true;
        let report = policy.validate(&d);
        assert!(report.errors.choices.is_none());
        assert_eq!(report.errors.ending_type.as_deref(), Some(ENDING_TYPE_REQUIRED));
    }

    #[test]
    fn closure_rules_can_be_injected() {
        let policy = ValidationPolicy::builder()
            .effects_rule(|effects: &[Effect]| {
                (effects.len() > 1).then(|| "One effect per passage".to_string())
            })
            .build();
        let mut d = draft("x");
        d.choices = vec![choice("Go", Some(2))];
        d.effects = vec![
            EffectDraft {
                kind: Some(EffectKind::AddItem),
                item: "a".to_string(),
                error: None,
            },
            EffectDraft {
                kind: Some(EffectKind::AddItem),
                item: "b".to_string(),
                error: None,
            },
        ];
        let report = policy.validate(&d);
        assert_eq!(report.errors.effects.as_deref(), Some("One effect per passage"));
    }

    #[test]
    fn policy_from_ron() {
        let policy = ValidationPolicy::parse_ron("(require_ending_type: true)").unwrap();
        let mut d = draft("x");
        d.is_ending = true;
        assert!(policy.validate(&d).errors.ending_type.is_some());
    }

    #[test]
    fn policy_config_defaults() {
        let config: PolicyConfig = ron::from_str("(require_ending_type: false)").unwrap();
        assert_eq!(config, PolicyConfig::default());
        assert!(config.reject_duplicate_effects);
        assert!(!config.require_ending_type);
    }

    #[test]
    fn permissive_rule_still_rejects_unknown_ending_names() {
        let policy = ValidationPolicy::builder()
            .ending_type_rule(|_: &str| None)
            .build();
        let mut d = draft("End");
        d.is_ending = true;
        d.ending_type = "triumph".to_string();
        let report = policy.validate(&d);
        assert_eq!(
            report.errors.ending_type.as_deref(),
            Some("Unknown ending type 'triumph'")
        );
        assert!(!report.is_valid());

        d.ending_type = "victory".to_string();
        assert!(policy.validate(&d).is_valid());
        d.ending_type = String::new();
        assert!(policy.validate(&d).is_valid());
    }
}
