//! Whole-adventure checks that the per-passage editor cannot make, such as
//! dangling choice targets and unreachable passages.

use rustc_hash::FxHashSet;
use std::collections::VecDeque;

use crate::schema::adventure::Adventure;
use crate::schema::passage::{EffectKind, Passage, PassageId};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LintReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl LintReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// Passage ids reachable from the first passage by following choices.
pub fn reachable_passages(adventure: &Adventure) -> FxHashSet<PassageId> {
    let mut seen = FxHashSet::default();
    let mut queue: VecDeque<PassageId> = adventure.first_passage_id().into_iter().collect();

    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        if let Some(passage) = adventure.passage(id) {
            for choice in passage.choices() {
                if !choice.goto.is_reset() && !seen.contains(&choice.goto) {
                    queue.push_back(choice.goto);
                }
            }
        }
    }
    seen
}

pub fn lint_adventure(adventure: &Adventure) -> LintReport {
    let mut report = LintReport::default();

    if adventure.passages.is_empty() {
        report
            .errors
            .push("Adventure has no passages after the introduction".to_string());
        return report;
    }

    let known_items: FxHashSet<&str> = adventure.items.iter().map(|i| i.id.as_str()).collect();
    let added_items: FxHashSet<&str> = adventure
        .passages
        .values()
        .flat_map(|p| p.effects())
        .filter(|e| e.kind == EffectKind::AddItem)
        .map(|e| e.item.as_str())
        .collect();

    for (id, passage) in &adventure.passages {
        match passage {
            Passage::Regular(p) => {
                if p.choices.is_empty() {
                    report
                        .errors
                        .push(format!("Passage {} has no choices and is not an ending", id));
                }
                for choice in &p.choices {
                    if !choice.goto.is_reset() && adventure.passage(choice.goto).is_none() {
                        report.errors.push(format!(
                            "Passage {} choice '{}' leads to missing passage {}",
                            id, choice.text, choice.goto
                        ));
                    }
                }
                for effect in &p.effects {
                    if !known_items.contains(effect.item.as_str()) {
                        report.warnings.push(format!(
                            "Passage {} {} unknown item '{}'",
                            id,
                            effect.kind.as_str(),
                            effect.item
                        ));
                    }
                    if effect.kind == EffectKind::RemoveItem
                        && !added_items.contains(effect.item.as_str())
                    {
                        report.warnings.push(format!(
                            "Passage {} removes '{}' which no passage adds",
                            id, effect.item
                        ));
                    }
                }
            }
            Passage::Ending(p) => {
                if p.ending_type.is_none() {
                    report
                        .warnings
                        .push(format!("Ending passage {} has no ending type", id));
                }
            }
        }
    }

    let reachable = reachable_passages(adventure);
    for id in adventure.passages.keys() {
        if !reachable.contains(id) {
            report
                .warnings
                .push(format!("Passage {} is unreachable from the introduction", id));
        }
    }

    report
}
