//! Effect merging: how per-row outcomes combine into one decision
//!
//! Evaluating the matcher against each policy row yields a stream of
//! [`Effect`] values. The model's `[policy_effect]` rule selects one of four
//! merge strategies, each of which also determines which rows explain the
//! final decision.

use serde::{Deserialize, Serialize};

/// Outcome of evaluating the matcher against a single policy row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// The row matched and grants access
    Allow,
    /// The row did not match, or carried an unrecognized effect value
    Indeterminate,
    /// The row matched and denies access
    Deny,
}

/// The decision-merging rule declared in `[policy_effect]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// `some(where (p.eft == allow))`: any allowing row wins
    AllowOverride,
    /// `!some(where (p.eft == deny))`: allowed unless some row denies
    DenyOverride,
    /// `some(where (p.eft == allow)) && !some(where (p.eft == deny))`:
    /// at least one allow and no deny
    AllowAndDeny,
    /// `priority(p.eft) || deny`: the first matching row decides
    Priority,
}

impl EffectKind {
    /// Parses a policy effect rule, ignoring whitespace differences
    ///
    /// Returns `None` for rules outside the supported catalogue.
    pub fn parse(raw: &str) -> Option<EffectKind> {
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        match compact.as_str() {
            "some(where(p.eft==allow))" => Some(EffectKind::AllowOverride),
            "!some(where(p.eft==deny))" => Some(EffectKind::DenyOverride),
            "some(where(p.eft==allow))&&!some(where(p.eft==deny))" => {
                Some(EffectKind::AllowAndDeny)
            }
            "priority(p.eft)||deny" => Some(EffectKind::Priority),
            _ => None,
        }
    }
}

impl std::fmt::Display for EffectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EffectKind::AllowOverride => "allow_override",
            EffectKind::DenyOverride => "deny_override",
            EffectKind::AllowAndDeny => "allow_and_deny",
            EffectKind::Priority => "priority",
        };
        write!(f, "{}", s)
    }
}

/// Merges per-row effects into a final decision
///
/// Returns the decision plus the indices of the rows that explain it: the
/// rows that matched and carried the decisive effect. When the decision
/// falls back to a default (deny-override allowing, or nothing matched at
/// all), the explanation list is empty.
pub fn merge_effects(kind: EffectKind, effects: &[Effect]) -> (bool, Vec<usize>) {
    match kind {
        EffectKind::AllowOverride => {
            let allowed = indices_of(effects, Effect::Allow);
            (!allowed.is_empty(), allowed)
        }
        EffectKind::DenyOverride => {
            let denied = indices_of(effects, Effect::Deny);
            if denied.is_empty() {
                (true, Vec::new())
            } else {
                (false, denied)
            }
        }
        EffectKind::AllowAndDeny => {
            let denied = indices_of(effects, Effect::Deny);
            if !denied.is_empty() {
                return (false, denied);
            }
            let allowed = indices_of(effects, Effect::Allow);
            (!allowed.is_empty(), allowed)
        }
        EffectKind::Priority => {
            for (index, effect) in effects.iter().enumerate() {
                match effect {
                    Effect::Allow => return (true, vec![index]),
                    Effect::Deny => return (false, vec![index]),
                    Effect::Indeterminate => {}
                }
            }
            (false, Vec::new())
        }
    }
}

fn indices_of(effects: &[Effect], wanted: Effect) -> Vec<usize> {
    effects
        .iter()
        .enumerate()
        .filter(|(_, effect)| **effect == wanted)
        .map(|(index, _)| index)
        .collect()
}
