//! Model definition: the access-control grammar parsed from INI text
//!
//! A model declares the shape of requests and policy rows, optional role
//! inheritance, the effect-merging rule, and the matcher expression that
//! ties them together. Five sections are recognized:
//!
//! ```text
//! [request_definition]   r  = sub, obj, act
//! [policy_definition]    p  = sub, obj, act
//! [role_definition]      g  = _, _
//! [policy_effect]        e  = some(where (p.eft == allow))
//! [matchers]             m  = g(r.sub, p.sub) && r.obj == p.obj && r.act == p.act
//! ```
//!
//! Numbered variants (`r2`, `p2`, `g2`, ...) declare additional definitions
//! of the same kind. Parsing is strict: every line must be a comment, a
//! section header, or a `key = value` pair with a key that belongs to its
//! section, and matcher expressions are compiled up front so a bad model
//! never reaches enforcement.

use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::domain::effect::EffectKind;
use crate::domain::events::ModelEvent;
use crate::errors::ConfigurationError;
use crate::matcher::parser::{parse, Expr};

const SECTION_REQUEST: &str = "request_definition";
const SECTION_POLICY: &str = "policy_definition";
const SECTION_ROLE: &str = "role_definition";
const SECTION_EFFECT: &str = "policy_effect";
const SECTION_MATCHERS: &str = "matchers";

/// Sections that must be present in every model
const REQUIRED_SECTIONS: [&str; 4] = [
    SECTION_REQUEST,
    SECTION_POLICY,
    SECTION_EFFECT,
    SECTION_MATCHERS,
];

/// Reports whether `key` is valid inside `section`: the section's base
/// letter, optionally followed by digits (`r`, `r2`, `g3`, ...)
fn key_in_section(section: &str, key: &str) -> bool {
    let prefix = match section {
        SECTION_REQUEST => 'r',
        SECTION_POLICY => 'p',
        SECTION_ROLE => 'g',
        SECTION_EFFECT => 'e',
        SECTION_MATCHERS => 'm',
        _ => return false,
    };
    let mut chars = key.chars();
    chars.next() == Some(prefix) && chars.as_str().chars().all(|c| c.is_ascii_digit())
}

fn is_identifier(token: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Splits a definition value into validated identifier tokens
fn parse_tokens(key: &str, value: &str) -> Result<Vec<String>, ConfigurationError> {
    let mut tokens = Vec::new();
    for raw in value.split(',') {
        let token = raw.trim();
        if !is_identifier(token) {
            return Err(ConfigurationError::InvalidToken {
                key: key.to_string(),
                token: token.to_string(),
            });
        }
        tokens.push(token.to_string());
    }
    Ok(tokens)
}

/// The declared shape of one policy type's rows
///
/// Tokens are the field names in row order. When a definition includes the
/// reserved `eft` token, rows carry their own allow/deny effect at that
/// position; otherwise every matching row allows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDefinition {
    tokens: Vec<String>,
    eft: Option<usize>,
}

impl PolicyDefinition {
    fn from_value(key: &str, value: &str) -> Result<Self, ConfigurationError> {
        let tokens = parse_tokens(key, value)?;
        let eft = tokens.iter().position(|token| token == "eft");
        Ok(Self { tokens, eft })
    }

    /// The field names in row order
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// The number of values every row of this type must carry
    pub fn arity(&self) -> usize {
        self.tokens.len()
    }

    /// The position of the `eft` token, when declared
    pub fn eft_index(&self) -> Option<usize> {
        self.eft
    }
}

/// A compiled matcher: the source text plus its parsed expression
///
/// The text is kept verbatim for diagnostics; enforcement decisions are
/// reported against the matcher exactly as the model wrote it.
#[derive(Debug, Clone)]
pub struct Matcher {
    text: String,
    expr: Expr,
}

impl Matcher {
    /// The matcher expression as written in the model
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The compiled expression tree
    pub fn expr(&self) -> &Expr {
        &self.expr
    }
}

/// A parsed and validated model
///
/// Construction succeeds only when every section parses, required sections
/// and keys are present, effect rules are in the supported catalogue, and
/// every matcher compiles. The raw section text is retained in definition
/// order for [`Model::snapshot`].
#[derive(Debug, Clone)]
pub struct Model {
    sections: IndexMap<String, IndexMap<String, String>>,
    requests: IndexMap<String, Vec<String>>,
    policies: IndexMap<String, PolicyDefinition>,
    roles: IndexMap<String, usize>,
    effects: IndexMap<String, EffectKind>,
    matchers: IndexMap<String, Matcher>,
}

impl Model {
    /// Reads and parses a model from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Model, ConfigurationError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigurationError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Model::from_text(&text)
    }

    /// Parses a model from INI text
    pub fn from_text(text: &str) -> Result<Model, ConfigurationError> {
        let mut sections: IndexMap<String, IndexMap<String, String>> = IndexMap::new();
        let mut current: Option<String> = None;

        for (index, raw_line) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(rest) = line.strip_prefix('[') {
                let Some(name) = rest.strip_suffix(']') else {
                    return Err(ConfigurationError::MalformedLine {
                        line: line_no,
                        text: line.to_string(),
                    });
                };
                let name = name.trim();
                if !key_in_section_table(name) {
                    return Err(ConfigurationError::UnknownSection {
                        line: line_no,
                        name: name.to_string(),
                    });
                }
                sections.entry(name.to_string()).or_default();
                current = Some(name.to_string());
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigurationError::MalformedLine {
                    line: line_no,
                    text: line.to_string(),
                });
            };
            let key = key.trim();
            let value = value.trim();
            let Some(section) = current.clone() else {
                return Err(ConfigurationError::OutsideSection {
                    line: line_no,
                    text: line.to_string(),
                });
            };
            if !key_in_section(&section, key) {
                return Err(ConfigurationError::InvalidKey {
                    line: line_no,
                    section,
                    key: key.to_string(),
                });
            }
            let entries = sections.entry(section.clone()).or_default();
            if entries.contains_key(key) {
                return Err(ConfigurationError::DuplicateKey {
                    line: line_no,
                    section,
                    key: key.to_string(),
                });
            }
            entries.insert(key.to_string(), value.to_string());
        }

        Model::build(sections)
    }

    fn build(
        sections: IndexMap<String, IndexMap<String, String>>,
    ) -> Result<Model, ConfigurationError> {
        for name in REQUIRED_SECTIONS {
            if !sections.contains_key(name) {
                return Err(ConfigurationError::MissingSection {
                    name: name.to_string(),
                });
            }
        }
        for (section, base) in [
            (SECTION_REQUEST, "r"),
            (SECTION_POLICY, "p"),
            (SECTION_EFFECT, "e"),
            (SECTION_MATCHERS, "m"),
        ] {
            if !sections[section].contains_key(base) {
                return Err(ConfigurationError::MissingKey {
                    section: section.to_string(),
                    key: base.to_string(),
                });
            }
        }

        let mut requests = IndexMap::new();
        for (key, value) in &sections[SECTION_REQUEST] {
            requests.insert(key.clone(), parse_tokens(key, value)?);
        }

        let mut policies = IndexMap::new();
        for (key, value) in &sections[SECTION_POLICY] {
            policies.insert(key.clone(), PolicyDefinition::from_value(key, value)?);
        }

        let mut roles = IndexMap::new();
        if let Some(entries) = sections.get(SECTION_ROLE) {
            for (key, value) in entries {
                let placeholders: Vec<&str> = value.split(',').map(str::trim).collect();
                let arity = placeholders.len();
                let well_formed =
                    (2..=3).contains(&arity) && placeholders.iter().all(|p| *p == "_");
                if !well_formed {
                    return Err(ConfigurationError::InvalidRoleDefinition {
                        key: key.clone(),
                        value: value.clone(),
                    });
                }
                roles.insert(key.clone(), arity);
            }
        }

        let mut effects = IndexMap::new();
        for (key, value) in &sections[SECTION_EFFECT] {
            let kind =
                EffectKind::parse(value).ok_or_else(|| ConfigurationError::UnsupportedEffect {
                    rule: value.clone(),
                })?;
            effects.insert(key.clone(), kind);
        }

        let mut matchers = IndexMap::new();
        for (key, value) in &sections[SECTION_MATCHERS] {
            let expr = parse(value).map_err(|e| ConfigurationError::InvalidMatcher {
                key: key.clone(),
                reason: e.to_string(),
            })?;
            matchers.insert(
                key.clone(),
                Matcher {
                    text: value.clone(),
                    expr,
                },
            );
        }

        Ok(Model {
            sections,
            requests,
            policies,
            roles,
            effects,
            matchers,
        })
    }

    /// The request attribute names declared under `key` (`"r"`, `"r2"`, ...)
    pub fn request_tokens(&self, key: &str) -> Option<&[String]> {
        self.requests.get(key).map(Vec::as_slice)
    }

    /// The policy definition declared under `key` (`"p"`, `"p2"`, ...)
    pub fn policy_definition(&self, key: &str) -> Option<&PolicyDefinition> {
        self.policies.get(key)
    }

    /// All policy definition keys, in declaration order
    pub fn policy_types(&self) -> impl Iterator<Item = &str> {
        self.policies.keys().map(String::as_str)
    }

    /// All role definition keys, in declaration order
    pub fn role_types(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }

    /// The placeholder count of the role definition under `key`: 2, or 3
    /// when links are domain-scoped
    pub fn role_arity(&self, key: &str) -> Option<usize> {
        self.roles.get(key).copied()
    }

    /// The effect-merging rule declared under `key` (`"e"`, `"e2"`, ...)
    pub fn effect(&self, key: &str) -> Option<EffectKind> {
        self.effects.get(key).copied()
    }

    /// The compiled matcher declared under `key` (`"m"`, `"m2"`, ...)
    pub fn matcher(&self, key: &str) -> Option<&Matcher> {
        self.matchers.get(key)
    }

    /// The value count rows of `ptype` must carry, whether `ptype` is a
    /// policy or a role definition
    pub fn rule_arity(&self, ptype: &str) -> Option<usize> {
        if let Some(def) = self.policies.get(ptype) {
            return Some(def.arity());
        }
        self.roles.get(ptype).copied()
    }

    /// Captures the raw sections, in definition order, for diagnostics
    pub fn snapshot(&self) -> ModelEvent {
        ModelEvent::new(self.sections.clone())
    }
}

fn key_in_section_table(name: &str) -> bool {
    matches!(
        name,
        SECTION_REQUEST | SECTION_POLICY | SECTION_ROLE | SECTION_EFFECT | SECTION_MATCHERS
    )
}

impl FromStr for Model {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Model::from_text(s)
    }
}
