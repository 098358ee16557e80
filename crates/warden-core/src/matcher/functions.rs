//! Built-in matching functions and the per-enforcer function registry
//!
//! Matchers call these by name: `keyMatch(r.obj, p.obj)`. The registry
//! starts with the built-in catalogue; applications can register their own
//! functions under additional names. Invalid patterns are reported as
//! evaluation faults rather than silently failing to match.

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::EvaluationError;

/// A named matching function callable from matcher expressions
///
/// Arguments arrive as evaluated strings; the result is the match outcome.
pub type MatcherFn = Arc<dyn Fn(&[String]) -> Result<bool, EvaluationError> + Send + Sync>;

/// Registry of matching functions available to one enforcer
#[derive(Clone)]
pub struct FunctionMap {
    map: HashMap<String, MatcherFn>,
}

impl FunctionMap {
    /// Creates a registry preloaded with the built-in matchers
    ///
    /// Built-ins: `keyMatch`, `keyMatch2`, `regexMatch`, `globMatch`.
    pub fn with_builtins() -> Self {
        let mut map: HashMap<String, MatcherFn> = HashMap::new();
        map.insert(
            "keyMatch".to_string(),
            binary("keyMatch", |a, b| Ok(key_match(a, b))),
        );
        map.insert("keyMatch2".to_string(), binary("keyMatch2", key_match2));
        map.insert("regexMatch".to_string(), binary("regexMatch", regex_match));
        map.insert("globMatch".to_string(), binary("globMatch", glob_match));
        Self { map }
    }

    /// Registers a function under `name`, replacing any existing entry
    pub fn register(&mut self, name: impl Into<String>, function: MatcherFn) {
        self.map.insert(name.into(), function);
    }

    /// Looks up a function by name
    pub fn get(&self, name: &str) -> Option<&MatcherFn> {
        self.map.get(name)
    }
}

impl std::fmt::Debug for FunctionMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.map.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("FunctionMap").field("names", &names).finish()
    }
}

/// Wraps a two-argument matcher with an arity check
fn binary<F>(name: &'static str, f: F) -> MatcherFn
where
    F: Fn(&str, &str) -> Result<bool, EvaluationError> + Send + Sync + 'static,
{
    Arc::new(move |args: &[String]| {
        if args.len() != 2 {
            return Err(EvaluationError::FunctionArity {
                name: name.to_string(),
                expected: 2,
                actual: args.len(),
            });
        }
        f(&args[0], &args[1])
    })
}

/// Wildcard key matching: `*` in the pattern matches any suffix
///
/// `keyMatch("/foo/bar", "/foo/*")` is true; without a `*` the keys must
/// be equal.
pub fn key_match(key: &str, pattern: &str) -> bool {
    match pattern.find('*') {
        None => key == pattern,
        Some(i) => {
            if key.len() > i {
                key.as_bytes()[..i] == pattern.as_bytes()[..i]
            } else {
                key.as_bytes() == &pattern.as_bytes()[..i]
            }
        }
    }
}

/// URL-style key matching with `:param` placeholders
///
/// `keyMatch2("/resource1", "/:resource")` is true; a placeholder matches
/// exactly one path segment.
pub fn key_match2(key: &str, pattern: &str) -> Result<bool, EvaluationError> {
    let expanded = pattern.replace("/*", "/.*");
    let params = regex::Regex::new(r":[^/]+").map_err(|e| EvaluationError::Function {
        name: "keyMatch2".to_string(),
        reason: e.to_string(),
    })?;
    let expanded = params.replace_all(&expanded, "[^/]+");
    regex_match_named("keyMatch2", key, &format!("^{}$", expanded))
}

/// Regular-expression matching; the pattern is unanchored
pub fn regex_match(value: &str, pattern: &str) -> Result<bool, EvaluationError> {
    regex_match_named("regexMatch", value, pattern)
}

fn regex_match_named(
    name: &'static str,
    value: &str,
    pattern: &str,
) -> Result<bool, EvaluationError> {
    let re = regex::Regex::new(pattern).map_err(|e| EvaluationError::Function {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    Ok(re.is_match(value))
}

/// Glob matching with path-aware semantics: `*` does not cross `/`
pub fn glob_match(value: &str, pattern: &str) -> Result<bool, EvaluationError> {
    let compiled = glob::Pattern::new(pattern).map_err(|e| EvaluationError::Function {
        name: "globMatch".to_string(),
        reason: e.to_string(),
    })?;
    let options = glob::MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    Ok(compiled.matches_with(value, options))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_match() {
        assert!(key_match("/foo/bar", "/foo/*"));
        assert!(key_match("/foo", "/foo"));
        assert!(key_match("/foo", "/foo*"));
        assert!(!key_match("/foo/bar", "/foo"));
        assert!(!key_match("/bar/foo", "/foo/*"));
    }

    #[test]
    fn test_key_match2() {
        assert!(key_match2("/foo/bar", "/foo/*").unwrap());
        assert!(key_match2("/resource1", "/:resource").unwrap());
        assert!(key_match2("/myid/using/myresid", "/:id/using/:resId").unwrap());
        assert!(key_match2("/foo/bar", "/foo/:id").unwrap());
        assert!(!key_match2("/foo/bar/baz", "/foo/:id").unwrap());
        assert!(!key_match2("/foo", "/foo/:id").unwrap());
    }

    #[test]
    fn test_regex_match() {
        assert!(regex_match("foobar", "^foo").unwrap());
        assert!(regex_match("alice123", "^[a-z]+[0-9]+$").unwrap());
        assert!(!regex_match("barfoo", "^foo").unwrap());

        let err = regex_match("x", "(").unwrap_err();
        assert!(matches!(err, EvaluationError::Function { .. }));
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match("/foo/bar", "/foo/*").unwrap());
        assert!(!glob_match("/foo/bar/baz", "/foo/*").unwrap());
        assert!(glob_match("data1.txt", "*.txt").unwrap());

        let err = glob_match("x", "[invalid").unwrap_err();
        assert!(matches!(err, EvaluationError::Function { .. }));
    }

    #[test]
    fn test_registry_builtins_and_arity() {
        let functions = FunctionMap::with_builtins();
        let key_match = functions.get("keyMatch").unwrap();

        let args = vec!["/foo/bar".to_string(), "/foo/*".to_string()];
        assert!(key_match(&args).unwrap());

        let err = key_match(&["one".to_string()]).unwrap_err();
        assert_eq!(
            err,
            EvaluationError::FunctionArity {
                name: "keyMatch".to_string(),
                expected: 2,
                actual: 1,
            }
        );
    }

    #[test]
    fn test_registry_custom_function() {
        let mut functions = FunctionMap::with_builtins();
        functions.register(
            "startsWith",
            Arc::new(|args: &[String]| Ok(args[0].starts_with(args[1].as_str()))),
        );

        let f = functions.get("startsWith").unwrap();
        assert!(f(&["alice".to_string(), "al".to_string()]).unwrap());
        assert!(functions.get("endsWith").is_none());
    }
}
