//! Matcher expression evaluation
//!
//! One [`EvalContext`] holds the attribute bindings for a single
//! request/row pair (`r.sub` -> `"alice"`, `p.obj` -> `"data1"`, ...).
//! Function calls resolve against the grouping-type role managers first
//! (`g`, `g2`, ...), then the registered function table.

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::EvaluationError;
use crate::ports::role_manager::IRoleManager;

use super::functions::FunctionMap;
use super::parser::Expr;

/// A value produced while evaluating a matcher expression
#[derive(Debug, Clone, PartialEq, Eq)]
enum Value {
    Str(String),
    Bool(bool),
}

/// Attribute bindings for one evaluation
#[derive(Debug, Clone, Default)]
pub struct EvalContext {
    vars: HashMap<String, String>,
}

impl EvalContext {
    /// Creates an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds an attribute name to a string value, replacing any existing
    /// binding
    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    fn lookup(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

/// Evaluates a matcher expression to its boolean outcome
///
/// # Errors
///
/// Returns an [`EvaluationError`] for unknown attributes or functions,
/// arity mismatches, invalid patterns, or a non-boolean result.
pub fn eval_bool(
    expr: &Expr,
    ctx: &EvalContext,
    functions: &FunctionMap,
    role_managers: &HashMap<String, Arc<dyn IRoleManager>>,
) -> Result<bool, EvaluationError> {
    expect_bool(eval(expr, ctx, functions, role_managers)?)
}

fn eval(
    expr: &Expr,
    ctx: &EvalContext,
    functions: &FunctionMap,
    role_managers: &HashMap<String, Arc<dyn IRoleManager>>,
) -> Result<Value, EvaluationError> {
    match expr {
        Expr::Str(value) => Ok(Value::Str(value.clone())),
        Expr::Attr(name) => match name.as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => ctx
                .lookup(name)
                .map(|value| Value::Str(value.to_string()))
                .ok_or_else(|| EvaluationError::UnknownAttribute { name: name.clone() }),
        },
        Expr::Not(inner) => {
            let value = expect_bool(eval(inner, ctx, functions, role_managers)?)?;
            Ok(Value::Bool(!value))
        }
        Expr::And(left, right) => {
            if !expect_bool(eval(left, ctx, functions, role_managers)?)? {
                return Ok(Value::Bool(false));
            }
            let right = expect_bool(eval(right, ctx, functions, role_managers)?)?;
            Ok(Value::Bool(right))
        }
        Expr::Or(left, right) => {
            if expect_bool(eval(left, ctx, functions, role_managers)?)? {
                return Ok(Value::Bool(true));
            }
            let right = expect_bool(eval(right, ctx, functions, role_managers)?)?;
            Ok(Value::Bool(right))
        }
        Expr::Eq(left, right) => {
            let left = eval(left, ctx, functions, role_managers)?;
            let right = eval(right, ctx, functions, role_managers)?;
            Ok(Value::Bool(values_equal(&left, &right)))
        }
        Expr::Ne(left, right) => {
            let left = eval(left, ctx, functions, role_managers)?;
            let right = eval(right, ctx, functions, role_managers)?;
            Ok(Value::Bool(!values_equal(&left, &right)))
        }
        Expr::Call(name, args) => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                match eval(arg, ctx, functions, role_managers)? {
                    Value::Str(s) => values.push(s),
                    Value::Bool(_) => {
                        return Err(EvaluationError::Function {
                            name: name.clone(),
                            reason: "arguments must be strings".to_string(),
                        })
                    }
                }
            }
            call(name, &values, functions, role_managers)
        }
    }
}

/// Resolves a call: grouping-type role managers shadow the function table
fn call(
    name: &str,
    args: &[String],
    functions: &FunctionMap,
    role_managers: &HashMap<String, Arc<dyn IRoleManager>>,
) -> Result<Value, EvaluationError> {
    if let Some(rm) = role_managers.get(name) {
        return match args {
            [user, role] => Ok(Value::Bool(rm.has_link(user, role, None))),
            [user, role, domain] => Ok(Value::Bool(rm.has_link(user, role, Some(domain)))),
            _ => Err(EvaluationError::FunctionArity {
                name: name.to_string(),
                expected: 2,
                actual: args.len(),
            }),
        };
    }
    match functions.get(name) {
        Some(function) => function(args).map(Value::Bool),
        None => Err(EvaluationError::UnknownFunction {
            name: name.to_string(),
        }),
    }
}

fn expect_bool(value: Value) -> Result<bool, EvaluationError> {
    match value {
        Value::Bool(b) => Ok(b),
        Value::Str(s) => Err(EvaluationError::NotBoolean { value: s }),
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::parser::parse;

    /// Role manager stub with a fixed link set
    struct StubRoleManager {
        links: Vec<(String, String, Option<String>)>,
    }

    impl IRoleManager for StubRoleManager {
        fn clear(&self) {}

        fn add_link(&self, _name1: &str, _name2: &str, _domain: Option<&str>) {}

        fn delete_link(
            &self,
            _name1: &str,
            _name2: &str,
            _domain: Option<&str>,
        ) -> anyhow::Result<()> {
            Ok(())
        }

        fn has_link(&self, name1: &str, name2: &str, domain: Option<&str>) -> bool {
            self.links.iter().any(|(n1, n2, d)| {
                n1 == name1 && n2 == name2 && d.as_deref() == domain
            })
        }

        fn get_roles(&self, _name: &str, _domain: Option<&str>) -> Vec<String> {
            Vec::new()
        }

        fn get_users(&self, _name: &str, _domain: Option<&str>) -> Vec<String> {
            Vec::new()
        }

        fn all_roles(&self) -> Vec<String> {
            Vec::new()
        }
    }

    fn no_roles() -> HashMap<String, Arc<dyn IRoleManager>> {
        HashMap::new()
    }

    fn basic_ctx() -> EvalContext {
        let mut ctx = EvalContext::new();
        ctx.bind("r.sub", "alice");
        ctx.bind("r.obj", "data1");
        ctx.bind("r.act", "read");
        ctx.bind("p.sub", "alice");
        ctx.bind("p.obj", "data1");
        ctx.bind("p.act", "read");
        ctx
    }

    #[test]
    fn test_eval_equality_chain() {
        let expr = parse("r.sub == p.sub && r.obj == p.obj && r.act == p.act").unwrap();
        let functions = FunctionMap::with_builtins();
        assert!(eval_bool(&expr, &basic_ctx(), &functions, &no_roles()).unwrap());

        let mut ctx = basic_ctx();
        ctx.bind("r.act", "write");
        assert!(!eval_bool(&expr, &ctx, &functions, &no_roles()).unwrap());
    }

    #[test]
    fn test_eval_or_and_not() {
        let functions = FunctionMap::with_builtins();
        let ctx = basic_ctx();

        let expr = parse("r.sub == 'root' || r.sub == p.sub").unwrap();
        assert!(eval_bool(&expr, &ctx, &functions, &no_roles()).unwrap());

        let expr = parse("!(r.sub == 'root')").unwrap();
        assert!(eval_bool(&expr, &ctx, &functions, &no_roles()).unwrap());
    }

    #[test]
    fn test_eval_boolean_literals() {
        let functions = FunctionMap::with_builtins();
        let ctx = EvalContext::new();

        let expr = parse("true").unwrap();
        assert!(eval_bool(&expr, &ctx, &functions, &no_roles()).unwrap());

        let expr = parse("false || true").unwrap();
        assert!(eval_bool(&expr, &ctx, &functions, &no_roles()).unwrap());
    }

    #[test]
    fn test_eval_unknown_attribute() {
        let functions = FunctionMap::with_builtins();
        let expr = parse("r.tenant == 'acme'").unwrap();
        let err = eval_bool(&expr, &basic_ctx(), &functions, &no_roles()).unwrap_err();
        assert_eq!(
            err,
            EvaluationError::UnknownAttribute {
                name: "r.tenant".to_string(),
            }
        );
    }

    #[test]
    fn test_eval_non_boolean_result() {
        let functions = FunctionMap::with_builtins();
        let expr = parse("r.sub").unwrap();
        let err = eval_bool(&expr, &basic_ctx(), &functions, &no_roles()).unwrap_err();
        assert_eq!(
            err,
            EvaluationError::NotBoolean {
                value: "alice".to_string(),
            }
        );
    }

    #[test]
    fn test_eval_builtin_call() {
        let functions = FunctionMap::with_builtins();
        let mut ctx = EvalContext::new();
        ctx.bind("r.obj", "/data/reports/q3");
        ctx.bind("p.obj", "/data/*");

        let expr = parse("keyMatch(r.obj, p.obj)").unwrap();
        assert!(eval_bool(&expr, &ctx, &functions, &no_roles()).unwrap());
    }

    #[test]
    fn test_eval_unknown_function() {
        let functions = FunctionMap::with_builtins();
        let expr = parse("ipMatch(r.sub, p.sub)").unwrap();
        let err = eval_bool(&expr, &basic_ctx(), &functions, &no_roles()).unwrap_err();
        assert_eq!(
            err,
            EvaluationError::UnknownFunction {
                name: "ipMatch".to_string(),
            }
        );
    }

    #[test]
    fn test_eval_grouping_call() {
        let functions = FunctionMap::with_builtins();
        let mut role_managers: HashMap<String, Arc<dyn IRoleManager>> = HashMap::new();
        role_managers.insert(
            "g".to_string(),
            Arc::new(StubRoleManager {
                links: vec![("alice".to_string(), "admin".to_string(), None)],
            }),
        );

        let mut ctx = EvalContext::new();
        ctx.bind("r.sub", "alice");
        ctx.bind("p.sub", "admin");

        let expr = parse("g(r.sub, p.sub)").unwrap();
        assert!(eval_bool(&expr, &ctx, &functions, &role_managers).unwrap());

        ctx.bind("r.sub", "bob");
        assert!(!eval_bool(&expr, &ctx, &functions, &role_managers).unwrap());
    }

    #[test]
    fn test_eval_grouping_call_with_domain() {
        let functions = FunctionMap::with_builtins();
        let mut role_managers: HashMap<String, Arc<dyn IRoleManager>> = HashMap::new();
        role_managers.insert(
            "g".to_string(),
            Arc::new(StubRoleManager {
                links: vec![(
                    "alice".to_string(),
                    "admin".to_string(),
                    Some("tenant1".to_string()),
                )],
            }),
        );

        let mut ctx = EvalContext::new();
        ctx.bind("r.sub", "alice");
        ctx.bind("r.dom", "tenant1");
        ctx.bind("p.sub", "admin");

        let expr = parse("g(r.sub, p.sub, r.dom)").unwrap();
        assert!(eval_bool(&expr, &ctx, &functions, &role_managers).unwrap());

        ctx.bind("r.dom", "tenant2");
        assert!(!eval_bool(&expr, &ctx, &functions, &role_managers).unwrap());
    }

    #[test]
    fn test_eval_mixed_type_equality_is_false() {
        let functions = FunctionMap::with_builtins();
        let ctx = basic_ctx();

        let expr = parse("r.sub == true").unwrap();
        assert!(!eval_bool(&expr, &ctx, &functions, &no_roles()).unwrap());

        let expr = parse("r.sub != true").unwrap();
        assert!(eval_bool(&expr, &ctx, &functions, &no_roles()).unwrap());
    }
}
