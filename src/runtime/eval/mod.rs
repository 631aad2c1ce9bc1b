//! Tree-walking evaluator
//!
//! Special forms are recognised by the symbol in head position; everything
//! else is a procedure call with eagerly evaluated arguments. Recursion depth
//! is bounded so a runaway program fails with an error instead of
//! overflowing the worker's stack.


use std::rc::Rc;

use crate::runtime::env::{Env, EnvRef};
use crate::runtime::errors::{LispError, LispResult};
use crate::runtime::value::{Lambda, Value};

/// Forms evaluated with their own rules rather than as procedure calls
pub const SPECIAL_FORMS: &[&str] = &[
    "define", "let", "lambda", "if", "and", "or", "quote", "eval", "apply", "begin",
];

/// Default bound on nested evaluation depth
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Evaluator holding the global environment of one session
pub struct Evaluator {
    global: EnvRef,
    max_depth: usize,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            global: Env::global(),
            max_depth,
        }
    }

    /// Evaluate one expression in the global environment
    pub fn eval(
        &mut self,
        exp: &Value,
    ) -> LispResult<Value> {
        self.eval_in(exp, &self.global, 0)
    }

    /// Evaluate expressions in order, returning the value of the last one
    pub fn eval_all(
        &mut self,
        exps: &[Value],
    ) -> LispResult<Value> {
        let mut result = Value::Unspecified;
        for exp in exps {
            result = self.eval(exp)?;
        }
        Ok(result)
    }

    fn eval_in(
        &self,
        exp: &Value,
        env: &EnvRef,
        depth: usize,
    ) -> LispResult<Value> {
        if depth > self.max_depth {
            return Err(LispError::RecursionLimit(self.max_depth));
        }
        match exp {
            Value::Symbol(name) => env.borrow().get(name),
            Value::List(items) if items.is_empty() => Ok(Value::List(Vec::new())),
            Value::List(items) => self.eval_list(items, env, depth + 1),
            Value::Dotted(..) => Err(LispError::Syntax(format!(
                "cannot evaluate improper list {}",
                exp
            ))),
            other => Ok(other.clone()),
        }
    }

    fn eval_list(
        &self,
        items: &[Value],
        env: &EnvRef,
        depth: usize,
    ) -> LispResult<Value> {
        let args = &items[1..];
        if let Some(head) = items[0].as_symbol() {
            match head {
                "quote" => return quote_form(args),
                "if" => return self.if_form(args, env, depth),
                "define" => return self.define_form(args, env, depth),
                "lambda" => return lambda_form(args, env, None),
                "let" => return self.let_form(args, env, depth),
                "and" => return self.and_form(args, env, depth),
                "or" => return self.or_form(args, env, depth),
                "begin" => return self.eval_body(args, env, depth),
                "eval" => return self.eval_form(args, env, depth),
                "apply" => return self.apply_form(args, env, depth),
                _ => {}
            }
        }

        let procedure = self.eval_in(&items[0], env, depth)?;
        let values = args
            .iter()
            .map(|arg| self.eval_in(arg, env, depth))
            .collect::<LispResult<Vec<_>>>()?;
        self.apply(&procedure, &values, depth)
    }

    fn apply(
        &self,
        procedure: &Value,
        args: &[Value],
        depth: usize,
    ) -> LispResult<Value> {
        match procedure {
            Value::Builtin(builtin) => builtin.call(args),
            Value::Lambda(lambda) => {
                let fixed = lambda.params.len();
                let arity_ok = match lambda.rest {
                    Some(_) => args.len() >= fixed,
                    None => args.len() == fixed,
                };
                if !arity_ok {
                    return Err(LispError::Arity {
                        name: lambda.name.clone().unwrap_or_else(|| "lambda".to_string()),
                        expected: match lambda.rest {
                            Some(_) => format!("at least {}", fixed),
                            None => fixed.to_string(),
                        },
                        got: args.len(),
                    });
                }

                let scope = Env::child(&lambda.env);
                {
                    let mut frame = scope.borrow_mut();
                    for (param, arg) in lambda.params.iter().zip(args) {
                        frame.define(param.clone(), arg.clone());
                    }
                    if let Some(rest) = &lambda.rest {
                        frame.define(rest.clone(), Value::List(args[fixed..].to_vec()));
                    }
                }
                self.eval_body(&lambda.body, &scope, depth + 1)
            }
            other => Err(LispError::NotCallable(other.to_string())),
        }
    }

    fn eval_body(
        &self,
        body: &[Value],
        env: &EnvRef,
        depth: usize,
    ) -> LispResult<Value> {
        let mut result = Value::Unspecified;
        for exp in body {
            result = self.eval_in(exp, env, depth)?;
        }
        Ok(result)
    }

    fn if_form(
        &self,
        args: &[Value],
        env: &EnvRef,
        depth: usize,
    ) -> LispResult<Value> {
        if !(2..=3).contains(&args.len()) {
            return Err(LispError::bad_form("if", "expected (if test then [else])"));
        }
        if self.eval_in(&args[0], env, depth)?.is_truthy() {
            self.eval_in(&args[1], env, depth)
        } else if let Some(otherwise) = args.get(2) {
            self.eval_in(otherwise, env, depth)
        } else {
            Ok(Value::Unspecified)
        }
    }

    fn define_form(
        &self,
        args: &[Value],
        env: &EnvRef,
        depth: usize,
    ) -> LispResult<Value> {
        match args.first() {
            Some(Value::Symbol(name)) => {
                if args.len() != 2 {
                    return Err(LispError::bad_form("define", "expected (define name value)"));
                }
                let value = self.eval_in(&args[1], env, depth)?;
                env.borrow_mut().define(name.clone(), value);
                Ok(Value::Unspecified)
            }
            // (define (name . params) body...)
            Some(Value::List(signature)) if !signature.is_empty() => {
                let name = signature[0]
                    .as_symbol()
                    .ok_or_else(|| LispError::bad_form("define", "procedure name must be a symbol"))?
                    .to_string();
                let params = Value::List(signature[1..].to_vec());
                let lambda = build_lambda(&params, &args[1..], env, Some(name.clone()))?;
                env.borrow_mut().define(name, lambda);
                Ok(Value::Unspecified)
            }
            Some(Value::Dotted(signature, rest)) if !signature.is_empty() => {
                let name = signature[0]
                    .as_symbol()
                    .ok_or_else(|| LispError::bad_form("define", "procedure name must be a symbol"))?
                    .to_string();
                let params = if signature.len() == 1 {
                    (**rest).clone()
                } else {
                    Value::Dotted(signature[1..].to_vec(), rest.clone())
                };
                let lambda = build_lambda(&params, &args[1..], env, Some(name.clone()))?;
                env.borrow_mut().define(name, lambda);
                Ok(Value::Unspecified)
            }
            _ => Err(LispError::bad_form("define", "expected a name or a signature")),
        }
    }

    fn let_form(
        &self,
        args: &[Value],
        env: &EnvRef,
        depth: usize,
    ) -> LispResult<Value> {
        let bindings = match args.first() {
            Some(Value::List(bindings)) => bindings,
            _ => return Err(LispError::bad_form("let", "expected a binding list")),
        };
        if args.len() < 2 {
            return Err(LispError::bad_form("let", "missing body"));
        }

        // Bindings are sequential: later initialisers see earlier names.
        let scope = Env::child(env);
        for binding in bindings {
            let (name, init) = match binding {
                Value::List(pair) if pair.len() == 2 => match pair[0].as_symbol() {
                    Some(name) => (name.to_string(), &pair[1]),
                    None => return Err(LispError::bad_form("let", "binding name must be a symbol")),
                },
                other => {
                    return Err(LispError::bad_form(
                        "let",
                        format!("malformed binding {}", other),
                    ))
                }
            };
            let value = self.eval_in(init, &scope, depth)?;
            scope.borrow_mut().define(name, value);
        }
        self.eval_body(&args[1..], &scope, depth)
    }

    fn and_form(
        &self,
        args: &[Value],
        env: &EnvRef,
        depth: usize,
    ) -> LispResult<Value> {
        let mut result = Value::Bool(true);
        for arg in args {
            result = self.eval_in(arg, env, depth)?;
            if !result.is_truthy() {
                break;
            }
        }
        Ok(result)
    }

    fn or_form(
        &self,
        args: &[Value],
        env: &EnvRef,
        depth: usize,
    ) -> LispResult<Value> {
        let mut result = Value::Bool(false);
        for arg in args {
            result = self.eval_in(arg, env, depth)?;
            if result.is_truthy() {
                break;
            }
        }
        Ok(result)
    }

    fn eval_form(
        &self,
        args: &[Value],
        env: &EnvRef,
        depth: usize,
    ) -> LispResult<Value> {
        if args.len() != 1 {
            return Err(LispError::bad_form("eval", "expected exactly one expression"));
        }
        let exp = self.eval_in(&args[0], env, depth)?;
        self.eval_in(&exp, env, depth)
    }

    fn apply_form(
        &self,
        args: &[Value],
        env: &EnvRef,
        depth: usize,
    ) -> LispResult<Value> {
        if args.len() != 2 {
            return Err(LispError::bad_form("apply", "expected (apply procedure list)"));
        }
        let procedure = self.eval_in(&args[0], env, depth)?;
        let values = match self.eval_in(&args[1], env, depth)? {
            Value::List(items) => items,
            Value::Nil => Vec::new(),
            other => return Err(LispError::type_error("a list", &other)),
        };
        self.apply(&procedure, &values, depth)
    }
}

fn quote_form(args: &[Value]) -> LispResult<Value> {
    match args {
        [datum] => Ok(datum.clone()),
        _ => Err(LispError::bad_form("quote", "expected exactly one datum")),
    }
}

fn lambda_form(
    args: &[Value],
    env: &EnvRef,
    name: Option<String>,
) -> LispResult<Value> {
    match args.split_first() {
        Some((params, body)) => build_lambda(params, body, env, name),
        None => Err(LispError::bad_form("lambda", "missing parameter list")),
    }
}

fn build_lambda(
    params: &Value,
    body: &[Value],
    env: &EnvRef,
    name: Option<String>,
) -> LispResult<Value> {
    if body.is_empty() {
        return Err(LispError::bad_form("lambda", "missing body"));
    }
    let (params, rest) = parse_params(params)?;
    Ok(Value::Lambda(Rc::new(Lambda {
        name,
        params,
        rest,
        body: body.to_vec(),
        env: Rc::clone(env),
    })))
}

fn parse_params(spec: &Value) -> LispResult<(Vec<String>, Option<String>)> {
    let names = |items: &[Value]| {
        items
            .iter()
            .map(|item| {
                item.as_symbol()
                    .map(str::to_string)
                    .ok_or_else(|| LispError::bad_form("lambda", format!("parameter {} is not a symbol", item)))
            })
            .collect::<LispResult<Vec<_>>>()
    };

    match spec {
        Value::List(items) => Ok((names(items)?, None)),
        Value::Nil => Ok((Vec::new(), None)),
        Value::Symbol(rest) => Ok((Vec::new(), Some(rest.clone()))),
        Value::Dotted(items, tail) => match tail.as_symbol() {
            Some(rest) => Ok((names(items)?, Some(rest.to_string()))),
            None => Err(LispError::bad_form("lambda", "rest parameter must be a symbol")),
        },
        other => Err(LispError::bad_form(
            "lambda",
            format!("invalid parameter list {}", other),
        )),
    }
}
