use crate::ast::{
    BinaryOp, Body, Callable, Expr, FuncDef, LoopBody, MainEntry, PostfixOp, Program, ReplInput,
    Stmt, UnaryOp,
};
use crate::config::Config;
use crate::environment::Environment;
use crate::error::{NyaaError, RuntimeErrorKind, Span};
use crate::value::{Function, Value};
use std::cmp::Ordering;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

/// How control leaves a statement. Runtime errors travel separately as the
/// `Err` side of the result.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Normal,
    Returned(Value),
    Broke,
    Continued,
}

/// Tree-walking evaluator. Program output goes to `output`, and `ohayo`
/// reads lines from `input`.
pub struct Evaluator<R, W> {
    globals: Environment,
    environment: Environment,
    input: R,
    output: W,
    config: Config,
    depth: usize,
}

impl Evaluator<io::StdinLock<'static>, io::Stdout> {
    pub fn with_stdio(config: Config) -> Self {
        Evaluator::new(io::stdin().lock(), io::stdout(), config)
    }
}

impl<R: BufRead, W: Write> Evaluator<R, W> {
    pub fn new(input: R, output: W, config: Config) -> Self {
        let globals = Environment::new();
        let environment = Environment::with_enclosing(&globals);
        Self {
            globals,
            environment,
            input,
            output,
            config,
            depth: 0,
        }
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn input_mut(&mut self) -> &mut R {
        &mut self.input
    }

    pub fn evaluate_program(&mut self, program: &Program) -> Result<(), NyaaError> {
        for func in &program.functions {
            self.define_function(func);
        }

        let Some(main) = &program.main else {
            return Ok(());
        };

        let frame = Environment::with_enclosing(&self.globals);
        let previous = std::mem::replace(&mut self.environment, frame);

        let result = match main {
            MainEntry::Block(body) => self.execute_body(body),
            MainEntry::Single(stmt) => self.execute_statement(stmt),
        };

        self.environment = previous;
        let flushed = self.flush(&Span::single(0));

        // return/break/continue at top level just end the main entry
        result?;
        flushed
    }

    pub fn define_function(&mut self, func: &FuncDef) {
        tracing::debug!(name = %func.name, arity = func.arity(), "registering function");
        let function = Function {
            name: func.name.clone(),
            params: func.params.clone(),
            body: func.body.clone(),
            closure: self.globals.clone(),
        };
        self.globals
            .define(&func.name, Value::Function(Rc::new(function)));
    }

    /// Runs one line of interactive input in the persistent session frame.
    /// Returns the value of a bare expression, unless it is `Unit`.
    pub fn execute_repl(&mut self, input: &ReplInput) -> Result<Option<Value>, NyaaError> {
        let result = match input {
            ReplInput::Empty => Ok(None),
            ReplInput::FuncDef(func) => {
                self.define_function(func);
                Ok(None)
            }
            ReplInput::Expression(expr) => match self.evaluate_expression(expr)? {
                Value::Unit => Ok(None),
                value => Ok(Some(value)),
            },
            ReplInput::Statements(body) => self.execute_body(body).map(|_| None),
        };
        self.flush(&Span::single(0))?;
        result
    }

    pub fn execute_body(&mut self, body: &Body) -> Result<Outcome, NyaaError> {
        for statement in &body.statements {
            match self.execute_statement(statement)? {
                Outcome::Normal => {}
                outcome => return Ok(outcome),
            }
        }
        Ok(Outcome::Normal)
    }

    fn execute_statement(&mut self, stmt: &Stmt) -> Result<Outcome, NyaaError> {
        match stmt {
            Stmt::Pass { .. } => Ok(Outcome::Normal),
            Stmt::Break { .. } => Ok(Outcome::Broke),
            Stmt::Continue { .. } => Ok(Outcome::Continued),
            Stmt::Assignment { target, value, .. } => {
                let value = self.evaluate_expression(value)?;
                self.environment.define(target, value);
                Ok(Outcome::Normal)
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate_expression(expr)?,
                    None => Value::Unit,
                };
                Ok(Outcome::Returned(value))
            }
            Stmt::While {
                condition, body, ..
            } => {
                while self.evaluate_expression(condition)?.is_truthy() {
                    let outcome = match body {
                        LoopBody::Break => Outcome::Broke,
                        LoopBody::Continue => Outcome::Continued,
                        LoopBody::Body(body) => self.execute_body(body)?,
                    };

                    match outcome {
                        Outcome::Normal | Outcome::Continued => {}
                        Outcome::Broke => break,
                        returned @ Outcome::Returned(_) => return Ok(returned),
                    }
                }
                Ok(Outcome::Normal)
            }
            Stmt::If {
                condition,
                then_body,
                elifs,
                else_body,
                ..
            } => {
                if self.evaluate_expression(condition)?.is_truthy() {
                    return self.execute_body(then_body);
                }

                for elif in elifs {
                    if self.evaluate_expression(&elif.condition)?.is_truthy() {
                        return self.execute_body(&elif.body);
                    }
                }

                match else_body {
                    Some(body) => self.execute_body(body),
                    None => Ok(Outcome::Normal),
                }
            }
            Stmt::TryCatch {
                try_body,
                except_body,
                ..
            } => match self.execute_body(try_body) {
                Err(error) if error.is_runtime() => {
                    tracing::debug!(%error, "runtime error caught by gomenasai");
                    self.execute_body(except_body)
                }
                other => other,
            },
            Stmt::Print { args, span } => {
                self.print_values(args, span)?;
                Ok(Outcome::Normal)
            }
            Stmt::Input { prompt, span } => {
                self.read_input(prompt.as_deref(), span)?;
                Ok(Outcome::Normal)
            }
            Stmt::Call { name, args, span } => {
                self.call_function(name, args, span)?;
                Ok(Outcome::Normal)
            }
            Stmt::Postfix { name, op, span } => {
                self.apply_postfix(name, *op, span)?;
                Ok(Outcome::Normal)
            }
        }
    }

    pub fn evaluate_expression(&mut self, expr: &Expr) -> Result<Value, NyaaError> {
        match expr {
            Expr::Literal { value, .. } => Ok(Value::from(value)),
            Expr::Identifier { name, span } => self.environment.get(name).ok_or_else(|| {
                NyaaError::runtime_error(
                    RuntimeErrorKind::UndefinedName,
                    span.clone(),
                    format!("Undefined variable '{}'", name),
                )
            }),
            Expr::Unary {
                operator,
                operand,
                span,
            } => {
                let operand_val = self.evaluate_expression(operand)?;
                self.evaluate_unary_op(*operator, operand_val, span)
            }
            Expr::Binary {
                left,
                operator,
                right,
                span,
            } => {
                // both sides are always evaluated, including for and/or
                let left_val = self.evaluate_expression(left)?;
                let right_val = self.evaluate_expression(right)?;
                self.evaluate_binary_op(*operator, left_val, right_val, span)
            }
            Expr::Grouping { expr, .. } => self.evaluate_expression(expr),
            Expr::Call { callable, span } => match callable {
                Callable::Print { args } => {
                    self.print_values(args, span)?;
                    Ok(Value::Unit)
                }
                Callable::Input { prompt } => self.read_input(prompt.as_deref(), span),
                Callable::Function { name, args } => self.call_function(name, args, span),
            },
        }
    }

    fn call_function(&mut self, name: &str, args: &[Expr], span: &Span) -> Result<Value, NyaaError> {
        let callee = self.environment.get(name).ok_or_else(|| {
            NyaaError::runtime_error_with_help(
                RuntimeErrorKind::UndefinedName,
                span.clone(),
                format!("Undefined function '{}'", name),
                "Functions are declared before the main entry with: kawaii name(params) { ... }"
                    .to_string(),
            )
        })?;

        let function = match callee {
            Value::Function(function) => function,
            other => {
                return Err(NyaaError::runtime_error(
                    RuntimeErrorKind::TypeMismatch,
                    span.clone(),
                    format!("'{}' is a {}, not a function", name, other.type_name()),
                ))
            }
        };

        if args.len() != function.arity() {
            return Err(NyaaError::runtime_error_with_help(
                RuntimeErrorKind::ArityMismatch,
                span.clone(),
                format!(
                    "Function '{}' expects {} argument(s), got {}",
                    name,
                    function.arity(),
                    args.len()
                ),
                format!("Usage: {}({})", name, function.params.join(", ")),
            ));
        }

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.evaluate_expression(arg)?);
        }

        let limit = self.config.call_depth_limit();
        if self.depth >= limit {
            return Err(NyaaError::runtime_error(
                RuntimeErrorKind::RecursionLimit,
                span.clone(),
                format!("Maximum call depth of {} exceeded in '{}'", limit, name),
            ));
        }

        let frame = Environment::with_enclosing(&function.closure);
        for (param, value) in function.params.iter().zip(values) {
            frame.define(param, value);
        }

        let previous = std::mem::replace(&mut self.environment, frame);
        self.depth += 1;
        tracing::trace!(function = %name, depth = self.depth, "enter");

        let result = self.execute_body(&function.body);

        tracing::trace!(function = %name, depth = self.depth, "exit");
        self.depth -= 1;
        self.environment = previous;

        match result? {
            Outcome::Returned(value) => Ok(value),
            _ => Ok(Value::Unit),
        }
    }

    fn print_values(&mut self, args: &[Expr], span: &Span) -> Result<(), NyaaError> {
        let mut texts = Vec::with_capacity(args.len());
        for arg in args {
            texts.push(self.evaluate_expression(arg)?.to_string());
        }

        writeln!(self.output, "{}", texts.join(" ")).map_err(|e| io_error(e, span))
    }

    fn read_input(&mut self, prompt: Option<&str>, span: &Span) -> Result<Value, NyaaError> {
        if let Some(prompt) = prompt {
            write!(self.output, "{}", prompt).map_err(|e| io_error(e, span))?;
        }
        self.flush(span)?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line).map_err(|e| io_error(e, span))?;
        if read == 0 {
            return Err(NyaaError::runtime_error(
                RuntimeErrorKind::InputExhausted,
                span.clone(),
                "No more input to read".to_string(),
            ));
        }

        let line = line.trim_end_matches(['\n', '\r']);
        Ok(Value::Str(line.to_string()))
    }

    fn apply_postfix(&mut self, name: &str, op: PostfixOp, span: &Span) -> Result<(), NyaaError> {
        let current = self.environment.get(name).ok_or_else(|| {
            NyaaError::runtime_error(
                RuntimeErrorKind::UndefinedName,
                span.clone(),
                format!("Undefined variable '{}'", name),
            )
        })?;

        let delta: i64 = match op {
            PostfixOp::Increment => 1,
            PostfixOp::Decrement => -1,
        };

        let updated = match current {
            Value::Int(n) => Value::Int(n.checked_add(delta).ok_or_else(|| overflow(span))?),
            Value::Float(n) => Value::Float(n + delta as f64),
            other => {
                return Err(NyaaError::runtime_error(
                    RuntimeErrorKind::TypeMismatch,
                    span.clone(),
                    format!(
                        "Cannot {} '{}' of type {}",
                        if delta > 0 { "increment" } else { "decrement" },
                        name,
                        other.type_name()
                    ),
                ))
            }
        };

        self.environment.assign(name, updated);
        Ok(())
    }

    fn evaluate_unary_op(
        &self,
        operator: UnaryOp,
        operand: Value,
        span: &Span,
    ) -> Result<Value, NyaaError> {
        match operator {
            UnaryOp::Negate => match operand {
                Value::Int(n) => Ok(Value::Int(n.checked_neg().ok_or_else(|| overflow(span))?)),
                Value::Float(n) => Ok(Value::Float(-n)),
                _ => Err(NyaaError::runtime_error(
                    RuntimeErrorKind::TypeMismatch,
                    span.clone(),
                    format!("Cannot negate {}", operand.type_name()),
                )),
            },
            UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
        }
    }

    fn evaluate_binary_op(
        &self,
        operator: BinaryOp,
        left: Value,
        right: Value,
        span: &Span,
    ) -> Result<Value, NyaaError> {
        match operator {
            BinaryOp::Add => match (left, right) {
                (Value::Str(l), r) => Ok(Value::Str(format!("{}{}", l, r))),
                (l, Value::Str(r)) => Ok(Value::Str(format!("{}{}", l, r))),
                (l, r) => self.evaluate_arithmetic(operator, l, r, span),
            },
            BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide => {
                self.evaluate_arithmetic(operator, left, right, span)
            }
            BinaryOp::And => Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
            BinaryOp::Or => Ok(Value::Bool(left.is_truthy() || right.is_truthy())),
            BinaryOp::Equal => Ok(Value::Bool(self.is_equal(&left, &right))),
            BinaryOp::NotEqual => Ok(Value::Bool(!self.is_equal(&left, &right))),
            BinaryOp::Less | BinaryOp::LessEqual | BinaryOp::Greater | BinaryOp::GreaterEqual => {
                let ordering = self.compare(operator, &left, &right, span)?;
                let result = match ordering {
                    // NaN is unordered
                    None => false,
                    Some(ordering) => match operator {
                        BinaryOp::Less => ordering == Ordering::Less,
                        BinaryOp::LessEqual => ordering != Ordering::Greater,
                        BinaryOp::Greater => ordering == Ordering::Greater,
                        _ => ordering != Ordering::Less,
                    },
                };
                Ok(Value::Bool(result))
            }
        }
    }

    fn evaluate_arithmetic(
        &self,
        operator: BinaryOp,
        left: Value,
        right: Value,
        span: &Span,
    ) -> Result<Value, NyaaError> {
        match (&left, &right) {
            (Value::Int(l), Value::Int(r)) => {
                let (l, r) = (*l, *r);
                let result = match operator {
                    BinaryOp::Add => l.checked_add(r),
                    BinaryOp::Subtract => l.checked_sub(r),
                    BinaryOp::Multiply => l.checked_mul(r),
                    _ => {
                        if r == 0 {
                            return Err(division_by_zero(span));
                        }
                        return Ok(Value::Float(l as f64 / r as f64));
                    }
                };
                result.map(Value::Int).ok_or_else(|| overflow(span))
            }
            _ => match (left.as_f64(), right.as_f64()) {
                (Some(l), Some(r)) => Ok(Value::Float(match operator {
                    BinaryOp::Add => l + r,
                    BinaryOp::Subtract => l - r,
                    BinaryOp::Multiply => l * r,
                    _ => {
                        if r == 0.0 {
                            return Err(division_by_zero(span));
                        }
                        l / r
                    }
                })),
                _ => Err(NyaaError::runtime_error(
                    RuntimeErrorKind::TypeMismatch,
                    span.clone(),
                    format!(
                        "Cannot apply '{}' to {} and {}",
                        operator.symbol(),
                        left.type_name(),
                        right.type_name()
                    ),
                )),
            },
        }
    }

    fn compare(
        &self,
        operator: BinaryOp,
        left: &Value,
        right: &Value,
        span: &Span,
    ) -> Result<Option<Ordering>, NyaaError> {
        match (left, right) {
            (Value::Int(l), Value::Int(r)) => Ok(Some(l.cmp(r))),
            (Value::Str(l), Value::Str(r)) => Ok(Some(l.cmp(r))),
            (l, r) if l.is_numeric() && r.is_numeric() => {
                let (l, r) = (l.as_f64().unwrap_or(f64::NAN), r.as_f64().unwrap_or(f64::NAN));
                Ok(l.partial_cmp(&r))
            }
            (l, r) => Err(NyaaError::runtime_error_with_help(
                RuntimeErrorKind::TypeMismatch,
                span.clone(),
                format!(
                    "Cannot compare {} and {} with '{}'",
                    l.type_name(),
                    r.type_name(),
                    operator.symbol()
                ),
                "Ordering works on two numbers or two strings; booleans only support == and !="
                    .to_string(),
            )),
        }
    }

    fn is_equal(&self, left: &Value, right: &Value) -> bool {
        match (left, right) {
            (Value::Unit, Value::Unit) => true,
            (Value::Bool(l), Value::Bool(r)) => l == r,
            (Value::Int(l), Value::Int(r)) => l == r,
            (Value::Float(l), Value::Float(r)) => l == r,
            (Value::Int(l), Value::Float(r)) => (*l as f64) == *r,
            (Value::Float(l), Value::Int(r)) => *l == (*r as f64),
            (Value::Str(l), Value::Str(r)) => l == r,
            (Value::Function(l), Value::Function(r)) => Rc::ptr_eq(l, r),
            _ => false,
        }
    }

    fn flush(&mut self, span: &Span) -> Result<(), NyaaError> {
        self.output.flush().map_err(|e| io_error(e, span))
    }
}

impl<R, W> Drop for Evaluator<R, W> {
    fn drop(&mut self) {
        // functions hold the global frame; clearing it breaks the cycle
        self.globals.clear();
    }
}

fn io_error(error: io::Error, span: &Span) -> NyaaError {
    NyaaError::runtime_error(
        RuntimeErrorKind::Io,
        span.clone(),
        format!("I/O failure: {}", error),
    )
}

fn overflow(span: &Span) -> NyaaError {
    NyaaError::runtime_error(
        RuntimeErrorKind::Overflow,
        span.clone(),
        "Integer overflow".to_string(),
    )
}

fn division_by_zero(span: &Span) -> NyaaError {
    NyaaError::runtime_error_with_help(
        RuntimeErrorKind::DivisionByZero,
        span.clone(),
        "Division by zero".to_string(),
        "Division by zero is not kawaii; check the divisor before dividing.".to_string(),
    )
}
