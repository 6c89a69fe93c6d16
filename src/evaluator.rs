use tracing::trace;

use crate::ast::{
    Binary, BinaryOperatorKind, Call, Conditional, Expression, Identifier, Index, MemberAccess,
    Message, Unary,
};
use crate::environment::Environment;
use crate::error::EvaluationError;
use crate::message::MessageFields;
use crate::runtime::Runtime;
use crate::span::Span;
use crate::value::{MapKey, Value, ValueKind, ValueMap, map_lookup};

/// The comprehension macros, called as methods with a loop variable first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comprehension {
    All,
    Exists,
    ExistsOne,
    Map,
    Filter,
}

impl Comprehension {
    fn from_call(call: &Call) -> Option<Comprehension> {
        call.target.as_ref()?;
        if !matches!(call.args.first(), Some(Expression::Identifier(_))) {
            return None;
        }
        let macro_kind = match (call.function.name.as_str(), call.args.len()) {
            ("all", 2) => Comprehension::All,
            ("exists", 2) => Comprehension::Exists,
            ("exists_one", 2) => Comprehension::ExistsOne,
            ("map", 2 | 3) => Comprehension::Map,
            ("filter", 2) => Comprehension::Filter,
            _ => return None,
        };
        Some(macro_kind)
    }
}

/// Tree-walking interpreter for a single evaluation.
///
/// Holds the depth counter and the idempotence flag that end up in the
/// [`Receipt`](crate::Receipt); everything else is borrowed from the runtime.
pub(crate) struct Evaluator<'r> {
    runtime: &'r Runtime,
    depth: usize,
    idempotent: bool,
}

impl<'r> Evaluator<'r> {
    pub(crate) fn new(runtime: &'r Runtime) -> Self {
        Evaluator {
            runtime,
            depth: 0,
            idempotent: true,
        }
    }

    pub(crate) fn is_idempotent(&self) -> bool {
        self.idempotent
    }

    pub(crate) fn evaluate(&mut self, expr: &Expression, env: &Environment) -> Result<Value, EvaluationError> {
        let limit = self.runtime.max_depth();
        if self.depth >= limit {
            return Err(EvaluationError::ExpressionTooDeep {
                limit,
                span: expr.span(),
            });
        }

        self.depth += 1;
        let result = self.eval_expr(expr, env);
        self.depth -= 1;
        result
    }

    fn eval_expr(&mut self, expr: &Expression, env: &Environment) -> Result<Value, EvaluationError> {
        match expr {
            Expression::Literal(literal) => Ok(Value::from(&literal.value)),
            Expression::Identifier(ident) => env.get(&ident.name).cloned().ok_or_else(|| {
                EvaluationError::NoSuchVariable {
                    name: ident.name.clone(),
                    span: ident.span,
                }
            }),
            Expression::MemberAccess(node) => {
                let operand = self.evaluate(&node.operand, env)?;
                select_field(&operand, &node.field, expr.span())
            }
            Expression::Index(node) => self.eval_index(node, env),
            Expression::Call(call) => self.eval_call(call, env),
            Expression::List(list) => {
                let mut items = Vec::with_capacity(list.elements.len());
                for element in &list.elements {
                    items.push(self.evaluate(element, env)?);
                }
                Ok(Value::list(items))
            }
            Expression::Map(map) => {
                let mut entries = ValueMap::with_capacity(map.entries.len());
                for entry in &map.entries {
                    let key = self.evaluate(&entry.key, env)?;
                    let key = MapKey::from_value(&key).ok_or_else(|| {
                        EvaluationError::unsupported(
                            format!("{} is not a valid map key kind", key.kind()),
                            entry.key.span(),
                        )
                    })?;
                    let value = self.evaluate(&entry.value, env)?;
                    entries.insert(key, value);
                }
                Ok(Value::from(entries))
            }
            Expression::Message(message) => self.eval_message(message, env),
            Expression::Unary(node) => self.eval_unary(node, env, expr.span()),
            Expression::Binary(node) => self.eval_binary(node, env, expr.span()),
            Expression::Conditional(node) => self.eval_conditional(node, env),
            Expression::Parenthesized(node) => self.evaluate(&node.inner, env),
        }
    }

    // ========================================
    // Operators
    // ========================================

    fn eval_unary(&mut self, node: &Unary, env: &Environment, span: Span) -> Result<Value, EvaluationError> {
        let operand = self.evaluate(&node.operand, env)?;
        let handler = self
            .runtime
            .operators()
            .lookup_unary(node.op.kind, operand.kind(), span)?;
        handler(span, &[operand])
    }

    fn eval_binary(&mut self, node: &Binary, env: &Environment, span: Span) -> Result<Value, EvaluationError> {
        let op = node.op.kind;
        if op.is_short_circuit() {
            return self.eval_logical(node, env, span);
        }

        let left = self.evaluate(&node.left, env)?;
        let right = self.evaluate(&node.right, env)?;
        let handler = self
            .runtime
            .operators()
            .lookup_binary(op, left.kind(), right.kind(), span)?;
        handler(span, &[left, right])
    }

    /// `&&` and `||`. The right operand is evaluated only when the left one
    /// does not already decide the result.
    fn eval_logical(&mut self, node: &Binary, env: &Environment, span: Span) -> Result<Value, EvaluationError> {
        let op = node.op.kind;
        let deciding = op == BinaryOperatorKind::Or;

        let left_value = self.evaluate(&node.left, env)?;
        let Value::Bool(left) = left_value else {
            return Err(logical_mismatch(op, vec![left_value.kind()], span));
        };
        if left == deciding {
            return Ok(Value::Bool(deciding));
        }

        match self.evaluate(&node.right, env)? {
            Value::Bool(right) => Ok(Value::Bool(right)),
            right => Err(logical_mismatch(op, vec![ValueKind::Bool, right.kind()], span)),
        }
    }

    fn eval_conditional(&mut self, node: &Conditional, env: &Environment) -> Result<Value, EvaluationError> {
        match self.evaluate(&node.condition, env)? {
            Value::Bool(true) => self.evaluate(&node.then, env),
            Value::Bool(false) => self.evaluate(&node.otherwise, env),
            other => Err(EvaluationError::InvalidConditionType {
                found: other.kind(),
                span: node.condition.span(),
            }),
        }
    }

    // ========================================
    // Access
    // ========================================

    fn eval_index(&mut self, node: &Index, env: &Environment) -> Result<Value, EvaluationError> {
        let operand = self.evaluate(&node.operand, env)?;
        let index = self.evaluate(&node.index, env)?;
        let span = node.span;

        match &operand {
            Value::List(items) => {
                let position: i128 = match index {
                    Value::Int(n) => n as i128,
                    Value::UInt(n) => n as i128,
                    other => {
                        return Err(EvaluationError::unsupported(
                            format!("list index must be int or uint, found {}", other.kind()),
                            span,
                        ));
                    }
                };
                usize::try_from(position)
                    .ok()
                    .and_then(|i| items.get(i))
                    .cloned()
                    .ok_or(EvaluationError::IndexOutOfBounds {
                        index: position,
                        len: items.len(),
                        span,
                    })
            }
            Value::Map(map) => {
                if !matches!(
                    index.kind(),
                    ValueKind::Bool | ValueKind::Int | ValueKind::UInt | ValueKind::Float | ValueKind::String
                ) {
                    return Err(EvaluationError::unsupported(
                        format!("{} is not a valid map key kind", index.kind()),
                        span,
                    ));
                }
                map_lookup(map, &index)
                    .cloned()
                    .ok_or_else(|| EvaluationError::NoSuchKey {
                        key: index.to_string(),
                        span,
                    })
            }
            other => Err(EvaluationError::unsupported(
                format!("cannot index into {}", other.kind()),
                span,
            )),
        }
    }

    // ========================================
    // Calls and macros
    // ========================================

    fn eval_call(&mut self, call: &Call, env: &Environment) -> Result<Value, EvaluationError> {
        if call.target.is_none() && call.function.name == "has" {
            return self.eval_has(call, env);
        }
        if let Some(comprehension) = Comprehension::from_call(call) {
            return self.eval_comprehension(comprehension, call, env);
        }

        let mut args = Vec::with_capacity(call.args.len() + 1);
        if let Some(target) = &call.target {
            args.push(self.evaluate(target, env)?);
        }
        for arg in &call.args {
            args.push(self.evaluate(arg, env)?);
        }

        let kinds: Vec<ValueKind> = args.iter().map(Value::kind).collect();
        trace!(function = %call.function.name, arguments = ?kinds, "dispatching call");

        let resolved = self
            .runtime
            .functions()
            .lookup(&call.function.name, &kinds, call.span)?;
        if !resolved.idempotent {
            self.idempotent = false;
        }
        (resolved.handler)(call.span, &args)
    }

    /// `has(x.f)`: field presence without failing on absence.
    fn eval_has(&mut self, call: &Call, env: &Environment) -> Result<Value, EvaluationError> {
        let [Expression::MemberAccess(MemberAccess { operand, field })] = call.args.as_slice() else {
            return Err(EvaluationError::unsupported(
                "has() takes a single field selection such as has(x.f)",
                call.span,
            ));
        };

        match self.evaluate(operand, env)? {
            Value::Map(map) => Ok(Value::Bool(map.contains_key(&MapKey::from(field.name.as_str())))),
            Value::Message(message) => Ok(Value::Bool(message.has_field(&field.name))),
            other => Err(EvaluationError::unsupported(
                format!("has() cannot test fields of {}", other.kind()),
                call.span,
            )),
        }
    }

    fn eval_comprehension(
        &mut self,
        comprehension: Comprehension,
        call: &Call,
        env: &Environment,
    ) -> Result<Value, EvaluationError> {
        let (Some(target), [Expression::Identifier(variable), rest @ ..]) = (&call.target, call.args.as_slice())
        else {
            return Err(EvaluationError::internal(
                format!("malformed `{}` comprehension", call.function.name),
                call.span,
            ));
        };

        let range = match self.evaluate(target, env)? {
            Value::List(items) => items.to_vec(),
            Value::Map(map) => map.keys().cloned().map(Value::from).collect(),
            other => {
                return Err(EvaluationError::unsupported(
                    format!("{}() cannot iterate over {}", call.function.name, other.kind()),
                    call.span,
                ));
            }
        };

        let mut scope = env.fork();

        match (comprehension, rest) {
            (Comprehension::All, [predicate]) => {
                for item in range {
                    scope.add(variable.name.as_str(), item);
                    if !self.eval_predicate(predicate, &scope)? {
                        return Ok(Value::Bool(false));
                    }
                }
                Ok(Value::Bool(true))
            }
            (Comprehension::Exists, [predicate]) => {
                for item in range {
                    scope.add(variable.name.as_str(), item);
                    if self.eval_predicate(predicate, &scope)? {
                        return Ok(Value::Bool(true));
                    }
                }
                Ok(Value::Bool(false))
            }
            (Comprehension::ExistsOne, [predicate]) => {
                let mut matches = 0usize;
                for item in range {
                    scope.add(variable.name.as_str(), item);
                    if self.eval_predicate(predicate, &scope)? {
                        matches += 1;
                    }
                }
                Ok(Value::Bool(matches == 1))
            }
            (Comprehension::Map, [transform]) => {
                let mut mapped = Vec::with_capacity(range.len());
                for item in range {
                    scope.add(variable.name.as_str(), item);
                    mapped.push(self.evaluate(transform, &scope)?);
                }
                Ok(Value::list(mapped))
            }
            (Comprehension::Map, [predicate, transform]) => {
                let mut mapped = Vec::new();
                for item in range {
                    scope.add(variable.name.as_str(), item);
                    if self.eval_predicate(predicate, &scope)? {
                        mapped.push(self.evaluate(transform, &scope)?);
                    }
                }
                Ok(Value::list(mapped))
            }
            (Comprehension::Filter, [predicate]) => {
                let mut kept = Vec::new();
                for item in range {
                    scope.add(variable.name.as_str(), item.clone());
                    if self.eval_predicate(predicate, &scope)? {
                        kept.push(item);
                    }
                }
                Ok(Value::list(kept))
            }
            _ => Err(EvaluationError::internal(
                format!("malformed `{}` comprehension", call.function.name),
                call.span,
            )),
        }
    }

    fn eval_predicate(&mut self, predicate: &Expression, scope: &Environment) -> Result<bool, EvaluationError> {
        match self.evaluate(predicate, scope)? {
            Value::Bool(b) => Ok(b),
            other => Err(EvaluationError::InvalidConditionType {
                found: other.kind(),
                span: predicate.span(),
            }),
        }
    }

    // ========================================
    // Messages
    // ========================================

    fn eval_message(&mut self, message: &Message, env: &Environment) -> Result<Value, EvaluationError> {
        let type_name = message.type_name();
        let message_type = self
            .runtime
            .message_type(&type_name)
            .ok_or_else(|| EvaluationError::NoSuchType {
                type_name: type_name.clone(),
                span: message.span,
            })?;

        let mut fields = Vec::with_capacity(message.fields.len());
        for field in &message.fields {
            fields.push((field.name.name.clone(), self.evaluate(&field.value, env)?));
        }

        message_type
            .construct(&MessageFields::new(fields))
            .map_err(|e| EvaluationError::MessageConstruction {
                type_name,
                reason: e.to_string(),
                span: message.span,
            })
    }
}

fn select_field(operand: &Value, field: &Identifier, span: Span) -> Result<Value, EvaluationError> {
    let missing = || EvaluationError::NoSuchKey {
        key: field.name.clone(),
        span,
    };

    match operand {
        Value::Map(map) => map
            .get(&MapKey::from(field.name.as_str()))
            .cloned()
            .ok_or_else(missing),
        Value::Message(message) => message.field(&field.name).cloned().ok_or_else(missing),
        other => Err(EvaluationError::unsupported(
            format!("cannot select field `{}` from {}", field.name, other.kind()),
            span,
        )),
    }
}

fn logical_mismatch(op: BinaryOperatorKind, arguments: Vec<ValueKind>, span: Span) -> EvaluationError {
    EvaluationError::NoSuchOverload {
        name: op.to_string(),
        arguments,
        signatures: vec![format!("bool {} bool", op)],
        span,
    }
}
