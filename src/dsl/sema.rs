//! Semantic analysis: name resolution, type checking, component signature
//! validation, and rate inference.
//!
//! The analyzer runs after parsing and annotates every expression with its
//! [`Rate`] in place. Unlike the parser it does not stop at the first
//! problem; it collects every semantic error it can find so a program
//! reports them all in one compile.

use std::collections::HashMap;

use super::ast::*;
use super::error::{CompileError, SemanticErrorKind};
use crate::component;

/// Facts derived from a valid program that the engine needs up front.
#[derive(Debug, Clone, Copy)]
pub struct Analysis {
    /// Output channel count: the widest `output` call in any perf function.
    pub channels: usize,
}

pub fn analyze(program: &mut Program) -> Result<Analysis, Vec<CompileError>> {
    let mut analyzer = Analyzer {
        errors: Vec::new(),
        channels: 1,
    };
    analyzer.run(program);
    if analyzer.errors.is_empty() {
        Ok(Analysis {
            channels: analyzer.channels,
        })
    } else {
        Err(analyzer.errors)
    }
}

struct Analyzer {
    errors: Vec<CompileError>,
    channels: usize,
}

/// Whether a value of type `from` may bind to a slot of type `to`.
/// Integers widen to floats; scalar numbers may feed audio slots.
fn assignable(from: Type, to: Type) -> bool {
    from == to
        || matches!(
            (from, to),
            (Type::Int, Type::Float) | (Type::Int, Type::Audio) | (Type::Float, Type::Audio)
        )
}

impl Analyzer {
    fn run(&mut self, program: &mut Program) {
        let mut seen: HashMap<String, (usize, usize)> = HashMap::new();
        for def in &program.instruments {
            if seen.insert(def.name.clone(), (def.line, def.col)).is_some() {
                self.error(
                    SemanticErrorKind::DuplicateDeclaration,
                    format!("instrument '{}' is declared twice", def.name),
                    def.line,
                    def.col,
                );
            }
        }

        for def in &mut program.instruments {
            self.check_instrument(def);
        }

        // Score events reference instruments by name; build the lookup from
        // the now-checked definitions.
        let instruments: HashMap<&str, &InstrumentDef> = program
            .instruments
            .iter()
            .map(|def| (def.name.as_str(), def))
            .collect();
        for event in &program.score {
            self.check_score_event(event, &instruments);
        }
    }

    fn error(
        &mut self,
        kind: SemanticErrorKind,
        message: impl Into<String>,
        line: usize,
        col: usize,
    ) {
        self.errors
            .push(CompileError::semantic(kind, message, line, col));
    }

    // ---- instruments ----------------------------------------------------

    fn check_instrument(&mut self, def: &mut InstrumentDef) {
        let mut members: HashMap<String, Type> = HashMap::new();
        for member in &def.members {
            if members.insert(member.name.clone(), member.ty).is_some() {
                self.error(
                    SemanticErrorKind::DuplicateDeclaration,
                    format!(
                        "member '{}' is declared twice in instrument '{}'",
                        member.name, def.name
                    ),
                    member.line,
                    member.col,
                );
            }
        }

        if let Some(init) = &mut def.init {
            self.check_function(init, &members, false);
        }
        if let Some(perf) = &mut def.perf {
            self.check_function(perf, &members, true);
        }
    }

    fn check_function(
        &mut self,
        func: &mut FunctionDef,
        members: &HashMap<String, Type>,
        output_allowed: bool,
    ) {
        // Parameters and locals share one scope that shadows members.
        let mut scope: HashMap<String, Type> = HashMap::new();
        for param in &func.params {
            if scope.insert(param.name.clone(), param.ty).is_some() {
                self.error(
                    SemanticErrorKind::DuplicateDeclaration,
                    format!("parameter '{}' is declared twice", param.name),
                    param.line,
                    param.col,
                );
            }
        }

        for stmt in &mut func.body {
            self.check_stmt(stmt, &mut scope, members, output_allowed);
        }
    }

    fn check_stmt(
        &mut self,
        stmt: &mut Stmt,
        scope: &mut HashMap<String, Type>,
        members: &HashMap<String, Type>,
        output_allowed: bool,
    ) {
        match stmt {
            Stmt::Local {
                names,
                ty,
                init,
                line,
                col,
            } => {
                if names.len() > 1 {
                    self.check_multi_binding(names, *ty, init, scope, members, *line, *col);
                } else if let Some(from) = self.infer_expr(init, scope, members) {
                    if !assignable(from, *ty) {
                        self.error(
                            SemanticErrorKind::TypeMismatch,
                            format!("cannot initialize {} local '{}' from {}", ty, names[0], from),
                            init.line,
                            init.col,
                        );
                    }
                }
                for name in names.iter() {
                    if scope.insert(name.clone(), *ty).is_some() {
                        self.error(
                            SemanticErrorKind::DuplicateDeclaration,
                            format!("'{name}' is already declared in this function"),
                            *line,
                            *col,
                        );
                    }
                }
            }
            Stmt::Assign {
                name,
                value,
                line,
                col,
            } => {
                let target = scope.get(name).or_else(|| members.get(name)).copied();
                let from = self.infer_expr(value, scope, members);
                match (target, from) {
                    (None, _) => self.error(
                        SemanticErrorKind::UndeclaredIdentifier,
                        format!("assignment to undeclared identifier '{name}'"),
                        *line,
                        *col,
                    ),
                    (Some(to), Some(from)) if !assignable(from, to) => self.error(
                        SemanticErrorKind::TypeMismatch,
                        format!("cannot assign {from} to {to} variable '{name}'"),
                        value.line,
                        value.col,
                    ),
                    _ => {}
                }
            }
            Stmt::Print { arg, .. } => {
                if let Some(expr) = arg {
                    self.infer_expr(expr, scope, members);
                }
            }
            Stmt::Output { args, line, col } => {
                if !output_allowed {
                    self.error(
                        SemanticErrorKind::InvalidOutputInInit,
                        "output is only valid inside perf",
                        *line,
                        *col,
                    );
                }
                for arg in args.iter_mut() {
                    if let Some(ty) = self.infer_expr(arg, scope, members) {
                        if ty == Type::Str {
                            self.error(
                                SemanticErrorKind::TypeMismatch,
                                "output arguments must be numeric",
                                arg.line,
                                arg.col,
                            );
                        }
                    }
                }
                if output_allowed {
                    self.channels = self.channels.max(args.len());
                }
            }
            Stmt::Expr(expr) => {
                // Discarded value; multi-output calls are fine here.
                self.infer_call_outputs(expr, scope, members);
            }
        }
    }

    fn check_multi_binding(
        &mut self,
        names: &[String],
        ty: Type,
        init: &mut Expr,
        scope: &mut HashMap<String, Type>,
        members: &HashMap<String, Type>,
        line: usize,
        col: usize,
    ) {
        let ExprKind::Call { .. } = init.kind else {
            self.error(
                SemanticErrorKind::ArityMismatch,
                format!(
                    "cannot bind {} names to a single value; only component \
                     calls produce multiple values",
                    names.len()
                ),
                line,
                col,
            );
            return;
        };
        let Some(outputs) = self.infer_call_outputs(init, scope, members) else {
            return;
        };
        if outputs.len() != names.len() {
            self.error(
                SemanticErrorKind::ArityMismatch,
                format!(
                    "component produces {} value(s) but {} names are bound",
                    outputs.len(),
                    names.len()
                ),
                line,
                col,
            );
            return;
        }
        for (name, out) in names.iter().zip(outputs) {
            if !assignable(out, ty) {
                self.error(
                    SemanticErrorKind::TypeMismatch,
                    format!("cannot initialize {ty} local '{name}' from {out}"),
                    init.line,
                    init.col,
                );
            }
        }
    }

    // ---- expressions ----------------------------------------------------

    /// Infer the type of a single-valued expression, annotating rates along
    /// the way. Returns `None` when an error was recorded, so callers skip
    /// follow-on checks instead of cascading.
    fn infer_expr(
        &mut self,
        expr: &mut Expr,
        scope: &HashMap<String, Type>,
        members: &HashMap<String, Type>,
    ) -> Option<Type> {
        let ty = match &mut expr.kind {
            ExprKind::Int(_) => Type::Int,
            ExprKind::Float(_) => Type::Float,
            ExprKind::Str(_) => Type::Str,
            ExprKind::Var(name) => match scope.get(name).or_else(|| members.get(name)) {
                Some(ty) => *ty,
                None => {
                    let (line, col, name) = (expr.line, expr.col, name.clone());
                    self.error(
                        SemanticErrorKind::UndeclaredIdentifier,
                        format!("undeclared identifier '{name}'"),
                        line,
                        col,
                    );
                    return None;
                }
            },
            ExprKind::Binary { lhs, rhs, op } => {
                let op = *op;
                let lt = self.infer_expr(lhs, scope, members);
                let rt = self.infer_expr(rhs, scope, members);
                let (lt, rt) = (lt?, rt?);
                if lt == Type::Str || rt == Type::Str {
                    let (line, col) = (expr.line, expr.col);
                    self.error(
                        SemanticErrorKind::TypeMismatch,
                        format!("operator '{op}' requires numeric operands, got {lt} and {rt}"),
                        line,
                        col,
                    );
                    return None;
                }
                if lt == Type::Audio || rt == Type::Audio {
                    Type::Audio
                } else if lt == Type::Float || rt == Type::Float {
                    Type::Float
                } else {
                    Type::Int
                }
            }
            ExprKind::Call { .. } => {
                let outputs = self.infer_call_outputs(expr, scope, members)?;
                if outputs.len() != 1 {
                    let (line, col) = (expr.line, expr.col);
                    self.error(
                        SemanticErrorKind::ArityMismatch,
                        format!(
                            "component produces {} values in a single-value context",
                            outputs.len()
                        ),
                        line,
                        col,
                    );
                    return None;
                }
                outputs[0]
            }
        };
        expr.rate = if ty == Type::Audio {
            Rate::Audio
        } else {
            Rate::Control
        };
        Some(ty)
    }

    /// Validate a component call and return its output types. Non-call
    /// expressions are inferred as a single value.
    fn infer_call_outputs(
        &mut self,
        expr: &mut Expr,
        scope: &HashMap<String, Type>,
        members: &HashMap<String, Type>,
    ) -> Option<Vec<Type>> {
        let (line, col) = (expr.line, expr.col);
        let ExprKind::Call { name, args, .. } = &mut expr.kind else {
            return self.infer_expr(expr, scope, members).map(|ty| vec![ty]);
        };

        let Some(spec) = component::lookup(name) else {
            let name = name.clone();
            self.error(
                SemanticErrorKind::UnknownComponent,
                format!("unknown component '{name}'"),
                line,
                col,
            );
            return None;
        };

        if args.len() != spec.params.len() {
            self.error(
                SemanticErrorKind::ArityMismatch,
                format!(
                    "'{}' takes {} argument(s), got {}",
                    spec.name,
                    spec.params.len(),
                    args.len()
                ),
                line,
                col,
            );
            return None;
        }

        let mut ok = true;
        let mut arg_types = Vec::with_capacity(args.len());
        for arg in args.iter_mut() {
            arg_types.push(self.infer_expr(arg, scope, members));
        }
        let spec_name = spec.name;
        for (i, (arg_ty, want)) in arg_types.iter().zip(spec.params).enumerate() {
            let Some(arg_ty) = arg_ty else {
                ok = false;
                continue;
            };
            if !assignable(*arg_ty, *want) {
                let ExprKind::Call { args, .. } = &expr.kind else {
                    unreachable!()
                };
                self.error(
                    SemanticErrorKind::TypeMismatch,
                    format!(
                        "argument {} of '{}' expects {}, got {}",
                        i + 1,
                        spec_name,
                        want,
                        arg_ty
                    ),
                    args[i].line,
                    args[i].col,
                );
                ok = false;
            }
        }
        if !ok {
            return None;
        }

        expr.rate = if spec.outputs.contains(&Type::Audio) {
            Rate::Audio
        } else {
            Rate::Control
        };
        Some(spec.outputs.to_vec())
    }

    // ---- score ----------------------------------------------------------

    fn check_score_event(
        &mut self,
        event: &ScoreEvent,
        instruments: &HashMap<&str, &InstrumentDef>,
    ) {
        let Some(def) = instruments.get(event.instrument.as_str()) else {
            self.error(
                SemanticErrorKind::UndeclaredInstrument,
                format!("score references undeclared instrument '{}'", event.instrument),
                event.line,
                event.col,
            );
            return;
        };

        self.check_event_args("init", &event.init_args, def.init.as_ref(), event);
        self.check_event_args("perf", &event.perf_args, def.perf.as_ref(), event);
    }

    fn check_event_args(
        &mut self,
        which: &str,
        args: &[ScoreArg],
        func: Option<&FunctionDef>,
        event: &ScoreEvent,
    ) {
        let params = func.map(|f| f.params.as_slice()).unwrap_or(&[]);
        if args.len() != params.len() {
            self.error(
                SemanticErrorKind::ArityMismatch,
                format!(
                    "{} of '{}' takes {} argument(s), got {}",
                    which,
                    event.instrument,
                    params.len(),
                    args.len()
                ),
                event.line,
                event.col,
            );
            return;
        }
        for (arg, param) in args.iter().zip(params) {
            if !assignable(arg.value.ty(), param.ty) {
                self.error(
                    SemanticErrorKind::TypeMismatch,
                    format!(
                        "{} argument '{}' of '{}' expects {}, got {}",
                        which,
                        param.name,
                        event.instrument,
                        param.ty,
                        arg.value.ty()
                    ),
                    arg.line,
                    arg.col,
                );
            }
        }
    }
}
