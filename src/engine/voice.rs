//! A voice is one live instantiation of an instrument, created per score
//! event. It owns the instrument's member variables and the persistent
//! generator state for every component call site, and evaluates the init
//! and perf bodies by walking the AST.

use std::collections::HashMap;

use crate::component::{self, GenState, SampleCache, TickCtx};
use crate::dsl::ast::{CallSiteId, Expr, ExprKind, FunctionDef, InstrumentDef, Stmt};
use crate::engine::bus::OutputBus;
use crate::engine::error::RenderErrorKind;
use crate::engine::value::Value;

/// One `print`/`println` emission, captured in program order.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEntry {
    pub text: String,
    pub newline: bool,
}

/// Mutable render-wide context threaded through every evaluation.
pub struct RunCtx<'a> {
    pub sample_rate: u32,
    pub cache: &'a mut SampleCache,
    pub bus: &'a mut OutputBus,
    /// Absolute sample position of the current perf invocation.
    pub pos: usize,
    pub trace: &'a mut Vec<TraceEntry>,
}

pub struct Voice<'p> {
    instrument: &'p InstrumentDef,
    members: HashMap<String, Value>,
    states: HashMap<CallSiteId, GenState>,
    /// Mixed from the render seed and the voice serial; call-site ids are
    /// folded in when a generator is first allocated.
    seed_base: u64,
}

impl<'p> Voice<'p> {
    /// `serial` is the voice's position in the event activation order. It
    /// keeps stochastic generators decorrelated across voices while the
    /// whole render stays a pure function of the seed.
    pub fn new(instrument: &'p InstrumentDef, serial: u64, seed: u64) -> Self {
        let members = instrument
            .members
            .iter()
            .map(|m| {
                let zero = match m.ty {
                    crate::dsl::ast::Type::Int => Value::Int(0),
                    crate::dsl::ast::Type::Float => Value::Float(0.0),
                    crate::dsl::ast::Type::Str => Value::Str(String::new()),
                    crate::dsl::ast::Type::Audio => Value::Audio(0.0),
                };
                (m.name.clone(), zero)
            })
            .collect();
        Self {
            instrument,
            members,
            states: HashMap::new(),
            seed_base: seed.wrapping_add(serial.wrapping_mul(0x100000001B3)),
        }
    }

    pub fn instrument_name(&self) -> &str {
        &self.instrument.name
    }

    /// Run the init function once with the event's init arguments.
    pub fn run_init(&mut self, args: &[Value], ctx: &mut RunCtx<'_>) -> Result<(), RenderErrorKind> {
        if let Some(init) = &self.instrument.init {
            self.run_function(init, args, ctx)?;
        }
        Ok(())
    }

    /// Run the perf function for one output sample.
    pub fn run_perf(&mut self, args: &[Value], ctx: &mut RunCtx<'_>) -> Result<(), RenderErrorKind> {
        if let Some(perf) = &self.instrument.perf {
            self.run_function(perf, args, ctx)?;
        }
        Ok(())
    }

    fn run_function(
        &mut self,
        func: &'p FunctionDef,
        args: &[Value],
        ctx: &mut RunCtx<'_>,
    ) -> Result<(), RenderErrorKind> {
        // Parameters and locals live in a per-invocation scope that shadows
        // members. Assignments write through to whichever scope declared
        // the name.
        let mut locals: HashMap<&'p str, Value> = HashMap::new();
        for (param, value) in func.params.iter().zip(args) {
            locals.insert(param.name.as_str(), value.clone());
        }
        for stmt in &func.body {
            self.exec_stmt(stmt, &mut locals, ctx)?;
        }
        Ok(())
    }

    fn exec_stmt(
        &mut self,
        stmt: &'p Stmt,
        locals: &mut HashMap<&'p str, Value>,
        ctx: &mut RunCtx<'_>,
    ) -> Result<(), RenderErrorKind> {
        match stmt {
            Stmt::Local {
                names, ty, init, ..
            } => {
                // Bindings take the declared type, so an Int initializer in
                // a Float slot widens here rather than leaking integer
                // semantics into later arithmetic.
                if names.len() == 1 {
                    let value = self.eval_expr(init, locals, ctx)?.coerce(*ty);
                    locals.insert(names[0].as_str(), value);
                } else {
                    // Multi-binding locals take all outputs of one call.
                    let values = self.eval_multi(init, locals, ctx)?;
                    for (name, value) in names.iter().zip(values) {
                        locals.insert(name.as_str(), value.coerce(*ty));
                    }
                }
                Ok(())
            }
            Stmt::Assign { name, value, .. } => {
                let value = self.eval_expr(value, locals, ctx)?;
                if let Some(slot) = locals.get_mut(name.as_str()) {
                    *slot = value.coerce(slot.ty());
                } else if let Some(slot) = self.members.get_mut(name) {
                    *slot = value.coerce(slot.ty());
                }
                Ok(())
            }
            Stmt::Print { arg, newline, .. } => {
                let text = match arg {
                    Some(expr) => self.eval_expr(expr, locals, ctx)?.to_string(),
                    None => String::new(),
                };
                ctx.trace.push(TraceEntry {
                    text,
                    newline: *newline,
                });
                Ok(())
            }
            Stmt::Output { args, .. } => {
                for (channel, expr) in args.iter().enumerate() {
                    let value = self.eval_expr(expr, locals, ctx)?;
                    ctx.bus.add(channel, ctx.pos, value.as_sample());
                }
                Ok(())
            }
            Stmt::Expr(expr) => {
                self.eval_multi(expr, locals, ctx)?;
                Ok(())
            }
        }
    }

    fn eval_expr(
        &mut self,
        expr: &Expr,
        locals: &HashMap<&'p str, Value>,
        ctx: &mut RunCtx<'_>,
    ) -> Result<Value, RenderErrorKind> {
        match &expr.kind {
            ExprKind::Int(v) => Ok(Value::Int(*v)),
            ExprKind::Float(v) => Ok(Value::Float(*v)),
            ExprKind::Str(s) => Ok(Value::Str(s.clone())),
            ExprKind::Var(name) => Ok(self.read_var(name, locals)),
            ExprKind::Binary { op, lhs, rhs } => {
                let l = self.eval_expr(lhs, locals, ctx)?;
                let r = self.eval_expr(rhs, locals, ctx)?;
                Value::apply(*op, &l, &r)
            }
            ExprKind::Call { .. } => {
                let mut outputs = self.eval_multi(expr, locals, ctx)?;
                Ok(outputs.swap_remove(0))
            }
        }
    }

    /// Evaluate an expression that may yield several values. Only component
    /// calls can; everything else yields exactly one.
    fn eval_multi(
        &mut self,
        expr: &Expr,
        locals: &HashMap<&'p str, Value>,
        ctx: &mut RunCtx<'_>,
    ) -> Result<Vec<Value>, RenderErrorKind> {
        let ExprKind::Call { name, args, site } = &expr.kind else {
            return Ok(vec![self.eval_expr(expr, locals, ctx)?]);
        };
        let spec = component::lookup(name)
            .ok_or_else(|| RenderErrorKind::UndefinedComponentState(name.clone()))?;
        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.eval_expr(arg, locals, ctx)?);
        }
        let seed = self
            .seed_base
            .wrapping_mul(0x9E3779B97F4A7C15)
            .wrapping_add(site.0 as u64);
        let state = self
            .states
            .entry(*site)
            .or_insert_with(|| component::new_state(spec, seed));
        let mut tick_ctx = TickCtx {
            sample_rate: ctx.sample_rate,
            cache: ctx.cache,
        };
        component::tick(spec, state, &arg_values, &mut tick_ctx)
    }

    fn read_var(&self, name: &str, locals: &HashMap<&'p str, Value>) -> Value {
        if let Some(v) = locals.get(name) {
            return v.clone();
        }
        // Name resolution already ran; an unknown name cannot reach here.
        self.members
            .get(name)
            .cloned()
            .unwrap_or(Value::Float(0.0))
    }

    #[cfg(test)]
    pub fn member(&self, name: &str) -> Option<&Value> {
        self.members.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl;

    fn compile(src: &str) -> dsl::CompiledProgram {
        dsl::compile(src).expect("program should compile")
    }

    fn run_one_voice(
        src: &str,
        init_args: &[Value],
        perf_args: &[Value],
        samples: usize,
    ) -> (OutputBus, Vec<TraceEntry>) {
        let compiled = compile(src);
        let inst = &compiled.program.instruments[0];
        let mut voice = Voice::new(inst, 0, 1);
        let mut cache = SampleCache::new();
        let mut bus = OutputBus::new(compiled.channels, samples);
        let mut trace = Vec::new();
        {
            let mut ctx = RunCtx {
                sample_rate: 48000,
                cache: &mut cache,
                bus: &mut bus,
                pos: 0,
                trace: &mut trace,
            };
            voice.run_init(init_args, &mut ctx).unwrap();
        }
        for pos in 0..samples {
            let mut ctx = RunCtx {
                sample_rate: 48000,
                cache: &mut cache,
                bus: &mut bus,
                pos,
                trace: &mut trace,
            };
            voice.run_perf(perf_args, &mut ctx).unwrap();
        }
        (bus, trace)
    }

    #[test]
    fn member_persists_across_invocations() {
        let src = r#"
            instruments {
                Counter {
                    n: Int;
                    init() { n = 0; }
                    perf() {
                        n = n + 1;
                        output(n * 0.0);
                    }
                }
            }
            score { Counter(0 1.0 init() perf()); }
        "#;
        let compiled = compile(src);
        let inst = &compiled.program.instruments[0];
        let mut voice = Voice::new(inst, 0, 1);
        let mut cache = SampleCache::new();
        let mut bus = OutputBus::new(1, 4);
        let mut trace = Vec::new();
        for pos in 0..4 {
            let mut ctx = RunCtx {
                sample_rate: 48000,
                cache: &mut cache,
                bus: &mut bus,
                pos,
                trace: &mut trace,
            };
            voice.run_perf(&[], &mut ctx).unwrap();
        }
        assert_eq!(voice.member("n"), Some(&Value::Int(4)));
    }

    #[test]
    fn init_binds_params_to_members() {
        let src = r#"
            instruments {
                Tone {
                    freq: Float;
                    init(f: Float) { freq = f; }
                    perf() { output(freq * 0.0); }
                }
            }
            score { Tone(0 1.0 init(220.0) perf()); }
        "#;
        let compiled = compile(src);
        let inst = &compiled.program.instruments[0];
        let mut voice = Voice::new(inst, 0, 1);
        let mut cache = SampleCache::new();
        let mut bus = OutputBus::new(1, 1);
        let mut trace = Vec::new();
        let mut ctx = RunCtx {
            sample_rate: 48000,
            cache: &mut cache,
            bus: &mut bus,
            pos: 0,
            trace: &mut trace,
        };
        voice.run_init(&[Value::Float(220.0)], &mut ctx).unwrap();
        assert_eq!(voice.member("freq"), Some(&Value::Float(220.0)));
    }

    #[test]
    fn output_accumulates_per_channel() {
        let src = r#"
            instruments {
                Dc {
                    init() {}
                    perf() { output(0.25, 0.5); }
                }
            }
            score { Dc(0 1.0 init() perf()); }
        "#;
        let (bus, _) = run_one_voice(src, &[], &[], 3);
        assert_eq!(bus.channel(0), &[0.25, 0.25, 0.25]);
        assert_eq!(bus.channel(1), &[0.5, 0.5, 0.5]);
    }

    #[test]
    fn locals_reset_every_invocation() {
        // If `x` leaked between perf calls the accumulated value would grow.
        let src = r#"
            instruments {
                Fresh {
                    init() {}
                    perf() {
                        local x: Float = 0.1;
                        x = x + 0.1;
                        output(x);
                    }
                }
            }
            score { Fresh(0 1.0 init() perf()); }
        "#;
        let (bus, _) = run_one_voice(src, &[], &[], 2);
        assert!((bus.channel(0)[0] - 0.2).abs() < 1e-6);
        assert!((bus.channel(0)[1] - 0.2).abs() < 1e-6);
    }

    #[test]
    fn print_captures_trace() {
        let src = r#"
            instruments {
                Talky {
                    init() { println("hello"); }
                    perf() { output(0.0); }
                }
            }
            score { Talky(0 1.0 init() perf()); }
        "#;
        let (_, trace) = run_one_voice(src, &[], &[], 1);
        assert_eq!(
            trace,
            vec![TraceEntry {
                text: "hello".to_string(),
                newline: true,
            }]
        );
    }

    #[test]
    fn call_site_state_persists() {
        // A 480 Hz sine at 48 kHz has a 100-sample period. The phase
        // accumulator must carry across perf invocations for the waveform
        // to progress, so sample 25 sits at the positive peak.
        let src = r#"
            instruments {
                Tone {
                    init() {}
                    perf() { output(Sine(1.0, 480.0)); }
                }
            }
            score { Tone(0 1.0 init() perf()); }
        "#;
        let (bus, _) = run_one_voice(src, &[], &[], 26);
        assert!(bus.channel(0)[0].abs() < 1e-6);
        assert!((bus.channel(0)[25] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn two_call_sites_have_independent_state() {
        let src = r#"
            instruments {
                Pair {
                    init() {}
                    perf() {
                        output(Sine(1.0, 480.0) - Sine(1.0, 480.0));
                    }
                }
            }
            score { Pair(0 1.0 init() perf()); }
        "#;
        // Identical but independent oscillators cancel exactly.
        let (bus, _) = run_one_voice(src, &[], &[], 64);
        assert!(bus.channel(0).iter().all(|s| s.abs() < 1e-6));
    }

    #[test]
    fn multi_binding_local_takes_all_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 48000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for s in [0.25f32, -0.25, 0.5, -0.5] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let src = format!(
            r#"
            instruments {{
                Player {{
                    init() {{}}
                    perf() {{
                        local l, r: Audio = WavPlayer("{}");
                        output(l, r);
                    }}
                }}
            }}
            score {{ Player(0 1.0 init() perf()); }}
        "#,
            path.to_str().unwrap()
        );
        let (bus, _) = run_one_voice(&src, &[], &[], 3);
        assert!((bus.channel(0)[0] - 0.25).abs() < 1e-6);
        assert!((bus.channel(1)[0] + 0.25).abs() < 1e-6);
        assert!((bus.channel(0)[1] - 0.5).abs() < 1e-6);
        // Past the end of the clip the player is silent.
        assert_eq!(bus.channel(0)[2], 0.0);
    }

    #[test]
    fn division_by_zero_aborts() {
        let src = r#"
            instruments {
                Bad {
                    init() {}
                    perf() { output(1.0 / 0.0); }
                }
            }
            score { Bad(0 1.0 init() perf()); }
        "#;
        let compiled = compile(src);
        let inst = &compiled.program.instruments[0];
        let mut voice = Voice::new(inst, 0, 1);
        let mut cache = SampleCache::new();
        let mut bus = OutputBus::new(1, 1);
        let mut trace = Vec::new();
        let mut ctx = RunCtx {
            sample_rate: 48000,
            cache: &mut cache,
            bus: &mut bus,
            pos: 0,
            trace: &mut trace,
        };
        assert_eq!(
            voice.run_perf(&[], &mut ctx),
            Err(RenderErrorKind::DivisionByZero)
        );
    }
}
