//! Score scheduling and the sample-accurate render loop.
//!
//! Rendering is single-threaded and fully deterministic: events activate
//! in (start time, declaration order), voices mix into the bus in their
//! activation order, and every stochastic generator derives its seed from
//! the render seed. Two renders of the same program with the same
//! [`RenderConfig`] produce bit-identical output.

use crate::component::SampleCache;
use crate::dsl::ast::{FunctionDef, Literal, Program, ScoreEvent, Type};
use crate::dsl::CompiledProgram;
use crate::engine::bus::OutputBus;
use crate::engine::error::{RenderError, RenderErrorKind};
use crate::engine::value::Value;
use crate::engine::voice::{RunCtx, TraceEntry, Voice};

#[derive(Debug, Clone, Copy)]
pub struct RenderConfig {
    pub sample_rate: u32,
    pub seed: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            seed: 0,
        }
    }
}

/// The finished render: the mixed bus plus everything the program printed.
#[derive(Debug)]
pub struct RenderOutput {
    pub bus: OutputBus,
    pub trace: Vec<TraceEntry>,
}

/// Convert a time in seconds to a sample count, rounding half up.
fn secs_to_samples(secs: f32, sample_rate: u32) -> usize {
    (secs as f64 * sample_rate as f64 + 0.5).floor() as usize
}

struct ActiveVoice<'p> {
    voice: Voice<'p>,
    perf_args: Vec<Value>,
    event_index: usize,
    end: usize,
}

/// Render a compiled program.
pub fn render(
    compiled: &CompiledProgram,
    config: RenderConfig,
) -> Result<RenderOutput, RenderError> {
    let program = &compiled.program;

    // Events activate by start time; declaration order breaks ties.
    let mut order: Vec<usize> = (0..program.score.len()).collect();
    order.sort_by(|&a, &b| {
        program.score[a]
            .start
            .total_cmp(&program.score[b].start)
            .then(a.cmp(&b))
    });

    let mut spans = Vec::with_capacity(order.len());
    let mut total = 0usize;
    for &idx in &order {
        let event = &program.score[idx];
        let start = secs_to_samples(event.start, config.sample_rate);
        let len = secs_to_samples(event.duration, config.sample_rate);
        spans.push((idx, start, start + len));
        total = total.max(start + len);
    }

    let mut bus = OutputBus::new(compiled.channels, total);
    let mut trace = Vec::new();
    let mut cache = SampleCache::new();
    let mut active: Vec<ActiveVoice<'_>> = Vec::new();
    let mut next_span = 0usize;
    let mut serial = 0u64;

    for pos in 0..total {
        // Activate every event starting at this sample, in span order. A
        // voice whose span rounds to zero samples still initializes (its
        // init side effects happen) but never performs.
        while next_span < spans.len() && spans[next_span].1 <= pos {
            let (idx, _, end) = spans[next_span];
            next_span += 1;
            let voice = activate_voice(
                program, idx, end, serial, config, pos, &mut cache, &mut bus, &mut trace,
            )?;
            serial += 1;
            if end > pos {
                active.push(voice);
            }
        }

        for av in &mut active {
            let mut ctx = RunCtx {
                sample_rate: config.sample_rate,
                cache: &mut cache,
                bus: &mut bus,
                pos,
                trace: &mut trace,
            };
            av.voice
                .run_perf(&av.perf_args, &mut ctx)
                .map_err(|kind| RenderError {
                    kind,
                    event: av.event_index,
                    instrument: av.voice.instrument_name().to_string(),
                    sample: pos as u64,
                })?;
        }

        active.retain(|av| av.end > pos + 1);
    }

    // Zero-length events at the very end of the timeline are never reached
    // by the sample loop; they still initialize.
    while next_span < spans.len() {
        let (idx, start, end) = spans[next_span];
        next_span += 1;
        activate_voice(
            program, idx, end, serial, config, start, &mut cache, &mut bus, &mut trace,
        )?;
        serial += 1;
    }

    Ok(RenderOutput { bus, trace })
}

/// Instantiate the voice for one score event and run its init function.
#[allow(clippy::too_many_arguments)]
fn activate_voice<'p>(
    program: &'p Program,
    idx: usize,
    end: usize,
    serial: u64,
    config: RenderConfig,
    pos: usize,
    cache: &mut SampleCache,
    bus: &mut OutputBus,
    trace: &mut Vec<TraceEntry>,
) -> Result<ActiveVoice<'p>, RenderError> {
    let event = &program.score[idx];
    let instrument = program
        .instruments
        .iter()
        .find(|i| i.name == event.instrument)
        .ok_or_else(|| RenderError {
            kind: RenderErrorKind::ScoreReference(format!(
                "no instrument named '{}'",
                event.instrument
            )),
            event: idx,
            instrument: event.instrument.clone(),
            sample: pos as u64,
        })?;

    let mut voice = Voice::new(instrument, serial, config.seed);
    let init_args = event_args(&event.init_args, instrument.init.as_ref());
    let perf_args = event_args(&event.perf_args, instrument.perf.as_ref());

    let mut ctx = RunCtx {
        sample_rate: config.sample_rate,
        cache,
        bus,
        pos,
        trace,
    };
    voice
        .run_init(&init_args, &mut ctx)
        .map_err(|kind| RenderError {
            kind,
            event: idx,
            instrument: event.instrument.clone(),
            sample: pos as u64,
        })?;

    Ok(ActiveVoice {
        voice,
        perf_args,
        event_index: idx,
        end,
    })
}

/// Turn score literals into runtime values, widening `Int` arguments bound
/// to `Float` parameters the way the type checker allowed.
fn event_args(args: &[crate::dsl::ast::ScoreArg], func: Option<&FunctionDef>) -> Vec<Value> {
    let params = func.map(|f| f.params.as_slice()).unwrap_or(&[]);
    args.iter()
        .enumerate()
        .map(|(i, arg)| {
            let value = Value::from(&arg.value);
            match (params.get(i).map(|p| p.ty), &arg.value) {
                (Some(Type::Float), Literal::Int(v)) => Value::Float(*v as f32),
                _ => value,
            }
        })
        .collect()
}

/// Duration of a score event in samples at the given rate. Exposed so the
/// CLI can report the render length before writing the file.
pub fn render_length(score: &[ScoreEvent], sample_rate: u32) -> usize {
    score
        .iter()
        .map(|e| secs_to_samples(e.start, sample_rate) + secs_to_samples(e.duration, sample_rate))
        .max()
        .unwrap_or(0)
}
