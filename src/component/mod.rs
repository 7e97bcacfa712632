//! Built-in unit generators and their registry.
//!
//! The registry is a fixed table mapping each component name to its
//! signature (parameter types, output types, statefulness). The semantic
//! analyzer validates calls against it; the voice runtime allocates one
//! generator state per lexical call site per voice and dispatches here for
//! the per-sample computation.

pub mod envelope;
pub mod noise;
pub mod oscillator;
pub mod pitch;
pub mod sampler;

pub use envelope::{AdsrEnvelope, EnvState};
pub use noise::NoiseState;
pub use oscillator::{OscState, Waveform};
pub use sampler::{SampleCache, StereoSample};

use crate::dsl::ast::Type;
use crate::engine::error::RenderErrorKind;
use crate::engine::value::Value;

/// Signature of one built-in component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComponentSpec {
    pub name: &'static str,
    pub params: &'static [Type],
    pub outputs: &'static [Type],
    pub stateful: bool,
}

/// The fixed table of built-ins.
pub const BUILTINS: &[ComponentSpec] = &[
    ComponentSpec {
        name: "Mtof",
        params: &[Type::Int],
        outputs: &[Type::Float],
        stateful: false,
    },
    ComponentSpec {
        name: "Sine",
        params: &[Type::Float, Type::Float],
        outputs: &[Type::Audio],
        stateful: true,
    },
    ComponentSpec {
        name: "Oscil",
        params: &[Type::Float, Type::Float, Type::Int],
        outputs: &[Type::Audio],
        stateful: true,
    },
    ComponentSpec {
        name: "Adsr",
        params: &[Type::Float, Type::Float, Type::Float, Type::Float, Type::Float],
        outputs: &[Type::Float],
        stateful: true,
    },
    ComponentSpec {
        name: "Padsr",
        params: &[Type::Float, Type::Float, Type::Float, Type::Float, Type::Float],
        outputs: &[Type::Audio],
        stateful: true,
    },
    ComponentSpec {
        name: "Noise",
        params: &[Type::Float],
        outputs: &[Type::Audio],
        stateful: true,
    },
    ComponentSpec {
        name: "WavPlayer",
        params: &[Type::Str],
        outputs: &[Type::Audio, Type::Audio],
        stateful: true,
    },
];

/// Look up a built-in by name.
pub fn lookup(name: &str) -> Option<&'static ComponentSpec> {
    BUILTINS.iter().find(|spec| spec.name == name)
}

/// Persistent per-call-site generator state, owned by a voice.
#[derive(Debug, Clone)]
pub enum GenState {
    Osc(OscState),
    Env(EnvState),
    Noise(NoiseState),
    Wav(sampler::WavState),
    /// Pure components carry no state.
    Pure,
}

/// Allocate the initial state for a component. `seed` is already mixed from
/// the render seed, the voice serial, and the call-site id, so every noise
/// source is deterministic and never shared between voices.
pub fn new_state(spec: &ComponentSpec, seed: u64) -> GenState {
    match spec.name {
        "Sine" | "Oscil" => GenState::Osc(OscState::new()),
        "Adsr" | "Padsr" => GenState::Env(EnvState::new()),
        "Noise" => GenState::Noise(NoiseState::new(seed)),
        "WavPlayer" => GenState::Wav(sampler::WavState::new()),
        _ => GenState::Pure,
    }
}

/// Per-sample context handed to components.
pub struct TickCtx<'a> {
    pub sample_rate: u32,
    pub cache: &'a mut SampleCache,
}

/// Advance one component by one sample (or one call, for pure conversions).
///
/// Argument types were validated during semantic analysis, so value
/// extraction here cannot fail; only data-dependent conditions (missing WAV
/// file, invalid oscillator shape) surface as errors.
pub fn tick(
    spec: &ComponentSpec,
    state: &mut GenState,
    args: &[Value],
    ctx: &mut TickCtx<'_>,
) -> Result<Vec<Value>, RenderErrorKind> {
    let sr = ctx.sample_rate as f32;
    match (spec.name, state) {
        ("Mtof", GenState::Pure) => {
            let note = args[0].as_int();
            Ok(vec![Value::Float(pitch::midi_to_freq(note))])
        }
        ("Sine", GenState::Osc(osc)) => {
            let amps = args[0].as_f32();
            let freq = args[1].as_f32();
            Ok(vec![Value::Audio(osc.tick(Waveform::Sine, amps, freq, sr))])
        }
        ("Oscil", GenState::Osc(osc)) => {
            let amps = args[0].as_f32();
            let freq = args[1].as_f32();
            let shape = Waveform::from_tag(args[2].as_int()).ok_or_else(|| {
                RenderErrorKind::ScoreReference(format!(
                    "no oscillator shape for value {}",
                    args[2].as_int()
                ))
            })?;
            Ok(vec![Value::Audio(osc.tick(shape, amps, freq, sr))])
        }
        ("Adsr", GenState::Env(env)) => Ok(vec![Value::Float(env.tick(&adsr_args(args), sr))]),
        ("Padsr", GenState::Env(env)) => Ok(vec![Value::Audio(env.tick(&adsr_args(args), sr))]),
        ("Noise", GenState::Noise(noise)) => {
            let amps = args[0].as_f32();
            Ok(vec![Value::Audio(noise.tick(amps))])
        }
        ("WavPlayer", GenState::Wav(wav)) => {
            let path = args[0].as_str();
            let sample = ctx
                .cache
                .get_or_load(path)
                .map_err(RenderErrorKind::ScoreReference)?;
            let (left, right) = wav.tick(&sample);
            Ok(vec![Value::Audio(left), Value::Audio(right)])
        }
        (name, _) => Err(RenderErrorKind::UndefinedComponentState(name.to_string())),
    }
}

fn adsr_args(args: &[Value]) -> AdsrEnvelope {
    AdsrEnvelope {
        attack: args[0].as_f32(),
        decay: args[1].as_f32(),
        sustain: args[2].as_f32(),
        release: args[3].as_f32(),
        total: args[4].as_f32(),
    }
}
