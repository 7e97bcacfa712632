use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use cadenza::dsl;
use cadenza::engine::{self, scheduler, RenderConfig};
use cadenza::wav;

/// Compile a score file and render it to a WAV file.
#[derive(Parser)]
#[command(name = "cadenza", version)]
struct Cli {
    /// Source file to compile and render.
    input: PathBuf,

    /// Output WAV path.
    #[arg(short, long, default_value = "out.wav")]
    output: PathBuf,

    /// Render sample rate in Hz.
    #[arg(long, default_value_t = 44100)]
    sample_rate: u32,

    /// Seed for stochastic generators; renders with the same seed are
    /// bit-identical.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Echo the program's print/println trace after rendering.
    #[arg(long)]
    trace: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let source = match fs::read_to_string(&cli.input) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("error: cannot read {}: {e}", cli.input.display());
            return ExitCode::FAILURE;
        }
    };

    let compiled = match dsl::compile(&source) {
        Ok(compiled) => compiled,
        Err(errors) => {
            for error in &errors {
                eprintln!("{error}");
            }
            eprintln!(
                "error: {} could not be compiled ({} error(s))",
                cli.input.display(),
                errors.len()
            );
            return ExitCode::FAILURE;
        }
    };

    if scheduler::render_length(&compiled.program.score, cli.sample_rate) == 0 {
        eprintln!("warning: score is empty; nothing to render");
        return ExitCode::SUCCESS;
    }

    let config = RenderConfig {
        sample_rate: cli.sample_rate,
        seed: cli.seed,
    };
    let out = match engine::render(&compiled, config) {
        Ok(out) => out,
        Err(e) => {
            eprintln!("render error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if cli.trace {
        for entry in &out.trace {
            if entry.newline {
                println!("{}", entry.text);
            } else {
                print!("{}", entry.text);
            }
        }
    }

    if let Err(e) = wav::write_wav(&cli.output, &out.bus, cli.sample_rate) {
        eprintln!("error: cannot write {}: {e}", cli.output.display());
        return ExitCode::FAILURE;
    }

    println!(
        "wrote {} ({} samples, {} channel(s), {} Hz)",
        cli.output.display(),
        out.bus.len(),
        out.bus.channel_count(),
        cli.sample_rate
    );
    ExitCode::SUCCESS
}
