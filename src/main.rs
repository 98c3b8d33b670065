//! tiny86-emu: run a tiny86 program image

use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use log::LevelFilter;

use tiny86_emu::{
    Config, CoreInterpreter, ExecutionContext, MemoryPolicy, ProgramImage, StreamConsole,
};

#[derive(Parser, Debug)]
#[command(name = "tiny86-emu")]
#[command(about = "Emulator for tiny86 program images", long_about = None)]
struct Args {
    /// Program image: little-endian 4-byte instruction words
    program: PathBuf,

    /// Print the decoded instruction fields before running
    #[arg(long, action = ArgAction::SetTrue)]
    dump: bool,

    /// Log every executed instruction to stderr
    #[arg(long, action = ArgAction::SetTrue)]
    trace: bool,

    /// Stack memory size in bytes (overrides config)
    #[arg(long)]
    stack_size: Option<usize>,

    /// Abort after this many instructions (overrides config)
    #[arg(long)]
    max_steps: Option<u64>,

    /// Read 0 and drop stores on out-of-range stack accesses instead of faulting
    #[arg(long, action = ArgAction::SetTrue)]
    lenient_memory: bool,
}

fn main() -> Result<()> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.use_stderr() => {
            // Usage errors share the exit status of every other load failure
            let _ = e.print();
            process::exit(1);
        }
        Err(e) => e.exit(),
    };

    init_logging(args.trace);

    let config = resolve_config(&args)?;

    let image = ProgramImage::from_file(&args.program)?;
    let program = image.decode()?;

    if args.dump {
        print!("{}", program.listing());
    }

    let mut ctx = ExecutionContext::new(config.stack_size(), config.memory_policy());
    let mut interpreter = CoreInterpreter::default().with_step_limit(config.max_steps());

    let stdin = io::stdin();
    let mut console = StreamConsole::new(stdin.lock(), BufWriter::new(io::stdout().lock()));

    let result = interpreter.run(&program, &mut ctx, &mut console);
    // Output printed before a fault is still delivered
    console.flush().context("failed to flush output")?;

    let outcome = result.with_context(|| format!("execution aborted at pc 0x{:04x}", ctx.pc()))?;
    log::info!("{} after {} instructions", outcome, ctx.instructions);

    Ok(())
}

/// Initialize logging: `RUST_LOG` if set, otherwise warnings only.
fn init_logging(trace: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if trace {
        builder.filter_module("tiny86_emu", LevelFilter::Trace);
    }
    builder.init();
}

/// Config files and environment, then command-line overrides.
fn resolve_config(args: &Args) -> Result<Config> {
    let mut config = Config::load();
    config.merge(Config {
        stack_size: args.stack_size,
        max_steps: args.max_steps,
        memory_policy: args.lenient_memory.then_some(MemoryPolicy::Lenient),
    });
    config.validate().context("invalid configuration")?;
    Ok(config)
}
