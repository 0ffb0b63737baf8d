use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::Context;
use clap::Parser;
use engine::{produce_layout, produce_layout_with_kernel};
use geom::FallbackKernel;
use plan::{FailureKind, FloorPlan, Layout, RunCfg};

/// Compute a workstation and corridor layout for a floor plan.
#[derive(Parser, Debug)]
#[command(name = "layout", version)]
struct Args {
    /// Floor plan JSON file.
    plan: PathBuf,

    /// Configuration JSON with optional `placement` and `corridor`
    /// sections; defaults apply when absent.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the placement seed from the configuration.
    #[arg(long)]
    seed: Option<u64>,

    /// Write the layout here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Check the plan and configuration, then exit without running.
    #[arg(long)]
    validate_only: bool,

    /// Run on the degraded fallback kernel (smoke testing only).
    #[arg(long)]
    degraded_kernel: bool,
}

/// Exit codes: 0 success, 1 invalid input, 2 no feasible space,
/// 3 timeout with partial result, 4 unexpected error.
fn main() -> ExitCode {
    env_logger::init();

    match run(Args::parse()) {
        Ok(code) => code,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::from(4)
        }
    }
}

fn run(args: Args) -> anyhow::Result<ExitCode> {
    // Everything up to the pipeline call is the caller's input; any
    // failure there is exit code 1.
    let loaded = load_inputs(&args);
    let (floor_plan, cfg) = match loaded {
        Ok(inputs) => inputs,
        Err(err) => {
            log::error!("{err:#}");
            return Ok(ExitCode::from(1));
        }
    };

    if args.validate_only {
        log::info!("plan and configuration are valid");
        return Ok(ExitCode::SUCCESS);
    }

    let produced = if args.degraded_kernel {
        produce_layout_with_kernel(
            &FallbackKernel::new(),
            &floor_plan,
            &cfg.placement,
            &cfg.corridor,
            None,
        )
    } else {
        produce_layout(&floor_plan, &cfg.placement, &cfg.corridor, None)
    };
    let layout = match produced {
        Ok(layout) => layout,
        // Only invalid-input class errors escape the pipeline.
        Err(err) => {
            log::error!("{err}");
            return Ok(ExitCode::from(1));
        }
    };

    emit(&layout, args.out.as_deref())?;
    for line in layout.stats.summary().lines() {
        log::info!("{line}");
    }

    if layout.stats.failure == Some(FailureKind::NoFeasibleSpace) {
        return Ok(ExitCode::from(2));
    }
    if layout.stats.timed_out() {
        return Ok(ExitCode::from(3));
    }
    Ok(ExitCode::SUCCESS)
}

fn load_inputs(args: &Args) -> anyhow::Result<(FloorPlan, RunCfg)> {
    let plan_text = fs::read_to_string(&args.plan)
        .with_context(|| format!("reading {}", args.plan.display()))?;
    let floor_plan: FloorPlan = serde_json::from_str(&plan_text)
        .with_context(|| format!("parsing {}", args.plan.display()))?;

    let mut cfg = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str::<RunCfg>(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => RunCfg::default(),
    };
    if let Some(seed) = args.seed {
        cfg.placement.seed = seed;
    }

    floor_plan.validate()?;
    cfg.placement.validate()?;
    cfg.corridor.validate()?;

    Ok((floor_plan, cfg))
}

fn emit(layout: &Layout, out: Option<&Path>) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(layout)?;
    match out {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("writing {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}
