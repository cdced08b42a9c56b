use rms_repair_pipeline::clock::SystemClock;
use rms_repair_pipeline::config::RunConfig;
use rms_repair_pipeline::input;
use rms_repair_pipeline::pipeline::{self, TerminalStatus};

mod args;
mod process_verifier;

use args::{Args, Command, RunArgs};
use process_verifier::ProcessVerifier;

fn main() {
    let args = match <Args as clap::Parser>::try_parse() {
        Ok(args) => args,
        Err(err) => {
            use clap::error::ErrorKind::*;
            let exit_code = match err.kind() {
                DisplayHelp | DisplayHelpOnMissingArgumentOrSubcommand | DisplayVersion => 0,
                _ => 2,
            };
            err.print().unwrap();
            std::process::exit(exit_code);
        }
    };

    let Command::Run(run_args) = args.command;

    if !run_args.quiet {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    }

    std::process::exit(run(run_args));
}

fn run(args: RunArgs) -> i32 {
    let config = RunConfig {
        strict_priority: args.strict,
        allow_unschedulable: args.allow_unschedulable,
        use_shared_scheduler: args.use_shared_scheduler,
        allow_multitask_properties: args.allow_multitask_properties,
        max_repair_iterations: args.max_iterations,
        verifier_timeout: std::time::Duration::from_secs(args.verifier_timeout_secs),
        auto_default: args.auto_default,
    };

    let taskset = match input::parse_file_with(&args.taskset_file, args.format, &config) {
        Ok(taskset) => taskset,
        Err(err) => {
            eprintln!("input error: {err}");
            return 1;
        }
    };

    let clock = SystemClock;
    let verifier = ProcessVerifier { command: "verifyta".to_string() };

    tracing::info!(tasks = taskset.len(), "starting pipeline run");

    let outcome = pipeline::run_pipeline(taskset, &config, &clock, &verifier, None, || false);

    if let Some(out_dir) = &args.out_dir {
        if let Err(err) = write_artifacts(out_dir, &outcome) {
            eprintln!("failed to write output artifacts: {err}");
            return 1;
        }
    }

    if !args.quiet {
        for entry in &outcome.log.0 {
            tracing::info!(iteration = entry.iteration, stage = %entry.stage, "{}", entry.summary);
        }
        println!("terminal status: {:?}", outcome.status);
        if let Some(reason) = &outcome.unrepairable_reason {
            println!("reason: {reason}");
        }
    }

    match outcome.status {
        TerminalStatus::Converged => 0,
        TerminalStatus::Diverged => 2,
        TerminalStatus::Unrepairable => 3,
        TerminalStatus::Cancelled => 4,
    }
}

fn write_artifacts(out_dir: &std::path::Path, outcome: &pipeline::PipelineOutcome) -> std::io::Result<()> {
    std::fs::create_dir_all(out_dir)?;

    if let Some(model) = &outcome.model {
        std::fs::write(out_dir.join("model.xml"), &model.xml)?;
    }

    let properties: Vec<_> = outcome
        .properties
        .iter()
        .map(|p| serde_json::json!({ "formula": p.formula, "comment": p.comment }))
        .collect();
    std::fs::write(out_dir.join("properties.json"), serde_json::to_string_pretty(&properties)?)?;

    let log_entries: Vec<_> = outcome
        .log
        .0
        .iter()
        .map(|e| serde_json::json!({ "iteration": e.iteration, "stage": e.stage, "timestamp": e.timestamp, "summary": e.summary }))
        .collect();
    std::fs::write(out_dir.join("stage_log.json"), serde_json::to_string_pretty(&log_entries)?)?;

    std::fs::write(out_dir.join("taskset.json"), serde_json::to_string_pretty(&outcome.final_taskset)?)?;

    Ok(())
}
