//! Runs the end-to-end validation of `kubectl-shovel` against the configured cluster.
use shovel_harness::cases::standard_cases;
use shovel_harness::cli::Cli;
use shovel_harness::error::HarnessError;
use shovel_harness::harness::{CommandReport, Harness};
use shovel_harness::logging::Logging;
use shovel_harness::subject::ShovelBinary;
use shovel_harness::topology::PodFactory;
use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, trace};

fn main() -> ExitCode {
    if let Err(err) = Logging::try_init() {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    match _main() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every case of every command passed.
fn _main() -> Result<bool, Box<dyn Error>> {
    let cli = Cli::init_harness_cli();
    let config = cli.harness_config()?;

    let cancel = CancellationToken::new();
    trace!("creating the signal handler");
    create_shutdown_signal_handler(cancel.clone())?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let passed = runtime.block_on(async {
        let factory = PodFactory::new(&config.images);
        let subject = Arc::new(ShovelBinary::new(config.subject_binary.clone()));
        let harness = Harness::try_new(config, subject, cancel.clone()).await?;

        let mut passed = true;
        for command in cli.commands() {
            if cancel.is_cancelled() {
                break;
            }
            let cases = standard_cases(&factory, Vec::new())?;
            let report = harness.run_command(command, cases).await?;
            log_report(&report);
            passed &= report.passed();
        }

        Ok::<_, HarnessError>(passed)
    })?;

    Ok(passed && !cancel.is_cancelled())
}

fn log_report(report: &CommandReport) {
    for case in report.failures() {
        if let Err((step, err)) = &case.result {
            error!(command = %report.command, case = %case.name, step = %step, "FAILED: {err}");
        }
    }
    info!(
        command = %report.command,
        passed = report.cases.iter().filter(|c| c.passed()).count(),
        failed = report.failures().count(),
        lost = report.lost_cases,
        "command finished"
    );
}

/// Ctrl-C cancels the run. Pods already created are still deleted.
fn create_shutdown_signal_handler(cancel: CancellationToken) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || {
        info!("Received SIGINT (Ctrl-C). Cancelling test run");
        cancel.cancel();
    })
    .inspect_err(|e| error!("Could not set signal handler: {e}"))
}
