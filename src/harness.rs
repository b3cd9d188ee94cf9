//! Drives test cases against the cluster: stage, deploy, wait, invoke, verify and tear down.
use crate::config::HarnessConfig;
use crate::error::{HarnessError, Step};
use crate::k8s::client::try_new_client;
use crate::k8s::labels;
use crate::k8s::lifecycle::{PodGuard, PodLifecycle};
use crate::staging::CommandStaging;
use crate::subject::{Invocation, SubjectTool};
use crate::test_case::{OutputMode, TestCase};
use futures::FutureExt;
use kube::Client;
use std::any::Any;
use std::fs;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Outcome of a single test case.
#[derive(Debug)]
pub struct CaseReport {
    pub name: String,
    pub pod_name: String,
    pub result: Result<(), (Step, HarnessError)>,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

/// Outcome of all the cases of a command, in the order the cases were provided.
#[derive(Debug)]
pub struct CommandReport {
    pub command: String,
    pub cases: Vec<CaseReport>,
    /// Cases whose task could not be joined, so they have no report.
    pub lost_cases: usize,
}

impl CommandReport {
    pub fn passed(&self) -> bool {
        self.lost_cases == 0 && self.cases.iter().all(CaseReport::passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseReport> {
        self.cases.iter().filter(|case| !case.passed())
    }
}

#[derive(Clone)]
pub struct Harness {
    config: Arc<HarnessConfig>,
    lifecycle: PodLifecycle,
    subject: Arc<dyn SubjectTool>,
    cancel: CancellationToken,
}

impl Harness {
    pub fn new(
        config: HarnessConfig,
        client: Client,
        subject: Arc<dyn SubjectTool>,
        cancel: CancellationToken,
    ) -> Self {
        let lifecycle = PodLifecycle::new(
            client,
            config.cluster.namespace.clone(),
            config.readiness,
        );
        Self {
            config: Arc::new(config),
            lifecycle,
            subject,
            cancel,
        }
    }

    /// Builds the harness with a client loaded from the configured kubeconfig.
    pub async fn try_new(
        config: HarnessConfig,
        subject: Arc<dyn SubjectTool>,
        cancel: CancellationToken,
    ) -> Result<Self, HarnessError> {
        let client = try_new_client(&config.cluster).await?;
        Ok(Self::new(config, client, subject, cancel))
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Runs every case concurrently. The command output directory is created before the first
    /// case starts and removed once the last one finishes.
    pub async fn run_command(
        &self,
        command: &str,
        cases: Vec<TestCase>,
    ) -> Result<CommandReport, HarnessError> {
        let staging = Arc::new(CommandStaging::create(&self.config.staging, command)?);

        let mut tasks = JoinSet::new();
        for (index, case) in cases.into_iter().enumerate() {
            let harness = self.clone();
            let staging = staging.clone();
            let command = command.to_string();
            tasks.spawn(async move { (index, harness.run_case(&command, &staging, case).await) });
        }
        drop(staging);

        let mut reports = Vec::new();
        let mut lost_cases = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(report) => reports.push(report),
                Err(err) => {
                    error!(command, %err, "test case task failed");
                    lost_cases += 1;
                }
            }
        }
        reports.sort_by_key(|(index, _)| *index);

        Ok(CommandReport {
            command: command.to_string(),
            cases: reports.into_iter().map(|(_, report)| report).collect(),
            lost_cases,
        })
    }

    /// Runs a single case. The pod is deleted on every exit path once it has been created.
    pub async fn run_case(
        &self,
        command: &str,
        staging: &CommandStaging,
        mut case: TestCase,
    ) -> CaseReport {
        info!(case = case.name(), command, "running test case");
        let result = self.exercise(command, staging, &mut case).await;

        match &result {
            Ok(()) => info!(case = case.name(), command, "test case passed"),
            Err((step, err)) => error!(
                case = case.name(),
                step = %step,
                pod = case.pod_name(),
                namespace = self.lifecycle.namespace(),
                "test case aborted: {err}"
            ),
        }

        CaseReport {
            name: case.name().to_string(),
            pod_name: case.pod_name().to_string(),
            result,
        }
    }

    async fn exercise(
        &self,
        command: &str,
        staging: &CommandStaging,
        case: &mut TestCase,
    ) -> Result<(), (Step, HarnessError)> {
        if let OutputMode::Download { .. } = case.output() {
            let dir = staging.stage_case().map_err(|err| (Step::Staging, HarnessError::Staging(err)))?;
            case.stage_output(&dir);
            if let Some(path) = case.output_path() {
                info!(
                    case = case.name(),
                    "Output for test case will be stored at: {}",
                    path.display()
                );
            }
        }

        if self.cancel.is_cancelled() {
            return Err((
                Step::Deploy,
                HarnessError::Cancelled("deploying the target pod".to_string()),
            ));
        }
        self.lifecycle
            .deploy(case.pod())
            .await
            .map_err(|err| (Step::Deploy, HarnessError::ClusterApi(err)))?;
        let guard = PodGuard::new(self.lifecycle.clone(), case.pod_name());

        let mut step = Step::WaitReady;
        let outcome = AssertUnwindSafe(self.exercise_deployed(command, case, &mut step))
            .catch_unwind()
            .await;

        guard.release().await;

        match outcome {
            Ok(result) => result.map_err(|err| (step, err)),
            Err(panic) => Err((step, HarnessError::Panicked(panic_message(panic.as_ref())))),
        }
    }

    async fn exercise_deployed(
        &self,
        command: &str,
        case: &TestCase,
        step: &mut Step,
    ) -> Result<(), HarnessError> {
        *step = Step::WaitReady;
        let selector = labels::selector(&case.pod_labels());
        self.lifecycle.wait_ready(&selector, &self.cancel).await?;

        *step = Step::Invoke;
        let args = case.format_args(command, &self.config.images.dumper)?;
        info!(case = case.name(), "invoking subject tool: {}", args.join(" "));
        let invocation = self
            .subject
            .invoke(&args)
            .await
            .map_err(|err| HarnessError::Invocation(format!("could not run subject tool: {err}")))?;

        *step = Step::Verify;
        verify(case, &invocation)
    }
}

/// Checks the tool exited successfully and, for downloaded outputs, left a non empty file behind.
fn verify(case: &TestCase, invocation: &Invocation) -> Result<(), HarnessError> {
    if !invocation.success {
        return Err(HarnessError::Invocation(format!(
            "command failed\n{invocation}"
        )));
    }

    if let Some(path) = case.output_path() {
        let size = fs::metadata(path).map(|m| m.len()).map_err(|err| {
            HarnessError::Invocation(format!("output {} not found: {err}", path.display()))
        })?;
        if size == 0 {
            return Err(HarnessError::Invocation(format!(
                "output {} is empty",
                path.display()
            )));
        }
    }

    Ok(())
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
