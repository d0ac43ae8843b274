//! Pipeline orchestrator.
//!
//! Each command maps to a linear plan of steps. Steps run one at a time;
//! the first failure halts the run and no later step starts. Nothing is
//! retried and partitions already written are left in place.

use async_trait::async_trait;
use etl_core::{Error, Result};
use mysql_store::{SourceStore, WarehouseStore};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use telemetry::metrics;
use tracing::{error, info, info_span, Instrument};

use crate::config::EtlConfig;
use crate::exporter::WarehouseExporter;
use crate::fact::FactGenerator;
use crate::generators::{
    CustomerGenerator, DateGenerator, DeliveryPersonGenerator, LocationGenerator,
    RestaurantGenerator, TimeSlotGenerator,
};
use crate::job::{Generator, JobRunner};

/// A pipeline command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// All six dimensions.
    Dimensions,
    /// The fact table only.
    Fact,
    /// Dimensions then the fact table.
    Full,
    /// Load generated partitions into the warehouse.
    Export,
    /// Full generation followed by export.
    Complete,
}

impl Command {
    pub const ALL: [Command; 5] = [
        Command::Dimensions,
        Command::Fact,
        Command::Full,
        Command::Export,
        Command::Complete,
    ];

    /// Command-line name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dimensions => "create-dimensions",
            Self::Fact => "create-fact",
            Self::Full => "process-all",
            Self::Export => "export-to-mysql",
            Self::Complete => "run-complete-etl",
        }
    }

    pub fn needs_source(&self) -> bool {
        !matches!(self, Self::Export)
    }

    pub fn needs_warehouse(&self) -> bool {
        matches!(self, Self::Export | Self::Complete)
    }
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| Error::configuration(format!("unknown command: {}", s)))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One unit of a plan.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &str;

    async fn run(&self) -> Result<()>;
}

/// Runs a generator as a map-only job.
pub struct GeneratorStep<G> {
    runner: JobRunner,
    generator: Arc<G>,
}

impl<G: Generator> GeneratorStep<G> {
    pub fn new(runner: JobRunner, generator: G) -> Self {
        Self {
            runner,
            generator: Arc::new(generator),
        }
    }
}

#[async_trait]
impl<G: Generator> Step for GeneratorStep<G> {
    fn name(&self) -> &str {
        self.generator.name()
    }

    async fn run(&self) -> Result<()> {
        self.runner.run(self.generator.clone()).await.map(|_| ())
    }
}

/// Creates the warehouse schema and loads every table.
pub struct ExportStep {
    exporter: WarehouseExporter,
}

impl ExportStep {
    pub fn new(exporter: WarehouseExporter) -> Self {
        Self { exporter }
    }
}

#[async_trait]
impl Step for ExportStep {
    fn name(&self) -> &str {
        "export"
    }

    async fn run(&self) -> Result<()> {
        self.exporter.export().await.map(|_| ())
    }
}

/// The step that stopped a run.
#[derive(Debug)]
pub struct FailedStep {
    /// 1-based position in the plan.
    pub position: usize,
    pub name: String,
    pub error: Error,
}

/// Outcome of a run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub completed: Vec<String>,
    pub failure: Option<FailedStep>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Process exit status: 0 on success, 1 on any failure.
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    /// Steps that were started, including a failed one.
    pub fn steps_run(&self) -> usize {
        self.completed.len() + usize::from(self.failure.is_some())
    }
}

/// Runs steps in order, halting at the first failure.
pub async fn execute(steps: &[Box<dyn Step>]) -> RunReport {
    let start = Instant::now();
    let mut report = RunReport::default();

    for (index, step) in steps.iter().enumerate() {
        let position = index + 1;
        let span = info_span!("step", name = %step.name(), position = position);
        let step_start = Instant::now();

        let outcome = async {
            info!(total = steps.len(), "Step starting");
            step.run().await
        }
        .instrument(span)
        .await;

        let elapsed_ms = step_start.elapsed().as_millis() as u64;
        metrics().step_latency_ms.observe(elapsed_ms);

        match outcome {
            Ok(()) => {
                metrics().steps_succeeded.inc();
                info!(step = %step.name(), position = position, elapsed_ms = elapsed_ms, "Step succeeded");
                report.completed.push(step.name().to_string());
            }
            Err(e) => {
                metrics().steps_failed.inc();
                error!(
                    step = %step.name(),
                    position = position,
                    kind = e.kind(),
                    error = %e,
                    elapsed_ms = elapsed_ms,
                    "Step failed, halting run"
                );
                report.failure = Some(FailedStep {
                    position,
                    name: step.name().to_string(),
                    error: e,
                });
                break;
            }
        }
    }

    report.elapsed = start.elapsed();
    report
}

/// Builds and runs plans for pipeline commands.
pub struct PipelineOrchestrator {
    runner: JobRunner,
    exporter: WarehouseExporter,
}

impl PipelineOrchestrator {
    pub fn new(
        config: &EtlConfig,
        source: Arc<dyn SourceStore>,
        warehouse: Arc<dyn WarehouseStore>,
    ) -> Self {
        let layout = config.storage.layout();
        Self {
            runner: JobRunner::new(config.job.clone(), layout.clone(), source),
            exporter: WarehouseExporter::new(warehouse, layout, config.export.clone()),
        }
    }

    pub fn exporter(&self) -> &WarehouseExporter {
        &self.exporter
    }

    fn dimension_steps(&self) -> Vec<Box<dyn Step>> {
        let runner = &self.runner;
        vec![
            Box::new(GeneratorStep::new(runner.clone(), CustomerGenerator)),
            Box::new(GeneratorStep::new(runner.clone(), RestaurantGenerator)),
            Box::new(GeneratorStep::new(runner.clone(), DateGenerator)),
            Box::new(GeneratorStep::new(runner.clone(), LocationGenerator)),
            Box::new(GeneratorStep::new(runner.clone(), TimeSlotGenerator)),
            Box::new(GeneratorStep::new(runner.clone(), DeliveryPersonGenerator)),
        ]
    }

    fn fact_step(&self) -> Box<dyn Step> {
        Box::new(GeneratorStep::new(self.runner.clone(), FactGenerator))
    }

    fn export_step(&self) -> Box<dyn Step> {
        Box::new(ExportStep::new(self.exporter.clone()))
    }

    /// The ordered steps for a command.
    pub fn plan(&self, command: Command) -> Vec<Box<dyn Step>> {
        match command {
            Command::Dimensions => self.dimension_steps(),
            Command::Fact => vec![self.fact_step()],
            Command::Full => {
                let mut steps = self.dimension_steps();
                steps.push(self.fact_step());
                steps
            }
            Command::Export => vec![self.export_step()],
            Command::Complete => {
                let mut steps = self.plan(Command::Full);
                steps.push(self.export_step());
                steps
            }
        }
    }

    /// Runs a command to completion or first failure.
    pub async fn run(&self, command: Command) -> RunReport {
        let steps = self.plan(command);
        info!(command = %command, steps = steps.len(), "Running pipeline");

        let report = execute(&steps).await;
        match &report.failure {
            None => info!(
                command = %command,
                steps = report.completed.len(),
                elapsed_ms = report.elapsed.as_millis() as u64,
                "Pipeline succeeded"
            ),
            Some(failed) => error!(
                command = %command,
                step = failed.position,
                name = %failed.name,
                error = %failed.error,
                "Pipeline failed"
            ),
        }
        report
    }
}
