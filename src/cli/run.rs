//! `run` command: drive one simulation to completion or interruption

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use http_flood_core::{
    FloodEvent, ReportAggregator, SimulationManager, SimulationSpec, WorkPlan,
};
use http_flood_transport::ReqwestTransport;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;

use super::summary;
use super::RunArgs;

/// Why the run stopped before the simulation completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    Interrupted,
    DeadlineReached,
}

pub async fn run(args: RunArgs) -> Result<()> {
    let spec = args.to_spec()?;
    let plan = WorkPlan::for_spec(&spec);

    if !args.json {
        summary::print_banner(&spec, &plan)?;
    }

    let transport = ReqwestTransport::new().context("failed to build HTTP client")?;
    let manager = SimulationManager::new(Arc::new(transport));
    let (id, mut events) = manager.run(spec.clone()).context("failed to start simulation")?;

    let (stop_tx, mut stop_rx) = mpsc::channel(2);
    let signal_handle = spawn_signal_listener(stop_tx.clone());
    let deadline_handle = args
        .max_duration
        .map(|secs| spawn_deadline(stop_tx, Duration::from_secs(secs)));

    let progress = progress_bar(&spec, args.json);
    // Running tally, used when the simulation never completes
    let mut tally = ReportAggregator::new(plan.worker_count());

    let report = loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(FloodEvent::RequestFinished { outcome, .. }) => {
                    tally.add_outcome(outcome);
                    progress.inc(1);
                    progress.set_message(format!(
                        "ok {} / failed {} / denied {}",
                        tally.success_count(),
                        tally.failure_count(),
                        tally.connection_failure_count()
                    ));
                }
                Some(FloodEvent::ExecutionFinished { report, .. }) => break Some(report),
                None => break None,
            },
            Some(reason) = stop_rx.recv() => {
                match reason {
                    StopReason::Interrupted => {
                        tracing::info!("Received Ctrl+C, aborting simulation...")
                    }
                    StopReason::DeadlineReached => {
                        tracing::info!("Maximum duration reached, aborting simulation...")
                    }
                }
                manager.abort(id);
                break None;
            }
        }
    };

    signal_handle.abort();
    if let Some(handle) = deadline_handle {
        handle.abort();
    }
    progress.finish_and_clear();

    match report {
        Some(report) => summary::print_report(&report, args.json, true),
        None => {
            tracing::warn!(simulation_id = id, "Simulation stopped before completion");
            summary::print_report(&tally.finalize(), args.json, false)
        }
    }
}

fn spawn_signal_listener(stop_tx: mpsc::Sender<StopReason>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = stop_tx.send(StopReason::Interrupted).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            }
        }
    })
}

fn spawn_deadline(
    stop_tx: mpsc::Sender<StopReason>,
    after: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(after).await;
        let _ = stop_tx.send(StopReason::DeadlineReached).await;
    })
}

fn progress_bar(spec: &SimulationSpec, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }

    if spec.is_bounded() {
        let pb = ProgressBar::new(spec.sample as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    } else {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {pos} requests {msg}")
        {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    }
}
