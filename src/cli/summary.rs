//! Console output for the `run` command

use anyhow::{Context, Result};
use http_flood_core::{AggregateReport, OutcomeCode, SimulationSpec, WorkPlan};
use std::collections::BTreeMap;

pub fn print_banner(spec: &SimulationSpec, plan: &WorkPlan) -> Result<()> {
    println!("\n{}", "=".repeat(70));
    println!("   http-flood - HTTP Flood Simulation");
    println!("{}", "=".repeat(70));
    println!();
    println!("Configuration:");
    println!("  Target:       {} {}", spec.http_method()?, spec.url);
    match plan.total() {
        Some(total) => println!("  Requests:     {total}"),
        None => println!("  Requests:     unbounded (Ctrl+C to stop)"),
    }
    println!("  Workers:      {}", plan.worker_count());
    println!("  Delay:        {} ms", spec.dispatch_delay().as_millis());
    println!(
        "  Auto headers: referer={} user-agent={} keep-alive={}",
        spec.auto_referer, spec.auto_user_agent, spec.auto_keep_alive
    );
    println!("{}", "=".repeat(70));
    println!();
    Ok(())
}

pub fn print_report(report: &AggregateReport, json: bool, completed: bool) -> Result<()> {
    if json {
        let rendered = serde_json::to_string_pretty(report).context("failed to render report")?;
        println!("{rendered}");
        return Ok(());
    }

    println!("\n{}", "=".repeat(70));
    if completed {
        println!("   Results");
    } else {
        println!("   Results (aborted, partial)");
    }
    println!("{}", "=".repeat(70));
    println!("  Total:        {}", report.total());
    println!(
        "  Success:      {} ({:.1}%)",
        report.success_count,
        report.success_rate() * 100.0
    );
    println!("  Failure:      {}", report.failure_count);
    println!(
        "  Denial:       {} ({:.1}%)",
        report.connection_failure_count,
        report.denial_rate() * 100.0
    );
    let elapsed = report.finished_at - report.started_at;
    println!(
        "  Elapsed:      {:.2} s",
        elapsed.num_milliseconds() as f64 / 1000.0
    );

    let codes = code_breakdown(report);
    if !codes.is_empty() {
        println!();
        println!("Codes:");
        for (code, count) in codes {
            println!("  {code:<14}{count}");
        }
    }

    for (index, outcomes) in report.per_worker_outcomes.iter().enumerate() {
        let mean = mean_latency(outcomes.iter().map(|o| o.latency_ms));
        println!(
            "  worker {index}: {} requests, mean latency {:.1} ms",
            outcomes.len(),
            mean
        );
    }
    println!("{}", "=".repeat(70));
    Ok(())
}

fn code_breakdown(report: &AggregateReport) -> BTreeMap<String, usize> {
    let mut codes = BTreeMap::new();
    for outcome in report.per_worker_outcomes.iter().flatten() {
        let label = match &outcome.code {
            OutcomeCode::Timeout => "timeout".to_string(),
            code => code.to_string(),
        };
        *codes.entry(label).or_insert(0) += 1;
    }
    codes
}

fn mean_latency(latencies: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = latencies.fold((0.0, 0usize), |(sum, n), l| (sum + l, n + 1));
    if count > 0 {
        sum / count as f64
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_flood_core::{ReportAggregator, RequestOutcome};

    #[test]
    fn test_code_breakdown() {
        let mut aggregator = ReportAggregator::new(2);
        aggregator.add_outcome(RequestOutcome::response(200, 0, 0));
        aggregator.add_outcome(RequestOutcome::response(200, 1, 0));
        aggregator.add_outcome(RequestOutcome::transport_error("ECONNRESET", 0, 1));
        aggregator.add_outcome(RequestOutcome::timeout(1, 1));

        let codes = code_breakdown(&aggregator.finalize());
        assert_eq!(codes.get("200"), Some(&2));
        assert_eq!(codes.get("ECONNRESET"), Some(&1));
        assert_eq!(codes.get("timeout"), Some(&1));
    }

    #[test]
    fn test_mean_latency() {
        assert_eq!(mean_latency(std::iter::empty()), 0.0);
        assert_eq!(mean_latency([10.0, 20.0].into_iter()), 15.0);
    }
}
