/// Run command: executes the selected scenarios and reports PASS/FAIL.
use comfy_table::{Cell, Color, Table};
use owo_colors::{OwoColorize, Stream::Stdout};

use crate::cli::RunArgs;
use keyphrase::catalog::{self, Scenario};
use keyphrase::config::Config;
use keyphrase::driver::{self, DriverError, ScenarioReport};
use keyphrase::error::KeyphraseError;
use keyphrase::keys::{fingerprint, store};
use keyphrase::util::human_elapsed;

type Outcome = Result<ScenarioReport, DriverError>;

pub fn run_scenarios(args: RunArgs) -> anyhow::Result<()> {
    // ── 1. Configuration ─────────────────────────────────────────────────
    let config = Config::load(args.kdf.config.as_deref())?.apply(args.kdf.overrides());
    config.validate()?;

    // ── 2. Reference key ─────────────────────────────────────────────────
    let reference = store::load_reference_key(&args.key)?;
    tracing::info!(
        fingerprint = %fingerprint::short_fingerprint(&reference),
        "using reference key"
    );

    // ── 3. Select and run ────────────────────────────────────────────────
    let scenarios = catalog::select(args.filter.as_deref(), args.encoding);
    if scenarios.is_empty() {
        return Err(KeyphraseError::NoScenarioSelected.into());
    }
    let outcomes = driver::run_all(&scenarios, &reference, &config.kdf, args.parallel);
    for err in outcomes.iter().filter_map(|o| o.as_ref().err()) {
        tracing::error!(%err, "integration defect");
    }

    // ── 4. Report ────────────────────────────────────────────────────────
    if args.json {
        print_json(&scenarios, &outcomes)?;
    } else {
        print_table(&scenarios, &outcomes);
    }

    let failed = outcomes
        .iter()
        .filter(|o| !o.as_ref().is_ok_and(ScenarioReport::passed))
        .count();
    if failed > 0 {
        return Err(KeyphraseError::ScenariosFailed {
            failed,
            total: outcomes.len(),
        }
        .into());
    }
    Ok(())
}

fn print_json(scenarios: &[Scenario], outcomes: &[Outcome]) -> anyhow::Result<()> {
    let rows = scenarios
        .iter()
        .zip(outcomes)
        .map(|(scenario, outcome)| match outcome {
            Ok(report) => serde_json::to_value(report),
            Err(err) => Ok(serde_json::json!({
                "name": scenario.name,
                "encoding": scenario.encoding,
                "expected": scenario.expected,
                "phase": "integration_error",
                "reason": err.to_string(),
            })),
        })
        .collect::<Result<Vec<_>, _>>()?;
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

fn print_table(scenarios: &[Scenario], outcomes: &[Outcome]) {
    let mut table = Table::new();
    table.set_header(vec!["Scenario", "Encoding", "Expected", "Result", "Time", "Detail"]);

    for (scenario, outcome) in scenarios.iter().zip(outcomes) {
        let (verdict, time, detail) = match outcome {
            Ok(report) => {
                let verdict = if report.passed() {
                    Cell::new("PASS").fg(Color::Green)
                } else {
                    Cell::new("FAIL").fg(Color::Red)
                };
                let detail = report
                    .reason
                    .clone()
                    .or_else(|| report.read_result.clone())
                    .unwrap_or_default();
                (verdict, human_elapsed(report.elapsed), detail)
            }
            Err(err) => (
                Cell::new("INTEGRATION").fg(Color::Magenta),
                String::new(),
                err.to_string(),
            ),
        };
        table.add_row(vec![
            Cell::new(scenario.name),
            Cell::new(scenario.encoding),
            Cell::new(scenario.expected),
            verdict,
            Cell::new(time),
            Cell::new(detail),
        ]);
    }

    println!("{table}");

    let passed = outcomes
        .iter()
        .filter(|o| o.as_ref().is_ok_and(ScenarioReport::passed))
        .count();
    let summary = format!("{} of {} scenarios passed", passed, outcomes.len());
    if passed == outcomes.len() {
        println!("{}", summary.if_supports_color(Stdout, |t| t.green()));
    } else {
        println!("{}", summary.if_supports_color(Stdout, |t| t.red()));
    }
}
