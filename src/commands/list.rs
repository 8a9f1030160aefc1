/// List command: prints the scenario catalog.
use comfy_table::{Cell, Color, Table};

use keyphrase::catalog::{Expected, SCENARIOS};

pub fn run_list() -> anyhow::Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Scenario", "Encoding", "Write", "Read", "Expected"]);

    for scenario in &SCENARIOS {
        let expected = match scenario.expected {
            Expected::Success => Cell::new("success").fg(Color::Green),
            Expected::Failure => Cell::new("failure").fg(Color::Yellow),
        };
        table.add_row(vec![
            Cell::new(scenario.name),
            Cell::new(scenario.encoding),
            Cell::new(scenario.write),
            Cell::new(scenario.read),
            expected,
        ]);
    }

    println!("{table}");
    Ok(())
}
