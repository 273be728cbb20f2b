use std::fs::File;
use std::io::BufWriter;

use anyhow::{Context, Result};
use comfy_table::Table;
use qc_engine::RunReport;
use qc_routine::RoutineRegistry;
use tracing::{info, warn};

use qc_cli::pipeline::{RunInputs, exit_code, run_pipeline};

use crate::cli::RunArgs;
use crate::progress::BarProgress;
use crate::summary::{apply_table_style, print_summary};

pub fn run_routines() -> Result<()> {
    let registry = RoutineRegistry::with_builtins();
    let mut table = Table::new();
    table.set_header(vec!["Routine", "Parameters", "Description"]);
    apply_table_style(&mut table);
    for descriptor in registry.iter() {
        table.add_row(vec![
            descriptor.name.clone(),
            descriptor.parameters.join(", "),
            descriptor.description.clone(),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Run QC and print the summary. Returns the process exit code.
pub fn run_qc(args: &RunArgs) -> Result<i32> {
    let registry = RoutineRegistry::with_builtins();
    let inputs = RunInputs {
        data: &args.data,
        columns: &args.columns,
        routines: &args.routines,
    };
    let mut progress = BarProgress::new(args.no_progress);
    let result = run_pipeline(&registry, inputs, &mut progress);
    progress.finish();
    let result = result?;

    let report = RunReport::from_result(&result);
    if let Some(path) = &args.output {
        let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &report)
            .with_context(|| format!("write report {}", path.display()))?;
        info!(path = %path.display(), "run report written");
    }
    print_summary(&report, args.max_messages);

    let worst = result.dataset.worst_flag();
    let code = exit_code(result.state, worst, args.fail_on.map(Into::into));
    if code != 0 {
        warn!(state = %result.state, worst = %worst, code, "run finished with non-zero exit");
    }
    Ok(code)
}

