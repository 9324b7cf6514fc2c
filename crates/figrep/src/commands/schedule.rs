use libfigrep_core::FigrepError;
use tracing::{info, warn};

use crate::cli::Cli;
use crate::commands::send::deliver;
use crate::context::ReporterContext;
use crate::output::{emit, print_human};
use crate::scheduler::{parse_schedule, run_forever};

pub fn run(cli: &Cli, once: bool) -> Result<(), FigrepError> {
    let ctx = ReporterContext::resolve(cli)?;
    let expr = ctx
        .config
        .schedule
        .as_deref()
        .ok_or_else(|| FigrepError::InvalidConfig("schedule is not set".to_string()))?;
    let schedule = parse_schedule(expr)?;
    ctx.config.email()?;

    if once {
        let result = deliver(&ctx, false)?;
        emit(cli, &result);
        return Ok(());
    }

    info!(schedule = expr, files = ctx.config.files.len(), "scheduler started");
    print_human(cli, &format!("Scheduler running ({}), press Ctrl-C to stop", expr));
    run_forever(&schedule, || {
        let result = deliver(&ctx, false)?;
        if !result.skipped.is_empty() {
            warn!(files = ?result.skipped, "files missing from this report");
        }
        Ok(())
    })
}
