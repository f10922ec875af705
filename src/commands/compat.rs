use crate::cli::CompatArgs;
use crate::commands::{CommandContext, fail};
use crate::output::Report;

pub async fn cmd_compat(ctx: &CommandContext, args: CompatArgs) -> i32 {
    let report = ctx
        .project
        .compat(args.date.as_deref(), args.flag.as_deref())
        .await;
    match report {
        Ok(report) => ctx.emit(Report::Compat(&report)),
        Err(e) => fail(&e),
    }
}
