use crate::cli::XrefArgs;
use crate::commands::{CommandContext, fail};
use crate::output::Report;

pub async fn cmd_xref(ctx: &CommandContext, args: XrefArgs) -> i32 {
    match ctx.project.cross_reference(args.symbol.trim()).await {
        Ok(xref) => ctx.emit(Report::CrossReference(&xref)),
        Err(e) => fail(&e),
    }
}
