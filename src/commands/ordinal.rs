use crate::cli::OrdinalArgs;
use crate::commands::{CommandContext, fail};
use crate::output::Report;
use crate::style;

pub async fn cmd_ordinal(ctx: &CommandContext, args: OrdinalArgs) -> i32 {
    let file = ctx.project.root().join(&args.file);
    if !file.exists() {
        style::error(&format!("Schema file not found: {}", style::path(&file)));
        return 1;
    }

    match ctx.project.ordinal(&file, args.record.as_deref()).await {
        Ok(outcome) => ctx.emit(Report::Ordinal(&outcome)),
        Err(e) => fail(&e),
    }
}
