use crate::cli::InterfaceArgs;
use crate::commands::{CommandContext, fail};
use crate::output::Report;

pub async fn cmd_interface(ctx: &CommandContext, args: InterfaceArgs) -> i32 {
    match ctx.project.interface(args.type_name.trim()).await {
        Ok(model) => ctx.emit(Report::Interface(&model)),
        Err(e) => fail(&e),
    }
}
