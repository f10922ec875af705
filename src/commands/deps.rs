use crate::cli::{DepsArgs, DepsDirection};
use crate::commands::{CommandContext, fail};
use crate::model::Direction;
use crate::output::Report;

pub async fn cmd_deps(ctx: &CommandContext, args: DepsArgs) -> i32 {
    let direction = match args.direction {
        DepsDirection::Deps => Direction::Forward,
        DepsDirection::Rdeps => Direction::Reverse,
    };

    match ctx.project.dependencies(&args.target, direction, args.depth).await {
        Ok(report) => ctx.emit(Report::Dependencies(&report)),
        Err(e) => fail(&e),
    }
}
