use crate::output::{OutputFormatter, Report};
use std::io::Write;

/// Pretty-printed JSON of the underlying model, for agents and scripts.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn format<W: Write>(&self, report: Report<'_>, writer: &mut W) -> std::io::Result<()> {
        serde_json::to_writer_pretty(&mut *writer, &report)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DependencyReport, Direction, Resolution};

    #[test]
    fn test_report_serializes_without_wrapper() {
        let report = DependencyReport::new(
            "ssl",
            Direction::Reverse,
            Resolution::new(vec!["@ssl//:ssl".to_string()]),
        );
        let mut buffer = Vec::new();
        JsonOutput
            .format(Report::Dependencies(&report), &mut buffer)
            .unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["reference"], "ssl");
        assert_eq!(value["direction"], "reverse");
        assert_eq!(value["labels"][0], "@ssl//:ssl");
    }
}
