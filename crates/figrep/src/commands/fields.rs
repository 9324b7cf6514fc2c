use comfy_table::{presets::UTF8_FULL, Table};
use libfigrep_core::projection::FIELD_REGISTRY;
use libfigrep_core::FigrepError;
use serde::Serialize;

use crate::cli::Cli;
use crate::output::{emit, CommandOutput};

#[derive(Serialize)]
struct FieldInfo {
    name: &'static str,
    description: &'static str,
}

#[derive(Serialize)]
#[serde(transparent)]
struct FieldList(Vec<FieldInfo>);

impl CommandOutput for FieldList {
    fn human(&self) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL).set_header(vec!["Field", "Description"]);
        for field in &self.0 {
            table.add_row(vec![field.name, field.description]);
        }
        table.to_string()
    }
}

pub fn run(cli: &Cli) -> Result<(), FigrepError> {
    let fields = FieldList(
        FIELD_REGISTRY
            .iter()
            .map(|spec| FieldInfo {
                name: spec.name,
                description: spec.description,
            })
            .collect(),
    );
    emit(cli, &fields);
    Ok(())
}
