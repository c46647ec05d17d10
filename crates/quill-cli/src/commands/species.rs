// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! `quill species <key>`: the generated layout for a species key.

use std::fs;

use quill_species::{SpeciesData, Specializer};
use serde::Serialize;

use crate::output;

const USAGE: &str = "quill species <key> [--json] [--emit FILE]";

#[derive(Debug, Serialize)]
pub struct SpeciesReport {
    pub key: String,
    pub class: String,
    pub superclass: Option<String>,
    pub fields: Vec<FieldReport>,
}

#[derive(Debug, Serialize)]
pub struct FieldReport {
    pub name: String,
    pub kind: String,
    pub slot: u16,
    pub offset: u32,
}

impl SpeciesReport {
    pub fn new(species: &SpeciesData) -> SpeciesReport {
        SpeciesReport {
            key: species.key().to_string(),
            class: species.class().name().to_string(),
            superclass: species.class().superclass().map(|c| c.name().to_string()),
            fields: species
                .getters()
                .iter()
                .map(|g| FieldReport { name: g.name.clone(), kind: g.ty.to_string(), slot: g.slot, offset: g.offset })
                .collect(),
        }
    }
}

pub fn run(args: &[String]) -> Result<(), String> {
    let mut args = args.to_vec();
    let json = crate::take_flag(&mut args, "--json");
    let emit = crate::take_option(&mut args, "--emit")?;
    // The root species has the empty key.
    let key = match args.as_slice() {
        [] => "",
        _ => crate::positional(&args, USAGE)?,
    };

    let specializer = Specializer::new();
    let species = specializer.find_species(key).map_err(|e| e.to_string())?;
    let report = SpeciesReport::new(&species);

    if json {
        let text = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
        println!("{}", text);
    } else {
        print_report(&report);
    }

    if let Some(path) = emit {
        let bytes = specializer
            .generate_layout_source(&report.class, &species)
            .map_err(|e| e.to_string())?;
        fs::write(&path, &bytes).map_err(|e| format!("failed to write {}: {}", path, e))?;
        eprintln!(
            "{}: wrote {} getter(s) to {}",
            output::ok_label(),
            report.fields.len(),
            output::file_path(&path)
        );
    }
    Ok(())
}

fn print_report(report: &SpeciesReport) {
    let parent = report.superclass.as_deref().unwrap_or("-");
    println!("{} {}", output::title(&report.class), output::dim(&format!("extends {}", parent)));
    println!("{}", output::separator(40));
    if report.fields.is_empty() {
        println!("  {}", output::dim("(no captured values)"));
    }
    for field in &report.fields {
        println!(
            "  {:>2}  {:<10} {}  {}",
            field.slot,
            output::entry_name(&field.name),
            field.kind,
            output::dim(&format!("+{}", field.offset))
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_lists_fields_in_slot_order() {
        let specializer = Specializer::new();
        let species = specializer.find_species("LIJ").unwrap();
        let report = SpeciesReport::new(&species);
        assert_eq!(report.class, "Species_LIJ");
        assert_eq!(report.superclass.as_deref(), Some("Species_LI"));
        let names: Vec<&str> = report.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["argL0", "argI1", "argJ2"]);
        assert!(report.fields.windows(2).all(|w| w[0].slot < w[1].slot));
    }

    #[test]
    fn report_serializes() {
        let specializer = Specializer::new();
        let report = SpeciesReport::new(&specializer.find_species("D").unwrap());
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["key"], "D");
        assert_eq!(json["fields"][0]["kind"], "D");
    }
}
