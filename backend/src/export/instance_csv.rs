//! Instance file format.
//!
//! ```text
//! Type,Name,Preferences
//! Student,Alice,Lycee - College - Ecole
//! Student,Bob,College - Lycee - Ecole
//! School,Lycee,Bob - Alice
//! ...
//! ```
//!
//! Agent order on each side is the row order. The reader also accepts the
//! French labels `Etudiant` / `Ecole`, ` → ` as the list separator, and blank
//! rows between the two blocks. Everything read is validated into an
//! [`Instance`]; a structurally broken row is a [`ExportError::MalformedRow`].

use crate::export::ExportError;
use crate::models::instance::{Instance, Side};
use std::io;

const LIST_SEPARATOR: &str = " - ";
const ARROW_SEPARATOR: char = '→';

/// Write `instance` in the `Type,Name,Preferences` format
pub fn write_instance_csv<W: io::Write>(writer: W, instance: &Instance) -> Result<(), ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["Type", "Name", "Preferences"])?;

    for (label, side) in [("Student", Side::Student), ("School", Side::School)] {
        for agent in instance.agents(side) {
            let list = instance.preferences(side, agent).unwrap_or_default();
            wtr.write_record([label, agent.as_str(), list.join(LIST_SEPARATOR).as_str()])?;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Read and validate an instance file
pub fn read_instance_csv<R: io::Read>(reader: R) -> Result<Instance, ExportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut students = Vec::new();
    let mut schools = Vec::new();
    let mut prefs_students = Vec::new();
    let mut prefs_schools = Vec::new();

    for result in rdr.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());

        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        let malformed = |reason: &str| ExportError::MalformedRow {
            line,
            reason: reason.to_string(),
        };

        let label = record.get(0).map(str::trim).unwrap_or_default();
        let name = record
            .get(1)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| malformed("missing agent name"))?;
        let list = parse_list(record.get(2).unwrap_or_default());

        match parse_label(label) {
            Some(Side::Student) => {
                students.push(name.to_string());
                prefs_students.push((name.to_string(), list));
            }
            Some(Side::School) => {
                schools.push(name.to_string());
                prefs_schools.push((name.to_string(), list));
            }
            None => return Err(malformed(&format!("unknown row type '{}'", label))),
        }
    }

    Ok(Instance::new(students, schools, prefs_students, prefs_schools)?)
}

fn parse_label(label: &str) -> Option<Side> {
    match label {
        "Student" | "Etudiant" => Some(Side::Student),
        "School" | "Ecole" => Some(Side::School),
        _ => None,
    }
}

fn parse_list(field: &str) -> Vec<String> {
    let field = field.trim();
    if field.is_empty() {
        return Vec::new();
    }

    // The dash separator carries spaces; bare hyphens belong to names
    let parts: Vec<&str> = if field.contains(ARROW_SEPARATOR) {
        field.split(ARROW_SEPARATOR).collect()
    } else {
        field.split(LIST_SEPARATOR).collect()
    };
    parts.into_iter().map(|p| p.trim().to_string()).collect()
}
