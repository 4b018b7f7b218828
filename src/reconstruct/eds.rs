//! Renderer for the sectioned-text dialect.
//!
//! Sections are emitted in a fixed canonical order (`[File]`, `[Device]`,
//! `[Params]`, `[Assembly]`, `[Connection Manager]`, `[Capacity]`), keyed
//! entries use the primary key spelling from the synonym table, and record
//! fields are joined in positional order. Extras replay verbatim after the
//! typed entries of their section; opaque sections replay verbatim at the
//! end of the document.

use std::collections::HashSet;
use std::fmt::Write;

use crate::model::{Assembly, Capacity, EnumSet, NormalizedDevice, Parameter, RawEntry, Scalar};
use crate::parsers::SynonymTable;

/// Entry indentation, matching common vendor tooling output.
const INDENT: &str = "        ";

pub(super) fn write_document(model: &NormalizedDevice, synonyms: &SynonymTable) -> String {
    let mut out = String::new();

    if let Some(file_info) = &model.file_info {
        open_section(&mut out, "File");
        keyed_entries(&mut out, "file", &file_info.fields(), &file_info.extras, synonyms);
    }
    if !model.identity.is_empty() {
        open_section(&mut out, "Device");
        keyed_entries(
            &mut out,
            "device",
            &model.identity.fields(),
            &model.identity.extras,
            synonyms,
        );
    }
    if !model.params.is_empty() || !model.enums.is_empty() || !model.param_extras.is_empty() {
        open_section(&mut out, "Params");
        params_entries(&mut out, model);
    }
    if !model.assemblies.is_empty() || !model.assembly_extras.is_empty() {
        open_section(&mut out, "Assembly");
        for assembly in model.assemblies.values() {
            push_record(&mut out, "Assem", assembly.index, &assembly_values(assembly));
        }
        replay_extras(&mut out, &model.assembly_extras);
    }
    if !model.connections.is_empty() || !model.connection_extras.is_empty() {
        open_section(&mut out, "Connection Manager");
        for connection in model.connections.values() {
            let values = positional_values(&connection.fields(), &connection.raw_tail);
            push_record(&mut out, "Connection", connection.index, &values);
        }
        replay_extras(&mut out, &model.connection_extras);
    }
    if let Some(capacity) = &model.capacity {
        open_section(&mut out, "Capacity");
        capacity_entries(&mut out, capacity, synonyms);
    }

    // Opaque bodies replay byte for byte. Nothing may follow one except
    // another section header: any separator would re-parse into the body.
    for (pos, section) in model.opaque_sections.iter().enumerate() {
        if pos == 0 && !out.is_empty() {
            out.push('\n');
        }
        let _ = write!(out, "[{}]\n{}", section.name, section.body);
    }

    out
}

/// Start a section block, separated from the previous one by a blank line.
fn open_section(out: &mut String, name: &str) {
    if !out.is_empty() {
        out.push('\n');
    }
    let _ = writeln!(out, "[{name}]");
}

/// Emit the typed fields of a keyed section, then its extras.
///
/// A canonical field whose value arrived through a vendor key recorded in
/// the extras is skipped here: replaying the extra both restores the
/// original spelling and re-populates the field on re-parse.
fn keyed_entries(
    out: &mut String,
    table_section: &str,
    fields: &[(&'static str, &Option<Scalar>)],
    extras: &[RawEntry],
    synonyms: &SynonymTable,
) {
    let replayed: HashSet<&str> = extras
        .iter()
        .flat_map(|entry| synonyms.resolve(table_section, &entry.key))
        .map(|hit| hit.canonical)
        .collect();

    for &(canonical, value) in fields {
        let Some(value) = value else { continue };
        if replayed.contains(canonical) {
            continue;
        }
        let key = synonyms
            .primary_literal(table_section, canonical)
            .unwrap_or(canonical);
        let _ = writeln!(out, "{INDENT}{key} = {value};");
    }
    replay_extras(out, extras);
}

fn replay_extras(out: &mut String, extras: &[RawEntry]) {
    for entry in extras {
        let _ = writeln!(out, "{INDENT}{} = {};", entry.key, entry.raw);
    }
}

fn push_record(out: &mut String, prefix: &str, index: u32, values: &[String]) {
    let _ = writeln!(out, "{INDENT}{prefix}{index} = {};", values.join(", "));
}

/// Positional slots of a record, trimmed of the unset tail.
///
/// Populated slots never trail unset ones when a record came from a parse,
/// so cutting at the last populated slot reproduces the original arity. A
/// retained raw tail forces the full defined arity first.
fn positional_values(
    fields: &[(&'static str, &Option<Scalar>)],
    raw_tail: &[String],
) -> Vec<String> {
    let mut values: Vec<String> = if raw_tail.is_empty() {
        match fields.iter().rposition(|(_, value)| value.is_some()) {
            Some(last) => fields[..=last]
                .iter()
                .map(|&(_, value)| render_slot(value))
                .collect(),
            None => Vec::new(),
        }
    } else {
        fields.iter().map(|&(_, value)| render_slot(value)).collect()
    };
    values.extend(raw_tail.iter().cloned());
    values
}

fn render_slot(value: &Option<Scalar>) -> String {
    value.as_ref().map_or_else(String::new, ToString::to_string)
}

/// `ParamN` and `EnumN` records, enumerations next to their parameter.
fn params_entries(out: &mut String, model: &NormalizedDevice) {
    let mut paired: HashSet<u32> = HashSet::new();

    for param in model.params.values() {
        push_record(out, "Param", param.index, &param_values(param));
        if let Some(set) = model.enums.get(&param.index) {
            push_record(out, "Enum", set.param_index, &enum_values(set));
            paired.insert(param.index);
        }
    }
    for set in model.enums.values() {
        if !paired.contains(&set.param_index) {
            push_record(out, "Enum", set.param_index, &enum_values(set));
        }
    }
    replay_extras(out, &model.param_extras);
}

fn param_values(param: &Parameter) -> Vec<String> {
    // The thirteenth typed field (access rights) is XML-only and has no
    // positional slot in this dialect.
    positional_values(&param.fields()[..12], &param.raw_tail)
}

fn enum_values(set: &EnumSet) -> Vec<String> {
    let mut values = Vec::with_capacity(set.entries.len() * 2);
    for entry in &set.entries {
        values.push(entry.value.to_string());
        values.push(entry.label.to_string());
    }
    values
}

fn assembly_values(assembly: &Assembly) -> Vec<String> {
    let fields = assembly.fields();
    let mut values = if assembly.members.is_empty() && assembly.raw_tail.is_empty() {
        positional_values(&fields, &[])
    } else {
        // Members start at the seventh slot; the fixed part pads to its
        // full arity so they land back in the same positions.
        fields.iter().map(|&(_, value)| render_slot(value)).collect()
    };

    for member in &assembly.members {
        values.push(render_slot(&member.size));
        values.push(render_slot(&member.reference));
    }
    values.extend(assembly.raw_tail.iter().cloned());
    values
}

fn capacity_entries(out: &mut String, capacity: &Capacity, synonyms: &SynonymTable) {
    keyed_entries(out, "capacity", &capacity.fields(), &capacity.extras, synonyms);
    for tspec in capacity.tspecs.values() {
        let values = positional_values(&tspec.fields(), &tspec.raw_tail);
        push_record(out, "TSpec", tspec.index, &values);
    }
}
