//! Structural diff engine implementation.

use super::{DiffEntry, DiffEntryKind, DiffResult};
use crate::error::{DevDescError, EvaluateErrorKind, Result};
use crate::model::{
    Assembly, AssemblyMember, Capacity, Connection, DeviceIdentity, EnumSet, FileInfo,
    FormatKind, Location, Menu, MenuItem, NormalizedDevice, OpaqueSection, Parameter,
    ProcessData, RawEntry, Scalar, TSpec, TextTable,
};
use crate::parsers::clean_value;
use indexmap::IndexMap;

/// Structural diff engine.
///
/// Compares an original model against the re-parse of its reconstruction,
/// collection by collection, key by key. The comparison is structural, not
/// textual: whitespace, comments and field order never show up, scalar
/// comparison is semantic (`0x10` equals `16`), and raw-extras entries that
/// coerce to the same value are only formatting noise.
pub struct DiffEngine {
    include_formatting: bool,
}

impl DiffEngine {
    /// Create a diff engine with default settings
    pub fn new() -> Self {
        Self {
            include_formatting: true,
        }
    }

    /// Include or suppress `FormattingOnly` entries in the result
    #[must_use]
    pub const fn include_formatting(mut self, include: bool) -> Self {
        self.include_formatting = include;
        self
    }

    /// Compare two models and return the structural differences.
    ///
    /// `original` is the side the field count is taken from. Both models
    /// must come from the same dialect.
    pub fn diff(
        &self,
        original: &NormalizedDevice,
        reconstructed: &NormalizedDevice,
    ) -> Result<DiffResult> {
        if original.format != reconstructed.format {
            return Err(DevDescError::evaluate(
                "diffing models",
                EvaluateErrorKind::FormatMismatch {
                    model: original.format.name().to_string(),
                    document: reconstructed.format.name().to_string(),
                },
            ));
        }

        let mut result = DiffResult::new();
        result.total_field_count = count_fields(original);

        // Quick check: equal content hashes mean structurally equal models.
        if original.content_hash == reconstructed.content_hash && original.content_hash != 0 {
            tracing::debug!(
                total_fields = result.total_field_count,
                "content hashes equal, skipping walk"
            );
            return Ok(result);
        }

        let mut walk = Walk {
            result,
            format: original.format,
            include_formatting: self.include_formatting,
        };

        walk.identity(&original.identity, &reconstructed.identity);
        walk.file_info(&original.file_info, &reconstructed.file_info);

        walk.keyed_records("params", &original.params, &reconstructed.params, describe_param, Walk::param);
        walk.extras("params", &original.param_extras, &reconstructed.param_extras);
        walk.keyed_records("enums", &original.enums, &reconstructed.enums, describe_enum_set, Walk::enum_set);

        walk.keyed_records(
            "assemblies",
            &original.assemblies,
            &reconstructed.assemblies,
            describe_assembly,
            Walk::assembly,
        );
        walk.extras("assemblies", &original.assembly_extras, &reconstructed.assembly_extras);

        walk.keyed_records(
            "connections",
            &original.connections,
            &reconstructed.connections,
            describe_connection,
            Walk::connection,
        );
        walk.extras("connections", &original.connection_extras, &reconstructed.connection_extras);

        walk.capacity(&original.capacity, &reconstructed.capacity);

        walk.keyed_records(
            "process_data",
            &original.process_data,
            &reconstructed.process_data,
            describe_process_data,
            Walk::process_data,
        );
        walk.keyed_records("menus", &original.menus, &reconstructed.menus, describe_menu, Walk::menu);

        walk.texts(&original.texts, &reconstructed.texts);
        walk.opaque(&original.opaque_sections, &reconstructed.opaque_sections);

        let mut result = walk.result;
        result.calculate_summary();
        tracing::debug!(
            entries = result.entries.len(),
            changes = result.summary.total_changes,
            total_fields = result.total_field_count,
            "structural diff complete"
        );
        Ok(result)
    }
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoring denominator: the populated footprint of one model.
///
/// Every optional section and keyed record counts one presence point, and
/// every populated typed field, text reference, raw cell, extras entry,
/// enumeration cell, member cell, menu item and text entry counts one more.
/// Opaque sections count one each.
fn count_fields(model: &NormalizedDevice) -> usize {
    fn some(fields: &[(&'static str, &Option<Scalar>)]) -> usize {
        fields.iter().filter(|(_, v)| v.is_some()).count()
    }

    let identity = &model.identity;
    let mut total = some(&identity.fields())
        + usize::from(identity.vendor_text_id.is_some())
        + usize::from(identity.device_name_text_id.is_some())
        + identity.extras.len();

    if let Some(info) = &model.file_info {
        total += 1 + some(&info.fields()) + info.extras.len();
    }
    for param in model.params.values() {
        total += 1
            + some(&param.fields())
            + usize::from(param.id.is_some())
            + usize::from(param.text_id.is_some())
            + param.raw_tail.len()
            + param.extras.len();
    }
    total += model.param_extras.len();
    for set in model.enums.values() {
        total += 1 + set.entries.len() * 2;
    }
    for assembly in model.assemblies.values() {
        total += 1 + some(&assembly.fields()) + assembly.raw_tail.len();
        for member in &assembly.members {
            total += usize::from(member.size.is_some()) + usize::from(member.reference.is_some());
        }
    }
    total += model.assembly_extras.len();
    for connection in model.connections.values() {
        total += 1 + some(&connection.fields()) + connection.raw_tail.len();
    }
    total += model.connection_extras.len();
    if let Some(capacity) = &model.capacity {
        total += 1 + some(&capacity.fields()) + capacity.extras.len();
        for tspec in capacity.tspecs.values() {
            total += 1 + some(&tspec.fields()) + tspec.raw_tail.len();
        }
    }
    for pd in model.process_data.values() {
        total += 1
            + some(&pd.fields())
            + usize::from(pd.direction.is_some())
            + usize::from(pd.name_text_id.is_some())
            + pd.extras.len();
    }
    for menu in model.menus.values() {
        total += 1 + usize::from(menu.name_text_id.is_some()) + menu.items.len() + menu.extras.len();
    }
    total += usize::from(model.texts.primary_language.is_some());
    for entries in model.texts.languages.values() {
        total += 1 + entries.len();
    }
    total += model.opaque_sections.len();
    total
}

// ============================================================================
// Model walk
// ============================================================================

struct Walk {
    result: DiffResult,
    format: FormatKind,
    include_formatting: bool,
}

impl Walk {
    fn identity(&mut self, original: &DeviceIdentity, reconstructed: &DeviceIdentity) {
        self.fields("identity", &original.fields(), &reconstructed.fields());
        self.string_field(
            Location::field("identity", "vendor_text_id"),
            &original.vendor_text_id,
            &reconstructed.vendor_text_id,
        );
        self.string_field(
            Location::field("identity", "device_name_text_id"),
            &original.device_name_text_id,
            &reconstructed.device_name_text_id,
        );
        self.extras("identity", &original.extras, &reconstructed.extras);
    }

    fn file_info(&mut self, original: &Option<FileInfo>, reconstructed: &Option<FileInfo>) {
        match (original, reconstructed) {
            (Some(a), Some(b)) => {
                self.fields("file", &a.fields(), &b.fields());
                self.extras("file", &a.extras, &b.extras);
            }
            (Some(_), None) => self.result.push(DiffEntry {
                kind: DiffEntryKind::Missing,
                location: Location::section("file"),
                original_value: None,
                reconstructed_value: None,
            }),
            (None, Some(_)) => self.result.push(DiffEntry {
                kind: DiffEntryKind::Extra,
                location: Location::section("file"),
                original_value: None,
                reconstructed_value: None,
            }),
            (None, None) => {}
        }
    }

    fn param(&mut self, path: &str, original: &Parameter, reconstructed: &Parameter) {
        self.fields(path, &original.fields(), &reconstructed.fields());
        self.string_field(Location::field(path, "id"), &original.id, &reconstructed.id);
        self.string_field(
            Location::field(path, "text_id"),
            &original.text_id,
            &reconstructed.text_id,
        );
        self.raw_cells(path, "raw_tail", &original.raw_tail, &reconstructed.raw_tail);
        self.extras(path, &original.extras, &reconstructed.extras);
    }

    fn enum_set(&mut self, path: &str, original: &EnumSet, reconstructed: &EnumSet) {
        let len = original.entries.len().max(reconstructed.entries.len());
        for i in 0..len {
            match (original.entries.get(i), reconstructed.entries.get(i)) {
                (Some(a), Some(b)) => {
                    if !a.value.semantically_equals(&b.value) {
                        self.result.push(DiffEntry::mismatch(
                            Location::field(path, format!("entry[{i}].value")),
                            a.value.to_string(),
                            b.value.to_string(),
                        ));
                    }
                    if !a.label.semantically_equals(&b.label) {
                        self.result.push(DiffEntry::mismatch(
                            Location::field(path, format!("entry[{i}].label")),
                            a.label.to_string(),
                            b.label.to_string(),
                        ));
                    }
                }
                (Some(a), None) => self.result.push(DiffEntry::missing(
                    Location::field(path, format!("entry[{i}]")),
                    format!("{}, {}", a.value, a.label),
                )),
                (None, Some(b)) => self.result.push(DiffEntry::extra(
                    Location::field(path, format!("entry[{i}]")),
                    format!("{}, {}", b.value, b.label),
                )),
                (None, None) => {}
            }
        }
    }

    fn assembly(&mut self, path: &str, original: &Assembly, reconstructed: &Assembly) {
        self.fields(path, &original.fields(), &reconstructed.fields());
        let len = original.members.len().max(reconstructed.members.len());
        for i in 0..len {
            match (original.members.get(i), reconstructed.members.get(i)) {
                (Some(a), Some(b)) => {
                    self.scalar_field(
                        Location::field(path, format!("member[{i}].size")),
                        &a.size,
                        &b.size,
                    );
                    self.scalar_field(
                        Location::field(path, format!("member[{i}].reference")),
                        &a.reference,
                        &b.reference,
                    );
                }
                (Some(a), None) => self.result.push(DiffEntry::missing(
                    Location::field(path, format!("member[{i}]")),
                    member_text(a),
                )),
                (None, Some(b)) => self.result.push(DiffEntry::extra(
                    Location::field(path, format!("member[{i}]")),
                    member_text(b),
                )),
                (None, None) => {}
            }
        }
        self.raw_cells(path, "raw_tail", &original.raw_tail, &reconstructed.raw_tail);
    }

    fn connection(&mut self, path: &str, original: &Connection, reconstructed: &Connection) {
        self.fields(path, &original.fields(), &reconstructed.fields());
        self.raw_cells(path, "raw_tail", &original.raw_tail, &reconstructed.raw_tail);
    }

    fn tspec(&mut self, path: &str, original: &TSpec, reconstructed: &TSpec) {
        self.fields(path, &original.fields(), &reconstructed.fields());
        self.raw_cells(path, "raw_tail", &original.raw_tail, &reconstructed.raw_tail);
    }

    fn capacity(&mut self, original: &Option<Capacity>, reconstructed: &Option<Capacity>) {
        match (original, reconstructed) {
            (Some(a), Some(b)) => {
                self.fields("capacity", &a.fields(), &b.fields());
                self.extras("capacity", &a.extras, &b.extras);
                self.keyed_records(
                    "capacity/tspecs",
                    &a.tspecs,
                    &b.tspecs,
                    describe_tspec,
                    Self::tspec,
                );
            }
            (Some(_), None) => self.result.push(DiffEntry {
                kind: DiffEntryKind::Missing,
                location: Location::section("capacity"),
                original_value: None,
                reconstructed_value: None,
            }),
            (None, Some(_)) => self.result.push(DiffEntry {
                kind: DiffEntryKind::Extra,
                location: Location::section("capacity"),
                original_value: None,
                reconstructed_value: None,
            }),
            (None, None) => {}
        }
    }

    fn process_data(&mut self, path: &str, original: &ProcessData, reconstructed: &ProcessData) {
        self.fields(path, &original.fields(), &reconstructed.fields());
        let location = Location::field(path, "direction");
        match (original.direction, reconstructed.direction) {
            (Some(a), Some(b)) if a != b => {
                self.result
                    .push(DiffEntry::mismatch(location, a.label(), b.label()));
            }
            (Some(a), None) => self.result.push(DiffEntry::missing(location, a.label())),
            (None, Some(b)) => self.result.push(DiffEntry::extra(location, b.label())),
            _ => {}
        }
        self.string_field(
            Location::field(path, "name_text_id"),
            &original.name_text_id,
            &reconstructed.name_text_id,
        );
        self.extras(path, &original.extras, &reconstructed.extras);
    }

    fn menu(&mut self, path: &str, original: &Menu, reconstructed: &Menu) {
        self.string_field(
            Location::field(path, "name_text_id"),
            &original.name_text_id,
            &reconstructed.name_text_id,
        );
        let len = original.items.len().max(reconstructed.items.len());
        for i in 0..len {
            let location = Location::field(path, format!("item[{i}]"));
            match (original.items.get(i), reconstructed.items.get(i)) {
                (Some(a), Some(b)) => {
                    if a != b {
                        self.result
                            .push(DiffEntry::mismatch(location, item_text(a), item_text(b)));
                    }
                }
                (Some(a), None) => self.result.push(DiffEntry::missing(location, item_text(a))),
                (None, Some(b)) => self.result.push(DiffEntry::extra(location, item_text(b))),
                (None, None) => {}
            }
        }
        self.extras(path, &original.extras, &reconstructed.extras);
    }

    fn texts(&mut self, original: &TextTable, reconstructed: &TextTable) {
        self.string_field(
            Location::field("texts", "primary_language"),
            &original.primary_language,
            &reconstructed.primary_language,
        );
        for (lang, entries) in &original.languages {
            let path = format!("texts/{lang}");
            match reconstructed.languages.get(lang) {
                Some(other) => {
                    for (id, value) in entries {
                        match other.get(id) {
                            Some(new_value) => {
                                if value != new_value {
                                    self.result.push(DiffEntry::mismatch(
                                        Location::field(&path, id),
                                        value,
                                        new_value,
                                    ));
                                }
                            }
                            None => self.result.push(DiffEntry::missing(
                                Location::field(&path, id),
                                value,
                            )),
                        }
                    }
                    for (id, new_value) in other {
                        if !entries.contains_key(id) {
                            self.result.push(DiffEntry::extra(
                                Location::field(&path, id),
                                new_value,
                            ));
                        }
                    }
                }
                None => self.result.push(DiffEntry {
                    kind: DiffEntryKind::Missing,
                    location: Location::section(path),
                    original_value: None,
                    reconstructed_value: None,
                }),
            }
        }
        for lang in reconstructed.languages.keys() {
            if !original.languages.contains_key(lang) {
                self.result.push(DiffEntry {
                    kind: DiffEntryKind::Extra,
                    location: Location::section(format!("texts/{lang}")),
                    original_value: None,
                    reconstructed_value: None,
                });
            }
        }
    }

    fn opaque(&mut self, original: &[OpaqueSection], reconstructed: &[OpaqueSection]) {
        let (first_original, dup_original) = first_sections(original);
        let (first_reconstructed, dup_reconstructed) = first_sections(reconstructed);

        for (name, section) in &first_original {
            let location = Location::section(format!("opaque/{name}"));
            match first_reconstructed.get(name) {
                Some(other) => {
                    // Opaque bodies are verbatim captures: any textual
                    // difference is a real loss, not formatting.
                    if section.body != other.body {
                        self.result.push(DiffEntry::mismatch(
                            location,
                            clip(&section.body),
                            clip(&other.body),
                        ));
                    }
                }
                None => self
                    .result
                    .push(DiffEntry::missing(location, clip(&section.body))),
            }
        }
        for (name, section) in &first_reconstructed {
            if !first_original.contains_key(name) {
                self.result.push(DiffEntry::extra(
                    Location::section(format!("opaque/{name}")),
                    clip(&section.body),
                ));
            }
        }
        for section in dup_original.into_iter().chain(dup_reconstructed) {
            self.result.push(DiffEntry::extra(
                Location::section(format!("opaque/{}", section.name)),
                clip(&section.body),
            ));
        }
    }

    // ------------------------------------------------------------------
    // Shared comparison helpers
    // ------------------------------------------------------------------

    fn keyed_records<K, V, F>(
        &mut self,
        prefix: &str,
        original: &IndexMap<K, V>,
        reconstructed: &IndexMap<K, V>,
        describe: fn(&V) -> Option<String>,
        mut compare: F,
    ) where
        K: std::fmt::Display + std::hash::Hash + Eq,
        F: FnMut(&mut Self, &str, &V, &V),
    {
        for (key, original_record) in original {
            let path = format!("{prefix}/{key}");
            match reconstructed.get(key) {
                Some(new_record) => compare(self, &path, original_record, new_record),
                None => self.result.push(DiffEntry {
                    kind: DiffEntryKind::Missing,
                    location: Location::section(path),
                    original_value: describe(original_record),
                    reconstructed_value: None,
                }),
            }
        }
        for (key, new_record) in reconstructed {
            if !original.contains_key(key) {
                self.result.push(DiffEntry {
                    kind: DiffEntryKind::Extra,
                    location: Location::section(format!("{prefix}/{key}")),
                    original_value: None,
                    reconstructed_value: describe(new_record),
                });
            }
        }
    }

    fn fields(
        &mut self,
        section: &str,
        original: &[(&'static str, &Option<Scalar>)],
        reconstructed: &[(&'static str, &Option<Scalar>)],
    ) {
        for (&(name, original_value), &(_, new_value)) in original.iter().zip(reconstructed) {
            self.scalar_field(Location::field(section, name), original_value, new_value);
        }
    }

    fn scalar_field(
        &mut self,
        location: Location,
        original: &Option<Scalar>,
        reconstructed: &Option<Scalar>,
    ) {
        match (original, reconstructed) {
            (Some(a), Some(b)) => {
                if !a.semantically_equals(b) {
                    self.result
                        .push(DiffEntry::mismatch(location, a.to_string(), b.to_string()));
                }
            }
            (Some(a), None) => self.result.push(DiffEntry::missing(location, a.to_string())),
            (None, Some(b)) => self.result.push(DiffEntry::extra(location, b.to_string())),
            (None, None) => {}
        }
    }

    fn string_field(
        &mut self,
        location: Location,
        original: &Option<String>,
        reconstructed: &Option<String>,
    ) {
        match (original, reconstructed) {
            (Some(a), Some(b)) => {
                if a != b {
                    self.result
                        .push(DiffEntry::mismatch(location, a.as_str(), b.as_str()));
                }
            }
            (Some(a), None) => self.result.push(DiffEntry::missing(location, a.as_str())),
            (None, Some(b)) => self.result.push(DiffEntry::extra(location, b.as_str())),
            (None, None) => {}
        }
    }

    /// Walk two extras bags by key. First occurrence per key is compared;
    /// later duplicates never pair up and each reports as its own extra
    /// occurrence.
    fn extras(&mut self, section: &str, original: &[RawEntry], reconstructed: &[RawEntry]) {
        let (first_original, dup_original) = first_entries(original);
        let (first_reconstructed, dup_reconstructed) = first_entries(reconstructed);

        for (key, entry) in &first_original {
            let location = Location::field(section, *key);
            match first_reconstructed.get(key) {
                Some(other) => self.raw_value(location, &entry.raw, &other.raw),
                None => self
                    .result
                    .push(DiffEntry::missing(location, entry.raw.as_str())),
            }
        }
        for (key, entry) in &first_reconstructed {
            if !first_original.contains_key(key) {
                self.result.push(DiffEntry::extra(
                    Location::field(section, *key),
                    entry.raw.as_str(),
                ));
            }
        }
        for entry in dup_original.into_iter().chain(dup_reconstructed) {
            self.result.push(DiffEntry::extra(
                Location::field(section, entry.key.as_str()),
                entry.raw.as_str(),
            ));
        }
    }

    /// Positional raw cells (`raw_tail`), compared index by index.
    fn raw_cells(&mut self, section: &str, name: &str, original: &[String], reconstructed: &[String]) {
        let len = original.len().max(reconstructed.len());
        for i in 0..len {
            let location = Location::field(section, format!("{name}[{i}]"));
            match (original.get(i), reconstructed.get(i)) {
                (Some(a), Some(b)) => self.raw_value(location, a, b),
                (Some(a), None) => self.result.push(DiffEntry::missing(location, a.as_str())),
                (None, Some(b)) => self.result.push(DiffEntry::extra(location, b.as_str())),
                (None, None) => {}
            }
        }
    }

    /// Compare two raw values: equal text is silent, equal after coercion
    /// is formatting noise, anything else is a mismatch.
    fn raw_value(&mut self, location: Location, original: &str, reconstructed: &str) {
        if original == reconstructed {
            return;
        }
        if self.coerce(original).semantically_equals(&self.coerce(reconstructed)) {
            if self.include_formatting {
                self.result
                    .push(DiffEntry::formatting(location, original, reconstructed));
            }
        } else {
            self.result
                .push(DiffEntry::mismatch(location, original, reconstructed));
        }
    }

    /// Coerce a raw value the way its dialect's parser would.
    fn coerce(&self, raw: &str) -> Scalar {
        match self.format {
            FormatKind::Eds => Scalar::parse(&clean_value(raw)),
            FormatKind::Iodd => Scalar::parse(raw),
        }
    }
}

// ============================================================================
// Record descriptions and rendering helpers
// ============================================================================

fn describe_param(param: &Parameter) -> Option<String> {
    param
        .name
        .as_ref()
        .map(ToString::to_string)
        .or_else(|| param.id.clone())
}

fn describe_enum_set(set: &EnumSet) -> Option<String> {
    Some(format!("{} choices", set.entries.len()))
}

fn describe_assembly(assembly: &Assembly) -> Option<String> {
    assembly.name.as_ref().map(ToString::to_string)
}

fn describe_connection(connection: &Connection) -> Option<String> {
    connection.name.as_ref().map(ToString::to_string)
}

fn describe_tspec(tspec: &TSpec) -> Option<String> {
    tspec.direction.as_ref().map(ToString::to_string)
}

fn describe_process_data(pd: &ProcessData) -> Option<String> {
    pd.direction.map(|d| d.label().to_string())
}

fn describe_menu(menu: &Menu) -> Option<String> {
    menu.name_text_id.clone()
}

fn member_text(member: &AssemblyMember) -> String {
    let size = member.size.as_ref().map_or_else(String::new, ToString::to_string);
    let reference = member
        .reference
        .as_ref()
        .map_or_else(String::new, ToString::to_string);
    format!("{size}, {reference}")
}

fn item_text(item: &MenuItem) -> String {
    format!("{}({})", item.kind.element_name(), item.target_id)
}

/// Split raw entries into first occurrence per key plus later duplicates.
fn first_entries(entries: &[RawEntry]) -> (IndexMap<&str, &RawEntry>, Vec<&RawEntry>) {
    let mut first: IndexMap<&str, &RawEntry> = IndexMap::new();
    let mut duplicates = Vec::new();
    for entry in entries {
        if first.contains_key(entry.key.as_str()) {
            duplicates.push(entry);
        } else {
            first.insert(entry.key.as_str(), entry);
        }
    }
    (first, duplicates)
}

/// Split opaque sections into first occurrence per name plus duplicates.
fn first_sections(sections: &[OpaqueSection]) -> (IndexMap<&str, &OpaqueSection>, Vec<&OpaqueSection>) {
    let mut first: IndexMap<&str, &OpaqueSection> = IndexMap::new();
    let mut duplicates = Vec::new();
    for section in sections {
        if first.contains_key(section.name.as_str()) {
            duplicates.push(section);
        } else {
            first.insert(section.name.as_str(), section);
        }
    }
    (first, duplicates)
}

/// Clamp a verbatim body for use in a diff entry value.
fn clip(text: &str) -> String {
    const MAX_CHARS: usize = 48;
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= MAX_CHARS {
        flat
    } else {
        let head: String = flat.chars().take(MAX_CHARS).collect();
        format!("{head}...")
    }
}
