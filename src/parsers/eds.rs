//! Parser for sectioned-text device descriptions (EDS dialect).
//!
//! The grammar is line-oriented: `[Section]` headers group `key = value;`
//! entries, `$` starts a comment that runs to end of line, and double
//! quotes protect both `$` and the `;` terminator. Record keys (`ParamN`,
//! `AssemN`, `ConnectionN`, `TSpecN`, `EnumN`) carry comma-separated
//! positional fields.
//!
//! Parsing is tolerant: unrecognized keys and sections are retained
//! verbatim with a diagnostic instead of failing, and vendor spellings are
//! folded onto canonical fields through [`SynonymTable`]. The only fatal
//! condition is a document in which no section is recognized at all.

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{
    codes, Assembly, AssemblyMember, Capacity, Connection, DeviceIdentity, DiagnosticCollector,
    EnumEntry, EnumSet, FileInfo, FormatKind, Location, NormalizedDevice, OpaqueSection,
    Parameter, RawEntry, Scalar, TSpec,
};

use super::synonyms::SynonymTable;
use super::traits::{DeviceParser, FormatConfidence, FormatDetection, ParseError, ParseOutcome};

static PARAM_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Param(\d+)$").expect("static regex"));
static ENUM_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Enum(\d+)$").expect("static regex"));
static ASSEMBLY_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Assem(\d+)$").expect("static regex"));
static CONNECTION_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Connection(\d+)$").expect("static regex"));
static TSPEC_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^TSpec(\d+)$").expect("static regex"));

/// Lines scanned by lightweight format detection
const DETECTION_LINES: usize = 200;

// ============================================================================
// Lexical helpers
// ============================================================================

/// One `[Name]` block: header name plus verbatim body lines.
#[derive(Debug)]
struct RawSection {
    name: String,
    body: String,
}

/// Cut an unquoted `$` comment off a single line.
fn cut_comment(line: &str) -> &str {
    let mut in_quote = false;
    for (pos, ch) in line.char_indices() {
        match ch {
            '"' => in_quote = !in_quote,
            '$' if !in_quote => return &line[..pos],
            _ => {}
        }
    }
    line
}

/// True when every line is blank or holds only a `$` comment.
fn is_blank_or_comment(text: &str) -> bool {
    text.split('\n')
        .all(|line| cut_comment(line).trim().is_empty())
}

/// Extract the section name from a header line, if it is one.
fn header_name(line: &str) -> Option<&str> {
    let code = cut_comment(line).trim();
    let inner = code.strip_prefix('[')?.strip_suffix(']')?;
    if inner.is_empty() || inner.contains('[') || inner.contains(']') {
        return None;
    }
    Some(inner)
}

/// Split a document into `[Name]` blocks.
///
/// Content before the first header is tolerated when it is blank or
/// comments only; anything else draws a warning and is dropped.
fn split_sections(content: &str, diagnostics: &mut DiagnosticCollector) -> Vec<RawSection> {
    let mut sections: Vec<RawSection> = Vec::new();
    let mut preamble = String::new();

    // The empty piece after a trailing newline is an artifact of the file
    // ending, not an empty line of the last section.
    let mut lines: Vec<&str> = content.split('\n').collect();
    if content.ends_with('\n') {
        lines.pop();
    }

    for line in lines {
        let check = line.strip_suffix('\r').unwrap_or(line);
        if let Some(name) = header_name(check) {
            sections.push(RawSection {
                name: name.to_string(),
                body: String::new(),
            });
        } else if let Some(section) = sections.last_mut() {
            section.body.push_str(line);
            section.body.push('\n');
        } else {
            preamble.push_str(line);
            preamble.push('\n');
        }
    }

    if !is_blank_or_comment(&preamble) {
        diagnostics.warning(
            codes::MALFORMED_ENTRY,
            Location::section("(preamble)"),
            "content before the first section header was ignored",
        );
    }
    sections
}

/// Split a section body into `;`-terminated entries, verbatim.
///
/// Quotes protect `;` and `$` within a line and never span lines; a `$`
/// comment runs to end of line and may itself contain `;`. The trailing
/// unterminated text, if it holds anything but comments, is returned
/// separately.
fn scan_entries(body: &str) -> (Vec<String>, Option<String>) {
    let mut entries = Vec::new();
    let mut current = String::new();

    for line in body.split('\n') {
        let mut in_quote = false;
        let mut in_comment = false;
        for ch in line.chars() {
            match ch {
                '"' if !in_comment => {
                    in_quote = !in_quote;
                    current.push(ch);
                }
                '$' if !in_quote && !in_comment => {
                    in_comment = true;
                    current.push(ch);
                }
                ';' if !in_quote && !in_comment => {
                    entries.push(std::mem::take(&mut current));
                }
                _ => current.push(ch),
            }
        }
        current.push('\n');
    }

    if is_blank_or_comment(&current) {
        (entries, None)
    } else {
        (entries, Some(current))
    }
}

/// A verbatim entry reduced to its parts.
enum EntrySplit {
    KeyValue { key: String, raw: String },
    Malformed(String),
}

/// Drop the leading blank and comment-only lines of an entry, then split
/// at the first `=`. The raw value keeps inline comments so extras can be
/// replayed verbatim. Returns `None` for whitespace-and-comment entries.
fn prepare_entry(entry: &str) -> Option<EntrySplit> {
    let mut rest = entry;
    while let Some((first, tail)) = rest.split_once('\n') {
        if cut_comment(first).trim().is_empty() {
            rest = tail;
        } else {
            break;
        }
    }
    if is_blank_or_comment(rest) {
        return None;
    }

    let trimmed = rest.trim();
    match trimmed.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Some(EntrySplit::KeyValue {
            key: key.trim().to_string(),
            raw: value.trim().to_string(),
        }),
        _ => Some(EntrySplit::Malformed(trimmed.to_string())),
    }
}

/// Strip comments from a raw value and collapse it onto one line for
/// scalar coercion and field splitting. The diff engine uses the same
/// normalization to tell formatting changes from value changes.
pub(crate) fn clean_value(raw: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for line in raw.split('\n') {
        let code = cut_comment(line).trim();
        if !code.is_empty() {
            parts.push(code);
        }
    }
    parts.join(" ")
}

/// Split a cleaned record value at top-level commas, preserving empty
/// positional slots.
fn split_fields(cleaned: &str) -> Vec<String> {
    if cleaned.trim().is_empty() {
        return Vec::new();
    }

    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quote = false;
    for ch in cleaned.chars() {
        match ch {
            '"' => {
                in_quote = !in_quote;
                current.push(ch);
            }
            ',' if !in_quote => fields.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

/// Clamp arbitrary entry text for use in a diagnostic message.
fn preview(text: &str) -> String {
    const MAX_CHARS: usize = 48;
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= MAX_CHARS {
        flat
    } else {
        let cut: String = flat.chars().take(MAX_CHARS).collect();
        format!("{cut}...")
    }
}

/// Extract the numeric index of a record key like `Param7`.
fn captured_index(re: &Regex, key: &str) -> Option<u32> {
    re.captures(key)?.get(1).and_then(|m| m.as_str().parse().ok())
}

/// Split a section body into prepared `(key, raw, cleaned)` entries,
/// reporting malformed and unterminated text as it goes.
fn entries_of(
    section: &RawSection,
    diagnostics: &mut DiagnosticCollector,
) -> Vec<(String, String, String)> {
    let (entries, leftover) = scan_entries(&section.body);

    let mut out = Vec::new();
    for entry in &entries {
        match prepare_entry(entry) {
            None => {}
            Some(EntrySplit::Malformed(text)) => {
                diagnostics.error(
                    codes::MALFORMED_ENTRY,
                    Location::section(section.name.as_str()),
                    format!("entry without '=' skipped: {}", preview(&text)),
                );
            }
            Some(EntrySplit::KeyValue { key, raw }) => {
                let cleaned = clean_value(&raw);
                out.push((key, raw, cleaned));
            }
        }
    }

    if let Some(tail) = leftover {
        diagnostics.error(
            codes::MALFORMED_ENTRY,
            Location::section(section.name.as_str()),
            format!("unterminated entry skipped: {}", preview(tail.trim())),
        );
    }
    out
}

// ============================================================================
// Record builders
// ============================================================================

/// Fill positional slots from record fields; leftovers go to `raw_tail`
/// with an informational diagnostic.
fn fill_slots(
    slots: Vec<&mut Option<Scalar>>,
    fields: Vec<String>,
    section_name: &str,
    key: &str,
    diagnostics: &mut DiagnosticCollector,
) -> Vec<String> {
    let arity = slots.len();
    let mut iter = fields.into_iter();
    for slot in slots {
        match iter.next() {
            Some(token) => *slot = Some(Scalar::parse(&token)),
            None => break,
        }
    }

    let tail: Vec<String> = iter.collect();
    if !tail.is_empty() {
        diagnostics.info(
            codes::EXCESS_FIELDS,
            Location::field(section_name, key),
            format!(
                "{} field(s) beyond the defined arity of {arity} retained verbatim",
                tail.len()
            ),
        );
    }
    tail
}

fn build_param(
    index: u32,
    key: &str,
    cleaned: &str,
    section_name: &str,
    diagnostics: &mut DiagnosticCollector,
) -> Parameter {
    let mut param = Parameter::new(index);
    let slots = vec![
        &mut param.reserved,
        &mut param.link_path_size,
        &mut param.link_path,
        &mut param.descriptor,
        &mut param.data_type,
        &mut param.data_size,
        &mut param.name,
        &mut param.units,
        &mut param.help,
        &mut param.min,
        &mut param.max,
        &mut param.default_value,
    ];
    param.raw_tail = fill_slots(slots, split_fields(cleaned), section_name, key, diagnostics);
    param
}

fn build_enum(
    index: u32,
    key: &str,
    cleaned: &str,
    section_name: &str,
    diagnostics: &mut DiagnosticCollector,
) -> EnumSet {
    let mut set = EnumSet {
        param_index: index,
        entries: Vec::new(),
    };

    let mut iter = split_fields(cleaned).into_iter();
    while let Some(value) = iter.next() {
        let label = iter.next();
        if label.is_none() {
            diagnostics.warning(
                codes::MALFORMED_ENTRY,
                Location::field(section_name, key),
                "unpaired trailing enumeration value kept with an empty label",
            );
        }
        set.entries.push(EnumEntry {
            value: Scalar::parse(&value),
            label: Scalar::parse(label.as_deref().unwrap_or("")),
        });
    }
    set
}

fn build_assembly(
    index: u32,
    key: &str,
    cleaned: &str,
    section_name: &str,
    diagnostics: &mut DiagnosticCollector,
) -> Assembly {
    let mut assembly = Assembly::new(index);
    let mut iter = split_fields(cleaned).into_iter();

    for slot in [
        &mut assembly.name,
        &mut assembly.path,
        &mut assembly.size,
        &mut assembly.descriptor,
        &mut assembly.reserved1,
        &mut assembly.reserved2,
    ] {
        match iter.next() {
            Some(token) => *slot = Some(Scalar::parse(&token)),
            None => break,
        }
    }

    loop {
        let Some(size) = iter.next() else { break };
        match iter.next() {
            Some(reference) => assembly.members.push(AssemblyMember {
                size: Some(Scalar::parse(&size)),
                reference: Some(Scalar::parse(&reference)),
            }),
            None => {
                diagnostics.warning(
                    codes::MALFORMED_ENTRY,
                    Location::field(section_name, key),
                    "unpaired trailing member field retained verbatim",
                );
                assembly.raw_tail.push(size);
            }
        }
    }
    assembly
}

fn build_connection(
    index: u32,
    key: &str,
    cleaned: &str,
    section_name: &str,
    diagnostics: &mut DiagnosticCollector,
) -> Connection {
    let mut connection = Connection::new(index);
    let slots = vec![
        &mut connection.trigger_transport,
        &mut connection.connection_parameters,
        &mut connection.o2t_rpi,
        &mut connection.o2t_size,
        &mut connection.o2t_format,
        &mut connection.t2o_rpi,
        &mut connection.t2o_size,
        &mut connection.t2o_format,
        &mut connection.config_size,
        &mut connection.config_format,
        &mut connection.name,
        &mut connection.help,
        &mut connection.path,
    ];
    connection.raw_tail =
        fill_slots(slots, split_fields(cleaned), section_name, key, diagnostics);
    connection
}

fn build_tspec(
    index: u32,
    key: &str,
    cleaned: &str,
    section_name: &str,
    diagnostics: &mut DiagnosticCollector,
) -> TSpec {
    let mut tspec = TSpec {
        index,
        ..TSpec::default()
    };
    let slots = vec![&mut tspec.direction, &mut tspec.rate, &mut tspec.size];
    tspec.raw_tail = fill_slots(slots, split_fields(cleaned), section_name, key, diagnostics);
    tspec
}

// ============================================================================
// Synonym-driven sections
// ============================================================================

/// A model struct whose fields are filled by canonical name.
trait SynonymTarget {
    fn slot(&mut self, canonical: &str) -> Option<&mut Option<Scalar>>;
    fn extras(&mut self) -> &mut Vec<RawEntry>;
}

impl SynonymTarget for DeviceIdentity {
    fn slot(&mut self, canonical: &str) -> Option<&mut Option<Scalar>> {
        Some(match canonical {
            "vendor_id" => &mut self.vendor_id,
            "vendor_name" => &mut self.vendor_name,
            "product_type" => &mut self.product_type,
            "product_type_string" => &mut self.product_type_string,
            "product_code" => &mut self.product_code,
            "major_revision" => &mut self.major_revision,
            "minor_revision" => &mut self.minor_revision,
            "product_name" => &mut self.product_name,
            "catalog" => &mut self.catalog,
            _ => return None,
        })
    }

    fn extras(&mut self) -> &mut Vec<RawEntry> {
        &mut self.extras
    }
}

impl SynonymTarget for FileInfo {
    fn slot(&mut self, canonical: &str) -> Option<&mut Option<Scalar>> {
        Some(match canonical {
            "description" => &mut self.description,
            "creation_date" => &mut self.creation_date,
            "creation_time" => &mut self.creation_time,
            "modification_date" => &mut self.modification_date,
            "modification_time" => &mut self.modification_time,
            "revision" => &mut self.revision,
            "home_url" => &mut self.home_url,
            _ => return None,
        })
    }

    fn extras(&mut self) -> &mut Vec<RawEntry> {
        &mut self.extras
    }
}

impl SynonymTarget for Capacity {
    fn slot(&mut self, canonical: &str) -> Option<&mut Option<Scalar>> {
        Some(match canonical {
            "max_io_connections" => &mut self.max_io_connections,
            "max_msg_connections" => &mut self.max_msg_connections,
            "max_io_producers" => &mut self.max_io_producers,
            "max_io_consumers" => &mut self.max_io_consumers,
            _ => return None,
        })
    }

    fn extras(&mut self) -> &mut Vec<RawEntry> {
        &mut self.extras
    }
}

// ============================================================================
// Parser
// ============================================================================

/// Parser for the sectioned-text dialect.
pub struct EdsParser {
    synonyms: SynonymTable,
}

impl EdsParser {
    /// Create a parser with the built-in synonym table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            synonyms: SynonymTable::with_builtins(),
        }
    }

    /// Create a parser with a caller-supplied synonym table.
    #[must_use]
    pub fn with_synonyms(synonyms: SynonymTable) -> Self {
        Self { synonyms }
    }

    /// Route one `key = value` entry through the synonym table onto a
    /// target struct.
    ///
    /// A key may feed several canonical fields (combined vendor keys); a
    /// non-primary spelling is additionally recorded verbatim in extras so
    /// reconstruction can replay the original line. First occurrence wins
    /// on duplicates.
    fn apply_keyed_entry(
        &self,
        section_name: &str,
        table_section: &str,
        target: &mut dyn SynonymTarget,
        key: &str,
        raw: &str,
        cleaned: &str,
        diagnostics: &mut DiagnosticCollector,
    ) {
        let hits = self.synonyms.resolve(table_section, key);
        if hits.is_empty() {
            diagnostics.warning(
                codes::UNKNOWN_FIELD,
                Location::field(section_name, key),
                format!("unrecognized key '{key}' retained verbatim"),
            );
            target.extras().push(RawEntry::new(key, raw));
            return;
        }

        let value = Scalar::parse(cleaned);
        let mut assigned: Vec<&str> = Vec::new();
        let mut needs_raw_record = false;
        for hit in &hits {
            let Some(field) = target.slot(hit.canonical) else {
                diagnostics.warning(
                    codes::UNKNOWN_FIELD,
                    Location::field(section_name, key),
                    format!(
                        "synonym table maps '{key}' to unknown field '{}'",
                        hit.canonical
                    ),
                );
                continue;
            };
            if field.is_some() {
                diagnostics.warning(
                    codes::DUPLICATE_KEY,
                    Location::field(section_name, key),
                    format!(
                        "duplicate value for '{}' ignored (first occurrence wins)",
                        hit.canonical
                    ),
                );
            } else {
                *field = Some(value.clone());
                assigned.push(hit.canonical);
                if !hit.is_primary_spelling {
                    needs_raw_record = true;
                }
            }
        }

        if needs_raw_record {
            target.extras().push(RawEntry::new(key, raw));
            diagnostics.info(
                codes::SYNONYM_RESOLVED,
                Location::field(section_name, key),
                format!("vendor key '{key}' recorded as '{}'", assigned.join("', '")),
            );
        }
    }

    fn parse_device_section(
        &self,
        section: &RawSection,
        model: &mut NormalizedDevice,
        diagnostics: &mut DiagnosticCollector,
    ) {
        for (key, raw, cleaned) in entries_of(section, diagnostics) {
            self.apply_keyed_entry(
                &section.name,
                "device",
                &mut model.identity,
                &key,
                &raw,
                &cleaned,
                diagnostics,
            );
        }
    }

    fn parse_file_section(
        &self,
        section: &RawSection,
        model: &mut NormalizedDevice,
        diagnostics: &mut DiagnosticCollector,
    ) {
        let file_info = model.file_info.get_or_insert_with(FileInfo::default);
        for (key, raw, cleaned) in entries_of(section, diagnostics) {
            self.apply_keyed_entry(
                &section.name,
                "file",
                file_info,
                &key,
                &raw,
                &cleaned,
                diagnostics,
            );
        }
    }

    fn parse_params_section(
        &self,
        section: &RawSection,
        model: &mut NormalizedDevice,
        diagnostics: &mut DiagnosticCollector,
    ) {
        for (key, raw, cleaned) in entries_of(section, diagnostics) {
            if let Some(index) = captured_index(&PARAM_KEY, &key) {
                if model.params.contains_key(&index) {
                    report_duplicate_record(&section.name, &key, diagnostics);
                    continue;
                }
                let param = build_param(index, &key, &cleaned, &section.name, diagnostics);
                model.params.insert(index, param);
            } else if let Some(index) = captured_index(&ENUM_KEY, &key) {
                if model.enums.contains_key(&index) {
                    report_duplicate_record(&section.name, &key, diagnostics);
                    continue;
                }
                let set = build_enum(index, &key, &cleaned, &section.name, diagnostics);
                model.enums.insert(index, set);
            } else {
                diagnostics.warning(
                    codes::UNKNOWN_FIELD,
                    Location::field(section.name.as_str(), key.as_str()),
                    format!("unrecognized key '{key}' retained verbatim"),
                );
                model.param_extras.push(RawEntry::new(key, raw));
            }
        }
    }

    fn parse_assembly_section(
        &self,
        section: &RawSection,
        model: &mut NormalizedDevice,
        diagnostics: &mut DiagnosticCollector,
    ) {
        for (key, raw, cleaned) in entries_of(section, diagnostics) {
            if let Some(index) = captured_index(&ASSEMBLY_KEY, &key) {
                if model.assemblies.contains_key(&index) {
                    report_duplicate_record(&section.name, &key, diagnostics);
                    continue;
                }
                let assembly = build_assembly(index, &key, &cleaned, &section.name, diagnostics);
                model.assemblies.insert(index, assembly);
            } else {
                diagnostics.warning(
                    codes::UNKNOWN_FIELD,
                    Location::field(section.name.as_str(), key.as_str()),
                    format!("unrecognized key '{key}' retained verbatim"),
                );
                model.assembly_extras.push(RawEntry::new(key, raw));
            }
        }
    }

    fn parse_connections_section(
        &self,
        section: &RawSection,
        model: &mut NormalizedDevice,
        diagnostics: &mut DiagnosticCollector,
    ) {
        for (key, raw, cleaned) in entries_of(section, diagnostics) {
            if let Some(index) = captured_index(&CONNECTION_KEY, &key) {
                if model.connections.contains_key(&index) {
                    report_duplicate_record(&section.name, &key, diagnostics);
                    continue;
                }
                let connection =
                    build_connection(index, &key, &cleaned, &section.name, diagnostics);
                model.connections.insert(index, connection);
            } else {
                diagnostics.warning(
                    codes::UNKNOWN_FIELD,
                    Location::field(section.name.as_str(), key.as_str()),
                    format!("unrecognized key '{key}' retained verbatim"),
                );
                model.connection_extras.push(RawEntry::new(key, raw));
            }
        }
    }

    fn parse_capacity_section(
        &self,
        section: &RawSection,
        model: &mut NormalizedDevice,
        diagnostics: &mut DiagnosticCollector,
    ) {
        let capacity = model.capacity.get_or_insert_with(Capacity::default);
        for (key, raw, cleaned) in entries_of(section, diagnostics) {
            if let Some(index) = captured_index(&TSPEC_KEY, &key) {
                if capacity.tspecs.contains_key(&index) {
                    report_duplicate_record(&section.name, &key, diagnostics);
                    continue;
                }
                let tspec = build_tspec(index, &key, &cleaned, &section.name, diagnostics);
                capacity.tspecs.insert(index, tspec);
            } else {
                self.apply_keyed_entry(
                    &section.name,
                    "capacity",
                    capacity,
                    &key,
                    &raw,
                    &cleaned,
                    diagnostics,
                );
            }
        }
    }

    /// Route a section to its handler. Returns false for sections the
    /// grammar does not recognize.
    fn dispatch_section(
        &self,
        section: &RawSection,
        model: &mut NormalizedDevice,
        diagnostics: &mut DiagnosticCollector,
    ) -> bool {
        match section.name.as_str() {
            "Device" => self.parse_device_section(section, model, diagnostics),
            "File" => self.parse_file_section(section, model, diagnostics),
            "Params" => self.parse_params_section(section, model, diagnostics),
            "Assembly" => self.parse_assembly_section(section, model, diagnostics),
            "Connection Manager" => self.parse_connections_section(section, model, diagnostics),
            "Capacity" => self.parse_capacity_section(section, model, diagnostics),
            _ => return false,
        }
        true
    }
}

fn report_duplicate_record(section_name: &str, key: &str, diagnostics: &mut DiagnosticCollector) {
    diagnostics.warning(
        codes::DUPLICATE_KEY,
        Location::field(section_name, key),
        format!("duplicate record '{key}' ignored (first occurrence wins)"),
    );
}

impl Default for EdsParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceParser for EdsParser {
    fn parse_str(&self, content: &str) -> Result<ParseOutcome, ParseError> {
        let mut diagnostics = DiagnosticCollector::new();
        let mut model = NormalizedDevice::new(FormatKind::Eds);
        let mut recognized = 0usize;

        for section in split_sections(content, &mut diagnostics) {
            if self.dispatch_section(&section, &mut model, &mut diagnostics) {
                recognized += 1;
            } else {
                diagnostics.info(
                    codes::UNKNOWN_SECTION,
                    Location::section(section.name.as_str()),
                    format!("unrecognized section [{}] retained verbatim", section.name),
                );
                model.opaque_sections.push(OpaqueSection {
                    name: section.name,
                    body: section.body,
                });
            }
        }

        if recognized == 0 {
            return Err(ParseError::NoRecognizedSections {
                diagnostics: diagnostics.into_vec(),
            });
        }

        model.calculate_content_hash();
        Ok(ParseOutcome::new(model, diagnostics.into_vec()))
    }

    fn format(&self) -> FormatKind {
        FormatKind::Eds
    }

    fn detect(&self, content: &str) -> FormatDetection {
        let mut saw_header = false;
        let mut saw_known_header = false;
        let mut saw_entry = false;
        let mut revision: Option<String> = None;
        let mut first_content = true;

        for line in content.lines().take(DETECTION_LINES) {
            let code = cut_comment(line).trim();
            if code.is_empty() {
                continue;
            }
            if first_content && code.starts_with('<') {
                // XML prolog or root element
                return FormatDetection::no_match();
            }
            first_content = false;

            if let Some(name) = header_name(code) {
                saw_header = true;
                if matches!(
                    name,
                    "Device" | "File" | "Params" | "Assembly" | "Connection Manager" | "Capacity"
                ) {
                    saw_known_header = true;
                }
            } else if let Some((key, value)) = code.split_once('=') {
                saw_entry = true;
                if revision.is_none() && key.trim() == "Revision" {
                    let value = value.trim().trim_end_matches(';').trim();
                    if !value.is_empty() {
                        revision = Some(value.to_string());
                    }
                }
            }
        }

        let confidence = if saw_known_header && saw_entry {
            FormatConfidence::CERTAIN
        } else if saw_known_header {
            FormatConfidence::HIGH
        } else if saw_header && saw_entry {
            FormatConfidence::MEDIUM
        } else if saw_header {
            FormatConfidence::LOW
        } else {
            return FormatDetection::no_match();
        };

        let mut detection =
            FormatDetection::with_confidence(confidence).variant("sectioned-text");
        if let Some(revision) = &revision {
            detection = detection.version(revision);
        }
        detection
    }
}
