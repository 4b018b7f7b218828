//! Parser for XML device descriptions (IODD dialect).
//!
//! The walker follows a fixed hierarchy under the `IODevice` root: device
//! identity, variable collection, process data collection, the menu tree
//! and the external text collection. User-visible strings are indirect
//! (elements carry a `textId`); the parser stores the language-keyed text
//! table and leaves resolution to a later [`TextResolver`] binding.
//!
//! [`TextResolver`]: crate::model::TextResolver
//!
//! Parsing is best-effort: a missing required attribute downgrades the
//! element to partial with an `Error` diagnostic instead of dropping it,
//! unknown attributes and empty elements are retained verbatim in the
//! owning record's extras, and unknown subtrees are captured as opaque
//! sections. Only an unparseable or wrong root element is fatal.
//!
//! Verbatim retention convention inside an extras bag: a key of `@attr`
//! is an attribute of the owning element, `Elem` is an empty child
//! element whose raw attribute text is the value, and `Elem@attr`
//! decorates a templated child element. Root element attributes land in
//! the identity extras under `IODevice@attr`.

use std::sync::LazyLock;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;

use crate::model::{
    codes, DiagnosticCollector, FormatKind, Location, Menu, MenuItem, MenuItemKind,
    NormalizedDevice, OpaqueSection, Parameter, PdDirection, ProcessData, RawEntry, Scalar,
};

use super::traits::{DeviceParser, FormatConfidence, FormatDetection, ParseError, ParseOutcome};

static DOCINFO_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<DocumentInfo[^>]*\bversion\s*=\s*"([^"]*)""#).expect("static regex")
});

/// Extract the local part of a possibly-prefixed XML name.
fn local_name(name: &[u8]) -> String {
    let name = String::from_utf8_lossy(name);
    name.rsplit(':').next().unwrap_or(&name).to_string()
}

/// Attribute list with both the raw (as written) and local key.
fn collect_attributes(e: &BytesStart) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for attr in e.attributes().flatten() {
        let raw_key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let value = match attr.unescape_value() {
            Ok(value) => value.to_string(),
            Err(_) => String::from_utf8_lossy(&attr.value).to_string(),
        };
        out.push((raw_key, value));
    }
    out
}

/// The raw attribute text of a tag, for verbatim retention.
fn raw_attribute_text(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.attributes_raw())
        .trim()
        .to_string()
}

/// Rebuild the verbatim opening tag (without angle brackets).
fn raw_tag_text(e: &BytesStart) -> String {
    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
    let attrs = String::from_utf8_lossy(e.attributes_raw()).to_string();
    format!("{name}{attrs}")
}

/// Event-driven walker state for one document.
struct IoddWalker {
    model: NormalizedDevice,
    diagnostics: DiagnosticCollector,
    stack: Vec<String>,
    saw_root: bool,
    fatal_root: Option<String>,
    variable: Option<Parameter>,
    pd: Option<ProcessData>,
    pd_wrapper_id: Option<String>,
    menu: Option<Menu>,
    language: Option<String>,
    next_param_index: u32,
    synthetic_counter: u32,
}

impl IoddWalker {
    fn new() -> Self {
        Self {
            model: NormalizedDevice::new(FormatKind::Iodd),
            diagnostics: DiagnosticCollector::new(),
            stack: Vec::new(),
            saw_root: false,
            fatal_root: None,
            variable: None,
            pd: None,
            pd_wrapper_id: None,
            menu: None,
            language: None,
            next_param_index: 1,
            synthetic_counter: 0,
        }
    }

    fn parent(&self) -> &str {
        self.stack.last().map_or("", String::as_str)
    }

    /// Element path for diagnostics, with `name` appended.
    fn path_with(&self, name: &str) -> String {
        if self.stack.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.stack.join("/"), name)
        }
    }

    fn synthetic_key(&mut self, kind: &str) -> String {
        self.synthetic_counter += 1;
        format!("__{kind}-{}", self.synthetic_counter)
    }

    // ------------------------------------------------------------------
    // Element openers
    // ------------------------------------------------------------------

    fn open_root(&mut self, e: &BytesStart) {
        self.saw_root = true;
        // Namespace declarations and schema attributes are expected
        // plumbing; retain them verbatim without diagnostics.
        for (raw_key, value) in collect_attributes(e) {
            self.model
                .identity
                .extras
                .push(RawEntry::new(format!("IODevice@{raw_key}"), value));
        }
    }

    fn open_identity(&mut self, e: &BytesStart, path: &str) {
        let mut saw_vendor_id = false;
        let mut saw_device_id = false;

        for (raw_key, value) in collect_attributes(e) {
            match local_name(raw_key.as_bytes()).as_str() {
                "vendorId" => {
                    saw_vendor_id = true;
                    self.model.identity.vendor_id = Some(Scalar::parse(&value));
                }
                "vendorName" => {
                    self.model.identity.vendor_name = Some(Scalar::parse(&value));
                }
                "deviceId" => {
                    saw_device_id = true;
                    self.model.identity.product_code = Some(Scalar::parse(&value));
                }
                _ => {
                    self.diagnostics.warning(
                        codes::UNKNOWN_FIELD,
                        Location::field(path, raw_key.as_str()),
                        format!("unrecognized attribute '{raw_key}' retained verbatim"),
                    );
                    self.model
                        .identity
                        .extras
                        .push(RawEntry::new(format!("@{raw_key}"), value));
                }
            }
        }

        for (attr, seen) in [("vendorId", saw_vendor_id), ("deviceId", saw_device_id)] {
            if !seen {
                self.diagnostics.error(
                    codes::MISSING_ATTRIBUTE,
                    Location::field(path, attr),
                    format!("required attribute '{attr}' is missing"),
                );
            }
        }
    }

    /// `VendorText` / `DeviceName` text references under the identity.
    fn open_identity_text_ref(&mut self, name: &str, e: &BytesStart, path: &str) {
        let mut text_id = None;
        for (raw_key, value) in collect_attributes(e) {
            if local_name(raw_key.as_bytes()) == "textId" {
                text_id = Some(value);
            } else {
                self.diagnostics.warning(
                    codes::INVALID_ATTRIBUTE,
                    Location::field(path, raw_key.as_str()),
                    format!("unsupported attribute '{raw_key}' on {name} ignored"),
                );
            }
        }

        if text_id.is_none() {
            self.diagnostics.error(
                codes::MISSING_ATTRIBUTE,
                Location::field(path, "textId"),
                format!("required attribute 'textId' is missing on {name}"),
            );
        }
        match name {
            "VendorText" => self.model.identity.vendor_text_id = text_id,
            _ => self.model.identity.device_name_text_id = text_id,
        }
    }

    fn open_variable(&mut self, e: &BytesStart, path: &str) {
        let mut param = Parameter::new(0);
        let mut index: Option<u32> = None;

        for (raw_key, value) in collect_attributes(e) {
            match local_name(raw_key.as_bytes()).as_str() {
                "id" => param.id = Some(value),
                "index" => match value.parse::<u32>() {
                    Ok(parsed) => index = Some(parsed),
                    Err(_) => {
                        self.diagnostics.error(
                            codes::INVALID_ATTRIBUTE,
                            Location::field(path, "index"),
                            format!("index '{value}' is not a non-negative integer"),
                        );
                    }
                },
                "accessRights" => param.access_rights = Some(Scalar::parse(&value)),
                "defaultValue" => param.default_value = Some(Scalar::parse(&value)),
                _ => {
                    self.diagnostics.warning(
                        codes::UNKNOWN_FIELD,
                        Location::field(path, raw_key.as_str()),
                        format!("unrecognized attribute '{raw_key}' retained verbatim"),
                    );
                    param.extras.push(RawEntry::new(format!("@{raw_key}"), value));
                }
            }
        }

        if param.id.is_none() {
            self.diagnostics.error(
                codes::MISSING_ATTRIBUTE,
                Location::field(path, "id"),
                "required attribute 'id' is missing; variable kept without one",
            );
        }
        param.index = match index {
            Some(index) => index,
            None => {
                self.diagnostics.error(
                    codes::MISSING_ATTRIBUTE,
                    Location::field(path, "index"),
                    format!(
                        "required attribute 'index' is missing; assigned {}",
                        self.next_param_index
                    ),
                );
                self.next_param_index
            }
        };
        self.variable = Some(param);
    }

    fn finalize_variable(&mut self, path: &str) {
        let Some(param) = self.variable.take() else {
            return;
        };
        if self.model.params.contains_key(&param.index) {
            self.diagnostics.warning(
                codes::DUPLICATE_KEY,
                Location::field(path, "index"),
                format!(
                    "duplicate variable index {} ignored (first occurrence wins)",
                    param.index
                ),
            );
            return;
        }
        self.next_param_index = self.next_param_index.max(param.index.saturating_add(1));
        self.model.params.insert(param.index, param);
    }

    fn open_datatype(&mut self, e: &BytesStart, path: &str) {
        enum Owner {
            Variable,
            ProcessData,
        }
        let owner = if self.variable.is_some() {
            Owner::Variable
        } else {
            Owner::ProcessData
        };

        for (raw_key, value) in collect_attributes(e) {
            match (local_name(raw_key.as_bytes()).as_str(), &owner) {
                ("type", Owner::Variable) => {
                    if let Some(param) = self.variable.as_mut() {
                        param.data_type = Some(Scalar::parse(&value));
                    }
                }
                ("bitLength", Owner::Variable) => {
                    if let Some(param) = self.variable.as_mut() {
                        param.data_size = Some(Scalar::parse(&value));
                    }
                }
                ("type", Owner::ProcessData) => {
                    if let Some(pd) = self.pd.as_mut() {
                        pd.datatype = Some(Scalar::parse(&value));
                    }
                }
                ("bitLength", Owner::ProcessData) => {
                    if let Some(pd) = self.pd.as_mut() {
                        if pd.bit_length.is_none() {
                            pd.bit_length = Some(Scalar::parse(&value));
                        }
                    }
                }
                _ => {
                    self.diagnostics.warning(
                        codes::UNKNOWN_FIELD,
                        Location::field(path, raw_key.as_str()),
                        format!("unrecognized attribute '{raw_key}' retained verbatim"),
                    );
                    let entry = RawEntry::new(format!("Datatype@{raw_key}"), value);
                    match &owner {
                        Owner::Variable => {
                            if let Some(param) = self.variable.as_mut() {
                                param.extras.push(entry);
                            }
                        }
                        Owner::ProcessData => {
                            if let Some(pd) = self.pd.as_mut() {
                                pd.extras.push(entry);
                            }
                        }
                    }
                }
            }
        }
    }

    fn open_value_range(&mut self, e: &BytesStart, path: &str) {
        for (raw_key, value) in collect_attributes(e) {
            match local_name(raw_key.as_bytes()).as_str() {
                "lowerValue" => {
                    if let Some(param) = self.variable.as_mut() {
                        param.min = Some(Scalar::parse(&value));
                    }
                }
                "upperValue" => {
                    if let Some(param) = self.variable.as_mut() {
                        param.max = Some(Scalar::parse(&value));
                    }
                }
                _ => {
                    self.diagnostics.warning(
                        codes::INVALID_ATTRIBUTE,
                        Location::field(path, raw_key.as_str()),
                        format!("unsupported attribute '{raw_key}' on ValueRange ignored"),
                    );
                }
            }
        }
    }

    /// `Name` text references on variables, process data and menus.
    fn open_name_ref(&mut self, e: &BytesStart, path: &str) {
        let mut text_id = None;
        for (raw_key, value) in collect_attributes(e) {
            if local_name(raw_key.as_bytes()) == "textId" {
                text_id = Some(value);
            } else {
                self.diagnostics.warning(
                    codes::INVALID_ATTRIBUTE,
                    Location::field(path, raw_key.as_str()),
                    format!("unsupported attribute '{raw_key}' on Name ignored"),
                );
            }
        }
        if text_id.is_none() {
            self.diagnostics.error(
                codes::MISSING_ATTRIBUTE,
                Location::field(path, "textId"),
                "required attribute 'textId' is missing on Name",
            );
            return;
        }

        if let Some(param) = self.variable.as_mut() {
            param.text_id = text_id;
        } else if let Some(pd) = self.pd.as_mut() {
            pd.name_text_id = text_id;
        } else if let Some(menu) = self.menu.as_mut() {
            menu.name_text_id = text_id;
        }
    }

    fn open_process_data(&mut self, name: &str, e: &BytesStart, path: &str) {
        let direction = if name == "ProcessDataIn" {
            PdDirection::In
        } else {
            PdDirection::Out
        };

        let mut id: Option<String> = None;
        let mut bit_length: Option<Scalar> = None;
        let mut extras: Vec<RawEntry> = Vec::new();
        for (raw_key, value) in collect_attributes(e) {
            match local_name(raw_key.as_bytes()).as_str() {
                "id" => id = Some(value),
                "bitLength" => bit_length = Some(Scalar::parse(&value)),
                _ => {
                    self.diagnostics.warning(
                        codes::UNKNOWN_FIELD,
                        Location::field(path, raw_key.as_str()),
                        format!("unrecognized attribute '{raw_key}' retained verbatim"),
                    );
                    extras.push(RawEntry::new(format!("@{raw_key}"), value));
                }
            }
        }

        let id = id.or_else(|| self.pd_wrapper_id.clone()).unwrap_or_else(|| {
            let key = self.synthetic_key("unidentified");
            self.diagnostics.error(
                codes::MISSING_ATTRIBUTE,
                Location::field(path, "id"),
                format!("required attribute 'id' is missing; assigned '{key}'"),
            );
            key
        });

        let mut pd = ProcessData::new(id);
        pd.direction = Some(direction);
        pd.bit_length = bit_length;
        pd.extras = extras;
        self.pd = Some(pd);
    }

    fn finalize_process_data(&mut self, path: &str) {
        let Some(pd) = self.pd.take() else {
            return;
        };
        if self.model.process_data.contains_key(&pd.id) {
            self.diagnostics.warning(
                codes::DUPLICATE_KEY,
                Location::field(path, "id"),
                format!(
                    "duplicate process data id '{}' ignored (first occurrence wins)",
                    pd.id
                ),
            );
            return;
        }
        self.model.process_data.insert(pd.id.clone(), pd);
    }

    fn open_pd_wrapper(&mut self, e: &BytesStart, path: &str) {
        for (raw_key, value) in collect_attributes(e) {
            if local_name(raw_key.as_bytes()) == "id" {
                self.pd_wrapper_id = Some(value);
            } else {
                self.diagnostics.warning(
                    codes::INVALID_ATTRIBUTE,
                    Location::field(path, raw_key.as_str()),
                    format!("unsupported attribute '{raw_key}' on ProcessData ignored"),
                );
            }
        }
    }

    fn open_menu(&mut self, e: &BytesStart, path: &str) {
        let mut menu = Menu::new(String::new());
        let mut saw_id = false;
        for (raw_key, value) in collect_attributes(e) {
            if local_name(raw_key.as_bytes()) == "id" {
                menu.id = value;
                saw_id = true;
            } else {
                self.diagnostics.warning(
                    codes::UNKNOWN_FIELD,
                    Location::field(path, raw_key.as_str()),
                    format!("unrecognized attribute '{raw_key}' retained verbatim"),
                );
                menu.extras.push(RawEntry::new(format!("@{raw_key}"), value));
            }
        }
        if !saw_id {
            menu.id = self.synthetic_key("unidentified");
            self.diagnostics.error(
                codes::MISSING_ATTRIBUTE,
                Location::field(path, "id"),
                format!("required attribute 'id' is missing; assigned '{}'", menu.id),
            );
        }
        self.menu = Some(menu);
    }

    fn finalize_menu(&mut self, path: &str) {
        let Some(menu) = self.menu.take() else {
            return;
        };
        if self.model.menus.contains_key(&menu.id) {
            self.diagnostics.warning(
                codes::DUPLICATE_KEY,
                Location::field(path, "id"),
                format!("duplicate menu id '{}' ignored (first occurrence wins)", menu.id),
            );
            return;
        }
        self.model.menus.insert(menu.id.clone(), menu);
    }

    fn open_menu_item(&mut self, name: &str, e: &BytesStart, path: &str) {
        let (kind, id_attr) = match name {
            "VariableRef" => (MenuItemKind::VariableRef, "variableId"),
            "MenuRef" => (MenuItemKind::MenuRef, "menuId"),
            _ => (MenuItemKind::RecordItemRef, "variableId"),
        };

        let mut target_id = None;
        for (raw_key, value) in collect_attributes(e) {
            if local_name(raw_key.as_bytes()) == id_attr {
                target_id = Some(value);
            } else {
                self.diagnostics.warning(
                    codes::INVALID_ATTRIBUTE,
                    Location::field(path, raw_key.as_str()),
                    format!("unsupported attribute '{raw_key}' on {name} ignored"),
                );
            }
        }

        let Some(target_id) = target_id else {
            self.diagnostics.error(
                codes::MISSING_ATTRIBUTE,
                Location::field(path, id_attr),
                format!("required attribute '{id_attr}' is missing; {name} skipped"),
            );
            return;
        };
        if let Some(menu) = self.menu.as_mut() {
            menu.items.push(MenuItem { kind, target_id });
        }
    }

    fn open_language(&mut self, name: &str, e: &BytesStart, path: &str) {
        let mut lang = None;
        for (raw_key, value) in collect_attributes(e) {
            if local_name(raw_key.as_bytes()) == "lang" {
                lang = Some(value);
            } else {
                self.diagnostics.warning(
                    codes::INVALID_ATTRIBUTE,
                    Location::field(path, raw_key.as_str()),
                    format!("unsupported attribute '{raw_key}' on {name} ignored"),
                );
            }
        }

        let lang = lang.unwrap_or_else(|| {
            let key = self.synthetic_key("language");
            self.diagnostics.error(
                codes::MISSING_ATTRIBUTE,
                Location::field(path, "xml:lang"),
                format!("required attribute 'xml:lang' is missing; assigned '{key}'"),
            );
            key
        });

        if name == "PrimaryLanguage" {
            if self.model.texts.primary_language.is_none() {
                self.model.texts.primary_language = Some(lang.clone());
            } else {
                self.diagnostics.warning(
                    codes::DUPLICATE_KEY,
                    Location::section(path),
                    "duplicate PrimaryLanguage ignored (first occurrence wins)",
                );
            }
        }
        self.language = Some(lang);
    }

    fn open_text(&mut self, e: &BytesStart, path: &str) {
        let Some(language) = self.language.clone() else {
            return;
        };

        let mut id = None;
        let mut value = None;
        for (raw_key, attr_value) in collect_attributes(e) {
            match local_name(raw_key.as_bytes()).as_str() {
                "id" => id = Some(attr_value),
                "value" => value = Some(attr_value),
                _ => {
                    self.diagnostics.warning(
                        codes::INVALID_ATTRIBUTE,
                        Location::field(path, raw_key.as_str()),
                        format!("unsupported attribute '{raw_key}' on Text ignored"),
                    );
                }
            }
        }

        let id = id.unwrap_or_else(|| {
            let key = self.synthetic_key("text");
            self.diagnostics.error(
                codes::MISSING_ATTRIBUTE,
                Location::field(path, "id"),
                format!("required attribute 'id' is missing; assigned '{key}'"),
            );
            key
        });
        let value = value.unwrap_or_else(|| {
            self.diagnostics.error(
                codes::MISSING_ATTRIBUTE,
                Location::field(path, "value"),
                format!("required attribute 'value' is missing on text '{id}'"),
            );
            String::new()
        });

        if self.model.texts.get(&language, &id).is_some() {
            self.diagnostics.warning(
                codes::DUPLICATE_KEY,
                Location::field(path, "id"),
                format!("duplicate text id '{id}' ignored (first occurrence wins)"),
            );
            return;
        }
        self.model.texts.add_text(language, id, value);
    }

    // ------------------------------------------------------------------
    // Unknown content
    // ------------------------------------------------------------------

    /// Retain an unknown empty element: in the extras of the innermost
    /// open record when there is one, otherwise as an opaque section.
    fn retain_unknown_empty(&mut self, name: &str, e: &BytesStart, path: &str) {
        let entry = RawEntry::new(name, raw_attribute_text(e));

        let extras = if let Some(param) = self.variable.as_mut() {
            Some(&mut param.extras)
        } else if let Some(pd) = self.pd.as_mut() {
            Some(&mut pd.extras)
        } else if let Some(menu) = self.menu.as_mut() {
            Some(&mut menu.extras)
        } else if self.parent() == "DeviceIdentity" || self.parent() == "IODevice" {
            Some(&mut self.model.identity.extras)
        } else {
            None
        };

        match extras {
            Some(extras) => {
                self.diagnostics.warning(
                    codes::UNKNOWN_FIELD,
                    Location::section(path),
                    format!("unrecognized element <{name}/> retained verbatim"),
                );
                extras.push(entry);
            }
            None => {
                self.diagnostics.info(
                    codes::UNKNOWN_SECTION,
                    Location::section(path),
                    format!("unrecognized element <{name}/> retained as opaque"),
                );
                self.model.opaque_sections.push(OpaqueSection {
                    name: name.to_string(),
                    body: format!("<{}/>", raw_tag_text(e)),
                });
            }
        }
    }

    /// Capture an unknown subtree verbatim as an opaque section.
    fn retain_unknown_subtree(&mut self, name: &str, body: String, path: &str) {
        self.diagnostics.info(
            codes::UNKNOWN_SECTION,
            Location::section(path),
            format!("unrecognized element <{name}> retained as opaque"),
        );
        self.model.opaque_sections.push(OpaqueSection {
            name: name.to_string(),
            body,
        });
    }

    // ------------------------------------------------------------------
    // Event routing
    // ------------------------------------------------------------------

    /// Route a recognized element. Returns false when the element (in
    /// this position) is not part of the grammar.
    fn route(&mut self, name: &str, e: &BytesStart, path: &str) -> bool {
        match (self.parent(), name) {
            ("", "IODevice") => self.open_root(e),
            // Standard document header; retained verbatim, no diagnostic.
            ("IODevice", "DocumentInfo") => {
                self.model
                    .identity
                    .extras
                    .push(RawEntry::new("DocumentInfo", raw_attribute_text(e)));
            }
            ("IODevice", "ProfileBody" | "ExternalTextCollection")
            | ("ProfileBody", "DeviceFunction")
            | ("DeviceFunction", "VariableCollection" | "ProcessDataCollection" | "UserInterface")
            | ("UserInterface", "MenuCollection") => {}
            ("ProfileBody", "DeviceIdentity") => self.open_identity(e, path),
            ("DeviceIdentity", "VendorText" | "DeviceName") => {
                self.open_identity_text_ref(name, e, path);
            }
            ("VariableCollection", "Variable") => self.open_variable(e, path),
            ("Variable", "Datatype") | ("ProcessDataIn" | "ProcessDataOut", "Datatype") => {
                self.open_datatype(e, path);
            }
            ("Datatype", "ValueRange") => self.open_value_range(e, path),
            ("Variable" | "ProcessDataIn" | "ProcessDataOut" | "Menu", "Name") => {
                self.open_name_ref(e, path);
            }
            ("ProcessDataCollection", "ProcessData") => self.open_pd_wrapper(e, path),
            ("ProcessDataCollection" | "ProcessData", "ProcessDataIn" | "ProcessDataOut") => {
                self.open_process_data(name, e, path);
            }
            ("MenuCollection", "Menu") => self.open_menu(e, path),
            ("Menu", "VariableRef" | "MenuRef" | "RecordItemRef") => {
                self.open_menu_item(name, e, path);
            }
            ("ExternalTextCollection", "PrimaryLanguage" | "Language") => {
                self.open_language(name, e, path);
            }
            ("PrimaryLanguage" | "Language", "Text") => self.open_text(e, path),
            _ => return false,
        }
        true
    }

    /// Close bookkeeping for elements that buffer state while open.
    fn handle_end(&mut self, name: &str) {
        let path = self.path_with("");
        let path = path.trim_end_matches('/');
        match name {
            "Variable" => self.finalize_variable(path),
            "ProcessDataIn" | "ProcessDataOut" => self.finalize_process_data(path),
            "ProcessData" => self.pd_wrapper_id = None,
            "Menu" => self.finalize_menu(path),
            "PrimaryLanguage" | "Language" => self.language = None,
            _ => {}
        }
        self.stack.pop();
    }

    fn finish(mut self) -> Result<ParseOutcome, ParseError> {
        if let Some(message) = self.fatal_root {
            return Err(ParseError::InvalidRoot {
                message,
                diagnostics: self.diagnostics.into_vec(),
            });
        }
        if !self.saw_root {
            return Err(ParseError::InvalidRoot {
                message: "document has no root element".to_string(),
                diagnostics: self.diagnostics.into_vec(),
            });
        }
        if !self.model.has_recognized_content() {
            return Err(ParseError::NoRecognizedSections {
                diagnostics: self.diagnostics.into_vec(),
            });
        }

        self.model.calculate_content_hash();
        Ok(ParseOutcome::new(self.model, self.diagnostics.into_vec()))
    }
}

/// Parser for the XML dialect.
#[derive(Debug, Default)]
pub struct IoddParser;

impl IoddParser {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DeviceParser for IoddParser {
    fn parse_str(&self, content: &str) -> Result<ParseOutcome, ParseError> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);

        let mut walker = IoddWalker::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let name = local_name(e.name().as_ref());
                    if walker.stack.is_empty() && name != "IODevice" {
                        walker.fatal_root =
                            Some(format!("expected IODevice root element, found <{name}>"));
                        break;
                    }
                    let path = walker.path_with(&name);
                    if walker.route(&name, e, &path) {
                        walker.stack.push(name);
                    } else {
                        // Unknown subtree: swallow it whole, verbatim.
                        let tag = raw_tag_text(e);
                        let close = String::from_utf8_lossy(e.name().as_ref()).to_string();
                        match reader.read_text(e.name()) {
                            Ok(inner) => {
                                let body = format!("<{tag}>{inner}</{close}>");
                                walker.retain_unknown_subtree(&name, body, &path);
                            }
                            Err(err) => return Err(ParseError::XmlError(err.to_string())),
                        }
                    }
                }
                Ok(Event::Empty(ref e)) => {
                    let name = local_name(e.name().as_ref());
                    if walker.stack.is_empty() && name != "IODevice" {
                        walker.fatal_root =
                            Some(format!("expected IODevice root element, found <{name}/>"));
                        break;
                    }
                    let path = walker.path_with(&name);
                    if walker.route(&name, e, &path) {
                        // Empty recognized elements with close bookkeeping
                        // finalize immediately.
                        match name.as_str() {
                            "Variable" => walker.finalize_variable(&path),
                            "ProcessDataIn" | "ProcessDataOut" => {
                                walker.finalize_process_data(&path);
                            }
                            "ProcessData" => walker.pd_wrapper_id = None,
                            "Menu" => walker.finalize_menu(&path),
                            "PrimaryLanguage" | "Language" => walker.language = None,
                            _ => {}
                        }
                    } else {
                        walker.retain_unknown_empty(&name, e, &path);
                    }
                }
                Ok(Event::End(ref e)) => {
                    let name = local_name(e.name().as_ref());
                    walker.handle_end(&name);
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(ParseError::XmlError(e.to_string())),
            }
            buf.clear();
        }

        walker.finish()
    }

    fn format(&self) -> FormatKind {
        FormatKind::Iodd
    }

    fn detect(&self, content: &str) -> FormatDetection {
        let head = content.trim_start_matches('\u{feff}').trim_start();
        if !head.starts_with('<') {
            return FormatDetection::no_match();
        }
        if !content.contains("<IODevice") {
            // Some other XML document
            return FormatDetection::no_match();
        }

        let mut detection =
            FormatDetection::with_confidence(FormatConfidence::CERTAIN).variant("xml");
        if let Some(version) = DOCINFO_VERSION
            .captures(content)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
        {
            detection = detection.version(version);
        }
        detection
    }
}
