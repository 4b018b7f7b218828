//! Core normalized device description structures.

use super::{FormatKind, Scalar, TextTable};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::xxh3_64;

/// A field retained verbatim in a section's raw-extras bag.
///
/// `raw` keeps the value text exactly as observed (inline comments and
/// notation included) so reconstruction can re-emit the line unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntry {
    pub key: String,
    pub raw: String,
}

impl RawEntry {
    #[must_use]
    pub fn new(key: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            raw: raw.into(),
        }
    }
}

/// An entirely unrecognized section, retained verbatim for reconstruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpaqueSection {
    /// Section name (EDS header text) or element name (XML)
    pub name: String,
    /// Verbatim body text
    pub body: String,
}

/// Device identity: vendor, product codes and revisions.
///
/// Populated from the EDS `[Device]` section or the IODD `DeviceIdentity`
/// element. Text-id fields are IODD indirections resolved lazily through
/// [`TextTable`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    pub vendor_id: Option<Scalar>,
    pub vendor_name: Option<Scalar>,
    pub product_type: Option<Scalar>,
    pub product_type_string: Option<Scalar>,
    pub product_code: Option<Scalar>,
    pub major_revision: Option<Scalar>,
    pub minor_revision: Option<Scalar>,
    pub product_name: Option<Scalar>,
    pub catalog: Option<Scalar>,
    /// IODD `DeviceName` text reference
    pub device_name_text_id: Option<String>,
    /// IODD `VendorText` text reference
    pub vendor_text_id: Option<String>,
    /// Unrecognized `[Device]` keys / `DeviceIdentity` attributes, verbatim
    pub extras: Vec<RawEntry>,
}

impl DeviceIdentity {
    /// Typed fields in canonical order, for diffing and reconstruction.
    #[must_use]
    pub fn fields(&self) -> [(&'static str, &Option<Scalar>); 9] {
        [
            ("vendor_id", &self.vendor_id),
            ("vendor_name", &self.vendor_name),
            ("product_type", &self.product_type),
            ("product_type_string", &self.product_type_string),
            ("product_code", &self.product_code),
            ("major_revision", &self.major_revision),
            ("minor_revision", &self.minor_revision),
            ("product_name", &self.product_name),
            ("catalog", &self.catalog),
        ]
    }

    /// True when no typed field, text reference or extra was populated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields().iter().all(|(_, v)| v.is_none())
            && self.device_name_text_id.is_none()
            && self.vendor_text_id.is_none()
            && self.extras.is_empty()
    }
}

/// EDS `[File]` section: authorship and revision info for the file itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub description: Option<Scalar>,
    pub creation_date: Option<Scalar>,
    pub creation_time: Option<Scalar>,
    pub modification_date: Option<Scalar>,
    pub modification_time: Option<Scalar>,
    pub revision: Option<Scalar>,
    pub home_url: Option<Scalar>,
    pub extras: Vec<RawEntry>,
}

impl FileInfo {
    /// Typed fields in canonical order.
    #[must_use]
    pub fn fields(&self) -> [(&'static str, &Option<Scalar>); 7] {
        [
            ("description", &self.description),
            ("creation_date", &self.creation_date),
            ("creation_time", &self.creation_time),
            ("modification_date", &self.modification_date),
            ("modification_time", &self.modification_time),
            ("revision", &self.revision),
            ("home_url", &self.home_url),
        ]
    }
}

/// A device parameter.
///
/// EDS `ParamN` records are positional (twelve defined fields, anything
/// beyond kept in `raw_tail`); IODD `Variable` elements populate the same
/// shape from attributes plus text-id indirections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Stable key within the parameter collection
    pub index: u32,
    /// IODD element id (`V_...`), absent for EDS
    pub id: Option<String>,
    pub reserved: Option<Scalar>,
    pub link_path_size: Option<Scalar>,
    pub link_path: Option<Scalar>,
    pub descriptor: Option<Scalar>,
    pub data_type: Option<Scalar>,
    pub data_size: Option<Scalar>,
    pub name: Option<Scalar>,
    pub units: Option<Scalar>,
    pub help: Option<Scalar>,
    pub min: Option<Scalar>,
    pub max: Option<Scalar>,
    pub default_value: Option<Scalar>,
    /// IODD `accessRights` attribute
    pub access_rights: Option<Scalar>,
    /// IODD name text reference
    pub text_id: Option<String>,
    /// Positional fields beyond the defined arity, verbatim
    pub raw_tail: Vec<String>,
    /// Unrecognized attributes (XML), verbatim
    pub extras: Vec<RawEntry>,
}

impl Parameter {
    #[must_use]
    pub fn new(index: u32) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// Typed fields in canonical (EDS positional) order, then XML-only ones.
    #[must_use]
    pub fn fields(&self) -> [(&'static str, &Option<Scalar>); 13] {
        [
            ("reserved", &self.reserved),
            ("link_path_size", &self.link_path_size),
            ("link_path", &self.link_path),
            ("descriptor", &self.descriptor),
            ("data_type", &self.data_type),
            ("data_size", &self.data_size),
            ("name", &self.name),
            ("units", &self.units),
            ("help", &self.help),
            ("min", &self.min),
            ("max", &self.max),
            ("default_value", &self.default_value),
            ("access_rights", &self.access_rights),
        ]
    }
}

/// One `(value, label)` pair of an enumeration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumEntry {
    pub value: Scalar,
    pub label: Scalar,
}

/// Enumeration choices attached to a parameter (EDS `EnumN`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnumSet {
    /// Index of the parameter these choices belong to
    pub param_index: u32,
    pub entries: Vec<EnumEntry>,
}

/// One `(size, reference)` member of an assembly layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssemblyMember {
    pub size: Option<Scalar>,
    pub reference: Option<Scalar>,
}

/// EDS `AssemN` record: a data layout built from member references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Assembly {
    pub index: u32,
    pub name: Option<Scalar>,
    pub path: Option<Scalar>,
    pub size: Option<Scalar>,
    pub descriptor: Option<Scalar>,
    pub reserved1: Option<Scalar>,
    pub reserved2: Option<Scalar>,
    /// Trailing `(size, reference)` pairs
    pub members: Vec<AssemblyMember>,
    /// Odd leftover field when members do not pair up, verbatim
    pub raw_tail: Vec<String>,
}

impl Assembly {
    #[must_use]
    pub fn new(index: u32) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// Typed scalar fields in canonical order (members walked separately).
    #[must_use]
    pub fn fields(&self) -> [(&'static str, &Option<Scalar>); 6] {
        [
            ("name", &self.name),
            ("path", &self.path),
            ("size", &self.size),
            ("descriptor", &self.descriptor),
            ("reserved1", &self.reserved1),
            ("reserved2", &self.reserved2),
        ]
    }
}

/// EDS `ConnectionN` record from `[Connection Manager]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub index: u32,
    pub trigger_transport: Option<Scalar>,
    pub connection_parameters: Option<Scalar>,
    pub o2t_rpi: Option<Scalar>,
    pub o2t_size: Option<Scalar>,
    pub o2t_format: Option<Scalar>,
    pub t2o_rpi: Option<Scalar>,
    pub t2o_size: Option<Scalar>,
    pub t2o_format: Option<Scalar>,
    pub config_size: Option<Scalar>,
    pub config_format: Option<Scalar>,
    pub name: Option<Scalar>,
    pub help: Option<Scalar>,
    pub path: Option<Scalar>,
    /// Positional fields beyond the defined arity, verbatim
    pub raw_tail: Vec<String>,
}

impl Connection {
    #[must_use]
    pub fn new(index: u32) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// Typed fields in canonical positional order.
    #[must_use]
    pub fn fields(&self) -> [(&'static str, &Option<Scalar>); 13] {
        [
            ("trigger_transport", &self.trigger_transport),
            ("connection_parameters", &self.connection_parameters),
            ("o2t_rpi", &self.o2t_rpi),
            ("o2t_size", &self.o2t_size),
            ("o2t_format", &self.o2t_format),
            ("t2o_rpi", &self.t2o_rpi),
            ("t2o_size", &self.t2o_size),
            ("t2o_format", &self.t2o_format),
            ("config_size", &self.config_size),
            ("config_format", &self.config_format),
            ("name", &self.name),
            ("help", &self.help),
            ("path", &self.path),
        ]
    }
}

/// EDS `TSpecN` record: a transmission capability triple.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TSpec {
    pub index: u32,
    pub direction: Option<Scalar>,
    pub rate: Option<Scalar>,
    pub size: Option<Scalar>,
    pub raw_tail: Vec<String>,
}

impl TSpec {
    /// Typed fields in canonical positional order.
    #[must_use]
    pub fn fields(&self) -> [(&'static str, &Option<Scalar>); 3] {
        [
            ("direction", &self.direction),
            ("rate", &self.rate),
            ("size", &self.size),
        ]
    }
}

/// EDS `[Capacity]` section: connection and transmission limits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Capacity {
    pub max_io_connections: Option<Scalar>,
    pub max_msg_connections: Option<Scalar>,
    pub max_io_producers: Option<Scalar>,
    pub max_io_consumers: Option<Scalar>,
    pub tspecs: IndexMap<u32, TSpec>,
    pub extras: Vec<RawEntry>,
}

impl Capacity {
    /// Typed scalar fields in canonical order (tspecs walked separately).
    #[must_use]
    pub fn fields(&self) -> [(&'static str, &Option<Scalar>); 4] {
        [
            ("max_io_connections", &self.max_io_connections),
            ("max_msg_connections", &self.max_msg_connections),
            ("max_io_producers", &self.max_io_producers),
            ("max_io_consumers", &self.max_io_consumers),
        ]
    }
}

/// Direction of a process data object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdDirection {
    In,
    Out,
}

impl PdDirection {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

/// IODD process data object (`ProcessDataIn` / `ProcessDataOut`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessData {
    pub id: String,
    pub direction: Option<PdDirection>,
    pub bit_length: Option<Scalar>,
    pub datatype: Option<Scalar>,
    /// Name text reference, resolved lazily
    pub name_text_id: Option<String>,
    /// Unrecognized attributes, verbatim
    pub extras: Vec<RawEntry>,
}

impl ProcessData {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            direction: None,
            bit_length: None,
            datatype: None,
            name_text_id: None,
            extras: Vec::new(),
        }
    }

    /// Typed scalar fields (direction compared separately).
    #[must_use]
    pub fn fields(&self) -> [(&'static str, &Option<Scalar>); 2] {
        [
            ("bit_length", &self.bit_length),
            ("datatype", &self.datatype),
        ]
    }
}

/// Kind of entry inside a menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuItemKind {
    VariableRef,
    MenuRef,
    RecordItemRef,
}

impl MenuItemKind {
    /// The IODD element name for this item kind.
    #[must_use]
    pub const fn element_name(&self) -> &'static str {
        match self {
            Self::VariableRef => "VariableRef",
            Self::MenuRef => "MenuRef",
            Self::RecordItemRef => "RecordItemRef",
        }
    }
}

/// A reference inside a menu to a variable, submenu or record item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub kind: MenuItemKind,
    pub target_id: String,
}

/// IODD `Menu` element from the user interface tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Menu {
    pub id: String,
    /// Name text reference, resolved lazily
    pub name_text_id: Option<String>,
    pub items: Vec<MenuItem>,
    /// Unrecognized attributes, verbatim
    pub extras: Vec<RawEntry>,
}

impl Menu {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name_text_id: None,
            items: Vec::new(),
            extras: Vec::new(),
        }
    }
}

/// Normalized device description - the canonical intermediate representation.
///
/// Both parsers populate this shape; reconstruction, diffing and scoring
/// operate on it exclusively. Collections are insertion-ordered and keyed
/// by the identifier that is stable in the source format (record index for
/// EDS, element id for IODD substructures). Produced once per parse and
/// treated as immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDevice {
    /// Which dialect this model came from
    pub format: FormatKind,
    pub identity: DeviceIdentity,
    pub file_info: Option<FileInfo>,
    /// Parameters indexed by record number
    pub params: IndexMap<u32, Parameter>,
    /// Unrecognized keys from the parameter section, verbatim
    pub param_extras: Vec<RawEntry>,
    /// Enumeration sets keyed by their parameter index
    pub enums: IndexMap<u32, EnumSet>,
    pub assemblies: IndexMap<u32, Assembly>,
    pub assembly_extras: Vec<RawEntry>,
    pub connections: IndexMap<u32, Connection>,
    pub connection_extras: Vec<RawEntry>,
    pub capacity: Option<Capacity>,
    /// IODD process data objects keyed by element id
    pub process_data: IndexMap<String, ProcessData>,
    /// IODD menus keyed by element id
    pub menus: IndexMap<String, Menu>,
    pub texts: TextTable,
    /// Unrecognized sections/elements, verbatim, in document order
    pub opaque_sections: Vec<OpaqueSection>,
    /// Content hash for quick equality checks
    pub content_hash: u64,
}

impl NormalizedDevice {
    /// Create an empty model for the given format.
    #[must_use]
    pub fn new(format: FormatKind) -> Self {
        Self {
            format,
            identity: DeviceIdentity::default(),
            file_info: None,
            params: IndexMap::new(),
            param_extras: Vec::new(),
            enums: IndexMap::new(),
            assemblies: IndexMap::new(),
            assembly_extras: Vec::new(),
            connections: IndexMap::new(),
            connection_extras: Vec::new(),
            capacity: None,
            process_data: IndexMap::new(),
            menus: IndexMap::new(),
            texts: TextTable::new(),
            opaque_sections: Vec::new(),
            content_hash: 0,
        }
    }

    /// True when at least one recognized section contributed content.
    ///
    /// Opaque sections do not count: a document made only of unrecognized
    /// sections is a hard parse failure.
    #[must_use]
    pub fn has_recognized_content(&self) -> bool {
        !self.identity.is_empty()
            || self.file_info.is_some()
            || !self.params.is_empty()
            || !self.enums.is_empty()
            || !self.assemblies.is_empty()
            || !self.connections.is_empty()
            || self.capacity.is_some()
            || !self.process_data.is_empty()
            || !self.menus.is_empty()
            || !self.texts.is_empty()
    }

    /// Number of populated typed fields across all collections.
    ///
    /// Extras and opaque sections are not counted; this is the typed
    /// footprint used in parse summaries.
    #[must_use]
    pub fn typed_field_count(&self) -> usize {
        let some = |fields: &[(&'static str, &Option<Scalar>)]| {
            fields.iter().filter(|(_, v)| v.is_some()).count()
        };

        let mut count = some(&self.identity.fields());
        if let Some(file_info) = &self.file_info {
            count += some(&file_info.fields());
        }
        for param in self.params.values() {
            count += some(&param.fields());
        }
        for enum_set in self.enums.values() {
            count += enum_set.entries.len();
        }
        for assembly in self.assemblies.values() {
            count += some(&assembly.fields()) + assembly.members.len();
        }
        for connection in self.connections.values() {
            count += some(&connection.fields());
        }
        if let Some(capacity) = &self.capacity {
            count += some(&capacity.fields());
            for tspec in capacity.tspecs.values() {
                count += some(&tspec.fields());
            }
        }
        for pd in self.process_data.values() {
            count += some(&pd.fields()) + usize::from(pd.direction.is_some());
        }
        for menu in self.menus.values() {
            count += menu.items.len();
        }
        count += self.texts.text_count();
        count
    }

    /// Calculate and update the content hash.
    ///
    /// Hashes the canonical JSON of every collection in a fixed order, so
    /// two models with identical content hash identically regardless of
    /// when the hash was computed. Text language blocks are hashed in
    /// canonical order, so models differing only in block order hash
    /// identically.
    pub fn calculate_content_hash(&mut self) {
        let mut hasher_input = Vec::new();

        if let Ok(bytes) = serde_json::to_vec(&self.identity) {
            hasher_input.extend(bytes);
        }
        if let Ok(bytes) = serde_json::to_vec(&(
            &self.file_info,
            &self.params,
            &self.param_extras,
            &self.enums,
            &self.assemblies,
            &self.assembly_extras,
            &self.connections,
            &self.connection_extras,
            &self.capacity,
        )) {
            hasher_input.extend(bytes);
        }
        if let Ok(bytes) = serde_json::to_vec(&(
            &self.process_data,
            &self.menus,
            &self.texts.primary_language,
            self.texts.canonical_languages(),
            &self.opaque_sections,
        )) {
            hasher_input.extend(bytes);
        }

        self.content_hash = xxh3_64(&hasher_input);
    }

    /// Total number of entries across keyed collections.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.params.len()
            + self.enums.len()
            + self.assemblies.len()
            + self.connections.len()
            + self.process_data.len()
            + self.menus.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_device() -> NormalizedDevice {
        let mut device = NormalizedDevice::new(FormatKind::Eds);
        device.identity.vendor_id = Some(Scalar::parse("42"));
        device.identity.product_name = Some(Scalar::parse("\"Test Drive\""));

        let mut param = Parameter::new(1);
        param.name = Some(Scalar::parse("\"Speed\""));
        param.data_type = Some(Scalar::parse("0xC6"));
        device.params.insert(1, param);

        let mut capacity = Capacity::default();
        capacity.max_io_connections = Some(Scalar::parse("6"));
        device.capacity = Some(capacity);

        device.calculate_content_hash();
        device
    }

    #[test]
    fn test_empty_model_has_no_recognized_content() {
        let device = NormalizedDevice::new(FormatKind::Eds);
        assert!(!device.has_recognized_content());

        let mut with_opaque = NormalizedDevice::new(FormatKind::Eds);
        with_opaque.opaque_sections.push(OpaqueSection {
            name: "Port".to_string(),
            body: "Port1 = TCP;".to_string(),
        });
        // Opaque-only content is still unrecognized
        assert!(!with_opaque.has_recognized_content());
    }

    #[test]
    fn test_recognized_content_detection() {
        let device = sample_device();
        assert!(device.has_recognized_content());
    }

    #[test]
    fn test_typed_field_count() {
        let device = sample_device();
        // identity: vendor_id + product_name, param: name + data_type,
        // capacity: max_io_connections
        assert_eq!(device.typed_field_count(), 5);
    }

    #[test]
    fn test_content_hash_deterministic() {
        let a = sample_device();
        let b = sample_device();
        assert_eq!(a.content_hash, b.content_hash);
        assert_ne!(a.content_hash, 0);
    }

    #[test]
    fn test_content_hash_changes_with_content() {
        let a = sample_device();
        let mut b = sample_device();
        if let Some(param) = b.params.get_mut(&1) {
            param.name = Some(Scalar::parse("\"Torque\""));
        }
        b.calculate_content_hash();
        assert_ne!(a.content_hash, b.content_hash);
    }

    #[test]
    fn test_content_hash_ignores_language_block_order() {
        let mut a = NormalizedDevice::new(FormatKind::Iodd);
        a.texts.primary_language = Some("en".to_string());
        a.texts.add_text("de", "T_1", "Wert");
        a.texts.add_text("en", "T_1", "Value");
        a.calculate_content_hash();

        let mut b = NormalizedDevice::new(FormatKind::Iodd);
        b.texts.primary_language = Some("en".to_string());
        b.texts.add_text("en", "T_1", "Value");
        b.texts.add_text("de", "T_1", "Wert");
        b.calculate_content_hash();

        assert_eq!(a.content_hash, b.content_hash);
        assert_eq!(a, b);
    }

    #[test]
    fn test_identity_is_empty() {
        assert!(DeviceIdentity::default().is_empty());

        let mut identity = DeviceIdentity::default();
        identity.vendor_id = Some(Scalar::parse("1"));
        assert!(!identity.is_empty());

        let mut extras_only = DeviceIdentity::default();
        extras_only.extras.push(RawEntry::new("IconFile", "x.ico"));
        assert!(!extras_only.is_empty());
    }

    #[test]
    fn test_parameter_fields_order() {
        let param = Parameter::new(3);
        let names: Vec<_> = param.fields().iter().map(|(n, _)| *n).collect();
        assert_eq!(names[0], "reserved");
        assert_eq!(names[6], "name");
        assert_eq!(names[11], "default_value");
    }
}
