//! Renderer for the XML dialect.
//!
//! The writer rebuilds the fixed `IODevice` hierarchy and replays the
//! verbatim retention conventions of the parser: `IODevice@attr` extras
//! become root attributes, a `DocumentInfo` extra carries its attribute
//! text as written, `@attr` extras decorate their owning element,
//! `Elem@attr` extras decorate a templated child, and any other extras key
//! is an empty child element. Opaque subtrees are written back raw at the
//! end of `ProfileBody`, a position where re-parsing files them as opaque
//! again.
//!
//! Layout the model never stored (attribute order on a tag, the optional
//! `ProcessData` wrapper, indentation) is regenerated in canonical form.

use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::ReconstructErrorKind;
use crate::model::{
    DeviceIdentity, Menu, MenuItemKind, NormalizedDevice, Parameter, PdDirection, ProcessData,
    RawEntry, Scalar,
};

type XmlWriter = Writer<Vec<u8>>;

pub(super) fn write_document(model: &NormalizedDevice) -> Result<String, ReconstructErrorKind> {
    let bytes = write_bytes(model).map_err(|e| ReconstructErrorKind::XmlWrite(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ReconstructErrorKind::XmlWrite(e.to_string()))
}

fn write_bytes(model: &NormalizedDevice) -> std::io::Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("IODevice");
    for entry in &model.identity.extras {
        if let Some(attr) = entry.key.strip_prefix("IODevice@") {
            root.push_attribute((attr, entry.raw.as_str()));
        }
    }
    writer.write_event(Event::Start(root))?;

    for entry in &model.identity.extras {
        if entry.key == "DocumentInfo" {
            writer.write_event(Event::Empty(raw_start("DocumentInfo", &entry.raw)))?;
        }
    }

    if has_profile_body(model) {
        writer.write_event(Event::Start(BytesStart::new("ProfileBody")))?;
        write_identity(&mut writer, &model.identity)?;
        write_device_function(&mut writer, model)?;
        for section in &model.opaque_sections {
            // Raw replay: the body is well-formed XML captured verbatim.
            let raw = format!("\n{}", section.body);
            writer.write_event(Event::Text(BytesText::from_escaped(raw)))?;
        }
        writer.write_event(Event::End(BytesEnd::new("ProfileBody")))?;
    }

    write_texts(&mut writer, model)?;
    writer.write_event(Event::End(BytesEnd::new("IODevice")))?;
    Ok(writer.into_inner())
}

fn has_profile_body(model: &NormalizedDevice) -> bool {
    identity_element_visible(&model.identity)
        || !model.params.is_empty()
        || !model.process_data.is_empty()
        || !model.menus.is_empty()
        || !model.opaque_sections.is_empty()
}

/// Whether the identity renders a `DeviceIdentity` element at all. Root
/// attributes and the document header live on the root and do not count.
fn identity_element_visible(identity: &DeviceIdentity) -> bool {
    identity.vendor_id.is_some()
        || identity.vendor_name.is_some()
        || identity.product_code.is_some()
        || identity.vendor_text_id.is_some()
        || identity.device_name_text_id.is_some()
        || identity
            .extras
            .iter()
            .any(|e| !e.key.starts_with("IODevice@") && e.key != "DocumentInfo")
}

fn write_identity(writer: &mut XmlWriter, identity: &DeviceIdentity) -> std::io::Result<()> {
    if !identity_element_visible(identity) {
        return Ok(());
    }

    let mut tag = BytesStart::new("DeviceIdentity");
    push_scalar_attr(&mut tag, "vendorId", &identity.vendor_id);
    push_scalar_attr(&mut tag, "vendorName", &identity.vendor_name);
    push_scalar_attr(&mut tag, "deviceId", &identity.product_code);
    push_plain_attrs(&mut tag, &identity.extras);

    let children = element_children(&identity.extras, &["DocumentInfo"]);
    if identity.vendor_text_id.is_none()
        && identity.device_name_text_id.is_none()
        && children.is_empty()
    {
        return writer.write_event(Event::Empty(tag));
    }

    writer.write_event(Event::Start(tag))?;
    if let Some(id) = &identity.vendor_text_id {
        writer.write_event(Event::Empty(text_ref("VendorText", id)))?;
    }
    if let Some(id) = &identity.device_name_text_id {
        writer.write_event(Event::Empty(text_ref("DeviceName", id)))?;
    }
    for child in children {
        writer.write_event(Event::Empty(raw_start(&child.key, &child.raw)))?;
    }
    writer.write_event(Event::End(BytesEnd::new("DeviceIdentity")))
}

fn write_device_function(writer: &mut XmlWriter, model: &NormalizedDevice) -> std::io::Result<()> {
    if model.params.is_empty() && model.process_data.is_empty() && model.menus.is_empty() {
        return Ok(());
    }
    writer.write_event(Event::Start(BytesStart::new("DeviceFunction")))?;

    if !model.params.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("VariableCollection")))?;
        for param in model.params.values() {
            write_variable(writer, param)?;
        }
        writer.write_event(Event::End(BytesEnd::new("VariableCollection")))?;
    }
    if !model.process_data.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("ProcessDataCollection")))?;
        for pd in model.process_data.values() {
            write_process_data(writer, pd)?;
        }
        writer.write_event(Event::End(BytesEnd::new("ProcessDataCollection")))?;
    }
    if !model.menus.is_empty() {
        writer.write_event(Event::Start(BytesStart::new("UserInterface")))?;
        writer.write_event(Event::Start(BytesStart::new("MenuCollection")))?;
        for menu in model.menus.values() {
            write_menu(writer, menu)?;
        }
        writer.write_event(Event::End(BytesEnd::new("MenuCollection")))?;
        writer.write_event(Event::End(BytesEnd::new("UserInterface")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("DeviceFunction")))
}

fn write_variable(writer: &mut XmlWriter, param: &Parameter) -> std::io::Result<()> {
    let mut tag = BytesStart::new("Variable");
    if let Some(id) = &param.id {
        tag.push_attribute(("id", id.as_str()));
    }
    tag.push_attribute(("index", param.index.to_string().as_str()));
    push_scalar_attr(&mut tag, "accessRights", &param.access_rights);
    push_scalar_attr(&mut tag, "defaultValue", &param.default_value);
    push_plain_attrs(&mut tag, &param.extras);

    let has_datatype = param.data_type.is_some()
        || param.data_size.is_some()
        || param.min.is_some()
        || param.max.is_some()
        || has_templated_attrs(&param.extras, "Datatype");
    let children = element_children(&param.extras, &[]);

    if !has_datatype && param.text_id.is_none() && children.is_empty() {
        return writer.write_event(Event::Empty(tag));
    }

    writer.write_event(Event::Start(tag))?;
    if has_datatype {
        write_datatype(
            writer,
            &param.data_type,
            &param.data_size,
            &param.min,
            &param.max,
            &param.extras,
        )?;
    }
    if let Some(id) = &param.text_id {
        writer.write_event(Event::Empty(text_ref("Name", id)))?;
    }
    for child in children {
        writer.write_event(Event::Empty(raw_start(&child.key, &child.raw)))?;
    }
    writer.write_event(Event::End(BytesEnd::new("Variable")))
}

fn write_datatype(
    writer: &mut XmlWriter,
    data_type: &Option<Scalar>,
    bit_length: &Option<Scalar>,
    min: &Option<Scalar>,
    max: &Option<Scalar>,
    extras: &[RawEntry],
) -> std::io::Result<()> {
    let mut tag = BytesStart::new("Datatype");
    push_scalar_attr(&mut tag, "xsi:type", data_type);
    push_scalar_attr(&mut tag, "bitLength", bit_length);
    push_templated_attrs(&mut tag, extras, "Datatype");

    if min.is_none() && max.is_none() {
        return writer.write_event(Event::Empty(tag));
    }
    writer.write_event(Event::Start(tag))?;
    let mut range = BytesStart::new("ValueRange");
    push_scalar_attr(&mut range, "lowerValue", min);
    push_scalar_attr(&mut range, "upperValue", max);
    writer.write_event(Event::Empty(range))?;
    writer.write_event(Event::End(BytesEnd::new("Datatype")))
}

fn write_process_data(writer: &mut XmlWriter, pd: &ProcessData) -> std::io::Result<()> {
    // The wrapper element some documents use carries no state of its own;
    // the id it donated is already on the process data object.
    let name = match pd.direction {
        Some(PdDirection::Out) => "ProcessDataOut",
        _ => "ProcessDataIn",
    };
    let mut tag = BytesStart::new(name);
    tag.push_attribute(("id", pd.id.as_str()));
    push_scalar_attr(&mut tag, "bitLength", &pd.bit_length);
    push_plain_attrs(&mut tag, &pd.extras);

    let has_datatype = pd.datatype.is_some() || has_templated_attrs(&pd.extras, "Datatype");
    let children = element_children(&pd.extras, &[]);

    if !has_datatype && pd.name_text_id.is_none() && children.is_empty() {
        return writer.write_event(Event::Empty(tag));
    }
    writer.write_event(Event::Start(tag))?;
    if has_datatype {
        write_datatype(writer, &pd.datatype, &None, &None, &None, &pd.extras)?;
    }
    if let Some(id) = &pd.name_text_id {
        writer.write_event(Event::Empty(text_ref("Name", id)))?;
    }
    for child in children {
        writer.write_event(Event::Empty(raw_start(&child.key, &child.raw)))?;
    }
    writer.write_event(Event::End(BytesEnd::new(name)))
}

fn write_menu(writer: &mut XmlWriter, menu: &Menu) -> std::io::Result<()> {
    let mut tag = BytesStart::new("Menu");
    tag.push_attribute(("id", menu.id.as_str()));
    push_plain_attrs(&mut tag, &menu.extras);

    let children = element_children(&menu.extras, &[]);
    if menu.name_text_id.is_none() && menu.items.is_empty() && children.is_empty() {
        return writer.write_event(Event::Empty(tag));
    }

    writer.write_event(Event::Start(tag))?;
    if let Some(id) = &menu.name_text_id {
        writer.write_event(Event::Empty(text_ref("Name", id)))?;
    }
    for item in &menu.items {
        let id_attr = match item.kind {
            MenuItemKind::MenuRef => "menuId",
            MenuItemKind::VariableRef | MenuItemKind::RecordItemRef => "variableId",
        };
        let mut item_tag = BytesStart::new(item.kind.element_name());
        item_tag.push_attribute((id_attr, item.target_id.as_str()));
        writer.write_event(Event::Empty(item_tag))?;
    }
    for child in children {
        writer.write_event(Event::Empty(raw_start(&child.key, &child.raw)))?;
    }
    writer.write_event(Event::End(BytesEnd::new("Menu")))
}

fn write_texts(writer: &mut XmlWriter, model: &NormalizedDevice) -> std::io::Result<()> {
    let texts = &model.texts;
    if texts.primary_language.is_none() && texts.languages.is_empty() {
        return Ok(());
    }
    writer.write_event(Event::Start(BytesStart::new("ExternalTextCollection")))?;

    if let Some(primary) = &texts.primary_language {
        write_language(writer, "PrimaryLanguage", primary, texts.languages.get(primary))?;
    }
    for (lang, entries) in &texts.languages {
        if texts.primary_language.as_deref() == Some(lang.as_str()) {
            continue;
        }
        write_language(writer, "Language", lang, Some(entries))?;
    }
    writer.write_event(Event::End(BytesEnd::new("ExternalTextCollection")))
}

fn write_language(
    writer: &mut XmlWriter,
    element: &'static str,
    lang: &str,
    entries: Option<&IndexMap<String, String>>,
) -> std::io::Result<()> {
    let mut tag = BytesStart::new(element);
    tag.push_attribute(("xml:lang", lang));

    let Some(entries) = entries.filter(|e| !e.is_empty()) else {
        return writer.write_event(Event::Empty(tag));
    };
    writer.write_event(Event::Start(tag))?;
    for (id, value) in entries {
        let mut text = BytesStart::new("Text");
        text.push_attribute(("id", id.as_str()));
        text.push_attribute(("value", value.as_str()));
        writer.write_event(Event::Empty(text))?;
    }
    writer.write_event(Event::End(BytesEnd::new(element)))
}

// ============================================================================
// Tag helpers
// ============================================================================

/// Opening tag with its attribute text replayed as written.
fn raw_start(name: &str, raw_attrs: &str) -> BytesStart<'static> {
    if raw_attrs.is_empty() {
        BytesStart::new(name.to_string())
    } else {
        BytesStart::from_content(format!("{name} {raw_attrs}"), name.len())
    }
}

fn text_ref(name: &'static str, text_id: &str) -> BytesStart<'static> {
    let mut tag = BytesStart::new(name);
    tag.push_attribute(("textId", text_id));
    tag
}

fn push_scalar_attr(tag: &mut BytesStart, name: &str, value: &Option<Scalar>) {
    if let Some(value) = value {
        tag.push_attribute((name, value.to_string().as_str()));
    }
}

/// Replay `@attr` extras as attributes on their owning tag.
fn push_plain_attrs(tag: &mut BytesStart, extras: &[RawEntry]) {
    for entry in extras {
        if let Some(attr) = entry.key.strip_prefix('@') {
            tag.push_attribute((attr, entry.raw.as_str()));
        }
    }
}

/// Replay `Elem@attr` extras as attributes on the templated child `Elem`.
fn push_templated_attrs(tag: &mut BytesStart, extras: &[RawEntry], element: &str) {
    for entry in extras {
        if let Some((owner, attr)) = entry.key.split_once('@') {
            if owner == element && !attr.is_empty() {
                tag.push_attribute((attr, entry.raw.as_str()));
            }
        }
    }
}

fn has_templated_attrs(extras: &[RawEntry], element: &str) -> bool {
    extras
        .iter()
        .any(|e| matches!(e.key.split_once('@'), Some((owner, _)) if owner == element))
}

/// Extras that replay as empty child elements of their owner.
fn element_children<'a>(extras: &'a [RawEntry], reserved: &[&str]) -> Vec<&'a RawEntry> {
    extras
        .iter()
        .filter(|e| !e.key.contains('@') && !reserved.contains(&e.key.as_str()))
        .collect()
}
