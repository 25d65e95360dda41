use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use xlfsync_core::{LineEnding, Note, Result, Target, TranslationDocument, TranslationUnit, XlfError};

const XLIFF_NS: &str = "urn:oasis:names:tc:xliff:document:1.2";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const SCHEMA_LOCATION: &str =
    "urn:oasis:names:tc:xliff:document:1.2 xliff-core-1.2-transitional.xsd";

/// A literal replacement applied to the serialized text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReplace {
    pub search: String,
    pub replace: String,
}

#[derive(Debug, Clone)]
pub struct SerializeOptions {
    /// Write `<target></target>` instead of `<target/>`.
    pub replace_self_closing_tags: bool,
    pub format_xml: bool,
    /// Keep the line ending detected when the document was parsed.
    pub preserve_line_ending: bool,
    pub bom: bool,
    pub search_replace: Vec<SearchReplace>,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            replace_self_closing_tags: true,
            format_xml: true,
            preserve_line_ending: true,
            bom: false,
            search_replace: Vec::new(),
        }
    }
}

type XmlWriter = Writer<Vec<u8>>;

/// Build fresh XLIFF text from the model.
pub fn serialize(doc: &TranslationDocument, opts: &SerializeOptions) -> Result<String> {
    let mut writer = if opts.format_xml {
        Writer::new_with_indent(Vec::new(), b' ', 2)
    } else {
        Writer::new(Vec::new())
    };
    emit(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)),
    )?;
    if !opts.format_xml {
        writer.get_mut().push(b'\n');
    }

    let mut xliff = BytesStart::new("xliff");
    xliff.push_attribute(("version", "1.2"));
    xliff.push_attribute(("xmlns", XLIFF_NS));
    xliff.push_attribute(("xmlns:xsi", XSI_NS));
    xliff.push_attribute(("xsi:schemaLocation", SCHEMA_LOCATION));
    emit(&mut writer, Event::Start(xliff))?;

    let mut file = BytesStart::new("file");
    file.push_attribute(("datatype", doc.datatype.as_str()));
    file.push_attribute(("source-language", doc.source_language.as_str()));
    file.push_attribute(("target-language", doc.target_language.as_str()));
    file.push_attribute(("original", doc.original.as_str()));
    for (name, value) in [
        ("tool-id", &doc.product.tool_id),
        ("product-name", &doc.product.product_name),
        ("product-version", &doc.product.product_version),
        ("build-num", &doc.product.build_num),
        ("request-id", &doc.product.request_id),
    ] {
        if let Some(v) = value {
            file.push_attribute((name, v.as_str()));
        }
    }
    emit(&mut writer, Event::Start(file))?;

    if let Some(header) = &doc.header {
        emit(&mut writer, Event::Start(BytesStart::new("header")))?;
        let mut tool = BytesStart::new("tool");
        tool.push_attribute(("tool-id", header.tool_id.as_str()));
        tool.push_attribute(("tool-name", header.tool_name.as_str()));
        if let Some(v) = &header.tool_version {
            tool.push_attribute(("tool-version", v.as_str()));
        }
        if let Some(v) = &header.tool_company {
            tool.push_attribute(("tool-company", v.as_str()));
        }
        emit(&mut writer, Event::Empty(tool))?;
        emit(&mut writer, Event::End(BytesEnd::new("header")))?;
    }

    emit(&mut writer, Event::Start(BytesStart::new("body")))?;
    let mut group = BytesStart::new("group");
    group.push_attribute(("id", doc.group_id.as_str()));
    emit(&mut writer, Event::Start(group))?;
    for unit in &doc.units {
        write_unit(&mut writer, unit, opts)?;
    }
    emit(&mut writer, Event::End(BytesEnd::new("group")))?;
    emit(&mut writer, Event::End(BytesEnd::new("body")))?;
    emit(&mut writer, Event::End(BytesEnd::new("file")))?;
    emit(&mut writer, Event::End(BytesEnd::new("xliff")))?;

    let mut text =
        String::from_utf8(writer.into_inner()).map_err(|e| XlfError::Serialize(e.to_string()))?;
    if opts.preserve_line_ending && doc.line_ending == LineEnding::CrLf {
        text = text.replace('\n', LineEnding::CrLf.as_str());
    }
    for sr in &opts.search_replace {
        if !sr.search.is_empty() {
            text = text.replace(&sr.search, &sr.replace);
        }
    }
    if opts.bom {
        text.insert(0, '\u{feff}');
    }
    Ok(text)
}

fn write_unit(writer: &mut XmlWriter, unit: &TranslationUnit, opts: &SerializeOptions) -> Result<()> {
    let mut start = BytesStart::new("trans-unit");
    start.push_attribute(("id", unit.id.as_str()));
    let max_width = unit.max_width.map(|w| w.to_string());
    if let Some(w) = &max_width {
        start.push_attribute(("maxwidth", w.as_str()));
    }
    if let Some(su) = &unit.size_unit {
        start.push_attribute(("size-unit", su.as_str()));
    }
    start.push_attribute(("translate", if unit.translate { "yes" } else { "no" }));
    if let Some(space) = &unit.xml_space {
        start.push_attribute(("xml:space", space.as_str()));
    }
    if let Some(al) = &unit.al_object_target {
        start.push_attribute(("al-object-target", al.as_str()));
    }
    emit(writer, Event::Start(start))?;

    write_text_element(writer, BytesStart::new("source"), &unit.source, opts)?;
    for target in unit.targets() {
        write_target(writer, target, opts)?;
    }

    let mut notes: Vec<&Note> = unit.notes.iter().collect();
    notes.sort_by_key(|n| n.priority.unwrap_or(u32::MAX));
    for note in notes {
        let mut el = BytesStart::new("note");
        el.push_attribute(("from", note.from.as_str()));
        if let Some(a) = &note.annotates {
            el.push_attribute(("annotates", a.as_str()));
        }
        let priority = note.priority.map(|p| p.to_string());
        if let Some(p) = &priority {
            el.push_attribute(("priority", p.as_str()));
        }
        write_text_element(writer, el, &note.text, opts)?;
    }

    emit(writer, Event::End(BytesEnd::new("trans-unit")))
}

fn write_target(writer: &mut XmlWriter, target: &Target, opts: &SerializeOptions) -> Result<()> {
    let mut el = BytesStart::new("target");
    if let Some(state) = target.state {
        el.push_attribute(("state", state.as_str()));
    }
    if let Some(q) = &target.state_qualifier {
        el.push_attribute(("state-qualifier", q.as_str()));
    }
    write_text_element(writer, el, &target.raw_text(), opts)
}

fn write_text_element(
    writer: &mut XmlWriter,
    start: BytesStart<'_>,
    text: &str,
    opts: &SerializeOptions,
) -> Result<()> {
    if text.is_empty() && !opts.replace_self_closing_tags {
        return emit(writer, Event::Empty(start));
    }
    let end = start.to_end().into_owned();
    emit(writer, Event::Start(start))?;
    // An empty text event keeps the closing tag on the same line.
    emit(writer, Event::Text(BytesText::from_escaped(partial_escape(text))))?;
    emit(writer, Event::End(end))
}

fn emit(writer: &mut XmlWriter, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| XlfError::Serialize(e.to_string()))
}
