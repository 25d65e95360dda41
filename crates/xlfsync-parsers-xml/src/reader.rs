use once_cell::sync::Lazy;
use regex::Regex;
use roxmltree::{Node, NS_XML_URI};
use std::collections::HashSet;
use xlfsync_core::{
    LineEnding, Note, NoteSource, ProductInfo, Result, Target, TargetState, ToolHeader,
    TranslationDocument, TranslationUnit, XlfError, DEFAULT_GROUP_ID,
};

// Leftovers of bad merges: a target closed twice, or text holding a raw '>'.
static BROKEN_TARGET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(<target[^>]*target>)|(<target>[^<]*target>)|(>[^<>]*>[^<>]*<)")
        .expect("static regex")
});

/// Parse XLIFF text into a document. Errors carry no path; callers tag them.
pub fn parse(text: &str) -> Result<TranslationDocument> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    precheck(text)?;
    let line_ending = LineEnding::detect(text);

    let xml = roxmltree::Document::parse(text).map_err(|e| syntax_error(text, &e))?;

    let file = xml
        .descendants()
        .find(|n| n.has_tag_name("file"))
        .ok_or_else(|| missing("file"))?;
    let source_language = file
        .attribute("source-language")
        .ok_or_else(|| missing("file/@source-language"))?;
    let target_language = file
        .attribute("target-language")
        .ok_or_else(|| missing("file/@target-language"))?;
    let body = child(file, "body").ok_or_else(|| missing("body"))?;
    let group = child(body, "group").ok_or_else(|| missing("group"))?;

    let mut doc = TranslationDocument::new(
        source_language,
        target_language,
        file.attribute("original").unwrap_or_default(),
    );
    if let Some(dt) = file.attribute("datatype") {
        doc.datatype = dt.to_string();
    }
    doc.product = ProductInfo {
        tool_id: attr(file, "tool-id"),
        product_name: attr(file, "product-name"),
        product_version: attr(file, "product-version"),
        build_num: attr(file, "build-num"),
        request_id: attr(file, "request-id"),
    };
    doc.header = child(file, "header")
        .and_then(|h| child(h, "tool"))
        .map(|tool| ToolHeader {
            tool_id: tool.attribute("tool-id").unwrap_or_default().to_string(),
            tool_name: tool.attribute("tool-name").unwrap_or_default().to_string(),
            tool_version: attr(tool, "tool-version"),
            tool_company: attr(tool, "tool-company"),
        });
    doc.group_id = group
        .attribute("id")
        .unwrap_or(DEFAULT_GROUP_ID)
        .to_string();
    doc.line_ending = line_ending;

    let mut seen = HashSet::new();
    for node in body.descendants().filter(|n| n.has_tag_name("trans-unit")) {
        let unit = parse_unit(node)?;
        if !seen.insert(unit.id.clone()) {
            return Err(XlfError::InvalidUnit {
                path: None,
                id: unit.id,
                message: "duplicate id".to_string(),
            });
        }
        doc.units.push(unit);
    }
    tracing::trace!(event = "xliff_parsed", units = doc.units.len(), target_language = %doc.target_language);
    Ok(doc)
}

fn parse_unit(node: Node) -> Result<TranslationUnit> {
    let id = node.attribute("id").unwrap_or_default().to_string();
    let invalid = |message: String| XlfError::InvalidUnit {
        path: None,
        id: id.clone(),
        message,
    };
    if id.is_empty() {
        return Err(invalid("missing id attribute".to_string()));
    }
    if node.ancestors().skip(1).any(|a| a.has_tag_name("trans-unit")) {
        return Err(invalid("nested trans-unit".to_string()));
    }

    let source = child(node, "source").map(text_of).unwrap_or_default();
    let mut unit = TranslationUnit::new(id.clone(), source);
    unit.translate = !matches!(
        node.attribute("translate").map(str::to_ascii_lowercase).as_deref(),
        Some("no") | Some("false")
    );
    unit.max_width = match node.attribute("maxwidth") {
        Some(raw) if !raw.trim().is_empty() => Some(
            raw.trim()
                .parse()
                .map_err(|_| invalid(format!("maxwidth '{raw}' is not a number")))?,
        ),
        _ => None,
    };
    unit.size_unit = attr(node, "size-unit");
    unit.xml_space = node
        .attribute((NS_XML_URI, "space"))
        .map(str::to_string);
    unit.al_object_target = attr(node, "al-object-target");

    let mut targets = Vec::new();
    for t in node.children().filter(|n| n.has_tag_name("target")) {
        let mut target = Target::from_raw(&text_of(t));
        if let Some(raw) = t.attribute("state") {
            target.state = Some(
                raw.parse::<TargetState>()
                    .map_err(|_| invalid(format!("unknown target state '{raw}'")))?,
            );
        }
        target.state_qualifier = attr(t, "state-qualifier");
        targets.push(target);
    }
    unit.set_targets(targets);

    for n in node.children().filter(|n| n.has_tag_name("note")) {
        unit.notes.push(Note {
            from: NoteSource::from(n.attribute("from").unwrap_or_default()),
            annotates: attr(n, "annotates"),
            priority: n.attribute("priority").and_then(|p| p.trim().parse().ok()),
            text: text_of(n),
        });
    }
    Ok(unit)
}

fn precheck(text: &str) -> Result<()> {
    if let Some(m) = BROKEN_TARGET.find(text) {
        return Err(XlfError::MalformedDocument {
            path: None,
            offset: m.start(),
            length: m.len(),
            message: "broken element or unescaped '>'".to_string(),
        });
    }
    Ok(())
}

fn syntax_error(text: &str, err: &roxmltree::Error) -> XlfError {
    let pos = err.pos();
    XlfError::MalformedDocument {
        path: None,
        offset: byte_offset(text, pos.row as usize, pos.col as usize),
        length: 1,
        message: err.to_string(),
    }
}

/// Convert a 1-based row/column (columns counted in chars) to a byte offset.
fn byte_offset(text: &str, row: usize, col: usize) -> usize {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(row.saturating_sub(1))
        .map(str::len)
        .sum();
    let line = &text[line_start.min(text.len())..];
    let within = line
        .char_indices()
        .nth(col.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    line_start + within
}

fn missing(element: &str) -> XlfError {
    XlfError::MissingRequiredElement {
        path: None,
        element: element.to_string(),
    }
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

fn attr(node: Node, name: &str) -> Option<String> {
    node.attribute(name).map(str::to_string)
}

fn text_of(node: Node) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use xlfsync_core::{Completion, TranslationToken};

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xsi:schemaLocation="urn:oasis:names:tc:xliff:document:1.2 xliff-core-1.2-transitional.xsd">
  <file datatype="xml" source-language="en-US" target-language="sv-SE" original="Al">
    <body>
      <group id="body">
        <trans-unit id="Table 2328808854 - Field 1296262074 - Property 2879900210" size-unit="char" translate="yes" xml:space="preserve">
          <source>Cat</source>
          <target state="translated">Katt</target>
          <note from="Xliff Generator" annotates="general" priority="3">Table Animal - Field Name - Property Caption</note>
          <note from="Developer" annotates="general" priority="2">Pet</note>
        </trans-unit>
        <trans-unit id="Codeunit 1 - NamedType 2" maxwidth="30" size-unit="char" translate="yes" xml:space="preserve">
          <source>Dog &amp; co</source>
          <target>[NAB: SUGGESTION]Hund</target>
          <target>[NAB: SUGGESTION]Vovve</target>
        </trans-unit>
        <trans-unit id="Codeunit 1 - NamedType 3" translate="no" xml:space="preserve">
          <source>DEBUG</source>
        </trans-unit>
      </group>
    </body>
  </file>
</xliff>"#;

    #[test]
    fn parses_units_targets_and_notes() {
        let doc = parse(SAMPLE).unwrap();
        assert_eq!(doc.source_language, "en-US");
        assert_eq!(doc.target_language, "sv-SE");
        assert_eq!(doc.original, "Al");
        assert_eq!(doc.units.len(), 3);

        let cat = &doc.units[0];
        assert_eq!(cat.target_text(), "Katt");
        assert_eq!(cat.completion(), Completion::Translated);
        assert_eq!(cat.xml_space.as_deref(), Some("preserve"));
        assert_eq!(cat.note_text(&NoteSource::Developer), "Pet");
        assert_eq!(
            cat.note_text(&NoteSource::Generator),
            "Table Animal - Field Name - Property Caption"
        );

        let dog = &doc.units[1];
        assert_eq!(dog.source, "Dog & co");
        assert_eq!(dog.max_width, Some(30));
        assert_eq!(
            dog.target.as_ref().and_then(|t| t.token),
            Some(TranslationToken::Suggestion)
        );
        assert_eq!(dog.alternatives.len(), 1);
        assert_eq!(dog.alternatives[0].text, "Vovve");

        assert!(!doc.units[2].translate);
    }

    #[test]
    fn missing_group_is_reported() {
        let text = r#"<xliff><file source-language="en-US" target-language="da-DK"><body></body></file></xliff>"#;
        match parse(text) {
            Err(XlfError::MissingRequiredElement { element, .. }) => assert_eq!(element, "group"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn missing_language_is_reported() {
        let text = r#"<xliff><file source-language="en-US"><body><group id="body"/></body></file></xliff>"#;
        assert!(matches!(
            parse(text),
            Err(XlfError::MissingRequiredElement { .. })
        ));
    }

    #[test]
    fn broken_target_is_located() {
        let text = "<xliff>\n<target>Katt</target>target>\n</xliff>";
        match parse(text) {
            Err(XlfError::MalformedDocument { offset, length, .. }) => {
                assert!(text[offset..offset + length].contains("target>"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn syntax_error_offset_points_into_text() {
        let text = "<xliff>\n  <file>\n</xliff>";
        match parse(text) {
            Err(XlfError::MalformedDocument { offset, .. }) => {
                assert!(offset > 0 && offset <= text.len(), "offset {offset}");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let text = r#"<xliff><file source-language="en-US" target-language="da-DK"><body><group id="body">
<trans-unit id="a"><source>x</source></trans-unit>
<trans-unit id="a"><source>y</source></trans-unit>
</group></body></file></xliff>"#;
        assert!(matches!(parse(text), Err(XlfError::InvalidUnit { .. })));
    }

    #[test]
    fn byte_offset_counts_multibyte_chars() {
        let text = "åäö\nxyz";
        assert_eq!(byte_offset(text, 1, 2), 2);
        assert_eq!(byte_offset(text, 2, 3), 9);
    }
}
