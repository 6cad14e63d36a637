//! Entry body markup check
//!
//! Entry bodies are stored as HTML fragments that must also be well-formed
//! XML. A body is checked by wrapping it in a synthetic `<entry>` root and
//! parsing the result; the parser's message is what the author sees.

/// Name of the synthetic root element wrapped around a body
pub const ROOT_ELEMENT: &str = "entry";

/// Check that `body`, wrapped in `<entry>..</entry>`, is well-formed XML.
///
/// On failure the error is the parser's description of the first problem.
pub fn validate_entry_body(body: &str) -> Result<(), String> {
    let wrapped = format!("<{root}>{body}</{root}>", root = ROOT_ELEMENT, body = body);
    check_well_formed(&wrapped)
}

/// Check a complete XML document with a single root element.
///
/// Names, characters, comments, entity references and namespace prefixes
/// are all checked; DTDs are refused.
pub fn check_well_formed(xml: &str) -> Result<(), String> {
    let document = roxmltree::Document::parse(xml).map_err(|err| err.to_string())?;

    let mut elements = 0;
    for node in document.root().children() {
        if node.is_element() {
            elements += 1;
        } else if node.is_text() && !node.text().unwrap_or_default().trim().is_empty() {
            return Err("text outside the document element".to_string());
        }
    }
    if elements != 1 {
        return Err(format!("expected one document element, found {}", elements));
    }
    Ok(())
}
