//! CEF v0 (Common Event Format) encoder.
//!
//! The header and extension sections have different grammars (`|` vs `=`
//! separators) and therefore distinct escaping rules. Backslash is always
//! escaped first so later steps cannot double-escape characters they
//! introduce.

use crate::format::EncodeError;
use crate::models::{FieldSet, FieldValue};

/// CEF version token, first of the seven pipe-delimited header fields.
const CEF_VERSION: &str = "CEF:0";

/// The six required header fields, in wire order. Templates must provide
/// all of them; everything else in the field set becomes an extension.
const CEF_HEADER_FIELDS: [&str; 6] = [
    "deviceVendor",
    "deviceProduct",
    "deviceVersion",
    "deviceEventClassID",
    "Name",
    "Severity",
];

/// Escape a header field value.
///
/// Values carrying the two-character escape sequences `\n`/`\r` as typed
/// text are rejected outright: unlike the `=` context there is no escape
/// for a pipe-delimited field, and downstream parsers treat the sequence
/// as a line break.
fn escape_header(field: &'static str, value: &str) -> Result<String, EncodeError> {
    if value.contains("\\n") || value.contains("\\r") {
        return Err(EncodeError::HeaderNewline { field });
    }
    Ok(value.replace('\\', "\\\\").replace('|', "\\|"))
}

/// Escape an extension key.
fn escape_extension_key(key: &str) -> Result<String, EncodeError> {
    if key.contains("\\n") || key.contains("\\r") {
        return Err(EncodeError::ExtensionKeyNewline {
            key: key.to_string(),
        });
    }
    Ok(key.replace('\\', "\\\\").replace('=', "\\="))
}

/// Escape an extension value. Real newline and carriage-return characters
/// are representable here and become `\n`/`\r`.
fn escape_extension_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('=', "\\=")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
}

/// Encode a field set as a CEF:0 message.
///
/// `process_name` and `external_id` are injected as the
/// `deviceProcessName`/`deviceExternalId` extensions; they are never
/// required from the template. Header fields are removed from the set
/// before extension serialization, so no field appears twice.
pub fn encode(
    mut fields: FieldSet,
    process_name: &str,
    external_id: &str,
) -> Result<String, EncodeError> {
    fields.insert(
        "deviceProcessName".to_string(),
        FieldValue::from(process_name),
    );
    fields.insert(
        "deviceExternalId".to_string(),
        FieldValue::from(external_id),
    );

    let mut tokens = Vec::with_capacity(CEF_HEADER_FIELDS.len() + 2);
    tokens.push(CEF_VERSION.to_string());

    for field in CEF_HEADER_FIELDS {
        let value = fields
            .remove(field)
            .and_then(|value| value.coerce())
            .ok_or(EncodeError::MissingHeaderField { field })?;
        tokens.push(escape_header(field, &value)?);
    }

    // Everything left over goes into the extension section.
    let mut extensions = Vec::new();
    for (key, value) in &fields {
        let Some(value) = value.coerce() else {
            continue;
        };
        extensions.push(format!(
            "{}={}",
            escape_extension_key(key)?,
            escape_extension_value(&value)
        ));
    }
    tokens.push(extensions.join(" "));

    Ok(tokens.join("|"))
}
