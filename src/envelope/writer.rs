//! XML envelope serialization.
//!
//! Output is real ISO-8859-1: characters outside Latin-1 become numeric
//! character references, so the declared encoding always holds.

use crate::envelope::params::Parameter;

/// First line of every envelope.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="ISO-8859-1"?>"#;

/// Writes a root element with attributes and one `parameter` child per entry.
#[derive(Debug, Clone)]
pub struct EnvelopeWriter<'a> {
    root: &'a str,
    attributes: Vec<(&'a str, String)>,
    parameters: &'a [Parameter],
}

impl<'a> EnvelopeWriter<'a> {
    pub fn new(root: &'a str) -> Self {
        Self {
            root,
            attributes: Vec::new(),
            parameters: &[],
        }
    }

    pub fn attribute(mut self, name: &'a str, value: impl Into<String>) -> Self {
        self.attributes.push((name, value.into()));
        self
    }

    pub fn parameters(mut self, parameters: &'a [Parameter]) -> Self {
        self.parameters = parameters;
        self
    }

    /// Render the complete document.
    pub fn render(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(128 + self.parameters.len() * 48);
        out.extend_from_slice(XML_DECLARATION.as_bytes());
        out.push(b'\n');

        out.push(b'<');
        out.extend_from_slice(self.root.as_bytes());
        for (name, value) in &self.attributes {
            push_attribute(&mut out, name, value);
        }
        out.extend_from_slice(b">\n");

        for param in self.parameters {
            out.extend_from_slice(b"\t<parameter");
            push_attribute(&mut out, "id", &param.id);
            push_attribute(&mut out, "value", &param.value);
            out.extend_from_slice(b"/>\n");
        }

        out.extend_from_slice(b"</");
        out.extend_from_slice(self.root.as_bytes());
        out.extend_from_slice(b">\n");
        out
    }
}

fn push_attribute(out: &mut Vec<u8>, name: &str, value: &str) {
    out.push(b' ');
    out.extend_from_slice(name.as_bytes());
    out.extend_from_slice(b"=\"");
    push_escaped(out, value);
    out.push(b'"');
}

/// Escape markup characters and encode as Latin-1.
pub fn push_escaped(out: &mut Vec<u8>, value: &str) {
    for ch in value.chars() {
        match ch {
            '&' => out.extend_from_slice(b"&amp;"),
            '<' => out.extend_from_slice(b"&lt;"),
            '>' => out.extend_from_slice(b"&gt;"),
            '"' => out.extend_from_slice(b"&quot;"),
            '\'' => out.extend_from_slice(b"&#039;"),
            // attribute value normalization would turn these into spaces
            '\t' | '\n' | '\r' => out.extend_from_slice(format!("&#{};", ch as u32).as_bytes()),
            // not representable in XML 1.0
            c if (c as u32) < 0x20 => out.push(b'?'),
            c if (c as u32) <= 0xFF => out.push(c as u32 as u8),
            c => out.extend_from_slice(format!("&#{};", c as u32).as_bytes()),
        }
    }
}
