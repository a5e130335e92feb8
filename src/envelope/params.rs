//! Parameter extraction from raw request fields.
//!
//! A field value has the shape `<paramID>,<paramValue>`. Only the first comma
//! separates; the value keeps any further commas.

/// One `<parameter id=".." value=".."/>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub id: String,
    pub value: String,
}

impl Parameter {
    pub fn new(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            value: value.into(),
        }
    }

    /// Build from a raw `id,value` field, unquoting the value once.
    pub fn from_raw(raw: &str) -> Self {
        let (id, value) = split_first_comma(raw);
        Self::new(id, unquote(value))
    }
}

/// Split on the first comma. Without a comma the right side is empty.
pub fn split_first_comma(raw: &str) -> (&str, &str) {
    raw.split_once(',').unwrap_or((raw, ""))
}

/// Strip one layer of matching enclosing `"` or `'` quotes.
pub fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Turn every non-reserved field into a parameter, in arrival order.
pub fn collect_parameters<'a, I>(fields: I, reserved: &[&str]) -> Vec<Parameter>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    fields
        .into_iter()
        .filter(|(name, _)| !reserved.contains(name))
        .map(|(_, raw)| Parameter::from_raw(raw))
        .collect()
}
