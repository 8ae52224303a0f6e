use chrono::{
    Local,
    NaiveDate,
};

pub trait Blank {
    fn is_blank(&self) -> bool;
}

// whitespace-only answers count as empty
impl Blank for str {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

/// Implement the trait for `String` by forwarding the method to `str`
impl Blank for String {
    fn is_blank(&self) -> bool {
        self.as_str().is_blank()
    }
}

impl Blank for Option<String> {
    fn is_blank(&self) -> bool {
        self.as_deref().map(str::is_blank).unwrap_or(true)
    }
}

/// Names of the entries in `fields` whose value is blank, in declaration order.
pub fn blank_fields<'a>(fields: &[(&'a str, &str)]) -> Vec<&'a str> {
    fields.iter().filter(|(_, value)| value.is_blank()).map(|(name, _)| *name).collect()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
