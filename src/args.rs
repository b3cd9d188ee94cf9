//! Command line arguments builder.

const FLAG_PREFIX: &str = "--";

/// Ordered list of command line tokens.
///
/// Tokens are kept exactly in the order they are appended: no de-duplication, reordering or
/// validation of key names is performed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Args(Vec<String>);

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional token. Expected to be called first, for the subcommand name.
    pub fn append_raw(mut self, token: impl Into<String>) -> Self {
        self.0.push(token.into());
        self
    }

    /// Appends `--<key> <value>`.
    pub fn append(mut self, key: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.0.push(flag(key.as_ref()));
        self.0.push(value.into());
        self
    }

    /// Appends the bare flag `--<key>`.
    pub fn append_key(mut self, key: impl AsRef<str>) -> Self {
        self.0.push(flag(key.as_ref()));
        self
    }

    pub fn get(&self) -> Vec<String> {
        self.0.clone()
    }
}

fn flag(key: &str) -> String {
    format!("{FLAG_PREFIX}{key}")
}
