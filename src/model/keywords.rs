use serde_json::Value;

/// Keyword namespaces whose metadata now lives in the marketplace catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedPrefixes(Vec<String>);

impl ReservedPrefixes {
    pub fn new(prefixes: impl IntoIterator<Item = String>) -> Self {
        Self(prefixes.into_iter().collect())
    }

    /// The reserved prefix `keyword` starts with, if any.
    pub fn matching(&self, keyword: &str) -> Option<&str> {
        self.0
            .iter()
            .map(String::as_str)
            .find(|prefix| keyword.starts_with(prefix))
    }

    pub fn is_reserved(&self, keyword: &str) -> bool {
        self.matching(keyword).is_some()
    }

    /// Split `keywords` into the entries to keep and the reserved ones to drop.
    ///
    /// Both halves keep their original relative order. Non-string entries are
    /// always kept.
    pub fn partition(&self, keywords: &[Value]) -> KeywordSplit {
        let (removed, kept): (Vec<Value>, Vec<Value>) = keywords
            .iter()
            .cloned()
            .partition(|kw| kw.as_str().is_some_and(|s| self.is_reserved(s)));

        KeywordSplit { kept, removed }
    }
}

impl Default for ReservedPrefixes {
    fn default() -> Self {
        Self::new(["support:".to_string(), "lifecycle:".to_string()])
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordSplit {
    pub kept: Vec<Value>,
    pub removed: Vec<Value>,
}

impl KeywordSplit {
    pub fn has_removals(&self) -> bool {
        !self.removed.is_empty()
    }
}

/// Render keywords as a Python list literal: `['a', 'b']`.
pub fn render_list(keywords: &[Value]) -> String {
    let items: Vec<String> = keywords.iter().map(repr).collect();
    format!("[{}]", items.join(", "))
}

fn repr(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        Value::Array(items) => render_list(items),
        Value::Object(fields) => {
            let items: Vec<String> = fields
                .iter()
                .map(|(k, v)| format!("{}: {}", quote(k), repr(v)))
                .collect();
            format!("{{{}}}", items.join(", "))
        }
    }
}

// Single quotes unless the text holds a `'` and no `"`.
fn quote(s: &str) -> String {
    let delim = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(s.len() + 2);
    out.push(delim);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == delim => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(delim);
    out
}
