use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error("failed to read view {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Renders `<views_dir>/<name>.html`, replacing `{{ key }}` markers with
/// HTML-escaped context values. Unknown keys render as empty strings.
/// Templates are read on every render.
#[derive(Debug, Clone)]
pub struct ViewRenderer {
    views_dir: PathBuf,
}

impl ViewRenderer {
    pub fn new(views_dir: impl Into<PathBuf>) -> Self {
        Self { views_dir: views_dir.into() }
    }

    pub async fn render(&self, name: &str, context: &HashMap<&str, String>) -> Result<String, ViewError> {
        let path = self.views_dir.join(format!("{name}.html"));
        let template = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ViewError::Read { path, source })?;
        Ok(fill(&template, context))
    }
}

fn fill(template: &str, context: &HashMap<&str, String>) -> String {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    let marker = MARKER.get_or_init(|| Regex::new(r"\{\{\s*([\w.]+)\s*\}\}").expect("static pattern"));

    marker
        .replace_all(template, |caps: &regex::Captures| {
            context.get(&caps[1]).map(|v| escape_html(v)).unwrap_or_default()
        })
        .into_owned()
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
