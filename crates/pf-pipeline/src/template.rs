//! `{variable}` substitution for command arguments.

use std::collections::HashMap;
use std::path::Path;

/// Variables available to `exec` arguments.
///
/// [`for_file`](Self::for_file) defines `{input}`, `{filename}`,
/// `{filestem}`, `{extension}`, `{dirname}` and `{phase}`. Unknown
/// placeholders are left as written.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    vars: HashMap<String, String>,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Variables describing `input` as processed by `phase`.
    pub fn for_file(input: &Path, phase: &str) -> Self {
        let mut ctx = Self::new()
            .with_var("input", input.display().to_string())
            .with_var("phase", phase);

        if let Some(name) = input.file_name() {
            ctx.set("filename", name.to_string_lossy());
        }
        if let Some(stem) = input.file_stem() {
            ctx.set("filestem", stem.to_string_lossy());
        }
        if let Some(ext) = input.extension() {
            ctx.set("extension", ext.to_string_lossy());
        }
        if let Some(parent) = input.parent() {
            ctx.set("dirname", parent.display().to_string());
        }
        ctx
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Replace every known `{name}` in one left-to-right pass.
    ///
    /// Substituted values are not rescanned, so a file name containing
    /// braces is passed through literally.
    pub fn substitute(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) => {
                    let key = &after[..close];
                    match self.vars.get(key) {
                        Some(value) => out.push_str(value),
                        None => {
                            out.push('{');
                            out.push_str(key);
                            out.push('}');
                        }
                    }
                    rest = &after[close + 1..];
                }
                None => {
                    out.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }

    pub fn substitute_all(&self, templates: &[String]) -> Vec<String> {
        templates.iter().map(|t| self.substitute(t)).collect()
    }
}
