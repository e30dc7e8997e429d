//! Host configuration template rendering.
//!
//! Plain placeholder substitution over a small, fixed token set:
//!
//! | token                                   | value                         |
//! |-----------------------------------------|-------------------------------|
//! | `{{PORT}}`                              | listening port                |
//! | `{{PROTOCOL}}`                          | `http` / `https`              |
//! | `{{PHYSICAL_PATH}}`                     | deployed artifact directory   |
//! | `{{APPLICATION_PATH}}`                  | URL mount path                |
//! | `{{WINDOWS_AUTHENTICATION_ENABLED}}`    | `true` / `false`              |
//! | `{{DEFAULT_APPLICATION_PHYSICAL_PATH}}` | directory of the root app     |
//!
//! Path values are escaped for the [`TemplateFormat`] of the template, so
//! TOML templates must place them inside basic (`"..."`) strings.
//!
//! A host always needs an application at `/`. When the site is mounted
//! elsewhere, the commented-out default-application stanza is enabled and
//! served from an empty directory inside the physical path.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Result;

/// Template shipped with the crate, understood by `dryrun-host`.
pub const BUNDLED_TEMPLATE: &str = include_str!("../templates/host.toml");

/// Directory created under the physical path for the root application.
pub const DEFAULT_APPLICATION_DIR: &str = "dummy-default-application";

const DEFAULT_APPLICATION_COMMENT_OPEN: &str = "<!--{{DEFAULT_APPLICATION_COMMENT}}";
const DEFAULT_APPLICATION_COMMENT_CLOSE: &str = "{{DEFAULT_APPLICATION_COMMENT}}-->";
const DEFAULT_APPLICATION_COMMENT_LINE: &str = "#{{DEFAULT_APPLICATION_COMMENT}}";

/// Where the host configuration template comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateSource {
    /// [`BUNDLED_TEMPLATE`]
    #[default]
    Bundled,
    /// A template file on disk, e.g. an IIS Express `applicationHost.config`
    File(PathBuf),
    Inline(String),
}

impl TemplateSource {
    pub fn load(&self) -> Result<String> {
        match self {
            TemplateSource::Bundled => Ok(BUNDLED_TEMPLATE.to_string()),
            TemplateSource::File(path) => Ok(std::fs::read_to_string(path)?),
            TemplateSource::Inline(text) => Ok(text.clone()),
        }
    }

    /// Format of the template text `load` returns.
    pub fn format(&self) -> TemplateFormat {
        match self {
            TemplateSource::Bundled => TemplateFormat::Toml,
            TemplateSource::File(path) => {
                if path.extension().is_some_and(|ext| ext == "toml") {
                    TemplateFormat::Toml
                } else {
                    TemplateFormat::Markup
                }
            }
            TemplateSource::Inline(text) => {
                if text.trim_start().starts_with('<') {
                    TemplateFormat::Markup
                } else {
                    TemplateFormat::Toml
                }
            }
        }
    }
}

/// Syntax path values are escaped for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TemplateFormat {
    /// Values land inside TOML basic strings.
    #[default]
    Toml,
    /// Values land inside XML attributes or text.
    Markup,
}

impl TemplateFormat {
    fn escape(self, value: &str) -> String {
        let mut escaped = String::with_capacity(value.len());
        for c in value.chars() {
            match (self, c) {
                (TemplateFormat::Toml, '"') => escaped.push_str("\\\""),
                (TemplateFormat::Toml, '\\') => escaped.push_str("\\\\"),
                (TemplateFormat::Toml, c) if c.is_control() => {
                    escaped.push_str(&format!("\\u{:04X}", c as u32))
                }
                (TemplateFormat::Markup, '&') => escaped.push_str("&amp;"),
                (TemplateFormat::Markup, '<') => escaped.push_str("&lt;"),
                (TemplateFormat::Markup, '>') => escaped.push_str("&gt;"),
                (TemplateFormat::Markup, '"') => escaped.push_str("&quot;"),
                (TemplateFormat::Markup, '\'') => escaped.push_str("&apos;"),
                (_, c) => escaped.push(c),
            }
        }
        escaped
    }
}

/// Values substituted into the template.
#[derive(Debug, Clone)]
pub struct RenderParams<'a> {
    pub port: u16,
    pub physical_path: &'a Path,
    pub application_path: &'a str,
    pub windows_authentication: bool,
    pub use_https: bool,
    pub format: TemplateFormat,
}

/// Render `template`.
///
/// Creates `<physical_path>/dummy-default-application` when the application
/// is not mounted at `/`; an existing directory is fine.
pub fn render(template: &str, params: &RenderParams<'_>) -> Result<String> {
    let escape = |value: &str| params.format.escape(value);
    let physical_path = escape(&params.physical_path.display().to_string());
    let protocol = if params.use_https { "https" } else { "http" };

    let mut rendered = template
        .replace("{{PORT}}", &params.port.to_string())
        .replace("{{PROTOCOL}}", protocol)
        .replace("{{PHYSICAL_PATH}}", &physical_path)
        .replace("{{APPLICATION_PATH}}", &escape(params.application_path))
        .replace(
            "{{WINDOWS_AUTHENTICATION_ENABLED}}",
            if params.windows_authentication {
                "true"
            } else {
                "false"
            },
        );

    if params.application_path != "/" {
        let default_app_dir = params.physical_path.join(DEFAULT_APPLICATION_DIR);
        std::fs::create_dir_all(&default_app_dir)?;
        debug!("Default application served from {}", default_app_dir.display());

        rendered = rendered
            .replace(
                "{{DEFAULT_APPLICATION_PHYSICAL_PATH}}",
                &escape(&default_app_dir.display().to_string()),
            )
            .replace(DEFAULT_APPLICATION_COMMENT_OPEN, "")
            .replace(DEFAULT_APPLICATION_COMMENT_CLOSE, "")
            .replace(DEFAULT_APPLICATION_COMMENT_LINE, "");
    }

    Ok(rendered)
}
