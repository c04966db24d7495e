//! Minification strategies for artifact builds.
//!
//! - [`CommandMinifier`]: external compress command (`uglifyjs %s -c -m`),
//!   stdout becomes the artifact.
//! - [`BuiltinMinifier`]: in-process, oxc for JavaScript and lightningcss
//!   for CSS.

use std::path::Path;
use std::time::Duration;

use anyhow::{Result, bail};
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier as OxcMinifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use crate::debug;
use crate::utils::exec::{Cmd, FilterRule, expand_template, template_program};

/// Produces minified artifact content from a source file.
pub trait Minifier {
    /// Minify `source`, whose bytes are `content`.
    fn minify(&self, source: &Path, content: &[u8]) -> Result<Vec<u8>>;
}

// ============================================================================
// Command
// ============================================================================

/// Common noise printed by JS/CSS minifiers on stderr.
static MINIFY_FILTER: FilterRule = FilterRule::new(&["WARN:", "Warning:"]);

/// Runs a configured compress command template through the shell.
#[derive(Debug, Clone)]
pub struct CommandMinifier {
    template: String,
    timeout: Option<Duration>,
}

impl CommandMinifier {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            timeout: None,
        }
    }

    /// Kill the command if it runs longer than `limit`.
    pub fn with_timeout(mut self, limit: Option<Duration>) -> Self {
        self.timeout = limit;
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }
}

impl Minifier for CommandMinifier {
    fn minify(&self, source: &Path, content: &[u8]) -> Result<Vec<u8>> {
        let script = expand_template(&self.template, source);
        debug!("minify"; "{}", script);

        let mut cmd = Cmd::shell(&script).filter(&MINIFY_FILTER);
        if let Some(limit) = self.timeout {
            cmd = cmd.timeout(limit);
        }
        let output = cmd.run()?;

        if output.stdout.is_empty() && !content.is_empty() {
            bail!(
                "`{}` produced no output",
                template_program(&self.template).unwrap_or(&self.template)
            );
        }
        Ok(output.stdout)
    }
}

// ============================================================================
// Builtin
// ============================================================================

/// In-process minifier chosen by file extension: oxc for `.js`/`.mjs`,
/// lightningcss for `.css`.
///
/// Content that is not UTF-8, has another extension, or fails to parse is
/// copied unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinMinifier;

impl Minifier for BuiltinMinifier {
    fn minify(&self, source: &Path, content: &[u8]) -> Result<Vec<u8>> {
        let ext = source.extension().and_then(|e| e.to_str());
        let minified = std::str::from_utf8(content)
            .ok()
            .and_then(|text| match ext {
                Some("js" | "mjs") => compact_script(text),
                Some("css") => compact_stylesheet(text),
                _ => None,
            });

        Ok(match minified {
            Some(code) => code.into_bytes(),
            None => {
                debug!("minify"; "{} copied as is", source.display());
                content.to_vec()
            }
        })
    }
}

/// Mangled and compressed script, `None` on any parse error.
fn compact_script(text: &str) -> Option<String> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, text, SourceType::mjs()).parse();
    if !parsed.errors.is_empty() {
        return None;
    }

    let mut program = parsed.program;
    let scoping = OxcMinifier::new(MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    })
    .minify(&allocator, &mut program)
    .scoping;

    let codegen = CodegenOptions {
        minify: true,
        comments: CommentOptions::disabled(),
        ..CodegenOptions::default()
    };
    Some(Codegen::new().with_options(codegen).with_scoping(scoping).build(&program).code)
}

fn compact_stylesheet(text: &str) -> Option<String> {
    let printer = PrinterOptions {
        minify: true,
        ..PrinterOptions::default()
    };
    StyleSheet::parse(text, ParserOptions::default())
        .ok()?
        .to_css(printer)
        .ok()
        .map(|css| css.code)
}
