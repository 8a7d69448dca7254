//! IDE helper generation.
//!
//! Frameworks such as Laravel expose their services through facades,
//! classes with no members of their own that forward static calls.
//! Editors cannot see through that, so this module writes a stub file in
//! which every configured facade `extends` the class it forwards to and
//! lists the public members of that class as `@method static` / `@var
//! static` docblock tags.
//!
//! The pipeline per scanned file: take the file's class (the class of its
//! first declaration), find the [`ClassMapEntry`]s for it, keep the
//! relevant members ([`filter_relevant`]), turn each into a
//! [`HelperEntry`] and render one docblock plus stub class per entry.

use std::path::Path;

use tracing::{debug, info};

use crate::config::{ClassMapEntry, Config};
use crate::docblock::DocSummary;
use crate::error::{Error, Result};
use crate::lexer::Lexer;
use crate::scanner::{self, FileDeclarations};
use crate::types::{Declaration, DeclarationKind, Visibility};

/// PHP magic methods.  Never documented, never completed.
pub const MAGIC_METHODS: &[&str] = &[
    "__construct",
    "__destruct",
    "__call",
    "__callStatic",
    "__get",
    "__set",
    "__isset",
    "__unset",
    "__sleep",
    "__wakeup",
    "__toString",
    "__invoke",
    "__set_state",
    "__clone",
];

/// First lines of every generated file.
pub const HEADER: &str = "<?php die(\"Access denied!\");
/**
 * ---------------- DO NOT UPLOAD THIS FILE TO LIVE SERVER ------------------------
 * Laravel IDE Helper <http://LaravelBook.com>
 * Implements code completion for Laravel 4 in JetBrains PhpStorm and SublimeText 2
 * --------------------------------------------------------------------------------
 */";

pub fn is_magic(name: &str) -> bool {
    MAGIC_METHODS.contains(&name)
}

// ─── Entries ────────────────────────────────────────────────────────────────

/// One member as it appears in the helper docblock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperEntry {
    /// Member name without `$`.
    pub name: String,
    /// `@method` or `@var`.
    pub tag: &'static str,
    pub returns: String,
    /// Parameter list without the parentheses.
    pub args: String,
    /// First line of the doc comment.
    pub summary: String,
}

impl HelperEntry {
    pub fn from_declaration(decl: &Declaration) -> Self {
        let doc = DocSummary::parse(&decl.doc);

        // Without an `@return` tag the member is documented as void.
        let documented = doc.returns.as_deref().is_some_and(|r| !r.is_empty());
        let returns = if documented && !decl.returns.is_empty() {
            decl.returns.clone()
        } else {
            "void".to_string()
        };

        let args = if doc.params.is_empty() {
            decl.args
                .iter()
                .map(|a| format!("{} {}", a.type_hint, a.name).trim().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        } else {
            doc.joined_params()
        };

        Self {
            name: decl.bare_name().to_string(),
            tag: match decl.kind {
                DeclarationKind::Function => "@method",
                DeclarationKind::Variable | DeclarationKind::Constant => "@var",
            },
            returns,
            args,
            summary: doc.summary,
        }
    }

    /// ` * @method\tstatic\tvoid\tname(args)\tSummary.`
    pub fn render(&self) -> String {
        let name = if self.tag == "@method" {
            format!("{}({})", self.name, self.args)
        } else {
            self.name.clone()
        };
        format!(
            " * {}",
            [self.tag, "static", &self.returns, &name, &self.summary].join("\t")
        )
    }
}

/// Public, named, non-magic members.
pub fn filter_relevant(declarations: &[Declaration]) -> Vec<HelperEntry> {
    declarations
        .iter()
        .filter(|d| d.visibility == Visibility::Public)
        .filter(|d| !d.name.trim().is_empty() && !is_magic(&d.name))
        .map(HelperEntry::from_declaration)
        .collect()
}

// ─── Rendering ──────────────────────────────────────────────────────────────

/// Docblock and facade stub for one class map entry.
pub fn generate_doc_block(map: &ClassMapEntry, entries: &[HelperEntry]) -> String {
    let mut out = String::from("/**\n");
    for entry in entries {
        out.push_str(&entry.render());
        out.push('\n');
    }
    out.push_str(" */\n");
    out.push_str(&format!(
        "class {} extends {} {{}}\n",
        map.subclass, map.superclass
    ));
    out
}

/// Class map entries that `file` contributes to.
pub fn allowed_entries<'a>(
    config: &'a Config,
    file: &'a FileDeclarations,
) -> Vec<&'a ClassMapEntry> {
    let Some(class) = file.class_name() else {
        return Vec::new();
    };
    config
        .entries_for(class)
        .filter(|e| e.matches_file(&file.path))
        .collect()
}

/// Blocks generated for one scanned file, possibly none.
pub fn process_file(config: &Config, file: &FileDeclarations) -> Vec<String> {
    let maps = allowed_entries(config, file);
    if maps.is_empty() {
        return Vec::new();
    }
    let entries = filter_relevant(&file.declarations);
    debug!(
        path = %file.path.display(),
        members = entries.len(),
        facades = maps.len(),
        "documenting class"
    );
    maps.into_iter()
        .map(|map| generate_doc_block(map, &entries))
        .collect()
}

/// The whole helper file for a set of scanned files.
pub fn render(config: &Config, files: &[FileDeclarations]) -> String {
    let mut out = String::from(HEADER);
    for block in files.iter().flat_map(|f| process_file(config, f)) {
        out.push_str("\n\n");
        out.push_str(&block);
    }
    out.push('\n');
    out
}

/// Scan `target` (a file or a directory) and render the helper file.
pub fn generate(lexer: &impl Lexer, config: &Config, target: &Path) -> Result<String> {
    let extension = &config.generator.extension;
    let files = if target.is_dir() {
        scanner::scan_all_files(lexer, target, extension)?
    } else {
        scanner::scan_file(lexer, target, extension)?
            .into_iter()
            .collect()
    };
    Ok(render(config, &files))
}

/// [`generate`] and write the result to `output`.
pub fn write_helper(
    lexer: &impl Lexer,
    config: &Config,
    target: &Path,
    output: &Path,
) -> Result<()> {
    let text = generate(lexer, config, target)?;
    std::fs::write(output, &text).map_err(|e| Error::io(output, e))?;
    info!(output = %output.display(), bytes = text.len(), "wrote IDE helper");
    Ok(())
}
