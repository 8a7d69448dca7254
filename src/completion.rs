//! Member completion from a resolved [`Context`].
//!
//! [`SymbolIndex`] keeps the declarations of every known file, keyed by
//! URI.  A completion request walks the context chain through the index:
//!
//! 1. `chain[0]` names the starting class (`self` / `static` / `parent`
//!    are read relative to the current file),
//! 2. every following element is a member whose `returns` type becomes the
//!    next class,
//! 3. the members of the last class are filtered by operator and
//!    visibility and turned into `CompletionItem`s.
//!
//! A partially typed trailing word is not part of the walk; the editor
//! filters the offered items by it.

use std::collections::{HashMap, HashSet};

use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind};

use crate::docblock;
use crate::helper::is_magic;
use crate::types::{
    AccessOperator, Context, ContextVisibility, Declaration, DeclarationKind, Visibility,
};

/// Declarations of all indexed files.
#[derive(Debug, Default)]
pub struct SymbolIndex {
    files: HashMap<String, Vec<Declaration>>,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the declarations recorded for `uri`.
    pub fn update(&mut self, uri: impl Into<String>, declarations: Vec<Declaration>) {
        self.files.insert(uri.into(), declarations);
    }

    pub fn remove(&mut self, uri: &str) {
        self.files.remove(uri);
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.files.contains_key(uri)
    }

    pub fn declarations(&self, uri: &str) -> &[Declaration] {
        self.files.get(uri).map(Vec::as_slice).unwrap_or_default()
    }

    /// Members declared directly on `class`, across all files.
    pub fn members_of<'a>(
        &'a self,
        class: &str,
    ) -> impl Iterator<Item = &'a Declaration> + use<'a> {
        let class = class.to_string();
        self.files
            .values()
            .flatten()
            .filter(move |d| d.class == class)
    }

    /// The class `class` extends, as recorded on any of its members.
    pub fn parent_of(&self, class: &str) -> Option<String> {
        self.members_of(class)
            .find_map(|d| d.extends.as_deref())
            .and_then(docblock::class_name_of)
    }

    /// Member `name` (with or without `$`) of `class`, falling back to the
    /// direct parent class.
    pub fn find_member(&self, class: &str, name: &str) -> Option<&Declaration> {
        let bare = name.trim_start_matches('$');
        let own = self.members_of(class).find(|d| d.bare_name() == bare);
        if own.is_some() {
            return own;
        }
        let parent = self.parent_of(class)?;
        self.files
            .values()
            .flatten()
            .find(|d| d.class == parent && d.bare_name() == bare)
    }

    /// Class of the first declaration in `uri`, if it belongs to a class.
    fn file_class(&self, uri: &str) -> Option<&Declaration> {
        self.declarations(uri).iter().find(|d| !d.is_global())
    }

    /// Turn the base of a chain into a class name.
    fn base_class(&self, base: &str, uri: &str) -> Option<String> {
        match base.to_ascii_lowercase().as_str() {
            "self" | "static" => self.file_class(uri).map(|d| d.class.clone()),
            "parent" => self
                .file_class(uri)
                .and_then(|d| d.extends.as_deref())
                .and_then(docblock::class_name_of),
            _ if base.starts_with('$') => None,
            _ => docblock::class_name_of(base),
        }
    }

    /// Follow `context.chain` to the class whose members should be offered.
    ///
    /// `partial` says whether the last chain element is a word still being
    /// typed rather than a completed member access.
    pub fn resolve_class(&self, context: &Context, uri: &str, partial: bool) -> Option<String> {
        let (base, rest) = context.chain.split_first()?;
        let walk = if partial && !rest.is_empty() {
            &rest[..rest.len() - 1]
        } else {
            rest
        };

        let mut class = self.base_class(base, uri)?;
        for member in walk {
            let decl = self.find_member(&class, member)?;
            class = match decl.returns.as_str() {
                "$this" | "static" | "self" => class,
                returns => docblock::class_name_of(returns)?,
            };
        }
        Some(class)
    }

    /// Completion items for the cursor described by `context`.
    pub fn complete(&self, context: &Context, uri: &str, partial: bool) -> Vec<CompletionItem> {
        let Some(operator) = context.operator else {
            return Vec::new();
        };
        let Some(class) = self.resolve_class(context, uri, partial) else {
            return Vec::new();
        };
        let visibility = context.visibility.unwrap_or(ContextVisibility::Public);

        let parent = self.parent_of(&class);
        let own: Vec<&Declaration> = self.members_of(&class).collect();
        let inherited = parent
            .as_deref()
            .into_iter()
            .flat_map(|p| self.members_of(p))
            .filter(|d| d.visibility != Visibility::Private);

        let mut seen = HashSet::new();
        let mut items: Vec<CompletionItem> = own
            .into_iter()
            .chain(inherited)
            .filter(|d| offered(d, operator, visibility))
            .filter(|d| seen.insert((d.kind, d.bare_name().to_string())))
            .map(|d| build_completion_item(d, operator))
            .collect();

        items.sort_by(|a, b| {
            a.filter_text
                .as_deref()
                .unwrap_or(&a.label)
                .to_lowercase()
                .cmp(&b.filter_text.as_deref().unwrap_or(&b.label).to_lowercase())
        });
        for (i, item) in items.iter_mut().enumerate() {
            item.sort_text = Some(format!("{:05}", i));
        }
        items
    }
}

/// Whether `decl` can follow `operator` at the given visibility.
fn offered(decl: &Declaration, operator: AccessOperator, visibility: ContextVisibility) -> bool {
    if is_magic(&decl.name) {
        return false;
    }
    if visibility == ContextVisibility::Public && decl.visibility != Visibility::Public {
        return false;
    }
    match operator {
        AccessOperator::Static => decl.is_static || decl.kind == DeclarationKind::Constant,
        AccessOperator::Member => !decl.is_static && decl.kind != DeclarationKind::Constant,
    }
}

/// `name(type $a, $b): returns`
pub(crate) fn build_method_label(decl: &Declaration) -> String {
    let params: Vec<String> = decl
        .args
        .iter()
        .map(|a| format!("{} {}", a.type_hint, a.name).trim().to_string())
        .collect();
    let ret = if decl.returns.is_empty() {
        String::new()
    } else {
        format!(": {}", decl.returns)
    };
    format!("{}({}){}", decl.name, params.join(", "), ret)
}

pub(crate) fn build_completion_item(decl: &Declaration, operator: AccessOperator) -> CompletionItem {
    let detail = if decl.returns.is_empty() {
        format!("Class: {}", decl.class)
    } else {
        format!("Class: {} ({})", decl.class, decl.returns)
    };

    match decl.kind {
        DeclarationKind::Function => CompletionItem {
            label: build_method_label(decl),
            kind: Some(CompletionItemKind::METHOD),
            detail: Some(format!("Class: {}", decl.class)),
            insert_text: Some(decl.name.clone()),
            filter_text: Some(decl.name.clone()),
            ..CompletionItem::default()
        },
        DeclarationKind::Variable => {
            // `Foo::$bar` keeps the sigil, `$foo->bar` drops it.
            let name = match operator {
                AccessOperator::Static => decl.name.clone(),
                AccessOperator::Member => decl.bare_name().to_string(),
            };
            CompletionItem {
                label: name.clone(),
                kind: Some(CompletionItemKind::PROPERTY),
                detail: Some(detail),
                insert_text: Some(name.clone()),
                filter_text: Some(name),
                ..CompletionItem::default()
            }
        }
        DeclarationKind::Constant => CompletionItem {
            label: decl.name.clone(),
            kind: Some(CompletionItemKind::CONSTANT),
            detail: Some(detail),
            insert_text: Some(decl.name.clone()),
            filter_text: Some(decl.name.clone()),
            ..CompletionItem::default()
        },
    }
}
