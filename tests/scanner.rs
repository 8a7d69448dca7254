mod common;

use common::create_workspace;
use php_codeintel::PhpLexer;
use php_codeintel::scanner::{self, IGNORE_FILE, has_extension};

#[test]
fn test_only_matching_extensions_are_scanned() {
    let dir = create_workspace(&[
        ("a.php", "<?php class A { public function a() {} }"),
        ("b.inc", "<?php class B { public function b() {} }"),
        ("notes.txt", "class C {}"),
    ]);

    let files = scanner::scan_all_files(&PhpLexer, dir.path(), "php").expect("scan");
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].class_name(), Some("A"));

    let inc = scanner::scan_all_files(&PhpLexer, dir.path(), ".inc").expect("scan");
    assert_eq!(inc.len(), 1);
    assert_eq!(inc[0].class_name(), Some("B"));
}

#[test]
fn test_results_are_sorted_and_absolute() {
    let dir = create_workspace(&[
        ("z/Last.php", "<?php class Last { public $x; }"),
        ("a/First.php", "<?php class First { public $y; }"),
        ("m/Middle.php", "<?php class Middle { public $z; }"),
    ]);

    let files = scanner::scan_all_files(&PhpLexer, dir.path(), "php").expect("scan");
    let classes: Vec<_> = files.iter().filter_map(|f| f.class_name()).collect();
    assert_eq!(classes, vec!["First", "Middle", "Last"]);
    assert!(files.iter().all(|f| f.path.is_absolute()));
}

#[test]
fn test_vendor_is_scanned_even_when_gitignored() {
    let dir = create_workspace(&[
        (".gitignore", "vendor/\n"),
        ("vendor/laravel/Foo.php", "<?php class Foo { public function foo() {} }"),
    ]);

    let files = scanner::scan_all_files(&PhpLexer, dir.path(), "php").expect("scan");
    assert_eq!(files.len(), 1);
}

#[test]
fn test_hidden_directories_are_skipped() {
    let dir = create_workspace(&[
        (".cache/Hidden.php", "<?php class Hidden { public $h; }"),
        ("Visible.php", "<?php class Visible { public $v; }"),
    ]);

    let files = scanner::scan_all_files(&PhpLexer, dir.path(), "php").expect("scan");
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].class_name(), Some("Visible"));
}

#[test]
fn test_custom_ignore_file_prunes_the_tree() {
    let dir = create_workspace(&[
        (IGNORE_FILE, "storage/\n"),
        ("storage/Cached.php", "<?php class Cached { public $c; }"),
        ("app/Kept.php", "<?php class Kept { public $k; }"),
    ]);

    let files = scanner::scan_all_files(&PhpLexer, dir.path(), "php").expect("scan");
    let classes: Vec<_> = files.iter().filter_map(|f| f.class_name()).collect();
    assert_eq!(classes, vec!["Kept"]);
}

#[test]
fn test_files_without_declarations_are_still_listed() {
    let dir = create_workspace(&[("bootstrap.php", "<?php require 'vendor/autoload.php';")]);

    let files = scanner::scan_all_files(&PhpLexer, dir.path(), "php").expect("scan");
    assert_eq!(files.len(), 1);
    assert!(files[0].declarations.is_empty());
    assert_eq!(files[0].class_name(), None);
}

#[test]
fn test_scan_file_skips_other_extensions() {
    let dir = create_workspace(&[("readme.md", "# hi")]);
    let found = scanner::scan_file(&PhpLexer, &dir.path().join("readme.md"), "php").expect("scan");
    assert!(found.is_none());
}

#[test]
fn test_scan_file_reads_non_utf8_sources() {
    let dir = create_workspace(&[]);
    let path = dir.path().join("Latin1.php");
    let mut bytes = b"<?php /** caf\xe9 */ class Latin1 { public $name; }".to_vec();
    bytes.push(b'\n');
    std::fs::write(&path, bytes).expect("write");

    let found = scanner::scan_file(&PhpLexer, &path, "php")
        .expect("scan")
        .expect("php file");
    assert_eq!(found.declarations.len(), 1);
    assert_eq!(found.declarations[0].name, "$name");
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = create_workspace(&[]);
    let result = scanner::scan_file(&PhpLexer, &dir.path().join("gone.php"), "php");
    assert!(result.is_err());
}

#[test]
fn test_extension_check() {
    use std::path::Path;
    assert!(has_extension(Path::new("a/b.php"), "php"));
    assert!(has_extension(Path::new("a/b.php"), ".php"));
    assert!(!has_extension(Path::new("a/b.phpx"), "php"));
    assert!(!has_extension(Path::new("a/php"), "php"));
}
