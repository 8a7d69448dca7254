use std::sync::Arc;

use php_codeintel::lexer::{TokenTable, decode_tokens};
use php_codeintel::types::{Token, TokenKind};
use php_codeintel::{Lexer, PhpLexer, extract};

fn significant(src: &str) -> Vec<Token> {
    PhpLexer
        .tokens(src)
        .into_iter()
        .filter(|t| !t.is_trivia())
        .collect()
}

// ─── Built-in lexer ─────────────────────────────────────────────────────────

#[test]
fn test_open_tag_and_inline_html() {
    let tokens = PhpLexer.tokens("<h1>Hi</h1>\n<?php echo 1; ?>\n<p>");
    assert_eq!(tokens[0].kind, Some(TokenKind::InlineHtml));
    assert_eq!(tokens[0].text, "<h1>Hi</h1>\n");
    assert_eq!(tokens[1].kind, Some(TokenKind::OpenTag));
    assert!(tokens[1].text.starts_with("<?php"));
    assert_eq!(tokens[1].line, 2);
    assert!(tokens.iter().any(|t| t.is(&TokenKind::Echo)));
    assert!(tokens.iter().any(|t| t.is(&TokenKind::CloseTag)));
    assert!(tokens.last().is_some_and(|t| t.text.ends_with("<p>")));
}

#[test]
fn test_token_texts_reassemble_the_source() {
    let src = concat!(
        "<?php\n",
        "namespace App\\Http;\n",
        "/** Doc */\n",
        "final class A extends \\Base implements Contracts\\Foo {\n",
        "    // comment\n",
        "    # another\n",
        "    const X = 0x1F, Y = 1.5e3;\n",
        "    public function f(?int $a = null, string ...$rest): ?static {\n",
        "        $s = \"q \\\" {$a}\" . 'x\\'y' . <<<EOT\nbody {$a}\nEOT;\n",
        "        return $this?->g()::h() ?? $a <=> 2;\n",
        "    }\n",
        "}\n",
    );
    let tokens = PhpLexer.tokens(src);
    let joined: String = tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(joined, src);
}

#[test]
fn test_variables_names_and_keywords() {
    let tokens = significant("<?php class Foo extends \\A\\B implements C\\D { function bar($x) {} }");
    let kinds: Vec<Option<TokenKind>> = tokens.iter().map(|t| t.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            Some(TokenKind::OpenTag),
            Some(TokenKind::Class),
            Some(TokenKind::String),
            Some(TokenKind::Extends),
            Some(TokenKind::NameFullyQualified),
            Some(TokenKind::Implements),
            Some(TokenKind::NameQualified),
            None,
            Some(TokenKind::Function),
            Some(TokenKind::String),
            None,
            Some(TokenKind::Variable),
            None,
            None,
            None,
            None,
        ]
    );
}

#[test]
fn test_doc_comments_and_plain_comments() {
    let tokens = PhpLexer.tokens("<?php /** doc */ /* plain */ // line\n# hash\n");
    let docs: Vec<_> = tokens.iter().filter(|t| t.is(&TokenKind::DocComment)).collect();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].text, "/** doc */");
    let comments = tokens.iter().filter(|t| t.is(&TokenKind::Comment)).count();
    assert_eq!(comments, 3);
}

#[test]
fn test_access_operators() {
    let tokens = significant("<?php $a->b; $a?->b; A::b; [1 => 2]; $s .= 'x'; $n += 1; $n -= 1;");
    let has = |kind: TokenKind| tokens.iter().any(|t| t.is(&kind));
    assert!(has(TokenKind::ObjectOperator));
    assert!(has(TokenKind::NullsafeObjectOperator));
    assert!(has(TokenKind::DoubleColon));
    assert!(has(TokenKind::DoubleArrow));
    assert!(has(TokenKind::ConcatEqual));
    assert!(has(TokenKind::PlusEqual));
    assert!(has(TokenKind::AssignOp));
}

#[test]
fn test_line_numbers_advance_through_multiline_tokens() {
    let src = "<?php\n/**\n * doc\n */\nfunction f() {}\n";
    let tokens = significant(src);
    let f = tokens.iter().find(|t| t.text == "f").expect("f");
    assert_eq!(f.line, 5);
}

#[test]
fn test_non_ascii_names_and_variables() {
    let src = concat!(
        "<?php\n",
        "namespace abcdefghi\u{e9}\\Foo;\n",
        "use abcdefghi\u{e9}\\Bar;\n",
        "$caf\u{e9} = 1;\n",
        "class A { public function f() {} }\n",
    );
    let tokens = PhpLexer.tokens(src);
    let joined: String = tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(joined, src);

    assert!(tokens.iter().any(|t| t.is(&TokenKind::NameQualified)
        && t.text == "abcdefghi\u{e9}\\Foo"));
    assert!(tokens.iter().any(|t| t.is(&TokenKind::Variable) && t.text == "$caf\u{e9}"));

    let decls = extract(&tokens);
    assert_eq!(decls.len(), 1);
    assert_eq!(decls[0].class, "A");
    assert_eq!(decls[0].name, "f");
}

#[test]
fn test_close_tag_returns_to_inline_html() {
    let tokens = PhpLexer.tokens("<?php $a; ?>tail");
    assert!(tokens.iter().any(|t| t.is(&TokenKind::CloseTag)));
    assert!(tokens.iter().any(|t| t.is(&TokenKind::InlineHtml) && t.text == "tail"));
}

#[test]
fn test_lexer_trait_objects() {
    let shared: Arc<dyn Lexer> = Arc::new(PhpLexer::new());
    let boxed: Box<dyn Lexer> = Box::new(PhpLexer::new());
    let src = "<?php $a;";
    assert_eq!(
        shared.tokenize(src).expect("never fails"),
        boxed.tokenize(src).expect("never fails")
    );
}

// ─── Process lexer output ───────────────────────────────────────────────────

#[test]
fn test_php_token_names_map_to_kinds() {
    assert_eq!(TokenKind::from_php_name("T_DOC_COMMENT"), TokenKind::DocComment);
    assert_eq!(
        TokenKind::from_php_name("T_PAAMAYIM_NEKUDOTAYIM"),
        TokenKind::DoubleColon
    );
    assert_eq!(TokenKind::from_php_name("T_MINUS_EQUAL"), TokenKind::AssignOp);
    assert_eq!(
        TokenKind::from_php_name("T_FOREACH"),
        TokenKind::Other("T_FOREACH".to_string())
    );
}

#[test]
fn test_decoded_php_tokens_feed_the_extractor() {
    let table = TokenTable::from_names([
        (379, "T_OPEN_TAG"),
        (392, "T_WHITESPACE"),
        (333, "T_CLASS"),
        (262, "T_STRING"),
        (326, "T_PUBLIC"),
        (266, "T_VARIABLE"),
    ]);
    let json = r#"[
        [379, "<?php ", 1],
        [333, "class", 1], [392, " ", 1], [262, "A", 1], [392, " ", 1], "{",
        [326, "public", 1], [392, " ", 1], [266, "$x", 1], ";",
        "}"
    ]"#;
    let tokens = decode_tokens(json, &table).expect("valid token json");
    let decls = extract(&tokens);
    assert_eq!(decls.len(), 1);
    assert_eq!(decls[0].class, "A");
    assert_eq!(decls[0].name, "$x");
}
