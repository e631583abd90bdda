use mdt::block::BlockKind;
use mdt::block::reference::ProofSubject;
use mdt::parser::blocks::{parse_start, split_blocks, BlockMachine, Step, QED_HOLLOW, QED_SOLID};
use mdt::{IssueKind, Node, Role, Tag};

fn parse(source: &str) -> mdt::Parsed {
    mdt::parse(source)
}

fn blocks(root: &Node) -> Vec<&Node> {
    let mut out = Vec::new();
    root.find_all(&|n| n.block().is_some(), &mut out);
    out
}

fn qed(block: &Node) -> &Node {
    block
        .children
        .iter()
        .find(|c| c.role() == Some(Role::Qed))
        .expect("proof has no qed marker")
}

#[test]
fn vocabulary_types_open_blocks() {
    for kind in BlockKind::ALL {
        let text = format!("{}: body", kind);
        let start = parse_start(&text).unwrap_or_else(|| panic!("{} rejected", kind));
        assert_eq!(start.kind, kind);
        assert_eq!(start.rest, "body");
    }
}

#[test]
fn non_capitalized_types_are_rejected() {
    for text in [
        "theorem: x",
        "THEOREM: x",
        "TheoRem: x",
        "Theorem2: x",
        "Lemmas: x",
        "Claim: x",
        ": x",
    ] {
        assert!(parse_start(text).is_none(), "{:?} was accepted", text);
    }
}

#[test]
fn full_start_grammar() {
    let start = parse_start("  {#fermat} Theorem* (Fermat) [Wiles, Taylor]: No solutions.").unwrap();
    assert_eq!(start.label, Some("fermat"));
    assert_eq!(start.kind, BlockKind::Theorem);
    assert!(start.starred);
    assert_eq!(start.name, Some("Fermat"));
    assert_eq!(start.references, Some("Wiles, Taylor"));
    assert_eq!(start.rest, "No solutions.");
}

#[test]
fn colon_is_mandatory() {
    assert!(parse_start("Theorem (Fermat) holds").is_none());
    assert!(parse_start("Theorem of Pythagoras: x").is_none());
}

#[test]
fn proof_sub_grammar() {
    let start = parse_start("Proof (of #main): Easy.").unwrap();
    assert_eq!(start.subject, Some(ProofSubject::Reference("main".into())));

    let start = parse_start("Proof (of the main theorem): Easy.").unwrap();
    assert_eq!(start.subject, Some(ProofSubject::Text("the main theorem".into())));

    assert!(parse_start("Proof (sketch): x").is_none());
    assert!(parse_start("Proof [Euler]: x").is_none());
    assert!(parse_start("Proof (of): x").is_none());
}

#[test]
fn split_keeps_fenced_code_together() {
    let source = "a\nb\n\n```\nx\n\ny\n```\n\n\nc\n";
    let raw = split_blocks(source, 0);
    let texts: Vec<&str> = raw.iter().map(|b| b.text).collect();
    assert_eq!(texts, vec!["a\nb", "```\nx\n\ny\n```", "c"]);
    assert_eq!(&source[raw[2].span()], "c");
}

#[test]
fn machine_reports_steps() {
    let source = "Theorem: a\n\nmore\n\nend {}\n\nafter";
    let mut machine = BlockMachine::new(split_blocks(source, 0), 0);
    assert_eq!(machine.step(), Step::Continue);
    assert_eq!(machine.depth(), 1);
    assert_eq!(machine.step(), Step::Continue);
    assert_eq!(machine.step(), Step::Terminated);
    assert_eq!(machine.depth(), 0);
    assert_eq!(machine.step(), Step::Continue);
    assert_eq!(machine.step(), Step::EndOfInput);
}

#[test]
fn theorem_then_proof() {
    let parsed = parse("Theorem: If $a=b$ then $b=a$. {}\n\nProof: Trivial. {}\n");
    assert!(parsed.issues.is_empty());
    let found = blocks(&parsed.root);
    assert_eq!(found.len(), 2);

    let theorem = found[0].block().unwrap();
    assert_eq!(theorem.kind, BlockKind::Theorem);
    assert!(theorem.numbered);
    let math = found[0].find(&|n| matches!(n.tag, Tag::Math { display: false }));
    assert_eq!(math.map(|m| m.text.as_str()), Some("a=b"));

    let proof = found[1].block().unwrap();
    assert_eq!(proof.kind, BlockKind::Proof);
    assert!(!proof.numbered);
    let marker = qed(found[1]);
    assert_eq!(marker.text, QED_HOLLOW);
    assert!(!marker.flags.nested);
}

#[test]
fn nested_proofs_pick_glyphs() {
    let source = "Proof: Outer start.\n\nProof: Inner. {}\n\nOuter end. {}\n";
    let parsed = parse(source);
    let top = blocks(&parsed.root);
    assert_eq!(top.len(), 2);

    let outer = top[0];
    let inner = top[1];
    assert_eq!(outer.block().unwrap().proof_depth, 0);
    assert_eq!(inner.block().unwrap().proof_depth, 1);
    assert!(outer.children.iter().any(|c| std::ptr::eq(c, inner)));

    assert_eq!(qed(outer).text, QED_HOLLOW);
    assert_eq!(qed(inner).text, QED_SOLID);
    assert!(qed(inner).flags.nested);
}

#[test]
fn any_block_may_nest() {
    let source = "Theorem: Outer.\n\nExample: Inner. {}\n\nDone. {}";
    let parsed = parse(source);
    assert_eq!(parsed.root.children.len(), 1);
    let outer = &parsed.root.children[0];
    assert!(outer.children.iter().any(|c| c.block().is_some_and(|b| b.kind == BlockKind::Example)));
    assert!(parsed.issues.is_empty());
}

#[test]
fn multi_paragraph_block_body() {
    let source = "Definition (Group): A set with\n\n- an operation\n- an identity\n\nsuch that inverses exist. {}\n\nOutside.";
    let parsed = parse(source);
    let block = &parsed.root.children[0];
    assert!(block.find(&|n| matches!(n.tag, Tag::List { ordered: false, .. })).is_some());
    assert!(block.text_content().contains("inverses exist."));
    assert!(!block.text_content().contains("Outside"));
    assert_eq!(parsed.root.children[1].tag, Tag::Paragraph);
}

#[test]
fn unterminated_block_is_closed_with_warning() {
    let parsed = parse("Intro.\n\nLemma: never closed\n\nstill inside");
    assert_eq!(parsed.issues.len(), 1);
    let issue = &parsed.issues[0];
    assert!(matches!(&issue.kind, IssueKind::UnterminatedBlock { kind } if kind == "Lemma"));
    let span = issue.span.clone().unwrap();
    assert!(parsed.source[span].starts_with("Lemma:"));

    let block = blocks(&parsed.root)[0];
    assert!(block.text_content().contains("still inside"));
}

#[test]
fn heading_children_in_order() {
    let parsed = parse("{#fl} Lemma (Fodor) [Fodor]: Text. {}");
    let block = &parsed.root.children[0];
    let heading = &block.children[0];
    assert_eq!(heading.role(), Some(Role::BlockHeading));
    let kinds: Vec<&Tag> = heading.children.iter().map(|c| &c.tag).collect();
    assert_eq!(
        kinds,
        vec![
            &Tag::Label,
            &Tag::Span(Role::BlockLabel),
            &Tag::Span(Role::BlockNumber),
            &Tag::Span(Role::BlockName),
            &Tag::Span(Role::BlockReferences),
        ]
    );
    assert_eq!(heading.children[0].attr("key"), Some("fl"));
    assert_eq!(block.block().unwrap().label.as_deref(), Some("fl"));
}

#[test]
fn proof_heading_has_no_number_placeholder() {
    let parsed = parse("Proof (of the claim): Done. {}");
    let heading = &parsed.root.children[0].children[0];
    let kinds: Vec<&Tag> = heading.children.iter().map(|c| &c.tag).collect();
    assert_eq!(kinds, vec![&Tag::Span(Role::BlockLabel), &Tag::Span(Role::ProofSubject)]);
    assert_eq!(heading.children[0].attr("type"), Some("Proof"));
    assert_eq!(heading.children[1].text, "of the claim");
}

#[test]
fn proof_subject_reference_becomes_reference_node() {
    let parsed = parse("Proof (of #fl): Apply it. {}");
    let subject = parsed.root.children[0]
        .find(&|n| n.role() == Some(Role::ProofSubject))
        .unwrap();
    assert_eq!(subject.text, "of ");
    assert_eq!(subject.children[0].tag, Tag::Reference);
    assert_eq!(subject.children[0].attr("key"), Some("fl"));
}

#[test]
fn inline_patterns_in_text() {
    let parsed = parse("See {ref: #a}, cite {bib: knuth} and label {#here}.\n\n{bibitem: knuth} The Book.");
    let mut refs = Vec::new();
    parsed.root.find_all(&|n| matches!(n.tag, Tag::Reference | Tag::Citation | Tag::Label | Tag::BibEntry), &mut refs);
    let tags: Vec<(&Tag, Option<&str>)> = refs.iter().map(|n| (&n.tag, n.attr("key"))).collect();
    assert_eq!(
        tags,
        vec![
            (&Tag::Reference, Some("a")),
            (&Tag::Citation, Some("knuth")),
            (&Tag::Label, Some("here")),
            (&Tag::BibEntry, Some("knuth")),
        ]
    );
    let para = &parsed.root.children[0];
    assert_eq!(para.text, "See ");
    assert_eq!(para.children[0].tail, ", cite ");
}

#[test]
fn front_matter_becomes_metadata() {
    let parsed = parse("---\ntitle = \"Notes\"\nauthors = [\"A\", \"B\"]\nyear = 2024\n---\n# Intro\n");
    assert_eq!(parsed.meta.get("title").map(String::as_str), Some("Notes"));
    assert_eq!(parsed.meta.get("authors").map(String::as_str), Some("A B"));
    assert_eq!(parsed.meta.get("year").map(String::as_str), Some("2024"));
    assert_eq!(parsed.root.children[0].heading_level(), Some(1));
}

#[test]
fn malformed_front_matter_is_kept_as_text() {
    let parsed = parse("---\ntitle = = x\n---\nBody\n");
    assert!(parsed.meta.is_empty());
    assert!(matches!(parsed.issues[0].kind, IssueKind::MalformedFrontMatter { .. }));
}

#[test]
fn leading_thematic_breaks_are_not_front_matter() {
    let parsed = parse("---\n\nSome text\n\n---\n");
    assert!(parsed.issues.is_empty());
    assert!(parsed.meta.is_empty());
    let rules = parsed.root.children.iter().filter(|n| n.tag == Tag::Rule).count();
    assert_eq!(rules, 2);
}

#[test]
fn macros_run_before_block_grammar() {
    let source = "=== Abbreviations ===\n\\thm = {Theorem};\n=== Abbreviations ===\n\\thm: Expanded. {}";
    let parsed = parse(source);
    assert_eq!(blocks(&parsed.root).len(), 1);
    assert!(!parsed.source.contains("Abbreviations"));
}
