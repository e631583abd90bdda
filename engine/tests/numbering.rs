use engine::{build_sections, NumberingOptions, Resolution, Resolver, TocNode};
use mdt::{IssueKind, Node, Role, Tag};

fn resolve_with(source: &str, options: NumberingOptions) -> (Node, Resolution) {
    let mut root = build_sections(mdt::parse(source).root);
    let resolution = Resolver::new(options, 0).run(&mut root);
    (root, resolution)
}

fn resolve(source: &str) -> (Node, Resolution) {
    resolve_with(source, NumberingOptions::default())
}

fn section_numbers(root: &Node) -> Vec<String> {
    let mut spans = Vec::new();
    root.find_all(&|n| n.role() == Some(Role::SectionNumber), &mut spans);
    spans.iter().map(|n| n.text.clone()).collect()
}

fn block_numbers(root: &Node) -> Vec<Option<String>> {
    let mut blocks = Vec::new();
    root.find_all(&|n| n.block().is_some(), &mut blocks);
    blocks.iter().map(|n| n.attr("id").map(str::to_string)).collect()
}

fn some(numbers: &[&str]) -> Vec<Option<String>> {
    numbers.iter().map(|n| Some(n.to_string())).collect()
}

const OUTLINE: &str = "# A\n\n## A1\n\n## A2\n\n# B\n\n## B1\n";

#[test]
fn outline_numbers() {
    let expected = vec!["1", "1.1", "1.2", "2", "2.1"];
    let (root, _) = resolve(OUTLINE);
    assert_eq!(section_numbers(&root), expected);

    let options = NumberingOptions {
        depth_limit: 2,
        ..NumberingOptions::default()
    };
    let (root, _) = resolve_with(OUTLINE, options);
    assert_eq!(section_numbers(&root), expected);
}

#[test]
fn section_attributes_after_numbering() {
    let (root, _) = resolve("intro\n\n# A\n\ntext\n\n## A1\n\nmore\n\n# B\n");
    assert_eq!(root.children[0].tag, Tag::Paragraph);
    let a = &root.children[1];
    assert_eq!(a.tag, Tag::Section);
    assert_eq!(a.attr("level"), Some("1"));
    assert_eq!(a.attr("number"), Some("1"));
    assert_eq!(a.attr("title"), Some("A"));
    assert_eq!(a.children[0].heading_level(), Some(1));

    let a1 = a.children.iter().find(|c| c.tag == Tag::Section).unwrap();
    assert_eq!(a1.attr("number"), Some("1.1"));
    assert_eq!(a1.attr("title"), Some("A1"));
    assert_eq!(root.children[2].attr("number"), Some("2"));
}

#[test]
fn sectionizer_nests_by_level() {
    let root = build_sections(mdt::parse("# A\n\n### deep\n\n## mid\n\n# B\n\ntail").root);
    assert_eq!(root.children.len(), 2);
    let a = &root.children[0];
    let inner: Vec<_> = a.children.iter().filter(|c| c.tag == Tag::Section).collect();
    assert_eq!(inner.len(), 2);
    assert_eq!(inner[0].attr("level"), Some("3"));
    assert_eq!(inner[1].attr("level"), Some("2"));
    assert_eq!(inner[1].attr("title"), Some("mid"));
    assert!(inner[1].attr("number").is_none());
    assert_eq!(root.children[1].children.len(), 2);
}

#[test]
fn blocks_before_any_heading() {
    let (root, _) = resolve("Theorem: a {}\n\nLemma: b {}");
    assert_eq!(block_numbers(&root), some(&["0.1", "0.2"]));
}

#[test]
fn counters_reset_on_top_level_sections() {
    let (root, _) = resolve("# A\n\nTheorem: a {}\n\n## A1\n\nLemma: b {}\n\n# B\n\nTheorem: c {}");
    assert_eq!(block_numbers(&root), some(&["1.1", "1.2", "2.1"]));
}

#[test]
fn per_type_counters() {
    let source = "# S\n\nTheorem: a {}\n\nLemma: b {}\n\nTheorem: c {}";
    let (root, _) = resolve(source);
    assert_eq!(block_numbers(&root), some(&["1.1", "1.2", "1.3"]));

    let options = NumberingOptions {
        number_by_type: true,
        ..NumberingOptions::default()
    };
    let (root, _) = resolve_with(source, options);
    assert_eq!(block_numbers(&root), some(&["1.1", "1.1", "1.2"]));
}

#[test]
fn depth_limit_zero_gives_bare_counters() {
    let options = NumberingOptions {
        depth_limit: 0,
        ..NumberingOptions::default()
    };
    let (root, _) = resolve_with("# A\n\nLemma: a {}\n\n# B\n\nLemma: b {}", options);
    assert_eq!(block_numbers(&root), some(&["1", "2"]));
}

#[test]
fn depth_limit_two() {
    let options = NumberingOptions {
        depth_limit: 2,
        ..NumberingOptions::default()
    };
    let (root, _) = resolve_with("# A\n\n## A1\n\nLemma: a {}\n\n## A2\n\nLemma: b {}", options);
    assert_eq!(block_numbers(&root), some(&["1.1.1", "1.2.1"]));
}

#[test]
fn starred_and_proof_blocks_are_unnumbered() {
    let (root, _) = resolve("Theorem*: a {}\n\nProof: b {}\n\nTheorem: c {}");
    assert_eq!(block_numbers(&root), vec![None, None, Some("0.1".to_string())]);
}

#[test]
fn referenced_only_mode() {
    let options = NumberingOptions {
        number_referenced_only: true,
        ..NumberingOptions::default()
    };
    let (root, _) = resolve_with("Theorem: A. {}\n\n{#b} Theorem: B. {}\n\nLemma: with {#c} inside {}", options);
    assert_eq!(
        block_numbers(&root),
        vec![None, Some("0.1".to_string()), Some("0.2".to_string())]
    );
    assert!(!root.children[0].block().unwrap().numbered);
}

#[test]
fn labels_resolve_to_blocks_and_sections() {
    let (root, resolution) = resolve("# Intro\n\n{#intro}\n\n{#thm} Theorem: X. {}\n\nSee {ref: #thm} and {ref: #intro}.");
    assert_eq!(resolution.labels["thm"].number, "1.1");
    assert_eq!(resolution.labels["thm"].anchor, "1.1");
    assert_eq!(resolution.labels["intro"].number, "1");
    assert_eq!(resolution.labels["intro"].anchor, "sec1");

    let mut numbers = Vec::new();
    root.find_all(&|n| n.role() == Some(Role::ReferenceNumber), &mut numbers);
    let shown: Vec<(&str, Option<&str>)> = numbers.iter().map(|n| (n.text.as_str(), n.attr("href"))).collect();
    assert_eq!(shown, vec![("1.1", Some("#1.1")), ("1", Some("#sec1"))]);
    assert!(resolution.issues.is_empty());
}

#[test]
fn forward_references_resolve() {
    let (_, resolution) = resolve("See {ref: #later}.\n\n{#later} Lemma: L. {}");
    assert!(resolution.issues.is_empty());
}

#[test]
fn label_in_unnumbered_block() {
    let (_, resolution) = resolve("# S\n\nTheorem*: inside {#x}. {}\n\nTheorem: outer\n\nRemark*: inner {#y} {}\n\n{}");
    assert_eq!(resolution.labels["x"].anchor, "sec1");
    assert_eq!(resolution.labels["y"].number, "1.1");
}

#[test]
fn block_number_placeholder_is_filled() {
    let (root, _) = resolve("# S\n\nLemma: a {}\n\nLemma*: b {}");
    let mut spans = Vec::new();
    root.find_all(&|n| n.role() == Some(Role::BlockNumber), &mut spans);
    let texts: Vec<&str> = spans.iter().map(|n| n.text.as_str()).collect();
    assert_eq!(texts, vec!["1.1", ""]);
}

#[test]
fn unresolved_reference_is_reported() {
    let (root, resolution) = resolve("Missing {ref: #nope}.");
    let number = root.find(&|n| n.role() == Some(Role::ReferenceNumber)).unwrap();
    assert_eq!(number.text, "??");
    assert!(number.attr("href").is_none());
    assert!(matches!(
        &resolution.issues[0].kind,
        IssueKind::UnresolvedReference { key } if key == "nope"
    ));
}

#[test]
fn resolver_is_idempotent() {
    let source = "# A\n\n{#a} Theorem: one {}\n\n## A1\n\nLemma: two, see {ref: #a} and {ref: #z} {}\n\n# B\n\nProof (of #a): done. {}";
    for options in [
        NumberingOptions::default(),
        NumberingOptions {
            depth_limit: 2,
            number_by_type: true,
            number_referenced_only: true,
        },
    ] {
        let (mut root, first) = resolve_with(source, options.clone());
        let snapshot = root.clone();
        let second = Resolver::new(options, 0).run(&mut root);
        assert_eq!(root, snapshot);
        assert_eq!(first.labels, second.labels);
        assert_eq!(first.toc, second.toc);
    }
}

#[test]
fn toc_keeps_document_order() {
    let mut toc = TocNode::root();
    toc.insert_section("2", "Two");
    toc.insert_section("10", "Ten");
    toc.insert_section("2.1", "Two one");
    let ids: Vec<&str> = toc.children.iter().map(|(id, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["2", "10"]);
    assert_eq!(toc.children[0].1.children[0].1.title.as_deref(), Some("Two one"));
}

#[test]
fn toc_creates_intermediate_nodes() {
    let mut toc = TocNode::root();
    toc.insert_section("1.2.3", "Deep");
    let one = &toc.children[0].1;
    assert!(one.title.is_none());
    let node = toc.to_node();
    assert_eq!(node.tag, Tag::Toc);
    let link = node.find(&|n| n.tag == Tag::Link).unwrap();
    assert_eq!(link.attr("href"), Some("#sec1.2.3"));
}

#[test]
fn toc_from_resolution() {
    let (_, resolution) = resolve(OUTLINE);
    let titles: Vec<(&str, Option<&str>)> = resolution
        .toc
        .children
        .iter()
        .map(|(id, node)| (id.as_str(), node.title.as_deref()))
        .collect();
    assert_eq!(titles, vec![("1", Some("A")), ("2", Some("B"))]);
    assert!(resolution.toc.root);
}
