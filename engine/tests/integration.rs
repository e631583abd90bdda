use engine::{convert, Format, HeadingPosition, Options};
use mdt::IssueKind;

fn html(source: &str) -> engine::Output {
    convert(source, &Options::default())
}

fn content(source: &str) -> String {
    html(source).content
}

#[test]
fn theorem_and_proof() {
    let out = html("Theorem: If $a=b$ then $b=a$. {}\n\nProof: Trivial. {}\n");
    assert!(out.issues.is_empty());
    assert!(out.content.contains(
        "<div class=\"block Theorem anchor\" type=\"Theorem\" id=\"0.1\">"
    ));
    assert!(out.content.contains("<span class=\"block_number\">0.1</span>"));
    assert!(out.content.contains("<p>If \\(a=b\\) then \\(b=a\\).</p>"));
    assert!(out.content.contains("<div class=\"block Proof do_not_number\" type=\"Proof\">"));
    assert!(out.content.contains("<span class=\"qed\">\u{25A1}</span>"));
}

#[test]
fn nested_proof_glyphs() {
    let html = content("Proof: Outer.\n\nProof: Inner. {}\n\nDone. {}");
    let inner = html.find("<span class=\"qed nested\">\u{25A0}</span>").unwrap();
    let outer = html.find("<span class=\"qed\">\u{25A1}</span>").unwrap();
    assert!(inner < outer);
}

#[test]
fn unresolved_reference() {
    let out = html("See {ref: #lemma1}.");
    assert!(out.content.contains(
        "<span class=\"reference\" key=\"lemma1\"><span class=\"reference_number\">??</span></span>"
    ));
    assert!(out
        .issues
        .iter()
        .any(|i| matches!(&i.kind, IssueKind::UnresolvedReference { key } if key == "lemma1")));
}

#[test]
fn macro_call_in_output() {
    let out = html("=== Abbreviations ===\n\\bold(x) = {**x**};\n=== Abbreviations ===\n\nSay \\bold(hi).");
    assert_eq!(out.content.trim(), "<p>Say <strong>hi</strong>.</p>");
}

#[test]
fn resolved_reference_links_to_block() {
    let html = content("# Intro\n\n{#main} Theorem (Main): X. {}\n\nBy {ref: #main}.");
    assert!(html.contains("id=\"1.1\""));
    assert!(html.contains("<a class=\"reference_number\" href=\"#1.1\">1.1</a>"));
}

#[test]
fn labeled_block_carries_label_attribute() {
    let html = content("{#main} Theorem: X. {}");
    assert!(html.contains("id=\"0.1\" label=\"main\">"));
    assert!(html.contains("<span class=\"label\" key=\"main\"></span>"));
}

#[test]
fn block_name_and_references_attributes() {
    let html = content("Lemma (Fodor) [Fodor, Neumer]: Text. {}");
    assert!(html.contains("name=\"Fodor\" references=\"Fodor, Neumer\""));
    assert!(html.contains("<span class=\"block_name\">Fodor</span>"));
    assert!(html.contains("<span class=\"block_references\">Fodor, Neumer</span>"));
}

#[test]
fn sections_wrap_headings() {
    let html = content("# One\n\nText.\n\n## Sub\n\nMore.\n\n# Two\n");
    assert!(html.starts_with("<section level=\"1\" number=\"1\" title=\"One\">\n<h1>"));
    assert!(html.contains("<section level=\"2\" number=\"1.1\" title=\"Sub\">"));
    assert!(html.contains("<span class=\"section_number anchor\" id=\"sec2\">2</span>Two"));
    assert_eq!(html.matches("</section>").count(), 3);
}

#[test]
fn sections_can_be_disabled() {
    let options = Options {
        sections: false,
        ..Options::default()
    };
    let out = convert("# One\n\nText.", &options);
    assert!(!out.content.contains("<section"));
    assert!(out.content.starts_with("<h1>"));
}

#[test]
fn toc_variable() {
    let out = html("# A\n\n## A1\n\n# B\n");
    assert!(out.toc.starts_with("<nav class=\"toc\">"));
    assert!(out.toc.contains("<a href=\"#sec1.1\"><span class=\"section_number\">1.1</span><span class=\"toc_title\">A1</span></a>"));
    let a = out.toc.find("toc_title\">A<").unwrap();
    let b = out.toc.find("toc_title\">B<").unwrap();
    assert!(a < b);
}

#[test]
fn headings_css_per_type() {
    let out = html("Theorem: a {}\n\nProof: b {}\n\nTheorem: c {}");
    assert_eq!(
        out.headings,
        ".block_label[type=\"Theorem\"]:after {\n  content:'Theorem ';\n}\n\
         .block_label[type=\"Proof\"]:after {\n  content:'Proof ';\n  font-style:italic;\n}\n"
    );

    let options = Options {
        heading_position: HeadingPosition::Before,
        ..Options::default()
    };
    let out = convert("Example: e {}", &options);
    assert_eq!(out.headings, ".block_label[type=\"Example\"]:before {\n  content:'Example';\n}\n");
}

#[test]
fn type_label_precedes_number_name_and_subject() {
    let out = html("Lemma (Fodor) [Neumer]: x {}\n\nProof (of the claim): y {}");
    assert!(out.content.contains(
        "<span class=\"block_heading\" type=\"Lemma\">\
         <span class=\"block_label\" type=\"Lemma\"></span>\
         <span class=\"block_number\">0.1</span>\
         <span class=\"block_name\">Fodor</span>\
         <span class=\"block_references\">Neumer</span></span>"
    ));
    assert!(out.content.contains(
        "<span class=\"block_heading\" type=\"Proof\">\
         <span class=\"block_label\" type=\"Proof\"></span>\
         <span class=\"proof_subject\">of the claim</span></span>"
    ));
    assert!(out.headings.contains(".block_label[type=\"Proof\"]:after {\n  content:'Proof ';"));
}

#[test]
fn bibliography() {
    let out = html("Known {bib: knuth}, unknown {bib: nobody}.\n\n{bibitem: knuth} Knuth, TAOCP.");
    assert!(out.content.contains("<a class=\"citation\" href=\"#bib-knuth\">[1]</a>"));
    assert!(out.content.contains("<span class=\"citation unknown\">[nobody]</span>"));
    assert!(out.content.contains("<span class=\"bibitem anchor\" id=\"bib-knuth\">[1]</span> Knuth, TAOCP."));
    assert_eq!(out.issues.len(), 1);
    assert!(matches!(&out.issues[0].kind, IssueKind::UnknownCitation { key } if key == "nobody"));
}

#[test]
fn text_is_escaped() {
    assert_eq!(content("a < b & c").trim(), "<p>a &lt; b &amp; c</p>");
}

#[test]
fn markdown_constructs() {
    let html = content("| a | b |\n|---|---|\n| 1 | 2 |\n\n---\n\n```rust\nlet x = 1 < 2;\n```\n\n1. one\n2. two");
    assert!(html.contains("<thead>\n<tr><th>a</th><th>b</th></tr>\n</thead>"));
    assert!(html.contains("<tr><td>1</td><td>2</td></tr>"));
    assert!(html.contains("<hr />"));
    assert!(html.contains("<pre><code class=\"language-rust\">let x = 1 &lt; 2;\n</code></pre>"));
    assert!(html.contains("<ol>\n<li>one</li>\n<li>two</li>\n</ol>"));
}

#[test]
fn front_matter_and_template_variables() {
    let out = html("---\ntitle = \"Notes\"\nkeywords = [\"sets\", \"logic\"]\ncontent = \"shadowed\"\n---\nBody.");
    let vars = out.variables();
    assert_eq!(vars["title"], "Notes");
    assert_eq!(vars["keywords"], "sets logic");
    assert_eq!(vars["content"].trim(), "<p>Body.</p>");
    assert!(vars.contains_key("toc"));
    assert!(vars.contains_key("headings_css"));
    assert!(!vars.contains_key("headings"));
}

#[test]
fn unterminated_block_still_renders() {
    let out = html("Definition: open\n\nrest");
    assert!(out.content.contains("<p>rest</p>\n</div>"));
    assert!(matches!(out.issues[0].kind, IssueKind::UnterminatedBlock { .. }));
}

#[test]
fn latex_variables_use_headings_key() {
    let options = Options {
        format: Format::Latex,
        ..Options::default()
    };
    let vars = convert("Theorem: x {}", &options).variables();
    assert!(vars["headings"].contains("\\newtheorem{theorem}{Theorem}[section]"));
    assert!(!vars.contains_key("headings_css"));
}
