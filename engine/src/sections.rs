use mdt::{Node, Role, Tag};

/// Wrap each heading and everything up to the next heading of equal or
/// shallower depth into a [`Tag::Section`] node.
///
/// Only direct children of `root` are considered; headings nested inside
/// blocks or lists stay where they are. Headings keep their place as the
/// first child of their section.
pub fn build_sections(root: Node) -> Node {
    let Node {
        tag,
        attrs,
        flags,
        text,
        tail,
        children,
    } = root;
    let top = Node {
        tag,
        attrs,
        flags,
        text,
        tail,
        children: Vec::new(),
    };

    // Open sections, innermost last. The bottom entry is the document.
    let mut stack: Vec<(Node, u8)> = vec![(top, 0)];

    for node in children {
        let Some(level) = node.heading_level() else {
            push_into_top(&mut stack, node);
            continue;
        };
        while stack.len() > 1 && stack.last().is_some_and(|(_, open)| *open >= level) {
            close_top(&mut stack);
        }
        let mut section = Node::new(Tag::Section);
        fill_section_attrs(&mut section, &node);
        section.push(node);
        stack.push((section, level));
    }

    while stack.len() > 1 {
        close_top(&mut stack);
    }
    stack.pop().map(|(node, _)| node).unwrap_or_else(Node::root)
}

fn push_into_top(stack: &mut [(Node, u8)], node: Node) {
    if let Some((top, _)) = stack.last_mut() {
        top.push(node);
    }
}

fn close_top(stack: &mut Vec<(Node, u8)>) {
    if let Some((done, _)) = stack.pop() {
        push_into_top(stack, done);
    }
}

/// Copy `level`, `number` and `title` from a heading onto its section.
/// `number` is only set once the heading carries a section number span.
pub fn fill_section_attrs(section: &mut Node, heading: &Node) {
    if let Some(level) = heading.heading_level() {
        section.set_attr("level", level.to_string());
    }
    if let Some(number) = heading_number(heading) {
        section.set_attr("number", number.to_string());
    }
    section.set_attr("title", heading_title(heading));
}

/// The section number injected into a heading, if any.
pub fn heading_number(heading: &Node) -> Option<&str> {
    heading
        .children
        .iter()
        .find(|c| c.role() == Some(Role::SectionNumber))
        .map(|c| c.text.as_str())
}

/// Plain text of a heading without its section number.
pub fn heading_title(heading: &Node) -> String {
    let mut title = heading.text.clone();
    for child in &heading.children {
        if child.role() != Some(Role::SectionNumber) {
            title.push_str(&child.text_content());
        }
        title.push_str(&child.tail);
    }
    title.trim().to_string()
}
