use crate::{Document, NodeId, NodeKind};

const VOID: &[&str] = &["input", "br", "img", "hr", "meta", "link"];

pub fn is_void(tag: &str) -> bool {
    VOID.contains(&tag)
}

pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

pub fn outer_html(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, id, &mut out);
    out
}

pub fn inner_html(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    for c in doc.children(id) {
        write_node(doc, *c, &mut out);
    }
    out
}

fn write_node(doc: &Document, id: NodeId, out: &mut String) {
    match doc.kind(id) {
        None => {}
        Some(NodeKind::Root) => {
            for c in doc.children(id) {
                write_node(doc, *c, out);
            }
        }
        Some(NodeKind::Text(t)) => out.push_str(&escape_text(t)),
        Some(NodeKind::Comment(t)) => {
            out.push_str("<!--");
            out.push_str(t);
            out.push_str("-->");
        }
        Some(NodeKind::Element { tag, attrs }) => {
            out.push('<');
            out.push_str(tag);
            for (k, v) in attrs {
                out.push(' ');
                out.push_str(k);
                out.push_str("=\"");
                out.push_str(&escape_attr(v));
                out.push('"');
            }
            out.push('>');
            if is_void(tag) {
                return;
            }
            for c in doc.children(id) {
                write_node(doc, *c, out);
            }
            out.push_str("</");
            out.push_str(tag);
            out.push('>');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{comment, h, text};

    #[test]
    fn escapes_and_void_elements() {
        let mut doc = Document::new();
        doc.mount(
            doc.root(),
            &[
                h("p", vec![("title", "a \"b\"")], vec![text("1 < 2 & 3")]),
                h("br", (), vec![]),
                comment("if"),
            ],
        )
        .unwrap();
        assert_eq!(
            inner_html(&doc, doc.root()),
            "<p title=\"a &quot;b&quot;\">1 &lt; 2 &amp; 3</p><br><!--if-->"
        );
    }
}
