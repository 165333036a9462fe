use vireo_dom::serialize::is_void;

use crate::error::MarkupError;
use crate::template_ast::{Node, TemplateAttr};

/// Hand-rolled HTML-ish parser with support for:
/// - nested elements, self-closing tags (`<input/>`) and void elements
/// - quoted, unquoted and boolean attributes
/// - `<!-- comments -->`
///
/// Whitespace-only text nodes are dropped. Interpolations stay inside the
/// text; the compiler splits them out.
pub fn parse_markup(input: &str) -> Result<Vec<Node>, MarkupError> {
    let mut i = 0usize;
    let bytes = input.as_bytes();
    let mut stack: Vec<Node> = Vec::new();
    let mut roots: Vec<Node> = Vec::new();

    fn push_child(stack: &mut [Node], roots: &mut Vec<Node>, node: Node) {
        if let Some(Node::Element { children, .. }) = stack.last_mut() {
            children.push(node);
        } else {
            roots.push(node);
        }
    }

    while i < bytes.len() {
        if input[i..].starts_with("<!--") {
            let start = i;
            let Some(end) = input[i + 4..].find("-->") else {
                return Err(MarkupError::Unterminated {
                    what: "comment",
                    offset: start,
                });
            };
            let body = input[i + 4..i + 4 + end].to_string();
            i += 4 + end + 3;
            push_child(&mut stack, &mut roots, Node::Comment(body));
            continue;
        }

        if bytes[i] == b'<' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
            let offset = i;
            i += 2;
            let tag = read_ident(bytes, &mut i).to_ascii_lowercase();
            skip_ws(bytes, &mut i);
            if i < bytes.len() && bytes[i] == b'>' {
                i += 1;
            }
            let open = match stack.last() {
                Some(Node::Element { tag: t, .. }) => t == &tag,
                _ => false,
            };
            if !open {
                return Err(MarkupError::UnexpectedClose { tag, offset });
            }
            if let Some(n) = stack.pop() {
                push_child(&mut stack, &mut roots, n);
            }
            continue;
        }

        if bytes[i] == b'<' && i + 1 < bytes.len() && bytes[i + 1].is_ascii_alphabetic() {
            let offset = i;
            i += 1;
            let tag = read_ident(bytes, &mut i).to_ascii_lowercase();
            let mut attrs: Vec<TemplateAttr> = Vec::new();
            let mut self_closing = false;
            let mut closed = false;

            while i < bytes.len() {
                skip_ws(bytes, &mut i);
                if i >= bytes.len() {
                    break;
                }
                match bytes[i] {
                    b'/' => {
                        self_closing = true;
                        i += 1;
                    }
                    b'>' => {
                        i += 1;
                        closed = true;
                        break;
                    }
                    _ => match read_attribute(input, &mut i)? {
                        Some(attr) => attrs.push(attr),
                        // skip unknown token
                        None => i += 1,
                    },
                }
            }
            if !closed {
                return Err(MarkupError::Unterminated { what: "tag", offset });
            }

            let node = Node::Element {
                tag: tag.clone(),
                attrs,
                children: Vec::new(),
            };
            if self_closing || is_void(&tag) {
                push_child(&mut stack, &mut roots, node);
            } else {
                stack.push(node);
            }
            continue;
        }

        // text until the next tag-like `<`
        let start = i;
        i += 1;
        while i < bytes.len() && !starts_markup(bytes, i) {
            i += 1;
        }
        let text = &input[start..i];
        if !is_all_ws(text) {
            push_child(&mut stack, &mut roots, Node::Text(text.to_string()));
        }
    }

    if let Some(Node::Element { tag, .. }) = stack.pop() {
        return Err(MarkupError::Unclosed { tag });
    }
    Ok(roots)
}

fn starts_markup(bytes: &[u8], i: usize) -> bool {
    bytes[i] == b'<'
        && i + 1 < bytes.len()
        && (bytes[i + 1] == b'/' || bytes[i + 1] == b'!' || bytes[i + 1].is_ascii_alphabetic())
}

fn is_all_ws(s: &str) -> bool {
    s.chars().all(|c| c.is_whitespace())
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && (bytes[*i] as char).is_whitespace() {
        *i += 1;
    }
}

fn read_ident(bytes: &[u8], i: &mut usize) -> String {
    let start = *i;
    while *i < bytes.len() {
        let c = bytes[*i] as char;
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            *i += 1;
        } else {
            break;
        }
    }
    String::from_utf8_lossy(&bytes[start..*i]).into_owned()
}

fn read_attribute(input: &str, i: &mut usize) -> Result<Option<TemplateAttr>, MarkupError> {
    let bytes = input.as_bytes();
    let name_start = *i;
    while *i < bytes.len() {
        let c = bytes[*i];
        if c.is_ascii_whitespace() || matches!(c, b'=' | b'>' | b'/' | b'"' | b'\'') {
            break;
        }
        *i += 1;
    }
    if *i == name_start {
        return Ok(None);
    }
    let name = input[name_start..*i].to_string();

    skip_ws(bytes, i);
    let mut value = None;
    if *i < bytes.len() && bytes[*i] == b'=' {
        *i += 1;
        skip_ws(bytes, i);
        value = Some(read_value(input, i)?);
    }
    Ok(Some(TemplateAttr { name, value }))
}

fn read_value(input: &str, i: &mut usize) -> Result<String, MarkupError> {
    let bytes = input.as_bytes();
    let start = *i;
    if *i < bytes.len() && (bytes[*i] == b'"' || bytes[*i] == b'\'') {
        let quote = bytes[*i];
        *i += 1;
        let body = *i;
        while *i < bytes.len() && bytes[*i] != quote {
            *i += 1;
        }
        if *i >= bytes.len() {
            return Err(MarkupError::Unterminated {
                what: "attribute value",
                offset: start,
            });
        }
        let s = input[body..*i].to_string();
        *i += 1; // closing quote
        return Ok(s);
    }
    while *i < bytes.len() && !bytes[*i].is_ascii_whitespace() && bytes[*i] != b'>' {
        *i += 1;
    }
    Ok(input[start..*i].to_string())
}
