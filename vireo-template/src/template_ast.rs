#[derive(Debug, Clone, PartialEq)]
pub struct TemplateAttr {
    pub name: String,
    /// `None` for a bare boolean attribute such as `disabled`.
    pub value: Option<String>,
}

impl TemplateAttr {
    pub fn value_or_empty(&self) -> &str {
        self.value.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element {
        tag: String,
        attrs: Vec<TemplateAttr>,
        children: Vec<Node>,
    },
    Text(String),
    Comment(String),
}
