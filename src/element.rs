//! Structured element output.
//!
//! [`ElementNode`] is the render target of the element output engine: a
//! host-shaped virtual-DOM record (`{type, key, ref, props, _owner}`) that
//! serializes to the JSON a view layer expects. `ref` and `_owner` are
//! always `null`; they exist so the serialized shape matches the consumer.

use serde::Serialize;

/// A rendered node: nothing (serialized as `null`), a text run, a sibling
/// list, or an element record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ElementNode {
    Empty,
    Text(String),
    Many(Vec<ElementNode>),
    Element(Box<Element>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub tag: String,
    pub key: Option<String>,
    #[serde(rename = "ref")]
    pub element_ref: Option<()>,
    pub props: Props,
    #[serde(rename = "_owner")]
    pub owner: Option<()>,
}

/// The closed set of props the default renderers produce.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Props {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<ElementNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Style {
    #[serde(rename = "textAlign", skip_serializing_if = "Option::is_none")]
    pub text_align: Option<String>,
}

/// Build an element record wrapped as an [`ElementNode`].
pub fn element(tag: impl Into<String>, key: Option<String>, props: Props) -> ElementNode {
    ElementNode::Element(Box::new(Element {
        tag: tag.into(),
        key,
        element_ref: None,
        props,
        owner: None,
    }))
}
