// Copyright 2023 Hugo Osvaldo Barrera
//
// SPDX-License-Identifier: EUPL-1.2

//! Utilities for handling XML data.
use std::borrow::Cow;

use roxmltree::{ExpandedName, Node};

use crate::names::{SOAP11, SOAP12, XSI_NIL};

/// Replaces characters that need to be escaped in texts.
///
/// `<` --> `&lt;`
/// `>` --> `&gt;`
/// `&` --> `&amp;`
///
/// This IS NOT usable in attribute values.
#[must_use]
pub fn escape_text(raw: &str) -> Cow<str> {
    let bytes = raw.as_bytes();
    let Some(first) = bytes.iter().position(|b| matches!(b, b'<' | b'>' | b'&')) else {
        return Cow::Borrowed(raw);
    };

    let mut escaped = String::with_capacity(raw.len() + 8);
    escaped.push_str(&raw[..first]);
    for c in raw[first..].chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            c => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Render an XML node with text, using a namespace prefix.
pub(crate) fn render_prefixed<S: AsRef<str>>(prefix: &str, name: &str, text: S) -> String {
    format!(
        "<{prefix}:{name}>{}</{prefix}:{name}>",
        escape_text(text.as_ref())
    )
}

/// Find the first direct child element with the given name.
pub(crate) fn child<'a, 'input>(
    node: Node<'a, 'input>,
    name: &ExpandedName<'_, '_>,
) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name() == *name)
}

/// Iterate over direct child elements with the given name.
pub(crate) fn children<'a, 'input>(
    node: Node<'a, 'input>,
    name: ExpandedName<'static, 'static>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name() == name)
}

/// Returns the trimmed text of a direct child element.
///
/// Returns `None` if the child is missing, marked as `xsi:nil` or empty.
pub(crate) fn child_text<'a>(node: Node<'a, '_>, name: &ExpandedName<'_, '_>) -> Option<&'a str> {
    child(node, name).and_then(text_of)
}

/// Returns the trimmed text of an element, unless it is nil or empty.
pub(crate) fn text_of<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    if node.attribute(XSI_NIL) == Some("true") {
        return None;
    }
    node.text().map(str::trim).filter(|t| !t.is_empty())
}

/// Finds a direct child of a SOAP envelope element, with either SOAP 1.1 or 1.2 namespaces.
pub(crate) fn soap_child<'a, 'input>(
    node: Node<'a, 'input>,
    local_name: &str,
) -> Option<Node<'a, 'input>> {
    node.children().find(|n| {
        n.is_element()
            && n.tag_name().name() == local_name
            && matches!(n.tag_name().namespace(), Some(SOAP11 | SOAP12))
    })
}

/// Find the first direct child element with the given local name, in any namespace.
///
/// Legacy (POX) responses mix several schema namespaces, so these are matched loosely.
pub(crate) fn local_child<'a, 'input>(
    node: Node<'a, 'input>,
    local_name: &str,
) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name().eq_ignore_ascii_case(local_name))
}

/// Returns the trimmed text of a direct child, matched by local name in any namespace.
pub(crate) fn local_child_text<'a>(node: Node<'a, '_>, local_name: &str) -> Option<&'a str> {
    local_child(node, local_name).and_then(text_of)
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use crate::names::AUTODISCOVER;
    use crate::xmlutils::{child_text, escape_text, render_prefixed};

    #[test]
    fn test_escape_text() {
        match escape_text("HELLO THERE") {
            Cow::Borrowed(s) => assert_eq!(s, "HELLO THERE"),
            Cow::Owned(_) => panic!("expected Borrowed, got Owned"),
        }
        match escape_text("HELLO <") {
            Cow::Borrowed(_) => panic!("expected Owned, got Borrowed"),
            Cow::Owned(s) => assert_eq!(s, "HELLO &lt;"),
        }
        match escape_text("HELLO &lt;") {
            Cow::Borrowed(_) => panic!("expected Owned, got Borrowed"),
            Cow::Owned(s) => assert_eq!(s, "HELLO &amp;lt;"),
        }
        match escape_text("你吃过了吗？<") {
            Cow::Borrowed(_) => panic!("expected Owned, got Borrowed"),
            Cow::Owned(s) => assert_eq!(s, "你吃过了吗？&lt;"),
        }
    }

    #[test]
    fn test_render_prefixed() {
        assert_eq!(
            render_prefixed("a", "Mailbox", "a&b@example.com"),
            "<a:Mailbox>a&amp;b@example.com</a:Mailbox>"
        );
    }

    #[test]
    fn test_child_text_nil() {
        let raw = format!(
            r#"<Response xmlns="{AUTODISCOVER}" xmlns:i="http://www.w3.org/2001/XMLSchema-instance">
                <ErrorCode> NoError </ErrorCode>
                <RedirectTarget i:nil="true"/>
                <ErrorMessage></ErrorMessage>
            </Response>"#
        );
        let doc = roxmltree::Document::parse(&raw).unwrap();
        let root = doc.root_element();

        assert_eq!(child_text(root, &crate::names::ERROR_CODE), Some("NoError"));
        assert_eq!(child_text(root, &crate::names::REDIRECT_TARGET), None);
        assert_eq!(child_text(root, &crate::names::ERROR_MESSAGE), None);
    }
}
