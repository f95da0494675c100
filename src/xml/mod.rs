//! FES 2.0 XML encoding: parser, serializer, GML geometries and the
//! schema gate.

pub mod element;
pub mod gml;
pub mod parser;
pub mod schema;
pub mod serializer;

pub use element::XmlElement;
pub use parser::FesXmlParser;
pub use schema::SchemaValidator;
pub use serializer::FesXmlSerializer;

pub const FES_NAMESPACE: &str = "http://www.opengis.net/fes/2.0";
pub const GML_NAMESPACE: &str = "http://www.opengis.net/gml/3.2";
pub const GML2_NAMESPACE: &str = "http://www.opengis.net/gml";

pub(crate) fn is_gml(namespace: Option<&str>) -> bool {
    matches!(namespace, Some(GML_NAMESPACE | GML2_NAMESPACE))
}

/// `{namespace}local` for messages.
pub(crate) fn clark_name(node: roxmltree::Node<'_, '_>) -> String {
    let tag = node.tag_name();
    match tag.namespace() {
        Some(ns) => format!("{{{ns}}}{}", tag.name()),
        None => tag.name().to_string(),
    }
}

/// Element children, skipping text, comments and processing instructions.
pub(crate) fn child_elements<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
) -> impl Iterator<Item = roxmltree::Node<'a, 'input>> {
    node.children().filter(|child| child.is_element())
}
