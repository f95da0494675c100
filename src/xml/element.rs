//! Owned XML element tree produced by the serializer, and its writer.

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use super::{FES_NAMESPACE, GML_NAMESPACE, GML2_NAMESPACE};
use crate::error::{FesError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    pub namespace: &'static str,
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    pub fn new(namespace: &'static str, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
            attributes: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    pub fn fes(name: impl Into<String>) -> Self {
        Self::new(FES_NAMESPACE, name)
    }

    pub fn gml(name: impl Into<String>) -> Self {
        Self::new(GML_NAMESPACE, name)
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Namespaces used anywhere in the tree, in first-use order.
    fn namespaces(&self, found: &mut Vec<&'static str>) {
        if !found.contains(&self.namespace) {
            found.push(self.namespace);
        }
        for child in &self.children {
            child.namespaces(found);
        }
    }

    /// Render as UTF-8 text, declaring every used namespace on the root.
    pub fn to_xml(&self, pretty: bool) -> Result<String> {
        let mut used = Vec::new();
        self.namespaces(&mut used);
        let prefixes: Vec<(&'static str, String)> = used
            .iter()
            .enumerate()
            .map(|(i, ns)| (*ns, prefix_for(ns, i)))
            .collect();

        let mut writer = if pretty {
            Writer::new_with_indent(Vec::new(), b' ', 2)
        } else {
            Writer::new(Vec::new())
        };
        self.write(&mut writer, &prefixes, true)?;
        String::from_utf8(writer.into_inner()).map_err(|e| FesError::Serialization(e.to_string()))
    }

    fn write(
        &self,
        writer: &mut Writer<Vec<u8>>,
        prefixes: &[(&'static str, String)],
        root: bool,
    ) -> Result<()> {
        let prefix = prefixes
            .iter()
            .find(|(ns, _)| *ns == self.namespace)
            .map(|(_, prefix)| prefix.as_str())
            .ok_or_else(|| FesError::Serialization(format!("no prefix for {}", self.namespace)))?;
        let qualified = format!("{prefix}:{}", self.name);

        let mut start = BytesStart::new(qualified.as_str());
        if root {
            for (ns, prefix) in prefixes {
                start.push_attribute((format!("xmlns:{prefix}").as_str(), *ns));
            }
        }
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.text.is_none() && self.children.is_empty() {
            return emit(writer, Event::Empty(start));
        }
        emit(writer, Event::Start(start))?;
        if let Some(text) = &self.text {
            emit(writer, Event::Text(BytesText::new(text)))?;
        }
        for child in &self.children {
            child.write(writer, prefixes, false)?;
        }
        emit(writer, Event::End(BytesEnd::new(qualified.as_str())))
    }
}

fn emit(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| FesError::Serialization(e.to_string()))
}

fn prefix_for(namespace: &str, index: usize) -> String {
    match namespace {
        FES_NAMESPACE => "fes".to_string(),
        GML_NAMESPACE => "gml".to_string(),
        GML2_NAMESPACE => "gml2".to_string(),
        _ => format!("ns{index}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declares_used_namespaces_on_the_root() {
        let element = XmlElement::fes("Filter").with_child(
            XmlElement::fes("PropertyIsNull")
                .with_child(XmlElement::fes("ValueReference").with_text("name")),
        );
        assert_eq!(
            element.to_xml(false).unwrap(),
            "<fes:Filter xmlns:fes=\"http://www.opengis.net/fes/2.0\">\
             <fes:PropertyIsNull><fes:ValueReference>name</fes:ValueReference>\
             </fes:PropertyIsNull></fes:Filter>"
        );
    }

    #[test]
    fn escapes_text_and_attributes() {
        let element = XmlElement::fes("Literal")
            .with_attribute("type", "a\"b")
            .with_text("1 < 2 & 3");
        let xml = element.to_xml(false).unwrap();
        assert!(xml.contains("1 &lt; 2 &amp; 3"));
        assert!(xml.contains("type=\"a&quot;b\""));
    }

    #[test]
    fn empty_elements_self_close() {
        let xml = XmlElement::fes("ResourceId")
            .with_attribute("rid", "a.1")
            .to_xml(false)
            .unwrap();
        assert!(xml.ends_with("rid=\"a.1\"/>"));
    }

    #[test]
    fn gml_children_get_their_own_prefix() {
        let xml = XmlElement::fes("After")
            .with_child(XmlElement::gml("TimeInstant"))
            .to_xml(true)
            .unwrap();
        assert!(xml.contains("xmlns:gml=\"http://www.opengis.net/gml/3.2\""));
        assert!(xml.contains("<gml:TimeInstant/>"));
        assert!(xml.contains('\n'));
    }
}
