//! XML namespace handling
//!
//! Well-known namespace constants and namespace declaration attributes.

/// RelaxNG structure namespace
pub const RELAXNG_NAMESPACE: &str = "http://relaxng.org/ns/structure/1.0";

/// XML namespace (bound to the `xml` prefix)
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// XMLNS namespace
pub const XMLNS_NAMESPACE: &str = "http://www.w3.org/2000/xmlns/";

/// Get the attribute name that declares `prefix` (`xmlns` for the default namespace)
pub fn declaration_attribute(prefix: Option<&str>) -> String {
    match prefix {
        Some(prefix) => format!("xmlns:{}", prefix),
        None => "xmlns".to_string(),
    }
}

/// Check whether an attribute name is a namespace declaration
pub fn is_declaration(attribute: &str) -> bool {
    attribute == "xmlns" || attribute.starts_with("xmlns:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_attribute() {
        assert_eq!(declaration_attribute(Some("a")), "xmlns:a");
        assert_eq!(declaration_attribute(None), "xmlns");
        assert!(is_declaration("xmlns:a"));
        assert!(is_declaration("xmlns"));
        assert!(!is_declaration("xmlnsfoo"));
    }
}
