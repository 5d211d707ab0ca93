//! `externalRef` and `include` resolution
//!
//! Referenced documents are loaded through the context's loader, parsed under
//! their own URL and brought to the same state as the including document
//! (whitespace, datatype libraries, nested references) before they are
//! imported. Loads happen one at a time in document order.

use super::{datatype, document_element, whitespace, StepContext};
use crate::error::Result;
use crate::locations::resolve_href;
use crate::reader::parse_with_limits;
use crate::tree::{Kind, NodeId, Tree};
use url::Url;

/// Load, parse and prepare the document at `url`
fn prepare_document(ctx: &mut StepContext<'_>, url: &Url) -> Result<Tree> {
    ctx.enter(url)?;
    let resource = ctx.loader.load(url)?;
    let mut tree = parse_with_limits(resource.text(), Some(url), ctx.limits)?;
    whitespace::run(&mut tree)?;
    datatype::run(&mut tree)?;
    resolve_external_refs(&mut tree, ctx)?;
    resolve_includes(&mut tree, ctx)?;
    ctx.leave();
    Ok(tree)
}

/// Replace every `externalRef` with the root pattern of the referenced document
pub fn resolve_external_refs(tree: &mut Tree, ctx: &mut StepContext<'_>) -> Result<()> {
    let root = document_element(tree)?;
    let refs: Vec<NodeId> = tree
        .descendants(root)
        .into_iter()
        .filter(|&id| tree.kind(id) == Kind::ExternalRef)
        .collect();

    for external in refs {
        let url = resolve_href(tree, external)?;
        let loaded = prepare_document(ctx, &url)?;
        let loaded_root = document_element(&loaded)?;

        let imported = tree.import(&loaded, loaded_root);
        if tree.attribute(imported, "ns").is_none() {
            if let Some(ns) = tree.attribute(external, "ns") {
                let ns = ns.to_string();
                tree.set_attribute(imported, "ns", ns);
            }
        }

        if external == root {
            let document = tree.document();
            tree.remove(external);
            tree.append(document, imported);
        } else {
            tree.replace_with(external, imported);
        }
    }
    Ok(())
}

/// Replace every `include` with a `div` holding the included grammar's content
/// followed by the overriding components
pub fn resolve_includes(tree: &mut Tree, ctx: &mut StepContext<'_>) -> Result<()> {
    let root = document_element(tree)?;
    let includes: Vec<NodeId> = tree
        .descendants(root)
        .into_iter()
        .filter(|&id| tree.kind(id) == Kind::Include)
        .collect();

    for include in includes {
        let url = resolve_href(tree, include)?;
        let loaded = prepare_document(ctx, &url)?;
        let loaded_root = document_element(&loaded)?;
        if loaded.kind(loaded_root) != Kind::Grammar {
            return Err(tree.malformed(
                include,
                format!("included document {} is not a grammar", url),
            ));
        }

        let content = tree.import(&loaded, loaded_root);
        override_components(tree, include, content, &url)?;

        if tree.attribute(content, "ns").is_none() {
            if let Some(ns) = tree.attribute(include, "ns") {
                let ns = ns.to_string();
                tree.set_attribute(content, "ns", ns);
            }
        }
        tree.set_kind(content, Kind::Div);
        tree.insert(include, 0, content);
        tree.set_kind(include, Kind::Div);
        tree.remove_attribute(include, "href");
    }
    Ok(())
}

/// Remove the components of `content` overridden inside `include`
fn override_components(tree: &mut Tree, include: NodeId, content: NodeId, url: &Url) -> Result<()> {
    let overrides = components(tree, include);
    let included = components(tree, content);

    if overrides.iter().any(|&c| tree.kind(c) == Kind::Start) {
        let starts: Vec<NodeId> = included
            .iter()
            .copied()
            .filter(|&c| tree.kind(c) == Kind::Start)
            .collect();
        if starts.is_empty() {
            return Err(tree.malformed(
                include,
                format!("include overrides start but {} has none", url),
            ));
        }
        for start in starts {
            tree.remove(start);
        }
    }

    let defines: Vec<NodeId> = overrides
        .iter()
        .copied()
        .filter(|&c| tree.kind(c) == Kind::Define)
        .collect();
    for define in defines {
        let name = tree.required_attribute(define, "name")?.to_string();
        let matching: Vec<NodeId> = included
            .iter()
            .copied()
            .filter(|&c| tree.kind(c) == Kind::Define && tree.attribute(c, "name") == Some(name.as_str()))
            .collect();
        if matching.is_empty() {
            return Err(tree.malformed(
                define,
                format!("include overrides define '{}' but {} has none", name, url),
            ));
        }
        for replaced in matching {
            tree.remove(replaced);
        }
    }
    Ok(())
}

/// `start` and `define` children of `container`, looking through `div`
fn components(tree: &Tree, container: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    for child in tree.element_children(container) {
        match tree.kind(child) {
            Kind::Start | Kind::Define => out.push(child),
            Kind::Div => out.extend(components(tree, child)),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{compact, rng, run_to_with};
    use super::super::Step;
    use crate::error::{Error, LoadError};
    use crate::loaders::MemoryLoader;

    const COMMON: &str = r#"<grammar xmlns="http://relaxng.org/ns/structure/1.0">
        <start><ref name="doc"/></start>
        <define name="doc"><element name="doc"><empty/></element></define>
        <div><define name="extra"><text/></define></div>
    </grammar>"#;

    #[test]
    fn test_external_ref_is_replaced() {
        let loader = MemoryLoader::new()
            .with_resource("memory:/schemas/part.rng", rng(r#"<element name="part"><text/></element>"#));
        let xml = rng(r#"<element name="doc"><externalRef href="part.rng" ns="urn:x"/></element>"#);
        let tree = run_to_with(&xml, Step::ExternalRefs, &loader).unwrap();
        let out = compact(&tree);
        assert!(out.contains(r#"<element name="part""#), "{}", out);
        assert!(out.contains(r#"ns="urn:x""#), "{}", out);
        assert!(!out.contains("externalRef"));
    }

    #[test]
    fn test_value_declarations_stay_with_their_document() {
        let loader = MemoryLoader::new().with_resource(
            "memory:/schemas/part.rng",
            r#"<element name="part" xmlns="http://relaxng.org/ns/structure/1.0" xmlns:q="urn:part"><value type="QName">q:v</value></element>"#,
        );
        let xml = rng(r#"<element name="doc" xmlns:p="urn:main"><externalRef href="part.rng"/><value type="QName">p:v</value></element>"#);
        let tree = run_to_with(&xml, Step::QNames, &loader).unwrap();
        let out = compact(&tree);
        assert!(
            out.contains(r#"<value type="QName" xmlns:q="urn:part" datatypeLibrary="" ns="">q:v</value>"#),
            "{}",
            out
        );
        assert!(
            out.contains(r#"<value type="QName" xmlns:p="urn:main" datatypeLibrary="" ns="">p:v</value>"#),
            "{}",
            out
        );
    }

    #[test]
    fn test_include_overrides_define_and_start() {
        let loader = MemoryLoader::new().with_resource("memory:/schemas/common.rng", COMMON);
        let xml = rng(
            r#"<grammar><include href="common.rng"><start><ref name="extra"/></start><define name="doc"><element name="other"><empty/></element></define></include></grammar>"#,
        );
        let tree = run_to_with(&xml, Step::Includes, &loader).unwrap();
        let out = compact(&tree);
        assert!(!out.contains("include"), "{}", out);
        assert!(!out.contains(r#"<ref name="doc"/>"#), "{}", out);
        assert!(!out.contains(r#"element name="doc""#), "{}", out);
        assert!(out.contains(r#"<define name="extra">"#), "{}", out);
        assert!(out.contains(r#"element name="other""#), "{}", out);
    }

    #[test]
    fn test_include_missing_override_target() {
        let loader = MemoryLoader::new().with_resource("memory:/schemas/common.rng", COMMON);
        let xml = rng(r#"<grammar><include href="common.rng"><define name="nope"><empty/></define></include></grammar>"#);
        let err = run_to_with(&xml, Step::Includes, &loader).unwrap_err();
        assert!(matches!(err, Error::MalformedGrammar(_)));
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_include_of_non_grammar() {
        let loader = MemoryLoader::new().with_resource("memory:/schemas/common.rng", rng("<empty/>"));
        let xml = rng(r#"<grammar><include href="common.rng"/></grammar>"#);
        assert!(run_to_with(&xml, Step::Includes, &loader).is_err());
    }

    #[test]
    fn test_self_reference_is_detected() {
        let loader = MemoryLoader::new().with_resource(
            "memory:/schemas/loop.rng",
            rng(r#"<element name="a"><externalRef href="loop.rng"/></element>"#),
        );
        let xml = rng(r#"<externalRef href="loop.rng"/>"#);
        let err = run_to_with(&xml, Step::ExternalRefs, &loader).unwrap_err();
        assert!(err.to_string().contains("references itself"));
    }

    #[test]
    fn test_missing_resource() {
        let xml = rng(r#"<element name="a"><externalRef href="gone.rng"/></element>"#);
        let err = run_to_with(&xml, Step::ExternalRefs, &MemoryLoader::new()).unwrap_err();
        assert!(matches!(err, Error::Load(LoadError::NotFound(_))));
    }
}
