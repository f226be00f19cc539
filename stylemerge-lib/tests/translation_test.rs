use stylemerge_lib::dom::dom_tree;
use stylemerge_lib::dom::Element;
use stylemerge_lib::parser::markup::{parse_markup, to_html};
use stylemerge_lib::translate::apply_to_document;
use stylemerge_lib::RuleStore;

#[cfg(test)]
pub mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn collect_classes(document: &dom_tree::Document) -> Vec<String> {
        let mut output = Vec::new();
        document.for_each_element_mut(|elem| {
            if let Some(class) = elem.attribute("class") {
                output.push(format!("{}.{}", elem.tag_name(), class));
            }
        });
        output
    }

    fn base_styles(store: &RuleStore, elem: &dom_tree::ElementNode) -> String {
        store.get_styles(elem).style_attribute()
    }

    const SITE: &str = r#"<!DOCTYPE html><html><head><style>.btn { color: red } #nav { margin: 0 }</style></head><body><nav id="nav"><a class="btn primary">Home</a></nav><p class="note">Text</p></body></html>"#;

    #[test]
    fn test_merge_keeps_incoming_page_styled() {
        init();
        let incoming_page = parse_markup(SITE);
        let incoming = RuleStore::parse(&incoming_page.style_text());

        let mut base = RuleStore::parse(".btn { color: blue } .note { font-size: 9px }");
        let renames = base.merge(&incoming);
        assert_eq!(
            renames.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect::<Vec<_>>(),
            vec![(".btn", ".btn_a")]
        );

        assert_eq!(apply_to_document(&renames, &incoming_page), 1);
        assert_eq!(
            collect_classes(&incoming_page),
            vec!["a.btn_a primary".to_string(), "p.note".to_string()]
        );

        // every element of the incoming page still gets the styles it had
        incoming_page.for_each_element_mut(|elem| {
            if elem.attribute("class") == Some("btn_a primary") {
                assert_eq!(base.get_styles(&*elem).style_attribute(), "color:red");
            }
            if elem.id() == Some("nav") {
                assert_eq!(base.get_styles(&*elem).style_attribute(), "margin:0");
            }
        });
    }

    #[test]
    fn test_obfuscate_and_rewrite_embedded_stylesheet() {
        init();
        let page = parse_markup(SITE);
        let mut store = RuleStore::parse(&page.style_text());
        let ignore: HashSet<String> = [".primary".to_string()].into_iter().collect();
        let renames = store.obfuscate_seeded(&ignore, 2024);

        assert!(page.replace_style_text(&store.to_string()));
        apply_to_document(&renames, &page);

        let html = to_html(&page);
        let btn = &renames[".btn"][1..];
        let nav = &renames["#nav"][1..];
        assert!(html.contains(&format!(r#"<nav id="{}">"#, nav)));
        assert!(html.contains(&format!(r#"<a class="{} primary">"#, btn)));
        assert!(html.contains(&format!(".{} {{\n\tcolor: red;\n}}", btn)));
        assert!(!html.contains(".btn"));
    }

    #[test]
    fn test_condense_rename_round_trip() {
        init();
        let page = parse_markup(
            r#"<html><head></head><body><b class="warn">!</b><i class="alert">!</i></body></html>"#,
        );
        let mut store = RuleStore::parse(".warn { color: red } .alert { color: red }");
        let renames = store.condense(true);
        apply_to_document(&renames, &page);

        assert_eq!(store.to_string(), ".warn {\n\tcolor: red;\n}\n");
        assert_eq!(
            collect_classes(&page),
            vec!["b.warn".to_string(), "i.warn".to_string()]
        );
    }

    #[test]
    fn test_condense_leaves_tags_alone() {
        init();
        let page = parse_markup(
            r#"<html><head></head><body><span class="b">x</span><div>y</div></body></html>"#,
        );
        let mut store =
            RuleStore::parse("div { color: red } .a { color: red } .b { color: red } span { font: x }");
        let renames = store.condense(true);
        assert!(renames.values().all(|to| to.starts_with('.')));
        apply_to_document(&renames, &page);

        assert_eq!(collect_classes(&page), vec!["span.a".to_string()]);
        page.for_each_element_mut(|elem| {
            if elem.tag_name() == "span" {
                assert_eq!(base_styles(&store, &*elem), "color:red;font:x");
            }
        });
    }

    #[test]
    fn test_merge_renames_repeated_selector_once() {
        init();
        let incoming_page = parse_markup(
            r#"<html><head><style>.x { color: red } .x { font: y }</style></head><body><p class="x">z</p></body></html>"#,
        );
        let incoming = RuleStore::parse(&incoming_page.style_text());
        let mut base = RuleStore::parse(".x { color: blue }");
        let renames = base.merge(&incoming);
        apply_to_document(&renames, &incoming_page);

        assert_eq!(collect_classes(&incoming_page), vec!["p.x_a".to_string()]);
        incoming_page.for_each_element_mut(|elem| {
            if elem.tag_name() == "p" {
                assert_eq!(base_styles(&base, &*elem), "color:red;font:y");
            }
        });
    }
}
