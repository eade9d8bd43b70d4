//! Selector engine tests over parsed documents.

use quercus::{Document, Matcher, NodeId, Selector, parse_document, selector, single};

fn ids(doc: &Document, nodes: &[NodeId]) -> Vec<String> {
    nodes
        .iter()
        .filter_map(|&n| doc.attr(n, "id").map(str::to_string))
        .collect()
}

fn select_ids(doc: &Document, sel: &str) -> Vec<String> {
    ids(doc, doc.select(sel).nodes())
}

#[test]
fn combinators() {
    let doc = parse_document("<html><body><div><p><span></span></p></div></body></html>");

    assert_eq!(doc.select("div > p").len(), 1);
    assert!(doc.select("div > p").is(&doc, "p"));

    assert_eq!(doc.select("div span").len(), 1);
    assert!(doc.select("div span").is(&doc, "span"));

    assert!(doc.select("div > span").is_empty());
    assert!(doc.select("body div").len() == 1);
}

#[test]
fn adjacent_sibling_skips_text_and_comments() {
    let doc = parse_document(
        "<html><body><h1 id='t'></h1> \n <!-- note --> <p id='p1'></p><p id='p2'></p></body></html>",
    );
    assert_eq!(select_ids(&doc, "h1 + p"), vec!["p1"]);
    assert_eq!(select_ids(&doc, "h1 ~ p"), vec!["p1", "p2"]);
    assert_eq!(select_ids(&doc, "p + p"), vec!["p2"]);
}

#[test]
fn class_id_attribute_selectors() {
    let doc = parse_document(
        r#"<html><body>
        <div id="main" class="box wide"></div>
        <div id="aside" class="box"></div>
        <a id="l1" href="https://example.com/page"></a>
        <a id="l2" href="http://example.com/"></a>
        <p id="p1" lang="en-US"></p>
        <p id="p2" data-kind="alpha beta"></p>
        </body></html>"#,
    );

    assert_eq!(select_ids(&doc, "#main"), vec!["main"]);
    assert_eq!(select_ids(&doc, ".box"), vec!["main", "aside"]);
    assert_eq!(select_ids(&doc, ".box.wide"), vec!["main"]);
    assert_eq!(select_ids(&doc, "div.box#aside"), vec!["aside"]);

    assert_eq!(select_ids(&doc, "a[href]"), vec!["l1", "l2"]);
    assert_eq!(select_ids(&doc, "[href^='https:']"), vec!["l1"]);
    assert_eq!(select_ids(&doc, "[href$='page']"), vec!["l1"]);
    assert_eq!(select_ids(&doc, "[href*='example']"), vec!["l1", "l2"]);
    assert_eq!(select_ids(&doc, "a[href!='http://example.com/']"), vec!["l1"]);
    assert_eq!(select_ids(&doc, "[lang|='en']"), vec!["p1"]);
    assert_eq!(select_ids(&doc, "[data-kind~='beta']"), vec!["p2"]);
    assert_eq!(select_ids(&doc, "[data-kind#=(^alpha)]"), vec!["p2"]);
    assert_eq!(select_ids(&doc, "[data-kind='ALPHA BETA' i]"), vec!["p2"]);
    // elements without the attribute match !=
    assert!(select_ids(&doc, "p[href!='x']").contains(&"p1".to_string()));
}

#[test]
fn universal_and_group() {
    let doc = parse_document("<html><body><p id='a'></p><span id='b'></span></body></html>");
    // group: OR semantics, document order per walk
    assert_eq!(select_ids(&doc, "p, span"), vec!["a", "b"]);
    // universal matches every element, never text nodes
    let all = doc.select("body *");
    assert_eq!(ids(&doc, all.nodes()), vec!["a", "b"]);
}

#[test]
fn structural_pseudo_classes() {
    let doc = parse_document(
        "<html><body><ul>\
         <li id='1'></li><li id='2'></li><li id='3'></li><li id='4'></li><li id='5'></li>\
         </ul></body></html>",
    );

    assert_eq!(select_ids(&doc, "li:nth-child(2n+1)"), vec!["1", "3", "5"]);
    assert_eq!(select_ids(&doc, "li:nth-child(odd)"), vec!["1", "3", "5"]);
    assert_eq!(select_ids(&doc, "li:nth-child(even)"), vec!["2", "4"]);
    assert_eq!(select_ids(&doc, "li:nth-last-child(1)"), vec!["5"]);
    assert_eq!(select_ids(&doc, "li:nth-child(-n+2)"), vec!["1", "2"]);
    assert_eq!(select_ids(&doc, "li:first-child"), vec!["1"]);
    assert_eq!(select_ids(&doc, "li:last-child"), vec!["5"]);
}

#[test]
fn of_type_pseudo_classes() {
    let doc = parse_document(
        "<html><body><div>\
         <p id='p1'></p><span id='s1'></span><p id='p2'></p><span id='s2'></span>\
         </div></body></html>",
    );
    assert_eq!(select_ids(&doc, "div :first-of-type"), vec!["p1", "s1"]);
    assert_eq!(select_ids(&doc, "div :last-of-type"), vec!["p2", "s2"]);
    assert_eq!(select_ids(&doc, "div p:nth-of-type(2)"), vec!["p2"]);
    assert_eq!(select_ids(&doc, "div :nth-last-of-type(1)"), vec!["p2", "s2"]);
}

#[test]
fn only_child_and_empty() {
    let doc = parse_document(
        "<html><body>\
         <div id='solo-parent'> <p id='solo'></p> </div>\
         <div id='pair-parent'><p></p><p></p></div>\
         <div id='blank'>   </div>\
         </body></html>",
    );
    assert_eq!(select_ids(&doc, "p:only-child"), vec!["solo"]);
    assert_eq!(select_ids(&doc, "div:empty"), vec!["blank"]);
}

#[test]
fn root_link_lang() {
    let doc = parse_document(
        r#"<html lang="en-US"><body><a id='x' href="/"></a><a id='y'></a><p id='p'></p></body></html>"#,
    );
    let root = doc.select(":root");
    assert_eq!(root.len(), 1);
    assert!(root.is(&doc, "html"));

    assert_eq!(select_ids(&doc, "a:link"), vec!["x"]);
    // :lang ascends to the root; unmatched codes are false
    assert_eq!(select_ids(&doc, "p:lang(en)"), vec!["p"]);
    assert!(doc.select("p:lang(fr)").is_empty());
}

#[test]
fn form_state_pseudo_classes() {
    let doc = parse_document(
        r#"<html><body><form>
        <input id='on' type="checkbox" checked>
        <input id='off' type="checkbox">
        <input id='dead' disabled>
        <select id='sel'><option id='opt' selected></option></select>
        <fieldset id='fs' disabled><input id='trapped'></fieldset>
        </form></body></html>"#,
    );

    assert_eq!(select_ids(&doc, ":checked"), vec!["on", "opt"]);
    assert_eq!(select_ids(&doc, "input:disabled"), vec!["dead", "trapped"]);
    let enabled = select_ids(&doc, "input:enabled");
    assert!(enabled.contains(&"on".to_string()));
    assert!(!enabled.contains(&"trapped".to_string()));
    assert_eq!(select_ids(&doc, "form :input").len(), 5);
}

#[test]
fn text_pseudo_classes() {
    let doc = parse_document(
        "<html><body>\
         <div id='outer'>Hello <span id='inner'>World</span></div>\
         <p id='plain'>nothing here</p>\
         </body></html>",
    );

    // case-insensitive, full subtree text
    let containing = select_ids(&doc, "div:contains(WORLD)");
    assert_eq!(containing, vec!["outer"]);
    // own text only
    assert!(doc.select("div:containsOwn(world)").is_empty());
    assert_eq!(select_ids(&doc, "div:containsOwn(hello)"), vec!["outer"]);

    assert_eq!(select_ids(&doc, "p:matches(noth.ng)"), vec!["plain"]);
    assert!(doc.select("p:matchesOwn(^here)").is_empty());
}

#[test]
fn relational_pseudo_classes() {
    let doc = parse_document(
        "<html><body>\
         <div id='grand'><section id='mid'><span></span></section></div>\
         <div id='childless'><p></p></div>\
         </body></html>",
    );

    // :has matches at any depth, :haschild only direct children
    let has = select_ids(&doc, "div:has(span)");
    assert_eq!(has, vec!["grand"]);
    assert!(doc.select("div:haschild(span)").is_empty());
    assert_eq!(select_ids(&doc, "section:haschild(span)"), vec!["mid"]);

    assert_eq!(select_ids(&doc, "div:not(#grand)"), vec!["childless"]);
}

#[test]
fn never_matching_pseudo_classes() {
    let doc = parse_document("<html><body><a id='x' href='/'></a></body></html>");
    assert!(doc.select("a:hover").is_empty());
    assert!(doc.select("a:visited").is_empty());
}

#[test]
fn matcher_surface() {
    let doc = parse_document(
        "<html><body><div id='a'><div id='b'></div></div><div id='c'></div></body></html>",
    );
    let m = Selector::compile("div").unwrap();
    let body = doc.body().unwrap();

    // inclusive walk from a matching root includes the root
    let a = doc.select("#a").nodes()[0];
    assert_eq!(ids(&doc, &m.match_all(&doc, a)), vec!["a", "b"]);

    // query_all excludes the root
    assert_eq!(ids(&doc, &selector::query_all(&doc, a, &m)), vec!["b"]);
    assert_eq!(
        ids(&doc, &selector::query_all(&doc, body, &m)),
        vec!["a", "b", "c"]
    );

    // first-match short-circuit agrees with the head of the full walk
    assert_eq!(m.match_first(&doc, body), m.match_all(&doc, body).first().copied());
    assert_eq!(selector::query_first(&doc, a, &m), Some(doc.select("#b").nodes()[0]));

    // filter preserves input order
    let all = doc.select("div").nodes().to_vec();
    let reversed: Vec<NodeId> = all.iter().rev().copied().collect();
    assert_eq!(m.filter(&doc, &reversed), reversed);

    // single narrows match_all to one element
    let s = single("div");
    assert_eq!(ids(&doc, &s.match_all(&doc, body)), vec!["a"]);
}

#[test]
fn strict_vs_lenient_compilation() {
    assert!(Selector::compile("div >").is_err());
    let lenient = Selector::compile_lenient("div >");
    let doc = parse_document("<html><body><div></div></body></html>");
    assert!(lenient.match_all(&doc, doc.root).is_empty());
}

#[test]
fn compound_with_pseudo_class_and_combinator() {
    let doc = parse_document(
        "<html><body><ul>\
         <li id='a' class='x'></li><li id='b'></li><li id='c' class='x'></li>\
         </ul></body></html>",
    );
    assert_eq!(select_ids(&doc, "ul > li.x:nth-child(3)"), vec!["c"]);
    assert_eq!(select_ids(&doc, "li.x + li"), vec!["b"]);
}

#[test]
fn group_specificity_is_max_of_members() {
    let group = selector::parse_group("div, #x, .y").unwrap();
    assert_eq!(group.max_specificity(), quercus::Specificity::new(1, 0, 0));
}
