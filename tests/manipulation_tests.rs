//! Tree-mutation tests: insertion clone policy, wrapping, replacement.

use quercus::{Document, NodeId, Selection, inner_html, outer_html, parse_document};

fn ids(doc: &Document, nodes: &[NodeId]) -> Vec<String> {
    nodes
        .iter()
        .filter_map(|&n| doc.attr(n, "id").map(str::to_string))
        .collect()
}

#[test]
fn append_clone_policy() {
    // every target except the last receives a clone; the last receives the
    // original, detached from wherever it resided
    let mut doc = parse_document(
        "<html><body><div id='t0'></div><div id='t1'></div></body></html>",
    );
    let x = doc.create_element("span");
    doc.set_attr(x, "id", "x");

    let targets = doc.select("div");
    targets.append_nodes(&mut doc, &[x]);

    let t0 = doc.select("#t0").nodes()[0];
    let t1 = doc.select("#t1").nodes()[0];

    let t0_kids: Vec<NodeId> = doc.children(t0).collect();
    let t1_kids: Vec<NodeId> = doc.children(t1).collect();
    assert_eq!(t0_kids.len(), 1);
    assert_eq!(t1_kids.len(), 1);

    // t1 holds the original identity, t0 a fresh clone
    assert_eq!(t1_kids[0], x);
    assert_ne!(t0_kids[0], x);
    assert_eq!(doc.tag(t0_kids[0]), Some("span"));
    assert_eq!(doc.parent(x), Some(t1));
}

#[test]
fn append_moves_attached_original() {
    let mut doc = parse_document(
        "<html><body><ul><li id='item'>x</li></ul><div id='a'></div><div id='b'></div></body></html>",
    );
    let item = doc.select("#item").nodes()[0];
    let sel = doc.select("div");
    sel.append_matcher(&mut doc, quercus::Selector::compile("#item").unwrap());
    let b = doc.select("#b").nodes()[0];
    assert_eq!(doc.parent(item), Some(b));
    // the ul no longer holds the original
    let ul = doc.select("ul").nodes()[0];
    assert_eq!(doc.children(ul).count(), 0);
    // the first div got a clone with the same content
    let a = doc.select("#a").nodes()[0];
    let a_kid = doc.first_child(a).unwrap();
    assert_ne!(a_kid, item);
    assert_eq!(doc.text_content(a_kid), "x");
}

#[test]
fn before_after_preserve_fragment_order() {
    let mut doc = parse_document("<html><body><p id='p'>mid</p></body></html>");
    let sel = doc.select("#p");
    sel.before_html(&mut doc, "<i id='b1'></i><i id='b2'></i>");
    let sel = doc.select("#p");
    sel.after_html(&mut doc, "<i id='a1'></i><i id='a2'></i>");

    let body = doc.body().unwrap();
    let order: Vec<NodeId> = doc.children(body).collect();
    assert_eq!(ids(&doc, &order), vec!["b1", "b2", "p", "a1", "a2"]);
}

#[test]
fn prepend_order() {
    let mut doc = parse_document("<html><body><div id='d'><u id='old'></u></div></body></html>");
    let sel = doc.select("#d");
    sel.prepend_html(&mut doc, "<i id='p1'></i><i id='p2'></i>");

    let d = doc.select("#d").nodes()[0];
    let order: Vec<NodeId> = doc.children(d).collect();
    assert_eq!(ids(&doc, &order), vec!["p1", "p2", "old"]);
}

#[test]
fn replace_with() {
    let mut doc = parse_document(
        "<html><body><p id='gone'>old</p><span id='stay'></span></body></html>",
    );
    let sel = doc.select("#gone");
    sel.replace_with_html(&mut doc, "<em id='new'></em>");

    let body = doc.body().unwrap();
    let order: Vec<NodeId> = doc.children(body).collect();
    assert_eq!(ids(&doc, &order), vec!["new", "stay"]);
}

#[test]
fn set_html_and_set_text() {
    let mut doc = parse_document("<html><body><div id='d'><p>old</p></div></body></html>");
    let sel = doc.select("#d");
    sel.set_html(&mut doc, "<b>new</b>");
    let d = doc.select("#d").nodes()[0];
    assert_eq!(inner_html(&doc, d), "<b>new</b>");

    let sel = doc.select("#d");
    sel.set_text(&mut doc, "a <b> & 'c'");
    let d = doc.select("#d").nodes()[0];
    assert_eq!(doc.text_content(d), "a <b> & 'c'");
    assert_eq!(inner_html(&doc, d), "a &lt;b&gt; &amp; 'c'");
}

#[test]
fn empty_detaches_children() {
    let mut doc = parse_document("<html><body><div id='d'>text<span></span></div></body></html>");
    let sel = doc.select("#d");
    let removed = sel.empty(&mut doc);
    assert_eq!(removed.len(), 2);

    let d = doc.select("#d").nodes()[0];
    assert_eq!(doc.children(d).count(), 0);
    // detached children keep their own subtrees
    for n in &removed {
        assert_eq!(doc.parent(n), None);
    }
}

#[test]
fn remove_is_noop_for_detached() {
    let mut doc = Document::new();
    let lone = doc.create_element("p");
    Selection::from_node(lone).remove(&mut doc);
    assert_eq!(doc.parent(lone), None);
}

#[test]
fn remove_filtered() {
    let mut doc = parse_document(
        "<html><body><p id='a' class='x'></p><p id='b'></p><p id='c' class='x'></p></body></html>",
    );
    let sel = doc.select("p");
    sel.remove_filtered(&mut doc, ".x");

    let body = doc.body().unwrap();
    let left: Vec<NodeId> = doc.children(body).collect();
    assert_eq!(ids(&doc, &left), vec!["b"]);
}

#[test]
fn clone_nodes_fresh_and_detached() {
    let mut doc = parse_document("<html><body><div id='d'><span>s</span></div></body></html>");
    let orig = doc.select("#d").nodes()[0];
    let copies = doc.select("#d").clone_nodes(&mut doc);
    assert_eq!(copies.len(), 1);
    let copy = copies.nodes()[0];
    assert_ne!(copy, orig);
    assert_eq!(doc.parent(copy), None);
    assert_eq!(outer_html(&doc, copy), "<div id=\"d\"><span>s</span></div>");
    // the original is untouched
    assert_eq!(doc.parent(orig), doc.body());
}

#[test]
fn wrap_all_single_wrapper_at_first_position() {
    let mut doc = parse_document(
        "<html><body>\
         <span id='lead'></span>\
         <p id='n1'></p><q id='skip'></q><p id='n2'></p><p id='n3'></p>\
         </body></html>",
    );
    let sel = doc.select("p");
    sel.wrap_all_html(&mut doc, "<div class='wrapper'></div>");

    // exactly one wrapper, inserted where the first p was
    let wrappers = doc.select(".wrapper");
    assert_eq!(wrappers.len(), 1);
    let wrapper = wrappers.nodes()[0];

    let body = doc.body().unwrap();
    let body_kids: Vec<NodeId> = doc.children(body).filter(|&n| doc.is_element(n)).collect();
    assert_eq!(doc.tag(body_kids[0]), Some("span"));
    assert_eq!(body_kids[1], wrapper);
    assert_eq!(doc.tag(body_kids[2]), Some("q"));

    // all three originals inside, in original order
    let inside: Vec<NodeId> = doc.children(wrapper).collect();
    assert_eq!(ids(&doc, &inside), vec!["n1", "n2", "n3"]);
}

#[test]
fn wrap_all_moves_into_deepest_first_element_child() {
    let mut doc = parse_document(
        "<html><body><p id='a'></p><p id='b'></p></body></html>",
    );
    let sel = doc.select("p");
    sel.wrap_all_html(&mut doc, "<div id='outer'><section id='inner'></section></div>");

    let inner = doc.select("#inner").nodes()[0];
    let inside: Vec<NodeId> = doc.children(inner).collect();
    assert_eq!(ids(&doc, &inside), vec!["a", "b"]);
}

#[test]
fn wrap_each_node_separately() {
    let mut doc = parse_document("<html><body><p id='a'></p><p id='b'></p></body></html>");
    let sel = doc.select("p");
    sel.wrap_html(&mut doc, "<div class='w'></div>");

    assert_eq!(doc.select(".w").len(), 2);
    assert!(doc.select(".w > p").len() == 2);
}

#[test]
fn wrap_inner() {
    let mut doc = parse_document(
        "<html><body><div id='full'>text<span></span></div><div id='bare'></div></body></html>",
    );
    let sel = doc.select("div");
    sel.wrap_inner_html(&mut doc, "<section class='in'></section>");

    // existing children moved inside the new wrapper
    let full = doc.select("#full").nodes()[0];
    let kids: Vec<NodeId> = doc.children(full).collect();
    assert_eq!(kids.len(), 1);
    assert_eq!(doc.attr(kids[0], "class"), Some("in"));
    assert_eq!(doc.children(kids[0]).count(), 2);

    // a childless node gets a clone of the wrapper appended
    let bare = doc.select("#bare").nodes()[0];
    let kids: Vec<NodeId> = doc.children(bare).collect();
    assert_eq!(kids.len(), 1);
    assert_eq!(doc.attr(kids[0], "class"), Some("in"));
}

#[test]
fn unwrap_replaces_parent_with_children() {
    let mut doc = parse_document(
        "<html><body><div id='shell'>before<b id='x'></b>after</div></body></html>",
    );
    let sel = doc.select("#x");
    sel.unwrap(&mut doc);

    assert!(doc.select("#shell").is_empty());
    let body = doc.body().unwrap();
    let kids: Vec<NodeId> = doc.children(body).collect();
    // all of the shell's children moved up, order preserved
    assert_eq!(kids.len(), 3);
    assert_eq!(doc.tag(kids[1]), Some("b"));
}

#[test]
fn unwrap_protects_body() {
    let mut doc = parse_document("<html><body><p id='p'></p></body></html>");
    let sel = doc.select("#p");
    sel.unwrap(&mut doc);
    assert!(doc.body().is_some());
    assert_eq!(doc.select("#p").len(), 1);
}

#[test]
fn fragment_context_sensitivity_in_insertion() {
    let mut doc = parse_document(
        "<html><body><table><tbody id='tb'></tbody></table><div id='d'></div></body></html>",
    );
    let sel = doc.select("#tb");
    sel.append_html(&mut doc, "<tr><td>cell</td></tr>");
    assert_eq!(doc.select("#tb > tr").len(), 1);

    // the same markup parsed against a div context drops the table row
    let sel = doc.select("#d");
    sel.append_html(&mut doc, "<tr><td>cell</td></tr>");
    assert!(doc.select("#d tr").is_empty());
    assert_eq!(doc.text_content(doc.select("#d").nodes()[0]), "cell");
}

#[test]
fn insertion_into_multiple_targets_clones_fragment() {
    let mut doc = parse_document(
        "<html><body><div id='a'></div><div id='b'></div><div id='c'></div></body></html>",
    );
    let sel = doc.select("div");
    sel.append_html(&mut doc, "<p class='frag'></p>");

    // one fresh copy per target, no shared identities
    let frags = doc.select(".frag");
    assert_eq!(frags.len(), 3);
    let parents: Vec<String> = frags
        .nodes()
        .iter()
        .filter_map(|&n| doc.parent(n))
        .filter_map(|p| doc.attr(p, "id").map(str::to_string))
        .collect();
    assert_eq!(parents, vec!["a", "b", "c"]);
}

#[test]
fn document_clone_is_isolated() {
    let doc = parse_document("<html><body><p id='p'>x</p></body></html>");
    let mut copy = doc.clone();
    let sel = copy.select("#p");
    sel.set_text(&mut copy, "changed");

    let p = doc.select("#p").nodes()[0];
    assert_eq!(doc.text_content(p), "x");
    let p2 = copy.select("#p").nodes()[0];
    assert_eq!(copy.text_content(p2), "changed");
}
