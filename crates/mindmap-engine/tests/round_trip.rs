use mindmap_engine::{Extra, ExtraKind, MindMap, SourcePosition, TopicId, WriteOptions};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn fixture(name: &str) -> String {
    std::fs::read_to_string(format!(
        "{}/tests/fixtures/{name}.mmd",
        env!("CARGO_MANIFEST_DIR")
    ))
    .unwrap()
}

fn outline(map: &MindMap) -> Vec<(usize, String)> {
    map.iter()
        .map(|id| {
            (
                map.level(id).unwrap(),
                map.topic(id).unwrap().text().to_string(),
            )
        })
        .collect()
}

fn child(map: &MindMap, parent: TopicId, index: usize) -> TopicId {
    map.topic(parent).unwrap().children()[index]
}

#[rstest]
#[case("nb_mindmap")]
#[case("canonical")]
fn fixture_survives_write_and_parse(#[case] name: &str) {
    let map = MindMap::parse(&fixture(name)).unwrap();
    let written = map.write();
    let reparsed = MindMap::parse(&written).unwrap();

    assert!(reparsed.content_eq(&map), "content changed:\n{written}");
    assert_eq!(reparsed.write(), written);
}

#[test]
fn canonical_fixture_is_a_fixed_point() {
    let text = fixture("canonical");
    assert_eq!(MindMap::parse(&text).unwrap().write(), text);
}

#[test]
fn nb_mindmap_fixture_canonical_form() {
    let map = MindMap::parse(&fixture("nb_mindmap")).unwrap();
    insta::assert_snapshot!(map.write(), @r##"
    > __version__="1.1", showJumps="true"
    ---
    # Project\#1
    > fillColor="#FFCC00", topicLinkUID="16E8A2B0F3A"
    - NOTE
    ```
    Remember <the> & milk
    ```
    ## Design
    > leftSide="true", collapsed="true"
    - LINK
    ```
    https://example.com/design?rev=3
    ```
    ### Sketches
    - FILE
    ```
    sketches/first%20draft.png?line=4
    ```
    ## Code
    - TOPIC
    ```
    16E8A2B0F3A
    ```
    - SRC_POSITION
    ```
    src/Main.java[120:4]
    ```
    ```Java
    public class Main {}
    ```
    ## Multi<br/>line
    "##);
}

#[test]
fn nb_mindmap_fixture_content() {
    let map = MindMap::parse(&fixture("nb_mindmap")).unwrap();
    assert_eq!(map.attribute("showJumps"), Some("true"));
    assert_eq!(
        outline(&map),
        vec![
            (0, "Project#1".to_string()),
            (1, "Design".to_string()),
            (2, "Sketches".to_string()),
            (1, "Code".to_string()),
            (1, "Multi\nline".to_string()),
        ]
    );

    let root = map.root();
    assert_eq!(
        map.topic(root).unwrap().extra(ExtraKind::Note),
        Some(&Extra::Note("Remember <the> & milk".to_string()))
    );

    let sketches = child(&map, child(&map, root, 0), 0);
    let file = map.topic(sketches).unwrap().extra(ExtraKind::File).unwrap();
    assert_eq!(file.as_uri().unwrap().parameter("line"), Some("4"));

    let code = child(&map, root, 1);
    let code_topic = map.topic(code).unwrap();
    assert_eq!(
        code_topic.extra(ExtraKind::SrcPosition),
        Some(&Extra::SrcPosition(SourcePosition::new("src/Main.java", 120, 4)))
    );
    assert_eq!(code_topic.code_snippet("Java"), Some("public class Main {}"));

    let link = code_topic.extra(ExtraKind::Topic).unwrap();
    assert_eq!(map.find_topic_for_link(link), Some(root));
}

#[test]
fn attribute_value_with_quotes_and_commas_survives() {
    let mut map = MindMap::new();
    let root = map.root();
    let value = r#"a "quoted", comma, and \ backslash"#;
    map.set_topic_attribute(root, "note", Some(value)).unwrap();
    map.set_attribute("doc", Some(value)).unwrap();

    let reparsed = MindMap::parse(&map.write()).unwrap();
    assert_eq!(reparsed.topic(reparsed.root()).unwrap().attribute("note"), Some(value));
    assert_eq!(reparsed.attribute("doc"), Some(value));
}

#[test]
fn extras_with_backtick_runs_survive() {
    let mut map = MindMap::new();
    let root = map.root();
    let note = "one ` two `` three ```` end\n```\n";
    map.set_extra(root, Extra::Note(note.to_string())).unwrap();

    let options = WriteOptions {
        min_fence_length: 1,
        ..WriteOptions::default()
    };
    let reparsed = MindMap::parse(&map.write_with(&options)).unwrap();
    assert_eq!(
        reparsed.topic(reparsed.root()).unwrap().extra(ExtraKind::Note),
        Some(&Extra::Note(note.to_string()))
    );
}

#[test]
fn jump_links_survive_round_trip() {
    let mut map = MindMap::new();
    let root = map.root();
    let a = map.add_child(root, "A").unwrap();
    let b = map.add_child(root, "B").unwrap();
    let link = map.make_link_to(a).unwrap();
    map.set_extra(b, link).unwrap();

    let reparsed = MindMap::parse(&map.write()).unwrap();
    let new_b = child(&reparsed, reparsed.root(), 1);
    let link = reparsed.topic(new_b).unwrap().extra(ExtraKind::Topic).unwrap();
    let target = reparsed.find_topic_for_link(link).unwrap();
    assert_eq!(reparsed.topic(target).unwrap().text(), "A");
}

#[test]
fn deep_and_wide_tree_round_trips() {
    let mut map = MindMap::new();
    let mut parent = map.root();
    for depth in 0..12 {
        for sibling in 0..3 {
            map.add_child(parent, format!("{depth}.{sibling} #tag")).unwrap();
        }
        parent = child(&map, parent, 1);
    }
    let reparsed = MindMap::parse(&map.write()).unwrap();
    assert!(reparsed.content_eq(&map));
    assert_eq!(outline(&reparsed), outline(&map));
}
