//! Round-trip and wire tests for the serialization layer

use mdnb_annotations::CellAnnotations;
use mdnb_document::{Cell, CellKind, CodeCell, Document};
use mdnb_identity::{cell_id, IdentityPolicy};
use mdnb_serializer::prelude::*;
use mdnb_serializer::{
    dispatch, DeserializeRequest, Method, SerializeRequest, WireNotebook,
};
use mdnb_test_utils::{
    create_duplicate_document, create_test_document, FENCE_IN_BODY, LEGACY_ANNOTATIONS,
    NESTED_FENCES, README, UNTERMINATED, VALID_FIXTURES, WITH_FRONTMATTER,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn plain_layer() -> SerializationLayer {
    SerializationLayer::with_config(LayerConfig::default().with_identity(IdentityPolicy::None))
}

fn render(layer: &SerializationLayer, doc: &Document) -> String {
    String::from_utf8(layer.render_document(doc).unwrap()).unwrap()
}

#[test]
fn canonical_fixtures_are_byte_stable() {
    let layer = plain_layer();
    for source in [README, WITH_FRONTMATTER, NESTED_FENCES, FENCE_IN_BODY] {
        let doc = layer.parse_document(source.as_bytes()).unwrap();
        assert_eq!(render(&layer, &doc), source);
    }
}

#[test]
fn every_fixture_round_trips() {
    let layer = SerializationLayer::new();
    for source in VALID_FIXTURES {
        let first = layer.parse_document(source.as_bytes()).unwrap();
        let second = layer
            .parse_document(&layer.render_document(&first).unwrap())
            .unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn readme_structure() {
    let doc = plain_layer().parse_document(README.as_bytes()).unwrap();
    let kinds: Vec<_> = doc.cells.iter().map(Cell::kind).collect();
    assert_eq!(
        kinds,
        [
            CellKind::Markup,
            CellKind::Code,
            CellKind::Markup,
            CellKind::Code,
            CellKind::Code
        ]
    );
    let names: Vec<_> = doc.code_cells().map(|c| c.annotations().name).collect();
    assert_eq!(names, ["install", "hello", "deploy"]);
}

#[test]
fn frontmatter_fields_survive() {
    let doc = plain_layer()
        .parse_document(WITH_FRONTMATTER.as_bytes())
        .unwrap();
    assert_eq!(doc.frontmatter.shell.as_deref(), Some("bash"));
    assert_eq!(doc.frontmatter.cwd.as_deref(), Some("/tmp"));
    assert!(doc.frontmatter.extra.contains_key("owner"));
}

#[test]
fn legacy_keys_are_rewritten() {
    let layer = plain_layer();
    let doc = layer.parse_document(LEGACY_ANNOTATIONS.as_bytes()).unwrap();
    assert_eq!(
        render(&layer, &doc),
        "```sh { name=legacy id=abc123 }\necho legacy\n```\n"
    );
}

#[test]
fn default_values_are_omitted_but_equivalent() {
    let layer = plain_layer();
    let source = "```sh { name=a background=false interactive=true }\nls\n```\n";
    let first = layer.parse_document(source.as_bytes()).unwrap();
    let bytes = layer.render_document(&first).unwrap();
    assert_eq!(String::from_utf8(bytes.clone()).unwrap(), "```sh { name=a }\nls\n```\n");

    let second = layer.parse_document(&bytes).unwrap();
    let before = first.code_cells().next().unwrap().annotations();
    let after = second.code_cells().next().unwrap().annotations();
    assert_eq!(before, after);
}

#[test]
fn unterminated_fence_reports_offset() {
    let err = SerializationLayer::new()
        .parse_document(UNTERMINATED.as_bytes())
        .unwrap_err();
    assert_eq!(err, ParseError::UnterminatedFence { offset: 10 });
}

#[test]
fn identity_is_assigned_once() {
    let layer = SerializationLayer::new();
    let first = layer.parse_document(README.as_bytes()).unwrap();
    let ids: Vec<_> = first.code_cells().filter_map(cell_id).collect();
    assert_eq!(ids.len(), 3);

    let second = layer
        .parse_document(&layer.render_document(&first).unwrap())
        .unwrap();
    let again: Vec<_> = second.code_cells().filter_map(cell_id).collect();
    assert_eq!(ids, again);
}

#[test]
fn duplicate_cells_get_distinct_ids() {
    let layer = SerializationLayer::new();
    let doc = create_duplicate_document(4, "echo same");
    let bytes = layer.render_document(&doc).unwrap();
    let parsed = layer.parse_document(&bytes).unwrap();

    let mut ids: Vec<_> = parsed.code_cells().filter_map(cell_id).collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 4);
}

#[test]
fn wire_round_trip_through_dispatch() {
    let layer = SerializationLayer::new();
    let doc = create_test_document();

    let request = SerializeRequest {
        notebook: WireNotebook::from(&doc),
    };
    let serialized = dispatch(
        &layer,
        Method::Serialize,
        serde_json::to_value(request).unwrap(),
    )
    .unwrap();

    let params = serde_json::json!({ "source": serialized["result"] });
    let deserialized = dispatch(&layer, Method::Deserialize, params).unwrap();
    let notebook: WireNotebook =
        serde_json::from_value(deserialized["notebook"].clone()).unwrap();
    let back = Document::from(notebook);

    let values: Vec<_> = back.cells.iter().map(Cell::value).collect();
    assert_eq!(values, ["# Test", "echo one", "Between", "echo two"]);
}

#[test]
fn zero_length_request() {
    let layer = SerializationLayer::new();
    let response = layer
        .deserialize(DeserializeRequest { source: Vec::new() })
        .unwrap();
    assert_eq!(response.notebook, WireNotebook::default());
}

#[test]
fn concurrent_calls_share_one_layer() {
    let layer = std::sync::Arc::new(SerializationLayer::new());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let layer = std::sync::Arc::clone(&layer);
            std::thread::spawn(move || {
                let source = format!("# Doc {i}\n\n```sh\necho {i}\n```\n");
                let doc = layer.parse_document(source.as_bytes()).unwrap();
                layer.render_document(&doc).unwrap()
            })
        })
        .collect();
    for handle in handles {
        assert!(!handle.join().unwrap().is_empty());
    }
}

fn arb_markup() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z][A-Za-z .,]{0,30}".prop_map(|text| text.trim_end().to_string()),
        "[a-z]{1,10}".prop_map(|word| format!("# {word}")),
        prop::collection::vec("[a-z]{1,8}", 1..4).prop_map(|items| {
            items
                .iter()
                .map(|item| format!("- {item}"))
                .collect::<Vec<_>>()
                .join("\n")
        }),
        "[a-z]{1,10}".prop_map(|step| format!("1. {step}\n2. again")),
        "[a-z ]{0,12}".prop_map(|text| format!("> {}", text.trim_end())),
        "[a-z]{1,6}".prop_map(|cmd| format!("> ```sh\n> {cmd}\n> ```")),
        "[a-z ]{0,12}".prop_map(|note| format!("<!-- {note} -->")),
    ]
}

fn arb_cell() -> impl Strategy<Value = Cell> {
    prop_oneof![
        arb_markup().prop_map(Cell::markup),
        (
            prop::collection::vec("[a-z0-9 =$#]{0,16}", 0..4),
            prop::sample::select(vec!["sh", "bash", "js", "python", "go"]),
            "[a-z][a-z0-9-]{0,8}",
            any::<bool>(),
            prop::option::of("[a-z /]{0,10}"),
        )
            .prop_map(|(lines, language, name, background, cwd)| {
                let mut cell = CodeCell::new(lines.join("\n"), language)
                    .with_metadata("name", name)
                    .with_metadata("background", background.to_string());
                if let Some(cwd) = cwd {
                    cell = cell.with_metadata("cwd", cwd);
                }
                Cell::Code(cell)
            }),
    ]
}

fn arb_document() -> impl Strategy<Value = Document> {
    prop::collection::vec(arb_cell(), 1..6).prop_map(|cells| Document {
        cells,
        ..Document::default()
    })
}

/// One `key`, `key=value` or `key="quoted value"` attribute
fn arb_attribute() -> impl Strategy<Value = String> {
    let key = prop::sample::select(vec![
        "name",
        "cwd",
        "category",
        "background",
        "interactive",
        "excludeFromRunAll",
        "x-extra",
    ]);
    prop_oneof![
        key.clone().prop_map(str::to_string),
        (key.clone(), "[a-z0-9/._-]{1,8}").prop_map(|(k, v)| format!("{k}={v}")),
        (key, "[a-z {}=]{0,8}").prop_map(|(k, v)| format!("{k}=\"{v}\"")),
    ]
}

/// Opening fence info: language, attributes in any accepted form, trailing whitespace
fn arb_info() -> impl Strategy<Value = String> {
    (
        prop::sample::select(vec!["", "sh", "bash", "js", "zsh"]),
        prop::collection::vec(arb_attribute(), 0..3),
        prop::sample::select(vec!["braced", "tight", "bare"]),
        prop::sample::select(vec!["", " ", "  ", "\t", " \t "]),
    )
        .prop_map(|(language, attributes, form, trailing)| {
            let pairs = attributes.join(" ");
            let attributes = match form {
                _ if attributes.is_empty() => String::new(),
                "braced" => format!(" {{ {pairs} }}"),
                "tight" => format!("{{{pairs}}}"),
                _ => format!(" {pairs}"),
            };
            format!("{language}{attributes}{trailing}")
        })
}

/// A fenced block with a matching closing fence
fn arb_fenced_block() -> impl Strategy<Value = String> {
    (
        prop::sample::select(vec!["```", "````", "~~~", "~~~~"]),
        arb_info(),
        prop::collection::vec("[a-z0-9 =$#{}\"]{0,16}", 0..4),
    )
        .prop_map(|(fence, info, lines)| {
            let mut block = format!("{fence}{info}\n");
            for line in lines {
                block.push_str(&line);
                block.push('\n');
            }
            block.push_str(fence);
            block
        })
}

fn arb_source() -> impl Strategy<Value = String> {
    prop::collection::vec(prop_oneof![arb_markup(), arb_fenced_block()], 0..6)
        .prop_map(|blocks| blocks.join("\n\n") + "\n")
}

proptest! {
    #[test]
    fn deserialize_serialize_round_trip(doc in arb_document()) {
        let layer = SerializationLayer::new();
        let bytes = layer.render_document(&doc).unwrap();
        let first = layer.parse_document(&bytes).unwrap();
        let again = layer.parse_document(&layer.render_document(&first).unwrap()).unwrap();

        prop_assert_eq!(&first, &again);
    }

    #[test]
    fn written_sources_reach_a_fixed_point(source in arb_source()) {
        let layer = plain_layer();
        let parsed = layer.parse_document(source.as_bytes()).unwrap();
        let canonical = layer.parse_document(&layer.render_document(&parsed).unwrap()).unwrap();
        let again = layer.parse_document(&layer.render_document(&canonical).unwrap()).unwrap();

        prop_assert_eq!(parsed.code_cells().count(), canonical.code_cells().count());
        for (a, b) in parsed.code_cells().zip(canonical.code_cells()) {
            prop_assert_eq!(&a.value, &b.value);
            prop_assert_eq!(&a.language_id, &b.language_id);
        }
        prop_assert_eq!(&canonical, &again);
    }

    #[test]
    fn parse_never_panics(
        blocks in prop::collection::vec(
            prop_oneof![
                arb_markup(),
                arb_fenced_block(),
                arb_info().prop_map(|info| format!("```{info}")),
            ],
            0..6,
        ),
        separator in prop::sample::select(vec!["\n", "\n\n", "\r\n", "\r\n\r\n"]),
    ) {
        let source = blocks.join(separator);
        let _ = SerializationLayer::new().parse_document(source.as_bytes());
    }

    #[test]
    fn parse_never_panics_on_noise(source in "[ -~\t\r\n]{0,200}") {
        let _ = SerializationLayer::new().parse_document(source.as_bytes());
    }
}
