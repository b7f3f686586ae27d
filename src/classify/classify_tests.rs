use super::*;
use crate::store::KeyedStore;
use std::io::Cursor;

fn row(answer: &str, parsed: &str) -> RawOutputRow {
    RawOutputRow {
        index: 0,
        model: "gpt-4".to_string(),
        actions: "1 Mary entered the hall.".to_string(),
        question: "2 Where is Mary?".to_string(),
        answer: answer.to_string(),
        question_type: "first_order".to_string(),
        story_type: "tom".to_string(),
        prompt: "prompt".to_string(),
        raw_response: format!("<answer>{parsed}</answer>"),
        parsed_answer: parsed.to_string(),
    }
}

fn record(correct: bool, classification: &str) -> ClassifiedRecord {
    ClassifiedRecord {
        row: row("hall", if correct { "hall" } else { "kitchen" }),
        correct,
        classification: classification.to_string(),
    }
}

fn open_store(dir: &Path) -> KeyedStore<ClassifiedRecord> {
    KeyedStore::open(&dir.join("classified.json")).expect("open store")
}

#[test]
fn aliases_number_distinct_incorrect_classifications() {
    let records = [
        record(false, "tracking error"),
        record(true, MODEL_CORRECT),
        record(false, "answer key is wrong"),
        record(false, "tracking error"),
    ];
    let aliases = classification_aliases(records.iter());
    assert_eq!(aliases.len(), 2);
    assert_eq!(aliases[&0], "answer key is wrong");
    assert_eq!(aliases[&1], "tracking error");
}

#[test]
fn choice_resolves_alias_or_free_text() {
    let aliases: BTreeMap<usize, String> = [(0, "a".to_string()), (1, "b".to_string())]
        .into_iter()
        .collect();
    assert_eq!(resolve_choice(" 1\n", &aliases), Ok("b".to_string()));
    assert_eq!(
        resolve_choice("  forgot the move \n", &aliases),
        Ok("forgot the move".to_string())
    );
    assert_eq!(resolve_choice("7", &aliases), Err(ChoiceError::UnknownAlias(7)));
    assert_eq!(resolve_choice("-1", &aliases), Err(ChoiceError::UnknownAlias(-1)));
    assert_eq!(resolve_choice("   \n", &aliases), Err(ChoiceError::Empty));
}

#[test]
fn glob_matches_whole_file_names() {
    let re = glob_regex("results-*.jsonl").unwrap();
    assert!(re.is_match("results-gpt-4-1.jsonl"));
    assert!(!re.is_match("old-results-gpt-4-1.jsonl"));
    assert!(!re.is_match("results-gpt-4-1.jsonl.bak"));
    assert!(glob_regex("a?c").unwrap().is_match("abc"));
    assert!(glob_regex("a.c").unwrap().is_match("a.c"));
    assert!(!glob_regex("a.c").unwrap().is_match("abc"));
}

#[test]
fn matching_files_are_sorted_and_filtered() {
    let dir = tempfile::tempdir().expect("create temp dir");
    for name in ["b.jsonl", "a.jsonl", "notes.txt"] {
        fs::write(dir.path().join(name), "").unwrap();
    }
    fs::create_dir(dir.path().join("sub.jsonl")).unwrap();

    let files = matching_files(dir.path(), "*.jsonl").unwrap();
    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["a.jsonl", "b.jsonl"]);
}

#[test]
fn correct_rows_are_stored_without_prompting() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let mut store = open_store(dir.path());
    let rows = [row("hall", "Hall"), row("box", " box")];

    let mut input = Cursor::new(Vec::new());
    let mut out = Vec::new();
    let outcome = classify_rows("r.jsonl", &rows, &mut store, false, &mut input, &mut out).unwrap();

    assert_eq!(outcome.correct, 2);
    assert!(outcome.completed);
    let stored = store.get("r.jsonl_1").expect("row stored");
    assert!(stored.correct);
    assert_eq!(stored.classification, MODEL_CORRECT);
}

#[test]
fn incorrect_rows_take_typed_and_aliased_classifications() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let mut store = open_store(dir.path());
    let rows = [
        row("hall", "kitchen"),
        row("box", "box"),
        row("garden", ""),
    ];

    let mut input = Cursor::new(b"lost track of mary\n\n5\n0\n".to_vec());
    let mut out = Vec::new();
    let outcome = classify_rows("r.jsonl", &rows, &mut store, false, &mut input, &mut out).unwrap();

    assert_eq!(
        outcome,
        ClassifyOutcome {
            correct: 1,
            classified: 2,
            skipped: 0,
            completed: true,
        }
    );
    assert_eq!(
        store.get("r.jsonl_0").map(|r| r.classification.as_str()),
        Some("lost track of mary")
    );
    assert_eq!(
        store.get("r.jsonl_2").map(|r| r.classification.as_str()),
        Some("lost track of mary")
    );

    let transcript = String::from_utf8(out).unwrap();
    assert!(transcript.contains("RIGHT ANSWER: hall, MODEL ANSWER: kitchen"));
    assert!(transcript.contains("classification must not be empty; try again"));
    assert!(transcript.contains("no classification with alias 5; try again"));
    assert!(transcript.contains("  0: lost track of mary"));
}

#[test]
fn end_of_input_stops_with_progress_saved() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("classified.json");
    let mut store: KeyedStore<ClassifiedRecord> = KeyedStore::open(&path).unwrap();
    let rows = [row("a", "a"), row("b", "x"), row("c", "c")];

    let mut input = Cursor::new(Vec::new());
    let mut out = Vec::new();
    let outcome = classify_rows("r.jsonl", &rows, &mut store, false, &mut input, &mut out).unwrap();

    assert!(!outcome.completed);
    assert_eq!(outcome.correct, 1);
    let reopened: KeyedStore<ClassifiedRecord> = KeyedStore::open(&path).unwrap();
    assert_eq!(reopened.len(), 1);
    assert!(reopened.contains_key("r.jsonl_0"));
}

#[test]
fn already_classified_rows_are_skipped_unless_reclassifying() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let mut store = open_store(dir.path());
    let rows = [row("hall", "kitchen")];

    let mut out = Vec::new();
    classify_rows(
        "r.jsonl",
        &rows,
        &mut store,
        false,
        &mut Cursor::new(b"first\n".to_vec()),
        &mut out,
    )
    .unwrap();

    let outcome = classify_rows(
        "r.jsonl",
        &rows,
        &mut store,
        false,
        &mut Cursor::new(Vec::new()),
        &mut out,
    )
    .unwrap();
    assert_eq!(outcome.skipped, 1);
    assert!(outcome.completed);

    classify_rows(
        "r.jsonl",
        &rows,
        &mut store,
        true,
        &mut Cursor::new(b"second\n".to_vec()),
        &mut out,
    )
    .unwrap();
    assert_eq!(
        store.get("r.jsonl_0").map(|r| r.classification.as_str()),
        Some("second")
    );
}

#[test]
fn classified_record_flattens_row_fields() {
    let value = serde_json::to_value(record(false, "tracking error")).unwrap();
    assert_eq!(value["question"], "2 Where is Mary?");
    assert_eq!(value["correct"], false);
    assert_eq!(value["classification"], "tracking error");
    let back: ClassifiedRecord = serde_json::from_value(value).unwrap();
    assert_eq!(back, record(false, "tracking error"));
}
