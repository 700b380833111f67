//! End-to-end walks through a two-sequence onboarding flow loaded from disk.

use conversation_core::{
    ContentCache, ContentResolver, DataAccessor, DataAccessorExt, FixedIndex, FlowConfig,
    FlowError, FlowFault, FlowOrchestrator, FlowStatus, FsContentLoader, FsSequenceSource,
    InMemoryUserData, RenderedKind, SequenceLibrary,
};
use flow_script::{MessageId, SequenceId};
use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const WELCOME: &str = r#"{
  "id": "welcome",
  "messages": [
    { "id": 1, "text": "Hi {user.name|there}!", "contentKey": "bot.greet.user_welcome.warm" },
    { "id": 2, "type": "textInput", "text": "What should I call you?", "storeKey": "user.name" },
    { "id": 3, "type": "dataAction", "action": { "op": "increment", "key": "visits" } },
    {
      "id": 4,
      "type": "autoRoute",
      "routes": [ { "when": "greaterThan", "key": "visits", "value": 1, "nextMessageId": 10 } ],
      "defaultNext": 5
    },
    { "id": 5, "text": "Nice to meet you, {user.name}!", "nextMessageId": 6 },
    {
      "id": 6,
      "type": "choice",
      "text": "Ready to set up a task?",
      "storeKey": "setup.ready",
      "options": [
        { "text": "Yes", "value": true, "nextMessageId": 7 },
        { "text": "Later", "value": false, "nextMessageId": 9 }
      ]
    },
    { "id": 7, "text": "Let's go.", "sequenceId": "task_setup" },
    { "id": 9, "text": "See you soon.", "nextMessageId": 99 },
    { "id": 10, "text": "Welcome back, {user.name}!", "nextMessageId": 6 }
  ]
}"#;

const TASK_SETUP: &str = r#"{
  "id": "task_setup",
  "messages": [
    { "id": 1, "type": "textInput", "text": "Name your task", "hint": "e.g. Stretch", "storeKey": "task.name" },
    { "id": 2, "type": "dataAction", "action": { "op": "set", "key": "task.activeDays", "value": [1, 3, 5] } },
    { "id": 3, "type": "dataAction", "action": { "op": "trigger", "event": "task_created" } },
    { "id": 4, "text": "Saved {task.name} for days {task.activeDays}." }
  ]
}"#;

const GREETINGS: &str = "Hello {user.name|there}, welcome!\n\nHey {user.name|there}!\n";

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "sequences/welcome.json", WELCOME);
    write(dir.path(), "sequences/task_setup.json", TASK_SETUP);
    write(dir.path(), "content/bot/greet/welcome.txt", GREETINGS);
    write(
        dir.path(),
        "flow.toml",
        "[traversal]\nmax_steps = 50\n\n[orchestrator]\nmax_hops = 4\n",
    );
    dir
}

fn orchestrator(root: &Path, data: Arc<InMemoryUserData>, variant: usize) -> FlowOrchestrator {
    let config = FlowConfig::load(root.join("flow.toml")).unwrap();
    let resolver = ContentResolver::new(
        Arc::new(FsContentLoader::new(root)),
        Arc::new(ContentCache::new()),
        Arc::new(FixedIndex(variant)),
        config.content.clone(),
    );
    let library = SequenceLibrary::new(Arc::new(FsSequenceSource::new(root.join("sequences"))));
    FlowOrchestrator::new(library, resolver, data).with_config(&config)
}

#[tokio::test]
async fn test_first_visit_walks_into_task_setup() {
    let dir = fixture();
    let data = Arc::new(InMemoryUserData::new());
    let mut flow = orchestrator(dir.path(), data.clone(), 1);

    let batch = flow.start(&SequenceId::new("welcome"), None).await.unwrap();
    assert_eq!(batch.texts(), vec!["Hey there!", "What should I call you?"]);
    assert_eq!(batch.status, FlowStatus::AwaitingInput { message_id: MessageId(2) });

    let batch = flow.submit_text("Ana").await.unwrap();
    assert_eq!(
        batch.texts(),
        vec!["Nice to meet you, Ana!", "Ready to set up a task?"]
    );
    assert_eq!(
        batch.messages[1].kind,
        RenderedKind::Choice {
            options: vec!["Yes".to_string(), "Later".to_string()]
        }
    );
    assert_eq!(data.get_value("visits").await, Some(json!(1)));

    let batch = flow.submit_choice(0).await.unwrap();
    assert_eq!(batch.texts(), vec!["Let's go.", "Name your task"]);
    assert_eq!(
        batch.messages[1].kind,
        RenderedKind::TextInput {
            hint: Some("e.g. Stretch".to_string())
        }
    );
    assert_eq!(flow.current_sequence(), Some(&SequenceId::new("task_setup")));
    assert_eq!(data.get_value("setup.ready").await, Some(json!(true)));

    let batch = flow.submit_text("Stretch").await.unwrap();
    assert_eq!(batch.texts(), vec!["Saved Stretch for days 1, 3, 5."]);
    assert_eq!(batch.events.len(), 1);
    assert_eq!(batch.events[0].event, "task_created");
    assert_eq!(batch.events[0].sequence_id, SequenceId::new("task_setup"));
    assert!(batch.status.is_ended());

    let days = data.get_active_days("task.activeDays").await.unwrap().unwrap();
    assert_eq!(days.days(), &[1, 3, 5]);
}

#[tokio::test]
async fn test_returning_user_is_routed_back() {
    let dir = fixture();
    let data = Arc::new(
        InMemoryUserData::new()
            .with_value("user.name", json!("Ana"))
            .with_value("visits", json!(1)),
    );
    let mut flow = orchestrator(dir.path(), data.clone(), 0);

    let batch = flow.start(&SequenceId::new("welcome"), None).await.unwrap();
    assert_eq!(batch.texts(), vec!["Hello Ana, welcome!", "What should I call you?"]);

    let batch = flow.submit_text("Ana").await.unwrap();
    assert_eq!(batch.texts(), vec!["Welcome back, Ana!", "Ready to set up a task?"]);

    let batch = flow.submit_choice(1).await.unwrap();
    assert_eq!(batch.texts(), vec!["See you soon."]);
    assert!(batch.status.is_ended());
    assert_eq!(data.get_value("setup.ready").await, Some(json!(false)));
    assert_eq!(data.get_as::<i64>("visits").await, Some(2));
}

#[tokio::test]
async fn test_missing_content_falls_back_to_script_text() {
    let dir = fixture();
    fs::remove_dir_all(dir.path().join("content")).unwrap();
    let data = Arc::new(InMemoryUserData::new().with_value("user.name", json!("Bo")));
    let mut flow = orchestrator(dir.path(), data, 0);

    let batch = flow.start(&SequenceId::new("welcome"), None).await.unwrap();
    assert_eq!(batch.texts(), vec!["Hi Bo!", "What should I call you?"]);
}

#[tokio::test]
async fn test_unknown_target_sequence_faults_the_step() {
    let dir = fixture();
    write(
        dir.path(),
        "sequences/broken.json",
        r#"{ "id": "broken", "messages": [ { "id": 1, "text": "Off we go", "sequenceId": "nowhere" } ] }"#,
    );
    let mut flow = orchestrator(dir.path(), Arc::new(InMemoryUserData::new()), 0);

    let batch = flow.start(&SequenceId::new("broken"), None).await.unwrap();
    assert_eq!(batch.texts(), vec!["Off we go"]);
    match &batch.status {
        FlowStatus::Faulted {
            error: FlowFault::Transition { target, .. },
            resume_at,
        } => {
            assert_eq!(target.as_str(), "nowhere");
            assert_eq!(*resume_at, MessageId(1));
        }
        other => panic!("expected transition fault, got {:?}", other),
    }
    assert_eq!(flow.current_sequence(), Some(&SequenceId::new("broken")));

    let err = flow.start(&SequenceId::new("absent"), None).await.unwrap_err();
    assert!(matches!(err, FlowError::UnknownSequence(_)));
}
