use super::*;
use async_trait::async_trait;
use hookchat_core::gateway::FailureCategory;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;

// Mock ConversationRepository holding the "stored" list in memory.
#[derive(Default)]
struct InMemoryConversationRepository {
    stored: StdMutex<Vec<Conversation>>,
}

impl InMemoryConversationRepository {
    fn ids(&self) -> Vec<String> {
        self.stored.lock().unwrap().iter().map(|c| c.id.clone()).collect()
    }

    fn get(&self, id: &str) -> Option<Conversation> {
        self.stored.lock().unwrap().iter().find(|c| c.id == id).cloned()
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn load_all(&self) -> Vec<Conversation> {
        self.stored.lock().unwrap().clone()
    }

    async fn save_all(&self, conversations: &[Conversation]) {
        *self.stored.lock().unwrap() = conversations.to_vec();
    }

    async fn update(&self, update: ConversationUpdate) -> UpdateOutcome {
        let mut stored = self.stored.lock().unwrap();
        update(&mut stored);
        UpdateOutcome::Merged(stored.clone())
    }
}

// Mock ConversationRepository whose backing store can never be reached.
#[derive(Default)]
struct UnreachableConversationRepository {
    attempts: AtomicUsize,
}

#[async_trait]
impl ConversationRepository for UnreachableConversationRepository {
    async fn load_all(&self) -> Vec<Conversation> {
        Vec::new()
    }

    async fn save_all(&self, _conversations: &[Conversation]) {}

    async fn update(&self, update: ConversationUpdate) -> UpdateOutcome {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        UpdateOutcome::Unavailable(update)
    }
}

#[derive(Default)]
struct MockStateRepository {
    active: StdMutex<Option<String>>,
}

#[async_trait]
impl StateRepository for MockStateRepository {
    async fn get_active_conversation(&self) -> Option<String> {
        self.active.lock().unwrap().clone()
    }

    async fn set_active_conversation(&self, conversation_id: Option<String>) {
        *self.active.lock().unwrap() = conversation_id;
    }

    async fn get_language(&self) -> Option<Locale> {
        None
    }

    async fn set_language(&self, _locale: Locale) {}
}

type Reply = std::result::Result<String, GatewayError>;

// Chat gateway whose replies are released by the test, keyed by message text.
#[derive(Default)]
struct ControlledGateway {
    senders: StdMutex<HashMap<String, oneshot::Sender<Reply>>>,
    receivers: StdMutex<HashMap<String, oneshot::Receiver<Reply>>>,
    sessions: StdMutex<Vec<String>>,
    history: StdMutex<Option<std::result::Result<Vec<Message>, GatewayError>>>,
}

impl ControlledGateway {
    fn ensure_channel(&self, text: &str) {
        let mut senders = self.senders.lock().unwrap();
        let mut receivers = self.receivers.lock().unwrap();
        if !senders.contains_key(text) && !receivers.contains_key(text) {
            let (tx, rx) = oneshot::channel();
            senders.insert(text.to_string(), tx);
            receivers.insert(text.to_string(), rx);
        }
    }

    fn resolve(&self, text: &str, reply: Reply) {
        self.ensure_channel(text);
        let sender = self.senders.lock().unwrap().remove(text).unwrap();
        let _ = sender.send(reply);
    }

    fn set_history(&self, history: std::result::Result<Vec<Message>, GatewayError>) {
        *self.history.lock().unwrap() = Some(history);
    }
}

#[async_trait]
impl ChatGateway for ControlledGateway {
    async fn send_message(&self, session_id: &str, text: &str) -> std::result::Result<String, GatewayError> {
        self.sessions.lock().unwrap().push(session_id.to_string());
        self.ensure_channel(text);
        let receiver = self.receivers.lock().unwrap().remove(text).unwrap();
        receiver
            .await
            .unwrap_or_else(|_| Err(GatewayError::Network("dropped".into())))
    }

    async fn load_previous_session(
        &self,
        _session_id: &str,
    ) -> std::result::Result<Vec<Message>, GatewayError> {
        self.history
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[derive(Default)]
struct CountingTitleGenerator {
    calls: AtomicUsize,
}

#[async_trait]
impl TitleGenerator for CountingTitleGenerator {
    async fn generate_title(&self, messages: &[Message], _locale: Locale) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let first = messages.iter().find(|m| m.is_user()).map(|m| m.content.clone());
        format!("About {}", first.unwrap_or_default())
    }
}

struct Harness {
    service: ConversationService,
    repository: Arc<InMemoryConversationRepository>,
    state: Arc<MockStateRepository>,
    gateway: Arc<ControlledGateway>,
    titles: Arc<CountingTitleGenerator>,
    events: mpsc::UnboundedReceiver<ChatEvent>,
}

fn harness(locale: Locale) -> Harness {
    let repository = Arc::new(InMemoryConversationRepository::default());
    let state = Arc::new(MockStateRepository::default());
    let gateway = Arc::new(ControlledGateway::default());
    let titles = Arc::new(CountingTitleGenerator::default());
    let (tx, events) = mpsc::unbounded_channel();
    let service = ConversationService::new(
        repository.clone(),
        state.clone(),
        gateway.clone(),
        titles.clone(),
        locale,
    )
    .with_events(tx);
    Harness {
        service,
        repository,
        state,
        gateway,
        titles,
        events,
    }
}

async fn wait_for_title(events: &mut mpsc::UnboundedReceiver<ChatEvent>) -> (String, String) {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            if let Some(ChatEvent::TitleUpdated {
                conversation_id,
                title,
            }) = events.recv().await
            {
                return (conversation_id, title);
            }
        }
    })
    .await
    .expect("title was never updated")
}

fn contents(conversation: &Conversation) -> Vec<&str> {
    conversation
        .messages
        .iter()
        .map(|m| m.content.as_str())
        .collect()
}

#[tokio::test]
async fn test_user_message_is_staged_before_reply() {
    let h = harness(Locale::En);
    let conv = h.service.new_conversation().await;

    let handle = h.service.send(&conv.id, &conv.session_id, "  Hello  ").await.unwrap();

    let stored = h.repository.get(&conv.id).unwrap();
    assert_eq!(stored.messages.len(), 2);
    assert_eq!(stored.messages[1].content, "Hello");
    assert!(stored.messages[1].is_user());
    assert!(h.service.is_pending(&conv.id).await);
    assert!(h.service.is_loading().await);

    h.gateway.resolve("Hello", Ok("Hi!".into()));
    let reply = handle.await.unwrap();
    assert_eq!(reply.content, "Hi!");
    assert!(!h.service.is_pending(&conv.id).await);
    assert_eq!(h.gateway.sessions.lock().unwrap().as_slice(), [conv.session_id.clone()]);
}

#[tokio::test]
async fn test_blank_input_is_rejected_without_side_effects() {
    let h = harness(Locale::En);
    let conv = h.service.new_conversation().await;

    let err = h.service.send(&conv.id, &conv.session_id, "   \n").await.unwrap_err();
    assert!(err.is_invalid_input());
    assert_eq!(h.repository.get(&conv.id).unwrap().messages.len(), 1);
    assert!(!h.service.is_pending(&conv.id).await);

    let err = h.service.send("missing", "s", "hi").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_interleaved_replies_land_in_issuing_conversation() {
    let h = harness(Locale::En);
    let a = h.service.new_conversation().await;
    let b = h.service.new_conversation().await;
    let c = h.service.new_conversation().await;

    let ha = h.service.send(&a.id, &a.session_id, "question a").await.unwrap();
    h.service.select(&b.id).await.unwrap();
    let hb = h.service.send(&b.id, &b.session_id, "question b").await.unwrap();
    h.service.select(&c.id).await.unwrap();
    let hc = h.service.send(&c.id, &c.session_id, "question c").await.unwrap();

    // Resolve out of order while yet another conversation is active.
    h.service.select(&a.id).await.unwrap();
    h.gateway.resolve("question c", Ok("answer c".into()));
    hc.await.unwrap();
    h.gateway.resolve("question a", Ok("answer a".into()));
    ha.await.unwrap();
    h.service.select(&c.id).await.unwrap();
    h.gateway.resolve("question b", Ok("answer b".into()));
    hb.await.unwrap();

    for (conv, suffix) in [(&a, "a"), (&b, "b"), (&c, "c")] {
        let stored = h.repository.get(&conv.id).unwrap();
        let expected_question = format!("question {suffix}");
        let expected_answer = format!("answer {suffix}");
        assert_eq!(
            contents(&stored)[1..],
            [expected_question.as_str(), expected_answer.as_str()]
        );
        assert_eq!(h.service.conversation(&conv.id).await.unwrap(), stored);
    }
    assert_eq!(h.service.active_id().await, Some(c.id.clone()));
}

#[tokio::test]
async fn test_switching_active_does_not_affect_loading_flag_of_other() {
    let h = harness(Locale::En);
    let a = h.service.new_conversation().await;
    let handle = h.service.send(&a.id, &a.session_id, "slow one").await.unwrap();
    assert!(h.service.is_loading().await);

    let b = h.service.new_conversation().await;
    assert_eq!(h.service.active_id().await, Some(b.id.clone()));
    assert!(!h.service.is_loading().await);
    assert!(h.service.is_pending(&a.id).await);

    h.gateway.resolve("slow one", Ok("done".into()));
    handle.await.unwrap();
    assert!(!h.service.is_pending(&a.id).await);
    assert_eq!(h.repository.get(&b.id).unwrap().messages.len(), 1);
}

#[tokio::test]
async fn test_reply_after_delete_restores_conversation() {
    let h = harness(Locale::En);
    let conv = h.service.new_conversation().await;
    let handle = h.service.send(&conv.id, &conv.session_id, "are you there?").await.unwrap();

    h.service.delete(&conv.id).await.unwrap();
    assert!(h.repository.get(&conv.id).is_none());
    assert!(h.service.conversation(&conv.id).await.is_none());
    assert_eq!(h.service.active_id().await, None);

    h.gateway.resolve("are you there?", Ok("still here".into()));
    handle.await.unwrap();

    let restored = h.repository.get(&conv.id).expect("conversation restored");
    assert_eq!(restored.session_id, conv.session_id);
    assert_eq!(
        contents(&restored),
        [conv.messages[0].content.as_str(), "are you there?", "still here"]
    );
    assert!(h.service.conversation(&conv.id).await.is_some());
}

#[tokio::test]
async fn test_failure_appends_localized_notice() {
    let h = harness(Locale::Nl);
    let conv = h.service.new_conversation().await;
    let handle = h.service.send(&conv.id, &conv.session_id, "hallo").await.unwrap();

    h.gateway.resolve("hallo", Err(GatewayError::NotFound));
    let reply = handle.await.unwrap();

    let expected = Locale::Nl.strings().failure_message(FailureCategory::NotFound);
    assert_eq!(reply.content, expected);
    assert_eq!(contents(&h.repository.get(&conv.id).unwrap())[2], expected);
    // No title for a failed first exchange.
    assert_eq!(h.titles.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_empty_reply_counts_as_failure() {
    let h = harness(Locale::En);
    let conv = h.service.new_conversation().await;
    let handle = h.service.send(&conv.id, &conv.session_id, "ping").await.unwrap();

    h.gateway.resolve("ping", Ok("   ".into()));
    let reply = handle.await.unwrap();
    assert_eq!(
        reply.content,
        Locale::En.strings().failure_message(FailureCategory::Generic)
    );
}

#[tokio::test]
async fn test_title_generated_once_for_first_exchange() {
    let mut h = harness(Locale::En);
    let conv = h.service.new_conversation().await;

    let first = h.service.send(&conv.id, &conv.session_id, "Plan a trip").await.unwrap();
    h.gateway.resolve("Plan a trip", Ok("Sure".into()));
    first.await.unwrap();

    let (id, title) = wait_for_title(&mut h.events).await;
    assert_eq!(id, conv.id);
    assert_eq!(title, "About Plan a trip");
    assert_eq!(h.repository.get(&conv.id).unwrap().title, "About Plan a trip");

    let second = h.service.send(&conv.id, &conv.session_id, "To Ghent").await.unwrap();
    h.gateway.resolve("To Ghent", Ok("Nice".into()));
    second.await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(h.titles.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.repository.get(&conv.id).unwrap().title, "About Plan a trip");
}

#[tokio::test]
async fn test_bulk_delete_removes_exactly_those_ids() {
    let h = harness(Locale::En);
    let mut created = Vec::new();
    for _ in 0..5 {
        created.push(h.service.new_conversation().await.id);
    }

    let doomed = vec![created[0].clone(), created[2].clone(), created[4].clone()];
    let removed = h.service.delete_many(&doomed).await;
    assert_eq!(removed, 3);

    let mut remaining = h.repository.ids();
    remaining.sort();
    let mut expected = vec![created[1].clone(), created[3].clone()];
    expected.sort();
    assert_eq!(remaining, expected);

    let mut in_memory: Vec<String> = h.service.conversations().await.into_iter().map(|c| c.id).collect();
    in_memory.sort();
    assert_eq!(in_memory, expected);

    // The active conversation (created[4]) was removed.
    let active = h.service.active_id().await.unwrap();
    assert!(expected.contains(&active));
    assert_eq!(*h.state.active.lock().unwrap(), Some(active));
}

#[tokio::test]
async fn test_delete_active_prefers_most_recent_visible() {
    let h = harness(Locale::En);
    let older = h.service.new_conversation().await;
    let archived = h.service.new_conversation().await;
    h.service.set_archived(&archived.id, true).await.unwrap();
    let active = h.service.new_conversation().await;

    h.service.delete(&active.id).await.unwrap();
    assert_eq!(h.service.active_id().await, Some(older.id.clone()));

    h.service.delete(&older.id).await.unwrap();
    assert_eq!(h.service.active_id().await, None);
    assert!(h.service.delete("nope").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_metadata_operations() {
    let h = harness(Locale::En);
    let conv = h.service.new_conversation().await;

    h.service.rename(&conv.id, "  Trip notes ").await.unwrap();
    assert!(h.service.toggle_pin(&conv.id).await.unwrap());
    assert!(h.service.rename(&conv.id, " ").await.unwrap_err().is_invalid_input());

    let stored = h.repository.get(&conv.id).unwrap();
    assert_eq!(stored.title, "Trip notes");
    assert!(stored.pinned);

    h.service.set_archived(&conv.id, true).await.unwrap();
    assert!(h.service.sidebar(false).await.is_empty());
    assert_eq!(h.service.sidebar(true).await.len(), 1);
    assert_eq!(h.service.active_id().await, None);

    h.service.set_archived(&conv.id, false).await.unwrap();
    assert_eq!(h.service.search("trip", false).await.len(), 1);
    assert!(h.service.search("nothing like this", true).await.is_empty());
}

#[tokio::test]
async fn test_edit_and_delete_message() {
    let h = harness(Locale::En);
    let conv = h.service.new_conversation().await;
    let handle = h.service.send(&conv.id, &conv.session_id, "typo herre").await.unwrap();
    h.gateway.resolve("typo herre", Ok("noted".into()));
    handle.await.unwrap();

    let stored = h.repository.get(&conv.id).unwrap();
    let user_id = stored.messages[1].id.clone().unwrap();
    let reply_id = stored.messages[2].id.clone().unwrap();

    h.service.edit_message(&conv.id, &user_id, "typo here").await.unwrap();
    h.service.delete_message(&conv.id, &reply_id).await.unwrap();

    let stored = h.repository.get(&conv.id).unwrap();
    assert_eq!(contents(&stored)[1..], ["typo here"]);

    assert!(
        h.service
            .delete_message(&conv.id, &reply_id)
            .await
            .unwrap_err()
            .is_not_found()
    );
    assert!(
        h.service
            .edit_message(&conv.id, &user_id, "")
            .await
            .unwrap_err()
            .is_invalid_input()
    );
}

#[tokio::test]
async fn test_clear_all() {
    let h = harness(Locale::En);
    h.service.new_conversation().await;
    h.service.new_conversation().await;

    h.service.clear_all().await;
    assert!(h.repository.ids().is_empty());
    assert!(h.service.conversations().await.is_empty());
    assert_eq!(*h.state.active.lock().unwrap(), None);
}

#[tokio::test]
async fn test_send_to_active_creates_conversation_when_needed() {
    let h = harness(Locale::En);
    let handle = h.service.send_to_active("first words").await.unwrap();
    let active = h.service.active_conversation().await.unwrap();
    assert_eq!(contents(&active)[1], "first words");

    h.gateway.resolve("first words", Ok("welcome back".into()));
    handle.await.unwrap();
    assert_eq!(h.service.conversations().await.len(), 1);
}

#[tokio::test]
async fn test_load_restores_active_or_falls_back() {
    let h = harness(Locale::En);
    let mut old = Conversation::seeded(Locale::En);
    old.timestamp = chrono::Utc::now() - chrono::Duration::days(1);
    let recent = Conversation::seeded(Locale::En);
    h.repository
        .save_all(&[old.clone(), recent.clone()])
        .await;

    h.state.set_active_conversation(Some(old.id.clone())).await;
    h.service.load().await;
    assert_eq!(h.service.active_id().await, Some(old.id.clone()));
    assert_eq!(h.service.conversations().await.len(), 2);

    h.state.set_active_conversation(Some("gone".into())).await;
    h.service.load().await;
    assert_eq!(h.service.active_id().await, Some(recent.id.clone()));
    assert_eq!(*h.state.active.lock().unwrap(), Some(recent.id));
}

#[tokio::test]
async fn test_hydrate_active_replaces_seed_only_conversation() {
    let h = harness(Locale::En);
    let conv = h.service.new_conversation().await;
    h.gateway.set_history(Ok(vec![
        Message::user("earlier question"),
        Message::assistant("earlier answer"),
    ]));

    assert!(h.service.hydrate_active().await);
    let stored = h.repository.get(&conv.id).unwrap();
    assert_eq!(contents(&stored), ["earlier question", "earlier answer"]);

    // A conversation with real messages is left alone.
    assert!(!h.service.hydrate_active().await);
}

#[tokio::test]
async fn test_hydrate_failure_leaves_state_untouched() {
    let h = harness(Locale::En);
    let conv = h.service.new_conversation().await;
    h.gateway.set_history(Err(GatewayError::from_status(500, "boom")));

    assert!(!h.service.hydrate_active().await);
    assert_eq!(h.repository.get(&conv.id).unwrap(), conv);
}

#[tokio::test]
async fn test_export_transcript_uses_locale_labels() {
    let h = harness(Locale::Nl);
    let conv = h.service.new_conversation().await;
    h.service.rename(&conv.id, "Reis naar Gent").await.unwrap();

    let transcript = h.service.export_transcript(&conv.id).await.unwrap();
    assert!(transcript.file_name.starts_with("reis-naar-gent-"));
    assert!(transcript.content.contains("Assistent: Hallo!"));
    assert!(h.service.export_transcript("missing").await.is_err());
}

#[tokio::test]
async fn test_unreachable_store_keeps_session_in_memory() {
    let repository = Arc::new(UnreachableConversationRepository::default());
    let gateway = Arc::new(ControlledGateway::default());
    let service = ConversationService::new(
        repository.clone(),
        Arc::new(MockStateRepository::default()),
        gateway.clone(),
        Arc::new(CountingTitleGenerator::default()),
        Locale::En,
    );

    let conv = service.new_conversation().await;
    assert_eq!(service.conversations().await.len(), 1);
    assert_eq!(service.active_id().await, Some(conv.id.clone()));

    let handle = service.send(&conv.id, &conv.session_id, "still here?").await.unwrap();
    let staged = service.conversation(&conv.id).await.unwrap();
    assert_eq!(contents(&staged)[1..], ["still here?"]);

    gateway.resolve("still here?", Ok("yes".into()));
    assert_eq!(handle.await.unwrap().content, "yes");

    // Follow-ups go to the same conversation instead of spawning new ones.
    for text in ["second", "third"] {
        let handle = service.send_to_active(text).await.unwrap();
        gateway.resolve(text, Ok(format!("re: {text}")));
        handle.await.unwrap();
    }

    let conversations = service.conversations().await;
    assert_eq!(conversations.len(), 1);
    assert_eq!(
        contents(&conversations[0])[1..],
        ["still here?", "yes", "second", "re: second", "third", "re: third"]
    );
    let active = service.active_id().await.unwrap();
    assert!(conversations.iter().any(|c| c.id == active));
    assert!(repository.attempts.load(Ordering::SeqCst) > 0);

    assert_eq!(service.delete_many(&[active, "missing".to_string()]).await, 1);
    assert!(service.conversations().await.is_empty());
}

#[tokio::test]
async fn test_bulk_delete_counts_conversations_removed_from_store() {
    let h = harness(Locale::En);
    let known = h.service.new_conversation().await;

    // Written by another process; this service has never seen it.
    let foreign = Conversation::seeded(Locale::En);
    h.repository.stored.lock().unwrap().push(foreign.clone());

    let removed = h
        .service
        .delete_many(&[known.id.clone(), foreign.id.clone(), "missing".to_string()])
        .await;
    assert_eq!(removed, 2);
    assert!(h.repository.ids().is_empty());
}
