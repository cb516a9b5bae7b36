//! In-memory port implementations shared by the core unit tests.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use birdie_types::analysis::{AnalysisRequest, AnalyzeResponse};
use birdie_types::config::Backoff;
use birdie_types::error::{
    AnalysisError, MessagingError, RepositoryError, StorageError, TranscodeError,
};
use birdie_types::message::OutboundMessage;
use birdie_types::portfolio::{DateKey, UserData, UserFolders, WorkEntry, WorkField};
use birdie_types::session::ConversationSession;
use birdie_types::skill::{Handedness, Skill};

use crate::analysis::backend::{AnalysisBackend, AttemptError};
use crate::analysis::client::{AnalysisClient, BUSY_STATUS, RetryPolicy};
use crate::conversation::session::SessionService;
use crate::media::transcoder::Transcoder;
use crate::messaging::platform::MessagingPlatform;
use crate::ports::{Backends, Ports};
use crate::repository::session::SessionRepository;
use crate::repository::user::UserRepository;
use crate::storage::object_store::{ObjectMetadata, ObjectStore, StoredObject};

// ---------------------------------------------------------------------------
// Messaging
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockMessaging {
    pub replies: Mutex<Vec<(String, Vec<OutboundMessage>)>>,
    pub fail_fetch: AtomicBool,
}

impl MockMessaging {
    /// Texts of every reply sent, flattened in order.
    pub fn reply_texts(&self) -> Vec<String> {
        self.replies
            .lock()
            .unwrap()
            .iter()
            .flat_map(|(_, msgs)| msgs.iter())
            .filter_map(|m| match m {
                OutboundMessage::Text { text, .. } => Some(text.clone()),
                OutboundMessage::Video { .. } => None,
            })
            .collect()
    }

    pub fn last_reply(&self) -> Option<Vec<OutboundMessage>> {
        self.replies.lock().unwrap().last().map(|(_, m)| m.clone())
    }

    pub fn reply_count(&self) -> usize {
        self.replies.lock().unwrap().len()
    }
}

impl MessagingPlatform for MockMessaging {
    async fn fetch_content(&self, message_id: &str) -> Result<Vec<u8>, MessagingError> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(MessagingError::Status {
                status: 404,
                body: "not found".into(),
            });
        }
        Ok(format!("raw:{message_id}").into_bytes())
    }

    async fn reply(
        &self,
        reply_token: &str,
        messages: Vec<OutboundMessage>,
    ) -> Result<(), MessagingError> {
        self.replies
            .lock()
            .unwrap()
            .push((reply_token.to_string(), messages));
        Ok(())
    }

    async fn display_name(&self, user_id: &str) -> Result<String, MessagingError> {
        Ok(format!("Player {user_id}"))
    }
}

// ---------------------------------------------------------------------------
// Repositories
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockUserRepository {
    users: Mutex<HashMap<String, UserData>>,
    pub fail_insert: AtomicBool,
}

impl MockUserRepository {
    pub fn with_user(user: UserData) -> Self {
        let repo = Self::default();
        repo.users.lock().unwrap().insert(user.id.clone(), user);
        repo
    }

    pub fn stored(&self, user_id: &str) -> Option<UserData> {
        self.users.lock().unwrap().get(user_id).cloned()
    }
}

impl UserRepository for MockUserRepository {
    async fn get(&self, user_id: &str) -> Result<Option<UserData>, RepositoryError> {
        Ok(self.stored(user_id))
    }

    async fn put(&self, user: &UserData) -> Result<(), RepositoryError> {
        self.users
            .lock()
            .unwrap()
            .insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn set_handedness(
        &self,
        user_id: &str,
        handedness: Handedness,
    ) -> Result<(), RepositoryError> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(user_id).ok_or(RepositoryError::NotFound)?;
        user.handedness = handedness;
        Ok(())
    }

    async fn insert_work_entry(
        &self,
        user_id: &str,
        skill: Skill,
        entry: &WorkEntry,
    ) -> Result<(), RepositoryError> {
        if self.fail_insert.load(Ordering::SeqCst) {
            return Err(RepositoryError::Query("disk full".into()));
        }
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(user_id).ok_or(RepositoryError::NotFound)?;
        user.portfolio.insert(skill, entry.clone());
        Ok(())
    }

    async fn update_work_entry(
        &self,
        user_id: &str,
        skill: Skill,
        date_key: &DateKey,
        field: &WorkField,
    ) -> Result<WorkEntry, RepositoryError> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(user_id).ok_or(RepositoryError::NotFound)?;
        user.portfolio
            .update(skill, date_key, field)
            .map(Clone::clone)
            .map_err(|_| RepositoryError::NotFound)
    }
}

#[derive(Default)]
pub struct MockSessionRepository {
    sessions: Mutex<HashMap<String, ConversationSession>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MockSessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(&self, user_id: &str) -> Option<ConversationSession> {
        self.sessions.lock().unwrap().get(user_id).cloned()
    }

    pub fn seed(&self, session: ConversationSession) {
        self.sessions
            .lock()
            .unwrap()
            .insert(session.user_id.clone(), session);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl SessionRepository for MockSessionRepository {
    async fn get(&self, user_id: &str) -> Result<Option<ConversationSession>, RepositoryError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RepositoryError::Query("corrupt document".into()));
        }
        Ok(self.stored(user_id))
    }

    async fn put(&self, session: &ConversationSession) -> Result<(), RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Query("read-only".into()));
        }
        self.seed(session.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Object store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockObjectStore {
    pub uploads: Mutex<Vec<(String, String, String)>>,
    pub deleted: Mutex<Vec<String>>,
    pub folders: Mutex<Vec<(String, String)>>,
    pub fail_upload: AtomicBool,
    pub fail_folders: AtomicBool,
    /// Metadata calls before a thumbnail link shows up; 0 means never.
    pub thumbnail_after: AtomicU32,
    pub metadata_calls: AtomicU32,
    next_id: AtomicU32,
}

impl MockObjectStore {
    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }
}

impl ObjectStore for MockObjectStore {
    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<StoredObject, StorageError> {
        if self.fail_folders.load(Ordering::SeqCst) {
            return Err(StorageError::Request("unreachable".into()));
        }
        let id = self.next_id("folder");
        self.folders
            .lock()
            .unwrap()
            .push((name.to_string(), parent_id.to_string()));
        Ok(StoredObject {
            link: self.folder_link(&id),
            id,
            name: name.to_string(),
        })
    }

    async fn upload(
        &self,
        parent_id: &str,
        name: &str,
        mime_type: &str,
        _bytes: Vec<u8>,
    ) -> Result<StoredObject, StorageError> {
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(StorageError::Status {
                status: 403,
                body: "quota".into(),
            });
        }
        let id = self.next_id("file");
        self.uploads.lock().unwrap().push((
            parent_id.to_string(),
            name.to_string(),
            mime_type.to_string(),
        ));
        Ok(StoredObject {
            link: format!("https://store.test/{id}"),
            id,
            name: name.to_string(),
        })
    }

    async fn metadata(&self, object_id: &str) -> Result<ObjectMetadata, StorageError> {
        let calls = self.metadata_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let after = self.thumbnail_after.load(Ordering::SeqCst);
        Ok(ObjectMetadata {
            id: object_id.to_string(),
            thumbnail_link: (after > 0 && calls >= after)
                .then(|| format!("https://store.test/{object_id}/thumb")),
        })
    }

    async fn delete(&self, object_id: &str) -> Result<(), StorageError> {
        self.deleted.lock().unwrap().push(object_id.to_string());
        Ok(())
    }

    fn folder_link(&self, folder_id: &str) -> String {
        format!("https://store.test/folders/{folder_id}")
    }
}

// ---------------------------------------------------------------------------
// Transcoder
// ---------------------------------------------------------------------------

/// Copies input to output; a JPEG stub for thumbnails.
#[derive(Default)]
pub struct MockTranscoder {
    pub fail_resize: AtomicBool,
    pub fail_thumbnail: AtomicBool,
}

impl Transcoder for MockTranscoder {
    async fn resize(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        if self.fail_resize.load(Ordering::SeqCst) {
            return Err(TranscodeError::Failed {
                code: Some(1),
                stderr: "invalid data".into(),
            });
        }
        let bytes = tokio::fs::read(input)
            .await
            .map_err(|e| TranscodeError::Io(e.to_string()))?;
        let mut out = b"resized:".to_vec();
        out.extend_from_slice(&bytes);
        tokio::fs::write(output, out)
            .await
            .map_err(|e| TranscodeError::Io(e.to_string()))
    }

    async fn extract_thumbnail(&self, _input: &Path, output: &Path) -> Result<(), TranscodeError> {
        if self.fail_thumbnail.load(Ordering::SeqCst) {
            return Err(TranscodeError::NotAvailable("ffmpeg".into()));
        }
        tokio::fs::write(output, b"jpeg")
            .await
            .map_err(|e| TranscodeError::Io(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Scripted response for one attempt.
#[derive(Clone)]
pub enum Scripted {
    Ok(AnalyzeResponse),
    Busy,
    Status(u16),
    Transport,
}

/// Backend replaying a script; the last entry repeats once exhausted.
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Scripted>>,
    last: Mutex<Option<Scripted>>,
    pub calls: AtomicU32,
    pub requests: Mutex<Vec<(String, Handedness, Skill)>>,
}

impl ScriptedBackend {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: AtomicU32::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn ok_response(score: &str, suggestions: &[&str]) -> AnalyzeResponse {
        AnalyzeResponse {
            skeleton_video: String::new(),
            score: score.to_string(),
            suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl AnalysisBackend for ScriptedBackend {
    async fn analyze_once(&self, request: &AnalysisRequest) -> Result<AnalyzeResponse, AttemptError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push((
            request.filename.clone(),
            request.handedness,
            request.skill,
        ));
        let next = {
            let mut script = self.script.lock().unwrap();
            let mut last = self.last.lock().unwrap();
            match script.pop_front() {
                Some(s) => {
                    *last = Some(s.clone());
                    s
                }
                None => last.clone().unwrap_or(Scripted::Transport),
            }
        };
        match next {
            Scripted::Ok(resp) => Ok(resp),
            Scripted::Busy => Err(AttemptError::Busy {
                status: BUSY_STATUS,
            }),
            Scripted::Status(status) => Err(AttemptError::Fatal(AnalysisError::Status {
                status,
                body: String::new(),
            })),
            Scripted::Transport => Err(AttemptError::Fatal(AnalysisError::Transport(
                "connection refused".into(),
            ))),
        }
    }

    async fn fetch_video(&self, url: &str) -> Result<Vec<u8>, AnalysisError> {
        Ok(format!("remote:{url}").into_bytes())
    }
}

pub fn no_wait() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        delay: Duration::ZERO,
        backoff: Backoff::Fixed,
    }
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

pub struct MockBackends;

impl Backends for MockBackends {
    type Messaging = MockMessaging;
    type Users = MockUserRepository;
    type Sessions = MockSessionRepository;
    type Store = MockObjectStore;
    type Transcoder = MockTranscoder;
    type Analysis = ScriptedBackend;
}

/// A user with every skill folder in place.
pub fn onboarded_user(id: &str) -> UserData {
    let folders = UserFolders {
        root: "root-folder".into(),
        skills: Skill::ALL
            .into_iter()
            .map(|s| (s, format!("folder-{s}")))
            .collect(),
    };
    UserData::new(id, format!("Player {id}"), folders)
}

pub fn mock_ports(user: Option<UserData>, script: Vec<Scripted>) -> Ports<MockBackends> {
    let users = match user {
        Some(user) => MockUserRepository::with_user(user),
        None => MockUserRepository::default(),
    };
    Ports {
        messaging: MockMessaging::default(),
        users,
        sessions: SessionService::new(MockSessionRepository::new()),
        store: MockObjectStore::default(),
        transcoder: MockTranscoder::default(),
        analysis: AnalysisClient::new(ScriptedBackend::new(script), no_wait()),
    }
}
