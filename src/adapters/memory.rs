use crate::domain::model::{ConnectionParams, ObjectKind};
use crate::domain::ports::{BusinessObject, Company};
use crate::utils::error::{Result, UpdaterError};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Remote system held in memory.
///
/// Clones share state, so a test can keep one clone for inspection while the
/// engine owns another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCompany {
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    connected: bool,
    login_rejection: Option<String>,
    last_error: String,
    items: HashMap<String, Map<String, Value>>,
    commit_rejections: HashMap<String, (i32, String)>,
    broken_loads: HashSet<String>,
    login_attempts: usize,
    logouts: usize,
    loads: Vec<String>,
    commits: Vec<(String, Map<String, Value>)>,
}

fn lock(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl InMemoryCompany {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(self, code: &str) -> Self {
        lock(&self.state).items.insert(code.to_string(), Map::new());
        self
    }

    pub fn reject_login(self, message: &str) -> Self {
        lock(&self.state).login_rejection = Some(message.to_string());
        self
    }

    /// The item loads but its commit is refused with `status` and `message`.
    pub fn reject_commit(self, code: &str, status: i32, message: &str) -> Self {
        {
            let mut state = lock(&self.state);
            state.items.entry(code.to_string()).or_default();
            state
                .commit_rejections
                .insert(code.to_string(), (status, message.to_string()));
        }
        self
    }

    /// Loading this item fails as if the transport broke.
    pub fn break_load(self, code: &str) -> Self {
        lock(&self.state).broken_loads.insert(code.to_string());
        self
    }

    pub fn login_attempts(&self) -> usize {
        lock(&self.state).login_attempts
    }

    pub fn logouts(&self) -> usize {
        lock(&self.state).logouts
    }

    pub fn loads(&self) -> Vec<String> {
        lock(&self.state).loads.clone()
    }

    /// Committed changes in commit order.
    pub fn commits(&self) -> Vec<(String, Map<String, Value>)> {
        lock(&self.state).commits.clone()
    }

    pub fn item(&self, code: &str) -> Option<Map<String, Value>> {
        lock(&self.state).items.get(code).cloned()
    }
}

#[async_trait]
impl Company for InMemoryCompany {
    type Object = InMemoryObject;

    fn is_connected(&self) -> bool {
        lock(&self.state).connected
    }

    async fn connect(&mut self, _params: &ConnectionParams) -> Result<i32> {
        let mut state = lock(&self.state);
        state.login_attempts += 1;

        match state.login_rejection.clone() {
            Some(message) => {
                state.last_error = message;
                Ok(-4008)
            }
            None => {
                state.connected = true;
                Ok(0)
            }
        }
    }

    fn business_object(&self, kind: ObjectKind) -> Result<InMemoryObject> {
        if !self.is_connected() {
            return Err(UpdaterError::NotConnected);
        }
        Ok(InMemoryObject {
            state: Arc::clone(&self.state),
            kind,
            key: None,
            pending: Map::new(),
        })
    }

    fn last_error_description(&self) -> String {
        lock(&self.state).last_error.clone()
    }

    async fn disconnect(&mut self) -> Result<()> {
        let mut state = lock(&self.state);
        if state.connected {
            state.connected = false;
            state.logouts += 1;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct InMemoryObject {
    state: Arc<Mutex<State>>,
    kind: ObjectKind,
    key: Option<String>,
    pending: Map<String, Value>,
}

impl InMemoryObject {
    fn loaded_key(&self) -> Result<&str> {
        self.key.as_deref().ok_or_else(|| UpdaterError::ProcessingError {
            message: format!("no {} loaded", self.kind.entity_set()),
        })
    }
}

#[async_trait]
impl BusinessObject for InMemoryObject {
    async fn load_by_key(&mut self, key: &str) -> Result<bool> {
        let mut state = lock(&self.state);
        if !state.connected {
            return Err(UpdaterError::NotConnected);
        }
        state.loads.push(key.to_string());

        if state.broken_loads.contains(key) {
            return Err(UpdaterError::ProcessingError {
                message: format!("connection reset while loading [{}]", key),
            });
        }

        if state.items.contains_key(key) {
            self.key = Some(key.to_string());
            self.pending.clear();
            Ok(true)
        } else {
            self.key = None;
            state.last_error = format!("No matching records found for [{}]", key);
            Ok(false)
        }
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<()> {
        self.loaded_key()?;
        self.pending.insert(name.to_string(), value);
        Ok(())
    }

    async fn commit(&mut self) -> Result<i32> {
        let key = self.loaded_key()?.to_string();
        let mut state = lock(&self.state);

        if let Some((status, message)) = state.commit_rejections.get(&key).cloned() {
            state.last_error = message;
            return Ok(status);
        }

        let changes = std::mem::take(&mut self.pending);
        if let Some(fields) = state.items.get_mut(&key) {
            fields.extend(changes.clone());
        }
        state.commits.push((key, changes));
        Ok(0)
    }
}
