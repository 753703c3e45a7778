#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{Arc, Mutex},
};

use trec::{Dispatch, LiveEvent, LiveFeed, LiveUser, StreamStatus, TrecResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect,
    FetchLive,
    FetchUserIds,
    Subscribe(String),
    NextEvent,
    Dispatch(String),
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

/// A feed that behaves like the platform: notifications are only delivered
/// for users whose subscription was active when the notification was sent.
#[derive(Default)]
pub struct ScriptedFeed {
    /// Returned from `fetch_live`.
    pub snapshot: Vec<StreamStatus>,
    /// login -> user id, for `fetch_user_ids`.
    pub ids: HashMap<String, String>,
    /// Sent by the platform while the snapshot is being fetched.
    pub during_snapshot: Vec<LiveUser>,
    /// Sent by the platform after startup.
    pub later: Vec<LiveUser>,
    pub fail_connect: bool,

    pub calls: CallLog,
    subscribed: HashSet<String>,
    delivered: VecDeque<LiveUser>,
    started: bool,
}

impl ScriptedFeed {
    pub fn new(calls: CallLog) -> Self {
        Self {
            calls,
            ..Default::default()
        }
    }

    pub fn user_id(mut self, login: &str, id: &str) -> Self {
        self.ids.insert(login.to_string(), id.to_string());
        self
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn emit(&mut self, users: Vec<LiveUser>) {
        for user in users {
            if self.subscribed.contains(&user.id) {
                self.delivered.push_back(user);
            }
        }
    }
}

impl LiveFeed for ScriptedFeed {
    async fn connect(&mut self) -> TrecResult<()> {
        self.record(Call::Connect);
        if self.fail_connect {
            return Err(anyhow::anyhow!("authentication failed").into());
        }
        Ok(())
    }

    async fn fetch_live(&self, _logins: &[String]) -> TrecResult<Vec<StreamStatus>> {
        self.record(Call::FetchLive);
        Ok(self.snapshot.clone())
    }

    async fn fetch_user_ids(&self, logins: &[String]) -> TrecResult<Vec<String>> {
        self.record(Call::FetchUserIds);
        Ok(logins
            .iter()
            .filter_map(|login| self.ids.get(login).cloned())
            .collect())
    }

    async fn subscribe(&mut self, user_id: &str) -> TrecResult<()> {
        if !self.started {
            // Everything sent before the first subscription happened while
            // the snapshot was being taken.
            self.started = true;
            let early = std::mem::take(&mut self.during_snapshot);
            self.emit(early);
        }

        self.record(Call::Subscribe(user_id.to_string()));
        self.subscribed.insert(user_id.to_string());
        Ok(())
    }

    async fn next_event(&mut self) -> TrecResult<Option<LiveUser>> {
        self.record(Call::NextEvent);
        if !self.later.is_empty() {
            let later = std::mem::take(&mut self.later);
            self.emit(later);
        }
        Ok(self.delivered.pop_front())
    }
}

pub struct RecordingDispatch {
    pub calls: CallLog,
    pub events: Mutex<Vec<LiveEvent>>,
}

impl RecordingDispatch {
    pub fn new(calls: CallLog) -> Self {
        Self {
            calls,
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .map(|event| event.user_name.clone())
            .collect()
    }
}

impl Dispatch for RecordingDispatch {
    fn dispatch(&self, event: LiveEvent) {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Dispatch(event.user_name.clone()));
        self.events.lock().unwrap().push(event);
    }
}

pub fn user(id: &str, name: &str) -> LiveUser {
    LiveUser {
        id: id.to_string(),
        name: Some(name.to_string()),
    }
}

pub fn live(id: &str, name: &str) -> StreamStatus {
    StreamStatus {
        user: user(id, name),
        live: true,
    }
}

pub fn offline(id: &str, name: &str) -> StreamStatus {
    StreamStatus {
        user: user(id, name),
        live: false,
    }
}

pub fn event(id: &str, name: &str) -> LiveEvent {
    LiveEvent {
        user_id: id.to_string(),
        user_name: name.to_string(),
    }
}
