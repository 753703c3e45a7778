use std::collections::BTreeSet;

/// Logins being watched. Duplicates collapse and logins are lowercased, as the
/// platform treats them case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchTargets(BTreeSet<String>);

impl WatchTargets {
    pub fn new<I, S>(logins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            logins
                .into_iter()
                .map(|login| login.as_ref().trim().to_lowercase())
                .filter(|login| !login.is_empty())
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn logins(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

/// A user as reported by the platform. `name` is the login used to build the
/// stream URL; the platform occasionally leaves it empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveUser {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamStatus {
    pub user: LiveUser,
    pub live: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveEvent {
    pub user_id: String,
    pub user_name: String,
}

impl TryFrom<LiveUser> for LiveEvent {
    type Error = LiveUser;

    fn try_from(user: LiveUser) -> Result<Self, Self::Error> {
        match user.name {
            Some(ref name) if !name.is_empty() => Ok(Self {
                user_name: name.clone(),
                user_id: user.id,
            }),
            _ => Err(user),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_targets_dedup() {
        let targets = WatchTargets::new(["Alice", "alice", " bob ", ""]);
        assert_eq!(targets.len(), 2);
        assert_eq!(targets.logins(), vec!["alice", "bob"]);
    }

    #[test]
    fn test_live_event_requires_name() {
        let user = LiveUser {
            id: "1".to_string(),
            name: Some(String::new()),
        };
        assert!(LiveEvent::try_from(user).is_err());

        let user = LiveUser {
            id: "2".to_string(),
            name: None,
        };
        assert!(LiveEvent::try_from(user).is_err());

        let user = LiveUser {
            id: "3".to_string(),
            name: Some("carol".to_string()),
        };
        let event = LiveEvent::try_from(user).unwrap();
        assert_eq!(event.user_id, "3");
        assert_eq!(event.user_name, "carol");
    }
}
