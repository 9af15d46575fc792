//! Host value object - one entry of an environment's host list
//!
//! Accepted forms: `host`, `user@host`, `host:port`, `user@host:port`.
//! IPv6 addresses take a port only in brackets (`[::1]:2222`); a bare
//! address with several colons has no port.

use std::fmt;
use std::str::FromStr;

use crate::error::HoistError;

/// A remote machine the pipeline runs against
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostTarget {
    user: Option<String>,
    host: String,
    port: Option<u16>,
}

impl HostTarget {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            user: None,
            host: host.into(),
            port: None,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Login destination for ssh/rsync (`user@host`).
    ///
    /// A user embedded in the host entry wins over the environment's default user.
    pub fn destination(&self, default_user: Option<&str>) -> String {
        match self.user.as_deref().or(default_user) {
            Some(user) => format!("{}@{}", user, self.host),
            None => self.host.clone(),
        }
    }
}

impl FromStr for HostTarget {
    type Err = HoistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |message: &str| HoistError::InvalidConfig {
            file: "hosts".into(),
            message: format!("host '{}': {}", s, message),
        };

        let s = s.trim();
        let (user, rest) = match s.split_once('@') {
            Some((user, rest)) if !user.is_empty() => (Some(user.to_string()), rest),
            Some(_) => return Err(invalid("empty user")),
            None => (None, s),
        };

        let parse_port = |port: &str| {
            port.parse::<u16>()
                .map_err(|_| invalid("port is not a number"))
        };

        let (host, port) = if let Some(bracketed) = rest.strip_prefix('[') {
            let (host, tail) = bracketed
                .split_once(']')
                .ok_or_else(|| invalid("unclosed '['"))?;
            let port = match tail {
                "" => None,
                _ => match tail.strip_prefix(':') {
                    Some(port) => Some(parse_port(port)?),
                    None => return Err(invalid("unexpected text after ']'")),
                },
            };
            (host, port)
        } else if rest.matches(':').count() > 1 {
            (rest, None)
        } else {
            match rest.split_once(':') {
                Some((host, port)) => (host, Some(parse_port(port)?)),
                None => (rest, None),
            }
        };

        if host.is_empty() {
            return Err(invalid("empty host name"));
        }

        Ok(Self {
            user,
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for HostTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(user) = &self.user {
            write!(f, "{}@", user)?;
        }
        match self.port {
            Some(port) if self.host.contains(':') => write!(f, "[{}]:{}", self.host, port),
            Some(port) => write!(f, "{}:{}", self.host, port),
            None => write!(f, "{}", self.host),
        }
    }
}
