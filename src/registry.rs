//! Registry of Active clients
//!
//! Owned by the coordinator. Enforces the two admission rules: usernames
//! are unique among Active clients, and the number of clients never
//! exceeds the configured maximum.

use std::collections::HashMap;

use crate::client::Client;
use crate::error::AdmissionError;
use crate::types::ClientId;

#[derive(Debug)]
pub struct Registry {
    clients: HashMap<ClientId, Client>,
    max_clients: usize,
}

impl Registry {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::with_capacity(max_clients),
            max_clients,
        }
    }

    /// Check whether `username` could be admitted right now
    ///
    /// A taken username is reported before a full registry, so a client
    /// retrying a name in use learns that first.
    pub fn check_admission(&self, username: &str) -> Result<(), AdmissionError> {
        if self.contains_username(username) {
            return Err(AdmissionError::UsernameTaken);
        }
        if self.is_full() {
            return Err(AdmissionError::ServerFull);
        }
        Ok(())
    }

    /// Admit a client, re-checking both rules
    pub fn register(&mut self, client: Client) -> Result<(), AdmissionError> {
        self.check_admission(&client.username)?;
        self.clients.insert(client.id, client);
        Ok(())
    }

    /// Remove a client, returning it only the first time
    pub fn remove(&mut self, id: ClientId) -> Option<Client> {
        self.clients.remove(&id)
    }

    pub fn get(&self, id: ClientId) -> Option<&Client> {
        self.clients.get(&id)
    }

    /// Exact, case-sensitive match
    pub fn contains_username(&self, username: &str) -> bool {
        self.clients.values().any(|c| c.username == username)
    }

    pub fn clients(&self) -> impl Iterator<Item = &Client> {
        self.clients.values()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.clients.len() >= self.max_clients
    }

    pub fn max_clients(&self) -> usize {
        self.max_clients
    }
}
