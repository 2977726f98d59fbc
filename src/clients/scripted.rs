use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use crate::clients::traits::{ModelCapability, ModelError};
use crate::contracts::Contract;

/// One `generate` call as the scripted model saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub prompt: String,
    pub contract: &'static str,
    pub temperature: f32,
}

/// Deterministic stand-in for a real model: replays queued responses in
/// order and records every call it receives.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    script: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw text response.
    pub fn respond(self, text: impl Into<String>) -> Self {
        lock(&self.script).push_back(Ok(text.into()));
        self
    }

    /// Queue a JSON response.
    pub fn respond_json(self, value: Value) -> Self {
        self.respond(value.to_string())
    }

    /// Queue a capability failure.
    pub fn fail(self, message: impl Into<String>) -> Self {
        lock(&self.script).push_back(Err(message.into()));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }
}

#[async_trait]
impl ModelCapability for ScriptedModel {
    async fn generate(
        &self,
        prompt: &str,
        contract: &Contract,
        temperature: f32,
    ) -> Result<String, ModelError> {
        lock(&self.calls).push(RecordedCall {
            prompt: prompt.to_string(),
            contract: contract.name,
            temperature,
        });
        match lock(&self.script).pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(ModelError::Script(message)),
            None => Err(ModelError::Script("no scripted response left".to_string())),
        }
    }
}
