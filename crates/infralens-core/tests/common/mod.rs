use infralens_core::clock::ManualClock;
use infralens_core::config::NarrativeConfig;
use infralens_core::prompt::Prompt;
use infralens_core::summarize::{BackendError, NarrativeBackend};
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Narrative backend that replays a fixed script of responses.
///
/// Once the script is exhausted every call succeeds with `fallback`.
#[allow(dead_code)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Result<String, BackendError>>>,
    fallback: String,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl ScriptedBackend {
    pub fn new(script: Vec<Result<String, BackendError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: "fallback narrative".to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fails with `RateLimited` `failures` times, then returns `text`
    pub fn rate_limited_then(failures: usize, text: &str) -> Self {
        let mut script: Vec<Result<String, BackendError>> = (0..failures)
            .map(|_| Err(BackendError::RateLimited { retry_after: None }))
            .collect();
        script.push(Ok(text.to_string()));
        Self::new(script)
    }

    pub fn always(error: BackendError) -> Self {
        Self::new(vec![Err(error); 64])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl NarrativeBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    fn generate(&self, _prompt: &Prompt, _config: &NarrativeConfig) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()))
    }
}

#[allow(dead_code)]
pub fn manual_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::default())
}

/// `{ "stacks": { <name>: { "resources": { <id>: { "type": .., <action>: true } } } } }`
#[allow(dead_code)]
pub fn diff(stacks: &[(&str, &[(&str, &str, &str)])]) -> Value {
    let mut stack_map = Map::new();
    for (stack, resources) in stacks {
        let mut resource_map = Map::new();
        for (id, resource_type, action) in resources.iter() {
            let mut body = json!({ "type": resource_type });
            body[*action] = json!(true);
            resource_map.insert(id.to_string(), body);
        }
        stack_map.insert(stack.to_string(), json!({ "resources": resource_map }));
    }
    json!({ "stacks": stack_map })
}

/// `count` resources of `resource_type`, all carrying `action`, spread
/// round-robin over `stacks` stacks
#[allow(dead_code)]
pub fn bulk_diff(count: usize, stacks: usize, resource_type: &str, action: &str) -> Value {
    let mut stack_map = Map::new();
    for i in 0..count {
        let stack = format!("Stack{}", i % stacks);
        let entry = stack_map
            .entry(stack)
            .or_insert_with(|| json!({ "resources": {} }));
        let mut body = json!({ "type": resource_type });
        body[action] = json!(true);
        entry["resources"][format!("Res{:03}", i)] = body;
    }
    json!({ "stacks": stack_map })
}
