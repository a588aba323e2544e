use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use async_trait::async_trait;

use crate::{GenerateRequest, Oracle, OracleError, OracleReply};

#[derive(Debug, Clone)]
pub enum ScriptStep {
    Reply(OracleReply),
    Fail(String),
    /// Sleeps before answering with the inner step.
    Delayed(Duration, Box<ScriptStep>),
}

impl From<OracleReply> for ScriptStep {
    fn from(reply: OracleReply) -> Self {
        ScriptStep::Reply(reply)
    }
}

/// Oracle that answers from a fixed script, one step per call, in order.
///
/// Every request is recorded so callers can inspect what the pipeline asked.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    steps: Mutex<VecDeque<ScriptStep>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedOracle {
    pub fn new<I, S>(steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ScriptStep>,
    {
        Self {
            steps: Mutex::new(steps.into_iter().map(Into::into).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        lock(&self.requests).clone()
    }

    pub fn remaining(&self) -> usize {
        lock(&self.steps).len()
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    async fn generate(&self, request: &GenerateRequest) -> Result<OracleReply, OracleError> {
        lock(&self.requests).push(request.clone());
        let step = lock(&self.steps).pop_front();
        let Some(mut step) = step else {
            return Err(OracleError::Unavailable("script exhausted".to_string()));
        };

        loop {
            match step {
                ScriptStep::Reply(reply) => return Ok(reply),
                ScriptStep::Fail(reason) => return Err(OracleError::Unavailable(reason)),
                ScriptStep::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    step = *inner;
                }
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
