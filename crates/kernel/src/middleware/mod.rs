//! Request pipeline: interceptors and the builder that orders them.
//!
//! An [`Interceptor`] sees a request and the rest of the chain. It may act
//! before delegating, after delegating, or instead of delegating. A
//! [`Pipeline`] is an explicit list of named stages; the first stage is the
//! outermost one, so for stages `[a, b, c]` around handler `h` the effective
//! handler is `a(b(c(h)))`.
//!
//! Stages declare which other stages must already have run. A pipeline that
//! places a stage outside one of its dependencies is rejected when applied,
//! rather than silently producing a chain that reads state nobody loaded.

pub mod auth;
pub mod csrf;
pub mod headers;
pub mod logging;
pub mod recover;
pub mod session;

pub use auth::{Authenticate, RequestContext, RequireAuthentication};
pub use csrf::{CsrfCheck, CsrfToken};
pub use headers::SecureHeaders;
pub use logging::LogRequest;
pub use recover::RecoverPanic;
pub use session::SessionLifetime;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use thiserror::Error;

/// A request interceptor.
#[async_trait]
pub trait Interceptor: Send + Sync + 'static {
    /// Stage name used for ordering checks and diagnostics.
    fn name(&self) -> &'static str;

    /// Stages that must wrap this one.
    fn requires(&self) -> &'static [&'static str] {
        &[]
    }

    async fn intercept(&self, request: Request, next: Next) -> Response;
}

/// Pipeline construction errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("stage `{stage}` must run inside `{requires}`, but `{requires}` is placed after it")]
    OrderViolation {
        stage: &'static str,
        requires: &'static str,
    },

    #[error("stage `{stage}` requires `{requires}`, which is not in the pipeline")]
    MissingDependency {
        stage: &'static str,
        requires: &'static str,
    },

    #[error("stage `{0}` appears more than once")]
    DuplicateStage(&'static str),
}

type ApplyFn<S> = Box<dyn FnOnce(Router<S>) -> Router<S> + Send>;

struct Stage<S> {
    name: &'static str,
    requires: &'static [&'static str],
    apply: ApplyFn<S>,
}

/// Ordered list of stages wrapped around a router.
pub struct Pipeline<S = ()> {
    stages: Vec<Stage<S>>,
}

impl<S> Default for Pipeline<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Pipeline<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Append an interceptor as the next (inner) stage.
    pub fn interceptor<I: Interceptor>(mut self, interceptor: I) -> Self {
        let name = interceptor.name();
        let requires = interceptor.requires();
        let interceptor: Arc<dyn Interceptor> = Arc::new(interceptor);
        self.stages.push(Stage {
            name,
            requires,
            apply: Box::new(move |router| wrap(router, interceptor)),
        });
        self
    }

    /// Append an arbitrary router transformation as a named stage.
    ///
    /// This is how tower layers such as the session manager take part in
    /// ordering checks.
    pub fn stage<F>(mut self, name: &'static str, requires: &'static [&'static str], apply: F) -> Self
    where
        F: FnOnce(Router<S>) -> Router<S> + Send + 'static,
    {
        self.stages.push(Stage {
            name,
            requires,
            apply: Box::new(apply),
        });
        self
    }

    /// Stage names, outermost first.
    pub fn names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name).collect()
    }

    /// Check ordering. `enclosing` names stages provided by pipelines that
    /// wrap this one.
    pub fn validate(&self, enclosing: &[&'static str]) -> Result<(), PipelineError> {
        for (index, stage) in self.stages.iter().enumerate() {
            if enclosing.contains(&stage.name)
                || self.stages[..index].iter().any(|s| s.name == stage.name)
            {
                return Err(PipelineError::DuplicateStage(stage.name));
            }

            for &requires in stage.requires {
                if self.stages[..index].iter().any(|s| s.name == requires)
                    || enclosing.contains(&requires)
                {
                    continue;
                }
                if self.stages[index + 1..].iter().any(|s| s.name == requires) {
                    return Err(PipelineError::OrderViolation {
                        stage: stage.name,
                        requires,
                    });
                }
                return Err(PipelineError::MissingDependency {
                    stage: stage.name,
                    requires,
                });
            }
        }
        Ok(())
    }

    /// Validate and wrap `router` in every stage.
    pub fn apply(self, router: Router<S>, enclosing: &[&'static str]) -> Result<Router<S>, PipelineError> {
        self.validate(enclosing)?;

        // Router::layer makes the most recent layer outermost, so apply the
        // innermost stage first.
        Ok(self
            .stages
            .into_iter()
            .rev()
            .fold(router, |router, stage| (stage.apply)(router)))
    }
}

/// Wrap a router in a single interceptor.
pub fn wrap<S>(router: Router<S>, interceptor: Arc<dyn Interceptor>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(axum::middleware::from_fn(move |request: Request, next: Next| {
        let interceptor = Arc::clone(&interceptor);
        async move { interceptor.intercept(request, next).await }
    }))
}
