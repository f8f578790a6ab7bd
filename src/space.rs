//! Space context and the guard that enforces it.
//!
//! A [`SpaceContext`] describes which spaces the caller is working in: every
//! space, or an explicit set. The [`SpaceGuard`] consults the context before
//! space-sensitive work:
//!
//! - mutating actions on an existing task are rejected with
//!   [`Error::OutOfScope`] when the task's space is outside the context
//!   (system tasks, which have no space, always pass);
//! - task creation inside a space requires exactly one selected space and
//!   fails with [`Error::AmbiguousSpace`] otherwise;
//! - reads carry the context as a `spaces` query parameter.
//!
//! Every check reads the context at call time through a
//! [`SpaceContextProvider`], so a shared context can be switched without
//! rebuilding the repository.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use octopus_client::{SpaceContext, SpaceGuard, TaskResource};
//!
//! let guard = SpaceGuard::new(Arc::new(SpaceContext::single("Spaces-1")));
//!
//! let mut task = TaskResource::new("Health", "Manual health check");
//! task.space_id = Some("Spaces-1".to_string());
//! assert!(guard.authorize(&task).is_ok());
//!
//! task.space_id = Some("Spaces-2".to_string());
//! assert!(guard.authorize(&task).is_err());
//!
//! assert_eq!(guard.require_single_space().unwrap(), "Spaces-1");
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::transport::QueryParameters;
use crate::types::TaskResource;

/// Query parameter carrying the space context on reads.
pub const SPACES_QUERY_PARAMETER: &str = "spaces";

/// The set of spaces a caller operates in.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SpaceContext {
    /// Every space the caller can see.
    #[default]
    AllSpaces,
    /// An explicit, ordered set of space ids without duplicates.
    Specific(Vec<String>),
}

impl SpaceContext {
    /// Context spanning every space.
    pub fn all_spaces() -> Self {
        Self::AllSpaces
    }

    /// Context over an explicit set of spaces. Duplicates are dropped, first
    /// occurrence wins.
    pub fn specific<I, S>(space_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ids: Vec<String> = Vec::new();
        for id in space_ids.into_iter().map(Into::into) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Self::Specific(ids)
    }

    /// Context over exactly one space.
    pub fn single(space_id: impl Into<String>) -> Self {
        Self::Specific(vec![space_id.into()])
    }

    /// Returns `true` if `space_id` is inside this context.
    pub fn contains(&self, space_id: &str) -> bool {
        match self {
            Self::AllSpaces => true,
            Self::Specific(ids) => ids.iter().any(|id| id == space_id),
        }
    }

    /// The explicitly selected spaces, or `None` for [`SpaceContext::AllSpaces`].
    pub fn space_ids(&self) -> Option<&[String]> {
        match self {
            Self::AllSpaces => None,
            Self::Specific(ids) => Some(ids),
        }
    }

    /// The one selected space, if exactly one is selected.
    pub fn single_space(&self) -> Option<&str> {
        match self {
            Self::Specific(ids) if ids.len() == 1 => Some(&ids[0]),
            _ => None,
        }
    }

    /// Adds the context to `query` as the `spaces` parameter.
    ///
    /// Specific contexts send comma-joined ids, unrestricted contexts send `all`.
    pub fn apply_space_selection(&self, query: &mut QueryParameters) {
        let value = match self {
            Self::AllSpaces => "all".to_string(),
            Self::Specific(ids) => ids.join(","),
        };
        query.insert(SPACES_QUERY_PARAMETER, value);
    }
}

impl fmt::Display for SpaceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllSpaces => f.write_str("all spaces"),
            Self::Specific(ids) => f.write_str(&ids.join(", ")),
        }
    }
}

/// Source of the current space context.
///
/// Queried on every guarded operation. Implementations must be cheap and
/// must not block.
pub trait SpaceContextProvider: Send + Sync {
    /// The context in effect right now.
    fn current_context(&self) -> SpaceContext;
}

impl SpaceContextProvider for SpaceContext {
    fn current_context(&self) -> SpaceContext {
        self.clone()
    }
}

/// A space context that can be switched while repositories hold it.
///
/// # Examples
///
/// ```
/// use octopus_client::{SharedSpaceContext, SpaceContext, SpaceContextProvider};
///
/// let shared = SharedSpaceContext::new(SpaceContext::AllSpaces);
/// shared.select(SpaceContext::single("Spaces-4"));
/// assert_eq!(shared.current_context(), SpaceContext::single("Spaces-4"));
/// ```
#[derive(Debug, Default)]
pub struct SharedSpaceContext {
    inner: RwLock<SpaceContext>,
}

impl SharedSpaceContext {
    /// Creates a shared context starting at `initial`.
    pub fn new(initial: SpaceContext) -> Self {
        Self {
            inner: RwLock::new(initial),
        }
    }

    /// Replaces the current context.
    pub fn select(&self, context: SpaceContext) {
        tracing::debug!(context = %context, "space context selected");
        *self.inner.write() = context;
    }
}

impl SpaceContextProvider for SharedSpaceContext {
    fn current_context(&self) -> SpaceContext {
        self.inner.read().clone()
    }
}

/// Enforces the current space context on task operations.
#[derive(Clone)]
pub struct SpaceGuard {
    provider: Arc<dyn SpaceContextProvider>,
}

impl fmt::Debug for SpaceGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpaceGuard")
            .field("context", &self.provider.current_context())
            .finish()
    }
}

impl SpaceGuard {
    /// Creates a guard reading its context from `provider`.
    pub fn new(provider: Arc<dyn SpaceContextProvider>) -> Self {
        Self { provider }
    }

    /// The context in effect right now.
    pub fn context(&self) -> SpaceContext {
        self.provider.current_context()
    }

    /// Checks that `task` may be acted on in the current context.
    ///
    /// Tasks without a space are system tasks and always pass.
    pub fn authorize(&self, task: &TaskResource) -> Result<()> {
        let Some(space_id) = task.space_id.as_deref().filter(|s| !s.is_empty()) else {
            return Ok(());
        };

        let context = self.context();
        if context.contains(space_id) {
            return Ok(());
        }

        Err(Error::OutOfScope {
            space_id: space_id.to_string(),
            context: context.to_string(),
        })
    }

    /// Returns the single selected space, or [`Error::AmbiguousSpace`].
    pub fn require_single_space(&self) -> Result<String> {
        let context = self.context();
        match context.single_space() {
            Some(space_id) => Ok(space_id.to_string()),
            None => Err(Error::AmbiguousSpace {
                space_count: context.space_ids().map(<[String]>::len),
                context: context.to_string(),
            }),
        }
    }

    /// Query parameters describing the current context for reads.
    pub fn query_parameters(&self) -> QueryParameters {
        let mut query = QueryParameters::new();
        self.context().apply_space_selection(&mut query);
        query
    }
}
