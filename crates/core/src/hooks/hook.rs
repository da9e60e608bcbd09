//! Hook bodies
//!
//! Whether a hook may suspend is chosen when it is registered, never inferred.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use hackkit_engine::{Args, Call, CallFuture, ProgramError, Value};

/// Body of a synchronous hook
pub type SyncHookFn = dyn Fn(Args) -> Result<Value, ProgramError> + Send + Sync;

/// Body of an asynchronous hook
pub type AsyncHookFn = dyn Fn(Args) -> CallFuture + Send + Sync;

/// A function run before or after a target
///
/// Returning a non-empty value replaces the arguments of the next stage.
/// Returning `null` or `[]` leaves them as they were.
#[derive(Clone)]
pub enum Hook {
    /// Runs to completion when invoked
    Sync(Arc<SyncHookFn>),
    /// Returns a future; later stages wait until it resolves
    Async(Arc<AsyncHookFn>),
}

impl Hook {
    /// Create a synchronous hook
    pub fn sync<F>(body: F) -> Self
    where
        F: Fn(Args) -> Result<Value, ProgramError> + Send + Sync + 'static,
    {
        Hook::Sync(Arc::new(body))
    }

    /// Create an asynchronous hook
    pub fn async_fn<F, Fut>(body: F) -> Self
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ProgramError>> + Send + 'static,
    {
        Hook::Async(Arc::new(move |args| Box::pin(body(args)) as CallFuture))
    }

    /// Whether the hook may suspend
    pub fn is_async(&self) -> bool {
        matches!(self, Hook::Async(_))
    }

    /// Wrap the hook so `map` reshapes its arguments first
    pub fn map_args<M>(self, map: M) -> Hook
    where
        M: Fn(Args) -> Args + Send + Sync + 'static,
    {
        match self {
            Hook::Sync(body) => Hook::Sync(Arc::new(move |args| body(map(args)))),
            Hook::Async(body) => Hook::Async(Arc::new(move |args| body(map(args)))),
        }
    }

    /// Run the hook
    ///
    /// An async body is polled once; if it finishes right away the result is
    /// already [`Call::Ready`].
    pub fn invoke(&self, args: Args) -> Result<Call, ProgramError> {
        match self {
            Hook::Sync(body) => body(args).map(Call::Ready),
            Hook::Async(body) => Call::poll_now(body(args)),
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::Sync(_) => f.write_str("Hook::Sync"),
            Hook::Async(_) => f.write_str("Hook::Async"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hackkit_engine::function::YieldOnce;
    use serde_json::json;

    #[test]
    fn test_sync_hook() {
        let hook = Hook::sync(|args| Ok(json!(args.len())));
        assert!(!hook.is_async());
        let call = hook.invoke(vec![json!(1), json!(2)]).unwrap();
        assert_eq!(call.into_ready(), Some(json!(2)));
    }

    #[test]
    fn test_async_hook_ready_without_waiting() {
        let hook = Hook::async_fn(|_| async { Ok(json!("now")) });
        assert!(hook.is_async());
        assert_eq!(hook.invoke(vec![]).unwrap().into_ready(), Some(json!("now")));
    }

    #[test]
    fn test_async_hook_suspends() {
        let hook = Hook::async_fn(|_| async {
            YieldOnce::new().await;
            Ok(json!("later"))
        });
        let call = hook.invoke(vec![]).unwrap();
        assert!(!call.is_ready());
        assert_eq!(call.wait().unwrap(), json!("later"));
    }

    #[test]
    fn test_map_args() {
        let hook = Hook::sync(|args| Ok(json!(args))).map_args(|mut args| {
            args.reverse();
            args
        });
        let call = hook.invoke(vec![json!(1), json!(2)]).unwrap();
        assert_eq!(call.into_ready(), Some(json!([2, 1])));

        let hook = Hook::async_fn(|args| async move { Ok(json!(args.len())) })
            .map_args(|_| vec![Value::Null; 3]);
        assert_eq!(hook.invoke(vec![]).unwrap().wait().unwrap(), json!(3));
    }

    #[test]
    fn test_debug() {
        assert_eq!(format!("{:?}", Hook::sync(|_| Ok(Value::Null))), "Hook::Sync");
    }
}
