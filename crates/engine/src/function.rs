//! Callable program functions
//!
//! Every member the toolkit can patch is a [`Function`]. Calling one yields a
//! [`Call`]: either the finished return value, or a future when some part of
//! the call is still waiting on an asynchronous step.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::future::BoxFuture;

use crate::error::ProgramError;
use crate::value::{Args, Value};

/// Future returned by a call that suspended
pub type CallFuture = BoxFuture<'static, Result<Value, ProgramError>>;

/// Outcome of invoking a function
pub enum Call {
    /// The call ran to completion
    Ready(Value),
    /// The call is suspended until the future resolves
    Pending(CallFuture),
}

impl Call {
    /// Completed call returning `value`
    pub fn ready(value: impl Into<Value>) -> Self {
        Call::Ready(value.into())
    }

    /// Completed call returning nothing
    pub fn empty() -> Self {
        Call::Ready(Value::Null)
    }

    /// Poll a future once and keep it only if it did not finish
    ///
    /// A future that completes on its first poll turns into [`Call::Ready`],
    /// so callers keep running synchronously when no step actually waits.
    pub fn poll_now(mut future: CallFuture) -> Result<Call, ProgramError> {
        let mut cx = Context::from_waker(futures::task::noop_waker_ref());
        match future.as_mut().poll(&mut cx) {
            Poll::Ready(Ok(value)) => Ok(Call::Ready(value)),
            Poll::Ready(Err(e)) => Err(e),
            Poll::Pending => Ok(Call::Pending(future)),
        }
    }

    /// Whether the call already completed
    pub fn is_ready(&self) -> bool {
        matches!(self, Call::Ready(_))
    }

    /// The return value, or `None` if the call is still pending
    pub fn into_ready(self) -> Option<Value> {
        match self {
            Call::Ready(value) => Some(value),
            Call::Pending(_) => None,
        }
    }

    /// Convert into a future regardless of state
    pub fn into_future(self) -> CallFuture {
        match self {
            Call::Ready(value) => Box::pin(futures::future::ready(Ok(value))),
            Call::Pending(future) => future,
        }
    }

    /// Block the current thread until the call completes
    ///
    /// # Warning
    /// Never call this from inside a frame callback: a call waiting on a timer
    /// only resumes when the next frame runs.
    pub fn wait(self) -> Result<Value, ProgramError> {
        match self {
            Call::Ready(value) => Ok(value),
            Call::Pending(future) => futures::executor::block_on(future),
        }
    }
}

impl fmt::Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Call::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Call::Pending(_) => f.write_str("Pending"),
        }
    }
}

/// Anything that can sit in a function slot
pub trait Callable: Send + Sync {
    fn call(&self, args: Args) -> Result<Call, ProgramError>;
}

/// How a function came to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// Plain synchronous body
    Native,
    /// Body returning a future
    Async,
    /// Hook pipeline installed by the toolkit
    Composed,
    /// Start-up entry point wrapped by bootstrap
    Bootstrap,
}

struct SyncBody<F>(F);

impl<F> Callable for SyncBody<F>
where
    F: Fn(Args) -> Result<Value, ProgramError> + Send + Sync,
{
    fn call(&self, args: Args) -> Result<Call, ProgramError> {
        (self.0)(args).map(Call::Ready)
    }
}

struct AsyncBody<F>(F);

impl<F, Fut> Callable for AsyncBody<F>
where
    F: Fn(Args) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, ProgramError>> + Send + 'static,
{
    fn call(&self, args: Args) -> Result<Call, ProgramError> {
        Call::poll_now(Box::pin((self.0)(args)))
    }
}

/// Shared handle to a callable program function
#[derive(Clone)]
pub struct Function {
    inner: Arc<dyn Callable>,
    kind: FunctionKind,
}

impl Function {
    /// Wrap a synchronous body
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(Args) -> Result<Value, ProgramError> + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(SyncBody(body)),
            kind: FunctionKind::Native,
        }
    }

    /// Wrap a body returning a future
    pub fn new_async<F, Fut>(body: F) -> Self
    where
        F: Fn(Args) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ProgramError>> + Send + 'static,
    {
        Self {
            inner: Arc::new(AsyncBody(body)),
            kind: FunctionKind::Async,
        }
    }

    /// Wrap an arbitrary callable
    pub fn from_callable(kind: FunctionKind, callable: Arc<dyn Callable>) -> Self {
        Self {
            inner: callable,
            kind,
        }
    }

    /// Invoke the function
    pub fn call(&self, args: Args) -> Result<Call, ProgramError> {
        self.inner.call(args)
    }

    /// How the function was built
    pub fn kind(&self) -> FunctionKind {
        self.kind
    }

    /// Whether both handles point at the same function
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("kind", &self.kind)
            .field("ptr", &Arc::as_ptr(&self.inner).cast::<()>())
            .finish()
    }
}

/// Future that stays pending for one poll, for tests of suspended calls
#[doc(hidden)]
pub struct YieldOnce(bool);

impl YieldOnce {
    pub fn new() -> Self {
        YieldOnce(false)
    }
}

impl Default for YieldOnce {
    fn default() -> Self {
        Self::new()
    }
}

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sync_function() {
        let add_one = Function::new(|args| {
            let x = args.first().and_then(Value::as_i64).unwrap_or(0);
            Ok(json!(x + 1))
        });

        assert_eq!(add_one.kind(), FunctionKind::Native);
        let call = add_one.call(vec![json!(41)]).unwrap();
        assert!(call.is_ready());
        assert_eq!(call.into_ready(), Some(json!(42)));
    }

    #[test]
    fn test_async_function_completing_immediately_is_ready() {
        let f = Function::new_async(|args| async move { Ok(json!(args.len())) });

        let call = f.call(vec![json!(1), json!(2)]).unwrap();
        assert!(call.is_ready());
        assert_eq!(call.wait().unwrap(), json!(2));
    }

    #[test]
    fn test_async_function_suspending_is_pending() {
        let f = Function::new_async(|_| async {
            YieldOnce::new().await;
            Ok(json!("done"))
        });

        let call = f.call(vec![]).unwrap();
        assert!(!call.is_ready());
        assert_eq!(call.wait().unwrap(), json!("done"));
    }

    #[test]
    fn test_errors_propagate() {
        let f = Function::new(|_| Err(ProgramError::failed("boom")));
        let err = f.call(vec![]).unwrap_err();
        assert_eq!(err.to_string(), "boom");

        let g = Function::new_async(|_| async { Err(ProgramError::failed("late boom")) });
        assert!(g.call(vec![]).is_err());
    }

    #[test]
    fn test_ptr_eq() {
        let f = Function::new(|_| Ok(Value::Null));
        let g = f.clone();
        let h = Function::new(|_| Ok(Value::Null));
        assert!(f.ptr_eq(&g));
        assert!(!f.ptr_eq(&h));
    }
}
