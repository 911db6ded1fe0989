//! Closure-based handler.

use async_trait::async_trait;

use crate::{
    error::{BoxError, StreamError},
    sse::{handler::StreamHandler, parse::RawEvent},
};

/// Decides whether the session continues after an escalated error.
pub trait ErrorHandler: Send {
    /// `Ok(())` keeps retrying, `Err(e)` stops the session with `e`.
    fn handle(&mut self, error: StreamError) -> Result<(), StreamError>;
}

impl<F> ErrorHandler for F
where
    F: FnMut(StreamError) -> Result<(), StreamError> + Send,
{
    fn handle(&mut self, error: StreamError) -> Result<(), StreamError> {
        self(error)
    }
}

/// Common error handling decisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Absorb every error and keep reconnecting.
    ReconnectOnError,
    /// Stop at the first escalated error.
    StopOnError,
}

impl ErrorHandler for ErrorPolicy {
    fn handle(&mut self, error: StreamError) -> Result<(), StreamError> {
        match self {
            Self::ReconnectOnError => Ok(()),
            Self::StopOnError => Err(error),
        }
    }
}

/// A [`StreamHandler`] made of an event closure and an [`ErrorHandler`].
pub struct FnHandler<F, R> {
    on_event: F,
    on_error: R,
}

/// Build a handler from an event closure and an error handler.
///
/// ```rust
/// use jobstream::sse::handlers::{ErrorPolicy, handler_fn};
///
/// let mut seen = Vec::new();
/// let _handler = handler_fn(
///     move |event: jobstream::RawEvent| {
///         seen.push(event.data().to_string());
///         Ok(())
///     },
///     ErrorPolicy::StopOnError,
/// );
/// ```
pub fn handler_fn<F, R>(on_event: F, on_error: R) -> FnHandler<F, R>
where
    F: FnMut(RawEvent) -> Result<(), BoxError> + Send,
    R: ErrorHandler,
{
    FnHandler { on_event, on_error }
}

#[async_trait]
impl<F, R> StreamHandler for FnHandler<F, R>
where
    F: FnMut(RawEvent) -> Result<(), BoxError> + Send,
    R: ErrorHandler,
{
    async fn on_event(&mut self, event: RawEvent) -> Result<(), BoxError> {
        (self.on_event)(event)
    }

    async fn on_error(&mut self, error: StreamError) -> Result<(), StreamError> {
        self.on_error.handle(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policies() {
        let err = || StreamError::protocol_status(http::StatusCode::NOT_FOUND);
        assert!(ErrorPolicy::ReconnectOnError.handle(err()).is_ok());

        let stopped = ErrorPolicy::StopOnError.handle(err()).expect_err("should stop");
        assert_eq!(stopped.status(), Some(http::StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_fn_handler_forwards_to_closures() {
        let mut events = Vec::new();
        let mut errors = 0;
        {
            let mut handler = handler_fn(
                |event: RawEvent| {
                    events.push(event.data().to_string());
                    Ok(())
                },
                |_err: StreamError| -> Result<(), StreamError> {
                    errors += 1;
                    Ok(())
                },
            );

            handler.on_event(RawEvent::from("one")).await.expect("event");
            handler.on_event(RawEvent::from("two")).await.expect("event");
            handler
                .on_error(StreamError::malformed("partial line"))
                .await
                .expect("absorbed");
        }
        assert_eq!(events, vec!["one", "two"]);
        assert_eq!(errors, 1);
    }

    #[tokio::test]
    async fn test_fn_handler_event_error() {
        let mut handler = handler_fn(
            |_event: RawEvent| Err("rejected".into()),
            ErrorPolicy::StopOnError,
        );
        let err = handler.on_event(RawEvent::from("x")).await.expect_err("fails");
        assert_eq!(err.to_string(), "rejected");
    }
}
