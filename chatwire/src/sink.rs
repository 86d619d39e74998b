//! Consumer side of the driving loop.

use crate::error::StreamError;

/// Receives the events of one stream.
///
/// [`pump`](crate::pump()) guarantees that exactly one of
/// [`on_done`](Self::on_done) or [`on_error`](Self::on_error) is called,
/// and that it is the last call.
pub trait EventSink {
    /// A non-empty content fragment, in arrival order.
    fn on_token(&mut self, text: &str);

    /// The stream completed, with or without an explicit `[DONE]`.
    fn on_done(&mut self);

    /// The stream failed.
    fn on_error(&mut self, error: StreamError);
}

type TokenFn<'a> = Box<dyn FnMut(&str) + Send + 'a>;
type DoneFn<'a> = Box<dyn FnMut() + Send + 'a>;
type ErrorFn<'a> = Box<dyn FnMut(StreamError) + Send + 'a>;

/// Closure-based [`EventSink`]. Unset callbacks do nothing.
///
/// # Example
///
/// ```
/// use chatwire::{EventSink, Handlers};
///
/// let mut out = String::new();
/// {
///     let mut handlers = Handlers::new().with_token(|t| out.push_str(t));
///     handlers.on_token("hi");
///     handlers.on_done();
/// }
/// assert_eq!(out, "hi");
/// ```
pub struct Handlers<'a> {
    token: TokenFn<'a>,
    done: DoneFn<'a>,
    error: ErrorFn<'a>,
}

impl<'a> Handlers<'a> {
    /// Handlers that ignore every event.
    #[must_use]
    pub fn new() -> Self {
        Self {
            token: Box::new(|_| {}),
            done: Box::new(|| {}),
            error: Box::new(|_| {}),
        }
    }

    /// Set the token callback.
    #[must_use]
    pub fn with_token(mut self, f: impl FnMut(&str) + Send + 'a) -> Self {
        self.token = Box::new(f);
        self
    }

    /// Set the completion callback.
    #[must_use]
    pub fn with_done(mut self, f: impl FnMut() + Send + 'a) -> Self {
        self.done = Box::new(f);
        self
    }

    /// Set the failure callback.
    #[must_use]
    pub fn with_error(mut self, f: impl FnMut(StreamError) + Send + 'a) -> Self {
        self.error = Box::new(f);
        self
    }
}

impl Default for Handlers<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for Handlers<'_> {
    fn on_token(&mut self, text: &str) {
        (self.token)(text);
    }

    fn on_done(&mut self) {
        (self.done)();
    }

    fn on_error(&mut self, error: StreamError) {
        (self.error)(error);
    }
}

impl<K: EventSink + ?Sized> EventSink for &mut K {
    fn on_token(&mut self, text: &str) {
        (**self).on_token(text);
    }

    fn on_done(&mut self) {
        (**self).on_done();
    }

    fn on_error(&mut self, error: StreamError) {
        (**self).on_error(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_handlers_ignore_everything() {
        let mut handlers = Handlers::default();
        handlers.on_token("x");
        handlers.on_done();
        handlers.on_error(StreamError::Cancelled);
    }

    #[test]
    fn callbacks_receive_events() {
        let mut text = String::new();
        let mut done = 0;
        let mut errors = Vec::new();
        {
            let mut handlers = Handlers::new()
                .with_token(|t| text.push_str(t))
                .with_done(|| done += 1)
                .with_error(|e| errors.push(e));
            handlers.on_token("a");
            handlers.on_token("b");
            handlers.on_done();
            handlers.on_error(StreamError::Protocol("[ERROR]x".into()));
        }
        assert_eq!(text, "ab");
        assert_eq!(done, 1);
        assert_eq!(errors, vec![StreamError::Protocol("[ERROR]x".into())]);
    }
}
