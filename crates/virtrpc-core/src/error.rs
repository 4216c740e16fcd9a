use core::fmt;

/// An error annotated with a static context string and a typed kind.
///
/// The `context` names the codec entry point or wire item that failed, the
/// `Kind` carries the structured cause, and an optional boxed source
/// preserves the underlying failure for [`Error::report`] to print. The
/// decode, encode and RPC error types of this workspace are all instances of
/// this carrier.
#[derive(Debug)]
pub struct Error<Kind> {
    pub context: &'static str,
    pub kind: Kind,
    source: Option<Box<dyn std::error::Error + Sync + Send>>,
}

impl<Kind> Error<Kind> {
    #[cold]
    #[must_use]
    pub fn new(context: &'static str, kind: Kind) -> Self {
        Self {
            context,
            kind,
            source: None,
        }
    }

    /// Attaches the underlying failure this error wraps.
    #[cold]
    #[must_use]
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Sync + Send + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Returns a helper printing this error along with its source chain,
    /// for log events and the thread-local error slot.
    pub fn report(&self) -> ErrorReport<'_, Kind> {
        ErrorReport(self)
    }
}

impl<Kind> fmt::Display for Error<Kind>
where
    Kind: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.context, self.kind)
    }
}

impl<Kind> std::error::Error for Error<Kind>
where
    Kind: std::error::Error,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        // A source attached to the kind itself takes precedence over one
        // attached to the carrier.
        if let Some(source) = self.kind.source() {
            Some(source)
        } else if let Some(source) = &self.source {
            Some(source.as_ref())
        } else {
            None
        }
    }
}

// Lets the connection layer surface codec failures from its std::io entry
// points without a wrapper of its own.
impl<Kind> From<Error<Kind>> for std::io::Error
where
    Kind: std::error::Error + Send + Sync + 'static,
{
    fn from(error: Error<Kind>) -> Self {
        Self::other(error)
    }
}

/// Displays an [`Error`] followed by every source in its chain.
pub struct ErrorReport<'a, Kind>(&'a Error<Kind>);

impl<Kind> fmt::Display for ErrorReport<'_, Kind>
where
    Kind: std::error::Error,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use std::error::Error as _;

        write!(f, "{}", self.0)?;

        let mut next_source = self.0.source();

        while let Some(e) = next_source {
            write!(f, ", caused by: {e}")?;
            next_source = e.source();
        }

        Ok(())
    }
}

/// Trait for adding a source to an error type.
pub trait WithSource {
    /// Adds a source to the error.
    #[must_use]
    fn with_source<E>(self, source: E) -> Self
    where
        E: std::error::Error + Sync + Send + 'static;
}

impl<T> WithSource for Error<T> {
    fn with_source<E>(self, source: E) -> Self
    where
        E: std::error::Error + Sync + Send + 'static,
    {
        self.with_source(source)
    }
}

/// Trait for creating "not enough bytes" errors.
pub trait NotEnoughBytesErr {
    /// Creates a new "not enough bytes" error.
    fn not_enough_bytes(context: &'static str, received: usize, expected: usize) -> Self;
}

/// Helper function to create a "not enough bytes" error.
pub fn not_enough_bytes_err<T: NotEnoughBytesErr>(context: &'static str, received: usize, expected: usize) -> T {
    T::not_enough_bytes(context, received, expected)
}

/// Trait for creating "invalid field" errors.
pub trait InvalidFieldErr {
    /// Creates a new "invalid field" error.
    fn invalid_field(context: &'static str, field: &'static str, reason: &'static str) -> Self;
}

/// Helper function to create an "invalid field" error.
pub fn invalid_field_err<T: InvalidFieldErr>(context: &'static str, field: &'static str, reason: &'static str) -> T {
    T::invalid_field(context, field, reason)
}

/// Helper function to create an "invalid field" error with a source.
pub fn invalid_field_err_with_source<T, E>(
    context: &'static str,
    field: &'static str,
    reason: &'static str,
    source: E,
) -> T
where
    T: InvalidFieldErr + WithSource,
    E: std::error::Error + Sync + Send + 'static,
{
    T::invalid_field(context, field, reason).with_source(source)
}

/// Trait for creating "unexpected message type" errors.
pub trait UnexpectedMessageTypeErr {
    /// Creates a new "unexpected message type" error.
    fn unexpected_message_type(context: &'static str, got: i32) -> Self;
}

/// Helper function to create an "unexpected message type" error.
pub fn unexpected_message_type_err<T: UnexpectedMessageTypeErr>(context: &'static str, got: i32) -> T {
    T::unexpected_message_type(context, got)
}

/// Trait for creating generic "other" errors.
pub trait OtherErr {
    /// Creates a new generic "other" error.
    fn other(context: &'static str, description: &'static str) -> Self;
}

/// Helper function to create a generic "other" error.
pub fn other_err<T: OtherErr>(context: &'static str, description: &'static str) -> T {
    T::other(context, description)
}

/// Helper function to create a generic "other" error with a source.
pub fn other_err_with_source<T, E>(context: &'static str, description: &'static str, source: E) -> T
where
    T: OtherErr + WithSource,
    E: std::error::Error + Sync + Send + 'static,
{
    T::other(context, description).with_source(source)
}
