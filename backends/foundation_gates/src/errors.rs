use derive_more::From;

pub type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type GateResult<T> = core::result::Result<T, GateError>;

// region -- InvalidRequest

/// Requests that can structurally never be satisfied by a gate. These are
/// reported synchronously and never by blocking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidRequest {
    /// Weighted gates only admit positive weights.
    ZeroWeight,

    /// The request is heavier than the whole gate and would wait forever.
    WeightExceedsCapacity { weight: usize, capacity: usize },

    /// The category index is outside the gate's closed set of labels.
    UnknownCategory { category: usize, categories: usize },

    /// A capacity parameter was zero at construction; names the parameter.
    ZeroCapacity(&'static str),

    /// A category gate needs at least one category.
    ZeroCategories,

    /// A `leave` without a matching `enter`; names the counter that would
    /// have gone negative.
    UnbalancedLeave(&'static str),
}

impl std::error::Error for InvalidRequest {}

impl core::fmt::Display for InvalidRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroWeight => write!(f, "weight must be positive"),
            Self::WeightExceedsCapacity { weight, capacity } => {
                write!(f, "weight {weight} exceeds total capacity {capacity}")
            }
            Self::UnknownCategory {
                category,
                categories,
            } => write!(
                f,
                "category {category} is outside the gate's {categories} categories"
            ),
            Self::ZeroCapacity(name) => write!(f, "{name} must be positive"),
            Self::ZeroCategories => write!(f, "a category gate needs at least one category"),
            Self::UnbalancedLeave(name) => {
                write!(f, "leave without matching enter would underflow {name}")
            }
        }
    }
}

// endregion -- InvalidRequest

// region -- GateError

#[derive(Debug, From)]
pub enum GateError {
    InvalidRequest(InvalidRequest),

    /// The caller's wait was cancelled through its [`crate::CancelToken`]
    /// before it was admitted. No counter was changed.
    #[from(ignore)]
    Cancelled,

    /// The caller's deadline passed before it was admitted. No counter was
    /// changed.
    #[from(ignore)]
    TimedOut,

    /// A non-blocking attempt found the admission predicate false.
    #[from(ignore)]
    WouldBlock,

    /// The rendezvous waiting room is at its configured bound.
    #[from(ignore)]
    WaitingRoomFull,

    /// A queue observer failed; the queue was rolled back before this was
    /// returned.
    Observer(BoxedError),
}

impl GateError {
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut)
    }

    #[must_use]
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::InvalidRequest(_))
    }

    #[must_use]
    pub fn would_block(&self) -> bool {
        matches!(self, Self::WouldBlock)
    }
}

impl std::error::Error for GateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidRequest(err) => Some(err),
            Self::Observer(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl core::fmt::Display for GateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest(err) => write!(f, "GateError::InvalidRequest({err})"),
            Self::Observer(err) => write!(f, "GateError::Observer({err})"),
            _ => write!(f, "{self:?}"),
        }
    }
}

// endregion -- GateError
