pub type FilterResult<T> = Result<T, FilterError>;

#[derive(thiserror::Error, Debug)]
pub enum FilterError {
    #[error("unknown filter '{0}'")]
    UnknownFilter(String),

    #[error("unknown parameter '{param}' for filter '{filter}'")]
    UnknownParameter { filter: String, param: String },

    #[error("no filter selected")]
    NoFilterSelected,

    #[error("decode error: {0}")]
    Decode(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("mux error: {0}")]
    Mux(String),

    #[error(
        "filter '{filter}' changed the frame shape from {}x{} to {}x{}",
        expected.0, expected.1, actual.0, actual.1
    )]
    ShapeInvariantViolation {
        filter: String,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("frame has zero width or height")]
    EmptyFrame,

    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no media source is open")]
    NoMediaOpen,

    #[error("unsupported media: {0}")]
    UnsupportedMedia(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FilterError {
    pub fn unknown_parameter(filter: impl Into<String>, param: impl Into<String>) -> Self {
        Self::UnknownParameter {
            filter: filter.into(),
            param: param.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn mux(msg: impl Into<String>) -> Self {
        Self::Mux(msg.into())
    }

    pub fn invalid_frame(msg: impl Into<String>) -> Self {
        Self::InvalidFrame(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn unsupported_media(msg: impl Into<String>) -> Self {
        Self::UnsupportedMedia(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_offending_item() {
        assert!(FilterError::UnknownFilter("sepia".into())
            .to_string()
            .contains("sepia"));
        let err = FilterError::unknown_parameter("scanlines", "gap");
        assert!(err.to_string().contains("scanlines"));
        assert!(err.to_string().contains("gap"));
    }

    #[test]
    fn shape_violation_reports_both_shapes() {
        let err = FilterError::ShapeInvariantViolation {
            filter: "warp".into(),
            expected: (4, 3),
            actual: (2, 3),
        };
        assert_eq!(
            err.to_string(),
            "filter 'warp' changed the frame shape from 4x3 to 2x3"
        );
    }

    #[test]
    fn io_errors_convert() {
        let err: FilterError = std::io::Error::other("boom").into();
        assert!(err.to_string().contains("boom"));
    }
}
