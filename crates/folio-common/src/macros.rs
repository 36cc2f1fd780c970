//! Convenience macros for error handling and propagation

/// Equivalent to `anyhow::bail!` but for `FolioError`
///
/// A format string produces a generic error. Any other expression is
/// converted with `From`, so a ready-made `FolioError` passes through
/// unchanged.
///
/// # Examples
///
/// ```rust
/// use folio_common::{bail, FolioError, Result};
///
/// fn check_dpi(dpi: u32) -> Result<()> {
///     if dpi == 0 {
///         bail!(FolioError::validation_field("DPI cannot be zero", "dpi"));
///     }
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::FolioError::new(format!($msg)))
    };
    ($err:expr $(,)?) => {
        return Err(::core::convert::From::from($err))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::FolioError::new(format!($fmt, $($arg)*)))
    };
}

/// Equivalent to `anyhow::ensure!` but for `FolioError`
///
/// # Examples
///
/// ```rust
/// use folio_common::ensure;
/// use folio_common::Result;
///
/// fn validate_width(inches: f64) -> Result<()> {
///     ensure!(inches > 0.0, "Figure width must be positive, got: {}", inches);
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $msg:literal $(,)?) => {
        if !$cond {
            return Err($crate::FolioError::new(format!($msg)));
        }
    };
    ($cond:expr, $err:expr $(,)?) => {
        if !$cond {
            return Err(::core::convert::From::from($err));
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            return Err($crate::FolioError::new(format!($fmt, $($arg)*)));
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::{FolioError, Result};

    fn guarded(value: i32) -> Result<i32> {
        ensure!(value >= 0, "negative value: {}", value);
        ensure!(
            value != 13,
            FolioError::validation_field("unlucky value", "value")
        );
        if value > 100 {
            bail!("value {value} out of range");
        }
        Ok(value)
    }

    #[test]
    fn test_ensure_and_bail() {
        assert_eq!(guarded(5).unwrap(), 5);

        let err = guarded(-1).unwrap_err();
        assert!(matches!(err, FolioError::Generic { .. }));
        assert_eq!(err.to_string(), "negative value: -1");

        let err = guarded(101).unwrap_err();
        assert_eq!(err.to_string(), "value 101 out of range");
    }

    #[test]
    fn test_error_values_pass_through() {
        let err = guarded(13).unwrap_err();
        assert!(matches!(
            err,
            FolioError::Validation { field: Some(ref f), .. } if f == "value"
        ));
    }
}
