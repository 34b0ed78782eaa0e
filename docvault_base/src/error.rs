// Copyright 2023-2025 ReductSoftware UG
// This Source Code Form is subject to the terms of the Mozilla Public
//    License, v. 2.0. If a copy of the MPL was not distributed with this
//    file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub use int_enum::IntEnum;
use std::error::Error;
use std::fmt::{Debug, Display, Error as FmtError, Formatter};

/// HTTP status codes used by the service, internal errors are negative.
#[repr(i16)]
#[derive(Debug, PartialEq, PartialOrd, Copy, Clone, IntEnum)]
pub enum ErrorCode {
    Unknown = -1,

    BadRequest = 400,
    Unauthorized = 401,
    Forbidden = 403,
    NotFound = 404,
    Conflict = 409,
    UnprocessableEntity = 422,
    InternalServerError = 500,
}

/// An error with an HTTP status, we use it for error handling across the service.
#[derive(PartialEq, Debug, Clone)]
pub struct VaultError {
    /// The HTTP status code.
    pub status: ErrorCode,

    /// The human readable message.
    pub message: String,
}

impl Display for VaultError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), FmtError> {
        write!(f, "[{:?}] {}", self.status, self.message)
    }
}

impl Display for ErrorCode {
    fn fmt(&self, f: &mut Formatter) -> Result<(), FmtError> {
        write!(f, "{}", self.int_value())
    }
}

impl From<std::io::Error> for VaultError {
    fn from(err: std::io::Error) -> Self {
        // An IO error is an internal error
        VaultError {
            status: ErrorCode::InternalServerError,
            message: err.to_string(),
        }
    }
}

impl Error for VaultError {
    fn description(&self) -> &str {
        &self.message
    }
}

impl VaultError {
    pub fn new(status: ErrorCode, message: &str) -> Self {
        VaultError {
            status,
            message: message.to_string(),
        }
    }

    pub fn status(&self) -> ErrorCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Create a not found error.
    pub fn not_found(msg: &str) -> VaultError {
        VaultError::new(ErrorCode::NotFound, msg)
    }

    /// Create a conflict error.
    pub fn conflict(msg: &str) -> VaultError {
        VaultError::new(ErrorCode::Conflict, msg)
    }

    /// Create a bad request error.
    pub fn bad_request(msg: &str) -> VaultError {
        VaultError::new(ErrorCode::BadRequest, msg)
    }

    /// Create an unauthorized error.
    pub fn unauthorized(msg: &str) -> VaultError {
        VaultError::new(ErrorCode::Unauthorized, msg)
    }

    /// Create a forbidden error.
    pub fn forbidden(msg: &str) -> VaultError {
        VaultError::new(ErrorCode::Forbidden, msg)
    }

    /// Create an unprocessable entity error.
    pub fn unprocessable_entity(msg: &str) -> VaultError {
        VaultError::new(ErrorCode::UnprocessableEntity, msg)
    }

    /// Create an internal server error.
    pub fn internal_server_error(msg: &str) -> VaultError {
        VaultError::new(ErrorCode::InternalServerError, msg)
    }
}

#[macro_export]
macro_rules! not_found {
    ($msg:expr, $($arg:tt)*) => {
        $crate::error::VaultError::not_found(&format!($msg, $($arg)*))
    };
    ($msg:expr) => {
        $crate::error::VaultError::not_found($msg)
    };
}

#[macro_export]
macro_rules! conflict {
    ($msg:expr, $($arg:tt)*) => {
        $crate::error::VaultError::conflict(&format!($msg, $($arg)*))
    };
    ($msg:expr) => {
        $crate::error::VaultError::conflict($msg)
    };
}

#[macro_export]
macro_rules! bad_request {
    ($msg:expr, $($arg:tt)*) => {
        $crate::error::VaultError::bad_request(&format!($msg, $($arg)*))
    };
    ($msg:expr) => {
        $crate::error::VaultError::bad_request($msg)
    };
}

#[macro_export]
macro_rules! unauthorized {
    ($msg:expr, $($arg:tt)*) => {
        $crate::error::VaultError::unauthorized(&format!($msg, $($arg)*))
    };
    ($msg:expr) => {
        $crate::error::VaultError::unauthorized($msg)
    };
}

#[macro_export]
macro_rules! forbidden {
    ($msg:expr, $($arg:tt)*) => {
        $crate::error::VaultError::forbidden(&format!($msg, $($arg)*))
    };
    ($msg:expr) => {
        $crate::error::VaultError::forbidden($msg)
    };
}

#[macro_export]
macro_rules! unprocessable_entity {
    ($msg:expr, $($arg:tt)*) => {
        $crate::error::VaultError::unprocessable_entity(&format!($msg, $($arg)*))
    };
    ($msg:expr) => {
        $crate::error::VaultError::unprocessable_entity($msg)
    };
}

#[macro_export]
macro_rules! internal_server_error {
    ($msg:expr, $($arg:tt)*) => {
        $crate::error::VaultError::internal_server_error(&format!($msg, $($arg)*))
    };
    ($msg:expr) => {
        $crate::error::VaultError::internal_server_error($msg)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_display() {
        let err = not_found!("Account '{}' doesn't exist", "john");
        assert_eq!(err.to_string(), "[NotFound] Account 'john' doesn't exist");
        assert_eq!(ErrorCode::NotFound.to_string(), "404");
    }

    #[rstest]
    fn test_from_io_error() {
        let err: VaultError = std::io::Error::new(std::io::ErrorKind::Other, "disk").into();
        assert_eq!(err.status(), ErrorCode::InternalServerError);
        assert_eq!(err.message(), "disk");
    }

    #[rstest]
    #[case(bad_request!("x"), ErrorCode::BadRequest)]
    #[case(unauthorized!("x"), ErrorCode::Unauthorized)]
    #[case(forbidden!("x"), ErrorCode::Forbidden)]
    #[case(conflict!("x"), ErrorCode::Conflict)]
    #[case(unprocessable_entity!("x"), ErrorCode::UnprocessableEntity)]
    #[case(internal_server_error!("x"), ErrorCode::InternalServerError)]
    fn test_macros(#[case] err: VaultError, #[case] status: ErrorCode) {
        assert_eq!(err.status, status);
        assert_eq!(err.message, "x");
    }

    #[rstest]
    fn test_negative_code() {
        assert_eq!(ErrorCode::Unknown.int_value(), -1);
        assert_eq!(ErrorCode::from_int(404).unwrap(), ErrorCode::NotFound);
    }
}
