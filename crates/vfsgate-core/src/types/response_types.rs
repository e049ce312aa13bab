//! Uniform response envelope

use crate::error::Error;
use serde::{Deserialize, Serialize};

pub const SUCCESS_CODE: u16 = 200;

/// Envelope carried by every gateway response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resp<T> {
    pub code: u16,
    pub message: String,
    pub data: Option<T>,
}

impl<T> Resp<T> {
    pub fn success(data: Option<T>) -> Self {
        Self {
            code: SUCCESS_CODE,
            message: "success".to_string(),
            data,
        }
    }

    pub fn failure(err: &Error, data: Option<T>) -> Self {
        Self {
            code: err.status().code(),
            message: err.to_string(),
            data,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }
}
